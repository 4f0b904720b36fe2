use super::metric::Evaluation;
use super::Objective;
use crate::config::ManagerWeighting;
use crate::data::Preferences;
use crate::representation::Assignment;

/// 排名第一得满分，之后每低一位少一分；排在十名之外的不再额外扣分
pub const MAX_RANK_BONUS: f64 = 10.0;

/// 双方满意度的加权和。毕业生一侧按原值计入，岗位一侧乘以经理权重
pub struct PreferenceObjective<'a> {
    preferences: &'a Preferences,
    weighting: ManagerWeighting,
}

/// 两侧分别累计的原始分数
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartialFitness {
    pub graduate: f64,
    pub placement: f64,
}

impl<'a> PreferenceObjective<'a> {
    pub fn new(preferences: &'a Preferences, weighting: ManagerWeighting) -> Self {
        Self {
            preferences,
            weighting,
        }
    }

    pub fn weighting(&self) -> ManagerWeighting {
        self.weighting
    }

    pub fn partial(&self, solution: &Assignment) -> PartialFitness {
        let mut partial = PartialFitness::default();
        for (graduate, placement) in solution.iter() {
            // 只有双方都存在时才计分
            if self.preferences.graduate(graduate).is_none()
                || self.preferences.placement(placement).is_none()
            {
                continue;
            }
            if let Some(rank) = self.preferences.placement_rank(placement, graduate) {
                partial.placement += MAX_RANK_BONUS - rank as f64;
            }
            if let Some(rank) = self.preferences.graduate_rank(graduate, placement) {
                partial.graduate += MAX_RANK_BONUS - rank as f64;
            }
        }
        partial
    }
}

impl Objective for PreferenceObjective<'_> {
    type Metric = Evaluation;

    fn fitness(&self, solution: &Assignment) -> f64 {
        let PartialFitness {
            graduate,
            placement,
        } = self.partial(solution);
        graduate + placement * self.weighting.factor()
    }

    fn metric(&self, solution: &Assignment) -> Evaluation {
        Evaluation::new(solution, self.preferences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::small_instance;

    fn weighting(percent: i64) -> ManagerWeighting {
        ManagerWeighting::new(percent).unwrap()
    }

    #[test]
    fn scores_both_sides() {
        let preferences = small_instance();
        let objective = PreferenceObjective::new(&preferences, ManagerWeighting::UNSCALED);
        let solution: Assignment = [(1, 1), (2, 1), (3, 1)].into_iter().collect();
        let partial = objective.partial(&solution);
        assert_eq!(partial.graduate, 29.0);
        assert_eq!(partial.placement, 10.0);
        assert_eq!(objective.fitness(&solution), 39.0);
        let solution: Assignment = [(1, 2), (2, 1), (3, 1)].into_iter().collect();
        assert_eq!(objective.fitness(&solution), 40.0);
    }

    #[test]
    fn weighting_scales_placement_side() {
        let preferences = small_instance();
        let solution: Assignment = [(1, 2), (2, 2), (3, 1)].into_iter().collect();
        let zero = PreferenceObjective::new(&preferences, weighting(0));
        let half = PreferenceObjective::new(&preferences, weighting(50));
        let full = PreferenceObjective::new(&preferences, weighting(100));
        let partial = full.partial(&solution);
        assert_eq!(zero.fitness(&solution), partial.graduate);
        assert_eq!(half.fitness(&solution), partial.graduate + partial.placement / 2.0);
        assert_eq!(full.fitness(&solution), partial.graduate + partial.placement);
        // 越界的权重在入口处被当作不缩放
        let lenient = PreferenceObjective::new(&preferences, ManagerWeighting::lenient(Some(-5)));
        assert_eq!(lenient.fitness(&solution), full.fitness(&solution));
    }

    #[test]
    fn lower_preference_scores_less() {
        let preferences = small_instance();
        let objective = PreferenceObjective::new(&preferences, weighting(0));
        let scores: Vec<f64> = [2, 1, 3]
            .into_iter()
            .map(|placement| {
                let solution: Assignment = [(1, placement)].into_iter().collect();
                objective.fitness(&solution)
            })
            .collect();
        assert_eq!(scores, vec![10.0, 9.0, 8.0]);
    }

    #[test]
    fn unknown_ids_contribute_nothing() {
        let preferences = small_instance();
        let objective = PreferenceObjective::new(&preferences, ManagerWeighting::UNSCALED);
        let solution: Assignment = [(1, 42), (42, 1)].into_iter().collect();
        assert_eq!(objective.fitness(&solution), 0.0);
        assert_eq!(objective.fitness(&Assignment::new()), 0.0);
    }
}
