use super::{Crossover, Generate, Mutate};
use crate::data::{GraduateId, PlacementId, Preferences};
use crate::representation::{Assignment, Pairing};
use itertools::repeat_n;
use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::FxHashSet;

/// 默认操作：按名额展开岗位后洗牌生成初始解，部分匹配杂交，以及交换变异
#[derive(Debug, Clone)]
pub struct DefaultOperators {
    graduates: Vec<GraduateId>,
    slots: Vec<PlacementId>,
}

impl DefaultOperators {
    pub fn new(preferences: &Preferences) -> Self {
        let graduates = preferences.graduates.iter().map(|g| g.id).collect();
        // 每个岗位按名额重复出现，例如 [1, 2, 2, 3]
        let slots = preferences
            .placements
            .iter()
            .flat_map(|p| repeat_n(p.id, p.quota))
            .collect();
        Self { graduates, slots }
    }

    /// 以一个亲本为主构造子代：先照抄一段，再从另一亲本和自身补充不冲突的配对，最后把剩下的毕业生和岗位按顺序配对。
    /// 剩余岗位不够时返回 `None`
    fn offspring(own: &[Pairing], other: &[Pairing], start: usize) -> Option<Assignment> {
        let mut child = Vec::with_capacity(own.len());
        let mut graduates = FxHashSet::default();
        let mut placements = FxHashSet::default();
        for pairing in own.iter().cycle().skip(start).take(own.len() / 2) {
            child.push(*pairing);
            graduates.insert(pairing.graduate);
            placements.insert(pairing.placement);
        }
        for pairing in other.iter().chain(own) {
            if graduates.contains(&pairing.graduate) || placements.contains(&pairing.placement) {
                continue;
            }
            child.push(*pairing);
            graduates.insert(pairing.graduate);
            placements.insert(pairing.placement);
        }
        // 修复：不重新检查名额，岗位可能因此超员
        let mut unmatched_placements = own
            .iter()
            .filter(|p| !placements.contains(&p.placement))
            .map(|p| p.placement);
        let unmatched_graduates: Vec<_> = own
            .iter()
            .filter(|p| !graduates.contains(&p.graduate))
            .map(|p| p.graduate)
            .collect();
        for graduate in unmatched_graduates {
            let placement = unmatched_placements.next()?;
            child.push(Pairing {
                graduate,
                placement,
            });
        }
        Some(child.into_iter().collect())
    }
}

impl Generate for DefaultOperators {
    fn generate<R: Rng>(&self, rng: &mut R) -> Assignment {
        let mut slots = self.slots.clone();
        slots.shuffle(rng);
        // 名额少于人数时，排在后面的毕业生没有分配
        self.graduates.iter().copied().zip(slots).collect()
    }
}

impl Crossover for DefaultOperators {
    fn crossover<R: Rng>(
        &self,
        first: &Assignment,
        second: &Assignment,
        rng: &mut R,
    ) -> (Assignment, Assignment) {
        if first.len() != second.len() || first.is_empty() {
            return (first.clone(), second.clone());
        }
        let first_pairings = first.pairings();
        let second_pairings = second.pairings();
        let start = rng.random_range(0..first.len());
        let first_child = Self::offspring(&first_pairings, &second_pairings, start)
            .unwrap_or_else(|| first.clone());
        let second_child = Self::offspring(&second_pairings, &first_pairings, start)
            .unwrap_or_else(|| second.clone());
        (first_child, second_child)
    }
}

impl Mutate for DefaultOperators {
    fn mutate<R: Rng>(&self, solution: &mut Assignment, rng: &mut R) -> (usize, usize) {
        if solution.is_empty() {
            return (0, 0);
        }
        let first = rng.random_range(0..solution.len());
        let second = rng.random_range(0..solution.len());
        solution.swap_placements(first, second);
        (first, second)
    }
}
