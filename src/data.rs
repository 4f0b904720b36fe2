//! 匹配问题的输入数据：毕业生的志愿表、岗位的名额与偏好表。
//!
//! 两边的数据在一次运行中都不会改变。`Preferences` 在原始数据之上建立了查找表，计算适应度时查询排名只需要一次哈希查找。

use crate::Error;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub type GraduateId = u32;
pub type PlacementId = u32;

/// 毕业生及其志愿，最想去的岗位排在最前
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraduatePreference {
    pub id: GraduateId,
    pub placement_rankings: Vec<PlacementId>,
}

/// 岗位的名额，以及岗位经理对毕业生的偏好排序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub id: PlacementId,
    pub quota: usize,
    #[serde(default)]
    pub graduate_rankings: Vec<GraduateId>,
}

#[derive(Debug, Clone)]
pub struct Preferences {
    pub graduates: Vec<GraduatePreference>,
    pub placements: Vec<Placement>,
    graduate_ranks: FxHashMap<(GraduateId, PlacementId), usize>,
    placement_ranks: FxHashMap<(PlacementId, GraduateId), usize>,
    placement_index: FxHashMap<PlacementId, usize>,
    graduate_index: FxHashMap<GraduateId, usize>,
}

/// 记录每个编号在排序中的位置，重复出现时以第一次为准
fn rank_table<O: Copy + Eq + std::hash::Hash>(
    owner: O,
    rankings: &[u32],
    table: &mut FxHashMap<(O, u32), usize>,
) {
    for (position, id) in rankings.iter().enumerate() {
        table.entry((owner, *id)).or_insert(position);
    }
}

impl Preferences {
    pub fn new(
        graduates: Vec<GraduatePreference>,
        placements: Vec<Placement>,
    ) -> Result<Self, Error> {
        if graduates.is_empty() {
            return Err("no graduates were supplied".into());
        }
        let mut graduate_index = FxHashMap::default();
        let mut graduate_ranks = FxHashMap::default();
        for (index, graduate) in graduates.iter().enumerate() {
            if graduate_index.insert(graduate.id, index).is_some() {
                return Err(format!("graduate {} appears more than once", graduate.id).into());
            }
            rank_table(graduate.id, &graduate.placement_rankings, &mut graduate_ranks);
        }
        let mut placement_index = FxHashMap::default();
        let mut placement_ranks = FxHashMap::default();
        for (index, placement) in placements.iter().enumerate() {
            if placement_index.insert(placement.id, index).is_some() {
                return Err(format!("placement {} appears more than once", placement.id).into());
            }
            rank_table(placement.id, &placement.graduate_rankings, &mut placement_ranks);
        }
        let preferences = Self {
            graduates,
            placements,
            graduate_ranks,
            placement_ranks,
            placement_index,
            graduate_index,
        };
        let slots = preferences.total_quota();
        if slots != preferences.graduates.len() {
            warn!(
                slots,
                graduates = preferences.graduates.len(),
                "total quota does not match the number of graduates"
            );
        }
        Ok(preferences)
    }

    pub fn total_quota(&self) -> usize {
        self.placements.iter().map(|p| p.quota).sum()
    }

    pub fn graduate(&self, id: GraduateId) -> Option<&GraduatePreference> {
        self.graduate_index.get(&id).map(|&i| &self.graduates[i])
    }

    pub fn placement(&self, id: PlacementId) -> Option<&Placement> {
        self.placement_index.get(&id).map(|&i| &self.placements[i])
    }

    /// 毕业生对该岗位的排名，未填报则为 `None`
    pub fn graduate_rank(&self, graduate: GraduateId, placement: PlacementId) -> Option<usize> {
        self.graduate_ranks.get(&(graduate, placement)).copied()
    }

    /// 岗位经理对该毕业生的排名
    pub fn placement_rank(&self, placement: PlacementId, graduate: GraduateId) -> Option<usize> {
        self.placement_ranks.get(&(placement, graduate)).copied()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 测试中反复使用的三人算例
    pub fn small_instance() -> Preferences {
        let graduates = vec![
            GraduatePreference {
                id: 1,
                placement_rankings: vec![2, 1, 3],
            },
            GraduatePreference {
                id: 2,
                placement_rankings: vec![1, 2, 3],
            },
            GraduatePreference {
                id: 3,
                placement_rankings: vec![1],
            },
        ];
        let placements = vec![
            Placement {
                id: 1,
                quota: 1,
                graduate_rankings: vec![3],
            },
            Placement {
                id: 2,
                quota: 2,
                graduate_rankings: vec![],
            },
            Placement {
                id: 3,
                quota: 1,
                graduate_rankings: vec![],
            },
        ];
        Preferences::new(graduates, placements).unwrap()
    }

    #[test]
    fn ranks_are_list_positions() {
        let preferences = small_instance();
        assert_eq!(preferences.graduate_rank(1, 2), Some(0));
        assert_eq!(preferences.graduate_rank(1, 3), Some(2));
        assert_eq!(preferences.graduate_rank(3, 2), None);
        assert_eq!(preferences.placement_rank(1, 3), Some(0));
        assert_eq!(preferences.placement_rank(2, 1), None);
        assert_eq!(preferences.total_quota(), 4);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let graduates = vec![
            GraduatePreference {
                id: 7,
                placement_rankings: vec![],
            },
            GraduatePreference {
                id: 7,
                placement_rankings: vec![],
            },
        ];
        let result = Preferences::new(graduates, vec![]);
        assert!(result.is_err());
        assert!(Preferences::new(vec![], vec![]).is_err());
    }

    #[test]
    fn deserializes_camel_case_requests() {
        let json = r#"{"id": 4, "quota": 2, "graduateRankings": [1, 2]}"#;
        let placement: Placement = serde_json::from_str(json).unwrap();
        assert_eq!(placement.quota, 2);
        assert_eq!(placement.graduate_rankings, vec![1, 2]);
    }
}
