//! 解的表示：一个完整的分配方案，以及带有适应度缓存的染色体。
//!
//! 分配方案以毕业生编号为键，保留插入顺序。变异按位置抽取两个条目，再交换它们的岗位，因此不依赖编号是否连续。

use crate::data::{GraduateId, PlacementId, Preferences};
use crate::objectives::Objective;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// 毕业生到岗位的映射，每个毕业生至多出现一次
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assignment(IndexMap<GraduateId, PlacementId>);

/// 交叉算子内部使用的临时配对
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    pub graduate: GraduateId,
    pub placement: PlacementId,
}

impl Assignment {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn insert(&mut self, graduate: GraduateId, placement: PlacementId) {
        self.0.insert(graduate, placement);
    }

    pub fn get(&self, graduate: GraduateId) -> Option<PlacementId> {
        self.0.get(&graduate).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GraduateId, PlacementId)> + '_ {
        self.0.iter().map(|(g, p)| (*g, *p))
    }

    pub fn pairings(&self) -> Vec<Pairing> {
        self.iter()
            .map(|(graduate, placement)| Pairing {
                graduate,
                placement,
            })
            .collect()
    }

    /// 交换两个位置上的岗位，毕业生保持不动；越界时什么也不做
    pub fn swap_placements(&mut self, first: usize, second: usize) {
        if first == second || first >= self.len() || second >= self.len() {
            return;
        }
        let (Some((_, &a)), Some((_, &b))) = (self.0.get_index(first), self.0.get_index(second))
        else {
            return;
        };
        if let Some((_, slot)) = self.0.get_index_mut(first) {
            *slot = b;
        }
        if let Some((_, slot)) = self.0.get_index_mut(second) {
            *slot = a;
        }
    }

    /// 每个岗位被分配到的人数
    pub fn placement_counts(&self) -> FxHashMap<PlacementId, usize> {
        let mut counts = FxHashMap::default();
        for (_, placement) in self.iter() {
            *counts.entry(placement).or_insert(0) += 1;
        }
        counts
    }

    /// 没有任何岗位超出名额，且没有分配到未知岗位
    pub fn respects_quotas(&self, preferences: &Preferences) -> bool {
        self.placement_counts().into_iter().all(|(id, count)| {
            preferences
                .placement(id)
                .is_some_and(|placement| count <= placement.quota)
        })
    }
}

impl FromIterator<(GraduateId, PlacementId)> for Assignment {
    fn from_iter<T: IntoIterator<Item = (GraduateId, PlacementId)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromIterator<Pairing> for Assignment {
    fn from_iter<T: IntoIterator<Item = Pairing>>(iter: T) -> Self {
        Self(iter.into_iter().map(|p| (p.graduate, p.placement)).collect())
    }
}

/// 分配方案与其适应度。适应度只能通过目标函数计算得到，方案一旦改变就要重新计算
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chromosome {
    solution: Assignment,
    fitness: f64,
}

impl Chromosome {
    pub fn evaluate<O: Objective>(solution: Assignment, objective: &O) -> Self {
        let fitness = objective.fitness(&solution);
        Self { solution, fitness }
    }

    pub fn solution(&self) -> &Assignment {
        &self.solution
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn into_solution(self) -> Assignment {
        self.solution
    }

    /// 在原地修改方案，然后重新计算适应度
    pub fn update<O: Objective, T>(
        &mut self,
        objective: &O,
        change: impl FnOnce(&mut Assignment) -> T,
    ) -> T {
        let result = change(&mut self.solution);
        self.fitness = objective.fitness(&self.solution);
        result
    }
}
