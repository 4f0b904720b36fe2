use crate::representation::Chromosome;
use rand::Rng;
use std::cmp::Ordering;

/// 一代中的全部个体，顺序本身没有意义，每代都会按适应度重新排序
#[derive(Debug, Clone, Default)]
pub struct Population {
    chromosomes: Vec<Chromosome>,
}

impl Population {
    pub fn new(chromosomes: Vec<Chromosome>) -> Self {
        Self { chromosomes }
    }

    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    pub fn chromosomes(&self) -> &[Chromosome] {
        &self.chromosomes
    }

    pub fn push(&mut self, chromosome: Chromosome) {
        self.chromosomes.push(chromosome);
    }

    pub fn truncate(&mut self, size: usize) {
        self.chromosomes.truncate(size);
    }

    /// 按适应度从高到低排序
    pub fn sort(&mut self) {
        self.chromosomes
            .sort_by(|a, b| b.fitness().partial_cmp(&a.fitness()).unwrap_or(Ordering::Equal));
    }

    /// 排序后位于最前面的若干个体
    pub fn elites(&self, keep: usize) -> Population {
        Population::new(self.chromosomes.iter().take(keep).cloned().collect())
    }

    pub fn best(&self) -> Option<&Chromosome> {
        self.chromosomes.first()
    }

    /// 轮盘赌选择：被选中的概率与适应度成正比。总适应度不是正数时无法构造轮盘，返回 `None`
    pub fn select<R: Rng>(&self, rng: &mut R) -> Option<&Chromosome> {
        let total: f64 = self.chromosomes.iter().map(|c| c.fitness()).sum();
        if !(total.is_finite() && total > 0.0) {
            return None;
        }
        let draw: f64 = rng.random();
        let mut accumulation = 0.0;
        for chromosome in &self.chromosomes {
            accumulation += chromosome.fitness() / total;
            if accumulation > draw {
                return Some(chromosome);
            }
        }
        // 浮点累加误差使最后的累计值略小于 1 时，取最后一个有权重的个体
        self.chromosomes.iter().rev().find(|c| c.fitness() > 0.0)
    }
}
