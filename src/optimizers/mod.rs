//! 优化方法：种群管理，以及遗传算法的主循环
//!

use crate::objectives::Objective;
use crate::representation::Chromosome;
pub mod genetic;
pub mod population;

pub struct OptimizationResult<O: Objective> {
    pub best: Chromosome,
    pub metric: O::Metric,
    /// 实际执行的代数，提前停止时小于配置值
    pub generations: usize,
}
