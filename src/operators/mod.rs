//! 算子接口，以及默认操作的实现（随机生成、杂交和变异）
//!

use crate::representation::Assignment;
use rand::Rng;

pub mod default;

pub trait Generate {
    /// 随机生成一个满足名额约束的方案
    fn generate<R: Rng>(&self, rng: &mut R) -> Assignment;
}

pub trait Crossover {
    /// 由两个亲本方案产生两个子代方案
    fn crossover<R: Rng>(
        &self,
        first: &Assignment,
        second: &Assignment,
        rng: &mut R,
    ) -> (Assignment, Assignment);
}

pub trait Mutate {
    /// 原地扰动一个方案，返回发生变化的位置
    fn mutate<R: Rng>(&self, solution: &mut Assignment, rng: &mut R) -> (usize, usize);
}
