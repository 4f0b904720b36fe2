//! 目标函数接口，以及默认目标函数的实现
//!

use crate::representation::Assignment;
use serde::Serialize;
use std::fmt::Display;
pub mod default;
pub mod metric;

pub trait Objective {
    type Metric: Display + Clone + Serialize;

    /// 适应度，越大越好
    fn fitness(&self, solution: &Assignment) -> f64;

    /// 给用户看的评测指标
    fn metric(&self, solution: &Assignment) -> Self::Metric;
}
