// 评测一个分配方案：有多少人拿到了第一志愿、前两志愿，以及岗位经理一侧的同类统计

use crate::data::Preferences;
use crate::representation::Assignment;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 只统计前这么多名志愿
pub const TOP_CHOICES: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub graduates: usize,
    pub placements: usize,
    pub graduate_first_choice: usize,
    pub graduate_top_choices: usize,
    pub manager_first_choice: usize,
    pub manager_top_choices: usize,
}

impl Evaluation {
    pub fn new(solution: &Assignment, preferences: &Preferences) -> Self {
        let mut evaluation = Self {
            graduates: preferences.graduates.len(),
            placements: preferences.placements.len(),
            ..Default::default()
        };
        for (graduate_id, placement_id) in solution.iter() {
            let (Some(graduate), Some(placement)) = (
                preferences.graduate(graduate_id),
                preferences.placement(placement_id),
            ) else {
                continue;
            };
            let rankings = &graduate.placement_rankings;
            if rankings.first() == Some(&placement_id) {
                evaluation.graduate_first_choice += 1;
            }
            if rankings.iter().take(TOP_CHOICES).any(|&p| p == placement_id) {
                evaluation.graduate_top_choices += 1;
            }
            let rankings = &placement.graduate_rankings;
            if rankings.first() == Some(&graduate_id) {
                evaluation.manager_first_choice += 1;
            }
            if rankings.iter().take(TOP_CHOICES).any(|&g| g == graduate_id) {
                evaluation.manager_top_choices += 1;
            }
        }
        evaluation
    }

    /// 按固定顺序输出的可读文本
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!(
                "Graduates with their first choice: {}/{}",
                self.graduate_first_choice, self.graduates
            ),
            format!(
                "Graduates with one of their top {TOP_CHOICES} choices: {}/{}",
                self.graduate_top_choices, self.graduates
            ),
            format!(
                "Managers with their first choice: {}/{}",
                self.manager_first_choice, self.placements
            ),
            format!(
                "Managers with one of their top {TOP_CHOICES} choices: {}/{}",
                self.manager_top_choices, self.placements
            ),
        ]
    }
}

impl Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
