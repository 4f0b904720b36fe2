//! 配置文件的定义，以及在入口处校验过的经理权重。

use crate::Error;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;
use tracing::warn;

pub const DEFAULT_POPULATION_SIZE: usize = 10;

/// 岗位经理偏好所占的百分比，构造之后必定落在 0 到 100 之间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct ManagerWeighting(u8);

impl ManagerWeighting {
    pub const UNSCALED: Self = Self(100);

    pub fn new(percent: i64) -> Result<Self, Error> {
        if (0..=100).contains(&percent) {
            Ok(Self(percent as u8))
        } else {
            Err(format!("manager weighting must be between 0 and 100, got {percent}").into())
        }
    }

    /// 缺省时取 100；越界的值不做缩放，等同于 100
    pub fn lenient(percent: Option<i64>) -> Self {
        match percent {
            None => Self::UNSCALED,
            Some(value) => Self::new(value).unwrap_or_else(|error| {
                warn!("{error}, placement preferences stay unscaled");
                Self::UNSCALED
            }),
        }
    }

    pub fn percent(&self) -> u8 {
        self.0
    }

    /// 岗位一侧适应度的缩放系数
    pub fn factor(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Default for ManagerWeighting {
    fn default() -> Self {
        Self::UNSCALED
    }
}

impl TryFrom<i64> for ManagerWeighting {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ManagerWeighting> for i64 {
    fn from(value: ManagerWeighting) -> Self {
        value.0 as i64
    }
}

/// 遗传算法的可调参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticParameters {
    /// 每代直接保留的最优个体数
    pub keep: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
}

impl GeneticParameters {
    pub fn validate(&self) -> Result<(), Error> {
        for (name, rate) in [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(format!("{name} must be a probability, got {rate}").into());
            }
        }
        Ok(())
    }
}

impl Default for GeneticParameters {
    fn default() -> Self {
        Self {
            keep: 2,
            crossover_rate: 0.3,
            mutation_rate: 0.6,
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationConfig {
    pub iterations: usize,
    pub population_size: Option<usize>,
    pub manager_weighting: Option<i64>,
    pub genetic: Option<GeneticParameters>,
    pub seed: Option<u64>,
}

impl OptimizationConfig {
    pub fn population_size(&self) -> usize {
        self.population_size.unwrap_or(DEFAULT_POPULATION_SIZE)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.iterations == 0 {
            return Err("iterations must be greater than 0".into());
        }
        if self.population_size == Some(0) {
            return Err("population_size must be greater than 0".into());
        }
        match &self.genetic {
            Some(genetic) => genetic.validate(),
            None => Ok(()),
        }
    }
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            population_size: None,
            manager_weighting: None,
            genetic: None,
            seed: None,
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub info: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub optimization: OptimizationConfig,
}

impl Config {
    pub fn from_yaml(content: &str) -> Result<Self, Error> {
        let config: Config = serde_yaml::from_str(content)?;
        config.optimization.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighting_rejects_out_of_range() {
        assert_eq!(ManagerWeighting::new(0).unwrap().percent(), 0);
        assert_eq!(ManagerWeighting::new(100).unwrap().factor(), 1.0);
        assert!(ManagerWeighting::new(101).is_err());
        assert!(ManagerWeighting::new(-1).is_err());
    }

    #[test]
    fn lenient_weighting_falls_back_to_unscaled() {
        assert_eq!(ManagerWeighting::lenient(None), ManagerWeighting::UNSCALED);
        assert_eq!(ManagerWeighting::lenient(Some(250)), ManagerWeighting::UNSCALED);
        assert_eq!(ManagerWeighting::lenient(Some(0)).percent(), 0);
        assert_eq!(ManagerWeighting::lenient(Some(50)).factor(), 0.5);
    }

    #[test]
    fn parses_yaml_with_defaults() {
        let yaml = "
info:
  name: intake
optimization:
  iterations: 200
  manager_weighting: 40
  genetic:
    keep: 4
";
        let config = Config::from_yaml(yaml).unwrap();
        let optimization = config.optimization;
        assert_eq!(optimization.iterations, 200);
        assert_eq!(optimization.population_size(), DEFAULT_POPULATION_SIZE);
        let genetic = optimization.genetic.unwrap();
        assert_eq!(genetic.keep, 4);
        assert_eq!(genetic.crossover_rate, 0.3);
    }

    #[test]
    fn rates_must_be_probabilities() {
        let yaml = "optimization:\n  iterations: 5\n  genetic:\n    mutation_rate: 1.5\n";
        assert!(Config::from_yaml(yaml).is_err());
        assert!(GeneticParameters::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_iterations() {
        let yaml = "optimization:\n  iterations: 0\n";
        assert!(Config::from_yaml(yaml).is_err());
    }
}
