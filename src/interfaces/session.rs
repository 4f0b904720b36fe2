//! 搜索会话：持有初始化之后的偏好数据和消息回调，命令行、服务器与 wasm 界面都通过它来运行搜索。

use super::{Interface, Message, RunResult};
use crate::config::{GeneticParameters, ManagerWeighting};
use crate::data::{GraduatePreference, Placement, Preferences};
use crate::objectives::default::PreferenceObjective;
use crate::objectives::metric::Evaluation;
use crate::operators::default::DefaultOperators;
use crate::optimizers::genetic::Genetic;
use crate::representation::Assignment;
use crate::Error;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// 初始化会话所需的两张偏好表
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitRequest {
    pub graduate_preferences: Vec<GraduatePreference>,
    pub placements: Vec<Placement>,
}

/// 一次搜索的参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub iterations: usize,
    pub population_size: Option<usize>,
    pub manager_weighting: Option<i64>,
    pub seed: Option<u64>,
    pub genetic: Option<GeneticParameters>,
}

impl RunRequest {
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            population_size: None,
            manager_weighting: None,
            seed: None,
            genetic: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    pub solution: Assignment,
}

/// 初始化并立即运行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    #[serde(flatten)]
    pub init: InitRequest,
    #[serde(flatten)]
    pub run: RunRequest,
}

/// 纯 Rust 的会话接口，与 wasm_bindgen Web 结构一一对应
#[derive(Default)]
pub struct Session {
    preferences: Option<Preferences>,
    callback: Option<Box<dyn Fn(&Message) + Send + Sync>>,
    stop: Arc<AtomicBool>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置消息回调函数
    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    pub fn preferences(&self) -> Result<&Preferences, Error> {
        self.preferences
            .as_ref()
            .ok_or_else(|| "the session has not been initialised".into())
    }

    /// 停止标志的句柄，可在搜索运行时从其他线程设置。
    /// 搜索开始前设置的标志同样有效，搜索结束后标志被清除。
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn init(&mut self, request: InitRequest) -> Result<(), Error> {
        let preferences = Preferences::new(request.graduate_preferences, request.placements)?;
        info!(
            graduates = preferences.graduates.len(),
            placements = preferences.placements.len(),
            "session initialised"
        );
        self.preferences = Some(preferences);
        Ok(())
    }

    pub fn run(&self, request: RunRequest) -> Result<RunResult, Error> {
        self.run_with(request, self)
    }

    /// 运行一次搜索，进度和结果发送到给定的界面
    pub fn run_with(
        &self,
        request: RunRequest,
        interface: &dyn Interface,
    ) -> Result<RunResult, Error> {
        let preferences = self.preferences()?;
        if request.iterations == 0 {
            return Err("iterations must be greater than 0".into());
        }
        if request.population_size == Some(0) {
            return Err("population size must be greater than 0".into());
        }
        let parameters = request.genetic.unwrap_or_default();
        parameters.validate()?;
        let weighting = ManagerWeighting::lenient(request.manager_weighting);
        let objective = PreferenceObjective::new(preferences, weighting);
        let operators = DefaultOperators::new(preferences);
        let genetic = Genetic::new(
            request.iterations,
            request.population_size,
            parameters,
        );
        let mut rng = match request.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        info!(
            iterations = genetic.iterations,
            population_size = genetic.population_size,
            manager_weighting = weighting.percent(),
            "search started"
        );
        let result = genetic.optimize(&objective, &operators, interface, &mut rng, &self.stop);
        // 停止请求只作用于当前这一次搜索
        self.stop.store(false, Ordering::Relaxed);
        info!(
            generations = result.generations,
            fitness = result.best.fitness(),
            "search finished"
        );
        let run_result = RunResult {
            fitness: result.best.fitness(),
            solution: result.best.into_solution(),
            manager_weighting: weighting.percent(),
            evaluation: result.metric.lines(),
        };
        interface.send(Message::Result(run_result.clone()));
        Ok(run_result)
    }

    /// 用已初始化的偏好评测给定方案
    pub fn evaluate(&self, request: EvaluateRequest) -> Result<Vec<String>, Error> {
        let preferences = self.preferences()?;
        let lines = Evaluation::new(&request.solution, preferences).lines();
        self.send(Message::Evaluate(lines.clone()));
        Ok(lines)
    }

    pub fn start(&mut self, request: StartRequest) -> Result<RunResult, Error> {
        self.init(request.init)?;
        self.run(request.run)
    }
}

impl Interface for Session {
    fn send(&self, message: Message) {
        if let Some(ref callback) = self.callback {
            callback(&message);
        }
    }
}
