//! 遗传算法

use super::population::Population;
use super::OptimizationResult;
use crate::config::{GeneticParameters, DEFAULT_POPULATION_SIZE};
use crate::interfaces::{Interface, Message};
use crate::objectives::Objective;
use crate::operators::{Crossover, Generate, Mutate};
use crate::representation::{Assignment, Chromosome};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};
use web_time::Instant;

#[derive(Debug, Clone)]
pub struct Genetic {
    pub iterations: usize,
    pub population_size: usize,
    pub parameters: GeneticParameters,
}

impl Genetic {
    pub fn new(
        iterations: usize,
        population_size: Option<usize>,
        parameters: GeneticParameters,
    ) -> Self {
        Self {
            iterations,
            population_size: population_size.unwrap_or(DEFAULT_POPULATION_SIZE).max(1),
            parameters,
        }
    }

    /// 第 generation 代（从 1 开始）恰好是整数百分比时返回该百分比
    pub fn progress(&self, generation: usize) -> Option<u8> {
        // 在 wasm32 上 usize 只有 32 位
        let scaled = generation as u64 * 100;
        let iterations = self.iterations as u64;
        if iterations == 0 || scaled % iterations != 0 {
            return None;
        }
        Some((scaled / iterations) as u8)
    }

    /// 随机生成初始种群
    pub fn seed<O: Objective, F: Generate, R: Rng>(
        &self,
        objective: &O,
        operators: &F,
        rng: &mut R,
    ) -> Population {
        let chromosomes = (0..self.population_size)
            .map(|_| Chromosome::evaluate(operators.generate(rng), objective))
            .collect();
        Population::new(chromosomes)
    }

    /// 轮盘赌选择；总适应度为零时退化为均匀抽取
    fn choose<R: Rng>(population: &Population, rng: &mut R) -> Option<Chromosome> {
        if let Some(chosen) = population.select(rng) {
            return Some(chosen.clone());
        }
        warn!("total fitness is zero, choosing uniformly instead");
        population.chromosomes().choose(rng).cloned()
    }

    /// 由当前种群产生下一代：保留精英，再用同一对候选反复杂交、变异来填满种群
    pub fn next_generation<O: Objective, F: Crossover + Mutate, R: Rng>(
        &self,
        population: &mut Population,
        objective: &O,
        operators: &F,
        rng: &mut R,
    ) {
        population.sort();
        let mut next = population.elites(self.parameters.keep);
        let (Some(mut first), Some(mut second)) =
            (Self::choose(population, rng), Self::choose(population, rng))
        else {
            return;
        };
        while next.len() < self.population_size {
            if rng.random_bool(self.parameters.crossover_rate) {
                let (a, b) = operators.crossover(first.solution(), second.solution(), rng);
                first = Chromosome::evaluate(a, objective);
                second = Chromosome::evaluate(b, objective);
            }
            if rng.random_bool(self.parameters.mutation_rate) {
                first.update(objective, |solution| operators.mutate(solution, rng));
                second.update(objective, |solution| operators.mutate(solution, rng));
            }
            next.push(first.clone());
            next.push(second.clone());
        }
        next.truncate(self.population_size);
        *population = next;
    }

    pub fn optimize<O, F, R>(
        &self,
        objective: &O,
        operators: &F,
        interface: &dyn Interface,
        rng: &mut R,
        stop: &AtomicBool,
    ) -> OptimizationResult<O>
    where
        O: Objective,
        F: Generate + Crossover + Mutate,
        R: Rng,
    {
        let mut population = self.seed(objective, operators, rng);
        let start = Instant::now();
        let mut generations = 0;
        for generation in 1..=self.iterations {
            if stop.load(Ordering::Relaxed) {
                debug!(generation, "search stopped");
                break;
            }
            if let Some(percent) = self.progress(generation) {
                interface.send(Message::Progress(percent));
            }
            self.next_generation(&mut population, objective, operators, rng);
            generations = generation;
            if generation == 1 {
                let elapsed = start.elapsed().as_micros() as u64;
                interface.send(Message::Elapsed(elapsed));
            }
            if let Some(best) = population.best() {
                debug!(generation, fitness = best.fitness());
            }
        }
        population.sort();
        let best = population
            .best()
            .cloned()
            .unwrap_or_else(|| Chromosome::evaluate(Assignment::new(), objective));
        let metric = objective.metric(best.solution());
        OptimizationResult {
            best,
            metric,
            generations,
        }
    }
}
