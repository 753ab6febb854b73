//! Rule evaluator
//!
//! The RuleEngine runs every registered rule exactly once against one
//! model:
//! - sequentially by default, or on a rayon pool when `workers > 1`
//! - output always follows catalog-registration order
//! - a rule that errors or panics is recorded and skipped
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      RuleEngine                         │
//! ├─────────────────────────────────────────────────────────┤
//! │  1. Register rules (catalog order)                      │
//! │  2. Run each rule isolated by catch_unwind              │
//! │  3. Collect results in registration order               │
//! │  4. Concatenate violations, record failures             │
//! └─────────────────────────────────────────────────────────┘
//! ```

use crate::graph::Model;
use crate::rules::base::{Evaluation, Rule, RuleResult};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Runs a rule catalog against a model
pub struct RuleEngine {
    rules: Vec<Arc<dyn Rule>>,
    /// Worker threads; 1 means sequential
    workers: usize,
}

impl RuleEngine {
    /// Create a new rule engine
    ///
    /// # Arguments
    /// * `workers` - Number of worker threads (0 = auto-detect, 1 = sequential)
    pub fn new(workers: usize) -> Self {
        let actual_workers = if workers == 0 {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
                .min(16)
        } else {
            workers
        };

        Self {
            rules: Vec::new(),
            workers: actual_workers,
        }
    }

    /// Sequential engine, the library default
    pub fn sequential() -> Self {
        Self::new(1)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Register a rule. Registration order is evaluation order.
    pub fn register(&mut self, rule: Arc<dyn Rule>) {
        debug!("Registering rule: {}", rule.id());
        self.rules.push(rule);
    }

    /// Register multiple rules at once
    pub fn register_all(&mut self, rules: impl IntoIterator<Item = Arc<dyn Rule>>) {
        for rule in rules {
            self.register(rule);
        }
    }

    /// Get the number of registered rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Get ids of all registered rules
    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    /// Run every rule once and concatenate the results in catalog order
    pub fn evaluate(&self, model: &Model) -> Evaluation {
        let start = Instant::now();
        info!(
            "Evaluating {} rules on {} worker(s)",
            self.rules.len(),
            self.workers
        );

        let results = if self.workers > 1 {
            self.run_parallel(model)
        } else {
            self.run_sequential(model)
        };

        let evaluation = Evaluation::from_results(results);
        for failure in &evaluation.failures {
            warn!("Rule {} failed: {}", failure.rule_id, failure.error);
        }

        info!(
            "Evaluation complete: {} violations from {}/{} rules in {:?}",
            evaluation.violations.len(),
            evaluation.summary.rules_succeeded,
            evaluation.summary.rules_run,
            start.elapsed()
        );
        evaluation
    }

    fn run_sequential(&self, model: &Model) -> Vec<RuleResult> {
        self.rules
            .iter()
            .map(|rule| self.run_single_rule(rule, model))
            .collect()
    }

    /// Indexed `par_iter().collect()` keeps registration order
    fn run_parallel(&self, model: &Model) -> Vec<RuleResult> {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
        {
            Ok(pool) => pool.install(|| {
                self.rules
                    .par_iter()
                    .map(|rule| self.run_single_rule(rule, model))
                    .collect()
            }),
            Err(e) => {
                warn!("Failed to build rule thread pool, running sequentially: {}", e);
                self.run_sequential(model)
            }
        }
    }

    fn run_single_rule(&self, rule: &Arc<dyn Rule>, model: &Model) -> RuleResult {
        let id = rule.id().to_string();
        let start = Instant::now();

        debug!("Running rule: {}", id);

        // Wrap in catch_unwind to handle panics
        let check_result =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| rule.check(model)));

        let duration = start.elapsed().as_millis() as u64;
        match check_result {
            Ok(Ok(violations)) => {
                debug!(
                    "Rule {} found {} violations in {}ms",
                    id,
                    violations.len(),
                    duration
                );
                RuleResult::success(id, violations, duration)
            }
            Ok(Err(e)) => {
                debug!("Rule {} returned an error: {}", id, e);
                RuleResult::failure(id, e.to_string(), duration)
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                error!("Rule {} panicked: {}", id, panic_msg);
                RuleResult::failure(id, format!("Panic: {}", panic_msg), duration)
            }
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::sequential()
    }
}

/// Builder for creating a configured RuleEngine
pub struct RuleEngineBuilder {
    workers: usize,
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleEngineBuilder {
    pub fn new() -> Self {
        Self {
            workers: 1,
            rules: Vec::new(),
        }
    }

    /// Set the number of workers
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Add a rule
    pub fn rule(mut self, rule: Arc<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Add multiple rules
    pub fn rules(mut self, rules: impl IntoIterator<Item = Arc<dyn Rule>>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn build(self) -> RuleEngine {
        let mut engine = RuleEngine::new(self.workers);
        engine.register_all(self.rules);
        engine
    }
}

impl Default for RuleEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
