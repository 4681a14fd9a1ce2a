// src/core/config.rs

use crate::core::common::KdSolverError;
use crate::core::kdtree::{KdTreeBuilder, DEFAULT_MEDIAN_SAMPLE_FRACTION};
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

/// Batch size below which the fork-join strategy stops splitting.
pub const DEFAULT_SPLIT_THRESHOLD: usize = 100;

/// How often a blocked orchestrator re-checks its cancellation token.
pub const DEFAULT_JOIN_POLL_INTERVAL_MS: u64 = 10;

/// Number of hardware threads, falling back to 1 when it cannot be determined.
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Scheduling discipline used to fan a query batch out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// One OS thread per contiguous chunk.
    StaticPartition,
    /// Recursive halving on a work-stealing pool.
    #[default]
    ForkJoin,
    /// One async task per contiguous chunk.
    Cooperative,
}

/// Configuration for tree construction and batch execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SolverConfig {
    pub worker_count: usize,
    pub split_threshold: usize,
    pub median_sample_fraction: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub join_poll_interval_ms: u64,
    pub strategy: StrategyKind,
}

/// Builder for [`SolverConfig`]; unset fields fall back to the defaults.
#[derive(Debug, Clone, Default)]
pub struct SolverConfigBuilder {
    worker_count: Option<usize>,
    split_threshold: Option<usize>,
    median_sample_fraction: Option<f64>,
    seed: Option<u64>,
    join_poll_interval_ms: Option<u64>,
    strategy: Option<StrategyKind>,
}

impl SolverConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of threads (static partition) or tasks (cooperative).
    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = Some(count);
        self
    }

    /// Sets the fork-join split threshold.
    pub fn split_threshold(mut self, threshold: usize) -> Self {
        self.split_threshold = Some(threshold);
        self
    }

    pub fn median_sample_fraction(mut self, fraction: f64) -> Self {
        self.median_sample_fraction = Some(fraction);
        self
    }

    /// Fixes the tree build seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn join_poll_interval_ms(mut self, interval: u64) -> Self {
        self.join_poll_interval_ms = Some(interval);
        self
    }

    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Builds the configuration and validates it.
    ///
    /// # Errors
    ///
    /// Returns `KdSolverError::Configuration` if any value is out of range.
    pub fn build(self) -> Result<SolverConfig, KdSolverError> {
        let defaults = SolverConfig::default();
        let config = SolverConfig {
            worker_count: self.worker_count.unwrap_or(defaults.worker_count),
            split_threshold: self.split_threshold.unwrap_or(defaults.split_threshold),
            median_sample_fraction: self
                .median_sample_fraction
                .unwrap_or(defaults.median_sample_fraction),
            seed: self.seed.or(defaults.seed),
            join_poll_interval_ms: self.join_poll_interval_ms.unwrap_or(defaults.join_poll_interval_ms),
            strategy: self.strategy.unwrap_or(defaults.strategy),
        };

        config.validate()?;
        Ok(config)
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            worker_count: available_parallelism(),
            split_threshold: DEFAULT_SPLIT_THRESHOLD,
            median_sample_fraction: DEFAULT_MEDIAN_SAMPLE_FRACTION,
            seed: None,
            join_poll_interval_ms: DEFAULT_JOIN_POLL_INTERVAL_MS,
            strategy: StrategyKind::default(),
        }
    }
}

impl SolverConfig {
    pub fn builder() -> SolverConfigBuilder {
        SolverConfigBuilder::new()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `KdSolverError::Configuration` naming the first invalid field.
    pub fn validate(&self) -> Result<(), KdSolverError> {
        if self.worker_count == 0 {
            return Err(KdSolverError::Configuration(
                "worker_count must be greater than 0".to_string(),
            ));
        }

        if self.split_threshold == 0 {
            return Err(KdSolverError::Configuration(
                "split_threshold must be greater than 0".to_string(),
            ));
        }

        if !(self.median_sample_fraction > 0.0 && self.median_sample_fraction <= 1.0) {
            return Err(KdSolverError::Configuration(
                "median_sample_fraction must be in (0.0, 1.0]".to_string(),
            ));
        }

        if self.join_poll_interval_ms == 0 {
            return Err(KdSolverError::Configuration(
                "join_poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Loads configuration from a TOML file. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `KdSolverError::Configuration` if parsing or validation fails and
    /// `KdSolverError::Io` for any other read failure.
    pub fn load_from_file(path: &Path) -> Result<Self, KdSolverError> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let config: Self = toml::from_str(&contents).map_err(|e| {
                    KdSolverError::Configuration(format!(
                        "Failed to parse config file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;

                config.validate()?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(KdSolverError::Io(e)),
        }
    }

    /// Loads from `optional_path` if given, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// Same as [`SolverConfig::load_from_file`].
    pub fn load_or_default(optional_path: Option<&Path>) -> Result<Self, KdSolverError> {
        match optional_path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Writes the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns `KdSolverError::Configuration` if serialization fails (e.g. a seed
    /// above `i64::MAX`, which TOML cannot represent) and `KdSolverError::Io` if
    /// the file cannot be written.
    pub fn save_to_file(&self, path: &Path) -> Result<(), KdSolverError> {
        let contents = toml::to_string_pretty(self).map_err(|e| {
            KdSolverError::Configuration(format!("Failed to serialize config: {}", e))
        })?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn join_poll_interval(&self) -> Duration {
        Duration::from_millis(self.join_poll_interval_ms)
    }

    /// Tree builder carrying this configuration's sampling fraction and seed.
    pub fn tree_builder(&self) -> KdTreeBuilder {
        let builder = KdTreeBuilder::new().sample_fraction(self.median_sample_fraction);
        match self.seed {
            Some(seed) => builder.seed(seed),
            None => builder,
        }
    }

    /// Small, reproducible configuration for tests.
    pub fn for_testing() -> Result<Self, KdSolverError> {
        Self::builder().worker_count(2).split_threshold(16).seed(0).join_poll_interval_ms(1).build()
    }

    /// Runs every batch on one worker thread spawned by the static-partition strategy.
    pub fn single_threaded() -> Result<Self, KdSolverError> {
        Self::builder().worker_count(1).strategy(StrategyKind::StaticPartition).build()
    }
}
