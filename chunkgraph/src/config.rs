//! `chunkgraph` global configuration options.

use std::sync::OnceLock;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for the `chunkgraph` crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// ## Executor Concurrent Limit
/// > default: [`std::thread::available_parallelism`]`()`
///
/// The maximum number of tasks that the [`ThreadedExecutor`](crate::execute::ThreadedExecutor) evaluates concurrently.
///
/// ## Reduction Gather Warning Threshold
/// > default: `256`
///
/// The aggregate phase of a [`reduction`](crate::lowering::reduction) gathers every chunk phase block along the reduced axes into one task.
/// A warning is logged if a single aggregate task gathers more blocks than this threshold, since the peak memory of that task grows with the number of gathered blocks.
///
/// ## Validate Graphs
/// > default: [`true`]
///
/// If enabled, [`ChunkedArray::new`](crate::array::ChunkedArray::new) verifies that the graph has a task for every block of the array.
#[derive(Debug, Clone)]
#[allow(clippy::struct_field_names)]
pub struct Config {
    executor_concurrent_limit: usize,
    reduction_gather_warning_threshold: usize,
    validate_graphs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            executor_concurrent_limit: std::thread::available_parallelism()
                .map_or(1, std::num::NonZero::get),
            reduction_gather_warning_threshold: 256,
            validate_graphs: true,
        }
    }
}

impl Config {
    /// Get the [executor concurrent limit](#executor-concurrent-limit) configuration.
    #[must_use]
    pub fn executor_concurrent_limit(&self) -> usize {
        self.executor_concurrent_limit
    }

    /// Set the [executor concurrent limit](#executor-concurrent-limit) configuration.
    ///
    /// A limit of zero is treated as one.
    pub fn set_executor_concurrent_limit(&mut self, concurrent_limit: usize) -> &mut Self {
        self.executor_concurrent_limit = concurrent_limit.max(1);
        self
    }

    /// Get the [reduction gather warning threshold](#reduction-gather-warning-threshold) configuration.
    #[must_use]
    pub fn reduction_gather_warning_threshold(&self) -> usize {
        self.reduction_gather_warning_threshold
    }

    /// Set the [reduction gather warning threshold](#reduction-gather-warning-threshold) configuration.
    pub fn set_reduction_gather_warning_threshold(&mut self, threshold: usize) -> &mut Self {
        self.reduction_gather_warning_threshold = threshold;
        self
    }

    /// Get the [validate graphs](#validate-graphs) configuration.
    #[must_use]
    pub fn validate_graphs(&self) -> bool {
        self.validate_graphs
    }

    /// Set the [validate graphs](#validate-graphs) configuration.
    pub fn set_validate_graphs(&mut self, validate_graphs: bool) -> &mut Self {
        self.validate_graphs = validate_graphs;
        self
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global `chunkgraph` configuration.
///
/// Do not hold the guard while calling [`global_config_mut`] on the same thread, it will deadlock.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .read()
}

/// Returns a mutable reference to the global `chunkgraph` configuration.
///
/// Do not hold the guard while calling [`global_config`] on the same thread, it will deadlock.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .write()
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn config_reduction_gather_warning_threshold() {
        assert_eq!(global_config().reduction_gather_warning_threshold(), 256);
        global_config_mut().set_reduction_gather_warning_threshold(4);
        assert_eq!(global_config().reduction_gather_warning_threshold(), 4);
        global_config_mut().set_reduction_gather_warning_threshold(256);
    }

    #[test]
    #[serial]
    fn config_executor_concurrent_limit() {
        let limit = global_config().executor_concurrent_limit();
        assert!(limit >= 1);
        global_config_mut().set_executor_concurrent_limit(0);
        assert_eq!(global_config().executor_concurrent_limit(), 1);
        global_config_mut().set_executor_concurrent_limit(limit);
    }
}
