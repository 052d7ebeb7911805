/// Configuration validation errors.
///
/// A malformed configuration is rejected before any simulation loop starts;
/// the models themselves are total over validated inputs, so these are the
/// only errors the crate produces.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// An enabled cache level has a non-physical parameter.
    #[error("cache level {level}: {reason}")]
    CacheLevel { level: &'static str, reason: String },

    /// Main memory latency/bandwidth must be positive.
    #[error("main memory: {0}")]
    MainMemory(String),

    /// Thermal parameters must be physically meaningful.
    #[error("thermal config: {0}")]
    Thermal(String),

    /// A GPU hardware parameter is out of range.
    #[error("gpu config: {field} = {value} is invalid")]
    Gpu { field: &'static str, value: f64 },

    /// A workload parameter is out of range.
    #[error("workload: {field} = {value} is invalid")]
    Workload { field: &'static str, value: f64 },

    /// Instruction mix percentage must be within 0..=100.
    #[error("instruction mix percent {0} outside 0..=100")]
    MixPercent(f64),
}
