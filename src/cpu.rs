/// CPU benchmark orchestration: the planar-vs-stacked controlled experiment.
///
/// The same instruction listing, access pattern, and instruction-mix ratio
/// are fed to both system configurations so the only variables are the
/// hardware parameters themselves.
use serde::{Deserialize, Serialize};

use crate::cache::{self, CacheAnalysis};
use crate::config::{AccessPattern, SystemConfig};
use crate::error::ConfigError;
use crate::instructions::{self, InstructionMix, RegisterFile};
use crate::power::{self, PowerBreakdown};

/// Full derived metrics for one system. Immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    pub total_cycles: f64,
    /// Average memory access time in cycles
    pub amat: f64,
    pub ipc: f64,
    pub power: PowerBreakdown,
    pub operating_temp_c: f64,
    pub throttling_percent: f64,
    pub cache: CacheAnalysis,
}

/// Paired planar/stacked metrics plus the headline comparison number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub baseline: BenchmarkMetrics,
    pub stacked: BenchmarkMetrics,
    /// (cycles_2d - cycles_3d) / cycles_2d * 100; 0 for an idle baseline
    pub improvement_percent: f64,
}

/// Everything a caller gets back from one CPU run: the comparative metrics
/// plus display-only data (classified mix, register fill) kept separate
/// from the performance path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuRun {
    pub result: BenchmarkResult,
    pub mix: InstructionMix,
    pub registers: RegisterFile,
}

fn run_one(
    config: &SystemConfig,
    mix: &InstructionMix,
    pattern: AccessPattern,
    memory_ratio: f64,
) -> BenchmarkMetrics {
    let analysis = cache::analyze(config, pattern);
    let outcome = power::evaluate(
        mix.total(),
        memory_ratio,
        analysis.amat,
        config.tsv.enabled,
        &config.thermal,
    );
    BenchmarkMetrics {
        total_cycles: outcome.total_cycles,
        amat: analysis.amat,
        ipc: outcome.ipc,
        power: outcome.power,
        operating_temp_c: outcome.operating_temp_c,
        throttling_percent: outcome.throttling_percent,
        cache: analysis,
    }
}

/// Run the full comparison: classify the listing once, evaluate both
/// systems against it, and compute the cycle-count improvement.
///
/// `mix_percent` is the configured share of instructions treated as memory
/// operations (0..=100); `register_seed` only affects the display register
/// fill.
pub fn run_cpu_benchmark(
    config_2d: &SystemConfig,
    config_3d: &SystemConfig,
    source: &str,
    pattern: AccessPattern,
    mix_percent: f64,
    register_seed: u64,
) -> Result<CpuRun, ConfigError> {
    config_2d.validate()?;
    config_3d.validate()?;
    if !(0.0..=100.0).contains(&mix_percent) || !mix_percent.is_finite() {
        return Err(ConfigError::MixPercent(mix_percent));
    }
    let memory_ratio = mix_percent / 100.0;

    let mix = instructions::classify(source);
    let baseline = run_one(config_2d, &mix, pattern, memory_ratio);
    let stacked = run_one(config_3d, &mix, pattern, memory_ratio);

    let improvement_percent = if baseline.total_cycles > 0.0 {
        (baseline.total_cycles - stacked.total_cycles) / baseline.total_cycles * 100.0
    } else {
        0.0
    };

    Ok(CpuRun {
        result: BenchmarkResult { baseline, stacked, improvement_percent },
        mix,
        registers: RegisterFile::snapshot(register_seed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
li x1, 1000
li x2, 16
loop:
  lw x3, 0(x1)
  addi x3, x3, 1
  sw x3, 0(x1)
  addi x1, x1, 4
  addi x2, x2, -1
  bne x2, x0, loop";

    #[test]
    fn stacked_design_improves_cycle_count() {
        let run = run_cpu_benchmark(
            &SystemConfig::planar_2d(),
            &SystemConfig::stacked_3d(),
            LISTING,
            AccessPattern::Random,
            50.0,
            0,
        )
        .unwrap();
        let r = run.result;
        assert!(r.stacked.total_cycles < r.baseline.total_cycles);
        assert!(r.improvement_percent > 0.0);
        assert!(r.stacked.amat < r.baseline.amat);
        assert!(r.stacked.power.dynamic_w < r.baseline.power.dynamic_w);
    }

    #[test]
    fn identical_configs_yield_zero_improvement() {
        let config = SystemConfig::planar_2d();
        let run =
            run_cpu_benchmark(&config, &config, LISTING, AccessPattern::Random, 50.0, 0).unwrap();
        assert_eq!(run.result.improvement_percent, 0.0);
        assert_eq!(run.result.baseline.total_cycles, run.result.stacked.total_cycles);

        // Also with the stacked preset in both slots: TSV handling keys off
        // the config, not the argument position.
        let config = SystemConfig::stacked_3d();
        let run =
            run_cpu_benchmark(&config, &config, LISTING, AccessPattern::Random, 50.0, 0).unwrap();
        assert_eq!(run.result.improvement_percent, 0.0);
    }

    #[test]
    fn empty_listing_yields_idle_metrics() {
        let run = run_cpu_benchmark(
            &SystemConfig::planar_2d(),
            &SystemConfig::stacked_3d(),
            "# nothing but comments\n",
            AccessPattern::Sequential,
            50.0,
            0,
        )
        .unwrap();
        assert_eq!(run.mix.total(), 0);
        assert_eq!(run.result.baseline.total_cycles, 0.0);
        assert_eq!(run.result.baseline.ipc, 0.0);
        assert_eq!(run.result.improvement_percent, 0.0);
        assert!(run.result.baseline.ipc.is_finite());
    }

    #[test]
    fn classified_mix_reported_alongside_metrics() {
        let run = run_cpu_benchmark(
            &SystemConfig::planar_2d(),
            &SystemConfig::stacked_3d(),
            LISTING,
            AccessPattern::Strided,
            30.0,
            0,
        )
        .unwrap();
        // 2 memory ops (lw/sw); the other 7 lines, label included, are not.
        assert_eq!(run.mix.memory_ops, 2);
        assert_eq!(run.mix.non_memory_ops, 7);
    }

    #[test]
    fn invalid_mix_percent_rejected() {
        let config = SystemConfig::planar_2d();
        for bad in [-1.0, 100.5, f64::NAN] {
            let err = run_cpu_benchmark(&config, &config, LISTING, AccessPattern::Random, bad, 0);
            assert!(matches!(err, Err(ConfigError::MixPercent(_))));
        }
    }

    #[test]
    fn invalid_config_rejected_before_simulation() {
        let mut bad = SystemConfig::planar_2d();
        bad.cache.l1.size_kb = -4.0;
        let err = run_cpu_benchmark(
            &bad,
            &SystemConfig::stacked_3d(),
            LISTING,
            AccessPattern::Random,
            50.0,
            0,
        );
        assert!(err.is_err());
    }

    #[test]
    fn result_roundtrips_through_json() {
        let run = run_cpu_benchmark(
            &SystemConfig::planar_2d(),
            &SystemConfig::stacked_3d(),
            LISTING,
            AccessPattern::Random,
            50.0,
            42,
        )
        .unwrap();
        let json = serde_json::to_string(&run).unwrap();
        let back: CpuRun = serde_json::from_str(&json).unwrap();
        assert_eq!(run, back);
    }
}
