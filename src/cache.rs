/// Closed-form cache hierarchy model.
///
/// Miss rates are a capacity heuristic, not trace-driven: an enabled level
/// of S KB starts at `1 / (S / 4)` and is scaled by the workload's access
/// pattern. AMAT composes bottom-up from main memory through L3, L2, L1,
/// charging the TSV die-crossing latency on each hop an enabled level takes
/// in a stacked design.
use serde::{Deserialize, Serialize};

use crate::config::{AccessPattern, CacheLevelConfig, SystemConfig};

/// Hit/miss split for one cache level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheLevelMetrics {
    pub hit_rate: f64,
    pub miss_rate: f64,
}

impl CacheLevelMetrics {
    fn from_miss_rate(miss_rate: f64) -> Self {
        CacheLevelMetrics { hit_rate: 1.0 - miss_rate, miss_rate }
    }
}

/// Per-level metrics plus the composed average memory access time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheAnalysis {
    /// Average memory access time in cycles
    pub amat: f64,
    pub l1: CacheLevelMetrics,
    pub l2: CacheLevelMetrics,
    pub l3: CacheLevelMetrics,
}

/// Heuristic miss rate for one level under the given access pattern.
///
/// A disabled level misses everything. Size is guarded here as well as at
/// validation time: a non-positive capacity degrades to a 100% miss rate
/// instead of dividing by zero.
pub fn miss_rate(level: &CacheLevelConfig, pattern: AccessPattern) -> f64 {
    if !level.enabled || level.size_kb <= 0.0 {
        return 1.0;
    }
    let base = 1.0 / (level.size_kb / 4.0);
    (base * pattern.miss_multiplier()).min(1.0)
}

/// Compute per-level miss rates and the composed AMAT for one system.
///
/// Composition, bottom-up (tsv = hop latency, 0 for planar designs):
///
///   l3_time = l3.enabled ? l3.lat + m3 * mm.lat          : mm.lat
///   l2_time = l2.enabled ? l2.lat + m2 * (l3_time + tsv) : l3_time
///   amat    = l1.enabled ? l1.lat + m1 * (l2_time + tsv) : l2_time
///
/// A disabled level is pure pass-through: it adds no latency and consumes
/// no die crossing, so with every level disabled AMAT is exactly the main
/// memory latency.
pub fn analyze(config: &SystemConfig, pattern: AccessPattern) -> CacheAnalysis {
    let c = &config.cache;
    let tsv = config.hop_latency();

    let m1 = miss_rate(&c.l1, pattern);
    let m2 = miss_rate(&c.l2, pattern);
    let m3 = miss_rate(&c.l3, pattern);

    let l3_time = if c.l3.enabled {
        c.l3.latency_cycles + m3 * config.main_memory.latency_cycles
    } else {
        config.main_memory.latency_cycles
    };

    let l2_time = if c.l2.enabled {
        c.l2.latency_cycles + m2 * (l3_time + tsv)
    } else {
        l3_time
    };

    let amat = if c.l1.enabled {
        c.l1.latency_cycles + m1 * (l2_time + tsv)
    } else {
        l2_time
    };

    CacheAnalysis {
        amat,
        l1: CacheLevelMetrics::from_miss_rate(m1),
        l2: CacheLevelMetrics::from_miss_rate(m2),
        l3: CacheLevelMetrics::from_miss_rate(m3),
    }
}
