/// Hardware configuration for both simulation pipelines.
///
/// A `SystemConfig` describes one CPU system (cache hierarchy, main memory,
/// optional TSV die stacking, thermal package); a `GpuConfig` describes one
/// GPU card. Both carry preset constructors for the reference designs and
/// validate themselves before a simulation is allowed to start.
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Access patterns
// ---------------------------------------------------------------------------

/// Memory access pattern of the workload being simulated.
///
/// On the CPU side this scales per-level cache miss rates; on the GPU side
/// it adjusts the workload's intrinsic locality factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessPattern {
    /// Consecutive addresses; prefetch-friendly.
    Sequential,
    /// Fixed-stride walks; partially prefetchable.
    Strided,
    /// No exploitable spatial locality.
    Random,
}

impl AccessPattern {
    /// Miss-rate multiplier applied uniformly to every cache level.
    pub fn miss_multiplier(self) -> f64 {
        match self {
            AccessPattern::Sequential => 0.1,
            AccessPattern::Strided => 0.5,
            AccessPattern::Random => 1.0,
        }
    }
}

impl std::fmt::Display for AccessPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessPattern::Sequential => write!(f, "sequential"),
            AccessPattern::Strided => write!(f, "strided"),
            AccessPattern::Random => write!(f, "random"),
        }
    }
}

// ---------------------------------------------------------------------------
// CPU system configuration
// ---------------------------------------------------------------------------

/// One level of the cache hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheLevelConfig {
    pub enabled: bool,
    /// Capacity in KB
    pub size_kb: f64,
    /// Hit latency in cycles
    pub latency_cycles: f64,
    /// Ways per set
    pub associativity: u32,
}

impl CacheLevelConfig {
    pub fn disabled() -> Self {
        CacheLevelConfig { enabled: false, size_kb: 0.0, latency_cycles: 0.0, associativity: 1 }
    }

    fn validate(&self, level: &'static str) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.size_kb <= 0.0 {
            return Err(ConfigError::CacheLevel {
                level,
                reason: format!("enabled with non-positive size {} KB", self.size_kb),
            });
        }
        if self.latency_cycles < 0.0 {
            return Err(ConfigError::CacheLevel {
                level,
                reason: format!("negative latency {} cycles", self.latency_cycles),
            });
        }
        Ok(())
    }
}

/// Three-level hierarchy, ordered L1 → L2 → L3. A disabled level routes its
/// traffic to the next enabled level or main memory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheHierarchyConfig {
    pub l1: CacheLevelConfig,
    pub l2: CacheLevelConfig,
    pub l3: CacheLevelConfig,
}

/// Main memory (DRAM) parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MainMemoryConfig {
    /// Access latency in cycles
    pub latency_cycles: f64,
    /// Access energy; pJ/bit for planar DRAM, fJ/bit for stacked
    pub power: f64,
    /// Peak bandwidth in GB/s
    pub bandwidth_gbps: f64,
}

/// Through-silicon via parameters. Modeled purely as a fixed latency/energy
/// cost per die-crossing hop; only charged when `enabled`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TsvConfig {
    pub enabled: bool,
    /// Added latency per die crossing, in cycles
    pub latency_cycles: f64,
    /// Energy per transferred bit in fJ
    pub power_per_bit_fj: f64,
}

/// Thermal package parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalConfig {
    /// Ambient temperature in °C
    pub ambient_c: f64,
    /// Logic die TDP budget in Watts
    pub tdp_logic_w: f64,
    /// Memory die TDP budget in Watts (stacked designs only)
    pub tdp_memory_w: f64,
    /// Junction-to-ambient resistance in °C/W
    pub thermal_resistance_c_per_w: f64,
    /// Temperature at which throttling begins, in °C
    pub tdp_limit_c: f64,
}

/// Full CPU system description: memory hierarchy plus thermal package.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub main_memory: MainMemoryConfig,
    pub cache: CacheHierarchyConfig,
    pub tsv: TsvConfig,
    pub thermal: ThermalConfig,
}

impl SystemConfig {
    /// Planar baseline: off-package DRAM over a conventional bus.
    pub fn planar_2d() -> Self {
        SystemConfig {
            main_memory: MainMemoryConfig {
                latency_cycles: 200.0,
                power: 10.5, // pJ/bit
                bandwidth_gbps: 25.6,
            },
            cache: CacheHierarchyConfig {
                l1: CacheLevelConfig { enabled: true, size_kb: 32.0, latency_cycles: 4.0, associativity: 8 },
                l2: CacheLevelConfig { enabled: true, size_kb: 256.0, latency_cycles: 12.0, associativity: 8 },
                l3: CacheLevelConfig { enabled: true, size_kb: 2048.0, latency_cycles: 35.0, associativity: 16 },
            },
            tsv: TsvConfig { enabled: false, latency_cycles: 0.0, power_per_bit_fj: 0.0 },
            thermal: ThermalConfig {
                ambient_c: 25.0,
                tdp_logic_w: 65.0,
                tdp_memory_w: 0.0,
                thermal_resistance_c_per_w: 0.8,
                tdp_limit_c: 95.0,
            },
        }
    }

    /// 3D-stacked design: DRAM dies bonded on top of the logic die, linked by
    /// TSVs. Shorter memory path, tighter thermal envelope.
    pub fn stacked_3d() -> Self {
        SystemConfig {
            main_memory: MainMemoryConfig {
                latency_cycles: 60.0,
                power: 0.1, // fJ/bit
                bandwidth_gbps: 1024.0,
            },
            cache: CacheHierarchyConfig {
                l1: CacheLevelConfig { enabled: true, size_kb: 32.0, latency_cycles: 4.0, associativity: 8 },
                l2: CacheLevelConfig { enabled: true, size_kb: 256.0, latency_cycles: 8.0, associativity: 8 },
                l3: CacheLevelConfig { enabled: true, size_kb: 2048.0, latency_cycles: 20.0, associativity: 16 },
            },
            tsv: TsvConfig { enabled: true, latency_cycles: 1.0, power_per_bit_fj: 5.0 },
            thermal: ThermalConfig {
                ambient_c: 25.0,
                tdp_logic_w: 75.0,
                tdp_memory_w: 15.0,
                thermal_resistance_c_per_w: 1.2,
                tdp_limit_c: 95.0,
            },
        }
    }

    /// TSV latency charged per die-crossing hop, zero for planar designs.
    pub fn hop_latency(&self) -> f64 {
        if self.tsv.enabled { self.tsv.latency_cycles } else { 0.0 }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.l1.validate("L1")?;
        self.cache.l2.validate("L2")?;
        self.cache.l3.validate("L3")?;
        if self.main_memory.latency_cycles <= 0.0 {
            return Err(ConfigError::MainMemory(format!(
                "non-positive latency {} cycles",
                self.main_memory.latency_cycles
            )));
        }
        if self.main_memory.bandwidth_gbps <= 0.0 {
            return Err(ConfigError::MainMemory(format!(
                "non-positive bandwidth {} GB/s",
                self.main_memory.bandwidth_gbps
            )));
        }
        if self.tsv.enabled && self.tsv.latency_cycles < 0.0 {
            return Err(ConfigError::MainMemory(format!(
                "negative TSV latency {} cycles",
                self.tsv.latency_cycles
            )));
        }
        if self.thermal.thermal_resistance_c_per_w <= 0.0 {
            return Err(ConfigError::Thermal(format!(
                "non-positive thermal resistance {} °C/W",
                self.thermal.thermal_resistance_c_per_w
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GPU configuration
// ---------------------------------------------------------------------------

/// GPU card description for the time-stepped kernel simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpuConfig {
    /// Number of shader cores
    pub cores: u32,
    /// Base clock in GHz
    pub clock_ghz: f64,
    /// Memory bandwidth in GB/s
    pub memory_bandwidth_gbps: f64,
    /// Shared L2 capacity in KB
    pub l2_size_kb: f64,
    /// L2 hit latency in cycles
    pub l2_latency_cycles: f64,
    /// L2 ways per set
    pub l2_associativity: u32,
    /// Multiplier on the workload's ops/item
    pub computational_intensity: f64,
    /// Board power limit in Watts
    pub max_power_w: f64,
    /// Junction-to-case resistance in °C/W
    pub junction_to_case_r: f64,
    /// Case-to-ambient resistance in °C/W
    pub case_to_ambient_r: f64,
    /// Temperature at which the clock is reduced, in °C
    pub throttle_temp_c: f64,
    /// Ambient temperature in °C
    pub ambient_temp_c: f64,
    /// Thermal mass per core in J/°C
    pub thermal_capacitance_j_per_c: f64,
}

impl GpuConfig {
    /// Mid-range reference card: 1024 cores, 1.5 GHz, 4 MB L2, 250 W.
    pub fn default_card() -> Self {
        GpuConfig {
            cores: 1024,
            clock_ghz: 1.5,
            memory_bandwidth_gbps: 512.0,
            l2_size_kb: 4096.0,
            l2_latency_cycles: 20.0,
            l2_associativity: 16,
            computational_intensity: 1.0,
            max_power_w: 250.0,
            junction_to_case_r: 0.2,
            case_to_ambient_r: 0.15,
            throttle_temp_c: 90.0,
            ambient_temp_c: 25.0,
            thermal_capacitance_j_per_c: 4.0,
        }
    }

    /// Combined junction-to-ambient resistance in °C/W.
    pub fn total_resistance(&self) -> f64 {
        self.junction_to_case_r + self.case_to_ambient_r
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cores == 0 {
            return Err(ConfigError::Gpu { field: "cores", value: 0.0 });
        }
        if self.clock_ghz <= 0.0 {
            return Err(ConfigError::Gpu { field: "clock_ghz", value: self.clock_ghz });
        }
        if self.memory_bandwidth_gbps <= 0.0 {
            return Err(ConfigError::Gpu {
                field: "memory_bandwidth_gbps",
                value: self.memory_bandwidth_gbps,
            });
        }
        if self.l2_latency_cycles < 0.0 {
            return Err(ConfigError::Gpu {
                field: "l2_latency_cycles",
                value: self.l2_latency_cycles,
            });
        }
        if self.computational_intensity < 0.0 {
            return Err(ConfigError::Gpu {
                field: "computational_intensity",
                value: self.computational_intensity,
            });
        }
        if self.max_power_w < 0.0 {
            return Err(ConfigError::Gpu { field: "max_power_w", value: self.max_power_w });
        }
        if self.total_resistance() <= 0.0 {
            return Err(ConfigError::Gpu {
                field: "thermal resistance",
                value: self.total_resistance(),
            });
        }
        if self.thermal_capacitance_j_per_c <= 0.0 {
            return Err(ConfigError::Gpu {
                field: "thermal_capacitance_j_per_c",
                value: self.thermal_capacitance_j_per_c,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        SystemConfig::planar_2d().validate().unwrap();
        SystemConfig::stacked_3d().validate().unwrap();
        GpuConfig::default_card().validate().unwrap();
    }

    #[test]
    fn enabled_level_with_zero_size_rejected() {
        let mut config = SystemConfig::planar_2d();
        config.cache.l2.size_kb = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CacheLevel { level: "L2", .. })
        ));
    }

    #[test]
    fn negative_latency_rejected() {
        let mut config = SystemConfig::planar_2d();
        config.cache.l1.latency_cycles = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn disabled_level_skips_validation() {
        let mut config = SystemConfig::planar_2d();
        config.cache.l3 = CacheLevelConfig::disabled();
        config.validate().unwrap();
    }

    #[test]
    fn gpu_zero_cores_rejected() {
        let mut config = GpuConfig::default_card();
        config.cores = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Gpu { field: "cores", .. })));
    }

    #[test]
    fn gpu_zero_capacitance_rejected() {
        let mut config = GpuConfig::default_card();
        config.thermal_capacitance_j_per_c = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn hop_latency_zero_when_tsv_disabled() {
        let planar = SystemConfig::planar_2d();
        let stacked = SystemConfig::stacked_3d();
        assert_eq!(planar.hop_latency(), 0.0);
        assert_eq!(stacked.hop_latency(), 1.0);
    }

    #[test]
    fn system_config_roundtrips_through_json() {
        let config = SystemConfig::stacked_3d();
        let json = serde_json::to_string(&config).unwrap();
        let back: SystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn gpu_config_roundtrips_through_json() {
        let config = GpuConfig::default_card();
        let json = serde_json::to_string(&config).unwrap();
        let back: GpuConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
