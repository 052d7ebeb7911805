/// Closed-form power/thermal model for the CPU pipeline.
///
/// Energy reference (per instruction):
///   planar DRAM access   — 500 pJ  (off-package bus dominates)
///   stacked DRAM access  —  50 pJ  (TSV path, ~10× cheaper per bit)
///   non-memory op        —  10 pJ
///
/// The thermal resolution is deliberately two-pass rather than iterative:
/// the leakage term sees the temperature produced by dynamic power alone.
/// Iterating to a fixed point would shift every downstream number; the
/// model is calibrated to the two-pass form.
use serde::{Deserialize, Serialize};

use crate::config::ThermalConfig;

/// Energy per memory instruction on a planar design, in pJ.
pub const E_MEM_PLANAR_PJ: f64 = 500.0;
/// Energy per memory instruction on a stacked design, in pJ.
pub const E_MEM_STACKED_PJ: f64 = 50.0;
/// Energy per non-memory instruction, in pJ.
pub const E_NON_MEM_PJ: f64 = 10.0;
/// Fixed core clock for the CPU model, in Hz.
pub const CLOCK_HZ: f64 = 2.0e9;
/// Subthreshold leakage at ambient temperature, in Watts.
pub const LEAKAGE_BASE_W: f64 = 0.5;
/// Leakage grows 8% per 10 °C rise over ambient.
const LEAKAGE_GROWTH_PER_10C: f64 = 1.08;
/// Throttling never slows the core by more than half.
pub const MAX_THROTTLE_PERCENT: f64 = 50.0;

/// Dynamic/static power split in Watts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerBreakdown {
    pub dynamic_w: f64,
    pub static_w: f64,
    pub total_w: f64,
}

/// Cycle, power, and thermal outcome for one system, before cache metrics
/// are attached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerThermalOutcome {
    pub total_cycles: f64,
    pub ipc: f64,
    pub power: PowerBreakdown,
    pub operating_temp_c: f64,
    pub throttling_percent: f64,
}

/// Evaluate cycles, power, temperature, and throttling for one system.
///
/// `memory_ratio` is the externally configured fraction of instructions
/// treated as memory operations (0..=1); `stacked` selects the memory-access
/// energy row. Zero instructions produce an idle outcome rather than a
/// division by zero.
pub fn evaluate(
    total_instructions: u64,
    memory_ratio: f64,
    amat: f64,
    stacked: bool,
    thermal: &ThermalConfig,
) -> PowerThermalOutcome {
    if total_instructions == 0 {
        return PowerThermalOutcome {
            total_cycles: 0.0,
            ipc: 0.0,
            power: PowerBreakdown { dynamic_w: 0.0, static_w: 0.0, total_w: 0.0 },
            operating_temp_c: thermal.ambient_c,
            throttling_percent: 0.0,
        };
    }

    let n = total_instructions as f64;
    // Non-memory ops retire in one cycle; memory ops cost AMAT cycles each.
    let mut total_cycles = n * (1.0 - memory_ratio) + n * memory_ratio * amat;
    let ipc = n / total_cycles;

    let e_mem = if stacked { E_MEM_STACKED_PJ } else { E_MEM_PLANAR_PJ };
    let avg_energy_j = (e_mem * memory_ratio + E_NON_MEM_PJ * (1.0 - memory_ratio)) * 1e-12;
    // E/inst × inst/cycle × cycle/s = J/s
    let dynamic_w = avg_energy_j * ipc * CLOCK_HZ;

    // Pass 1: temperature from dynamic power alone feeds the leakage term.
    let temp_from_dynamic = thermal.ambient_c + dynamic_w * thermal.thermal_resistance_c_per_w;
    let static_w = LEAKAGE_BASE_W
        * LEAKAGE_GROWTH_PER_10C.powf((temp_from_dynamic - thermal.ambient_c) / 10.0);

    // Pass 2: total power sets the operating point.
    let total_w = dynamic_w + static_w;
    let operating_temp_c = thermal.ambient_c + total_w * thermal.thermal_resistance_c_per_w;

    let mut throttling_percent = 0.0;
    if operating_temp_c > thermal.tdp_limit_c {
        throttling_percent =
            ((operating_temp_c - thermal.tdp_limit_c) * 2.0).min(MAX_THROTTLE_PERCENT);
        total_cycles *= 1.0 + throttling_percent / 100.0;
    }

    PowerThermalOutcome {
        total_cycles,
        ipc: n / total_cycles,
        power: PowerBreakdown { dynamic_w, static_w, total_w },
        operating_temp_c,
        throttling_percent,
    }
}
