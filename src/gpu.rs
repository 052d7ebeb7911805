/// Time-stepped GPU kernel simulation.
///
/// A `GpuSimulation` owns all of its state and advances in fixed 20 ms
/// simulated ticks: work accumulates at the current clock, moving hotspots
/// shape per-core power draw, core temperatures integrate a lumped RC
/// model, and the clock throttles when the hottest core crosses the limit.
/// The run is a pure function of (config, workload, pattern, seed); the
/// optional per-tick observer is presentation only and cannot influence
/// the result.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::{AccessPattern, GpuConfig};
use crate::error::ConfigError;
use crate::kernel::GpuWorkload;

/// Simulated wall time per tick, in milliseconds.
pub const SIM_TICK_MS: f64 = 20.0;
/// Safety bound on total ticks (20 000 simulated seconds); a run that hits
/// it returns best-effort metrics with `tick_budget_exhausted` set.
pub const MAX_TICKS: u64 = 1_000_000;
/// Thermal state is tracked for at most this many cores.
pub const MAX_TRACKED_CORES: usize = 256;

/// Clock reduction per °C of excess over the throttle limit.
const THROTTLE_SLOPE_PER_C: f64 = 0.05;
/// The clock never drops below this fraction of base.
const MIN_THROTTLE_FACTOR: f64 = 0.1;
/// Clock recovery toward base per tick once the die cools down.
const CLOCK_RECOVERY_PER_TICK: f64 = 0.02;
/// Sequential access cannot push locality past this hit rate.
const MAX_SEQUENTIAL_LOCALITY: f64 = 0.995;

/// Moving source of elevated power density on the core grid.
#[derive(Debug, Clone, Copy)]
struct Hotspot {
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    intensity: f64,
}

/// Live per-tick observation, for dashboards and progress reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuTickSnapshot {
    pub tick: u64,
    pub elapsed_ms: f64,
    pub ops_completed: f64,
    pub current_clock_ghz: f64,
    pub throttling: bool,
    /// Fraction of required operations completed, 0..=1
    pub progress: f64,
    pub core_temps_c: Vec<f64>,
}

/// Final snapshot of a completed (or budget-capped) simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuBenchmarkResult {
    pub workload_name: String,
    pub config: GpuConfig,
    pub access_pattern: AccessPattern,
    /// Peak arithmetic throughput at base clock, assuming 2 FLOPs/cycle/core
    pub theoretical_tflops: f64,
    pub kernel_time_ms: f64,
    pub compute_time_ms: f64,
    pub memory_time_ms: f64,
    pub l2_hit_rate: f64,
    pub throughput_gbps: f64,
    pub memory_bound: bool,
    pub peak_temp_c: f64,
    pub avg_clock_ghz: f64,
    pub throttle_time_ms: f64,
    pub avg_power_w: f64,
    /// Achieved fraction of the FLOPs possible at the average clock, 0..=1
    pub avg_core_utilization: f64,
    /// Final per-core temperatures; length = min(cores, 256)
    pub core_temps_c: Vec<f64>,
    /// True when the tick safety bound cut the run short
    pub tick_budget_exhausted: bool,
}

/// One simulation run's complete state.
pub struct GpuSimulation {
    config: GpuConfig,
    workload: GpuWorkload,
    pattern: AccessPattern,
    required_ops: f64,
    effective_locality: f64,
    cols: usize,
    rows: usize,
    temps: Vec<f64>,
    hotspots: Vec<Hotspot>,
    ops_completed: f64,
    elapsed_ms: f64,
    ticks: u64,
    current_clock_ghz: f64,
    clock_sum_ghz: f64,
    peak_temp_c: f64,
    throttle_time_ms: f64,
    throttling: bool,
}

/// Locality after the run-time access pattern is applied on top of the
/// workload's intrinsic factor.
fn effective_locality(workload: &GpuWorkload, pattern: AccessPattern) -> f64 {
    match pattern {
        AccessPattern::Sequential => (workload.locality_factor * 1.2).min(MAX_SEQUENTIAL_LOCALITY),
        AccessPattern::Strided => workload.locality_factor,
        AccessPattern::Random => workload.locality_factor * 0.4,
    }
}

impl GpuSimulation {
    /// Validate the inputs and set up grid, temperatures, and hotspots.
    /// Everything after this point is deterministic in `seed`.
    pub fn new(
        config: &GpuConfig,
        workload: &GpuWorkload,
        pattern: AccessPattern,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        workload.validate()?;

        let tracked = (config.cores as usize).min(MAX_TRACKED_CORES);
        let cols = (tracked as f64).sqrt().ceil() as usize;
        let rows = tracked.div_ceil(cols);

        let mut rng = StdRng::seed_from_u64(seed);
        let num_hotspots = (tracked / 16).max(1);
        let hotspots = (0..num_hotspots)
            .map(|_| Hotspot {
                x: rng.gen_range(0.0..cols as f64),
                y: rng.gen_range(0.0..rows as f64),
                vx: rng.gen_range(-0.25..0.25),
                vy: rng.gen_range(-0.25..0.25),
                intensity: rng.gen_range(0.5..1.0),
            })
            .collect();

        Ok(GpuSimulation {
            config: *config,
            workload: workload.clone(),
            pattern,
            required_ops: workload.ops_per_item
                * workload.total_items
                * config.computational_intensity,
            effective_locality: effective_locality(workload, pattern),
            cols,
            rows,
            temps: vec![config.ambient_temp_c; tracked],
            hotspots,
            ops_completed: 0.0,
            elapsed_ms: 0.0,
            ticks: 0,
            current_clock_ghz: config.clock_ghz,
            clock_sum_ghz: 0.0,
            peak_temp_c: config.ambient_temp_c,
            throttle_time_ms: 0.0,
            throttling: false,
        })
    }

    pub fn required_ops(&self) -> f64 {
        self.required_ops
    }

    pub fn done(&self) -> bool {
        self.ops_completed >= self.required_ops
    }

    /// Advance the simulation by one 20 ms tick.
    pub fn step(&mut self) {
        let dt_s = SIM_TICK_MS / 1000.0;
        let config = &self.config;

        // Work performed at the clock that survived the previous tick.
        self.ops_completed += config.cores as f64 * self.current_clock_ghz * 1e9 * dt_s;

        // Hotspots wander and reflect off the grid edges.
        for h in &mut self.hotspots {
            h.x += h.vx;
            h.y += h.vy;
            if h.x < 0.0 || h.x > self.cols as f64 {
                h.vx = -h.vx;
            }
            if h.y < 0.0 || h.y > self.rows as f64 {
                h.vy = -h.vy;
            }
        }

        // Per-core thermal integration: generated heat minus dissipation
        // through the junction-to-ambient path.
        let total_resistance = config.total_resistance();
        let capacitance = config.thermal_capacitance_j_per_c;
        let power_per_core = (config.max_power_w / config.cores as f64)
            * (self.current_clock_ghz / config.clock_ghz);
        let falloff = self.rows.min(self.cols) as f64 * 0.5;

        let mut max_temp = f64::NEG_INFINITY;
        for (i, temp) in self.temps.iter_mut().enumerate() {
            let x = (i % self.cols) as f64;
            let y = (i / self.cols) as f64;

            let mut hotspot_factor = 1.0;
            for h in &self.hotspots {
                let dist_sq = (x - h.x).powi(2) + (y - h.y).powi(2);
                hotspot_factor += h.intensity * (-dist_sq / falloff).exp();
            }

            let power = power_per_core * hotspot_factor;
            let generated = power / capacitance * dt_s;
            let dissipated =
                (*temp - config.ambient_temp_c) / total_resistance / capacitance * dt_s;
            *temp += generated - dissipated;
            max_temp = max_temp.max(*temp);
        }
        self.peak_temp_c = self.peak_temp_c.max(max_temp);

        // Throttle against the hottest core; recover 2%/tick otherwise.
        if max_temp > config.throttle_temp_c {
            let excess = max_temp - config.throttle_temp_c;
            let factor = (1.0 - excess * THROTTLE_SLOPE_PER_C).max(MIN_THROTTLE_FACTOR);
            self.current_clock_ghz = config.clock_ghz * factor;
            self.throttle_time_ms += SIM_TICK_MS;
            self.throttling = true;
        } else {
            self.current_clock_ghz = (self.current_clock_ghz
                + config.clock_ghz * CLOCK_RECOVERY_PER_TICK)
                .min(config.clock_ghz);
            self.throttling = false;
        }

        self.elapsed_ms += SIM_TICK_MS;
        self.ticks += 1;
        self.clock_sum_ghz += self.current_clock_ghz;
    }

    /// Observation of the current tick, for live dashboards.
    pub fn snapshot(&self) -> GpuTickSnapshot {
        let progress = if self.required_ops > 0.0 {
            (self.ops_completed / self.required_ops).min(1.0)
        } else {
            1.0
        };
        GpuTickSnapshot {
            tick: self.ticks,
            elapsed_ms: self.elapsed_ms,
            ops_completed: self.ops_completed,
            current_clock_ghz: self.current_clock_ghz,
            throttling: self.throttling,
            progress,
            core_temps_c: self.temps.clone(),
        }
    }

    pub fn grid_dims(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Derive the final metrics from the accumulated state.
    pub fn finish(self, tick_budget_exhausted: bool) -> GpuBenchmarkResult {
        let config = &self.config;
        let avg_clock_ghz =
            if self.ticks > 0 { self.clock_sum_ghz / self.ticks as f64 } else { 0.0 };

        let theoretical_tflops = config.cores as f64 * config.clock_ghz * 2.0 / 1000.0;
        let compute_time_ms = if avg_clock_ghz > 0.0 {
            self.required_ops / (config.cores as f64 * avg_clock_ghz * 1e9) * 1000.0
        } else {
            0.0
        };

        // Memory side: streaming time at peak bandwidth plus the latency of
        // the L2 misses the access pattern produces.
        let data_bytes = self.workload.total_data_bytes();
        let miss_rate = 1.0 - self.effective_locality;
        let penalty_time_ms = if avg_clock_ghz > 0.0 {
            config.l2_latency_cycles * miss_rate / (avg_clock_ghz * 1e9) * 1000.0
        } else {
            0.0
        };
        let base_memory_time_ms = data_bytes / (config.memory_bandwidth_gbps * 1e9) * 1000.0;
        let memory_time_ms = base_memory_time_ms + penalty_time_ms;

        let kernel_time_ms = self.elapsed_ms;
        let throughput_gbps = if kernel_time_ms > 0.0 {
            data_bytes / (kernel_time_ms / 1000.0) / 1e9
        } else {
            0.0
        };

        let avg_power_w = config.max_power_w * (avg_clock_ghz / config.clock_ghz);

        let max_possible_ops =
            config.cores as f64 * avg_clock_ghz * 1e9 * (kernel_time_ms / 1000.0) * 2.0;
        let avg_core_utilization = if max_possible_ops > 0.0 {
            (self.required_ops / max_possible_ops).min(1.0)
        } else {
            0.0
        };

        GpuBenchmarkResult {
            workload_name: self.workload.name.clone(),
            config: self.config,
            access_pattern: self.pattern,
            theoretical_tflops,
            kernel_time_ms,
            compute_time_ms,
            memory_time_ms,
            l2_hit_rate: self.effective_locality,
            throughput_gbps,
            memory_bound: memory_time_ms > compute_time_ms,
            peak_temp_c: self.peak_temp_c,
            avg_clock_ghz,
            throttle_time_ms: self.throttle_time_ms,
            avg_power_w,
            avg_core_utilization,
            core_temps_c: self.temps,
            tick_budget_exhausted,
        }
    }
}

/// Run a workload to completion on the given card.
///
/// Returns immediately with a zero-time result when the workload requires
/// no operations. The observer, when present, is called once per tick with
/// a snapshot; skipping or dropping calls changes nothing downstream.
pub fn run_gpu_benchmark(
    config: &GpuConfig,
    workload: &GpuWorkload,
    pattern: AccessPattern,
    seed: u64,
    mut observer: Option<&mut dyn FnMut(&GpuTickSnapshot)>,
) -> Result<GpuBenchmarkResult, ConfigError> {
    let mut sim = GpuSimulation::new(config, workload, pattern, seed)?;

    if sim.required_ops() <= 0.0 {
        return Ok(sim.finish(false));
    }

    let mut budget_exhausted = false;
    loop {
        sim.step();
        if let Some(observer) = observer.as_deref_mut() {
            observer(&sim.snapshot());
        }
        if sim.done() {
            break;
        }
        if sim.ticks >= MAX_TICKS {
            budget_exhausted = true;
            break;
        }
    }

    Ok(sim.finish(budget_exhausted))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_card() -> GpuConfig {
        GpuConfig { cores: 64, ..GpuConfig::default_card() }
    }

    fn quick_workload() -> GpuWorkload {
        // 64 cores * 1.5 GHz * 20 ms = 1.92e9 ops/tick; finishes in a few ticks.
        GpuWorkload::new("quick", 100.0, 8.0, 50_000_000.0, 0.8)
    }

    #[test]
    fn completes_and_reports_consistent_metrics() {
        let result = run_gpu_benchmark(
            &small_card(),
            &quick_workload(),
            AccessPattern::Strided,
            1,
            None,
        )
        .unwrap();
        assert!(result.kernel_time_ms > 0.0);
        assert!(result.avg_clock_ghz > 0.0);
        assert!(result.peak_temp_c >= small_card().ambient_temp_c);
        assert_eq!(result.core_temps_c.len(), 64);
        assert!(!result.tick_budget_exhausted);
        // 64 cores * 1.5 GHz * 2 = 0.192 TFLOPs
        assert!((result.theoretical_tflops - 0.192).abs() < 1e-12);
    }

    #[test]
    fn utilization_stays_in_unit_interval() {
        for pattern in [AccessPattern::Sequential, AccessPattern::Strided, AccessPattern::Random] {
            let result =
                run_gpu_benchmark(&small_card(), &quick_workload(), pattern, 3, None).unwrap();
            assert!((0.0..=1.0).contains(&result.avg_core_utilization));
        }
    }

    #[test]
    fn zero_item_workload_finishes_immediately() {
        let workload = GpuWorkload::new("empty", 100.0, 8.0, 0.0, 0.5);
        let mut ticks_seen = 0u64;
        let mut observer = |_: &GpuTickSnapshot| ticks_seen += 1;
        let result = run_gpu_benchmark(
            &small_card(),
            &workload,
            AccessPattern::Strided,
            1,
            Some(&mut observer),
        )
        .unwrap();
        assert_eq!(ticks_seen, 0);
        assert_eq!(result.kernel_time_ms, 0.0);
        assert_eq!(result.throttle_time_ms, 0.0);
        assert_eq!(result.avg_core_utilization, 0.0);
        assert!(result.core_temps_c.iter().all(|&t| t == 25.0));
    }

    #[test]
    fn throttle_below_ambient_caps_clock_from_first_tick() {
        let config = GpuConfig { throttle_temp_c: 10.0, ..small_card() };
        let result =
            run_gpu_benchmark(&config, &quick_workload(), AccessPattern::Strided, 1, None)
                .unwrap();
        assert!(result.avg_clock_ghz < config.clock_ghz);
        assert!(result.throttle_time_ms > 0.0);
        assert_eq!(result.throttle_time_ms, result.kernel_time_ms);
    }

    #[test]
    fn same_seed_reproduces_the_run() {
        let a = run_gpu_benchmark(&small_card(), &quick_workload(), AccessPattern::Random, 9, None)
            .unwrap();
        let b = run_gpu_benchmark(&small_card(), &quick_workload(), AccessPattern::Random, 9, None)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn observer_does_not_change_the_result() {
        let mut snapshots = Vec::new();
        let mut observer = |s: &GpuTickSnapshot| snapshots.push(s.clone());
        let watched = run_gpu_benchmark(
            &small_card(),
            &quick_workload(),
            AccessPattern::Strided,
            5,
            Some(&mut observer),
        )
        .unwrap();
        let unwatched =
            run_gpu_benchmark(&small_card(), &quick_workload(), AccessPattern::Strided, 5, None)
                .unwrap();
        assert_eq!(watched, unwatched);
        assert!(!snapshots.is_empty());
        let last = snapshots.last().unwrap();
        assert_eq!(last.elapsed_ms, watched.kernel_time_ms);
        assert_eq!(last.progress, 1.0);
    }

    #[test]
    fn access_pattern_shifts_l2_hit_rate() {
        let workload = quick_workload(); // intrinsic locality 0.8
        let config = small_card();
        let seq =
            run_gpu_benchmark(&config, &workload, AccessPattern::Sequential, 1, None).unwrap();
        let strided =
            run_gpu_benchmark(&config, &workload, AccessPattern::Strided, 1, None).unwrap();
        let random =
            run_gpu_benchmark(&config, &workload, AccessPattern::Random, 1, None).unwrap();
        assert!((seq.l2_hit_rate - 0.96).abs() < 1e-12);
        assert!((strided.l2_hit_rate - 0.8).abs() < 1e-12);
        assert!((random.l2_hit_rate - 0.32).abs() < 1e-12);
    }

    #[test]
    fn sequential_locality_capped() {
        let workload = GpuWorkload::new("local", 10.0, 4.0, 1000.0, 0.9);
        let sim =
            GpuSimulation::new(&small_card(), &workload, AccessPattern::Sequential, 1).unwrap();
        assert_eq!(sim.effective_locality, 0.995);
    }

    #[test]
    fn tracked_cores_capped_at_256() {
        let config = GpuConfig { cores: 4096, ..GpuConfig::default_card() };
        let workload = GpuWorkload::new("tiny", 1.0, 4.0, 1000.0, 0.5);
        let result =
            run_gpu_benchmark(&config, &workload, AccessPattern::Strided, 1, None).unwrap();
        assert_eq!(result.core_temps_c.len(), 256);
    }

    #[test]
    fn tick_budget_reports_partial_result() {
        // 1 core at the minimum clock makes the required ops unreachable
        // within the budget.
        let config = GpuConfig { cores: 1, clock_ghz: 0.001, ..GpuConfig::default_card() };
        let workload = GpuWorkload::new("endless", 1.0, 4.0, 1e15, 0.5);
        let result =
            run_gpu_benchmark(&config, &workload, AccessPattern::Strided, 1, None).unwrap();
        assert!(result.tick_budget_exhausted);
        assert_eq!(result.kernel_time_ms, MAX_TICKS as f64 * SIM_TICK_MS);
        assert!(result.avg_clock_ghz > 0.0);
    }

    #[test]
    fn result_roundtrips_through_json() {
        let result =
            run_gpu_benchmark(&small_card(), &quick_workload(), AccessPattern::Strided, 2, None)
                .unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let back: GpuBenchmarkResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, back);
    }
}
