use stacksim::config::{AccessPattern, GpuConfig, SystemConfig};
use stacksim::cpu::run_cpu_benchmark;
use stacksim::gpu::run_gpu_benchmark;
use stacksim::instructions::ABI_NAMES;
use stacksim::kernel::GpuWorkload;
use stacksim::metrics::{now_ms, write_metrics, LiveMetrics};

/// Vector addition over 16 elements — the bundled demo listing.
const VECTOR_ADD: &str = "\
li x1, 1000 # vector A
li x2, 2000 # vector B
li x3, 3000 # vector C (result)
li x4, 16   # vector length
li x5, 0    # loop counter i
loop:
  slli x6, x5, 2
  add x7, x1, x6
  add x8, x2, x6
  lw x9, 0(x7)
  lw x10, 0(x8)
  add x11, x9, x10
  add x12, x3, x6
  sw x11, 0(x12)
  addi x5, x5, 1
  blt x5, x4, loop";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // --- CPU: planar baseline vs 3D-stacked memory ---
    let config_2d = SystemConfig::planar_2d();
    let config_3d = SystemConfig::stacked_3d();

    let run = run_cpu_benchmark(&config_2d, &config_3d, VECTOR_ADD, AccessPattern::Random, 50.0, 42)?;
    let r = &run.result;

    println!(
        "[stacksim] CPU workload: {} instructions ({} mem, {} other)",
        run.mix.total(),
        run.mix.memory_ops,
        run.mix.non_memory_ops,
    );
    println!(
        "  2D baseline : {:.1} cycles | AMAT {:.2} | IPC {:.4} | {:.2} W | {:.1} °C",
        r.baseline.total_cycles,
        r.baseline.amat,
        r.baseline.ipc,
        r.baseline.power.total_w,
        r.baseline.operating_temp_c,
    );
    println!(
        "  3D stacked  : {:.1} cycles | AMAT {:.2} | IPC {:.4} | {:.2} W | {:.1} °C",
        r.stacked.total_cycles,
        r.stacked.amat,
        r.stacked.ipc,
        r.stacked.power.total_w,
        r.stacked.operating_temp_c,
    );
    println!("  improvement : {:.1}% fewer cycles with stacking", r.improvement_percent);
    // Display-only register fill, eight registers per line.
    println!("  final registers:");
    for chunk in (0..32).collect::<Vec<_>>().chunks(8) {
        let line: Vec<String> = chunk
            .iter()
            .map(|&i| format!("x{i:<2}({:>5}) = {:>3}", ABI_NAMES[i], run.registers.regs[i]))
            .collect();
        println!("    {}", line.join("  "));
    }

    // --- GPU: large GEMM on the reference card, live metrics for viz ---
    let card = GpuConfig::default_card();
    let workload = GpuWorkload::gemm_large();
    let pattern = AccessPattern::Strided;

    let mut live = LiveMetrics {
        status: "running".to_string(),
        workload_name: workload.name.clone(),
        access_pattern: pattern.to_string(),
        ambient_temp_c: card.ambient_temp_c,
        throttle_temp_c: card.throttle_temp_c,
        peak_temp_c: card.ambient_temp_c,
        base_clock_ghz: card.clock_ghz,
        current_clock_ghz: card.clock_ghz,
        ..LiveMetrics::default()
    };
    let cores = (card.cores as usize).min(stacksim::gpu::MAX_TRACKED_CORES);
    live.grid_cols = (cores as f64).sqrt().ceil() as usize;
    live.grid_rows = cores.div_ceil(live.grid_cols);

    let mut observer = |tick: &stacksim::gpu::GpuTickSnapshot| {
        live.update_from_tick(tick);
        write_metrics(&live);
    };

    println!("[stacksim] GPU workload: '{}' ({} pattern)", workload.name, pattern);
    let result = run_gpu_benchmark(&card, &workload, pattern, 42, Some(&mut observer))?;

    live.status = "complete".to_string();
    live.timestamp_ms = now_ms();
    write_metrics(&live);

    println!(
        "  kernel {:.0} ms | compute {:.1} ms | memory {:.1} ms | {}",
        result.kernel_time_ms,
        result.compute_time_ms,
        result.memory_time_ms,
        if result.memory_bound { "memory bound" } else { "compute bound" },
    );
    println!(
        "  peak {:.1} °C | avg clock {:.2} GHz | throttled {:.0} ms | {:.0} W avg | util {:.0}%",
        result.peak_temp_c,
        result.avg_clock_ghz,
        result.throttle_time_ms,
        result.avg_power_w,
        result.avg_core_utilization * 100.0,
    );
    println!(
        "  L2 hit rate {:.1}% | throughput {:.1} GB/s | peak {:.2} TFLOPs",
        result.l2_hit_rate * 100.0,
        result.throughput_gbps,
        result.theoretical_tflops,
    );

    Ok(())
}
