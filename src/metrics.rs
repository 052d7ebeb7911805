/// Live metrics for the TUI visualizer.
///
/// The demo binary's tick observer writes a JSON snapshot to METRICS_PATH
/// after every simulated tick. The viz binary polls this file and
/// re-renders the dashboard. Writes are atomic (write to .tmp then rename)
/// to avoid torn reads. Snapshot writes are presentation only: losing or
/// delaying them never changes a simulation result.
use serde::{Deserialize, Serialize};

use crate::gpu::GpuTickSnapshot;

pub const METRICS_PATH: &str = "/tmp/stacksim_live.json";

/// Snapshot of a running (or finished) GPU simulation.
#[derive(Serialize, Deserialize, Default, Clone, Debug)]
pub struct LiveMetrics {
    /// "idle" | "running" | "complete"
    pub status: String,
    pub workload_name: String,
    pub access_pattern: String,
    /// Heatmap grid dimensions (columns, rows)
    pub grid_cols: usize,
    pub grid_rows: usize,
    /// Per-core temperatures in °C — index maps row-major onto the grid
    pub core_temps_c: Vec<f64>,
    pub ambient_temp_c: f64,
    pub throttle_temp_c: f64,
    pub peak_temp_c: f64,
    /// Base clock of the card in GHz
    pub base_clock_ghz: f64,
    pub current_clock_ghz: f64,
    pub throttling: bool,
    /// Completed fraction of the workload [0, 1]
    pub progress: f64,
    pub elapsed_ms: f64,
    pub ops_completed: f64,
    /// Unix timestamp in ms when this snapshot was written
    pub timestamp_ms: u64,
}

impl LiveMetrics {
    /// Fold one simulation tick into the snapshot.
    pub fn update_from_tick(&mut self, tick: &GpuTickSnapshot) {
        self.status = "running".to_string();
        self.core_temps_c = tick.core_temps_c.clone();
        self.current_clock_ghz = tick.current_clock_ghz;
        self.throttling = tick.throttling;
        self.progress = tick.progress;
        self.elapsed_ms = tick.elapsed_ms;
        self.ops_completed = tick.ops_completed;
        self.peak_temp_c = tick
            .core_temps_c
            .iter()
            .copied()
            .fold(self.peak_temp_c, f64::max);
        self.timestamp_ms = now_ms();
    }
}

/// Atomically write metrics to METRICS_PATH.
/// Uses a .tmp intermediate file + rename to avoid torn reads by the viz.
pub fn write_metrics(metrics: &LiveMetrics) {
    if let Ok(json) = serde_json::to_string(metrics) {
        let tmp = format!("{}.tmp", METRICS_PATH);
        if std::fs::write(&tmp, &json).is_ok() {
            let _ = std::fs::rename(&tmp, METRICS_PATH);
        }
    }
}

/// Read the latest metrics snapshot. Returns None if the file doesn't exist
/// or can't be parsed (e.g. no simulation has run yet).
pub fn read_metrics() -> Option<LiveMetrics> {
    let data = std::fs::read_to_string(METRICS_PATH).ok()?;
    serde_json::from_str(&data).ok()
}

/// Returns current Unix time in milliseconds.
pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_update_tracks_peak_and_progress() {
        let mut metrics = LiveMetrics {
            peak_temp_c: 30.0,
            ..LiveMetrics::default()
        };
        let tick = GpuTickSnapshot {
            tick: 3,
            elapsed_ms: 60.0,
            ops_completed: 1e9,
            current_clock_ghz: 1.2,
            throttling: true,
            progress: 0.5,
            core_temps_c: vec![28.0, 45.5, 33.0],
        };
        metrics.update_from_tick(&tick);
        assert_eq!(metrics.status, "running");
        assert_eq!(metrics.peak_temp_c, 45.5);
        assert_eq!(metrics.progress, 0.5);
        assert!(metrics.throttling);
    }

    #[test]
    fn live_metrics_roundtrips_through_json() {
        let metrics = LiveMetrics {
            status: "complete".to_string(),
            workload_name: "GEMM (large)".to_string(),
            core_temps_c: vec![25.0; 4],
            grid_cols: 2,
            grid_rows: 2,
            ..LiveMetrics::default()
        };
        let json = serde_json::to_string(&metrics).unwrap();
        let back: LiveMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.status, "complete");
        assert_eq!(back.core_temps_c.len(), 4);
    }
}
