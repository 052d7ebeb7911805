/// Kernel workload descriptions for the GPU simulation.
///
/// A workload captures the intrinsic compute/memory shape of a kernel —
/// operations and bytes per item, item count, and how cache-friendly its
/// access stream is — independent of the hardware it runs on.
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Hardware-independent description of one kernel's work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuWorkload {
    pub name: String,
    /// Arithmetic operations per work item
    pub ops_per_item: f64,
    /// Bytes moved per work item
    pub data_per_item_bytes: f64,
    /// Number of work items
    pub total_items: f64,
    /// Intrinsic L2 hit probability under ideal conditions, 0..=1
    pub locality_factor: f64,
}

impl GpuWorkload {
    pub fn new(
        name: &str,
        ops_per_item: f64,
        data_per_item_bytes: f64,
        total_items: f64,
        locality_factor: f64,
    ) -> Self {
        GpuWorkload {
            name: name.to_string(),
            ops_per_item,
            data_per_item_bytes,
            total_items,
            locality_factor,
        }
    }

    /// Dense 4096×4096 matrix multiply: 2 ops per MAC over the K dimension,
    /// strided but cache-friendly.
    pub fn gemm_large() -> Self {
        Self::new("GEMM (large)", 2.0 * 4096.0, 4.0, 4096.0 * 4096.0, 0.9)
    }

    /// 3×3 convolution over a 1K×1K image: high spatial locality.
    pub fn conv_3x3() -> Self {
        Self::new("Convolution 3x3", 2.0 * 9.0, 4.0, 1024.0 * 1024.0, 0.98)
    }

    /// Simplified attention: dense score matrix per row, mixed access.
    pub fn attention() -> Self {
        Self::new("Attention", 2.0 * 256.0 * 256.0, 4.0, 256.0, 0.7)
    }

    /// All-pairs N-body at 32K bodies: memory bound at this scale.
    pub fn nbody_large() -> Self {
        Self::new("N-body (large)", 20.0 * 32768.0, 24.0, 32768.0, 0.5)
    }

    /// 5-point 2D stencil over a 4K×4K grid.
    pub fn stencil_2d() -> Self {
        Self::new("Stencil 2D", 5.0, 20.0, 4096.0 * 4096.0, 0.98)
    }

    /// Parallel sum reduction over 100M elements: streaming, low reuse.
    pub fn reduction_sum() -> Self {
        Self::new("Reduction (sum)", 1.0, 4.0, 100_000_000.0, 0.4)
    }

    /// Histogram over 100M elements: random scatter, cache-hostile.
    pub fn histogram() -> Self {
        Self::new("Histogram", 2.0, 4.0, 100_000_000.0, 0.1)
    }

    /// BVH ray traversal at 1080p: incoherent pointer chasing.
    pub fn ray_tracing_bvh() -> Self {
        Self::new("Ray tracing (BVH)", 80.0, 60.0, 1920.0 * 1080.0, 0.6)
    }

    /// SHA-256 over 100K blocks: compute dense, almost perfectly local.
    pub fn sha256() -> Self {
        Self::new("SHA-256", 64.0 * 8.0, 64.0, 100_000.0, 0.99)
    }

    /// User-defined starting point.
    pub fn custom() -> Self {
        Self::new("Custom", 100.0, 50.0, 1_000_000.0, 0.5)
    }

    /// Total bytes the kernel moves through the memory system.
    pub fn total_data_bytes(&self) -> f64 {
        self.data_per_item_bytes * self.total_items
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ops_per_item < 0.0 || !self.ops_per_item.is_finite() {
            return Err(ConfigError::Workload { field: "ops_per_item", value: self.ops_per_item });
        }
        if self.data_per_item_bytes < 0.0 || !self.data_per_item_bytes.is_finite() {
            return Err(ConfigError::Workload {
                field: "data_per_item_bytes",
                value: self.data_per_item_bytes,
            });
        }
        if self.total_items < 0.0 || !self.total_items.is_finite() {
            return Err(ConfigError::Workload { field: "total_items", value: self.total_items });
        }
        if !(0.0..=1.0).contains(&self.locality_factor) {
            return Err(ConfigError::Workload {
                field: "locality_factor",
                value: self.locality_factor,
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
        for workload in [
            GpuWorkload::gemm_large(),
            GpuWorkload::conv_3x3(),
            GpuWorkload::attention(),
            GpuWorkload::nbody_large(),
            GpuWorkload::stencil_2d(),
            GpuWorkload::reduction_sum(),
            GpuWorkload::histogram(),
            GpuWorkload::ray_tracing_bvh(),
            GpuWorkload::sha256(),
            GpuWorkload::custom(),
        ] {
            workload.validate().unwrap();
        }
    }

    #[test]
    fn locality_outside_unit_interval_rejected() {
        let mut workload = GpuWorkload::custom();
        workload.locality_factor = 1.5;
        assert!(workload.validate().is_err());
        workload.locality_factor = -0.1;
        assert!(workload.validate().is_err());
    }

    #[test]
    fn negative_items_rejected() {
        let mut workload = GpuWorkload::custom();
        workload.total_items = -1.0;
        assert!(matches!(
            workload.validate(),
            Err(ConfigError::Workload { field: "total_items", .. })
        ));
    }

    #[test]
    fn total_data_scales_with_items() {
        let workload = GpuWorkload::new("x", 1.0, 8.0, 1000.0, 0.5);
        assert_eq!(workload.total_data_bytes(), 8000.0);
    }
}
