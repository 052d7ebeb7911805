/// Instruction-mix classification for assembly-like workload listings.
///
/// The classifier does not decode instructions; it only splits a listing
/// into memory and non-memory operations, which is all the downstream
/// cache/power models consume.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Hard cap on classified instructions; lines beyond it are ignored so a
/// pathological listing cannot stall the caller.
pub const MAX_INSTRUCTIONS: u64 = 10_000;

/// Memory vs. non-memory operation counts for one listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InstructionMix {
    pub memory_ops: u64,
    pub non_memory_ops: u64,
    /// True when the listing exceeded `MAX_INSTRUCTIONS` and was cut short.
    pub truncated: bool,
}

impl InstructionMix {
    pub fn total(&self) -> u64 {
        self.memory_ops + self.non_memory_ops
    }

    /// Fraction of classified instructions that touch memory.
    pub fn memory_fraction(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.memory_ops as f64 / total as f64
    }
}

/// Classify a listing into memory and non-memory operations.
///
/// Blank lines and `#` comment lines are skipped. A line counts as a memory
/// operation when its text contains `lw` or `sw` anywhere — a substring
/// check, not a decoder, so a label such as `swap_loop:` is miscounted as a
/// store. Kept intentionally: the model is calibrated against this
/// approximation.
pub fn classify(source: &str) -> InstructionMix {
    let mut mix = InstructionMix::default();
    for line in source.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if mix.total() >= MAX_INSTRUCTIONS {
            mix.truncated = true;
            break;
        }
        if line.contains("lw") || line.contains("sw") {
            mix.memory_ops += 1;
        } else {
            mix.non_memory_ops += 1;
        }
    }
    mix
}

// ---------------------------------------------------------------------------
// Register display
// ---------------------------------------------------------------------------

/// RISC-V ABI names for the 32 integer registers, indexed by register number.
pub const ABI_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0/fp", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Final register state shown next to a CPU run. Purely didactic — the
/// values are seeded pseudo-random fill and have no bearing on any metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterFile {
    /// x0..x31; x0 is always zero
    pub regs: [u64; 32],
}

impl RegisterFile {
    /// Deterministic for a given seed so tests and replays can pin it.
    pub fn snapshot(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut regs = [0u64; 32];
        for reg in regs.iter_mut().skip(1) {
            *reg = rng.gen_range(0..1000);
        }
        RegisterFile { regs }
    }
}
