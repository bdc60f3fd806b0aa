//! CPU budget for the governor wrapping each encode.

use serde::Serialize;

/// Percentage cap handed to the CPU governor.
///
/// Units follow cpulimit: 100 is one fully busy logical CPU, so a host with
/// 8 logical CPUs has a capacity of 800.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CpuBudget {
    logical_cpus: usize,
    share_percent: u32,
}

impl CpuBudget {
    pub fn new(logical_cpus: usize, share_percent: u32) -> Self {
        Self {
            logical_cpus: logical_cpus.max(1),
            share_percent: share_percent.clamp(1, 100),
        }
    }

    /// Budget for this host, from its logical CPU count.
    pub fn from_host(share_percent: u32) -> Self {
        Self::new(num_cpus::get(), share_percent)
    }

    pub fn logical_cpus(&self) -> usize {
        self.logical_cpus
    }

    /// Integer cap: `share` percent of the host's total capacity.
    pub fn limit_percent(&self) -> u32 {
        let capacity = self.logical_cpus as u64 * 100;
        let limit = capacity * u64::from(self.share_percent) / 100;
        u32::try_from(limit).unwrap_or(u32::MAX).max(1)
    }
}
