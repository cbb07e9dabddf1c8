//! Deterministic read-failure injection for the simulated sources.

use crate::error::HwError;

#[derive(Debug, Clone, Default)]
pub struct FaultInjector {
    every: Option<u32>,
    reads: u32,
}

impl FaultInjector {
    /// Fail every `n`th read with a timeout; `0` disables injection.
    pub fn every(n: u32) -> Self {
        Self {
            every: (n > 0).then_some(n),
            reads: 0,
        }
    }

    pub fn check(&mut self) -> Result<(), HwError> {
        self.reads = self.reads.wrapping_add(1);
        match self.every {
            Some(n) if self.reads % n == 0 => {
                tracing::debug!(read = self.reads, "injecting sensor timeout");
                Err(HwError::Timeout)
            }
            _ => Ok(()),
        }
    }
}
