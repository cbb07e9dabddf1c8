//! Caller-side "detect once, hold, then auto-clear" rule for the fall flag.

use crate::config::FallAlertCfg;

/// Change the store should see after one [`FallAlert::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallEdge {
    /// Nothing to write.
    Unchanged,
    /// A fall was just latched; publish `true`.
    Rising,
    /// The hold time elapsed; publish `false`.
    Falling,
}

#[derive(Debug, Clone)]
pub struct FallAlert {
    hold_ms: u32,
    latched_at: Option<u32>,
}

impl FallAlert {
    pub fn new(cfg: FallAlertCfg) -> Self {
        Self {
            hold_ms: cfg.hold_ms,
            latched_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.latched_at.is_some()
    }

    /// Advance the latch with this sample's detection result.
    ///
    /// Detections while latched are ignored. The clear happens on the first
    /// call at or after `latched_at + hold_ms`.
    pub fn update(&mut self, detected: bool, now_ms: u32) -> FallEdge {
        match self.latched_at {
            Some(at) if now_ms.wrapping_sub(at) >= self.hold_ms => {
                self.latched_at = None;
                tracing::info!(now_ms, "fall alert cleared");
                FallEdge::Falling
            }
            Some(_) => FallEdge::Unchanged,
            None if detected => {
                self.latched_at = Some(now_ms);
                FallEdge::Rising
            }
            None => FallEdge::Unchanged,
        }
    }
}

impl Default for FallAlert {
    fn default() -> Self {
        Self::new(FallAlertCfg::default())
    }
}
