//! Maps `Box<dyn Error>` from trait boundaries to typed `VitalsError`.
//!
//! `vitals_traits::SampleReader` uses `Box<dyn Error + Send + Sync>` for maximum
//! flexibility; this module converts those to our typed error enum, with an
//! optional feature-gated path for `vitals_hardware::HwError` downcasting.

use crate::error::VitalsError;

/// Map a trait-boundary error to a typed `VitalsError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> VitalsError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<vitals_hardware::error::HwError>() {
            return match hw {
                vitals_hardware::error::HwError::Timeout => VitalsError::Timeout,
                other => VitalsError::HardwareFault(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        VitalsError::Timeout
    } else {
        VitalsError::Hardware(s)
    }
}
