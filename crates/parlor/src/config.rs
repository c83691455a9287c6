//! Server configuration.

use std::time::Duration;

pub use parlor_session::RegistryConfig;

/// How long each delayed game transition waits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectTimings {
    /// Two mismatched memory cards stay face up this long.
    pub mismatch_reveal: Duration,
    /// Pause between a resolved rps round and the next one.
    pub round_pause: Duration,
    /// The reflex go signal fires after a delay drawn uniformly from
    /// `countdown_min..=countdown_max`.
    pub countdown_min: Duration,
    pub countdown_max: Duration,
}

impl Default for EffectTimings {
    fn default() -> Self {
        Self {
            mismatch_reveal: Duration::from_secs(1),
            round_pause: Duration::from_secs(3),
            countdown_min: Duration::from_secs(2),
            countdown_max: Duration::from_secs(6),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timings() {
        let timings = EffectTimings::default();
        assert_eq!(timings.mismatch_reveal, Duration::from_secs(1));
        assert_eq!(timings.round_pause, Duration::from_secs(3));
        assert!(timings.countdown_min < timings.countdown_max);
    }
}
