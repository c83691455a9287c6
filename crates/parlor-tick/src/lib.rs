//! Timers for Parlor's coordinator loop.
//!
//! - [`EffectTimer`]: one-shot timers. Each armed payload comes back out
//!   of [`EffectTimer::next`] once its delay has elapsed.
//! - [`SweepTicker`]: a fixed-period tick for housekeeping.
//! - [`random_delay`]: a uniformly drawn delay in a closed range.
//!
//! Neither timer touches game state. Both are meant to sit inside the
//! coordinator's `tokio::select!` so fired work is handled on the same
//! task as every other command:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         effect = timers.next() => { /* apply the fired effect */ }
//!         _ = sweeper.wait_for_tick() => { /* drop idle sessions */ }
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::task::JoinSet;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// One-shot effect timers
// ---------------------------------------------------------------------------

/// A set of pending one-shot timers carrying payloads of type `T`.
///
/// Timers are never cancelled individually. A payload that is no longer
/// wanted when it fires is for the receiver to recognise and discard.
/// Dropping the `EffectTimer` aborts everything still pending.
pub struct EffectTimer<T> {
    pending: JoinSet<T>,
    armed: u64,
    fired: u64,
}

impl<T: Send + 'static> EffectTimer<T> {
    pub fn new() -> Self {
        Self {
            pending: JoinSet::new(),
            armed: 0,
            fired: 0,
        }
    }

    /// Schedules `payload` to come out of [`next`](Self::next) after `delay`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn arm(&mut self, delay: Duration, payload: T) {
        self.armed += 1;
        trace!(delay_ms = delay.as_millis() as u64, armed = self.armed, "timer armed");
        self.pending.spawn(async move {
            time::sleep(delay).await;
            payload
        });
    }

    /// Waits for the next timer to fire and returns its payload.
    ///
    /// With nothing armed this future pends forever, so inside `select!`
    /// it simply never wins. Cancel-safe: a payload is only taken out of
    /// the set when this future resolves.
    pub async fn next(&mut self) -> T {
        loop {
            match self.pending.join_next().await {
                Some(Ok(payload)) => {
                    self.fired += 1;
                    return payload;
                }
                Some(Err(e)) => warn!(error = %e, "timer task failed"),
                None => std::future::pending::<()>().await,
            }
        }
    }

    /// Timers armed but not yet fired.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Total timers armed since creation.
    pub fn armed(&self) -> u64 {
        self.armed
    }

    /// Total payloads delivered through [`next`](Self::next).
    pub fn fired(&self) -> u64 {
        self.fired
    }
}

impl<T: Send + 'static> Default for EffectTimer<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Sweep ticker
// ---------------------------------------------------------------------------

/// Fixed-period ticker.
///
/// The first tick fires one full period after creation. Ticks missed
/// while the loop was busy are skipped, never replayed in a burst. A zero
/// period disables the ticker: [`wait_for_tick`](Self::wait_for_tick)
/// then pends forever.
pub struct SweepTicker {
    interval: Option<Interval>,
    period: Duration,
    tick_count: u64,
}

impl SweepTicker {
    pub fn new(period: Duration) -> Self {
        let interval = (!period.is_zero()).then(|| {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });

        if interval.is_none() {
            debug!("sweep ticker disabled (zero period)");
        } else {
            debug!(period_s = period.as_secs_f64(), "sweep ticker created");
        }

        Self {
            interval,
            period,
            tick_count: 0,
        }
    }

    /// Waits for the next tick and returns its 1-based count.
    pub async fn wait_for_tick(&mut self) -> u64 {
        let Some(interval) = self.interval.as_mut() else {
            return std::future::pending().await;
        };
        interval.tick().await;
        self.tick_count += 1;
        trace!(tick = self.tick_count, "sweep tick");
        self.tick_count
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn is_disabled(&self) -> bool {
        self.interval.is_none()
    }
}

// ---------------------------------------------------------------------------
// Randomized delays
// ---------------------------------------------------------------------------

/// Draws a delay uniformly from `min..=max`, at millisecond resolution.
///
/// An inverted range yields `min`.
pub fn random_delay<R: Rng + ?Sized>(rng: &mut R, min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let lo = min.as_millis() as u64;
    let hi = max.as_millis() as u64;
    Duration::from_millis(rng.random_range(lo..=hi))
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_random_delay_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let (min, max) = (Duration::from_secs(2), Duration::from_secs(6));
        for _ in 0..500 {
            let d = random_delay(&mut rng, min, max);
            assert!(d >= min && d <= max, "{d:?} out of range");
        }
    }

    #[test]
    fn test_random_delay_inverted_range_returns_min() {
        let mut rng = StdRng::seed_from_u64(3);
        let d = random_delay(&mut rng, Duration::from_secs(5), Duration::from_secs(1));
        assert_eq!(d, Duration::from_secs(5));
    }

    #[test]
    fn test_sweep_ticker_zero_period_is_disabled() {
        let ticker = SweepTicker::new(Duration::ZERO);
        assert!(ticker.is_disabled());
        assert_eq!(ticker.tick_count(), 0);
    }
}
