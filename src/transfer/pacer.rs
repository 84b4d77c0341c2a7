//! Static backpressure pacing between transfers.
//!
//! Providers throttle accounts that save shares too quickly, so the engine
//! applies a fixed delay after every item plus a longer rest after every
//! K items. The policy is deliberately static - it does not react to
//! observed throttling signals.

use std::time::Duration;

use tracing::{debug, instrument};

/// Default delay applied after every item.
pub const DEFAULT_ITEM_DELAY: Duration = Duration::from_secs(2);

/// Default rest applied after every [`DEFAULT_REST_EVERY`] items.
pub const DEFAULT_REST_DELAY: Duration = Duration::from_secs(10);

/// Default number of items between rests.
pub const DEFAULT_REST_EVERY: usize = 5;

/// Fixed-interval pacing component.
///
/// Substitutable with [`Pacer::disabled`] in tests so batch logic can be
/// exercised without wall-clock delays.
#[derive(Debug, Clone)]
pub struct Pacer {
    item_delay: Duration,
    rest_every: usize,
    rest_delay: Duration,
    disabled: bool,
}

impl Pacer {
    /// Creates a pacer with the given per-item delay and rest policy.
    ///
    /// `rest_every = 0` disables the periodic rest.
    #[must_use]
    #[instrument(skip_all, fields(item_delay_ms = item_delay.as_millis(), rest_every))]
    pub fn new(item_delay: Duration, rest_every: usize, rest_delay: Duration) -> Self {
        debug!("creating pacer");
        Self {
            item_delay,
            rest_every,
            rest_delay,
            disabled: false,
        }
    }

    /// Creates a zero-delay pacer that never sleeps.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            item_delay: Duration::ZERO,
            rest_every: 0,
            rest_delay: Duration::ZERO,
            disabled: true,
        }
    }

    /// Returns whether pacing is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns the per-item delay.
    #[must_use]
    pub fn item_delay(&self) -> Duration {
        self.item_delay
    }

    /// Sleeps the per-item delay, plus the rest delay when `items_done`
    /// (1-based) completes a rest interval.
    pub async fn pause(&self, items_done: usize) {
        if self.disabled {
            return;
        }

        tokio::time::sleep(self.item_delay).await;

        if self.rest_every > 0 && items_done > 0 && items_done % self.rest_every == 0 {
            debug!(items_done, rest_ms = self.rest_delay.as_millis(), "taking rest interval");
            tokio::time::sleep(self.rest_delay).await;
        }
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(DEFAULT_ITEM_DELAY, DEFAULT_REST_EVERY, DEFAULT_REST_DELAY)
    }
}
