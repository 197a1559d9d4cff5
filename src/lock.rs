//! Price lock

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Server-issued guarantee that quoted unit prices remain valid until a given
/// expiry timestamp.
///
/// The lock window (observed: 15 minutes) is chosen by the pricing service;
/// the client never computes or extends it. A descriptor is only ever
/// replaced wholesale by a fresh server response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceLock {
    /// Whether the server granted a lock.
    pub locked: bool,

    /// When the lock was issued.
    pub locked_at: Option<Timestamp>,

    /// When the lock ceases to be valid.
    pub expires_at: Option<Timestamp>,
}

/// State of the price-lock machine at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// No lock has been granted, or the cart was cleared.
    Unlocked,

    /// A lock is active and its expiry is still in the future.
    Locked,

    /// A lock was granted but wall-clock time has reached its expiry.
    Expired,
}

/// Result of a countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    /// No lock is active; there is nothing to count down.
    Inactive,

    /// The lock is valid for this many more whole seconds.
    Remaining(u64),

    /// The lock window has closed.
    Expired,
}

impl PriceLock {
    /// A descriptor carrying no lock, the initial state.
    #[must_use]
    pub fn unlocked() -> Self {
        Self::default()
    }

    /// Evaluates the lock state machine at `now`.
    ///
    /// A boundary tick (`now == expires_at`) counts as expired: checkout must
    /// never be allowed on the exact expiry instant. A descriptor claiming
    /// `locked` without an expiry is treated as unlocked rather than trusted.
    #[must_use]
    pub fn state(&self, now: Timestamp) -> LockState {
        match (self.locked, self.expires_at) {
            (true, Some(expires_at)) if now < expires_at => LockState::Locked,
            (true, Some(_)) => LockState::Expired,
            _ => LockState::Unlocked,
        }
    }

    /// Whether prices are guaranteed stable at `now`.
    #[must_use]
    pub fn is_valid(&self, now: Timestamp) -> bool {
        self.state(now) == LockState::Locked
    }

    /// Pure countdown tick: remaining whole seconds, or the expiry signal.
    ///
    /// Intended to be called about once per second while a lock is active.
    /// Missing a tick only delays displayed feedback; validity is always
    /// re-evaluated lazily on read via [`PriceLock::state`].
    #[must_use]
    pub fn tick(&self, now: Timestamp) -> LockStatus {
        match self.state(now) {
            LockState::Unlocked => LockStatus::Inactive,
            LockState::Expired => LockStatus::Expired,
            LockState::Locked => {
                let remaining = self
                    .expires_at
                    .map(|expires_at| expires_at.duration_since(now).as_secs())
                    .unwrap_or_default();

                LockStatus::Remaining(u64::try_from(remaining).unwrap_or_default())
            }
        }
    }
}
