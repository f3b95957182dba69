// crates/veilcraft-coordinator/src/rate_limit.rs
//
// Per-address cooldowns for the two rate-limited actions.
//
// One global cooldown applies to both actions, but each action keeps its own
// timestamp map: submitting does not delay a craft request and vice versa.

use std::collections::HashMap;

use veilcraft_core::call::ActionKind;
use veilcraft_core::error::CraftError;
use veilcraft_core::identity::Address;

/// Admission rule: an address with no recorded action is always admitted,
/// otherwise `now` must be at least `last + cooldown`.
pub fn is_admitted(last_action: Option<u64>, cooldown_seconds: u64, now: u64) -> bool {
    match last_action {
        None => true,
        Some(last) => now >= last.saturating_add(cooldown_seconds),
    }
}

/// Cooldown tracker.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    cooldown_seconds: u64,
    last_submission: HashMap<Address, u64>,
    last_craft_request: HashMap<Address, u64>,
}

impl RateLimiter {
    /// # Errors
    /// Returns `CraftError::InvalidCooldown` if `cooldown_seconds` is zero.
    pub fn new(cooldown_seconds: u64) -> Result<Self, CraftError> {
        if cooldown_seconds == 0 {
            return Err(CraftError::InvalidCooldown);
        }
        Ok(Self {
            cooldown_seconds,
            last_submission: HashMap::new(),
            last_craft_request: HashMap::new(),
        })
    }

    pub fn cooldown_seconds(&self) -> u64 {
        self.cooldown_seconds
    }

    /// Change the cooldown. Returns the previous value.
    ///
    /// Existing timestamps are kept, so the new window applies immediately
    /// to everyone's last action.
    pub fn set_cooldown(&mut self, cooldown_seconds: u64) -> Result<u64, CraftError> {
        if cooldown_seconds == 0 {
            return Err(CraftError::InvalidCooldown);
        }
        let previous = self.cooldown_seconds;
        self.cooldown_seconds = cooldown_seconds;
        Ok(previous)
    }

    /// Time of `addr`'s last admitted action of `kind`.
    pub fn last_action(&self, addr: &Address, kind: ActionKind) -> Option<u64> {
        self.timestamps(kind).get(addr).copied()
    }

    /// Decide admission without recording anything.
    ///
    /// # Errors
    /// Returns `CraftError::CooldownActive` with the earliest retry time.
    pub fn check(&self, addr: &Address, kind: ActionKind, now: u64) -> Result<(), CraftError> {
        let last = self.last_action(addr, kind);
        if is_admitted(last, self.cooldown_seconds, now) {
            return Ok(());
        }
        let retry_at = last
            .map(|t| t.saturating_add(self.cooldown_seconds))
            .unwrap_or(now);
        tracing::debug!("{} by {} throttled until {}", kind, addr, retry_at);
        Err(CraftError::CooldownActive {
            action: kind,
            retry_at,
        })
    }

    /// Record an admitted action at `now`.
    pub fn record(&mut self, addr: Address, kind: ActionKind, now: u64) {
        let map = match kind {
            ActionKind::Submission => &mut self.last_submission,
            ActionKind::CraftRequest => &mut self.last_craft_request,
        };
        map.insert(addr, now);
    }

    fn timestamps(&self, kind: ActionKind) -> &HashMap<Address, u64> {
        match kind {
            ActionKind::Submission => &self.last_submission,
            ActionKind::CraftRequest => &self.last_craft_request,
        }
    }
}
