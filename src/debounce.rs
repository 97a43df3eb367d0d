use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_DEBOUNCE_PERIOD: Duration = Duration::from_millis(500);

/// Tracks the last accepted trigger per switch.
pub struct DebounceGate {
    period: Duration,
    last_trigger: HashMap<String, Instant>,
}

impl DebounceGate {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last_trigger: HashMap::new(),
        }
    }

    /// Accept the press if the switch was never triggered or its last accepted
    /// trigger is strictly older than the debounce period. Rejections leave the
    /// recorded time untouched.
    pub fn accept(&mut self, switch_id: &str, now: Instant) -> bool {
        if let Some(last) = self.last_trigger.get(switch_id) {
            if now.saturating_duration_since(*last) <= self.period {
                return false;
            }
        }
        self.last_trigger.insert(switch_id.to_string(), now);
        true
    }

    #[cfg(test)]
    pub fn last_trigger(&self, switch_id: &str) -> Option<Instant> {
        self.last_trigger.get(switch_id).copied()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.last_trigger.is_empty()
    }
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_PERIOD)
    }
}
