// Contact-driven authority handoff for shared pushables.

use crate::domain::state::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handoff {
    pub from: PlayerId,
    pub to: PlayerId,
}

/// Current holder of a pushable and when it last changed hands.
#[derive(Debug, Clone, PartialEq)]
pub struct PushableOwnership {
    holder: PlayerId,
    last_switch_at: Option<f64>,
    min_switch_interval: f64,
}

impl PushableOwnership {
    pub fn new(holder: PlayerId, min_switch_interval: f32) -> Self {
        Self {
            holder,
            last_switch_at: None,
            min_switch_interval: f64::from(min_switch_interval),
        }
    }

    pub fn holder(&self) -> PlayerId {
        self.holder
    }

    pub fn last_switch_at(&self) -> Option<f64> {
        self.last_switch_at
    }

    /// Transfers authority to `toucher` unless it already holds it or the last switch is too
    /// recent. First contact after the window wins; this bounds switch frequency, not fairness.
    pub fn on_contact(&mut self, toucher: PlayerId, now: f64) -> Option<Handoff> {
        if toucher == self.holder {
            return None;
        }
        if let Some(last) = self.last_switch_at
            && now < last + self.min_switch_interval
        {
            return None;
        }
        Some(self.switch_to(toucher, now))
    }

    /// Unconditional transfer, e.g. back to the server when the holder leaves.
    pub fn reclaim(&mut self, holder: PlayerId, now: f64) -> Option<Handoff> {
        if holder == self.holder {
            return None;
        }
        Some(self.switch_to(holder, now))
    }

    fn switch_to(&mut self, to: PlayerId, now: f64) -> Handoff {
        let from = std::mem::replace(&mut self.holder, to);
        self.last_switch_at = Some(now);
        Handoff { from, to }
    }
}
