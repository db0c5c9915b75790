// Per-player battery: the pool emissions are paid from.

use crate::domain::ports::ResourcePool;
use crate::domain::replicated::Replicated;
use crate::domain::tuning::BatteryTuning;

#[derive(Debug, Clone, PartialEq)]
pub struct Battery {
    value: Replicated<f32>,
    max: f32,
    min: f32,
    recharge_per_second: f32,
    broadcast_interval: f64,
    broadcast_version: u64,
    last_broadcast_at: Option<f64>,
}

impl Battery {
    /// Starts full.
    pub fn new(tuning: &BatteryTuning) -> Self {
        let max = tuning.max.max(tuning.min);
        Self {
            value: Replicated::new(max),
            max,
            min: tuning.min,
            recharge_per_second: tuning.recharge_per_second.max(0.0),
            broadcast_interval: f64::from(tuning.broadcast_interval.max(0.0)),
            broadcast_version: 0,
            last_broadcast_at: None,
        }
    }

    pub fn value(&self) -> f32 {
        *self.value.get()
    }

    pub fn version(&self) -> u64 {
        self.value.version()
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Recharge for one frame while standing in a recharge zone.
    pub fn recharge_tick(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.add(self.recharge_per_second * dt);
    }

    /// `(value, version)` when an unsent change exists and the throttle window has passed.
    pub fn take_broadcast(&mut self, now: f64) -> Option<(f32, u64)> {
        if self.value.version() == self.broadcast_version {
            return None;
        }
        if let Some(last) = self.last_broadcast_at
            && now - last < self.broadcast_interval
        {
            return None;
        }
        self.broadcast_version = self.value.version();
        self.last_broadcast_at = Some(now);
        Some((self.value(), self.broadcast_version))
    }

    fn set_clamped(&mut self, value: f32) {
        let _ = self.value.set(value.clamp(self.min, self.max));
    }
}

impl ResourcePool for Battery {
    fn has(&self, amount: f32) -> bool {
        self.value() >= amount
    }

    fn try_consume(&mut self, amount: f32) -> bool {
        if amount <= 0.0 {
            return true;
        }
        if self.value() < amount {
            return false;
        }
        self.set_clamped(self.value() - amount);
        true
    }

    fn add(&mut self, amount: f32) {
        if amount <= 0.0 {
            return;
        }
        self.set_clamped(self.value() + amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn consume_fails_without_mutation_when_short() {
        let mut battery = Battery::new(&BatteryTuning::default());
        assert!(battery.try_consume(99.0));
        assert!(battery.has(1.0) && !battery.has(2.0));
        assert!(!battery.try_consume(2.0));
        assert_relative_eq!(battery.value(), 1.0);
        assert_eq!(battery.version(), 1);
    }

    #[test]
    fn non_positive_amounts_always_succeed() {
        let mut battery = Battery::new(&BatteryTuning::default());
        assert!(battery.try_consume(0.0));
        assert!(battery.try_consume(-5.0));
        assert_eq!(battery.version(), 0);
    }

    #[test]
    fn recharge_clamps_at_max() {
        let mut battery = Battery::new(&BatteryTuning::default());
        battery.try_consume(10.0);
        battery.recharge_tick(0.2);
        assert_relative_eq!(battery.value(), 95.0);
        battery.recharge_tick(1.0);
        assert_relative_eq!(battery.value(), 100.0);
    }

    #[test]
    fn broadcasts_are_throttled_and_skip_unchanged_values() {
        let mut battery = Battery::new(&BatteryTuning::default());
        assert_eq!(battery.take_broadcast(0.0), None);

        battery.try_consume(2.0);
        assert_eq!(battery.take_broadcast(0.0), Some((98.0, 1)));

        battery.try_consume(2.0);
        assert_eq!(battery.take_broadcast(0.05), None);
        assert_eq!(battery.take_broadcast(0.11), Some((96.0, 2)));
        assert_eq!(battery.take_broadcast(0.5), None);
    }
}
