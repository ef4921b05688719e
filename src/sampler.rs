use embassy_time::{Duration, Instant};

use crate::config::{
    DISPLAY_EVERY, IMU_SAMPLE_PERIOD_MS, INDICATOR_TOGGLE_EVERY, LOOP_PAUSE_MS,
};

/// Timing of the sampling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cadence {
    /// Minimum spacing between two IMU reads.
    pub imu_interval: Duration,
    /// Pause at the end of each iteration.
    pub loop_pause: Duration,
    /// Display refresh, every N emitted IMU samples.
    pub display_every: u32,
    /// Indicator toggle, every N emitted IMU samples.
    pub toggle_every: u32,
}

impl Cadence {
    pub const fn new() -> Self {
        Self {
            imu_interval: Duration::from_millis(IMU_SAMPLE_PERIOD_MS),
            loop_pause: Duration::from_millis(LOOP_PAUSE_MS),
            display_every: DISPLAY_EVERY,
            toggle_every: INDICATOR_TOGGLE_EVERY,
        }
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusActions {
    pub update_display: bool,
    pub toggle_indicator: bool,
}

/// Loop bookkeeping, zeroed at boot and kept for the device uptime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopState {
    last_imu: Instant,
    count: u32,
}

impl LoopState {
    pub const fn new() -> Self {
        Self {
            last_imu: Instant::from_ticks(0),
            count: 0,
        }
    }

    /// Emitted IMU samples so far. Saturates instead of wrapping.
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn last_imu(&self) -> Instant {
        self.last_imu
    }

    pub fn imu_due(&self, now: Instant, cadence: &Cadence) -> bool {
        now.saturating_duration_since(self.last_imu) >= cadence.imu_interval
    }

    /// Closes the gate until a full interval has passed from `now`.
    pub fn mark_imu_read(&mut self, now: Instant) {
        self.last_imu = now;
    }

    /// Counts one emitted IMU sample and reports which status outputs are due.
    pub fn record_emission(&mut self, cadence: &Cadence) -> StatusActions {
        self.count = self.count.saturating_add(1);
        StatusActions {
            update_display: is_multiple(self.count, cadence.display_every),
            toggle_indicator: is_multiple(self.count, cadence.toggle_every),
        }
    }
}

impl Default for LoopState {
    fn default() -> Self {
        Self::new()
    }
}

fn is_multiple(count: u32, every: u32) -> bool {
    every != 0 && count % every == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Instant {
        Instant::from_millis(v)
    }

    #[test]
    fn gate_opens_at_the_interval() {
        let cadence = Cadence::new();
        let mut state = LoopState::new();
        assert!(state.imu_due(ms(10), &cadence));

        state.mark_imu_read(ms(1000));
        assert!(!state.imu_due(ms(1000), &cadence));
        assert!(!state.imu_due(ms(1009), &cadence));
        assert!(state.imu_due(ms(1010), &cadence));
        assert!(state.imu_due(ms(1500), &cadence));
    }

    #[test]
    fn boot_waits_one_interval() {
        let cadence = Cadence::new();
        let state = LoopState::new();
        assert!(!state.imu_due(ms(IMU_SAMPLE_PERIOD_MS - 1), &cadence));
    }

    #[test]
    fn clock_going_backwards_keeps_gate_closed() {
        let cadence = Cadence::new();
        let mut state = LoopState::new();
        state.mark_imu_read(ms(500));
        assert!(!state.imu_due(ms(100), &cadence));
    }

    #[test]
    fn status_fires_on_exact_multiples() {
        let cadence = Cadence::new();
        let mut state = LoopState::new();
        let mut displays = Vec::new();
        let mut toggles = Vec::new();

        for _ in 0..250 {
            let actions = state.record_emission(&cadence);
            if actions.update_display {
                displays.push(state.count());
            }
            if actions.toggle_indicator {
                toggles.push(state.count());
            }
        }

        assert_eq!(state.count(), 250);
        assert_eq!(displays, (1..=25).map(|k| k * DISPLAY_EVERY).collect::<Vec<_>>());
        assert_eq!(toggles, vec![INDICATOR_TOGGLE_EVERY, 2 * INDICATOR_TOGGLE_EVERY]);
    }

    #[test]
    fn counter_never_wraps() {
        let cadence = Cadence::new();
        let mut state = LoopState {
            last_imu: ms(0),
            count: u32::MAX - 1,
        };
        state.record_emission(&cadence);
        state.record_emission(&cadence);
        assert_eq!(state.count(), u32::MAX);
    }

    #[test]
    fn zero_period_disables_output() {
        let cadence = Cadence {
            display_every: 0,
            toggle_every: 0,
            ..Cadence::new()
        };
        let mut state = LoopState::new();
        assert_eq!(state.record_emission(&cadence), StatusActions::default());
    }
}
