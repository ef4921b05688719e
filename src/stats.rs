use embassy_time::{Duration, Instant};

/// Counts for one reporting window.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ThroughputReport {
    pub window_ms: u64,
    pub ecg_lines: u32,
    pub imu_lines: u32,
    pub imu_errors: u32,
    pub write_errors: u32,
}

impl ThroughputReport {
    /// Lines per second, rounded down.
    pub fn rate(&self, lines: u32) -> u32 {
        (lines as u64 * 1000 / self.window_ms.max(1)) as u32
    }
}

/// Rolling line counters, reset every reporting period.
pub struct Throughput {
    period: Duration,
    window_start: Instant,
    current: ThroughputReport,
}

impl Throughput {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            window_start: now,
            current: ThroughputReport::default(),
        }
    }

    pub fn ecg_line(&mut self) {
        self.current.ecg_lines += 1;
    }

    pub fn imu_line(&mut self) {
        self.current.imu_lines += 1;
    }

    pub fn imu_error(&mut self) {
        self.current.imu_errors += 1;
    }

    pub fn write_error(&mut self) {
        self.current.write_errors += 1;
    }

    /// Closes the window once a full period has elapsed.
    pub fn take_report(&mut self, now: Instant) -> Option<ThroughputReport> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.period {
            return None;
        }
        let mut report = core::mem::take(&mut self.current);
        report.window_ms = elapsed.as_millis();
        self.window_start = now;
        Some(report)
    }
}
