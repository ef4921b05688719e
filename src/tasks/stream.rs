use embassy_time::{Duration, Instant, Timer};
use embedded_hal::digital::StatefulOutputPin;
use embedded_io_async::Write;

use crate::config::{IMU_INIT_FAILED_NOTICE, LCD_BANNER, STATS_PERIOD_MS};
use crate::drivers::{AnalogInput, ImuSample, InertialSensor, StatusDisplay};
use crate::protocol::{Line, LineBuf};
use crate::sampler::{Cadence, LoopState, StatusActions};
use crate::stats::Throughput;

/// Everything the loop talks to.
pub struct StreamParts<S, A, I, D, L> {
    pub serial: S,
    pub analog: A,
    pub imu: I,
    pub display: D,
    pub indicator: L,
}

/// What one iteration put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Step {
    pub ecg: u16,
    pub imu_emitted: bool,
}

pub struct StreamLoop<S, A, I, D, L> {
    parts: StreamParts<S, A, I, D, L>,
    cadence: Cadence,
    state: LoopState,
    stats: Throughput,
    consecutive_imu_errors: u32,
    last_sample: ImuSample,
    line: LineBuf,
}

impl<S, A, I, D, L> StreamLoop<S, A, I, D, L>
where
    S: Write,
    A: AnalogInput,
    I: InertialSensor,
    D: StatusDisplay,
    L: StatefulOutputPin,
{
    /// Brings up the IMU and the display, then hands back a loop ready to
    /// run. An IMU that fails to initialize is reported on the serial line
    /// and sampled anyway.
    pub async fn start(
        parts: StreamParts<S, A, I, D, L>,
        cadence: Cadence,
        now: Instant,
    ) -> Self {
        let mut this = Self {
            parts,
            cadence,
            state: LoopState::new(),
            stats: Throughput::new(Duration::from_millis(STATS_PERIOD_MS), now),
            consecutive_imu_errors: 0,
            last_sample: ImuSample::default(),
            line: LineBuf::new(),
        };

        if this.parts.imu.init().await.is_err() {
            error!("IMU initialization failed");
            this.send(Line::Notice(IMU_INIT_FAILED_NOTICE)).await;
        }

        if this.parts.display.init(LCD_BANNER).await.is_err() {
            warn!("Display initialization failed");
        }

        this
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn parts(&self) -> &StreamParts<S, A, I, D, L> {
        &self.parts
    }

    pub fn parts_mut(&mut self) -> &mut StreamParts<S, A, I, D, L> {
        &mut self.parts
    }

    pub fn into_parts(self) -> StreamParts<S, A, I, D, L> {
        self.parts
    }

    pub async fn run(mut self) -> ! {
        info!(
            "Stream loop started - IMU every {}ms, pause {}ms",
            self.cadence.imu_interval.as_millis(),
            self.cadence.loop_pause.as_millis()
        );

        loop {
            self.step(Instant::now()).await;
            Timer::after(self.cadence.loop_pause).await;
        }
    }

    /// One loop iteration at `now`.
    pub async fn step(&mut self, now: Instant) -> Step {
        let ecg = self.parts.analog.read();
        self.send(Line::Ecg(ecg.into())).await;
        self.stats.ecg_line();

        let imu_emitted = self.state.imu_due(now, &self.cadence);
        if imu_emitted {
            self.state.mark_imu_read(now);

            match self.parts.imu.read().await {
                Ok(sample) => {
                    self.last_sample = sample;
                    if self.consecutive_imu_errors > 0 {
                        info!(
                            "IMU recovered after {} consecutive errors",
                            self.consecutive_imu_errors
                        );
                        self.consecutive_imu_errors = 0;
                    }
                }
                Err(_) => {
                    self.stats.imu_error();
                    self.consecutive_imu_errors = self.consecutive_imu_errors.saturating_add(1);
                    if self.consecutive_imu_errors % 100 == 1 {
                        warn!(
                            "IMU read error, {} in a row",
                            self.consecutive_imu_errors
                        );
                    }
                }
            }

            // a failed read repeats the last good sample
            trace!("IMU sample {}", self.state.count());
            self.send(Line::Imu(self.last_sample)).await;
            self.stats.imu_line();

            let actions = self.state.record_emission(&self.cadence);
            self.apply_status(actions).await;
        }

        if let Some(report) = self.stats.take_report(now) {
            info!(
                "ECG: {} Hz, IMU: {} Hz, {} IMU errors, {} write errors",
                report.rate(report.ecg_lines),
                report.rate(report.imu_lines),
                report.imu_errors,
                report.write_errors
            );
        }

        Step { ecg, imu_emitted }
    }

    async fn apply_status(&mut self, actions: StatusActions) {
        if actions.update_display {
            let _ = self.parts.display.show_count(self.state.count()).await;
        }
        if actions.toggle_indicator {
            let _ = self.parts.indicator.toggle();
        }
    }

    /// Best effort: failures only show up in the statistics.
    async fn send(&mut self, line: Line<'_>) {
        if line.encode(&mut self.line).is_err() {
            self.stats.write_error();
            return;
        }
        if self.parts.serial.write_all(self.line.as_bytes()).await.is_err() {
            self.stats.write_error();
        }
    }
}
