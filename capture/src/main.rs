use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use log::{debug, error, info, warn, LevelFilter};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_serial::SerialPortBuilderExt;

mod recorder;

use recorder::{Outcome, Recorder};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Record the board's ECG/IMU serial stream into CSV files.
#[derive(Parser, Debug)]
#[command(name = "vitals-capture", version, about)]
struct Cli {
    /// Serial port the board is attached to
    #[arg(default_value = "/dev/ttyACM0")]
    port: String,

    #[arg(short, long, default_value_t = 115_200)]
    baud: u32,

    /// Directory the CSV files are written to
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Wait after opening the port, the board resets on connect
    #[arg(long, default_value_t = 2000)]
    settle_ms: u64,

    /// List available serial ports and exit
    #[arg(short, long)]
    list: bool,
}

fn list_ports() -> Result<()> {
    let ports = tokio_serial::available_ports().context("enumerating serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        println!("{}\t{:?}", port.port_name, port.port_type);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    if cli.list {
        return list_ports();
    }

    info!("Opening {} at {} baud", cli.port, cli.baud);
    let port = tokio_serial::new(&cli.port, cli.baud)
        .open_native_async()
        .with_context(|| format!("opening serial port {}", cli.port))?;
    tokio::time::sleep(Duration::from_millis(cli.settle_ms)).await;

    let stamp = Local::now().format(FILE_STAMP_FORMAT);
    let ecg_path = cli.out.join(format!("ecg_data_{stamp}.csv"));
    let imu_path = cli.out.join(format!("imu_data_{stamp}.csv"));
    let mut recorder = Recorder::create(&ecg_path, &imu_path)?;
    info!("ECG data -> {}", ecg_path.display());
    info!("IMU data -> {}", imu_path.display());

    let mut reader = BufReader::new(port);
    let mut buf = Vec::with_capacity(128);
    let mut report = tokio::time::interval(Duration::from_secs(1));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            read = reader.read_until(b'\n', &mut buf) => {
                match read {
                    Ok(0) => {
                        warn!("Serial port closed");
                        break;
                    }
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&buf);
                        let now = Local::now().format(TIMESTAMP_FORMAT).to_string();
                        match recorder.record(&now, &line)? {
                            Outcome::Ecg | Outcome::Imu | Outcome::Blank => {}
                            Outcome::Notice(text) => info!("device: {text}"),
                            // routine right after connecting
                            Outcome::Invalid(e) if e.is_truncation() => {
                                debug!("Dropping line {:?}: {e}", line.trim_end())
                            }
                            Outcome::Invalid(e) => warn!("Skipping line {:?}: {e}", line.trim_end()),
                        }
                        buf.clear();
                    }
                    Err(e) => {
                        error!("Serial read failed: {e}");
                        break;
                    }
                }
            }
            _ = report.tick() => {
                info!(
                    "Records collected - ECG: {}, IMU: {}",
                    recorder.ecg_count(),
                    recorder.imu_count()
                );
            }
            _ = &mut ctrl_c => {
                info!("Stopped by user");
                break;
            }
        }
    }

    info!(
        "Saved {} ECG rows to {} and {} IMU rows to {}",
        recorder.ecg_count(),
        ecg_path.display(),
        recorder.imu_count(),
        imu_path.display()
    );
    Ok(())
}
