use clap::{Parser, ValueEnum};
use spinlidar_data::LidarModel;
use spinlidar_driver::{join, run_driver, ChecksumPolicy, DriverConfig};
use std::io::Write;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Clone, Copy, ValueEnum)]
enum Model {
    Rplidar,
    Xv11,
    Hls,
}

impl From<Model> for LidarModel {
    fn from(model: Model) -> Self {
        match model {
            Model::Rplidar => LidarModel::RplidarA1,
            Model::Xv11 => LidarModel::Xv11,
            Model::Hls => LidarModel::HlsLfcd2,
        }
    }
}

/// Reads scans from a LiDAR and prints one JSON document per line.
#[derive(Parser)]
#[command(about = "Reads data from LiDAR.")]
struct Cli {
    /// The device path to a serial port
    port: String,

    #[arg(short, long, value_enum, default_value = "rplidar")]
    model: Model,

    /// Discard frames whose checksum does not match
    #[arg(long)]
    strict: bool,

    /// Read timeout in milliseconds, defaults to the model's
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Stop after this many scans
    #[arg(short = 'n', long)]
    count: Option<usize>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut config = DriverConfig::new(cli.port, cli.model.into());
    if cli.strict {
        config = config.with_checksum_policy(ChecksumPolicy::Drop);
    }
    if let Some(ms) = cli.timeout_ms {
        config = config.with_read_timeout(Duration::from_millis(ms));
    }

    let (mut driver_threads, scan_rx) = match run_driver(config) {
        Ok(driver) => driver,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };

    let stdout = std::io::stdout();
    for (n, scan) in scan_rx.iter().enumerate() {
        let line = serde_json::to_string(&scan).unwrap();
        if writeln!(stdout.lock(), "{line}").is_err() {
            break;
        }
        if cli.count.is_some_and(|count| n + 1 >= count) {
            break;
        }
    }
    drop(scan_rx);

    if let Err(e) = join(&mut driver_threads) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
