mod assembler;
mod config;
mod constants;
mod control;
mod decoder;
mod driver_threads;
mod error;
mod express;
mod fixed_cadence;
mod numeric;
mod packet;
mod serial;
mod sync;
#[cfg(test)]
mod testing;

pub use crate::assembler::{ScanAssembler, DEFAULT_BOUNDARY_ANGLE};
pub use crate::config::{DriverConfig, DEFAULT_SCAN_QUEUE_CAPACITY};
pub use crate::constants::MAX_SYNC_ATTEMPTS;
pub use crate::control::ControlChannel;
pub use crate::decoder::{ChecksumPolicy, DecoderStats, PacketDecoder};
pub use crate::driver_threads::{join, DriverThreads};
pub use crate::error::{DescriptorViolation, LidarError};
pub use crate::express::{Cabin, ExpressDecoder, ExpressFrame, ExpressRawFrame};
pub use crate::fixed_cadence::{
    body_size, decode_measurement_word, encode_measurement_word, parse_body, FixedCadenceDecoder,
    FixedCadenceFrame,
};
pub use crate::packet::{Descriptor, DescriptorExpectation, RawFrame};
pub use crate::serial::Transport;
pub use crate::sync::{SyncState, Synchronizer};

use crate::driver_threads::run_worker;
use crossbeam_channel::{bounded, Receiver};
use spinlidar_data::{model_baud_rate, Scan};
use tracing::info;

/// Function to launch a LiDAR.
///
/// Opens `config.port_name` at the model's baud rate and starts the driver
/// worker on it. Scans arrive on the returned receiver until the worker
/// stops; the worker's final result is returned by [`join`].
pub fn run_driver(config: DriverConfig) -> Result<(DriverThreads, Receiver<Scan>), LidarError> {
    config.validate()?;
    let baud_rate = model_baud_rate(config.model);
    let port = serialport::new(&config.port_name, baud_rate)
        .timeout(config.read_timeout)
        .open()?;
    info!(port = %config.port_name, baud_rate, model = ?config.model, "Serial port opened");
    spawn_driver(port, config)
}

/// Starts the driver worker on an already opened transport.
pub fn spawn_driver<P: Transport + 'static>(
    port: P,
    config: DriverConfig,
) -> Result<(DriverThreads, Receiver<Scan>), LidarError> {
    config.validate()?;
    let (terminator_tx, terminator_rx) = bounded(10);
    let (scan_tx, scan_rx) = bounded(config.scan_queue_capacity);

    let worker_thread = Some(std::thread::spawn(move || {
        let mut control = ControlChannel::new(port);
        run_worker(&mut control, &config, &scan_tx, &terminator_rx)
    }));

    let driver_threads = DriverThreads {
        terminator_tx,
        worker_thread,
    };

    Ok((driver_threads, scan_rx))
}
