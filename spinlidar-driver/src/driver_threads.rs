use crate::assembler::ScanAssembler;
use crate::config::DriverConfig;
use crate::constants::{HLS_CMD_START, HLS_CMD_STOP};
use crate::control::ControlChannel;
use crate::decoder::PacketDecoder;
use crate::error::LidarError;
use crate::fixed_cadence::FixedCadenceDecoder;
use crate::serial::{send_data, Transport};
use crate::sync::Synchronizer;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use spinlidar_data::{FixedCadenceFormat, HealthState, Scan, WireProtocol};
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};

/// Struct that contains the driver thread.
pub struct DriverThreads {
    pub(crate) terminator_tx: Sender<bool>,
    pub(crate) worker_thread: Option<JoinHandle<Result<(), LidarError>>>,
}

impl DriverThreads {
    /// Whether the worker has returned, on error or after a disconnect.
    pub fn is_finished(&self) -> bool {
        self.worker_thread
            .as_ref()
            .map_or(true, |thread| thread.is_finished())
    }
}

pub(crate) fn do_terminate(terminator_rx: &Receiver<bool>) -> bool {
    terminator_rx.try_recv().unwrap_or(false)
}

/// Owns the device for the lifetime of the driver. Transient streaming
/// errors start a new session; anything else ends the worker.
pub(crate) fn run_worker<P: Transport>(
    control: &mut ControlChannel<P>,
    config: &DriverConfig,
    scan_tx: &Sender<Scan>,
    terminator_rx: &Receiver<bool>,
) -> Result<(), LidarError> {
    let mut sessions: u64 = 0;
    loop {
        if do_terminate(terminator_rx) {
            return shutdown(control, config);
        }
        sessions += 1;
        match run_session(control, config, scan_tx, terminator_rx) {
            Ok(()) => return shutdown(control, config),
            Err(LidarError::Disconnected) => {
                info!(sessions, "Transport closed, driver stopping");
                return Ok(());
            }
            Err(e) if e.is_transient() => {
                warn!(sessions, error = %e, "Session interrupted, resynchronizing");
                if config.model.protocol() == WireProtocol::Express {
                    control.clear_cache();
                    control.port_mut().clear_input()?;
                }
            }
            Err(e) => {
                error!(sessions, error = %e, "Driver stopped");
                if let Err(stop_err) = shutdown(control, config) {
                    debug!(error = %stop_err, "Device did not stop cleanly");
                }
                return Err(e);
            }
        }
    }
}

/// Runs until terminated, until the scan receiver is dropped, or until the
/// stream fails.
fn run_session<P: Transport>(
    control: &mut ControlChannel<P>,
    config: &DriverConfig,
    scan_tx: &Sender<Scan>,
    terminator_rx: &Receiver<bool>,
) -> Result<(), LidarError> {
    let mut decoder = start_stream(control, config)?;
    let mut assembler = ScanAssembler::new(config.boundary_angle);
    let mut dropped_scans: u64 = 0;
    loop {
        if do_terminate(terminator_rx) {
            debug!(stats = ?decoder.stats(), "Termination requested");
            return Ok(());
        }
        let measurement = decoder.next_measurement(control.port_mut())?;
        if let Some(rpm) = decoder.rotation_speed() {
            assembler.set_rotation_speed(rpm);
        }
        let Some(scan) = assembler.push(&measurement) else {
            continue;
        };
        match scan_tx.try_send(scan) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                dropped_scans += 1;
                warn!(dropped_scans, "Scan queue full, dropping scan");
            }
            Err(TrySendError::Disconnected(_)) => {
                info!("Scan receiver dropped");
                return Ok(());
            }
        }
    }
}

fn start_stream<P: Transport>(
    control: &mut ControlChannel<P>,
    config: &DriverConfig,
) -> Result<Box<dyn PacketDecoder>, LidarError> {
    let format = match config.model.protocol() {
        WireProtocol::Express => return start_express_stream(control, config),
        WireProtocol::FixedCadence(format) => format,
    };
    match format {
        FixedCadenceFormat::Xv11 => {
            control.set_motor(true)?;
            control.port_mut().set_request_to_send(false)?;
        }
        FixedCadenceFormat::Hls => {
            send_data(control.port_mut(), &[HLS_CMD_START])?;
            control.port_mut().clear_input()?;
        }
    }
    debug!(?format, "Streaming fixed-cadence frames");
    Ok(Box::new(FixedCadenceDecoder::new(
        format,
        config.checksum_policy,
    )))
}

fn start_express_stream<P: Transport>(
    control: &mut ControlChannel<P>,
    config: &DriverConfig,
) -> Result<Box<dyn PacketDecoder>, LidarError> {
    Synchronizer::new().synchronize(control)?;
    control.set_motor(true)?;

    let health = control.get_health()?;
    match health.status {
        HealthState::Good => {}
        HealthState::Error => return Err(LidarError::DeviceHealthError(health.error_code)),
        status => warn!(?status, error_code = health.error_code, "Device health is degraded"),
    }

    match control.get_sample_rate() {
        Ok(rate) => debug!(
            standard_us = rate.standard_period_us,
            express_us = rate.express_period_us,
            "Sample period"
        ),
        Err(e @ LidarError::UnsupportedFeature { .. }) => debug!("{e}"),
        Err(e) => return Err(e),
    }

    Ok(Box::new(control.start_express(config.checksum_policy)?))
}

/// Best-effort: stops the device the way its protocol allows.
fn shutdown<P: Transport>(
    control: &mut ControlChannel<P>,
    config: &DriverConfig,
) -> Result<(), LidarError> {
    match config.model.protocol() {
        WireProtocol::Express => control.stop(),
        WireProtocol::FixedCadence(FixedCadenceFormat::Xv11) => control.set_motor(false),
        WireProtocol::FixedCadence(FixedCadenceFormat::Hls) => {
            send_data(control.port_mut(), &[HLS_CMD_STOP])
        }
    }
}

/// Function to join the driver thread.
/// This function is automatically called when `driver_threads` is dropped.
pub fn join(driver_threads: &mut DriverThreads) -> Result<(), LidarError> {
    // the worker may already be gone along with its receiver
    let _ = driver_threads.terminator_tx.send(true);

    match driver_threads.worker_thread.take() {
        Some(thread) => thread.join().map_err(|_| LidarError::WorkerPanicked)?,
        None => Ok(()),
    }
}

impl Drop for DriverThreads {
    fn drop(&mut self) {
        if let Err(e) = join(self) {
            error!("{e}");
        }
    }
}
