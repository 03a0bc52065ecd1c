//! In-memory transport that answers commands from a script.

use crate::constants::LIDAR_CMD_SYNC_BYTE;
use crate::error::LidarError;
use crate::serial::Transport;
use std::collections::{HashMap, VecDeque};
use std::io::{self, ErrorKind, Read, Write};

#[derive(Default)]
pub(crate) struct ScriptedPort {
    rx: VecDeque<u8>,
    /// Answers still on the wire; they reach `rx` on the next read.
    in_flight: VecDeque<u8>,
    responses: HashMap<u8, VecDeque<Vec<u8>>>,
    pub(crate) written: Vec<u8>,
    pub(crate) commands: Vec<u8>,
    pub(crate) motor: Option<bool>,
    pub(crate) rts: Option<bool>,
    /// Input discarded by `clear_input`.
    pub(crate) cleared: usize,
    /// Reads on an empty buffer return 0 bytes instead of timing out.
    pub(crate) closed: bool,
}

impl ScriptedPort {
    pub(crate) fn new() -> Self {
        ScriptedPort::default()
    }

    /// Bytes available right away.
    pub(crate) fn feed(&mut self, data: &[u8]) -> &mut Self {
        self.rx.extend(data);
        self
    }

    /// Bytes that become available once `command` has been written, either
    /// framed after `0xA5` or as a single raw byte.
    pub(crate) fn respond(&mut self, command: u8, data: &[u8]) -> &mut Self {
        self.responses
            .entry(command)
            .or_default()
            .push_back(data.to_vec());
        self
    }

    pub(crate) fn count(&self, command: u8) -> usize {
        self.commands.iter().filter(|&&c| c == command).count()
    }
}

impl Read for ScriptedPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.rx.extend(self.in_flight.drain(..));
        if self.rx.is_empty() {
            if self.closed {
                return Ok(0);
            }
            return Err(io::Error::new(ErrorKind::TimedOut, "scripted timeout"));
        }
        let n = buf.len().min(self.rx.len());
        for (dst, src) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }
}

impl Write for ScriptedPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        let command = match buf {
            [LIDAR_CMD_SYNC_BYTE, command, ..] => Some(*command),
            // single byte commands of the fixed-cadence sensors
            [command] => Some(*command),
            _ => None,
        };
        if let Some(command) = command {
            self.commands.push(command);
            if let Some(response) = self
                .responses
                .get_mut(&command)
                .and_then(|queue| queue.pop_front())
            {
                self.in_flight.extend(response);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for ScriptedPort {
    fn set_motor(&mut self, on: bool) -> Result<(), LidarError> {
        self.motor = Some(on);
        Ok(())
    }

    fn clear_input(&mut self) -> Result<(), LidarError> {
        self.cleared += self.rx.len();
        self.rx.clear();
        Ok(())
    }

    fn set_request_to_send(&mut self, level: bool) -> Result<(), LidarError> {
        self.rts = Some(level);
        Ok(())
    }
}

pub(crate) const INFO_RESPONSE: [u8; 27] = [
    0xA5, 0x5A, 0x14, 0x00, 0x00, 0x00, 0x04, 0x18, 0x1D, 0x01, 0x07, 0x02, 0x00, 0x02, 0x02,
    0x01, 0x01, 0x00, 0x03, 0x00, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
];
pub(crate) const HEALTH_RESPONSE: [u8; 10] =
    [0xA5, 0x5A, 0x03, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00];
pub(crate) const SAMPLE_RATE_RESPONSE: [u8; 11] =
    [0xA5, 0x5A, 0x04, 0x00, 0x00, 0x00, 0x15, 0xFA, 0x01, 0x7D, 0x00];
pub(crate) const EXPRESS_RESPONSE: [u8; 7] = [0xA5, 0x5A, 0x54, 0x00, 0x00, 0x40, 0x82];
pub(crate) const RESET_BANNER: &[u8] = b"RP LIDAR System.\r\nFirmware Ver 1.29\r\nHardware Rev 7\r\n";
