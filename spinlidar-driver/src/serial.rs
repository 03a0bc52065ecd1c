use crate::constants::LIDAR_CMD_SYNC_BYTE;
use crate::error::LidarError;
use serialport::{ClearBuffer, SerialPort};
use std::io::{ErrorKind, Read, Write};
use tracing::trace;

/// Byte channel to the sensor.
///
/// Reads block until data arrives or the channel's timeout elapses, which
/// surfaces as an `ErrorKind::TimedOut` I/O error. A read of zero bytes
/// means the other end has gone away.
pub trait Transport: Read + Write + Send {
    /// Powers the motor up or down through the modem control line.
    fn set_motor(&mut self, on: bool) -> Result<(), LidarError>;

    /// Discards anything buffered on the receive side.
    fn clear_input(&mut self) -> Result<(), LidarError>;

    fn set_request_to_send(&mut self, level: bool) -> Result<(), LidarError>;
}

impl Transport for Box<dyn SerialPort> {
    fn set_motor(&mut self, on: bool) -> Result<(), LidarError> {
        // The motor driver is active low on DTR.
        self.write_data_terminal_ready(!on)?;
        Ok(())
    }

    fn clear_input(&mut self) -> Result<(), LidarError> {
        self.clear(ClearBuffer::Input)?;
        Ok(())
    }

    fn set_request_to_send(&mut self, level: bool) -> Result<(), LidarError> {
        self.write_request_to_send(level)?;
        Ok(())
    }
}

pub(crate) fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0, |c, b| c ^ b)
}

pub(crate) fn send_data<P: Write + ?Sized>(port: &mut P, data: &[u8]) -> Result<(), LidarError> {
    trace!(bytes = %crate::numeric::to_string(data), "send");
    port.write_all(data)?;
    port.flush()?;
    Ok(())
}

/// Writes `0xA5 command`, followed by `len payload.. checksum` when a
/// payload is given.
pub(crate) fn send_command<P: Write + ?Sized>(
    port: &mut P,
    command: u8,
    payload: Option<&[u8]>,
) -> Result<(), LidarError> {
    let mut data: Vec<u8> = vec![LIDAR_CMD_SYNC_BYTE, command];
    if let Some(payload) = payload {
        data.push(payload.len() as u8);
        data.extend_from_slice(payload);
        data.push(checksum(&data));
    }
    send_data(port, &data)
}

/// Reads up to `data_size` bytes. Fewer bytes are returned only when the
/// transport timed out.
pub(crate) fn read<P: Read + ?Sized>(
    port: &mut P,
    data_size: usize,
) -> Result<Vec<u8>, LidarError> {
    let mut packet: Vec<u8> = vec![0; data_size];
    let mut filled = 0;
    while filled < data_size {
        match port.read(&mut packet[filled..]) {
            Ok(0) => return Err(LidarError::Disconnected),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == ErrorKind::TimedOut => break,
            Err(e) => return Err(LidarError::Io(e)),
        }
    }
    packet.truncate(filled);
    Ok(packet)
}

/// Reads exactly `data_size` bytes or fails with a timeout.
pub(crate) fn read_exact<P: Read + ?Sized>(
    port: &mut P,
    data_size: usize,
) -> Result<Vec<u8>, LidarError> {
    let data = read(port, data_size)?;
    if data.len() < data_size {
        return Err(LidarError::TransportTimeout);
    }
    Ok(data)
}

pub(crate) fn read_byte<P: Read + ?Sized>(port: &mut P) -> Result<u8, LidarError> {
    Ok(read_exact(port, 1)?[0])
}

/// Consumes bytes up to and including `delimiter`. Returns how many bytes
/// were consumed before it.
pub(crate) fn read_until<P: Read + ?Sized>(
    port: &mut P,
    delimiter: u8,
) -> Result<usize, LidarError> {
    let mut skipped = 0;
    loop {
        if read_byte(port)? == delimiter {
            return Ok(skipped);
        }
        skipped += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_checksum() {
        assert_eq!(checksum(&[0xA5, 0x82, 0x05, 0, 0, 0, 0, 0]), 0x22);
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn test_send_command() {
        let mut sink: Vec<u8> = Vec::new();
        send_command(&mut sink, 0x50, None).unwrap();
        assert_eq!(sink, [0xA5, 0x50]);

        let mut sink: Vec<u8> = Vec::new();
        send_command(&mut sink, 0x82, Some(&[0x00, 0, 0, 0, 0])).unwrap();
        assert_eq!(sink, [0xA5, 0x82, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x22]);
    }

    #[test]
    fn test_read_until() {
        let mut port = Cursor::new(vec![0x01, 0x02, b'\n', 0x03]);
        assert_eq!(read_until(&mut port, b'\n').unwrap(), 2);
        assert_eq!(read_byte(&mut port).unwrap(), 0x03);
        assert!(matches!(read_byte(&mut port), Err(LidarError::Disconnected)));
    }

    #[cfg(unix)]
    #[test]
    fn test_read_short_on_timeout() {
        use serialport::TTYPort;
        use std::time::Duration;

        let (mut master, mut slave) = TTYPort::pair().expect("Unable to create ptty pair");
        slave.set_timeout(Duration::from_millis(50)).unwrap();
        master.write_all(&[0xA5, 0x5A, 0x14]).unwrap();
        std::thread::sleep(Duration::from_millis(10));

        let data = read(&mut slave, 7).unwrap();
        assert_eq!(data, [0xA5, 0x5A, 0x14]);
        assert!(matches!(
            read_exact(&mut slave, 1),
            Err(LidarError::TransportTimeout)
        ));
    }
}
