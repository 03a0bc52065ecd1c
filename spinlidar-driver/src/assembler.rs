use spinlidar_data::{Measurement, Scan, ScanPoint, SCAN_POINTS};

/// Angle whose arrival completes a rotation.
pub const DEFAULT_BOUNDARY_ANGLE: u16 = (SCAN_POINTS - 1) as u16;

/// Folds measurements into a live 360-slot buffer and hands out a copy of
/// it each time the boundary angle is written.
///
/// The buffer is never cleared: right after a boundary, slots not yet
/// written in the new rotation still hold the previous rotation's values.
pub struct ScanAssembler {
    buffer: Vec<ScanPoint>,
    rotation_speed: f32,
    boundary_angle: u16,
    completed: u64,
}

impl ScanAssembler {
    pub fn new(boundary_angle: u16) -> Self {
        ScanAssembler {
            buffer: vec![ScanPoint::UNKNOWN; SCAN_POINTS],
            rotation_speed: 0.,
            boundary_angle,
            completed: 0,
        }
    }

    pub fn set_rotation_speed(&mut self, rpm: f32) {
        self.rotation_speed = rpm;
    }

    pub fn rotation_speed(&self) -> f32 {
        self.rotation_speed
    }

    /// Number of scans emitted so far.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn push(&mut self, measurement: &Measurement) -> Option<Scan> {
        let slot = self.buffer.get_mut(measurement.angle as usize)?;
        *slot = measurement.point();
        if measurement.angle != self.boundary_angle {
            return None;
        }
        self.completed += 1;
        Scan::new(self.rotation_speed, self.buffer.clone())
    }
}

impl Default for ScanAssembler {
    fn default() -> Self {
        ScanAssembler::new(DEFAULT_BOUNDARY_ANGLE)
    }
}
