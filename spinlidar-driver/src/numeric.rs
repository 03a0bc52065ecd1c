pub(crate) fn to_u16(a: u8, b: u8) -> u16 {
    ((a as u16) << 8) + (b as u16)
}

pub(crate) fn to_u32(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .rev()
        .fold(0u32, |acc, &b| (acc << 8) | (b as u32))
}

/// Start angle field of an express frame, in degrees.
pub(crate) fn q6_to_degree(raw: u16) -> f64 {
    ((raw & 0x7FFF) as f64) / 64.
}

pub(crate) fn wrap_degree(degree: i32) -> u16 {
    degree.rem_euclid(360) as u16
}

/// Truncates towards zero, then folds into `[0, 360)`.
pub(crate) fn truncate_degree(degree: f64) -> u16 {
    wrap_degree(degree.trunc() as i32)
}

pub(crate) fn to_string(data: &[u8]) -> String {
    data.iter()
        .map(|e| format!("{:02X}", e))
        .collect::<Vec<_>>()
        .join(" ")
}
