//! # ThinkGear Payload Checksum
//!
//! One's complement of the low byte of the payload sum.

/// Running checksum, fed one payload byte at a time
#[derive(Debug, Default, Clone, Copy)]
pub struct Checksum {
    sum: u8,
}

impl Checksum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one payload byte (sum is kept modulo 256)
    pub fn update(&mut self, byte: u8) {
        self.sum = self.sum.wrapping_add(byte);
    }

    /// Expected checksum byte for everything fed so far
    pub fn finish(&self) -> u8 {
        !self.sum
    }
}

/// Checksum over a complete payload
///
/// # Examples
///
/// ```
/// use brainband::thinkgear::checksum::payload_checksum;
///
/// assert_eq!(payload_checksum(&[0x04, 0x64]), 0x97);
/// ```
pub fn payload_checksum(payload: &[u8]) -> u8 {
    let mut checksum = Checksum::new();
    for &byte in payload {
        checksum.update(byte);
    }
    checksum.finish()
}

/// Straight transcription of `(~sum) & 0xFF` over a widened sum, for tests
#[cfg(test)]
fn payload_checksum_slow(payload: &[u8]) -> u8 {
    let sum: u32 = payload.iter().map(|&b| b as u32).sum();
    ((!sum) & 0xFF) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_empty() {
        assert_eq!(payload_checksum(&[]), 0xFF);
    }

    #[test]
    fn test_checksum_known_vectors() {
        assert_eq!(payload_checksum(&[0x04, 0x64]), 0x97);
        assert_eq!(payload_checksum(&[0x05, 0x32]), 0xC8);
        assert_eq!(payload_checksum(&[0x02, 0x1E]), 0xDF);
        assert_eq!(payload_checksum(&[0x80, 0x02, 0x01, 0x02]), 0x7A);
    }

    #[test]
    fn test_checksum_wraps() {
        let payload = vec![0xFF; 169];
        assert_eq!(payload_checksum(&payload), payload_checksum_slow(&payload));

        let payload: Vec<u8> = (0..=168).map(|i| i as u8).collect();
        assert_eq!(payload_checksum(&payload), payload_checksum_slow(&payload));
    }

    #[test]
    fn test_running_matches_batch() {
        let payload = [0x02, 0x00, 0x04, 0x3C, 0x05, 0x28];
        let mut running = Checksum::new();
        for &b in &payload {
            running.update(b);
        }
        assert_eq!(running.finish(), payload_checksum(&payload));
    }
}
