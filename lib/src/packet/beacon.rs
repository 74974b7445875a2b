//! Provides the beacon wire format sent by malt senders
//!
//! ```text
//! magic:u64 | sequence:u64 | send_time_nanos:u64 | host_name_len:u8 | host_name
//! ```
//!
//! Fields are packed without padding and integers are little-endian.

/// Identifies traffic generated by a malt sender
pub const MAGIC: u64 = 5505949305068913751;

/// Size of the fixed part of a beacon
pub const HEADER_SIZE: usize = 8 + 8 + 8 + 1;

/// Longest host name carried in a beacon
pub const MAX_HOST_NAME_LEN: usize = 63;

/// Data structure representing the beacon a sender transmits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconRecord {
    /// Sequence number, starting at 0
    pub sequence: u64,
    /// Send time in nanoseconds since the epoch
    pub time_nanos: u64,
    host_name: Vec<u8>,
}

impl BeaconRecord {
    /// Returns a beacon with sequence 0 for the given host name, truncated to
    /// [`MAX_HOST_NAME_LEN`] bytes
    pub fn new(host_name: &[u8]) -> Self {
        let len = host_name.len().min(MAX_HOST_NAME_LEN);
        Self {
            sequence: 0,
            time_nanos: 0,
            host_name: host_name[..len].to_vec(),
        }
    }

    /// Host name bytes as they appear on the wire
    pub fn host_name(&self) -> &[u8] {
        &self.host_name
    }

    /// Total encoded size
    pub fn wire_len(&self) -> usize {
        HEADER_SIZE + self.host_name.len()
    }

    /// Encodes the beacon for transmission
    pub fn to_raw(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.wire_len());
        buf.extend_from_slice(&MAGIC.to_le_bytes());
        buf.extend_from_slice(&self.sequence.to_le_bytes());
        buf.extend_from_slice(&self.time_nanos.to_le_bytes());
        // host_name is bounded by MAX_HOST_NAME_LEN
        buf.push(self.host_name.len() as u8);
        buf.extend_from_slice(&self.host_name);
        buf
    }

    /// Overwrites the sequence and send time of a buffer produced by
    /// [`BeaconRecord::to_raw`] with the current values
    pub fn update_raw(&self, raw: &mut [u8]) {
        raw[8..16].copy_from_slice(&self.sequence.to_le_bytes());
        raw[16..24].copy_from_slice(&self.time_nanos.to_le_bytes());
    }
}

/// Borrowed view of a beacon found in a received payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeaconView<'a> {
    /// Sequence number chosen by the sender
    pub sequence: u64,
    /// Time the sender transmitted the beacon
    pub time_nanos: u64,
    /// Sender host name bytes
    pub host_name: &'a [u8],
}

fn read_u64(bytes: &[u8], offset: usize) -> Option<u64> {
    let raw: [u8; 8] = bytes.get(offset..offset + 8)?.try_into().ok()?;
    Some(u64::from_le_bytes(raw))
}

/// Recognizes a beacon in a UDP payload
///
/// Returns None unless the payload is longer than the fixed header, starts
/// with [`MAGIC`] and its size matches the embedded host name length exactly.
pub fn decode(payload: &[u8]) -> Option<BeaconView<'_>> {
    if payload.len() <= HEADER_SIZE {
        return None;
    }

    if read_u64(payload, 0)? != MAGIC {
        return None;
    }

    let host_name_len = usize::from(payload[HEADER_SIZE - 1]);

    if payload.len() != HEADER_SIZE + host_name_len {
        return None;
    }

    Some(BeaconView {
        sequence: read_u64(payload, 8)?,
        time_nanos: read_u64(payload, 16)?,
        host_name: &payload[HEADER_SIZE..],
    })
}

#[cfg(test)]
#[path = "./beacon_tests.rs"]
mod tests;
