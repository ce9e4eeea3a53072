//! Literal byte-pattern scanning.
//!
//! Every starting offset is probed, so overlapping occurrences are all reported.
//! Matches come back in ascending offset order, which keeps patch application and
//! reporting reproducible for the same input. The search is the plain
//! O(n*m) sliding window; signatures are 16 bytes and modules a few tens of MB.

use serde::Serialize;

/// A location where a pattern was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    /// Offset of the first matched byte
    pub offset: usize,
    /// The bytes found at `offset`
    #[serde(serialize_with = "crate::scan::serialize_hex")]
    pub bytes: Vec<u8>,
}

/// Find every occurrence of `pattern` in `buffer`.
///
/// An empty pattern, or one longer than the buffer, yields no matches.
pub fn find_all(buffer: &[u8], pattern: &[u8]) -> Vec<Match> {
    if pattern.is_empty() || pattern.len() > buffer.len() {
        return Vec::new();
    }

    buffer
        .windows(pattern.len())
        .enumerate()
        .filter(|(_, window)| *window == pattern)
        .map(|(offset, window)| Match {
            offset,
            bytes: window.to_vec(),
        })
        .collect()
}

/// Format bytes as spaced upper-case hex, e.g. `BF 4B 00 00 00`.
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| hex::encode_upper([*byte]))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn serialize_hex<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format_hex(bytes))
}
