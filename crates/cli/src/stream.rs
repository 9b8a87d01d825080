//! Annex B elementary stream framing.
//!
//! H.264 Annex B bitstreams delimit NAL units with start codes:
//! - 4-byte: `0x00 0x00 0x00 0x01`
//! - 3-byte: `0x00 0x00 0x01`
//!
//! The harness treats each NAL unit as one packet fed to the filter.
//! [`split_nal_units`] handles both start code formats and tracks each
//! start code's length so boundaries between adjacent NALs come out right
//! when the two formats are mixed.

/// Split an Annex B byte stream into NAL unit slices, excluding the start
/// codes themselves.
pub fn split_nal_units(data: &[u8]) -> Vec<&[u8]> {
    // (nal_data_start_index, start_code_length)
    let mut starts: Vec<(usize, usize)> = Vec::new();

    let mut i = 0usize;
    while i < data.len() {
        if data[i..].starts_with(&[0, 0, 0, 1]) {
            starts.push((i + 4, 4));
            i += 4;
        } else if data[i..].starts_with(&[0, 0, 1]) {
            starts.push((i + 3, 3));
            i += 3;
        } else {
            i += 1;
        }
    }

    let mut nals = Vec::with_capacity(starts.len());
    for (idx, &(start, _)) in starts.iter().enumerate() {
        let end = match starts.get(idx + 1) {
            Some(&(next_start, next_sc_len)) => next_start - next_sc_len,
            None => data.len(),
        };
        if start < end {
            nals.push(&data[start..end]);
        }
    }
    nals
}

/// Whether a NAL unit is an IDR slice (type 5) — the harness's keyframe
/// signal.
pub fn is_idr(nal: &[u8]) -> bool {
    nal.first().is_some_and(|b| b & 0x1f == 5)
}
