//! Packet and timing value types.
//!
//! A [`Packet`] is one unit of encoded media data moving through the
//! filter: payload bytes plus timing and auxiliary metadata. The filter
//! takes ownership of the packet for the duration of one
//! [`SeiTap::filter`](crate::SeiTap::filter) call and hands back exactly
//! one output packet — either the same buffer moved through, or a newly
//! allocated rewrite. Move semantics make the release single and
//! unconditional on every exit path.

/// Rational time base: a scale factor converting integer timestamp ticks
/// into seconds (`ticks * num / den`).
///
/// Video elementary streams commonly use 1/90000 (90 kHz).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /// The 90 kHz video clock, `1/90000`.
    pub const VIDEO_90KHZ: Rational = Rational { num: 1, den: 90000 };

    pub fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// Rescale `ticks` in this time base to milliseconds.
    ///
    /// The intermediate product is computed in 128 bits, so
    /// `ticks * num * 1000` cannot overflow for any `i64` tick value.
    /// The division truncates toward zero.
    ///
    /// The upstream contract guarantees a valid time base; a zero
    /// denominator is a caller bug.
    pub fn to_millis(self, ticks: i64) -> i64 {
        debug_assert!(self.den != 0, "time base denominator must be non-zero");
        (ticks as i128 * self.num as i128 * 1000 / self.den as i128) as i64
    }
}

/// An auxiliary typed byte blob attached to a packet, carrying out-of-band
/// information distinct from the main payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideData {
    /// Container-defined type tag.
    pub kind: u32,
    pub data: Vec<u8>,
}

/// One unit of encoded media data with its timing metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Payload bytes. Owned; the upstream source must not reuse the buffer
    /// after handing the packet to the filter.
    pub data: Vec<u8>,
    /// Presentation timestamp in `time_base` ticks.
    pub pts: i64,
    /// Decode timestamp in `time_base` ticks.
    pub dts: i64,
    /// Scale converting `pts`/`dts` ticks to seconds.
    pub time_base: Rational,
    /// Whether this packet starts a keyframe (e.g. an IDR access unit).
    pub keyframe: bool,
    /// Index of the elementary stream this packet belongs to.
    pub stream_index: usize,
    /// Attached side-data blobs, possibly empty.
    pub side_data: Vec<SideData>,
}

impl Packet {
    /// Create a packet with the given payload and timestamps. Not a
    /// keyframe, stream index 0, no side data — set fields directly for
    /// anything else.
    pub fn new(data: Vec<u8>, pts: i64, dts: i64, time_base: Rational) -> Self {
        Self {
            data,
            pts,
            dts,
            time_base,
            keyframe: false,
            stream_index: 0,
            side_data: Vec::new(),
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescale_90khz_to_millis() {
        let tb = Rational::VIDEO_90KHZ;
        assert_eq!(tb.to_millis(90000), 1000);
        assert_eq!(tb.to_millis(45000), 500);
        assert_eq!(tb.to_millis(0), 0);
    }

    #[test]
    fn rescale_truncates_toward_zero() {
        let tb = Rational::new(1, 90000);
        // 100 ticks = 1.11... ms
        assert_eq!(tb.to_millis(100), 1);
        assert_eq!(tb.to_millis(-100), -1);
    }

    #[test]
    fn rescale_large_ticks_no_overflow() {
        // i64::MAX ticks at 1/1000 would overflow a 64-bit product by
        // a factor of 1000; the 128-bit intermediate must carry it.
        let tb = Rational::new(1, 1000);
        assert_eq!(tb.to_millis(i64::MAX), i64::MAX);
    }

    #[test]
    fn rescale_non_unit_numerator() {
        // 1001/30000 (NTSC frame durations): one tick = 33.366... ms
        let tb = Rational::new(1001, 30000);
        assert_eq!(tb.to_millis(1), 33);
        assert_eq!(tb.to_millis(30), 1001);
    }

    #[test]
    fn packet_new_defaults() {
        let pkt = Packet::new(vec![1, 2, 3], 10, 5, Rational::VIDEO_90KHZ);
        assert_eq!(pkt.len(), 3);
        assert!(!pkt.keyframe);
        assert_eq!(pkt.stream_index, 0);
        assert!(pkt.side_data.is_empty());
    }
}
