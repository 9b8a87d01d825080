//! Embedded payload extraction.
//!
//! Encoders in the supported streams smuggle a textual telemetry payload
//! inside the encoded bytes, framed by a fixed tag pair:
//!
//! ```text
//! ... <trace>payload text</trace> ...
//! ```
//!
//! [`Extractor::extract`] runs a single left-to-right scan over one
//! packet's bytes, copies the framed span into a bounded scratch buffer
//! and appends a timestamp-tagged record to the sink:
//!
//! ```text
//! <counter> dts/pts:[<dts_ms> - <pts_ms>]  <payload>\n
//! ```
//!
//! Extraction is a side effect only: it never mutates the packet and a
//! packet that carries no tag pair produces no record and no fault.
//!
//! ## Scan outcomes
//!
//! The scan honors only the *first* occurrence of each marker and resolves
//! to one of three explicit outcomes — a marker pair that is absent,
//! unterminated, or out of order is a no-op, never a wrapped span length:
//!
//! - [`Span::NotFound`] — no record.
//! - [`Span::Empty`] — markers matched but frame a zero-length span;
//!   a header-only record is written.
//! - [`Span::Found`] — record with the framed bytes (clamped to the
//!   scratch capacity; overflow bytes are dropped, not a fault).

use crate::error::Result;
use crate::packet::Packet;
use crate::sink::RecordSink;

/// Opening tag marker the scan looks for.
const OPEN_MARK: &[u8] = b"<tr";
/// Full opening label. The span starts immediately after it; the label is
/// assumed, not verified, to follow a matched [`OPEN_MARK`].
const OPEN_LABEL: &[u8] = b"<trace>";
/// Closing tag marker. The span ends immediately after it, so the closing
/// tag itself is part of the extracted bytes.
const CLOSE_MARK: &[u8] = b"</trace>";

/// Packets must be strictly longer than this to be scanned at all; anything
/// shorter cannot carry a tag pair.
const MIN_SCAN_LEN: usize = 12;

/// Scratch buffer capacity. Span bytes beyond this are silently dropped.
pub(crate) const SCRATCH_CAPACITY: usize = 12 * 1024;

/// Longest side-data prefix rendered into diagnostics.
const SIDE_DATA_PRINT_MAX: usize = 256;

/// Resolved location of the framed payload within one packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Span {
    /// Markers absent, unterminated, or out of order.
    NotFound,
    /// Marker pair matched but frames zero bytes.
    Empty,
    /// Half-open byte range of the framed payload.
    Found(std::ops::Range<usize>),
}

/// Locate the first `<trace>…</trace>` span in `data`.
pub(crate) fn locate_span(data: &[u8]) -> Span {
    scan(data, OPEN_MARK, OPEN_LABEL.len(), CLOSE_MARK)
}

/// Single-pass scan for the first occurrence of each marker.
///
/// `label_len` is the length of the opening label assumed to follow a
/// matched `open` marker; the span starts `label_len` bytes after the
/// match. Both markers are captured independently, so a closing marker
/// that precedes the opening one resolves to [`Span::NotFound`] rather
/// than a negative span.
fn scan(data: &[u8], open: &[u8], label_len: usize, close: &[u8]) -> Span {
    let mut start = None;
    let mut end = None;

    let mut i = 0;
    while i < data.len() && (start.is_none() || end.is_none()) {
        if start.is_none() && data[i..].starts_with(open) {
            start = Some(i + label_len);
            i += open.len();
            continue;
        }
        if end.is_none() && data[i..].starts_with(close) {
            end = Some(i + close.len());
            i += close.len();
            continue;
        }
        i += 1;
    }

    match (start, end) {
        (Some(s), Some(e)) if s < e => Span::Found(s..e),
        (Some(s), Some(e)) if s == e => Span::Empty,
        // e < s: markers reversed, or the assumed label overruns the
        // closing marker. The reference arithmetic would underflow here.
        (Some(_), Some(_)) => Span::NotFound,
        _ => Span::NotFound,
    }
}

/// Scans packets for framed payloads and appends records to the sink.
///
/// Owns the reusable scratch buffer; the previous record's bytes do not
/// survive to the next call.
#[derive(Debug)]
pub(crate) struct Extractor {
    scratch: Vec<u8>,
}

impl Extractor {
    pub(crate) fn new() -> Self {
        Self {
            scratch: Vec::with_capacity(SCRATCH_CAPACITY),
        }
    }

    /// Scan one packet and append a record to `sink` if a payload span is
    /// found. Side effect only — the packet is untouched.
    ///
    /// `counter` is the stage's running packet counter (already
    /// incremented for this packet).
    pub(crate) fn extract(
        &mut self,
        counter: u64,
        pkt: &Packet,
        sink: &mut RecordSink,
    ) -> Result<()> {
        trace_checkpoint(counter, pkt);

        if pkt.len() <= MIN_SCAN_LEN {
            return Ok(());
        }

        let span = match locate_span(&pkt.data) {
            Span::NotFound => return Ok(()),
            Span::Empty => 0..0,
            Span::Found(range) => range,
        };

        self.scratch.clear();
        let take = span.len().min(SCRATCH_CAPACITY);
        if take < span.len() {
            tracing::debug!(
                counter,
                span_len = span.len(),
                capacity = SCRATCH_CAPACITY,
                "payload truncated to scratch capacity"
            );
        }
        self.scratch
            .extend_from_slice(&pkt.data[span.start..span.start + take]);

        let header = record_header(counter, pkt);
        sink.append(header.as_bytes())?;
        sink.append(&self.scratch)?;
        sink.append(b"\n")?;
        Ok(())
    }
}

/// Format the record header: counter plus dts/pts rescaled to milliseconds.
fn record_header(counter: u64, pkt: &Packet) -> String {
    format!(
        "{} dts/pts:[{} - {}]  ",
        counter,
        pkt.time_base.to_millis(pkt.dts),
        pkt.time_base.to_millis(pkt.pts)
    )
}

/// Every-100th-packet diagnostic: raw timestamps, stream index, and the
/// first side-data blob rendered as bounded printable text.
///
/// Best-effort observability, independent of extraction — runs even for
/// packets too short to scan.
fn trace_checkpoint(counter: u64, pkt: &Packet) {
    if counter % 100 != 0 {
        return;
    }
    tracing::debug!(
        counter,
        dts = pkt.dts,
        pts = pkt.pts,
        stream_index = pkt.stream_index,
        "packet checkpoint"
    );
    if let Some(sd) = pkt.side_data.first() {
        tracing::info!(
            elems = pkt.side_data.len(),
            kind = sd.kind,
            text = %printable_prefix(&sd.data),
            "side data attached"
        );
    }
}

/// Render a bounded printable prefix of a side-data blob.
///
/// Side data is not guaranteed to be text, let alone NUL-terminated text:
/// the rendering stops at the first NUL, is capped at
/// [`SIDE_DATA_PRINT_MAX`] bytes, and replaces invalid UTF-8.
fn printable_prefix(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(bytes.len())
        .min(SIDE_DATA_PRINT_MAX);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
