//! The packet filter stage.
//!
//! [`SeiTap`] is a per-stream pipeline stage invoked once per elementary
//! stream packet by an external driver. For each packet it:
//!
//! 1. Scans the payload for an embedded `<trace>…</trace>` text span and
//!    appends a timestamp-tagged record to the record sink — a side
//!    effect only, the packet is untouched.
//! 2. Conditionally prepends the stream's extradata ahead of the payload
//!    and hands back exactly one output packet.
//!
//! ```text
//! driver ──Packet──▶ extract (sink record) ──▶ rewrite ──Packet──▶ driver
//! ```
//!
//! ## Lifecycle
//!
//! One stage instance per stream: [`start`](SeiTap::start) opens the sink
//! and resets the packet counter, [`stop`](SeiTap::stop) closes the sink.
//! Calls are strictly sequential — the stage is `&mut self` throughout and
//! holds no shared state, so concurrent pipeline instances stay
//! independent.
//!
//! There is no retry logic anywhere in the stage: I/O and allocation
//! faults propagate to the driver immediately.

mod extract;
mod rewrite;

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::packet::Packet;
use crate::sink::RecordSink;

use extract::Extractor;

/// When to prepend extradata onto packets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DumpPolicy {
    /// Only on packets flagged as keyframes.
    #[default]
    Keyframe,
    /// On every packet.
    All,
}

impl FromStr for DumpPolicy {
    type Err = Error;

    /// Accepts `k`/`keyframe` and `e`/`all`.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "k" | "keyframe" => Ok(Self::Keyframe),
            "e" | "all" => Ok(Self::All),
            other => Err(Error::InvalidParams(format!(
                "unknown dump policy {other:?} (expected k/keyframe or e/all)"
            ))),
        }
    }
}

/// Stage-level configuration, fixed for the stage's lifetime.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Extradata prepend policy.
    pub policy: DumpPolicy,
    /// Where the record sink is opened. Truncated at every
    /// [`start`](SeiTap::start).
    pub log_path: PathBuf,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            policy: DumpPolicy::default(),
            log_path: PathBuf::from("sei_dump.log"),
        }
    }
}

/// Per-stream initialization data supplied by the demuxer.
#[derive(Debug, Clone, Default)]
pub struct StreamParams {
    /// Codec initialization data to prepend on the rewrite path. `None`
    /// means the stage always passes packets through.
    pub extradata: Option<Vec<u8>>,
}

impl StreamParams {
    fn validate(&self) -> Result<()> {
        if let Some(extra) = &self.extradata {
            if extra.is_empty() {
                return Err(Error::InvalidParams(
                    "extradata configured but empty".into(),
                ));
            }
        }
        Ok(())
    }
}

/// The filter stage: SEI text tap plus conditional extradata prepend.
///
/// Owns the record sink, the scratch extraction buffer and the running
/// packet counter. All state is per-instance — no module-level globals.
#[derive(Debug)]
pub struct SeiTap {
    config: FilterConfig,
    params: StreamParams,
    counter: u64,
    extractor: Extractor,
    sink: Option<RecordSink>,
}

impl SeiTap {
    /// Create a stopped stage.
    ///
    /// Returns [`Error::InvalidParams`] when the stream parameters are
    /// malformed (extradata configured but empty).
    pub fn new(config: FilterConfig, params: StreamParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            config,
            params,
            counter: 0,
            extractor: Extractor::new(),
            sink: None,
        })
    }

    /// Start the stage: reset the packet counter and open the record sink.
    ///
    /// Fails with [`Error::SinkUnavailable`] when the sink cannot be
    /// opened — the stage then refuses to process packets. Fails with
    /// [`Error::AlreadyStarted`] when the sink is already open; it is
    /// never reopened mid-stream.
    pub fn start(&mut self) -> Result<()> {
        if self.sink.is_some() {
            return Err(Error::AlreadyStarted);
        }
        self.counter = 0;
        match RecordSink::create(&self.config.log_path) {
            Ok(sink) => {
                self.sink = Some(sink);
                tracing::info!(
                    log_path = %self.config.log_path.display(),
                    policy = ?self.config.policy,
                    extradata_len = self.params.extradata.as_ref().map(Vec::len),
                    "filter started"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    log_path = %self.config.log_path.display(),
                    error = %e,
                    "filter start failed"
                );
                Err(e)
            }
        }
    }

    /// Stop the stage and close the sink.
    ///
    /// Safe to call on a stage that never started or whose
    /// [`start`](Self::start) failed — a no-op then, not a fault.
    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.close();
            tracing::info!(packets = self.counter, "filter stopped");
        }
    }

    /// Process one packet: extract (sink side effect), then rewrite.
    ///
    /// Consumes the input packet and returns exactly one output packet —
    /// rewritten with the extradata prefix, or the input moved through
    /// unmodified. On a fault the input buffer is still released (dropped)
    /// before the call returns.
    pub fn filter(&mut self, pkt: Packet) -> Result<Packet> {
        let sink = self.sink.as_mut().ok_or(Error::NotStarted)?;

        self.counter += 1;
        self.extractor.extract(self.counter, &pkt, sink)?;

        rewrite::rewrite(
            pkt,
            self.params.extradata.as_deref(),
            self.config.policy,
        )
    }

    /// Number of packets processed since [`start`](Self::start).
    pub fn packets_seen(&self) -> u64 {
        self.counter
    }

    /// Whether the sink is open and the stage accepts packets.
    pub fn is_started(&self) -> bool {
        self.sink.is_some()
    }
}

impl Drop for SeiTap {
    fn drop(&mut self) {
        self.stop();
    }
}
