//! Error types for the packet filter library.

use std::collections::TryReserveError;
use std::path::PathBuf;

/// Errors that can occur in the packet filter library.
///
/// Variants map to specific failure modes across the stage:
///
/// - **Lifecycle**: [`NotStarted`](Self::NotStarted),
///   [`AlreadyStarted`](Self::AlreadyStarted),
///   [`SinkUnavailable`](Self::SinkUnavailable).
/// - **Rewrite**: [`SizeOverflow`](Self::SizeOverflow),
///   [`Allocation`](Self::Allocation).
/// - **Stream setup**: [`InvalidParams`](Self::InvalidParams).
/// - **I/O**: [`Io`](Self::Io) — sink write failures,
///   [`Upstream`](Self::Upstream) — packet source failures, propagated
///   unchanged.
///
/// No variant is retried internally; every fault surfaces to the caller
/// immediately.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// [`SeiTap::filter`](crate::SeiTap::filter) was called before a
    /// successful [`start`](crate::SeiTap::start).
    #[error("filter not started")]
    NotStarted,

    /// [`SeiTap::start`](crate::SeiTap::start) was called while the sink is
    /// already open. The sink is never reopened mid-stream.
    #[error("filter already started")]
    AlreadyStarted,

    /// The record sink could not be opened at stage startup. Fatal: the
    /// stage must not process any packets without a sink.
    #[error("record sink unavailable: {}: {source}", .path.display())]
    SinkUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid or missing stream initialization data (e.g. extradata
    /// configured but empty).
    #[error("invalid stream parameters: {0}")]
    InvalidParams(String),

    /// The rewritten packet size would overflow the representable size type.
    #[error("rewritten packet size overflows: packet={packet} extra={extra}")]
    SizeOverflow { packet: usize, extra: usize },

    /// Output buffer acquisition failed on the rewrite path.
    #[error("packet buffer allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    /// Sink write error while appending a record.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The packet source reported an error; propagated unchanged.
    #[error("upstream error: {0}")]
    Upstream(std::io::Error),
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
