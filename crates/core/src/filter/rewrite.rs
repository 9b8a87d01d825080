//! Conditional extradata prepend.
//!
//! Some downstream consumers need the stream's codec initialization data
//! (extradata) repeated in-band ahead of certain packets — typically so a
//! client can join mid-stream at any keyframe. [`rewrite`] decides per
//! packet whether to prepend the configured extradata and produces exactly
//! one output packet:
//!
//! - **Rewrite path**: a newly allocated buffer holding
//!   `extradata ++ packet`, with all metadata carried over.
//! - **Pass-through path**: the input packet moved through untouched, no
//!   allocation, no copy.
//!
//! The input packet is consumed by value on both paths, so its buffer is
//! released exactly once no matter how the call exits.

use crate::error::{Error, Result};
use crate::filter::DumpPolicy;
use crate::packet::Packet;

/// Whether `data` should get `extra` prepended.
///
/// All three must hold:
///
/// 1. `extra` is non-empty.
/// 2. The policy is satisfied ([`DumpPolicy::All`], or
///    [`DumpPolicy::Keyframe`] and the packet is a keyframe).
/// 3. `data` does not already begin with `extra`. A packet shorter than
///    `extra` counts as a mismatch and is always rewritten.
pub(crate) fn needs_prepend(
    data: &[u8],
    extra: &[u8],
    policy: DumpPolicy,
    keyframe: bool,
) -> bool {
    if extra.is_empty() {
        return false;
    }
    let policy_hit = match policy {
        DumpPolicy::All => true,
        DumpPolicy::Keyframe => keyframe,
    };
    if !policy_hit {
        return false;
    }
    data.len() < extra.len() || data[..extra.len()] != *extra
}

/// Checked size of a rewritten packet.
///
/// Returns [`Error::SizeOverflow`] when `packet + extra` is not
/// representable.
pub(crate) fn rewritten_len(packet: usize, extra: usize) -> Result<usize> {
    packet
        .checked_add(extra)
        .ok_or(Error::SizeOverflow { packet, extra })
}

/// Produce the output packet for one input packet.
///
/// When the prepend predicate holds, allocates `extra.len() + pkt.len()`
/// bytes ([`Error::Allocation`] if the buffer cannot be obtained) and
/// copies extradata then payload; otherwise moves the input through.
pub(crate) fn rewrite(pkt: Packet, extra: Option<&[u8]>, policy: DumpPolicy) -> Result<Packet> {
    let Some(extra) = extra else {
        return Ok(pkt);
    };
    if !needs_prepend(&pkt.data, extra, policy, pkt.keyframe) {
        return Ok(pkt);
    }

    let total = rewritten_len(pkt.len(), extra.len())?;
    let mut data = Vec::new();
    data.try_reserve_exact(total)?;
    data.extend_from_slice(extra);
    data.extend_from_slice(&pkt.data);

    tracing::trace!(
        packet_len = pkt.len(),
        extra_len = extra.len(),
        "extradata prepended"
    );

    // Metadata moves onto the output; the input buffer drops here.
    Ok(Packet { data, ..pkt })
}
