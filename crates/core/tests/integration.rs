//! Integration test: full stage lifecycle over a synthetic packet stream.
//!
//! Builds a filter against a temp-dir record sink, pushes packets through
//! the public API, and verifies both the output packets and the persisted
//! records.

use seitap::{DumpPolicy, FilterConfig, Packet, Rational, SeiTap, StreamParams};

const EXTRA: &[u8] = &[0, 0, 0, 1, 0x67];

fn tap_in(dir: &tempfile::TempDir, policy: DumpPolicy, extradata: Option<Vec<u8>>) -> SeiTap {
    let config = FilterConfig {
        policy,
        log_path: dir.path().join("records.log"),
    };
    let mut tap = SeiTap::new(config, StreamParams { extradata }).unwrap();
    tap.start().unwrap();
    tap
}

fn read_log(dir: &tempfile::TempDir) -> String {
    String::from_utf8(std::fs::read(dir.path().join("records.log")).unwrap()).unwrap()
}

/// A 20-byte packet: 2 filler bytes, the opening tag, 2 payload bytes, the
/// closing tag, 1 filler byte.
fn tagged_20_byte_packet() -> Vec<u8> {
    let data = b"..<trace>ab</trace>.".to_vec();
    assert_eq!(data.len(), 20);
    data
}

#[test]
fn keyframe_packet_is_tapped_and_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let mut tap = tap_in(&dir, DumpPolicy::Keyframe, Some(EXTRA.to_vec()));

    // 90 kHz ticks: dts 45000 = 500 ms, pts 90000 = 1000 ms
    let mut pkt = Packet::new(tagged_20_byte_packet(), 90000, 45000, Rational::VIDEO_90KHZ);
    pkt.keyframe = true;

    let out = tap.filter(pkt).unwrap();
    tap.stop();

    // output = extradata ++ input, length 25
    assert_eq!(out.len(), 25);
    assert_eq!(&out.data[..EXTRA.len()], EXTRA);
    assert_eq!(&out.data[EXTRA.len()..], tagged_20_byte_packet().as_slice());
    assert!(out.keyframe);

    // persisted record carries the bounded span between the computed offsets
    assert_eq!(read_log(&dir), "1 dts/pts:[500 - 1000]  ab</trace>\n");
}

#[test]
fn non_keyframe_passes_through_but_is_still_tapped() {
    let dir = tempfile::tempdir().unwrap();
    let mut tap = tap_in(&dir, DumpPolicy::Keyframe, Some(EXTRA.to_vec()));

    let pkt = Packet::new(tagged_20_byte_packet(), 90000, 45000, Rational::VIDEO_90KHZ);
    let input = pkt.clone();

    let out = tap.filter(pkt).unwrap();
    tap.stop();

    // extraction is independent of the rewrite policy
    assert_eq!(out, input);
    assert_eq!(read_log(&dir), "1 dts/pts:[500 - 1000]  ab</trace>\n");
}

#[test]
fn stage_applied_twice_rewrites_once() {
    let dir1 = tempfile::tempdir().unwrap();
    let dir2 = tempfile::tempdir().unwrap();
    let mut first = tap_in(&dir1, DumpPolicy::All, Some(EXTRA.to_vec()));
    let mut second = tap_in(&dir2, DumpPolicy::All, Some(EXTRA.to_vec()));

    let pkt = Packet::new(
        b"frame payload without the prefix".to_vec(),
        0,
        0,
        Rational::VIDEO_90KHZ,
    );

    let once = first.filter(pkt).unwrap();
    assert_eq!(&once.data[..EXTRA.len()], EXTRA);

    let twice = second.filter(once.clone()).unwrap();
    assert_eq!(twice, once);

    first.stop();
    second.stop();
}

#[test]
fn counter_runs_one_to_n_without_gaps() {
    let dir = tempfile::tempdir().unwrap();
    let mut tap = tap_in(&dir, DumpPolicy::Keyframe, None);

    for _ in 0..250 {
        // long enough to scan, tagged so every packet persists a record
        tap.filter(Packet::new(
            b"<trace>x</trace>....".to_vec(),
            0,
            0,
            Rational::VIDEO_90KHZ,
        ))
        .unwrap();
    }
    assert_eq!(tap.packets_seen(), 250);
    tap.stop();

    let log = read_log(&dir);
    let counters: Vec<u64> = log
        .lines()
        .map(|l| l.split(' ').next().unwrap().parse().unwrap())
        .collect();
    assert_eq!(counters, (1..=250).collect::<Vec<u64>>());
}

#[test]
fn short_and_unmatched_packets_produce_no_records() {
    let dir = tempfile::tempdir().unwrap();
    let mut tap = tap_in(&dir, DumpPolicy::Keyframe, None);

    // at the 12-byte threshold
    tap.filter(Packet::new(vec![0xAB; 12], 0, 0, Rational::VIDEO_90KHZ))
        .unwrap();
    // above the threshold, no delimiters
    tap.filter(Packet::new(vec![0xCD; 64], 0, 0, Rational::VIDEO_90KHZ))
        .unwrap();
    tap.stop();

    assert!(read_log(&dir).is_empty());
}

#[test]
fn record_payload_is_bounded_regardless_of_packet_size() {
    let dir = tempfile::tempdir().unwrap();
    let mut tap = tap_in(&dir, DumpPolicy::Keyframe, None);

    let mut data = b"<trace>".to_vec();
    data.extend(std::iter::repeat(b'Z').take(64 * 1024));
    data.extend_from_slice(b"</trace>");
    tap.filter(Packet::new(data, 0, 0, Rational::VIDEO_90KHZ))
        .unwrap();
    tap.stop();

    let log = read_log(&dir);
    let payload = log
        .strip_prefix("1 dts/pts:[0 - 0]  ")
        .unwrap()
        .strip_suffix('\n')
        .unwrap();
    assert_eq!(payload.len(), 12 * 1024);
}

#[test]
fn restart_resets_the_counter_and_truncates_the_log() {
    let dir = tempfile::tempdir().unwrap();
    let mut tap = tap_in(&dir, DumpPolicy::Keyframe, None);

    tap.filter(Packet::new(
        b"<trace>first</trace>".to_vec(),
        0,
        0,
        Rational::VIDEO_90KHZ,
    ))
    .unwrap();
    tap.stop();

    tap.start().unwrap();
    tap.filter(Packet::new(
        b"<trace>again</trace>".to_vec(),
        0,
        0,
        Rational::VIDEO_90KHZ,
    ))
    .unwrap();
    tap.stop();

    // fresh sink, counter back at 1
    assert_eq!(read_log(&dir), "1 dts/pts:[0 - 0]  again</trace>\n");
}
