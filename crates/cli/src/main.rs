mod stream;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use seitap::{DumpPolicy, Error, FilterConfig, Packet, Rational, SeiTap, StreamParams};

#[derive(Parser)]
#[command(
    name = "seitap",
    about = "Run the SEI text tap / extradata-prepend filter over an Annex B stream"
)]
struct Args {
    /// Annex B input file
    input: PathBuf,

    /// Filtered Annex B output file
    #[arg(long, short)]
    out: PathBuf,

    /// File holding the extradata blob to prepend (e.g. SPS/PPS with start codes)
    #[arg(long)]
    extra: Option<PathBuf>,

    /// Prepend policy: k/keyframe or e/all
    #[arg(long, default_value = "keyframe", value_parser = parse_policy)]
    freq: DumpPolicy,

    /// Record sink path
    #[arg(long, default_value = "sei_dump.log")]
    log: PathBuf,

    /// Frame rate used to synthesize 90 kHz timestamps
    #[arg(long, default_value_t = 25)]
    fps: u32,
}

fn parse_policy(s: &str) -> seitap::Result<DumpPolicy> {
    s.parse()
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    match run(&args) {
        Ok((packets, rewritten)) => {
            println!(
                "{} packets through, {} rewritten — records in {}",
                packets,
                rewritten,
                args.log.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("seitap: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> seitap::Result<(u64, usize)> {
    let data = fs::read(&args.input).map_err(Error::Upstream)?;
    let extradata = args
        .extra
        .as_ref()
        .map(|path| fs::read(path).map_err(Error::Upstream))
        .transpose()?;

    let config = FilterConfig {
        policy: args.freq,
        log_path: args.log.clone(),
    };
    let mut tap = SeiTap::new(config, StreamParams { extradata })?;
    tap.start()?;

    let time_base = Rational::VIDEO_90KHZ;
    let ticks_per_frame = i64::from(90000 / args.fps.max(1));

    let mut out = Vec::new();
    let mut rewritten = 0usize;
    for (i, nal) in stream::split_nal_units(&data).into_iter().enumerate() {
        let ts = i as i64 * ticks_per_frame;
        let mut pkt = Packet::new(nal.to_vec(), ts, ts, time_base);
        pkt.keyframe = stream::is_idr(nal);

        let in_len = pkt.len();
        let filtered = tap.filter(pkt)?;
        if filtered.len() != in_len {
            rewritten += 1;
        }

        out.extend_from_slice(&[0, 0, 0, 1]);
        out.extend_from_slice(&filtered.data);
    }
    tap.stop();

    fs::write(&args.out, &out)?;
    Ok((tap.packets_seen(), rewritten))
}
