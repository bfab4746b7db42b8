use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;
use xxhash_rust::xxh3::xxh3_64;

use chanframe_codecs::{codec_by_id, codec_by_name};
use chanframe_core::format::{index_len, HEADER_SIZE};
use chanframe_core::{
    read_file, write_file, Compression, FrameReader, Position, Response, Samples, Scratch,
    WriteOptions, DEFAULT_COMPRESSION_THRESHOLD,
};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "chanframe",
    about = "Inspect, verify, and recompress channel-set frame files",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Off,
    Auto,
    Forced,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the header and index block
    Inspect {
        /// Frame file to inspect
        file: PathBuf,
        /// Decode the payload and print per-channel details
        #[arg(long)]
        channels: bool,
    },
    /// Fully decode a frame and print a digest of every channel's samples
    Verify {
        /// Frame file to verify
        file: PathBuf,
    },
    /// Decode a frame and write it again with different compression
    Recompress {
        /// Source frame file
        input: PathBuf,
        /// Destination frame file
        output: PathBuf,
        /// When to compress sample arrays
        #[arg(long, value_enum, default_value_t = Mode::Auto)]
        compression: Mode,
        /// Per-array byte size above which `auto` compresses
        #[arg(long, default_value_t = DEFAULT_COMPRESSION_THRESHOLD)]
        threshold: usize,
        /// Codec to use: passthrough | zstd | lz4 | zlib
        #[arg(short, long, default_value = "zstd")]
        codec: String,
        /// Zstd compression level (1–22, only used with --codec zstd)
        #[arg(long, default_value_t = 3)]
        zstd_level: i32,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn position_name(p: &Position) -> &'static str {
    match p {
        Position::Generic(_) => "generic",
        Position::Geographic(_) => "geographic",
        Position::Utm(_) => "utm",
        Position::Cartesian(_) => "cartesian",
        Position::Nodal(_) => "nodal",
    }
}

fn response_name(r: &Response) -> &'static str {
    match r {
        Response::Generic(_) => "generic",
        Response::PoleZero(_) => "pole-zero",
        Response::Coefficients(_) => "coefficients",
        Response::MultiStage(_) => "multi-stage",
    }
}

fn sample_type_name(tag: u8) -> &'static str {
    match Samples::zeroed(tag, 0) {
        Ok(s) => s.type_name(),
        Err(_) => "?",
    }
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_inspect(file: PathBuf, show_channels: bool) -> anyhow::Result<()> {
    let f = File::open(&file).with_context(|| format!("opening frame file {:?}", file))?;
    let summary = FrameReader::new(BufReader::new(f)).read_summary()?;
    let file_size = std::fs::metadata(&file)?.len();
    let index = &summary.index;

    let codec_display = if index.is_compressed() {
        match codec_by_id(index.compression) {
            Ok(codec) => format!("{} (id={})", codec.name(), index.compression),
            Err(_) => format!("unknown (id={})", index.compression),
        }
    } else {
        "none".to_string()
    };

    println!("=== Channel frame: {:?} ===", file);
    println!();
    println!("  channels       : {}", summary.channels);
    println!("  compression    : {}", codec_display);
    println!("  header + index : {}", human_bytes(HEADER_SIZE + index_len(summary.channels) as u64));
    println!("  file on disk   : {}", human_bytes(file_size));

    if index.is_compressed() {
        let packed: u64 = index.entries.iter().map(|e| e.sample_len).sum();
        println!("  sample payload : {} compressed", human_bytes(packed));
    }

    println!();
    println!(
        "  {:>6}  {:>8}  {:>8}  {:>6}  {:>9}  {:>12}",
        "chan", "position", "response", "type", "gap rows", "sample len"
    );
    println!("  {}", "-".repeat(60));
    for (i, e) in index.entries.iter().enumerate() {
        println!(
            "  {:>6}  {:>8}  {:>8}  {:>6}  {:>9}  {:>12}",
            i,
            e.position_tag,
            e.response_tag,
            sample_type_name(e.sample_tag),
            e.gap_rows,
            e.sample_len
        );
    }

    if show_channels {
        let set = read_file(&file, &mut Scratch::new(), &codec_by_id)?;
        println!();
        for i in 0..set.len() {
            println!(
                "  [{}] id={:?} name={:?} fs={} gain={} units={:?} loc={} resp={} notes={} meta keys={}",
                i,
                set.id[i],
                set.name[i],
                set.fs[i],
                set.gain[i],
                set.units[i],
                position_name(&set.location[i]),
                response_name(&set.response[i]),
                set.notes[i].len(),
                set.metadata[i].len(),
            );
        }
    }

    Ok(())
}

fn run_verify(file: PathBuf) -> anyhow::Result<()> {
    let t0 = Instant::now();
    let set = read_file(&file, &mut Scratch::new(), &codec_by_id)
        .with_context(|| format!("decoding {:?}", file))?;
    let elapsed = t0.elapsed();
    set.validate()?;

    let mut total_raw = 0u64;
    println!("  {:>6}  {:<24}  {:>6}  {:>10}  {:>16}", "chan", "id", "type", "samples", "xxh3");
    println!("  {}", "-".repeat(70));
    for (i, s) in set.samples.iter().enumerate() {
        total_raw += s.as_bytes().len() as u64;
        println!(
            "  {:>6}  {:<24}  {:>6}  {:>10}  {:016x}",
            i,
            set.id[i],
            s.type_name(),
            s.len(),
            xxh3_64(s.as_bytes())
        );
    }

    eprintln!();
    eprintln!("  channels    : {}", set.len());
    eprintln!("  raw samples : {}", human_bytes(total_raw));
    eprintln!("  in memory   : ~{}", human_bytes(set.approx_size() as u64));
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_recompress(
    input: PathBuf,
    output: PathBuf,
    mode: Mode,
    threshold: usize,
    codec_name: &str,
    zstd_level: i32,
) -> anyhow::Result<()> {
    let compression = match mode {
        Mode::Off => Compression::Off,
        Mode::Auto => Compression::Auto {
            threshold_bytes: threshold,
        },
        Mode::Forced => Compression::Forced,
    };
    let codec = codec_by_name(codec_name, zstd_level)?;
    let options = WriteOptions::new(compression, codec);

    let mut scratch = Scratch::new();
    let set = read_file(&input, &mut scratch, &codec_by_id)
        .with_context(|| format!("decoding {:?}", input))?;
    let before = std::fs::metadata(&input)?.len();

    let t0 = Instant::now();
    let after = write_file(&output, &set, &options, &mut scratch)
        .with_context(|| format!("writing {:?}", output))?;
    let elapsed = t0.elapsed();
    info!(?input, ?output, before, after, "frame recompressed");

    eprintln!("  options     : {:?}", options);
    eprintln!("  channels    : {}", set.len());
    eprintln!("  before      : {}", human_bytes(before));
    eprintln!("  after       : {}", human_bytes(after));
    eprintln!("  ratio       : {:.2}x", before as f64 / after.max(1) as f64);
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Inspect { file, channels } => run_inspect(file, channels),
        Commands::Verify { file } => run_verify(file),
        Commands::Recompress {
            input,
            output,
            compression,
            threshold,
            codec,
            zstd_level,
        } => run_recompress(input, output, compression, threshold, &codec, zstd_level),
    }
}
