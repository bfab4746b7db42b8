//! Channel-frame demo
//!
//! Synthesizes a small seismic-style array (a few dozen channels of mixed
//! sample types, locations, responses and gap tables), writes it once per
//! codec and compression mode, and reads every file back to confirm the
//! samples survive bit for bit.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{ensure, Result};
use tracing_subscriber::EnvFilter;
use xxhash_rust::xxh3::xxh3_64;

use chanframe_codecs::{codec_by_id, Lz4Codec, PassThroughCodec, ZlibCodec, ZstdCodec};
use chanframe_core::position::{GeoLoc, UtmLoc};
use chanframe_core::response::PzResp;
use chanframe_core::{
    read_file, write_file, Channel, ChannelSet, Codec, Compression, Gap, MetaValue, Position,
    Response, Samples, Scratch, WriteOptions,
};

// ── constants ──────────────────────────────────────────────────────────────

const STATIONS: usize = 12;
const SAMPLE_RATE_HZ: f64 = 100.0;
const SECONDS: usize = 600;
const COMPONENTS: &[&str] = &["HHZ", "HHN", "HHE"];

// ── data generator ─────────────────────────────────────────────────────────

/// xorshift64*, deterministic per seed.
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 >> 12;
        self.0 ^= self.0 << 25;
        self.0 ^= self.0 >> 27;
        self.0.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Roughly uniform in [-1, 1).
    fn unit(&mut self) -> f64 {
        (self.next() >> 11) as f64 / (1u64 << 52) as f64 - 1.0
    }
}

/// Microseism background plus a decaying "event" and a little noise.
fn waveform(station: usize, component: usize, n: usize) -> Vec<f64> {
    let mut rng = Rng(0x9E37_79B9_7F4A_7C15 ^ ((station as u64) << 8 | component as u64));
    let onset = n / 3 + station * 250;
    (0..n)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE_HZ;
            let background = 40.0 * (2.0 * std::f64::consts::PI * 0.2 * t).sin();
            let event = if i >= onset {
                let dt = (i - onset) as f64 / SAMPLE_RATE_HZ;
                2500.0 * (-dt / 8.0).exp() * (2.0 * std::f64::consts::PI * 3.0 * dt).sin()
            } else {
                0.0
            };
            background + event + 5.0 * rng.unit()
        })
        .collect()
}

/// Counts for vertical components, velocities for horizontals; every fourth
/// station reports in single precision to mix the sample types.
fn samples_for(station: usize, component: usize, wave: Vec<f64>) -> Samples {
    match (component, station % 4) {
        (0, 3) => Samples::from(wave.iter().map(|&v| v as i64).collect::<Vec<i64>>()),
        (0, _) => Samples::from(wave.iter().map(|&v| v as i32).collect::<Vec<i32>>()),
        (_, 3) => Samples::from(wave.iter().map(|&v| (v * 1e-9) as f32).collect::<Vec<f32>>()),
        _ => Samples::from(wave.iter().map(|&v| v * 1e-9).collect::<Vec<f64>>()),
    }
}

fn location_for(station: usize) -> Position {
    let lat = 46.0 + station as f64 * 0.05;
    let lon = -122.0 - station as f64 * 0.03;
    if station % 2 == 0 {
        Position::Geographic(GeoLoc {
            datum: "WGS84".into(),
            lat,
            lon,
            el: 1200.0 + station as f64 * 15.0,
            ..GeoLoc::default()
        })
    } else {
        Position::Utm(UtmLoc {
            datum: "WGS84".into(),
            zone: 10,
            easting: 560_000.0 + station as f64 * 2_300.0,
            northing: 5_095_000.0 + station as f64 * 5_500.0,
            el: 1200.0 + station as f64 * 15.0,
            ..UtmLoc::default()
        })
    }
}

fn build_array() -> ChannelSet {
    let n = (SAMPLE_RATE_HZ as usize) * SECONDS;
    let mut channels = Vec::with_capacity(STATIONS * COMPONENTS.len());
    for station in 0..STATIONS {
        for (component, code) in COMPONENTS.iter().enumerate() {
            let mut ch = Channel::new(format!("XX.ST{:02}..{}", station, code));
            ch.name = format!("Station {} {}", station, code);
            ch.location = location_for(station);
            ch.fs = SAMPLE_RATE_HZ;
            ch.gain = 1.0 / (6.29e8 + station as f64 * 1e6);
            ch.response = Response::PoleZero(PzResp {
                a0: 1.0,
                f0: 1.0,
                zeros: vec![[0.0, 0.0]; 2],
                poles: vec![[-0.037, 0.037], [-0.037, -0.037]],
            });
            ch.units = if component == 0 { "counts" } else { "m/s" }.into();
            ch.source = "synthetic".into();
            ch.metadata.insert("network".into(), "XX".into());
            ch.metadata.insert("station".into(), MetaValue::Int(station as i64));
            ch.metadata.insert(
                "sensor".into(),
                MetaValue::StrArray(vec!["broadband".into(), code.to_string()]),
            );
            if station % 5 == 2 {
                ch.gaps = vec![Gap::new((n / 2) as i64, 1_500_000)];
                ch.notes.push("telemetry dropout mid-record".into());
            }
            ch.samples = samples_for(station, component, waveform(station, component, n));
            channels.push(ch);
        }
    }
    channels.into_iter().collect()
}

// ── helpers ────────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", v, UNITS[unit])
}

fn fmt_duration(d: Duration) -> String {
    if d.as_secs() > 0 {
        format!("{:.2} s", d.as_secs_f64())
    } else {
        format!("{:.1} ms", d.as_secs_f64() * 1000.0)
    }
}

fn digest(set: &ChannelSet) -> u64 {
    set.samples
        .iter()
        .fold(0u64, |acc, s| acc.rotate_left(7) ^ xxh3_64(s.as_bytes()))
}

/// Write `set` with `options`, read it back, and check the samples.
fn write_and_verify(
    path: &Path,
    set: &ChannelSet,
    options: &WriteOptions,
    scratch: &mut Scratch,
    expected: u64,
) -> Result<(u64, Duration, Duration)> {
    let t0 = Instant::now();
    let size = write_file(path, set, options, scratch)?;
    let write_time = t0.elapsed();

    let t1 = Instant::now();
    let back = read_file(path, scratch, &codec_by_id)?;
    let read_time = t1.elapsed();

    ensure!(back.len() == set.len(), "channel count changed on round trip");
    ensure!(digest(&back) == expected, "sample digest mismatch for {:?}", options);
    ensure!(back == *set, "decoded set differs from the original");
    Ok((size, write_time, read_time))
}

// ── main ───────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let dir = std::env::temp_dir().join("chanframe-demo");
    std::fs::create_dir_all(&dir)?;

    eprintln!("Generating {} channels × {} s @ {} Hz ...", STATIONS * COMPONENTS.len(), SECONDS, SAMPLE_RATE_HZ);
    let set = build_array();
    let raw: u64 = set.samples.iter().map(|s| s.as_bytes().len() as u64).sum();
    let expected = digest(&set);
    eprintln!("  raw samples : {}", human_bytes(raw));
    eprintln!("  in memory   : ~{}", human_bytes(set.approx_size() as u64));
    eprintln!();

    let codecs: Vec<Arc<dyn Codec>> = vec![
        Arc::new(PassThroughCodec),
        Arc::new(Lz4Codec),
        Arc::new(ZlibCodec::default()),
        Arc::new(ZstdCodec::new(3)),
        Arc::new(ZstdCodec::new(19)),
    ];

    let mut runs: Vec<(String, WriteOptions)> = vec![("uncompressed".into(), WriteOptions::uncompressed())];
    for codec in &codecs {
        runs.push((format!("forced {}", codec.name()), WriteOptions::new(Compression::Forced, codec.clone())));
    }
    // Arrays are well under the default threshold, so `auto` stays raw.
    runs.push((
        "auto zstd (default threshold)".into(),
        WriteOptions::new(Compression::auto(), Arc::new(ZstdCodec::default())),
    ));
    runs.push((
        "auto zstd (64 KB threshold)".into(),
        WriteOptions::new(Compression::Auto { threshold_bytes: 64 << 10 }, Arc::new(ZstdCodec::default())),
    ));

    let mut scratch = Scratch::new();
    eprintln!(
        "  {:<32}  {:>11}  {:>7}  {:>10}  {:>10}",
        "mode", "size", "ratio", "write", "read"
    );
    eprintln!("  {}", "-".repeat(78));
    for (i, (label, options)) in runs.iter().enumerate() {
        let path = dir.join(format!("array-{}.cf", i));
        let (size, write_time, read_time) = write_and_verify(&path, &set, options, &mut scratch, expected)?;
        eprintln!(
            "  {:<32}  {:>11}  {:>6.2}x  {:>10}  {:>10}",
            label,
            human_bytes(size),
            raw as f64 / size as f64,
            fmt_duration(write_time),
            fmt_duration(read_time)
        );
        std::fs::remove_file(&path)?;
    }

    eprintln!();
    eprintln!("  scratch buffer settled at {}", human_bytes(scratch.capacity() as u64));
    eprintln!("  all {} variants round-tripped bit for bit", runs.len());
    Ok(())
}
