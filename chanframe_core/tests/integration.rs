/// Integration tests: full encode/decode of channel sets through in-memory
/// cursors and real files, with and without compression.
///
/// Covers:
///  1. Field-by-field round trips for N = 0, 1, many with every variant kind
///  2. Forced compression with every bundled codec reproduces sample bytes
///  3. Encode refuses sets whose field vectors are out of step
///  4. Corrupted tags, codec ids, and truncated input fail the whole decode
use std::io::{Cursor, Seek, SeekFrom};
use std::sync::Arc;

use chanframe_codecs::{codec_by_id, Lz4Codec, PassThroughCodec, ZlibCodec, ZstdCodec};
use chanframe_core::format::{index_len, HEADER_SIZE};
use chanframe_core::metadata::Metadata;
use chanframe_core::position::{GenericLoc, GeoLoc, NodalLoc, UtmLoc, XyLoc};
use chanframe_core::response::{CoeffResp, GenericResp, MultiStageResp, PzResp, Stage, StageFilter};
use chanframe_core::{
    decode_from_slice, encode_to_vec, no_codecs, read_file, write_file, write_to, Channel,
    ChannelSet, Codec, Compression, Error, FrameReader, FrameWriter, Gap, MetaValue, Position,
    Response, Samples, Scratch, WriteOptions, COMPRESSION_NONE,
};

// ── helpers ───────────────────────────────────────────────────────────────

/// Generate `len` deterministic f64 values using a simple LCG.
fn pseudo_random_f64(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = seed;
    (0..len)
        .map(|_| {
            rng = rng
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            f64::from_bits((rng >> 12) | 0x3FF0_0000_0000_0000)
        })
        .collect()
}

/// A slowly varying, highly compressible waveform.
fn sine_f32(len: usize) -> Vec<f32> {
    (0..len).map(|i| ((i as f32) * 0.01).sin() * 1000.0).collect()
}

fn forced(codec: Arc<dyn Codec>) -> WriteOptions {
    WriteOptions::new(Compression::Forced, codec)
}

fn round_trip(set: &ChannelSet, opts: &WriteOptions) -> ChannelSet {
    let mut scratch = Scratch::new();
    let bytes = encode_to_vec(set, opts, &mut scratch).unwrap();
    decode_from_slice(&bytes, &mut scratch, &codec_by_id).unwrap()
}

/// Five channels covering every position, response, and sample variant.
fn mixed_set() -> ChannelSet {
    let mut set = ChannelSet::new();

    let mut meta = Metadata::new();
    meta.insert("network".into(), "IU".into());
    meta.insert("npts".into(), MetaValue::Int(3000));
    meta.insert("calib".into(), MetaValue::FloatArray(vec![1.0, 0.98]));
    let mut nested = Metadata::new();
    nested.insert("serial".into(), MetaValue::Str("T3-1142".into()));
    meta.insert("sensor".into(), MetaValue::Map(nested));

    set.push(Channel {
        id: "IU.ANMO.00.BHZ".into(),
        name: "Albuquerque".into(),
        location: Position::Geographic(GeoLoc {
            datum: "WGS84".into(),
            lat: 34.9459,
            lon: -106.4572,
            el: 1850.0,
            dep: 100.0,
            az: 0.0,
            inc: 0.0,
        }),
        fs: 40.0,
        gain: 3.3e9,
        response: Response::PoleZero(PzResp {
            a0: 86083.0,
            f0: 1.0,
            zeros: vec![[0.0, 0.0], [0.0, 0.0]],
            poles: vec![[-0.0123, 0.0123], [-0.0123, -0.0123], [-39.18, 49.12]],
        }),
        units: "m/s".into(),
        source: "fdsnws".into(),
        metadata: meta,
        notes: vec![
            "2024-03-01T00:00:00 +fetched".into(),
            "2024-03-01T00:00:02 detrended".into(),
        ],
        gaps: vec![Gap::new(1, 1_700_000_000_000_000), Gap::new(1200, 25_000)],
        samples: Samples::F32(sine_f32(3000)),
    });

    set.push(Channel {
        id: "XX.UTM01..HHZ".into(),
        location: Position::Utm(UtmLoc {
            datum: "NAD83".into(),
            zone: 13,
            hemisphere: b'N',
            easting: 353_424.2,
            northing: 3_868_111.9,
            ..UtmLoc::default()
        }),
        fs: 100.0,
        response: Response::MultiStage(MultiStageResp {
            stages: vec![
                Stage {
                    filter: StageFilter::PoleZero(PzResp::default()),
                    gain: 1500.0,
                    input_units: "m/s".into(),
                    output_units: "V".into(),
                    ..Stage::default()
                },
                Stage {
                    filter: StageFilter::Coefficients(CoeffResp {
                        b: vec![0.1, 0.8, 0.1],
                        a: vec![1.0],
                    }),
                    fs: 400.0,
                    factor: 4,
                    ..Stage::default()
                },
            ],
        }),
        samples: Samples::F64(pseudo_random_f64(257, 7)),
        ..Channel::default()
    });

    set.push(Channel {
        id: "LAB.XY".into(),
        location: Position::Cartesian(XyLoc {
            x: 1.0,
            y: -2.0,
            z: 0.5,
            ..XyLoc::default()
        }),
        response: Response::Coefficients(CoeffResp {
            b: vec![1.0, -1.0],
            a: vec![1.0, -0.99],
        }),
        samples: Samples::I32((0..500).map(|i| i * 3 - 700).collect()),
        gaps: vec![Gap::new(10, 500)],
        ..Channel::default()
    });

    set.push(Channel {
        id: "DAS.0042".into(),
        location: Position::Nodal(NodalLoc {
            x: 420.0,
            y: 0.0,
            z: 0.0,
        }),
        response: Response::Generic(GenericResp {
            description: "tabulated".into(),
            values: vec![[1.0, 0.0], [0.5, -0.5]],
        }),
        fs: 0.0,
        samples: Samples::I64(vec![i64::MIN, -1, 0, 1, i64::MAX]),
        ..Channel::default()
    });

    set.push(Channel {
        id: "GEN".into(),
        location: Position::Generic(GenericLoc {
            datum: "local".into(),
            coords: vec![1.0, 2.0, 3.0, 4.0],
        }),
        ..Channel::default()
    });

    set
}

fn assert_samples_identical(a: &ChannelSet, b: &ChannelSet) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.samples.iter().zip(&b.samples) {
        assert_eq!(x.tag(), y.tag());
        assert_eq!(x.as_bytes(), y.as_bytes(), "sample bytes should be identical");
    }
}

// ── round trips ───────────────────────────────────────────────────────────

#[test]
fn test_roundtrip_mixed_channels() {
    let set = mixed_set();
    let back = round_trip(&set, &WriteOptions::uncompressed());
    assert_eq!(back, set, "every field should survive the round trip");
}

#[test]
fn test_roundtrip_single_channel() {
    let set: ChannelSet = std::iter::once(Channel {
        id: "only".into(),
        samples: Samples::F32(vec![1.5, -2.5]),
        ..Channel::default()
    })
    .collect();
    assert_eq!(round_trip(&set, &WriteOptions::uncompressed()), set);
}

#[test]
fn test_empty_container() {
    let set = ChannelSet::new();
    let mut scratch = Scratch::new();
    let bytes = encode_to_vec(&set, &WriteOptions::uncompressed(), &mut scratch).unwrap();

    // header + index (flag byte only) + four empty string vectors
    let empty_string_vectors = 4 * 8;
    assert_eq!(bytes.len() as u64, HEADER_SIZE + index_len(0) as u64 + empty_string_vectors);

    let back = decode_from_slice(&bytes, &mut scratch, &no_codecs).unwrap();
    assert!(back.is_empty());
    back.validate().unwrap();
}

/// Two default channels, 30 × f32 and 5 × f64, compression off.
#[test]
fn test_two_channel_scenario() {
    let mut set = ChannelSet::with_len(2);
    let a: Vec<f32> = (0..30).map(|i| i as f32 * 0.5).collect();
    let b: Vec<f64> = vec![1.0, -1.0, 1e-300, 1e300, 0.0];
    set.samples[0] = Samples::F32(a.clone());
    set.samples[1] = Samples::F64(b.clone());

    let back = round_trip(&set, &WriteOptions::uncompressed());
    assert_eq!(back.samples[0], Samples::F32(a));
    assert_eq!(back.samples[1], Samples::F64(b));
    assert_eq!(back.samples[0].len(), 30);
    assert_eq!(back.samples[1].len(), 5);
    assert_eq!(back.gain, vec![1.0, 1.0]);
    assert_eq!(back.location, vec![Position::default(); 2]);
    assert_eq!(back.response, vec![Response::default(); 2]);
}

#[test]
fn test_two_frames_back_to_back() {
    let first = mixed_set();
    let mut second = ChannelSet::with_len(1);
    second.samples[0] = Samples::F64(vec![4.0; 16]);

    let mut scratch = Scratch::new();
    let mut writer = FrameWriter::new(Cursor::new(Vec::new()), forced(Arc::new(ZstdCodec::default())));
    let len1 = writer.write(&first, &mut scratch).unwrap();
    let len2 = writer.write(&second, &mut scratch).unwrap();
    let bytes = writer.into_inner().into_inner();
    assert_eq!(bytes.len() as u64, len1 + len2);

    let mut reader = FrameReader::new(Cursor::new(&bytes));
    assert_eq!(reader.read(&mut scratch, &codec_by_id).unwrap(), first);
    assert_eq!(reader.read(&mut scratch, &codec_by_id).unwrap(), second);
}

#[test]
fn test_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.cfr");
    let set = mixed_set();

    let mut scratch = Scratch::new();
    let written = write_file(&path, &set, &forced(Arc::new(Lz4Codec)), &mut scratch).unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), written);

    let back = read_file(&path, &mut scratch, &codec_by_id).unwrap();
    assert_eq!(back, set);
}

#[test]
fn test_write_to_unseekable_sink() {
    let set = mixed_set();
    let opts = WriteOptions::uncompressed();
    let mut scratch = Scratch::new();

    let mut sink: Vec<u8> = Vec::new();
    let n = write_to(&mut sink, &set, &opts, &mut scratch).unwrap();
    assert_eq!(n as usize, sink.len());
    assert_eq!(sink, encode_to_vec(&set, &opts, &mut scratch).unwrap());
}

// ── compression ───────────────────────────────────────────────────────────

#[test]
fn test_forced_compression_every_codec() {
    let set = mixed_set();
    let codecs: Vec<Arc<dyn Codec>> = vec![
        Arc::new(PassThroughCodec),
        Arc::new(ZstdCodec::default()),
        Arc::new(Lz4Codec),
        Arc::new(ZlibCodec::default()),
    ];
    for codec in codecs {
        let mut scratch = Scratch::new();
        let bytes = encode_to_vec(&set, &forced(codec.clone()), &mut scratch).unwrap();

        let summary = FrameReader::new(Cursor::new(&bytes)).read_summary().unwrap();
        assert_eq!(summary.index.compression, codec.id(), "{}", codec.name());

        let back = decode_from_slice(&bytes, &mut scratch, &codec_by_id).unwrap();
        assert_samples_identical(&set, &back);
        assert_eq!(back, set, "{} round trip", codec.name());
    }
}

#[test]
fn test_forced_compression_empty_arrays_every_codec() {
    let mut set = ChannelSet::with_len(3);
    set.samples[1] = Samples::I64(Vec::new());
    set.samples[2] = Samples::F64(vec![0.5]);
    let codecs: Vec<Arc<dyn Codec>> = vec![
        Arc::new(PassThroughCodec),
        Arc::new(ZstdCodec::default()),
        Arc::new(Lz4Codec),
        Arc::new(ZlibCodec::default()),
    ];
    for codec in codecs {
        let mut scratch = Scratch::new();
        let bytes = encode_to_vec(&set, &forced(codec.clone()), &mut scratch).unwrap();

        let summary = FrameReader::new(Cursor::new(&bytes)).read_summary().unwrap();
        assert_eq!(summary.index.entries[0].sample_len, 0, "{}", codec.name());
        assert_eq!(summary.index.entries[1].sample_len, 0, "{}", codec.name());

        let back = decode_from_slice(&bytes, &mut scratch, &codec_by_id).unwrap();
        assert_eq!(back, set, "{} round trip", codec.name());
    }
}

#[test]
fn test_compressible_samples_shrink() {
    let mut set = ChannelSet::with_len(1);
    set.samples[0] = Samples::F32(sine_f32(100_000));

    let mut scratch = Scratch::new();
    let raw = encode_to_vec(&set, &WriteOptions::uncompressed(), &mut scratch).unwrap();
    let packed = encode_to_vec(&set, &forced(Arc::new(ZstdCodec::default())), &mut scratch).unwrap();
    eprintln!("zstd frame: {} -> {} bytes", raw.len(), packed.len());
    assert!(packed.len() < raw.len());
}

#[test]
fn test_auto_threshold_sets_flag() {
    let opts = WriteOptions::new(
        Compression::Auto { threshold_bytes: 1024 },
        Arc::new(ZstdCodec::default()),
    );
    let mut scratch = Scratch::new();

    let mut small = ChannelSet::with_len(2);
    small.samples[0] = Samples::F32(vec![0.0; 256]); // exactly 1024 bytes
    let bytes = encode_to_vec(&small, &opts, &mut scratch).unwrap();
    let summary = FrameReader::new(Cursor::new(&bytes)).read_summary().unwrap();
    assert_eq!(summary.index.compression, COMPRESSION_NONE);
    assert_eq!(summary.index.entries[0].sample_len, 256, "raw length is an element count");

    let mut large = small.clone();
    large.samples[1] = Samples::F64(vec![0.0; 129]);
    let bytes = encode_to_vec(&large, &opts, &mut scratch).unwrap();
    let summary = FrameReader::new(Cursor::new(&bytes)).read_summary().unwrap();
    assert_eq!(summary.index.compression, ZstdCodec::default().id());
    assert_eq!(decode_from_slice(&bytes, &mut scratch, &codec_by_id).unwrap(), large);
}

/// lz4 needs more room than the raw size for random data, so the writer has
/// to grow its scratch buffer at least once.
#[test]
fn test_incompressible_samples_grow_and_retry() {
    let mut set = ChannelSet::with_len(1);
    set.samples[0] = Samples::F64(pseudo_random_f64(4096, 0xDEAD_BEEF));

    let mut scratch = Scratch::new();
    let bytes = encode_to_vec(&set, &forced(Arc::new(Lz4Codec)), &mut scratch).unwrap();
    assert!(scratch.capacity() > set.samples[0].as_bytes().len());

    let back = decode_from_slice(&bytes, &mut scratch, &codec_by_id).unwrap();
    assert_samples_identical(&set, &back);
}

struct NeverFits;

impl Codec for NeverFits {
    fn id(&self) -> u8 {
        200
    }

    fn name(&self) -> &'static str {
        "never-fits"
    }

    fn compress_into(&self, _raw: &[u8], _dst: &mut [u8]) -> anyhow::Result<usize> {
        Ok(0)
    }

    fn decompress_into(&self, _compressed: &[u8], _dst: &mut [u8]) -> anyhow::Result<usize> {
        anyhow::bail!("unreachable in this test")
    }
}

#[test]
fn test_compression_growth_is_bounded() {
    let mut set = ChannelSet::with_len(1);
    set.samples[0] = Samples::F32(vec![1.0; 8]);

    let err = encode_to_vec(&set, &forced(Arc::new(NeverFits)), &mut Scratch::new()).unwrap_err();
    assert!(
        matches!(err, Error::CompressionExhausted { attempts: 8, .. }),
        "got {err:?}"
    );
}

#[test]
fn test_forced_without_codec_is_rejected() {
    let opts = WriteOptions {
        compression: Compression::Forced,
        codec: None,
    };
    let err = encode_to_vec(&ChannelSet::with_len(1), &opts, &mut Scratch::new()).unwrap_err();
    assert!(matches!(err, Error::InvalidOptions(_)));
}

// ── structural and format errors ──────────────────────────────────────────

#[test]
fn test_length_mismatch_writes_nothing() {
    let mut set = mixed_set();
    set.units.pop();

    let mut out = Cursor::new(Vec::new());
    let mut writer = FrameWriter::new(&mut out, WriteOptions::uncompressed());
    let err = writer.write(&set, &mut Scratch::new()).unwrap_err();
    assert!(matches!(
        err,
        Error::StructuralMismatch { field: "units", expected: 5, actual: 4 }
    ));
    assert_eq!(out.seek(SeekFrom::End(0)).unwrap(), 0, "no bytes should be written");
}

#[test]
fn test_unknown_position_tag_fails() {
    let mut bytes = encode_to_vec(&mixed_set(), &WriteOptions::uncompressed(), &mut Scratch::new()).unwrap();
    // First channel's position tag is the first index byte.
    bytes[HEADER_SIZE as usize] = 0xFF;

    let err = decode_from_slice(&bytes, &mut Scratch::new(), &codec_by_id).unwrap_err();
    assert!(matches!(err, Error::UnknownVariantTag { family: "position", tag: 0xFF }));
}

#[test]
fn test_unknown_sample_tag_fails() {
    let mut bytes = encode_to_vec(&mixed_set(), &WriteOptions::uncompressed(), &mut Scratch::new()).unwrap();
    // Third channel, third tag byte.
    bytes[HEADER_SIZE as usize + 3 * 2 + 2] = 9;

    let err = decode_from_slice(&bytes, &mut Scratch::new(), &codec_by_id).unwrap_err();
    assert!(matches!(err, Error::UnknownVariantTag { family: "sample type", tag: 9 }));
}

#[test]
fn test_unknown_codec_id_fails() {
    let set = mixed_set();
    let mut bytes = encode_to_vec(&set, &forced(Arc::new(ZstdCodec::default())), &mut Scratch::new()).unwrap();
    bytes[HEADER_SIZE as usize + 3 * set.len()] = 99;

    let err = decode_from_slice(&bytes, &mut Scratch::new(), &codec_by_id).unwrap_err();
    assert!(matches!(err, Error::UnknownCodec(99)));
}

#[test]
fn test_compressed_frame_needs_a_resolver() {
    let set = mixed_set();
    let bytes = encode_to_vec(&set, &forced(Arc::new(Lz4Codec)), &mut Scratch::new()).unwrap();
    let err = decode_from_slice(&bytes, &mut Scratch::new(), &no_codecs).unwrap_err();
    assert!(matches!(err, Error::UnknownCodec(_)));
}

#[test]
fn test_truncated_stream_fails() {
    let set = mixed_set();
    for opts in [WriteOptions::uncompressed(), forced(Arc::new(ZstdCodec::default()))] {
        let bytes = encode_to_vec(&set, &opts, &mut Scratch::new()).unwrap();
        for cut in [1, 3, bytes.len() / 2, bytes.len() - 4] {
            let err = decode_from_slice(&bytes[..cut], &mut Scratch::new(), &codec_by_id).unwrap_err();
            assert!(matches!(err, Error::Truncated), "cut at {cut}: {err:?}");
        }
    }
}

// ── corrupt length table ──────────────────────────────────────────────────

/// One channel with gaps and samples, so every length-table entry is in use.
fn one_channel() -> ChannelSet {
    let mut ch = Channel::new("XX.ONE..HHZ");
    ch.fs = 100.0;
    ch.gaps = vec![Gap::new(10, 2_000_000)];
    ch.samples = Samples::F64(pseudo_random_f64(100, 3));
    std::iter::once(ch).collect()
}

const GAP_ROWS_AT: usize = HEADER_SIZE as usize + index_len(1) - 16;
const SAMPLE_LEN_AT: usize = HEADER_SIZE as usize + index_len(1) - 8;

fn read_i64_at(bytes: &[u8], at: usize) -> i64 {
    i64::from_ne_bytes(bytes[at..at + 8].try_into().unwrap())
}

fn patch_i64(bytes: &mut [u8], at: usize, v: i64) {
    bytes[at..at + 8].copy_from_slice(&v.to_ne_bytes());
}

fn assert_fails_cleanly(bytes: &[u8], what: &str) {
    let err = decode_from_slice(bytes, &mut Scratch::new(), &codec_by_id).unwrap_err();
    assert!(
        matches!(err, Error::Truncated | Error::InvalidStructure(_)),
        "{what}: {err:?}"
    );
}

#[test]
fn test_oversized_gap_rows_fail() {
    for opts in [WriteOptions::uncompressed(), forced(Arc::new(ZstdCodec::default()))] {
        let mut bytes = encode_to_vec(&one_channel(), &opts, &mut Scratch::new()).unwrap();
        assert_eq!(read_i64_at(&bytes, GAP_ROWS_AT), 1);
        patch_i64(&mut bytes, GAP_ROWS_AT, 1 << 33);
        assert_fails_cleanly(&bytes, "gap rows 2^33");
    }
}

#[test]
fn test_oversized_sample_len_fails() {
    for opts in [WriteOptions::uncompressed(), forced(Arc::new(ZstdCodec::default()))] {
        let mut bytes = encode_to_vec(&one_channel(), &opts, &mut Scratch::new()).unwrap();
        patch_i64(&mut bytes, SAMPLE_LEN_AT, 1 << 33);
        assert_fails_cleanly(&bytes, "sample length 2^33");
    }
}

#[test]
fn test_oversized_compressed_count_fails() {
    let mut bytes =
        encode_to_vec(&one_channel(), &forced(Arc::new(ZstdCodec::default())), &mut Scratch::new()).unwrap();
    // Samples are the last group: [count: i64][compressed bytes] at the very end.
    let packed = read_i64_at(&bytes, SAMPLE_LEN_AT) as usize;
    let count_at = bytes.len() - packed - 8;
    assert_eq!(read_i64_at(&bytes, count_at), 100);

    patch_i64(&mut bytes, count_at, 1 << 33);
    assert_fails_cleanly(&bytes, "element count 2^33");

    patch_i64(&mut bytes, count_at, 101);
    assert_fails_cleanly(&bytes, "element count off by one");
}
