//! Cross-checks the WAV codec against `hound`, an independent implementation.

use std::f32::consts::PI;
use std::path::Path;

use tempfile::TempDir;
use tts_workbench_lib::audio::{wav, PcmBuffer};

// ──────────────────────── helpers ────────────────────────

fn sine(sample_rate: u32, frequency: f32, len: usize, amplitude: f32) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * PI * frequency * t).sin()
        })
        .collect()
}

fn write_with_hound<S: hound::Sample + Copy>(path: &Path, spec: hound::WavSpec, samples: &[S]) {
    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV writer");
    for &s in samples {
        writer.write_sample(s).expect("Failed to write sample");
    }
    writer.finalize().expect("Failed to finalize WAV");
}

// ──────────────────────── tests ────────────────────────

#[test]
fn test_hound_reads_our_encoding() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ours.wav");

    let left = sine(8000, 440.0, 800, 0.8);
    let right = sine(8000, 220.0, 800, -0.5);
    let buffer = PcmBuffer::new(vec![left.clone(), right.clone()], 8000).unwrap();
    wav::write_file(&path, &buffer).unwrap();

    let mut reader = hound::WavReader::open(&path).expect("hound rejected our WAV");
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 8000);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);

    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples.len(), 1600);
    for (frame, pair) in samples.chunks_exact(2).enumerate() {
        assert_eq!(pair[0], wav::quantize(left[frame]));
        assert_eq!(pair[1], wav::quantize(right[frame]));
    }
}

#[test]
fn test_we_read_hound_16_bit() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hound16.wav");
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 22050,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let raw: Vec<i16> = vec![0, -32768, 32767, 1234, -1, 16384];
    write_with_hound(&path, spec, &raw);

    let buffer = wav::read_file(&path).unwrap();
    assert_eq!(buffer.num_channels(), 2);
    assert_eq!(buffer.sample_rate(), 22050);
    assert_eq!(buffer.len(), 3);
    assert_eq!(buffer.channel(0), &[0.0, 1.0, wav::dequantize(-1)]);
    assert_eq!(buffer.channel(1)[0], -1.0);
}

#[test]
fn test_we_read_hound_float_and_24_bit() {
    let dir = TempDir::new().unwrap();
    let samples = sine(16000, 1000.0, 160, 0.9);

    let float_path = dir.path().join("float.wav");
    let float_spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    write_with_hound(&float_path, float_spec, &samples);
    let decoded = wav::read_file(&float_path).unwrap();
    assert_eq!(decoded.channel(0), samples.as_slice());

    let int_path = dir.path().join("int24.wav");
    let int_spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 24,
        sample_format: hound::SampleFormat::Int,
    };
    let ints: Vec<i32> = samples.iter().map(|s| (s * 8_388_607.0) as i32).collect();
    write_with_hound(&int_path, int_spec, &ints);
    let decoded = wav::read_file(&int_path).unwrap();
    assert_eq!(decoded.len(), samples.len());
    for (got, want) in decoded.channel(0).iter().zip(&samples) {
        assert!((got - want).abs() < 1e-5, "{} vs {}", got, want);
    }
}

#[test]
fn test_round_trip_error_is_within_one_step() {
    let samples: Vec<f32> = (0..=2000).map(|i| i as f32 / 1000.0 - 1.0).collect();
    let buffer = PcmBuffer::new(vec![samples.clone()], 44100).unwrap();
    let decoded = wav::decode(&wav::encode(&buffer)).unwrap();

    for (got, want) in decoded.channel(0).iter().zip(&samples) {
        assert!((got - want).abs() <= 1.0 / 32767.0, "{} vs {}", got, want);
    }
}

#[test]
fn test_single_silent_sample_layout() {
    let bytes = wav::encode(&PcmBuffer::silent(1, 1, 8000));
    assert_eq!(bytes.len(), 46);
    assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 38);
    assert_eq!(u32::from_le_bytes(bytes[40..44].try_into().unwrap()), 2);
    assert_eq!(&bytes[44..], &[0, 0]);

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("one.wav");
    std::fs::write(&path, &bytes).unwrap();
    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.len(), 1);
}

#[test]
fn test_truncated_file_is_malformed() {
    let bytes = wav::encode(&PcmBuffer::silent(1, 100, 8000));
    let result = wav::decode(&bytes[..100]);
    assert!(matches!(result, Err(wav::DecodeError::Malformed(_))));
}
