//! RIFF/WAVE codec.
//!
//! Encoding always produces the canonical 44-byte-header, 16-bit PCM layout.
//! Decoding walks the RIFF chunk list, so `LIST`/`fact` chunks and odd chunk
//! padding are tolerated, and accepts integer PCM (8/16/24/32-bit), IEEE
//! float (32/64-bit) and `WAVE_FORMAT_EXTENSIBLE` wrapping either of those.

use std::fs;
use std::io::{self, Cursor};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use thiserror::Error;

use super::buffer::{clamp_sample, PcmBuffer, MAX_CHANNELS, MAX_SAMPLE_RATE};

pub const HEADER_LEN: usize = 44;
const FMT_CHUNK_LEN: u32 = 16;
const BITS_PER_SAMPLE: u16 = 16;

const FORMAT_PCM: u16 = 0x0001;
const FORMAT_IEEE_FLOAT: u16 = 0x0003;
const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed WAV: {0}")]
    Malformed(String),

    #[error("Unsupported WAV encoding: format tag {format_tag:#06x}, {bits_per_sample} bits")]
    Unsupported {
        format_tag: u16,
        bits_per_sample: u16,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn malformed(msg: impl Into<String>) -> DecodeError {
    DecodeError::Malformed(msg.into())
}

/// Sample encoding declared by the `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    Int,
    Float,
}

/// Parsed `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub encoding: SampleEncoding,
    pub channels: u16,
    pub sample_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl WavFormat {
    fn bytes_per_sample(&self) -> usize {
        usize::from(self.bits_per_sample / 8)
    }
}

/// Quantize one sample to signed 16-bit.
///
/// Negative values scale by 32768 and non-negative ones by 32767, so both
/// full-scale ends map exactly onto the i16 range.
pub fn quantize(sample: f32) -> i16 {
    let s = clamp_sample(sample);
    if s < 0.0 {
        (s * 32768.0).round() as i16
    } else {
        (s * 32767.0).round() as i16
    }
}

/// Inverse of [`quantize`].
pub fn dequantize(value: i16) -> f32 {
    if value < 0 {
        f32::from(value) / 32768.0
    } else {
        f32::from(value) / 32767.0
    }
}

/// Encode a buffer as canonical 16-bit PCM WAV bytes.
///
/// `PcmBuffer` bounds channels and sample rate, so the `fmt ` fields always
/// fit. RIFF size fields are 32-bit: when the sample data exceeds
/// `u32::MAX` bytes they are written as `0xFFFF_FFFF` and the samples follow
/// in full.
pub fn encode(buffer: &PcmBuffer) -> Vec<u8> {
    let channels = u16::try_from(buffer.num_channels()).unwrap_or(MAX_CHANNELS);
    let sample_rate = buffer.sample_rate();
    let block_align = channels * 2;
    let data_len = buffer.len() * usize::from(block_align);
    let (riff_size, data_size) = riff_sizes(data_len);

    let mut wav = Vec::with_capacity(HEADER_LEN + data_len);

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&riff_size.to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    wav.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    let byte_rate = sample_rate.saturating_mul(u32::from(block_align));
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());

    let planes = buffer.channels();
    for frame in 0..buffer.len() {
        for plane in planes {
            wav.extend_from_slice(&quantize(plane[frame]).to_le_bytes());
        }
    }

    wav
}

/// RIFF and `data` size fields for `data_len` bytes of samples, saturated at `u32::MAX`.
fn riff_sizes(data_len: usize) -> (u32, u32) {
    let data_len = data_len as u64;
    let riff_len = data_len + (HEADER_LEN as u64 - 8);
    if riff_len > u64::from(u32::MAX) {
        tracing::warn!(
            "WAV data of {} bytes exceeds the 32-bit RIFF size fields",
            data_len
        );
    }
    (
        u32::try_from(riff_len).unwrap_or(u32::MAX),
        u32::try_from(data_len).unwrap_or(u32::MAX),
    )
}

/// Parse only the `fmt ` chunk and the data length, without decoding samples.
pub fn probe(bytes: &[u8]) -> Result<(WavFormat, usize), DecodeError> {
    let chunks = read_chunks(bytes)?;
    let format = parse_fmt(chunks.fmt)?;
    Ok((format, chunks.data.len()))
}

/// Decode WAV bytes into a buffer. Either the whole stream decodes or nothing does.
pub fn decode(bytes: &[u8]) -> Result<PcmBuffer, DecodeError> {
    let chunks = read_chunks(bytes)?;
    let format = parse_fmt(chunks.fmt)?;
    let data = chunks.data;

    let block_align = usize::from(format.block_align);
    let remainder = data.len() % block_align;
    if remainder != 0 {
        tracing::warn!(
            "Dropping {} trailing bytes of incomplete WAV frame",
            remainder
        );
    }
    let frames = data.len() / block_align;
    let num_channels = usize::from(format.channels);
    let width = format.bytes_per_sample();

    let mut channels = vec![Vec::with_capacity(frames); num_channels];
    for frame in data.chunks_exact(block_align) {
        for (channel, raw) in channels.iter_mut().zip(frame.chunks_exact(width)) {
            channel.push(read_sample(raw, &format)?);
        }
    }

    tracing::debug!(
        "Decoded WAV: {} Hz, {} channels, {} frames, {}-bit {:?}",
        format.sample_rate,
        format.channels,
        frames,
        format.bits_per_sample,
        format.encoding
    );

    PcmBuffer::new(channels, format.sample_rate).map_err(|e| malformed(e.to_string()))
}

pub fn read_file(path: &Path) -> Result<PcmBuffer, DecodeError> {
    let bytes = fs::read(path)?;
    decode(&bytes)
}

pub fn write_file(path: &Path, buffer: &PcmBuffer) -> io::Result<()> {
    fs::write(path, encode(buffer))
}

struct Chunks<'a> {
    fmt: &'a [u8],
    data: &'a [u8],
}

fn read_chunks(bytes: &[u8]) -> Result<Chunks<'_>, DecodeError> {
    if bytes.len() < 12 {
        return Err(malformed(format!(
            "{} bytes is too short for a RIFF header",
            bytes.len()
        )));
    }
    if &bytes[0..4] != b"RIFF" {
        return Err(malformed("missing RIFF marker"));
    }
    if &bytes[8..12] != b"WAVE" {
        return Err(malformed("missing WAVE marker"));
    }

    let mut fmt = None;
    let mut data = None;
    let mut offset = 12;

    while offset + 8 <= bytes.len() {
        let id = &bytes[offset..offset + 4];
        let mut size_field = &bytes[offset + 4..offset + 8];
        let size = size_field.read_u32::<LittleEndian>()? as usize;
        let body_start = offset + 8;
        let body_end = body_start
            .checked_add(size)
            .ok_or_else(|| malformed("chunk size overflows"))?;

        match id {
            b"fmt " => {
                if body_end > bytes.len() {
                    return Err(malformed("fmt chunk extends past end of input"));
                }
                fmt = Some(&bytes[body_start..body_end]);
            }
            b"data" => {
                if body_end > bytes.len() {
                    return Err(malformed(format!(
                        "data chunk declares {} bytes but only {} remain",
                        size,
                        bytes.len() - body_start
                    )));
                }
                data = Some(&bytes[body_start..body_end]);
            }
            _ => {
                tracing::debug!(
                    "Skipping WAV chunk {:?} ({} bytes)",
                    String::from_utf8_lossy(id),
                    size
                );
            }
        }

        if fmt.is_some() && data.is_some() {
            break;
        }
        // Chunks are word aligned.
        offset = body_end.saturating_add(size & 1);
    }

    match (fmt, data) {
        (Some(fmt), Some(data)) => Ok(Chunks { fmt, data }),
        (None, _) => Err(malformed("missing fmt chunk")),
        (_, None) => Err(malformed("missing data chunk")),
    }
}

fn parse_fmt(fmt: &[u8]) -> Result<WavFormat, DecodeError> {
    if fmt.len() < 16 {
        return Err(malformed(format!("fmt chunk is {} bytes", fmt.len())));
    }
    let mut cursor = Cursor::new(fmt);
    let mut format_tag = cursor.read_u16::<LittleEndian>()?;
    let channels = cursor.read_u16::<LittleEndian>()?;
    let sample_rate = cursor.read_u32::<LittleEndian>()?;
    let _byte_rate = cursor.read_u32::<LittleEndian>()?;
    let block_align = cursor.read_u16::<LittleEndian>()?;
    let bits_per_sample = cursor.read_u16::<LittleEndian>()?;

    if format_tag == FORMAT_EXTENSIBLE {
        // cbSize(2) validBits(2) channelMask(4) then the sub-format GUID,
        // whose first two bytes carry the real format tag.
        if fmt.len() < 26 {
            return Err(malformed("extensible fmt chunk is truncated"));
        }
        cursor.set_position(24);
        format_tag = cursor.read_u16::<LittleEndian>()?;
    }

    if channels == 0 {
        return Err(malformed("fmt declares zero channels"));
    }
    if sample_rate == 0 {
        return Err(malformed("fmt declares zero sample rate"));
    }
    if channels > MAX_CHANNELS {
        return Err(malformed(format!(
            "fmt declares {} channels, limit is {}",
            channels, MAX_CHANNELS
        )));
    }
    if sample_rate > MAX_SAMPLE_RATE {
        return Err(malformed(format!(
            "fmt declares {} Hz, limit is {}",
            sample_rate, MAX_SAMPLE_RATE
        )));
    }

    let encoding = match (format_tag, bits_per_sample) {
        (FORMAT_PCM, 8 | 16 | 24 | 32) => SampleEncoding::Int,
        (FORMAT_IEEE_FLOAT, 32 | 64) => SampleEncoding::Float,
        _ => {
            return Err(DecodeError::Unsupported {
                format_tag,
                bits_per_sample,
            })
        }
    };

    let expected_align = u32::from(channels) * u32::from(bits_per_sample / 8);
    if u32::from(block_align) != expected_align {
        return Err(malformed(format!(
            "block align {} does not match {} channels of {} bits",
            block_align, channels, bits_per_sample
        )));
    }

    Ok(WavFormat {
        encoding,
        channels,
        sample_rate,
        block_align,
        bits_per_sample,
    })
}

fn read_sample(raw: &[u8], format: &WavFormat) -> Result<f32, DecodeError> {
    let mut raw = raw;
    let value = match (format.encoding, format.bits_per_sample) {
        // 8-bit WAV is unsigned with a 128 midpoint.
        (SampleEncoding::Int, 8) => (f32::from(raw.read_u8()?) - 128.0) / 128.0,
        (SampleEncoding::Int, 16) => dequantize(raw.read_i16::<LittleEndian>()?),
        (SampleEncoding::Int, 24) => raw.read_i24::<LittleEndian>()? as f32 / 8_388_608.0,
        (SampleEncoding::Int, 32) => raw.read_i32::<LittleEndian>()? as f32 / 2_147_483_648.0,
        (SampleEncoding::Float, 32) => raw.read_f32::<LittleEndian>()?,
        (SampleEncoding::Float, 64) => raw.read_f64::<LittleEndian>()? as f32,
        (_, bits) => {
            return Err(DecodeError::Unsupported {
                format_tag: match format.encoding {
                    SampleEncoding::Int => FORMAT_PCM,
                    SampleEncoding::Float => FORMAT_IEEE_FLOAT,
                },
                bits_per_sample: bits,
            })
        }
    };
    Ok(value)
}
