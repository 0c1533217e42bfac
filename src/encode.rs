//! RIFF/WAVE writer.
//!
//! The canonical output is 32-bit IEEE float: one `fmt ` chunk and one
//! `data` chunk, nothing else. Integer PCM output is available on request.

use std::io::Write;

use tracing::debug;

use crate::buffer::SampleBuffer;
use crate::error::{FormatError, Result};
use crate::header::{
    CHUNK_HEADER_LEN, DATA_CHUNK, FMT_BODY_LEN, FMT_CHUNK, FormatTag, RIFF_MAGIC, SampleFormat,
    WAVE_MAGIC, WavFormat,
};

/// Output encoding requested from the writer.
///
/// Holds the raw `(format tag, bits per sample)` pair so an unsupported
/// request is reported as [`FormatError::UnsupportedBitDepth`] at encode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub format_tag: FormatTag,
    pub bits_per_sample: u16,
}

impl EncodeOptions {
    /// 32-bit IEEE float, the default.
    pub fn float32() -> Self {
        EncodeOptions {
            format_tag: FormatTag::IeeeFloat,
            bits_per_sample: 32,
        }
    }

    /// Integer PCM at `bits_per_sample` (8, 16, 24 or 32).
    pub fn pcm(bits_per_sample: u16) -> Self {
        EncodeOptions {
            format_tag: FormatTag::Pcm,
            bits_per_sample,
        }
    }

    fn sample_format(&self) -> Result<SampleFormat> {
        SampleFormat::from_header(self.format_tag, self.bits_per_sample)
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self::float32()
    }
}

/// Serialize `buffer` as a complete WAVE file.
///
/// Nothing is written if the options are unsupported, the buffer has no
/// channels, or its layout does not fit the 16/32-bit header fields.
pub fn write_wav<W: Write>(
    buffer: &SampleBuffer,
    mut writer: W,
    options: &EncodeOptions,
) -> Result<()> {
    let format = options.sample_format()?;
    let fmt = WavFormat::for_output(format, buffer.channels(), buffer.sample_rate())?;
    let layout = Layout::new(format, buffer)?;

    debug!(
        channels = fmt.channels,
        sample_rate = fmt.sample_rate,
        bits_per_sample = fmt.bits_per_sample,
        data_len = layout.data_len,
        "writing WAVE"
    );

    let mut header = Vec::with_capacity(44);
    header.extend_from_slice(&RIFF_MAGIC);
    header.extend_from_slice(&layout.riff_len.to_le_bytes());
    header.extend_from_slice(&WAVE_MAGIC);
    header.extend_from_slice(&FMT_CHUNK);
    header.extend_from_slice(&FMT_BODY_LEN.to_le_bytes());
    header.extend_from_slice(&fmt.to_bytes());
    header.extend_from_slice(&DATA_CHUNK);
    header.extend_from_slice(&layout.data_len.to_le_bytes());
    writer.write_all(&header)?;

    let mut body = encode_samples(format, buffer.samples());
    if layout.padded {
        body.push(0);
    }
    writer.write_all(&body)?;
    writer.flush()?;
    Ok(())
}

/// Chunk sizes for one output file.
struct Layout {
    data_len: u32,
    riff_len: u32,
    /// Whether the `data` body needs a trailing pad byte.
    padded: bool,
}

impl Layout {
    fn new(format: SampleFormat, buffer: &SampleBuffer) -> Result<Self> {
        let data_len = buffer.samples().len() as u64 * format.bytes_per_sample() as u64;
        let padded = data_len % 2 == 1;
        let riff_len = 4
            + (CHUNK_HEADER_LEN + FMT_BODY_LEN) as u64
            + CHUNK_HEADER_LEN as u64
            + data_len
            + padded as u64;

        if riff_len > u32::MAX as u64 {
            return Err(FormatError::invalid_construction(format!(
                "{data_len} bytes of samples do not fit in a RIFF file"
            )));
        }

        Ok(Layout {
            data_len: data_len as u32,
            riff_len: riff_len as u32,
            padded,
        })
    }
}

/// Pack normalized samples into little-endian words.
///
/// Integer formats clamp to `[-1, 1]` and scale by the same constants the
/// decoder divides by, rounding to nearest. Float output is written as-is.
pub fn encode_samples(format: SampleFormat, samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * format.bytes_per_sample());

    match format {
        SampleFormat::U8 => {
            for &s in samples {
                let v = ((s.clamp(-1.0, 1.0) + 1.0) * 255.0 / 2.0).round() as u8;
                out.push(v);
            }
        }
        SampleFormat::I16 => {
            for &s in samples {
                let v = (s.clamp(-1.0, 1.0) * 32767.0).round() as i16;
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        SampleFormat::I24 => {
            for &s in samples {
                let v = (s.clamp(-1.0, 1.0) as f64 * 8_388_607.0).round() as i32;
                out.extend_from_slice(&v.to_le_bytes()[..3]);
            }
        }
        SampleFormat::I32 => {
            for &s in samples {
                let v = (s.clamp(-1.0, 1.0) as f64 * 2_147_483_647.0).round() as i32;
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        SampleFormat::F32 => {
            for &s in samples {
                out.extend_from_slice(&s.to_le_bytes());
            }
        }
    }

    out
}
