//! Chunk walker and sample conversion.
//!
//! Decode pipeline:
//! 1. Check the `RIFF`/`WAVE` preamble, note the declared RIFF length
//! 2. Walk sub-chunks: parse `fmt `, skip unknown chunks, stop at `data`
//! 3. Read the `data` body and convert every sample word to `f32`
//! 4. Skip whatever chunks remain up to the declared RIFF length, still
//!    rejecting a later `fmt ` that does not parse

use tracing::{debug, trace};

use crate::buffer::SampleBuffer;
use crate::error::{FormatError, Result};
use crate::header::{
    self, CHUNK_HEADER_LEN, ChunkHeader, DATA_CHUNK, FMT_CHUNK, SampleFormat, WavFormat,
};
use crate::source::ByteSource;

/// Bytes of a `fmt ` body we look at: the 16 mandatory bytes plus `cbSize`.
const FMT_READ_LEN: u32 = 18;

/// Tracks position inside the RIFF body.
///
/// `offset` counts from the start of the `WAVE` form type, so it begins at 4
/// and is compared against the declared RIFF length.
#[derive(Debug, Clone)]
struct ChunkWalker {
    riff_len: u64,
    offset: u64,
}

impl ChunkWalker {
    fn new(riff_len: u32) -> Self {
        ChunkWalker {
            riff_len: riff_len as u64,
            offset: 4,
        }
    }

    /// Read the next chunk header, or `None` once the declared length is
    /// reached or the stream ends cleanly on a chunk boundary.
    fn next_chunk<S: ByteSource>(&mut self, source: &mut S) -> Result<Option<ChunkHeader>> {
        if self.offset >= self.riff_len {
            return Ok(None);
        }
        let Some(chunk) = header::read_chunk_header(source)? else {
            trace!(offset = self.offset, "stream ended before declared RIFF length");
            return Ok(None);
        };
        self.offset += CHUNK_HEADER_LEN as u64;
        trace!(id = %chunk.id_str(), size = chunk.size, offset = self.offset, "chunk");
        Ok(Some(chunk))
    }

    /// Move past the rest of `chunk`'s body, `consumed` bytes of which were
    /// already read, plus the pad byte of an odd-sized body.
    fn finish_chunk<S: ByteSource>(
        &mut self,
        source: &mut S,
        chunk: &ChunkHeader,
        consumed: u64,
    ) -> Result<()> {
        let size = chunk.size as u64;
        source.skip(size - consumed)?;
        self.offset += size;

        let aligned = (self.offset + 1) & !1;
        if aligned != self.offset {
            // A missing pad byte at the very end of the stream is tolerated.
            source.skip_up_to(aligned - self.offset)?;
            self.offset = aligned;
        }
        Ok(())
    }
}

/// Decoder positioned at the start of the `data` body.
pub struct Decoder<S: ByteSource> {
    source: S,
    walker: ChunkWalker,
    pub format: WavFormat,
    pub sample_format: SampleFormat,
    data_chunk: ChunkHeader,
}

impl<S: ByteSource> Decoder<S> {
    /// Parse the preamble and walk chunks until the `data` body.
    ///
    /// `fmt ` must have been seen by the time `data` is reached.
    pub fn new(mut source: S) -> Result<Self> {
        let riff_len = header::read_riff_header(&mut source)?;
        let mut walker = ChunkWalker::new(riff_len);
        let mut format: Option<WavFormat> = None;

        loop {
            let Some(chunk) = walker.next_chunk(&mut source)? else {
                return Err(FormatError::MissingChunk(if format.is_none() {
                    "fmt "
                } else {
                    "data"
                }));
            };

            match chunk.id {
                FMT_CHUNK => {
                    format = Some(read_fmt(&mut walker, &mut source, &chunk)?);
                }
                DATA_CHUNK => {
                    let Some(format) = format else {
                        return Err(FormatError::MissingChunk("fmt "));
                    };
                    let sample_format = format.sample_format()?;
                    return Ok(Decoder {
                        source,
                        walker,
                        format,
                        sample_format,
                        data_chunk: chunk,
                    });
                }
                _ => {
                    debug!(id = %chunk.id_str(), size = chunk.size, "skipping chunk");
                    walker.finish_chunk(&mut source, &chunk, 0)?;
                }
            }
        }
    }

    /// Byte length declared by the `data` chunk.
    pub fn data_len(&self) -> u32 {
        self.data_chunk.size
    }

    /// Convert the `data` body and skip any trailing chunks.
    pub fn decode(mut self) -> Result<SampleBuffer> {
        let raw = self.source.read_vec(self.data_chunk.size as usize)?;
        let data_chunk = self.data_chunk;
        self.walker
            .finish_chunk(&mut self.source, &data_chunk, data_chunk.size as u64)?;

        let (frames, samples) = convert_samples(self.sample_format, self.format.channels, &raw);

        // Trailing fmt chunks are still validated, but the first data chunk
        // and the format in force before it are what get decoded.
        while let Some(chunk) = self.walker.next_chunk(&mut self.source)? {
            match chunk.id {
                FMT_CHUNK => {
                    read_fmt(&mut self.walker, &mut self.source, &chunk)?;
                }
                DATA_CHUNK => {
                    debug!(size = chunk.size, "ignoring additional data chunk");
                    self.walker.finish_chunk(&mut self.source, &chunk, 0)?;
                }
                _ => self.walker.finish_chunk(&mut self.source, &chunk, 0)?,
            }
        }

        SampleBuffer::new(self.format.channels, self.format.sample_rate, frames, samples)
    }
}

/// Parse a `fmt ` body and skip whatever follows the fields read.
fn read_fmt<S: ByteSource>(
    walker: &mut ChunkWalker,
    source: &mut S,
    chunk: &ChunkHeader,
) -> Result<WavFormat> {
    let want = chunk.size.min(FMT_READ_LEN);
    let body = source.read_vec(want as usize)?;
    let parsed = WavFormat::from_bytes(&body)?;
    debug!(
        format_tag = u16::from(parsed.format_tag),
        channels = parsed.channels,
        sample_rate = parsed.sample_rate,
        bits_per_sample = parsed.bits_per_sample,
        "parsed fmt chunk"
    );
    walker.finish_chunk(source, chunk, want as u64)?;
    Ok(parsed)
}

/// Convert raw interleaved sample words to normalized floats.
///
/// Returns `(frames, samples)`. A trailing partial frame (or partial word)
/// is dropped, so `samples.len() == frames * channels`.
pub fn convert_samples(format: SampleFormat, channels: u16, raw: &[u8]) -> (u32, Vec<f32>) {
    let width = format.bytes_per_sample();
    let channels = channels.max(1) as usize;
    let frames = raw.len() / width / channels;
    let words = raw[..frames * channels * width].chunks_exact(width);

    let samples: Vec<f32> = match format {
        SampleFormat::U8 => words.map(|w| 2.0 * w[0] as f32 / 255.0 - 1.0).collect(),
        SampleFormat::I16 => words
            .map(|w| i16::from_le_bytes([w[0], w[1]]) as f32 / 32767.0)
            .collect(),
        SampleFormat::I24 => words
            .map(|w| {
                let sign = if w[2] & 0x80 != 0 { 0xFF } else { 0x00 };
                let v = i32::from_le_bytes([w[0], w[1], w[2], sign]);
                (v as f64 / 8_388_607.0) as f32
            })
            .collect(),
        SampleFormat::I32 => words
            .map(|w| {
                let v = i32::from_le_bytes([w[0], w[1], w[2], w[3]]);
                (v as f64 / 2_147_483_647.0) as f32
            })
            .collect(),
        SampleFormat::F32 => words
            .map(|w| f32::from_le_bytes([w[0], w[1], w[2], w[3]]))
            .collect(),
    };

    (frames as u32, samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u8_midpoint_and_extremes() {
        let (frames, s) = convert_samples(SampleFormat::U8, 1, &[0, 255, 128]);
        assert_eq!(frames, 3);
        assert_eq!(s[0], -1.0);
        assert_eq!(s[1], 1.0);
        assert!((s[2] - 1.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn i16_full_scale() {
        let raw = [0xFF, 0x7F, 0x01, 0x80, 0x00, 0x80];
        let (_, s) = convert_samples(SampleFormat::I16, 1, &raw);
        assert_eq!(s[0], 1.0);
        assert_eq!(s[1], -1.0);
        // -32768 sits slightly outside the nominal range and is not clamped.
        assert!(s[2] < -1.0);
    }

    #[test]
    fn i24_sign_extension() {
        let raw = [0xFF, 0xFF, 0x7F, 0x01, 0x00, 0x80, 0xFF, 0xFF, 0xFF];
        let (_, s) = convert_samples(SampleFormat::I24, 1, &raw);
        assert_eq!(s[0], 1.0);
        assert_eq!(s[1], -1.0);
        assert!((s[2] + 1.0 / 8_388_607.0).abs() < 1e-9);
    }

    #[test]
    fn i32_full_scale() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&i32::MAX.to_le_bytes());
        raw.extend_from_slice(&(-i32::MAX).to_le_bytes());
        raw.extend_from_slice(&0i32.to_le_bytes());
        let (_, s) = convert_samples(SampleFormat::I32, 1, &raw);
        assert_eq!(s, vec![1.0, -1.0, 0.0]);
    }

    #[test]
    fn f32_is_bit_identical() {
        let values = [0.25f32, -0.75, f32::MIN_POSITIVE, 1.5];
        let raw: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let (_, s) = convert_samples(SampleFormat::F32, 2, &raw);
        for (a, b) in s.iter().zip(values.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn partial_frame_is_dropped() {
        // 2 channels, 16-bit: 5 full samples + 1 stray byte -> 2 frames.
        let raw = [0u8; 11];
        let (frames, s) = convert_samples(SampleFormat::I16, 2, &raw);
        assert_eq!(frames, 2);
        assert_eq!(s.len(), 4);
    }
}
