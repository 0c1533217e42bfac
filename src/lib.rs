//! RIFF/WAVE decoder and encoder.
//!
//! Decodes 8/16/24/32-bit integer PCM and 32-bit IEEE float WAVE files into
//! an interleaved buffer of normalized `f32` samples, and writes such a
//! buffer back out (32-bit float by default).
//!
//! Chunks other than `fmt ` and `data` are skipped, in any order and with
//! any size, honouring RIFF word alignment.
//!
//! # Example
//!
//! ```no_run
//! use wave_codec::{SampleBuffer, WavReader};
//!
//! let reader = WavReader::open("input.wav").unwrap();
//! let info = reader.info().clone();
//! println!("{}ch, {}Hz, {}bit", info.channels, info.sample_rate, info.bits_per_sample);
//!
//! let buffer: SampleBuffer = reader.into_buffer().unwrap();
//! buffer.save("output.wav").unwrap();
//! ```

mod buffer;
mod decode;
mod encode;
pub mod error;
mod header;
pub mod source;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

pub use buffer::SampleBuffer;
pub use encode::{EncodeOptions, write_wav};
pub use error::{FormatError, Result};
pub use header::{FormatTag, SampleFormat};
pub use source::{ByteSource, ReaderSource, SliceSource};

/// Format of a WAVE stream as declared by its `fmt ` and `data` chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavInfo {
    pub format_tag: FormatTag,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Average bytes per second, as declared. Not checked.
    pub byte_rate: u32,
    /// Bytes per frame, as declared. Not checked.
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Length of the `data` chunk body in bytes.
    pub data_len: u32,
}

impl WavInfo {
    /// Whole frames in the `data` chunk. A trailing partial frame is not counted.
    pub fn frames(&self) -> u32 {
        let frame_bytes = (self.bits_per_sample / 8) as u32 * self.channels as u32;
        if frame_bytes == 0 {
            return 0;
        }
        self.data_len / frame_bytes
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }
}

/// A reader that decodes a WAVE stream.
///
/// Construction walks the chunk list up to the `data` body, so the format is
/// known (and validated) before any sample is converted.
pub struct WavReader<S: ByteSource> {
    decoder: decode::Decoder<S>,
    info: WavInfo,
}

impl WavReader<ReaderSource<BufReader<File>>> {
    /// Open a WAVE file by path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(ReaderSource::new(BufReader::new(file)))
    }
}

impl<S: ByteSource> WavReader<S> {
    /// Parse the header chunks of `source`.
    ///
    /// Fails with `UnsupportedBitDepth` here already if the declared format
    /// cannot be converted.
    pub fn new(source: S) -> Result<Self> {
        let decoder = decode::Decoder::new(source)?;
        let format = &decoder.format;

        let info = WavInfo {
            format_tag: format.format_tag,
            channels: format.channels,
            sample_rate: format.sample_rate,
            byte_rate: format.byte_rate,
            block_align: format.block_align,
            bits_per_sample: format.bits_per_sample,
            data_len: decoder.data_len(),
        };

        Ok(WavReader { decoder, info })
    }

    /// Get metadata about the audio stream.
    pub fn info(&self) -> &WavInfo {
        &self.info
    }

    pub fn sample_format(&self) -> SampleFormat {
        self.decoder.sample_format
    }

    /// Decode the `data` chunk and consume the rest of the stream.
    pub fn into_buffer(self) -> Result<SampleBuffer> {
        self.decoder.decode()
    }
}

/// Decode an in-memory WAVE file.
pub fn decode_wav(bytes: &[u8]) -> Result<SampleBuffer> {
    WavReader::new(SliceSource::new(bytes))?.into_buffer()
}

/// Decode a WAVE file from any reader. Only forward reads are used.
pub fn read_wav<R: Read>(reader: R) -> Result<SampleBuffer> {
    WavReader::new(ReaderSource::new(reader))?.into_buffer()
}

/// Encode `buffer` as 32-bit float WAVE bytes.
pub fn encode_wav(buffer: &SampleBuffer) -> Result<Vec<u8>> {
    encode_wav_with(buffer, &EncodeOptions::default())
}

/// Encode `buffer` with an explicit output encoding.
pub fn encode_wav_with(buffer: &SampleBuffer, options: &EncodeOptions) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_wav(buffer, &mut out, options)?;
    Ok(out)
}

impl SampleBuffer {
    /// Decode a WAVE file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        WavReader::open(path)?.into_buffer()
    }

    /// Write the buffer to disk as 32-bit float WAVE.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.save_with(path, &EncodeOptions::default())
    }

    /// Write the buffer to disk with an explicit output encoding.
    ///
    /// The options are validated before the file is created.
    pub fn save_with<P: AsRef<Path>>(&self, path: P, options: &EncodeOptions) -> Result<()> {
        let bytes = encode_wav_with(self, options)?;
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }
}
