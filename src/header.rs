use crate::error::{FormatError, Result};
use crate::source::ByteSource;

pub const RIFF_MAGIC: [u8; 4] = *b"RIFF";
pub const WAVE_MAGIC: [u8; 4] = *b"WAVE";
pub const FMT_CHUNK: [u8; 4] = *b"fmt ";
pub const DATA_CHUNK: [u8; 4] = *b"data";

/// Size of the mandatory part of a `fmt ` body (PCM/float, no extension).
pub const FMT_BODY_LEN: u32 = 16;

/// Size of a chunk header: 4-byte ID + u32 length.
pub const CHUNK_HEADER_LEN: u32 = 8;

/// WAVE format tag from the `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatTag {
    /// Integer PCM (1).
    Pcm,
    /// IEEE-754 float (3).
    IeeeFloat,
    /// Anything else. Rejected by the decoder, kept so encode options can
    /// carry an arbitrary requested tag.
    Other(u16),
}

impl From<u16> for FormatTag {
    fn from(val: u16) -> Self {
        match val {
            1 => FormatTag::Pcm,
            3 => FormatTag::IeeeFloat,
            other => FormatTag::Other(other),
        }
    }
}

impl From<FormatTag> for u16 {
    fn from(tag: FormatTag) -> Self {
        match tag {
            FormatTag::Pcm => 1,
            FormatTag::IeeeFloat => 3,
            FormatTag::Other(val) => val,
        }
    }
}

/// Sample word layouts this crate can convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Unsigned 8-bit PCM, midpoint 128.
    U8,
    I16,
    /// Signed 24-bit PCM, packed in 3 bytes.
    I24,
    I32,
    F32,
}

impl SampleFormat {
    /// Resolve a `(format tag, bits per sample)` pair.
    pub fn from_header(format_tag: FormatTag, bits_per_sample: u16) -> Result<Self> {
        match (format_tag, bits_per_sample) {
            (FormatTag::Pcm, 8) => Ok(SampleFormat::U8),
            (FormatTag::Pcm, 16) => Ok(SampleFormat::I16),
            (FormatTag::Pcm, 24) => Ok(SampleFormat::I24),
            (FormatTag::Pcm, 32) => Ok(SampleFormat::I32),
            (FormatTag::IeeeFloat, 32) => Ok(SampleFormat::F32),
            (tag, bits) => Err(FormatError::UnsupportedBitDepth {
                format_tag: tag.into(),
                bits_per_sample: bits,
            }),
        }
    }

    pub fn format_tag(self) -> FormatTag {
        match self {
            SampleFormat::F32 => FormatTag::IeeeFloat,
            _ => FormatTag::Pcm,
        }
    }

    pub fn bits_per_sample(self) -> u16 {
        self.bytes_per_sample() as u16 * 8
    }

    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::U8 => 1,
            SampleFormat::I16 => 2,
            SampleFormat::I24 => 3,
            SampleFormat::I32 | SampleFormat::F32 => 4,
        }
    }
}

/// Parsed `fmt ` chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavFormat {
    pub format_tag: FormatTag,
    pub channels: u16,
    pub sample_rate: u32,
    /// Average bytes per second. Not used for decoding.
    pub byte_rate: u32,
    /// Bytes per frame. Not used for decoding.
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// `cbSize` when the body carries one. Recorded, never interpreted.
    pub extension_size: Option<u16>,
}

impl WavFormat {
    /// Parse a `fmt ` chunk body.
    ///
    /// Only PCM and IEEE float tags are accepted; bytes past the fields
    /// consumed here are left for the chunk walker to skip.
    pub fn from_bytes(body: &[u8]) -> Result<Self> {
        // The tag decides support before anything else, even in a short body.
        if body.len() >= 2 {
            let raw_tag = le_u16(&body[0..2]);
            if !matches!(FormatTag::from(raw_tag), FormatTag::Pcm | FormatTag::IeeeFloat) {
                return Err(FormatError::UnsupportedFormat(raw_tag));
            }
        }
        if body.len() < FMT_BODY_LEN as usize {
            return Err(FormatError::invalid_format(format!(
                "fmt chunk is {} bytes, need at least {FMT_BODY_LEN}",
                body.len()
            )));
        }

        let format_tag = FormatTag::from(le_u16(&body[0..2]));
        let channels = le_u16(&body[2..4]);
        let sample_rate = le_u32(&body[4..8]);
        let byte_rate = le_u32(&body[8..12]);
        let block_align = le_u16(&body[12..14]);
        let bits_per_sample = le_u16(&body[14..16]);

        let extension_size = if body.len() >= 18 {
            Some(le_u16(&body[16..18]))
        } else {
            None
        };

        if channels == 0 {
            return Err(FormatError::invalid_format("channel count is 0"));
        }
        if sample_rate == 0 {
            return Err(FormatError::invalid_format("sample rate is 0"));
        }

        Ok(WavFormat {
            format_tag,
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
            extension_size,
        })
    }

    /// Build the header for writing `channels` × `sample_rate` in `format`.
    ///
    /// Fails when the buffer has no channels or no rate, or when block align
    /// or byte rate overflow their 16/32-bit header fields.
    pub fn for_output(format: SampleFormat, channels: u16, sample_rate: u32) -> Result<Self> {
        if channels == 0 || sample_rate == 0 {
            return Err(FormatError::invalid_construction(format!(
                "cannot write {channels} channels at {sample_rate} Hz"
            )));
        }

        let block_align = channels as u64 * format.bytes_per_sample() as u64;
        let byte_rate = sample_rate as u64 * block_align;
        let (Ok(block_align), Ok(byte_rate)) = (u16::try_from(block_align), u32::try_from(byte_rate))
        else {
            return Err(FormatError::invalid_construction(format!(
                "{channels} channels at {sample_rate} Hz overflow the fmt header \
                 (block align {block_align}, byte rate {byte_rate})"
            )));
        };

        Ok(WavFormat {
            format_tag: format.format_tag(),
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample: format.bits_per_sample(),
            extension_size: None,
        })
    }

    /// Serialize the 16-byte body. The extension word is never written.
    pub fn to_bytes(&self) -> [u8; FMT_BODY_LEN as usize] {
        let mut out = [0u8; FMT_BODY_LEN as usize];
        out[0..2].copy_from_slice(&u16::from(self.format_tag).to_le_bytes());
        out[2..4].copy_from_slice(&self.channels.to_le_bytes());
        out[4..8].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[8..12].copy_from_slice(&self.byte_rate.to_le_bytes());
        out[12..14].copy_from_slice(&self.block_align.to_le_bytes());
        out[14..16].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        out
    }

    pub fn sample_format(&self) -> Result<SampleFormat> {
        SampleFormat::from_header(self.format_tag, self.bits_per_sample)
    }
}

/// A sub-chunk header inside the RIFF body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub id: [u8; 4],
    pub size: u32,
}

impl ChunkHeader {
    /// Printable form of the chunk ID for diagnostics.
    pub fn id_str(&self) -> String {
        String::from_utf8_lossy(&self.id).into_owned()
    }
}

/// Read the 12-byte RIFF preamble and return the declared RIFF length.
pub fn read_riff_header<S: ByteSource>(source: &mut S) -> Result<u32> {
    // Anything shorter than the magic is not RIFF either.
    let mut magic = [0u8; 4];
    let got = source.read_up_to(&mut magic)?;
    if got < magic.len() || magic != RIFF_MAGIC {
        return Err(FormatError::NotRiff);
    }

    let length = read_u32_le(source)?;

    source.read_exact(&mut magic)?;
    if magic != WAVE_MAGIC {
        return Err(FormatError::NotWave);
    }

    Ok(length)
}

/// Read the next chunk header.
///
/// Returns `None` on a clean end of stream (zero bytes left). A partial
/// header is a truncation error.
pub fn read_chunk_header<S: ByteSource>(source: &mut S) -> Result<Option<ChunkHeader>> {
    let mut buf = [0u8; CHUNK_HEADER_LEN as usize];
    let got = source.read_up_to(&mut buf)?;
    if got == 0 {
        return Ok(None);
    }
    if got < buf.len() {
        return Err(FormatError::truncated(buf.len() as u64, got as u64));
    }

    Ok(Some(ChunkHeader {
        id: [buf[0], buf[1], buf[2], buf[3]],
        size: le_u32(&buf[4..8]),
    }))
}

// ── Little-endian helpers ────────────────────────────────────────────

fn read_u32_le<S: ByteSource>(source: &mut S) -> Result<u32> {
    let mut buf = [0u8; 4];
    source.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn le_u16(b: &[u8]) -> u16 {
    u16::from_le_bytes([b[0], b[1]])
}

fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}
