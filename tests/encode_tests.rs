use std::io::Cursor;

use wave_codec::{
    EncodeOptions, FormatError, FormatTag, SampleBuffer, WavReader, decode_wav, encode_wav,
    encode_wav_with, read_wav, write_wav,
};

fn stereo_fixture() -> SampleBuffer {
    SampleBuffer::new(2, 48000, 3, vec![1.0, 1.0, -1.0, -1.0, 0.0, 0.0]).unwrap()
}

#[test]
fn float32_round_trip_is_exact() {
    let original = stereo_fixture();
    let bytes = encode_wav(&original).unwrap();
    let decoded = decode_wav(&bytes).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn out_of_range_floats_survive_round_trip() {
    let original = SampleBuffer::new(1, 96000, 4, vec![1.5, -2.0, 1e-30, f32::MAX]).unwrap();
    let decoded = decode_wav(&encode_wav(&original).unwrap()).unwrap();
    assert_eq!(decoded.samples(), original.samples());
}

#[test]
fn empty_buffer_round_trip() {
    let original = SampleBuffer::new(1, 44100, 0, Vec::new()).unwrap();
    let bytes = encode_wav(&original).unwrap();
    assert_eq!(bytes.len(), 44);
    let decoded = decode_wav(&bytes).unwrap();
    assert_eq!(decoded.frames(), 0);
    assert_eq!(decoded.channels(), 1);
    assert_eq!(decoded.sample_rate(), 44100);
}

#[test]
fn default_buffer_is_rejected_before_writing() {
    assert!(matches!(
        encode_wav(&SampleBuffer::default()),
        Err(FormatError::InvalidConstruction(_))
    ));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.wav");
    assert!(matches!(
        SampleBuffer::default().save(&path),
        Err(FormatError::InvalidConstruction(_))
    ));
    assert!(!path.exists());
}

#[test]
fn too_many_channels_for_header() {
    let buffer = SampleBuffer::new(16384, 48000, 0, Vec::new()).unwrap();
    assert!(matches!(encode_wav(&buffer), Err(FormatError::InvalidConstruction(_))));

    let buffer = SampleBuffer::new(16383, 48000, 0, Vec::new()).unwrap();
    let decoded = decode_wav(&encode_wav(&buffer).unwrap()).unwrap();
    assert_eq!(decoded.channels(), 16383);
    assert_eq!(decoded.frames(), 0);
}

#[test]
fn nan_payloads_survive_round_trip() {
    let quiet = f32::from_bits(0x7FC0_0001);
    let signalling = f32::from_bits(0xFF80_0001);
    let original = SampleBuffer::new(1, 8000, 4, vec![quiet, signalling, f32::INFINITY, -0.0]).unwrap();
    let decoded = decode_wav(&encode_wav(&original).unwrap()).unwrap();
    let bits: Vec<u32> = decoded.samples().iter().map(|s| s.to_bits()).collect();
    assert_eq!(bits, [0x7FC0_0001, 0xFF80_0001, 0x7F80_0000, 0x8000_0000]);
}

#[test]
fn pcm_round_trips_within_quantization() {
    let original = SampleBuffer::new(2, 22050, 4, vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25, 0.1, -0.9]).unwrap();
    for (bits, tolerance) in [
        (8u16, 1.0 / 127.0),
        (16, 1.0 / 32767.0),
        (24, 1.0 / 8_388_607.0),
        (32, 1e-7),
    ] {
        let bytes = encode_wav_with(&original, &EncodeOptions::pcm(bits)).unwrap();
        let reader = WavReader::new(wave_codec::SliceSource::new(&bytes)).unwrap();
        assert_eq!(reader.info().format_tag, FormatTag::Pcm);
        assert_eq!(reader.info().bits_per_sample, bits);
        let decoded = reader.into_buffer().unwrap();
        assert_eq!(decoded.frames(), 4);
        for (a, b) in decoded.samples().iter().zip(original.samples()) {
            assert!((a - b).abs() <= tolerance, "{bits}-bit: {a} vs {b}");
        }
    }
}

#[test]
fn unsupported_output_bit_depth() {
    let buffer = stereo_fixture();
    for options in [
        EncodeOptions::pcm(20),
        EncodeOptions {
            format_tag: FormatTag::IeeeFloat,
            bits_per_sample: 64,
        },
    ] {
        assert!(matches!(
            encode_wav_with(&buffer, &options),
            Err(FormatError::UnsupportedBitDepth { .. })
        ));
    }
}

#[test]
fn write_wav_to_reader_pipeline() {
    let original = stereo_fixture();
    let mut sink = Cursor::new(Vec::new());
    write_wav(&original, &mut sink, &EncodeOptions::default()).unwrap();
    sink.set_position(0);
    assert_eq!(read_wav(sink).unwrap(), original);
}

#[test]
fn save_and_open_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("round_trip.wav");

    let original = stereo_fixture();
    original.save(&path).unwrap();

    let reader = WavReader::open(&path).unwrap();
    assert_eq!(reader.info().frames(), 3);
    assert_eq!(reader.into_buffer().unwrap(), original);
    assert_eq!(SampleBuffer::open(&path).unwrap(), original);
}

#[test]
fn save_with_bad_options_creates_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never.wav");
    let result = stereo_fixture().save_with(&path, &EncodeOptions::pcm(4));
    assert!(matches!(result, Err(FormatError::UnsupportedBitDepth { .. })));
    assert!(!path.exists());
}

#[test]
fn open_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        SampleBuffer::open(dir.path().join("missing.wav")),
        Err(FormatError::Io(_))
    ));
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Mostly nominal samples, plus arbitrary bit patterns: out-of-range
    /// values, infinities, subnormals and NaNs.
    fn sample() -> impl Strategy<Value = f32> {
        prop_oneof![
            3 => -1.0f32..=1.0,
            1 => any::<u32>().prop_map(f32::from_bits),
        ]
    }

    fn sample_buffer() -> impl Strategy<Value = SampleBuffer> {
        (1u16..=8, 1u32..=192_000, 0u32..64).prop_flat_map(|(channels, rate, frames)| {
            prop::collection::vec(sample(), (channels as u32 * frames) as usize).prop_map(
                move |samples| SampleBuffer::new(channels, rate, frames, samples).unwrap(),
            )
        })
    }

    proptest! {
        /// encode then decode gives back the same buffer, bit for bit.
        #[test]
        fn prop_float32_round_trip(original in sample_buffer()) {
            let bytes = encode_wav(&original).unwrap();
            let decoded = decode_wav(&bytes).unwrap();
            prop_assert_eq!(decoded.channels(), original.channels());
            prop_assert_eq!(decoded.sample_rate(), original.sample_rate());
            prop_assert_eq!(decoded.frames(), original.frames());
            for (a, b) in decoded.samples().iter().zip(original.samples()) {
                prop_assert_eq!(a.to_bits(), b.to_bits());
            }
        }

        /// Header sizes are consistent with the sample count.
        #[test]
        fn prop_header_sizes(original in sample_buffer()) {
            let bytes = encode_wav(&original).unwrap();
            let data_len = original.samples().len() * 4;
            prop_assert_eq!(bytes.len(), 44 + data_len);
            let riff_len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
            prop_assert_eq!(riff_len as usize, bytes.len() - 8);
            let declared = u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]);
            prop_assert_eq!(declared as usize, data_len);
        }
    }
}
