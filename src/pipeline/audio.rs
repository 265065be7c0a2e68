//! Stage 2, audio family: deterministic waveform normalisation.
//!
//! Audio uploads arrive in whatever container the client recorded (WAV, MP3,
//! M4A, OGG, ...). The chain below converts all of them to the one shape the
//! downstream model consumes, in a fixed order:
//!
//! 1. Decode at the native sample rate with symphonia, downmixing
//!    multi-channel input to mono by per-frame averaging.
//! 2. Peak-normalise so the loudest sample sits at ±1.0; silence is left
//!    untouched.
//! 3. Pre-emphasis `y[n] = x[n] − 0.97·x[n−1]`, a first-order high-pass that
//!    counters the natural spectral tilt of speech.
//! 4. Resample to exactly 16 kHz with rubato when the native rate differs.
//!
//! The result is written as 16-bit mono PCM WAV. Samples are clamped to
//! ±1.0 on conversion, so the written peak never exceeds the normalisation
//! ceiling even though pre-emphasis can overshoot it.
//!
//! symphonia wants a seekable source, so the payload is staged through a
//! [`NamedTempFile`] that is deleted on every exit path when it drops.

use crate::error::ProcessError;
use hound::{SampleFormat, WavSpec, WavWriter};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::io::{Cursor, Write};
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::IntoSample;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tempfile::NamedTempFile;
use tracing::debug;

/// Output sample rate in Hz.
const TARGET_SAMPLE_RATE: u32 = 16_000;
/// Pre-emphasis coefficient.
const PRE_EMPHASIS: f32 = 0.97;

/// Normalises audio uploads.
///
/// Stateless. One instance sits in [`crate::process::Capabilities`] when the
/// `audio` feature is compiled in.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioPreprocessor;

impl AudioPreprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Run the full normalisation chain on raw audio bytes.
    ///
    /// `source_name` is the submitted filename; its extension feeds the
    /// container probe as a hint. Fails with [`ProcessError::Decode`] when
    /// no decoder can read the bytes.
    pub fn preprocess(&self, bytes: &[u8], source_name: &str) -> Result<Vec<u8>, ProcessError> {
        let mut scratch = NamedTempFile::new()?;
        scratch.write_all(bytes)?;
        scratch.flush()?;
        let (mut samples, native_rate) = decode_native(scratch.path(), source_name)?;
        drop(scratch);

        peak_normalize(&mut samples);
        let samples = pre_emphasis(&samples, PRE_EMPHASIS);
        let samples = resample(samples, native_rate, TARGET_SAMPLE_RATE)?;
        write_wav(&samples, TARGET_SAMPLE_RATE)
    }
}

/// Decode the file into mono f32 samples at the container's native rate.
fn decode_native(path: &Path, source_name: &str) -> Result<(Vec<f32>, u32), ProcessError> {
    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = Path::new(source_name).extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| ProcessError::Decode {
            detail: format!("unreadable audio container: {e}"),
        })?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ProcessError::Decode {
            detail: "no audio track in container".into(),
        })?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let native_rate = codec_params
        .sample_rate
        .ok_or_else(|| ProcessError::Decode {
            detail: "sample rate missing from codec parameters".into(),
        })?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| ProcessError::Decode {
            detail: format!("no decoder for audio track: {e}"),
        })?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // UnexpectedEof is symphonia's normal end-of-stream signal.
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(ProcessError::Decode {
                    detail: format!("failed to read audio packet: {e}"),
                })
            }
        };
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = decoder.decode(&packet).map_err(|e| ProcessError::Decode {
            detail: format!("failed to decode audio packet: {e}"),
        })?;
        append_mono(&decoded, &mut samples);
    }

    debug!("Decoded {} mono samples at {} Hz", samples.len(), native_rate);
    Ok((samples, native_rate))
}

/// Append a decoded buffer to `out` as mono, averaging across channels.
fn append_mono(decoded: &AudioBufferRef<'_>, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::U8(buf) => downmix(buf, out),
        AudioBufferRef::U16(buf) => downmix(buf, out),
        AudioBufferRef::U24(buf) => downmix(buf, out),
        AudioBufferRef::U32(buf) => downmix(buf, out),
        AudioBufferRef::S8(buf) => downmix(buf, out),
        AudioBufferRef::S16(buf) => downmix(buf, out),
        AudioBufferRef::S24(buf) => downmix(buf, out),
        AudioBufferRef::S32(buf) => downmix(buf, out),
        AudioBufferRef::F32(buf) => downmix(buf, out),
        AudioBufferRef::F64(buf) => downmix(buf, out),
    }
}

fn downmix<S>(buf: &AudioBuffer<S>, out: &mut Vec<f32>)
where
    S: Sample + IntoSample<f32>,
{
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    if channels == 1 {
        let chan = buf.chan(0);
        out.extend(chan.iter().take(frames).map(|s| (*s).into_sample()));
        return;
    }
    for frame in 0..frames {
        let mut acc = 0.0f32;
        for ch in 0..channels {
            let sample: f32 = buf.chan(ch)[frame].into_sample();
            acc += sample;
        }
        out.push(acc / channels as f32);
    }
}

/// Scale so the loudest sample sits at ±1.0. Silence is left unchanged.
fn peak_normalize(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak > 0.0 {
        for s in samples.iter_mut() {
            *s /= peak;
        }
    }
}

/// First-order high-pass: `y[n] = x[n] − coef·x[n−1]`.
///
/// The first sample uses a linearly extrapolated predecessor
/// `x[−1] = 2·x[0] − x[1]`, so a constant signal maps to a uniform small
/// residue instead of keeping a large first-sample transient.
fn pre_emphasis(samples: &[f32], coef: f32) -> Vec<f32> {
    match samples {
        [] => Vec::new(),
        [only] => vec![only * (1.0 - coef)],
        _ => {
            let mut out = Vec::with_capacity(samples.len());
            let extrapolated = 2.0 * samples[0] - samples[1];
            out.push(samples[0] - coef * extrapolated);
            for i in 1..samples.len() {
                out.push(samples[i] - coef * samples[i - 1]);
            }
            out
        }
    }
}

/// Sinc resampling in one pass, chunk size equal to the input length.
fn resample(samples: Vec<f32>, source_rate: u32, target_rate: u32) -> Result<Vec<f32>, ProcessError> {
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples);
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = f64::from(target_rate) / f64::from(source_rate);
    let frames = samples.len();

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, frames, 1).map_err(|e| {
        ProcessError::Extraction {
            detail: format!("failed to construct resampler: {e}"),
        }
    })?;
    let output = resampler
        .process(&[samples], None)
        .map_err(|e| ProcessError::Extraction {
            detail: format!("resampling failed: {e}"),
        })?;
    let resampled = output.into_iter().next().unwrap_or_default();
    debug!(
        "Resampled {} frames at {} Hz → {} frames at {} Hz",
        frames,
        source_rate,
        resampled.len(),
        target_rate
    );
    Ok(resampled)
}

/// Encode as 16-bit mono PCM WAV, clamping samples to ±1.0.
fn write_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, ProcessError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut cursor, spec).map_err(wav_error)?;
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer
            .write_sample((clamped * f32::from(i16::MAX)) as i16)
            .map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)?;
    Ok(cursor.into_inner())
}

fn wav_error(e: hound::Error) -> ProcessError {
    ProcessError::Io {
        detail: format!("WAV encoding failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use hound::WavReader;

    fn wav_fixture(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    fn sine(sample_rate: u32, seconds: f32, frequency: f32, amplitude: f32) -> Vec<i16> {
        let count = (sample_rate as f32 * seconds) as usize;
        (0..count)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                let s = amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin();
                (s * f32::from(i16::MAX)) as i16
            })
            .collect()
    }

    fn read_output(bytes: &[u8]) -> (WavSpec, Vec<i16>) {
        let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        (spec, samples)
    }

    #[test]
    fn output_is_16khz_mono_regardless_of_input_rate() {
        for rate in [8_000u32, 44_100, 48_000] {
            let fixture = wav_fixture(rate, 1, &sine(rate, 0.25, 440.0, 0.8));
            let out = AudioPreprocessor::new()
                .preprocess(&fixture, "clip.wav")
                .unwrap();
            let (spec, samples) = read_output(&out);
            assert_eq!(spec.sample_rate, 16_000, "input rate {rate}");
            assert_eq!(spec.channels, 1);
            assert_eq!(spec.bits_per_sample, 16);
            assert!(!samples.is_empty());
        }
    }

    #[test]
    fn native_16khz_skips_resampling() {
        let input = sine(16_000, 0.1, 440.0, 0.8);
        let fixture = wav_fixture(16_000, 1, &input);
        let out = AudioPreprocessor::new()
            .preprocess(&fixture, "clip.wav")
            .unwrap();
        let (spec, samples) = read_output(&out);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(samples.len(), input.len());
    }

    #[test]
    fn quiet_input_is_normalized_and_never_clips() {
        let fixture = wav_fixture(44_100, 1, &sine(44_100, 0.25, 2_000.0, 0.1));
        let out = AudioPreprocessor::new()
            .preprocess(&fixture, "clip.wav")
            .unwrap();
        let (_, samples) = read_output(&out);
        let peak = samples.iter().map(|s| i32::from(s.abs())).max().unwrap();
        // Normalisation lifted the 0.1 amplitude well above its raw level...
        assert!(peak > 3_000, "peak {peak} suggests no normalisation");
        // ...and the ceiling holds.
        assert!(peak <= i32::from(i16::MAX));
    }

    #[test]
    fn silence_stays_silent() {
        let fixture = wav_fixture(22_050, 1, &vec![0i16; 2_000]);
        let out = AudioPreprocessor::new()
            .preprocess(&fixture, "quiet.wav")
            .unwrap();
        let (_, samples) = read_output(&out);
        assert!(samples.iter().all(|&s| s == 0));
    }

    #[test]
    fn stereo_downmix_averages_channels() {
        // Opposite-phase channels cancel under averaging; picking a single
        // channel instead would leave a loud signal.
        let frames = 4_000;
        let mut interleaved = Vec::with_capacity(frames * 2);
        for _ in 0..frames {
            interleaved.push(1_000i16);
            interleaved.push(-1_000i16);
        }
        let fixture = wav_fixture(16_000, 2, &interleaved);
        let out = AudioPreprocessor::new()
            .preprocess(&fixture, "stereo.wav")
            .unwrap();
        let (spec, samples) = read_output(&out);
        assert_eq!(spec.channels, 1);
        assert!(samples.iter().all(|&s| s == 0), "channels did not cancel");
    }

    #[test]
    fn empty_audio_yields_empty_wav() {
        let fixture = wav_fixture(44_100, 1, &[]);
        let out = AudioPreprocessor::new()
            .preprocess(&fixture, "empty.wav")
            .unwrap();
        let (spec, samples) = read_output(&out);
        assert_eq!(spec.sample_rate, 16_000);
        assert!(samples.is_empty());
    }

    #[test]
    fn garbage_bytes_fail_with_decode() {
        let err = AudioPreprocessor::new()
            .preprocess(b"certainly not audio", "noise.bin")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn pre_emphasis_flattens_constant_signal() {
        let out = pre_emphasis(&[1.0, 1.0, 1.0, 1.0], 0.97);
        for y in out {
            assert!((y - 0.03).abs() < 1e-6, "got {y}");
        }
    }

    #[test]
    fn peak_normalize_scales_to_unit_peak() {
        let mut samples = vec![0.25f32, -0.5, 0.1];
        peak_normalize(&mut samples);
        assert_eq!(samples, vec![0.5, -1.0, 0.2]);
    }

    #[test]
    fn peak_normalize_leaves_silence_alone() {
        let mut samples = vec![0.0f32; 16];
        peak_normalize(&mut samples);
        assert!(samples.iter().all(|&s| s == 0.0));
    }
}
