//! Microphone streaming and sample helpers

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig, SupportedStreamConfigRange};

use crate::{Error, Result};

/// Capture rate; speech services expect 16 kHz mono
pub const SAMPLE_RATE: u32 = 16000;

type Pending = Arc<Mutex<Vec<f32>>>;

/// A running input stream feeding a shared mono buffer
///
/// Stereo or multi-channel devices are downmixed in the stream callback.
/// Readers drain the buffer; nothing is kept once drained.
pub struct AudioCapture {
    device: Device,
    config: StreamConfig,
    pending: Pending,
    stream: Option<Stream>,
}

impl AudioCapture {
    /// Open the default input device at [`SAMPLE_RATE`]
    ///
    /// Mono configurations are preferred when the device offers several.
    ///
    /// # Errors
    ///
    /// Returns error if there is no input device or it can't run at 16 kHz
    pub fn new() -> Result<Self> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let range = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .filter(supports_speech_rate)
            .min_by_key(SupportedStreamConfigRange::channels)
            .ok_or_else(|| {
                Error::Audio(format!("input device can't record at {SAMPLE_RATE} Hz"))
            })?;
        let config = range.with_sample_rate(SampleRate(SAMPLE_RATE)).config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            channels = config.channels,
            "microphone opened"
        );

        Ok(Self {
            device,
            config,
            pending: Arc::default(),
            stream: None,
        })
    }

    /// Begin recording; calling it again while recording does nothing
    ///
    /// # Errors
    ///
    /// Returns error if the input stream can't be built or started
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let pending = Arc::clone(&self.pending);
        let channels = usize::from(self.config.channels.max(1));
        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = pending.lock() {
                        downmix_into(&mut buf, data, channels);
                    }
                },
                |err| tracing::error!(error = %err, "microphone stream error"),
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;
        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("recording");
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("recording stopped");
        }
    }

    /// Everything recorded since the last drain
    #[must_use]
    pub fn drain(&self) -> Vec<f32> {
        self.pending
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    /// Throw away whatever is buffered
    pub fn discard(&self) {
        if let Ok(mut buf) = self.pending.lock() {
            buf.clear();
        }
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

fn supports_speech_rate(range: &SupportedStreamConfigRange) -> bool {
    range.min_sample_rate() <= SampleRate(SAMPLE_RATE)
        && range.max_sample_rate() >= SampleRate(SAMPLE_RATE)
}

/// Append interleaved frames to `out` as mono, averaging channels
#[allow(clippy::cast_precision_loss)]
fn downmix_into(out: &mut Vec<f32>, interleaved: &[f32], channels: usize) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.extend(
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32),
    );
}

/// Root-mean-square energy, the speech/silence gate
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let energy: f32 = samples.iter().map(|s| s * s).sum();
    (energy / samples.len() as f32).sqrt()
}

/// Largest absolute sample
#[must_use]
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0, |max, s| max.max(s.abs()))
}

#[allow(clippy::cast_possible_truncation)]
fn to_pcm16(sample: f32) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}

/// Encode mono samples as a 16-bit PCM WAV file
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let wav_err = |e: hound::Error| Error::Audio(format!("wav encoding failed: {e}"));

    let mut out = std::io::Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    let mut writer = hound::WavWriter::new(&mut out, spec).map_err(wav_err)?;
    for pcm in samples.iter().copied().map(to_pcm16) {
        writer.write_sample(pcm).map_err(wav_err)?;
    }
    writer.finalize().map_err(wav_err)?;

    Ok(out.into_inner())
}
