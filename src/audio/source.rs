//! Microphone access
//!
//! An [`AudioSource`] opens an input device and streams mono samples into a
//! [`SampleSink`]. The returned guard keeps the device open; dropping it
//! releases the device. Guards are created and dropped on the capture
//! thread.

use super::resampler::{downmix, f32_to_i16};
use super::types::AudioCaptureError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// Keeps an input device open until dropped
pub(crate) trait DeviceGuard {}

/// An opened input device
pub(crate) struct OpenDevice {
    /// Native sample rate of the delivered samples
    pub(crate) sample_rate: u32,
    pub(crate) guard: Box<dyn DeviceGuard>,
}

/// Something that can capture microphone audio
pub(crate) trait AudioSource: Send + Sync {
    fn open(&self, sink: SampleSink) -> Result<OpenDevice, AudioCaptureError>;
}

/// Shared buffer of mono 16-bit samples filled by the device callback
#[derive(Debug, Clone, Default)]
pub(crate) struct SampleSink {
    samples: Arc<Mutex<Vec<i16>>>,
}

impl SampleSink {
    pub(crate) fn push_i16(&self, data: &[i16], channels: usize) {
        let mono = downmix(data, channels);
        match self.samples.lock() {
            Ok(mut samples) => samples.extend_from_slice(&mono),
            Err(e) => error!("Sample buffer poisoned: {}", e),
        }
    }

    pub(crate) fn push_f32(&self, data: &[f32], channels: usize) {
        let converted: Vec<i16> = data.iter().map(|&s| f32_to_i16(s)).collect();
        self.push_i16(&converted, channels);
    }

    /// Take everything captured so far
    pub(crate) fn take(&self) -> Vec<i16> {
        match self.samples.lock() {
            Ok(mut samples) => std::mem::take(&mut *samples),
            Err(e) => {
                error!("Sample buffer poisoned: {}", e);
                Vec::new()
            }
        }
    }
}

/// The default system microphone via cpal
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CpalMicrophone;

struct CpalStream {
    _stream: cpal::Stream,
}

impl DeviceGuard for CpalStream {}

impl AudioSource for CpalMicrophone {
    fn open(&self, sink: SampleSink) -> Result<OpenDevice, AudioCaptureError> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or(AudioCaptureError::NoInputDevice)?;

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("Using audio input device: {}", device_name);

        let supported = device.default_input_config()?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let sample_rate = config.sample_rate.0;
        let channels = config.channels as usize;

        if channels == 0 {
            return Err(AudioCaptureError::DeviceAccess(format!(
                "{} reports no input channels",
                device_name
            )));
        }

        info!("Audio config: {} channels, {} Hz", channels, sample_rate);

        let err_callback = |err| {
            error!("Audio stream error: {}", err);
        };

        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _| sink.push_i16(data, channels),
                err_callback,
                None,
            )?,
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _| sink.push_f32(data, channels),
                err_callback,
                None,
            )?,
            format => {
                warn!("Unsupported sample format: {:?}", format);
                return Err(AudioCaptureError::UnsupportedFormat(format!("{:?}", format)));
            }
        };

        stream.play()?;
        info!("Audio capture started");

        Ok(OpenDevice {
            sample_rate,
            guard: Box::new(CpalStream { _stream: stream }),
        })
    }
}
