//! CPAL playback engine driving a rate processor.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hopgate_core::QueueMetrics;
use std::sync::Arc;

use crate::builder::PlaybackEngineBuilder;
use crate::callback::CallbackState;
use crate::speed::SpeedController;
use crate::{Error, Result};

/// Wrapper to hold a `cpal::Stream` in a `Send` context.
///
/// `cpal::Stream` is `!Send` due to platform internals. The handle is private
/// to `PlaybackEngine` and exposes no methods on the stream.
struct StreamHandle(#[allow(dead_code)] cpal::Stream);

// SAFETY: the stream is only created in `PlaybackEngine::start` (`&mut self`)
// and dropped with the engine. `PlaybackEngine` is not `Sync`, so the stream is
// never reached from two threads at once; moving the engine moves sole
// ownership. Callers that need the stream pinned to the creating thread must
// keep the engine there, as with any CPAL stream.
unsafe impl Send for StreamHandle {}

/// Plays a [`PcmSource`](crate::PcmSource) through the rate processor on an
/// output device.
///
/// # Example
///
/// ```ignore
/// use hopgate::prelude::*;
///
/// let mut engine = PlaybackEngine::builder()
///     .memory_source(MemorySource::new(decoded))
///     .build()?;
///
/// engine.start()?;
/// engine.speed().set_speed(1.5)?;
/// ```
pub struct PlaybackEngine {
    sample_rate: f64,
    channels: usize,
    device_index: Option<usize>,
    speed: SpeedController,
    metrics: Arc<QueueMetrics>,
    state: Option<CallbackState>,
    _stream: Option<StreamHandle>,
}

impl PlaybackEngine {
    pub fn builder() -> PlaybackEngineBuilder {
        PlaybackEngineBuilder::default()
    }

    pub(crate) fn new(
        device_index: Option<usize>,
        state: CallbackState,
        speed: SpeedController,
    ) -> Result<Self> {
        let device = get_device(device_index)?;
        let config = device.default_output_config()?;

        tracing::info!(
            device = %device.name().unwrap_or_else(|_| "<unknown>".into()),
            sample_rate = config.sample_rate().0,
            channels = config.channels(),
            "opened output device"
        );

        Ok(Self {
            sample_rate: config.sample_rate().0 as f64,
            channels: config.channels() as usize,
            device_index,
            metrics: state.metrics(),
            speed,
            state: Some(state),
            _stream: None,
        })
    }

    /// Start the output stream. Calling again while running is a no-op.
    pub fn start(&mut self) -> Result<()> {
        if self._stream.is_some() {
            return Ok(());
        }
        let state = self.state.take().ok_or_else(|| {
            Error::InvalidConfig("callback state already handed to a stream".into())
        })?;

        let device = get_device(self.device_index)?;
        let config = device.default_output_config()?;

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config.into(), state)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config.into(), state)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config.into(), state)?,
            format => {
                return Err(Error::InvalidConfig(format!(
                    "Unsupported sample format: {format:?}"
                )));
            }
        };

        stream.play()?;
        self._stream = Some(StreamHandle(stream));
        tracing::info!("output stream started");

        Ok(())
    }

    pub fn speed(&self) -> &SpeedController {
        &self.speed
    }

    pub fn metrics(&self) -> Arc<QueueMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn is_running(&self) -> bool {
        self._stream.is_some()
    }

    pub fn device_name(&self) -> Result<String> {
        Ok(get_device(self.device_index)?.name()?)
    }

    pub fn list_output_devices() -> Result<Vec<String>> {
        cpal::default_host()
            .output_devices()?
            .enumerate()
            .map(|(i, d)| Ok(format!("{i}: {}", d.name()?)))
            .collect()
    }
}

fn get_device(index: Option<usize>) -> Result<cpal::Device> {
    let host = cpal::default_host();

    match index {
        Some(i) => {
            let devices: Vec<_> = host.output_devices()?.collect();
            let count = devices.len();
            devices.into_iter().nth(i).ok_or_else(|| {
                Error::InvalidDevice(format!("Device index {i} out of range ({count} available)"))
            })
        }
        None => host
            .default_output_device()
            .ok_or_else(|| Error::InvalidDevice("No output device available".into())),
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut state: CallbackState,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;

    // Grows on the first callback, then stable
    let mut output_f32 = Vec::<f32>::new();

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                if output_f32.len() < data.len() {
                    output_f32.resize(data.len(), 0.0);
                }
                let output = &mut output_f32[..data.len()];
                state.process_interleaved(output, channels);
                write_output(data, output);
            }));

            if result.is_err() {
                output_silence(data);
            }
        },
        |err| tracing::error!(%err, "output stream error"),
        None,
    )?;

    Ok(stream)
}

/// Convert f32 to the device format.
#[inline]
fn write_output<T: cpal::SizedSample + cpal::FromSample<f32>>(data: &mut [T], output: &[f32]) {
    for (sample, &value) in data.iter_mut().zip(output) {
        *sample = T::from_sample(value);
    }
}

/// Output silence (panic recovery).
#[inline]
fn output_silence<T: cpal::SizedSample + cpal::FromSample<f32>>(data: &mut [T]) {
    for sample in data.iter_mut() {
        *sample = T::from_sample(0.0);
    }
}
