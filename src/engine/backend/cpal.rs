//! CPAL-based push synthesizer for desktop platforms (spec §4.E).
//!
//! CPAL's `Stream` is not `Send`, so a dedicated thread owns it end to end:
//! built, played, and kept alive by a sleep-poll loop until `shutdown_flag`
//! is set, exactly the teacher's input-capture thread shape repurposed for
//! output.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;

use crate::engine::callback::SynthState;
use crate::error::EngineError;
use crate::managers::StateEvent;
use crate::model::State;

use super::{AudioBackend, EngineStartContext};

pub struct CpalBackend {
    shutdown_flag: Arc<AtomicBool>,
    test_tick: Arc<AtomicBool>,
    stream_thread: Mutex<Option<JoinHandle<()>>>,
    running: AtomicBool,
    stop_timeout_ms: Mutex<u64>,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self {
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            test_tick: Arc::new(AtomicBool::new(false)),
            stream_thread: Mutex::new(None),
            running: AtomicBool::new(false),
            stop_timeout_ms: Mutex::new(1200),
        }
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn start(&self, ctx: EngineStartContext) -> Result<(), EngineError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AudioUnavailable {
                details: "push synthesizer already running".to_string(),
            });
        }

        self.shutdown_flag.store(false, Ordering::SeqCst);
        *self.stop_timeout_ms.lock().unwrap() = ctx.synth.stop_timeout_ms;

        let shutdown_flag = Arc::clone(&self.shutdown_flag);
        let test_tick = Arc::clone(&self.test_tick);
        let synth_cfg = ctx.synth.clone();
        let initial_config = ctx.initial_config.clone();
        let pending = Arc::clone(&ctx.pending);
        let gains = Arc::clone(&ctx.gains);
        let tick_tx = ctx.tick_tx.clone();
        let bar_change_tx = ctx.bar_change_tx.clone();
        let state_tx = ctx.state_tx.clone();

        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), EngineError>>();

        let stream_handle = thread::spawn(move || {
            let host = cpal::default_host();
            let device = match host.default_output_device() {
                Some(d) => d,
                None => {
                    let _ = ready_tx.send(Err(EngineError::AudioUnavailable {
                        details: "no output device available".to_string(),
                    }));
                    return;
                }
            };

            let supported_config = match device.default_output_config() {
                Ok(c) => c,
                Err(e) => {
                    let _ = ready_tx.send(Err(EngineError::AudioUnavailable {
                        details: format!("failed to get default output config: {e}"),
                    }));
                    return;
                }
            };

            let sample_rate = supported_config.sample_rate().0;
            let channels = supported_config.channels() as usize;
            let stream_config = cpal::StreamConfig {
                channels: supported_config.channels(),
                sample_rate: supported_config.sample_rate(),
                buffer_size: cpal::BufferSize::Fixed(synth_cfg.buffer_frames as u32),
            };

            let mut synth = SynthState::new(
                initial_config,
                pending,
                gains,
                test_tick,
                sample_rate,
                synth_cfg.click_duration_ms,
                tick_tx,
                bar_change_tx,
            );

            let shutdown_on_error = Arc::clone(&shutdown_flag);
            let error_state_tx = state_tx.clone();
            let err_fn = move |err: cpal::StreamError| {
                log::error!("[CpalBackend] output stream error: {err}");
                let _ = error_state_tx.send(StateEvent {
                    state: State::Error,
                    detail: Some(err.to_string()),
                });
                shutdown_on_error.store(true, Ordering::SeqCst);
            };

            let stream = match supported_config.sample_format() {
                SampleFormat::I16 => device.build_output_stream(
                    &stream_config,
                    move |data: &mut [i16], _| {
                        for frame in data.chunks_mut(channels) {
                            let sample = synth.next_sample();
                            for slot in frame.iter_mut() {
                                *slot = sample;
                            }
                        }
                    },
                    err_fn,
                    None,
                ),
                SampleFormat::F32 => device.build_output_stream(
                    &stream_config,
                    move |data: &mut [f32], _| {
                        for frame in data.chunks_mut(channels) {
                            let sample = synth.next_sample() as f32 / i16::MAX as f32;
                            for slot in frame.iter_mut() {
                                *slot = sample;
                            }
                        }
                    },
                    err_fn,
                    None,
                ),
                other => {
                    let _ = ready_tx.send(Err(EngineError::AudioUnavailable {
                        details: format!("unsupported output sample format: {other:?}"),
                    }));
                    return;
                }
            };

            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    let _ = ready_tx.send(Err(EngineError::AudioUnavailable {
                        details: format!("failed to build output stream: {e}"),
                    }));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(EngineError::AudioUnavailable {
                    details: format!("failed to start output stream: {e}"),
                }));
                return;
            }

            let _ = ready_tx.send(Ok(()));

            while !shutdown_flag.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(50));
            }
        });

        match ready_rx.recv_timeout(Duration::from_secs(5)) {
            Ok(Ok(())) => {
                *self.stream_thread.lock().unwrap() = Some(stream_handle);
                Ok(())
            }
            Ok(Err(e)) => {
                self.running.store(false, Ordering::SeqCst);
                Err(e)
            }
            Err(_) => {
                self.running.store(false, Ordering::SeqCst);
                Err(EngineError::AudioUnavailable {
                    details: "timed out waiting for output stream to start".to_string(),
                })
            }
        }
    }

    fn stop(&self) -> Result<(), EngineError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        self.shutdown_flag.store(true, Ordering::SeqCst);

        let handle = self.stream_thread.lock().unwrap().take();
        let Some(handle) = handle else {
            return Ok(());
        };

        let timeout = Duration::from_millis(*self.stop_timeout_ms.lock().unwrap());
        let (done_tx, done_rx) = std::sync::mpsc::channel();
        thread::spawn(move || {
            let _ = handle.join();
            let _ = done_tx.send(());
        });

        if done_rx.recv_timeout(timeout).is_err() {
            return Err(EngineError::StopTimeout);
        }
        Ok(())
    }

    fn play_test_tick(&self) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            return false;
        }
        self.test_tick.store(true, Ordering::SeqCst);
        true
    }
}
