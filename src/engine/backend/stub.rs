//! Deterministic stub backend (generalizes spec §4.E to hosts without a real
//! audio device): drives `SynthState` on a background thread at real time,
//! broadcasting the same ticks/bar-changes a live device would, but without
//! touching any hardware. Used whenever the crate is built without the
//! `desktop` feature, and by tests that want a running engine without a
//! sound card.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::engine::callback::SynthState;
use crate::error::EngineError;

use super::{AudioBackend, EngineStartContext};

const STUB_SAMPLE_RATE: u32 = 48_000;
const STUB_CHUNK_FRAMES: usize = 256;

pub struct StubBackend {
    shutdown_flag: Arc<AtomicBool>,
    test_tick: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    running: AtomicBool,
    stop_timeout_ms: Mutex<u64>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            test_tick: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
            running: AtomicBool::new(false),
            stop_timeout_ms: Mutex::new(1200),
        }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for StubBackend {
    fn start(&self, ctx: EngineStartContext) -> Result<(), EngineError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AudioUnavailable {
                details: "stub backend already running".to_string(),
            });
        }

        self.shutdown_flag.store(false, Ordering::SeqCst);
        *self.stop_timeout_ms.lock().unwrap() = ctx.synth.stop_timeout_ms;

        let shutdown_flag = Arc::clone(&self.shutdown_flag);
        let test_tick = Arc::clone(&self.test_tick);
        let mut synth = SynthState::new(
            ctx.initial_config,
            Arc::clone(&ctx.pending),
            Arc::clone(&ctx.gains),
            Arc::clone(&test_tick),
            STUB_SAMPLE_RATE,
            ctx.synth.click_duration_ms,
            ctx.tick_tx,
            ctx.bar_change_tx,
        );

        let handle = thread::spawn(move || {
            let chunk_duration =
                Duration::from_secs_f64(STUB_CHUNK_FRAMES as f64 / STUB_SAMPLE_RATE as f64);
            while !shutdown_flag.load(Ordering::Relaxed) {
                for _ in 0..STUB_CHUNK_FRAMES {
                    let _ = synth.next_sample();
                }
                thread::sleep(chunk_duration);
            }
        });

        *self.worker.lock().unwrap() = Some(handle);
        Ok(())
    }

    fn stop(&self) -> Result<(), EngineError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.shutdown_flag.store(true, Ordering::SeqCst);

        let handle = self.worker.lock().unwrap().take();
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
