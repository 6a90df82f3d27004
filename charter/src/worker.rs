use crate::error::{CharterError, Result};
use crate::tempo::quick_analyze_bpm;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

/// Runs BPM analysis off the calling thread.
pub struct AnalysisWorker;

/// Pending result of one dispatched analysis; yields exactly one outcome.
pub struct AnalysisRequest {
    receiver: Receiver<Result<Option<u32>>>,
}

impl AnalysisWorker {
    pub fn dispatch(samples: Arc<[f32]>, sample_rate: u32) -> AnalysisRequest {
        Self::dispatch_with(samples, sample_rate, quick_analyze_bpm)
    }

    /// Dispatch an arbitrary analysis function
    pub fn dispatch_with<F>(samples: Arc<[f32]>, sample_rate: u32, analyze: F) -> AnalysisRequest
    where
        F: FnOnce(&[f32], u32) -> Option<u32> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("bpm-analysis".into())
            .spawn({
                let sender = sender.clone();
                move || {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| analyze(&samples, sample_rate)))
                        .map_err(|payload| CharterError::WorkerFailure(panic_message(&*payload)));
                    // The caller may have stopped caring about the result
                    let _ = sender.send(outcome);
                }
            });

        if let Err(e) = spawned {
            let _ = sender.send(Err(CharterError::WorkerFailure(format!(
                "could not spawn analysis thread: {}",
                e
            ))));
        }

        AnalysisRequest { receiver }
    }
}

impl AnalysisRequest {
    /// Block until the worker answers
    pub fn wait(self) -> Result<Option<u32>> {
        self.receiver
            .recv()
            .map_err(|_| CharterError::WorkerFailure("worker hung up without a result".into()))?
    }

    /// Non-blocking poll; `None` while the analysis is still running.
    pub fn try_result(&self) -> Option<Result<Option<u32>>> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(CharterError::WorkerFailure(
                "worker hung up without a result".into(),
            ))),
        }
    }
}

/// Analyze on a worker thread, re-running inline if the worker fails.
pub fn analyze_bpm_with_fallback(samples: Arc<[f32]>, sample_rate: u32) -> Option<u32> {
    match AnalysisWorker::dispatch(samples.clone(), sample_rate).wait() {
        Ok(bpm) => bpm,
        Err(e) => {
            log::warn!("{}; falling back to inline analysis", e);
            quick_analyze_bpm(&samples, sample_rate)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "analysis panicked".to_string()
    }
}
