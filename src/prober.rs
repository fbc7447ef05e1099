use std::any::Any;
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::{self, JoinError};
use tracing::{debug, info};

use crate::diagnose::{classify_exception, classify_outcome, PingResult};
use crate::error::{ProbeBusy, ProbeFailure};
use crate::host::validate;
use crate::runner::{ProbeConfig, ProbeRunner};

/// Where a probe currently is. Input is only accepted while `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Idle,
    Validating,
    Running,
    Classified,
}

/// Validates a target, runs `ping` on a worker task and classifies what came back.
///
/// At most one probe is in flight per `Prober`.
pub struct Prober {
    runner: ProbeRunner,
    state: Arc<watch::Sender<ProbeState>>,
}

impl Prober {
    pub fn new(config: &ProbeConfig) -> Self {
        let (state, _) = watch::channel(ProbeState::Idle);
        Self {
            runner: ProbeRunner::new(config),
            state: Arc::new(state),
        }
    }

    #[allow(dead_code)]
    pub fn state(&self) -> ProbeState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProbeState> {
        self.state.subscribe()
    }

    /// Starts a probe in the background and returns where its result will land.
    ///
    /// The state stays `Classified` until the returned [`Delivered`] result has
    /// been dropped. If the pending probe is dropped first, the result is
    /// discarded silently.
    pub fn dispatch(&self, raw: &str) -> Result<PendingProbe, ProbeBusy> {
        let claimed = self.state.send_if_modified(|state| {
            if *state == ProbeState::Idle {
                *state = ProbeState::Validating;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(ProbeBusy);
        }

        let (reply, rx) = oneshot::channel();
        let runner = self.runner.clone();
        let state = Arc::clone(&self.state);
        let raw = raw.to_string();

        tokio::spawn(async move {
            let mut release = ReleaseOnDrop {
                state: Arc::clone(&state),
                armed: true,
            };

            let result = execute(&runner, &raw, &state).await;
            state.send_replace(ProbeState::Classified);

            match reply.send(result) {
                Ok(()) => release.armed = false,
                Err(_) => {
                    // 接收方已关闭，结果直接丢弃
                    debug!(input = %raw, "receiver is gone, dropping probe result");
                }
            }
        });

        Ok(PendingProbe {
            rx: Some(rx),
            state: Arc::clone(&self.state),
        })
    }

    /// Probes `raw` and waits for the result.
    pub async fn probe(&self, raw: &str) -> Result<Delivered, ProbeBusy> {
        Ok(self.dispatch(raw)?.recv().await)
    }
}

/// A dispatched probe whose result has not been received yet.
pub struct PendingProbe {
    rx: Option<oneshot::Receiver<PingResult>>,
    state: Arc<watch::Sender<ProbeState>>,
}

impl PendingProbe {
    pub async fn recv(mut self) -> Delivered {
        let received = match self.rx.as_mut() {
            Some(rx) => rx.await.ok(),
            None => None,
        };
        self.rx = None;

        Delivered {
            result: received.unwrap_or_else(|| render_failure(&ProbeFailure::Interrupted)),
            state: Arc::clone(&self.state),
        }
    }
}

impl Drop for PendingProbe {
    fn drop(&mut self) {
        if let Some(mut rx) = self.rx.take() {
            // After close() the worker can no longer hand the result over and
            // releases the slot itself. A result that already arrived is ours.
            rx.close();
            if rx.try_recv().is_ok() {
                release_classified(&self.state);
            }
        }
    }
}

/// A received result. The prober accepts new input once this is dropped,
/// which the caller does after rendering it.
#[derive(Debug)]
pub struct Delivered {
    result: PingResult,
    state: Arc<watch::Sender<ProbeState>>,
}

impl Deref for Delivered {
    type Target = PingResult;

    fn deref(&self) -> &PingResult {
        &self.result
    }
}

impl Drop for Delivered {
    fn drop(&mut self) {
        release_classified(&self.state);
    }
}

// Worker-side release for results that never reached a receiver.
struct ReleaseOnDrop {
    state: Arc<watch::Sender<ProbeState>>,
    armed: bool,
}

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.state.send_replace(ProbeState::Idle);
        }
    }
}

fn release_classified(state: &watch::Sender<ProbeState>) {
    state.send_if_modified(|state| {
        if *state == ProbeState::Classified {
            *state = ProbeState::Idle;
            true
        } else {
            false
        }
    });
}

async fn execute(runner: &ProbeRunner, raw: &str, state: &watch::Sender<ProbeState>) -> PingResult {
    let target = match validate(raw).await {
        Ok(target) => target,
        Err(kind) => {
            info!(input = raw, "target rejected");
            return PingResult::from(kind);
        }
    };

    state.send_replace(ProbeState::Running);

    let worker_runner = runner.clone();
    let worker = task::spawn(async move { worker_runner.run(&target).await });
    let outcome = match worker.await {
        Ok(outcome) => outcome,
        Err(e) => Err(join_failure(e)),
    };

    match outcome {
        Ok(outcome) => classify_outcome(&outcome),
        Err(failure) => render_failure(&failure),
    }
}

fn render_failure(failure: &ProbeFailure) -> PingResult {
    PingResult::from(classify_exception(failure))
}

fn join_failure(e: JoinError) -> ProbeFailure {
    if e.is_cancelled() {
        return ProbeFailure::Interrupted;
    }
    match e.try_into_panic() {
        Ok(payload) => ProbeFailure::Other(panic_message(payload.as_ref())),
        Err(e) => ProbeFailure::Other(e.to_string()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::new()
    }
}
