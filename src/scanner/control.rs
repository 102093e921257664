use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::error::{Result, ScanError};
use crate::models::{ControlResponse, RunState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ControlState {
    run: RunState,
    stop_requested: bool,
    paused: bool,
}

/// Cloneable handle for observing and steering one controller's runs.
///
/// Run state and the stop/pause flags share a single watch channel so a new
/// run can reset the flags in the same step that marks it running. A paused
/// worker parks on the channel instead of polling.
#[derive(Clone)]
pub struct ScanControl {
    inner: Arc<watch::Sender<ControlState>>,
}

impl Default for ScanControl {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanControl {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ControlState {
            run: RunState::Idle,
            stop_requested: false,
            paused: false,
        });
        Self { inner: Arc::new(tx) }
    }

    pub fn state(&self) -> RunState {
        self.inner.borrow().run
    }

    pub fn is_paused(&self) -> bool {
        self.inner.borrow().paused
    }

    pub fn stop_requested(&self) -> bool {
        self.inner.borrow().stop_requested
    }

    /// Receiver that yields every run-state change.
    pub fn subscribe_state(&self) -> watch::Receiver<RunState> {
        let mut control = self.inner.subscribe();
        let (tx, rx) = watch::channel(control.borrow_and_update().run);
        tokio::spawn(async move {
            while control.changed().await.is_ok() {
                let run = control.borrow_and_update().run;
                if tx.send(run).is_err() {
                    break;
                }
            }
        });
        rx
    }

    pub fn request_stop(&self) -> ControlResponse {
        let accepted = self.inner.send_if_modified(|c| {
            if !c.run.is_active() {
                return false;
            }
            let changed = !c.stop_requested;
            c.stop_requested = true;
            changed
        }) || self.state().is_active();

        if accepted {
            tracing::info!("stop requested");
            ControlResponse::accepted("Scan stopping requested")
        } else {
            ControlResponse::nothing_to("stop")
        }
    }

    pub fn request_pause(&self) -> ControlResponse {
        let mut active = false;
        self.inner.send_if_modified(|c| {
            active = c.run.is_active();
            if !active || c.paused {
                return false;
            }
            c.paused = true;
            true
        });

        if active {
            tracing::info!("pause requested");
            ControlResponse::accepted("Scan paused")
        } else {
            ControlResponse::nothing_to("pause")
        }
    }

    pub fn request_resume(&self) -> ControlResponse {
        let mut active = false;
        self.inner.send_if_modified(|c| {
            active = c.run.is_active();
            if !active || !c.paused {
                return false;
            }
            c.paused = false;
            if c.run == RunState::Paused {
                c.run = RunState::Running;
            }
            true
        });

        if active {
            tracing::info!("resume requested");
            ControlResponse::accepted("Scan resumed")
        } else {
            ControlResponse::nothing_to("resume")
        }
    }

    /// Enters `Running` with cleared flags, unless a run is already active.
    pub(crate) fn begin(&self) -> Result<()> {
        let started = self.inner.send_if_modified(|c| {
            if c.run.is_active() {
                return false;
            }
            *c = ControlState {
                run: RunState::Running,
                stop_requested: false,
                paused: false,
            };
            true
        });

        if started {
            Ok(())
        } else {
            Err(ScanError::AlreadyRunning)
        }
    }

    pub(crate) fn finish(&self, state: RunState) {
        self.inner.send_modify(|c| {
            c.run = state;
            c.paused = false;
        });
    }

    /// Parks while paused. Returns `true` if a stop was requested.
    pub(crate) async fn wait_while_paused(&self) -> bool {
        let mut rx = self.inner.subscribe();
        let mut parked = false;

        let stopped = loop {
            let current = *rx.borrow_and_update();
            if current.stop_requested {
                break true;
            }
            if !current.paused {
                break false;
            }
            if !parked {
                parked = true;
                self.inner.send_if_modified(|c| {
                    if c.paused && c.run == RunState::Running {
                        c.run = RunState::Paused;
                        true
                    } else {
                        false
                    }
                });
                tracing::info!("scan paused");
            }
            if rx.changed().await.is_err() {
                break true;
            }
        };

        if parked && !stopped {
            self.inner.send_if_modified(|c| {
                if c.run == RunState::Paused {
                    c.run = RunState::Running;
                    true
                } else {
                    false
                }
            });
            tracing::info!("scan resumed");
        }

        stopped
    }

    /// Sleeps for `delay` unless a stop arrives first. Returns `true` on stop.
    pub(crate) async fn sleep_or_stop(&self, delay: Duration) -> bool {
        let mut rx = self.inner.subscribe();
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            if rx.borrow_and_update().stop_requested {
                return true;
            }
            tokio::select! {
                _ = &mut sleep => return self.stop_requested(),
                changed = rx.changed() => {
                    if changed.is_err() {
                        return true;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signals_without_run_are_noops() {
        let control = ScanControl::new();
        assert!(!control.request_stop().accepted);
        assert_eq!(control.request_pause().message, "nothing to pause");
        assert!(!control.request_resume().accepted);
        assert_eq!(control.state(), RunState::Idle);
    }

    #[test]
    fn test_begin_resets_flags_and_rejects_second_start() {
        let control = ScanControl::new();
        control.begin().unwrap();
        control.request_pause();
        control.request_stop();
        assert!(matches!(control.begin(), Err(ScanError::AlreadyRunning)));

        control.finish(RunState::Stopped);
        assert!(!control.request_stop().accepted);
        control.begin().unwrap();
        assert!(!control.stop_requested());
        assert!(!control.is_paused());
        assert_eq!(control.state(), RunState::Running);
    }

    #[test]
    fn test_signals_are_idempotent() {
        let control = ScanControl::new();
        control.begin().unwrap();
        assert!(control.request_pause().accepted);
        assert!(control.request_pause().accepted);
        assert!(control.is_paused());
        assert!(control.request_resume().accepted);
        assert!(control.request_resume().accepted);
        assert!(!control.is_paused());
        assert!(control.request_stop().accepted);
        assert!(control.request_stop().accepted);
        assert!(control.stop_requested());
    }

    #[tokio::test]
    async fn test_pause_parks_until_resume() {
        let control = ScanControl::new();
        control.begin().unwrap();
        control.request_pause();

        let worker = control.clone();
        let handle = tokio::spawn(async move { worker.wait_while_paused().await });

        let mut states = control.subscribe_state();
        states.wait_for(|s| *s == RunState::Paused).await.unwrap();
        control.request_resume();

        assert!(!handle.await.unwrap());
        assert_eq!(control.state(), RunState::Running);
    }

    #[tokio::test]
    async fn test_stop_while_paused() {
        let control = ScanControl::new();
        control.begin().unwrap();
        control.request_pause();

        let worker = control.clone();
        let handle = tokio::spawn(async move { worker.wait_while_paused().await });

        let mut states = control.subscribe_state();
        states.wait_for(|s| *s == RunState::Paused).await.unwrap();
        control.request_stop();

        assert!(handle.await.unwrap());
    }

    #[tokio::test]
    async fn test_sleep_interrupted_by_stop() {
        let control = ScanControl::new();
        control.begin().unwrap();

        let worker = control.clone();
        let handle = tokio::spawn(async move { worker.sleep_or_stop(Duration::from_secs(3600)).await });
        tokio::task::yield_now().await;
        control.request_stop();

        let stopped = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
        assert!(stopped);
    }
}
