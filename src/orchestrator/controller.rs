//! Run lifecycle controller.
//!
//! Maps UI commands onto the tracker and reports rejected commands back to presentation layers.

use crate::model::{InfoEvent, PositionSample, RunRecord, RunStatus, TrackerEvent};
use crate::tracker::{RunTracker, TrackerError};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::{Duration, Instant};
use tracing::{debug, info};

/// Commands emitted by UI layers to control the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UiCommand {
    Start,
    TogglePause,
    Stop,
    Reset,
    Quit,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ControllerOptions {
    pub auto_start: bool,
    /// Stop the run once it has been active this long.
    pub stop_after: Option<Duration>,
    /// Leave the loop as soon as a run finishes.
    pub quit_on_finish: bool,
}

/// A finished run and the readings it was built from.
#[derive(Debug, Clone)]
pub(crate) struct FinishedRun {
    pub record: RunRecord,
    pub samples: Vec<PositionSample>,
    /// The run was still open when the controller was told to quit.
    pub stopped_on_quit: bool,
}

/// When the active run reaches `limit`, if it is running at all.
fn stop_deadline(tracker: &RunTracker, limit: Option<Duration>) -> Option<Instant> {
    let limit = limit?;
    let snap = tracker.snapshot();
    (snap.status == RunStatus::Running)
        .then(|| Instant::now() + limit.saturating_sub(Duration::from_millis(snap.elapsed_ms)))
}

fn apply(
    tracker: &mut RunTracker,
    cmd: UiCommand,
    event_tx: &UnboundedSender<TrackerEvent>,
    last: &mut Option<FinishedRun>,
) {
    debug!(?cmd, status = %tracker.status(), "ui command");
    let res = match cmd {
        UiCommand::Start => tracker.start(),
        UiCommand::TogglePause => match tracker.status() {
            RunStatus::Paused => tracker.resume(),
            _ => tracker.pause(),
        },
        UiCommand::Stop => match tracker.stop() {
            Ok(record) => {
                *last = Some(FinishedRun {
                    record,
                    samples: tracker.samples(),
                    stopped_on_quit: false,
                });
                Ok(())
            }
            Err(e) => Err(e),
        },
        UiCommand::Reset => {
            tracker.reset();
            *last = None;
            Ok(())
        }
        UiCommand::Quit => Ok(()),
    };

    if let Err(TrackerError::InvalidTransition { op, from }) = res {
        let _ = event_tx.send(TrackerEvent::Info(InfoEvent::Rejected {
            op: op.as_str(),
            status: from,
        }));
    }
}

/// Drive `tracker` from UI commands until quit. Returns the last finished run that was not
/// reset away.
///
/// Quitting with a run still open stops it first so its record is not lost.
pub(crate) async fn run_controller(
    mut tracker: RunTracker,
    opts: ControllerOptions,
    event_tx: UnboundedSender<TrackerEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Option<FinishedRun> {
    let mut last = None;
    if opts.auto_start {
        apply(&mut tracker, UiCommand::Start, &event_tx, &mut last);
    }

    loop {
        if opts.quit_on_finish && last.is_some() {
            break;
        }
        let deadline = stop_deadline(&tracker, opts.stop_after);

        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Quit) | None => {
                        if matches!(tracker.status(), RunStatus::Running | RunStatus::Paused) {
                            apply(&mut tracker, UiCommand::Stop, &event_tx, &mut last);
                            if let Some(run) = last.as_mut() {
                                run.stopped_on_quit = true;
                            }
                        }
                        break;
                    }
                    Some(cmd) => apply(&mut tracker, cmd, &event_tx, &mut last),
                }
            }
            _ = async {
                match deadline {
                    Some(d) => tokio::time::sleep_until(d).await,
                    None => futures::future::pending().await,
                }
            } => {
                info!("run duration reached");
                let _ = event_tx.send(TrackerEvent::Info(InfoEvent::Message(
                    "Duration reached, stopping run".into(),
                )));
                apply(&mut tracker, UiCommand::Stop, &event_tx, &mut last);
            }
        }
    }

    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrackerConfig;
    use crate::provider::{SimulatedRoute, SyntheticProvider, UnavailableProvider};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn drain(rx: &mut UnboundedReceiver<TrackerEvent>) -> Vec<TrackerEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn duration_limit_finishes_the_run() {
        let route = SimulatedRoute {
            points: 30,
            seed: 1,
            ..Default::default()
        };
        let provider = Arc::new(SyntheticProvider::new(route.script()));
        let (evt_tx, mut evt_rx) = mpsc::unbounded_channel();
        let (_cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let tracker =
            RunTracker::new(provider.clone(), TrackerConfig::default()).with_events(evt_tx.clone());

        let opts = ControllerOptions {
            auto_start: true,
            stop_after: Some(Duration::from_millis(5200)),
            quit_on_finish: true,
        };
        let run = run_controller(tracker, opts, evt_tx, cmd_rx)
            .await
            .expect("run finishes");

        assert_eq!(run.record.duration_sec, 5);
        assert_eq!(run.samples.len(), 6);
        assert!(run.record.distance_km > 0.0);
        assert!(drain(&mut evt_rx)
            .iter()
            .any(|ev| matches!(ev, TrackerEvent::Finished { .. })));
    }

    #[tokio::test]
    async fn rejected_commands_are_reported() {
        let (evt_tx, mut evt_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let tracker = RunTracker::new(Arc::new(UnavailableProvider), TrackerConfig::default());

        cmd_tx.send(UiCommand::TogglePause).unwrap();
        cmd_tx.send(UiCommand::Stop).unwrap();
        cmd_tx.send(UiCommand::Quit).unwrap();
        let run = run_controller(tracker, ControllerOptions::default(), evt_tx, cmd_rx).await;
        assert!(run.is_none());

        let messages: Vec<String> = drain(&mut evt_rx)
            .into_iter()
            .filter_map(|ev| match ev {
                TrackerEvent::Info(info) => Some(info.to_message()),
                _ => None,
            })
            .collect();
        assert_eq!(
            messages,
            vec!["Cannot pause while idle", "Cannot stop while idle"]
        );
    }

    #[tokio::test]
    async fn commands_drive_the_lifecycle() {
        let (evt_tx, mut evt_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let tracker = RunTracker::new(Arc::new(UnavailableProvider), TrackerConfig::default())
            .with_events(evt_tx.clone());

        for cmd in [
            UiCommand::Start,
            UiCommand::TogglePause,
            UiCommand::TogglePause,
            UiCommand::Stop,
            UiCommand::Reset,
            UiCommand::Quit,
        ] {
            cmd_tx.send(cmd).unwrap();
        }
        let run = run_controller(tracker, ControllerOptions::default(), evt_tx, cmd_rx).await;
        assert!(run.is_none(), "reset discards the finished run");

        let statuses: Vec<RunStatus> = drain(&mut evt_rx)
            .into_iter()
            .filter_map(|ev| match ev {
                TrackerEvent::StatusChanged { status } => Some(status),
                _ => None,
            })
            .collect();
        assert_eq!(
            statuses,
            vec![
                RunStatus::Running,
                RunStatus::Paused,
                RunStatus::Running,
                RunStatus::Finished,
                RunStatus::Idle
            ]
        );
    }

    #[tokio::test]
    async fn quitting_mid_run_keeps_the_record() {
        let (evt_tx, _evt_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let tracker = RunTracker::new(Arc::new(UnavailableProvider), TrackerConfig::default());
        cmd_tx.send(UiCommand::Start).unwrap();
        drop(cmd_tx);

        let run = run_controller(tracker, ControllerOptions::default(), evt_tx, cmd_rx).await;
        assert!(run.expect("record kept").stopped_on_quit);
    }

    #[tokio::test]
    async fn quitting_after_stop_returns_the_run_as_already_finished() {
        let (evt_tx, _evt_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let tracker = RunTracker::new(Arc::new(UnavailableProvider), TrackerConfig::default());
        for cmd in [UiCommand::Start, UiCommand::Stop, UiCommand::Quit] {
            cmd_tx.send(cmd).unwrap();
        }

        let run = run_controller(tracker, ControllerOptions::default(), evt_tx, cmd_rx).await;
        assert!(!run.expect("finished run").stopped_on_quit);
    }
}
