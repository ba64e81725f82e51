//! Replays a recorded trace through a [`NavigationSession`].
//!
//! Frames are pushed through a single `tokio` channel into one task that owns
//! the session, so evaluations never overlap.

use crate::config::{CameraConfig, NavigationOptions};
use crate::error::{NavError, Result};
use crate::models::{CameraPose, DirectionsRoute, LocationFix, RouteProgress};
use crate::services::camera::CameraUpdate;
use crate::services::off_route::OffRouteDecision;
use crate::session::NavigationSession;
use serde::{Deserialize, Serialize};
use std::path::Path;
use time::OffsetDateTime;
use tokio::sync::mpsc;

const DISPATCH_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Deserialize)]
pub struct Trace {
    pub route: DirectionsRoute,
    #[serde(default)]
    pub options: Option<NavigationOptions>,
    #[serde(default)]
    pub camera: Option<CameraConfig>,
    /// What the map shows before the route starts
    #[serde(default)]
    pub initial_camera: Option<CameraPose>,
    pub frames: Vec<TraceFrame>,
    #[serde(default)]
    pub events: Vec<TraceEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraceFrame {
    pub fix: LocationFix,
    pub progress: RouteProgress,
}

/// A user/renderer event applied right before frame `at_frame`
#[derive(Debug, Clone, Deserialize)]
pub struct TraceEvent {
    pub at_frame: usize,
    pub kind: TraceEventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEventKind {
    DisableTracking,
    EnableTracking,
    TransitionCompleted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayReport {
    RouteStarted {
        camera: CameraUpdate,
    },
    Location {
        frame: usize,
        decision: OffRouteDecision,
        camera: Option<CameraUpdate>,
    },
    Dropped {
        frame: usize,
        error: String,
    },
    Event {
        kind: TraceEventKind,
        camera: Option<CameraUpdate>,
    },
}

enum SessionCommand {
    StartRoute(DirectionsRoute, OffsetDateTime),
    Location(usize, Box<TraceFrame>),
    Event(TraceEventKind, OffsetDateTime),
}

impl Trace {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Replay `trace`. Options embedded in the trace win over the ones passed in.
pub async fn replay(
    trace: Trace,
    options: NavigationOptions,
    camera: CameraConfig,
) -> Result<Vec<ReplayReport>> {
    let mut session = NavigationSession::new(
        trace.options.clone().unwrap_or(options),
        trace.camera.clone().unwrap_or(camera),
    )?;
    if let Some(pose) = trace.initial_camera {
        session = session.with_camera_pose(pose);
    }

    let (tx, rx) = mpsc::channel(DISPATCH_QUEUE_CAPACITY);
    let worker = tokio::spawn(run_session(session, rx));

    let mut send_error = None;
    for command in commands(trace) {
        // A closed queue means the worker bailed out; its result says why
        if let Err(e) = tx.send(command).await {
            send_error = Some(e.to_string());
            break;
        }
    }
    drop(tx);

    let reports = worker
        .await
        .map_err(|e| NavError::Dispatch(e.to_string()))??;
    match send_error {
        Some(reason) => Err(NavError::Dispatch(reason)),
        None => Ok(reports),
    }
}

fn commands(trace: Trace) -> Vec<SessionCommand> {
    let start_at = trace
        .frames
        .first()
        .map(|f| f.fix.timestamp)
        .unwrap_or_else(OffsetDateTime::now_utc);

    let mut commands = vec![SessionCommand::StartRoute(trace.route, start_at)];
    let mut events = trace.events;
    events.sort_by_key(|e| e.at_frame);
    let mut events = events.into_iter().peekable();
    let mut last_at = start_at;

    for (index, frame) in trace.frames.into_iter().enumerate() {
        while let Some(event) = events.next_if(|e| e.at_frame <= index) {
            commands.push(SessionCommand::Event(event.kind, frame.fix.timestamp));
        }
        last_at = frame.fix.timestamp;
        commands.push(SessionCommand::Location(index, Box::new(frame)));
    }
    for event in events {
        commands.push(SessionCommand::Event(event.kind, last_at));
    }

    commands
}

async fn run_session(
    mut session: NavigationSession,
    mut rx: mpsc::Receiver<SessionCommand>,
) -> Result<Vec<ReplayReport>> {
    let mut reports = Vec::new();

    while let Some(command) = rx.recv().await {
        let report = match command {
            SessionCommand::StartRoute(route, at) => ReplayReport::RouteStarted {
                camera: session.start_route(&route, at)?,
            },
            SessionCommand::Location(frame, data) if data.fix.is_unset() => {
                tracing::warn!(frame, "Dropping unset (0, 0) fix {}", frame);
                ReplayReport::Dropped {
                    frame,
                    error: "unset (0, 0) location fix".to_string(),
                }
            }
            SessionCommand::Location(frame, data) => {
                match session.on_location(&data.fix, &data.progress) {
                    Ok(update) => ReplayReport::Location {
                        frame,
                        decision: update.decision,
                        camera: update.camera,
                    },
                    Err(e) => {
                        tracing::warn!(frame, error = %e, "Dropping fix {}: {}", frame, e);
                        ReplayReport::Dropped {
                            frame,
                            error: e.to_string(),
                        }
                    }
                }
            }
            SessionCommand::Event(kind, at) => {
                let camera = match kind {
                    TraceEventKind::DisableTracking => {
                        session.disable_tracking(at);
                        None
                    }
                    TraceEventKind::EnableTracking => session.enable_tracking(at),
                    TraceEventKind::TransitionCompleted => {
                        session.transition_completed();
                        None
                    }
                };
                ReplayReport::Event { kind, camera }
            }
        };
        reports.push(report);
    }

    Ok(reports)
}
