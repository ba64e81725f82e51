use routeguide::config::{CameraConfig, NavigationOptions};
use routeguide::replay::{self, ReplayReport, Trace};
use routeguide::OffRouteDecision;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_help() {
    eprintln!(
        "\
Usage: replay [OPTIONS] TRACE.json

Feeds a recorded trace through the off-route detector and the camera engine.

Options:
  --json                Print one JSON report per line instead of a summary
  --help                Show this help message

Options and camera settings embedded in the trace override NAV_* and
CAMERA_* environment variables."
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "routeguide=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help") {
        print_help();
        return Ok(());
    }

    let json_output = args.iter().any(|a| a == "--json");
    let Some(trace_path) = args.iter().find(|a| !a.starts_with("--")).map(PathBuf::from) else {
        print_help();
        std::process::exit(2);
    };

    let options =
        NavigationOptions::from_env().map_err(|e| format!("Configuration error: {}", e))?;
    let camera = CameraConfig::from_env().map_err(|e| format!("Configuration error: {}", e))?;

    let trace = Trace::load(&trace_path)
        .map_err(|e| format!("Failed to load trace {}: {}", trace_path.display(), e))?;
    tracing::info!(
        frames = trace.frames.len(),
        events = trace.events.len(),
        "Replaying {}",
        trace_path.display()
    );

    let reports = replay::replay(trace, options, camera).await?;

    if json_output {
        for report in &reports {
            println!("{}", serde_json::to_string(report)?);
        }
        return Ok(());
    }

    print_summary(&reports);
    Ok(())
}

fn print_summary(reports: &[ReplayReport]) {
    let mut off_route = Vec::new();
    let mut advanced = Vec::new();
    let mut dropped = 0;
    let mut camera_updates = 0;

    for report in reports {
        match report {
            ReplayReport::RouteStarted { .. } => camera_updates += 1,
            ReplayReport::Location {
                frame,
                decision,
                camera,
            } => {
                match decision {
                    OffRouteDecision::OffRoute => off_route.push(*frame),
                    OffRouteDecision::AdvanceStep => advanced.push(*frame),
                    OffRouteDecision::OnRoute => {}
                }
                if camera.is_some() {
                    camera_updates += 1;
                }
            }
            ReplayReport::Dropped { .. } => dropped += 1,
            ReplayReport::Event { camera, .. } => {
                if camera.is_some() {
                    camera_updates += 1;
                }
            }
        }
    }

    println!("Off-route frames:    {:?}", off_route);
    println!("Advance-step frames: {:?}", advanced);
    println!("Dropped fixes:       {}", dropped);
    println!("Camera updates:      {}", camera_updates);
}
