use std::io::{self, BufWriter, Write};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use mixer::{GestureSample, NullSink, SceneController, SceneSnapshot};
use renderer::{time_source_for, SceneRenderer, SceneRendererConfig};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::gesture_feed::GestureFeed;
use crate::paths::{load_scene_config, AppPaths};
use crate::script::{Script, ScriptPlayer};

/// Scene time to keep running after the last scripted event.
const SCRIPT_TAIL: Duration = Duration::from_secs(5);
const DEFAULT_DURATION: Duration = Duration::from_secs(5);

/// One output line: the snapshot plus what the renderer made of it.
#[derive(Debug, Serialize)]
struct FrameReport<'a> {
    elapsed_ms: u64,
    #[serde(flatten)]
    snapshot: &'a SceneSnapshot,
    instances: usize,
}

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let (mut config, origin) = load_scene_config(args.config.as_deref(), &paths)?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    tracing::info!(config = %origin, seed = config.seed, "loaded scene configuration");

    let script = match args.script.as_deref() {
        Some(path) => Script::load(path)?,
        None => Script::default(),
    };
    let mut feed = args.gestures.as_deref().map(GestureFeed::open).transpose()?;
    let realtime = args.gestures.as_deref() == Some("-");

    let limit = match args.duration {
        Some(duration) => Some(duration),
        None if realtime => None,
        None if script.len() > 0 => Some(script.end().saturating_add(SCRIPT_TAIL)),
        None => Some(DEFAULT_DURATION),
    };
    tracing::debug!(
        events = script.len(),
        fps = args.fps,
        realtime,
        limit = ?limit,
        "starting scene session"
    );

    let mut scene = SceneController::new(&config, Box::new(NullSink::default()));
    let mut renderer = SceneRenderer::new(SceneRendererConfig::from(&config));
    let mut player = ScriptPlayer::new(script);
    let mut clock = time_source_for(realtime, args.fps)?;
    let frame_step = Duration::from_secs_f64(1.0 / f64::from(args.fps));

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let origin_instant = Instant::now();
    let mut last_emitted = None;
    let mut pending: Option<(u64, usize)> = None;

    loop {
        let sample = clock.sample();
        if limit.is_some_and(|limit| sample.elapsed > limit) {
            break;
        }
        let now = origin_instant + sample.elapsed;

        for event in player.take_due(sample.elapsed) {
            event.action.apply(&mut scene, now);
        }
        if let Some(feed) = feed.as_mut() {
            if clock.is_realtime() {
                while let Some(gesture) = feed.try_next() {
                    deliver(&mut scene, gesture, args.show_camera);
                }
            } else if let Some(gesture) = feed.next_blocking() {
                deliver(&mut scene, gesture, args.show_camera);
            }
        }

        scene.advance(now);
        let snapshot = scene.snapshot();
        let instances = renderer.frame(snapshot).len();
        let elapsed_ms = sample.elapsed.as_millis() as u64;

        if sample.frame_index % args.every == 0 {
            emit(&mut out, elapsed_ms, snapshot, instances)?;
            last_emitted = Some(sample.frame_index);
            pending = None;
        } else {
            pending = Some((elapsed_ms, instances));
        }

        if limit.is_none() && feed.as_ref().is_some_and(GestureFeed::is_closed) {
            break;
        }
        if clock.is_realtime() {
            let next = origin_instant + sample.elapsed + frame_step;
            thread::sleep(next.saturating_duration_since(Instant::now()));
        }
    }

    // The scene has not moved since the last frame, so its snapshot is
    // still the one that frame rendered.
    if let Some((elapsed_ms, instances)) = pending {
        emit(&mut out, elapsed_ms, scene.snapshot(), instances)?;
    } else if last_emitted.is_none() {
        bail!("session ended before the first frame");
    }
    out.flush().context("failed to flush snapshot output")?;
    let frames = scene.snapshot().frame;
    let photos = scene.photos().len();
    tracing::info!(
        frames = frames,
        photos = photos,
        script_finished = player.is_finished(),
        "scene session finished"
    );
    Ok(())
}

fn deliver(scene: &mut SceneController, gesture: GestureSample, show_camera: bool) {
    if show_camera {
        tracing::info!(
            detected = gesture.detected,
            open = gesture.open,
            x = gesture.x,
            y = gesture.y,
            "gesture sample"
        );
    }
    scene.on_gesture(gesture);
}

fn emit<W: Write>(
    out: &mut W,
    elapsed_ms: u64,
    snapshot: &SceneSnapshot,
    instances: usize,
) -> Result<()> {
    let report = FrameReport {
        elapsed_ms,
        snapshot,
        instances,
    };
    serde_json::to_writer(&mut *out, &report).context("failed to encode snapshot")?;
    out.write_all(b"\n").context("failed to write snapshot")?;
    Ok(())
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use treeconfig::SceneConfig;

    #[test]
    fn report_flattens_the_snapshot() {
        let mut scene = SceneController::new(&SceneConfig::default(), Box::new(NullSink::default()));
        scene.set_signature("Noel");
        let mut buffer = Vec::new();
        emit(&mut buffer, 16, scene.snapshot(), 90).unwrap();
        let line = String::from_utf8(buffer).unwrap();
        assert!(line.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["elapsed_ms"], 16);
        assert_eq!(value["instances"], 90);
        assert_eq!(value["mix_factor"], 1.0);
        assert_eq!(value["target"], 1);
        assert_eq!(value["signature_text"], "Noel");
        assert_eq!(value["colors"]["bottom"], "#022b1c");
        assert_eq!(value["upload_phase"], "idle");
    }
}
