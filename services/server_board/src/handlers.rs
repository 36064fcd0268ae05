//! Per-command handler logic. Callers (the dispatcher) have already
//! resolved client binding, seqno freshness, and idempotence — everything
//! here assumes "run this command exactly once and report the result."
//!
//! `HELLO`, `ACK`, and `SEND` are handled directly by the dispatcher
//! (`HELLO`/`ACK` mutate session state the handler has no access to; `SEND`
//! needs the inbound packet's source IP). Reaching those arms here is a
//! dispatcher bug.

use std::sync::Arc;
use std::time::Duration;

use camera::{Camera, ConfigChange, RecordOptions};
use protocol::{Command, FileType, encode_file_list};

use crate::error::HandlerError;
use crate::files::{FileStore, StoredFile};
use crate::time::now_unix;

/// Run `command` against `camera`/`files`, producing the response's `OK`
/// data (if any). Errors carry the exact text sent back as `ERROR <msg>`.
pub async fn handle_command(
    camera: &Arc<dyn Camera>,
    files: &mut FileStore,
    command: &Command,
) -> Result<Option<String>, HandlerError> {
    match command {
        Command::Hello { .. } | Command::Ack | Command::Send { .. } => {
            unreachable!("{} is handled by the dispatcher directly", command.name())
        }
        Command::Blink => {
            spawn_blink(camera.clone());
            Ok(None)
        }
        Command::Status => {
            let state = camera.status();
            let status = crate::status_payload::build_status(&state, files.len(), now_unix());
            Ok(Some(status.to_lines()))
        }
        Command::Resolution { width, height } => {
            camera.configure(ConfigChange::Resolution { width: *width, height: *height })?;
            Ok(None)
        }
        Command::Framerate { rate } => {
            camera.configure(ConfigChange::Framerate { rate: *rate })?;
            Ok(None)
        }
        Command::Awb { mode, red, blue } => {
            camera.configure(ConfigChange::Awb { mode: mode.clone(), red: *red, blue: *blue })?;
            Ok(None)
        }
        Command::Agc { mode } => {
            camera.configure(ConfigChange::Agc { mode: mode.clone() })?;
            Ok(None)
        }
        Command::Exposure { mode, speed_ms } => {
            camera.configure(ConfigChange::Exposure { mode: mode.clone(), speed_ms: *speed_ms })?;
            Ok(None)
        }
        Command::Metering { mode } => {
            camera.configure(ConfigChange::Metering { mode: mode.clone() })?;
            Ok(None)
        }
        Command::Iso { iso } => {
            camera.configure(ConfigChange::Iso { iso: *iso })?;
            Ok(None)
        }
        Command::Brightness { value } => {
            camera.configure(ConfigChange::Brightness(*value))?;
            Ok(None)
        }
        Command::Contrast { value } => {
            camera.configure(ConfigChange::Contrast(*value))?;
            Ok(None)
        }
        Command::Saturation { value } => {
            camera.configure(ConfigChange::Saturation(*value))?;
            Ok(None)
        }
        Command::Ev { value } => {
            camera.configure(ConfigChange::Ev(*value))?;
            Ok(None)
        }
        Command::Flip { horizontal, vertical } => {
            camera.configure(ConfigChange::Flip { horizontal: *horizontal, vertical: *vertical })?;
            Ok(None)
        }
        Command::Denoise { enabled } => {
            camera.configure(ConfigChange::Denoise(*enabled))?;
            Ok(None)
        }
        Command::Capture { count, video_port, quality, sync } => {
            wait_for_sync(*sync).await?;
            let frames = camera.capture_sequence(*count, *video_port, *quality).await?;
            let timestamp_unix = now_unix();
            for frame in frames {
                files.push(StoredFile { file_type: FileType::Image, timestamp_unix, payload: frame });
            }
            Ok(None)
        }
        Command::Record { length, format, quality, bitrate, intra_period, motion, sync } => {
            wait_for_sync(*sync).await?;
            let output = camera
                .record(RecordOptions {
                    length_secs: *length,
                    format: *format,
                    quality: *quality,
                    bitrate: *bitrate,
                    intra_period: *intra_period,
                    motion: *motion,
                })
                .await?;
            let timestamp_unix = now_unix();
            files.push(StoredFile { file_type: FileType::Video, timestamp_unix, payload: output.video });
            if let Some(motion_bytes) = output.motion {
                files.push(StoredFile { file_type: FileType::Motion, timestamp_unix, payload: motion_bytes });
            }
            Ok(None)
        }
        Command::List => {
            let entries: Vec<protocol::FileEntry> = files
                .iter_with_index()
                .map(|(index, file)| protocol::FileEntry {
                    file_type: file.file_type,
                    index,
                    timestamp_unix: file.timestamp_unix,
                    size_bytes: file.payload.len() as u64,
                })
                .collect();
            if entries.is_empty() { Ok(None) } else { Ok(Some(encode_file_list(&entries))) }
        }
        Command::Clear => {
            files.clear();
            Ok(None)
        }
    }
}

async fn wait_for_sync(sync: Option<f64>) -> Result<(), HandlerError> {
    let Some(sync) = sync else { return Ok(()) };
    let now = now_unix();
    if sync <= now {
        return Err(HandlerError::SyncInPast { sync });
    }
    tokio::time::sleep(Duration::from_secs_f64(sync - now)).await;
    Ok(())
}

/// `BLINK`: flash the LED for 5s in a detached task, restoring LED=on on
/// exit regardless of how the task ends (spec.md §4.4's LED semantics).
fn spawn_blink(camera: Arc<dyn Camera>) {
    tokio::spawn(async move {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        let mut on = false;
        while tokio::time::Instant::now() < deadline {
            on = !on;
            camera.set_led(on).await;
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
        camera.set_led(true).await;
    });
}
