//! An in-memory software camera used by the server binary and by tests.
//! Produces deterministic placeholder payloads instead of real image data.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Mutex as AsyncMutex;

use crate::capture::{CameraError, RecordOptions, RecordOutput};
use crate::state::{CameraState, ConfigChange};
use crate::trait_def::Camera;

const AWB_MODES: &[&str] = &[
    "off", "auto", "sunlight", "cloudy", "shade", "tungsten", "fluorescent", "incandescent",
    "flash", "horizon",
];
const AGC_MODES: &[&str] = &["off", "auto"];
const EXPOSURE_MODES: &[&str] = &[
    "off", "auto", "night", "nightpreview", "backlight", "spotlight", "sports", "snow", "beach",
    "verylong", "fixedfps", "antishake", "fireworks",
];
const METERING_MODES: &[&str] = &["average", "spot", "backlit", "matrix"];

pub struct MockCamera {
    state: Mutex<CameraState>,
    led_on: AsyncMutex<bool>,
}

impl Default for MockCamera {
    fn default() -> Self {
        MockCamera {
            state: Mutex::new(CameraState::default()),
            led_on: AsyncMutex::new(true),
        }
    }
}

impl MockCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current LED state, for tests.
    pub async fn led_is_on(&self) -> bool {
        *self.led_on.lock().await
    }

    fn validate_mode(field: &'static str, mode: &str, allowed: &[&str]) -> Result<(), CameraError> {
        if allowed.contains(&mode) {
            Ok(())
        } else {
            Err(CameraError::UnsupportedMode { field, mode: mode.to_owned() })
        }
    }
}

#[async_trait]
impl Camera for MockCamera {
    fn configure(&self, change: ConfigChange) -> Result<(), CameraError> {
        match &change {
            ConfigChange::Awb { mode, .. } => Self::validate_mode("awb", mode, AWB_MODES)?,
            ConfigChange::Agc { mode } => Self::validate_mode("agc", mode, AGC_MODES)?,
            ConfigChange::Exposure { mode, .. } => {
                Self::validate_mode("exposure", mode, EXPOSURE_MODES)?
            }
            ConfigChange::Metering { mode } => Self::validate_mode("metering", mode, METERING_MODES)?,
            _ => {}
        }
        self.state.lock().unwrap().apply(change);
        Ok(())
    }

    fn status(&self) -> CameraState {
        self.state.lock().unwrap().clone()
    }

    async fn capture_sequence(
        &self,
        count: i64,
        video_port: bool,
        quality: Option<i64>,
    ) -> Result<Vec<Vec<u8>>, CameraError> {
        self.set_led(false).await;
        let (width, height) = self.state.lock().unwrap().resolution;
        let quality = quality.unwrap_or(85);
        let mut frames = Vec::with_capacity(count.max(0) as usize);
        for i in 0..count.max(0) {
            frames.push(placeholder_jpeg(width, height, quality, video_port, i));
        }
        self.set_led(true).await;
        Ok(frames)
    }

    async fn record(&self, opts: RecordOptions) -> Result<RecordOutput, CameraError> {
        self.set_led(false).await;
        let (width, height) = self.state.lock().unwrap().resolution;
        let video = placeholder_video(width, height, opts.bitrate, opts.length_secs);
        let motion = opts.motion.then(|| placeholder_motion(opts.length_secs));
        self.set_led(true).await;
        Ok(RecordOutput { video, motion })
    }

    async fn set_led(&self, on: bool) {
        *self.led_on.lock().await = on;
    }
}

fn placeholder_jpeg(width: i64, height: i64, quality: i64, video_port: bool, index: i64) -> Vec<u8> {
    let mut bytes = Vec::from(*b"\xFF\xD8\xFF\xE0MOCKJPEG");
    bytes.extend_from_slice(&(width as u32).to_le_bytes());
    bytes.extend_from_slice(&(height as u32).to_le_bytes());
    bytes.push(quality as u8);
    bytes.push(u8::from(video_port));
    bytes.extend_from_slice(&(index as u32).to_le_bytes());
    bytes
}

fn placeholder_video(width: i64, height: i64, bitrate: i64, length_secs: f64) -> Vec<u8> {
    let mut bytes = Vec::from(*b"MOCKH264");
    bytes.extend_from_slice(&(width as u32).to_le_bytes());
    bytes.extend_from_slice(&(height as u32).to_le_bytes());
    bytes.extend_from_slice(&(bitrate as u64).to_le_bytes());
    bytes.extend_from_slice(&length_secs.to_le_bytes());
    bytes
}

fn placeholder_motion(length_secs: f64) -> Vec<u8> {
    let mut bytes = Vec::from(*b"MOCKMVEC");
    bytes.extend_from_slice(&length_secs.to_le_bytes());
    bytes
}
