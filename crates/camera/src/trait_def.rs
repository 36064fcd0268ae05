use async_trait::async_trait;

use crate::capture::{CameraError, RecordOptions, RecordOutput};
use crate::state::{CameraState, ConfigChange};

/// The external camera collaborator's interface, per spec.md §1: "a
/// capability providing `configure`, `capture_sequence`, `record`, `led`,
/// and status accessors." The server depends only on this trait; a real
/// board swaps in an `rpicam`/V4L2-backed implementation without touching
/// dispatcher code.
#[async_trait]
pub trait Camera: Send + Sync + 'static {
    /// Apply one configuration change. Synchronous because it only mutates
    /// in-memory state — no hardware round-trip is modeled here.
    fn configure(&self, change: ConfigChange) -> Result<(), CameraError>;

    /// A full snapshot of current configuration, for `STATUS`.
    fn status(&self) -> CameraState;

    /// Capture `count` still images. `video_port` selects the faster,
    /// lower-latency capture path; `quality` is JPEG quality when set.
    async fn capture_sequence(
        &self,
        count: i64,
        video_port: bool,
        quality: Option<i64>,
    ) -> Result<Vec<Vec<u8>>, CameraError>;

    /// Record video for `opts.length_secs`, yielding the video bytes and,
    /// when `opts.motion` is set, a parallel motion-vector stream.
    async fn record(&self, opts: RecordOptions) -> Result<RecordOutput, CameraError>;

    /// Drive the LED. `on = false` during capture, `on = true` at idle,
    /// per spec.md §4.4's LED semantics; `BLINK`'s detached 5s override is
    /// the server's concern, not the camera's.
    async fn set_led(&self, on: bool);
}
