use camera::CameraState;
use protocol::StatusSnapshot;

/// Merge the camera's mirrored configuration with the server-owned fields
/// (`TIMESTAMP`, `FILES`) into the wire `STATUS` block (spec.md §4.5).
pub fn build_status(state: &CameraState, file_count: usize, now_unix: f64) -> StatusSnapshot {
    StatusSnapshot {
        resolution: state.resolution,
        framerate: state.framerate,
        awb_mode: state.awb_mode.clone(),
        awb_red: state.awb_red,
        awb_blue: state.awb_blue,
        agc_mode: state.agc_mode.clone(),
        agc_analog: state.agc_analog,
        agc_digital: state.agc_digital,
        exposure_mode: state.exposure_mode.clone(),
        exposure_speed_ms: state.exposure_speed_ms,
        iso: state.iso,
        metering_mode: state.metering_mode.clone(),
        brightness: state.brightness,
        contrast: state.contrast,
        saturation: state.saturation,
        ev: state.ev,
        hflip: state.hflip,
        vflip: state.vflip,
        denoise: state.denoise,
        timestamp_unix: now_unix,
        files: file_count as i64,
    }
}
