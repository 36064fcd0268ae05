use protocol::RecordFormat;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("unsupported {field} mode '{mode}'")]
    UnsupportedMode { field: &'static str, mode: String },
    #[error("camera is busy with another capture or recording")]
    Busy,
}

#[derive(Debug, Clone, Copy)]
pub struct RecordOptions {
    pub length_secs: f64,
    pub format: RecordFormat,
    pub quality: i64,
    pub bitrate: i64,
    pub intra_period: Option<i64>,
    pub motion: bool,
}

#[derive(Debug, Clone)]
pub struct RecordOutput {
    pub video: Vec<u8>,
    pub motion: Option<Vec<u8>>,
}
