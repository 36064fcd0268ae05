use crate::params::Fraction;

/// Video container/codec requested by `RECORD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    H264,
    Mjpeg,
}

impl RecordFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordFormat::H264 => "h264",
            RecordFormat::Mjpeg => "mjpeg",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "h264" => Some(RecordFormat::H264),
            "mjpeg" => Some(RecordFormat::Mjpeg),
            _ => None,
        }
    }
}

/// Kind of a captured file, as carried in `LIST` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Image,
    Video,
    Motion,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Image => "IMAGE",
            FileType::Video => "VIDEO",
            FileType::Motion => "MOTION",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "IMAGE" => Some(FileType::Image),
            "VIDEO" => Some(FileType::Video),
            "MOTION" => Some(FileType::Motion),
            _ => None,
        }
    }
}

/// One fully-typed, fully-parsed request. `seqno` is carried alongside this
/// value by the codec, not inside it — a command has no opinion about its
/// own sequencing.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Hello { timestamp: f64 },
    Ack,
    Blink,
    Status,
    Resolution { width: i64, height: i64 },
    Framerate { rate: Fraction },
    Awb { mode: String, red: Fraction, blue: Fraction },
    Agc { mode: String },
    Exposure { mode: String, speed_ms: f64 },
    Metering { mode: String },
    Iso { iso: i64 },
    Brightness { value: i64 },
    Contrast { value: i64 },
    Saturation { value: i64 },
    Ev { value: i64 },
    Flip { horizontal: bool, vertical: bool },
    Denoise { enabled: bool },
    Capture {
        count: i64,
        video_port: bool,
        quality: Option<i64>,
        sync: Option<f64>,
    },
    Record {
        length: f64,
        format: RecordFormat,
        quality: i64,
        bitrate: i64,
        intra_period: Option<i64>,
        motion: bool,
        sync: Option<f64>,
    },
    Send { index: u32, port: u16 },
    List,
    Clear,
}

impl Command {
    /// The uppercase wire name, as it appears after the seqno.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Hello { .. } => "HELLO",
            Command::Ack => "ACK",
            Command::Blink => "BLINK",
            Command::Status => "STATUS",
            Command::Resolution { .. } => "RESOLUTION",
            Command::Framerate { .. } => "FRAMERATE",
            Command::Awb { .. } => "AWB",
            Command::Agc { .. } => "AGC",
            Command::Exposure { .. } => "EXPOSURE",
            Command::Metering { .. } => "METERING",
            Command::Iso { .. } => "ISO",
            Command::Brightness { .. } => "BRIGHTNESS",
            Command::Contrast { .. } => "CONTRAST",
            Command::Saturation { .. } => "SATURATION",
            Command::Ev { .. } => "EV",
            Command::Flip { .. } => "FLIP",
            Command::Denoise { .. } => "DENOISE",
            Command::Capture { .. } => "CAPTURE",
            Command::Record { .. } => "RECORD",
            Command::Send { .. } => "SEND",
            Command::List => "LIST",
            Command::Clear => "CLEAR",
        }
    }
}
