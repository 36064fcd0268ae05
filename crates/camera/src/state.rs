use protocol::Fraction;

/// A config-changing side of one command, handed to [`crate::Camera::configure`].
///
/// One variant per configuration command in the schema (spec.md §4.3);
/// `STATUS`, `CAPTURE`, `RECORD`, `SEND`, `LIST`, `CLEAR` are not
/// represented here because they are not pure configuration changes.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigChange {
    Resolution { width: i64, height: i64 },
    Framerate { rate: Fraction },
    Awb { mode: String, red: Fraction, blue: Fraction },
    Agc { mode: String },
    Exposure { mode: String, speed_ms: f64 },
    Metering { mode: String },
    Iso { iso: i64 },
    Brightness(i64),
    Contrast(i64),
    Saturation(i64),
    Ev(i64),
    Flip { horizontal: bool, vertical: bool },
    Denoise(bool),
}

/// Mirrored camera configuration, independent of the wire `STATUS` block
/// (which additionally carries `TIMESTAMP`/`FILES`, owned by the server).
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    pub resolution: (i64, i64),
    pub framerate: Fraction,
    pub awb_mode: String,
    pub awb_red: Fraction,
    pub awb_blue: Fraction,
    pub agc_mode: String,
    pub agc_analog: Fraction,
    pub agc_digital: Fraction,
    pub exposure_mode: String,
    pub exposure_speed_ms: f64,
    pub iso: i64,
    pub metering_mode: String,
    pub brightness: i64,
    pub contrast: i64,
    pub saturation: i64,
    pub ev: i64,
    pub hflip: bool,
    pub vflip: bool,
    pub denoise: bool,
}

impl Default for CameraState {
    fn default() -> Self {
        CameraState {
            resolution: (1280, 720),
            framerate: Fraction::new(30, 1).unwrap(),
            awb_mode: "auto".to_owned(),
            awb_red: Fraction::new(1, 1).unwrap(),
            awb_blue: Fraction::new(1, 1).unwrap(),
            agc_mode: "auto".to_owned(),
            agc_analog: Fraction::new(1, 1).unwrap(),
            agc_digital: Fraction::new(1, 1).unwrap(),
            exposure_mode: "auto".to_owned(),
            exposure_speed_ms: 0.0,
            iso: 0,
            metering_mode: "average".to_owned(),
            brightness: 50,
            contrast: 0,
            saturation: 0,
            ev: 0,
            hflip: false,
            vflip: false,
            denoise: false,
        }
    }
}

impl CameraState {
    pub fn apply(&mut self, change: ConfigChange) {
        match change {
            ConfigChange::Resolution { width, height } => self.resolution = (width, height),
            ConfigChange::Framerate { rate } => self.framerate = rate,
            ConfigChange::Awb { mode, red, blue } => {
                self.awb_mode = mode;
                self.awb_red = red;
                self.awb_blue = blue;
            }
            ConfigChange::Agc { mode } => self.agc_mode = mode,
            ConfigChange::Exposure { mode, speed_ms } => {
                self.exposure_mode = mode;
                self.exposure_speed_ms = speed_ms;
            }
            ConfigChange::Metering { mode } => self.metering_mode = mode,
            ConfigChange::Iso { iso } => self.iso = iso,
            ConfigChange::Brightness(v) => self.brightness = v,
            ConfigChange::Contrast(v) => self.contrast = v,
            ConfigChange::Saturation(v) => self.saturation = v,
            ConfigChange::Ev(v) => self.ev = v,
            ConfigChange::Flip { horizontal, vertical } => {
                self.hflip = horizontal;
                self.vflip = vertical;
            }
            ConfigChange::Denoise(v) => self.denoise = v,
        }
    }
}
