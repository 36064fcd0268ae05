//! The fixed 15-line `STATUS` response body (spec.md §4.5).

use crate::error::ProtocolError;
use crate::params::{Fraction, parse_bool, parse_float, parse_fraction, parse_int, render_bool};

#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
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
    pub timestamp_unix: f64,
    pub files: i64,
}

const LINE_COUNT: usize = 15;

impl StatusSnapshot {
    /// Render the canonical 15-line block (no trailing newline).
    pub fn to_lines(&self) -> String {
        let lines = [
            format!("RESOLUTION {},{}", self.resolution.0, self.resolution.1),
            format!("FRAMERATE {}", self.framerate),
            format!("AWB {},{},{}", self.awb_mode, self.awb_red, self.awb_blue),
            format!("AGC {},{},{}", self.agc_mode, self.agc_analog, self.agc_digital),
            format!("EXPOSURE {},{}", self.exposure_mode, self.exposure_speed_ms),
            format!("ISO {}", self.iso),
            format!("METERING {}", self.metering_mode),
            format!("BRIGHTNESS {}", self.brightness),
            format!("CONTRAST {}", self.contrast),
            format!("SATURATION {}", self.saturation),
            format!("EV {}", self.ev),
            format!("FLIP {},{}", render_bool(self.hflip), render_bool(self.vflip)),
            format!("DENOISE {}", render_bool(self.denoise)),
            format!("TIMESTAMP {}", self.timestamp_unix),
            format!("FILES {}", self.files),
        ];
        lines.join("\n")
    }

    pub fn from_lines(text: &str) -> Result<Self, ProtocolError> {
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() != LINE_COUNT {
            return Err(ProtocolError::MalformedStatusBlock);
        }

        fn kv<'a>(line: &'a str, key: &str) -> Result<&'a str, ProtocolError> {
            let (k, v) = line.split_once(' ').ok_or(ProtocolError::MalformedStatusBlock)?;
            if k != key {
                return Err(ProtocolError::MalformedStatusBlock);
            }
            Ok(v)
        }

        let resolution_v = kv(lines[0], "RESOLUTION")?;
        let (w, h) = resolution_v.split_once(',').ok_or(ProtocolError::MalformedStatusBlock)?;
        let resolution = (
            parse_int("STATUS", "resolution.w", w)?,
            parse_int("STATUS", "resolution.h", h)?,
        );

        let framerate = parse_fraction("STATUS", "framerate", kv(lines[1], "FRAMERATE")?)?;

        let awb_v = kv(lines[2], "AWB")?;
        let mut awb_parts = awb_v.splitn(3, ',');
        let awb_mode = awb_parts.next().ok_or(ProtocolError::MalformedStatusBlock)?.to_owned();
        let awb_red = parse_fraction("STATUS", "awb.red", awb_parts.next().ok_or(ProtocolError::MalformedStatusBlock)?)?;
        let awb_blue = parse_fraction("STATUS", "awb.blue", awb_parts.next().ok_or(ProtocolError::MalformedStatusBlock)?)?;

        let agc_v = kv(lines[3], "AGC")?;
        let mut agc_parts = agc_v.splitn(3, ',');
        let agc_mode = agc_parts.next().ok_or(ProtocolError::MalformedStatusBlock)?.to_owned();
        let agc_analog = parse_fraction("STATUS", "agc.analog", agc_parts.next().ok_or(ProtocolError::MalformedStatusBlock)?)?;
        let agc_digital = parse_fraction("STATUS", "agc.digital", agc_parts.next().ok_or(ProtocolError::MalformedStatusBlock)?)?;

        let exposure_v = kv(lines[4], "EXPOSURE")?;
        let (exp_mode, exp_speed) = exposure_v.split_once(',').ok_or(ProtocolError::MalformedStatusBlock)?;
        let exposure_mode = exp_mode.to_owned();
        let exposure_speed_ms = parse_float("STATUS", "exposure.speed", exp_speed)?;

        let iso = parse_int("STATUS", "iso", kv(lines[5], "ISO")?)?;
        let metering_mode = kv(lines[6], "METERING")?.to_owned();
        let brightness = parse_int("STATUS", "brightness", kv(lines[7], "BRIGHTNESS")?)?;
        let contrast = parse_int("STATUS", "contrast", kv(lines[8], "CONTRAST")?)?;
        let saturation = parse_int("STATUS", "saturation", kv(lines[9], "SATURATION")?)?;
        let ev = parse_int("STATUS", "ev", kv(lines[10], "EV")?)?;

        let flip_v = kv(lines[11], "FLIP")?;
        let (h_flip, v_flip) = flip_v.split_once(',').ok_or(ProtocolError::MalformedStatusBlock)?;
        let hflip = parse_bool("STATUS", "flip.h", h_flip)?;
        let vflip = parse_bool("STATUS", "flip.v", v_flip)?;

        let denoise = parse_bool("STATUS", "denoise", kv(lines[12], "DENOISE")?)?;
        let timestamp_unix = parse_float("STATUS", "timestamp", kv(lines[13], "TIMESTAMP")?)?;
        let files = parse_int("STATUS", "files", kv(lines[14], "FILES")?)?;

        Ok(StatusSnapshot {
            resolution,
            framerate,
            awb_mode,
            awb_red,
            awb_blue,
            agc_mode,
            agc_analog,
            agc_digital,
            exposure_mode,
            exposure_speed_ms,
            iso,
            metering_mode,
            brightness,
            contrast,
            saturation,
            ev,
            hflip,
            vflip,
            denoise,
            timestamp_unix,
            files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StatusSnapshot {
        StatusSnapshot {
            resolution: (1280, 720),
            framerate: Fraction::new(30, 1).unwrap(),
            awb_mode: "auto".to_owned(),
            awb_red: Fraction::new(14, 10).unwrap(),
            awb_blue: Fraction::new(15, 10).unwrap(),
            agc_mode: "auto".to_owned(),
            agc_analog: Fraction::new(1, 1).unwrap(),
            agc_digital: Fraction::new(1, 1).unwrap(),
            exposure_mode: "auto".to_owned(),
            exposure_speed_ms: 0.0,
            iso: 100,
            metering_mode: "average".to_owned(),
            brightness: 50,
            contrast: 0,
            saturation: 0,
            ev: 0,
            hflip: true,
            vflip: false,
            denoise: false,
            timestamp_unix: 1_700_000_000.0,
            files: 0,
        }
    }

    #[test]
    fn round_trips() {
        let snap = sample();
        let text = snap.to_lines();
        assert_eq!(text.lines().count(), 15);
        let parsed = StatusSnapshot::from_lines(&text).unwrap();
        assert_eq!(parsed, snap);
    }

    /// Scenario 5 from spec.md §8.
    #[test]
    fn parses_canonical_block() {
        let text = sample().to_lines();
        let parsed = StatusSnapshot::from_lines(&text).unwrap();
        assert_eq!(parsed.resolution, (1280, 720));
        assert_eq!(parsed.framerate, Fraction::new(30, 1).unwrap());
        assert_eq!(parsed.awb_mode, "auto");
        assert_eq!(parsed.awb_red, Fraction::new(14, 10).unwrap());
        assert_eq!(parsed.awb_blue, Fraction::new(15, 10).unwrap());
        assert_eq!(parsed.iso, 100);
        assert!(parsed.hflip);
        assert!(!parsed.vflip);
        assert!(!parsed.denoise);
        assert_eq!(parsed.files, 0);
    }

    #[test]
    fn rejects_wrong_line_count() {
        assert!(matches!(
            StatusSnapshot::from_lines("RESOLUTION 1,2"),
            Err(ProtocolError::MalformedStatusBlock)
        ));
    }
}
