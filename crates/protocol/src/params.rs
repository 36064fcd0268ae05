//! Parameter parsing for request/response payloads.
//!
//! Each parser takes the raw comma-separated field text and fails with a
//! [`ParamKind`](crate::error::ParamKind) tag on mismatch. None of these
//! normalize the value they parse — a fraction's denominator is kept
//! exactly as sent so that retransmitted responses stay byte-identical to
//! the first answer (spec invariant: same input produces the same wire
//! bytes every time).

use std::fmt;

use crate::error::{ParamKind, ProtocolError};

/// `numerator/denominator`, denominator bounded at 65536.
///
/// Equality and hashing are exact on the stored pair — `30/1` and `60/2`
/// are distinct values even though they describe the same rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fraction {
    pub num: u32,
    pub den: u32,
}

impl Fraction {
    pub const MAX_DENOMINATOR: u32 = 65536;

    pub fn new(num: u32, den: u32) -> Option<Self> {
        if den == 0 || den > Self::MAX_DENOMINATOR {
            return None;
        }
        Some(Fraction { num, den })
    }

    pub fn whole(num: u32) -> Self {
        Fraction { num, den: 1 }
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

pub fn parse_fraction(
    cmd: &'static str,
    name: &'static str,
    text: &str,
) -> Result<Fraction, ProtocolError> {
    let invalid = || ProtocolError::InvalidParam {
        cmd,
        name,
        kind: ParamKind::Fraction,
        value: text.to_owned(),
    };
    let (num_str, den_str) = text.split_once('/').ok_or_else(invalid)?;
    let num: u32 = num_str.parse().map_err(|_| invalid())?;
    let den: u32 = den_str.parse().map_err(|_| invalid())?;
    Fraction::new(num, den).ok_or_else(invalid)
}

pub fn parse_int(cmd: &'static str, name: &'static str, text: &str) -> Result<i64, ProtocolError> {
    let invalid = || ProtocolError::InvalidParam {
        cmd,
        name,
        kind: ParamKind::Int,
        value: text.to_owned(),
    };
    if text.is_empty() || text.starts_with('+') || text.contains(char::is_whitespace) {
        return Err(invalid());
    }
    text.parse::<i64>().map_err(|_| invalid())
}

pub fn parse_float(cmd: &'static str, name: &'static str, text: &str) -> Result<f64, ProtocolError> {
    let invalid = || ProtocolError::InvalidParam {
        cmd,
        name,
        kind: ParamKind::Float,
        value: text.to_owned(),
    };
    if text.is_empty() || text.contains(char::is_whitespace) {
        return Err(invalid());
    }
    let value: f64 = text.parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }
    Ok(value)
}

pub fn parse_bool(cmd: &'static str, name: &'static str, text: &str) -> Result<bool, ProtocolError> {
    match text {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(ProtocolError::InvalidParam {
            cmd,
            name,
            kind: ParamKind::Bool,
            value: text.to_owned(),
        }),
    }
}

pub fn render_bool(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

/// Render a float the way the wire expects: Rust's `Display` drops the
/// fractional part of a whole-number `f64` (`1000.0` prints as `"1000"`),
/// but every float field on the wire keeps at least one decimal digit
/// (e.g. `1 HELLO 1000.0`).
pub fn render_float(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') || text.contains('e') || text.contains("inf") || text.contains("NaN") {
        text
    } else {
        format!("{text}.0")
    }
}

/// A free-form lowercase ASCII token (e.g. AWB/AGC/exposure/metering mode
/// names). Validation of *which* tokens are meaningful is the camera
/// layer's job, not the codec's.
pub fn parse_enum_token(
    cmd: &'static str,
    name: &'static str,
    text: &str,
) -> Result<String, ProtocolError> {
    let invalid = || ProtocolError::InvalidParam {
        cmd,
        name,
        kind: ParamKind::Enum,
        value: text.to_owned(),
    };
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_lowercase() || c == '_') {
        return Err(invalid());
    }
    Ok(text.to_owned())
}

pub fn parse_index(cmd: &'static str, name: &'static str, text: &str) -> Result<u32, ProtocolError> {
    let value = parse_int(cmd, name, text)?;
    u32::try_from(value).map_err(|_| ProtocolError::InvalidParam {
        cmd,
        name,
        kind: ParamKind::Int,
        value: text.to_owned(),
    })
}

pub fn parse_port(cmd: &'static str, name: &'static str, text: &str) -> Result<u16, ProtocolError> {
    let value = parse_int(cmd, name, text)?;
    u16::try_from(value).map_err(|_| ProtocolError::InvalidParam {
        cmd,
        name,
        kind: ParamKind::Int,
        value: text.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_round_trips_without_reduction() {
        let a = parse_fraction("FRAMERATE", "rate", "30/1").unwrap();
        let b = parse_fraction("FRAMERATE", "rate", "60/2").unwrap();
        assert_eq!(a, Fraction::new(30, 1).unwrap());
        assert_eq!(b, Fraction::new(60, 2).unwrap());
        assert_ne!(a, b);
    }

    #[test]
    fn fraction_rejects_oversized_denominator() {
        assert!(parse_fraction("FRAMERATE", "rate", "1/65537").is_err());
        assert!(parse_fraction("FRAMERATE", "rate", "1/65536").is_ok());
    }

    #[test]
    fn int_rejects_leading_plus_and_whitespace() {
        assert!(parse_int("ISO", "iso", "+100").is_err());
        assert!(parse_int("ISO", "iso", "1 00").is_err());
        assert!(parse_int("ISO", "iso", "100").is_ok());
    }

    #[test]
    fn bool_only_accepts_0_or_1() {
        assert_eq!(parse_bool("DENOISE", "enabled", "0").unwrap(), false);
        assert_eq!(parse_bool("DENOISE", "enabled", "1").unwrap(), true);
        assert!(parse_bool("DENOISE", "enabled", "true").is_err());
    }

    #[test]
    fn enum_token_rejects_uppercase() {
        assert!(parse_enum_token("AWB", "mode", "Auto").is_err());
        assert!(parse_enum_token("AWB", "mode", "auto").is_ok());
    }

    #[test]
    fn render_float_keeps_decimal_point_on_whole_numbers() {
        assert_eq!(render_float(1000.0), "1000.0");
        assert_eq!(render_float(12.5), "12.5");
        assert_eq!(render_float(1400803122.359911), "1400803122.359911");
    }
}
