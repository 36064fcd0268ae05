//! Framing: turning bytes into `(Seqno, Command)` and back, plus the
//! response envelope (`OK`/`ERROR` + opaque data).
//!
//! Request grammar: `<seqno> SP <COMMAND> [ SP <param1>,<param2>,… ]`.
//! Response grammar: `<seqno> SP (OK|ERROR) [ LF <data> ]`.
//! There is no quoting — no parameter value may contain a comma or
//! newline, and the codec does not attempt to escape one if it does.

use crate::command::{Command, RecordFormat};
use crate::error::{ParamKind, ProtocolError};
use crate::params::{
    self, Fraction, parse_bool, parse_enum_token, parse_float, parse_fraction, parse_index,
    parse_int, parse_port, render_bool, render_float,
};
use crate::seqno::Seqno;

fn split_params(rest: &str) -> Vec<&str> {
    if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',').collect()
    }
}

fn field<'a>(
    cmd: &'static str,
    name: &'static str,
    fields: &[&'a str],
    idx: usize,
) -> Result<&'a str, ProtocolError> {
    fields
        .get(idx)
        .copied()
        .ok_or(ProtocolError::MissingParam { cmd, name })
}

fn optional_field<'a>(fields: &[&'a str], idx: usize) -> Option<&'a str> {
    fields.get(idx).copied()
}

/// Parse one inbound datagram's command line into `(seqno, command)`.
///
/// `seqno` parse failure (not digits, or a framing error before the
/// command name is reached) is reported as [`ProtocolError::MalformedSeqno`];
/// callers that need to answer a framing error must use [`Seqno::ERROR`]
/// rather than anything recovered from this function, per spec.md §4.4.
pub fn decode_request(line: &str) -> Result<(Seqno, Command), ProtocolError> {
    let line = line.trim_end();
    let mut parts = line.splitn(2, ' ');
    let seqno_str = parts.next().filter(|s| !s.is_empty()).ok_or(ProtocolError::EmptyDatagram)?;
    if seqno_str.is_empty() || !seqno_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(ProtocolError::MalformedSeqno(seqno_str.to_owned()));
    }
    let seqno = Seqno(seqno_str.parse().map_err(|_| ProtocolError::MalformedSeqno(seqno_str.to_owned()))?);

    let rest = parts.next().unwrap_or("").trim_start();
    let mut cmd_parts = rest.splitn(2, ' ');
    let cmd_name = cmd_parts.next().filter(|s| !s.is_empty()).ok_or(ProtocolError::MissingCommand)?;
    let param_text = cmd_parts.next().unwrap_or("").trim_start();
    let fields = split_params(param_text);

    let command = decode_command(cmd_name, &fields)?;
    Ok((seqno, command))
}

fn decode_command(cmd_name: &str, fields: &[&str]) -> Result<Command, ProtocolError> {
    match cmd_name {
        "HELLO" => {
            let timestamp = parse_float("HELLO", "timestamp", field("HELLO", "timestamp", fields, 0)?)?;
            Ok(Command::Hello { timestamp })
        }
        "ACK" => Ok(Command::Ack),
        "BLINK" => Ok(Command::Blink),
        "STATUS" => Ok(Command::Status),
        "RESOLUTION" => {
            let width = parse_int("RESOLUTION", "w", field("RESOLUTION", "w", fields, 0)?)?;
            let height = parse_int("RESOLUTION", "h", field("RESOLUTION", "h", fields, 1)?)?;
            Ok(Command::Resolution { width, height })
        }
        "FRAMERATE" => {
            let rate = parse_fraction("FRAMERATE", "rate", field("FRAMERATE", "rate", fields, 0)?)?;
            Ok(Command::Framerate { rate })
        }
        "AWB" => {
            let mode = parse_enum_token("AWB", "mode", field("AWB", "mode", fields, 0)?)?;
            let red = match optional_field(fields, 1) {
                Some(text) => parse_fraction("AWB", "red", text)?,
                None => Fraction::whole(1),
            };
            let blue = match optional_field(fields, 2) {
                Some(text) => parse_fraction("AWB", "blue", text)?,
                None => Fraction::whole(1),
            };
            Ok(Command::Awb { mode, red, blue })
        }
        "AGC" => {
            let mode = parse_enum_token("AGC", "mode", field("AGC", "mode", fields, 0)?)?;
            Ok(Command::Agc { mode })
        }
        "EXPOSURE" => {
            let mode = parse_enum_token("EXPOSURE", "mode", field("EXPOSURE", "mode", fields, 0)?)?;
            let speed_ms = parse_float("EXPOSURE", "speed", field("EXPOSURE", "speed", fields, 1)?)?;
            Ok(Command::Exposure { mode, speed_ms })
        }
        "METERING" => {
            let mode = parse_enum_token("METERING", "mode", field("METERING", "mode", fields, 0)?)?;
            Ok(Command::Metering { mode })
        }
        "ISO" => {
            let iso = parse_int("ISO", "iso", field("ISO", "iso", fields, 0)?)?;
            Ok(Command::Iso { iso })
        }
        "BRIGHTNESS" => Ok(Command::Brightness {
            value: parse_int("BRIGHTNESS", "value", field("BRIGHTNESS", "value", fields, 0)?)?,
        }),
        "CONTRAST" => Ok(Command::Contrast {
            value: parse_int("CONTRAST", "value", field("CONTRAST", "value", fields, 0)?)?,
        }),
        "SATURATION" => Ok(Command::Saturation {
            value: parse_int("SATURATION", "value", field("SATURATION", "value", fields, 0)?)?,
        }),
        "EV" => Ok(Command::Ev {
            value: parse_int("EV", "value", field("EV", "value", fields, 0)?)?,
        }),
        "FLIP" => {
            let horizontal = parse_bool("FLIP", "h", field("FLIP", "h", fields, 0)?)?;
            let vertical = parse_bool("FLIP", "v", field("FLIP", "v", fields, 1)?)?;
            Ok(Command::Flip { horizontal, vertical })
        }
        "DENOISE" => Ok(Command::Denoise {
            enabled: parse_bool("DENOISE", "enabled", field("DENOISE", "enabled", fields, 0)?)?,
        }),
        "CAPTURE" => {
            let count = match optional_field(fields, 0) {
                Some(text) => parse_int("CAPTURE", "count", text)?,
                None => 1,
            };
            let video_port = match optional_field(fields, 1) {
                Some(text) => parse_bool("CAPTURE", "video_port", text)?,
                None => false,
            };
            // An empty `quality` field is a placeholder left by an encoder
            // that wants to set `sync` without `quality` — treat it as
            // absent rather than a malformed integer.
            let quality = optional_field(fields, 2)
                .filter(|text| !text.is_empty())
                .map(|text| parse_int("CAPTURE", "quality", text))
                .transpose()?;
            let sync = optional_field(fields, 3)
                .map(|text| parse_float("CAPTURE", "sync", text))
                .transpose()?;
            Ok(Command::Capture { count, video_port, quality, sync })
        }
        "RECORD" => {
            let length = parse_float("RECORD", "length", field("RECORD", "length", fields, 0)?)?;
            let format = match optional_field(fields, 1) {
                Some(text) => RecordFormat::parse(text).ok_or(ProtocolError::InvalidParam {
                    cmd: "RECORD",
                    name: "format",
                    kind: ParamKind::Enum,
                    value: text.to_owned(),
                })?,
                None => RecordFormat::H264,
            };
            let quality = match optional_field(fields, 2) {
                Some(text) => parse_int("RECORD", "quality", text)?,
                None => 0,
            };
            let bitrate = match optional_field(fields, 3) {
                Some(text) => parse_int("RECORD", "bitrate", text)?,
                None => 17_000_000,
            };
            // Same placeholder rule as `CAPTURE`'s `quality` field above.
            let intra_period = optional_field(fields, 4)
                .filter(|text| !text.is_empty())
                .map(|text| parse_int("RECORD", "intra_period", text))
                .transpose()?;
            let motion = match optional_field(fields, 5) {
                Some(text) => parse_bool("RECORD", "motion", text)?,
                None => false,
            };
            let sync = optional_field(fields, 6)
                .map(|text| parse_float("RECORD", "sync", text))
                .transpose()?;
            if motion && format != RecordFormat::H264 {
                return Err(ProtocolError::InvalidParam {
                    cmd: "RECORD",
                    name: "motion",
                    kind: ParamKind::Bool,
                    value: "1".to_owned(),
                });
            }
            Ok(Command::Record {
                length,
                format,
                quality,
                bitrate,
                intra_period,
                motion,
                sync,
            })
        }
        "SEND" => {
            let index = parse_index("SEND", "index", field("SEND", "index", fields, 0)?)?;
            let port = parse_port("SEND", "port", field("SEND", "port", fields, 1)?)?;
            Ok(Command::Send { index, port })
        }
        "LIST" => Ok(Command::List),
        "CLEAR" => Ok(Command::Clear),
        other => Err(ProtocolError::UnknownCommand(other.to_owned())),
    }
}

/// Render a request line, `b"<seqno> <COMMAND>[ <params>]"`, no trailing newline.
pub fn encode_request(seqno: Seqno, command: &Command) -> Vec<u8> {
    let mut out = format!("{} {}", seqno, command.name());
    if let Some(params) = encode_params(command) {
        out.push(' ');
        out.push_str(&params);
    }
    out.into_bytes()
}

fn encode_params(command: &Command) -> Option<String> {
    match command {
        Command::Hello { timestamp } => Some(render_float(*timestamp)),
        Command::Ack | Command::Blink | Command::Status | Command::List | Command::Clear => None,
        Command::Resolution { width, height } => Some(format!("{width},{height}")),
        Command::Framerate { rate } => Some(format!("{rate}")),
        Command::Awb { mode, red, blue } => Some(format!("{mode},{red},{blue}")),
        Command::Agc { mode } => Some(format!("{mode}")),
        Command::Exposure { mode, speed_ms } => Some(format!("{mode},{}", render_float(*speed_ms))),
        Command::Metering { mode } => Some(format!("{mode}")),
        Command::Iso { iso } => Some(format!("{iso}")),
        Command::Brightness { value }
        | Command::Contrast { value }
        | Command::Saturation { value }
        | Command::Ev { value } => Some(format!("{value}")),
        Command::Flip { horizontal, vertical } => {
            Some(format!("{},{}", render_bool(*horizontal), render_bool(*vertical)))
        }
        Command::Denoise { enabled } => Some(format!("{}", render_bool(*enabled))),
        Command::Capture { count, video_port, quality, sync } => {
            let mut s = format!("{count},{}", render_bool(*video_port));
            // `sync` is a trailing field after `quality`; a caller can set
            // `sync` without `quality` (e.g. through the engine's typed
            // `capture()` wrapper, which does not go through
            // `decode_request`), so a gap is filled with an empty
            // placeholder field rather than silently dropping `sync`.
            if let Some(sy) = sync {
                let quality_text = quality.map(|q| q.to_string()).unwrap_or_default();
                s.push_str(&format!(",{quality_text},{}", render_float(*sy)));
            } else if let Some(q) = quality {
                s.push_str(&format!(",{q}"));
            }
            Some(s)
        }
        Command::Record { length, format, quality, bitrate, intra_period, motion, sync } => {
            let mut s = format!("{},{},{quality},{bitrate}", render_float(*length), format.as_str());
            // Same gap-filling rule as `Capture` above: `sync` trails
            // `intra_period`/`motion`, but a caller can set it without them.
            if sync.is_some() || *motion {
                s.push(',');
                if let Some(ip) = intra_period {
                    s.push_str(&ip.to_string());
                }
                s.push_str(&format!(",{}", render_bool(*motion)));
                if let Some(sy) = sync {
                    s.push_str(&format!(",{}", render_float(*sy)));
                }
            }
            Some(s)
        }
        Command::Send { index, port } => Some(format!("{index},{port}")),
    }
}

/// Opaque response body: either success (with optional multi-line data) or
/// a server-reported error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Ok(Option<String>),
    Error(String),
}

pub fn encode_response(seqno: Seqno, body: &ResponseBody) -> Vec<u8> {
    match body {
        ResponseBody::Ok(None) => format!("{seqno} OK").into_bytes(),
        ResponseBody::Ok(Some(data)) => format!("{seqno} OK\n{data}").into_bytes(),
        ResponseBody::Error(message) => format!("{seqno} ERROR\n{message}").into_bytes(),
    }
}

pub fn decode_response(line: &str) -> Result<(Seqno, ResponseBody), ProtocolError> {
    let line = line.trim_end();
    let mut header_and_rest = line.splitn(2, '\n');
    let header = header_and_rest.next().unwrap_or("");
    let data = header_and_rest.next();

    let mut parts = header.splitn(2, ' ');
    let seqno_str = parts.next().filter(|s| !s.is_empty()).ok_or(ProtocolError::EmptyDatagram)?;
    if !seqno_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(ProtocolError::MalformedSeqno(seqno_str.to_owned()));
    }
    let seqno = Seqno(seqno_str.parse().map_err(|_| ProtocolError::MalformedSeqno(seqno_str.to_owned()))?);

    let status = parts.next().unwrap_or("").trim();
    let body = match status {
        "OK" => ResponseBody::Ok(data.map(str::to_owned)),
        "ERROR" => ResponseBody::Error(data.unwrap_or("").to_owned()),
        other => return Err(ProtocolError::MalformedStatus(other.to_owned())),
    };
    Ok((seqno, body))
}
