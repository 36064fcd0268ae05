use std::fmt;

/// A parameter type tag, used in error messages only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Fraction,
    Float,
    Bool,
    Enum,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamKind::Int => "int",
            ParamKind::Fraction => "fraction",
            ParamKind::Float => "float",
            ParamKind::Bool => "bool",
            ParamKind::Enum => "enum",
        };
        f.write_str(s)
    }
}

/// Failure to frame, parse, or type-check a request or response datagram.
///
/// `Display` renders a message suitable for a wire `ERROR` payload or for
/// `tracing` logging — it never includes the raw bytes, only a description.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty datagram")]
    EmptyDatagram,

    #[error("malformed seqno '{0}'")]
    MalformedSeqno(String),

    #[error("missing command name")]
    MissingCommand,

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("{cmd}: missing parameter '{name}'")]
    MissingParam { cmd: &'static str, name: &'static str },

    #[error("{cmd}: parameter '{name}' is not a valid {kind}: '{value}'")]
    InvalidParam {
        cmd: &'static str,
        name: &'static str,
        kind: ParamKind,
        value: String,
    },

    #[error("{cmd}: too many parameters")]
    TooManyParams { cmd: &'static str },

    #[error("malformed response status '{0}' (expected OK or ERROR)")]
    MalformedStatus(String),

    #[error("malformed status block")]
    MalformedStatusBlock,

    #[error("malformed list line '{0}'")]
    MalformedListLine(String),
}
