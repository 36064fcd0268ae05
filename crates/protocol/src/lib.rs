//! protocol: pure framing and parsing for the Compound Pi control channel.
//!
//! No I/O lives here — sockets, retries, and dispatch belong to `repeater`,
//! `server`, and `client`. This crate only turns bytes into typed values and
//! back, and enforces the textual grammar described in the protocol spec.

pub mod codec;
pub mod command;
pub mod error;
pub mod file_list;
pub mod params;
pub mod seqno;
pub mod status;

pub use codec::{ResponseBody, decode_request, decode_response, encode_request, encode_response};
pub use command::{Command, FileType, RecordFormat};
pub use error::{ParamKind, ProtocolError};
pub use file_list::{FileEntry, decode_file_list, encode_file_list};
pub use params::Fraction;
pub use seqno::Seqno;
pub use status::StatusSnapshot;
