//! `LIST` response body: one CSV line per captured file,
//! `<type>,<index>,<ts>,<size>`.

use crate::command::FileType;
use crate::error::ProtocolError;
use crate::params::{parse_float, parse_index};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FileEntry {
    pub file_type: FileType,
    pub index: u32,
    pub timestamp_unix: f64,
    pub size_bytes: u64,
}

pub fn encode_file_list(entries: &[FileEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            format!(
                "{},{},{},{}",
                e.file_type.as_str(),
                e.index,
                e.timestamp_unix,
                e.size_bytes
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn decode_file_list(text: &str) -> Result<Vec<FileEntry>, ProtocolError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.lines().map(decode_file_line).collect()
}

fn decode_file_line(line: &str) -> Result<FileEntry, ProtocolError> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != 4 {
        return Err(ProtocolError::MalformedListLine(line.to_owned()));
    }
    let file_type = FileType::parse(fields[0])
        .ok_or_else(|| ProtocolError::MalformedListLine(line.to_owned()))?;
    let index = parse_index("LIST", "index", fields[1])?;
    let timestamp_unix = parse_float("LIST", "timestamp", fields[2])?;
    let size_bytes: u64 = fields[3]
        .parse()
        .map_err(|_| ProtocolError::MalformedListLine(line.to_owned()))?;
    Ok(FileEntry { file_type, index, timestamp_unix, size_bytes })
}
