//! Intel HEX reader.
//!
//! Only the records a flat firmware image needs are interpreted: data (00),
//! end of file (01), extended linear address (04) and start linear address
//! (05). Everything else is skipped, and checksums are not enforced.

use switchport_core::memory::ProgramImage;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    #[error("line {line}: record is shorter than its byte count")]
    Truncated { line: usize },
    #[error("line {line}: invalid hex digits {text:?}")]
    BadDigits { line: usize, text: String },
}

const DATA: u8 = 0x00;
const END_OF_FILE: u8 = 0x01;
const EXTENDED_LINEAR_ADDRESS: u8 = 0x04;
const START_LINEAR_ADDRESS: u8 = 0x05;

fn field(record: &str, line: usize, start: usize, len: usize) -> Result<u32, HexError> {
    let text = record
        .get(start..start + len)
        .ok_or(HexError::Truncated { line })?;
    u32::from_str_radix(text, 16).map_err(|_| HexError::BadDigits {
        line,
        text: text.to_string(),
    })
}

/// Parses Intel HEX text into an image with one segment per data record.
/// Lines that do not start with `:` are ignored.
pub fn parse_ihex(text: &str) -> Result<ProgramImage, HexError> {
    let mut image = ProgramImage::new(0);
    let mut upper: u64 = 0;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let record = raw.trim();
        if !record.starts_with(':') {
            continue;
        }

        let count = field(record, line, 1, 2)? as usize;
        let addr = field(record, line, 3, 4)? as u64;
        let kind = field(record, line, 7, 2)? as u8;
        let data = (0..count)
            .map(|i| field(record, line, 9 + i * 2, 2).map(|b| b as u8))
            .collect::<Result<Vec<u8>, _>>()?;

        match kind {
            DATA => image.add_segment((upper << 16) + addr, data),
            END_OF_FILE => break,
            EXTENDED_LINEAR_ADDRESS if data.len() >= 2 => {
                upper = ((data[0] as u64) << 8) | data[1] as u64;
            }
            START_LINEAR_ADDRESS if data.len() >= 4 => {
                image.entry_point = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as u64;
            }
            other => tracing::trace!("line {}: skipping record type {:#04x}", line, other),
        }
    }

    Ok(image)
}
