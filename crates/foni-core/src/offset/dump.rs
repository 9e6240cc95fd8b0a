use serde::Serialize;
use std::fs;
use std::path::Path;
use strum::IntoEnumIterator;

use crate::error::Result;
use crate::memory::ReadMemory;
use crate::memory::layout::{scan, string};

use super::{EntityOffsetMap, OffsetField};

/// Offset dump for diagnostic purposes
#[derive(Debug, Clone, Serialize)]
pub struct OffsetDump {
    pub drivers: Vec<DriverDump>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DriverDump {
    pub name: String,
    pub fields: Vec<FieldDump>,
}

/// One field's address and what currently sits there
#[derive(Debug, Clone, Serialize)]
pub struct FieldDump {
    pub field: &'static str,
    pub address: Option<String>,
    pub text: Option<String>,
}

impl OffsetDump {
    /// Create a dump from offsets and memory reader
    pub fn from_offsets<R: ReadMemory + ?Sized>(map: &EntityOffsetMap, reader: &R) -> Self {
        let drivers = map
            .iter()
            .map(|(name, record)| DriverDump {
                name: name.to_string(),
                fields: OffsetField::iter()
                    .map(|field| {
                        let address = record.get(field);
                        FieldDump {
                            field: field.name(),
                            address: address.map(|a| format!("0x{:X}", a)),
                            text: address.and_then(|a| read_string(reader, a)),
                        }
                    })
                    .collect(),
            })
            .collect();

        Self { drivers }
    }

    /// Save dump to JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Read the zero-terminated string at `address`, up to the longest length a
/// header can describe.
pub fn read_string<R: ReadMemory + ?Sized>(reader: &R, address: u64) -> Option<String> {
    // Chunks never cross a page edge; stop at the first page that cannot be read
    let mut bytes = Vec::new();
    let mut next = address;
    while bytes.len() < string::MAX_LEN {
        let to_page_end = (scan::BLOCK_SIZE - next % scan::BLOCK_SIZE) as usize;
        let chunk_len = (string::MAX_LEN - bytes.len()).min(16).min(to_page_end);
        let chunk = reader.read_bytes(next, chunk_len).ok()?;
        match chunk.iter().position(|b| *b == string::TERMINATOR) {
            Some(end) => {
                bytes.extend_from_slice(&chunk[..end]);
                return Some(String::from_utf8_lossy(&bytes).into_owned());
            }
            None => bytes.extend_from_slice(&chunk),
        }
        next = next.checked_add(chunk_len as u64)?;
    }
    Some(String::from_utf8_lossy(&bytes).into_owned())
}
