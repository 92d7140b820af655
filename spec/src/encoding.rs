//! Trace file formats.
//!
//! Two interchange encodings for raw (unexpanded) traces:
//!
//! - JSON: an object keyed by qualified column name, each value an
//!   array of decimal strings (plain numbers are also accepted).
//! - Binary (`.lt`): a `u32` record count followed by one record per
//!   column:
//!
//! ```text
//! [name_len: u16][name: utf8][n: u32][values: 32 bytes LE × n]
//! ```
//!
//! Binary cell values are 256-bit little-endian integers, reduced
//! into the field on read.

use crate::error::{Result, SchemaError};
use crate::field::FieldElement;
use crate::trace::RawColumn;
use std::collections::BTreeMap;

/// Bytes per cell in the binary format
const CELL_BYTES: usize = 32;

// ============================================================================
// JSON traces
// ============================================================================

/// Parse a JSON trace into raw columns.
///
/// Columns are returned in key order; alignment puts them into schema
/// order later.
pub fn trace_from_json(text: &str) -> Result<Vec<RawColumn>> {
    let object: BTreeMap<String, Vec<serde_json::Value>> = serde_json::from_str(text)?;
    let mut columns = Vec::with_capacity(object.len());
    for (qualified, values) in object {
        let mut data = Vec::with_capacity(values.len());
        for value in values {
            data.push(json_cell(&qualified, &value)?);
        }
        columns.push(RawColumn::new(&qualified, data));
    }
    Ok(columns)
}

/// Render raw columns as a JSON trace with decimal-string cells
pub fn trace_to_json(columns: &[RawColumn]) -> String {
    let object: BTreeMap<String, Vec<String>> = columns
        .iter()
        .map(|c| {
            (
                c.qualified_name(),
                c.data.iter().map(|v| v.to_string()).collect(),
            )
        })
        .collect();
    serde_json::to_string(&object).expect("string map serialization cannot fail")
}

fn json_cell(column: &str, value: &serde_json::Value) -> Result<FieldElement> {
    match value {
        serde_json::Value::String(s) => s.parse().map_err(|_| {
            SchemaError::MalformedTrace(format!("column {}: bad value {:?}", column, s))
        }),
        serde_json::Value::Number(n) => match n.as_u64() {
            Some(v) => Ok(FieldElement::new(v)),
            None => Err(SchemaError::MalformedTrace(format!(
                "column {}: bad value {}",
                column, n
            ))),
        },
        other => Err(SchemaError::MalformedTrace(format!(
            "column {}: bad value {}",
            column, other
        ))),
    }
}

// ============================================================================
// Binary traces
// ============================================================================

/// Parse a binary `.lt` trace into raw columns
pub fn trace_from_bytes(bytes: &[u8]) -> Result<Vec<RawColumn>> {
    let mut reader = Reader::new(bytes);
    let count = reader.read_u32()?;
    let mut columns = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_len = reader.read_u16()? as usize;
        let name = reader.read_utf8(name_len)?;
        let cells = reader.read_u32()? as usize;
        let mut data = Vec::with_capacity(cells);
        for _ in 0..cells {
            data.push(reader.read_cell()?);
        }
        columns.push(RawColumn::new(&name, data));
    }
    if !reader.is_empty() {
        return Err(SchemaError::MalformedTrace(format!(
            "{} trailing byte(s)",
            reader.remaining()
        )));
    }
    Ok(columns)
}

/// Render raw columns as a binary `.lt` trace
pub fn trace_to_bytes(columns: &[RawColumn]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(columns.len() as u32).to_le_bytes());
    for column in columns {
        let name = column.qualified_name();
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&(column.data.len() as u32).to_le_bytes());
        for value in &column.data {
            for limb in value.to_le_limbs() {
                out.extend_from_slice(&limb.to_le_bytes());
            }
        }
    }
    out
}

/// Cursor over the byte stream with bounds-checked reads
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos == self.bytes.len()
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(SchemaError::MalformedTrace(format!(
                "unexpected end of file at offset {}",
                self.pos
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_utf8(&mut self, len: usize) -> Result<String> {
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| SchemaError::MalformedTrace("column name is not UTF-8".to_string()))
    }

    fn read_cell(&mut self) -> Result<FieldElement> {
        let bytes = self.take(CELL_BYTES)?;
        let mut limbs = [0u64; 4];
        for (i, limb) in limbs.iter_mut().enumerate() {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&bytes[i * 8..(i + 1) * 8]);
            *limb = u64::from_le_bytes(buf);
        }
        Ok(FieldElement::from_le_limbs(limbs))
    }
}
