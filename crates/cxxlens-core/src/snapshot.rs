//! # Memory Snapshots
//!
//! A snapshot is a JSON capture of the parts of linear memory a value touches,
//! together with the type layouts needed to read it. It lets formatting be
//! reproduced away from a live debuggee:
//!
//! ```json
//! {
//!   "memory_size": 65536,
//!   "segments": [{ "address": 4096, "bytes": "68656c6c6f00" }],
//!   "types": [
//!     { "names": ["char"], "size": 1, "kind": "scalar" },
//!     { "names": ["char *"], "size": 4, "kind": "pointer", "pointee": "char" }
//!   ]
//! }
//! ```
//!
//! Bytes not covered by a segment read as zero.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LensError, Result};
use crate::memory::LinearMemory;
use crate::types::{Address, TypeInfo, TypeTable};

/// A contiguous run of captured bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment
{
    /// Address of the first byte
    pub address: u32,
    /// Contents, hex encoded
    pub bytes: String,
}

/// Captured memory plus type layouts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot
{
    /// Size of the memory to recreate; grown to fit every segment
    #[serde(default)]
    pub memory_size: Option<u32>,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub types: Vec<TypeInfo>,
}

impl Snapshot
{
    /// Parse a snapshot from JSON text.
    ///
    /// ## Errors
    ///
    /// - `Json`: the text is not a valid snapshot document
    pub fn from_json(text: &str) -> Result<Self>
    {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a snapshot file.
    ///
    /// ## Errors
    ///
    /// - `Io`: the file could not be read
    /// - `Json`: the file is not a valid snapshot document
    pub fn load(path: impl AsRef<Path>) -> Result<Self>
    {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading snapshot");
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Rebuild the captured memory.
    ///
    /// ## Errors
    ///
    /// - `InvalidSnapshot`: a segment is not valid hex or ends past 4 GiB
    pub fn memory(&self) -> Result<LinearMemory>
    {
        let mut decoded = Vec::with_capacity(self.segments.len());
        let mut size = u64::from(self.memory_size.unwrap_or(0));
        for segment in &self.segments {
            let bytes = hex::decode(&segment.bytes)
                .map_err(|err| LensError::InvalidSnapshot(format!("segment at {:#x}: {err}", segment.address)))?;
            let end = u64::from(segment.address) + bytes.len() as u64;
            size = size.max(end);
            decoded.push((Address::new(segment.address), bytes));
        }

        let size = u32::try_from(size)
            .map_err(|_| LensError::InvalidSnapshot(format!("memory of {size} bytes exceeds the wasm32 address space")))?;
        let mut memory = LinearMemory::new(size);
        for (address, bytes) in decoded {
            memory.write(address, &bytes)?;
        }
        debug!(size, segments = self.segments.len(), "rebuilt snapshot memory");
        Ok(memory)
    }

    /// The captured layouts as a lookup table.
    pub fn type_table(&self) -> TypeTable
    {
        self.types.iter().cloned().collect()
    }
}
