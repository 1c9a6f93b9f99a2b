//! Store file saving and loading using `MessagePack`.
//!
//! A store file holds every entity, every recorded manifest, and the state of
//! the identifier generator, so a reloaded store keeps issuing the same
//! identifiers it would have issued before it was saved.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use codex_foundation::{Error, ErrorKind, Result};
use codex_storage::MemoryStore;
use serde::{Deserialize, Serialize};

/// Format version written into every store file.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct StoreFileRef<'a> {
    format: u32,
    store: &'a MemoryStore,
}

#[derive(Deserialize)]
struct StoreFile {
    format: u32,
    store: MemoryStore,
}

/// Serializes a store to bytes using `MessagePack` format.
///
/// Uses named serialization to preserve struct field names.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_bytes(store: &MemoryStore) -> Result<Vec<u8>> {
    let file = StoreFileRef {
        format: FORMAT_VERSION,
        store,
    };
    rmp_serde::to_vec_named(&file)
        .map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))
}

/// Deserializes a store from `MessagePack` bytes.
///
/// # Errors
///
/// Returns an error if deserialization fails or the file was written by an
/// unknown format version.
pub fn from_bytes(bytes: &[u8]) -> Result<MemoryStore> {
    let file: StoreFile = rmp_serde::from_slice(bytes)
        .map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))?;
    if file.format != FORMAT_VERSION {
        return Err(Error::new(ErrorKind::Serialization(format!(
            "unsupported store format {} (expected {FORMAT_VERSION})",
            file.format
        ))));
    }
    Ok(file.store)
}

fn io_error(action: &str, path: &Path, e: &std::io::Error) -> Error {
    Error::new(ErrorKind::Io(format!(
        "failed to {action} '{}': {e}",
        path.display()
    )))
}

/// Saves a store to a file.
///
/// Creates the file if it doesn't exist, or overwrites it if it does.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to,
/// or if serialization fails.
pub fn save_to_file<P: AsRef<Path>>(store: &MemoryStore, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_bytes(store)?;
    let file = File::create(path).map_err(|e| io_error("create file", path, &e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&bytes)
        .map_err(|e| io_error("write to file", path, &e))?;
    writer.flush().map_err(|e| io_error("flush file", path, &e))?;
    Ok(())
}

/// Loads a store from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or if deserialization fails.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<MemoryStore> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| io_error("open file", path, &e))?;
    let mut reader = BufReader::new(file);
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| io_error("read file", path, &e))?;
    from_bytes(&bytes)
}
