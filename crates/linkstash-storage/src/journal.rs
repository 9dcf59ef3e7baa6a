//! Append-only changelog backing the in-memory engine.
//!
//! Every write appends one line `id \t owner_id \t original_url \t deleted`.
//! Replaying the file in order rebuilds the latest state of every id.

use linkstash_core::{LinkEntity, Result, StorageError};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

const FIELD_SEPARATOR: char = '\t';
const FIELD_COUNT: usize = 4;

/// A tab-delimited journal file.
///
/// The file is opened and closed on every append and synced before the append
/// returns. Callers serialize appends; the journal holds no lock of its own.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encodes an entity as one journal line, newline included.
    ///
    /// Fails with [`StorageError::InvalidData`] if a field would break the
    /// line format.
    pub fn encode(entity: &LinkEntity) -> Result<String> {
        for (name, value) in [
            ("id", &entity.id),
            ("owner_id", &entity.owner_id),
            ("original_url", &entity.original_url),
        ] {
            if value.contains([FIELD_SEPARATOR, '\n', '\r']) {
                return Err(StorageError::InvalidData(format!(
                    "{name} of '{}' contains a tab or line break",
                    entity.id
                )));
            }
        }

        Ok(format!(
            "{}\t{}\t{}\t{}\n",
            entity.id, entity.owner_id, entity.original_url, entity.deleted
        ))
    }

    /// Appends already encoded lines in a single write and syncs the file.
    pub fn append_encoded(&self, lines: &str) -> Result<()> {
        if lines.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error("open", e))?;
        file.write_all(lines.as_bytes())
            .map_err(|e| self.io_error("write", e))?;
        file.sync_data().map_err(|e| self.io_error("sync", e))
    }

    /// Appends one entity.
    pub fn append(&self, entity: &LinkEntity) -> Result<()> {
        self.append_encoded(&Self::encode(entity)?)
    }

    /// Replays the journal into `dest`. Later lines for an id overwrite
    /// earlier ones. A missing file is an empty journal.
    ///
    /// Returns the number of lines applied.
    pub fn replay(&self, dest: &mut HashMap<String, LinkEntity>) -> Result<usize> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(self.io_error("open", e)),
        };

        let mut applied = 0;
        for (index, line) in BufReader::new(file).split(b'\n').enumerate() {
            let line_number = index + 1;
            let mut bytes = line.map_err(|e| self.io_error("read", e))?;
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            let line = String::from_utf8(bytes).map_err(|_| {
                StorageError::InvalidData(format!(
                    "journal line {line_number}: not valid UTF-8"
                ))
            })?;
            let entity = decode_line(&line, line_number)?;
            dest.insert(entity.id.clone(), entity);
            applied += 1;
        }

        Ok(applied)
    }

    fn io_error(&self, action: &str, err: io::Error) -> StorageError {
        StorageError::Journal(format!(
            "failed to {action} '{}': {err}",
            self.path.display()
        ))
    }
}

fn decode_line(line: &str, line_number: usize) -> Result<LinkEntity> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if fields.len() != FIELD_COUNT {
        return Err(StorageError::InvalidData(format!(
            "journal line {line_number}: expected {FIELD_COUNT} fields, got {}",
            fields.len()
        )));
    }

    let deleted: bool = fields[3].parse().map_err(|_| {
        StorageError::InvalidData(format!(
            "journal line {line_number}: invalid deleted flag '{}'",
            fields[3]
        ))
    })?;

    Ok(LinkEntity {
        id: fields[0].to_string(),
        owner_id: fields[1].to_string(),
        original_url: fields[2].to_string(),
        deleted,
    })
}
