use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::config::Config;
use crate::error::StoreError;
use crate::model::{Command, Origin, StoredRecord};

/// JSON files backing the custom command set and the recency list.
#[derive(Debug, Clone)]
pub struct Store {
    custom_path: PathBuf,
    history_path: PathBuf,
}

impl Store {
    pub fn new(custom_path: impl Into<PathBuf>, history_path: impl Into<PathBuf>) -> Self {
        Self {
            custom_path: custom_path.into(),
            history_path: history_path.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.custom_commands_path(), config.history_path())
    }

    pub fn custom_path(&self) -> &Path {
        &self.custom_path
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    pub fn load_custom(&self) -> Vec<Command> {
        load_commands(&self.custom_path, Origin::Custom)
    }

    /// Everything in this file is custom, whatever origin the caller holds.
    pub fn save_custom(&self, commands: &[Command]) -> Result<(), StoreError> {
        let records: Vec<StoredRecord> = commands
            .iter()
            .map(|c| {
                let mut record = c.to_record();
                if let StoredRecord::Full(_, _, _, _, origin, _) = &mut record {
                    *origin = Origin::Custom;
                }
                record
            })
            .collect();
        write_json(&self.custom_path, &records)?;
        info!("Store: saved {} custom commands to {:?}", records.len(), self.custom_path);
        Ok(())
    }

    pub fn load_history(&self) -> Vec<Command> {
        load_commands(&self.history_path, Origin::History)
    }

    pub fn save_history(&self, history: &[Command]) -> Result<(), StoreError> {
        let records: Vec<StoredRecord> = history.iter().map(|c| c.as_history().to_record()).collect();
        write_json(&self.history_path, &records)?;
        debug!("Store: saved {} history entries to {:?}", records.len(), self.history_path);
        Ok(())
    }
}

/// Reads a command file. Missing or corrupt files yield an empty list and
/// individual malformed records are skipped; nothing here stops startup.
pub fn load_commands(path: &Path, default_origin: Origin) -> Vec<Command> {
    let values = match read_list(path) {
        Ok(values) => values,
        Err(StoreError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
            debug!("Store: {:?} does not exist, starting empty", path);
            return Vec::new();
        }
        Err(e) => {
            warn!("Store: {}. Starting with an empty list.", e);
            return Vec::new();
        }
    };

    let mut commands = Vec::with_capacity(values.len());
    for value in values {
        match serde_json::from_value::<StoredRecord>(value) {
            Ok(record) => commands.push(Command::from_record(record, default_origin)),
            Err(e) => warn!("Store: skipping malformed record in {:?}: {}", path, e),
        }
    }
    info!("Store: loaded {} commands from {:?}", commands.len(), path);
    commands
}

/// Reads a file whose top level must be a JSON array.
pub fn read_list(path: &Path) -> Result<Vec<Value>, StoreError> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Array(values) => Ok(values),
        _ => Err(StoreError::NotAList(path.to_path_buf())),
    }
}

/// Writes the identity fields of `commands` to `path`, returning how many were written.
pub fn write_export(path: &Path, commands: &[&Command]) -> Result<usize, StoreError> {
    let records: Vec<StoredRecord> = commands.iter().map(|c| c.to_bare_record()).collect();
    write_json(path, &records)?;
    info!("Store: exported {} commands to {:?}", records.len(), path);
    Ok(records.len())
}

/// Serializes into a sibling temp file and renames it over `path`, so a
/// failed write leaves the previous contents intact.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let write_err = |source: std::io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let content = serde_json::to_string_pretty(value).map_err(|e| write_err(e.into()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(content.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
