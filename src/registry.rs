use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use log::{error, info, warn};
use serde_json::Value;

use crate::error::{RegistryError, StoreError};
use crate::history::History;
use crate::model::{Command, IdentityKey, Origin, StoredRecord};
use crate::store::{self, Store};

/// Outcome of an import: how many records were added and how many were
/// dropped as malformed or already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

/// An import report plus the error from saving it, if any. The imported
/// commands stay in the registry either way.
#[derive(Debug)]
pub struct ImportOutcome {
    pub report: ImportReport,
    pub save_error: Option<StoreError>,
}

/// Owns the command list (built-ins, then custom commands) and the history.
/// All mutations go through here and are written to the [`Store`] before
/// returning. When a write fails the in-memory state is kept and the error
/// is handed back.
pub struct Registry {
    commands: Vec<Command>,
    history: History,
    store: Store,
}

impl Registry {
    pub fn new(builtins: Vec<Command>, store: Store, history_size: usize) -> Self {
        let mut commands: Vec<Command> = builtins
            .into_iter()
            .map(|mut c| {
                c.origin = Origin::BuiltIn;
                c
            })
            .collect();
        let builtin_count = commands.len();

        commands.extend(store.load_custom().into_iter().map(|mut c| {
            c.origin = Origin::Custom;
            c
        }));
        let history = History::from_entries(store.load_history(), history_size);

        info!(
            "Registry: {} built-in, {} custom, {} history",
            builtin_count,
            commands.len() - builtin_count,
            history.len()
        );
        Self { commands, history, store }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn history(&self) -> &[Command] {
        self.history.entries()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn custom_commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().filter(|c| c.origin == Origin::Custom)
    }

    /// First command with this exact name, in registry order.
    pub fn find(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }

    pub fn find_key(&self, key: &IdentityKey) -> Option<&Command> {
        self.commands.iter().find(|c| c.has_key(key))
    }

    pub fn add(&mut self, command: Command) -> Result<(), RegistryError> {
        validate(&command)?;
        if self.commands.iter().any(|c| c.name == command.name) {
            return Err(RegistryError::DuplicateName(command.name));
        }

        info!("Registry: adding custom command '{}'", command.name);
        self.commands.push(Command {
            origin: Origin::Custom,
            ..command
        });
        self.save_custom()?;
        Ok(())
    }

    /// Replaces the custom command identified by `old` with `new`. The new
    /// name may equal the old one but not that of any other command.
    pub fn edit(&mut self, old: &IdentityKey, new: Command) -> Result<(), RegistryError> {
        let existing = self
            .find_key(old)
            .ok_or_else(|| RegistryError::NotFound(old.name.clone()))?;
        if !existing.is_editable() {
            return Err(RegistryError::NotEditable(old.name.clone()));
        }
        validate(&new)?;
        if self
            .commands
            .iter()
            .any(|c| !c.has_key(old) && c.name == new.name)
        {
            return Err(RegistryError::DuplicateName(new.name));
        }

        info!("Registry: updating '{}' -> '{}'", old.name, new.name);
        self.commands.retain(|c| !c.has_key(old));
        self.history.remove(old);
        self.commands.push(Command {
            origin: Origin::Custom,
            ..new
        });

        let custom = self.save_custom();
        let history = self.save_history();
        custom?;
        history?;
        Ok(())
    }

    /// Removes a custom command from the registry, the custom store and the history.
    pub fn delete(&mut self, key: &IdentityKey) -> Result<Command, RegistryError> {
        let existing = self
            .find_key(key)
            .ok_or_else(|| RegistryError::NotFound(key.name.clone()))?;
        if !existing.is_editable() {
            return Err(RegistryError::NotEditable(key.name.clone()));
        }
        let removed = existing.clone();

        self.commands.retain(|c| !c.has_key(key));
        let dropped = self.history.remove(key);
        info!("Registry: deleted '{}' ({} history entries dropped)", key.name, dropped);

        let custom = self.save_custom();
        let history = self.save_history();
        custom?;
        history?;
        Ok(removed)
    }

    /// Pushes `command` to the front of the history and persists it.
    pub fn record(&mut self, command: &Command) -> Result<(), StoreError> {
        self.history.record(command);
        self.save_history()
    }

    /// Changes the history cap, dropping and saving any overflow.
    pub fn set_history_size(&mut self, size: usize) -> Result<(), StoreError> {
        self.history.set_max_size(size);
        self.save_history()
    }

    /// Adds each 4- or 5-field record whose name is not taken as a custom
    /// command with no variables. Anything else is skipped.
    pub fn import_records(&mut self, records: Vec<Value>) -> ImportOutcome {
        let mut names: HashSet<String> = self.commands.iter().map(|c| c.name.clone()).collect();
        let mut report = ImportReport::default();

        for value in records {
            let command = match parse_import_record(value) {
                Ok(command) => command,
                Err(reason) => {
                    warn!("Registry: skipping import record: {}", reason);
                    report.skipped += 1;
                    continue;
                }
            };
            if names.contains(&command.name) {
                report.skipped += 1;
                continue;
            }
            names.insert(command.name.clone());
            self.commands.push(command);
            report.imported += 1;
        }

        info!("Registry: imported {}, skipped {}", report.imported, report.skipped);
        let save_error = if report.imported > 0 {
            self.save_custom().err()
        } else {
            None
        };
        ImportOutcome { report, save_error }
    }

    pub fn import_file(&mut self, path: &Path) -> Result<ImportOutcome, RegistryError> {
        let records = store::read_list(path)?;
        Ok(self.import_records(records))
    }

    /// Writes the identity fields of every custom command to `path`.
    pub fn export_file(&self, path: &Path) -> Result<usize, RegistryError> {
        let custom: Vec<&Command> = self.custom_commands().collect();
        Ok(store::write_export(path, &custom)?)
    }

    fn save_custom(&self) -> Result<(), StoreError> {
        let custom: Vec<Command> = self.custom_commands().cloned().collect();
        self.store.save_custom(&custom).inspect_err(|e| error!("Registry: {}", e))
    }

    fn save_history(&self) -> Result<(), StoreError> {
        self.store
            .save_history(self.history.entries())
            .inspect_err(|e| error!("Registry: {}", e))
    }
}

fn validate(command: &Command) -> Result<(), RegistryError> {
    if command.name.trim().is_empty() || command.target.trim().is_empty() {
        return Err(RegistryError::InvalidCommand(
            "name and target cannot be left blank".to_string(),
        ));
    }
    Ok(())
}

fn parse_import_record(value: Value) -> Result<Command, String> {
    let fields = match value {
        Value::Array(fields) if fields.len() == 4 || fields.len() == 5 => fields,
        Value::Array(fields) => return Err(format!("expected 4 or 5 fields, got {}", fields.len())),
        other => return Err(format!("expected a list, got {}", other)),
    };
    let identity = Value::Array(fields.into_iter().take(4).collect());
    let record: StoredRecord = serde_json::from_value(identity).map_err(|e| e.to_string())?;
    let mut command = Command::from_record(record, Origin::Custom);
    command.origin = Origin::Custom;
    command.variables = BTreeMap::new();
    if command.name.trim().is_empty() || command.target.trim().is_empty() {
        return Err(format!("blank name or target in '{}'", command.name));
    }
    Ok(command)
}
