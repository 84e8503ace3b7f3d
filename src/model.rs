use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::template;

/// Description given to interactively created commands that leave it blank.
pub const DEFAULT_CUSTOM_DESCRIPTION: &str = "User's Custom Command";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    #[serde(rename = "WEB")]
    Web,
    #[serde(rename = "SYSTEM")]
    SystemRun,
    #[serde(rename = "OPEN")]
    OpenDetached,
    #[serde(rename = "CONSOLE")]
    Console,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Web => "WEB",
            ActionType::SystemRun => "SYSTEM",
            ActionType::OpenDetached => "OPEN",
            ActionType::Console => "CONSOLE",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WEB" => Ok(ActionType::Web),
            "SYSTEM" => Ok(ActionType::SystemRun),
            "OPEN" => Ok(ActionType::OpenDetached),
            "CONSOLE" => Ok(ActionType::Console),
            other => Err(format!("unknown action type '{}'", other)),
        }
    }
}

/// Where a command came from. Only `Custom` commands may be edited or deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    #[serde(rename = "BUILT-IN", alias = "BUILTIN")]
    BuiltIn,
    #[serde(rename = "CUSTOM")]
    Custom,
    #[serde(rename = "HISTORY")]
    History,
}

/// The fields that decide whether two commands are "the same" command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub name: String,
    pub description: String,
    pub action: ActionType,
    pub target: String,
}

#[derive(Debug, Clone)]
pub struct Command {
    pub name: String,            // Display name
    pub description: String,     // Secondary label
    pub action: ActionType,
    pub target: String,          // Template string, may contain {placeholders}
    pub origin: Origin,
    pub variables: BTreeMap<String, String>, // Placeholder defaults
}

impl Command {
    pub fn new(name: String, description: String, action: ActionType, target: String, origin: Origin) -> Self {
        Self {
            name,
            description,
            action,
            target,
            origin,
            variables: BTreeMap::new(),
        }
    }

    pub fn builtin(name: &str, description: &str, action: ActionType, target: &str) -> Self {
        Self::new(name.to_string(), description.to_string(), action, target.to_string(), Origin::BuiltIn)
    }

    /// Builds a user-created command, trimming input and rejecting a blank
    /// name or target, or a variable the target never uses as a placeholder.
    pub fn custom(
        name: &str,
        description: &str,
        action: ActionType,
        target: &str,
        variables: BTreeMap<String, String>,
    ) -> Result<Self, RegistryError> {
        let name = name.trim();
        let target = target.trim();
        if name.is_empty() || target.is_empty() {
            return Err(RegistryError::InvalidCommand(
                "name and target cannot be left blank".to_string(),
            ));
        }
        let description = match description.trim() {
            "" => DEFAULT_CUSTOM_DESCRIPTION,
            d => d,
        };

        let mut command = Self::new(
            name.to_string(),
            description.to_string(),
            action,
            target.to_string(),
            Origin::Custom,
        );
        let placeholders = template::extract_placeholders(target);
        if let Some(unused) = variables.keys().find(|k| !placeholders.contains(*k)) {
            return Err(RegistryError::InvalidCommand(format!(
                "variable '{}' is not a placeholder in the target",
                unused
            )));
        }
        command.variables = variables;
        Ok(command)
    }

    pub fn key(&self) -> IdentityKey {
        IdentityKey {
            name: self.name.clone(),
            description: self.description.clone(),
            action: self.action,
            target: self.target.clone(),
        }
    }

    pub fn has_key(&self, key: &IdentityKey) -> bool {
        self.name == key.name
            && self.description == key.description
            && self.action == key.action
            && self.target == key.target
    }

    pub fn same_identity(&self, other: &Command) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.action == other.action
            && self.target == other.target
    }

    pub fn is_editable(&self) -> bool {
        self.origin == Origin::Custom
    }

    /// Copy of this command as it is stored in the recency list.
    pub fn as_history(&self) -> Command {
        Command {
            origin: Origin::History,
            ..self.clone()
        }
    }

    pub fn from_record(record: StoredRecord, default_origin: Origin) -> Self {
        match record {
            StoredRecord::Full(name, description, action, target, origin, variables) => Self {
                name,
                description,
                action,
                target,
                origin,
                variables,
            },
            StoredRecord::WithOrigin(name, description, action, target, origin) => {
                Self::new(name, description, action, target, origin)
            }
            StoredRecord::Bare(name, description, action, target) => {
                Self::new(name, description, action, target, default_origin)
            }
        }
    }

    pub fn to_record(&self) -> StoredRecord {
        StoredRecord::Full(
            self.name.clone(),
            self.description.clone(),
            self.action,
            self.target.clone(),
            self.origin,
            self.variables.clone(),
        )
    }

    /// The four identity fields only, as written by export.
    pub fn to_bare_record(&self) -> StoredRecord {
        StoredRecord::Bare(
            self.name.clone(),
            self.description.clone(),
            self.action,
            self.target.clone(),
        )
    }
}

/// On-disk shape of a command: a positional JSON array of 4, 5 or 6 fields.
/// Narrower arrays come from older files; missing trailing fields are filled
/// in by [`Command::from_record`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredRecord {
    Full(String, String, ActionType, String, Origin, BTreeMap<String, String>),
    WithOrigin(String, String, ActionType, String, Origin),
    Bare(String, String, ActionType, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_widths_default_missing_fields() {
        let bare: StoredRecord = serde_json::from_str(r#"["A","d","WEB","http://a"]"#).unwrap();
        let cmd = Command::from_record(bare, Origin::History);
        assert_eq!(cmd.origin, Origin::History);
        assert!(cmd.variables.is_empty());

        let five: StoredRecord = serde_json::from_str(r#"["A","d","SYSTEM","ls","CUSTOM"]"#).unwrap();
        let cmd = Command::from_record(five, Origin::History);
        assert_eq!(cmd.origin, Origin::Custom);
        assert_eq!(cmd.action, ActionType::SystemRun);

        let six: StoredRecord =
            serde_json::from_str(r#"["A","d","OPEN","x {f}","BUILT-IN",{"f":"a.txt"}]"#).unwrap();
        let cmd = Command::from_record(six, Origin::Custom);
        assert_eq!(cmd.origin, Origin::BuiltIn);
        assert_eq!(cmd.variables.get("f").map(String::as_str), Some("a.txt"));
    }

    #[test]
    fn test_record_rejects_wrong_width_and_unknown_action() {
        assert!(serde_json::from_str::<StoredRecord>(r#"["A","d","WEB"]"#).is_err());
        assert!(serde_json::from_str::<StoredRecord>(r#"["A","d","FTP","x"]"#).is_err());
        assert!(serde_json::from_str::<StoredRecord>(r#"["A","d","WEB","x","CUSTOM",{},1]"#).is_err());
    }

    #[test]
    fn test_identity_ignores_origin_and_variables() {
        let mut a = Command::builtin("Docs", "rust docs", ActionType::Web, "https://doc.rust-lang.org");
        let b = a.as_history();
        a.variables.insert("unused".into(), "x".into());
        assert!(a.same_identity(&b));
        assert_eq!(a.key(), b.key());
        assert_eq!(b.origin, Origin::History);
    }

    #[test]
    fn test_custom_validation() {
        assert!(Command::custom("  ", "d", ActionType::Web, "x", BTreeMap::new()).is_err());
        assert!(Command::custom("n", "d", ActionType::Web, " ", BTreeMap::new()).is_err());

        let mut vars = BTreeMap::new();
        vars.insert("q".to_string(), "rust".to_string());
        let cmd = Command::custom(" Search ", "", ActionType::Web, "https://s/{q}", vars.clone()).unwrap();
        assert_eq!(cmd.name, "Search");
        assert_eq!(cmd.description, DEFAULT_CUSTOM_DESCRIPTION);
        assert_eq!(cmd.variables, vars);

        let plain = Command::custom("Plain", "d", ActionType::Web, "https://s", vars).unwrap_err();
        assert!(matches!(plain, RegistryError::InvalidCommand(_)));
    }

    #[test]
    fn test_custom_rejects_variable_that_is_not_a_placeholder() {
        let mut vars = BTreeMap::new();
        vars.insert("search term".to_string(), "rust".to_string());
        let err = Command::custom("G", "d", ActionType::Web, "https://g/?q={search term}", vars).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidCommand(msg) if msg.contains("search term")));
    }

    #[test]
    fn test_action_type_parse() {
        assert_eq!("web".parse::<ActionType>(), Ok(ActionType::Web));
        assert_eq!("OPEN".parse::<ActionType>(), Ok(ActionType::OpenDetached));
        assert!("launch".parse::<ActionType>().is_err());
    }
}
