use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;

use crate::history::DEFAULT_HISTORY_SIZE;
use crate::model::{ActionType, Command};
use crate::ranker::{DEFAULT_RESULT_LIMIT, DEFAULT_THRESHOLD};

/// Console target that asks the front end to quit.
pub const CONSOLE_EXIT: &str = "exit";
/// Console target that asks the front end to show its settings surface.
pub const CONSOLE_SETTINGS: &str = "setting-window";

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default = "default_true")]
    pub include_defaults: bool,
    #[serde(default)]
    pub commands: Vec<StaticCommand>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_threshold")]
    pub fuzzy_threshold: u8,
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    #[serde(default = "default_shell")]
    pub shell: String,
    #[serde(default)]
    pub web_opener: Option<String>,
}

fn default_threshold() -> u8 { DEFAULT_THRESHOLD }
fn default_result_limit() -> usize { DEFAULT_RESULT_LIMIT }
fn default_history_size() -> usize { DEFAULT_HISTORY_SIZE }
fn default_shell() -> String { "sh".to_string() }
fn default_true() -> bool { true }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: default_threshold(),
            result_limit: default_result_limit(),
            history_size: default_history_size(),
            shell: default_shell(),
            web_opener: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PathsConfig {
    pub custom_commands: Option<PathBuf>,
    pub history: Option<PathBuf>,
}

/// A built-in command declared in the config file.
#[derive(Deserialize, Debug, Clone)]
pub struct StaticCommand {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub action: ActionType,
    pub target: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            paths: PathsConfig::default(),
            include_defaults: true,
            commands: Vec::new(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "palette", "palette")
}

pub fn default_config_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

fn data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    pub fn custom_commands_path(&self) -> PathBuf {
        self.paths
            .custom_commands
            .clone()
            .unwrap_or_else(|| data_dir().join("custom_commands.json"))
    }

    pub fn history_path(&self) -> PathBuf {
        self.paths
            .history
            .clone()
            .unwrap_or_else(|| data_dir().join("command_history.json"))
    }

    /// The shipped defaults (unless disabled) followed by `[[commands]]`.
    pub fn builtin_commands(&self) -> Vec<Command> {
        let mut commands = if self.include_defaults { default_commands() } else { Vec::new() };
        commands.extend(
            self.commands
                .iter()
                .map(|c| Command::builtin(&c.name, &c.description, c.action, &c.target)),
        );
        commands
    }
}

pub fn default_commands() -> Vec<Command> {
    vec![
        Command::builtin("Settings", "Open the settings", ActionType::Console, CONSOLE_SETTINGS),
        Command::builtin("Exit", "Close the command palette", ActionType::Console, CONSOLE_EXIT),
        Command::builtin("YouTube", "Open YouTube", ActionType::Web, "https://www.youtube.com"),
        Command::builtin("GitHub", "Open GitHub", ActionType::Web, "https://github.com"),
        Command::builtin("Google", "Open Google search", ActionType::Web, "https://www.google.com"),
        Command::builtin("Rust Docs", "Open the Rust standard library docs", ActionType::Web, "https://doc.rust-lang.org/std/"),
        Command::builtin("Disk Usage", "Show mounted filesystem usage", ActionType::SystemRun, "df -h"),
        Command::builtin("File Manager", "Open the home directory", ActionType::OpenDetached, "xdg-open ~"),
    ]
}

/// Reads `path`, or the default location when `None`. A missing file gives defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

    if !config_path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("reading {:?}", config_path))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("parsing {:?}", config_path))?;
    Ok(config)
}
