use std::collections::BTreeMap;
use std::process::{Command as Process, Stdio};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::config::{Config, CONSOLE_EXIT, CONSOLE_SETTINGS};
use crate::error::{DispatchError, StoreError};
use crate::model::{ActionType, Command};
use crate::registry::Registry;
use crate::template;

/// Performs the external side of a dispatch.
///
/// Failures are reported back for logging only; the dispatcher never
/// changes course because a launch failed.
pub trait Launcher {
    fn open_url(&mut self, url: &str) -> Result<()>;
    /// Runs to completion. The exit status is not interpreted.
    fn run_blocking(&mut self, command_line: &str) -> Result<()>;
    fn spawn_detached(&mut self, command_line: &str) -> Result<()>;
}

/// Meta-actions a `Console` command asks the front end to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleAction {
    Exit,
    ShowSettings,
    Unknown(String),
}

impl ConsoleAction {
    fn parse(target: &str) -> Self {
        match target {
            CONSOLE_EXIT => ConsoleAction::Exit,
            CONSOLE_SETTINGS => ConsoleAction::ShowSettings,
            other => ConsoleAction::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Opened,
    Ran,
    Spawned,
    Console(ConsoleAction),
}

#[derive(Debug)]
pub struct DispatchResult {
    pub name: String,
    pub rendered: String,
    pub outcome: Outcome,
    /// Set when the history entry was recorded in memory but could not be saved.
    pub history_error: Option<StoreError>,
}

pub struct Dispatcher<L: Launcher> {
    launcher: L,
}

impl<L: Launcher> Dispatcher<L> {
    pub fn new(launcher: L) -> Self {
        Self { launcher }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Renders the target with the command's current variable values,
    /// performs the action and records the command in history.
    pub fn execute(&mut self, registry: &mut Registry, command: &Command) -> Result<DispatchResult, DispatchError> {
        self.dispatch(registry, command.clone())
    }

    /// Like [`Dispatcher::execute`] with `values` layered over the defaults.
    /// The history entry keeps the values that were used.
    pub fn execute_with(
        &mut self,
        registry: &mut Registry,
        command: &Command,
        values: &BTreeMap<String, String>,
    ) -> Result<DispatchResult, DispatchError> {
        let mut command = command.clone();
        command
            .variables
            .extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.dispatch(registry, command)
    }

    fn dispatch(&mut self, registry: &mut Registry, command: Command) -> Result<DispatchResult, DispatchError> {
        let rendered = template::render(&command.target, &command.variables).map_err(|source| {
            warn!("Dispatcher: not running '{}': {}", command.name, source);
            DispatchError::Template {
                name: command.name.clone(),
                source,
            }
        })?;

        info!("Dispatcher: {} '{}' -> {}", command.action, command.name, rendered);
        let (outcome, launched) = match command.action {
            ActionType::Web => (Outcome::Opened, self.launcher.open_url(&rendered)),
            ActionType::SystemRun => (Outcome::Ran, self.launcher.run_blocking(&rendered)),
            ActionType::OpenDetached => (Outcome::Spawned, self.launcher.spawn_detached(&rendered)),
            ActionType::Console => (Outcome::Console(ConsoleAction::parse(&rendered)), Ok(())),
        };
        if let Err(e) = launched {
            warn!("Dispatcher: '{}' failed to launch: {:#}", command.name, e);
        }

        let history_error = match outcome {
            Outcome::Console(ConsoleAction::Exit) => None,
            _ => registry.record(&command).err(),
        };

        Ok(DispatchResult {
            name: command.name,
            rendered,
            outcome,
            history_error,
        })
    }
}

/// Launches through the host: a URL opener for `Web`, `<shell> -c` otherwise.
pub struct SystemLauncher {
    shell: String,
    web_opener: Option<String>,
}

impl SystemLauncher {
    pub fn new(shell: String, web_opener: Option<String>) -> Self {
        Self { shell, web_opener }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.general.shell.clone(), config.general.web_opener.clone())
    }

    fn shell_command(&self, command_line: &str) -> Process {
        let mut command = Process::new(&self.shell);
        command.arg("-c").arg(command_line);
        command
    }
}

fn platform_opener() -> &'static [&'static str] {
    if cfg!(target_os = "macos") {
        &["open"]
    } else if cfg!(target_os = "windows") {
        &["cmd", "/C", "start", ""]
    } else {
        &["xdg-open"]
    }
}

impl Launcher for SystemLauncher {
    fn open_url(&mut self, url: &str) -> Result<()> {
        let mut cmd_parts: Vec<&str> = match &self.web_opener {
            Some(opener) => opener.split_whitespace().collect(),
            None => platform_opener().to_vec(),
        };
        cmd_parts.push(url);

        Process::new(cmd_parts[0])
            .args(&cmd_parts[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("opening {}", url))?;
        Ok(())
    }

    fn run_blocking(&mut self, command_line: &str) -> Result<()> {
        let status = self
            .shell_command(command_line)
            .status()
            .with_context(|| format!("running `{}`", command_line))?;
        info!("SystemLauncher: `{}` exited with {}", command_line, status);
        Ok(())
    }

    fn spawn_detached(&mut self, command_line: &str) -> Result<()> {
        let mut command = self.shell_command(command_line);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own process group: terminal signals aimed at us skip the child.
            command.process_group(0);
        }

        command
            .spawn()
            .with_context(|| format!("spawning `{}`", command_line))?;
        Ok(())
    }
}
