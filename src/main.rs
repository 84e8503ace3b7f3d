use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use palette::config::{default_config_path, load_config, Config};
use palette::template;
use palette::{
    ActionType, Command, ConsoleAction, Dispatcher, ImportOutcome, Outcome, Origin, Ranker, Registry, Store,
    SystemLauncher,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Minimum match score (0-100) for search results
    #[arg(short, long)]
    threshold: Option<u8>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Rank commands against a query; without one, show history then everything else
    #[command(visible_alias = "list")]
    Search { query: Option<String> },
    /// Run a command by exact name, or the best match for the query
    Run {
        query: String,
        /// Placeholder value, e.g. --set id=42
        #[arg(long = "set", value_parser = parse_key_val)]
        set: Vec<(String, String)>,
    },
    /// Add a custom command
    Add {
        name: String,
        target: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long, default_value = "WEB")]
        action: ActionType,
        /// Default placeholder value, e.g. --var q=rust
        #[arg(long = "var", value_parser = parse_key_val)]
        vars: Vec<(String, String)>,
    },
    /// Change a custom command; omitted fields keep their current value
    Edit {
        name: String,
        #[arg(long)]
        new_name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        action: Option<ActionType>,
        #[arg(long)]
        target: Option<String>,
        #[arg(long = "var", value_parser = parse_key_val)]
        vars: Vec<(String, String)>,
    },
    /// Delete a custom command
    Delete { name: String },
    /// Import commands from a JSON file
    Import { file: PathBuf },
    /// Export custom commands to a JSON file
    Export { file: PathBuf },
    /// List the placeholders a command's target uses
    Placeholders { name: String },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    let store = Store::from_config(&config);
    let mut registry = Registry::new(config.builtin_commands(), store, config.general.history_size);
    let mut ranker = Ranker::new(config.general.fuzzy_threshold, config.general.result_limit);
    if let Some(threshold) = args.threshold {
        ranker.set_threshold(threshold);
    }

    match args.command {
        Cmd::Search { query } => {
            let query = query.unwrap_or_default();
            let results = ranker.rank(&query, registry.commands(), registry.history());
            for command in &results {
                print_command(command);
            }
            if results.is_empty() {
                println!("No commands match \"{}\"", query);
            }
        }
        Cmd::Run { query, set } => {
            let command = match registry.find(&query) {
                Some(command) => command.clone(),
                None => ranker
                    .rank(&query, registry.commands(), registry.history())
                    .into_iter()
                    .next()
                    .with_context(|| format!("no command matches \"{}\"", query))?,
            };
            let values: BTreeMap<String, String> = set.into_iter().collect();

            let mut dispatcher = Dispatcher::new(SystemLauncher::from_config(&config));
            let result = dispatcher.execute_with(&mut registry, &command, &values)?;
            if let Some(e) = &result.history_error {
                eprintln!("warning: history not saved: {}", e);
            }
            match result.outcome {
                Outcome::Console(ConsoleAction::Exit) => return Ok(()),
                Outcome::Console(ConsoleAction::ShowSettings) => show_settings(&config, args.config),
                Outcome::Console(ConsoleAction::Unknown(action)) => {
                    eprintln!("unknown console action '{}'", action)
                }
                _ => {}
            }
            println!("Last command executed: {}", result.name);
        }
        Cmd::Add { name, target, description, action, vars } => {
            let command = Command::custom(&name, &description, action, &target, vars.into_iter().collect())?;
            let name = command.name.clone();
            registry.add(command)?;
            println!("Command '{}' was successfully added", name);
        }
        Cmd::Edit { name, new_name, description, action, target, vars } => {
            let existing = find_custom(&registry, &name)?;
            let new_target = target.as_deref().unwrap_or(&existing.target);
            let placeholders = template::extract_placeholders(new_target);
            let mut variables = existing.variables.clone();
            variables.retain(|k, _| placeholders.contains(k));
            variables.extend(vars);
            let updated = Command::custom(
                new_name.as_deref().unwrap_or(&existing.name),
                description.as_deref().unwrap_or(&existing.description),
                action.unwrap_or(existing.action),
                new_target,
                variables,
            )?;
            let new_name = updated.name.clone();
            registry.edit(&existing.key(), updated)?;
            println!("Updated command: from - {} to - {}", name, new_name);
        }
        Cmd::Delete { name } => {
            let existing = find_custom(&registry, &name)?;
            registry.delete(&existing.key())?;
            println!("Deleted command {}", name);
        }
        Cmd::Import { file } => {
            let ImportOutcome { report, save_error } = registry.import_file(&file)?;
            if let Some(e) = save_error {
                eprintln!("warning: imported commands not saved: {}", e);
            }
            if report.imported > 0 {
                println!(
                    "Import successful! Added {} new commands. Skipped {} invalid/duplicate commands.",
                    report.imported, report.skipped
                );
            } else {
                println!("No new commands were imported. Skipped {} commands.", report.skipped);
            }
        }
        Cmd::Export { file } => {
            let count = registry.export_file(&file)?;
            println!("Exported {} commands to {}", count, file.display());
        }
        Cmd::Placeholders { name } => {
            let command = registry
                .find(&name)
                .with_context(|| format!("command '{}' not found", name))?;
            for var in template::placeholders_sorted(&command.target) {
                match command.variables.get(&var) {
                    Some(value) => println!("{} = {}", var, value),
                    None => println!("{}", var),
                }
            }
        }
    }

    Ok(())
}

fn find_custom(registry: &Registry, name: &str) -> Result<Command> {
    match registry.custom_commands().find(|c| c.name == name) {
        Some(command) => Ok(command.clone()),
        None if registry.find(name).is_some() => bail!("'{}' is not a custom command", name),
        None => bail!("command '{}' not found", name),
    }
}

fn print_command(command: &Command) {
    let marker = match command.origin {
        Origin::History => "*",
        Origin::Custom => "+",
        Origin::BuiltIn => " ",
    };
    println!("{} {:<24} {:<8} {}", marker, command.name, command.action.as_str(), command.description);
}

fn show_settings(config: &Config, path: Option<PathBuf>) {
    let path = path.unwrap_or_else(default_config_path);
    println!("config:          {}", path.display());
    println!("custom commands: {}", config.custom_commands_path().display());
    println!("history:         {}", config.history_path().display());
    println!("fuzzy threshold: {}", config.general.fuzzy_threshold);
    println!("result limit:    {}", config.general.result_limit);
}
