use std::collections::BTreeMap;

use anyhow::Result;
use palette::config::default_commands;
use palette::template;
use palette::{
    ActionType, Command, DispatchError, Dispatcher, ImportReport, Launcher, Origin, Ranker,
    Registry, RegistryError, Store,
};
use serde_json::json;
use tempfile::TempDir;

#[derive(Default)]
struct Recording {
    urls: Vec<String>,
    runs: Vec<String>,
}

impl Launcher for Recording {
    fn open_url(&mut self, url: &str) -> Result<()> {
        self.urls.push(url.to_string());
        Ok(())
    }

    fn run_blocking(&mut self, command_line: &str) -> Result<()> {
        self.runs.push(command_line.to_string());
        Ok(())
    }

    fn spawn_detached(&mut self, command_line: &str) -> Result<()> {
        self.runs.push(command_line.to_string());
        Ok(())
    }
}

fn open_registry(dir: &TempDir) -> Registry {
    let store = Store::new(dir.path().join("custom_commands.json"), dir.path().join("command_history.json"));
    Registry::new(default_commands(), store, 5)
}

#[test]
fn select_run_and_reopen() {
    let dir = TempDir::new().unwrap();
    let mut registry = open_registry(&dir);
    let mut ranker = Ranker::default();
    let mut dispatcher = Dispatcher::new(Recording::default());

    let results = ranker.rank("youtub", registry.commands(), registry.history());
    assert_eq!(results[0].name, "YouTube");
    dispatcher.execute(&mut registry, &results[0]).unwrap();

    let github = registry.find("GitHub").unwrap().clone();
    dispatcher.execute(&mut registry, &github).unwrap();
    assert_eq!(dispatcher.launcher().urls, vec!["https://www.youtube.com", "https://github.com"]);

    // history survives a restart and leads the empty-query listing
    let registry = open_registry(&dir);
    let listing = ranker.rank("", registry.commands(), registry.history());
    assert_eq!(listing[0].name, "GitHub");
    assert_eq!(listing[0].origin, Origin::History);
    assert_eq!(listing[1].name, "YouTube");
    assert_eq!(listing.len(), registry.commands().len());
    assert!(listing[2..].iter().all(|c| c.origin != Origin::History));
}

#[test]
fn history_entry_and_live_command_are_the_same_action() {
    let dir = TempDir::new().unwrap();
    let mut registry = open_registry(&dir);
    let mut dispatcher = Dispatcher::new(Recording::default());

    let docs = registry.find("Rust Docs").unwrap().clone();
    dispatcher.execute(&mut registry, &docs).unwrap();
    let from_history = registry.history()[0].clone();
    dispatcher.execute(&mut registry, &from_history).unwrap();
    dispatcher.execute(&mut registry, &docs).unwrap();

    assert_eq!(registry.history().len(), 1);
}

#[test]
fn history_is_capped() {
    let dir = TempDir::new().unwrap();
    let mut registry = open_registry(&dir);
    let mut dispatcher = Dispatcher::new(Recording::default());

    for command in registry.commands().to_vec() {
        if command.target == "exit" {
            continue;
        }
        dispatcher.execute(&mut registry, &command).unwrap();
        assert!(registry.history().len() <= 5);
    }
    assert_eq!(registry.history().len(), 5);
    assert_eq!(registry.store().load_history().len(), 5);
}

#[test]
fn templated_dispatch() {
    let dir = TempDir::new().unwrap();
    let mut registry = open_registry(&dir);
    let mut dispatcher = Dispatcher::new(Recording::default());

    let mut vars = BTreeMap::new();
    vars.insert("id".to_string(), "42".to_string());
    let post = Command::custom("Post", "", ActionType::Web, "https://x.com/{id}", vars).unwrap();
    registry.add(post.clone()).unwrap();

    let result = dispatcher.execute(&mut registry, &post).unwrap();
    assert_eq!(result.rendered, "https://x.com/42");

    let bare = Command::custom("Bare", "", ActionType::Web, "https://x.com/{id}", BTreeMap::new()).unwrap();
    let err = dispatcher.execute(&mut registry, &bare).unwrap_err();
    assert!(matches!(err, DispatchError::Template { .. }));
    assert_eq!(registry.history().len(), 1);
    assert_eq!(dispatcher.launcher().urls.len(), 1);
}

#[test]
fn plain_targets_render_unchanged() {
    for command in default_commands() {
        assert!(command.variables.is_empty());
        assert_eq!(template::render(&command.target, &BTreeMap::new()).unwrap(), command.target);
    }
}

#[test]
fn delete_custom_everywhere() {
    let dir = TempDir::new().unwrap();
    let mut registry = open_registry(&dir);
    let mut dispatcher = Dispatcher::new(Recording::default());

    let mine = Command::custom("Uptime", "", ActionType::SystemRun, "uptime", BTreeMap::new()).unwrap();
    registry.add(mine.clone()).unwrap();
    dispatcher.execute(&mut registry, &mine).unwrap();
    assert_eq!(dispatcher.launcher().runs, vec!["uptime"]);

    registry.delete(&mine.key()).unwrap();
    let registry = open_registry(&dir);
    assert!(registry.find("Uptime").is_none());
    assert!(registry.history().is_empty());
}

#[test]
fn edit_collision_leaves_registry_unchanged() {
    let dir = TempDir::new().unwrap();
    let mut registry = open_registry(&dir);
    let mine = Command::custom("Uptime", "", ActionType::SystemRun, "uptime", BTreeMap::new()).unwrap();
    registry.add(mine.clone()).unwrap();
    let before: Vec<_> = registry.commands().iter().map(Command::key).collect();

    let clash = Command::custom("GitHub", "", ActionType::Web, "https://gh", BTreeMap::new()).unwrap();
    assert!(matches!(registry.edit(&mine.key(), clash), Err(RegistryError::DuplicateName(_))));

    let after: Vec<_> = registry.commands().iter().map(Command::key).collect();
    assert_eq!(before, after);
    assert_eq!(registry.store().load_custom()[0].name, "Uptime");
}

#[test]
fn import_then_reimport() {
    let dir = TempDir::new().unwrap();
    let store = Store::new(dir.path().join("c.json"), dir.path().join("h.json"));
    let mut registry = Registry::new(Vec::new(), store, 5);
    let records = vec![json!(["A", "d", "WEB", "http://a"])];

    assert_eq!(
        registry.import_records(records.clone()).report,
        ImportReport { imported: 1, skipped: 0 }
    );
    assert_eq!(
        registry.import_records(records).report,
        ImportReport { imported: 0, skipped: 1 }
    );
    assert_eq!(registry.custom_commands().count(), 1);
    assert_eq!(registry.store().load_custom().len(), 1);
}

#[test]
fn corrupt_files_do_not_block_startup() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("custom_commands.json"), "not json").unwrap();
    std::fs::write(dir.path().join("command_history.json"), "[[1, 2, 3, 4]]").unwrap();

    let registry = open_registry(&dir);
    assert_eq!(registry.commands().len(), default_commands().len());
    assert!(registry.history().is_empty());
}
