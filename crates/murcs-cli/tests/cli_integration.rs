//! Integration tests for murcs-cli functionality.
//! Tests the underlying library functions that the CLI commands invoke.

use murcs_core::config::MurcsConfig;
use murcs_core::manager::PersistenceManager;
use murcs_core::model::*;
use murcs_core::persistence::{FilePersistenceLoader, PersistenceLoader};
use murcs_core::report::{ReportGenerator, ReportScope};
use std::fs;

fn small_model(name: &str) -> RelationalModel {
    let mut model = RelationalModel::with_default_skills(name);
    model
        .add_person(Person::new("Alice").with_skills([SCRUM_MASTER_SKILL]))
        .unwrap();
    model
        .add_team(
            Team::new("Core")
                .with_members(["Alice"])
                .with_role(TeamRole::ScrumMaster, "Alice"),
        )
        .unwrap();
    model
}

#[test]
fn test_configured_directory_and_extension() {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir_all(root.path().join(".murcs")).unwrap();
    fs::write(
        root.path().join(".murcs").join("config.toml"),
        "[storage]\ndirectory = \"store\"\nextension = \"murcs\"\n",
    )
    .unwrap();

    let config = MurcsConfig::load_with(root.path(), |_| None).unwrap();
    let directory = config.storage.resolve_directory(root.path());
    let loader = FilePersistenceLoader::new(&directory).with_extension(&config.storage.extension);
    loader.save_model(&small_model("team")).unwrap();

    assert!(root.path().join("store").join("team.murcs").exists());
    assert_eq!(loader.model_list().unwrap(), vec!["team"]);
}

#[test]
fn test_load_nonexistent_model_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = PersistenceManager::with_loader(FilePersistenceLoader::new(dir.path()));
    assert!(manager.load("missing").is_err());
    assert!(manager.current_model().is_none());
}

#[test]
fn test_report_file_from_stored_model() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = PersistenceManager::with_loader(FilePersistenceLoader::new(dir.path()));
    manager.set_current_model(small_model("team"));
    manager.save().unwrap();
    manager.load("team").unwrap();

    let out = dir.path().join("team.xml");
    let generator = ReportGenerator::from_config(&MurcsConfig::default().report);
    generator
        .generate(manager.current_model().unwrap(), &ReportScope::All, &out)
        .unwrap();

    let report = fs::read_to_string(&out).unwrap();
    assert!(report.starts_with("<?xml"));
    assert!(report.contains("<scrum-master>Alice</scrum-master>"));
    // the report lands beside the models but is not listed as one
    assert_eq!(manager.model_list().unwrap(), vec!["team"]);
}

#[test]
fn test_delete_then_list() {
    let dir = tempfile::tempdir().unwrap();
    let manager = PersistenceManager::with_loader(FilePersistenceLoader::new(dir.path()));
    manager
        .loader()
        .unwrap()
        .save_model(&small_model("gone"))
        .unwrap();
    assert!(manager.delete_model("gone").unwrap());
    assert!(manager.model_list().unwrap().is_empty());
}
