use murcs_core::error::PersistenceError;
use murcs_core::model::*;
use murcs_core::persistence::{FilePersistenceLoader, MemoryPersistenceLoader, PersistenceLoader};
use murcs_core::schema::{self, CURRENT_VERSION, ModelDocument};
use std::fs;
use tempfile::TempDir;

fn acme() -> RelationalModel {
    let mut model = RelationalModel::new("acme");
    model.add_skill(Skill::new("Java")).unwrap();
    model
        .add_person(Person::new("Alice").with_skills(["Java"]))
        .unwrap();
    model
        .add_team(Team::new("Core").with_members(["Alice"]))
        .unwrap();
    model
        .set_project(Project::new("Acme").with_teams(["Core"]))
        .unwrap();
    model
}

#[test]
fn test_save_and_load_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let loader = FilePersistenceLoader::new(tmp.path());
    let model = acme();

    loader.save_model(&model).unwrap();
    assert!(tmp.path().join("acme.project").exists());

    let loaded = loader.load_model("acme").unwrap();
    assert_eq!(loaded, model);
}

#[test]
fn test_loaded_references_resolve_to_single_copy() {
    let tmp = TempDir::new().unwrap();
    let loader = FilePersistenceLoader::new(tmp.path());
    loader.save_model(&acme()).unwrap();
    let loaded = loader.load_model("acme").unwrap();

    assert_eq!(loaded.skills().len(), 1);
    assert_eq!(loaded.people().len(), 1);
    let core_members = loaded.team_members("Core").unwrap();
    assert!(std::ptr::eq(core_members[0], loaded.person("Alice").unwrap()));
    let alice_skills = loaded.person_skills("Alice").unwrap();
    assert!(std::ptr::eq(alice_skills[0], loaded.skill("Java").unwrap()));
    assert_eq!(loaded.project_teams()[0].name, "Core");
}

#[test]
fn test_load_missing_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let loader = FilePersistenceLoader::new(tmp.path());
    assert!(matches!(
        loader.load_model("ghost"),
        Err(PersistenceError::NotFound { name }) if name == "ghost"
    ));
}

#[test]
fn test_load_garbage_is_corrupt() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("broken.project"), "{ not json").unwrap();
    let loader = FilePersistenceLoader::new(tmp.path());
    assert!(matches!(
        loader.load_model("broken"),
        Err(PersistenceError::Corrupt { .. })
    ));
}

#[test]
fn test_load_dangling_reference_is_corrupt() {
    let tmp = TempDir::new().unwrap();
    let document = ModelDocument {
        version: CURRENT_VERSION.to_string(),
        name: "dangling".to_string(),
        saved_at: None,
        project: None,
        teams: vec![Team::new("Core").with_members(["Nobody"])],
        people: Vec::new(),
        skills: Vec::new(),
    };
    fs::write(
        tmp.path().join("dangling.project"),
        serde_json::to_string(&document).unwrap(),
    )
    .unwrap();
    let loader = FilePersistenceLoader::new(tmp.path());
    let err = loader.load_model("dangling").unwrap_err();
    assert!(matches!(err, PersistenceError::Corrupt { .. }));
    assert!(err.to_string().contains("Nobody"));
}

#[test]
fn test_saved_document_format() {
    let tmp = TempDir::new().unwrap();
    let loader = FilePersistenceLoader::new(tmp.path());
    loader.save_model(&acme()).unwrap();

    let raw = fs::read_to_string(tmp.path().join("acme.project")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["version"], CURRENT_VERSION);
    assert_eq!(value["name"], "acme");
    assert_eq!(value["project"]["teams"][0], "Core");
    assert_eq!(value["teams"][0]["members"][0], "Alice");
    assert_eq!(value["people"][0]["skills"][0], "Java");
    assert!(value["saved_at"].is_string());
}

#[test]
fn test_save_overwrites_previous_version() {
    let tmp = TempDir::new().unwrap();
    let loader = FilePersistenceLoader::new(tmp.path());
    let mut model = acme();
    loader.save_model(&model).unwrap();

    model.add_skill(Skill::new("Rust")).unwrap();
    loader.save_model(&model).unwrap();

    assert_eq!(loader.load_model("acme").unwrap().skills().len(), 2);
    assert_eq!(loader.model_list().unwrap(), vec!["acme"]);
}

#[test]
fn test_failed_save_leaves_target_untouched() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("acme.project");
    fs::create_dir(&blocker).unwrap();
    fs::write(blocker.join("keep"), "x").unwrap();

    let loader = FilePersistenceLoader::new(tmp.path());
    let result = loader.save_model(&acme());
    assert!(matches!(result, Err(PersistenceError::Io { .. })));
    assert!(blocker.join("keep").exists());

    let leftovers: Vec<_> = fs::read_dir(tmp.path()).unwrap().collect();
    assert_eq!(leftovers.len(), 1);
}

#[test]
fn test_model_list_sorted_and_filtered() {
    let tmp = TempDir::new().unwrap();
    let loader = FilePersistenceLoader::new(tmp.path());
    for name in ["zeta", "alpha", "mid"] {
        loader.save_model(&RelationalModel::new(name)).unwrap();
    }
    fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();
    fs::create_dir(tmp.path().join("dir.project")).unwrap();

    assert_eq!(loader.model_list().unwrap(), vec!["alpha", "mid", "zeta"]);
}

#[test]
fn test_model_list_skips_unloadable_names() {
    let tmp = TempDir::new().unwrap();
    let loader = FilePersistenceLoader::new(tmp.path());
    loader.save_model(&acme()).unwrap();
    for stray in [".hidden.project", "a:b.project", " pad.project"] {
        fs::write(tmp.path().join(stray), "{}").unwrap();
    }

    let names = loader.model_list().unwrap();
    assert_eq!(names, vec!["acme"]);
    for name in &names {
        loader.load_model(name).unwrap();
        assert!(loader.delete_model(name).unwrap());
    }
}

#[test]
fn test_model_list_missing_directory_is_empty() {
    let tmp = TempDir::new().unwrap();
    let loader = FilePersistenceLoader::new(tmp.path().join("not-yet"));
    assert!(loader.model_list().unwrap().is_empty());
}

#[test]
fn test_delete_model() {
    let tmp = TempDir::new().unwrap();
    let loader = FilePersistenceLoader::new(tmp.path());
    loader.save_model(&acme()).unwrap();

    assert!(loader.delete_model("acme").unwrap());
    assert!(!loader.delete_model("ghost").unwrap());
    assert!(loader.model_list().unwrap().is_empty());
}

#[test]
fn test_custom_extension() {
    let tmp = TempDir::new().unwrap();
    let loader = FilePersistenceLoader::new(tmp.path()).with_extension(".murcs");
    loader.save_model(&acme()).unwrap();
    assert!(tmp.path().join("acme.murcs").exists());
    assert_eq!(loader.model_list().unwrap(), vec!["acme"]);
}

#[test]
fn test_invalid_names_rejected() {
    let tmp = TempDir::new().unwrap();
    let loader = FilePersistenceLoader::new(tmp.path());
    for name in ["", "../escape", "a/b", ".hidden"] {
        assert!(matches!(
            loader.load_model(name),
            Err(PersistenceError::InvalidName(_))
        ));
    }
    assert!(matches!(
        loader.save_model(&RelationalModel::new("../escape")),
        Err(PersistenceError::InvalidName(_))
    ));
}

#[test]
fn test_memory_loader_matches_file_semantics() {
    let loader = MemoryPersistenceLoader::new();
    let model = acme();
    loader.save_model(&model).unwrap();
    assert_eq!(loader.load_model("acme").unwrap(), model);
    assert!(matches!(
        loader.load_model("ghost"),
        Err(PersistenceError::NotFound { .. })
    ));

    loader.insert_raw("broken", "[]");
    assert!(matches!(
        loader.load_model("broken"),
        Err(PersistenceError::Corrupt { .. })
    ));
    assert_eq!(loader.model_list().unwrap(), vec!["acme", "broken"]);
    assert!(loader.delete_model("broken").unwrap());
    assert!(!loader.delete_model("ghost").unwrap());
}

#[test]
fn test_loaders_are_interchangeable() {
    let tmp = TempDir::new().unwrap();
    let loaders: Vec<Box<dyn PersistenceLoader>> = vec![
        Box::new(FilePersistenceLoader::new(tmp.path())),
        Box::new(MemoryPersistenceLoader::new()),
    ];
    for loader in &loaders {
        loader.save_model(&acme()).unwrap();
        let json = schema::to_json(&loader.load_model("acme").unwrap()).unwrap();
        assert!(json.contains("\"Alice\""));
    }
}
