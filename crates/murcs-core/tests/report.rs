use murcs_core::config::ReportConfig;
use murcs_core::model::*;
use murcs_core::report::{ReportError, ReportGenerator, ReportScope};
use std::fs;
use tempfile::TempDir;

fn acme() -> RelationalModel {
    let mut model = RelationalModel::with_default_skills("acme");
    model.add_skill(Skill::new("Java")).unwrap();
    model
        .add_people([
            Person::new("Alice")
                .with_user_id("alice01")
                .with_skills(["Java", SCRUM_MASTER_SKILL]),
            Person::new("Bob"),
        ])
        .unwrap();
    model
        .add_team(
            Team::new("Core")
                .with_description("Backend & APIs")
                .with_members(["Alice"])
                .with_role(TeamRole::ScrumMaster, "Alice"),
        )
        .unwrap();
    model
        .set_project(Project::new("Acme").with_teams(["Core"]))
        .unwrap();
    model
}

#[test]
fn test_generate_writes_same_bytes_as_render() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("acme.xml");
    let generator = ReportGenerator::new();
    let model = acme();

    generator.generate(&model, &ReportScope::All, &path).unwrap();
    let first = fs::read(&path).unwrap();
    generator.generate(&model, &ReportScope::All, &path).unwrap();
    let second = fs::read(&path).unwrap();

    assert_eq!(first, second);
    assert_eq!(first, generator.render(&model).into_bytes());
}

#[test]
fn test_report_traversal_order() {
    let report = ReportGenerator::new().render(&acme());
    let positions: Vec<usize> = [
        "<project name=\"Acme\">",
        "<team name=\"Core\">",
        "<scrum-master>Alice</scrum-master>",
        "<person name=\"Alice\">",
        "<user-id>alice01</user-id>",
        "<unassigned-people>",
        "<person name=\"Bob\">",
        "<skill name=\"PO\">",
        "<skill name=\"SM\">",
        "<skill name=\"Java\">",
    ]
    .iter()
    .map(|needle| report.find(needle).unwrap())
    .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(report.contains("<description>Backend &amp; APIs</description>"));
}

#[test]
fn test_indent_follows_config() {
    let generator = ReportGenerator::from_config(&ReportConfig { indent: 1 });
    let report = generator.render(&acme());
    assert!(report.contains("\n <project name=\"Acme\">\n"));
    assert!(report.contains("\n  <description/>\n"));
}

#[test]
fn test_failed_generate_leaves_no_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("missing-dir").join("report.xml");
    let err = ReportGenerator::new()
        .generate(&acme(), &ReportScope::All, &path)
        .unwrap_err();
    assert!(matches!(err, ReportError::Io { ref path, .. } if path.ends_with("report.xml")));
    assert!(!path.exists());
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn test_unknown_team_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("teams.xml");
    let scope = ReportScope::Teams(vec!["Ghost".to_string()]);
    let err = ReportGenerator::new()
        .generate(&acme(), &scope, &path)
        .unwrap_err();
    assert!(matches!(err, ReportError::UnknownEntity { kind: EntityKind::Team, .. }));
    assert!(!path.exists());
}

#[test]
fn test_people_scope() {
    let scope = ReportScope::People(vec!["bob".to_string(), "Alice".to_string()]);
    let report = ReportGenerator::new()
        .render_scope(&acme(), &scope)
        .unwrap();
    assert!(report.contains("scope=\"people\""));
    assert!(report.find("name=\"Bob\"").unwrap() < report.find("name=\"Alice\"").unwrap());
    assert!(!report.contains("<skill name="));
}
