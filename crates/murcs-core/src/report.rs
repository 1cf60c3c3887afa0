//! Deterministic XML-style reports over a relational model.
//!
//! A report is rendered completely in memory before anything is written, so a
//! failed write never leaves a partial report behind. Rendering the same model
//! twice yields byte-identical output.

use crate::config::ReportConfig;
use crate::model::{EntityKind, Person, RelationalModel, Team, identity_key};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Errors raised while producing a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write report to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write report: {0}")]
    Sink(#[from] io::Error),
    #[error("{kind} not found: {name}")]
    UnknownEntity { kind: EntityKind, name: String },
}

pub type ReportResult<T> = Result<T, ReportError>;

/// Which part of the model a report covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReportScope {
    /// Project, every team, unassigned people and the skill catalog.
    #[default]
    All,
    /// The named teams, in the order given.
    Teams(Vec<String>),
    /// The named people, in the order given.
    People(Vec<String>),
}

impl ReportScope {
    fn label(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Teams(_) => "teams",
            Self::People(_) => "people",
        }
    }
}

/// Renders models into report text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportGenerator {
    indent: usize,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::from_config(&ReportConfig::default())
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            indent: config.indent,
        }
    }

    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Render the full report for `model`.
    pub fn render(&self, model: &RelationalModel) -> String {
        let mut xml = XmlWriter::new(self.indent);
        begin(&mut xml, model, &ReportScope::All);
        write_full(&mut xml, model);
        xml.close("report");
        xml.finish()
    }

    /// Render the part of `model` selected by `scope`.
    pub fn render_scope(
        &self,
        model: &RelationalModel,
        scope: &ReportScope,
    ) -> ReportResult<String> {
        let mut xml = XmlWriter::new(self.indent);
        match scope {
            ReportScope::All => return Ok(self.render(model)),
            ReportScope::Teams(names) => {
                let teams = names
                    .iter()
                    .map(|name| {
                        model.team(name).ok_or_else(|| unknown(EntityKind::Team, name))
                    })
                    .collect::<ReportResult<Vec<_>>>()?;
                begin(&mut xml, model, scope);
                write_teams(&mut xml, model, teams);
            }
            ReportScope::People(names) => {
                let people = names
                    .iter()
                    .map(|name| {
                        model
                            .person(name)
                            .ok_or_else(|| unknown(EntityKind::Person, name))
                    })
                    .collect::<ReportResult<Vec<_>>>()?;
                begin(&mut xml, model, scope);
                write_people(&mut xml, model, "people", people);
            }
        }
        xml.close("report");
        Ok(xml.finish())
    }

    /// Render `scope` and write it to `sink` in a single write.
    pub fn write_to(
        &self,
        model: &RelationalModel,
        scope: &ReportScope,
        mut sink: impl Write,
    ) -> ReportResult<()> {
        let report = self.render_scope(model, scope)?;
        sink.write_all(report.as_bytes())?;
        sink.flush()?;
        Ok(())
    }

    /// Render `scope` and atomically write it to `destination`.
    ///
    /// The report is staged in a temporary file beside `destination` and
    /// renamed over it, so readers see either the previous file or the
    /// complete new report.
    pub fn generate(
        &self,
        model: &RelationalModel,
        scope: &ReportScope,
        destination: &Path,
    ) -> ReportResult<()> {
        let report = self.render_scope(model, scope)?;
        let io_err = |source| ReportError::Io {
            path: destination.to_path_buf(),
            source,
        };

        let parent = match destination.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(parent).map_err(io_err)?;
        staged
            .write_all(report.as_bytes())
            .and_then(|()| staged.as_file().sync_all())
            .map_err(io_err)?;
        staged.persist(destination).map_err(|e| io_err(e.error))?;

        info!(
            model = model.name(),
            scope = scope.label(),
            path = %destination.display(),
            bytes = report.len(),
            "report written"
        );
        Ok(())
    }
}

fn begin(xml: &mut XmlWriter, model: &RelationalModel, scope: &ReportScope) {
    xml.line("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
    xml.open_with(
        "report",
        &[("model", model.name()), ("scope", scope.label())],
    );
}

fn unknown(kind: EntityKind, name: &str) -> ReportError {
    ReportError::UnknownEntity {
        kind,
        name: name.to_string(),
    }
}

fn write_full(xml: &mut XmlWriter, model: &RelationalModel) {
    match model.project() {
        Some(project) => {
            xml.open_with("project", &[("name", &project.name)]);
            xml.leaf("description", &project.description);
            xml.list("teams", "team-ref", &project.teams);
            xml.close("project");
        }
        None => xml.empty("project"),
    }
    write_teams(xml, model, model.teams().iter().collect());
    write_people(xml, model, "unassigned-people", model.unassigned_people());

    if model.skills().is_empty() {
        xml.empty("skills");
    } else {
        xml.open("skills");
        for skill in model.skills() {
            xml.open_with("skill", &[("name", &skill.name)]);
            xml.leaf("description", &skill.description);
            xml.close("skill");
        }
        xml.close("skills");
    }
}

fn write_teams(xml: &mut XmlWriter, model: &RelationalModel, teams: Vec<&Team>) {
    if teams.is_empty() {
        xml.empty("teams");
        return;
    }
    xml.open("teams");
    for team in teams {
        write_team(xml, model, team);
    }
    xml.close("teams");
}

fn write_team(xml: &mut XmlWriter, model: &RelationalModel, team: &Team) {
    xml.open_with("team", &[("name", &team.name)]);
    xml.leaf("description", &team.description);
    if let Some(sm) = &team.scrum_master {
        xml.leaf("scrum-master", sm);
    }
    if let Some(po) = &team.product_owner {
        xml.leaf("product-owner", po);
    }
    let members = team
        .members
        .iter()
        .filter_map(|name| model.person(name))
        .collect();
    write_people(xml, model, "members", members);
    xml.close("team");
}

fn write_people(xml: &mut XmlWriter, model: &RelationalModel, tag: &str, people: Vec<&Person>) {
    if people.is_empty() {
        xml.empty(tag);
        return;
    }
    xml.open(tag);
    for person in people {
        write_person(xml, model, person);
    }
    xml.close(tag);
}

fn write_person(xml: &mut XmlWriter, model: &RelationalModel, person: &Person) {
    xml.open_with("person", &[("name", &person.name)]);
    if let Some(user_id) = &person.user_id {
        xml.leaf("user-id", user_id);
    }
    xml.list("skills", "skill-ref", &person.skills);
    let key = identity_key(&person.name);
    let teams: Vec<&str> = model
        .teams()
        .iter()
        .filter(|team| team.members.iter().any(|m| identity_key(m) == key))
        .map(|team| team.name.as_str())
        .collect();
    xml.list("teams", "team-ref", &teams);
    xml.close("person");
}

/// Line-oriented XML builder with fixed-width indentation.
struct XmlWriter {
    out: String,
    indent: usize,
    depth: usize,
}

impl XmlWriter {
    fn new(indent: usize) -> Self {
        Self {
            out: String::new(),
            indent,
            depth: 0,
        }
    }

    fn line(&mut self, text: &str) {
        self.out
            .extend(std::iter::repeat_n(' ', self.depth * self.indent));
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn open(&mut self, tag: &str) {
        self.line(&format!("<{tag}>"));
        self.depth += 1;
    }

    fn open_with(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.line(&format!("<{tag}{}>", attributes(attrs)));
        self.depth += 1;
    }

    fn close(&mut self, tag: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(&format!("</{tag}>"));
    }

    fn empty(&mut self, tag: &str) {
        self.line(&format!("<{tag}/>"));
    }

    fn leaf(&mut self, tag: &str, text: &str) {
        if text.is_empty() {
            self.empty(tag);
        } else {
            self.line(&format!("<{tag}>{}</{tag}>", escape(text)));
        }
    }

    fn list<S: AsRef<str>>(&mut self, tag: &str, item: &str, values: &[S]) {
        if values.is_empty() {
            self.empty(tag);
            return;
        }
        self.open(tag);
        for value in values {
            self.leaf(item, value.as_ref());
        }
        self.close(tag);
    }

    fn finish(self) -> String {
        self.out
    }
}

fn attributes(attrs: &[(&str, &str)]) -> String {
    attrs
        .iter()
        .map(|(key, value)| format!(" {key}=\"{}\"", escape(value)))
        .collect()
}

/// Escape text for an element body or attribute value.
///
/// Besides the five XML special characters, tab, line breaks and carriage
/// returns become character references so every element stays on one line.
/// Other control characters cannot appear in XML 1.0 and become U+FFFD.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            c if c < '\u{20}' => out.push(char::REPLACEMENT_CHARACTER),
            _ => out.push(c),
        }
    }
    out
}
