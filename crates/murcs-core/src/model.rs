//! Relational data model: skills, people, teams and the project that ties them together.
//!
//! Entities refer to each other by name. Names are identity keys: they are compared
//! trimmed and case-insensitively, so "Java" and " java " denote the same skill.
//! [`RelationalModel`] owns exactly one copy of every entity and checks every
//! cross-reference on insert, so a reference always resolves to that single copy.

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Short name of the skill required to act as a team's product owner.
pub const PRODUCT_OWNER_SKILL: &str = "PO";
/// Short name of the skill required to act as a team's scrum master.
pub const SCRUM_MASTER_SKILL: &str = "SM";

/// Normalized identity key for an entity name.
pub fn identity_key(name: &str) -> String {
    folded(name).collect()
}

fn folded(name: &str) -> impl Iterator<Item = char> {
    name.trim().chars().flat_map(char::to_lowercase)
}

fn same_identity(a: &str, b: &str) -> bool {
    folded(a).eq(folded(b))
}

/// The kind of entity held by a [`RelationalModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Project,
    Team,
    Person,
    Skill,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Project => "project",
            Self::Team => "team",
            Self::Person => "person",
            Self::Skill => "skill",
        };
        f.write_str(label)
    }
}

/// A by-name reference to any entity, used by usage queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    Project(String),
    Team(String),
    Person(String),
    Skill(String),
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Project(_) => EntityKind::Project,
            Self::Team(_) => EntityKind::Team,
            Self::Person(_) => EntityKind::Person,
            Self::Skill(_) => EntityKind::Skill,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Project(name) | Self::Team(name) | Self::Person(name) | Self::Skill(name) => {
                name
            }
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.name())
    }
}

/// A role a team member can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamRole {
    ScrumMaster,
    ProductOwner,
}

impl TeamRole {
    /// The skill a person needs before they can take on this role.
    pub fn required_skill(self) -> &'static str {
        match self {
            Self::ScrumMaster => SCRUM_MASTER_SKILL,
            Self::ProductOwner => PRODUCT_OWNER_SKILL,
        }
    }

    fn other(self) -> Self {
        match self {
            Self::ScrumMaster => Self::ProductOwner,
            Self::ProductOwner => Self::ScrumMaster,
        }
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScrumMaster => f.write_str("scrum master"),
            Self::ProductOwner => f.write_str("product owner"),
        }
    }
}

/// How a removal treats entities that still reference the removed one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Removal {
    /// Refuse to remove an entity that is still referenced.
    #[default]
    Restrict,
    /// Detach every reference to the entity, then remove it.
    Cascade,
}

/// A skill a person can hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Skill {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_scrum_master_skill(&self) -> bool {
        same_identity(&self.name, SCRUM_MASTER_SKILL)
    }

    pub fn is_product_owner_skill(&self) -> bool {
        same_identity(&self.name, PRODUCT_OWNER_SKILL)
    }
}

/// A person, with the names of the skills they hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Person {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user_id: None,
            skills: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    #[must_use]
    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills.extend(skills.into_iter().map(Into::into));
        self
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| same_identity(s, skill))
    }

    /// Whether this person holds the skill a role requires.
    pub fn can_be(&self, role: TeamRole) -> bool {
        self.has_skill(role.required_skill())
    }
}

/// A team: an ordered list of member names plus optional role holders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub scrum_master: Option<String>,
    #[serde(default)]
    pub product_owner: Option<String>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            members: Vec::new(),
            scrum_master: None,
            product_owner: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members.extend(members.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_role(mut self, role: TeamRole, person: impl Into<String>) -> Self {
        *self.role_slot(role) = Some(person.into());
        self
    }

    pub fn has_member(&self, person: &str) -> bool {
        self.members.iter().any(|m| same_identity(m, person))
    }

    pub fn role(&self, role: TeamRole) -> Option<&str> {
        match role {
            TeamRole::ScrumMaster => self.scrum_master.as_deref(),
            TeamRole::ProductOwner => self.product_owner.as_deref(),
        }
    }

    /// Roles held by `person` in this team.
    pub fn roles_of(&self, person: &str) -> Vec<TeamRole> {
        [TeamRole::ScrumMaster, TeamRole::ProductOwner]
            .into_iter()
            .filter(|role| {
                self.role(*role)
                    .is_some_and(|holder| same_identity(holder, person))
            })
            .collect()
    }

    fn role_slot(&mut self, role: TeamRole) -> &mut Option<String> {
        match role {
            TeamRole::ScrumMaster => &mut self.scrum_master,
            TeamRole::ProductOwner => &mut self.product_owner,
        }
    }

    fn references(&self, person: &str) -> bool {
        self.has_member(person) || !self.roles_of(person).is_empty()
    }

    fn detach(&mut self, person: &str) {
        self.members.retain(|m| !same_identity(m, person));
        for role in self.roles_of(person) {
            *self.role_slot(role) = None;
        }
    }
}

/// The project a model describes, with the names of its assigned teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub teams: Vec<String>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            teams: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_teams<I, S>(mut self, teams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.teams.extend(teams.into_iter().map(Into::into));
        self
    }

    pub fn has_team(&self, team: &str) -> bool {
        self.teams.iter().any(|t| same_identity(t, team))
    }
}

/// The aggregate root: one project plus every team, person and skill reachable from it.
///
/// Collections keep insertion order. Every mutator either succeeds with all
/// invariants intact or returns an error and leaves the model untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationalModel {
    name: String,
    project: Option<Project>,
    teams: Vec<Team>,
    people: Vec<Person>,
    skills: Vec<Skill>,
    /// Identity key → position in `teams`. Rebuilt via `rebuild_indexes()`.
    team_keys: HashMap<String, usize>,
    /// Identity key → position in `people`.
    person_keys: HashMap<String, usize>,
    /// Identity key → position in `skills`.
    skill_keys: HashMap<String, usize>,
}

impl RelationalModel {
    /// Create an empty model stored under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_parts(name.into(), None, Vec::new(), Vec::new(), Vec::new())
    }

    /// Assemble a model from stored tables without checking them; callers
    /// must run [`RelationalModel::validate`] before handing it out.
    pub(crate) fn from_parts(
        name: String,
        project: Option<Project>,
        teams: Vec<Team>,
        people: Vec<Person>,
        skills: Vec<Skill>,
    ) -> Self {
        let mut model = Self {
            name,
            project,
            teams,
            people,
            skills,
            team_keys: HashMap::new(),
            person_keys: HashMap::new(),
            skill_keys: HashMap::new(),
        };
        model.rebuild_indexes();
        model
    }

    /// Rebuild the identity lookup tables. When a table holds duplicates the
    /// first entry wins; [`RelationalModel::validate`] reports the rest.
    fn rebuild_indexes(&mut self) {
        self.team_keys = key_index(self.teams.iter().map(|t| t.name.as_str()));
        self.person_keys = key_index(self.people.iter().map(|p| p.name.as_str()));
        self.skill_keys = key_index(self.skills.iter().map(|s| s.name.as_str()));
    }

    /// Create a model seeded with the product owner and scrum master skills.
    pub fn with_default_skills(name: impl Into<String>) -> Self {
        let skills = vec![
            Skill::new(PRODUCT_OWNER_SKILL).with_description(
                "The project's main stakeholder. Responsible for making sure \
                 that their vision for the product is realised.",
            ),
            Skill::new(SCRUM_MASTER_SKILL).with_description(
                "Manages the efforts of a team, resolves difficulties and removes \
                 obstacles to task completion.",
            ),
        ];
        Self::from_parts(name.into(), None, Vec::new(), Vec::new(), skills)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Change the name the model is stored under.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }

    pub fn team(&self, name: &str) -> Option<&Team> {
        self.team_index(name).map(|i| &self.teams[i])
    }

    pub fn person(&self, name: &str) -> Option<&Person> {
        self.person_index(name).map(|i| &self.people[i])
    }

    pub fn skill(&self, name: &str) -> Option<&Skill> {
        self.skill_index(name).map(|i| &self.skills[i])
    }

    fn team_index(&self, name: &str) -> Option<usize> {
        self.team_keys.get(&identity_key(name)).copied()
    }

    fn person_index(&self, name: &str) -> Option<usize> {
        self.person_keys.get(&identity_key(name)).copied()
    }

    fn skill_index(&self, name: &str) -> Option<usize> {
        self.skill_keys.get(&identity_key(name)).copied()
    }

    fn require_team(&self, name: &str) -> ModelResult<usize> {
        self.team_index(name).ok_or_else(|| not_found(EntityKind::Team, name))
    }

    fn require_person(&self, name: &str) -> ModelResult<usize> {
        self.person_index(name)
            .ok_or_else(|| not_found(EntityKind::Person, name))
    }

    fn require_skill(&self, name: &str) -> ModelResult<usize> {
        self.skill_index(name)
            .ok_or_else(|| not_found(EntityKind::Skill, name))
    }

    // -- resolved views ------------------------------------------------------

    /// Teams assigned to the project, in project order.
    pub fn project_teams(&self) -> Vec<&Team> {
        self.project
            .iter()
            .flat_map(|p| p.teams.iter())
            .filter_map(|name| self.team(name))
            .collect()
    }

    /// Members of a team, in membership order.
    pub fn team_members(&self, team: &str) -> ModelResult<Vec<&Person>> {
        let team = &self.teams[self.require_team(team)?];
        Ok(team
            .members
            .iter()
            .filter_map(|name| self.person(name))
            .collect())
    }

    /// Skills held by a person, in the order they were granted.
    pub fn person_skills(&self, person: &str) -> ModelResult<Vec<&Skill>> {
        let person = &self.people[self.require_person(person)?];
        Ok(person
            .skills
            .iter()
            .filter_map(|name| self.skill(name))
            .collect())
    }

    /// People who are not a member of any team, in insertion order.
    pub fn unassigned_people(&self) -> Vec<&Person> {
        let assigned: HashSet<String> = self
            .teams
            .iter()
            .flat_map(|t| t.members.iter().map(|m| identity_key(m)))
            .collect();
        self.people
            .iter()
            .filter(|p| !assigned.contains(&identity_key(&p.name)))
            .collect()
    }

    /// Teams not assigned to the project, in insertion order.
    pub fn unassigned_teams(&self) -> Vec<&Team> {
        self.teams
            .iter()
            .filter(|t| !self.project.as_ref().is_some_and(|p| p.has_team(&t.name)))
            .collect()
    }

    // -- insertion -----------------------------------------------------------

    /// Replace the project, returning the previous one.
    ///
    /// The project's teams must already be in the model.
    pub fn set_project(&mut self, project: Project) -> ModelResult<Option<Project>> {
        check_name(EntityKind::Project, &project.name)?;
        self.check_project_refs(&project)?;
        Ok(self.project.replace(project))
    }

    pub fn clear_project(&mut self) -> Option<Project> {
        self.project.take()
    }

    /// Insert a skill unless one with the same name exists. Returns whether it was inserted.
    pub fn add_skill(&mut self, skill: Skill) -> ModelResult<bool> {
        self.add_skills([skill]).map(|inserted| inserted == 1)
    }

    /// Insert a person unless one with the same name exists. Returns whether it was inserted.
    ///
    /// Every skill the person holds must already be in the model.
    pub fn add_person(&mut self, person: Person) -> ModelResult<bool> {
        self.add_people([person]).map(|inserted| inserted == 1)
    }

    /// Insert a team unless one with the same name exists. Returns whether it was inserted.
    ///
    /// Every member and role holder must already be in the model.
    pub fn add_team(&mut self, team: Team) -> ModelResult<bool> {
        self.add_teams([team]).map(|inserted| inserted == 1)
    }

    /// Insert skills in order, skipping duplicates. Returns the number inserted.
    pub fn add_skills<I: IntoIterator<Item = Skill>>(&mut self, skills: I) -> ModelResult<usize> {
        let mut pending: Vec<Skill> = Vec::new();
        let mut pending_keys = HashSet::new();
        for skill in skills {
            check_name(EntityKind::Skill, &skill.name)?;
            let key = identity_key(&skill.name);
            if self.skill_keys.contains_key(&key) || !pending_keys.insert(key) {
                continue;
            }
            pending.push(skill);
        }
        let inserted = pending.len();
        for skill in pending {
            self.skill_keys.insert(identity_key(&skill.name), self.skills.len());
            self.skills.push(skill);
        }
        Ok(inserted)
    }

    /// Insert people in order, skipping duplicates. Nothing is inserted if any
    /// new person references an unknown skill.
    pub fn add_people<I: IntoIterator<Item = Person>>(&mut self, people: I) -> ModelResult<usize> {
        let mut pending: Vec<Person> = Vec::new();
        let mut pending_keys = HashSet::new();
        for person in people {
            check_name(EntityKind::Person, &person.name)?;
            let key = identity_key(&person.name);
            if self.person_keys.contains_key(&key) || !pending_keys.insert(key) {
                continue;
            }
            self.check_person_refs(&person)?;
            pending.push(person);
        }
        let inserted = pending.len();
        for person in pending {
            self.person_keys.insert(identity_key(&person.name), self.people.len());
            self.people.push(person);
        }
        Ok(inserted)
    }

    /// Insert teams in order, skipping duplicates. Nothing is inserted if any
    /// new team references an unknown person or breaks a role rule.
    pub fn add_teams<I: IntoIterator<Item = Team>>(&mut self, teams: I) -> ModelResult<usize> {
        let mut pending: Vec<Team> = Vec::new();
        let mut pending_keys = HashSet::new();
        for team in teams {
            check_name(EntityKind::Team, &team.name)?;
            let key = identity_key(&team.name);
            if self.team_keys.contains_key(&key) || !pending_keys.insert(key) {
                continue;
            }
            self.check_team_refs(&team)?;
            pending.push(team);
        }
        let inserted = pending.len();
        for team in pending {
            self.team_keys.insert(identity_key(&team.name), self.teams.len());
            self.teams.push(team);
        }
        Ok(inserted)
    }

    // -- reference edits -----------------------------------------------------

    /// Add a person to a team's members. Returns false if they already were one.
    pub fn add_member(&mut self, team: &str, person: &str) -> ModelResult<bool> {
        let ti = self.require_team(team)?;
        let pi = self.require_person(person)?;
        if self.teams[ti].has_member(person) {
            return Ok(false);
        }
        let name = self.people[pi].name.clone();
        self.teams[ti].members.push(name);
        Ok(true)
    }

    /// Remove a person from a team, clearing any role they held in it.
    pub fn remove_member(&mut self, team: &str, person: &str) -> ModelResult<bool> {
        let ti = self.require_team(team)?;
        if !self.teams[ti].references(person) {
            return Ok(false);
        }
        self.teams[ti].detach(person);
        Ok(true)
    }

    /// Grant a skill to a person. Returns false if they already held it.
    pub fn grant_skill(&mut self, person: &str, skill: &str) -> ModelResult<bool> {
        let pi = self.require_person(person)?;
        let si = self.require_skill(skill)?;
        if self.people[pi].has_skill(skill) {
            return Ok(false);
        }
        let name = self.skills[si].name.clone();
        self.people[pi].skills.push(name);
        Ok(true)
    }

    /// Take a skill away from a person.
    ///
    /// Fails if the person holds a team role that requires the skill.
    pub fn revoke_skill(&mut self, person: &str, skill: &str) -> ModelResult<bool> {
        let pi = self.require_person(person)?;
        if !self.people[pi].has_skill(skill) {
            return Ok(false);
        }
        let dependent = self.roles_requiring(person, skill);
        if let Some((team, role)) = dependent.first() {
            return Err(ModelError::IntegrityViolation(format!(
                "{person} needs skill {skill} as {role} of team {team}"
            )));
        }
        self.people[pi].skills.retain(|s| !same_identity(s, skill));
        Ok(true)
    }

    /// Assign a team to the project. Returns false if it already was assigned.
    pub fn assign_team(&mut self, team: &str) -> ModelResult<bool> {
        let ti = self.require_team(team)?;
        let name = self.teams[ti].name.clone();
        let Some(project) = self.project.as_mut() else {
            return Err(ModelError::IntegrityViolation(format!(
                "cannot assign team {name}: no project is set"
            )));
        };
        if project.has_team(&name) {
            return Ok(false);
        }
        project.teams.push(name);
        Ok(true)
    }

    /// Remove a team from the project. The team itself stays in the model.
    pub fn unassign_team(&mut self, team: &str) -> bool {
        match self.project.as_mut() {
            Some(project) if project.has_team(team) => {
                project.teams.retain(|t| !same_identity(t, team));
                true
            }
            _ => false,
        }
    }

    /// Set or clear a team role, returning the previous holder.
    ///
    /// The new holder must be a member of the team, hold the role's skill and
    /// not already hold the other role.
    pub fn set_role(
        &mut self,
        team: &str,
        role: TeamRole,
        person: Option<&str>,
    ) -> ModelResult<Option<String>> {
        let ti = self.require_team(team)?;
        let holder = match person {
            Some(person) => {
                let pi = self.require_person(person)?;
                Some(self.people[pi].name.clone())
            }
            None => None,
        };
        let mut candidate = self.teams[ti].clone();
        *candidate.role_slot(role) = holder;
        self.check_team_refs(&candidate)?;
        let previous = self.teams[ti].role(role).map(str::to_string);
        self.teams[ti] = candidate;
        Ok(previous)
    }

    pub fn set_scrum_master(
        &mut self,
        team: &str,
        person: Option<&str>,
    ) -> ModelResult<Option<String>> {
        self.set_role(team, TeamRole::ScrumMaster, person)
    }

    pub fn set_product_owner(
        &mut self,
        team: &str,
        person: Option<&str>,
    ) -> ModelResult<Option<String>> {
        self.set_role(team, TeamRole::ProductOwner, person)
    }

    pub fn describe_project(&mut self, description: impl Into<String>) -> ModelResult<()> {
        let Some(project) = self.project.as_mut() else {
            return Err(ModelError::IntegrityViolation(
                "cannot describe project: no project is set".to_string(),
            ));
        };
        project.description = description.into();
        Ok(())
    }

    pub fn describe_team(
        &mut self,
        team: &str,
        description: impl Into<String>,
    ) -> ModelResult<()> {
        let ti = self.require_team(team)?;
        self.teams[ti].description = description.into();
        Ok(())
    }

    pub fn describe_skill(
        &mut self,
        skill: &str,
        description: impl Into<String>,
    ) -> ModelResult<()> {
        let si = self.require_skill(skill)?;
        self.skills[si].description = description.into();
        Ok(())
    }

    // -- removal -------------------------------------------------------------

    /// Remove a team. With [`Removal::Restrict`] this fails while the project lists it.
    pub fn remove_team(&mut self, name: &str, removal: Removal) -> ModelResult<Team> {
        let ti = self.require_team(name)?;
        let usages = self.find_usages(&EntityRef::Team(name.to_string()));
        if !usages.is_empty() {
            if removal == Removal::Restrict {
                return Err(still_referenced(EntityKind::Team, name, &usages));
            }
            self.unassign_team(name);
        }
        let team = self.teams.remove(ti);
        self.team_keys = key_index(self.teams.iter().map(|t| t.name.as_str()));
        Ok(team)
    }

    /// Remove a person. With [`Removal::Restrict`] this fails while any team
    /// lists them as a member or role holder.
    pub fn remove_person(&mut self, name: &str, removal: Removal) -> ModelResult<Person> {
        let pi = self.require_person(name)?;
        let usages = self.find_usages(&EntityRef::Person(name.to_string()));
        if !usages.is_empty() {
            if removal == Removal::Restrict {
                return Err(still_referenced(EntityKind::Person, name, &usages));
            }
            for team in &mut self.teams {
                team.detach(name);
            }
        }
        let person = self.people.remove(pi);
        self.person_keys = key_index(self.people.iter().map(|p| p.name.as_str()));
        Ok(person)
    }

    /// Remove a skill. With [`Removal::Restrict`] this fails while anyone holds
    /// it; cascading also clears roles that depended on the skill.
    pub fn remove_skill(&mut self, name: &str, removal: Removal) -> ModelResult<Skill> {
        let si = self.require_skill(name)?;
        let usages = self.find_usages(&EntityRef::Skill(name.to_string()));
        if !usages.is_empty() {
            if removal == Removal::Restrict {
                return Err(still_referenced(EntityKind::Skill, name, &usages));
            }
            for holder in &usages {
                for (team, role) in self.roles_requiring(holder.name(), name) {
                    if let Some(ti) = self.team_index(&team) {
                        *self.teams[ti].role_slot(role) = None;
                    }
                }
            }
            for person in &mut self.people {
                person.skills.retain(|s| !same_identity(s, name));
            }
        }
        let skill = self.skills.remove(si);
        self.skill_keys = key_index(self.skills.iter().map(|s| s.name.as_str()));
        Ok(skill)
    }

    // -- usage queries -------------------------------------------------------

    /// Entities that reference `entity`, in model order.
    pub fn find_usages(&self, entity: &EntityRef) -> Vec<EntityRef> {
        match entity {
            EntityRef::Project(_) => Vec::new(),
            EntityRef::Team(name) => self
                .project
                .iter()
                .filter(|p| p.has_team(name))
                .map(|p| EntityRef::Project(p.name.clone()))
                .collect(),
            EntityRef::Person(name) => self
                .teams
                .iter()
                .filter(|t| t.references(name))
                .map(|t| EntityRef::Team(t.name.clone()))
                .collect(),
            EntityRef::Skill(name) => self
                .people
                .iter()
                .filter(|p| p.has_skill(name))
                .map(|p| EntityRef::Person(p.name.clone()))
                .collect(),
        }
    }

    pub fn in_use(&self, entity: &EntityRef) -> bool {
        !self.find_usages(entity).is_empty()
    }

    pub fn exists(&self, entity: &EntityRef) -> bool {
        match entity {
            EntityRef::Project(name) => self
                .project
                .as_ref()
                .is_some_and(|p| same_identity(&p.name, name)),
            EntityRef::Team(name) => self.team_index(name).is_some(),
            EntityRef::Person(name) => self.person_index(name).is_some(),
            EntityRef::Skill(name) => self.skill_index(name).is_some(),
        }
    }

    // -- validation ----------------------------------------------------------

    /// Check every invariant over the whole graph.
    pub fn validate(&self) -> ModelResult<()> {
        check_unique(EntityKind::Skill, self.skills.iter().map(|s| s.name.as_str()))?;
        check_unique(EntityKind::Person, self.people.iter().map(|p| p.name.as_str()))?;
        check_unique(EntityKind::Team, self.teams.iter().map(|t| t.name.as_str()))?;
        for person in &self.people {
            self.check_person_refs(person)?;
        }
        for team in &self.teams {
            self.check_team_refs(team)?;
        }
        if let Some(project) = &self.project {
            check_name(EntityKind::Project, &project.name)?;
            self.check_project_refs(project)?;
        }
        Ok(())
    }

    fn check_person_refs(&self, person: &Person) -> ModelResult<()> {
        let mut seen = HashSet::new();
        for skill in &person.skills {
            if self.skill_index(skill).is_none() {
                return Err(ModelError::IntegrityViolation(format!(
                    "person {} references unknown skill {skill}",
                    person.name
                )));
            }
            if !seen.insert(identity_key(skill)) {
                return Err(ModelError::IntegrityViolation(format!(
                    "person {} lists skill {skill} more than once",
                    person.name
                )));
            }
        }
        Ok(())
    }

    fn check_team_refs(&self, team: &Team) -> ModelResult<()> {
        let mut seen = HashSet::new();
        for member in &team.members {
            if self.person_index(member).is_none() {
                return Err(ModelError::IntegrityViolation(format!(
                    "team {} references unknown person {member}",
                    team.name
                )));
            }
            if !seen.insert(identity_key(member)) {
                return Err(ModelError::IntegrityViolation(format!(
                    "team {} lists member {member} more than once",
                    team.name
                )));
            }
        }
        for role in [TeamRole::ScrumMaster, TeamRole::ProductOwner] {
            let Some(holder) = team.role(role) else {
                continue;
            };
            let Some(person) = self.person(holder) else {
                return Err(ModelError::IntegrityViolation(format!(
                    "{role} {holder} of team {} is not a known person",
                    team.name
                )));
            };
            if !team.has_member(holder) {
                return Err(ModelError::IntegrityViolation(format!(
                    "{role} {holder} is not a member of team {}",
                    team.name
                )));
            }
            if !person.can_be(role) {
                return Err(ModelError::IntegrityViolation(format!(
                    "{holder} lacks the {} skill required to be {role} of team {}",
                    role.required_skill(),
                    team.name
                )));
            }
            if team.role(role.other()).is_some_and(|other| same_identity(other, holder)) {
                return Err(ModelError::IntegrityViolation(format!(
                    "{holder} cannot be both {role} and {} of team {}",
                    role.other(),
                    team.name
                )));
            }
        }
        Ok(())
    }

    fn check_project_refs(&self, project: &Project) -> ModelResult<()> {
        let mut seen = HashSet::new();
        for team in &project.teams {
            if self.team_index(team).is_none() {
                return Err(ModelError::IntegrityViolation(format!(
                    "project {} references unknown team {team}",
                    project.name
                )));
            }
            if !seen.insert(identity_key(team)) {
                return Err(ModelError::IntegrityViolation(format!(
                    "project {} lists team {team} more than once",
                    project.name
                )));
            }
        }
        Ok(())
    }

    /// Roles `person` holds that would be invalid without `skill`.
    fn roles_requiring(&self, person: &str, skill: &str) -> Vec<(String, TeamRole)> {
        let mut roles = Vec::new();
        for team in &self.teams {
            for role in team.roles_of(person) {
                if same_identity(role.required_skill(), skill) {
                    roles.push((team.name.clone(), role));
                }
            }
        }
        roles
    }
}

fn check_name(kind: EntityKind, name: &str) -> ModelResult<()> {
    if name.trim().is_empty() {
        return Err(ModelError::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

fn check_unique<'a>(kind: EntityKind, names: impl Iterator<Item = &'a str>) -> ModelResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        check_name(kind, name)?;
        if !seen.insert(identity_key(name)) {
            return Err(ModelError::IntegrityViolation(format!(
                "duplicate {kind} {name}"
            )));
        }
    }
    Ok(())
}

fn key_index<'a>(names: impl Iterator<Item = &'a str>) -> HashMap<String, usize> {
    let mut index = HashMap::new();
    for (i, name) in names.enumerate() {
        index.entry(identity_key(name)).or_insert(i);
    }
    index
}

fn not_found(kind: EntityKind, name: &str) -> ModelError {
    ModelError::NotFound {
        kind,
        name: name.to_string(),
    }
}

fn still_referenced(kind: EntityKind, name: &str, usages: &[EntityRef]) -> ModelError {
    let users: Vec<String> = usages.iter().map(ToString::to_string).collect();
    ModelError::IntegrityViolation(format!(
        "{kind} {name} is still referenced by {}",
        users.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_key_ignores_case_and_padding() {
        assert_eq!(identity_key("  Java "), "java");
        assert!(same_identity("Core", "core"));
        assert!(!same_identity("Core", "Cores"));
    }

    #[test]
    fn test_role_skills() {
        assert!(Skill::new("sm").is_scrum_master_skill());
        assert!(Skill::new("PO").is_product_owner_skill());
        assert_eq!(TeamRole::ScrumMaster.required_skill(), SCRUM_MASTER_SKILL);
        assert_eq!(TeamRole::ProductOwner.other(), TeamRole::ScrumMaster);
    }

    #[test]
    fn test_team_detach_clears_roles() {
        let mut team = Team::new("Core")
            .with_members(["Alice", "Bob"])
            .with_role(TeamRole::ScrumMaster, "alice");
        assert_eq!(team.roles_of("ALICE"), vec![TeamRole::ScrumMaster]);

        team.detach("Alice");
        assert_eq!(team.members, vec!["Bob".to_string()]);
        assert!(team.scrum_master.is_none());
    }

    #[test]
    fn test_identity_key_folds_non_ascii() {
        assert_eq!(identity_key(" ÉCOLE "), "école");
        assert!(same_identity("École", "école"));
    }

    #[test]
    fn test_lookup_after_removal() {
        let mut model = RelationalModel::new("m");
        model
            .add_skills([Skill::new("A"), Skill::new("B"), Skill::new("C")])
            .unwrap();
        model.remove_skill("a", Removal::Restrict).unwrap();
        assert!(model.skill("A").is_none());
        assert_eq!(model.skill("b").unwrap().name, "B");
        assert_eq!(model.skill("C").unwrap().name, "C");

        model.add_skill(Skill::new("D")).unwrap();
        assert_eq!(model.skill("d").unwrap().name, "D");
        assert!(!model.add_skill(Skill::new("c")).unwrap());
    }

    #[test]
    fn test_from_parts_first_duplicate_wins() {
        let model = RelationalModel::from_parts(
            "m".to_string(),
            None,
            Vec::new(),
            Vec::new(),
            vec![
                Skill::new("Go").with_description("first"),
                Skill::new("go").with_description("second"),
            ],
        );
        assert_eq!(model.skill("GO").unwrap().description, "first");
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_describe_project_without_project() {
        let mut model = RelationalModel::new("m");
        let err = model.describe_project("anything").unwrap_err();
        assert!(matches!(err, ModelError::IntegrityViolation(_)));
        assert!(err.to_string().contains("no project is set"));
    }

    #[test]
    fn test_default_skills_are_seeded() {
        let model = RelationalModel::with_default_skills("acme");
        assert_eq!(model.skills().len(), 2);
        assert!(model.skill("po").is_some());
        assert!(model.skill("SM").is_some());
        assert!(model.validate().is_ok());
    }
}
