//! CLI binary for MURCS: create, inspect, validate and report on stored project models.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use murcs_core::config::MurcsConfig;
use murcs_core::error::ModelResult;
use murcs_core::manager::{ModelEvent, PersistenceManager};
use murcs_core::model::{
    PRODUCT_OWNER_SKILL, Person, Project, RelationalModel, SCRUM_MASTER_SKILL, Skill, Team,
    TeamRole,
};
use murcs_core::persistence::FilePersistenceLoader;
use murcs_core::report::{ReportGenerator, ReportScope};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser)]
#[command(name = "murcs", about = "Manage MURCS project models")]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Model directory (overrides the configured storage directory)
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored models
    List,

    /// Print a summary of a stored model
    Show {
        /// Model name
        name: String,
    },

    /// Write a small example model
    Sample {
        /// Model name
        name: String,

        /// Overwrite an existing model of the same name
        #[arg(long)]
        force: bool,
    },

    /// Load a model and check its integrity
    Validate {
        /// Model name
        name: String,
    },

    /// Render a report for a stored model
    Report {
        /// Model name
        name: String,

        /// Write the report to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only report these teams (repeatable)
        #[arg(long, conflicts_with = "person")]
        team: Vec<String>,

        /// Only report these people (repeatable)
        #[arg(long)]
        person: Vec<String>,
    },

    /// Delete a stored model
    Delete {
        /// Model name
        name: String,
    },
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;
    let config = MurcsConfig::load(&project_root).context("failed to load .murcs/config.toml")?;
    let mut manager = open_manager(&project_root, cli.dir.as_deref(), &config);

    match cli.command {
        Commands::List => cmd_list(&manager),
        Commands::Show { name } => cmd_show(&mut manager, &name),
        Commands::Sample { name, force } => cmd_sample(&mut manager, &name, force),
        Commands::Validate { name } => cmd_validate(&mut manager, &name),
        Commands::Report {
            name,
            output,
            team,
            person,
        } => {
            let scope = if !team.is_empty() {
                ReportScope::Teams(team)
            } else if !person.is_empty() {
                ReportScope::People(person)
            } else {
                ReportScope::All
            };
            let generator = ReportGenerator::from_config(&config.report);
            cmd_report(&mut manager, &generator, &name, &scope, output.as_deref())
        }
        Commands::Delete { name } => cmd_delete(&manager, &name),
    }
}

/// Build a manager backed by the model directory for this project.
fn open_manager(
    project_root: &Path,
    dir: Option<&Path>,
    config: &MurcsConfig,
) -> PersistenceManager {
    let directory = dir.map_or_else(
        || config.storage.resolve_directory(project_root),
        Path::to_path_buf,
    );
    debug!(directory = %directory.display(), "using model directory");
    let loader = FilePersistenceLoader::new(directory).with_extension(&config.storage.extension);
    let mut manager = PersistenceManager::with_loader(loader);
    manager.add_listener(|event| match event {
        ModelEvent::Replaced { old, new } => debug!(
            old = old.map(RelationalModel::name),
            new = new.name(),
            "active model replaced"
        ),
        ModelEvent::Edited { model } => debug!(model = model.name(), "active model edited"),
    });
    manager
}

fn cmd_list(manager: &PersistenceManager) -> Result<()> {
    let names = manager.model_list().context("failed to list models")?;
    if names.is_empty() {
        eprintln!("No models found. Run `murcs sample <name>` to create one.");
        return Ok(());
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

fn load(manager: &mut PersistenceManager, name: &str) -> Result<()> {
    manager
        .load(name)
        .with_context(|| format!("failed to load model {name}"))?;
    Ok(())
}

fn cmd_show(manager: &mut PersistenceManager, name: &str) -> Result<()> {
    load(manager, name)?;
    let Some(model) = manager.current_model() else {
        anyhow::bail!("model {name} is not active after loading");
    };

    println!("Model: {}", model.name());
    match model.project() {
        Some(project) => {
            println!("Project: {}", project.name);
            if !project.description.is_empty() {
                println!("  {}", project.description);
            }
        }
        None => println!("Project: (none)"),
    }

    println!("\nTeams ({}):", model.teams().len());
    for team in model.teams() {
        let assigned = model.project().is_some_and(|p| p.has_team(&team.name));
        println!(
            "  {}{}",
            team.name,
            if assigned { "" } else { " (unassigned)" }
        );
        for member in &team.members {
            let roles: Vec<String> = team
                .roles_of(member)
                .iter()
                .map(ToString::to_string)
                .collect();
            if roles.is_empty() {
                println!("    - {}", member);
            } else {
                println!("    - {} [{}]", member, roles.join(", "));
            }
        }
    }

    let unassigned = model.unassigned_people();
    if !unassigned.is_empty() {
        println!("\nUnassigned people ({}):", unassigned.len());
        for person in unassigned {
            println!("  {}", person.name);
        }
    }

    println!("\nSkills ({}):", model.skills().len());
    for skill in model.skills() {
        println!("  {}", skill.name);
    }
    Ok(())
}

fn cmd_sample(manager: &mut PersistenceManager, name: &str, force: bool) -> Result<()> {
    if !force && manager.model_exists(name)? {
        anyhow::bail!("model {name} already exists. Use --force to overwrite.");
    }
    let model = sample_model(name).context("failed to build sample model")?;
    manager.set_current_model(model);
    manager
        .save()
        .with_context(|| format!("failed to save model {name}"))?;
    println!("Wrote sample model {}", name);
    Ok(())
}

fn cmd_validate(manager: &mut PersistenceManager, name: &str) -> Result<()> {
    load(manager, name)?;
    if let Some(model) = manager.current_model() {
        model.validate()?;
        println!(
            "Model {} is valid: {} teams, {} people, {} skills",
            model.name(),
            model.teams().len(),
            model.people().len(),
            model.skills().len()
        );
    }
    Ok(())
}

fn cmd_report(
    manager: &mut PersistenceManager,
    generator: &ReportGenerator,
    name: &str,
    scope: &ReportScope,
    output: Option<&Path>,
) -> Result<()> {
    load(manager, name)?;
    let Some(model) = manager.current_model() else {
        anyhow::bail!("model {name} is not active after loading");
    };
    match output {
        Some(path) => {
            generator
                .generate(model, scope, path)
                .with_context(|| format!("failed to write report for {name}"))?;
            eprintln!("Report written to {}", path.display());
        }
        None => generator
            .write_to(model, scope, std::io::stdout().lock())
            .with_context(|| format!("failed to render report for {name}"))?,
    }
    Ok(())
}

fn cmd_delete(manager: &PersistenceManager, name: &str) -> Result<()> {
    if manager.delete_model(name)? {
        println!("Deleted model {}", name);
    } else {
        eprintln!("No model named {}", name);
    }
    Ok(())
}

/// A small, fixed example model covering every kind of entity and both roles.
fn sample_model(name: &str) -> ModelResult<RelationalModel> {
    let mut model = RelationalModel::with_default_skills(name);
    model.add_skills([
        Skill::new("Java").with_description("Server-side development on the JVM"),
        Skill::new("Rust").with_description("Systems programming"),
        Skill::new("Testing").with_description("Test design and automation"),
    ])?;
    model.add_people([
        Person::new("Alice")
            .with_user_id("alice")
            .with_skills([SCRUM_MASTER_SKILL, "Java"]),
        Person::new("Bob")
            .with_user_id("bob")
            .with_skills([PRODUCT_OWNER_SKILL]),
        Person::new("Carol")
            .with_user_id("carol")
            .with_skills(["Rust", "Testing"]),
        Person::new("Dan").with_user_id("dan").with_skills(["Java"]),
    ])?;
    model.add_teams([
        Team::new("Core")
            .with_description("Backend services")
            .with_members(["Alice", "Bob", "Carol"])
            .with_role(TeamRole::ScrumMaster, "Alice")
            .with_role(TeamRole::ProductOwner, "Bob"),
        Team::new("Tooling")
            .with_description("Build and release tooling")
            .with_members(["Carol"]),
    ])?;
    model.set_project(
        Project::new("MURCS Sample")
            .with_description("Example project created by `murcs sample`")
            .with_teams(["Core"]),
    )?;
    Ok(model)
}
