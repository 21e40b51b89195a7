//! # mt - floorplan task tracker
//!
//! Upload a floorplan PDF and every device label on it (`D101`, `AP3`,
//! `SP01`...) that matches a legend category becomes a task group with that
//! category's checklist of install steps.
//!
//! ```bash
//! mt project new "Lake House"
//! mt import floorplan.pdf
//! mt list --open
//! mt step done D101 2
//! mt status
//! ```
//!
//! Data is stored in `~/.maptasker/` (or `$MAPTASKER_HOME`, or `--dir`), one
//! JSON file per project.

use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;

use maptasker::project::{get_most_recent_project, Project};
use maptasker::settings::{load_global_templates, Settings};

mod cli;
mod cmd;

use cli::Cli;
use cmd::*;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
}

fn data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os("MAPTASKER_HOME").map(PathBuf::from))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".maptasker")
        })
}

/// The project named with --project, else the most recently modified one.
fn select_project(dir: &std::path::Path, name: Option<&str>) -> Option<Project> {
    if let Some(name) = name {
        return Some(Project::new(name, dir));
    }
    match get_most_recent_project(dir) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("Failed to read {}: {}", dir.display(), e);
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Completions never touch the data directory
    if let Commands::Completions { shell } = &cli.command {
        cmd_completions(*shell);
        return;
    }

    let dir = data_dir(cli.dir.clone());
    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("Failed to create data directory {}: {}", dir.display(), e);
        std::process::exit(1);
    }
    log::debug!("Data directory: {}", dir.display());

    let mut settings = match Settings::load(&dir) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {}: {}", Settings::path(&dir).display(), e);
            std::process::exit(1);
        }
    };
    if let Some(policy) = cli.policy {
        settings.reimport_policy = policy;
    }
    if cli.no_kerning {
        settings.kerning_repair = false;
    }
    if cli.no_backup {
        settings.backup_before_import = false;
    }

    let project = cli.project.as_deref();

    // Commands that don't need an existing project
    match cli.command {
        Commands::Project { action: ProjectAction::New { name, desc } } => {
            cmd_project_new(&dir, name, desc);
        }
        Commands::Project { action: ProjectAction::Rm { name, yes } } => {
            cmd_project_rm(&dir, name, yes);
        }
        Commands::Projects => {
            cmd_projects(&dir, select_project(&dir, project).as_ref());
        }
        Commands::Search { query, limit } => {
            cmd_search(&dir, query, limit);
        }
        Commands::Template { global: true, action } => {
            cmd_template_global(&dir, action);
        }
        command => {
            let selected = select_project(&dir, project);
            if let (Commands::Check { pdf }, None) = (&command, &selected) {
                let templates = match load_global_templates(&dir) {
                    Ok(t) => t,
                    Err(e) => {
                        eprintln!("Failed to read global templates: {}", e);
                        std::process::exit(1);
                    }
                };
                cmd_check(&templates, &settings, pdf);
                return;
            }
            run_project_command(command, selected, &settings);
        }
    }
}

fn run_project_command(command: Commands, selected: Option<Project>, settings: &Settings) {
    let Some(project) = selected else {
        eprintln!("No projects found. Create one with `mt project new <name>`.");
        std::process::exit(1);
    };
    if !project.exists() {
        eprintln!("Project '{}' not found. Create it with `mt project new`.", project.display_name);
        std::process::exit(1);
    }
    log::info!("Using project '{}'", project.display_name);

    // Import takes the lock before loading, so it manages its own database
    if let Commands::Import { pdf } = &command {
        cmd_import(&project, settings, pdf);
        return;
    }

    let mut db = match project.load_database() {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to load project '{}': {}", project.display_name, e);
            std::process::exit(1);
        }
    };

    match command {
        Commands::Project { .. }
        | Commands::Projects
        | Commands::Search { .. }
        | Commands::Completions { .. }
        | Commands::Import { .. } => {
            unreachable!("handled before a project is loaded")
        }
        Commands::Check { pdf } => cmd_check(db.list_templates(), settings, &pdf),
        Commands::List { kind, open, tree } => cmd_list(&db, kind, open, tree),
        Commands::View { task } => cmd_view(&db, task),
        Commands::Add { label, category } => cmd_add(&mut db, &project, label, category),
        Commands::Retype { task, category, yes } => cmd_retype(&mut db, &project, task, category, yes),
        Commands::Step { action } => cmd_step(&mut db, &project, action),
        Commands::Comment { task, text, step, user } => {
            cmd_comment(&mut db, &project, settings, task, text, step, user)
        }
        Commands::Photo { action } => cmd_photo(&mut db, &project, action),
        Commands::Delete { task, yes } => cmd_delete(&mut db, &project, task, yes),
        Commands::Template { action, .. } => cmd_template(&mut db, &project, action),
        Commands::Status => cmd_status(&db),
        Commands::Backup => cmd_backup(&project),
    }
}
