//! `partnum project` command - Project management

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::open_session;
use crate::cli::output::{print_json, print_projects, print_yaml};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::store::PartQueries;

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a new project
    New(NewArgs),

    /// List projects
    List,

    /// Show a project and its part counts
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Project name
    pub name: String,

    /// Prefix used in part numbers (1-10 letters or digits)
    pub prefix: String,

    /// Optional description
    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Project prefix (default: the selected project)
    pub prefix: Option<String>,
}

pub fn run(cmd: ProjectCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ProjectCommands::New(args) => run_new(args, global),
        ProjectCommands::List => run_list(global),
        ProjectCommands::Show(args) => run_show(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let project = session
        .service
        .create_project(&args.name, &args.prefix, args.description)?;

    match global.format {
        OutputFormat::Json => print_json(&project)?,
        OutputFormat::Yaml => print_yaml(&project)?,
        OutputFormat::Id => println!("{}", project.prefix),
        _ => {
            println!(
                "{} Created project {} {}",
                style("✓").green(),
                style(&project.prefix).cyan(),
                style(&project.name).yellow()
            );
            if !global.quiet {
                println!(
                    "  First assembly will be {}",
                    style(format!("{}-A-0000", project.prefix)).cyan()
                );
            }
        }
    }
    Ok(())
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let projects = session.service.list_projects()?;
    if projects.is_empty() && global.format == OutputFormat::Auto {
        if !global.quiet {
            println!("No projects found.");
        }
        return Ok(());
    }
    print_projects(&projects, global.format)
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let project = match &args.prefix {
        Some(prefix) => session.service.project_by_prefix(prefix)?,
        None => session.project(global)?,
    };
    let (assemblies, parts) = session
        .service
        .store()
        .count_by_type(project.id)
        .map_err(crate::core::NumberingError::from)?;

    match global.format {
        OutputFormat::Json => print_json(&project),
        OutputFormat::Yaml => print_yaml(&project),
        OutputFormat::Id => {
            println!("{}", project.prefix);
            Ok(())
        }
        _ => {
            println!("{}", style("─".repeat(60)).dim());
            println!("{}: {}", style("Prefix").bold(), style(&project.prefix).cyan());
            println!("{}: {}", style("Name").bold(), style(&project.name).yellow());
            if let Some(desc) = &project.description {
                println!("{}: {}", style("Description").bold(), desc);
            }
            println!("{}", style("─".repeat(60)).dim());
            println!("{}: {}", style("Assemblies").bold(), assemblies);
            println!("{}: {}", style("Parts").bold(), parts);
            Ok(())
        }
    }
}
