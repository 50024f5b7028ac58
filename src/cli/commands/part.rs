//! `partnum part` command - Part and assembly management

use clap::Subcommand;
use console::{style, Term};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{open_session, Session};
use crate::cli::output::{print_json, print_part, print_parts, print_yaml, NumberIndex, PartView};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::PartType;
use crate::core::NumberingError;
use crate::engine::validator::parse_type;
use crate::engine::CreatePart;
use crate::store::{Part, PartDetails, PartQueries, PartStore, PartUpdate, Priority, Project};

#[derive(Subcommand, Debug)]
pub enum PartCommands {
    /// Create a new part or assembly
    New(NewArgs),

    /// List parts of the selected project
    List(ListArgs),

    /// Show a part's details and ancestry
    Show(ShowArgs),

    /// Change descriptive fields (numbers and hierarchy stay)
    Edit(EditArgs),

    /// Attach a part to another assembly (numbers never change)
    Move(MoveArgs),

    /// Set or re-derive subteam and subsystem
    Classify(ClassifyArgs),

    /// Delete a part that has no children
    Rm(RmArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Record type: assembly or part
    #[arg(long = "type", short = 't')]
    pub part_type: Option<String>,

    /// Display name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Parent assembly (part number or #id); required for parts
    #[arg(long, short = 'P')]
    pub parent: Option<String>,

    /// Explicit subteam assembly instead of the derived one
    #[arg(long)]
    pub subteam: Option<String>,

    /// Explicit subsystem assembly instead of the derived one
    #[arg(long)]
    pub subsystem: Option<String>,

    /// Description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Lifecycle status (default: "in design")
    #[arg(long)]
    pub status: Option<String>,

    /// Quantity per parent (default: 1)
    #[arg(long)]
    pub quantity: Option<u32>,

    /// Material
    #[arg(long, short = 'm')]
    pub material: Option<String>,

    /// Drawing revision
    #[arg(long)]
    pub revision: Option<String>,

    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Manufacturing priority
    #[arg(long, value_enum, default_value_t = Priority::Normal)]
    pub priority: Priority,

    /// Print the number that would be assigned without creating anything
    #[arg(long)]
    pub dry_run: bool,

    /// Prompt for missing type and name
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only direct children of this assembly
    #[arg(long, short = 'P')]
    pub parent: Option<String>,

    /// Only records of this type
    #[arg(long = "type", short = 't')]
    pub part_type: Option<String>,

    /// Only records classified under this subteam
    #[arg(long)]
    pub subteam: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Part number or #id
    pub part: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Part number or #id
    pub part: String,

    /// New display name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Lifecycle status
    #[arg(long)]
    pub status: Option<String>,

    /// Quantity per parent
    #[arg(long)]
    pub quantity: Option<u32>,

    /// Material
    #[arg(long, short = 'm')]
    pub material: Option<String>,

    /// Drawing revision
    #[arg(long)]
    pub revision: Option<String>,

    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Quantity in stock
    #[arg(long)]
    pub on_hand: Option<u32>,

    /// Quantity on order
    #[arg(long)]
    pub on_order: Option<u32>,

    /// Manufacturing priority
    #[arg(long, value_enum)]
    pub priority: Option<Priority>,

    /// Whether a drawing exists
    #[arg(long)]
    pub drawing: Option<bool>,
}

#[derive(clap::Args, Debug)]
#[command(group(clap::ArgGroup::new("target").required(true).args(["parent", "root"])))]
pub struct MoveArgs {
    /// Part number or #id of the record to move
    pub part: String,

    /// New parent assembly
    #[arg(long, short = 'P')]
    pub parent: Option<String>,

    /// Detach to the top level (assemblies only)
    #[arg(long)]
    pub root: bool,

    /// Recompute subteam and subsystem from the new position
    #[arg(long)]
    pub rederive: bool,
}

#[derive(clap::Args, Debug)]
pub struct ClassifyArgs {
    /// Part number or #id
    pub part: String,

    /// Subteam assembly
    #[arg(long, conflicts_with = "derive")]
    pub subteam: Option<String>,

    /// Subsystem assembly
    #[arg(long, conflicts_with = "derive")]
    pub subsystem: Option<String>,

    /// Recompute both from the current position
    #[arg(long)]
    pub derive: bool,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Part number or #id
    pub part: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: PartCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        PartCommands::New(args) => run_new(args, global),
        PartCommands::List(args) => run_list(args, global),
        PartCommands::Show(args) => run_show(args, global),
        PartCommands::Edit(args) => run_edit(args, global),
        PartCommands::Move(args) => run_move(args, global),
        PartCommands::Classify(args) => run_classify(args, global),
        PartCommands::Rm(args) => run_rm(args, global),
    }
}

/// Project for a new record: explicit selection wins, otherwise the
/// parent's project, otherwise the workspace default
fn target_project(session: &Session, global: &GlobalOpts, parent: Option<&Part>) -> Result<Project> {
    let explicit = global.project.is_some() || session.config.default_project.is_some();
    match parent {
        Some(parent) if !explicit => Ok(session.service.get_project(parent.project_id)?),
        _ => session.project(global),
    }
}

fn project_index(store: &PartStore, project: &Project) -> Result<NumberIndex> {
    let parts = store
        .list_parts(project.id, None)
        .map_err(NumberingError::from)?;
    Ok(NumberIndex::new(&parts))
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let theme = ColorfulTheme::default();
    let prompt = args.interactive && Term::stdout().is_term();

    let part_type = match (&args.part_type, prompt) {
        (Some(raw), _) => parse_type(raw)?,
        (None, true) => {
            let choice = Select::with_theme(&theme)
                .with_prompt("Type")
                .items(&["assembly", "part"])
                .default(if args.parent.is_some() { 1 } else { 0 })
                .interact()
                .into_diagnostic()?;
            PartType::all()[choice]
        }
        (None, false) => {
            return Err(miette::miette!(
                help = "pass --type assembly or --type part",
                "a record type is required"
            ))
        }
    };

    let name = match (args.name, prompt) {
        (Some(name), _) => name,
        (None, true) => Input::<String>::with_theme(&theme)
            .with_prompt("Name")
            .interact_text()
            .into_diagnostic()?,
        (None, false) => {
            return Err(miette::miette!(help = "pass --name <NAME>", "a name is required"))
        }
    };

    let parent = session.part_opt(args.parent.as_deref())?;
    let subteam = session.part_opt(args.subteam.as_deref())?;
    let subsystem = session.part_opt(args.subsystem.as_deref())?;
    let project = target_project(&session, global, parent.as_ref())?;

    let mut request = CreatePart::new(project.id, part_type, parent.as_ref().map(|p| p.id), name);
    request.description = args.description;
    request.status = args.status;
    request.quantity = args.quantity;
    request.subteam_id = subteam.map(|p| p.id);
    request.subsystem_id = subsystem.map(|p| p.id);
    request.details = PartDetails {
        material: args.material,
        revision: args.revision,
        notes: args.notes,
        priority: args.priority,
        ..PartDetails::default()
    };

    if args.dry_run {
        let allocation = session.service.preview(&request)?;
        return match global.format {
            OutputFormat::Json => print_json(&allocation),
            OutputFormat::Yaml => print_yaml(&allocation),
            _ => {
                println!("{}", allocation.part_number);
                Ok(())
            }
        };
    }

    let part = session.service.create_part(&request)?;
    let index = project_index(session.service.store(), &project)?;

    match global.format {
        OutputFormat::Json => print_json(&PartView::new(&part, &index))?,
        OutputFormat::Yaml => print_yaml(&PartView::new(&part, &index))?,
        OutputFormat::Id => println!("{}", part.part_number),
        _ => {
            println!(
                "{} Created {} {} {}",
                style("✓").green(),
                part.part_type,
                style(&part.part_number).cyan(),
                style(&part.name).yellow()
            );
            if !global.quiet {
                let view = PartView::new(&part, &index);
                if let Some(subteam) = view.subteam {
                    println!("  {}: {}", style("Subteam").dim(), subteam);
                }
                if let Some(subsystem) = view.subsystem {
                    println!("  {}: {}", style("Subsystem").dim(), subsystem);
                }
            }
        }
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let project = session.project(global)?;
    let store = session.service.store();

    let parent = session.part_opt(args.parent.as_deref())?;
    let subteam = session.part_opt(args.subteam.as_deref())?;
    let part_type = args
        .part_type
        .as_deref()
        .map(parse_type)
        .transpose()?;

    let mut parts = store
        .list_parts(project.id, parent.as_ref().map(|p| p.id))
        .map_err(NumberingError::from)?;
    if let Some(part_type) = part_type {
        parts.retain(|p| p.part_type == part_type);
    }
    if let Some(subteam) = &subteam {
        parts.retain(|p| p.subteam_id == Some(subteam.id));
    }

    if parts.is_empty() && global.format == OutputFormat::Auto {
        if !global.quiet {
            println!("No parts found.");
        }
        return Ok(());
    }

    let index = project_index(store, &project)?;
    print_parts(&parts, &index, global.format, global.quiet)
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let part = session.part(&args.part)?;
    let project = session.service.get_project(part.project_id)?;
    let index = project_index(session.service.store(), &project)?;

    let breadcrumb = match session.service.breadcrumb(&part) {
        Ok(chain) => chain,
        Err(e) => {
            tracing::warn!(part = %part.part_number, error = %e, "cannot resolve ancestry");
            Vec::new()
        }
    };
    let children = session
        .service
        .store()
        .children(part.id)
        .map_err(NumberingError::from)?;
    print_part(&part, &breadcrumb, &children, &index, global.format)
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let part = session.part(&args.part)?;

    let update = PartUpdate {
        name: args.name,
        description: args.description,
        status: args.status,
        quantity: args.quantity,
        material: args.material,
        revision: args.revision,
        notes: args.notes,
        quantity_on_hand: args.on_hand,
        quantity_on_order: args.on_order,
        priority: args.priority,
        drawing_created: args.drawing,
    };
    if update.is_empty() {
        return Err(miette::miette!(
            help = "pass at least one field to change, e.g. --revision B",
            "nothing to update"
        ));
    }

    let updated = session.service.update_part(part.id, update)?;
    let project = session.service.get_project(updated.project_id)?;
    let index = project_index(session.service.store(), &project)?;
    match global.format {
        OutputFormat::Json => print_json(&PartView::new(&updated, &index)),
        OutputFormat::Yaml => print_yaml(&PartView::new(&updated, &index)),
        OutputFormat::Id => {
            println!("{}", updated.part_number);
            Ok(())
        }
        _ => {
            println!(
                "{} Updated {} {}",
                style("✓").green(),
                style(&updated.part_number).cyan(),
                style(&updated.name).yellow()
            );
            Ok(())
        }
    }
}

fn run_move(args: MoveArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let part = session.part(&args.part)?;
    let parent = if args.root {
        None
    } else {
        session.part_opt(args.parent.as_deref())?
    };

    let moved = session
        .service
        .move_part(part.id, parent.as_ref().map(|p| p.id), args.rederive)?;

    if global.format == OutputFormat::Id {
        println!("{}", moved.part_number);
        return Ok(());
    }
    let target = parent
        .as_ref()
        .map_or("the top level".to_string(), |p| p.part_number.clone());
    println!(
        "{} Moved {} under {}",
        style("✓").green(),
        style(&moved.part_number).cyan(),
        style(target).cyan()
    );
    Ok(())
}

fn run_classify(args: ClassifyArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let part = session.part(&args.part)?;

    let updated = if args.derive {
        session.service.reclassify(part.id)?
    } else {
        let subteam = session.part_opt(args.subteam.as_deref())?;
        let subsystem = session.part_opt(args.subsystem.as_deref())?;
        session.service.set_classification(
            part.id,
            subteam.map(|p| p.id),
            subsystem.map(|p| p.id),
        )?
    };

    let project = session.service.get_project(updated.project_id)?;
    let index = project_index(session.service.store(), &project)?;
    let view = PartView::new(&updated, &index);
    match global.format {
        OutputFormat::Json => print_json(&view),
        OutputFormat::Yaml => print_yaml(&view),
        _ => {
            println!(
                "{} {} subteam={} subsystem={}",
                style("✓").green(),
                style(&updated.part_number).cyan(),
                view.subteam.unwrap_or("-"),
                view.subsystem.unwrap_or("-")
            );
            Ok(())
        }
    }
}

fn run_rm(args: RmArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let part = session.part(&args.part)?;

    if !args.yes {
        if !Term::stdout().is_term() {
            return Err(miette::miette!(
                help = "pass --yes to delete without confirmation",
                "refusing to delete {} without confirmation",
                part.part_number
            ));
        }
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Delete {} {}?", part.part_number, part.name))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let deleted = session.service.delete_part(part.id)?;
    if !global.quiet {
        println!(
            "{} Deleted {} {}",
            style("✓").green(),
            style(&deleted.part_number).cyan(),
            deleted.name
        );
    }
    Ok(())
}
