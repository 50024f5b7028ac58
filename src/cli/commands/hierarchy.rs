//! `partnum hierarchy` command - Subteam and subsystem candidates

use console::style;
use miette::Result;

use crate::cli::helpers::open_session;
use crate::cli::output::{print_json, print_parts, print_yaml, NumberIndex};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::NumberingError;
use crate::store::PartQueries;

#[derive(clap::Args, Debug)]
pub struct HierarchyArgs {
    /// Only list subteams
    #[arg(long, conflicts_with = "subsystems")]
    pub subteams: bool,

    /// Only list subsystems
    #[arg(long)]
    pub subsystems: bool,
}

pub fn run(args: HierarchyArgs, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let project = session.project(global)?;
    let info = session.service.hierarchy_info(project.id)?;

    match global.format {
        OutputFormat::Json => return print_json(&info),
        OutputFormat::Yaml => return print_yaml(&info),
        _ => {}
    }

    let parts = session
        .service
        .store()
        .list_parts(project.id, None)
        .map_err(NumberingError::from)?;
    let index = NumberIndex::new(&parts);

    let sections = [
        ("Subteams", &info.subteams, !args.subsystems),
        ("Subsystems", &info.subsystems, !args.subteams),
    ];
    let shown = sections.iter().filter(|(_, _, show)| *show).count();

    for (title, parts, show) in sections {
        if !show {
            continue;
        }
        if shown > 1 && global.format == OutputFormat::Auto {
            println!("{}", style(title).bold());
        }
        if parts.is_empty() {
            if global.format == OutputFormat::Auto && !global.quiet {
                println!("  (none)");
            }
        } else {
            print_parts(parts, &index, global.format, global.quiet)?;
        }
        if shown > 1 && global.format == OutputFormat::Auto {
            println!();
        }
    }
    Ok(())
}
