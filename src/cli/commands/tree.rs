//! `partnum tree` command - Assembly tree of a project

use console::style;
use miette::Result;

use crate::cli::helpers::open_session;
use crate::cli::output::{print_json, print_yaml};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::NumberingError;

#[derive(clap::Args, Debug)]
pub struct TreeArgs {
    /// Only show the subtree under this assembly (part number or #id)
    #[arg(long, short = 'r')]
    pub root: Option<String>,
}

pub fn run(args: TreeArgs, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;

    let (project, focus) = match &args.root {
        Some(reference) => {
            let part = session.part(reference)?;
            (session.service.get_project(part.project_id)?, Some(part))
        }
        None => (session.project(global)?, None),
    };

    let mut tree = session.service.project_tree(project.id)?;
    if let Some(part) = &focus {
        tree = tree
            .focus(part.id)
            .ok_or_else(|| NumberingError::PartNotFound(part.part_number.clone()))?;
    }

    match global.format {
        OutputFormat::Json => return print_json(&tree),
        OutputFormat::Yaml => return print_yaml(&tree),
        _ => {}
    }

    for warning in &tree.warnings {
        eprintln!("{} {}", style("!").yellow(), style(warning).yellow());
    }

    if tree.roots.is_empty() {
        if !global.quiet {
            println!("No parts in project {}.", style(&project.prefix).cyan());
        }
        return Ok(());
    }

    if !global.quiet {
        println!(
            "{} {}",
            style(&project.prefix).cyan().bold(),
            style(&project.name).yellow()
        );
    }
    for line in tree.render() {
        println!("{}", line);
    }
    if !global.quiet {
        println!();
        println!("{} node(s).", style(tree.size()).cyan());
    }
    Ok(())
}
