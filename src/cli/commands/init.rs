//! `partnum init` command - Initialize a new workspace

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::core::workspace::{Workspace, WorkspaceError};
use crate::core::{Config, NumberingError};
use crate::store::PartStore;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Rewrite the default config even if .partnum/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let workspace = if args.force {
        Workspace::init_force(&path)
    } else {
        Workspace::init(&path)
    };

    match workspace {
        Ok(workspace) => {
            // Create the database now so permission problems surface here
            let config = Config::load(Some(&workspace));
            PartStore::open(&workspace.database_path(), config.busy_timeout())
                .map_err(NumberingError::from)?;

            println!(
                "{} Initialized partnum workspace at {}",
                style("✓").green(),
                style(workspace.root().display()).cyan()
            );
            println!();
            println!("Next steps:");
            println!(
                "  {} Create a project",
                style("partnum project new \"Baja 2025\" BP25").yellow()
            );
            println!(
                "  {} Create a top-level assembly",
                style("partnum part new --type assembly --name \"Vehicle\"").yellow()
            );
            println!("  {} Show the assembly tree", style("partnum tree").yellow());
            Ok(())
        }
        Err(WorkspaceError::AlreadyExists(path)) => {
            println!(
                "{} partnum workspace already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to rewrite the default config",
                style("partnum init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}
