//! `partnum config` command - Inspect effective configuration

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::find_workspace;
use crate::cli::GlobalOpts;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration values
    Show(ShowArgs),

    /// Show paths to configuration files
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

const VALID_KEYS: &[(&str, &str)] = &[
    ("default_project", "Project prefix used when --project is not given"),
    ("max_hierarchy_depth", "Maximum ancestor hops when deriving classification"),
    ("busy_timeout_ms", "Milliseconds a writer waits for the database lock"),
    ("log_level", "Log level when PARTNUM_LOG is unset"),
];

pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Path => run_path(global),
        ConfigCommands::Keys => run_keys(),
    }
}

fn get_config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "default_project" => config.default_project.clone(),
        "max_hierarchy_depth" => Some(config.engine_config().max_hierarchy_depth.to_string()),
        "busy_timeout_ms" => Some(config.busy_timeout().as_millis().to_string()),
        "log_level" => Some(config.log_level().to_string()),
        _ => None,
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = find_workspace(global).ok();
    let config = Config::load(workspace.as_ref());

    if let Some(key) = &args.key {
        if !VALID_KEYS.iter().any(|(k, _)| *k == key.as_str()) {
            return Err(miette::miette!(
                help = "run `partnum config keys` to list valid keys",
                "unknown configuration key '{}'",
                key
            ));
        }
        return match get_config_value(&config, key) {
            Some(value) => {
                println!("{}", value);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    for (key, _) in VALID_KEYS {
        let value = get_config_value(&config, key).unwrap_or_else(|| "-".to_string());
        println!("{}: {}", style(key).cyan(), value);
    }
    Ok(())
}

fn run_path(global: &GlobalOpts) -> Result<()> {
    match Config::global_config_path() {
        Some(path) => println!("{}: {}", style("global").bold(), path.display()),
        None => println!("{}: (no home directory)", style("global").bold()),
    }
    match find_workspace(global) {
        Ok(workspace) => println!(
            "{}: {}",
            style("workspace").bold(),
            workspace.config_path().display()
        ),
        Err(_) => println!("{}: (not in a workspace)", style("workspace").bold()),
    }
    Ok(())
}

fn run_keys() -> Result<()> {
    for (key, description) in VALID_KEYS {
        println!("{:<22} {}", style(key).cyan(), style(description).dim());
    }
    Ok(())
}
