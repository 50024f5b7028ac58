use clap::Parser;
use miette::Result;
use partnum::cli::commands;
use partnum::cli::helpers::find_workspace;
use partnum::cli::{Cli, Commands};
use partnum::core::{logging, Config};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    let workspace = find_workspace(&global).ok();
    let config = Config::load(workspace.as_ref());
    logging::init(config.log_level(), global.verbose);

    match cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Project(cmd) => commands::project::run(cmd, &global),
        Commands::Part(cmd) => commands::part::run(cmd, &global),
        Commands::Tree(args) => commands::tree::run(args, &global),
        Commands::Hierarchy(args) => commands::hierarchy::run(args, &global),
        Commands::Import(args) => commands::import::run(args, &global),
        Commands::Config(cmd) => commands::config::run(cmd, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
