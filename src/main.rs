use clap::{ArgAction, Parser, Subcommand};
use git_scan_lib::commands::{self, scan::ScanArgs};
use git_scan_lib::{config, logging};
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "git-scan")]
#[command(about = "Scan local git repositories for uncommitted work and unsynced history")]
#[command(version = VERSION)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report uncommitted, unpushed and unpulled work per repository
    Scan(ScanArgs),

    /// List configured repositories by group
    List {
        /// Only list this group (repeatable)
        #[arg(long = "group", short = 'g')]
        groups: Vec<String>,
        /// Config file (default: ~/.config/git-scan/config.toml)
        #[arg(long, env = config::CONFIG_ENV)]
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if cli.no_color || std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::Scan(args) => match commands::scan::run(args) {
            Ok(0) => {}
            Ok(code) => std::process::exit(code),
            Err(e) => {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        },
        Commands::List { groups, config } => {
            if let Err(e) = commands::list::run(config, groups) {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("git-scan v{}", VERSION);
        }
    }
}
