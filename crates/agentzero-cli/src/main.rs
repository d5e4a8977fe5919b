mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::mcs::McsSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "agentzero",
    about = "Agent Zero: AI pull-request review dashboard, Kestra bridge and browser relay",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: nearest directory containing .agentzero/)
    #[arg(long, global = true, env = "AGENTZERO_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default .agentzero/config.yaml
    Init,

    /// Run the dashboard API server
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },

    /// Merge Candidate Score tools
    Mcs {
        #[command(subcommand)]
        subcommand: McsSubcommand,
    },

    /// List stored analysis reports
    Reports {
        /// Maximum number of reports to show
        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Run as the browser extension's native-messaging host
    Relay {
        /// Settings directory (default: ~/.agentzero/relay)
        #[arg(long, env = "AGENTZERO_RELAY_DIR")]
        dir: Option<PathBuf>,

        /// Caller origin passed by the browser
        #[arg(hide = true)]
        origin: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } | Commands::Relay { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    // stdout carries relay frames, so logs always go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Serve { port } => cmd::serve::run(&root, port),
        Commands::Mcs { subcommand } => cmd::mcs::run(&root, subcommand, cli.json),
        Commands::Reports { limit } => cmd::reports::run(&root, limit, cli.json),
        Commands::Relay { dir, origin } => cmd::relay::run(dir.as_deref(), origin.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
