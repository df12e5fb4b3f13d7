mod commands;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "valheim-stack")]
#[command(about = "Declare, synthesize and diff a Valheim dedicated server stack", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the synthesized template
    Synth {
        /// Declaration file (defaults to discovery, then built-in defaults)
        #[arg(short, long, env = "VALHEIM_STACK_FILE")]
        file: Option<PathBuf>,
        /// Write the template to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Record the template as the snapshot for the next diff
        #[arg(short, long)]
        write: bool,
    },
    /// Show how the current declaration changes the last synthesized one
    Diff {
        /// Declaration file
        #[arg(short, long, env = "VALHEIM_STACK_FILE")]
        file: Option<PathBuf>,
        /// Compare against this template file instead of the snapshot
        #[arg(short, long)]
        against: Option<PathBuf>,
    },
    /// Check the declaration for mistakes the provisioning engine would reject
    Validate {
        /// Declaration file
        #[arg(short, long, env = "VALHEIM_STACK_FILE")]
        file: Option<PathBuf>,
    },
    /// List the stack outputs
    Outputs {
        /// Declaration file
        #[arg(short, long, env = "VALHEIM_STACK_FILE")]
        file: Option<PathBuf>,
    },
    /// Print the instance bootstrap script for a region
    Bootstrap {
        /// Declaration file
        #[arg(short, long, env = "VALHEIM_STACK_FILE")]
        file: Option<PathBuf>,
        /// Region the script fetches the server password from
        #[arg(short, long, env = "AWS_REGION")]
        region: String,
    },
    /// Check whether a game port answers over UDP
    Probe {
        /// Server host name or address
        host: String,
        /// UDP port
        #[arg(short, long, default_value_t = commands::probe::DEFAULT_PORT)]
        port: u16,
        /// Seconds to wait for a reply
        #[arg(short, long = "timeout-secs", default_value_t = commands::probe::DEFAULT_TIMEOUT_SECS)]
        timeout_secs: u64,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries templates and scripts, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match cli.command {
        Commands::Synth {
            file,
            output,
            write,
        } => commands::synth::handle(file, output, write).await,
        Commands::Diff { file, against } => commands::diff::handle(file, against).await,
        Commands::Validate { file } => commands::validate::handle(file),
        Commands::Outputs { file } => commands::outputs::handle(file),
        Commands::Bootstrap { file, region } => commands::bootstrap::handle(file, &region),
        Commands::Probe {
            host,
            port,
            timeout_secs,
        } => commands::probe::handle(&host, port, timeout_secs).await,
        Commands::Version => {
            println!("valheim-stack {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
