//! Provisioner CLI tool.

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "provisioner")]
#[command(about = "Reconcile team/service/environment configuration into Harbor resources", long_about = None)]
struct Cli {
    /// Log output format
    #[arg(long, env = "PROVISIONER_LOG_FORMAT", value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file (.yaml, .yml or .kdl)
        path: String,
    },
    /// Build the configuration against an in-memory Harbor and report what would happen
    Preview {
        /// Path to the configuration file (.yaml, .yml or .kdl)
        path: String,
        /// Only build environments of this team
        #[arg(long)]
        team: Option<String>,
        /// Only build environments of this service
        #[arg(long)]
        service: Option<String>,
        /// Only build this environment
        #[arg(long)]
        environment: Option<String>,
        /// YAML file mapping secret names to values
        #[arg(long)]
        secrets: Option<String>,
        /// Prefix of environment variables holding secrets (used without --secrets)
        #[arg(long, env = "PROVISIONER_SECRET_PREFIX", default_value = "PROVISIONER_SECRET_")]
        secret_prefix: String,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Commands::Validate { path } => {
            commands::validate(&path)?;
        }
        Commands::Preview {
            path,
            team,
            service,
            environment,
            secrets,
            secret_prefix,
            json,
        } => {
            let options = commands::preview::PreviewOptions {
                team,
                service,
                environment,
                secrets,
                secret_prefix,
                json,
            };
            commands::preview::preview(&path, options).await?;
        }
    }

    Ok(())
}
