//! demogrip CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;

use demogrip::cli::commands::up::UpOptions;
use demogrip::cli::DemoContext;
use demogrip::core::{DemoConfig, HostEnvironment};
use demogrip::telemetry::{init_telemetry, TelemetryConfig};

#[derive(Parser)]
#[command(name = "dg")]
#[command(author, version, about = "Clone, install and launch Gradio/Streamlit demo repositories", long_about = None)]
struct Cli {
    /// Hosting environment (affects messages only)
    #[arg(long, global = true, value_enum, env = "DEMOGRIP_HOST")]
    host: Option<HostEnvironment>,

    /// Config file (default: ./demogrip.yaml when present)
    #[arg(long, global = true, env = "DEMOGRIP_CONFIG")]
    config: Option<PathBuf>,

    /// Directory repositories are cloned into
    #[arg(short = 'C', long, global = true, env = "DEMOGRIP_WORKDIR")]
    workdir: Option<PathBuf>,

    /// Show debug logs, including every external command
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print errors and results
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone a demo repository
    Clone {
        /// Repository URL
        url: String,
        /// Delete an existing checkout first
        #[arg(long)]
        overwrite: bool,
        /// Do not ask before deleting
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the demo manifest (README.md front matter)
    Info {
        /// Repository URL
        url: String,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Install the repository's Python requirements
    Install {
        /// Repository URL
        url: String,
        /// Requirements file (default: <repo>/requirements.txt)
        #[arg(short, long)]
        requirements: Option<PathBuf>,
        /// Also install xformers built for the detected GPU
        #[arg(long)]
        accelerated_attention: bool,
    },
    /// Launch the demo on port 6006
    Launch {
        /// Repository URL
        url: String,
        #[command(flatten)]
        cloud: CloudArgs,
        /// Return immediately and leave the demo running
        #[arg(short, long)]
        detach: bool,
    },
    /// Clone, install and launch
    Up {
        /// Repository URL
        url: String,
        /// Delete an existing checkout first
        #[arg(long)]
        overwrite: bool,
        /// Do not ask before deleting
        #[arg(short, long)]
        yes: bool,
        /// Requirements file (default: <repo>/requirements.txt)
        #[arg(short, long)]
        requirements: Option<PathBuf>,
        /// Also install xformers built for the detected GPU
        #[arg(long)]
        accelerated_attention: bool,
        #[command(flatten)]
        cloud: CloudArgs,
        /// Return immediately and leave the demo running
        #[arg(short, long)]
        detach: bool,
    },
    /// Stop a demo started with --detach
    Stop {
        /// Repository URL
        url: String,
    },
    /// Show GPU memory and the detected GPU model
    Gpu {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Check that the external tools are installed
    Doctor,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// SageMaker Studio Lab parameters for the printed access URL
#[derive(clap::Args)]
struct CloudArgs {
    /// Studio Lab domain
    #[arg(long, requires = "cloud_region")]
    cloud_domain: Option<String>,
    /// Studio Lab region
    #[arg(long, requires = "cloud_domain")]
    cloud_region: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = init_telemetry(&TelemetryConfig::from_flags(cli.verbose, cli.quiet))?;

    let command = match cli.command {
        Some(command) => command,
        None => {
            println!("demogrip - launch Gradio/Streamlit demo repositories");
            println!("Run 'dg --help' for usage");
            return Ok(());
        }
    };

    if let Commands::Completions { shell } = command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "dg", &mut std::io::stdout());
        return Ok(());
    }

    let config = DemoConfig::load(cli.config.as_deref(), &std::env::current_dir()?)?;
    let ctx = DemoContext::resolve(&config, cli.host, cli.workdir, cli.quiet);

    match command {
        Commands::Clone {
            url,
            overwrite,
            yes,
        } => {
            demogrip::cli::commands::clone::run_clone(&ctx, &url, overwrite, yes).await?;
        }
        Commands::Info { url, json } => {
            demogrip::cli::commands::info::run_info(&ctx, &url, json)?;
        }
        Commands::Install {
            url,
            requirements,
            accelerated_attention,
        } => {
            demogrip::cli::commands::install::run_install(
                &ctx,
                &url,
                requirements.as_deref(),
                accelerated_attention,
            )
            .await?;
        }
        Commands::Launch { url, cloud, detach } => {
            demogrip::cli::commands::launch::run_launch(
                &ctx,
                &url,
                cloud.cloud_domain.as_deref(),
                cloud.cloud_region.as_deref(),
                detach,
            )
            .await?;
        }
        Commands::Up {
            url,
            overwrite,
            yes,
            requirements,
            accelerated_attention,
            cloud,
            detach,
        } => {
            let opts = UpOptions {
                overwrite,
                yes,
                requirements: requirements.as_deref(),
                accelerated_attention,
                cloud_domain: cloud.cloud_domain.as_deref(),
                cloud_region: cloud.cloud_region.as_deref(),
                detach,
            };
            demogrip::cli::commands::up::run_up(&ctx, &url, &opts).await?;
        }
        Commands::Stop { url } => {
            demogrip::cli::commands::stop::run_stop(&ctx, &url).await?;
        }
        Commands::Gpu { json } => {
            demogrip::cli::commands::gpu::run_gpu(&ctx, json).await?;
        }
        Commands::Doctor => {
            demogrip::cli::commands::doctor::run_doctor(&ctx)?;
        }
        // Generated before the config is loaded
        Commands::Completions { .. } => {}
    }

    Ok(())
}
