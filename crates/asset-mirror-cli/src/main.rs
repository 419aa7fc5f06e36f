//! asset-mirror — entry point.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use asset_mirror::config::{
    DEFAULT_PRODUCT_DIR, DEFAULT_PRODUCT_URL, DEFAULT_SITE_DIR, DEFAULT_SITE_URL,
};

mod commands;

use commands::{Outcome, Profile, RunArgs};

#[derive(Parser)]
#[command(
    name = "asset-mirror",
    about = "Mirror a page and its stylesheets, scripts, images, and fonts to disk",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Print the run summary as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mirror a landing page with all of its assets (images capped at 20).
    Site {
        /// Page to mirror.
        #[arg(long, default_value = DEFAULT_SITE_URL)]
        url: String,

        /// Output directory.
        #[arg(short, long, default_value = DEFAULT_SITE_DIR)]
        output: String,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// Snapshot a product page plus a script-free reference copy.
    Product {
        /// Page to snapshot.
        #[arg(long, default_value = DEFAULT_PRODUCT_URL)]
        url: String,

        /// Output directory.
        #[arg(short, long, default_value = DEFAULT_PRODUCT_DIR)]
        output: String,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   asset-mirror completions bash > ~/.local/share/bash-completion/completions/asset-mirror
    ///   asset-mirror completions zsh > ~/.zfunc/_asset-mirror
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[derive(clap::Args)]
struct Tuning {
    /// Pause between requests of one category, in milliseconds
    /// (overrides the profile default; 500 caps the rate at 2 req/s).
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Maximum number of images to download (0 = no cap).
    #[arg(long)]
    image_limit: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long, default_value = "30")]
    timeout_secs: u64,
}

impl Tuning {
    fn into_args(self, profile: Profile, url: String, output: String) -> RunArgs {
        RunArgs {
            profile,
            url,
            output,
            delay_ms: self.delay_ms,
            image_limit: self.image_limit,
            timeout_secs: self.timeout_secs,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    // Progress goes to stdout; with --json it moves to stderr so stdout stays parseable.
    let writer = if cli.json {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .init();

    let args = match cli.command {
        Commands::Site {
            url,
            output,
            tuning,
        } => tuning.into_args(Profile::Site, url, output),
        Commands::Product {
            url,
            output,
            tuning,
        } => tuning.into_args(Profile::Product, url, output),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "asset-mirror", &mut std::io::stdout());
            return Ok(());
        }
    };

    // Consistent exit codes: 0=completed, 1=fatal error, 130=interrupted
    match commands::run(args, cli.json).await {
        Ok(Outcome::Completed) => Ok(()),
        Ok(Outcome::Interrupted) => {
            println!("\nDownload cancelled by user");
            std::process::exit(130);
        }
        Err(e) => {
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "error": true, "message": format!("{e:#}") })
                );
            } else {
                eprintln!("Error: {e:#}");
            }
            std::process::exit(1);
        }
    }
}
