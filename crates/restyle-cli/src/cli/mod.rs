//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use restyle_core::transform::AugmentationPolicy;
use restyle_core::{config, logging};

mod commands;

#[derive(Parser)]
#[command(name = "restyle")]
#[command(version = "0.1")]
#[command(about = "Try AI hairstyles on your photos")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Email and password, from flags, the environment, or stdin.
#[derive(clap::Args, Debug, Clone, Default)]
struct CredentialArgs {
    /// Account email
    #[arg(long, env = "RESTYLE_EMAIL")]
    email: Option<String>,

    /// Account password
    #[arg(long, env = "RESTYLE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        #[command(flatten)]
        credentials: CredentialArgs,
    },
    /// Create an account and sign in
    Register {
        #[command(flatten)]
        credentials: CredentialArgs,
    },
    /// Sign out (remove the cached session)
    Logout,
    /// Show the signed-in account
    Whoami,
    /// List the built-in hairstyles
    Presets,
    /// Upload a photo and build the AI transformation URLs
    Transform {
        /// Photo to upload (asks for a path when omitted)
        #[arg(value_name = "PATH")]
        path: Option<String>,

        /// What to replace (and what to remove with --remove)
        #[arg(long)]
        from: Option<String>,

        /// What to replace it with
        #[arg(long)]
        to: Option<String>,

        /// Use a preset by id or label (see `restyle presets`)
        #[arg(short, long)]
        preset: Option<String>,

        /// Identity preservation (none, moderate, aggressive)
        #[arg(long, value_name = "POLICY")]
        augment: Option<AugmentationPolicy>,

        /// Also build the remove URL
        #[arg(long)]
        remove: bool,

        /// Open the results in the browser
        #[arg(long)]
        open: bool,

        /// Download the results into this directory or file
        #[arg(long, value_name = "DIR")]
        save: Option<PathBuf>,
    },
    /// Build transformation URLs for an already uploaded photo
    Url {
        #[command(subcommand)]
        command: UrlCommands,
    },
    /// Open an image URL in the browser
    Open {
        #[arg(value_name = "URL")]
        url: String,

        /// Name shown in the confirmation
        #[arg(long, default_value = "image")]
        label: String,
    },
    /// Download an image URL
    Save {
        #[arg(value_name = "URL")]
        url: String,

        /// Output directory or file
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Name used for generated file names
        #[arg(long, default_value = "image")]
        label: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum UrlCommands {
    /// Replace URL for a public id
    Replace {
        #[arg(value_name = "PUBLIC_ID")]
        public_id: String,

        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,

        /// Identity preservation (none, moderate, aggressive)
        #[arg(long, value_name = "POLICY")]
        augment: Option<AugmentationPolicy>,

        /// Leave out preserve-geometry
        #[arg(long)]
        no_preserve_geometry: bool,
    },
    /// Remove URL for a public id
    Remove {
        #[arg(value_name = "PUBLIC_ID")]
        public_id: String,

        /// What to erase (defaults to prompts.from)
        #[arg(long)]
        prompt: Option<String>,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Generate a fresh config from Rust defaults
    Generate,
    /// Persist the identity preservation policy
    SetAugmentation {
        #[arg(value_name = "POLICY")]
        policy: AugmentationPolicy,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = config::Config::load().context("load config")?;
    let _log_guard = logging::init(&config);

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli, &config).await })
}

async fn dispatch(cli: Cli, config: &config::Config) -> Result<()> {
    match cli.command {
        Commands::Login { credentials } => {
            commands::auth::login(config, credentials.email, credentials.password).await
        }
        Commands::Register { credentials } => {
            commands::auth::register(config, credentials.email, credentials.password).await
        }
        Commands::Logout => commands::auth::logout(config),
        Commands::Whoami => commands::auth::whoami(config).await,
        Commands::Presets => {
            commands::presets::list(config);
            Ok(())
        }

        Commands::Transform {
            path,
            from,
            to,
            preset,
            augment,
            remove,
            open,
            save,
        } => {
            commands::transform::run(commands::transform::TransformRunOptions {
                config,
                path: path.as_deref(),
                from: from.as_deref(),
                to: to.as_deref(),
                preset: preset.as_deref(),
                augment,
                remove,
                open,
                save: save.as_deref(),
            })
            .await
        }

        Commands::Url { command } => {
            match command {
                UrlCommands::Replace {
                    public_id,
                    from,
                    to,
                    augment,
                    no_preserve_geometry,
                } => commands::url::replace(
                    config,
                    &commands::url::ReplaceOptions {
                        public_id: &public_id,
                        from: from.as_deref(),
                        to: to.as_deref(),
                        augment,
                        no_preserve_geometry,
                    },
                ),
                UrlCommands::Remove { public_id, prompt } => {
                    commands::url::remove(config, &public_id, prompt.as_deref());
                }
            }
            Ok(())
        }

        Commands::Open { url, label } => commands::links::open(&url, &label),
        Commands::Save { url, out, label } => commands::links::save(&url, &out, &label).await,

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Generate => commands::config::generate(),
            ConfigCommands::SetAugmentation { policy } => {
                commands::config::set_augmentation(policy)
            }
        },
    }
}
