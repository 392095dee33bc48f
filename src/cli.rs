use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cfprov")]
#[command(version)]
#[command(about = "Declarative management of Contentful spaces and API keys", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Manifest file (default: ~/.config/cfprov/cfprov.toml)
    #[arg(short, long, global = true, env = "CFPROV_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// State file (default: ~/.local/state/cfprov/state.toml)
    #[arg(long, global = true, env = "CFPROV_STATE")]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Preview what apply would change
    Plan(TargetArgs),

    /// Make remote objects match the manifest
    Apply(ApplyArgs),

    /// Re-read every recorded object and forget the ones that are gone
    Refresh,

    /// Adopt an existing remote object into state
    ///
    /// Space ids are plain ("abc123"); API key ids are "spaceId/keyId".
    Import {
        /// Declared address, e.g. "space.marketing" or "api_key.website"
        address: String,

        /// Remote id
        id: String,
    },

    /// Delete every recorded object (or just the target)
    Destroy(DestroyArgs),

    /// Show recorded state
    Show(ShowArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct TargetArgs {
    /// Limit to a resource type or address (e.g. "space", "api_key.website")
    pub target: Option<String>,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Limit to a resource type or address (e.g. "space", "api_key.website")
    pub target: Option<String>,

    /// Show what would change without calling the API
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct DestroyArgs {
    /// Limit to a resource type or address (e.g. "api_key.website")
    pub target: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Single address to show
    pub address: Option<String>,

    /// Print access tokens in full
    #[arg(long)]
    pub show_secrets: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
