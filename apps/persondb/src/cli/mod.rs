//! # persondb CLI Module
//!
//! ## Available Commands
//!
//! - `init` - Create the table or snapshot file
//! - `create` - Create a person (fails if the id already exists)
//! - `read` - Refresh a person by identifier (`/person/<id>`)
//! - `update` - Change the mutable attributes of a person
//! - `delete` - Delete a person by id
//! - `import` - Adopt an existing person by identifier
//! - `lookup` - Read-only fetch by person id
//! - `plan` - Show what converging to a declared person would do
//! - `list` - List all stored persons

mod commands;

use crate::config::{FileConfig, ProviderConfig};
use clap::{Args, Parser, Subcommand};
use persondb_core::{BackendKind, PersonError, PersonSpec};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// persondb - declarative person records
///
/// Every command is one reconciliation step against the configured store.
#[derive(Parser, Debug)]
#[command(name = "persondb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the person database (table or snapshot file)
    #[arg(short = 'D', long, global = true, env = "CUSTOM_DATABASE_FILENAME")]
    pub database: Option<PathBuf>,

    /// Storage backend: "redb" (table) or "file" (JSON snapshot) or "memory"
    #[arg(short = 'B', long, global = true, env = "PERSONDB_BACKEND")]
    pub backend: Option<BackendKind>,

    /// TOML config file with database_filename / backend
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Declared attributes of a person.
#[derive(Args, Debug, Clone)]
pub struct DeclaredArgs {
    /// Person id (immutable)
    #[arg(long)]
    pub person_id: String,

    /// Surname, 1-30 characters (immutable)
    #[arg(long)]
    pub last_name: String,

    /// Given name
    #[arg(long)]
    pub first_name: Option<String>,
}

impl DeclaredArgs {
    #[must_use]
    pub fn to_spec(&self) -> PersonSpec {
        PersonSpec {
            person_id: self.person_id.clone(),
            last_name: self.last_name.clone(),
            first_name: self.first_name.clone(),
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the store (idempotent)
    Init,

    /// Create a new person
    Create(DeclaredArgs),

    /// Read a person by identifier
    Read {
        /// Identifier of the form /person/<person_id>
        identifier: String,
    },

    /// Update the mutable attributes of a person
    Update {
        /// Identifier of the form /person/<person_id>
        identifier: String,

        #[command(flatten)]
        declared: DeclaredArgs,
    },

    /// Delete a person
    Delete {
        /// Person id to delete
        person_id: String,
    },

    /// Import an existing person by identifier
    Import {
        /// Identifier of the form /person/<person_id>
        identifier: String,
    },

    /// Look up a person by id (fails if missing)
    Lookup {
        /// Person id to fetch
        person_id: String,
    },

    /// Plan the change needed to reach the declared person
    Plan {
        /// Identifier of the managed person, if any
        #[arg(long)]
        identifier: Option<String>,

        #[command(flatten)]
        declared: DeclaredArgs,
    },

    /// List all persons
    List,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

impl Cli {
    /// Resolve the provider configuration from flags, env and config file.
    pub fn provider_config(&self) -> Result<ProviderConfig, PersonError> {
        let file = self.config.as_deref().map(FileConfig::load).transpose()?;
        ProviderConfig::resolve(self.database.clone(), self.backend, file)
    }
}

/// Execute the CLI with parsed arguments and return what to print.
pub fn execute(cli: &Cli) -> Result<Outcome, PersonError> {
    let config = cli.provider_config()?;
    let reconciler = config.connect()?;

    match &cli.command {
        Commands::Init => Ok(cmd_init(&config)),
        Commands::Create(declared) => cmd_create(&reconciler, &declared.to_spec()),
        Commands::Read { identifier } => cmd_read(&reconciler, identifier),
        Commands::Update {
            identifier,
            declared,
        } => cmd_update(&reconciler, identifier, &declared.to_spec()),
        Commands::Delete { person_id } => cmd_delete(&reconciler, person_id),
        Commands::Import { identifier } => cmd_import(&reconciler, identifier),
        Commands::Lookup { person_id } => cmd_lookup(&reconciler, person_id),
        Commands::Plan {
            identifier,
            declared,
        } => cmd_plan(&reconciler, identifier.as_deref(), &declared.to_spec()),
        Commands::List => cmd_list(&reconciler),
    }
}
