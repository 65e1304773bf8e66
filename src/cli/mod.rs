//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::model::{RecordDraft, RecordPatch};

/// Output format for list commands.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table (default)
    #[default]
    Table,
    /// JSON (same as --json)
    Json,
    /// Comma-separated values, same layout as the export CSV
    Csv,
}

pub mod commands;

/// cavemon - field records for cave drip monitoring
#[derive(Parser, Debug)]
#[command(name = "cavemon", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.cavemon/data/cavemon.db)
    #[arg(long, global = true, env = "CAVEMON_DB")]
    pub db: Option<PathBuf>,

    /// Actor name for the audit trail
    #[arg(long, global = true, env = "CAVEMON_ACTOR")]
    pub actor: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format (table, json, csv)
    #[arg(long, value_enum, global = true, default_value_t)]
    pub format: OutputFormat,

    /// Output only the record id or file path
    #[arg(long, global = true)]
    pub silent: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the record database
    Init {
        /// Recreate the database even if it exists
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Add a monitoring record
    Add(AddArgs),

    /// Edit a record (marks it unsynced)
    Update(UpdateArgs),

    /// Delete a record
    Delete {
        /// Record id
        id: i64,
    },

    /// Show one record
    Show {
        /// Record id
        id: i64,

        /// Include the audit trail and commit receipts
        #[arg(long)]
        history: bool,
    },

    /// List records, newest first
    List {
        /// Only records not yet synced
        #[arg(long)]
        unsynced: bool,
    },

    /// Export records as a zip archive
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },

    /// Write the QR code PNG of a record
    Qr {
        /// Record id
        id: i64,

        /// Output file (default: <export dir>/<customId>_QR.png)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Send unsynced records to the remote
    Sync {
        /// Treat the network as unreachable
        #[arg(long)]
        offline: bool,
    },

    /// Show sync status
    Status,

    /// UI preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Record Commands
// ============================================================================

/// Observation fields shared by `add` and `update`.
#[derive(Args, Debug, Default)]
pub struct RecordFields {
    /// Cave name
    #[arg(long = "cave")]
    pub cave_name: Option<String>,

    /// Person in charge ("Otro" requires --person-other)
    #[arg(long = "person")]
    pub person_in_charge: Option<String>,

    /// Name of the person when --person is "Otro"
    #[arg(long = "person-other")]
    pub person_in_charge_other: Option<String>,

    /// Date the form was filled in (YYYY-MM-DD)
    #[arg(long = "date")]
    pub diligenciamiento_date: Option<String>,

    /// Active drip (Si, No, Intermitente)
    #[arg(long)]
    pub active_drip: Option<String>,

    /// Drips counted
    #[arg(long)]
    pub drip_count: Option<String>,

    /// Test tube sample name
    #[arg(long = "test-tube-sample")]
    pub test_tube_sample_name: Option<String>,

    /// Watch glass sample name
    #[arg(long = "watch-glass-sample")]
    pub watch_glass_sample_name: Option<String>,

    /// Has it rained
    #[arg(long = "rained")]
    pub has_it_rained: Option<String>,

    /// Watch glass fallen (Si, No)
    #[arg(long)]
    pub watch_glass_fallen: Option<String>,

    /// Free-text observations
    #[arg(long)]
    pub observations: Option<String>,

    /// Carbonate observed
    #[arg(long = "carbonate")]
    pub carbonate_observed: Option<String>,

    /// Photo file to attach (png, jpg, webp, gif)
    #[arg(long)]
    pub image: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[command(flatten)]
    pub fields: RecordFields,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Record id
    pub id: i64,

    #[command(flatten)]
    pub fields: RecordFields,

    /// Remove the attached photo
    #[arg(long, conflicts_with = "image")]
    pub remove_image: bool,
}

impl RecordFields {
    /// Build a draft. `image` is the already loaded data URI.
    #[must_use]
    pub fn to_draft(&self, image: Option<String>) -> RecordDraft {
        RecordDraft {
            cave_name: self.cave_name.clone().unwrap_or_default(),
            person_in_charge: self.person_in_charge.clone().unwrap_or_default(),
            person_in_charge_other: self.person_in_charge_other.clone(),
            diligenciamiento_date: self.diligenciamiento_date.clone().unwrap_or_default(),
            active_drip: self.active_drip.clone().unwrap_or_default(),
            drip_count: self.drip_count.clone().unwrap_or_default(),
            test_tube_sample_name: self.test_tube_sample_name.clone().unwrap_or_default(),
            watch_glass_sample_name: self.watch_glass_sample_name.clone().unwrap_or_default(),
            has_it_rained: self.has_it_rained.clone().unwrap_or_default(),
            watch_glass_fallen: self.watch_glass_fallen.clone().unwrap_or_default(),
            observations: self.observations.clone().unwrap_or_default(),
            carbonate_observed: self.carbonate_observed.clone().unwrap_or_default(),
            image,
        }
    }

    /// Build a patch touching only the given flags.
    #[must_use]
    pub fn to_patch(&self, image: Option<Option<String>>) -> RecordPatch {
        RecordPatch {
            cave_name: self.cave_name.clone(),
            person_in_charge: self.person_in_charge.clone(),
            person_in_charge_other: self.person_in_charge_other.clone().map(Some),
            diligenciamiento_date: self.diligenciamiento_date.clone(),
            active_drip: self.active_drip.clone(),
            drip_count: self.drip_count.clone(),
            test_tube_sample_name: self.test_tube_sample_name.clone(),
            watch_glass_sample_name: self.watch_glass_sample_name.clone(),
            has_it_rained: self.has_it_rained.clone(),
            watch_glass_fallen: self.watch_glass_fallen.clone(),
            observations: self.observations.clone(),
            carbonate_observed: self.carbonate_observed.clone(),
            image,
        }
    }
}

// ============================================================================
// Export Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Archive a single record (JSON, TXT, CSV, photo, QR)
    Record {
        /// Record id
        id: i64,

        /// Output directory (default: export_dir setting or current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Archive every record
    All {
        /// Output directory (default: export_dir setting or current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

// ============================================================================
// Preference Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum PrefsCommands {
    /// Print one preference
    Get {
        key: String,
    },

    /// Set a preference (JSON literals are stored typed)
    Set {
        key: String,
        value: String,
    },

    /// Remove a preference
    Unset {
        key: String,
    },

    /// Print all preferences
    List,
}
