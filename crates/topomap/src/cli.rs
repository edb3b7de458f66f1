//! Clap derive structures for the `topomap` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// topomap -- operator console for network topology maps
#[derive(Debug, Parser)]
#[command(
    name = "topomap",
    version,
    about = "Inspect and edit network topology maps from the command line",
    long_about = "Drives the topomap sync engine without a map surface.\n\n\
        Every data command synchronizes one viewport (--bbox) from the\n\
        backend first, then reads from or mutates the local store.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "TOPOMAP_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, short = 'b', env = "TOPOMAP_BACKEND", global = true)]
    pub backend: Option<String>,

    /// API token (overrides profile)
    #[arg(long, env = "TOPOMAP_API_TOKEN", global = true, hide_env_values = true)]
    pub api_token: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "TOPOMAP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "TOPOMAP_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "TOPOMAP_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Synchronize one viewport and summarize what it contains
    Sync(ViewArgs),

    /// List and edit nodes
    #[command(alias = "n")]
    Nodes(NodesArgs),

    /// List, draw and delete links
    #[command(alias = "l")]
    Links(LinksArgs),

    /// List zones and their node bindings
    #[command(alias = "z")]
    Zones(ZonesArgs),

    /// Score link health from raw attributes (offline)
    Health(HealthArgs),

    /// Validate GeoJSON geometry text (offline)
    #[command(alias = "geo")]
    Geometry(GeometryArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Viewport Arguments ────────────────────────────────────────

/// The viewport to synchronize before running a data command.
#[derive(Debug, Clone, Args)]
pub struct ViewArgs {
    /// Visible extent as `west,south,east,north` in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: String,

    /// Map zoom level
    #[arg(long, default_value = "12")]
    pub zoom: f64,

    /// Free-text filter
    #[arg(long)]
    pub text: Option<String>,

    /// Status filter
    #[arg(long)]
    pub status: Option<String>,

    /// Kind filter (node, link or zone type)
    #[arg(long)]
    pub kind: Option<String>,
}

// ── Nodes ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NodesArgs {
    #[command(subcommand)]
    pub command: NodesCommand,
}

#[derive(Debug, Subcommand)]
pub enum NodesCommand {
    /// List nodes in a viewport
    #[command(alias = "ls")]
    List(ViewArgs),

    /// Move a node to a new position
    Move {
        /// Node ID
        node: String,

        /// New longitude
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// New latitude
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Delete a node
    #[command(alias = "rm")]
    Delete {
        /// Node ID
        node: String,

        #[command(flatten)]
        view: ViewArgs,
    },
}

// ── Links ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LinksArgs {
    #[command(subcommand)]
    pub command: LinksCommand,
}

#[derive(Debug, Subcommand)]
pub enum LinksCommand {
    /// List links in a viewport with their health score
    #[command(alias = "ls")]
    List(ViewArgs),

    /// Draw a new link between two loaded nodes
    Create {
        /// Source node ID
        #[arg(long)]
        from: String,

        /// Target node ID
        #[arg(long)]
        to: String,

        /// Bend point as `lng,lat`; repeat for a routed path
        #[arg(long = "via", allow_hyphen_values = true)]
        via: Vec<String>,

        /// Link name (defaults to "<from> - <to>")
        #[arg(long)]
        name: Option<String>,

        /// Link type
        #[arg(long = "type", default_value = "fiber")]
        link_type: String,

        /// Link status
        #[arg(long, default_value = "planning")]
        link_status: String,

        /// Routing priority (positive)
        #[arg(long, default_value = "1")]
        priority: u32,

        /// Capacity in Mbps
        #[arg(long)]
        capacity: Option<f64>,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Delete a link
    #[command(alias = "rm")]
    Delete {
        /// Link ID
        link: String,

        #[command(flatten)]
        view: ViewArgs,
    },
}

// ── Zones ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ZonesArgs {
    #[command(subcommand)]
    pub command: ZonesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ZonesCommand {
    /// List zones in a viewport
    #[command(alias = "ls")]
    List(ViewArgs),

    /// Show the node bindings of a zone
    Bindings {
        /// Zone ID
        zone: String,

        #[command(flatten)]
        view: ViewArgs,
    },
}

// ── Health ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct HealthArgs {
    /// Link status
    #[arg(long, default_value = "up")]
    pub status: String,

    /// Utilization percentage
    #[arg(long, short = 'u')]
    pub utilization: Option<f64>,

    /// Latency in milliseconds
    #[arg(long, short = 'l')]
    pub latency: Option<f64>,

    /// Optical loss in dB
    #[arg(long)]
    pub loss: Option<f64>,
}

// ── Geometry ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GeometryArgs {
    #[command(subcommand)]
    pub command: GeometryCommand,
}

#[derive(Debug, Subcommand)]
pub enum GeometryCommand {
    /// Parse GeoJSON text and report its type and size
    Validate {
        /// GeoJSON text, or `-` to read stdin
        input: String,

        /// Required geometry shape
        #[arg(long, value_enum)]
        expect: Option<GeometryShape>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GeometryShape {
    /// A link path (LineString)
    Line,
    /// A zone area (Polygon or MultiPolygon)
    Area,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or replace a profile
    Init {
        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        /// Backend URL
        #[arg(long)]
        url: String,

        /// Environment variable holding the API token
        #[arg(long)]
        token_env: Option<String>,

        /// Make this the default profile
        #[arg(long)]
        set_default: bool,
    },

    /// Show current configuration
    Show,

    /// List profile names
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
