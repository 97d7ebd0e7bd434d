//! CLI parse: clap types for bucketscope. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Bucketscope CLI - browse, search and edit nested-bucket stores
#[derive(Parser, Debug)]
#[command(name = "bucketscope")]
#[command(version)]
#[command(about = "Paginated browsing, search and transactional editing of nested-bucket stores")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Store file
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Configuration file path (replaces the global config file)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Result format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Enable verbose logging (debug level)
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stderr, stdout, file, file+stderr)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum GetMode {
    /// Leading bytes of the value, base64 encoded
    Head,
    /// Full value written to --out
    Save,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum WriteOp {
    CreateBucket,
    Put,
    DeleteKey,
    DeleteBucket,
}

impl WriteOp {
    pub fn as_str(self) -> &'static str {
        match self {
            WriteOp::CreateBucket => "create-bucket",
            WriteOp::Put => "put",
            WriteOp::DeleteKey => "delete-key",
            WriteOp::DeleteBucket => "delete-bucket",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the file is a usable store and report its size
    Meta,
    /// List the bucket names directly under a path
    Lsb {
        /// Bucket path (slash-separated); empty for the root
        #[arg(long, default_value = "")]
        path: String,
    },
    /// List one page of keys in a bucket, or of root buckets
    Lsk {
        /// Bucket path (slash-separated); empty for the root
        #[arg(long, default_value = "")]
        path: String,
        /// Keep only keys starting with this text
        #[arg(long)]
        prefix: Option<String>,
        /// Maximum number of items (default from config)
        #[arg(long)]
        limit: Option<usize>,
        /// Resume strictly after this key (base64), as returned in nextAfterKey
        #[arg(long)]
        after_key: Option<String>,
    },
    /// Read a value
    Get {
        /// Bucket path (slash-separated)
        #[arg(long, default_value = "")]
        path: String,
        /// Key (base64)
        #[arg(long)]
        key: String,
        #[arg(long, value_enum, default_value_t = GetMode::Head)]
        mode: GetMode,
        /// Bytes to return in head mode (default from config)
        #[arg(short = 'n', long = "bytes")]
        bytes: Option<usize>,
        /// Output file for save mode
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Find entries whose names contain a substring
    Search {
        #[arg(long)]
        query: String,
        /// Maximum number of matches (default from config)
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        case_sensitive: bool,
        /// Restrict the search to this subtree
        #[arg(long, default_value = "")]
        path: String,
    },
    /// Write every entry below a path to a JSON Lines file
    Export {
        /// Bucket path (slash-separated); empty for the root
        #[arg(long, default_value = "")]
        path: String,
        /// Keep only direct entries whose keys start with this text
        #[arg(long)]
        prefix: Option<String>,
        /// Output file
        #[arg(long)]
        out: PathBuf,
    },
    /// Modify the store in a single transaction
    Write {
        #[arg(long, value_enum)]
        op: WriteOp,
        /// Bucket path (slash-separated)
        #[arg(long, default_value = "")]
        path: String,
        /// Key (base64), for put and delete-key
        #[arg(long)]
        key: Option<String>,
        /// Value (base64), for put
        #[arg(long)]
        value: Option<String>,
    },
}
