use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bloblite", about = "Load, save and delete text blobs", version)]
pub struct Cli {
    /// Connection string (memory://, file://<path>)
    #[arg(long, short = 'c', global = true)]
    pub connection: Option<String>,

    /// TOML file with a `connection_string` key
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a blob's content to stdout and its ETag to stderr
    Load {
        /// Container name
        container: String,
        /// Blob name
        name: String,
        /// Parse the blob as JSON and pretty-print it
        #[arg(long)]
        json: bool,
    },
    /// Store text in a blob
    Save {
        /// Container name
        container: String,
        /// Blob name
        name: String,
        /// Text to store (read from --file or stdin when omitted)
        text: Option<String>,
        /// Read the content from a file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Validate the content as JSON and store it as application/json
        #[arg(long)]
        json: bool,
        /// Create the container if it does not exist
        #[arg(long)]
        create_container: bool,
        /// Only write if the blob's current ETag matches
        #[arg(long)]
        if_match: Option<String>,
    },
    /// Delete a blob (missing blobs are not an error)
    Delete {
        /// Container name
        container: String,
        /// Blob name
        name: String,
    },
}
