use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "jtrack",
    version,
    about = "Track which Java source files have tests and documentation",
    after_help = "A file Foo.java counts as tested when Foo_tests.java sits in the same directory, \
                  and as documented when Foo.pdf does. Manual marks made with 'jtrack update' \
                  survive later scans. State lives in .jtrack/ under the current directory."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scan for .java files and merge with stored records.
    ///
    /// Detects Foo_tests.java and Foo.pdf companions in the same directory.
    /// Notes and manual overrides survive; files no longer found are kept and
    /// reported as missing.
    Scan {
        /// Directory to scan (default: current directory)
        #[arg(default_value = ".")]
        path: String,
        /// Read relative paths (one per line) from FILE instead of walking a directory; '-' reads stdin
        #[arg(long, value_name = "FILE", conflicts_with = "path")]
        from_list: Option<String>,
    },

    /// List tracked files
    List {
        /// Case-insensitive substring of file name or path
        #[arg(short, long)]
        search: Option<String>,
        /// Sort by name, path or status
        #[arg(long, default_value = "name")]
        sort: String,
        /// Hide files with both tests and docs complete
        #[arg(long)]
        hide_completed: bool,
        /// Hide files missing tests or docs
        #[arg(long)]
        hide_incomplete: bool,
        /// Hide files with an auto-detected companion
        #[arg(long)]
        hide_auto: bool,
        /// Only files in DIR or below (repeatable)
        #[arg(long = "dir", value_name = "DIR")]
        dirs: Vec<String>,
        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
        /// Results to skip
        #[arg(long, default_value = "0")]
        offset: usize,
    },

    /// Show one tracked file
    Show {
        /// Record id
        id: String,
    },

    /// Mark tests/docs complete or edit notes for one file
    Update {
        /// Record id
        id: String,
        /// Tests complete (true/false)
        #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
        test: Option<bool>,
        /// Docs complete (true/false)
        #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
        doc: Option<bool>,
        /// Replace the notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Completion statistics
    Stats,

    /// Export all records as JSON
    Export {
        /// Write to FILE instead of stdout
        #[arg(short, long, value_name = "FILE")]
        out: Option<String>,
    },

    /// Replace all records with an exported or stored document
    Import {
        /// Export document, store file or record array
        file: String,
    },

    /// Delete all records
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },

    /// Start MCP server (stdio transport)
    Mcp,
}
