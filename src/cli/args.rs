//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Load configuration from this file
//! - `--debug`: Enable debug logging

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Headwatch - resolve git refs to commit hashes through hosting APIs
#[derive(Parser, Debug)]
#[command(name = "headwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Load configuration from this file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a ref to its current commit hash
    #[command(after_help = "\
EXAMPLES:
    # Public repository
    headwatch resolve https://github.com/octocat/Hello-World master

    # Private GitLab project with a token
    headwatch resolve https://gitlab.com/group/sub/proj.git v1.0 --token glpat-xxx

EXIT STATUS:
    0  hash printed
    1  lookup failed
    2  no API path for this repository; fall back to a full clone")]
    Resolve {
        /// Repository URL (http or https)
        url: String,

        /// Branch, tag or commit prefix
        #[arg(value_name = "REF")]
        reference: String,

        /// Access token
        #[arg(long, conflicts_with = "user")]
        token: Option<String>,

        /// User name for HTTP Basic auth
        #[arg(long)]
        user: Option<String>,

        /// Password for HTTP Basic auth (prompted when omitted)
        #[arg(long, requires = "user")]
        password: Option<String>,

        /// Abort the lookup after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// List registered providers in dispatch order
    Providers,

    /// Show which provider would handle a repository URL
    Which {
        /// Repository URL
        url: String,
    },

    /// Generate shell completion scripts
    #[command(after_help = "\
EXAMPLES:
    headwatch completion bash > /etc/bash_completion.d/headwatch
    headwatch completion zsh > \"${fpath[1]}/_headwatch\"")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
