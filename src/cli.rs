//! Command line options.
//!
//! Flags override the config file; everything after them is the positional
//! selector grammar described in [`crate::command`].

use std::path::PathBuf;

use calbatch_core::Config;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "calbatch")]
#[command(about = "Batch list, delete and copy Google Calendar events", long_about = None)]
pub struct Cli {
    /// Config file (defaults to the per-user config directory)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// OAuth client secrets file
    #[arg(long, value_name = "FILE")]
    pub credentials: Option<PathBuf>,

    /// Token cache file
    #[arg(long, value_name = "FILE")]
    pub token_cache: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// [CALENDAR_SELECTOR] [EVENT_SELECTOR] [list|delete|copy|show] [PREFIX...]
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// Apply flag overrides on top of a loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(path) = &self.credentials {
            config.auth.credentials_file = path.clone();
        }
        if let Some(path) = &self.token_cache {
            config.auth.token_cache_file = path.clone();
        }
    }
}
