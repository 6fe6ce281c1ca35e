use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/*-------------------------------------------------------------------------------------------------
  Command Line Interface (CLI) Arguments
-------------------------------------------------------------------------------------------------*/

#[derive(Parser, Debug)]
#[command(author, version, about = "Resolve published cloud IP ranges through a validated local cache.", long_about = None)]
pub struct Args {
    /// Include prefixes used by these services (case-insensitive)
    pub services: Vec<String>,

    /// Include prefixes whose KEY attribute equals VALUE; combined with --matches, all
    /// conditions must hold
    #[arg(short = 'e', long = "equals", value_name = "KEY=VALUE")]
    pub equals: Vec<String>,

    /// Include prefixes whose KEY attribute matches the regular expression REGEX; combined with
    /// --equals, all conditions must hold
    #[arg(short = 'm', long = "matches", value_name = "KEY=REGEX")]
    pub matches: Vec<String>,

    /// Cache file used to persist the IP ranges snapshot
    #[arg(long, value_name = "PATH")]
    pub cache_file: Option<PathBuf>,

    /// URL of the published IP ranges document
    #[arg(long)]
    pub url: Option<String>,

    /// Only read the cached snapshot; never touch the network
    #[arg(long, conflicts_with_all = ["check", "clear_cache"])]
    pub offline: bool,

    /// Report whether the cached snapshot is up to date (exit status 1 when it is not)
    #[arg(long, conflicts_with = "clear_cache")]
    pub check: bool,

    /// Delete the cached snapshot
    #[arg(long)]
    pub clear_cache: bool,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Cidr)]
    pub output: OutputFormat,

    /// Save the selected prefixes to a CSV file
    #[arg(long = "csv", value_name = "FILE")]
    pub csv_file: Option<PathBuf>,

    /// Log the cache decision trail
    #[arg(long)]
    pub debug: bool,

    /// Logging verbosity
    #[command(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,
}

/*--------------------------------------------------------------------------------------
  Output Format
--------------------------------------------------------------------------------------*/

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// List of (RFC4632) CIDR-format prefixes
    Cidr,

    /// List of IP networks in network mask format (n.n.n.n m.m.m.m)
    Netmask,

    /// Table of prefixes with their service, region, and network border group
    Table,
}
