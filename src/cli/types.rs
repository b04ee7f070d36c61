//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands::init::InitArgs;
use super::commands::verify::VerifyArgs;

#[derive(Parser, Debug)]
#[command(name = "testbench-db")]
#[command(about = "Bootstrap the ML evaluation testbench MongoDB schema", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Additional YAML config file, merged before environment overrides
    #[arg(short, long, global = true, env = "TESTBENCH_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the collections and indexes (safe to re-run)
    Init(InitArgs),

    /// Check the live database against the schema
    Verify(VerifyArgs),

    /// Print the schema without connecting to the database
    Schema,
}
