//! CLI argument parsing for Huella

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "huella")]
#[command(version)]
#[command(about = "Execution-event tracer with indented call-depth output", long_about = None)]
pub struct Cli {
    /// Filter events to trace (e.g., -e kinds=calls or -e kinds=call,raise)
    #[arg(short = 'e', long = "expr", value_name = "EXPR")]
    pub filter: Option<String>,

    /// Script map JSON translating {N} placeholder locations to names
    #[arg(long = "script-map", value_name = "FILE")]
    pub script_map: Option<PathBuf>,

    /// Tracer configuration file (targets, autorun, default filter)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also print executed source lines
    #[arg(long = "lines")]
    pub lines: bool,

    /// Also print raise events
    #[arg(long = "raises")]
    pub raises: bool,

    /// Enable debug logging to stderr
    #[arg(long)]
    pub debug: bool,

    /// Recorded trace file to replay (JSON array of events)
    #[arg(value_name = "TRACE_FILE")]
    pub trace_file: PathBuf,
}
