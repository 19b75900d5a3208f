// src/cli/args.rs

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// wuforge: typed option mapping, command-line construction, and portable
/// work-unit generation for the factoring toolchain binaries.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the programs known to the built-in registry.
    List,
    /// Show the accepted configuration keys of a program.
    Show {
        /// Program name, as shown by `list`.
        program: String,
    },
    /// Render the shell command line for a configured invocation.
    Command(InvocationArgs),
    /// Serialize a configured invocation into a work-unit document.
    Workunit {
        #[command(flatten)]
        invocation: InvocationArgs,
        /// Name for the WORKUNIT header. A generated name is used if omitted.
        #[arg(long)]
        name: Option<String>,
    },
    /// Classify the input, output, and executable files of an invocation.
    Files {
        #[command(flatten)]
        invocation: InvocationArgs,
        /// Emit the classification as JSON instead of a listing.
        #[arg(long)]
        json: bool,
    },
}

/// Everything needed to configure one program invocation from the command
/// line: the parameter values plus the stdio and executable-lookup knobs.
#[derive(Args, Debug, Default)]
pub struct InvocationArgs {
    /// Program name, as shown by `list`.
    pub program: String,

    /// Inline parameter assignment, KEY=VALUE. The value is parsed as a
    /// TOML literal (`true`, `5`, `5.0`, `"quoted"`, `["a", "b"]`); anything
    /// that does not parse is taken as a bare string.
    #[arg(short = 'p', long = "param")]
    pub params: Vec<String>,

    /// TOML file with a table of parameter values, merged before inline
    /// assignments.
    #[arg(long, value_name = "FILE")]
    pub params_file: Option<PathBuf>,

    /// Redirect stdin from this file.
    #[arg(long)]
    pub stdin: Option<String>,

    /// Redirect stdout to this file.
    #[arg(long)]
    pub stdout: Option<String>,

    /// Append to the stdout target instead of truncating it.
    #[arg(long, requires = "stdout")]
    pub append_stdout: bool,

    /// Redirect stderr to this file. Equal stdout/stderr targets merge
    /// the streams (`2>&1`).
    #[arg(long)]
    pub stderr: Option<String>,

    /// Append to the stderr target instead of truncating it.
    #[arg(long, requires = "stderr")]
    pub append_stderr: bool,

    /// Run in the background (requires stdout and stderr redirection).
    #[arg(long)]
    pub background: bool,

    /// Search path for the binary; expands `~` and environment variables.
    #[arg(long)]
    pub execpath: Option<String>,

    /// Install subdirectory tried below the search path.
    #[arg(long)]
    pub execsubdir: Option<String>,

    /// Binary filename override.
    #[arg(long)]
    pub execbin: Option<String>,

    /// Executable suffix override (the platform default applies otherwise).
    #[arg(long)]
    pub execsuffix: Option<String>,

    /// Tokens prepended before the executable, e.g. an interpreter.
    #[arg(long)]
    pub runprefix: Option<String>,

    /// Skip the on-disk existence check for the binary.
    #[arg(long)]
    pub no_binary_check: bool,
}
