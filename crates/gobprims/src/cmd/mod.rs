use clap::{Args, Subcommand};
use std::path::PathBuf;

use gobprims::DEFAULT_OUTPUT;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod inspect;
pub mod read;
pub mod version;
pub mod write;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode the sample record and write it to a file.
    Write(WriteArgs),
    /// Decode a record file and print it.
    Read(ReadArgs),
    /// List the definition and value messages of a stream.
    Inspect(InspectArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Write(args) => write::run(args),
        Command::Read(args) => read::run(args, format),
        Command::Inspect(args) => inspect::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    /// File to create (truncated if it exists).
    #[arg(long, short = 'o', default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// File holding an encoded record.
    #[arg(long, short = 'i', default_value = DEFAULT_OUTPUT)]
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Stream file to list.
    #[arg(default_value = DEFAULT_OUTPUT)]
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
