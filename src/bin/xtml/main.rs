//! # xtml
//!
//! This binary is the command-line front-end of the preprocessor. It builds
//! a document and writes the evaluated output next to it.

mod cli;

use cli::*;

use std::{error::Error, path::Path};

use log::error;
use xtml::{
    builder::{write_file, Builder},
    env::Environment,
    error::BuildResult,
};

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::init();

    simple_logger::init_with_level((&args.verbosity).into()).unwrap();

    match args.command {
        Commands::Version => {
            println!("xtml version: {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Build(build_args) => {
            if let Err(build_error) = build(&build_args.file) {
                error!("{build_error}");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn build(file: &Path) -> BuildResult<()> {
    let builder = Builder::new();
    let mut env = Environment::new();

    let output = builder.build_file(file, &mut env)?;
    write_file(&output, &file.with_extension("html"))
}
