/// # Command Preview
///
/// Print the meica.py option tail that a config.json would produce. Nothing
/// is downloaded or executed.

use std::path::PathBuf;

use clap::Args;

use crate::call::{generate_args, generate_call};
use crate::errors::GearError;
use crate::types::gear_config::{DEFAULT_CONFIG_PATH, GearConfig};

/// Arguments for the command preview
#[derive(Args, Debug)]
pub struct CommandArgs {
    /// Path to the gear config.json
    #[arg(short, long, env = "GEAR_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Print one argument per line instead of the option string
    #[arg(long)]
    pub argv: bool,
}

pub fn run(args: CommandArgs) -> Result<u8, GearError> {
    let config = GearConfig::load_from_file(&args.config)?;
    if args.argv {
        for arg in generate_args(config.options()) {
            println!("{}", arg);
        }
    } else {
        println!("{}", generate_call(config.options()));
    }
    Ok(0)
}
