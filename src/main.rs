//
// meica-gear
//
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use meica_gear::errors::GearError;

#[derive(Parser)]
#[command(
    name = "meica-gear",
    about = "meica-gear — multi-echo ICA gear runner",
    long_about = "Downloads multi-echo functional data, runs meica.py on it and compresses the outputs.",
    version,
    help_template = "{bin} — {about}\n\nUsage: {usage}\n\nCommands:\n{subcommands}\n\nOptions:\n{options}\n"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gear: download inputs, run meica.py, compress outputs
    Run(meica_gear::cmds::run::RunArgs),

    /// Print the meica.py options a config.json produces
    Command(meica_gear::cmds::command::CommandArgs),

    /// Compress a directory into a zip archive
    Zip(meica_gear::cmds::archive::ZipArgs),
}

fn main() -> Result<ExitCode, GearError> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Run(args) => meica_gear::cmds::run::run(args),
        Commands::Command(args) => meica_gear::cmds::command::run(args),
        Commands::Zip(args) => meica_gear::cmds::archive::run(args),
    }?;
    Ok(ExitCode::from(code))
}
