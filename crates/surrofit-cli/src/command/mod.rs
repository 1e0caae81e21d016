use clap::{Parser, Subcommand};

use self::demo::DemoArg;

mod demo;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Run a toy evolutionary optimization with a surrogate predictor in
    /// the loop
    Demo(DemoArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Demo(arg) => demo::run(&arg)?,
    }
    Ok(())
}
