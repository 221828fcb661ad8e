use std::process;

use clap::error::ErrorKind;
use clap::Parser;

mod cmd;
mod error;
mod genh;
mod pss;
mod util;

/// Extracts the elementary streams of a PS2 PSS movie into playable files.
#[derive(Parser)]
#[command(name = "psstools", version)]
struct Cli {
    /// input PSS container.
    pss: String,
}

fn main() {
    env_logger::init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };
    if let Err(e) = cmd::extract::run(&cli.pss) {
        println!("{}", e);
        process::exit(1);
    }
}
