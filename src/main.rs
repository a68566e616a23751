use clap::Parser;

use rusbit_bencode::engine::{use_command, Cli};

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = use_command(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
