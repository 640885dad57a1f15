use clap::Parser;
use ecoroute::{CliArgs, run};

fn main() {
    env_logger::init();
    let args = CliArgs::parse();
    if let Err(e) = run(&args) {
        log::error!("ecoroute failed: {e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
