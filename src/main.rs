use std::process::ExitCode;

use log::{error, info};
use twolayer_nn::{SanityConfig, sanity_check, your_sanity_checks};

fn run() -> twolayer_nn::Result<()> {
    let cfg = SanityConfig::from_env()?;
    match cfg.seed {
        Some(seed) => info!("using seed {seed}"),
        None => info!("no seed set, data is not reproducible"),
    }

    sanity_check(&cfg)?;
    your_sanity_checks(&cfg)?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
