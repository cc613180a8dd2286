//! Main entry point for the graft cli tool

mod cli;
mod generate;
mod migrate;
mod rollback;
mod setup;
mod status;
mod util;

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use graft_core::config::Config;

use crate::cli::Cli;

fn main() -> anyhow::Result<()> {
    human_panic::setup_panic!();

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    match Cli::parse() {
        Cli::Setup(args) => setup::handle_setup(args)?,
        Cli::Migrate(args) => migrate::handle_migration_command(args)?,
        Cli::Rollback(args) => rollback::handle_rollback_command(args)?,
        Cli::Status(args) => status::handle_status_command(args)?,
        Cli::Generate(args) => generate::handle_generate_command(args)?,
    }
    Ok(())
}

fn config(config_location: &Path, env_var_opt: Option<&str>) -> anyhow::Result<Config> {
    if let Some(env_var) = env_var_opt {
        Config::from_env_var(env_var).context("could not load the database url from the environment")
    } else {
        Config::from_file_location(config_location).context("could not parse the config file")
    }
}
