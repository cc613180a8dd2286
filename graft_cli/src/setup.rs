//! Submodule for handling setup commands
//!
//! Setting up graft is fairly straight forward, we ask for the
//! database type and the database location and write them to
//! the config file, `graft.toml` unless another location is given.
//! The other commands read that file by default.

use anyhow::{anyhow, Context, Result};
use graft_core::config::{Config, ConfigDbType};
use std::fs::File;
use std::io::{self, BufRead, Write};

use crate::cli::SetupArgs;

pub fn handle_setup(args: SetupArgs) -> Result<()> {
    let stdin = io::stdin();
    let cfg = get_config_from_input(&mut stdin.lock())?;
    let s = toml::to_string(&cfg).context("could not serialize the config")?;
    let mut file = File::create(&args.config)
        .with_context(|| format!("could not create config file {}", args.config.display()))?;
    file.write_all(s.as_bytes())
        .with_context(|| format!("could not write config file {}", args.config.display()))?;
    println!("wrote {}", args.config.display());
    Ok(())
}

fn read_answer(input: &mut impl BufRead, prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

fn get_config_from_input(input: &mut impl BufRead) -> Result<Config> {
    println!("Select database 1) Sqlite: ");
    let db_type = match read_answer(input, "Enter a number: ")?.as_str() {
        "1" => ConfigDbType::Sqlite,
        _ => return Err(anyhow!("invalid option")),
    };
    let config = Config::new(db_type);

    match config.db_type() {
        ConfigDbType::Sqlite => {
            let db_path = read_answer(input, "Enter database path: ")?;
            if db_path.is_empty() {
                return Err(anyhow!("database path must not be empty"));
            }
            Ok(config.set_db_path(&db_path))
        }
    }
}
