//! Close every other session on the Sparkify PostgreSQL database.
//!
//! `DROP DATABASE` refuses to run while other sessions are connected, so this
//! is run before recreating the database from scratch.
//!
//! ## Usage
//!
//! ```bash
//! sparkify-sever                      # terminate sessions on sparkifydb
//! sparkify-sever --database otherdb   # or on another database
//! ```

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use sparkify_etl::db::postgres::terminate_other_sessions;
use sparkify_etl::{logging, Config};

struct SeverArgs {
    config_path: Option<PathBuf>,
    database: String,
}

fn main() -> Result<()> {
    let args = parse_args();
    let config = load_config(&args)?;

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("Warning: logging could not be initialized: {:#}", e);
    }

    info!("Terminating other sessions on {}", args.database);
    let terminated = terminate_other_sessions(&config.database.admin_url, &args.database)
        .with_context(|| format!("Failed to terminate sessions on {}", args.database))?;

    println!("{} sessions terminated on {}", terminated, args.database);
    Ok(())
}

fn parse_args() -> SeverArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut sever = SeverArgs {
        config_path: None,
        database: "sparkifydb".to_string(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--database" | "-d" => {
                if i + 1 < args.len() {
                    sever.database = args[i + 1].clone();
                    i += 1;
                } else {
                    eprintln!("Error: --database requires a name");
                    std::process::exit(1);
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    sever.config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    sever
}

fn print_help() {
    println!(
        r#"sparkify-sever - terminate other sessions on the Sparkify database

USAGE:
    sparkify-sever [OPTIONS]

OPTIONS:
    --database, -d NAME  Database whose sessions are terminated (default: sparkifydb)
    --config, -c PATH    Path to config file
    --help, -h           Show this help message

The connection is made with database.admin_url from the config file, which
must point at a different database than the one being cleared."#
    );
}

fn load_config(args: &SeverArgs) -> Result<Config> {
    let path = args.config_path.clone().unwrap_or_else(Config::config_path);

    if path.exists() {
        Config::load_from(&path)
    } else {
        eprintln!("Config file not found at {:?}, using defaults", path);
        Ok(Config::default())
    }
}
