use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{error, info, warn};

use sparkify_etl::{logging, pipeline, Config, Database};

struct CliArgs {
    config_path: Option<PathBuf>,
    reset: bool,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        reset: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("sparkify-etl {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    cli.config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--reset" => {
                cli.reset = true;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn print_help() {
    println!(
        r#"sparkify-etl - load song metadata and activity logs into the Sparkify star schema

USAGE:
    sparkify-etl [OPTIONS]

OPTIONS:
    --config, -c PATH   Path to config file
    --reset             Drop and recreate all tables before loading
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    SPARKIFY_CONFIG     Path to config file (overrides default location)
    SPARKIFY_LOG        Log filter (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/sparkify/config.toml
Without a config file the data goes to a SQLite database at
$XDG_DATA_HOME/sparkify/sparkifydb.sqlite. To load into PostgreSQL, build with
the `postgres` feature and set backend = "postgresql" in [database]; the
connection string is postgresql_url.
Song files are read from data/song_data and logs from data/log_data unless
the [data] section says otherwise."#
    );
}

fn main() -> Result<()> {
    let cli = parse_args();

    let config = match cli.config_path {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("Warning: logging could not be initialized: {:#}", e);
    }

    let db = match Database::open(&config.database) {
        Ok(db) => db,
        Err(e) => {
            error!("Could not make a connection to the database: {}", e);
            return Err(e).context("Aborting: no usable database connection");
        }
    };

    if cli.reset || config.load.reset {
        info!("Dropping and recreating tables");
        db.reset()?;
    } else {
        db.initialize()?;
    }

    let reports = pipeline::run(&db, &config)?;

    for report in &reports {
        println!();
        print!("{}", report);
    }

    match db.table_counts() {
        Ok(counts) => {
            println!();
            println!("Table rows: {}", counts);
        }
        Err(e) => warn!("Could not count table rows: {}", e),
    }

    let clean = reports.iter().all(|r| r.is_clean());
    if !clean {
        warn!("Load finished with failures, see the summary above");
    }

    drop(db);
    info!("Connection closed");
    Ok(())
}
