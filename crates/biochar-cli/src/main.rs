mod cmd;

use crate::cmd::cli::Cli;
use crate::cmd::config::Config;

use biochar_core::db::initiate_tables;
use biochar_core::db::migrate::migrate_db;

use clap::Parser;
use rusqlite::Connection;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // DB init / migrations
    let db_path = Path::new(&cli.db_path);
    let fresh = !db_path.exists();
    let prepared = Connection::open(db_path).and_then(|conn| {
        if fresh {
            initiate_tables(&conn).map(|_| 0)
        } else {
            migrate_db(&conn)
        }
    });
    match prepared {
        Ok(_) if fresh => {
            println!("Successfully initiated research database {}", db_path.display())
        },
        Ok(_) => {},
        Err(e) => {
            eprintln!("Could not prepare database {}:\n{}", db_path.display(), e);
            process::exit(1);
        },
    }

    let mut cfg: Config = cli.into_config();
    if let Err(e) = cfg.run() {
        eprintln!("{e}");
        process::exit(1);
    }
}
