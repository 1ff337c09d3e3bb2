use std::fs;

use clap::Parser;
use pkgres::control::{load_into_db, FieldMask};
use pkgres::database::{ArchPriority, PackageDatabase};
use pkgres::logger::init_logger;
use pkgres::package::StateStatus;

/// CLI tool status_check
///
/// Parses a status-database file (§6) and prints a summary of the packages
/// it contains.
#[derive(Parser)]
struct Args {
    /// Path to the status-database file
    path: String,

    /// Supported architectures, highest priority first
    #[arg(short, long, default_values_t = vec!["arm".to_string(), "all".to_string()])]
    arch: Vec<String>,
}

fn main() {
    init_logger();

    let args = Args::parse();
    let archs: Vec<&str> = args.arch.iter().map(String::as_str).collect();

    let content = match fs::read_to_string(&args.path) {
        Ok(content) => content,
        Err(e) => {
            log::error!("[status_check] could not read '{}': {}", args.path, e);
            std::process::exit(1);
        }
    };

    let mut db = PackageDatabase::new(ArchPriority::from_ordered(&archs));
    load_into_db(&mut db, &content, &FieldMask::all());

    let installed = db.fetch_all_installed();
    println!("Parsed status database: {}", args.path);
    println!("Installed or unpacked packages: {}", installed.len());

    let mut by_status: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
    for pkg in &installed {
        let label = match pkg.state_status {
            StateStatus::Installed => "installed",
            StateStatus::Unpacked => "unpacked",
            _ => "other",
        };
        *by_status.entry(label).or_insert(0) += 1;
    }
    for (status, count) in by_status {
        println!("  {}: {}", status, count);
    }
}
