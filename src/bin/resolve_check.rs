use std::fs;

use clap::Parser;
use pkgres::control::{load_into_db, FieldMask};
use pkgres::database::{ArchPriority, PackageDatabase};
use pkgres::logger::init_logger;
use pkgres::resolver::{conflicts, Resolver};

/// CLI tool resolve_check
///
/// Loads an available-packages file and a status-database file into one
/// database, resolves `package` against it, and prints what would need to
/// be installed, anything left unresolved, and any conflicts.
#[derive(Parser)]
struct Args {
    /// Path to a control-file stream describing available packages
    available: String,

    /// Path to the installed status-database file
    status: String,

    /// Name of the package to resolve
    package: String,

    /// Supported architectures, highest priority first
    #[arg(short, long, default_values_t = vec!["arm".to_string(), "all".to_string()])]
    arch: Vec<String>,
}

fn main() {
    init_logger();

    let args = Args::parse();
    let archs: Vec<&str> = args.arch.iter().map(String::as_str).collect();

    let available = fs::read_to_string(&args.available).unwrap_or_else(|e| {
        log::error!("[resolve_check] could not read '{}': {}", args.available, e);
        std::process::exit(1);
    });
    let status = fs::read_to_string(&args.status).unwrap_or_else(|e| {
        log::error!("[resolve_check] could not read '{}': {}", args.status, e);
        std::process::exit(1);
    });

    let mut db = PackageDatabase::new(ArchPriority::from_ordered(&archs));
    load_into_db(&mut db, &status, &FieldMask::all());
    load_into_db(&mut db, &available, &FieldMask::all());

    let Some(abs) = db.abstract_by_name(&args.package) else {
        log::error!("[resolve_check] unknown package: {}", args.package);
        std::process::exit(1);
    };
    let Some(pkg_id) = db.best_candidate(abs, true, |_| true) else {
        log::error!("[resolve_check] no candidate found for: {}", args.package);
        std::process::exit(1);
    };

    let conflicting = conflicts(&db, pkg_id);
    let mut resolver = Resolver::new(&mut db);
    resolver.reset();
    let (to_install, unresolved) = resolver.unsatisfied(pkg_id);

    println!("Resolving: {}", args.package);
    println!("To install ({}):", to_install.len());
    for id in &to_install {
        println!("  {}", db.package(*id).name);
    }
    println!("Unresolved ({}):", unresolved.len());
    for name in &unresolved {
        println!("  {}", name);
    }
    println!("Conflicts ({}):", conflicting.len());
    for id in &conflicting {
        println!("  {}", db.package(*id).name);
    }

    if !unresolved.is_empty() || !conflicting.is_empty() {
        std::process::exit(1);
    }
}
