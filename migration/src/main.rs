use std::{fs, path::Path};
use util::{config, paths};

mod runner;

#[tokio::main]
async fn main() {
    let db_path = config::database_path();
    let url = format!("sqlite://{}?mode=rwc", db_path);
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("clean") => {
            remove_db_file(&db_path);
        }
        Some("fresh") => {
            remove_db_file(&db_path);
            create_db_dir(&db_path);
            runner::run_all_migrations(&url).await;
        }
        _ => {
            create_db_dir(&db_path);
            runner::run_all_migrations(&url).await;
        }
    }
}

fn remove_db_file(path: &str) {
    let db_path = Path::new(path);
    if db_path.exists() {
        if let Err(e) = fs::remove_file(db_path) {
            eprintln!("Failed to delete DB {}: {}", db_path.display(), e);
            std::process::exit(1);
        }
        println!("Deleted DB: {}", db_path.display());
    } else {
        println!("DB file does not exist: {}", db_path.display());
    }

    // Organized submissions reference rows in the DB, so they go too.
    let storage_path = paths::storage_root();
    if storage_path.exists() {
        if let Err(e) = fs::remove_dir_all(&storage_path) {
            eprintln!("Failed to delete storage {}: {}", storage_path.display(), e);
            std::process::exit(1);
        }
        println!("Deleted storage: {}", storage_path.display());
    } else {
        println!("Storage does not exist: {}", storage_path.display());
    }
}

fn create_db_dir(path: &str) {
    if let Err(e) = paths::ensure_parent_dir(path) {
        eprintln!("Failed to create DB directory for {}: {}", path, e);
        std::process::exit(1);
    }
}
