//! Full schema lifecycle against the SQLite engine.
//!
//! Demonstrates the complete workflow: declaring tables, opening (which
//! creates the database and replays the queued operations), evolving the
//! schema on a later open, enumerating databases, and cleanup.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p storeplan-demos --example schema_lifecycle
//! ```

use storeplan_core::{KeySpec, TableDef, TableOptions};
use storeplan_db::Database;
use storeplan_sqlite::SqliteEngine;

#[tokio::main(flavor = "current_thread")]
async fn main() -> storeplan_db::Result<()> {
    // === Step 1: Set up a temporary engine directory ===
    let dir = std::env::temp_dir().join("storeplan_lifecycle_demo");
    std::fs::remove_dir_all(&dir).ok();
    let engine = SqliteEngine::new(&dir);

    // === Step 2: Declare tables and create the database ===
    println!("=== Creating ===");
    let mut db = Database::named(engine.clone(), "library");
    db.create_table("books", TableOptions::from(KeySpec::field("isbn")))?;
    db.create_table("loans", TableOptions::from(KeySpec::Autoincrement))?;
    db.create_table_def(
        TableDef::new("editions").with_key(KeySpec::sequence(["isbn", "printing"])),
    )?;
    println!("Queued operations: {}", db.pending_operations().len());

    db.open().await?;
    println!(
        "Opened '{}' at version {}",
        db.name().unwrap_or("?"),
        db.version().unwrap_or(0)
    );
    print_tables(&db)?;
    db.close();

    // === Step 3: Evolve the schema on a later open ===
    println!("\n=== Migrating ===");
    let mut db = Database::named(engine.clone(), "library");
    db.drop_table("loans")?;
    db.create_table("loans", TableOptions::from(KeySpec::field("loan_id")))?;
    db.create_table("members", TableOptions::new())?;
    db.open().await?;
    println!("Now at version {}", db.version().unwrap_or(0));
    print_tables(&db)?;
    db.close();

    // === Step 4: Inspect the file directly ===
    println!("\n=== Inspecting ===");
    let path = engine.directory().join("library.sqlite");
    let conn = rusqlite::Connection::open(&path).unwrap();
    let user_version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .unwrap();
    println!("{} has user_version {user_version}", path.display());

    // === Step 5: Enumerate and remove ===
    println!("\n=== Enumerating ===");
    let mut scratch = Database::named(engine.clone(), "scratch");
    scratch.create_table("notes", TableOptions::new())?;
    scratch.open().await?;
    drop(scratch);

    for db in storeplan_db::databases(&engine).await? {
        println!(
            "  {} v{}",
            db.name().unwrap_or("?"),
            db.version().unwrap_or(0)
        );
    }

    storeplan_db::remove_database(&engine, "scratch").await?;
    println!(
        "Removed 'scratch'; {} database(s) left",
        storeplan_db::databases(&engine).await?.len()
    );

    // Cleanup
    std::fs::remove_dir_all(&dir).ok();
    println!("\nDone!");
    Ok(())
}

fn print_tables(db: &Database<SqliteEngine>) -> storeplan_db::Result<()> {
    if let Some(conn) = db.connection() {
        let names = conn.table_names().map_err(storeplan_db::DatabaseError::engine)?;
        println!("Tables: {}", names.join(", "));
    }
    Ok(())
}
