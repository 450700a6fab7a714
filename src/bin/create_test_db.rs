use std::error::Error;
use std::fs;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use sales_report::{initialize_db, parse_seed_transactions, replace_all_transactions};

/// A utility for creating a test database for the sales report server from a local JSON dataset.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// File path to a JSON array of transactions in the seed dataset format.
    #[arg(long, short)]
    seed_file: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Reading transactions from {:#?}", args.seed_file);
    let seed_json = fs::read(&args.seed_file)?;
    let transactions = parse_seed_transactions(&seed_json)?;

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Inserting {} transactions...", transactions.len());
    replace_all_transactions(&transactions, &conn)?;

    println!("Success!");

    Ok(())
}
