//! # Seed Data Generator
//!
//! Populates the database with properties, papers and customers for
//! development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 papers (default)
//! cargo run -p ream-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p ream-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p ream-db --bin seed -- --db ./data/ream.db
//! ```
//!
//! ## Generated Data
//! - Every property in [`PROPERTIES`]
//! - Papers named `{stock} {weight}gsm {size}`, each linked to its size,
//!   weight band and finish properties
//! - A handful of customers, some with contact details

use std::env;

use ream_core::{NewCustomer, NewPaper, NewProperty};
use ream_db::{Database, DbConfig};

/// Property tags, grouped loosely by what they describe.
const PROPERTIES: &[&str] = &[
    // sizes
    "A3", "A4", "A5", "Letter",
    // weight bands
    "Lightweight", "Standard", "Heavyweight",
    // finishes
    "Matte", "Gloss", "Recycled", "Acid Free",
];

const STOCKS: &[&str] = &[
    "Copy", "Bond", "Cardstock", "Kraft", "Vellum", "Cotton", "Parchment", "Linen",
];

const SIZES: &[&str] = &["A3", "A4", "A5", "Letter"];

const WEIGHTS: &[u32] = &[60, 80, 100, 120, 160, 200, 250, 300];

const FINISHES: &[&str] = &["Matte", "Gloss", "Recycled", "Acid Free"];

const CUSTOMERS: &[(&str, Option<&str>, Option<&str>)] = &[
    ("Ada Stationers", Some("ada@stationers.example"), Some("555-0100")),
    ("Brook Print Shop", Some("hello@brook.example"), None),
    ("Corner Office Supply", None, Some("555-0133")),
    ("Delta School District", None, None),
    ("Everleaf Studio", Some("studio@everleaf.example"), None),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./ream_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Ream Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of papers to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./ream_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Ream Seed Data Generator");
    println!("========================");
    println!("Database: {}", db_path);
    println!("Papers:   {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.papers().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} papers", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    // Properties
    let mut property_ids = Vec::with_capacity(PROPERTIES.len());
    for name in PROPERTIES {
        let property = db
            .properties()
            .insert(&NewProperty {
                name: (*name).to_string(),
                paper_ids: Vec::new(),
            })
            .await?;
        property_ids.push((*name, property.id));
    }
    println!("✓ Created {} properties", property_ids.len());

    // Papers
    let papers: Vec<NewPaper> = (0..count)
        .map(|seed| generate_paper(seed, &property_ids))
        .collect();
    let mut generated = 0;
    for batch in papers.chunks(100) {
        generated += db.papers().insert_many(batch).await?.len();
    }
    println!("✓ Generated {} papers", generated);

    // Customers
    for (name, email, phone) in CUSTOMERS {
        db.customers()
            .insert(&NewCustomer {
                name: (*name).to_string(),
                address: Some(format!("{} Mill Road", name.len() * 7)),
                phone: phone.map(str::to_string),
                email: email.map(str::to_string),
            })
            .await?;
    }
    println!("✓ Created {} customers", CUSTOMERS.len());

    println!();
    println!("✓ Seed complete in {:?}", start.elapsed());

    Ok(())
}

/// Generates one paper. Names are unique for every `seed`.
fn generate_paper(seed: usize, property_ids: &[(&str, i64)]) -> NewPaper {
    let stock_name = STOCKS[seed % STOCKS.len()];
    let size = SIZES[(seed / STOCKS.len()) % SIZES.len()];
    let weight = WEIGHTS[(seed / (STOCKS.len() * SIZES.len())) % WEIGHTS.len()];
    let finish = FINISHES[seed % FINISHES.len()];

    // Past one full cycle of combinations, add a series number.
    let cycle = seed / (STOCKS.len() * SIZES.len() * WEIGHTS.len());
    let name = if cycle == 0 {
        format!("{stock_name} {weight}gsm {size}")
    } else {
        format!("{stock_name} {weight}gsm {size} #{}", cycle + 1)
    };

    let band = match weight {
        0..=80 => "Lightweight",
        81..=160 => "Standard",
        _ => "Heavyweight",
    };

    let property_ids = property_ids
        .iter()
        .filter(|(tag, _)| *tag == size || *tag == band || *tag == finish)
        .map(|(_, id)| *id)
        .collect();

    NewPaper {
        name,
        // $0.99 - $24.99 per ream, heavier stock costs more
        price_cents: 99 + i64::from(weight) * 5 + ((seed * 37) % 500) as i64,
        stock: ((seed * 13) % 250) as i32,
        property_ids,
    }
}
