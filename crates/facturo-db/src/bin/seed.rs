//! # Seed Catalog Generator
//!
//! Fills an empty database with a small storefront catalog for development.
//!
//! ## Usage
//! ```bash
//! # Default database path
//! cargo run -p facturo-db --bin seed
//!
//! # Custom path
//! cargo run -p facturo-db --bin seed -- --db ./data/facturo.db
//!
//! # Re-seed on top of existing products
//! cargo run -p facturo-db --bin seed -- --force
//! ```
//!
//! Stock is derived from the product's position so some items start sold
//! out, which exercises the cart's stock ceiling.

use std::env;

use facturo_core::{Money, ProductInput};
use facturo_db::{Database, DbConfig};

/// (category, [(name, price in cents, description)])
const CATALOG: &[(&str, &[(&str, i64, &str)])] = &[
    (
        "electronics",
        &[
            ("Wireless Headphones", 189_900, "Over-ear, 30 hours of battery"),
            ("Bluetooth Speaker", 129_900, "Water resistant, pocket sized"),
            ("USB-C Charger 65W", 89_900, "Charges a laptop and a phone at once"),
            ("Mechanical Keyboard", 249_900, "Hot-swappable switches"),
            ("Wireless Mouse", 59_900, "Silent clicks, 18 month battery"),
            ("Webcam 1080p", 149_900, "Built-in privacy shutter"),
        ],
    ),
    (
        "home",
        &[
            ("Ceramic Mug", 25_900, "350 ml, dishwasher safe"),
            ("Cotton Apron", 39_900, "Adjustable neck strap"),
            ("Desk Lamp", 99_900, "Three color temperatures"),
            ("Throw Blanket", 119_900, "Soft knit, 130 x 170 cm"),
            ("Scented Candle", 32_900, "Vanilla and sandalwood"),
        ],
    ),
    (
        "books",
        &[
            ("Field Notes Notebook", 18_900, "Dot grid, 48 pages"),
            ("Colombian Cookbook", 89_000, "Recipes from every region"),
            ("Pocket Atlas", 45_000, "Maps of the Americas"),
            ("Sketchbook A4", 35_900, "Heavyweight paper"),
        ],
    ),
    (
        "clothing",
        &[
            ("Basic T-Shirt", 49_900, "Organic cotton"),
            ("Denim Jacket", 229_900, "Classic fit"),
            ("Wool Socks", 22_900, "Pack of two"),
            ("Rain Poncho", 69_900, "Packs into its own pocket"),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./facturo_dev.db");
    let mut force = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--force" | "-f" => force = true,
            "--help" | "-h" => {
                println!("Facturo Seed Catalog Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./facturo_dev.db)");
                println!("  -f, --force        Seed even if products already exist");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    println!("Facturo Seed Catalog Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 && !force {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates (use --force to override).");
        return Ok(());
    }

    let mut created = 0usize;
    let mut index = 0usize;

    for (category, products) in CATALOG {
        for (name, price_cents, description) in products.iter() {
            let input = ProductInput {
                name: name.to_string(),
                description: description.to_string(),
                price: Money::from_cents(*price_cents),
                image_url: format!("https://picsum.photos/seed/facturo-{index}/400/400"),
                category: category.to_string(),
                stock: seed_stock(index),
            };
            index += 1;

            match db.products().create(input).await {
                Ok(product) => {
                    created += 1;
                    println!(
                        "  + {:<24} {:>12}  stock {:>3}  [{}]",
                        product.name, product.price, product.stock, product.category
                    );
                }
                Err(e) => eprintln!("Failed to insert {}: {}", name, e),
            }
        }
    }

    println!();
    println!("✓ Created {} products in {} categories", created, CATALOG.len());

    db.close().await;
    Ok(())
}

/// Every seventh product starts sold out; the rest get 1..=40 units.
fn seed_stock(index: usize) -> i64 {
    if index % 7 == 6 {
        0
    } else {
        1 + ((index * 13) % 40) as i64
    }
}
