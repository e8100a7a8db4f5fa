//! # Seed Data Generator
//!
//! Populates the database with a realistic development pharmacy: pricing
//! categories, families, products, staggered-expiry lots and customers of
//! every payer kind.
//!
//! ## Usage
//! ```bash
//! # Default database path
//! cargo run -p officine-db --bin seed
//!
//! # Custom path
//! cargo run -p officine-db --bin seed -- --db ./data/officine.db
//! ```

use chrono::{Duration, NaiveDate, Utc};
use std::env;
use uuid::Uuid;

use officine_core::{
    reverse::shelf_price, Customer, Lot, PayerKind, PricingCategory, Product, ProductFamily,
    DEFAULT_TENANT_ID,
};
use officine_db::{Database, DbConfig};

/// (family, category name, vat bps, centime bps, coefficient bps)
const FAMILIES: &[(&str, &str, u32, u32, u32)] = &[
    ("Antalgiques", "Spécialités TVA 16%", 1600, 200, 12_500),
    ("Antibiotiques", "Spécialités TVA 16% coef 1.30", 1600, 200, 13_000),
    ("Antipaludéens", "Essentiels TVA 0%", 0, 0, 11_000),
    ("Parapharmacie", "Parapharmacie TVA 16%", 1600, 200, 15_000),
];

/// (name, dci, family index, purchase cost in minor units)
const PRODUCTS: &[(&str, Option<&str>, usize, i64)] = &[
    ("Doliprane 500mg x16", Some("paracétamol"), 0, 48_000),
    ("Doliprane 1g x8", Some("paracétamol"), 0, 62_000),
    ("Efferalgan 500mg x16", Some("paracétamol"), 0, 51_000),
    ("Aspirine 500mg x20", Some("acide acétylsalicylique"), 0, 39_000),
    ("Ibuprofène 400mg x12", Some("ibuprofène"), 0, 57_000),
    ("Amoxicilline 500mg x12", Some("amoxicilline"), 1, 84_000),
    ("Amoxicilline 1g x6", Some("amoxicilline"), 1, 96_000),
    ("Azithromycine 250mg x6", Some("azithromycine"), 1, 132_000),
    ("Ciprofloxacine 500mg x10", Some("ciprofloxacine"), 1, 118_000),
    ("Coartem 80/480 x6", Some("artéméther/luméfantrine"), 2, 155_000),
    ("Quinine 300mg x18", Some("quinine"), 2, 88_000),
    ("Fansidar x3", Some("sulfadoxine/pyriméthamine"), 2, 64_000),
    ("Crème hydratante 200ml", None, 3, 72_000),
    ("Thermomètre frontal", None, 3, 210_000),
    ("Sérum physiologique x30", None, 3, 36_000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./officine_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Officine POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./officine_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Officine POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let today = now.date_naive();

    // Families and their pricing categories
    let mut family_ids = Vec::new();
    for (family_name, category_name, vat_bps, centime_bps, coeff_bps) in FAMILIES {
        let category = PricingCategory {
            id: Uuid::new_v4().to_string(),
            name: category_name.to_string(),
            vat_rate_bps: *vat_bps,
            centime_rate_bps: *centime_bps,
            sale_coefficient_bps: *coeff_bps,
            created_at: now,
            updated_at: now,
        };
        db.products().insert_category(&category).await?;

        let family = ProductFamily {
            id: Uuid::new_v4().to_string(),
            name: family_name.to_string(),
            pricing_category_id: category.id.clone(),
            created_at: now,
        };
        db.products().insert_family(&family).await?;

        family_ids.push((family.id, category));
    }
    println!("✓ {} families / categories", family_ids.len());

    // Products, priced forward from their purchase cost, with two lots each
    let mut product_count = 0;
    let mut lot_count = 0;
    for (idx, (name, dci, family_idx, cost_cents)) in PRODUCTS.iter().enumerate() {
        let (family_id, category) = &family_ids[*family_idx];

        let priced = shelf_price(officine_core::Money::from_cents(*cost_cents), category)
            .expect("seed categories are valid");

        let product = Product {
            id: Uuid::new_v4().to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            cip: format!("34009{:08}", 30_000_000 + idx as u64),
            dci: dci.map(|d| d.to_string()),
            name: name.to_string(),
            price_ht_cents: priced.price_ht_cents,
            price_ttc_cents: priced.price_ttc_cents,
            pricing_category_id: category.id.clone(),
            family_id: family_id.clone(),
            // A couple of products carry their own alert floor
            alert_threshold: if idx % 5 == 0 { Some(10) } else { None },
            limit_threshold: None,
            maximum_threshold: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await?;
        product_count += 1;

        // Two lots per product with staggered expiries, the nearer one
        // smaller - enough to exercise FIFO spanning in demos
        for (lot_idx, (qty, months_out)) in [(12_i64, 3_i64), (40, 14)].iter().enumerate() {
            let expiry: NaiveDate = today + Duration::days(months_out * 30 + idx as i64);
            let lot = Lot {
                id: Uuid::new_v4().to_string(),
                product_id: product.id.clone(),
                lot_number: format!("L{}{:03}-{}", expiry.format("%y%m"), idx, lot_idx + 1),
                initial_quantity: *qty,
                remaining_quantity: *qty,
                unit_cost_cents: *cost_cents,
                expiry_date: expiry,
                received_at: now,
            };
            db.lots().receive(&lot).await?;
            lot_count += 1;
        }
    }
    println!("✓ {} products, {} lots", product_count, lot_count);

    // One customer per payer kind
    let customers = [
        Customer {
            id: Uuid::new_v4().to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            full_name: "Mme Mwamba (assurée SONAS 70%)".to_string(),
            kind: PayerKind::Insured { coverage_bps: 7000 },
            ticket_moderateur_bps: 0,
            credit_ceiling_cents: 0,
            current_debt_cents: 0,
            caution_balance_cents: 0,
            may_use_credit: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
        Customer {
            id: Uuid::new_v4().to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            full_name: "M. Ilunga (conventionné -10%)".to_string(),
            kind: PayerKind::Special { discount_bps: 1000 },
            ticket_moderateur_bps: 0,
            credit_ceiling_cents: 2_000_000,
            current_debt_cents: 0,
            caution_balance_cents: 0,
            may_use_credit: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
        Customer {
            id: Uuid::new_v4().to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            full_name: "Mme Kasongo (caution prépayée)".to_string(),
            kind: PayerKind::Ordinary,
            ticket_moderateur_bps: 2000,
            credit_ceiling_cents: 0,
            current_debt_cents: 0,
            caution_balance_cents: 1_500_000,
            may_use_credit: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    ];
    for customer in &customers {
        db.customers().insert(customer).await?;
    }
    println!("✓ {} customers", customers.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
