//! # Seed Data Generator
//!
//! Populates a database with a small GST stock catalog for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p bahi-db --bin seed
//!
//! # Specify database path and tenant
//! cargo run -p bahi-db --bin seed -- --db ./data/bahi.db --tenant my-firm
//!
//! # Switch GST off for an unregistered firm (works on an already seeded db)
//! cargo run -p bahi-db --bin seed -- --tenant my-firm --gst off
//! ```
//!
//! ## Generated Stock
//! - Plain items (no batches) at 5%, 12%, 18% and 28% GST
//! - Single-batch items, whose batch values override the item's
//! - Multi-batch items, which force batch selection in the draft editor

use bahi_core::types::{Batch, StockItem};
use bahi_core::{Money, DEFAULT_TENANT_ID};
use bahi_db::{Database, DbConfig};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::env;

/// (id, item, hsn, oem, uom, gst %, rate in paise, qty)
const PLAIN_STOCK: &[(&str, &str, &str, &str, &str, i64, i64, i64)] = &[
    ("STK-CEM-50", "Cement 50kg", "2523", "UltraTech", "BAG", 28, 38_000, 400),
    ("STK-TMT-12", "TMT Bar 12mm", "7214", "Tata Tiscon", "KG", 18, 6_850, 5_000),
    ("STK-PVC-4", "PVC Pipe 4in", "3917", "Supreme", "PCS", 18, 52_500, 120),
    ("STK-RICE-25", "Basmati Rice 25kg", "1006", "India Gate", "BAG", 5, 210_000, 60),
    ("STK-TILE-2", "Vitrified Tile 2x2", "6907", "Kajaria", "BOX", 18, 98_000, 75),
    ("STK-WIRE-90", "Copper Wire 90m", "8544", "Havells", "ROLL", 18, 189_900, 40),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./bahi_dev.db");
    let mut tenant_id = String::from(DEFAULT_TENANT_ID);
    let mut gst_enabled: Option<bool> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--tenant" | "-t" => {
                if i + 1 < args.len() {
                    tenant_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--gst" | "-g" => {
                if i + 1 < args.len() {
                    gst_enabled = Some(parse_switch(&args[i + 1])?);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Bahi Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database file path (default: ./bahi_dev.db)");
                println!("  -t, --tenant <ID>    Tenant to seed (default: {})", DEFAULT_TENANT_ID);
                println!("  -g, --gst <on|off>   Set the tenant's GST status (default: unchanged)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Bahi Seed Data Generator");
    println!("===========================");
    println!("Database: {}", db_path);
    println!("Tenant:   {}", tenant_id);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    db.system_config().ensure_tenant(&tenant_id, true).await?;

    if let Some(enabled) = gst_enabled {
        db.system_config()
            .set_gst_enabled(&tenant_id, enabled)
            .await?;
        println!("✓ GST {}", if enabled { "enabled" } else { "disabled" });
    }

    let existing = db.stocks().count(&tenant_id).await?;
    if existing > 0 {
        println!("⚠ Tenant already has {} stock items", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let mut generated = 0;
    for stock in catalog() {
        if let Err(e) = db.stocks().insert(&tenant_id, &stock).await {
            eprintln!("Failed to insert {}: {}", stock.id, e);
            continue;
        }
        generated += 1;
    }

    println!();
    println!("✓ Inserted {} stock items", generated);
    println!(
        "  Next bill number: {}",
        db.sequences()
            .preview_bill_no(&tenant_id, &Default::default())
            .await?
    );

    Ok(())
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("--gst expects on or off, got '{}'", other)),
    }
}

fn catalog() -> Vec<StockItem> {
    let mut items: Vec<StockItem> = PLAIN_STOCK
        .iter()
        .map(|&(id, item, hsn, oem, uom, grate, paise, qty)| StockItem {
            id: id.to_string(),
            item: item.to_string(),
            hsn: hsn.to_string(),
            oem: Some(oem.to_string()),
            uom: uom.to_string(),
            grate: Decimal::from(grate),
            rate: Money::from_paise(paise),
            qty: Decimal::from(qty),
            batches: vec![],
        })
        .collect();

    items.push(StockItem {
        id: "STK-PAINT-20".into(),
        item: "Exterior Emulsion 20L".into(),
        hsn: "3209".into(),
        oem: Some("Asian Paints".into()),
        uom: "TIN".into(),
        grate: Decimal::from(18),
        rate: Money::from_rupees(6_200),
        qty: Decimal::from(30),
        batches: vec![batch("AP-2407", 30, 6_150, (2027, 7, 31), Some(7_400))],
    });

    items.push(StockItem {
        id: "STK-AZI-500".into(),
        item: "Azithromycin 500mg".into(),
        hsn: "3004".into(),
        oem: Some("Cipla".into()),
        uom: "STRIP".into(),
        grate: Decimal::from(12),
        rate: Money::from_rupees(98),
        qty: Decimal::from(250),
        batches: vec![
            batch("AZ-2401", 100, 95, (2026, 12, 31), Some(120)),
            batch("AZ-2405", 150, 99, (2027, 4, 30), Some(124)),
        ],
    });

    items.push(StockItem {
        id: "STK-ADH-1".into(),
        item: "Tile Adhesive 20kg".into(),
        hsn: "3214".into(),
        oem: Some("MYK Laticrete".into()),
        uom: "BAG".into(),
        grate: Decimal::from(18),
        rate: Money::from_rupees(540),
        qty: Decimal::from(90),
        batches: vec![
            batch("LT-A", 40, 520, (2026, 11, 30), None),
            batch("LT-B", 30, 535, (2027, 1, 31), None),
            batch("LT-C", 20, 560, (2027, 3, 31), None),
        ],
    });

    items
}

fn batch(label: &str, qty: i64, rupees: i64, expiry: (i32, u32, u32), mrp: Option<i64>) -> Batch {
    Batch {
        batch: Some(label.to_string()),
        qty: Decimal::from(qty),
        rate: Money::from_rupees(rupees),
        expiry: NaiveDate::from_ymd_opt(expiry.0, expiry.1, expiry.2),
        mrp: mrp.map(Money::from_rupees),
    }
}
