//! # Seed Data Generator
//!
//! Provisions a fresh Voltbill database: the current and previous
//! residential tariff schedules plus a handful of demo customers and
//! invoices for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default development database
//! cargo run -p voltbill-db --bin seed
//!
//! # Specify database path
//! cargo run -p voltbill-db --bin seed -- --db ./data/voltbill.db
//! ```
//!
//! ## Seeded Data
//! - Schedule `BG2023` (active): the six-band residential table with 10% VAT
//! - Schedule `BG2019` (historical, inactive)
//! - Three demo customers with invoices for two billing periods, billed
//!   against the active schedule; the older period is marked paid
//!
//! Default prices live HERE, in seed data - the computation core never
//! hardcodes a tariff table.

use chrono::{TimeZone, Utc};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use voltbill_core::{Customer, Invoice, Money, PriceBand, TariffSchedule, VatRate};
use voltbill_db::repository::tariff::TariffRecord;
use voltbill_db::{Database, DbConfig};

/// Demo customers: (code, name, address, phone, meter serial).
const CUSTOMERS: &[(&str, &str, &str, &str, &str)] = &[
    (
        "KH0001",
        "Nguyen Van An",
        "12 Tran Hung Dao, Hoan Kiem, Ha Noi",
        "0912345678",
        "CT-2021-0001",
    ),
    (
        "KH0002",
        "Tran Thi Binh",
        "45 Le Loi, Hai Chau, Da Nang",
        "0987654321",
        "CT-2021-0002",
    ),
    (
        "KH0003",
        "Le Minh Chau",
        "8 Nguyen Hue, Quan 1, TP HCM",
        "0909123456",
        "CT-2022-0103",
    ),
];

/// Meter readings per customer: (period-1 start/end, period-2 start/end).
const READINGS: &[(i64, i64, i64, i64)] = &[
    (1200, 1350, 1350, 1480),
    (380, 415, 415, 462),
    (2100, 2540, 2540, 3055),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./voltbill_dev.db");

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
                println!("Voltbill Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./voltbill_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, "Seeding Voltbill database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    if db.tariffs().count().await? > 0 {
        warn!("Database already has tariff schedules; skipping seed");
        warn!("Delete the database file to regenerate");
        return Ok(());
    }

    // -------------------------------------------------------------------------
    // Tariff schedules
    // -------------------------------------------------------------------------

    // Residential table applied from 2023-05-04
    let current = TariffSchedule::new(
        vec![
            PriceBand::bounded(50, Money::from_dong(1985)),
            PriceBand::bounded(100, Money::from_dong(2051)),
            PriceBand::bounded(200, Money::from_dong(2381)),
            PriceBand::bounded(300, Money::from_dong(2999)),
            PriceBand::bounded(400, Money::from_dong(3351)),
            PriceBand::unbounded(Money::from_dong(3461)),
        ],
        VatRate::from_bps(1000),
    )?;

    // Previous table, kept for historical recalculation
    let previous = TariffSchedule::new(
        vec![
            PriceBand::bounded(50, Money::from_dong(1728)),
            PriceBand::bounded(100, Money::from_dong(1786)),
            PriceBand::bounded(200, Money::from_dong(2074)),
            PriceBand::bounded(300, Money::from_dong(2612)),
            PriceBand::bounded(400, Money::from_dong(2919)),
            PriceBand::unbounded(Money::from_dong(3015)),
        ],
        VatRate::from_bps(1000),
    )?;

    let current_record = TariffRecord::from_schedule(
        "BG2023",
        Utc.with_ymd_and_hms(2023, 5, 4, 0, 0, 0).unwrap(),
        &current,
    )?;
    let previous_record = TariffRecord::from_schedule(
        "BG2019",
        Utc.with_ymd_and_hms(2019, 3, 20, 0, 0, 0).unwrap(),
        &previous,
    )?;

    db.tariffs().insert(&previous_record).await?;
    db.tariffs().insert(&current_record).await?;
    db.tariffs().set_active(&current_record.id).await?;

    info!(active = %current_record.code, "Tariff schedules seeded");

    // -------------------------------------------------------------------------
    // Customers and invoices
    // -------------------------------------------------------------------------

    let schedule = db
        .tariffs()
        .load_active_schedule()
        .await?
        .expect("active schedule was just seeded");

    let mut invoice_count = 0;
    for (idx, (code, name, address, phone, meter)) in CUSTOMERS.iter().enumerate() {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            full_name: name.to_string(),
            address: address.to_string(),
            phone: phone.to_string(),
            meter_serial: meter.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.customers().insert(&customer).await?;

        let (s1, e1, s2, e2) = READINGS[idx];
        for (month, start, end, paid) in [(4u32, s1, e1, true), (5u32, s2, e2, false)] {
            let mut invoice = Invoice {
                id: Uuid::new_v4().to_string(),
                invoice_no: format!("HD2023{month:02}-{:04}", idx + 1),
                customer_id: customer.id.clone(),
                month,
                year: 2023,
                start_reading: start,
                end_reading: end,
                amount_dong: None,
                is_paid: false,
                paid_at: None,
                created_at: now,
                updated_at: now,
            };
            invoice.amount_dong = Some(invoice.amount_for(&schedule)?.dong());

            let inserted = db.invoices().insert(&invoice).await?;
            if paid {
                db.invoices().mark_paid(&inserted.id).await?;
            }
            invoice_count += 1;
        }

        info!(code = %customer.code, "Customer seeded with invoices");
    }

    info!(
        customers = CUSTOMERS.len(),
        invoices = invoice_count,
        schedules = 2,
        "Seed complete"
    );

    Ok(())
}
