//! # Seed Data Generator
//!
//! Populates a database with a demo season for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default ./weft.db
//! cargo run -p weft-db --bin seed
//!
//! # Specify database path
//! cargo run -p weft-db --bin seed -- --db ./data/mill.db
//! ```
//!
//! ## Generated Data
//! - Four gate-inward lots across two varieties, each with weighed bales
//! - One issue consuming the first two bales of the first lot
//! - One waste packing, one invoice, one sales order (all reconciled)

use chrono::NaiveDate;
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

use weft_core::types::{
    InvoiceCreateRequest, InvoiceLine, IssueCreateRequest, IssueItemRequest, LotCreateRequest,
    SalesOrderCreateRequest, SalesOrderLine, WastePackingCreateRequest, WastePackingLine,
    WeightmentRow,
};
use weft_core::{Money, Weight};
use weft_db::{Database, DbConfig, DbError};

/// (inward number, variety, bale count, base gross grams) per demo lot.
const LOTS: &[(&str, &str, usize, i64)] = &[
    ("GI/24-25/0001", "MCU-5", 6, 98_000),
    ("GI/24-25/0002", "MCU-5", 4, 101_500),
    ("GI/24-25/0003", "Shankar-6", 8, 95_000),
    ("GI/24-25/0004", "Shankar-6", 5, 103_000),
];

#[tokio::main]
async fn main() -> Result<(), DbError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let db_path = parse_db_arg().unwrap_or_else(|| "./weft.db".to_string());
    info!(db = %db_path, "Seeding demo data");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let lot_date = NaiveDate::from_ymd_opt(2024, 7, 10).expect("valid date");
    let mut lot_nos = Vec::new();

    for (idx, (inward_no, variety, bales, base_gross)) in LOTS.iter().enumerate() {
        let rows: Vec<WeightmentRow> = (0..*bales)
            .map(|b| WeightmentRow {
                // Vary weights deterministically around the base
                gross_grams: base_gross + (b as i64 % 3) * 750,
                tare_grams: 2_400 + (b as i64 % 2) * 100,
                value_paise: 520_000,
            })
            .collect();

        let lot = db
            .lots()
            .create(LotCreateRequest {
                inward_no: inward_no.to_string(),
                lot_date: lot_date + chrono::Days::new(idx as u64 * 3),
                variety: Some(variety.to_string()),
                declared_bales: *bales as i64,
                rate_paise: 5_200,
                rows,
            })
            .await?;

        info!(lot_no = %lot.lot_no, variety = %variety, bales = %bales, nett = %lot.nett(), "Lot seeded");
        lot_nos.push(lot.lot_no);
    }

    // Issue the first two bales of the first lot toward a mixing
    let bales = db.weightments().list_available(&lot_nos[0]).await?;
    let issue = db
        .issues()
        .create(IssueCreateRequest {
            issue_number: None,
            issue_date: NaiveDate::from_ymd_opt(2024, 8, 1).expect("valid date"),
            mixing_group_id: "MG-1".to_string(),
            to_mixing_group_id: "MG-4".to_string(),
            items: bales
                .iter()
                .take(2)
                .map(|w| IssueItemRequest {
                    weightment_id: w.id.clone(),
                    issue_weight_grams: w.net_grams,
                })
                .collect(),
        })
        .await?;
    info!(issue_no = %issue.issue.issue_no, qty = issue.issue.issue_qty, "Issue seeded");

    // One reconciled waste packing
    let packing_lines: Vec<WastePackingLine> = (0..5)
        .map(|i| WastePackingLine { weight_grams: 52_000 + i * 400 })
        .collect();
    let packing = db
        .waste_packings()
        .create(WastePackingCreateRequest {
            packing_no: "WP-24-0001".to_string(),
            packing_date: NaiveDate::from_ymd_opt(2024, 9, 15).expect("valid date"),
            waste_type: "comber noil".to_string(),
            no_of_bales: packing_lines.len() as i64,
            total_weight_grams: packing_lines.iter().map(|l| l.weight_grams).sum(),
            details: packing_lines,
        })
        .await?;
    info!(packing_no = %packing.packing.packing_no, "Waste packing seeded");

    // One invoice over the packed waste, amounts at rate x nett
    let invoice_lines: Vec<InvoiceLine> = [("comber noil", 260_000_i64, 3_500_i64)]
        .iter()
        .map(|(desc, nett, rate)| InvoiceLine {
            description: desc.to_string(),
            net_grams: *nett,
            rate_paise: *rate,
            amount_paise: Money::from_paise(*rate).for_weight(Weight::from_grams(*nett)).paise(),
        })
        .collect();
    let invoice = db
        .invoices()
        .create(InvoiceCreateRequest {
            invoice_no: "INV-24-0001".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2024, 9, 20).expect("valid date"),
            party: "Sharda Traders".to_string(),
            total_net_grams: invoice_lines.iter().map(|l| l.net_grams).sum(),
            total_amount_paise: invoice_lines.iter().map(|l| l.amount_paise).sum(),
            details: invoice_lines,
        })
        .await?;
    info!(invoice_no = %invoice.invoice.invoice_no, "Invoice seeded");

    let order_lines = vec![
        SalesOrderLine {
            variety: "comber noil".to_string(),
            net_grams: 500_000,
            rate_paise: 3_500,
        },
        SalesOrderLine {
            variety: "flat strip".to_string(),
            net_grams: 250_000,
            rate_paise: 2_200,
        },
    ];
    let order = db
        .sales_orders()
        .create(SalesOrderCreateRequest {
            order_no: "SO-24-0001".to_string(),
            order_date: NaiveDate::from_ymd_opt(2024, 9, 25).expect("valid date"),
            party: "Sharda Traders".to_string(),
            broker: Some("R K Agencies".to_string()),
            total_net_grams: order_lines.iter().map(|l| l.net_grams).sum(),
            details: order_lines,
        })
        .await?;
    info!(order_no = %order.order.order_no, "Sales order seeded");

    let summary = serde_json::json!({
        "database": db_path,
        "lots": lot_nos,
        "issue": issue.issue.issue_no,
        "wastePacking": packing.packing.packing_no,
        "invoice": invoice.invoice.invoice_no,
        "salesOrder": order.order.order_no,
    });
    println!("{}", serde_json::to_string_pretty(&summary).expect("serializable summary"));

    db.close().await;
    Ok(())
}

/// Parses `--db <path>` from the command line.
fn parse_db_arg() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1).cloned())
}
