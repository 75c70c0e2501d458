//! # Seed Data Generator
//!
//! Creates a demo account and fills it with a month of shop activity for
//! development.
//!
//! ## Usage
//! ```bash
//! cargo run -p stockbook-db --bin seed
//!
//! # Specify database path and login
//! cargo run -p stockbook-db --bin seed -- --db ./data/stockbook.db --email me@shop.com --password hunter22
//! ```
//!
//! ## Generated Data
//! - Items across beverages, snacks and household goods
//! - Purchases (unit and bulk) that stock them
//! - Retail and wholesale sales, paid cash, credit or split
//! - Expenses in several categories

use std::env;

use chrono::{Duration, Utc};
use stockbook_core::cart::{PaymentSplit, PurchaseCart, SaleCart, SaleDetails};
use stockbook_core::money::Money;
use stockbook_core::pricing::PricingType;
use stockbook_core::validation::{normalize_email, validate_password};
use stockbook_core::{
    new_id, Account, ActivityAction, Expense, ExpenseCategory, Item, NewActivity, SaleType,
};
use stockbook_db::password::hash_password;
use stockbook_db::{Database, DbConfig};

/// (name, sku, selling price cents, vendor)
const ITEMS: &[(&str, &str, i64, &str)] = &[
    ("Cola 330ml", "COLA-330", 150, "Metro Beverages"),
    ("Lemon Soda 330ml", "LEMON-330", 140, "Metro Beverages"),
    ("Mineral Water 500ml", "WATER-500", 90, "Springs Ltd"),
    ("Orange Juice 1L", "OJ-1L", 325, "Springs Ltd"),
    ("Salted Chips", "CHIPS-SALT", 120, "Crunch & Co"),
    ("Chocolate Bar", "CHOC-BAR", 180, "Crunch & Co"),
    ("Dish Soap", "DISH-SOAP", 275, "HomeCare"),
    ("Paper Towels", "PAPER-TWL", 450, "HomeCare"),
];

/// (name, category, amount cents, days ago)
const EXPENSES: &[(&str, ExpenseCategory, i64, i64)] = &[
    ("Shop rent", ExpenseCategory::Rent, 120_000, 28),
    ("Electricity", ExpenseCategory::Utilities, 8_450, 20),
    ("Delivery van fuel", ExpenseCategory::Transport, 6_200, 12),
    ("Flyers", ExpenseCategory::Marketing, 3_500, 9),
    ("Fridge repair", ExpenseCategory::Maintenance, 9_900, 4),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./stockbook_dev.db");
    let mut email = String::from("demo@stockbook.local");
    let mut password = String::from("demo-password");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--email" | "-e" => {
                if i + 1 < args.len() {
                    email = args[i + 1].clone();
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if i + 1 < args.len() {
                    password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockbook Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: ./stockbook_dev.db)");
                println!("  -e, --email <EMAIL>      Demo account email (default: demo@stockbook.local)");
                println!("  -p, --password <PASS>    Demo account password (default: demo-password)");
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let email = normalize_email(&email)?;
    validate_password(&password)?;

    println!("🌱 Stockbook Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Account:  {}", email);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.accounts().find_by_email(&email).await?.is_some() {
        println!("⚠ Account {} already exists", email);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let account = Account {
        id: new_id(),
        email: email.clone(),
        display_name: "Demo Shop".to_string(),
        password_hash: hash_password(&password)?,
        created_at: now,
        updated_at: now,
    };
    db.accounts().insert(&account).await?;
    let owner = account.id.as_str();
    println!("✓ Created account {}", email);

    // Items start empty; the purchases below stock them
    let mut items: Vec<Item> = Vec::with_capacity(ITEMS.len());
    for (name, sku, price_cents, vendor) in ITEMS {
        let item = Item {
            id: new_id(),
            owner_id: owner.to_string(),
            name: name.to_string(),
            price_cents: *price_cents,
            quantity: 0,
            sku: sku.to_string(),
            description: None,
            vendor: Some(vendor.to_string()),
            created_at: now - Duration::days(30),
            created_by: email.clone(),
            updated_at: now - Duration::days(30),
            updated_by: email.clone(),
        };
        db.items().insert(&item).await?;
        items.push(item);
    }
    println!("✓ Created {} items", items.len());

    // Two deliveries: everything by the box, then a top-up by the unit
    let mut purchase_count = 0;
    for (days_ago, pricing, qty) in [(29, PricingType::Bulk, 4), (14, PricingType::Unit, 10)] {
        let mut cart = PurchaseCart::new();
        for item in &items {
            // cost at roughly 60% of the selling price
            let unit_cost = Money::from_cents(item.price_cents * 60 / 100);
            let entered = match pricing {
                PricingType::Unit => unit_cost,
                PricingType::Bulk => unit_cost * 12,
            };
            cart.add_existing(item, pricing, qty, entered)?;
        }
        let plan = cart.into_purchase(
            Some(format!("Delivery ({})", pricing)),
            Some(now - Duration::days(days_ago)),
            &db.items().skus(owner).await?,
            owner,
            &email,
            now,
        )?;
        db.purchases().create(&plan).await?;
        db.activity()
            .append(
                owner,
                &email,
                NewActivity::new(
                    ActivityAction::PurchaseCreated,
                    format!("Recorded purchase of {}", plan.purchase.total()),
                ),
                now,
            )
            .await?;
        purchase_count += 1;
    }
    println!("✓ Recorded {} purchases", purchase_count);

    let mut sale_count = 0;
    for day in 0..25i64 {
        let items = db.items().list_all(owner).await?;
        let first = &items[(day as usize) % items.len()];
        let second = &items[(day as usize + 3) % items.len()];

        let mut cart = SaleCart::new();
        let sale_type = if day % 6 == 0 {
            cart.add_item(first, 12)?;
            SaleType::Wholesale
        } else {
            cart.add_item(first, 1 + day % 3)?;
            cart.add_item(second, 1)?;
            SaleType::Retail
        };

        if cart.check_stock(&items).is_err() {
            continue;
        }

        let total = cart.total()?;
        let payment = match day % 3 {
            0 => PaymentSplit::cash(total),
            1 => PaymentSplit::credit(total),
            _ => {
                let cash = total.divide_rounded(2);
                PaymentSplit {
                    pay_cash: true,
                    cash_amount_cents: cash.cents(),
                    pay_credit: true,
                    credit_amount_cents: (total - cash).cents(),
                }
            }
        };

        let sale = cart.into_sale(
            sale_type,
            SaleDetails {
                payment,
                purchaser_name: (sale_type == SaleType::Wholesale).then(|| "Corner Cafe".to_string()),
                sale_date: Some(now - Duration::days(24 - day)),
                ..Default::default()
            },
            owner,
            &email,
            now,
        )?;
        db.sales().create(&sale).await?;
        sale_count += 1;
    }
    println!("✓ Recorded {} sales", sale_count);

    for (name, category, amount_cents, days_ago) in EXPENSES {
        let date = now - Duration::days(*days_ago);
        db.expenses()
            .insert(&Expense {
                id: new_id(),
                owner_id: owner.to_string(),
                name: name.to_string(),
                category: *category,
                amount_cents: *amount_cents,
                description: None,
                expense_date: date,
                created_at: date,
                created_by: email.clone(),
                updated_at: date,
                updated_by: email.clone(),
            })
            .await?;
    }
    println!("✓ Recorded {} expenses", EXPENSES.len());

    println!();
    println!("✓ Seed complete! Sign in as {} / {}", email, password);

    Ok(())
}
