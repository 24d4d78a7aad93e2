//! Database seeder for Milkbook development and testing.
//!
//! Seeds an admin account, a sample seller and buyer, and the current milk
//! rate schedule for local development.
//!
//! Usage: cargo run --bin seeder

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use milkbook_core::auth::hash_password;
use milkbook_db::entities::{
    milk_rates,
    sea_orm_active_enums::{DeliverySession, MilkType, UserRole},
    users,
};

/// Admin user ID (consistent for all seeds)
const ADMIN_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Sample seller ID
const SELLER_ID: &str = "00000000-0000-0000-0000-000000000002";
/// Sample buyer ID
const BUYER_ID: &str = "00000000-0000-0000-0000-000000000003";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = milkbook_db::connect(&database_url, 5)
        .await
        .expect("Failed to connect to database");

    println!("Seeding users...");
    seed_user(&db, ADMIN_ID, "Admin", "9000000001", UserRole::Admin).await;
    seed_user(&db, SELLER_ID, "Sample Seller", "9000000002", UserRole::Seller).await;
    seed_user(&db, BUYER_ID, "Sample Buyer", "9000000003", UserRole::Buyer).await;

    println!("Seeding milk rates...");
    seed_rates(&db).await;

    println!("Seeding complete!");
}

async fn seed_user(db: &DatabaseConnection, id: &str, name: &str, mobile: &str, role: UserRole) {
    let id = Uuid::parse_str(id).unwrap();

    if users::Entity::find_by_id(id)
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  User {name} already exists, skipping...");
        return;
    }

    let password_hash = hash_password("changeme123").expect("failed to hash seed password");
    let now = Utc::now().into();
    let user = users::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        mobile: Set(mobile.to_string()),
        email: Set(None),
        password_hash: Set(password_hash),
        role: Set(role),
        is_active: Set(true),
        opening_pending_amount: Set(Decimal::ZERO),
        pending_amount: Set(Decimal::ZERO),
        created_at: Set(now),
        updated_at: Set(now),
    };

    if let Err(e) = user.insert(db).await {
        eprintln!("Failed to insert user {name}: {e}");
    } else {
        println!("  Created user: {name} ({mobile})");
    }
}

async fn seed_rates(db: &DatabaseConnection) {
    let effective_from = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let rates = [
        (MilkType::Cow, DeliverySession::Morning, Decimal::new(5200, 2)),
        (MilkType::Cow, DeliverySession::Evening, Decimal::new(5400, 2)),
        (
            MilkType::Buffalo,
            DeliverySession::Morning,
            Decimal::new(6800, 2),
        ),
        (
            MilkType::Buffalo,
            DeliverySession::Evening,
            Decimal::new(7000, 2),
        ),
    ];

    for (milk_type, session, price) in rates {
        let now = Utc::now().into();
        let rate = milk_rates::ActiveModel {
            id: Set(Uuid::new_v4()),
            milk_type: Set(milk_type.clone()),
            delivery_session: Set(Some(session.clone())),
            price_per_unit: Set(price),
            effective_from: Set(effective_from),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match rate.insert(db).await {
            Ok(_) => println!("  Created rate: {milk_type:?}/{session:?} @ {price}"),
            // The unique key makes re-running the seeder a no-op per rate.
            Err(e) => println!("  Skipping rate {milk_type:?}/{session:?}: {e}"),
        }
    }
}
