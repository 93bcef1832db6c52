//! Command Line Interface for the group commitment engine.
use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use copool_data::{Database, HttpGeocoder, HttpOfferDirectory};
use copool_domain::UserId;
use copool_engine::prelude::*;
use dotenv::dotenv;
use prettytable::{Table, row};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "copool")]
#[command(about = "Group Commitment & Fulfillment Engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the database schema
    Migrate,
    /// Expire overdue pools, once or on an interval
    Sweep {
        /// Repeat interval in seconds; runs once when omitted
        #[arg(short, long)]
        interval: Option<u64>,
    },
    /// List open pools closing within the urgency window
    ClosingSoon {
        /// User whose favorites are highlighted
        #[arg(short, long)]
        user: Option<Uuid>,
    },
    /// List open pools that are within a few units of their quota
    NearCompletion {
        /// User whose favorites are highlighted
        #[arg(short, long)]
        user: Option<Uuid>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let database_url =
        env::var("DATABASE_URL").expect("DATABASE_URL must be set in .env or environment");

    match &cli.command {
        Commands::Migrate => {
            println!("🗄️  Connecting to database...");
            let db = Database::connect(&database_url).await?;
            db.migrate().await?;
            println!("✅ Schema is up to date.");
        }
        Commands::Sweep { interval } => {
            let db = Database::connect(&database_url).await?;
            let engine = build_engine(&db);

            match interval {
                Some(secs) => {
                    println!("⏰ Sweeping overdue pools every {secs}s. Ctrl-C to stop.");
                    let sweeper = ExpirySweeper::new(engine, Duration::from_secs(*secs));
                    sweeper.start().await;
                }
                None => {
                    let expired = engine.expire_overdue_pools(Utc::now()).await?;
                    println!("✅ Sweep complete: {expired} pool(s) expired.");
                }
            }
        }
        Commands::ClosingSoon { user } => {
            let db = Database::connect(&database_url).await?;
            let engine = build_engine(&db);
            let views = engine.list_by_urgency(caller(user)).await?;
            print_pool_table("Closing soon", &views);
        }
        Commands::NearCompletion { user } => {
            let db = Database::connect(&database_url).await?;
            let engine = build_engine(&db);
            let views = engine.list_by_near_completion(caller(user)).await?;
            print_pool_table("Near completion", &views);
        }
    }

    Ok(())
}

fn caller(user: &Option<Uuid>) -> UserId {
    UserId(user.unwrap_or_else(Uuid::new_v4))
}

fn build_engine(db: &Database) -> Arc<CommitmentEngine> {
    let offers = HttpOfferDirectory::new(
        env::var("OFFER_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8081".to_string()),
    );
    let geocoder = HttpGeocoder::new(
        env::var("GEOCODER_URL").unwrap_or_else(|_| "http://localhost:8082".to_string()),
        env::var("GEOCODER_API_KEY").unwrap_or_default(),
    );

    Arc::new(CommitmentEngine::new(
        Arc::new(db.pools()),
        Arc::new(offers),
        Arc::new(geocoder),
        Arc::new(db.notices()),
        Arc::new(db.favorites()),
        EngineConfig::default(),
    ))
}

fn print_pool_table(title: &str, views: &[PoolView]) {
    if views.is_empty() {
        println!("No pools found.");
        return;
    }

    println!("📋 {title}: {} pool(s)", views.len());
    let mut table = Table::new();
    table.add_row(row![
        "Pool", "Label", "Offer", "Remaining", "Deadline", "State", "Fav"
    ]);
    for view in views {
        let pool = &view.pool;
        table.add_row(row![
            pool.id,
            pool.label,
            pool.offer.name,
            pool.remaining_capacity,
            pool.deadline.format("%Y-%m-%d %H:%M"),
            pool.state.code(),
            if view.is_favorite { "★" } else { "" }
        ]);
    }
    table.printstd();
}
