use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use hospital_inventory_api::{
    auth::{JwtSessionValidator, SessionIdentity},
    config::{self, AppConfig},
    db::{self, DbPool},
    entities::hospital,
    presentation::InventoryRowView,
    services::{hospitals::HospitalService, inventory::InventoryService},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    match cli.command {
        Commands::Migrate => handle_migrate(&context).await?,
        Commands::SeedHospital(args) => handle_seed_hospital(&context, args, cli.json).await?,
        Commands::IssueToken(args) => handle_issue_token(&context, args, cli.json).await?,
        Commands::Inventory(args) => handle_inventory(&context, args, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(
    name = "hospital-inventory",
    about = "Maintenance commands for the hospital inventory service",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Create a hospital and its departments if they do not exist yet
    SeedHospital(SeedHospitalArgs),
    /// Mint a development session token for a hospital
    IssueToken(IssueTokenArgs),
    /// Print a hospital's inventory table
    Inventory(InventoryArgs),
}

#[derive(Args)]
struct SeedHospitalArgs {
    #[arg(long)]
    name: String,
    #[arg(long = "department", short = 'd', help = "Department name; repeat for several")]
    departments: Vec<String>,
}

#[derive(Args)]
struct IssueTokenArgs {
    #[arg(long)]
    hospital: String,
    #[arg(long, default_value_t = 8)]
    ttl_hours: i64,
}

#[derive(Args)]
struct InventoryArgs {
    #[arg(long)]
    hospital: String,
}

#[derive(Serialize)]
struct TokenOutput {
    hospital_id: String,
    hospital_name: String,
    token: String,
    expires_at: String,
}

struct CliContext {
    config: AppConfig,
    db: Arc<DbPool>,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;
        debug!("CLI connected to database");

        Ok(Self {
            config,
            db: Arc::new(db_pool),
        })
    }

    async fn find_hospital(&self, name: &str) -> Result<hospital::Model> {
        hospital::Entity::find()
            .filter(hospital::Column::HospitalName.eq(name))
            .one(self.db.as_ref())
            .await
            .context("failed to look up hospital")?
            .ok_or_else(|| anyhow!("hospital '{}' not found; run seed-hospital first", name))
    }
}

async fn handle_migrate(context: &CliContext) -> Result<()> {
    db::run_migrations(&context.db)
        .await
        .context("failed to run migrations")?;
    println!("Migrations applied");
    Ok(())
}

async fn handle_seed_hospital(context: &CliContext, args: SeedHospitalArgs, json: bool) -> Result<()> {
    let service = HospitalService::new(context.db.clone());
    let departments: Vec<&str> = args.departments.iter().map(String::as_str).collect();

    let hospital = service
        .seed(&args.name, &departments)
        .await
        .context("failed to seed hospital")?;
    let departments = service
        .departments(hospital.id)
        .await
        .context("failed to load departments")?;

    if json {
        print_json(&serde_json::json!({
            "hospital": hospital,
            "departments": departments,
        }))?;
    } else {
        println!("Hospital {} ({})", hospital.hospital_name, hospital.id);
        for department in &departments {
            println!("  - {}", department.department);
        }
    }

    Ok(())
}

async fn handle_issue_token(context: &CliContext, args: IssueTokenArgs, json: bool) -> Result<()> {
    if args.ttl_hours <= 0 {
        return Err(anyhow!("--ttl-hours must be positive"));
    }

    let hospital = context.find_hospital(&args.hospital).await?;
    let ttl = Duration::hours(args.ttl_hours);
    let token = JwtSessionValidator::from_config(&context.config)
        .issue_token(hospital.id, &hospital.hospital_name, ttl)
        .map_err(|e| anyhow!(e.message))?;

    let output = TokenOutput {
        hospital_id: hospital.id.to_string(),
        hospital_name: hospital.hospital_name,
        token,
        expires_at: (Utc::now() + ttl).to_rfc3339(),
    };

    if json {
        print_json(&output)?;
    } else {
        println!("{}", output.token);
    }

    Ok(())
}

async fn handle_inventory(context: &CliContext, args: InventoryArgs, json: bool) -> Result<()> {
    let hospital = context.find_hospital(&args.hospital).await?;
    let identity = SessionIdentity {
        user_id: hospital.id,
        hospital_name: hospital.hospital_name,
    };

    let rows = InventoryService::new(context.db.clone())
        .list(&identity)
        .await
        .context("failed to list inventory")?;
    let now = Utc::now();
    let views: Vec<InventoryRowView> = rows
        .iter()
        .map(|row| InventoryRowView::render(row, now))
        .collect();

    if json {
        print_json(&views)?;
        return Ok(());
    }

    if views.is_empty() {
        println!("No inventory recorded for {}", identity.hospital_name);
    }
    for view in &views {
        println!(
            "- {} • {} • qty {} [{}] • batch {} • {} • expires {} [{}]",
            view.item,
            view.department,
            view.quantity.label,
            view.quantity_tier,
            view.batch_number,
            view.unit_price,
            view.expiration.label,
            view.expiry_tier
        );
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
