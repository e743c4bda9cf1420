//! Operator CLI: schema migrations and tenant / admin provisioning.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use storefront::{
    auth::hash_password,
    config::ConfigLoader,
    db,
    repositories::{AdminRepository, NewTenant, TenantRepository},
};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "storefront-admin", version, about = "Storefront operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending database migrations
    Migrate,
    /// Register a storefront bound to a domain
    TenantAdd {
        #[arg(long)]
        name: String,
        /// Host (or URL) the storefront is served from
        #[arg(long)]
        domain: String,
        /// WhatsApp contact number
        #[arg(long)]
        mobile: String,
        #[arg(long)]
        primary_color: Option<String>,
        #[arg(long)]
        secondary_color: Option<String>,
    },
    /// List storefronts in resolution order
    TenantList,
    /// Create a back office account for a storefront
    AdminAdd {
        #[arg(long)]
        tenant: Uuid,
        #[arg(long)]
        email: String,
        /// Read from STOREFRONT_ADMIN_PASSWORD when omitted
        #[arg(long, env = "STOREFRONT_ADMIN_PASSWORD")]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;
    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;

    match cli.command {
        Command::Migrate => {
            db::run_migrations(&db).await?;
            println!("Migrations applied");
        }
        Command::TenantAdd {
            name,
            domain,
            mobile,
            primary_color,
            secondary_color,
        } => {
            let tenant = TenantRepository::new(&db)
                .create(NewTenant {
                    name,
                    domain,
                    mobile_number: mobile,
                    primary_color,
                    secondary_color,
                })
                .await
                .context("creating tenant")?;
            println!("Created tenant {} ({})", tenant.name, tenant.id);
        }
        Command::TenantList => {
            let tenants = TenantRepository::new(&db)
                .list_tenants()
                .await
                .context("listing tenants")?;
            for tenant in tenants {
                println!(
                    "{}\t{}\t{}\t{}",
                    tenant.id, tenant.domain, tenant.name, tenant.mobile_number
                );
            }
        }
        Command::AdminAdd {
            tenant,
            email,
            password,
        } => {
            if password.len() < 8 {
                return Err(anyhow!("password must be at least 8 characters"));
            }
            TenantRepository::new(&db)
                .get_tenant_by_id(tenant)
                .await
                .context("looking up tenant")?
                .ok_or_else(|| anyhow!("tenant {tenant} does not exist"))?;

            let password_hash =
                hash_password(&password).map_err(|err| anyhow!("hashing password: {err}"))?;
            let admin = AdminRepository::new(&db)
                .create(tenant, &email, password_hash)
                .await
                .context("creating admin")?;
            println!("Created admin {} for tenant {}", admin.email, tenant);
        }
    }

    Ok(())
}
