use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use validator::Validate;

use folio_core::account::NewAccount;
use folio_core::cleanup::{
    CleanupConfig, CleanupReport, CleanupScheduler, OrphanFileCleanup, PostCleanup,
    TracingCleanupReporter,
};
use folio_core::user::Role;
use folio_db::{Database, DatabaseConfig};
use folio_storage::{ObjectFileStorage, StorageConfig};

#[derive(Parser)]
#[command(name = "folio", version, about = "Operator tooling for the Folio blog backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Create an administrator account
    CreateAdmin {
        #[arg(long)]
        email: String,

        /// Reads from FOLIO_ADMIN_PASSWORD if not provided
        #[arg(long, env = "FOLIO_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        nickname: String,

        /// Display name
        #[arg(long)]
        name: Option<String>,
    },

    /// Run one cleanup pass now
    Cleanup {
        #[arg(value_enum)]
        target: CleanupTarget,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CleanupTarget {
    /// Permanently delete posts soft-deleted longer than the retention period
    Posts,
    /// Delete uploads no post or user references
    Files,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("folio=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db = connect_db().await?;

    match cli.command {
        Commands::Migrate => {
            db.migrate().await.context("Failed to run migrations")?;
            println!("Migrations applied");
        }
        Commands::CreateAdmin {
            email,
            password,
            nickname,
            name,
        } => {
            let account = NewAccount::new(&email, &password, &nickname, name.as_deref());
            cmd_create_admin(&db, account).await?;
        }
        Commands::Cleanup { target } => {
            let report = cmd_cleanup(&db, target).await?;
            println!(
                "Cleanup finished: {} succeeded, {} failed",
                report.succeeded, report.failed
            );
        }
    }

    Ok(())
}

async fn connect_db() -> Result<Database> {
    let config = DatabaseConfig::from_env()?;
    Database::connect(&config)
        .await
        .context("Failed to connect to database")
}

async fn cmd_create_admin(db: &Database, account: NewAccount) -> Result<()> {
    if let Err(errors) = account.validate() {
        let details: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "is invalid".to_string());
                format!("{field} {message}")
            })
            .collect();
        bail!("Invalid admin account: {}", details.join("; "));
    }

    let repo = db.user_repo();
    if repo.email_exists(&account.email).await? {
        bail!("Email {} is already in use", account.email);
    }
    if repo.nickname_exists(&account.nickname).await? {
        bail!("Nickname {} is already in use", account.nickname);
    }

    let user = repo.create(&account.into_new_user(Role::Admin)?).await?;

    tracing::info!(user_id = user.id, "Admin account created");
    println!("Created admin {} (id {})", user.nickname, user.id);
    Ok(())
}

async fn cmd_cleanup(db: &Database, target: CleanupTarget) -> Result<CleanupReport> {
    let config = CleanupConfig::from_env()?;

    let report = match target {
        CleanupTarget::Posts => {
            CleanupScheduler::new(
                PostCleanup::new(db.post_repo(), config.post_retention),
                config.post_schedule,
            )
            .run_pass(&TracingCleanupReporter)
            .await?
        }
        CleanupTarget::Files => {
            let storage = ObjectFileStorage::from_config(&StorageConfig::from_env()?)?;
            CleanupScheduler::new(
                OrphanFileCleanup::new(db.file_repo(), storage, config.orphan_grace),
                config.file_schedule,
            )
            .run_pass(&TracingCleanupReporter)
            .await?
        }
    };
    Ok(report)
}
