//! FitCore maintenance CLI
//!
//! One binary replaces the pile of one-off maintenance scripts: schema
//! migrations, demo account management, password resets, and knowledge-base
//! re-indexing all run against the same configuration and repository layer
//! as the gateway.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fitcore_common::{
    auth::{generate_temp_password, hash_password},
    chunker,
    config::AppConfig,
    db::{models::UserRole, DbPool, Repository},
    embeddings,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fitcore-admin", version, about = "FitCore maintenance commands")]
struct Cli {
    /// Optional path to a config TOML file (defaults to the layered
    /// config/ + APP__ environment loading the gateway uses)
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending schema migrations
    Migrate,

    /// Create the demo accounts (demo_member, demo_trainer, demo_admin)
    SeedDemo {
        /// Password for all demo accounts
        #[arg(long, default_value = "DemoPass1234")]
        password: String,
    },

    /// Delete every account whose username starts with "demo_"
    DeleteDemo,

    /// Reset a user's password; prints the new password
    ResetPassword {
        /// Username of the account to reset
        username: String,

        /// New password; a random one is generated when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Rebuild the website knowledge base from a content file
    ReindexKb {
        /// Path to a UTF-8 text file with the full website content
        #[arg(long)]
        file: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path).context("Failed to load config file")?,
        None => AppConfig::load().context("Failed to load configuration")?,
    };

    let db = DbPool::new(&config.database).await?;
    let repo = Repository::new(db.clone());

    match cli.command {
        Command::Migrate => {
            db.run_migrations().await?;
            println!("Migrations applied");
        }

        Command::SeedDemo { password } => {
            let password_hash = hash_password(&password)?;
            let demo_accounts = [
                ("demo_member", "member@demo.fitcore.local", UserRole::Member),
                ("demo_trainer", "trainer@demo.fitcore.local", UserRole::Trainer),
                ("demo_admin", "admin@demo.fitcore.local", UserRole::Admin),
            ];

            for (username, email, role) in demo_accounts {
                if repo.find_user_by_username(username).await?.is_some() {
                    println!("{} already exists, skipping", username);
                    continue;
                }
                let user = repo
                    .create_user(
                        username.to_string(),
                        email.to_string(),
                        password_hash.clone(),
                        "en".to_string(),
                        role,
                    )
                    .await?;
                println!("Created {} ({})", user.username, user.id);
            }
        }

        Command::DeleteDemo => {
            let users = repo.list_users_by_prefix("demo_").await?;
            if users.is_empty() {
                println!("No demo accounts found");
            }
            for user in users {
                repo.delete_user(user.id).await?;
                println!("Deleted {} ({})", user.username, user.id);
            }
        }

        Command::ResetPassword { username, password } => {
            let user = match repo.find_user_by_username(&username).await? {
                Some(user) => user,
                None => bail!("No such user: {}", username),
            };

            let new_password = password.unwrap_or_else(|| generate_temp_password(16));
            let password_hash = hash_password(&new_password)?;
            repo.update_password(user.id, password_hash).await?;

            println!("Password for {} reset to: {}", user.username, new_password);
        }

        Command::ReindexKb { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file))?;
            if content.trim().is_empty() {
                bail!("Content file is empty");
            }

            let embedder = embeddings::create_embedder(&config.embedding)?;

            let chunks = chunker::chunk_text(&content, &config.kb);
            let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
            let embeddings = embedder.embed_batch(&texts).await?;

            let rows = chunks
                .into_iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| (chunk.index, chunk.content, embedding))
                .collect();

            let indexed = repo.replace_kb_index(&content, rows).await?;
            println!("Indexed {} chunks", indexed);
        }
    }

    Ok(())
}
