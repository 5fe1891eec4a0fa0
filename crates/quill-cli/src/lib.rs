//! Quill operator CLI: account setup and the maintenance sweeps, run against the
//! production database.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quill_api::auth::{hash_password, Registration, SessionManager};
use quill_api::constants::RECONCILE_SWEEP_BATCH;
use quill_api::services::ReconcilerService;
use quill_core::models::Role;
use quill_core::Config;
use quill_db::{MediaRepository, SessionRepository, UserRepository, UserStore};
use quill_services::StreamApiClient;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "quill", about = "Quill media operator CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Create an account that can sign in immediately
    CreateUser {
        #[arg(long)]
        email: String,
        /// author, editor or admin
        #[arg(long, default_value = "author")]
        role: String,
        #[arg(long, env = "QUILL_USER_PASSWORD")]
        password: String,
        /// Create the account unapproved
        #[arg(long)]
        pending: bool,
    },
    /// Print a stored-format password hash, for seeding
    HashPassword {
        password: String,
        /// Defaults to PASSWORD_HASH_ITERATIONS
        #[arg(long)]
        iterations: Option<u32>,
    },
    /// Delete every expired session
    SweepSessions,
    /// Sign a user out everywhere
    RevokeSessions {
        #[arg(long)]
        email: String,
    },
    /// Reconcile non-terminal videos with the transcoding service
    ReconcilePending {
        #[arg(long, default_value_t = RECONCILE_SWEEP_BATCH)]
        limit: i64,
    },
}

fn session_manager(config: &Config, pool: &PgPool) -> SessionManager {
    SessionManager::new(
        Arc::new(UserRepository::new(pool.clone())),
        Arc::new(SessionRepository::new(pool.clone())),
        config.auth().clone(),
    )
}

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    if let Commands::HashPassword {
        password,
        iterations,
    } = &cli.command
    {
        let iterations = iterations.unwrap_or(config.auth().password_hash_iterations);
        println!("{}", hash_password(password, iterations));
        return Ok(());
    }

    let pool = quill_api::setup::database::setup_database(&config).await?;

    match cli.command {
        Commands::CreateUser {
            email,
            role,
            password,
            pending,
        } => {
            let role: Role = role.parse()?;
            tracing::info!(email = %email, role = %role, pending, "Creating user");
            let user = session_manager(&config, &pool)
                .register(Registration {
                    email,
                    password,
                    role,
                    is_active: true,
                    is_approved: !pending,
                })
                .await?;
            println!("Created {} {} (id {})", user.role, user.email, user.id);
        }
        Commands::SweepSessions => {
            let removed = session_manager(&config, &pool).sweep_expired().await?;
            println!("Removed {} expired sessions", removed);
        }
        Commands::RevokeSessions { email } => {
            let users = UserRepository::new(pool.clone());
            let user = users
                .get_by_email(&email.trim().to_lowercase())
                .await?
                .with_context(|| format!("No user with email {}", email))?;
            let removed = session_manager(&config, &pool)
                .delete_all_sessions(user.id)
                .await?;
            println!("Revoked {} sessions for {}", removed, user.email);
        }
        Commands::ReconcilePending { limit } => {
            let transcoder = StreamApiClient::new(config.transcoder())
                .context("Failed to initialize transcoding client")?;
            let reconciler = ReconcilerService::new(
                Arc::new(MediaRepository::new(pool.clone())),
                Arc::new(transcoder),
            );
            let report = reconciler.reconcile_pending(limit.max(1)).await?;
            if report.failed > 0 {
                tracing::warn!(
                    failed = report.failed,
                    examined = report.examined,
                    "Some videos could not be reconciled; they stay pending until the next run"
                );
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::HashPassword { .. } => {}
    }

    Ok(())
}
