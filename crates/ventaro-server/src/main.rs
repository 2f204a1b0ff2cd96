//! `ventaro`: the storefront server and its maintenance commands.
//!
//! ```text
//! ventaro serve                          # run the HTTP API
//! ventaro seed --admin-email a@b.c       # default catalog + an admin profile
//! ventaro reconcile [--dry-run]          # re-map purchase product codes
//! ventaro hash-password                  # argon2 PHC string for stdin
//! ventaro send-test-email you@example.com
//! ```
//!
//! Every command reads `config.toml` (or `--config`) plus `VENTARO_*`
//! environment variables.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use ventaro_core::{
  catalog::{self, default_products, plan_reconciliation},
  is_plausible_email,
  profile::{NewProfile, Role},
  purchase::PurchaseFilter,
  store::Storefront,
};
use ventaro_mail::{MailError, Mailer as _, SendGridMailer, templates};
use ventaro_server::{ServerConfig, build_state, open_store};

#[derive(Parser)]
#[command(author, version, about = "Ventaro AI storefront server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API.
  Serve,

  /// Insert the default product catalog and optionally an admin profile.
  Seed {
    /// Create this admin if missing. The password is read from stdin.
    #[arg(long)]
    admin_email: Option<String>,

    #[arg(long, default_value = "Ventaro Admin")]
    admin_name: String,

    /// Overwrite products that already exist.
    #[arg(long)]
    force: bool,
  },

  /// Re-map every purchase's product code from its Stripe product name.
  Reconcile {
    /// Print the planned fixes without writing them.
    #[arg(long)]
    dry_run: bool,
  },

  /// Print the argon2 hash for a password entered on stdin.
  HashPassword,

  /// Send the test template through the configured mail provider.
  SendTestEmail {
    to: String,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let load = || ServerConfig::load(&cli.config).context("failed to load configuration");

  match cli.command {
    Command::Serve => serve(load()?).await,
    Command::Seed { admin_email, admin_name, force } => {
      seed(&load()?, admin_email, admin_name, force).await
    }
    Command::Reconcile { dry_run } => reconcile(&load()?, dry_run).await,
    Command::HashPassword => {
      let password = read_password()?;
      println!("{}", ventaro_api::auth::hash_password(&password)?);
      Ok(())
    }
    Command::SendTestEmail { to } => send_test_email(&load()?, &to).await,
  }
}

async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
  let store = open_store(&cfg).await?;
  let state = build_state(&cfg, store)?;
  let app = ventaro_api::app(state);
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

async fn seed(
  cfg: &ServerConfig,
  admin_email: Option<String>,
  admin_name: String,
  force: bool,
) -> anyhow::Result<()> {
  let store = open_store(cfg).await?;

  for product in default_products() {
    let exists = store.get_product(&product.id).await?.is_some();
    if exists && !force {
      tracing::info!(product_id = %product.id, "product exists; skipped");
      continue;
    }
    let product = store.upsert_product(product).await?;
    tracing::info!(product_id = %product.id, "product seeded");
  }

  let Some(email) = admin_email else {
    return Ok(());
  };
  anyhow::ensure!(is_plausible_email(&email), "{email} is not a valid email address");

  match store.get_profile_by_email(&email).await? {
    Some(profile) if profile.is_admin() => {
      tracing::info!(email = %profile.email, "admin already exists");
    }
    Some(profile) => {
      anyhow::bail!(
        "{} exists as a regular user; promote it in the database instead",
        profile.email
      );
    }
    None => {
      let password = read_password()?;
      anyhow::ensure!(
        password.chars().count() >= ventaro_api::account::MIN_PASSWORD_LEN,
        "password must be at least {} characters",
        ventaro_api::account::MIN_PASSWORD_LEN
      );
      let profile = store
        .create_profile(NewProfile {
          email,
          name: admin_name,
          password_hash: ventaro_api::auth::hash_password(&password)?,
          role: Role::Admin,
        })
        .await?;
      tracing::info!(email = %profile.email, "admin created");
    }
  }
  Ok(())
}

async fn reconcile(cfg: &ServerConfig, dry_run: bool) -> anyhow::Result<()> {
  let store = open_store(cfg).await?;

  let report = if dry_run {
    let purchases = store.list_purchases(&PurchaseFilter::default()).await?;
    plan_reconciliation(&purchases)
  } else {
    catalog::reconcile(&store).await?
  };

  tracing::info!(
    examined = report.examined,
    fixes = report.fixes.len(),
    unmapped = report.unmapped.len(),
    dry_run,
    "reconciliation finished"
  );
  println!("{}", serde_json::to_string_pretty(&report)?);
  Ok(())
}

async fn send_test_email(cfg: &ServerConfig, to: &str) -> anyhow::Result<()> {
  anyhow::ensure!(is_plausible_email(to), "{to} is not a valid email address");
  let mailer = SendGridMailer::new(cfg.sendgrid.clone())?;

  match mailer.send(&templates::test_email(to)).await {
    Ok(()) => {
      tracing::info!(to, "test email sent");
      Ok(())
    }
    Err(MailError::Disabled) => anyhow::bail!("sendgrid.api_key is not configured"),
    Err(e) => Err(e).context("test email failed"),
  }
}

/// Read one line from stdin as a password.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
