//! LegacyPrime CLI - a command-line client for the LegacyPrime platform.
//!
//! Logs in against the platform API, keeps the session in the OS keychain
//! (or a session file), and prints account, dashboard and transaction data.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tokio::sync::broadcast::{self, error::TryRecvError};

use legacyprime_core::api::{ApiClient, ApiError, HealthMonitor};
use legacyprime_core::auth::{
    CredentialStore, FileCredentialStore, KeyringCredentialStore, SessionEvent,
};
use legacyprime_core::config::{Config, CredentialBackend};
use legacyprime_core::models::{format_amount, TransactionFilter, TransactionKind, TransactionStatus};

/// Environment variable holding the passphrase that seals the session file
const SESSION_PASSPHRASE_ENV: &str = "LEGACYPRIME_SESSION_PASSPHRASE";

const USAGE: &str = "\
Usage: legacyprime <command> [options]

Commands:
  login [email]          Log in and store the session
  logout                 End the session
  profile                Show the current user
  dashboard              Show balance and 30-day activity
  transactions [--type deposit|withdrawal] [--status pending|approved|rejected]
                         List deposits and withdrawals
  notifications          List notifications
  health [--warmup]      Check that the backend is reachable (--warmup waits
                         for a sleeping backend to start)

Environment:
  LEGACYPRIME_API_BASE_URL, LEGACYPRIME_ENV, LEGACYPRIME_TIMEOUT_SECS,
  LEGACYPRIME_SESSION_PASSPHRASE, RUST_LOG";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprintln!("{}", USAGE);
        return Ok(());
    };
    if matches!(command, "help" | "--help" | "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = Config::load().context("Failed to load config")?;
    let store = open_store(&config)?;
    let client = ApiClient::new(config.client_config(), store)?;
    info!(base_url = client.base_url(), "LegacyPrime CLI starting");
    let mut session_events = client.subscribe();

    let result = match command {
        "login" => login(&client, &mut config, args.get(1).map(String::as_str)).await,
        "logout" => {
            client.logout().await;
            println!("Logged out.");
            Ok(())
        }
        "profile" => profile(&client).await,
        "dashboard" => dashboard(&client).await,
        "transactions" => transactions(&client, &args[1..]).await,
        "notifications" => notifications(&client).await,
        "health" => health(&client, &args[1..]).await,
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    };

    if session_lost(&mut session_events) {
        eprintln!("Your session has expired. Run `legacyprime login` again.");
    }
    if let Err(e) = &result {
        if let Some(api_error) = e.downcast_ref::<ApiError>() {
            report_api_error(api_error);
            std::process::exit(1);
        }
    }
    result
}

fn open_store(config: &Config) -> Result<Arc<dyn CredentialStore>> {
    match config.credential_backend {
        CredentialBackend::Keyring => Ok(Arc::new(KeyringCredentialStore::new()?)),
        CredentialBackend::File => {
            let cache_dir = config.cache_dir()?;
            let store = match std::env::var(SESSION_PASSPHRASE_ENV) {
                Ok(passphrase) if !passphrase.is_empty() => {
                    FileCredentialStore::open_sealed(&cache_dir, &passphrase)?
                }
                _ => FileCredentialStore::open(&cache_dir)?,
            };
            info!(path = %store.path().display(), "Using session file");
            Ok(Arc::new(store))
        }
    }
}

/// Whether the backend ended the session while the command ran.
fn session_lost(events: &mut broadcast::Receiver<SessionEvent>) -> bool {
    let mut lost = false;
    loop {
        match events.try_recv() {
            Ok(event) => lost |= event == SessionEvent::AuthenticationLost,
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty | TryRecvError::Closed) => return lost,
        }
    }
}

fn report_api_error(err: &ApiError) {
    eprintln!("Error: {}", err.message);
    for (field, messages) in err.field_errors() {
        eprintln!("  {}: {}", field, messages.join(" "));
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

async fn login(client: &ApiClient, config: &mut Config, email: Option<&str>) -> Result<()> {
    let email = match email {
        Some(email) => email.to_string(),
        None => match config.last_email.as_deref() {
            Some(last) => {
                let entered = prompt(&format!("Email [{}]: ", last))?;
                if entered.is_empty() { last.to_string() } else { entered }
            }
            None => prompt("Email: ")?,
        },
    };
    if email.is_empty() {
        bail!("Email is required");
    }
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    let user = client.login(&email, &password).await?;
    config.last_email = Some(email);
    config.save().context("Failed to save config")?;
    println!("Logged in as {} <{}>", user.full_name(), user.email);
    Ok(())
}

async fn profile(client: &ApiClient) -> Result<()> {
    let user = client.profile().await?;
    println!("{} <{}>", user.full_name(), user.email);
    println!("  Username: {}", user.username);
    let details = [
        ("Mobile", &user.mobile),
        ("Address", &user.address),
        ("City", &user.city),
        ("State", &user.state),
        ("Zip code", &user.zip_code),
        ("Country", &user.country),
    ];
    for (label, value) in details {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            println!("  {}: {}", label, value);
        }
    }
    Ok(())
}

async fn dashboard(client: &ApiClient) -> Result<()> {
    let (summary, performance) =
        futures::future::try_join(client.dashboard_summary(), client.dashboard_performance()).await?;

    println!("Balance:     ${}", format_amount(&summary.total_balance));
    println!("Deposits:    ${}", format_amount(&summary.total_deposits));
    println!("Withdrawals: ${}", format_amount(&summary.total_withdrawals));

    if !performance.deposits.is_empty() || !performance.withdrawals.is_empty() {
        println!("\nLast 30 days:");
        for day in &performance.deposits {
            println!("  {}  deposit     ${}", day.day, format_amount(&day.total));
        }
        for day in &performance.withdrawals {
            println!("  {}  withdrawal  ${}", day.day, format_amount(&day.total));
        }
    }
    Ok(())
}

fn parse_filter(args: &[String]) -> Result<TransactionFilter> {
    let mut filter = TransactionFilter::default();
    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .with_context(|| format!("Missing value for {}", flag))?;
        match flag.as_str() {
            "--type" => {
                filter.kind = Some(match value.as_str() {
                    "deposit" => TransactionKind::Deposit,
                    "withdrawal" => TransactionKind::Withdrawal,
                    other => bail!("Unknown transaction type: {}", other),
                })
            }
            "--status" => {
                filter.status = Some(match value.as_str() {
                    "pending" => TransactionStatus::Pending,
                    "approved" => TransactionStatus::Approved,
                    "rejected" => TransactionStatus::Rejected,
                    other => bail!("Unknown status: {}", other),
                })
            }
            other => bail!("Unknown option: {}", other),
        }
    }
    Ok(filter)
}

async fn transactions(client: &ApiClient, args: &[String]) -> Result<()> {
    let filter = parse_filter(args)?;
    let list = client.transactions(filter).await?;
    let entries = list.entries();
    if entries.is_empty() {
        println!("No transactions.");
        return Ok(());
    }
    for entry in entries {
        println!(
            "{}  {:<10}  {:<8}  {}",
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.kind.as_str(),
            entry.status,
            entry.status_message()
        );
    }
    Ok(())
}

async fn notifications(client: &ApiClient) -> Result<()> {
    let items = client.notifications().await?;
    if items.is_empty() {
        println!("No notifications.");
    }
    for item in items {
        let marker = if item.is_read { " " } else { "*" };
        println!("{} [{}] {}", marker, item.id, item.headline());
    }
    Ok(())
}

async fn health(client: &ApiClient, args: &[String]) -> Result<()> {
    let monitor = HealthMonitor::new(client.clone());
    match args.first().map(String::as_str) {
        Some("--warmup") => {
            println!("Waking {} ...", client.base_url());
            // The error is reflected in the recorded status
            let _ = monitor.warmup().await;
        }
        Some(other) => bail!("Unknown option: {}", other),
        None => {
            monitor.check().await;
        }
    }

    let status = monitor.status();
    let state = if status.is_healthy { "up" } else { "down" };
    match status.message {
        Some(message) => println!("{} is {}: {}", client.base_url(), state, message),
        None => println!("{} is {}", client.base_url(), state),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_filter() {
        let filter = parse_filter(&args(&["--type", "deposit", "--status", "approved"])).unwrap();
        assert_eq!(filter.kind, Some(TransactionKind::Deposit));
        assert_eq!(filter.status, Some(TransactionStatus::Approved));

        let empty = parse_filter(&[]).unwrap();
        assert!(empty.kind.is_none() && empty.status.is_none());
    }

    #[tokio::test]
    async fn test_session_lost_is_seen_without_waiting() {
        let (tx, mut rx) = broadcast::channel(4);
        assert!(!session_lost(&mut rx));

        tx.send(SessionEvent::TokensRefreshed).unwrap();
        tx.send(SessionEvent::AuthenticationLost).unwrap();
        assert!(session_lost(&mut rx));
        assert!(!session_lost(&mut rx));
    }

    #[test]
    fn test_parse_filter_errors() {
        assert!(parse_filter(&args(&["--type"])).is_err());
        assert!(parse_filter(&args(&["--type", "loan"])).is_err());
        assert!(parse_filter(&args(&["--colour", "red"])).is_err());
    }
}
