//! CLI for the Warden resource client.
//!
//! Each invocation is one handle lifetime. Output is JSON on stdout and
//! includes the handle's ticket so the next invocation can pass it back
//! with `--ticket`.

use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use std::time::Duration;
use warden_client::{ClientConfig, Resource, ResourceFactory};

#[derive(Parser, Debug)]
#[command(name = "warden", version, about = "Client for a ticket-locking resource server")]
struct Cli {
    #[command(flatten)]
    server: ServerArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct ServerArgs {
    #[arg(long, env = "WARDEN_SERVER_URI", global = true, default_value = "")]
    server_uri: String,

    #[arg(long, env = "WARDEN_API_KEY", global = true, default_value = "", hide_env_values = true)]
    api_key: String,

    /// Per-request timeout in seconds.
    #[arg(long, env = "WARDEN_TIMEOUT_SECS", global = true, default_value_t = 10)]
    timeout_secs: u64,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a resource on the server.
    Create {
        name: String,

        /// Server-side lock timeout in seconds.
        #[arg(long, default_value_t = 60)]
        timeout: u64,
    },

    /// Read a selector, optionally requesting the lock.
    Read {
        name: String,
        selector: String,

        #[arg(long, default_value_t = false)]
        lock: bool,

        #[arg(long)]
        ticket: Option<String>,
    },

    /// Request the lock on a selector.
    Lock {
        name: String,
        selector: String,

        /// Keep asking until granted or attempts run out.
        #[arg(long, default_value_t = false)]
        wait: bool,

        #[arg(long, default_value_t = 500)]
        interval_ms: u64,

        #[arg(long, default_value_t = 20)]
        max_attempts: u32,

        #[arg(long)]
        ticket: Option<String>,
    },

    /// Replace a selector's content with a JSON document.
    Write {
        name: String,
        selector: String,

        /// JSON payload.
        data: String,

        #[arg(long)]
        ticket: Option<String>,
    },

    /// Release the lock on a selector.
    Unlock {
        name: String,
        selector: String,

        #[arg(long)]
        ticket: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = ClientConfig::new(cli.server.server_uri, cli.server.api_key)
        .with_timeout(Duration::from_secs(cli.server.timeout_secs));
    let factory = ResourceFactory::new(config)?;

    let report = match cli.command {
        Commands::Create { name, timeout } => {
            let res = factory.create_resource(&name, timeout).await?;
            json!({ "resource": res.name(), "created": true, "timeout": timeout })
        }

        Commands::Read {
            name,
            selector,
            lock,
            ticket,
        } => {
            let mut res = handle(&factory, &name, ticket);
            let outcome = res.read(&selector, lock).await?;
            let status = if outcome.is_pending() { "pending" } else { "data" };
            let data = outcome.into_data().unwrap_or(Value::Null);
            json!({
                "resource": res.name(),
                "selector": selector,
                "outcome": status,
                "data": data,
                "ticket": res.current_ticket(),
            })
        }

        Commands::Lock {
            name,
            selector,
            wait,
            interval_ms,
            max_attempts,
            ticket,
        } => {
            let mut res = handle(&factory, &name, ticket);
            let max_attempts = if wait { max_attempts.max(1) } else { 1 };

            let mut attempts = 0u32;
            let acquired = loop {
                attempts += 1;
                let acquired = res.try_lock(&selector).await?;
                if acquired || attempts >= max_attempts {
                    break acquired;
                }
                tracing::info!(resource = %name, selector = %selector, attempts, "lock pending, retrying");
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            };

            json!({
                "resource": res.name(),
                "selector": selector,
                "locked": acquired,
                "attempts": attempts,
                "ticket": res.current_ticket(),
            })
        }

        Commands::Write {
            name,
            selector,
            data,
            ticket,
        } => {
            let payload: Value = serde_json::from_str(&data)?;
            let mut res = handle(&factory, &name, ticket);
            res.write(&selector, &payload).await?;
            json!({
                "resource": res.name(),
                "selector": selector,
                "written": true,
                "ticket": res.current_ticket(),
            })
        }

        Commands::Unlock {
            name,
            selector,
            ticket,
        } => {
            let mut res = handle(&factory, &name, ticket);
            res.unlock(&selector).await?;
            json!({
                "resource": res.name(),
                "selector": selector,
                "unlocked": true,
                "ticket": res.current_ticket(),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn handle(factory: &ResourceFactory, name: &str, ticket: Option<String>) -> Resource {
    match ticket {
        Some(ticket) => factory.resume_resource(name, ticket),
        None => factory.get_resource(name),
    }
}
