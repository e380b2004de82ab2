use std::sync::Arc;

use anyhow::{bail, Context};
use arcade_registry::UserInput;
use arcade_server::{signed_image_urls, AppState, ArcadeServer, ServerConfig};
use arcade_store::InMemoryDocumentStore;
use arcade_types::SystemClock;
use colored::Colorize;
use tracing::debug;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    debug!(?config, "loaded configuration");
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::Users(UsersArgs {
            action: UsersAction::List,
        }) => cmd_users_list(config, &cli.format).await,
        Command::Users(UsersArgs {
            action: UsersAction::Add(args),
        }) => cmd_users_add(config, args, &cli.format).await,
        Command::Images => cmd_images(config, &cli.format).await,
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let config = match &cli.config {
        Some(path) => ServerConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ServerConfig::from_env().context("loading configuration from environment")?,
    };
    Ok(config)
}

async fn cmd_serve(config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    let server = if args.in_memory {
        let signer = config.signer()?;
        let state = AppState::new(
            config,
            Arc::new(InMemoryDocumentStore::new()),
            signer,
            Arc::new(SystemClock),
        );
        ArcadeServer::with_state(state)
    } else {
        ArcadeServer::new(config)?
    };

    let mode = if args.in_memory { "in-memory" } else { "filesystem" };
    println!(
        "{} Arcade server on {} ({} store, origin {})",
        "✓".green().bold(),
        server.config().bind_addr.to_string().bold(),
        mode,
        server.config().allowed_origin.cyan()
    );
    server.serve().await?;
    Ok(())
}

async fn cmd_users_list(config: ServerConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let users = state.registry.list_safe().await?;

    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({ "users": users, "count": users.len() });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            if users.is_empty() {
                println!("No users.");
            }
            for user in &users {
                println!(
                    "{}  {} {}  born {}  likes {}",
                    user.id.to_string().yellow(),
                    user.first_name.bold(),
                    user.surname.bold(),
                    user.birthday,
                    user.favourite_colour.cyan()
                );
            }
            println!("{} users", users.len().to_string().bold());
        }
    }
    Ok(())
}

async fn cmd_users_add(
    config: ServerConfig,
    args: AddUserArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let input = UserInput {
        first_name: Some(args.first_name),
        surname: Some(args.surname),
        birthday: Some(args.birthday),
        favourite_colour: Some(args.colour),
        favourite_number: Some(args.number),
    };
    let user = state.registry.append(input).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&user)?),
        OutputFormat::Text => {
            println!("{} User added", "✓".green().bold());
            println!("  Id: {}", user.id.to_string().yellow());
            println!("  Name: {} {}", user.first_name, user.surname);
            println!("  Created: {}", user.created_at.dimmed());
        }
    }
    Ok(())
}

/// Signed URLs are only useful if the server verifies them with the same
/// secret, so a per-process random one is refused here.
fn require_signing_secret(config: &ServerConfig) -> anyhow::Result<()> {
    if config.signing_secret.is_none() {
        bail!(
            "no signing secret configured: set URL_SIGNING_SECRET (or signing_secret in the \
             config file) to the value the server uses"
        );
    }
    Ok(())
}

async fn cmd_images(config: ServerConfig, format: &OutputFormat) -> anyhow::Result<()> {
    require_signing_secret(&config)?;
    let state = AppState::from_config(config)?;
    let urls = signed_image_urls(&state).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&urls)?),
        OutputFormat::Text => {
            if urls.image_urls.is_empty() {
                println!("No images available.");
            }
            for (key, url) in &urls.image_urls {
                println!("{}  {}", key.bold(), url.blue());
            }
            println!("Links expire in {}s", urls.expires_in);
        }
    }
    Ok(())
}
