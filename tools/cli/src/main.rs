//! zkvault CLI - command line client for the zero-knowledge vault.
//!
//! Secrets are sealed locally with a key derived from the master password;
//! only cipher items are sent to the item service.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use zeroize::Zeroizing;

use zkvault_common::{Error, Identity, ItemId, SensitiveBytes};
use zkvault_crypto::{generate_password, GeneratorOptions, Meta};
use zkvault_store::ItemStore;
use zkvault_vault::{VaultConfig, VaultSession};

#[derive(Parser)]
#[command(name = "zkvault")]
#[command(about = "zkvault - zero-knowledge secret vault")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (JSON).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Item service base URL, overrides the configuration.
    #[arg(long, global = true)]
    api: Option<String>,

    /// Identity the master key is bound to.
    #[arg(short, long, global = true, env = "ZKVAULT_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a secret and store it.
    Put {
        /// Label stored in the item metadata.
        #[arg(short, long)]
        label: String,

        /// Read the secret from the first line of stdin instead of prompting.
        #[arg(long)]
        secret_stdin: bool,
    },

    /// List stored items (metadata only, nothing is decrypted).
    List,

    /// Decrypt and print a stored item.
    Get {
        /// Item id.
        id: String,
    },

    /// Delete a stored item.
    Rm {
        /// Item id.
        id: String,
    },

    /// Generate a random password.
    Generate {
        /// Password length (4 to 64).
        #[arg(short, long, default_value_t = 16)]
        length: usize,

        /// Exclude lowercase letters.
        #[arg(long)]
        no_lower: bool,

        /// Exclude uppercase letters.
        #[arg(long)]
        no_upper: bool,

        /// Exclude digits.
        #[arg(long)]
        no_digits: bool,

        /// Include symbols.
        #[arg(long)]
        symbols: bool,

        /// Also encrypt and store the generated password under this label.
        #[arg(long)]
        store: Option<String>,
    },

    /// Check that the item service is reachable.
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Put {
            label,
            secret_stdin,
        } => cmd_put(&cli, &config, label, *secret_stdin).await,

        Commands::List => cmd_list(&config).await,

        Commands::Get { id } => cmd_get(&cli, &config, id).await,

        Commands::Rm { id } => cmd_rm(&config, id).await,

        Commands::Generate {
            length,
            no_lower,
            no_upper,
            no_digits,
            symbols,
            store,
        } => {
            let options = GeneratorOptions {
                length: *length,
                lower: !no_lower,
                upper: !no_upper,
                digits: !no_digits,
                symbols: *symbols,
            };
            cmd_generate(&cli, &config, &options, store.as_deref()).await
        }

        Commands::Health => cmd_health(&config).await,
    }
}

fn load_config(cli: &Cli) -> Result<VaultConfig> {
    let mut config =
        VaultConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(api) = &cli.api {
        config.api_base = api.clone();
    }
    Ok(config)
}

fn identity(cli: &Cli) -> Result<Identity> {
    let user = cli
        .user
        .as_deref()
        .context("An identity is required: pass --user or set ZKVAULT_USER")?;
    Identity::new(user).context("Invalid identity")
}

/// Prompt for a secret without echo.
fn prompt_secret(prompt: &str) -> Result<SensitiveBytes> {
    let secret = rpassword::prompt_password(prompt).context("Failed to read from terminal")?;
    Ok(SensitiveBytes::from(secret))
}

/// Derive the key and open a session against the configured store.
fn open_session(cli: &Cli, config: &VaultConfig) -> Result<VaultSession> {
    let identity = identity(cli)?;
    let store = Arc::new(config.connect().context("Failed to configure item store")?);

    let password = prompt_secret("Master password: ")?;
    info!(user = %identity, "Deriving master key");

    VaultSession::unlock(
        identity,
        password.as_bytes(),
        config.kdf_params.clone(),
        store,
    )
    .context("Failed to derive master key")
}

fn item_meta(label: &str) -> Meta {
    let mut meta = Meta::new();
    meta.insert("label".to_string(), label.into());
    meta.insert(
        "createdAt".to_string(),
        chrono::Utc::now().to_rfc3339().into(),
    );
    meta
}

/// Encrypt and store a secret.
async fn cmd_put(cli: &Cli, config: &VaultConfig, label: &str, secret_stdin: bool) -> Result<()> {
    let session = open_session(cli, config)?;

    let mut secret = if secret_stdin {
        let mut line = Zeroizing::new(String::new());
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read secret from stdin")?;
        SensitiveBytes::from(line.trim_end_matches(['\r', '\n']))
    } else {
        prompt_secret("Secret: ")?
    };

    if secret.is_empty() {
        anyhow::bail!("Secret cannot be empty");
    }

    let id = session
        .encrypt_and_store(secret.as_mut_bytes(), Some(item_meta(label)))
        .await
        .context("Failed to store item")?;

    println!("{}", id);
    Ok(())
}

/// List stored items.
async fn cmd_list(config: &VaultConfig) -> Result<()> {
    let store = config.connect().context("Failed to configure item store")?;
    let items = store.list().await.context("Failed to list items")?;

    if items.is_empty() {
        println!("(no items)");
        return Ok(());
    }

    for item in items {
        let id = item.id.as_ref().map(|id| id.as_str()).unwrap_or("-");
        let created = item
            .meta
            .as_ref()
            .and_then(|meta| meta.get("createdAt"))
            .and_then(|value| value.as_str())
            .unwrap_or("");
        println!("{}  {}  {}", id, item.label().unwrap_or("(no label)"), created);
    }

    Ok(())
}

/// Decrypt and print an item.
async fn cmd_get(cli: &Cli, config: &VaultConfig, id: &str) -> Result<()> {
    let id = ItemId::new(id).context("Invalid item id")?;
    let session = open_session(cli, config)?;

    let plaintext = match session.get_and_decrypt(&id).await {
        Ok(plaintext) => plaintext,
        Err(Error::Authentication) => anyhow::bail!(
            "Could not open item {}: wrong master password, or the item was altered",
            id
        ),
        Err(e) => return Err(e).context("Failed to read item"),
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&plaintext)?;
    stdout.write_all(b"\n")?;
    Ok(())
}

/// Delete an item.
async fn cmd_rm(config: &VaultConfig, id: &str) -> Result<()> {
    let id = ItemId::new(id).context("Invalid item id")?;
    let store = config.connect().context("Failed to configure item store")?;

    store.delete(&id).await.context("Failed to delete item")?;

    println!("Deleted {}", id);
    Ok(())
}

/// Generate a password and optionally store it.
async fn cmd_generate(
    cli: &Cli,
    config: &VaultConfig,
    options: &GeneratorOptions,
    store_label: Option<&str>,
) -> Result<()> {
    let password = generate_password(options).context("Failed to generate password")?;
    println!("{}", password.as_str());

    if let Some(label) = store_label {
        let session = open_session(cli, config)?;
        let mut bytes = SensitiveBytes::from(password.as_str());
        let id = session
            .encrypt_and_store(bytes.as_mut_bytes(), Some(item_meta(label)))
            .await
            .context("Failed to store generated password")?;
        println!("Stored as {}", id);
    }

    Ok(())
}

/// Check the item service health endpoint.
async fn cmd_health(config: &VaultConfig) -> Result<()> {
    let store = config.connect().context("Failed to configure item store")?;
    store.health().await.context("Item service is not healthy")?;

    println!("{} is healthy", store.base());
    Ok(())
}
