//! PageLock CLI - Command line interface for password-protected pages.
//!
//! This tool seals page content into an encrypted payload, unlocks a
//! payload the way a viewer's page would, and forgets cached keys.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use pagelock_common::{PageId, Password};
use pagelock_crypto::{
    seal, with_sentinel, CryptoSuite, DecryptedContent, PagePayload, SaltPair, SENTINEL,
};
use pagelock_session::{
    KeyCache, Messages, PageConfig, PageHost, RenderPolicy, SessionController, SessionOptions,
    SessionState, UnlockOutcome,
};
use pagelock_storage::{KeyValueStore, StoreConfig};

#[derive(Parser)]
#[command(name = "pagelock")]
#[command(about = "PageLock - Password-protected page content")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt page content into a payload.
    Seal {
        /// File holding the page markup.
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the payload JSON.
        #[arg(short, long)]
        output: PathBuf,

        /// Use the fixed legacy salts instead of fresh random ones.
        #[arg(long)]
        legacy_salts: bool,
    },

    /// Unlock a payload, using cached keys when available.
    Unlock {
        /// Payload JSON written by `seal`.
        #[arg(short = 'f', long)]
        payload: PathBuf,

        /// Page path the payload is published under.
        #[arg(short, long)]
        page: String,

        /// Directory of the key cache.
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Print content before its hash is checked.
        #[arg(long)]
        optimistic: bool,

        /// Password attempts before giving up.
        #[arg(long, default_value_t = 3)]
        attempts: u32,
    },

    /// Forget the cached keys of a page.
    Relock {
        /// Page path.
        #[arg(short, long)]
        page: String,

        /// Directory of the key cache.
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
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
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Seal {
            input,
            output,
            legacy_salts,
        } => cmd_seal(&input, &output, legacy_salts).await,

        Commands::Unlock {
            payload,
            page,
            cache_dir,
            optimistic,
            attempts,
        } => cmd_unlock(&payload, &page, cache_dir, optimistic, attempts).await,

        Commands::Relock { page, cache_dir } => cmd_relock(&page, cache_dir).await,
    }
}

/// Prints content to stdout and alerts to stderr.
struct TerminalHost;

impl PageHost for TerminalHost {
    fn render(&self, content: &DecryptedContent) {
        println!("{}", content.body());
    }

    fn content_unlocked(&self) {
        debug!("Content unlocked");
    }

    fn alert(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn integrity_result(&self, authentic: bool) {
        debug!(authentic, "Integrity checked");
    }
}

/// Prompt for password securely.
fn prompt_password(prompt: &str) -> Result<Password> {
    let password = rpassword::prompt_password(prompt).context("Failed to read password")?;
    Ok(Password::new(password))
}

/// Prefix markup with the sentinel unless it already carries it.
fn ensure_sentinel(markup: &str) -> String {
    if markup.starts_with(SENTINEL) {
        markup.to_string()
    } else {
        with_sentinel(markup)
    }
}

fn cache_root(cache_dir: Option<PathBuf>) -> Result<PathBuf> {
    match cache_dir {
        Some(dir) => Ok(dir),
        None => dirs::cache_dir()
            .map(|dir| dir.join("pagelock"))
            .context("No cache directory on this platform; pass --cache-dir"),
    }
}

fn open_store(cache_dir: Option<PathBuf>) -> Result<Arc<dyn KeyValueStore>> {
    let root = cache_root(cache_dir)?;
    debug!(root = %root.display(), "Opening key cache");

    StoreConfig::Local { root }
        .open()
        .context("Failed to open key cache")
}

/// Seal page markup.
async fn cmd_seal(input: &Path, output: &Path, legacy_salts: bool) -> Result<()> {
    info!("Sealing {}", input.display());

    let markup = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let password = prompt_password("Enter password: ")?;
    let confirm = prompt_password("Confirm password: ")?;

    if password.as_bytes() != confirm.as_bytes() {
        anyhow::bail!("Passwords do not match");
    }

    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    let salts = if legacy_salts {
        SaltPair::legacy()
    } else {
        SaltPair::generate()
    };

    let payload = seal(
        &CryptoSuite::software(),
        &password,
        &ensure_sentinel(&markup),
        &salts,
    )
    .await
    .context("Failed to seal content")?;

    std::fs::write(output, payload.to_json()?)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Payload written to {}", output.display());
    Ok(())
}

/// Unlock a payload.
async fn cmd_unlock(
    payload_path: &Path,
    page: &str,
    cache_dir: Option<PathBuf>,
    optimistic: bool,
    attempts: u32,
) -> Result<()> {
    let json = std::fs::read_to_string(payload_path)
        .with_context(|| format!("Failed to read {}", payload_path.display()))?;
    let payload = PagePayload::from_json(&json).context("Invalid payload")?;

    let render_policy = if optimistic {
        RenderPolicy::Optimistic
    } else {
        RenderPolicy::VerifyFirst
    };

    let context = PageConfig {
        page: PageId::new(page).context("Invalid page path")?,
        payload,
        messages: Messages::default(),
        options: SessionOptions { render_policy },
    }
    .into_context()
    .context("Invalid payload")?;

    let mut session = SessionController::new(
        context,
        open_store(cache_dir)?,
        CryptoSuite::software(),
        Arc::new(TerminalHost),
    );
    debug!(session = session.handle().as_str(), "Session started");

    if session.start().await == SessionState::Unlocked {
        return Ok(());
    }

    for _ in 0..attempts {
        let password = prompt_password("Password: ")?;
        match session.submit(password).await {
            UnlockOutcome::Unlocked => return Ok(()),
            UnlockOutcome::IntegrityMismatch => break,
            UnlockOutcome::WrongPassword | UnlockOutcome::Ignored => {}
        }
    }

    anyhow::bail!("Page is still locked")
}

/// Forget cached keys.
async fn cmd_relock(page: &str, cache_dir: Option<PathBuf>) -> Result<()> {
    let page = PageId::new(page).context("Invalid page path")?;
    let cache = KeyCache::new(open_store(cache_dir)?, page.clone());

    cache.clear().await.context("Failed to clear cached keys")?;

    println!("Relocked {}", page);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_sentinel_adds_prefix_once() {
        let wrapped = ensure_sentinel("<p>hi</p>");
        assert_eq!(wrapped, "<hbe-prefix></hbe-prefix><p>hi</p>");
        assert_eq!(ensure_sentinel(&wrapped), wrapped);
    }

    #[test]
    fn test_explicit_cache_dir_wins() {
        let dir = PathBuf::from("/tmp/pagelock-test");
        assert_eq!(cache_root(Some(dir.clone())).unwrap(), dir);
    }

    #[tokio::test]
    async fn test_relock_clears_record() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = open_store(Some(temp.path().to_path_buf())).unwrap();
        store
            .set("hexo-blog-encrypt:#/posts/a/", "{}".to_string())
            .await
            .unwrap();

        cmd_relock("/posts/a/", Some(temp.path().to_path_buf()))
            .await
            .unwrap();

        assert!(!store.contains("hexo-blog-encrypt:#/posts/a/").await.unwrap());
    }
}
