//! sessionkit - command-line host for the session store.
//!
//! The OS keychain serves as the durable token tier and a file in the
//! runtime directory as the session tier, so a login without `--remember`
//! lasts until the desktop session ends.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use sessionkit_core::auth::{FileStorage, KeyringStorage, LoggingNavigator};
use sessionkit_core::config::APP_NAME;
use sessionkit_core::{ApiClient, Config, HostContext, LoginRequest, SessionStore};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File holding the session tier inside the runtime directory
const SESSION_TIER_FILE: &str = "session-storage.json";

/// Log file (`sessionkit.log`) inside the cache directory
const LOG_FILE_PREFIX: &str = "sessionkit";
const LOG_FILE_SUFFIX: &str = "log";

const USAGE: &str = "\
Usage: sessionkit <command>

Commands:
  login <email> [--remember] [--otp]   Log in with a password (or OTP) prompt
  set-token <token> [--remember]       Store an existing token
  whoami                               Restore the session and show the profile
  logout                               End the session
  config                               Print the active configuration
  route <path>                         Resolve an app route under the base path
  proxy <path>                         Resolve a dev-proxy request path";

/// Log file appender in `dir`, or `None` if the directory cannot be created.
fn file_appender(dir: PathBuf) -> Option<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(dir)
        .ok()
}

/// Initialize the tracing subscriber for logging.
/// The returned guard flushes the file writer when dropped.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // Without a usable cache dir, log to stderr only
    let appender = config.cache_dir().ok().and_then(file_appender);
    let (file_layer, guard) = match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn build_store(config: &Config) -> Result<SessionStore<ApiClient>> {
    let api = ApiClient::new(config.api_base.as_str())?;
    let host = HostContext::new(
        Arc::new(KeyringStorage::new(APP_NAME)),
        Arc::new(FileStorage::new(config.session_dir()?.join(SESSION_TIER_FILE))),
        Arc::new(LoggingNavigator::new(config.base_path.as_str())),
    );
    Ok(SessionStore::new(api, Some(host)))
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn positional(args: &[String], index: usize, name: &str) -> Result<String> {
    args.iter()
        .filter(|a| !a.starts_with("--"))
        .nth(index)
        .cloned()
        .with_context(|| format!("Missing <{}>\n\n{}", name, USAGE))
}

fn print_session(store: &SessionStore<ApiClient>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&store.snapshot())?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;
    let _guard = init_tracing(&config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().cloned() else {
        println!("{}", USAGE);
        return Ok(());
    };
    let rest = &args[1..];

    info!(command = %command, api_base = %config.api_base, "sessionkit starting");

    match command.as_str() {
        "login" => {
            let email = positional(rest, 0, "email")?;
            let remember = has_flag(rest, "--remember");
            let request = if has_flag(rest, "--otp") {
                let otp = rpassword::prompt_password("OTP: ")?;
                LoginRequest::with_otp(email, otp.trim(), remember)
            } else {
                let password = rpassword::prompt_password("Password: ")?;
                LoginRequest::with_password(email, password, remember)
            };

            let store = build_store(&config)?;
            store.login(&request).await?;
            if store.user().is_none() {
                bail!("Logged in, but the profile could not be loaded; session cleared");
            }
            print_session(&store)?;
        }
        "set-token" => {
            let token = positional(rest, 0, "token")?;
            let store = build_store(&config)?;
            store.set_token(token, has_flag(rest, "--remember"))?;
            store.fetch_user().await;
            if !store.is_authenticated() {
                bail!("Token was rejected by the server");
            }
            print_session(&store)?;
        }
        "whoami" => {
            let store = build_store(&config)?;
            match store.initialize()? {
                Some(fetch) => {
                    fetch.await.context("Profile fetch task failed")?;
                    if store.is_authenticated() {
                        print_session(&store)?;
                    } else {
                        println!("Session expired");
                    }
                }
                None => println!("Not logged in"),
            }
        }
        "logout" => {
            build_store(&config)?.logout()?;
            println!("Logged out");
        }
        "config" => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        "route" => {
            let path = positional(rest, 0, "path")?;
            println!("{}", config.app_path(&path));
        }
        "proxy" => {
            let path = positional(rest, 0, "path")?;
            match config.proxy_target(&path) {
                Some(target) => println!("{}", target),
                None => bail!("No dev proxy rule matches {}", path),
            }
        }
        "help" | "--help" | "-h" => println!("{}", USAGE),
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positional_skips_flags() {
        let rest = args(&["--remember", "a@b.com"]);
        assert_eq!(positional(&rest, 0, "email").unwrap(), "a@b.com");
        assert!(positional(&rest, 1, "extra").is_err());
    }

    #[test]
    fn test_file_appender_in_writable_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(file_appender(dir.path().join("logs")).is_some());
    }

    #[test]
    fn test_file_appender_unusable_dir_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        assert!(file_appender(blocker.join("logs")).is_none());
    }

    #[test]
    fn test_has_flag() {
        let rest = args(&["a@b.com", "--otp"]);
        assert!(has_flag(&rest, "--otp"));
        assert!(!has_flag(&rest, "--remember"));
    }
}
