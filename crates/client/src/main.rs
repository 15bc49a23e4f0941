//! `bizops-session`: keep a terminal session alive against the backend.
//!
//! Loads the persisted session, validates it against the backend, prints the
//! user's landing page and permissions, then watches the session: every line
//! typed on stdin counts as keyboard activity. Exits when the session ends or
//! on Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use bizops_auth::{PermissionResolver, SessionStore};
use bizops_client::{
    ActivityEvent, AuthState, ClientConfig, FileStorage, HttpSessionCheck, SessionLifecycle,
    SessionWatcher, WatchExit,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bizops_observability::init();

    let config = ClientConfig::from_env().context("invalid BIZOPS_* configuration")?;
    tracing::info!(
        api_url = %config.api_url,
        session_file = %config.session_file.display(),
        "starting"
    );

    let storage = FileStorage::open(&config.session_file)
        .with_context(|| format!("failed to open session file {:?}", config.session_file))?;
    let lifecycle = Arc::new(SessionLifecycle::new(SessionStore::new(storage)));

    let checker = Arc::new(
        HttpSessionCheck::new(&config.api_url, config.session_cookie.clone(), config.check_timeout)
            .context("failed to build HTTP client")?,
    );

    if let AuthState::LoggedOut(_) = lifecycle.bootstrap(checker.as_ref()).await {
        println!("Not logged in. Sign in through the web app first.");
        return Ok(());
    }

    let resolver = PermissionResolver::new(lifecycle.store());
    let landing = resolver.default_route();
    if let Some(info) = resolver.user_display_info() {
        let role = info.role.as_ref().map(|r| r.as_str()).unwrap_or("none");
        let granted: Vec<&str> = info.permissions.granted().map(|p| p.as_str()).collect();
        println!("Logged in as {} <{}> ({role})", info.full_name, info.email);
        println!("Permissions: {}", granted.join(", "));
        println!("Landing page: {landing}");
    }

    let mut handle = SessionWatcher::new(lifecycle.clone(), checker, config.liveness)
        .start(landing)
        .context("failed to start session watcher")?;
    let activity = handle.activity();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let exit = loop {
        tokio::select! {
            exit = handle.join() => break exit,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break handle.stop().await;
            }
            line = lines.next_line() => match line {
                Ok(Some(_)) => {
                    activity.record(ActivityEvent::Key);
                }
                Ok(None) => {
                    tracing::debug!("stdin closed; idle timer keeps running");
                    break handle.join().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read stdin");
                }
            },
        }
    };

    match exit {
        WatchExit::LoggedOut(_) => {
            if let Some(notice) = lifecycle.state().notice() {
                println!("{}", notice.message);
            }
        }
        WatchExit::Stopped => println!("Session watcher stopped."),
    }

    Ok(())
}
