//! Watch command - the long-running notifier.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::plex::PlexClient;
use crate::scheduler::{SchedulerTiming, UpdateScheduler};
use crate::watcher::{LibraryWatcher, PathFilter};

use super::sections::{fetch_sections, resolve_table};

/// Arguments for the watch command.
pub struct WatchArgs {
    pub insecure: bool,
    pub pidfile: Option<PathBuf>,
}

/// Run until a shutdown signal or a watcher failure.
///
/// Startup problems are returned before any task is started. A signal
/// during startup stops it cleanly.
pub async fn run(args: WatchArgs, mut settings: Settings) -> Result<()> {
    if args.insecure {
        settings.plex.insecure = true;
    }
    settings.validate()?;

    // Installed before anything needs cleaning up
    let mut shutdown = ShutdownSignal::install().context("Failed to listen for signals")?;

    let _pidfile = args.pidfile.as_deref().map(PidFile::create).transpose()?;

    let (scheduler, watcher) = tokio::select! {
        biased;
        _ = shutdown.recv() => {
            crate::log_event!("notifier", "exiting", "during startup");
            return Ok(());
        }
        started = start(&settings) => started?,
    };

    let cancel = CancellationToken::new();
    let scheduler_task = scheduler.spawn(cancel.clone());
    let mut watch_task = tokio::spawn(watcher.watch(cancel.clone()));

    let finished = tokio::select! {
        _ = shutdown.recv() => {
            crate::log_event!("notifier", "exiting");
            None
        }
        joined = &mut watch_task => Some(joined),
    };

    cancel.cancel();
    let watch_result = match finished {
        Some(joined) => joined,
        None => watch_task.await,
    };

    scheduler_task.await.context("Scheduler task panicked")?;
    watch_result
        .context("Watcher task panicked")?
        .context("Watcher stopped unexpectedly")?;

    Ok(())
}

/// List sections, resolve the watch table and register every root.
async fn start(settings: &Settings) -> Result<(UpdateScheduler, LibraryWatcher)> {
    let client = PlexClient::new(&settings.plex).context("Failed to build HTTP client")?;
    let sections = fetch_sections(&client).await?;
    crate::log_event!("notifier", "server sections", "{}", sections.len());

    let table = resolve_table(settings, &sections)?;

    let scheduler = UpdateScheduler::new(
        Arc::new(client),
        SchedulerTiming::from(&settings.scheduler),
    );

    let watcher = LibraryWatcher::builder()
        .filter(PathFilter::new(&settings.allowed_extensions))
        .table(table)
        .scheduler(scheduler.handle())
        .build()
        .context("Failed to start watching library roots")?;

    Ok((scheduler, watcher))
}

/// SIGTERM and Ctrl-C, registered up front so neither falls back to the
/// default handler once installed.
struct ShutdownSignal {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
}

impl ShutdownSignal {
    #[cfg(unix)]
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            terminate: signal(SignalKind::terminate())?,
            interrupt: signal(SignalKind::interrupt())?,
        })
    }

    #[cfg(not(unix))]
    fn install() -> std::io::Result<Self> {
        Ok(Self {})
    }

    /// Resolves on the next SIGTERM or Ctrl-C.
    #[cfg(unix)]
    async fn recv(&mut self) {
        tokio::select! {
            _ = self.terminate.recv() => {}
            _ = self.interrupt.recv() => {}
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("[notifier] failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    }
}

/// PID file that is removed again when dropped.
#[derive(Debug)]
struct PidFile {
    path: PathBuf,
}

impl PidFile {
    fn create(path: &Path) -> Result<Self> {
        fs::write(path, format!("{}\n", std::process::id()))
            .with_context(|| format!("Failed to write PID file {}", path.display()))?;
        crate::debug_event!("notifier", "pid file", "{}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("[notifier] failed to remove PID file {}: {e}", self.path.display());
        }
    }
}
