//! Watch mode: re-evaluate whenever the script or input file changes.
//!
//! The parent directories are watched rather than the files themselves so
//! editors that save by rename keep triggering events. Bursts of events are
//! collapsed over the debounce window, then each changed file is re-read and
//! submitted as an edit. Every published view is presented as it arrives;
//! stale results never reach the presenter because the orchestrator drops
//! them.

use crate::presenter::Presenter;
use anyhow::Context;
use notify::{EventKind, RecursiveMode, Watcher as _};
use splice_runtime::Session;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The two files a session is built from.
#[derive(Debug, Clone)]
pub struct WatchPaths {
    pub script: PathBuf,
    pub input: PathBuf,
}

impl WatchPaths {
    /// Canonicalizes both paths so they compare equal to event paths.
    pub fn resolve(script: &Path, input: &Path) -> anyhow::Result<Self> {
        let canonical = |path: &Path| {
            std::fs::canonicalize(path)
                .with_context(|| format!("failed to resolve {}", path.display()))
        };
        Ok(Self {
            script: canonical(script)?,
            input: canonical(input)?,
        })
    }

    fn directories(&self) -> BTreeSet<PathBuf> {
        [&self.script, &self.input]
            .into_iter()
            .filter_map(|path| path.parent().map(Path::to_path_buf))
            .collect()
    }
}

/// Which of the watched files an event batch touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Touched {
    pub script: bool,
    pub input: bool,
}

impl Touched {
    fn is_empty(self) -> bool {
        !self.script && !self.input
    }

    /// Folds one event into the batch.
    pub fn record(&mut self, event: &notify::Event, paths: &WatchPaths) {
        if !matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ) {
            return;
        }
        for path in &event.paths {
            if *path == paths.script {
                self.script = true;
            }
            if *path == paths.input {
                self.input = true;
            }
        }
    }
}

/// Runs until Ctrl-C or until the orchestrator stops.
pub async fn run<O: Write, E: Write>(
    mut session: Session,
    presenter: &mut Presenter<O, E>,
    paths: WatchPaths,
    debounce: Duration,
) -> anyhow::Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let _ = event_tx.send(res);
    })
    .context("failed to create file watcher")?;

    for dir in paths.directories() {
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", dir.display()))?;
        debug!(dir = %dir.display(), "watching");
    }

    let mut views = session.handle().subscribe();
    session.refresh();
    info!(
        script = %paths.script.display(),
        input = %paths.input.display(),
        "watching for changes (Ctrl-C to stop)"
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                debug!("interrupted");
                break;
            }

            changed = views.changed() => {
                if changed.is_err() {
                    debug!("orchestrator stopped");
                    break;
                }
                let view = views.borrow_and_update().clone();
                presenter.present(&view)?;
            }

            event = event_rx.recv() => {
                let Some(first) = event else { break };
                let mut touched = Touched::default();
                absorb(first, &mut touched, &paths);

                // Collapse the burst.
                while let Ok(Some(next)) = tokio::time::timeout(debounce, event_rx.recv()).await {
                    absorb(next, &mut touched, &paths);
                }

                if !touched.is_empty() {
                    reload(&mut session, touched, &paths);
                }
            }
        }
    }

    session.handle().shutdown();
    Ok(())
}

fn absorb(event: notify::Result<notify::Event>, touched: &mut Touched, paths: &WatchPaths) {
    match event {
        Ok(event) => touched.record(&event, paths),
        Err(e) => warn!(error = %e, "file watcher error"),
    }
}

fn reload(session: &mut Session, touched: Touched, paths: &WatchPaths) {
    if touched.script {
        if let Some(text) = read_changed(&paths.script, session.script().text()) {
            let sequence = session.edit_script(text);
            debug!(%sequence, "script reloaded");
        }
    }
    if touched.input {
        if let Some(text) = read_changed(&paths.input, session.input().text()) {
            let sequence = session.edit_input(text);
            debug!(%sequence, "input reloaded");
        }
    }
}

/// Reads `path`, returning `None` when unreadable or identical to `current`.
fn read_changed(path: &Path, current: &str) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) if text == current => None,
        Ok(text) => Some(text),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to re-read file");
            None
        }
    }
}
