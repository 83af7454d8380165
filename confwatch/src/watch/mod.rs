//! Source resolution, the initial load pass and filesystem watching.
//!
//! Starting a parser resolves every declared file and folder pattern into
//! [`ResolvedEntry`] values, loads each one, then (when any source asks for
//! hot reload) arms a `notify` watcher. Raw notify events travel over a
//! channel to a worker thread, which turns them into [`WatchEvent`]s,
//! invokes the caller's [`EventHandlers`] and reloads changed files.

mod events;
mod pattern;
mod session;

pub use events::{EventHandlers, WatchEvent};
pub use pattern::FolderPattern;

pub(crate) use session::Session;

use std::fmt;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use notify::{RecommendedWatcher, Watcher};

use crate::error::Result;
use crate::format::Parser;
use crate::loader::{LoadOverrides, Loader};
use crate::options::{ConfigParserOptions, WatchOptions};
use crate::validation::Validator;

/// Where a parser is in its start/stop cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// Not started, or stopped.
    #[default]
    Stopped,
    /// The initial load pass is running.
    Starting,
    /// Started; watching when any source is hot-reloaded.
    Watching,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Starting => write!(f, "starting"),
            Self::Watching => write!(f, "watching"),
        }
    }
}

/// A source after its flags have been resolved against the globals.
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    /// Normalized absolute path.
    pub path: PathBuf,
    /// Declared logical name; `None` for files found through a folder.
    pub key: Option<String>,
    /// Per-source decoder.
    pub parser: Option<Parser>,
    /// Per-source validator.
    pub validator: Option<Validator>,
    /// Reload on change.
    pub hot_reload: bool,
    /// Load even if binary-looking.
    pub allow_binary: bool,
}

impl ResolvedEntry {
    /// Loader overrides for this entry.
    #[must_use]
    pub fn overrides(&self) -> LoadOverrides {
        LoadOverrides {
            key: self.key.clone(),
            parser: self.parser.clone(),
            validator: self.validator.clone(),
            allow_binary: Some(self.allow_binary),
        }
    }
}

/// An armed watcher and the worker draining its events.
pub(crate) struct WatchHandle {
    watcher: RecommendedWatcher,
    worker: JoinHandle<()>,
}

impl WatchHandle {
    /// Stop watching. Dropping the watcher closes the event channel, which
    /// ends the worker loop. Returns `false` if the worker panicked.
    pub(crate) fn close(self) -> bool {
        drop(self.watcher);
        self.worker.join().is_ok()
    }
}

impl fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchHandle").finish_non_exhaustive()
    }
}

/// Run the initial load pass and, when any source is hot-reloaded, start
/// watching.
pub(crate) fn start(
    options: &ConfigParserOptions,
    loader: Loader,
) -> Result<(Arc<Session>, Option<WatchHandle>)> {
    let session = Arc::new(Session::initial_pass(options, loader)?);

    if !session.wants_watch() {
        session.handlers().emit_ready();
        return Ok((session, None));
    }

    let handle = arm(&session, options.watch)?;
    session.announce_ready();
    Ok((session, Some(handle)))
}

fn arm(session: &Arc<Session>, watch: WatchOptions) -> Result<WatchHandle> {
    let logger = session.loader().logger();
    let (tx, rx) = mpsc::channel::<notify::Result<notify::Event>>();
    let mut watcher = RecommendedWatcher::new(tx, notify::Config::from(watch))?;

    for (dir, mode) in session.watch_roots() {
        watcher.watch(&dir, mode)?;
        logger.debug(&format!("[WATCH] Watching directory {}", dir.display()));
    }

    let worker_session = Arc::clone(session);
    let worker = thread::Builder::new()
        .name("confwatch-watch".into())
        .spawn(move || {
            for result in rx {
                worker_session.handle_notify(result);
            }
        })?;

    Ok(WatchHandle { watcher, worker })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_default_and_display() {
        assert_eq!(Lifecycle::default(), Lifecycle::Stopped);
        assert_eq!(Lifecycle::Watching.to_string(), "watching");
    }

    #[test]
    fn test_entry_overrides_carry_flags() {
        let entry = ResolvedEntry {
            path: PathBuf::from("/srv/app.json"),
            key: Some("app".into()),
            parser: None,
            validator: None,
            hot_reload: true,
            allow_binary: true,
        };
        let overrides = entry.overrides();
        assert_eq!(overrides.key.as_deref(), Some("app"));
        assert_eq!(overrides.allow_binary, Some(true));
    }
}
