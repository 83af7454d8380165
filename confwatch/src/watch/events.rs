//! Filesystem events and the user callbacks that receive them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::{CreateKind, MetadataKind, ModifyKind, RemoveKind};
use notify::EventKind;

use crate::error::Error;

/// A filesystem event on a watched path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A file appeared.
    Add(PathBuf),
    /// A directory appeared.
    AddDir(PathBuf),
    /// A file's contents changed.
    Change(PathBuf),
    /// A file disappeared.
    Unlink(PathBuf),
    /// A directory disappeared.
    UnlinkDir(PathBuf),
}

impl WatchEvent {
    /// The path the event is about.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Add(path)
            | Self::AddDir(path)
            | Self::Change(path)
            | Self::Unlink(path)
            | Self::UnlinkDir(path) => path,
        }
    }

    /// Short event name, as used in log lines.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::AddDir(_) => "addDir",
            Self::Change(_) => "change",
            Self::Unlink(_) => "unlink",
            Self::UnlinkDir(_) => "unlinkDir",
        }
    }

    /// The same kind of event about another path.
    #[must_use]
    pub fn with_path(&self, path: PathBuf) -> Self {
        match self {
            Self::Add(_) => Self::Add(path),
            Self::AddDir(_) => Self::AddDir(path),
            Self::Change(_) => Self::Change(path),
            Self::Unlink(_) => Self::Unlink(path),
            Self::UnlinkDir(_) => Self::UnlinkDir(path),
        }
    }

    /// Whether the event is about a directory.
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self, Self::AddDir(_) | Self::UnlinkDir(_))
    }
}

impl fmt::Display for WatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.path().display())
    }
}

/// Translate a raw notify event into zero or more [`WatchEvent`]s.
///
/// Renames carry the old and new path; the side that still exists is
/// reported as an addition, the other as a removal.
pub(crate) fn translate(event: &notify::Event) -> Vec<WatchEvent> {
    event
        .paths
        .iter()
        .filter_map(|path| classify(event.kind, path))
        .collect()
}

fn classify(kind: EventKind, path: &Path) -> Option<WatchEvent> {
    let path = path.to_path_buf();
    match kind {
        EventKind::Create(CreateKind::Folder) => Some(WatchEvent::AddDir(path)),
        EventKind::Create(_) => Some(appeared(path)),
        EventKind::Modify(ModifyKind::Name(_)) => {
            if path.exists() {
                Some(appeared(path))
            } else {
                Some(WatchEvent::Unlink(path))
            }
        }
        EventKind::Modify(
            ModifyKind::Data(_)
            | ModifyKind::Metadata(MetadataKind::WriteTime | MetadataKind::Any)
            | ModifyKind::Any
            | ModifyKind::Other,
        ) if path.is_file() => Some(WatchEvent::Change(path)),
        EventKind::Remove(RemoveKind::Folder) => Some(WatchEvent::UnlinkDir(path)),
        EventKind::Remove(_) => Some(WatchEvent::Unlink(path)),
        _ => None,
    }
}

fn appeared(path: PathBuf) -> WatchEvent {
    if path.is_dir() {
        WatchEvent::AddDir(path)
    } else {
        WatchEvent::Add(path)
    }
}

type PathCallback = Arc<dyn Fn(&Path) + Send + Sync>;
type EventCallback = Arc<dyn Fn(&WatchEvent) + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&Error) + Send + Sync>;
type ReadyCallback = Arc<dyn Fn() + Send + Sync>;
type RawCallback = Arc<dyn Fn(&notify::Event) + Send + Sync>;

/// Callbacks invoked for watch events.
///
/// Path callbacks (`on_add`, `on_change`, ...) run for the matching event
/// kind; `on_all` runs for every event. `on_raw` sees the unfiltered
/// notify events of the watched directories, including the kinds that
/// never become a [`WatchEvent`]. Callbacks run on the watch worker thread,
/// before any reload the event triggers.
///
/// # Examples
///
/// ```
/// use confwatch::EventHandlers;
///
/// let handlers = EventHandlers::new()
///     .on_change(|path| println!("changed: {}", path.display()))
///     .on_error(|err| eprintln!("watch error: {err}"));
/// assert!(!handlers.is_empty());
/// ```
#[derive(Clone, Default)]
pub struct EventHandlers {
    add: Vec<PathCallback>,
    add_dir: Vec<PathCallback>,
    change: Vec<PathCallback>,
    unlink: Vec<PathCallback>,
    unlink_dir: Vec<PathCallback>,
    all: Vec<EventCallback>,
    error: Vec<ErrorCallback>,
    ready: Vec<ReadyCallback>,
    raw: Vec<RawCallback>,
}

impl EventHandlers {
    /// No callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when a file appears.
    #[must_use]
    pub fn on_add(mut self, f: impl Fn(&Path) + Send + Sync + 'static) -> Self {
        self.add.push(Arc::new(f));
        self
    }

    /// Called when a directory appears.
    #[must_use]
    pub fn on_add_dir(mut self, f: impl Fn(&Path) + Send + Sync + 'static) -> Self {
        self.add_dir.push(Arc::new(f));
        self
    }

    /// Called when a file changes.
    #[must_use]
    pub fn on_change(mut self, f: impl Fn(&Path) + Send + Sync + 'static) -> Self {
        self.change.push(Arc::new(f));
        self
    }

    /// Called when a file disappears.
    #[must_use]
    pub fn on_unlink(mut self, f: impl Fn(&Path) + Send + Sync + 'static) -> Self {
        self.unlink.push(Arc::new(f));
        self
    }

    /// Called when a directory disappears.
    #[must_use]
    pub fn on_unlink_dir(mut self, f: impl Fn(&Path) + Send + Sync + 'static) -> Self {
        self.unlink_dir.push(Arc::new(f));
        self
    }

    /// Called for every event.
    #[must_use]
    pub fn on_all(mut self, f: impl Fn(&WatchEvent) + Send + Sync + 'static) -> Self {
        self.all.push(Arc::new(f));
        self
    }

    /// Called when the watcher reports an error.
    #[must_use]
    pub fn on_error(mut self, f: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        self.error.push(Arc::new(f));
        self
    }

    /// Called once the initial watch set is armed.
    #[must_use]
    pub fn on_ready(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.ready.push(Arc::new(f));
        self
    }

    /// Called with every notify event, before classification.
    #[must_use]
    pub fn on_raw(mut self, f: impl Fn(&notify::Event) + Send + Sync + 'static) -> Self {
        self.raw.push(Arc::new(f));
        self
    }

    /// Whether no callback is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add.is_empty()
            && self.add_dir.is_empty()
            && self.change.is_empty()
            && self.unlink.is_empty()
            && self.unlink_dir.is_empty()
            && self.all.is_empty()
            && self.error.is_empty()
            && self.ready.is_empty()
            && self.raw.is_empty()
    }

    pub(crate) fn dispatch(&self, event: &WatchEvent) {
        let specific = match event {
            WatchEvent::Add(_) => &self.add,
            WatchEvent::AddDir(_) => &self.add_dir,
            WatchEvent::Change(_) => &self.change,
            WatchEvent::Unlink(_) => &self.unlink,
            WatchEvent::UnlinkDir(_) => &self.unlink_dir,
        };
        for callback in specific {
            callback(event.path());
        }
        for callback in &self.all {
            callback(event);
        }
    }

    pub(crate) fn dispatch_raw(&self, event: &notify::Event) {
        for callback in &self.raw {
            callback(event);
        }
    }

    pub(crate) fn emit_error(&self, err: &Error) {
        for callback in &self.error {
            callback(err);
        }
    }

    pub(crate) fn emit_ready(&self) {
        for callback in &self.ready {
            callback();
        }
    }
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlers")
            .field("add", &self.add.len())
            .field("add_dir", &self.add_dir.len())
            .field("change", &self.change.len())
            .field("unlink", &self.unlink.len())
            .field("unlink_dir", &self.unlink_dir.len())
            .field("all", &self.all.len())
            .field("error", &self.error.len())
            .field("ready", &self.ready.len())
            .field("raw", &self.raw.len())
            .finish()
    }
}
