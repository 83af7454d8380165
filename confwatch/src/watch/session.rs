//! State shared by the start pass, the event worker and explicit reloads.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use glob::MatchOptions;
use notify::RecursiveMode;
use parking_lot::RwLock;

use super::events::{translate, EventHandlers, WatchEvent};
use super::pattern::FolderPattern;
use super::ResolvedEntry;
use crate::error::{Error, Result};
use crate::loader::{LoadOutcome, LoadOverrides, Loader};
use crate::options::{ConfigParserOptions, FolderSource};
use crate::path::{normalize_lossy, real_alias};

/// A folder pattern with its effective flags.
#[derive(Debug)]
pub(crate) struct WatchedFolder {
    pub(crate) pattern: FolderPattern,
    pub(crate) source: FolderSource,
    pub(crate) hot_reload: bool,
    pub(crate) allow_binary: bool,
}

impl WatchedFolder {
    fn entry_for(&self, path: PathBuf) -> ResolvedEntry {
        ResolvedEntry {
            parser: self.source.parser_for(&path).cloned(),
            validator: self.source.validator_for(&path).cloned(),
            key: None,
            hot_reload: self.hot_reload,
            allow_binary: self.allow_binary,
            path,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Session {
    loader: Loader,
    entries: RwLock<Vec<ResolvedEntry>>,
    folders: Vec<WatchedFolder>,
    handlers: EventHandlers,
    glob: MatchOptions,
    /// `(real, declared)` directory pairs, longest real path first.
    aliases: Vec<(PathBuf, PathBuf)>,
}

impl Session {
    /// Resolve every declared source and load it once. Per-file failures
    /// are logged by the loader; only malformed folder patterns abort.
    pub(crate) fn initial_pass(options: &ConfigParserOptions, loader: Loader) -> Result<Self> {
        let glob: MatchOptions = options.glob.into();
        let mut entries: Vec<ResolvedEntry> = Vec::new();

        for (name, file) in &options.files {
            let entry = ResolvedEntry {
                path: normalize_lossy(&file.path),
                key: Some(name.clone()),
                parser: file.parser.clone(),
                validator: file.validator.clone(),
                hot_reload: file.hot_reload.unwrap_or(options.hot_reload),
                allow_binary: file.allow_binary.unwrap_or(options.allow_binary),
            };
            loader.load(&entry.path, &entry.overrides());
            entries.push(entry);
        }

        let mut folders = Vec::with_capacity(options.folders.len());
        for source in &options.folders {
            let folder = WatchedFolder {
                pattern: FolderPattern::compile(&source.pattern)?,
                source: source.clone(),
                hot_reload: source.hot_reload.unwrap_or(options.hot_reload),
                allow_binary: source.allow_binary.unwrap_or(options.allow_binary),
            };

            for path in folder.pattern.expand(glob)? {
                if entries.iter().any(|e| e.path == path) {
                    continue;
                }
                let entry = folder.entry_for(path);
                loader.load(&entry.path, &entry.overrides());
                entries.push(entry);
            }
            folders.push(folder);
        }

        let aliases = directory_aliases(&entries, &folders);
        Ok(Self {
            loader,
            entries: RwLock::new(entries),
            folders,
            handlers: options.events.clone(),
            glob,
            aliases,
        })
    }

    pub(crate) fn loader(&self) -> &Loader {
        &self.loader
    }

    pub(crate) fn handlers(&self) -> &EventHandlers {
        &self.handlers
    }

    /// A copy of the resolved entries.
    pub(crate) fn entries(&self) -> Vec<ResolvedEntry> {
        self.entries.read().clone()
    }

    /// Whether any source asked for hot reload.
    pub(crate) fn wants_watch(&self) -> bool {
        self.entries.read().iter().any(|e| e.key.is_some() && e.hot_reload)
            || self.folders.iter().any(|f| f.hot_reload)
    }

    /// Directories to arm: the parent of each hot declared file and the
    /// base of each hot folder. Missing directories are skipped.
    pub(crate) fn watch_roots(&self) -> Vec<(PathBuf, RecursiveMode)> {
        let mut roots: BTreeMap<PathBuf, bool> = BTreeMap::new();
        for entry in self.entries.read().iter() {
            if entry.key.is_some() && entry.hot_reload {
                if let Some(parent) = entry.path.parent() {
                    roots.entry(parent.to_path_buf()).or_insert(false);
                }
            }
        }
        for folder in self.folders.iter().filter(|f| f.hot_reload) {
            let recursive = roots.entry(folder.pattern.base().to_path_buf()).or_insert(false);
            *recursive |= folder.pattern.recursive();
        }

        let logger = self.loader.logger();
        roots
            .into_iter()
            .filter(|(dir, _)| {
                let exists = dir.is_dir();
                if !exists {
                    logger.debug(&format!("[WATCH] Skipping missing directory {}", dir.display()));
                }
                exists
            })
            .map(|(dir, recursive)| {
                let mode = if recursive {
                    RecursiveMode::Recursive
                } else {
                    RecursiveMode::NonRecursive
                };
                (dir, mode)
            })
            .collect()
    }

    /// Whether an event concerns a hot-reload source: a hot entry, or any
    /// path a hot folder covers, including cold declared files inside it.
    pub(crate) fn is_watched(&self, event: &WatchEvent) -> bool {
        let path = event.path();
        if event.is_dir() {
            return self
                .folders
                .iter()
                .any(|f| f.hot_reload && f.pattern.covers(path));
        }
        let hot_entry = self
            .entries
            .read()
            .iter()
            .any(|e| e.path == path && e.hot_reload);
        hot_entry
            || self
                .folders
                .iter()
                .any(|f| f.hot_reload && f.pattern.matches(path, self.glob))
    }

    /// Map a reported path onto the form sources were declared with.
    ///
    /// Paths under the real location of a watched directory are rewritten
    /// under its declared location.
    pub(crate) fn localize(&self, path: &Path) -> PathBuf {
        let path = normalize_lossy(path);
        if self.aliases.is_empty() || self.is_known(&path) {
            return path;
        }
        for (real, declared) in &self.aliases {
            if let Ok(rest) = path.strip_prefix(real) {
                if rest.as_os_str().is_empty() {
                    return declared.clone();
                }
                return declared.join(rest);
            }
        }
        path
    }

    fn is_known(&self, path: &Path) -> bool {
        self.entries.read().iter().any(|e| e.path == path)
            || self
                .folders
                .iter()
                .any(|f| f.pattern.matches(path, self.glob))
    }

    /// Reload a path with the overrides of its entry.
    ///
    /// A path with no entry that matches a folder pattern is recorded as a
    /// new entry of that folder first; any other path loads with defaults.
    pub(crate) fn reload(&self, path: &Path) -> LoadOutcome {
        let path = self.localize(path);
        let overrides = self.resolve(&path);
        self.loader.load(&path, &overrides)
    }

    fn resolve(&self, path: &Path) -> LoadOverrides {
        if let Some(entry) = self.entries.read().iter().find(|e| e.path == path) {
            return entry.overrides();
        }

        let Some(folder) = self
            .folders
            .iter()
            .find(|f| f.pattern.matches(path, self.glob))
        else {
            return LoadOverrides::default();
        };

        let mut entries = self.entries.write();
        if let Some(entry) = entries.iter().find(|e| e.path == path) {
            return entry.overrides();
        }
        let entry = folder.entry_for(path.to_path_buf());
        let overrides = entry.overrides();
        entries.push(entry);
        overrides
    }

    /// Route one filesystem event: user callbacks first, then a reload for
    /// changes and new files.
    pub(crate) fn handle(&self, event: &WatchEvent) {
        let event = event.with_path(self.localize(event.path()));
        if !self.is_watched(&event) {
            return;
        }
        self.loader.logger().debug(&format!("[WATCH] {event}"));
        self.handlers.dispatch(&event);

        if let WatchEvent::Change(path) | WatchEvent::Add(path) = &event {
            self.reload(path);
        }
    }

    pub(crate) fn handle_notify(&self, result: notify::Result<notify::Event>) {
        match result {
            Ok(event) => {
                self.handlers.dispatch_raw(&event);
                for translated in translate(&event) {
                    self.handle(&translated);
                }
            }
            Err(err) => self.report(&Error::Watch(err)),
        }
    }

    pub(crate) fn report(&self, err: &Error) {
        self.loader.logger().error(&err.to_string());
        self.handlers.emit_error(err);
    }

    /// Announce the sources present when watching begins, then signal
    /// readiness. Nothing is reloaded.
    pub(crate) fn announce_ready(&self) {
        for folder in self.folders.iter().filter(|f| f.hot_reload) {
            let base = folder.pattern.base();
            if base.is_dir() {
                self.announce(&WatchEvent::AddDir(base.to_path_buf()));
            }
        }
        for entry in self.entries() {
            if entry.hot_reload && entry.path.is_file() {
                self.announce(&WatchEvent::Add(entry.path));
            }
        }
        self.handlers.emit_ready();
    }

    fn announce(&self, event: &WatchEvent) {
        self.loader
            .logger()
            .debug(&format!("[WATCH] Started watching {}", event.path().display()));
        self.handlers.dispatch(event);
    }
}

/// Real locations of the directories sources live in, for those that sit
/// behind a symlink.
fn directory_aliases(
    entries: &[ResolvedEntry],
    folders: &[WatchedFolder],
) -> Vec<(PathBuf, PathBuf)> {
    let dirs: BTreeSet<&Path> = entries
        .iter()
        .filter_map(|e| e.path.parent())
        .chain(folders.iter().map(|f| f.pattern.base()))
        .collect();

    let mut aliases: Vec<(PathBuf, PathBuf)> = dirs
        .into_iter()
        .filter_map(|dir| real_alias(dir).map(|real| (real, dir.to_path_buf())))
        .collect();
    aliases.sort_by_key(|(real, _)| std::cmp::Reverse(real.components().count()));
    aliases
}
