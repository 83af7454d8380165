//! Common test utilities for integration tests.
//!
//! This module provides fixture helpers, a capturing log sink and guards
//! for process-global state (environment variables, current directory).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use confwatch::{ConfigParserOptions, LogSink, LoggingOptions};

/// Writes `content` to `relative` under `dir`, creating parent directories.
#[allow(dead_code)]
pub fn write_file(dir: &Path, relative: &str, content: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// Options with both log channels off.
#[allow(dead_code)]
pub fn quiet_options() -> ConfigParserOptions {
    ConfigParserOptions::new().logging(LoggingOptions {
        error: false,
        debug: false,
    })
}

/// Polls `condition` until it holds or `timeout` elapses.
#[allow(dead_code)]
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(25));
    }
    condition()
}

/// Generous bound for filesystem events to arrive.
#[allow(dead_code)]
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Log sink that records every message.
#[derive(Default)]
pub struct CapturingSink {
    errors: Mutex<Vec<String>>,
    debugs: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl CapturingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }

    pub fn debugs(&self) -> Vec<String> {
        self.debugs.lock().clone()
    }
}

impl LogSink for CapturingSink {
    fn error(&self, message: &str) {
        self.errors.lock().push(message.to_string());
    }

    fn debug(&self, message: &str) {
        self.debugs.lock().push(message.to_string());
    }
}

/// RAII guard for setting and restoring environment variables.
///
/// Tests using it must be `#[serial]`.
#[allow(dead_code)]
pub struct EnvGuard {
    key: String,
    old_value: Option<String>,
}

#[allow(dead_code)]
impl EnvGuard {
    pub fn set(key: &str, value: &str) -> Self {
        let old_value = env::var(key).ok();
        env::set_var(key, value);
        Self {
            key: key.to_string(),
            old_value,
        }
    }

    pub fn remove(key: &str) -> Self {
        let old_value = env::var(key).ok();
        env::remove_var(key);
        Self {
            key: key.to_string(),
            old_value,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.old_value {
            Some(value) => env::set_var(&self.key, value),
            None => env::remove_var(&self.key),
        }
    }
}

/// RAII guard that changes the current directory and restores it.
///
/// Tests using it must be `#[serial]`.
#[allow(dead_code)]
pub struct CwdGuard {
    previous: PathBuf,
}

#[allow(dead_code)]
impl CwdGuard {
    pub fn enter(dir: &Path) -> Self {
        let previous = env::current_dir().unwrap();
        env::set_current_dir(dir).unwrap();
        Self { previous }
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.previous);
    }
}
