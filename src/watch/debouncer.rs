//! Trailing-edge debouncer for filesystem events.
//!
//! Raw notify events go in; at most one [`ChangeEvent`] comes out per quiet
//! window, carrying the latest interesting event seen in that window.

use super::WatchError;
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::mpsc::{Receiver, RecvTimeoutError, SyncSender},
    time::{Duration, Instant},
};

/// Wait used while nothing is pending.
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Kind of a structural filesystem change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Written,
    Removed,
    Renamed,
}

impl ChangeKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Written => "written",
            Self::Removed => "removed",
            Self::Renamed => "renamed",
        }
    }

    /// Map a notify event kind; `None` for metadata-only and access events.
    fn from_notify(kind: &notify::EventKind) -> Option<Self> {
        use notify::{EventKind, event::ModifyKind};

        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Remove(_) => Some(Self::Removed),
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Modify(ModifyKind::Name(_)) => Some(Self::Renamed),
            EventKind::Modify(_) => Some(Self::Written),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single filesystem change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    /// Convert a notify event, keeping its last path (the new name for renames).
    pub fn from_notify(event: &notify::Event) -> Option<Self> {
        let kind = ChangeKind::from_notify(&event.kind)?;
        let path = event.paths.iter().rev().find(|p| !is_temp_file(p))?;
        Some(Self {
            path: path.clone(),
            kind,
        })
    }
}

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with(".#")
}

/// Holds the latest interesting event until the quiet window passes.
pub struct Debouncer {
    interval: Duration,
    pending: Option<ChangeEvent>,
    last_event: Option<Instant>,
}

impl Debouncer {
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
            last_event: None,
        }
    }

    /// Record a raw event. Returns false if it was not interesting.
    pub fn add(&mut self, event: &notify::Event) -> bool {
        let Some(change) = ChangeEvent::from_notify(event) else {
            return false;
        };
        self.pending = Some(change);
        self.last_event = Some(Instant::now());
        true
    }

    /// Take the pending event if the quiet window has elapsed.
    pub fn take_if_ready(&mut self) -> Option<ChangeEvent> {
        let elapsed = self.last_event?.elapsed();
        if elapsed < self.interval {
            return None;
        }
        self.last_event = None;
        self.pending.take()
    }

    /// How long to wait for the next raw event.
    fn timeout(&self) -> Duration {
        match self.last_event {
            Some(t) => self
                .interval
                .saturating_sub(t.elapsed())
                .max(Duration::from_millis(1)),
            None => IDLE_TIMEOUT,
        }
    }

    /// Pump raw events into debounced triggers until either channel closes.
    ///
    /// A watcher error is forwarded once and ends the loop.
    pub fn run(
        mut self,
        events: Receiver<notify::Result<notify::Event>>,
        triggers: SyncSender<Result<ChangeEvent, WatchError>>,
    ) {
        loop {
            match events.recv_timeout(self.timeout()) {
                Ok(Ok(event)) => {
                    self.add(&event);
                }
                Ok(Err(err)) => {
                    triggers.send(Err(WatchError::Notify(err))).ok();
                    return;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return,
            }

            if let Some(change) = self.take_if_ready()
                && triggers.send(Ok(change)).is_err()
            {
                return;
            }
        }
    }
}
