//! File system watcher for live rebuilds.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐  sync_channel(64)  ┌───────────┐  sync_channel(0)  ┌────────────┐
//! │  notify  │───────────────────▶│ Debouncer │──────────────────▶│ Watch Loop │
//! │ watcher  │    raw events      │  thread   │     triggers      │ build_site │
//! └──────────┘                    └───────────┘                   └────────────┘
//! ```
//!
//! The trigger hand-off is a rendezvous: while a build runs the debouncer keeps
//! coalescing, and its next send waits until the loop is free. Edits made
//! during a build therefore cause exactly one follow-up rebuild.

mod debouncer;

pub use debouncer::{ChangeEvent, Debouncer};

use crate::{
    build::{self, BuildError, BuildReport},
    config::SiteConfig,
    log,
    logger::WatchStatus,
};
use notify::{RecursiveMode, Watcher};
use std::{
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver},
    thread,
    time::Instant,
};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Raw events buffered between the watcher and the debouncer.
const EVENT_QUEUE_DEPTH: usize = 64;

/// File extensions whose changes trigger a rebuild.
const REBUILD_EXTENSIONS: &[&str] = &["md", "markdown", "html", "css"];

// =============================================================================
// Errors
// =============================================================================

/// Errors that end the watch loop.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to watch `{}`", path.display())]
    Register {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("watched directory `{}` was removed", path.display())]
    RootRemoved { path: PathBuf },

    #[error("file watcher failed")]
    Notify(#[from] notify::Error),
}

// =============================================================================
// Watch Loop
// =============================================================================

/// Rebuilds the site whenever a watched source file changes.
pub struct WatchLoop<'a> {
    config: &'a SiteConfig,
    roots: [PathBuf; 3],
}

impl<'a> WatchLoop<'a> {
    pub fn new(config: &'a SiteConfig) -> Self {
        Self {
            config,
            roots: [config.theme_dir(), config.posts_dir(), config.assets_dir()],
        }
    }

    /// Watched roots: theme, posts, content assets.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Watch the roots and rebuild on change until the watcher fails or a
    /// root disappears.
    pub fn run(&self) -> Result<(), WatchError> {
        let (raw_tx, raw_rx) = mpsc::sync_channel(EVENT_QUEUE_DEPTH);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            raw_tx.send(res).ok();
        })?;
        self.register(&mut watcher)?;

        let (trigger_tx, trigger_rx) = mpsc::sync_channel(0);
        let debouncer = Debouncer::new(self.config.serve.debounce());
        thread::spawn(move || debouncer.run(raw_rx, trigger_tx));

        let config = self.config;
        consume(&config.root, self.roots(), trigger_rx, || build::build_site(config))?;
        Ok(())
    }

    fn register(&self, watcher: &mut impl Watcher) -> Result<(), WatchError> {
        for root in self.roots() {
            if !root.is_dir() {
                return Err(WatchError::Register {
                    path: root.clone(),
                    source: notify::Error::path_not_found().add_path(root.clone()),
                });
            }
            watcher
                .watch(root, RecursiveMode::Recursive)
                .map_err(|source| WatchError::Register {
                    path: root.clone(),
                    source,
                })?;
        }

        let watched: Vec<_> = self
            .roots()
            .iter()
            .map(|p| format!("{}/", rel_path(p, &self.config.root)))
            .collect();
        log!("watch"; "watching {}", watched.join(", "));
        Ok(())
    }
}

/// Run `rebuild` once per relevant trigger. Returns the number of rebuilds
/// attempted once the trigger channel closes.
///
/// A failed rebuild is reported and the loop keeps going. A watcher error
/// ends it, and so does a missing watched root: a rebuild would recreate the
/// directory without a watch on it.
fn consume<F>(
    root: &Path,
    watched: &[PathBuf],
    triggers: Receiver<Result<ChangeEvent, WatchError>>,
    mut rebuild: F,
) -> Result<usize, WatchError>
where
    F: FnMut() -> Result<BuildReport, BuildError>,
{
    let mut rebuilds = 0;

    for trigger in triggers {
        let change = trigger?;
        if let Some(gone) = watched.iter().find(|dir| !dir.is_dir()) {
            return Err(WatchError::RootRemoved { path: gone.clone() });
        }
        let rel = rel_path(&change.path, root);

        if !should_rebuild(&change.path) {
            log!("watch"; "{} {rel}, skipped", change.kind);
            continue;
        }

        log!("watch"; "{} {rel}, rebuilding...", change.kind);
        rebuilds += 1;
        let start = Instant::now();
        match rebuild() {
            Ok(report) => WatchStatus::success(&format!(
                "rebuilt {} posts in {:?}",
                report.posts,
                start.elapsed()
            )),
            Err(err) => WatchStatus::error(
                &format!("{} error, keeping previous output ({rel})", err.kind().label()),
                &format!("{:#}", anyhow::Error::new(err)),
            ),
        }
    }

    Ok(rebuilds)
}

/// Whether a change to `path` warrants a rebuild.
fn should_rebuild(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| REBUILD_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Format path as relative to root for log display.
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::debouncer::tests::write_event;
    use super::*;
    use crate::{build::error::ErrorKind, content::ParseError};
    use std::{fs, time::Duration};
    use tempfile::TempDir;

    fn report() -> BuildReport {
        BuildReport { posts: 1, assets: 0 }
    }

    /// Pump `batches` of raw events through a real debouncer into `consume`.
    fn pump<F>(batches: Vec<Vec<notify::Event>>, rebuild: F) -> Result<usize, WatchError>
    where
        F: FnMut() -> Result<BuildReport, BuildError>,
    {
        let interval = Duration::from_millis(30);
        let (raw_tx, raw_rx) = mpsc::sync_channel(EVENT_QUEUE_DEPTH);
        let (trigger_tx, trigger_rx) = mpsc::sync_channel(0);
        let debouncer = thread::spawn(move || Debouncer::new(interval).run(raw_rx, trigger_tx));
        let feeder = thread::spawn(move || {
            for batch in batches {
                for event in batch {
                    raw_tx.send(Ok(event)).unwrap();
                }
                thread::sleep(interval * 4);
            }
        });

        let result = consume(Path::new("/site"), &[], trigger_rx, rebuild);
        feeder.join().unwrap();
        debouncer.join().unwrap();
        result
    }

    #[test]
    fn test_should_rebuild() {
        assert!(should_rebuild(Path::new("themes/default/style.css")));
        assert!(should_rebuild(Path::new("content/posts/a.md")));
        assert!(should_rebuild(Path::new("content/posts/a.MARKDOWN")));
        assert!(should_rebuild(Path::new("themes/default/post.html")));
        assert!(!should_rebuild(Path::new("content/posts/notes.txt")));
        assert!(!should_rebuild(Path::new("content/assets/logo.png")));
        assert!(!should_rebuild(Path::new("content/posts/README")));
    }

    #[test]
    fn test_css_change_rebuilds_once_txt_skipped() {
        let mut builds = 0;
        let rebuilds = pump(
            vec![
                vec![
                    write_event("/site/themes/default/style.css"),
                    write_event("/site/themes/default/style.css"),
                    write_event("/site/themes/default/style.css"),
                ],
                vec![write_event("/site/content/posts/notes.txt")],
            ],
            || {
                builds += 1;
                Ok(report())
            },
        )
        .unwrap();

        assert_eq!(rebuilds, 1);
        assert_eq!(builds, 1);
    }

    #[test]
    fn test_failed_rebuild_keeps_looping() {
        let mut outcomes = vec![
            Ok(report()),
            Err(BuildError::Parse {
                path: PathBuf::from("posts/bad.md"),
                source: ParseError::MetadataNotFound,
            }),
        ];
        let mut kinds = Vec::new();
        let rebuilds = pump(
            vec![
                vec![write_event("/site/content/posts/bad.md")],
                vec![write_event("/site/content/posts/bad.md")],
            ],
            || {
                let outcome = outcomes.pop().unwrap();
                kinds.push(outcome.as_ref().err().map(BuildError::kind));
                outcome
            },
        )
        .unwrap();

        assert_eq!(rebuilds, 2);
        assert_eq!(kinds, [Some(ErrorKind::Parse), None]);
    }

    #[test]
    fn test_watcher_error_ends_loop() {
        let (trigger_tx, trigger_rx) = mpsc::sync_channel(1);
        trigger_tx
            .send(Err(WatchError::Notify(notify::Error::generic("inotify limit"))))
            .unwrap();

        let err = consume(Path::new("/site"), &[], trigger_rx, || Ok(report())).unwrap_err();
        assert!(matches!(err, WatchError::Notify(_)));
    }

    #[test]
    fn test_removed_root_ends_loop_before_rebuild() {
        let dir = TempDir::new().unwrap();
        let roots = ["themes/default", "content/posts", "content/assets"].map(|p| dir.path().join(p));
        for root in &roots {
            fs::create_dir_all(root).unwrap();
        }
        fs::remove_dir_all(&roots[2]).unwrap();

        let (trigger_tx, trigger_rx) = mpsc::sync_channel(1);
        trigger_tx
            .send(Ok(ChangeEvent::from_notify(&write_event("/site/themes/default/style.css")).unwrap()))
            .unwrap();

        let mut builds = 0;
        let err = consume(dir.path(), &roots, trigger_rx, || {
            builds += 1;
            Ok(report())
        })
        .unwrap_err();
        assert!(matches!(err, WatchError::RootRemoved { ref path } if *path == roots[2]));
        assert_eq!(builds, 0);
    }

    #[test]
    fn test_roots() {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig::with_root(dir.path());
        let watch = WatchLoop::new(&config);
        assert_eq!(
            watch.roots(),
            [config.theme_dir(), config.posts_dir(), config.assets_dir()]
        );
    }

    #[test]
    fn test_missing_root_is_register_error() {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig::with_root(dir.path());
        fs::create_dir_all(config.theme_dir()).unwrap();
        fs::create_dir_all(config.posts_dir()).unwrap();

        let err = WatchLoop::new(&config).run().unwrap_err();
        match err {
            WatchError::Register { path, .. } => assert_eq!(path, config.assets_dir()),
            other => panic!("expected Register, got {other:?}"),
        }
    }

    /// Site with a minimal theme, leaked so a watch thread can borrow it.
    fn live_site(root: &Path) -> &'static SiteConfig {
        let mut config = SiteConfig::with_root(root);
        config.serve.debounce_ms = 50;

        let theme = config.theme_dir();
        fs::create_dir_all(theme.join("assets")).unwrap();
        fs::write(theme.join("post.html"), "{{ post.content|safe }}").unwrap();
        fs::write(theme.join("index.html"), "{{ site.title }}").unwrap();
        fs::write(theme.join("style.css"), "body { color: black }").unwrap();
        fs::create_dir_all(config.posts_dir()).unwrap();
        fs::create_dir_all(config.assets_dir()).unwrap();
        fs::write(
            config.posts_dir().join("hello.md"),
            "---\ntitle: Hello\ndate: 2024-01-01\n---\nhi\n",
        )
        .unwrap();

        Box::leak(Box::new(config))
    }

    /// Start `run()` on its own thread; its result arrives on the receiver.
    fn spawn_watch(config: &'static SiteConfig) -> Receiver<Result<(), WatchError>> {
        let (done_tx, done_rx) = mpsc::channel();
        thread::spawn(move || done_tx.send(WatchLoop::new(config).run()).ok());
        // let the watcher register before touching files
        thread::sleep(Duration::from_millis(300));
        done_rx
    }

    fn wait_for(timeout: Duration, mut ready: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if ready() {
                return true;
            }
            thread::sleep(Duration::from_millis(20));
        }
        ready()
    }

    #[test]
    fn test_run_rebuilds_on_stylesheet_edit_and_skips_txt() {
        let dir = TempDir::new().unwrap();
        let config = live_site(dir.path());
        build::build_site(config).unwrap();
        let output_css = config.output_assets_dir().join("style.css");

        let done = spawn_watch(config);

        fs::write(config.theme_dir().join("style.css"), "body { color: red }").unwrap();
        assert!(wait_for(Duration::from_secs(5), || {
            fs::read_to_string(&output_css).is_ok_and(|css| css.contains("red"))
        }));
        // settle: the rebuild that copied the stylesheet may still be rendering
        thread::sleep(Duration::from_millis(300));
        let built = fs::metadata(&output_css).unwrap().modified().unwrap();

        fs::write(config.posts_dir().join("notes.txt"), "scratch").unwrap();
        thread::sleep(Duration::from_millis(500));
        assert_eq!(fs::metadata(&output_css).unwrap().modified().unwrap(), built);
        assert!(done.try_recv().is_err(), "watch loop stopped early");
    }

    #[test]
    fn test_run_stops_when_root_is_deleted() {
        let dir = TempDir::new().unwrap();
        let config = live_site(dir.path());
        let done = spawn_watch(config);

        fs::remove_dir_all(config.assets_dir()).unwrap();
        let err = done
            .recv_timeout(Duration::from_secs(5))
            .expect("watch loop kept running")
            .unwrap_err();
        assert!(matches!(err, WatchError::RootRemoved { ref path } if *path == config.assets_dir()));
        assert!(!config.assets_dir().exists(), "no rebuild recreated the root");
    }

    #[test]
    fn test_rel_path() {
        assert_eq!(
            rel_path(Path::new("/site/content/posts/a.md"), Path::new("/site")),
            "content/posts/a.md"
        );
        assert_eq!(rel_path(Path::new("/other/a.md"), Path::new("/site")), "/other/a.md");
    }
}
