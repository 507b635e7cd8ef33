//! Rebuild-on-change loop.
//!
//! Watches the content tree, the static directory and the templates
//! directory, and runs [`Site::recompile`] whenever something relevant
//! changes. Events that pile up while a rebuild runs are drained before the
//! next one starts, so a burst of saves costs one rebuild.
//!
//! A failed rebuild is logged and the loop keeps going: the previous output
//! stays in place until the next successful build. After every successful
//! rebuild the `on_settled` callback is invoked, which is where a live-reload
//! notifier hooks in.

use crate::site::Site;
use crate::writer::BuildSummary;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Watcher error: {0}")]
    Notify(#[from] notify::Error),
    #[error("Failed to watch {path}: {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Editor scratch files never trigger a rebuild.
fn is_scratch_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    name.ends_with(".swp") || name.ends_with('~') || name.starts_with(".#")
}

/// Whether an event should cause a rebuild.
pub fn is_relevant(event: &Event, output_root: &Path) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|p| !is_scratch_file(p) && !p.starts_with(output_root))
}

/// Block forever, rebuilding `site` on every relevant change.
///
/// The watcher is installed before the first build, so edits saved while it
/// runs are queued rather than missed. Returns only if the watcher cannot be
/// set up or its channel closes.
pub fn watch(site: &Site, on_settled: impl FnMut(&BuildSummary)) -> Result<(), WatchError> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.send(res);
        },
        notify::Config::default(),
    )?;
    for path in site.watch_paths() {
        watcher
            .watch(&path, RecursiveMode::Recursive)
            .map_err(|source| WatchError::Path {
                path: path.clone(),
                source,
            })?;
        tracing::info!("watching {}", path.display());
    }

    serve(site, &rx, on_settled);
    Ok(())
}

/// Build once, then rebuild on every queued change until the channel closes.
pub fn serve(
    site: &Site,
    rx: &Receiver<notify::Result<Event>>,
    mut on_settled: impl FnMut(&BuildSummary),
) {
    rebuild(site, &mut on_settled);
    run_loop(site, rx, on_settled);
}

/// Consume watcher events until the channel closes.
pub fn run_loop(
    site: &Site,
    rx: &Receiver<notify::Result<Event>>,
    mut on_settled: impl FnMut(&BuildSummary),
) {
    while let Ok(first) = rx.recv() {
        let mut changed = accept(first, site.output_root());
        // Drain whatever queued up behind the first event
        while let Ok(next) = rx.try_recv() {
            changed |= accept(next, site.output_root());
        }
        if changed {
            tracing::info!("change detected, rebuilding");
            rebuild(site, &mut on_settled);
        }
    }
}

fn accept(event: notify::Result<Event>, output_root: &Path) -> bool {
    match event {
        Ok(event) => {
            let relevant = is_relevant(&event, output_root);
            if relevant {
                tracing::debug!("{:?} {:?}", event.kind, event.paths);
            }
            relevant
        }
        Err(err) => {
            tracing::warn!("watcher error: {err}");
            false
        }
    }
}

fn rebuild(site: &Site, on_settled: &mut impl FnMut(&BuildSummary)) {
    match site.recompile() {
        Ok(summary) => {
            tracing::info!("rebuild complete: {} pages", summary.pages_written);
            on_settled(&summary);
        }
        Err(e) => tracing::error!("rebuild failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind};
    use std::fs;

    fn event(kind: EventKind, path: PathBuf) -> notify::Result<Event> {
        Ok(Event::new(kind).add_path(path))
    }

    #[test]
    fn scratch_files_ignored() {
        let out = Path::new("/site/.output");
        let swp = Event::new(EventKind::Any).add_path("/site/dynamic/pages/.a.page.swp".into());
        let tilde = Event::new(EventKind::Any).add_path("/site/dynamic/pages/a.page~".into());
        let real = Event::new(EventKind::Any).add_path("/site/dynamic/pages/a.page".into());
        assert!(!is_relevant(&swp, out));
        assert!(!is_relevant(&tilde, out));
        assert!(is_relevant(&real, out));
    }

    #[test]
    fn output_and_access_events_ignored() {
        let out = Path::new("/site/.output");
        let output = Event::new(EventKind::Create(CreateKind::File))
            .add_path("/site/.output/index.html".into());
        let access = Event::new(EventKind::Access(AccessKind::Any))
            .add_path("/site/dynamic/pages/a.page".into());
        assert!(!is_relevant(&output, out));
        assert!(!is_relevant(&access, out));
    }

    #[test]
    fn burst_of_events_rebuilds_once() {
        let fx = SiteFixture::new();
        fx.page("about.page", ":title: About\n");
        let site = fx.site();

        let (tx, rx) = mpsc::channel();
        let changed = fx.content_root().join("about.page");
        for _ in 0..3 {
            tx.send(event(EventKind::Modify(ModifyKind::Any), changed.clone()))
                .unwrap();
        }
        drop(tx);

        let mut settled = Vec::new();
        run_loop(&site, &rx, |summary| settled.push(*summary));
        assert_eq!(settled.len(), 1);
        assert!(fx.output_root().join("about.html").exists());
    }

    #[test]
    fn change_queued_during_first_build_triggers_rebuild() {
        let fx = SiteFixture::new();
        fx.page("about.page", ":title: About\n");
        let site = fx.site();

        let (tx, rx) = mpsc::channel();
        tx.send(event(
            EventKind::Modify(ModifyKind::Any),
            fx.content_root().join("about.page"),
        ))
        .unwrap();
        drop(tx);

        let mut settled = 0;
        serve(&site, &rx, |_| settled += 1);
        assert_eq!(settled, 2);
    }

    #[test]
    fn failed_rebuild_keeps_going() {
        let fx = SiteFixture::new();
        fx.page("about.page", ":title: About\n");
        let site = fx.site();
        site.save().unwrap();
        let before = read_output(&fx.output_root(), "about.html");

        let (tx, rx) = mpsc::channel();
        fx.page("about.page", ":order[int]: never\n");
        tx.send(event(EventKind::Any, fx.content_root().join("about.page")))
            .unwrap();
        tx.send(Err(notify::Error::generic("boom"))).unwrap();
        drop(tx);

        let mut settled = 0;
        run_loop(&site, &rx, |_| settled += 1);
        assert_eq!(settled, 0);
        assert_eq!(read_output(&fx.output_root(), "about.html"), before);

        // Fixing the file and sending another change recovers
        fx.page("about.page", ":title: Fixed\n");
        let (tx, rx) = mpsc::channel();
        tx.send(event(EventKind::Any, fx.content_root().join("about.page")))
            .unwrap();
        drop(tx);
        run_loop(&site, &rx, |_| settled += 1);
        assert_eq!(settled, 1);
        assert!(
            fs::read_to_string(fx.output_root().join("about.html"))
                .unwrap()
                .contains("Fixed")
        );
    }
}
