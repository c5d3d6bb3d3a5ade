use std::path::PathBuf;
use std::time::Duration;

use super::debouncer::{DEBOUNCE_MS, Debouncer};
use super::types::ChangeKind;

fn make_event(paths: Vec<&str>, kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn create_kind() -> notify::EventKind {
    notify::EventKind::Create(notify::event::CreateKind::File)
}

fn remove_kind() -> notify::EventKind {
    notify::EventKind::Remove(notify::event::RemoveKind::File)
}

fn metadata_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::WriteTime,
    ))
}

fn wait_quiet_period() {
    std::thread::sleep(Duration::from_millis(DEBOUNCE_MS + 20));
}

#[test]
fn test_empty_debouncer_is_not_ready() {
    let mut debouncer = Debouncer::new();
    assert!(debouncer.take_if_ready().is_none());
    assert_eq!(debouncer.sleep_duration(), Duration::from_secs(1));
}

#[test]
fn test_batch_waits_for_quiet_period() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(vec!["/p/src/scss/main.scss"], modify_kind()));

    assert!(debouncer.take_if_ready().is_none());
    assert!(debouncer.sleep_duration() <= Duration::from_millis(DEBOUNCE_MS));

    wait_quiet_period();
    assert_eq!(
        debouncer.take_if_ready(),
        Some(vec![PathBuf::from("/p/src/scss/main.scss")])
    );
    assert!(debouncer.take_if_ready().is_none());
}

#[test]
fn test_batch_is_sorted_and_deduplicated() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(vec!["/p/src/js/b.js"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/p/src/js/a.js", "/p/src/js/b.js"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/p/src/js/a.js"], create_kind()));

    assert_eq!(debouncer.changes.len(), 2);
    assert_eq!(
        debouncer.changes[&PathBuf::from("/p/src/js/a.js")],
        ChangeKind::Modified
    );

    wait_quiet_period();
    assert_eq!(
        debouncer.take_if_ready(),
        Some(vec![
            PathBuf::from("/p/src/js/a.js"),
            PathBuf::from("/p/src/js/b.js"),
        ])
    );
}

#[test]
fn test_created_then_removed_is_dropped() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(vec!["/p/src/img/svg/new.svg"], create_kind()));
    debouncer.add_event(&make_event(vec!["/p/src/img/svg/new.svg"], remove_kind()));

    wait_quiet_period();
    assert!(debouncer.take_if_ready().is_none());
}

#[test]
fn test_metadata_and_temp_files_ignored() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(vec!["/p/src/js/index.js"], metadata_kind()));
    debouncer.add_event(&make_event(vec!["/p/src/js/.index.js.swp"], modify_kind()));

    assert!(debouncer.changes.is_empty());
    assert!(debouncer.last_event.is_none());
}

#[test]
fn test_paths_are_normalized() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(vec!["/p/src/js/../scss/./main.scss"], modify_kind()));

    assert!(debouncer
        .changes
        .contains_key(&PathBuf::from("/p/src/scss/main.scss")));
}
