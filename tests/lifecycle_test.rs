use cgmath::Point3;
use name_tree::{
    config::{LabelStyle, SceneSettings},
    data_structures::bounds::Aabb,
    scene::{Lifecycle, Mount, SceneSession, SessionId},
};
use winit::{dpi::PhysicalSize, event::WindowEvent};

use crate::common::test_utils::{SequenceRng, names};

mod common;

fn tree_bounds() -> Aabb {
    Aabb {
        min: Point3::new(-1.0, 0.0, -1.0),
        max: Point3::new(1.0, 8.0, 1.0),
    }
}

fn start(id: u64, mount: &mut Mount, visitors: &[&str]) -> SceneSession {
    SceneSession::start(
        SessionId::new(id),
        mount,
        &names(visitors),
        (800, 600),
        &SceneSettings::default(),
        &LabelStyle::default(),
    )
}

#[test]
fn one_label_per_name() {
    let mut mount = Mount::new();
    let visitors = ["Ana", "Luz", "Pedro", "Ana"];
    let mut session = start(1, &mut mount, &visitors);
    let mut rng = SequenceRng::new(&[0.1, 0.5, 0.9]);

    let labels = session.on_model_loaded(&tree_bounds(), &mut rng);

    assert_eq!(labels.len(), visitors.len());
    let placed: Vec<_> = labels.iter().map(|label| label.name.as_str()).collect();
    assert_eq!(placed, visitors);
    assert_eq!(session.group().child_count(), visitors.len() + 1);
}

#[test]
fn no_names_means_no_labels() {
    let mut mount = Mount::new();
    let mut session = start(1, &mut mount, &[]);
    let mut rng = SequenceRng::new(&[0.5]);

    assert!(session.on_model_loaded(&tree_bounds(), &mut rng).is_empty());
    assert!(session.group().has_model());
}

#[test]
fn names_are_captured_at_start() {
    let mut mount = Mount::new();
    let mut visitors = names(&["Ana"]);
    let session = SceneSession::start(
        SessionId::new(1),
        &mut mount,
        &visitors,
        (800, 600),
        &SceneSettings::default(),
        &LabelStyle::default(),
    );
    visitors.push("Luz".into());

    assert_eq!(session.names().len(), 1);
}

#[test]
fn restarts_keep_a_single_session_attached() {
    let mut mount = Mount::new();
    let mut session = start(1, &mut mount, &["Ana"]);

    for id in 2..=10 {
        session.dispose(&mut mount);
        assert_eq!(mount.child_count(), 0);
        session = start(id, &mut mount, &["Ana"]);
        assert_eq!(mount.child_count(), 1);
        assert!(mount.is_attached(SessionId::new(id)));
    }
    session.dispose(&mut mount);
    assert_eq!(mount.child_count(), 0);
}

#[test]
fn starting_without_dispose_replaces_the_old_session() {
    let mut mount = Mount::new();
    let _first = start(1, &mut mount, &[]);
    let _second = start(2, &mut mount, &[]);

    assert_eq!(mount.child_count(), 1);
    assert!(!mount.is_attached(SessionId::new(1)));
    assert!(mount.is_attached(SessionId::new(2)));
}

#[test]
fn resize_updates_viewport_and_aspect() {
    let mut mount = Mount::new();
    let mut session = start(1, &mut mount, &[]);
    assert!((session.projection().aspect() - 800.0 / 600.0).abs() < 1e-6);

    session.handle_window_event(&WindowEvent::Resized(PhysicalSize::new(1200, 400)));

    assert_eq!(session.viewport(), (1200, 400));
    assert!((session.projection().aspect() - 3.0).abs() < 1e-6);
}

#[test]
fn zero_sized_resize_is_ignored() {
    let mut mount = Mount::new();
    let mut session = start(1, &mut mount, &[]);

    session.resize(0, 0);

    assert_eq!(session.viewport(), (800, 600));
}

#[test]
fn every_frame_turns_the_group() {
    let mut mount = Mount::new();
    let mut session = start(1, &mut mount, &[]);
    let step = SceneSettings::default().rotation_per_frame;

    for _ in 0..10 {
        session.frame();
    }

    assert!((session.group().rotation().0 - 10.0 * step).abs() < 1e-5);
}

#[test]
fn running_session_accepts_its_own_load() {
    let mut mount = Mount::new();
    let session = start(1, &mut mount, &["Ana"]);

    assert!(session.accepts_load(SessionId::new(1), &mount));
    assert!(!Lifecycle::Uninitialized.accepts(SessionId::new(1), &mount));
}

#[test]
fn load_after_dispose_is_dropped() {
    let mut mount = Mount::new();
    let session = start(1, &mut mount, &["Ana"]);
    session.dispose(&mut mount);

    assert!(!Lifecycle::Disposed.accepts(SessionId::new(1), &mount));
    assert_eq!(mount.child_count(), 0);
}

#[test]
fn load_from_a_replaced_run_is_dropped() {
    let mut mount = Mount::new();
    let first = start(1, &mut mount, &["Ana"]);
    let second = start(2, &mut mount, &["Ana", "Luz"]);

    assert!(!second.accepts_load(SessionId::new(1), &mount));
    assert!(!first.accepts_load(SessionId::new(1), &mount));
    assert!(second.accepts_load(SessionId::new(2), &mount));
}
