use name_tree::{
    config::LabelStyle,
    scene::{LabelPlacement, labels::plan_labels},
};

use crate::common::test_utils::{SequenceRng, names};

mod common;

const HEIGHT: f32 = 4.0;

fn plan_with_seed(seed: u64, visitors: &[&str]) -> Vec<LabelPlacement> {
    let mut rng = fastrand::Rng::with_seed(seed);
    plan_labels(&names(visitors), &LabelStyle::default(), HEIGHT, &mut rng)
}

#[test]
fn same_seed_same_layout() {
    let visitors = ["Ana", "Luz", "Pedro", "Marta", "Jon"];

    assert_eq!(plan_with_seed(42, &visitors), plan_with_seed(42, &visitors));
}

#[test]
fn different_seeds_move_labels() {
    let visitors = ["Ana", "Luz", "Pedro"];

    assert_ne!(plan_with_seed(1, &visitors), plan_with_seed(2, &visitors));
}

#[test]
fn labels_stay_inside_the_spread_box() {
    let style = LabelStyle::default();
    let half_width = style.spread[0] * HEIGHT / 2.0;
    let half_depth = style.spread[1] * HEIGHT / 2.0;

    for placement in plan_with_seed(7, &["a"; 200]) {
        let p = placement.position;
        assert!(p.x >= -half_width && p.x < half_width, "{p:?}");
        assert!(p.y >= 0.0 && p.y < HEIGHT, "{p:?}");
        assert!(p.z >= -half_depth && p.z < half_depth, "{p:?}");
    }
}

#[test]
fn extreme_samples_hit_the_box_edges() {
    let style = LabelStyle::default();
    let mut rng = SequenceRng::new(&[0.0, 0.0, 0.0, 0.5, 0.5, 0.5]);

    let placements = plan_labels(&names(&["low", "mid"]), &style, HEIGHT, &mut rng);

    let low = placements[0].position;
    assert_eq!(low.x, -style.spread[0] * HEIGHT / 2.0);
    assert_eq!(low.y, 0.0);
    assert_eq!(low.z, -style.spread[1] * HEIGHT / 2.0);
    let mid = placements[1].position;
    assert_eq!((mid.x, mid.y, mid.z), (0.0, HEIGHT / 2.0, 0.0));
}
