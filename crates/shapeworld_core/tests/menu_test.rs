//! Tests for builder menu generation.

use shapeworld_core::{AttributeDomain, MenuLayout, SeededRandom, ShapeSkin, sample_configuration};
use std::collections::HashSet;

#[test]
fn test_default_menu_is_three_by_nine() {
    let domain = AttributeDomain::builder();
    let mut rng = SeededRandom::new(5);
    let menu = MenuLayout::generate(&domain, 3, 9, &mut rng).expect("27 items fit");

    assert_eq!(menu.len(), 27);
    assert_eq!(menu.rows().len(), 3);
    assert!(menu.rows().iter().all(|row| row.len() == 9));
}

#[test]
fn test_menu_is_permutation_of_all_combinations() {
    let domain = AttributeDomain::builder();
    let mut rng = SeededRandom::new(11);
    let menu = MenuLayout::generate(&domain, 3, 9, &mut rng).expect("27 items fit");

    let ids: HashSet<&str> = menu.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids.len(), 27, "Menu ids must be unique");
    for n in 0..27 {
        assert!(ids.contains(format!("shape-{}", n).as_str()));
    }

    let combos: HashSet<_> = menu.iter().map(|item| (item.shape, item.texture, item.shade)).collect();
    assert_eq!(combos.len(), 27, "Every combination appears once");
}

#[test]
fn test_menu_is_reproducible_with_seed() {
    let domain = AttributeDomain::builder();
    let first = MenuLayout::generate(&domain, 3, 9, &mut SeededRandom::new(3)).expect("fits");
    let second = MenuLayout::generate(&domain, 3, 9, &mut SeededRandom::new(3)).expect("fits");
    assert_eq!(first, second);
}

#[test]
fn test_menu_rejects_wrong_grid() {
    let domain = AttributeDomain::builder();
    let mut rng = SeededRandom::new(5);
    assert!(MenuLayout::generate(&domain, 5, 5, &mut rng).is_err());
}

#[test]
fn test_position_lookup_matches_grid() {
    let domain = AttributeDomain::builder().with_skin(ShapeSkin::Star);
    let mut rng = SeededRandom::new(8);
    let menu = MenuLayout::generate(&domain, 3, 9, &mut rng).expect("fits");
    let target = &menu.rows()[2][4];
    let position = menu.position_of(&target.id).expect("present");
    assert_eq!((position.row, position.column), (2, 4));
    assert_eq!(menu.find(&target.id), Some(target));
}

#[test]
fn test_sampled_configurations_stay_in_domain() {
    let domain = AttributeDomain::builder();
    let mut rng = SeededRandom::new(99);
    for _ in 0..500 {
        let config = sample_configuration(&domain, &mut rng);
        assert!(config.check_domain(&domain).is_ok());
    }
}
