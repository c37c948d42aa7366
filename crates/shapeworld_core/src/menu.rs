//! Builder menu generation and random configuration sampling.

use crate::domain::{AttributeDomain, Pattern, Shade, Shape};
use crate::error::ConfigurationError;
use crate::object::{Configuration, ObjectState};
use crate::random::RandomSource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// One selectable entry of the builder menu.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct MenuItem {
    /// Stable id `shape-<n>`, `n` being the index before shuffling.
    pub id: String,
    /// Outline.
    pub shape: Shape,
    /// Surface pattern.
    pub texture: Pattern,
    /// Shade ordinal.
    pub shade: Shade,
}

impl MenuItem {
    /// The item as an object state.
    pub fn object(&self) -> ObjectState {
        ObjectState::new(self.shape, self.shade, self.texture)
    }
}

/// Grid coordinates of a menu item, zero-based.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, derive_new::new,
)]
pub struct MenuPosition {
    /// Row index.
    pub row: usize,
    /// Column index.
    pub column: usize,
}

/// Menu items arranged in rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct MenuLayout(Vec<Vec<MenuItem>>);

impl MenuLayout {
    /// Generates a shuffled menu of every combination in `domain`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::LayoutMismatch`] if the domain's
    /// combination count is not `rows × cols`.
    #[instrument(skip(domain, rng))]
    pub fn generate(
        domain: &AttributeDomain,
        rows: usize,
        cols: usize,
        rng: &mut dyn RandomSource,
    ) -> Result<Self, ConfigurationError> {
        let shades: Vec<Shade> = domain.shades().collect();
        let items = enumerate_combinations(domain.shapes(), domain.patterns(), &shades);
        let layout = layout(shuffle(items, rng), rows, cols)?;
        debug!(items = layout.len(), rows, cols, "Generated menu");
        Ok(layout)
    }

    /// Rows of the grid.
    pub fn rows(&self) -> &[Vec<MenuItem>] {
        &self.0
    }

    /// Total item count.
    pub fn len(&self) -> usize {
        self.0.iter().map(Vec::len).sum()
    }

    /// Whether the menu has no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up an item by id.
    pub fn find(&self, id: &str) -> Option<&MenuItem> {
        self.0.iter().flatten().find(|item| item.id == id)
    }

    /// Grid position of the item with `id`.
    pub fn position_of(&self, id: &str) -> Option<MenuPosition> {
        self.0.iter().enumerate().find_map(|(row, items)| {
            items
                .iter()
                .position(|item| item.id == id)
                .map(|column| MenuPosition::new(row, column))
        })
    }

    /// Iterates items row by row.
    pub fn iter(&self) -> impl Iterator<Item = &MenuItem> {
        self.0.iter().flatten()
    }
}

/// Full cartesian product, nested shape → texture → shade.
pub fn enumerate_combinations(
    shapes: &[Shape],
    textures: &[Pattern],
    shades: &[Shade],
) -> Vec<MenuItem> {
    shapes
        .iter()
        .flat_map(|&shape| {
            textures
                .iter()
                .flat_map(move |&texture| shades.iter().map(move |&shade| (shape, texture, shade)))
        })
        .enumerate()
        .map(|(n, (shape, texture, shade))| MenuItem {
            id: format!("shape-{}", n),
            shape,
            texture,
            shade,
        })
        .collect()
}

/// Uniform Fisher–Yates permutation driven by `rng`.
pub fn shuffle<T>(mut items: Vec<T>, rng: &mut dyn RandomSource) -> Vec<T> {
    for i in (1..items.len()).rev() {
        let j = rng.next_index(i + 1);
        items.swap(i, j);
    }
    items
}

/// Cuts `items`, in order, into `rows` rows of `cols` items.
///
/// # Errors
///
/// Returns [`ConfigurationError::LayoutMismatch`] unless `rows × cols`
/// equals the item count.
pub fn layout(items: Vec<MenuItem>, rows: usize, cols: usize) -> Result<MenuLayout, ConfigurationError> {
    if rows.checked_mul(cols) != Some(items.len()) || cols == 0 {
        return Err(ConfigurationError::LayoutMismatch {
            items: items.len(),
            rows,
            cols,
        });
    }
    let grid = items.chunks(cols).map(<[MenuItem]>::to_vec).collect();
    Ok(MenuLayout(grid))
}

/// Samples one object uniformly from `domain`.
pub fn sample_object(domain: &AttributeDomain, rng: &mut dyn RandomSource) -> ObjectState {
    let shape = domain.shapes()[rng.next_index(domain.shapes().len())];
    let color = Shade::new(Shade::MIN + rng.next_index(usize::from(*domain.max_shade())) as u8);
    let pattern = domain.patterns()[rng.next_index(domain.patterns().len())];
    ObjectState::new(shape, color, pattern)
}

/// Samples all three slots independently and uniformly, with replacement.
#[instrument(skip_all)]
pub fn sample_configuration(domain: &AttributeDomain, rng: &mut dyn RandomSource) -> Configuration {
    let a = sample_object(domain, rng);
    let b = sample_object(domain, rng);
    let c = sample_object(domain, rng);
    let configuration = Configuration::new(a, b, c);
    debug!(%configuration, "Sampled configuration");
    configuration
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::FixedRandom;

    #[test]
    fn test_enumeration_order() {
        let shades = [Shade::new(1), Shade::new(2), Shade::new(3)];
        let items = enumerate_combinations(&Shape::ALL, &Pattern::ALL, &shades);
        assert_eq!(items.len(), 27);
        assert_eq!(items[0].id, "shape-0");
        assert_eq!(items[1].shade, Shade::new(2));
        assert_eq!(items[3].texture, Pattern::Striped);
        assert_eq!(items[9].shape, Shape::Circle);
        assert_eq!(items[26].id, "shape-26");
    }

    #[test]
    fn test_layout_rejects_mismatch() {
        let shades = [Shade::new(1), Shade::new(2), Shade::new(3)];
        let items = enumerate_combinations(&Shape::ALL, &Pattern::ALL, &shades);
        assert_eq!(
            layout(items, 4, 7),
            Err(ConfigurationError::LayoutMismatch {
                items: 27,
                rows: 4,
                cols: 7
            })
        );
    }

    #[test]
    fn test_layout_keeps_order() {
        let shades = [Shade::new(1), Shade::new(2), Shade::new(3)];
        let items = enumerate_combinations(&Shape::ALL, &Pattern::ALL, &shades);
        let grid = layout(items, 3, 9).expect("27 items fit 3x9");
        assert_eq!(grid.rows()[1][0].id, "shape-9");
        assert_eq!(grid.position_of("shape-20"), Some(MenuPosition::new(2, 2)));
        assert_eq!(grid.position_of("shape-99"), None);
    }

    #[test]
    fn test_shuffle_with_zero_draws_rotates() {
        let mut rng = FixedRandom::constant(0.0);
        let shuffled = shuffle(vec![1, 2, 3, 4], &mut rng);
        assert_eq!(shuffled, vec![2, 3, 4, 1]);
        assert_eq!(rng.draws(), 3);
    }

    #[test]
    fn test_sample_configuration_within_domain() {
        let domain = AttributeDomain::builder();
        let mut rng = FixedRandom::new(vec![0.99, 0.0, 0.5]);
        let config = sample_configuration(&domain, &mut rng);
        assert!(config.check_domain(&domain).is_ok());
        assert_eq!(config.a, ObjectState::new(Shape::Triangle, Shade::new(1), Pattern::Striped));
    }
}
