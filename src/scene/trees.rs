use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;

pub const TREES_PER_BAND: usize = 20;

/// Integer ground strips around the cabin, as (x range, z range).
const BANDS: [(RangeInclusive<i32>, RangeInclusive<i32>); 4] = [
    // In front of the cabin.
    (-25..=24, 4..=18),
    // Behind it.
    (-25..=24, -25..=-5),
    // Right side.
    (4..=24, -25..=24),
    // Left side.
    (-25..=-5, -26..=23),
];

/// Ground positions of the scattered trees. Generated once, read-only after.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeInstanceList {
    positions: Vec<Vector3<f32>>,
}

impl TreeInstanceList {
    /// Scatters `4 * TREES_PER_BAND` trees. The same seed always yields the
    /// same forest; `None` draws a seed from the OS.
    pub fn scatter(seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let positions = BANDS
            .iter()
            .flat_map(|(xs, zs)| {
                (0..TREES_PER_BAND)
                    .map(|_| {
                        let x = rng.random_range(xs.clone());
                        let z = rng.random_range(zs.clone());
                        Vector3::new(x as f32, 0.0, z as f32)
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        Self { positions }
    }

    pub fn from_positions(positions: Vec<Vector3<f32>>) -> Self {
        Self { positions }
    }

    pub fn positions(&self) -> &[Vector3<f32>] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_forest() {
        assert_eq!(TreeInstanceList::scatter(Some(7)), TreeInstanceList::scatter(Some(7)));
        assert_ne!(TreeInstanceList::scatter(Some(7)), TreeInstanceList::scatter(Some(8)));
    }

    #[test]
    fn eighty_trees_inside_their_bands() {
        let trees = TreeInstanceList::scatter(Some(42));
        assert_eq!(trees.len(), 80);

        for (band, chunk) in BANDS.iter().zip(trees.positions().chunks(TREES_PER_BAND)) {
            let (xs, zs) = band;
            for p in chunk {
                assert!(xs.contains(&(p.x as i32)));
                assert!(zs.contains(&(p.z as i32)));
                assert_eq!(p.y, 0.0);
                assert_eq!(p.x.fract(), 0.0);
            }
        }
    }

    #[test]
    fn unseeded_scatter_still_fills_every_band() {
        assert_eq!(TreeInstanceList::scatter(None).len(), 4 * TREES_PER_BAND);
    }
}
