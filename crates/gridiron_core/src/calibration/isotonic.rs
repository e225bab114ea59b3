//! Isotonic regression (pool-adjacent-violators)
//!
//! The fitted table holds one point per pooled block: the weighted mean z of
//! the block, kept inside the block's z range, and its outcome rate. Prediction interpolates linearly between
//! neighbouring block centers and is flat beyond the end points, so the
//! mapping is non-decreasing everywhere.

use serde::{Deserialize, Serialize};

use super::CalibrationSample;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsotonicTable {
    /// Block centers, strictly increasing
    pub knots: Vec<f64>,
    /// Outcome rate per block, non-decreasing
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
struct Block {
    z_sum: f64,
    z_lo: f64,
    z_hi: f64,
    y_sum: f64,
    weight: f64,
}

impl Block {
    fn rate(&self) -> f64 {
        self.y_sum / self.weight
    }

    /// Exact for a block of tied z, otherwise held inside the block's z range.
    fn center(&self) -> f64 {
        if self.z_lo == self.z_hi {
            return self.z_lo;
        }
        (self.z_sum / self.weight).clamp(self.z_lo, self.z_hi)
    }

    fn absorb(&mut self, other: Block) {
        self.z_sum += other.z_sum;
        self.z_lo = self.z_lo.min(other.z_lo);
        self.z_hi = self.z_hi.max(other.z_hi);
        self.y_sum += other.y_sum;
        self.weight += other.weight;
    }
}

impl IsotonicTable {
    /// Fit on finite samples. Returns `None` for an empty input.
    pub fn fit(samples: &[CalibrationSample]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted: Vec<(f64, f64)> = samples
            .iter()
            .map(|s| (s.z, if s.outcome { 1.0 } else { 0.0 }))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Tied z values start out in a single block. Input is sorted, so a tie
        // is always with the largest raw z of the last block.
        let mut blocks: Vec<Block> = Vec::with_capacity(sorted.len());
        for (z, y) in sorted {
            let next = Block {
                z_sum: z,
                z_lo: z,
                z_hi: z,
                y_sum: y,
                weight: 1.0,
            };
            match blocks.last_mut() {
                Some(last) if last.z_hi == z => last.absorb(next),
                _ => blocks.push(next),
            }

            while blocks.len() >= 2 {
                let n = blocks.len();
                if blocks[n - 2].rate() <= blocks[n - 1].rate() {
                    break;
                }
                if let Some(top) = blocks.pop() {
                    blocks[n - 2].absorb(top);
                }
            }
        }

        Some(Self {
            knots: blocks.iter().map(Block::center).collect(),
            values: blocks.iter().map(Block::rate).collect(),
        })
    }

    pub fn predict(&self, z: f64) -> f64 {
        let (Some(&first_x), Some(&last_x)) = (self.knots.first(), self.knots.last()) else {
            return 0.5;
        };
        if z.is_nan() {
            return 0.5;
        }
        if z <= first_x {
            return self.values[0];
        }
        if z >= last_x {
            return self.values[self.values.len() - 1];
        }

        // First knot strictly greater than z; 1..len by the bounds above.
        let hi = self.knots.partition_point(|&k| k <= z);
        let lo = hi - 1;
        let (x0, x1) = (self.knots[lo], self.knots[hi]);
        let (y0, y1) = (self.values[lo], self.values[hi]);
        let t = (z - x0) / (x1 - x0);
        y0 + t * (y1 - y0)
    }

    /// Outcome-rate rise from the lowest to the highest block.
    pub fn rise(&self) -> f64 {
        match (self.values.first(), self.values.last()) {
            (Some(lo), Some(hi)) => hi - lo,
            _ => 0.0,
        }
    }

    /// Consistency check used after deserialization.
    pub fn is_well_formed(&self) -> bool {
        !self.knots.is_empty()
            && self.knots.len() == self.values.len()
            && self.knots.iter().chain(&self.values).all(|v| v.is_finite())
            && self.knots.windows(2).all(|w| w[0] < w[1])
            && self.values.windows(2).all(|w| w[0] <= w[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(z: f64, outcome: bool) -> CalibrationSample {
        CalibrationSample { z, outcome }
    }

    #[test]
    fn test_already_monotone_keeps_points() {
        let samples = vec![sample(-1.0, false), sample(0.0, false), sample(1.0, true)];
        let table = IsotonicTable::fit(&samples).unwrap();
        assert_eq!(table.knots, vec![-1.0, 0.0, 1.0]);
        assert_eq!(table.values, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_violators_are_pooled() {
        let samples = vec![
            sample(-2.0, false),
            sample(-1.0, true),
            sample(0.0, false),
            sample(1.0, true),
        ];
        let table = IsotonicTable::fit(&samples).unwrap();
        // (-1, 1) and (0, 0) pool into one block at z = -0.5 with rate 0.5.
        assert_eq!(table.knots, vec![-2.0, -0.5, 1.0]);
        assert_eq!(table.values, vec![0.0, 0.5, 1.0]);
        assert!(table.is_well_formed());
    }

    #[test]
    fn test_ties_share_a_block() {
        let samples = vec![sample(0.5, true), sample(0.5, false), sample(0.5, true)];
        let table = IsotonicTable::fit(&samples).unwrap();
        assert_eq!(table.knots.len(), 1);
        assert!((table.values[0] - 2.0 / 3.0).abs() < 1e-12);
        assert!((table.predict(-3.0) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_repeated_inexact_z_pools_into_one_block() {
        let samples = vec![
            sample(0.1, false),
            sample(0.1, false),
            sample(0.1, true),
            sample(0.1, true),
        ];
        let table = IsotonicTable::fit(&samples).unwrap();
        assert!(table.is_well_formed());
        assert_eq!(table.knots, vec![0.1]);
        assert_eq!(table.values, vec![0.5]);
    }

    #[test]
    fn test_pooled_center_stays_between_neighbours() {
        // Ties at a non-dyadic z on both sides of a pooled violator.
        let samples = vec![
            sample(0.1, true),
            sample(0.1, true),
            sample(0.1, true),
            sample(0.2, false),
            sample(0.2, false),
            sample(0.3, true),
            sample(0.3, false),
            sample(0.7, true),
        ];
        let table = IsotonicTable::fit(&samples).unwrap();
        assert!(table.is_well_formed());
        assert!(table.knots.iter().all(|k| (0.1..=0.7).contains(k)));
    }

    #[test]
    fn test_interpolation_and_flat_tails() {
        let table = IsotonicTable {
            knots: vec![-1.0, 1.0],
            values: vec![0.2, 0.6],
        };
        assert!((table.predict(0.0) - 0.4).abs() < 1e-12);
        assert!((table.predict(-5.0) - 0.2).abs() < 1e-12);
        assert!((table.predict(5.0) - 0.6).abs() < 1e-12);
        assert!((table.predict(1.0) - 0.6).abs() < 1e-12);
        assert!((table.rise() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input() {
        assert!(IsotonicTable::fit(&[]).is_none());
    }

    proptest! {
        #[test]
        fn prop_fit_is_monotone(
            points in prop::collection::vec((-3.0f64..3.0, any::<bool>()), 1..200)
        ) {
            let samples: Vec<_> = points.iter().map(|&(z, y)| sample(z, y)).collect();
            let table = IsotonicTable::fit(&samples).unwrap();
            prop_assert!(table.is_well_formed());

            let mut prev = f64::NEG_INFINITY;
            for i in 0..=120 {
                let z = -3.5 + i as f64 * (7.0 / 120.0);
                let p = table.predict(z);
                prop_assert!((0.0..=1.0).contains(&p));
                prop_assert!(p >= prev - 1e-12);
                prev = p;
            }
        }

        #[test]
        fn prop_fit_with_heavy_ties_is_well_formed(
            points in prop::collection::vec((0usize..6, any::<bool>()), 1..300)
        ) {
            const GRID: [f64; 6] = [-0.3, -0.1, 0.1, 0.2, 0.3, 0.7];
            let samples: Vec<_> = points.iter().map(|&(i, y)| sample(GRID[i], y)).collect();
            let table = IsotonicTable::fit(&samples).unwrap();
            prop_assert!(table.is_well_formed());
            prop_assert!(table.knots.len() <= GRID.len());
            for k in &table.knots {
                prop_assert!((GRID[0]..=GRID[5]).contains(k));
            }
        }
    }
}
