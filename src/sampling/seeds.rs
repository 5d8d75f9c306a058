//! Seed planning: converting coarse class grids into shuffled level-0 coordinates
//!
//! Every matching grid cell becomes exactly one seed. Cell `(i, j)` maps to
//! `(floor(i * factor), floor(j * factor))` where `factor` is the downsample
//! of the grid relative to level 0. The order is shuffled with the caller's
//! random source so runs are reproducible when the source is seeded.

use ndarray::Array2;
use num_traits::PrimInt;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::io::error::{Result, SamplingError, invalid_parameter};
use crate::sampling::sources::{ClassLabel, Seed};

/// Non-restartable sequence of seeds for one class
///
/// Seeds are handed out once, in shuffled order; a consumed seed cannot be
/// observed again through the sequence.
#[derive(Debug)]
pub struct SeedSequence {
    seeds: std::vec::IntoIter<Seed>,
}

impl SeedSequence {
    /// Wrap already ordered seeds
    pub fn from_seeds(seeds: Vec<Seed>) -> Self {
        Self {
            seeds: seeds.into_iter(),
        }
    }

    /// Seeds not yet consumed
    pub fn remaining(&self) -> usize {
        self.seeds.len()
    }
}

impl Iterator for SeedSequence {
    type Item = Seed;

    fn next(&mut self) -> Option<Seed> {
        self.seeds.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.seeds.size_hint()
    }
}

impl ExactSizeIterator for SeedSequence {}

/// Seeds planned for one class
#[derive(Debug)]
pub struct ClassSeeds {
    /// Class the seeds were drawn from
    pub class: ClassLabel,
    /// Shuffled seed sequence
    pub seeds: SeedSequence,
}

fn validate_factor(factor: f64) -> Result<()> {
    if factor.is_finite() && factor > 0.0 {
        Ok(())
    } else {
        Err(invalid_parameter(
            "downsample_factor",
            &factor,
            &"must be positive and finite",
        ))
    }
}

/// Plan seeds for every cell satisfying `matches`
///
/// # Errors
///
/// Returns an error if `factor` is not positive and finite
pub fn plan_matching<T, F, R>(
    grid: &Array2<T>,
    factor: f64,
    matches: F,
    rng: &mut R,
) -> Result<SeedSequence>
where
    T: PrimInt,
    F: Fn(T) -> bool,
    R: Rng + ?Sized,
{
    validate_factor(factor)?;

    let mut seeds: Vec<Seed> = grid
        .indexed_iter()
        .filter(|&(_, &value)| matches(value))
        .map(|((i, j), _)| {
            Seed::new(
                (i as f64 * factor).floor() as u64,
                (j as f64 * factor).floor() as u64,
            )
        })
        .collect();
    seeds.shuffle(rng);

    Ok(SeedSequence::from_seeds(seeds))
}

/// Plan seeds for one class: nonzero cells for class 0, equal cells otherwise
///
/// # Errors
///
/// Returns an error if `factor` is not positive and finite
pub fn plan_class<T, R>(
    grid: &Array2<T>,
    factor: f64,
    class: T,
    rng: &mut R,
) -> Result<SeedSequence>
where
    T: PrimInt,
    R: Rng + ?Sized,
{
    if class.is_zero() {
        plan_matching(grid, factor, |value: T| !value.is_zero(), rng)
    } else {
        plan_matching(grid, factor, |value: T| value == class, rng)
    }
}

/// Distinct annotated classes of a label grid, ascending, without class 0
///
/// # Errors
///
/// Returns `MissingUnannotatedClass` if the smallest value is not `0` or the
/// grid is empty
pub fn discover_classes<T>(grid: &Array2<T>) -> Result<Vec<T>>
where
    T: PrimInt,
{
    let mut classes: Vec<T> = grid.iter().copied().collect();
    classes.sort_unstable();
    classes.dedup();

    let smallest = classes.first().copied();
    match smallest {
        Some(value) if value.is_zero() => Ok(classes.split_off(1)),
        _ => Err(SamplingError::MissingUnannotatedClass {
            smallest: smallest.and_then(|value| value.to_u32()),
        }),
    }
}

/// Build the class list: class 0 from the tissue grid, then one entry per
/// annotated class
///
/// # Errors
///
/// Returns an error if:
/// - Either downsample factor is not positive and finite
/// - The annotation grid has no class 0
pub fn plan_classes<R>(
    tissue: &Array2<u32>,
    tissue_factor: f64,
    annotation: Option<(&Array2<u32>, f64)>,
    rng: &mut R,
) -> Result<Vec<ClassSeeds>>
where
    R: Rng + ?Sized,
{
    let mut classes = vec![ClassSeeds {
        class: 0,
        seeds: plan_class(tissue, tissue_factor, 0, &mut *rng)?,
    }];

    let Some((grid, factor)) = annotation else {
        return Ok(classes);
    };

    for class in discover_classes(grid)? {
        classes.push(ClassSeeds {
            class,
            seeds: plan_class(grid, factor, class, &mut *rng)?,
        });
    }

    Ok(classes)
}
