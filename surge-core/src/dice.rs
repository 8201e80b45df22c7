//! Dice for hit die healing and flavor selection.
//!
//! The host supplies randomness through [`DiceSource`]. Two implementations
//! live here: [`ThreadRngDice`] for normal play and [`SeededDice`] for
//! reproducible sessions.

use crate::host::HostError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Mutex;
use thiserror::Error;

/// Error type for die construction and rolling.
#[derive(Debug, Error)]
pub enum DiceError {
    #[error("Invalid die size: {0}")]
    InvalidDieSize(i64),
    #[error("Cannot pick from an empty list")]
    EmptyChoice,
}

/// A single die with a fixed number of faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Die {
    sides: u32,
}

impl Die {
    pub fn new(sides: i64) -> Result<Self, DiceError> {
        match u32::try_from(sides) {
            Ok(sides) if sides >= 1 => Ok(Self { sides }),
            _ => Err(DiceError::InvalidDieSize(sides)),
        }
    }

    pub fn sides(&self) -> u32 {
        self.sides
    }

    /// Roll with a specific RNG (useful for testing).
    pub fn roll_with_rng<R: Rng>(&self, rng: &mut R) -> u32 {
        rng.gen_range(1..=self.sides)
    }
}

impl fmt::Display for Die {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides)
    }
}

/// Source of randomness supplied by the host.
pub trait DiceSource {
    /// Roll one die, returning a value in `1..=sides`.
    fn roll_die(&self, sides: u32) -> Result<u32, HostError>;

    /// Pick an index uniformly from `0..len`.
    fn pick_index(&self, len: usize) -> Result<usize, HostError>;
}

/// Pick one element of `items` uniformly at random.
pub fn pick_random<'a, T, D>(dice: &D, items: &'a [T]) -> Result<&'a T, HostError>
where
    D: DiceSource + ?Sized,
{
    if items.is_empty() {
        return Err(DiceError::EmptyChoice.into());
    }
    let index = dice.pick_index(items.len())?;
    items
        .get(index)
        .ok_or(HostError::Dice(DiceError::EmptyChoice))
}

fn checked_die(sides: u32) -> Result<Die, HostError> {
    Ok(Die::new(i64::from(sides))?)
}

/// Dice backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngDice;

impl DiceSource for ThreadRngDice {
    fn roll_die(&self, sides: u32) -> Result<u32, HostError> {
        let die = checked_die(sides)?;
        Ok(die.roll_with_rng(&mut rand::thread_rng()))
    }

    fn pick_index(&self, len: usize) -> Result<usize, HostError> {
        if len == 0 {
            return Err(DiceError::EmptyChoice.into());
        }
        Ok(rand::thread_rng().gen_range(0..len))
    }
}

/// Dice backed by a seeded RNG, for reproducible sessions.
#[derive(Debug)]
pub struct SeededDice {
    rng: Mutex<StdRng>,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> Result<T, HostError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| HostError::Unavailable("dice RNG lock poisoned".to_string()))?;
        Ok(f(&mut rng))
    }
}

impl DiceSource for SeededDice {
    fn roll_die(&self, sides: u32) -> Result<u32, HostError> {
        let die = checked_die(sides)?;
        self.with_rng(|rng| die.roll_with_rng(rng))
    }

    fn pick_index(&self, len: usize) -> Result<usize, HostError> {
        if len == 0 {
            return Err(DiceError::EmptyChoice.into());
        }
        self.with_rng(|rng| rng.gen_range(0..len))
    }
}
