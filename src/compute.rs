//! The CPU-bound compute step.
//!
//! Each work item becomes one bcrypt hash of freshly drawn password
//! material. The bcrypt cost factor is the item's difficulty, so cost
//! doubles with every step up.

use crate::error::ComputeError;
use crate::model::{TaskResult, WorkItem};
use rand::seq::SliceRandom;

/// Lowest bcrypt cost accepted.
pub const MIN_DIFFICULTY: u32 = 4;
/// Highest bcrypt cost accepted.
pub const MAX_DIFFICULTY: u32 = 31;

/// Length of the random password drawn per item.
const PASSWORD_LEN: usize = 10;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Turns one work item into one result. Synchronous, no I/O.
///
/// Implementations must be safe to share across a run; strategies hold them
/// behind an `Arc`.
pub trait ComputeStep: Send + Sync {
    fn compute(&self, item: &WorkItem) -> Result<TaskResult, ComputeError>;
}

/// Reject difficulties the hashing function cannot honor.
pub fn validate_difficulty(difficulty: u32) -> Result<(), ComputeError> {
    if (MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&difficulty) {
        Ok(())
    } else {
        Err(ComputeError::InvalidDifficulty {
            difficulty,
            min: MIN_DIFFICULTY,
            max: MAX_DIFFICULTY,
        })
    }
}

/// bcrypt over 10 distinct random lowercase letters.
#[derive(Debug, Clone, Copy, Default)]
pub struct BcryptCompute;

impl BcryptCompute {
    fn password() -> String {
        let mut rng = rand::thread_rng();
        ALPHABET
            .choose_multiple(&mut rng, PASSWORD_LEN)
            .map(|&b| b as char)
            .collect()
    }
}

impl ComputeStep for BcryptCompute {
    fn compute(&self, item: &WorkItem) -> Result<TaskResult, ComputeError> {
        validate_difficulty(item.difficulty)?;
        let payload = bcrypt::hash(Self::password(), item.difficulty)?;
        Ok(TaskResult {
            sequence_index: item.sequence_index,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_letters_are_distinct_lowercase() {
        let pw = BcryptCompute::password();
        assert_eq!(pw.len(), PASSWORD_LEN);
        assert!(pw.bytes().all(|b| b.is_ascii_lowercase()));
        let mut bytes: Vec<u8> = pw.bytes().collect();
        bytes.sort_unstable();
        bytes.dedup();
        assert_eq!(bytes.len(), PASSWORD_LEN);
    }

    #[test]
    fn difficulty_bounds_are_inclusive() {
        assert!(validate_difficulty(MIN_DIFFICULTY).is_ok());
        assert!(validate_difficulty(MAX_DIFFICULTY).is_ok());
        assert!(validate_difficulty(MIN_DIFFICULTY - 1).is_err());
        assert!(validate_difficulty(MAX_DIFFICULTY + 1).is_err());
    }
}
