//! Assertion helpers returning [`TestResult`]
//!
//! Plain `assert!` works inside test bodies too (panics are caught), these
//! helpers just report without unwinding.

use crate::failure::{Failure, TestResult};
use std::fmt::Debug;

/// Type tag of failed assertions
pub const ASSERTION_TAG: &str = "assertion";

/// Fail with `message` unless `condition` holds
#[track_caller]
pub fn ensure(condition: bool, message: impl Into<String>) -> TestResult {
    if condition {
        Ok(())
    } else {
        Err(Failure::new(ASSERTION_TAG, message))
    }
}

/// Fail unless `expected == actual`
#[track_caller]
pub fn ensure_eq<T: PartialEq + Debug>(expected: T, actual: T) -> TestResult {
    if expected == actual {
        Ok(())
    } else {
        Err(Failure::new(
            ASSERTION_TAG,
            format!("expected {:?}, got {:?}", expected, actual),
        ))
    }
}

/// Fail unless both sequences yield equal items in the same order
#[track_caller]
pub fn assert_sequence_eq<T, E, A>(expected: E, actual: A) -> TestResult
where
    T: PartialEq + Debug,
    E: IntoIterator<Item = T>,
    A: IntoIterator<Item = T>,
{
    let expected: Vec<T> = expected.into_iter().collect();
    let actual: Vec<T> = actual.into_iter().collect();
    if expected == actual {
        return Ok(());
    }
    Err(Failure::new(
        ASSERTION_TAG,
        format!("sequences differ: expected {:?}, got {:?}", expected, actual),
    ))
}

/// Fail unless both collections have the same length and the same members
#[track_caller]
pub fn assert_set_eq<T, E, A>(expected: E, actual: A) -> TestResult
where
    T: PartialEq + Debug,
    E: IntoIterator<Item = T>,
    A: IntoIterator<Item = T>,
{
    let expected: Vec<T> = expected.into_iter().collect();
    let actual: Vec<T> = actual.into_iter().collect();

    if expected.len() != actual.len() {
        return Err(Failure::new(
            ASSERTION_TAG,
            format!(
                "sets differ in size: expected {} item(s), got {}",
                expected.len(),
                actual.len()
            ),
        ));
    }

    let missing: Vec<&T> = expected.iter().filter(|item| !actual.contains(item)).collect();
    let extra: Vec<&T> = actual.iter().filter(|item| !expected.contains(item)).collect();
    if missing.is_empty() && extra.is_empty() {
        Ok(())
    } else {
        Err(Failure::new(
            ASSERTION_TAG,
            format!("sets differ: missing {:?}, unexpected {:?}", missing, extra),
        ))
    }
}
