//! Sample test module
//!
//! Built as a `cdylib`, this crate can be handed straight to the runner:
//!
//! ```text
//! cargo build -p tally-sample
//! tally target/debug/libtally_sample.so
//! ```
//!
//! It shows priorities, skipped suites and methods, parameterized and
//! generic methods, and one failing method whose cause chain comes from a
//! `std::error::Error` source. The run therefore exits with status 1.

use std::fmt::Debug;
use std::ops::Add;
use tally_core::{
    arg, args, assert_sequence_eq, assert_set_eq, ensure, ensure_eq, skip, FromValue, Fixture, Method, Module,
    Param, Suite, TestResult, TypeTag, Value,
};
use thiserror::Error;

/// Entry point exported to the runner
pub fn module() -> Module {
    Module::new("tally-sample")
        .suite(arithmetic())
        .suite(collections())
        .suite(storage())
        .suite(network())
}

tally_core::declare_module!(module);

// ============================================================================
// Arithmetic
// ============================================================================

#[derive(Default)]
struct Calculator {
    memory: i64,
}

impl Fixture for Calculator {
    fn init(&mut self) -> TestResult {
        self.memory = 0;
        Ok(())
    }
}

fn doubles<T>(_: &mut Calculator, args: &[Value]) -> TestResult
where
    T: FromValue + Add<Output = T> + Copy + PartialEq + Debug,
{
    let value: T = arg(args, 0)?;
    let twice: T = arg(args, 1)?;
    ensure_eq(twice, value + value)
}

fn arithmetic() -> Suite<Calculator> {
    Suite::new("sample::Arithmetic", Calculator::default)
        .priority(10)
        .method(
            Method::parameterized("adds", |calc: &mut Calculator, args: &[Value]| {
                let a: i32 = arg(args, 0)?;
                let b: i32 = arg(args, 1)?;
                let sum: i32 = arg(args, 2)?;
                calc.memory = i64::from(a) + i64::from(b);
                ensure_eq(i64::from(sum), calc.memory)
            })
            .params([Param::of(TypeTag::I32), Param::of(TypeTag::I32), Param::of(TypeTag::I32)])
            .case(args![1, 2, 3])
            .case(args![2, 2, 4])
            .case(args![-1, 1, 0]),
        )
        .test("rejects_division_by_zero", |_| ensure(10i32.checked_div(0).is_none(), "10 / 0 produced a value"))
        .method(
            Method::generic("doubles", [Param::generic("T"), Param::generic("T")], |types| match types {
                [TypeTag::I32] => Some(doubles::<i32>),
                [TypeTag::U8] => Some(doubles::<u8>),
                [TypeTag::F64] => Some(doubles::<f64>),
                _ => None,
            })
            .case(args![21i32, 42i32])
            .case(args![7u8, 14u8])
            .case(args![1.25f64, 2.5f64]),
        )
        .method(Method::new("reports_overflow", |_| ensure(200u8.checked_add(100).is_none(), "no overflow")).skip())
}

// ============================================================================
// Collections
// ============================================================================

#[derive(Default)]
struct Bag {
    items: Vec<&'static str>,
}

impl Fixture for Bag {
    fn init(&mut self) -> TestResult {
        self.items = vec!["pear", "apple", "fig", "apple"];
        Ok(())
    }

    fn cleanup(&mut self) -> TestResult {
        self.items.clear();
        Ok(())
    }
}

fn collections() -> Suite<Bag> {
    Suite::new("sample::Collections", Bag::default)
        .priority(5)
        .test("sorts", |bag| {
            bag.items.sort_unstable();
            assert_sequence_eq(["apple", "apple", "fig", "pear"], bag.items.iter().copied())
        })
        .test("dedups", |bag| {
            bag.items.sort_unstable();
            bag.items.dedup();
            assert_set_eq(["fig", "pear", "apple"], bag.items.iter().copied())
        })
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Error, Debug)]
#[error("quota of {limit} bytes exceeded")]
struct QuotaExceeded {
    limit: usize,
}

#[derive(Error, Debug)]
#[error("could not write '{name}'")]
struct WriteError {
    name: String,
    #[source]
    source: QuotaExceeded,
}

/// A store that is always full
struct FullDisk {
    limit: usize,
}

impl FullDisk {
    fn write(&self, name: &str, bytes: &[u8]) -> Result<(), WriteError> {
        if bytes.len() <= self.limit {
            return Ok(());
        }
        Err(WriteError {
            name: name.to_string(),
            source: QuotaExceeded { limit: self.limit },
        })
    }
}

impl Fixture for FullDisk {}

fn storage() -> Suite<FullDisk> {
    Suite::new("sample::Storage", || FullDisk { limit: 0 })
        .test("writes_report", |disk| {
            disk.write("report.txt", b"results")?;
            Ok(())
        })
        .test("compacts", |_| skip())
}

// ============================================================================
// Network
// ============================================================================

struct Offline;

impl Fixture for Offline {
    fn static_init(&mut self) -> TestResult {
        ensure(false, "no network in the sample")
    }
}

fn network() -> Suite<Offline> {
    Suite::new("sample::Network", || Offline)
        .skip()
        .test("connects", |_| Ok(()))
        .test("retries", |_| Ok(()))
}
