//! Test discovery - build the ordered class list from loaded modules

use crate::module::Module;
use crate::suite::TestSuite;
use std::fmt;
use tracing::debug;

/// A discovered test class
#[derive(Clone, Copy)]
pub struct TestClass<'m> {
    /// Qualified name of the suite
    pub name: &'m str,
    /// Name of the module the suite came from
    pub module: &'m str,
    /// Class-level skip
    pub skip: bool,
    /// Higher priorities run first
    pub priority: i64,
    /// The suite itself
    pub suite: &'m dyn TestSuite,
}

impl fmt::Debug for TestClass<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestClass")
            .field("name", &self.name)
            .field("module", &self.module)
            .field("skip", &self.skip)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Discover every suite of every module
///
/// Classes are ordered by priority, highest first, then by name ascending.
pub fn discover(modules: &[Module]) -> Vec<TestClass<'_>> {
    let mut classes: Vec<TestClass<'_>> = modules
        .iter()
        .flat_map(|module| {
            module.suites().iter().map(move |suite| TestClass {
                name: suite.name(),
                module: module.name(),
                skip: suite.is_skipped(),
                priority: suite.priority(),
                suite: suite.as_ref(),
            })
        })
        .collect();

    sort_classes(&mut classes);

    debug!(
        target: "tally::discovery",
        modules = modules.len(),
        classes = classes.len(),
        "Discovery finished"
    );

    classes
}

fn sort_classes(classes: &mut [TestClass<'_>]) {
    classes.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(b.name)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::{Fixture, Suite};
    use pretty_assertions::assert_eq;

    struct Nothing;

    impl Fixture for Nothing {}

    fn suite(name: &str, priority: i64) -> Suite<Nothing> {
        Suite::new(name, || Nothing).priority(priority)
    }

    #[test]
    fn test_priority_then_name() {
        let module = Module::new("lib")
            .suite(suite("B", 5))
            .suite(suite("A", 0))
            .suite(suite("C", 5))
            .suite(suite("D", 3));

        let classes = discover(std::slice::from_ref(&module));
        let names: Vec<_> = classes.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["B", "C", "D", "A"]);
    }

    #[test]
    fn test_classes_across_modules() {
        let modules = vec![
            Module::new("first.so").suite(suite("z::Late", 0)),
            Module::new("second.so")
                .suite(suite("a::Early", 0))
                .suite(Suite::new("m::Skipped", || Nothing).skip()),
        ];

        let classes = discover(&modules);
        let found: Vec<_> = classes.iter().map(|c| (c.module, c.name, c.skip)).collect();
        assert_eq!(
            found,
            vec![
                ("second.so", "a::Early", false),
                ("second.so", "m::Skipped", true),
                ("first.so", "z::Late", false),
            ]
        );
    }

    #[test]
    fn test_no_modules() {
        assert!(discover(&[]).is_empty());
    }
}
