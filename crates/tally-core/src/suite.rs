//! Suite registration
//!
//! Test suites are registered explicitly: a [`Suite`] owns a constructor for
//! its fixture type and a list of [`Method`]s. The runner sees suites
//! through the object-safe [`TestSuite`] capability, queried once at
//! discovery time.
//!
//! # Example
//!
//! ```
//! use tally_core::{args, ensure_eq, Fixture, Method, Param, Suite, TestResult, TypeTag, Value};
//!
//! #[derive(Default)]
//! struct Counter {
//!     hits: u32,
//! }
//!
//! impl Fixture for Counter {
//!     fn init(&mut self) -> TestResult {
//!         self.hits = 0;
//!         Ok(())
//!     }
//! }
//!
//! fn doubles<T: tally_core::FromValue + std::ops::Add<Output = T> + Copy + PartialEq + std::fmt::Debug>(
//!     _: &mut Counter,
//!     args: &[Value],
//! ) -> TestResult {
//!     let x: T = tally_core::arg(args, 0)?;
//!     let twice: T = tally_core::arg(args, 1)?;
//!     ensure_eq(twice, x + x)
//! }
//!
//! let suite = Suite::new("counter::Counter", Counter::default)
//!     .priority(2)
//!     .test("increments", |c| {
//!         c.hits += 1;
//!         ensure_eq(1, c.hits)
//!     })
//!     .method(
//!         Method::generic("doubles", [Param::generic("T"), Param::generic("T")], |types| {
//!             match types {
//!                 [TypeTag::I32] => Some(doubles::<i32>),
//!                 [TypeTag::F64] => Some(doubles::<f64>),
//!                 _ => None,
//!             }
//!         })
//!         .case(args![2i32, 4i32])
//!         .case(args![1.5f64, 3.0f64]),
//!     );
//! # let _ = suite;
//! ```

use crate::failure::{Failure, TestResult};
use crate::value::{TypeTag, Value};
use std::fmt;
use thiserror::Error;

/// Type tag of generic binding failures
pub const BINDING_TAG: &str = "binding";

/// Lifecycle hooks of a fixture type. Every hook defaults to a no-op.
pub trait Fixture {
    /// Runs once after construction, before any invocation
    fn static_init(&mut self) -> TestResult {
        Ok(())
    }

    /// Runs once after the last invocation
    fn static_cleanup(&mut self) -> TestResult {
        Ok(())
    }

    /// Runs before every invocation
    fn init(&mut self) -> TestResult {
        Ok(())
    }

    /// Runs after every successful invocation
    fn cleanup(&mut self) -> TestResult {
        Ok(())
    }
}

/// A monomorphized body selected by a generic method's binder
pub type BodyFn<T> = fn(&mut T, &[Value]) -> TestResult;

type FixedBody<T> = Box<dyn Fn(&mut T, &[Value]) -> TestResult>;
type Binder<T> = Box<dyn Fn(&[TypeTag]) -> Option<BodyFn<T>>>;

enum MethodBody<T> {
    Fixed(FixedBody<T>),
    Generic(Binder<T>),
}

/// Declared parameter of a test method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Concrete(TypeTag),
    /// A generic type parameter, bound per invocation from its argument
    Generic(String),
}

impl Param {
    pub fn of(tag: TypeTag) -> Self {
        Param::Concrete(tag)
    }

    pub fn generic(name: impl Into<String>) -> Self {
        Param::Generic(name.into())
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Concrete(tag) => write!(f, "{}", tag),
            Param::Generic(name) => f.write_str(name),
        }
    }
}

/// Why a generic method could not be bound to an argument set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("generic parameter '{param}' at position {position} has no argument ({given} given)")]
    MissingArgument {
        param: String,
        position: usize,
        given: usize,
    },

    #[error("generic parameter '{param}' bound to both {first} and {second}")]
    Conflict {
        param: String,
        first: TypeTag,
        second: TypeTag,
    },

    #[error("no instantiation for type arguments <{0}>")]
    Unsupported(String),
}

/// Infer the type arguments of a generic method from an argument set
///
/// Type parameters are returned in order of first appearance. Every generic
/// position is bound to the runtime type of the argument at that position.
pub fn bind_type_arguments(params: &[Param], args: &[Value]) -> Result<Vec<TypeTag>, BindingError> {
    let mut bound: Vec<(&str, TypeTag)> = Vec::new();

    for (position, param) in params.iter().enumerate() {
        let Param::Generic(name) = param else {
            continue;
        };
        let tag = args
            .get(position)
            .map(Value::type_tag)
            .ok_or_else(|| BindingError::MissingArgument {
                param: name.clone(),
                position,
                given: args.len(),
            })?;

        match bound.iter().find(|(bound_name, _)| *bound_name == name.as_str()) {
            Some((_, first)) if *first != tag => {
                return Err(BindingError::Conflict {
                    param: name.clone(),
                    first: first.clone(),
                    second: tag,
                });
            }
            Some(_) => {}
            None => bound.push((name.as_str(), tag)),
        }
    }

    Ok(bound.into_iter().map(|(_, tag)| tag).collect())
}

/// A registered test method
pub struct Method<T> {
    name: String,
    params: Vec<Param>,
    cases: Vec<Vec<Value>>,
    skip: bool,
    body: MethodBody<T>,
}

impl<T> Method<T> {
    /// A method without parameters
    pub fn new(name: impl Into<String>, body: impl Fn(&mut T) -> TestResult + 'static) -> Self {
        Self::parameterized(name, move |fixture, _| body(fixture))
    }

    /// A method receiving the literal arguments of each case
    pub fn parameterized(
        name: impl Into<String>,
        body: impl Fn(&mut T, &[Value]) -> TestResult + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            cases: Vec::new(),
            skip: false,
            body: MethodBody::Fixed(Box::new(body)),
        }
    }

    /// A generic method; `binder` maps inferred type arguments to a body
    pub fn generic(
        name: impl Into<String>,
        params: impl IntoIterator<Item = Param>,
        binder: impl Fn(&[TypeTag]) -> Option<BodyFn<T>> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params: params.into_iter().collect(),
            cases: Vec::new(),
            skip: false,
            body: MethodBody::Generic(Box::new(binder)),
        }
    }

    /// Declare the parameter signature shown in the report
    pub fn params(mut self, params: impl IntoIterator<Item = Param>) -> Self {
        self.params = params.into_iter().collect();
        self
    }

    /// Add a literal argument set
    pub fn case(mut self, args: Vec<Value>) -> Self {
        self.cases.push(args);
        self
    }

    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }
}

/// One (method, argument set) pair to execute
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub method: String,
    /// Position of the method in its suite's declaration order
    pub method_index: usize,
    pub signature: Vec<String>,
    pub args: Vec<Value>,
    pub skip: bool,
}

impl Invocation {
    /// `name(param, ...)`
    pub fn describe(&self) -> String {
        format!("{}({})", self.method, self.signature.join(", "))
    }

    /// Arguments joined for display
    pub fn display_args(&self) -> String {
        self.args
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// What the runner can ask of a registered suite
pub trait TestSuite {
    /// Qualified name
    fn name(&self) -> &str;

    fn is_skipped(&self) -> bool;

    /// Ordering priority, higher runs first
    fn priority(&self) -> i64;

    /// Every invocation, in declaration order
    fn invocations(&self) -> Vec<Invocation>;

    /// Construct a fixture instance
    fn instantiate(&self) -> Result<Box<dyn SuiteInstance + '_>, Failure>;
}

/// A constructed fixture bound to its suite
pub trait SuiteInstance {
    fn static_init(&mut self) -> TestResult;
    fn static_cleanup(&mut self) -> TestResult;
    fn init(&mut self) -> TestResult;
    fn cleanup(&mut self) -> TestResult;

    /// Resolve the body of `invocation` without running anything
    ///
    /// An invocation that fails to bind never starts: no hook runs for it.
    fn bind(&self, invocation: &Invocation) -> TestResult;

    fn invoke(&mut self, invocation: &Invocation) -> TestResult;
}

type Constructor<T> = Box<dyn Fn() -> Result<T, Failure>>;

/// A registered suite of test methods over fixture type `T`
pub struct Suite<T> {
    name: String,
    skip: bool,
    priority: i64,
    constructor: Constructor<T>,
    methods: Vec<Method<T>>,
}

impl<T: Fixture + 'static> Suite<T> {
    pub fn new(name: impl Into<String>, constructor: impl Fn() -> T + 'static) -> Self {
        Self::try_new(name, move || Ok(constructor()))
    }

    /// A suite whose constructor may fail
    pub fn try_new(
        name: impl Into<String>,
        constructor: impl Fn() -> Result<T, Failure> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            skip: false,
            priority: 0,
            constructor: Box::new(constructor),
            methods: Vec::new(),
        }
    }

    /// Skip every invocation of this suite
    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn method(mut self, method: Method<T>) -> Self {
        self.methods.push(method);
        self
    }

    /// Shorthand for an unparameterized method
    pub fn test(self, name: impl Into<String>, body: impl Fn(&mut T) -> TestResult + 'static) -> Self {
        self.method(Method::new(name, body))
    }
}

impl<T: Fixture + 'static> TestSuite for Suite<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_skipped(&self) -> bool {
        self.skip
    }

    fn priority(&self) -> i64 {
        self.priority
    }

    fn invocations(&self) -> Vec<Invocation> {
        let mut invocations = Vec::new();
        for (method_index, method) in self.methods.iter().enumerate() {
            let signature: Vec<String> = method.params.iter().map(ToString::to_string).collect();
            let cases: Vec<Vec<Value>> = if method.cases.is_empty() {
                vec![Vec::new()]
            } else {
                method.cases.clone()
            };
            invocations.extend(cases.into_iter().map(|args| Invocation {
                method: method.name.clone(),
                method_index,
                signature: signature.clone(),
                args,
                skip: method.skip,
            }));
        }
        invocations
    }

    fn instantiate(&self) -> Result<Box<dyn SuiteInstance + '_>, Failure> {
        let fixture = (self.constructor)()?;
        Ok(Box::new(Instance {
            suite: self,
            fixture,
        }))
    }
}

struct Instance<'s, T> {
    suite: &'s Suite<T>,
    fixture: T,
}

impl<T: Fixture> SuiteInstance for Instance<'_, T> {
    fn static_init(&mut self) -> TestResult {
        self.fixture.static_init()
    }

    fn static_cleanup(&mut self) -> TestResult {
        self.fixture.static_cleanup()
    }

    fn init(&mut self) -> TestResult {
        self.fixture.init()
    }

    fn cleanup(&mut self) -> TestResult {
        self.fixture.cleanup()
    }

    fn bind(&self, invocation: &Invocation) -> TestResult {
        self.resolve(invocation).map(|_| ())
    }

    fn invoke(&mut self, invocation: &Invocation) -> TestResult {
        match self.resolve(invocation)? {
            Resolved::Fixed(body) => body(&mut self.fixture, &invocation.args),
            Resolved::Bound(body) => body(&mut self.fixture, &invocation.args),
        }
    }
}

enum Resolved<'s, T> {
    Fixed(&'s FixedBody<T>),
    Bound(BodyFn<T>),
}

impl<'s, T> Instance<'s, T> {
    fn resolve(&self, invocation: &Invocation) -> Result<Resolved<'s, T>, Failure> {
        let suite = self.suite;
        let method = suite.methods.get(invocation.method_index).ok_or_else(|| {
            Failure::new(
                BINDING_TAG,
                format!("suite '{}' has no method '{}'", suite.name, invocation.method),
            )
        })?;

        match &method.body {
            MethodBody::Fixed(body) => Ok(Resolved::Fixed(body)),
            MethodBody::Generic(binder) => {
                let types = bind_type_arguments(&method.params, &invocation.args)
                    .map_err(|err| Failure::new(BINDING_TAG, err.to_string()))?;
                binder(&types).map(Resolved::Bound).ok_or_else(|| {
                    let names: Vec<String> = types.iter().map(ToString::to_string).collect();
                    Failure::new(BINDING_TAG, BindingError::Unsupported(names.join(", ")).to_string())
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::value::arg;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Probe {
        calls: Vec<String>,
    }

    impl Fixture for Probe {
        fn init(&mut self) -> TestResult {
            self.calls.push("init".to_string());
            Ok(())
        }
    }

    fn echo<T: crate::FromValue + fmt::Debug>(probe: &mut Probe, args: &[Value]) -> TestResult {
        let value: T = arg(args, 0)?;
        probe.calls.push(format!("{:?}", value));
        Ok(())
    }

    fn echo_method() -> Method<Probe> {
        Method::generic("echo", [Param::generic("T")], |types| match types {
            [TypeTag::I32] => Some(echo::<i32>),
            [TypeTag::Str] => Some(echo::<String>),
            _ => None,
        })
    }

    #[test]
    fn test_bind_in_order_of_appearance() {
        let params = [
            Param::generic("K"),
            Param::of(TypeTag::Bool),
            Param::generic("V"),
            Param::generic("K"),
        ];
        let types = bind_type_arguments(&params, &args!["a", true, 1u8, "b"]).unwrap();
        assert_eq!(types, vec![TypeTag::Str, TypeTag::U8]);
    }

    #[test]
    fn test_bind_conflict() {
        let params = [Param::generic("T"), Param::generic("T")];
        let err = bind_type_arguments(&params, &args![1i32, "x"]).unwrap_err();
        assert_eq!(
            err,
            BindingError::Conflict {
                param: "T".to_string(),
                first: TypeTag::I32,
                second: TypeTag::Str,
            }
        );
    }

    #[test]
    fn test_bind_missing_argument() {
        let err = bind_type_arguments(&[Param::generic("T")], &[]).unwrap_err();
        assert!(matches!(err, BindingError::MissingArgument { position: 0, .. }));
    }

    #[test]
    fn test_invocations_expand_cases_in_declaration_order() {
        let suite = Suite::new("probe", Probe::default)
            .test("plain", |_| Ok(()))
            .method(echo_method().case(args![1i32]).case(args!["two"]))
            .method(Method::new("later", |_| Ok(())).skip());

        let invocations = suite.invocations();
        let summary: Vec<_> = invocations
            .iter()
            .map(|i| (i.method.as_str(), i.display_args(), i.skip))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("plain", String::new(), false),
                ("echo", "1".to_string(), false),
                ("echo", "two".to_string(), false),
                ("later", String::new(), true),
            ]
        );
        assert_eq!(invocations[1].describe(), "echo(T)");
    }

    #[test]
    fn test_generic_invoke_binds_per_case() {
        let suite = Suite::new("probe", Probe::default).method(echo_method().case(args![7i32]).case(args!["s"]));
        let invocations = suite.invocations();
        let mut instance = suite.instantiate().unwrap();

        assert!(instance.invoke(&invocations[0]).is_ok());
        assert!(instance.invoke(&invocations[1]).is_ok());
    }

    #[test]
    fn test_generic_invoke_unsupported_type() {
        let suite = Suite::new("probe", Probe::default).method(echo_method().case(args![false]));
        let invocations = suite.invocations();
        let mut instance = suite.instantiate().unwrap();

        let failure = instance.invoke(&invocations[0]).unwrap_err();
        assert_eq!(failure.type_tag(), BINDING_TAG);
        assert!(failure.message().contains("<bool>"));
    }

    #[test]
    fn test_bind_checks_without_touching_the_fixture() {
        let suite = Suite::new("probe", Probe::default)
            .method(echo_method().case(args![3i32]).case(args![2.5f64]));
        let invocations = suite.invocations();
        let instance = suite.instantiate().unwrap();

        assert!(instance.bind(&invocations[0]).is_ok());
        let failure = instance.bind(&invocations[1]).unwrap_err();
        assert_eq!(failure.type_tag(), BINDING_TAG);
    }

    #[test]
    fn test_failing_constructor() {
        let suite: Suite<Probe> = Suite::try_new("broken", || Err(Failure::new("io", "no fixture")));
        let failure = suite.instantiate().err().unwrap();
        assert_eq!(failure.message(), "no fixture");
    }
}
