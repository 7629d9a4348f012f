//! Outcome classification

use crate::failure::Failure;

/// One link of a cause chain
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub type_tag: String,
    pub message: String,
    pub trace: Vec<String>,
}

impl Link {
    fn from_failure(failure: &Failure) -> Self {
        Self {
            type_tag: failure.type_tag().to_string(),
            message: failure.message().to_string(),
            trace: failure.trace().to_vec(),
        }
    }

    /// Trace lines prefixed with `indent` spaces
    pub fn indented_trace(&self, indent: usize) -> Vec<String> {
        let pad = " ".repeat(indent);
        self.trace
            .iter()
            .map(|line| format!("{}{}", pad, line.trim_end()))
            .collect()
    }
}

/// Causes of a failure, from the outermost wrapper to the root cause
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CauseChain {
    links: Vec<Link>,
}

impl CauseChain {
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// The innermost cause
    pub fn root(&self) -> Option<&Link> {
        self.links.last()
    }
}

/// Result of one invocation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Pass,
    Skip,
    Fail(CauseChain),
}

impl Outcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Outcome::Skip)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Fail(_))
    }

    /// Status label printed in the progress slot
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Pass => "PASS",
            Outcome::Skip => "SKIP",
            Outcome::Fail(_) => "FAIL",
        }
    }
}

/// Classify what an invocation raised
///
/// The skip sentinel is recognised directly or one level below a wrapper.
/// For anything else the chain records every "caused by" link of `raised`.
pub fn classify(raised: Option<&Failure>) -> Outcome {
    let Some(raised) = raised else {
        return Outcome::Pass;
    };

    if raised.is_skip() || raised.cause().is_some_and(Failure::is_skip) {
        return Outcome::Skip;
    }

    Outcome::Fail(CauseChain {
        links: raised.causes().map(Link::from_failure).collect(),
    })
}
