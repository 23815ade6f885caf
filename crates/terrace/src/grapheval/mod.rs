//! diagnostics for request graph failures
//!
//! Evaluation is driven by a graph of interdependent requests. The graph itself lives elsewhere,
//! this module only turns its two failure modes into [Diagnostics]:
//!
//! - [WorkgraphError::SelfDependency]: requests that (indirectly) wait on themselves. This is a
//!   mistake in the configuration, so the involved objects are listed by name.
//! - [WorkgraphError::Unresolved]: a request nobody will ever answer. That is always a bug in the
//!   evaluator and reported as such.
//!
//! Names and source locations come from an optional [RequestTracker].
use crate::diagnostics::{Diagnostic, Diagnostics, SourceRange};
use indexmap::IndexMap;
use std::error::Error;
use std::fmt;

const SELF_DEPENDENT_SUMMARY: &str = "Self-dependent items in configuration";
const FAILED_SUMMARY: &str = "Configuration evaluation failed";
const UNKNOWN_OBJECT: &str = "<unknown object> (this is a bug; please report it)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request {}", self.0)
    }
}

/// What a request is about, for humans
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub name: String,
    pub source_range: Option<SourceRange>,
}

impl RequestInfo {
    pub fn new(name: impl Into<String>, source_range: impl Into<Option<SourceRange>>) -> Self {
        Self {
            name: name.into(),
            source_range: source_range.into(),
        }
    }
}

impl fmt::Display for RequestInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source_range {
            Some(range) => write!(f, "{} ({range})", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Knows the requests that are currently in flight
pub trait RequestTracker {
    fn active_requests(&self) -> IndexMap<RequestId, RequestInfo>;
}

impl RequestTracker for IndexMap<RequestId, RequestInfo> {
    fn active_requests(&self) -> IndexMap<RequestId, RequestInfo> {
        self.clone()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum WorkgraphError {
    #[error("self-dependency between {}", display_ids(.request_ids))]
    SelfDependency { request_ids: Vec<RequestId> },
    #[error("{0} was never resolved")]
    Unresolved(RequestId),
    #[error(transparent)]
    Other(Box<dyn Error + Send + Sync>),
}

fn display_ids(ids: &[RequestId]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Diagnostics describing a failed request graph evaluation
#[tracing::instrument(level = "debug", skip(tracker))]
pub fn diagnostics_for_workgraph_error(
    err: &WorkgraphError,
    tracker: Option<&dyn RequestTracker>,
) -> Diagnostics {
    let requests = tracker.map(RequestTracker::active_requests);
    let describe = |id: &RequestId| -> String {
        requests
            .as_ref()
            .and_then(|requests| requests.get(id))
            .map(ToString::to_string)
            .unwrap_or_else(|| UNKNOWN_OBJECT.to_string())
    };

    let diagnostic = match (err, &requests) {
        (WorkgraphError::SelfDependency { request_ids }, Some(_)) => {
            let mut names: Vec<String> = request_ids.iter().map(describe).collect();
            names.sort();
            names.dedup();

            let mut detail = String::from(
                "The following items in the configuration refer to their own results, directly or \
                 through other items:\n",
            );
            for name in &names {
                detail.push_str(&format!("  - {name}\n"));
            }
            detail.push_str(
                "\nValues are computed in the order their references require, so no item can \
                 depend on itself.",
            );
            Diagnostic::error(SELF_DEPENDENT_SUMMARY, detail)
        }
        (WorkgraphError::SelfDependency { .. }, None) => Diagnostic::error(
            SELF_DEPENDENT_SUMMARY,
            "Some items in the configuration refer to their own results, directly or through \
             other items.",
        ),
        (WorkgraphError::Unresolved(id), Some(_)) => Diagnostic::error(
            FAILED_SUMMARY,
            format!(
                "The evaluation of {} was never completed. This is a bug; please report it.",
                describe(id)
            ),
        ),
        (WorkgraphError::Unresolved(_), None) => Diagnostic::error(
            FAILED_SUMMARY,
            "A request was left unresolved during evaluation. This is a bug; please report it.",
        ),
        (WorkgraphError::Other(other), _) => Diagnostic::error(
            FAILED_SUMMARY,
            format!("Unexpected error during evaluation: {other}. This is a bug; please report it."),
        ),
    };

    tracing::debug!(summary = %diagnostic.summary, "request graph failure");
    Diagnostics::from(diagnostic)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tracker() -> IndexMap<RequestId, RequestInfo> {
        IndexMap::from([
            (
                RequestId(1),
                RequestInfo::new("local.b", SourceRange::new("main.tf", 40..47)),
            ),
            (
                RequestId(2),
                RequestInfo::new("local.a", SourceRange::new("main.tf", 10..17)),
            ),
            (RequestId(3), RequestInfo::new("module.child", None)),
        ])
    }

    fn render(diags: &Diagnostics) -> String {
        diags.err().map(|err| err.to_string()).unwrap_or_default()
    }

    #[test]
    fn self_dependency_lists_sorted_unique_objects() {
        let tracker = tracker();
        let err = WorkgraphError::SelfDependency {
            request_ids: vec![RequestId(1), RequestId(3), RequestId(2), RequestId(1)],
        };
        let diags = diagnostics_for_workgraph_error(&err, Some(&tracker));
        insta::assert_snapshot!(render(&diags), @r"
        Self-dependent items in configuration: The following items in the configuration refer to their own results, directly or through other items:
          - local.a (main.tf:10-17)
          - local.b (main.tf:40-47)
          - module.child

        Values are computed in the order their references require, so no item can depend on itself.
        ");
    }

    #[test]
    fn untracked_requests_get_a_placeholder() {
        let tracker = tracker();
        let err = WorkgraphError::SelfDependency {
            request_ids: vec![RequestId(2), RequestId(99)],
        };
        let diags = diagnostics_for_workgraph_error(&err, Some(&tracker));
        let detail = &diags.iter().next().unwrap().detail;
        assert!(detail.contains("  - <unknown object> (this is a bug; please report it)\n"));
        assert!(detail.contains("  - local.a (main.tf:10-17)\n"));
    }

    #[test]
    fn unresolved_is_a_bug() {
        let tracker = tracker();
        let diags =
            diagnostics_for_workgraph_error(&WorkgraphError::Unresolved(RequestId(2)), Some(&tracker));
        insta::assert_snapshot!(render(&diags), @"Configuration evaluation failed: The evaluation of local.a (main.tf:10-17) was never completed. This is a bug; please report it.");
    }

    #[test]
    fn without_tracker() {
        let cycle = diagnostics_for_workgraph_error(
            &WorkgraphError::SelfDependency {
                request_ids: vec![RequestId(1)],
            },
            None,
        );
        let unresolved = diagnostics_for_workgraph_error(&WorkgraphError::Unresolved(RequestId(1)), None);

        assert_eq!(cycle.iter().next().unwrap().summary, SELF_DEPENDENT_SUMMARY);
        assert!(!cycle.iter().next().unwrap().detail.contains("request 1"));
        assert_eq!(unresolved.iter().next().unwrap().summary, FAILED_SUMMARY);
    }

    #[test]
    fn other_errors() {
        let err = WorkgraphError::Other("worker panicked".into());
        let diags = diagnostics_for_workgraph_error(&err, None);
        insta::assert_snapshot!(render(&diags), @"Configuration evaluation failed: Unexpected error during evaluation: worker panicked. This is a bug; please report it.");
        assert_eq!(
            WorkgraphError::SelfDependency {
                request_ids: vec![RequestId(1), RequestId(2)]
            }
            .to_string(),
            "self-dependency between request 1, request 2"
        );
    }
}
