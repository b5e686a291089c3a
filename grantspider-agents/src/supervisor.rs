use thiserror::Error;

use grantspider_graph::{GraphError, GraphState, Route, Router};

use crate::state::{CompletionFlags, GrantState};
use crate::workflow::{CROSS_DOCUMENT, DOCUMENT_RETRIEVER, QA_AGENT, SOURCE_TRACKER};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingError {
    #[error("completion flags out of order: {0:?}")]
    InconsistentFlags(CompletionFlags),
}

/// Where a turn stands. Steps run strictly in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Retrieval,
    CrossDocument,
    Qa,
    SourceTracking,
    Done,
}

impl Stage {
    /// Only prefixes of the pipeline are legal; anything else (QA done before
    /// retrieval, say) is rejected rather than routed.
    pub fn from_flags(flags: &CompletionFlags) -> Result<Self, RoutingError> {
        let CompletionFlags {
            retrieval_performed,
            cross_document_performed,
            qa_performed,
            source_tracking_performed,
        } = *flags;
        match (
            retrieval_performed,
            cross_document_performed,
            qa_performed,
            source_tracking_performed,
        ) {
            (false, false, false, false) => Ok(Stage::Retrieval),
            (true, false, false, false) => Ok(Stage::CrossDocument),
            (true, true, false, false) => Ok(Stage::Qa),
            (true, true, true, false) => Ok(Stage::SourceTracking),
            (true, true, true, true) => Ok(Stage::Done),
            _ => Err(RoutingError::InconsistentFlags(*flags)),
        }
    }

    /// Graph node that handles this stage; `None` once the turn is done.
    pub fn node(&self) -> Option<&'static str> {
        match self {
            Stage::Retrieval => Some(DOCUMENT_RETRIEVER),
            Stage::CrossDocument => Some(CROSS_DOCUMENT),
            Stage::Qa => Some(QA_AGENT),
            Stage::SourceTracking => Some(SOURCE_TRACKER),
            Stage::Done => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Supervisor;

impl Router<GrantState> for Supervisor {
    fn route(&self, state: &GraphState<GrantState>) -> Result<Route, GraphError> {
        let stage = Stage::from_flags(&state.data.flags)
            .map_err(|err| GraphError::Routing(err.to_string()))?;
        Ok(match stage.node() {
            Some(node) => Route::to(node),
            None => Route::End,
        })
    }

    fn targets(&self) -> Vec<String> {
        [DOCUMENT_RETRIEVER, CROSS_DOCUMENT, QA_AGENT, SOURCE_TRACKER]
            .iter()
            .map(|node| node.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(r: bool, c: bool, q: bool, s: bool) -> CompletionFlags {
        CompletionFlags {
            retrieval_performed: r,
            cross_document_performed: c,
            qa_performed: q,
            source_tracking_performed: s,
        }
    }

    fn route(f: CompletionFlags) -> Result<Route, GraphError> {
        let mut state = GrantState::default();
        state.flags = f;
        Supervisor.route(&GraphState::new(state))
    }

    #[test]
    fn routes_by_flags_alone() {
        assert_eq!(
            route(flags(false, false, false, false)).unwrap(),
            Route::to(DOCUMENT_RETRIEVER)
        );
        assert_eq!(
            route(flags(true, false, false, false)).unwrap(),
            Route::to(CROSS_DOCUMENT)
        );
        assert_eq!(
            route(flags(true, true, false, false)).unwrap(),
            Route::to(QA_AGENT)
        );
        assert_eq!(
            route(flags(true, true, true, false)).unwrap(),
            Route::to(SOURCE_TRACKER)
        );
        assert_eq!(route(flags(true, true, true, true)).unwrap(), Route::End);
    }

    #[test]
    fn every_out_of_order_combination_is_rejected() {
        let mut legal = 0;
        for bits in 0u8..16 {
            let f = flags(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0, bits & 8 != 0);
            match Stage::from_flags(&f) {
                Ok(_) => legal += 1,
                Err(err) => {
                    assert_eq!(err, RoutingError::InconsistentFlags(f));
                    assert!(matches!(route(f), Err(GraphError::Routing(_))));
                }
            }
        }
        assert_eq!(legal, 5);
    }

    #[test]
    fn route_ignores_everything_but_flags() {
        let mut state = GrantState::new("What is the budget?", "s");
        state.qa_response = "already answered".to_string();
        state.flags = flags(true, false, false, false);
        assert_eq!(
            Supervisor.route(&GraphState::new(state)).unwrap(),
            Route::to(CROSS_DOCUMENT)
        );
    }
}
