//! Consent flow states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a consent flow in the agreement → requisition → link → completion chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    #[default]
    Idle,
    AgreementCreated,
    RequisitionCreated,
    /// The end user has been sent to the bank; control is outside this process
    LinkIssued,
    Completed,
}

impl FlowState {
    /// States in which a redirect-back reference may be checked.
    ///
    /// `Completed` is included so that reloading the results page re-fetches.
    pub fn awaits_redirect(&self) -> bool {
        matches!(self, FlowState::LinkIssued | FlowState::Completed)
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowState::Idle => "idle",
            FlowState::AgreementCreated => "agreement_created",
            FlowState::RequisitionCreated => "requisition_created",
            FlowState::LinkIssued => "link_issued",
            FlowState::Completed => "completed",
        };
        f.write_str(name)
    }
}
