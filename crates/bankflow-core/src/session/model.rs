//! Consent flow session model.
//!
//! A `Session` is owned by exactly one consent flow. Every step of the flow
//! takes it by `&mut` and records what the next step needs, so the ordering
//! agreement → requisition → link → completion is enforced here instead of by
//! the callers.

use super::state::FlowState;
use crate::error::{BankflowError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Upstream API credential
    #[serde(skip_serializing, default)]
    pub token: String,
    /// ISO 3166 alpha-2 country code
    pub country: String,
    /// Stable end user identifier, shared by every flow of the process
    pub end_user_id: String,
    /// Correlation token expected back on the redirect, regenerated per requisition
    pub reference_id: Option<String>,
    /// When `reference_id` was issued
    pub reference_issued_at: Option<DateTime<Utc>>,
    /// Selected bank
    pub aspsp_id: Option<String>,
    /// Agreements accumulated during this flow, in creation order
    pub agreement_ids: Vec<String>,
    pub requisition_id: Option<String>,
    pub state: FlowState,
}

impl Session {
    pub fn new(
        token: impl Into<String>,
        country: impl Into<String>,
        end_user_id: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            country: country.into(),
            end_user_id: end_user_id.into(),
            reference_id: None,
            reference_issued_at: None,
            aspsp_id: None,
            agreement_ids: Vec::new(),
            requisition_id: None,
            state: FlowState::Idle,
        }
    }

    /// Records an agreement returned by the upstream API.
    ///
    /// A requisition created before this agreement no longer covers the current
    /// agreement list, so it is forgotten together with its reference.
    pub fn record_agreement(&mut self, aspsp_id: impl Into<String>, agreement_id: impl Into<String>) {
        self.aspsp_id = Some(aspsp_id.into());
        self.agreement_ids.push(agreement_id.into());
        self.requisition_id = None;
        self.reference_id = None;
        self.reference_issued_at = None;
        self.state = FlowState::AgreementCreated;
    }

    /// Issues a fresh reference id for a requisition and returns it.
    ///
    /// # Errors
    ///
    /// Returns `Precondition` when no agreement has been created yet.
    pub fn begin_requisition(&mut self) -> Result<String> {
        if self.agreement_ids.is_empty() {
            return Err(BankflowError::precondition(
                "cannot create a requisition: agreement list is empty",
            ));
        }
        let reference = Uuid::new_v4().to_string();
        self.reference_id = Some(reference.clone());
        self.reference_issued_at = Some(Utc::now());
        self.requisition_id = None;
        Ok(reference)
    }

    pub fn record_requisition(&mut self, requisition_id: impl Into<String>) {
        self.requisition_id = Some(requisition_id.into());
        self.state = FlowState::RequisitionCreated;
    }

    /// Returns `(requisition_id, aspsp_id)` for the link request.
    pub fn link_target(&self) -> Result<(&str, &str)> {
        match (&self.requisition_id, &self.aspsp_id) {
            (Some(requisition), Some(aspsp)) => Ok((requisition.as_str(), aspsp.as_str())),
            _ => Err(BankflowError::precondition(
                "cannot create a requisition link before a requisition exists",
            )),
        }
    }

    pub fn mark_link_issued(&mut self) {
        self.state = FlowState::LinkIssued;
    }

    /// Validates the reference returned by the redirect-back and completes the flow.
    ///
    /// The comparison is byte-for-byte. On mismatch the session is left untouched
    /// and the flow has to be restarted from the agreement step.
    pub fn complete(&mut self, reference: &str) -> Result<()> {
        if !self.state.awaits_redirect() {
            return Err(BankflowError::precondition(format!(
                "cannot complete a flow in state {}",
                self.state
            )));
        }
        match &self.reference_id {
            Some(expected) if expected.as_bytes() == reference.as_bytes() => {
                self.state = FlowState::Completed;
                Ok(())
            }
            _ => Err(BankflowError::ReferenceMismatch),
        }
    }

    /// Requisition to read accounts from; only valid once the flow is completed.
    pub fn completed_requisition(&self) -> Result<&str> {
        match (&self.state, &self.requisition_id) {
            (FlowState::Completed, Some(requisition)) => Ok(requisition.as_str()),
            _ => Err(BankflowError::precondition(format!(
                "accounts are only available after completion (state {})",
                self.state
            ))),
        }
    }

    /// Whether the reference id is older than `ttl` at `now`.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let Some(issued_at) = self.reference_issued_at else {
            return false;
        };
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now - issued_at > ttl,
            Err(_) => false,
        }
    }
}
