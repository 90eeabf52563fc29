//! Consent flow client for the upstream bank account data API.
//!
//! Each method performs one upstream call and records its outcome in the
//! [`Session`] it is given. The expected call order is:
//!
//! 1. [`BankDataClient::create_agreement`]
//! 2. [`BankDataClient::create_requisition`]
//! 3. [`BankDataClient::create_requisition_link`] (end user leaves for the bank)
//! 4. [`Session::complete`] with the reference from the redirect-back
//! 5. [`BankDataClient::list_accounts`] and [`BankDataClient::fetch_account_data`]
//!
//! Upstream errors are returned unchanged and never retried here.

use crate::transport::{Method, Transport};
use bankflow_core::account::{
    AccountData, AccountDataBundle, AccountDataKind, AccountDataStore, StorageKey,
};
use bankflow_core::bank::Bank;
use bankflow_core::error::{BankflowError, MissingField, Result};
use bankflow_core::session::Session;
use serde_json::{Map, Value, json};
use std::sync::Arc;

pub struct BankDataClient {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl BankDataClient {
    /// Creates a client for the API at `base_url` (e.g. `https://ob.nordigen.com`).
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
        }
    }

    /// Lists the banks available in `country` and records the country on the session.
    ///
    /// # Errors
    ///
    /// `MissingConfiguration` when the session has no token, no country or no end
    /// user id. Nothing is sent upstream in that case.
    pub async fn list_banks(&self, session: &mut Session, country: &str) -> Result<Vec<Bank>> {
        ensure_ready(session, country)?;
        session.country = country.to_string();

        let payload = object(json!({ "country": country }));
        let response = self
            .call(session, Method::GET, "/api/aspsps/", &payload)
            .await?;
        Ok(serde_json::from_value(response)?)
    }

    /// Creates an end user agreement for `aspsp_id` and appends it to the session.
    pub async fn create_agreement(
        &self,
        session: &mut Session,
        aspsp_id: &str,
        max_historical_days: u32,
    ) -> Result<String> {
        let payload = object(json!({
            "enduser_id": session.end_user_id,
            "max_historical_days": max_historical_days,
            "aspsp_id": aspsp_id,
        }));
        let response = self
            .call(session, Method::POST, "/api/agreements/enduser/", &payload)
            .await?;
        let agreement_id = required_str(&response, "id")?;

        session.record_agreement(aspsp_id, agreement_id.clone());
        tracing::info!(aspsp_id, agreement_id = %agreement_id, "Agreement created");
        Ok(agreement_id)
    }

    /// Creates a requisition over the session's agreements.
    ///
    /// A fresh reference id is generated for every call.
    ///
    /// # Errors
    ///
    /// `Precondition` when no agreement has been created; nothing is sent.
    pub async fn create_requisition(
        &self,
        session: &mut Session,
        redirect_url: &str,
    ) -> Result<String> {
        let reference = session.begin_requisition()?;
        let payload = object(json!({
            "redirect": redirect_url,
            "reference": reference,
            "enduser_id": session.end_user_id,
            "agreements": session.agreement_ids,
        }));
        let response = self
            .call(session, Method::POST, "/api/requisitions/", &payload)
            .await?;
        let requisition_id = required_str(&response, "id")?;

        session.record_requisition(requisition_id.clone());
        tracing::info!(requisition_id = %requisition_id, "Requisition created");
        Ok(requisition_id)
    }

    /// Requests the bank redirect link for the session's requisition.
    ///
    /// Returns the URL the end user has to be sent to.
    pub async fn create_requisition_link(&self, session: &mut Session) -> Result<String> {
        let (requisition_id, aspsp_id) = session.link_target()?;
        let path = format!("/api/requisitions/{requisition_id}/links/");
        let payload = object(json!({ "aspsp_id": aspsp_id }));

        let response = self.call(session, Method::POST, &path, &payload).await?;
        let initiate = required_str(&response, "initiate")?;

        session.mark_link_issued();
        tracing::info!("Requisition link issued");
        Ok(initiate)
    }

    /// Lists account ids bound to the completed requisition.
    pub async fn list_accounts(&self, session: &Session) -> Result<Vec<String>> {
        let requisition_id = session.completed_requisition()?;
        let path = format!("/api/requisitions/{requisition_id}/");

        let response = self.call(session, Method::GET, &path, &Map::new()).await?;
        let accounts = response
            .get("accounts")
            .cloned()
            .ok_or_else(|| BankflowError::unexpected_response("requisition has no 'accounts'"))?;
        Ok(serde_json::from_value(accounts)?)
    }

    /// Downloads details, balances and transactions for every account, in order,
    /// and persists each payload to `store`.
    ///
    /// An account's three payloads are all fetched before any of them is written,
    /// so a failing account leaves no files behind. The first failure aborts the
    /// whole operation; accounts after it are not requested.
    pub async fn fetch_account_data(
        &self,
        session: &Session,
        account_ids: &[String],
        store: &dyn AccountDataStore,
    ) -> Result<Vec<AccountData>> {
        session.completed_requisition()?;

        let mut results = Vec::with_capacity(account_ids.len());
        for account_id in account_ids {
            let mut payloads = Vec::with_capacity(AccountDataKind::ALL.len());
            for kind in AccountDataKind::ALL {
                let path = format!("/api/accounts/{account_id}/{kind}/");
                let payload = self.call(session, Method::GET, &path, &Map::new()).await?;
                payloads.push((kind, payload));
            }

            for (kind, payload) in &payloads {
                store
                    .write(&StorageKey::new(account_id.as_str(), *kind), payload)
                    .await?;
            }

            let mut payloads = payloads.into_iter().map(|(_, payload)| payload);
            let data = AccountDataBundle {
                details: payloads.next().unwrap_or(Value::Null),
                balances: payloads.next().unwrap_or(Value::Null),
                transactions: payloads.next().unwrap_or(Value::Null),
            };
            tracing::info!(account_id = %account_id, "Account data saved");
            results.push(AccountData {
                account_id: account_id.clone(),
                data,
            });
        }
        Ok(results)
    }

    async fn call(
        &self,
        session: &Session,
        method: Method,
        path: &str,
        payload: &Map<String, Value>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        self.transport
            .request(method, &url, &session.token, payload)
            .await
    }
}

fn ensure_ready(session: &Session, country: &str) -> Result<()> {
    if session.token.trim().is_empty() {
        return Err(BankflowError::MissingConfiguration(MissingField::Token));
    }
    if country.trim().is_empty() {
        return Err(BankflowError::MissingConfiguration(MissingField::Country));
    }
    if session.end_user_id.trim().is_empty() {
        return Err(BankflowError::MissingConfiguration(MissingField::EndUserId));
    }
    Ok(())
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn required_str(response: &Value, field: &str) -> Result<String> {
    response
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BankflowError::unexpected_response(format!("missing '{field}' in response")))
}
