//! Consent flow use-cases for the web layer.
//!
//! `ConsentFlowService` owns the process-wide pieces (settings, end user id,
//! logo table location, account data store) and creates a fresh [`Session`] for
//! every flow. In-flight flows are tracked in a [`FlowRegistry`] keyed by
//! reference id, which is what the bank sends back on the redirect.

use crate::flow::FlowRegistry;
use bankflow_core::account::{AccountData, AccountDataStore};
use bankflow_core::bank::{Bank, attach_logo_links, filter_banks};
use bankflow_core::config::Settings;
use bankflow_core::error::{BankflowError, MissingField, Result};
use bankflow_core::session::Session;
use bankflow_infrastructure::FileLogoRepository;
use bankflow_interaction::{BankDataClient, Transport};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of starting a flow: where to send the end user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowStart {
    pub reference_id: String,
    pub link: String,
}

/// Outcome of a completed flow, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowResults {
    pub accounts: Vec<String>,
    pub data: Vec<AccountData>,
}

pub struct ConsentFlowService {
    client: BankDataClient,
    settings: Arc<Settings>,
    store: Arc<dyn AccountDataStore>,
    logos: FileLogoRepository,
    end_user_id: String,
    flows: FlowRegistry,
}

impl ConsentFlowService {
    /// Creates the service with a newly generated end user id.
    pub fn new(
        settings: Arc<Settings>,
        transport: Arc<dyn Transport>,
        store: Arc<dyn AccountDataStore>,
    ) -> Self {
        let client = BankDataClient::new(transport, settings.api_base());
        let logos = FileLogoRepository::new(settings.logo_table.clone());
        let flows = FlowRegistry::with_capacity(settings.max_flows);
        Self {
            client,
            settings,
            store,
            logos,
            end_user_id: Uuid::new_v4().to_string(),
            flows,
        }
    }

    /// Overrides the end user id, e.g. to keep it stable across restarts.
    pub fn with_end_user_id(mut self, end_user_id: impl Into<String>) -> Self {
        self.end_user_id = end_user_id.into();
        self
    }

    pub fn end_user_id(&self) -> &str {
        &self.end_user_id
    }

    pub fn flows(&self) -> &FlowRegistry {
        &self.flows
    }

    /// Returns the first missing input, checked as token, country, end user id.
    pub fn readiness(&self) -> Option<MissingField> {
        self.settings.readiness().or_else(|| {
            self.end_user_id
                .trim()
                .is_empty()
                .then_some(MissingField::EndUserId)
        })
    }

    /// Lists banks in the configured country, optionally filtered by name, with
    /// logo links attached.
    ///
    /// The logo table is re-read on every call.
    pub async fn list_banks(&self, search: Option<&str>) -> Result<Vec<Bank>> {
        let mut session = self.new_session();
        let banks = self
            .client
            .list_banks(&mut session, &self.settings.country)
            .await?;

        let banks = match search {
            Some(term) => filter_banks(banks, term),
            None => banks,
        };
        let table = self.logos.load().await?;
        Ok(attach_logo_links(banks, &table))
    }

    /// Runs agreement → requisition → link for `aspsp_id` and registers the flow.
    pub async fn start_flow(&self, aspsp_id: &str) -> Result<FlowStart> {
        if aspsp_id.trim().is_empty() {
            return Err(BankflowError::precondition("no bank selected"));
        }
        if let Some(ttl) = self.settings.flow_ttl() {
            let pruned = self.flows.prune_expired(ttl, Utc::now()).await;
            if pruned > 0 {
                tracing::debug!("Pruned {} expired flows", pruned);
            }
        }

        let mut session = self.new_session();
        self.client
            .create_agreement(&mut session, aspsp_id, self.settings.max_historical_days)
            .await?;
        self.client
            .create_requisition(&mut session, &self.settings.redirect_url)
            .await?;
        let link = self.client.create_requisition_link(&mut session).await?;

        let reference_id = session
            .reference_id
            .clone()
            .ok_or_else(|| BankflowError::Internal("flow has no reference id".into()))?;
        self.flows.insert(session).await;
        tracing::info!(aspsp_id, "Consent flow started");

        Ok(FlowStart { reference_id, link })
    }

    /// Handles the redirect-back: validates `reference`, then downloads and
    /// persists the data of every account bound to the requisition.
    ///
    /// # Errors
    ///
    /// - `ReferenceMismatch` when no flow was issued with this reference
    /// - `FlowExpired` when the flow outlived `flow_ttl_secs`
    /// - any upstream error from listing or downloading, unchanged
    pub async fn complete_flow(&self, reference: &str) -> Result<FlowResults> {
        let Some(mut session) = self.flows.get(reference).await else {
            tracing::warn!("Redirect with unknown reference");
            return Err(BankflowError::ReferenceMismatch);
        };

        if let Some(ttl) = self.settings.flow_ttl() {
            if session.is_expired(ttl, Utc::now()) {
                self.flows.remove(reference).await;
                tracing::warn!("Redirect for expired flow");
                return Err(BankflowError::FlowExpired);
            }
        }

        session.complete(reference)?;
        self.flows.insert(session.clone()).await;

        let accounts = self.client.list_accounts(&session).await?;
        let data = self
            .client
            .fetch_account_data(&session, &accounts, self.store.as_ref())
            .await?;
        tracing::info!(accounts = accounts.len(), "Consent flow completed");

        Ok(FlowResults { accounts, data })
    }

    fn new_session(&self) -> Session {
        Session::new(
            self.settings.token.clone(),
            self.settings.country.clone(),
            self.end_user_id.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankflow_core::account::{AccountDataKind, StorageKey};
    use bankflow_core::bank::DEFAULT_LOGO_URL;
    use bankflow_core::session::FlowState;
    use bankflow_infrastructure::{FsAccountDataStore, MemoryAccountDataStore};
    use bankflow_interaction::Method;
    use bankflow_interaction::testing::StubTransport;
    use serde_json::json;
    use tempfile::TempDir;

    const BASE: &str = "https://api.test";

    struct Fixture {
        _temp_dir: TempDir,
        stub: Arc<StubTransport>,
        store: Arc<MemoryAccountDataStore>,
        service: ConsentFlowService,
    }

    fn fixture_with(settings: impl FnOnce(&mut Settings)) -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let logo_table = temp_dir.path().join("logo_links.csv");
        std::fs::write(&logo_table, "id,logo\nSEB_UNLALV2X,\"https://cdn.test/seb.png\"\n").unwrap();

        let mut config = Settings {
            token: "secret".into(),
            country: "LV".into(),
            base_url: BASE.into(),
            redirect_url: "http://localhost:8081/results".into(),
            logo_table,
            ..Settings::default()
        };
        settings(&mut config);

        let stub = Arc::new(StubTransport::new());
        let store = Arc::new(MemoryAccountDataStore::new());
        let service = ConsentFlowService::new(Arc::new(config), stub.clone(), store.clone())
            .with_end_user_id("end-user-1");
        Fixture {
            _temp_dir: temp_dir,
            stub,
            store,
            service,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(|_| {})
    }

    fn stub_flow(stub: &StubTransport) {
        stub.respond(
            Method::POST,
            format!("{BASE}/api/agreements/enduser/"),
            json!({"id": "agr-1"}),
        )
        .respond(
            Method::POST,
            format!("{BASE}/api/requisitions/"),
            json!({"id": "req-1"}),
        )
        .respond(
            Method::POST,
            format!("{BASE}/api/requisitions/req-1/links/"),
            json!({"initiate": "https://bank.test/consent"}),
        )
        .respond(
            Method::GET,
            format!("{BASE}/api/requisitions/req-1/"),
            json!({"accounts": ["A1"]}),
        );
        for kind in AccountDataKind::ALL {
            stub.respond(
                Method::GET,
                format!("{BASE}/api/accounts/A1/{kind}/"),
                json!({ kind.as_str(): [] }),
            );
        }
    }

    #[tokio::test]
    async fn test_readiness() {
        assert_eq!(fixture().service.readiness(), None);
        assert_eq!(
            fixture_with(|s| s.token.clear()).service.readiness(),
            Some(MissingField::Token)
        );
        assert_eq!(
            fixture_with(|s| s.country.clear()).service.readiness(),
            Some(MissingField::Country)
        );
        assert_eq!(
            fixture().service.with_end_user_id("").readiness(),
            Some(MissingField::EndUserId)
        );
    }

    #[tokio::test]
    async fn test_list_banks_filters_and_attaches_logos() {
        let f = fixture();
        f.stub.respond(
            Method::GET,
            format!("{BASE}/api/aspsps/"),
            json!([
                {"id": "SWEDBANK_HABALV22", "name": "Swedbank"},
                {"id": "SEB_UNLALV2X", "name": "SEB banka"},
                {"id": "CITADELE_PARXLV22", "name": "Citadele"}
            ]),
        );

        let banks = f.service.list_banks(Some("BANK")).await.unwrap();

        let ids: Vec<&str> = banks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["SWEDBANK_HABALV22", "SEB_UNLALV2X"]);
        assert_eq!(banks[0].logo_link.as_deref(), Some(DEFAULT_LOGO_URL));
        assert_eq!(banks[1].logo_link.as_deref(), Some("https://cdn.test/seb.png"));
    }

    #[tokio::test]
    async fn test_list_banks_with_empty_token_is_missing_configuration() {
        let f = fixture_with(|s| s.token.clear());
        let err = f.service.list_banks(None).await.unwrap_err();
        assert!(matches!(
            err,
            BankflowError::MissingConfiguration(MissingField::Token)
        ));
        assert!(f.stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_full_flow() {
        let f = fixture();
        stub_flow(&f.stub);

        let start = f.service.start_flow("SEB_UNLALV2X").await.unwrap();
        assert_eq!(start.link, "https://bank.test/consent");

        let flow = f.service.flows().get(&start.reference_id).await.unwrap();
        assert_eq!(flow.state, FlowState::LinkIssued);
        assert_eq!(flow.end_user_id, "end-user-1");

        let results = f.service.complete_flow(&start.reference_id).await.unwrap();
        assert_eq!(results.accounts, vec!["A1"]);
        assert_eq!(results.data[0].data.details, json!({"details": []}));
        assert_eq!(
            f.store
                .read(&StorageKey::new("A1", AccountDataKind::Transactions))
                .await
                .unwrap(),
            Some(json!({"transactions": []}))
        );

        let flow = f.service.flows().get(&start.reference_id).await.unwrap();
        assert_eq!(flow.state, FlowState::Completed);
    }

    #[tokio::test]
    async fn test_completed_flow_can_be_reloaded() {
        let f = fixture();
        stub_flow(&f.stub);
        let start = f.service.start_flow("SEB_UNLALV2X").await.unwrap();

        f.service.complete_flow(&start.reference_id).await.unwrap();
        let again = f.service.complete_flow(&start.reference_id).await.unwrap();
        assert_eq!(again.accounts, vec!["A1"]);
    }

    #[tokio::test]
    async fn test_unknown_reference_is_rejected_without_upstream_call() {
        let f = fixture();
        stub_flow(&f.stub);
        f.service.start_flow("SEB_UNLALV2X").await.unwrap();
        let calls_before = f.stub.calls().len();

        let err = f.service.complete_flow("forged").await.unwrap_err();

        assert!(err.is_reference_mismatch());
        assert_eq!(f.stub.calls().len(), calls_before);
        assert!(f.store.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_flows_are_independent() {
        let f = fixture();
        stub_flow(&f.stub);

        let first = f.service.start_flow("SEB_UNLALV2X").await.unwrap();
        let second = f.service.start_flow("SWEDBANK_HABALV22").await.unwrap();
        assert_ne!(first.reference_id, second.reference_id);

        let first_flow = f.service.flows().get(&first.reference_id).await.unwrap();
        let second_flow = f.service.flows().get(&second.reference_id).await.unwrap();
        assert_eq!(first_flow.agreement_ids, vec!["agr-1"]);
        assert_eq!(first_flow.aspsp_id.as_deref(), Some("SEB_UNLALV2X"));
        assert_eq!(second_flow.aspsp_id.as_deref(), Some("SWEDBANK_HABALV22"));
    }

    #[tokio::test]
    async fn test_expired_flow_is_rejected() {
        let f = fixture_with(|s| s.flow_ttl_secs = Some(0));
        stub_flow(&f.stub);
        let start = f.service.start_flow("SEB_UNLALV2X").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let err = f.service.complete_flow(&start.reference_id).await.unwrap_err();

        assert!(matches!(err, BankflowError::FlowExpired));
        assert!(f.service.flows().get(&start.reference_id).await.is_none());
    }

    #[tokio::test]
    async fn test_abandoned_flows_stay_bounded_without_ttl() {
        let f = fixture_with(|s| s.max_flows = 5);
        stub_flow(&f.stub);

        let mut last = None;
        for _ in 0..50 {
            last = Some(f.service.start_flow("SEB_UNLALV2X").await.unwrap());
        }

        assert_eq!(f.service.flows().len().await, 5);
        let last = last.unwrap();
        let results = f.service.complete_flow(&last.reference_id).await.unwrap();
        assert_eq!(results.accounts, vec!["A1"]);
    }

    #[tokio::test]
    async fn test_empty_bank_id_is_rejected() {
        let f = fixture();
        let err = f.service.start_flow(" ").await.unwrap_err();
        assert!(err.is_precondition());
        assert!(f.stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_persisted_files_match_upstream_objects() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings {
            token: "secret".into(),
            country: "LV".into(),
            base_url: BASE.into(),
            logo_table: temp_dir.path().join("absent.csv"),
            ..Settings::default()
        };
        let stub = Arc::new(StubTransport::new());
        stub_flow(&stub);
        let balances = json!({
            "balances": [{
                "balanceAmount": {"amount": "657.49", "currency": "EUR"},
                "balanceType": "interimAvailable",
                "referenceDate": "2021-11-22"
            }]
        });
        stub.respond(Method::GET, format!("{BASE}/api/accounts/A1/balances/"), balances.clone());
        let store = Arc::new(FsAccountDataStore::new(temp_dir.path().join("downloads")));
        let service = ConsentFlowService::new(Arc::new(settings), stub, store.clone());

        let start = service.start_flow("SEB_UNLALV2X").await.unwrap();
        service.complete_flow(&start.reference_id).await.unwrap();

        let content =
            std::fs::read_to_string(temp_dir.path().join("downloads/A1_balances.json")).unwrap();
        let on_disk: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(on_disk, balances);
    }
}
