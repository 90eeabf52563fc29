use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The three payloads fetched per account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountDataKind {
    Details,
    Balances,
    Transactions,
}

impl AccountDataKind {
    /// Fetch order.
    pub const ALL: [AccountDataKind; 3] = [
        AccountDataKind::Details,
        AccountDataKind::Balances,
        AccountDataKind::Transactions,
    ];

    /// URL path segment and file name suffix.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountDataKind::Details => "details",
            AccountDataKind::Balances => "balances",
            AccountDataKind::Transactions => "transactions",
        }
    }
}

impl fmt::Display for AccountDataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream payloads for one account, stored exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountDataBundle {
    pub details: Value,
    pub balances: Value,
    pub transactions: Value,
}

impl AccountDataBundle {
    pub fn get(&self, kind: AccountDataKind) -> &Value {
        match kind {
            AccountDataKind::Details => &self.details,
            AccountDataKind::Balances => &self.balances,
            AccountDataKind::Transactions => &self.transactions,
        }
    }
}

/// One account's bundle, tagged with its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountData {
    pub account_id: String,
    pub data: AccountDataBundle,
}

impl AccountData {
    /// Download file names in fetch order.
    pub fn file_names(&self) -> Vec<String> {
        AccountDataKind::ALL
            .iter()
            .map(|kind| StorageKey::new(&self.account_id, *kind).file_name())
            .collect()
    }
}

/// Where one payload is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    pub account_id: String,
    pub kind: AccountDataKind,
}

impl StorageKey {
    pub fn new(account_id: impl Into<String>, kind: AccountDataKind) -> Self {
        Self {
            account_id: account_id.into(),
            kind,
        }
    }

    /// `{account_id}_{kind}.json`
    pub fn file_name(&self) -> String {
        format!("{}_{}.json", self.account_id, self.kind)
    }
}
