//! Settings model.
//!
//! Loading (file lookup, environment overrides) lives in
//! `bankflow_infrastructure::settings_service`; this module only defines the
//! shape and the defaults.

use crate::error::MissingField;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://ob.nordigen.com";
pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:8081/results";
pub const DEFAULT_MAX_HISTORICAL_DAYS: u32 = 90;
pub const DEFAULT_MAX_FLOWS: usize = 1000;

/// Runtime settings, constructed once at startup and shared by reference.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Upstream API token, sent as `Authorization: Token {token}`
    pub token: String,
    /// Two-letter ISO 3166 country code used for the bank listing
    pub country: String,
    pub base_url: String,
    /// Where the bank sends the end user back after consent
    pub redirect_url: String,
    /// Directory receiving `{account}_{kind}.json` files
    pub output_dir: PathBuf,
    /// Identifier to logo URL lookup table
    pub logo_table: PathBuf,
    pub host: String,
    pub port: u16,
    pub max_historical_days: u32,
    pub request_timeout_secs: Option<u64>,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    /// Also retry POST requests, which may create duplicate upstream resources
    pub retry_non_idempotent: bool,
    /// Reference ids older than this are rejected; unset means no expiry
    pub flow_ttl_secs: Option<u64>,
    /// Upper bound on flows kept in memory; unfinished flows are evicted first
    pub max_flows: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token: String::new(),
            country: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            output_dir: PathBuf::from("downloads"),
            logo_table: PathBuf::from("resources/logo_links.csv"),
            host: "0.0.0.0".to_string(),
            port: 8081,
            max_historical_days: DEFAULT_MAX_HISTORICAL_DAYS,
            request_timeout_secs: None,
            max_retries: 0,
            retry_backoff_ms: 500,
            retry_non_idempotent: false,
            flow_ttl_secs: None,
            max_flows: DEFAULT_MAX_FLOWS,
        }
    }
}

impl Settings {
    /// Returns the first required value that is absent.
    ///
    /// Token is checked before country so the end user fixes them in that order.
    pub fn readiness(&self) -> Option<MissingField> {
        if self.token.trim().is_empty() {
            return Some(MissingField::Token);
        }
        if self.country.trim().is_empty() {
            return Some(MissingField::Country);
        }
        None
    }

    /// Base URL without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn flow_ttl(&self) -> Option<Duration> {
        self.flow_ttl_secs.map(Duration::from_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
