//! Gateway redirect parameters
//!
//! The payment gateway sends the payer back to the application with the
//! outcome encoded in query parameters. Parameter names and success tokens
//! are fixed by the provider integration and are matched exactly.

use std::collections::BTreeMap;
use std::str::FromStr;

use url::Url;

use crate::types::PaymentStatus;
use crate::Error;

/// Transaction id parameters, in priority order
pub const TRANSACTION_ID_PARAMS: [&str; 2] = ["id", "merchantTransactionId"];

/// Outcome code parameters, in priority order
pub const OUTCOME_CODE_PARAMS: [&str; 2] = ["code", "status"];

/// Redirect codes meaning the payment went through
pub const REDIRECT_SUCCESS_TOKENS: [&str; 2] = ["PAYMENT_SUCCESS", "SUCCESS"];

/// Status lookup values meaning the payment went through
pub const STATUS_SUCCESS_VALUES: [&str; 2] = ["SUCCESS", "COMPLETED"];

/// Status lookup values meaning the provider has not settled the payment yet
pub const STATUS_PENDING_VALUES: [&str; 2] = ["PENDING", "PAYMENT_PENDING"];

/// Map a redirect `code`/`status` value
pub fn redirect_status(code: &str) -> PaymentStatus {
    if REDIRECT_SUCCESS_TOKENS.contains(&code) {
        PaymentStatus::Success
    } else {
        PaymentStatus::Failed
    }
}

/// Map a status lookup value: success values succeed, anything else fails
pub fn lookup_status(status: &str) -> PaymentStatus {
    if STATUS_SUCCESS_VALUES.contains(&status) {
        PaymentStatus::Success
    } else {
        PaymentStatus::Failed
    }
}

/// Map a status lookup value keeping unsettled payments apart
pub fn settlement_status(status: &str) -> PaymentStatus {
    if STATUS_PENDING_VALUES.contains(&status) {
        PaymentStatus::Pending
    } else {
        lookup_status(status)
    }
}

/// Query parameters of a gateway redirect
///
/// Empty values are treated as absent. When a name repeats, the first value
/// wins.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    params: BTreeMap<String, String>,
}

impl CallbackParams {
    /// Parse a raw query string, with or without the leading `?`
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Parse the query of a full redirect url
    pub fn from_url(url: &str) -> Result<Self, Error> {
        let url = Url::parse(url)?;
        Ok(Self::from_query(url.query().unwrap_or_default()))
    }

    /// Get a non-empty parameter value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Whether no parameters were supplied
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Transaction id, checking `id` before `merchantTransactionId`
    pub fn transaction_id(&self) -> Option<&str> {
        TRANSACTION_ID_PARAMS.iter().find_map(|name| self.get(name))
    }

    /// Outcome code, checking `code` before `status`
    pub fn outcome_code(&self) -> Option<&str> {
        OUTCOME_CODE_PARAMS.iter().find_map(|name| self.get(name))
    }

    /// Parameters as a json object, for audit
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.params
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        )
    }
}

impl<K, V> FromIterator<(K, V)> for CallbackParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = BTreeMap::new();
        for (k, v) in iter {
            params.entry(k.into()).or_insert_with(|| v.into());
        }
        Self { params }
    }
}

impl FromStr for CallbackParams {
    type Err = Error;

    /// Accepts either a full redirect url or a bare query string
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match Url::parse(s) {
            Ok(url) if !url.cannot_be_a_base() => {
                Ok(Self::from_query(url.query().unwrap_or_default()))
            }
            _ => Ok(Self::from_query(s)),
        }
    }
}
