//! Tournament API request and response bodies

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Amount, RegistrationIntent, TeamMember};
use crate::Error;

/// Payment method reported for gateway paid registrations
pub const PAYMENT_METHOD_ONLINE: &str = "online";

/// Payment status reported for gateway paid registrations
pub const PAYMENT_STATUS_COMPLETED: &str = "completed";

/// Envelope every endpoint answers with
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the backend handled the request
    pub success: bool,
    /// Payload
    pub data: Option<T>,
    /// Human readable message
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Unwrap the payload of a successful response
    pub fn into_data(self) -> Result<T, Error> {
        if !self.success {
            return Err(Error::Rejected(
                self.message.unwrap_or_else(|| "request was not successful".to_string()),
            ));
        }

        self.data
            .ok_or_else(|| Error::UnexpectedResponse("response has no data".to_string()))
    }
}

/// `POST /payments/{provider}/initiate` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInitiateRequest {
    /// Payer name
    pub name: String,
    /// Payer mobile number
    pub mobile_number: String,
    /// Amount to charge
    pub amount: Amount,
    /// Shown on the gateway checkout page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Payment session created by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    /// Transaction id to correlate the redirect with
    pub transaction_id: String,
    /// Gateway checkout page
    pub payment_url: String,
}

/// `GET /payments/status/{transactionId}` payload
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentStatusResponse {
    /// Provider status string
    pub status: String,
    /// Full payload as returned
    pub raw: Value,
}

impl TryFrom<Value> for PaymentStatusResponse {
    type Error = Error;

    fn try_from(raw: Value) -> Result<Self, Self::Error> {
        let status = raw
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::UnexpectedResponse("payment status has no status".to_string()))?
            .to_string();

        Ok(Self { status, raw })
    }
}

impl PaymentStatusResponse {
    /// Read the status out of a status lookup envelope
    ///
    /// A status in `data` is used even when `success` is false, since the
    /// backend reports failed payments that way.
    pub fn from_envelope(response: ApiResponse<Value>) -> Result<Self, Error> {
        match response.data {
            Some(data) if data.get("status").and_then(Value::as_str).is_some() => {
                Self::try_from(data)
            }
            _ if !response.success => Err(Error::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "request was not successful".to_string()),
            )),
            Some(data) => Self::try_from(data),
            None => Err(Error::UnexpectedResponse(
                "response has no data".to_string(),
            )),
        }
    }
}

/// Payment reference attached to a registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    /// Gateway transaction id
    pub transaction_id: String,
    /// Amount charged
    pub amount: Amount,
}

/// `POST /tournaments/register-team/organizer` multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRegistrationRequest {
    /// Team name
    pub team_name: String,
    /// Captain name
    pub captain_name: String,
    /// Captain email
    pub captain_email: String,
    /// Captain phone
    pub captain_phone: String,
    /// Tournament id
    pub tournament_id: String,
    /// Always [`PAYMENT_METHOD_ONLINE`]
    pub payment_method: String,
    /// Always [`PAYMENT_STATUS_COMPLETED`]
    pub payment_status: String,
    /// Payment reference
    pub payment_details: PaymentDetails,
    /// Roster
    pub members: Vec<TeamMember>,
}

impl TeamRegistrationRequest {
    /// Registration for a paid intent
    pub fn for_paid_intent(intent: &RegistrationIntent, transaction_id: &str) -> Self {
        Self {
            team_name: intent.team_name.clone(),
            captain_name: intent.captain_name.clone(),
            captain_email: intent.captain_email.clone(),
            captain_phone: intent.captain_phone.clone(),
            tournament_id: intent.tournament_id.clone(),
            payment_method: PAYMENT_METHOD_ONLINE.to_string(),
            payment_status: PAYMENT_STATUS_COMPLETED.to_string(),
            payment_details: PaymentDetails {
                transaction_id: transaction_id.to_string(),
                amount: intent.amount,
            },
            members: intent.members.clone(),
        }
    }

    /// Multipart text fields; `paymentDetails` and `members` are json encoded
    pub fn form_fields(&self) -> Result<Vec<(&'static str, String)>, Error> {
        Ok(vec![
            ("teamName", self.team_name.clone()),
            ("captainName", self.captain_name.clone()),
            ("captainEmail", self.captain_email.clone()),
            ("captainPhone", self.captain_phone.clone()),
            ("tournamentId", self.tournament_id.clone()),
            ("paymentMethod", self.payment_method.clone()),
            ("paymentStatus", self.payment_status.clone()),
            ("paymentDetails", serde_json::to_string(&self.payment_details)?),
            ("members", serde_json::to_string(&self.members)?),
        ])
    }
}

/// Registered team as returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisteredTeam {
    /// Team id
    #[serde(rename = "_id")]
    pub id: String,
}
