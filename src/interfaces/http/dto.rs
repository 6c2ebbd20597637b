use crate::domain::event::{Event, FailureReason, GatewayTime, Payee, Signature, Transaction};
use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Webhook body as posted by the payment gateway.
///
/// Everything is optional at this level; `Event::try_from` decides what is
/// actually required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookRequest {
    pub event: Option<String>,
    pub data: Option<DataWrapper>,
    pub signature: Option<SignatureDto>,
    pub timestamp: Option<i64>,
    pub sent_at: Option<String>,
    pub environment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataWrapper {
    pub transaction: Option<TransactionDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionDto {
    pub id: Option<String>,
    pub created_at: Option<String>,
    pub finalized_at: Option<String>,
    pub amount_in_cents: Option<i64>,
    pub reference: Option<String>,
    pub customer_email: Option<String>,
    pub currency: Option<String>,
    pub payment_method_type: Option<String>,
    pub status: Option<String>,
    pub shipping_address: Option<Value>,
    pub payment_link_id: Option<String>,
    pub redirect_url: Option<String>,
    pub payment_source_id: Option<String>,
    pub billing_data: Option<Value>,
    // Payout notifications use camelCase for these.
    #[serde(rename = "payoutId", alias = "payout_id")]
    pub payout_id: Option<String>,
    pub payee: Option<PayeeDto>,
    #[serde(rename = "failureReason", alias = "failure_reason")]
    pub failure_reason: Option<FailureReasonDto>,
    #[serde(rename = "appliedAt", alias = "applied_at")]
    pub applied_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayeeDto {
    pub name: Option<String>,
    pub document: Option<String>,
    pub bank: Option<String>,
    #[serde(rename = "accountType", alias = "account_type")]
    pub account_type: Option<String>,
    #[serde(rename = "accountNumber", alias = "account_number")]
    pub account_number: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FailureReasonDto {
    pub code: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignatureDto {
    #[serde(default)]
    pub properties: Vec<String>,
    pub checksum: Option<String>,
}

/// Acknowledgement returned to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub transaction_id: Option<String>,
    pub event: Option<String>,
    pub status: String,
    pub message: String,
}

impl TryFrom<WebhookRequest> for Event {
    type Error = RelayError;

    fn try_from(request: WebhookRequest) -> Result<Self> {
        let kind = request
            .event
            .filter(|kind| !kind.trim().is_empty())
            .ok_or_else(|| RelayError::Validation("missing 'event'".to_string()))?;

        let transaction = request
            .data
            .and_then(|data| data.transaction)
            .ok_or_else(|| RelayError::Validation("missing 'data.transaction'".to_string()))?;

        let signature = request
            .signature
            .map(|s| Signature {
                properties: s.properties,
                checksum: s.checksum,
            })
            .unwrap_or_default();

        Ok(Event {
            kind,
            transaction: transaction.try_into()?,
            signature,
            timestamp: request.timestamp,
            sent_at: parse_timestamp(request.sent_at, "sent_at")?,
            environment: request.environment,
        })
    }
}

impl TryFrom<TransactionDto> for Transaction {
    type Error = RelayError;

    fn try_from(dto: TransactionDto) -> Result<Self> {
        let id = dto
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| RelayError::Validation("missing 'data.transaction.id'".to_string()))?;

        Ok(Transaction {
            id,
            created_at: parse_timestamp(dto.created_at, "data.transaction.created_at")?,
            finalized_at: parse_timestamp(dto.finalized_at, "data.transaction.finalized_at")?,
            applied_at: parse_timestamp(dto.applied_at, "data.transaction.appliedAt")?,
            amount_in_cents: dto.amount_in_cents,
            reference: dto.reference,
            customer_email: dto.customer_email,
            currency: dto.currency,
            payment_method_type: dto.payment_method_type,
            status: dto.status,
            shipping_address: dto.shipping_address,
            billing_data: dto.billing_data,
            payment_link_id: dto.payment_link_id,
            redirect_url: dto.redirect_url,
            payment_source_id: dto.payment_source_id,
            payout_id: dto.payout_id,
            payee: dto.payee.map(|p| Payee {
                name: p.name,
                document: p.document,
                bank: p.bank,
                account_type: p.account_type,
                account_number: p.account_number,
                email: p.email,
            }),
            failure_reason: dto.failure_reason.map(|f| FailureReason {
                code: f.code,
                message: f.message,
            }),
        })
    }
}

fn parse_timestamp(value: Option<String>, field: &str) -> Result<Option<GatewayTime>> {
    value
        .map(|raw| {
            GatewayTime::parse(raw).map_err(|e| {
                RelayError::Validation(format!("'{field}' is not an RFC 3339 timestamp: {e}"))
            })
        })
        .transpose()
}
