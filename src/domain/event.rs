use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// A payment gateway notification, normalized from the wire format.
///
/// Built once by the ingress mapper and only read afterwards. Every optional
/// field is `None` when the sender omitted it or sent `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event type tag, e.g. `transaction.updated`.
    pub kind: String,
    pub transaction: Transaction,
    pub signature: Signature,
    pub timestamp: Option<i64>,
    pub sent_at: Option<GatewayTime>,
    /// Free-form, usually `test` or `production`.
    pub environment: Option<String>,
}

/// A timestamp as sent by the gateway: the parsed instant and the exact text.
///
/// Checksums are computed over the text, and it is what gets relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayTime {
    instant: DateTime<Utc>,
    raw: String,
}

impl GatewayTime {
    /// Parses an RFC 3339 timestamp, keeping the original text.
    pub fn parse(raw: impl Into<String>) -> Result<Self, chrono::ParseError> {
        let raw = raw.into();
        let instant = DateTime::parse_from_rfc3339(&raw)?.with_timezone(&Utc);
        Ok(Self { instant, raw })
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Serialize for GatewayTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Signature {
    /// Property paths covered by the checksum, in signing order.
    pub properties: Vec<String>,
    pub checksum: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Transaction {
    pub id: String,
    pub created_at: Option<GatewayTime>,
    pub finalized_at: Option<GatewayTime>,
    pub applied_at: Option<GatewayTime>,
    pub amount_in_cents: Option<i64>,
    pub reference: Option<String>,
    pub customer_email: Option<String>,
    pub currency: Option<String>,
    pub payment_method_type: Option<String>,
    pub status: Option<String>,
    /// Opaque, relayed as received.
    pub shipping_address: Option<Value>,
    /// Opaque, relayed as received.
    pub billing_data: Option<Value>,
    pub payment_link_id: Option<String>,
    pub redirect_url: Option<String>,
    pub payment_source_id: Option<String>,
    pub payout_id: Option<String>,
    pub payee: Option<Payee>,
    pub failure_reason: Option<FailureReason>,
}

/// Beneficiary of a payout.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Payee {
    pub name: Option<String>,
    pub document: Option<String>,
    pub bank: Option<String>,
    pub account_type: Option<String>,
    pub account_number: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FailureReason {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl Event {
    /// Resolves a signed property path such as `transaction.amount_in_cents`
    /// to the string form used when computing the checksum.
    ///
    /// Returns `None` for unknown paths and for fields that are absent.
    pub fn property_value(&self, path: &str) -> Option<String> {
        let field = path.strip_prefix("transaction.")?;
        self.transaction.field_value(field)
    }

    pub fn is_payout(&self) -> bool {
        self.transaction.payout_id.is_some()
    }
}

impl Transaction {
    fn field_value(&self, field: &str) -> Option<String> {
        let timestamp = |t: &Option<GatewayTime>| t.as_ref().map(|t| t.as_str().to_string());

        match field {
            "id" => Some(self.id.clone()),
            "status" => self.status.clone(),
            "amount_in_cents" => self.amount_in_cents.map(|a| a.to_string()),
            "reference" => self.reference.clone(),
            "customer_email" => self.customer_email.clone(),
            "currency" => self.currency.clone(),
            "payment_method_type" => self.payment_method_type.clone(),
            "payment_link_id" => self.payment_link_id.clone(),
            "redirect_url" => self.redirect_url.clone(),
            "payment_source_id" => self.payment_source_id.clone(),
            "payout_id" => self.payout_id.clone(),
            "created_at" => timestamp(&self.created_at),
            "finalized_at" => timestamp(&self.finalized_at),
            "applied_at" => timestamp(&self.applied_at),
            _ => None,
        }
    }
}
