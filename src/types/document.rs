//! Normalized UPD document model.
//!
//! Produced by the parser, consumed by the reconciliation engine. Monetary
//! values are `Decimal`, never floats.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Name used whenever a party or a number is absent from the document.
pub const UNSPECIFIED_NAME: &str = "Не указано";
pub const UNSPECIFIED_NUMBER: &str = "Не указан";
/// Placeholder tax id of the sentinel organization.
pub const UNSPECIFIED_TAX_ID: &str = "0000000000";
/// ISO 4217 numeric code for RUB.
pub const DEFAULT_CURRENCY_CODE: &str = "643";

/// Paths discovered in `meta.xml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleIndex {
    pub flow_id: String,
    pub main_document_path: String,
    pub card_path: String,
}

/// Summary data from `card.xml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardSummary {
    pub external_id: String,
    pub title: String,
    pub issued_at: DateTime<FixedOffset>,
    pub sender_tax_id: String,
    pub sender_reg_code: String,
    pub sender_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub postal_code: Option<String>,
    pub region_code: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub house: Option<String>,
    pub apartment: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        *self == Address::default()
    }
}

/// Legal entity or sole proprietor, keyed by tax id (ИНН).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub name: String,
    pub tax_id: String,
    pub reg_code: Option<String>,
    pub address: Option<Address>,
}

impl Organization {
    pub fn unspecified() -> Self {
        Self {
            name: UNSPECIFIED_NAME.to_string(),
            tax_id: UNSPECIFIED_TAX_ID.to_string(),
            reg_code: None,
            address: None,
        }
    }

    /// 12-digit tax ids belong to individuals and sole proprietors.
    pub fn is_individual(&self) -> bool {
        self.tax_id.chars().count() == 12
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub line_number: u32,
    pub name: String,
    pub unit_code: Option<String>,
    pub unit_name: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount_excl_tax: Decimal,
    pub tax_rate_label: String,
    pub tax_amount: Decimal,
    /// Authoritative per-line amount.
    pub amount_incl_tax: Decimal,
    pub catalog_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDocument {
    pub invoice_number: String,
    pub invoice_date: NaiveDateTime,
    pub seller: Organization,
    pub buyer: Organization,
    pub items: Vec<LineItem>,
    pub currency_code: String,
    pub total_excl_tax: Decimal,
    pub total_tax: Decimal,
    pub total_incl_tax: Decimal,
    /// Digits taken from the transfer basis; joins to the source sales invoice.
    pub source_invoice_reference: Option<String>,
}

impl InvoiceDocument {
    /// Document with no items and zero totals.
    pub fn new(
        invoice_number: String,
        invoice_date: NaiveDateTime,
        seller: Organization,
        buyer: Organization,
    ) -> Self {
        Self {
            invoice_number,
            invoice_date,
            seller,
            buyer,
            items: Vec::new(),
            currency_code: DEFAULT_CURRENCY_CODE.to_string(),
            total_excl_tax: Decimal::ZERO,
            total_tax: Decimal::ZERO,
            total_incl_tax: Decimal::ZERO,
            source_invoice_reference: None,
        }
    }

    /// The stub used when the main document carries no usable payload.
    pub fn stub(now: NaiveDateTime) -> Self {
        Self::new(
            UNSPECIFIED_NUMBER.to_string(),
            now,
            Organization::unspecified(),
            Organization::unspecified(),
        )
    }
}

/// Why the main document was replaced by a stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The payload was effectively just an XML declaration.
    StubPayload,
    /// The payload could not be parsed and lenient mode degraded it.
    MalformedPayload,
}

/// Everything extracted from one uploaded archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedBundle {
    pub index: BundleIndex,
    pub card: CardSummary,
    pub document: InvoiceDocument,
    pub fallback: Option<FallbackReason>,
}

impl ParsedBundle {
    pub fn document_id(&self) -> &str {
        &self.card.external_id
    }

    pub fn summary(&self) -> String {
        let doc = &self.document;
        format!(
            "УПД № {} от {}\nПоставщик: {} (ИНН: {})\nПокупатель: {} (ИНН: {})\nСумма: {:.2} ₽",
            doc.invoice_number,
            doc.invoice_date.format("%d.%m.%Y"),
            doc.seller.name,
            doc.seller.tax_id,
            doc.buyer.name,
            doc.buyer.tax_id,
            doc.total_incl_tax,
        )
    }
}

#[cfg(test)]
#[path = "tests/document_tests.rs"]
mod tests;
