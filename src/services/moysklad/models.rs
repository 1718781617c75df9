//! Request and response schemas for the MoySklad JSON API (remap 1.2).
//!
//! Only the fields the engine reads are modelled; unknown fields are ignored
//! by serde. Prices on the wire are minor currency units (kopecks).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const MEDIA_TYPE_JSON: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub href: String,
    #[serde(rename = "type", default)]
    pub entity_type: String,
    #[serde(default)]
    pub media_type: String,
}

impl Meta {
    pub fn new(href: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            entity_type: entity_type.into(),
            media_type: MEDIA_TYPE_JSON.to_string(),
        }
    }
}

/// `{"meta": {...}}`, the shape of every entity reference in payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaRef {
    pub meta: Meta,
}

impl From<&Meta> for MetaRef {
    fn from(meta: &Meta) -> Self {
        Self { meta: meta.clone() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub rows: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub meta: Meta,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub inn: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counterparty {
    pub meta: Meta,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub inn: Option<String>,
}

/// A warehouse. Inside an invoice it may be a bare meta reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub meta: Meta,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Store {
    pub fn is_bare_reference(&self) -> bool {
        self.id.as_deref().unwrap_or_default().is_empty()
            && self.name.as_deref().unwrap_or_default().is_empty()
    }

    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assortment {
    pub meta: Meta,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub article: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoicePosition {
    /// Unit price in kopecks.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub assortment: Option<Assortment>,
}

/// Positions of an invoice: inline rows when expanded, otherwise only a meta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionList {
    #[serde(default)]
    pub meta: Option<Meta>,
    #[serde(default)]
    pub rows: Option<Vec<InvoicePosition>>,
}

/// Sales invoice to the customer (`invoiceout`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceOut {
    pub meta: Meta,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub store: Option<Store>,
    #[serde(default)]
    pub positions: Option<PositionList>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub meta: Meta,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub article: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub meta: Meta,
    pub id: String,
    pub name: String,
}

/// Response of a successful document creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedDocument {
    pub meta: Meta,
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanyType {
    Legal,
    Individual,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCounterparty {
    pub name: String,
    pub inn: String,
    pub company_type: CompanyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kpp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionPayload {
    pub quantity: f64,
    /// Kopecks.
    pub price: i64,
    pub assortment: MetaRef,
    pub vat: u32,
}

/// Body of `POST /entity/demand` (shipment).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandPayload {
    pub name: String,
    pub moment: String,
    pub organization: MetaRef,
    pub agent: MetaRef,
    pub store: MetaRef,
    pub vat_enabled: bool,
    pub vat_included: bool,
    pub positions: Vec<PositionPayload>,
    pub invoices_out: Vec<MetaRef>,
}

/// Body of `POST /entity/factureout` (outbound invoice).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactureOutPayload {
    pub name: String,
    pub moment: String,
    pub organization: MetaRef,
    pub agent: MetaRef,
    pub vat_enabled: bool,
    pub vat_included: bool,
    pub demands: Vec<MetaRef>,
    pub positions: Vec<PositionPayload>,
}
