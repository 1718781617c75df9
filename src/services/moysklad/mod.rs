//! MoySklad JSON API: typed schemas, the `AccountingApi` seam and its HTTP
//! implementation.

pub mod client;
pub mod models;

pub use client::HttpAccountingApi;

use crate::types::errors::ApiError;
use models::{
    Counterparty, CreatedDocument, DemandPayload, Employee, FactureOutPayload, InvoiceOut,
    InvoicePosition, NewCounterparty, Organization, Product, Service, Store,
};

/// How a catalog product is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductQuery<'a> {
    Article(&'a str),
    Name(&'a str),
}

impl ProductQuery<'_> {
    pub fn filter(&self) -> String {
        match self {
            ProductQuery::Article(article) => format!("article={article}"),
            ProductQuery::Name(name) => format!("name={name}"),
        }
    }
}

/// Entity collections read by the status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessCheck {
    FactureOut,
    Counterparty,
    Store,
}

impl AccessCheck {
    pub fn endpoint(&self) -> &'static str {
        match self {
            AccessCheck::FactureOut => "/entity/factureout",
            AccessCheck::Counterparty => "/entity/counterparty",
            AccessCheck::Store => "/entity/store",
        }
    }
}

/// Every call the engine makes against the accounting system.
///
/// Lookups return `Ok(None)` when the collection is empty for the filter;
/// `Err` is reserved for transport failures, non-success statuses and
/// undecodable bodies. Hrefs are absolute, exactly as returned in `meta`.
pub trait AccountingApi: Send + Sync {
    fn current_employee(&self) -> Result<Employee, ApiError>;

    fn list_organizations(&self) -> Result<Vec<Organization>, ApiError>;

    fn find_organization_by_tax_id(&self, tax_id: &str) -> Result<Option<Organization>, ApiError>;

    fn find_counterparty_by_tax_id(&self, tax_id: &str) -> Result<Option<Counterparty>, ApiError>;

    fn create_counterparty(&self, payload: &NewCounterparty) -> Result<Counterparty, ApiError>;

    /// Rows of `/entity/invoiceout` matching a raw filter expression.
    fn search_invoices_out(&self, filter: &str) -> Result<Vec<InvoiceOut>, ApiError>;

    /// Full sales invoice with `positions.assortment` expanded.
    fn get_invoice_out(&self, href: &str) -> Result<InvoiceOut, ApiError>;

    /// Position rows behind a positions collection href.
    fn get_invoice_positions(&self, href: &str) -> Result<Vec<InvoicePosition>, ApiError>;

    fn get_store(&self, href: &str) -> Result<Store, ApiError>;

    fn list_stores(&self) -> Result<Vec<Store>, ApiError>;

    fn find_product(&self, query: ProductQuery<'_>) -> Result<Option<Product>, ApiError>;

    fn first_service(&self) -> Result<Option<Service>, ApiError>;

    fn create_demand(&self, payload: &DemandPayload) -> Result<CreatedDocument, ApiError>;

    fn create_facture_out(&self, payload: &FactureOutPayload) -> Result<CreatedDocument, ApiError>;

    /// Whether a plain GET of the collection succeeds.
    fn can_read(&self, check: AccessCheck) -> bool;
}

/// Links into the MoySklad web console.
#[derive(Debug, Clone)]
pub struct WebConsole {
    base_url: String,
}

impl WebConsole {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn demand_url(&self, id: &str) -> String {
        format!("{}/#demand/edit?id={}", self.base_url, id)
    }

    pub fn facture_out_url(&self, id: &str) -> String {
        format!("{}/#factureout/edit?id={}", self.base_url, id)
    }
}

#[cfg(test)]
#[path = "tests/models_tests.rs"]
mod tests;
