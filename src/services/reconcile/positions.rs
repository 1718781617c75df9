//! Line items to document positions: product resolution, price precedence and
//! the service fallback for documents without items.

use crate::services::moysklad::models::{InvoicePosition, MetaRef, PositionPayload};
use crate::services::moysklad::{AccountingApi, ProductQuery};
use crate::services::parser::first_digit_run;
use crate::types::context::RequestContext;
use crate::types::document::{InvoiceDocument, LineItem};
use crate::types::errors::{UpdError, UpdResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;

pub const DEFAULT_VAT_PERCENT: u32 = 18;
/// Service position price when the document total is zero: 1000.00 RUB.
pub const DEFAULT_SERVICE_PRICE_MINOR: i64 = 100_000;

/// Unit prices (kopecks) recorded in the source sales invoice.
#[derive(Debug, Default, Clone)]
pub struct PriceBook {
    by_article: HashMap<String, i64>,
    by_name: HashMap<String, i64>,
}

impl PriceBook {
    /// Later rows overwrite earlier ones; non-positive prices are ignored.
    pub fn from_positions(positions: &[InvoicePosition]) -> Self {
        let mut book = Self::default();
        for position in positions {
            let Some(assortment) = &position.assortment else {
                continue;
            };
            let price = to_minor(position.price.trunc());
            if price <= 0 {
                continue;
            }
            if let Some(article) = assortment.article.as_deref().filter(|a| !a.is_empty()) {
                book.by_article.insert(article.to_string(), price);
            }
            if let Some(name) = assortment.name.as_deref().filter(|n| !n.is_empty()) {
                book.by_name.insert(name.to_string(), price);
            }
        }
        book
    }

    pub fn len(&self) -> usize {
        self.by_article.len().max(self.by_name.len())
    }

    pub fn is_empty(&self) -> bool {
        self.by_article.is_empty() && self.by_name.is_empty()
    }

    /// Price by catalog code first, then by exact name.
    pub fn price_for(&self, item: &LineItem) -> Option<i64> {
        item.catalog_code
            .as_deref()
            .filter(|code| !code.is_empty())
            .and_then(|code| self.by_article.get(code))
            .or_else(|| self.by_name.get(&item.name))
            .copied()
    }
}

/// Amount in kopecks, truncated toward zero.
pub fn minor_units(amount: Decimal) -> i64 {
    to_minor((amount * Decimal::ONE_HUNDRED).trunc())
}

fn to_minor(value: Decimal) -> i64 {
    value.to_i64().unwrap_or(0)
}

/// Leading digit run of a label such as `"20%"`; 18 when there is none.
pub fn tax_rate_percent(label: &str) -> u32 {
    first_digit_run(label)
        .and_then(|digits| digits.parse::<u32>().ok())
        .unwrap_or(DEFAULT_VAT_PERCENT)
}

pub fn describe_missing(item: &LineItem) -> String {
    let code = item
        .catalog_code
        .as_deref()
        .filter(|c| !c.is_empty())
        .unwrap_or("не указан");
    format!("{} (артикул: {})", item.name, code)
}

/// Resolve every line item to a position.
///
/// Every item is attempted before failing, so `ProductsNotFound` names all
/// unresolved items at once. No position list is returned in that case.
pub fn assemble_positions(
    ctx: &RequestContext,
    api: &dyn AccountingApi,
    document: &InvoiceDocument,
    prices: &PriceBook,
) -> UpdResult<Vec<PositionPayload>> {
    let mut positions = Vec::with_capacity(document.items.len());
    let mut missing = Vec::new();

    for item in &document.items {
        let mut product = None;
        if let Some(code) = item.catalog_code.as_deref().filter(|c| !c.is_empty()) {
            log::info!("[{}] Searching product by article: {}", ctx.id(), code);
            product = api.find_product(ProductQuery::Article(code))?;
            if product.is_none() {
                log::warn!("[{}] Product not found by article: {}", ctx.id(), code);
            }
        }
        if product.is_none() {
            log::info!("[{}] Searching product by name: {}", ctx.id(), item.name);
            product = api.find_product(ProductQuery::Name(&item.name))?;
        }

        let Some(product) = product else {
            log::warn!("[{}] Product not found: {}", ctx.id(), item.name);
            missing.push(describe_missing(item));
            continue;
        };

        let price = match prices.price_for(item) {
            Some(price) => {
                log::info!(
                    "[{}] Using source invoice price for '{}': {} kopecks",
                    ctx.id(),
                    item.name,
                    price
                );
                price
            }
            None => {
                let price = minor_units(item.unit_price);
                log::warn!(
                    "[{}] Price for '{}' not found in source invoice, using document price: {} kopecks",
                    ctx.id(),
                    item.name,
                    price
                );
                price
            }
        };

        positions.push(PositionPayload {
            quantity: item.quantity.to_f64().unwrap_or(0.0),
            price,
            assortment: MetaRef::from(&product.meta),
            vat: tax_rate_percent(&item.tax_rate_label),
        });
    }

    if !missing.is_empty() {
        return Err(UpdError::ProductsNotFound { items: missing });
    }

    if positions.is_empty() {
        positions.push(service_position(ctx, api, document)?);
    }

    Ok(positions)
}

fn service_position(
    ctx: &RequestContext,
    api: &dyn AccountingApi,
    document: &InvoiceDocument,
) -> UpdResult<PositionPayload> {
    let service = api.first_service()?.ok_or(UpdError::NoServiceAvailable)?;
    let price = if document.total_incl_tax > Decimal::ZERO {
        minor_units(document.total_incl_tax)
    } else {
        DEFAULT_SERVICE_PRICE_MINOR
    };
    log::info!(
        "[{}] No line items, using service '{}' at {} kopecks",
        ctx.id(),
        service.name,
        price
    );
    Ok(PositionPayload {
        quantity: 1.0,
        price,
        assortment: MetaRef::from(&service.meta),
        vat: DEFAULT_VAT_PERCENT,
    })
}
