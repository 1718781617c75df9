//! Maps a parsed UPD onto MoySklad entities and creates the shipment and the
//! outbound invoice.

pub mod positions;

use crate::services::moysklad::models::{
    CompanyType, Counterparty, CreatedDocument, DemandPayload, FactureOutPayload, InvoiceOut,
    InvoicePosition, MetaRef, NewCounterparty, Organization as ApiOrganization, Store,
};
use crate::services::moysklad::AccountingApi;
use crate::types::context::RequestContext;
use crate::types::document::{Organization, ParsedBundle};
use crate::types::errors::{ApiError, UpdError, UpdResult};
use chrono::NaiveDateTime;
use positions::{assemble_positions, PriceBook};

/// Filters tried in order against `/entity/invoiceout`.
const INVOICE_SEARCH_FILTERS: [&str; 3] = ["name=", "name~", "description~"];
const SHIPMENT_NAME_PREFIX: &str = "О";
const MOMENT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Progress through one reconciliation, logged at every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SellerResolved,
    BuyerResolved,
    SourceInvoiceLocated,
    WarehouseResolved,
    PositionsAssembled,
    ShipmentCreated,
    InvoiceCreated,
}

#[derive(Debug, Clone)]
pub struct ReconciliationResult {
    pub shipment: CreatedDocument,
    pub invoice: CreatedDocument,
}

pub struct Reconciler<'a> {
    api: &'a dyn AccountingApi,
    ctx: &'a RequestContext,
}

impl<'a> Reconciler<'a> {
    pub fn new(api: &'a dyn AccountingApi, ctx: &'a RequestContext) -> Self {
        Self { api, ctx }
    }

    /// Run the whole protocol. Each step depends on the previous one; the
    /// first failure aborts the request. A shipment created before an
    /// invoice failure is reported inside `InvoiceCreationFailed` and left in
    /// place.
    pub fn reconcile(&self, bundle: &ParsedBundle) -> UpdResult<ReconciliationResult> {
        let document = &bundle.document;
        log::info!(
            "[{}] Creating documents for UPD: {}",
            self.ctx.id(),
            bundle.document_id()
        );

        let seller = self.resolve_seller(&document.seller)?;
        self.enter(Stage::SellerResolved, &seller.name);

        let buyer = self.resolve_buyer(&document.buyer)?;
        self.enter(Stage::BuyerResolved, &buyer.name);

        let reference = document
            .source_invoice_reference
            .as_deref()
            .unwrap_or_default();
        let source = self.locate_source_invoice(reference)?;
        self.enter(Stage::SourceInvoiceLocated, &source.name);

        let store = self.resolve_warehouse(&source)?;
        self.enter(Stage::WarehouseResolved, store.label());

        let prices = PriceBook::from_positions(&self.source_positions(&source)?);
        log::info!(
            "[{}] Loaded {} priced positions from source invoice",
            self.ctx.id(),
            prices.len()
        );
        let positions = assemble_positions(self.ctx, self.api, document, &prices)?;
        self.enter(Stage::PositionsAssembled, &format!("{} positions", positions.len()));

        let moment = format_moment(&document.invoice_date);

        let demand = DemandPayload {
            name: format!("{SHIPMENT_NAME_PREFIX}{}", document.invoice_number),
            moment: moment.clone(),
            organization: MetaRef::from(&seller.meta),
            agent: MetaRef::from(&buyer.meta),
            store: MetaRef::from(&store.meta),
            vat_enabled: true,
            vat_included: true,
            positions: positions.clone(),
            invoices_out: vec![MetaRef::from(&source.meta)],
        };
        let shipment = self.api.create_demand(&demand).map_err(|e| match e {
            ApiError::Status { status, body, .. } => UpdError::ShipmentCreationFailed { status, body },
            other => UpdError::from(other),
        })?;
        self.enter(Stage::ShipmentCreated, &shipment.id);

        let facture = FactureOutPayload {
            name: document.invoice_number.clone(),
            moment,
            organization: MetaRef::from(&seller.meta),
            agent: MetaRef::from(&buyer.meta),
            vat_enabled: true,
            vat_included: true,
            demands: vec![MetaRef::from(&shipment.meta)],
            positions,
        };
        let invoice = match self.api.create_facture_out(&facture) {
            Ok(invoice) => invoice,
            Err(e) => {
                let (status, body) = match e {
                    ApiError::Status { status, body, .. } => (status, body),
                    other => (0, other.to_string()),
                };
                log::error!(
                    "[{}] Invoice creation failed after shipment {} was created",
                    self.ctx.id(),
                    shipment.id
                );
                return Err(UpdError::InvoiceCreationFailed {
                    status,
                    body,
                    shipment: Box::new(shipment),
                });
            }
        };
        self.enter(Stage::InvoiceCreated, &invoice.id);

        Ok(ReconciliationResult { shipment, invoice })
    }

    fn enter(&self, stage: Stage, detail: &str) {
        log::info!("[{}] {:?}: {}", self.ctx.id(), stage, detail);
    }

    fn resolve_seller(&self, seller: &Organization) -> UpdResult<ApiOrganization> {
        self.api
            .find_organization_by_tax_id(&seller.tax_id)?
            .ok_or_else(|| UpdError::SellerNotFound {
                tax_id: seller.tax_id.clone(),
            })
    }

    fn resolve_buyer(&self, buyer: &Organization) -> UpdResult<Counterparty> {
        if let Some(existing) = self.api.find_counterparty_by_tax_id(&buyer.tax_id)? {
            log::info!("[{}] Found existing counterparty: {}", self.ctx.id(), existing.name);
            return Ok(existing);
        }

        let payload = new_counterparty(buyer);
        log::info!(
            "[{}] Creating counterparty {} as {:?} (INN: {})",
            self.ctx.id(),
            payload.name,
            payload.company_type,
            payload.inn
        );
        Ok(self.api.create_counterparty(&payload)?)
    }

    fn locate_source_invoice(&self, reference: &str) -> UpdResult<InvoiceOut> {
        let not_found = || UpdError::SourceInvoiceNotFound {
            reference: reference.to_string(),
        };
        if reference.is_empty() {
            log::warn!("[{}] Document has no source invoice reference", self.ctx.id());
            return Err(not_found());
        }

        for prefix in INVOICE_SEARCH_FILTERS {
            let filter = format!("{prefix}{reference}");
            log::debug!("[{}] Searching invoice with filter: {}", self.ctx.id(), filter);
            if let Some(hit) = self.api.search_invoices_out(&filter)?.into_iter().next() {
                let full = self.api.get_invoice_out(&hit.meta.href)?;
                log::info!(
                    "[{}] Found source invoice {} (filter: {})",
                    self.ctx.id(),
                    full.name,
                    filter
                );
                return Ok(full);
            }
        }

        log::warn!("[{}] Source invoice {} not found", self.ctx.id(), reference);
        Err(not_found())
    }

    fn resolve_warehouse(&self, invoice: &InvoiceOut) -> UpdResult<Store> {
        let not_specified = || UpdError::WarehouseNotSpecified {
            invoice_name: invoice.name.clone(),
        };
        let store = invoice.store.as_ref().ok_or_else(not_specified)?;
        if !store.is_bare_reference() {
            return Ok(store.clone());
        }

        let full = self.api.get_store(&store.meta.href)?;
        if full.is_bare_reference() {
            return Err(not_specified());
        }
        Ok(full)
    }

    fn source_positions(&self, invoice: &InvoiceOut) -> UpdResult<Vec<InvoicePosition>> {
        let Some(list) = &invoice.positions else {
            return Ok(Vec::new());
        };
        if let Some(rows) = &list.rows {
            return Ok(rows.clone());
        }
        match &list.meta {
            Some(meta) => Ok(self.api.get_invoice_positions(&meta.href)?),
            None => Ok(Vec::new()),
        }
    }
}

/// 12-digit tax ids are individuals and carry no KPP.
pub fn new_counterparty(buyer: &Organization) -> NewCounterparty {
    if buyer.is_individual() {
        NewCounterparty {
            name: buyer.name.clone(),
            inn: buyer.tax_id.clone(),
            company_type: CompanyType::Individual,
            kpp: None,
        }
    } else {
        NewCounterparty {
            name: buyer.name.clone(),
            inn: buyer.tax_id.clone(),
            company_type: CompanyType::Legal,
            kpp: buyer.reg_code.clone().filter(|k| !k.is_empty()),
        }
    }
}

pub fn format_moment(date: &NaiveDateTime) -> String {
    date.format(MOMENT_FORMAT).to_string()
}

#[cfg(test)]
#[path = "tests/positions_tests.rs"]
mod tests;
