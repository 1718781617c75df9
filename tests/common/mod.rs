#![allow(dead_code)]

use encoding_rs::WINDOWS_1251;
use rust_decimal::Decimal;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};
use upd_loader_lib::services::moysklad::models::{
    Assortment, Counterparty, CreatedDocument, DemandPayload, Employee, FactureOutPayload,
    InvoiceOut, InvoicePosition, Meta, NewCounterparty, Organization as ApiOrganization,
    PositionList, Product, Service, Store,
};
use upd_loader_lib::services::moysklad::{AccessCheck, AccountingApi, ProductQuery};
use upd_loader_lib::types::document::{
    BundleIndex, CardSummary, InvoiceDocument, LineItem, Organization, ParsedBundle,
};
use upd_loader_lib::types::errors::ApiError;

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub const API: &str = "https://api.moysklad.ru/api/remap/1.2";
pub const SELLER_INN: &str = "7700000000";
pub const BUYER_INN: &str = "500000000000";

pub fn meta(kind: &str, id: &str) -> Meta {
    Meta::new(format!("{API}/entity/{kind}/{id}"), kind)
}

pub fn organization(id: &str, name: &str, inn: &str) -> ApiOrganization {
    ApiOrganization {
        meta: meta("organization", id),
        id: id.to_string(),
        name: name.to_string(),
        inn: Some(inn.to_string()),
    }
}

pub fn product(id: &str, name: &str, article: Option<&str>) -> Product {
    Product {
        meta: meta("product", id),
        id: id.to_string(),
        name: name.to_string(),
        article: article.map(str::to_string),
        code: None,
    }
}

pub fn service(id: &str, name: &str) -> Service {
    Service {
        meta: meta("service", id),
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn store(id: &str, name: &str) -> Store {
    Store {
        meta: meta("store", id),
        id: Some(id.to_string()),
        name: Some(name.to_string()),
    }
}

pub fn priced_position(article: Option<&str>, name: &str, kopecks: i64) -> InvoicePosition {
    InvoicePosition {
        price: Decimal::from(kopecks),
        assortment: Some(Assortment {
            meta: meta("product", "source"),
            name: Some(name.to_string()),
            article: article.map(str::to_string),
        }),
    }
}

/// Sales invoice whose store is a bare meta reference and whose positions are
/// inlined, as returned with `expand=positions.assortment`.
pub fn invoice(id: &str, name: &str, store_id: Option<&str>, rows: Vec<InvoicePosition>) -> InvoiceOut {
    InvoiceOut {
        meta: meta("invoiceout", id),
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        store: store_id.map(|s| Store {
            meta: meta("store", s),
            id: None,
            name: None,
        }),
        positions: Some(PositionList {
            meta: Some(Meta::new(
                format!("{API}/entity/invoiceout/{id}/positions"),
                "invoiceposition",
            )),
            rows: Some(rows),
        }),
    }
}

/// In-memory MoySklad. Every call is recorded as `"<operation> <argument>"`.
#[derive(Default)]
pub struct FakeApi {
    pub token_valid: bool,
    pub organizations: Vec<ApiOrganization>,
    pub counterparties: Mutex<Vec<Counterparty>>,
    pub invoices: Vec<InvoiceOut>,
    /// Position rows served by href when an invoice does not inline them.
    pub detached_positions: Vec<(String, Vec<InvoicePosition>)>,
    pub stores: Vec<Store>,
    pub products: Vec<Product>,
    pub services: Vec<Service>,
    pub fail_products: bool,
    pub fail_demand: Option<(u16, String)>,
    pub fail_facture: Option<(u16, String)>,
    pub readable: Vec<AccessCheck>,

    pub calls: Mutex<Vec<String>>,
    pub created_counterparties: Mutex<Vec<NewCounterparty>>,
    pub demands: Mutex<Vec<DemandPayload>>,
    pub factures: Mutex<Vec<FactureOutPayload>>,
}

impl FakeApi {
    /// Seller, an invoice "42" on a resolvable store, and product SKU-1.
    pub fn happy() -> Self {
        Self {
            token_valid: true,
            organizations: vec![organization("org-1", "ООО Ромашка", SELLER_INN)],
            invoices: vec![invoice(
                "inv-42",
                "42",
                Some("store-1"),
                vec![priced_position(Some("SKU-1"), "Гвозди", 15000)],
            )],
            stores: vec![store("store-1", "Основной склад")],
            products: vec![product("p-1", "Гвозди", Some("SKU-1"))],
            services: vec![service("svc-1", "Доставка")],
            readable: vec![
                AccessCheck::FactureOut,
                AccessCheck::Counterparty,
                AccessCheck::Store,
            ],
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with("create_"))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn status<T>(endpoint: &str, status: u16, body: &str) -> Result<T, ApiError> {
        Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status,
            body: body.to_string(),
        })
    }
}

impl AccountingApi for FakeApi {
    fn current_employee(&self) -> Result<Employee, ApiError> {
        self.record("current_employee".into());
        if !self.token_valid {
            return Self::status("/context/employee", 401, "Unauthorized");
        }
        Ok(Employee {
            name: Some("Админ".into()),
            email: Some("admin@example.com".into()),
        })
    }

    fn list_organizations(&self) -> Result<Vec<ApiOrganization>, ApiError> {
        self.record("list_organizations".into());
        Ok(self.organizations.clone())
    }

    fn find_organization_by_tax_id(&self, tax_id: &str) -> Result<Option<ApiOrganization>, ApiError> {
        self.record(format!("find_organization {tax_id}"));
        Ok(self
            .organizations
            .iter()
            .find(|o| o.inn.as_deref() == Some(tax_id))
            .cloned())
    }

    fn find_counterparty_by_tax_id(&self, tax_id: &str) -> Result<Option<Counterparty>, ApiError> {
        self.record(format!("find_counterparty {tax_id}"));
        Ok(self
            .counterparties
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.inn.as_deref() == Some(tax_id))
            .cloned())
    }

    fn create_counterparty(&self, payload: &NewCounterparty) -> Result<Counterparty, ApiError> {
        self.record(format!("create_counterparty {}", payload.inn));
        self.created_counterparties
            .lock()
            .unwrap()
            .push(payload.clone());
        let id = format!("cp-{}", payload.inn);
        Ok(Counterparty {
            meta: meta("counterparty", &id),
            id,
            name: payload.name.clone(),
            inn: Some(payload.inn.clone()),
        })
    }

    fn search_invoices_out(&self, filter: &str) -> Result<Vec<InvoiceOut>, ApiError> {
        self.record(format!("search_invoices {filter}"));
        let matches = |inv: &InvoiceOut| {
            if let Some(value) = filter.strip_prefix("name=") {
                inv.name == value
            } else if let Some(value) = filter.strip_prefix("name~") {
                inv.name.contains(value)
            } else if let Some(value) = filter.strip_prefix("description~") {
                inv.description.as_deref().unwrap_or_default().contains(value)
            } else {
                false
            }
        };
        Ok(self.invoices.iter().filter(|i| matches(i)).cloned().collect())
    }

    fn get_invoice_out(&self, href: &str) -> Result<InvoiceOut, ApiError> {
        self.record(format!("get_invoice {href}"));
        match self.invoices.iter().find(|i| i.meta.href == href) {
            Some(found) => Ok(found.clone()),
            None => Self::status(href, 404, "not found"),
        }
    }

    fn get_invoice_positions(&self, href: &str) -> Result<Vec<InvoicePosition>, ApiError> {
        self.record(format!("get_positions {href}"));
        if let Some((_, rows)) = self.detached_positions.iter().find(|(h, _)| h == href) {
            return Ok(rows.clone());
        }
        Ok(self
            .invoices
            .iter()
            .find(|i| {
                i.positions
                    .as_ref()
                    .and_then(|p| p.meta.as_ref())
                    .map(|m| m.href == href)
                    .unwrap_or(false)
            })
            .and_then(|i| i.positions.as_ref())
            .and_then(|p| p.rows.clone())
            .unwrap_or_default())
    }

    fn get_store(&self, href: &str) -> Result<Store, ApiError> {
        self.record(format!("get_store {href}"));
        match self.stores.iter().find(|s| s.meta.href == href) {
            Some(found) => Ok(found.clone()),
            None => Self::status(href, 404, "not found"),
        }
    }

    fn list_stores(&self) -> Result<Vec<Store>, ApiError> {
        self.record("list_stores".into());
        if !self.readable.contains(&AccessCheck::Store) {
            return Self::status("/entity/store", 403, "Forbidden");
        }
        Ok(self.stores.clone())
    }

    fn find_product(&self, query: ProductQuery<'_>) -> Result<Option<Product>, ApiError> {
        self.record(format!("find_product {}", query.filter()));
        if self.fail_products {
            return Self::status("/entity/product", 500, "Internal Server Error");
        }
        Ok(self
            .products
            .iter()
            .find(|p| match query {
                ProductQuery::Article(article) => p.article.as_deref() == Some(article),
                ProductQuery::Name(name) => p.name == name,
            })
            .cloned())
    }

    fn first_service(&self) -> Result<Option<Service>, ApiError> {
        self.record("first_service".into());
        Ok(self.services.first().cloned())
    }

    fn create_demand(&self, payload: &DemandPayload) -> Result<CreatedDocument, ApiError> {
        self.record(format!("create_demand {}", payload.name));
        if let Some((status, body)) = &self.fail_demand {
            return Self::status("/entity/demand", *status, body);
        }
        let mut demands = self.demands.lock().unwrap();
        demands.push(payload.clone());
        let id = format!("demand-{}", demands.len());
        Ok(CreatedDocument {
            meta: meta("demand", &id),
            id,
            name: payload.name.clone(),
        })
    }

    fn create_facture_out(&self, payload: &FactureOutPayload) -> Result<CreatedDocument, ApiError> {
        self.record(format!("create_facture {}", payload.name));
        if let Some((status, body)) = &self.fail_facture {
            return Self::status("/entity/factureout", *status, body);
        }
        let mut factures = self.factures.lock().unwrap();
        factures.push(payload.clone());
        let id = format!("facture-{}", factures.len());
        Ok(CreatedDocument {
            meta: meta("factureout", &id),
            id,
            name: payload.name.clone(),
        })
    }

    fn can_read(&self, check: AccessCheck) -> bool {
        self.record(format!("can_read {}", check.endpoint()));
        self.readable.contains(&check)
    }
}

// ---------------------------------------------------------------------------
// Documents and archives
// ---------------------------------------------------------------------------

pub fn party(name: &str, inn: &str, kpp: Option<&str>) -> Organization {
    Organization {
        name: name.to_string(),
        tax_id: inn.to_string(),
        reg_code: kpp.map(str::to_string),
        address: None,
    }
}

pub fn line(code: Option<&str>, name: &str, quantity: i64, unit_price: Decimal) -> LineItem {
    LineItem {
        line_number: 1,
        name: name.to_string(),
        unit_code: None,
        unit_name: None,
        quantity: Decimal::from(quantity),
        unit_price,
        amount_excl_tax: unit_price * Decimal::from(quantity),
        tax_rate_label: "20%".to_string(),
        tax_amount: Decimal::ZERO,
        amount_incl_tax: unit_price * Decimal::from(quantity),
        catalog_code: code.map(str::to_string),
    }
}

/// Bundle with a legal seller, an individual buyer and reference "42".
pub fn parsed_bundle(items: Vec<LineItem>) -> ParsedBundle {
    let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut document = InvoiceDocument::new(
        "17".to_string(),
        date,
        party("ООО Ромашка", SELLER_INN, Some("770001001")),
        party("Иванов Иван Иванович", BUYER_INN, None),
    );
    document.total_incl_tax = items.iter().map(|i| i.amount_incl_tax).sum();
    document.total_excl_tax = document.total_incl_tax;
    document.items = items;
    document.source_invoice_reference = Some("42".to_string());

    ParsedBundle {
        index: BundleIndex {
            flow_id: "flow-1".into(),
            main_document_path: "upd.xml".into(),
            card_path: "card.xml".into(),
        },
        card: CardSummary {
            external_id: "ext-1".into(),
            title: "УПД".into(),
            issued_at: chrono::Local::now().fixed_offset(),
            sender_tax_id: SELLER_INN.into(),
            sender_reg_code: "770001001".into(),
            sender_name: None,
        },
        document,
        fallback: None,
    }
}

pub fn cp1251(text: &str) -> Vec<u8> {
    let (bytes, _, _) = WINDOWS_1251.encode(text);
    bytes.into_owned()
}

pub fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

/// Archive in the layout produced by EDI operators: UTF-8 index, 1251 payloads.
pub fn write_upd_archive(dir: &Path, file_name: &str, main_document: &str) -> PathBuf {
    let path = dir.join(file_name);
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    let entries: [(&str, Vec<u8>); 3] = [
        ("meta.xml", fixture("meta.xml").into_bytes()),
        ("flow/card.xml", cp1251(&fixture("card.xml"))),
        ("flow/upd.xml", cp1251(main_document)),
    ];
    for (name, content) in entries {
        writer.start_file(name, options).unwrap();
        writer.write_all(&content).unwrap();
    }
    writer.finish().unwrap();
    path
}
