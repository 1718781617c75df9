use super::models::{
    Counterparty, CreatedDocument, DemandPayload, Employee, FactureOutPayload, InvoiceOut,
    InvoicePosition, ListResponse, NewCounterparty, Organization, Product, Service, Store,
};
use super::{AccessCheck, AccountingApi, ProductQuery};
use crate::types::errors::ApiError;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};

const JSON_UTF8: &str = "application/json;charset=utf-8";

/// Blocking MoySklad client. `Client` is reference-counted internally, so one
/// instance is shared by every concurrent upload.
pub struct HttpAccountingApi {
    client: Client,
    base_url: String,
}

impl HttpAccountingApi {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
            ApiError::Transport {
                endpoint: base_url.to_string(),
                message: format!("invalid token header: {e}"),
            }
        })?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_UTF8));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport {
                endpoint: base_url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Endpoint (`/entity/...`) or absolute href to a URL with query params.
    fn url(&self, target: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
        let full = if target.starts_with("http://") || target.starts_with("https://") {
            target.to_string()
        } else {
            format!("{}{}", self.base_url, target)
        };
        Url::parse_with_params(&full, params).map_err(|e| ApiError::Transport {
            endpoint: self.display_endpoint(target),
            message: format!("invalid URL: {e}"),
        })
    }

    /// Path relative to the API root, for log lines and error messages.
    fn display_endpoint(&self, target: &str) -> String {
        target
            .strip_prefix(&self.base_url)
            .unwrap_or(target)
            .to_string()
    }

    fn send(&self, method: Method, target: &str, request: RequestBuilder) -> Result<Response, ApiError> {
        let endpoint = self.display_endpoint(target);
        let started = Instant::now();
        let result = request.send();
        let elapsed_ms = started.elapsed().as_millis();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                log::error!("MoySklad API: request failed {} {} ({}ms): {}", method, endpoint, elapsed_ms, e);
                return Err(ApiError::Transport {
                    endpoint,
                    message: e.to_string(),
                });
            }
        };

        let status = response.status();
        if status.is_success() {
            log::info!("MoySklad API: {} {} -> {} ({}ms)", method, endpoint, status.as_u16(), elapsed_ms);
            return Ok(response);
        }

        if status.is_client_error() || status.is_server_error() {
            log::error!("MoySklad API: {} {} -> {} ({}ms)", method, endpoint, status.as_u16(), elapsed_ms);
        } else {
            log::warn!("MoySklad API: {} {} -> {} ({}ms)", method, endpoint, status.as_u16(), elapsed_ms);
        }
        let body = response.text().unwrap_or_default();
        Err(ApiError::Status {
            endpoint,
            status: status.as_u16(),
            body,
        })
    }

    fn decode<T: DeserializeOwned>(&self, target: &str, response: Response) -> Result<T, ApiError> {
        response.json::<T>().map_err(|e| ApiError::Decode {
            endpoint: self.display_endpoint(target),
            message: e.to_string(),
        })
    }

    fn get<T: DeserializeOwned>(&self, target: &str, params: &[(&str, &str)]) -> Result<T, ApiError> {
        let url = self.url(target, params)?;
        let response = self.send(Method::GET, target, self.client.get(url))?;
        self.decode(target, response)
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, target: &str, body: &B) -> Result<T, ApiError> {
        let url = self.url(target, &[])?;
        let response = self.send(Method::POST, target, self.client.post(url).json(body))?;
        self.decode(target, response)
    }

    fn first_row<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        filter: &str,
    ) -> Result<Option<T>, ApiError> {
        let list: ListResponse<T> = self.get(endpoint, &[("filter", filter)])?;
        Ok(list.rows.into_iter().next())
    }
}

impl AccountingApi for HttpAccountingApi {
    fn current_employee(&self) -> Result<Employee, ApiError> {
        self.get("/context/employee", &[])
    }

    fn list_organizations(&self) -> Result<Vec<Organization>, ApiError> {
        let list: ListResponse<Organization> = self.get("/entity/organization", &[])?;
        Ok(list.rows)
    }

    fn find_organization_by_tax_id(&self, tax_id: &str) -> Result<Option<Organization>, ApiError> {
        self.first_row("/entity/organization", &format!("inn={tax_id}"))
    }

    fn find_counterparty_by_tax_id(&self, tax_id: &str) -> Result<Option<Counterparty>, ApiError> {
        self.first_row("/entity/counterparty", &format!("inn={tax_id}"))
    }

    fn create_counterparty(&self, payload: &NewCounterparty) -> Result<Counterparty, ApiError> {
        self.post("/entity/counterparty", payload)
    }

    fn search_invoices_out(&self, filter: &str) -> Result<Vec<InvoiceOut>, ApiError> {
        let list: ListResponse<InvoiceOut> = self.get("/entity/invoiceout", &[("filter", filter)])?;
        Ok(list.rows)
    }

    fn get_invoice_out(&self, href: &str) -> Result<InvoiceOut, ApiError> {
        self.get(href, &[("expand", "positions.assortment")])
    }

    fn get_invoice_positions(&self, href: &str) -> Result<Vec<InvoicePosition>, ApiError> {
        let list: ListResponse<InvoicePosition> = self.get(href, &[("expand", "assortment")])?;
        Ok(list.rows)
    }

    fn get_store(&self, href: &str) -> Result<Store, ApiError> {
        self.get(href, &[])
    }

    fn list_stores(&self) -> Result<Vec<Store>, ApiError> {
        let list: ListResponse<Store> = self.get("/entity/store", &[])?;
        Ok(list.rows)
    }

    fn find_product(&self, query: ProductQuery<'_>) -> Result<Option<Product>, ApiError> {
        self.first_row("/entity/product", &query.filter())
    }

    fn first_service(&self) -> Result<Option<Service>, ApiError> {
        let list: ListResponse<Service> = self.get("/entity/service", &[])?;
        Ok(list.rows.into_iter().next())
    }

    fn create_demand(&self, payload: &DemandPayload) -> Result<CreatedDocument, ApiError> {
        self.post("/entity/demand", payload)
    }

    fn create_facture_out(&self, payload: &FactureOutPayload) -> Result<CreatedDocument, ApiError> {
        self.post("/entity/factureout", payload)
    }

    fn can_read(&self, check: AccessCheck) -> bool {
        let endpoint = check.endpoint();
        match self.url(endpoint, &[]) {
            Ok(url) => self
                .send(Method::GET, endpoint, self.client.get(url))
                .is_ok(),
            Err(_) => false,
        }
    }
}
