use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::moysklad::models::CreatedDocument;

/// Everything that can terminate a single UPD processing request.
///
/// Messages are user-facing (Russian, like the rest of the bot output) and
/// embed the offending identifiers.
#[derive(Debug, Error)]
pub enum UpdError {
    #[error("Файл слишком большой. Максимальный размер: {max_mb} МБ")]
    FileTooLarge { max_mb: u64 },
    #[error("Поддерживаются только ZIP архивы с УПД")]
    InvalidFileType,
    #[error("Некорректный архив: {0}")]
    InvalidArchive(String),
    #[error("Недопустимый путь в архиве: {0}")]
    PathTraversal(String),
    #[error("meta.xml не найден в архиве")]
    MissingIndex,
    #[error("Ошибка разбора meta.xml: {0}")]
    MalformedIndex(String),
    #[error("Ошибка разбора card.xml: {0}")]
    MalformedCard(String),
    #[error("Ошибка разбора документа УПД: {0}")]
    MalformedDocument(String),
    #[error("Ошибка ввода-вывода: {0}")]
    IoFailure(String),
    #[error("Организация-поставщик с ИНН {tax_id} не найдена в МойСклад")]
    SellerNotFound { tax_id: String },
    #[error("Счет покупателю с номером '{reference}' не найден.\nСоздайте счет с указанным номером и повторите попытку.")]
    SourceInvoiceNotFound { reference: String },
    #[error("В счете покупателю '{invoice_name}' не указан склад.\nУкажите склад в счете и повторите попытку.")]
    WarehouseNotSpecified { invoice_name: String },
    #[error("Следующие товары из УПД не найдены в МойСклад:\n• {}\n\nСоздайте эти товары в МойСклад вручную и повторите загрузку УПД.", .items.join("\n• "))]
    ProductsNotFound { items: Vec<String> },
    #[error("В МойСклад нет доступных услуг для создания позиции документа.\nСоздайте хотя бы одну услугу в МойСклад и повторите попытку.")]
    NoServiceAvailable,
    #[error("Ошибка создания отгрузки: {status} - {body}")]
    ShipmentCreationFailed { status: u16, body: String },
    #[error("Ошибка создания счета-фактуры: {status} - {body}")]
    InvoiceCreationFailed {
        status: u16,
        body: String,
        /// Shipment created in the first phase; it is left in place.
        shipment: Box<CreatedDocument>,
    },
    #[error("Ошибка API МойСклад: {0}")]
    ExternalApiFailure(String),
}

impl UpdError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UpdError::FileTooLarge { .. } => ErrorKind::FileTooLarge,
            UpdError::InvalidFileType => ErrorKind::InvalidFileType,
            UpdError::InvalidArchive(_) => ErrorKind::InvalidArchive,
            UpdError::PathTraversal(_) => ErrorKind::PathTraversal,
            UpdError::MissingIndex => ErrorKind::MissingIndex,
            UpdError::MalformedIndex(_) => ErrorKind::MalformedIndex,
            UpdError::MalformedCard(_) => ErrorKind::MalformedCard,
            UpdError::MalformedDocument(_) => ErrorKind::MalformedDocument,
            UpdError::IoFailure(_) => ErrorKind::IoFailure,
            UpdError::SellerNotFound { .. } => ErrorKind::SellerNotFound,
            UpdError::SourceInvoiceNotFound { .. } => ErrorKind::SourceInvoiceNotFound,
            UpdError::WarehouseNotSpecified { .. } => ErrorKind::WarehouseNotSpecified,
            UpdError::ProductsNotFound { .. } => ErrorKind::ProductsNotFound,
            UpdError::NoServiceAvailable => ErrorKind::NoServiceAvailable,
            UpdError::ShipmentCreationFailed { .. } => ErrorKind::ShipmentCreationFailed,
            UpdError::InvoiceCreationFailed { .. } => ErrorKind::InvoiceCreationFailed,
            UpdError::ExternalApiFailure(_) => ErrorKind::ExternalApiFailure,
        }
    }
}

impl From<std::io::Error> for UpdError {
    fn from(error: std::io::Error) -> Self {
        UpdError::IoFailure(error.to_string())
    }
}

impl From<ApiError> for UpdError {
    fn from(error: ApiError) -> Self {
        UpdError::ExternalApiFailure(error.to_string())
    }
}

pub type UpdResult<T> = Result<T, UpdError>;

/// Machine-readable error code carried by `ProcessingOutcome`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    FileTooLarge,
    InvalidFileType,
    InvalidArchive,
    PathTraversal,
    MissingIndex,
    MalformedIndex,
    MalformedCard,
    MalformedDocument,
    IoFailure,
    SellerNotFound,
    SourceInvoiceNotFound,
    WarehouseNotSpecified,
    ProductsNotFound,
    NoServiceAvailable,
    ShipmentCreationFailed,
    InvoiceCreationFailed,
    ExternalApiFailure,
}

/// Failure of a single call to the accounting API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error on {endpoint}: {message}")]
    Transport { endpoint: String, message: String },
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("failed to decode {endpoint} response: {message}")]
    Decode { endpoint: String, message: String },
}

/// Errors raised at the command layer, before or around the engine.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for CommandError {
    fn from(error: std::io::Error) -> Self {
        CommandError::Io(error.to_string())
    }
}

impl Serialize for CommandError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

#[cfg(test)]
#[path = "tests/errors_tests.rs"]
mod tests;
