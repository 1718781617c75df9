//! User-facing text for processing outcomes and status reports.

use crate::services::diagnostics::StatusReport;
use crate::services::moysklad::WebConsole;
use crate::services::reconcile::ReconciliationResult;
use crate::types::document::{FallbackReason, ParsedBundle, UNSPECIFIED_NAME};
use crate::types::errors::UpdError;
use std::fmt::Write;

pub fn success_message(
    bundle: &ParsedBundle,
    result: &ReconciliationResult,
    web: &WebConsole,
) -> String {
    let doc = &bundle.document;
    let mut out = String::from("✅ УПД успешно обработан и загружен в МойСклад!\n\n");

    let _ = writeln!(out, "📄 Счет-фактура: {}", name_or_unspecified(&result.invoice.name));
    let _ = writeln!(out, "📦 Отгрузка: {}", name_or_unspecified(&result.shipment.name));
    let _ = writeln!(out, "📅 Дата: {}\n", doc.invoice_date.format("%d.%m.%Y"));

    let _ = writeln!(out, "🏢 Поставщик: {}", party_line(&doc.seller.name, &doc.seller.tax_id));
    let _ = writeln!(out, "🏪 Покупатель: {}\n", party_line(&doc.buyer.name, &doc.buyer.tax_id));

    if doc.total_incl_tax > doc.total_excl_tax {
        let _ = writeln!(out, "💰 Сумма без НДС: {:.2} ₽", doc.total_excl_tax);
        let _ = writeln!(out, "🧾 НДС: {:.2} ₽", doc.total_tax);
        let _ = writeln!(out, "💵 Итого с НДС: {:.2} ₽\n", doc.total_incl_tax);
    }

    if let Some(reason) = bundle.fallback {
        let _ = writeln!(out, "{}\n", fallback_warning(reason));
    }

    out.push_str("🔗 Ссылки в МойСклад:\n");
    let _ = writeln!(out, "• Счет-фактура: {}", web.facture_out_url(&result.invoice.id));
    let _ = writeln!(out, "• Отгрузка: {}", web.demand_url(&result.shipment.id));

    if !bundle.index.flow_id.is_empty() {
        let _ = write!(out, "\n🆔 ID документооборота: {}", bundle.index.flow_id);
    }
    out
}

pub fn failure_message(error: &UpdError, web: &WebConsole) -> String {
    match error {
        UpdError::FileTooLarge { .. } | UpdError::InvalidFileType => format!("❌ {error}"),
        UpdError::InvoiceCreationFailed { shipment, .. } => format!(
            "❌ Ошибка загрузки в МойСклад:\n{error}\n\n⚠️ Отгрузка {} уже создана и не удалена:\n{}",
            name_or_unspecified(&shipment.name),
            web.demand_url(&shipment.id)
        ),
        UpdError::InvalidArchive(_)
        | UpdError::PathTraversal(_)
        | UpdError::MissingIndex
        | UpdError::MalformedIndex(_)
        | UpdError::MalformedCard(_)
        | UpdError::MalformedDocument(_)
        | UpdError::IoFailure(_) => format!("❌ Ошибка обработки УПД:\n{error}"),
        _ => format!("❌ Ошибка загрузки в МойСклад:\n{error}"),
    }
}

pub fn status_message(report: &StatusReport) -> String {
    let perms = &report.permissions;
    format!(
        "✅ Статус системы: Все работает!\n\n\
         👤 Пользователь МойСклад:\n   Имя: {}\n   Email: {}\n\n\
         🏢 Организация:\n   Название: {}\n   ИНН: {}\n\n\
         🔐 Права доступа:\n   {} Создание счетов-фактур\n   {} Работа с контрагентами\n   {} Склады ({})\n   📊 Организаций: {}\n\n\
         🌐 API: {}\n\n\
         🎉 Готов к обработке УПД документов!",
        report.employee.name,
        report.employee.email,
        report.organization.name,
        report.organization.inn,
        mark(perms.can_create_invoices),
        mark(perms.can_access_counterparties),
        mark(perms.can_access_stores),
        perms.stores_count,
        report.organizations_count,
        report.base_url,
    )
}

pub fn status_failure_message(error: &UpdError) -> String {
    format!(
        "⚠️ Статус системы: Есть проблемы\n\n❌ МойСклад API: {error}\n\n\
         💡 Рекомендации:\n• Проверьте токен МойСклад API\n• Убедитесь в наличии прав доступа\n• Обратитесь к администратору"
    )
}

fn fallback_warning(reason: FallbackReason) -> &'static str {
    match reason {
        FallbackReason::StubPayload => {
            "⚠️ Основной документ УПД пуст, данные документа не распознаны"
        }
        FallbackReason::MalformedPayload => {
            "⚠️ Основной документ УПД поврежден, данные документа не распознаны"
        }
    }
}

fn party_line(name: &str, tax_id: &str) -> String {
    if tax_id.is_empty() {
        name.to_string()
    } else {
        format!("{name} (ИНН: {tax_id})")
    }
}

fn name_or_unspecified(name: &str) -> &str {
    if name.is_empty() {
        UNSPECIFIED_NAME
    } else {
        name
    }
}

fn mark(flag: bool) -> &'static str {
    if flag {
        "✅"
    } else {
        "❌"
    }
}

#[cfg(test)]
#[path = "tests/report_tests.rs"]
mod tests;
