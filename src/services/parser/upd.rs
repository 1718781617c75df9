use super::numbers::{first_digit_run, parse_decimal, parse_invoice_date};
use super::xml_tree::{parse_tree, XmlNode};
use super::ParseMode;
use crate::types::context::RequestContext;
use crate::types::document::{
    Address, FallbackReason, InvoiceDocument, LineItem, Organization, UNSPECIFIED_NAME,
    UNSPECIFIED_NUMBER,
};
use crate::types::errors::{UpdError, UpdResult};
use chrono::{Local, NaiveDateTime};
use rust_decimal::Decimal;

/// Payloads at or below this many characters (after trimming) are treated as
/// an XML declaration without content.
pub const STUB_THRESHOLD_CHARS: usize = 100;

const UPD_ROOT: &str = "Файл";

#[derive(Debug, Clone)]
pub struct ParsedMainDocument {
    pub document: InvoiceDocument,
    /// `Some` when `document` is the stub rather than parsed content.
    pub fallback: Option<FallbackReason>,
}

/// Parse the main UPD document.
///
/// Stub payloads always yield the stub document. Structural errors yield the
/// stub in `Lenient` mode and `MalformedDocument` in `Strict` mode.
pub fn parse_main_document(
    ctx: &RequestContext,
    text: &str,
    mode: ParseMode,
) -> UpdResult<ParsedMainDocument> {
    if text.trim().chars().count() <= STUB_THRESHOLD_CHARS {
        log::warn!(
            "[{}] UPD file contains only an XML header, creating basic structure",
            ctx.id()
        );
        return Ok(ParsedMainDocument {
            document: InvoiceDocument::stub(now()),
            fallback: Some(FallbackReason::StubPayload),
        });
    }

    log::info!("[{}] Parsing full UPD document...", ctx.id());
    match parse_full(text) {
        Ok(document) => {
            log::info!(
                "[{}] UPD parsed: № {}, seller INN {}, buyer INN {}, {} items",
                ctx.id(),
                document.invoice_number,
                document.seller.tax_id,
                document.buyer.tax_id,
                document.items.len()
            );
            Ok(ParsedMainDocument {
                document,
                fallback: None,
            })
        }
        Err(reason) => match mode {
            ParseMode::Lenient => {
                log::warn!(
                    "[{}] Error parsing full UPD: {}, creating basic structure",
                    ctx.id(),
                    reason
                );
                Ok(ParsedMainDocument {
                    document: InvoiceDocument::stub(now()),
                    fallback: Some(FallbackReason::MalformedPayload),
                })
            }
            ParseMode::Strict => Err(UpdError::MalformedDocument(reason)),
        },
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn parse_full(text: &str) -> Result<InvoiceDocument, String> {
    let root = parse_tree(text).map_err(|e| e.to_string())?;
    if root.name != UPD_ROOT {
        return Err(format!(
            "ожидался корневой элемент <{UPD_ROOT}>, найден <{}>",
            root.name
        ));
    }

    let header = root.find("СвСчФакт");

    let invoice_number = header
        .and_then(|h| h.attr("НомерДок"))
        .filter(|n| !n.is_empty())
        .unwrap_or(UNSPECIFIED_NUMBER)
        .to_string();

    let invoice_date = header
        .and_then(|h| h.attr("ДатаДок"))
        .and_then(parse_invoice_date)
        .unwrap_or_else(now);

    let seller = root
        .find("СвПрод")
        .and_then(parse_party)
        .unwrap_or_else(Organization::unspecified);

    // СвПокуп is the buyer proper; older generators only fill the consignee.
    let buyer = root
        .find("СвПокуп")
        .and_then(parse_party)
        .or_else(|| root.find("ГрузПолуч").and_then(parse_party))
        .unwrap_or_else(Organization::unspecified);

    let mut document = InvoiceDocument::new(invoice_number, invoice_date, seller, buyer);

    if let Some(code) = header
        .and_then(|h| h.child("ДенИзм"))
        .and_then(|c| c.non_empty_attr("КодОКВ"))
    {
        document.currency_code = code.to_string();
    }

    if let Some(table) = root.find("ТаблСчФакт") {
        document.items = table
            .children_named("СведТов")
            .enumerate()
            .map(|(index, row)| parse_line_item(index, row))
            .collect();
    }

    if let Some(totals) = root.find("ВсегоОпл") {
        document.total_excl_tax = parse_decimal(attr_or_child_text(totals, "СтТовБезНДСВсего"));
        document.total_incl_tax = parse_decimal(attr_or_child_text(totals, "СтТовУчНалВсего"));
        document.total_tax = totals
            .child("СумНалВсего")
            .and_then(|t| t.child("СумНал"))
            .or_else(|| totals.child("СумНал"))
            .map(|n| parse_decimal(n.text()))
            .unwrap_or(Decimal::ZERO);
    }

    document.source_invoice_reference = root
        .find("СвПродПер")
        .and_then(|transfer| transfer.find("ОснПер"))
        .and_then(|basis| {
            basis
                .non_empty_attr("РеквНомерДок")
                .or_else(|| basis.non_empty_attr("НомОсн"))
        })
        .and_then(first_digit_run)
        .map(str::to_string);

    Ok(document)
}

/// Legal-entity branch first, then the individual branch. `None` when neither
/// carries a tax id.
fn parse_party(party: &XmlNode) -> Option<Organization> {
    let identity = party.child("ИдСв")?;
    let address = parse_address(party);

    if let Some(legal) = identity.child("СвЮЛУч") {
        if let Some(tax_id) = legal.non_empty_attr("ИННЮЛ") {
            return Some(Organization {
                name: legal
                    .non_empty_attr("НаимОрг")
                    .unwrap_or(UNSPECIFIED_NAME)
                    .to_string(),
                tax_id: tax_id.trim().to_string(),
                reg_code: legal.non_empty_attr("КПП").map(|k| k.trim().to_string()),
                address,
            });
        }
    }

    if let Some(individual) = identity.child("СвИП") {
        if let Some(tax_id) = individual.non_empty_attr("ИННФЛ") {
            let fio = individual.child("ФИО");
            let full_name = ["Фамилия", "Имя", "Отчество"]
                .iter()
                .filter_map(|part| fio.and_then(|f| f.non_empty_attr(part)))
                .map(str::trim)
                .collect::<Vec<_>>()
                .join(" ");
            return Some(Organization {
                name: if full_name.is_empty() {
                    UNSPECIFIED_NAME.to_string()
                } else {
                    full_name
                },
                tax_id: tax_id.trim().to_string(),
                reg_code: None,
                address,
            });
        }
    }

    None
}

fn parse_address(party: &XmlNode) -> Option<Address> {
    let node = party.child("Адрес")?.child("АдрРФ")?;
    let field = |name: &str| node.non_empty_attr(name).map(str::to_string);
    let address = Address {
        postal_code: field("Индекс"),
        region_code: field("КодРегион"),
        region: field("НаимРегион"),
        city: field("Город"),
        street: field("Улица"),
        house: field("Дом"),
        apartment: field("Кварт"),
    };
    (!address.is_empty()).then_some(address)
}

fn parse_line_item(index: usize, row: &XmlNode) -> LineItem {
    let extra = row.child("ДопСведТов");
    let amount_incl_tax = parse_decimal(row.attr("СтТовУчНал").unwrap_or_default());
    let amount_excl_tax = row
        .non_empty_attr("СтТовБезНДС")
        .map(parse_decimal)
        .unwrap_or(amount_incl_tax);

    LineItem {
        line_number: row
            .attr("НомСтр")
            .and_then(|n| n.trim().parse::<u32>().ok())
            .filter(|n| *n >= 1)
            .unwrap_or(index as u32 + 1),
        name: row.attr("НаимТов").unwrap_or_default().to_string(),
        unit_code: row.non_empty_attr("ОКЕИ_Тов").map(str::to_string),
        unit_name: extra
            .and_then(|e| e.non_empty_attr("НаимЕдИзм"))
            .map(str::to_string),
        quantity: parse_decimal(row.attr("КолТов").unwrap_or_default()).max(Decimal::ZERO),
        unit_price: parse_decimal(row.attr("ЦенаТов").unwrap_or_default()).max(Decimal::ZERO),
        amount_excl_tax,
        tax_rate_label: row.attr("НалСт").unwrap_or_default().to_string(),
        tax_amount: row
            .child("СумНал")
            .and_then(|s| s.child("СумНал"))
            .map(|s| parse_decimal(s.text()))
            .unwrap_or(Decimal::ZERO),
        amount_incl_tax,
        catalog_code: extra
            .and_then(|e| e.non_empty_attr("КодТов"))
            .map(|c| c.trim().to_string()),
    }
}

fn attr_or_child_text<'a>(node: &'a XmlNode, name: &str) -> &'a str {
    node.attr(name)
        .or_else(|| node.child(name).map(|c| c.text()))
        .unwrap_or_default()
}
