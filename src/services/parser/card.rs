use super::numbers::parse_card_timestamp;
use super::xml_tree::parse_tree;
use crate::types::context::RequestContext;
use crate::types::document::CardSummary;
use crate::types::errors::{UpdError, UpdResult};
use chrono::Local;

const CARD_ROOT: &str = "Card";

/// Parse `card.xml`: external id, title, issue timestamp and sender identity.
///
/// An absent or unparsable `Date` falls back to the current time; a document
/// that is not well-formed or has the wrong root is `MalformedCard`.
pub fn parse_card(ctx: &RequestContext, text: &str) -> UpdResult<CardSummary> {
    let root = parse_tree(text).map_err(|e| UpdError::MalformedCard(e.to_string()))?;
    if root.name != CARD_ROOT {
        return Err(UpdError::MalformedCard(format!(
            "ожидался корневой элемент <{CARD_ROOT}>, найден <{}>",
            root.name
        )));
    }

    let identifiers = root.child("Identifiers");
    let description = root.child("Description");
    let abonent = root.child("Sender").and_then(|s| s.child("Abonent"));

    let raw_date = description.and_then(|d| d.non_empty_attr("Date"));
    let issued_at = match raw_date.and_then(parse_card_timestamp) {
        Some(ts) => ts,
        None => {
            if let Some(raw) = raw_date {
                log::warn!("[{}] Unparsable card date '{}', using now", ctx.id(), raw);
            }
            Local::now().fixed_offset()
        }
    };

    let attr = |node: Option<&super::xml_tree::XmlNode>, name: &str| {
        node.and_then(|n| n.attr(name)).unwrap_or_default().to_string()
    };

    let card = CardSummary {
        external_id: attr(identifiers, "ExternalIdentifier"),
        title: attr(description, "Title"),
        issued_at,
        sender_tax_id: attr(abonent, "Inn"),
        sender_reg_code: attr(abonent, "Kpp"),
        sender_name: abonent
            .and_then(|a| a.non_empty_attr("Name"))
            .map(str::to_string),
    };

    log::debug!(
        "[{}] Card parsed: id={}, title='{}'",
        ctx.id(),
        card.external_id,
        card.title
    );
    Ok(card)
}
