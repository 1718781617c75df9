use super::*;
use chrono::NaiveDate;

fn midnight() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[test]
fn test_stub_document_uses_sentinels() {
    let stub = InvoiceDocument::stub(midnight());
    assert_eq!(stub.invoice_number, UNSPECIFIED_NUMBER);
    assert_eq!(stub.seller, Organization::unspecified());
    assert_eq!(stub.buyer.tax_id, UNSPECIFIED_TAX_ID);
    assert_eq!(stub.buyer.name, UNSPECIFIED_NAME);
    assert!(stub.items.is_empty());
    assert_eq!(stub.currency_code, DEFAULT_CURRENCY_CODE);
    assert!(stub.total_incl_tax.is_zero());
    assert!(stub.source_invoice_reference.is_none());
}

#[test]
fn test_individual_is_twelve_characters() {
    let mut org = Organization::unspecified();
    assert!(!org.is_individual());
    org.tax_id = "500000000000".into();
    assert!(org.is_individual());
    org.tax_id = "7700000000".into();
    assert!(!org.is_individual());
}

#[test]
fn test_empty_address() {
    assert!(Address::default().is_empty());
    let address = Address {
        city: Some("Москва".into()),
        ..Default::default()
    };
    assert!(!address.is_empty());
}
