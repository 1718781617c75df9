//! Fixture builders shared by the unit tests.

use crate::services::moysklad::models::{
    Counterparty, CreatedDocument, DemandPayload, Employee, FactureOutPayload, InvoiceOut,
    InvoicePosition, NewCounterparty, Organization as ApiOrganization, Product, Service, Store,
};
use crate::services::moysklad::{AccessCheck, AccountingApi, ProductQuery};
use crate::types::errors::ApiError;
use encoding_rs::WINDOWS_1251;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn encode_cp1251(text: &str) -> Vec<u8> {
    let (bytes, _, _) = WINDOWS_1251.encode(text);
    bytes.into_owned()
}

/// Write a stored (uncompressed) ZIP with the given entries.
pub fn write_zip(dir: &Path, file_name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(file_name);
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
    path
}

pub fn meta_xml(flow_id: &str, main_path: &str, card_path: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<DocumentPackage>
  <DocFlow Id="{flow_id}">
    <Documents>
      <Document>
        <MainImage Path="{main_path}"/>
        <ExternalCard Path="{card_path}"/>
      </Document>
    </Documents>
  </DocFlow>
</DocumentPackage>"#
    )
}

pub fn card_xml(external_id: &str, date: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="windows-1251"?>
<Card>
  <Identifiers ExternalIdentifier="{external_id}"/>
  <Description Title="УПД № 17" Date="{date}"/>
  <Sender>
    <Abonent Inn="7700000000" Kpp="770001001" Name="ООО Ромашка"/>
  </Sender>
</Card>"#
    )
}

/// Main document with a legal seller, an individual buyer and one line item.
pub fn upd_xml(invoice_number: &str, basis: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="windows-1251"?>
<Файл ИдФайл="ON_NSCHFDOPPR_1" ВерсФорм="5.01">
  <Документ КНД="1115131" Функция="СЧФДОП">
    <СвСчФакт НомерДок="{invoice_number}" ДатаДок="15.03.2024">
      <СвПрод>
        <ИдСв>
          <СвЮЛУч НаимОрг="ООО Ромашка" ИННЮЛ="7700000000" КПП="770001001"/>
        </ИдСв>
        <Адрес>
          <АдрРФ Индекс="101000" КодРегион="77" Город="Москва" Улица="Тверская" Дом="1"/>
        </Адрес>
      </СвПрод>
      <СвПокуп>
        <ИдСв>
          <СвИП ИННФЛ="500000000000">
            <ФИО Фамилия="Иванов" Имя="Иван" Отчество="Иванович"/>
          </СвИП>
        </ИдСв>
      </СвПокуп>
      <ДенИзм КодОКВ="643"/>
    </СвСчФакт>
    <ТаблСчФакт>
      <СведТов НомСтр="1" НаимТов="Гвозди" ОКЕИ_Тов="796" КолТов="2" ЦенаТов="99.00" СтТовБезНДС="165.00" НалСт="20%" СтТовУчНал="198.00">
        <СумНал>
          <СумНал>33.00</СумНал>
        </СумНал>
        <ДопСведТов КодТов="SKU-1" НаимЕдИзм="шт"/>
      </СведТов>
      <ВсегоОпл СтТовБезНДСВсего="165.00" СтТовУчНалВсего="198.00">
        <СумНалВсего>
          <СумНал>33.00</СумНал>
        </СумНалВсего>
      </ВсегоОпл>
    </ТаблСчФакт>
    <СвПродПер>
      <СвПер>
        <ОснПер НаимОсн="Счет" РеквНомерДок="{basis}"/>
      </СвПер>
    </СвПродПер>
  </Документ>
</Файл>"#
    )
}

/// A full bundle archive: UTF-8 `meta.xml`, 1251-encoded card and main document.
pub fn write_bundle(dir: &Path, file_name: &str, main_document: &str) -> PathBuf {
    let meta = meta_xml("flow-1", "docs/upd.xml", "docs/card.xml");
    let card = encode_cp1251(&card_xml("ext-1", "2024-03-15T10:00:00Z"));
    let main = encode_cp1251(main_document);
    write_zip(
        dir,
        file_name,
        &[
            ("meta.xml", meta.as_bytes()),
            ("docs/card.xml", &card),
            ("docs/upd.xml", &main),
        ],
    )
}

/// API double for tests that must fail before or at the first remote call.
pub struct OfflineApi;

fn offline<T>(endpoint: &str) -> Result<T, ApiError> {
    Err(ApiError::Transport {
        endpoint: endpoint.to_string(),
        message: "offline".to_string(),
    })
}

impl AccountingApi for OfflineApi {
    fn current_employee(&self) -> Result<Employee, ApiError> {
        offline("/context/employee")
    }
    fn list_organizations(&self) -> Result<Vec<ApiOrganization>, ApiError> {
        offline("/entity/organization")
    }
    fn find_organization_by_tax_id(&self, _: &str) -> Result<Option<ApiOrganization>, ApiError> {
        offline("/entity/organization")
    }
    fn find_counterparty_by_tax_id(&self, _: &str) -> Result<Option<Counterparty>, ApiError> {
        offline("/entity/counterparty")
    }
    fn create_counterparty(&self, _: &NewCounterparty) -> Result<Counterparty, ApiError> {
        offline("/entity/counterparty")
    }
    fn search_invoices_out(&self, _: &str) -> Result<Vec<InvoiceOut>, ApiError> {
        offline("/entity/invoiceout")
    }
    fn get_invoice_out(&self, href: &str) -> Result<InvoiceOut, ApiError> {
        offline(href)
    }
    fn get_invoice_positions(&self, href: &str) -> Result<Vec<InvoicePosition>, ApiError> {
        offline(href)
    }
    fn get_store(&self, href: &str) -> Result<Store, ApiError> {
        offline(href)
    }
    fn list_stores(&self) -> Result<Vec<Store>, ApiError> {
        offline("/entity/store")
    }
    fn find_product(&self, _: ProductQuery<'_>) -> Result<Option<Product>, ApiError> {
        offline("/entity/product")
    }
    fn first_service(&self) -> Result<Option<Service>, ApiError> {
        offline("/entity/service")
    }
    fn create_demand(&self, _: &DemandPayload) -> Result<CreatedDocument, ApiError> {
        offline("/entity/demand")
    }
    fn create_facture_out(&self, _: &FactureOutPayload) -> Result<CreatedDocument, ApiError> {
        offline("/entity/factureout")
    }
    fn can_read(&self, _: AccessCheck) -> bool {
        false
    }
}
