//! Edge cases of the extraction pipeline: dirty input, odd layouts,
//! classifier corners.

#![cfg(feature = "parse")]

use std::io;
use std::sync::{Arc, Mutex};

use notafiscal::core::*;
use notafiscal::parse::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const KEY: &str = "35230512345678000164550010000001234567890123";

fn config() -> EngineConfig {
    EngineConfig::default().with_own_company("05255986000164")
}

/// Minimal NF-e with one product; `name` is inserted verbatim.
fn invoice_with_product(name: &str) -> String {
    format!(
        r#"<NFe><infNFe Id="NFe{KEY}"><ide><nNF>123</nNF></ide>
<emit><CNPJ>05255986000164</CNPJ><xNome>Metais SA</xNome></emit>
<dest><CNPJ>11222333000181</CNPJ><xNome>Cliente</xNome></dest>
<det nItem="1"><prod><xProd>{name}</xProd><qCom>5</qCom><vUnCom>2</vUnCom></prod></det>
</infNFe></NFe>"#
    )
}

/// Log sink shared with a `fmt` subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` under a subscriber recording warnings and errors; returns its
/// result with the formatted log output.
fn with_captured_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let output = String::from_utf8_lossy(&logs.0.lock().unwrap()).into_owned();
    (result, output)
}

fn comparable(mut records: Vec<NormalizedRecord>) -> Vec<NormalizedRecord> {
    for r in &mut records {
        r.id = uuid::Uuid::nil();
    }
    records
}

// ---------------------------------------------------------------------------
// Dirty input
// ---------------------------------------------------------------------------

#[test]
fn stray_ampersand_parses_like_escaped_one() {
    let raw = parse_fiscal_xml(&invoice_with_product("PARAFUSO & PORCA"), "a.xml", &config());
    let escaped = parse_fiscal_xml(
        &invoice_with_product("PARAFUSO &amp; PORCA"),
        "b.xml",
        &config(),
    );
    let raw = comparable(raw.unwrap());
    assert_eq!(raw, comparable(escaped.unwrap()));
    assert_eq!(raw[0].product, "PARAFUSO & PORCA");
}

#[test]
fn deeply_nested_document_is_rejected() {
    let depth = 20_000;
    let xml = format!(
        r#"<NFe><infNFe Id="NFe{KEY}"><ide><nNF>{}1{}</nNF></ide></infNFe></NFe>"#,
        "<a>".repeat(depth),
        "</a>".repeat(depth)
    );
    assert!(parse_fiscal_xml(&xml, "profundo.xml", &config()).is_none());
    assert!(matches!(
        try_parse_fiscal_xml(&xml, "profundo.xml", &config()),
        Err(FiscalError::Xml(_))
    ));
}

#[test]
fn prefixed_elements_read_like_plain_ones() {
    let plain = invoice_with_product("CHAPA");
    let prefixed = plain
        .replace("<NFe>", r#"<nfe:NFe xmlns:nfe="http://www.portalfiscal.inf.br/nfe">"#)
        .replace("</NFe>", "</nfe:NFe>")
        .replace("<xProd>", "<nfe:xProd>")
        .replace("</xProd>", "</nfe:xProd>");
    let plain = comparable(parse_fiscal_xml(&plain, "a.xml", &config()).unwrap());
    let prefixed = comparable(parse_fiscal_xml(&prefixed, "a.xml", &config()).unwrap());
    assert_eq!(plain, prefixed);
    assert_eq!(prefixed[0].product, "CHAPA");
}

#[test]
fn numeric_character_references_survive() {
    let rows = parse_fiscal_xml(&invoice_with_product("A&#199;O"), "c.xml", &config()).unwrap();
    assert_eq!(rows[0].product, "AÇO");
}

#[test]
fn byte_order_mark_and_control_characters() {
    let xml = format!(
        "\u{FEFF}\n  {}",
        invoice_with_product("CHAPA\u{0002} GROSSA")
    );
    let rows = parse_fiscal_xml(&xml, "bom.xml", &config()).unwrap();
    assert_eq!(rows[0].product, "CHAPA GROSSA");
}

#[test]
fn comments_are_ignored() {
    let xml = invoice_with_product("TUBO <!-- bitola 2 pol --> REDONDO");
    let rows = parse_fiscal_xml(&xml, "comentario.xml", &config()).unwrap();
    assert_eq!(rows[0].product, "TUBO  REDONDO");
}

#[test]
fn non_numeric_values_become_zero() {
    let xml = invoice_with_product("BARRA").replace("<qCom>5</qCom>", "<qCom>cinco</qCom>");
    let rows = parse_fiscal_xml(&xml, "texto.xml", &config()).unwrap();
    assert_eq!(rows[0].quantity, Decimal::ZERO);
    assert_eq!(rows[0].sale_unit_price, dec!(2));
}

#[test]
fn empty_and_blank_input_fail() {
    assert!(parse_fiscal_xml("", "vazio.xml", &config()).is_none());
    assert!(parse_fiscal_xml("   \n ", "branco.xml", &config()).is_none());
    assert!(parse_fiscal_xml("not xml at all", "lixo.xml", &config()).is_none());
}

#[test]
fn undefined_entity_is_a_syntax_error() {
    let xml = invoice_with_product("A&nbsp;B");
    assert!(matches!(
        try_parse_fiscal_xml(&xml, "nbsp.xml", &config()),
        Err(FiscalError::Xml(_))
    ));
}

#[test]
fn cleaning_keeps_valid_entities() {
    assert_eq!(
        clean_xml_content("<a>&lt;x&gt; &quot;y&quot; & z</a>"),
        "<a>&lt;x&gt; &quot;y&quot; &amp; z</a>"
    );
}

// ---------------------------------------------------------------------------
// Layout quirks
// ---------------------------------------------------------------------------

#[test]
fn bare_inf_nfe_root() {
    let xml = invoice_with_product("CANTONEIRA")
        .replace("<NFe>", "")
        .replace("</NFe>", "");
    let rows = parse_fiscal_xml(&xml, "inf.xml", &config()).unwrap();
    assert_eq!(rows[0].access_key, KEY);
    assert_eq!(rows[0].product, "CANTONEIRA");
}

#[test]
fn lines_without_description_are_dropped() {
    let xml = invoice_with_product("");
    let rows = parse_fiscal_xml(&xml, "sem_desc.xml", &config()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].product, "");
    assert_eq!(rows[0].quantity, Decimal::ZERO);
}

#[test]
fn malformed_access_key_is_blank() {
    let xml = invoice_with_product("PERFIL").replace(&format!("NFe{KEY}"), "NFe12345");
    let rows = parse_fiscal_xml(&xml, "chave.xml", &config()).unwrap();
    assert_eq!(rows[0].access_key, "");
}

#[test]
fn salvaged_manifest_fragment() {
    let xml = r#"<envelope><payload><![CDATA[<infCte Id="CTe35230799888777000166570010000007891876543210"><ide><nCT>789</nCT></ide><emit><xNome>Transportes</xNome></emit></infCte>]]></payload></envelope>"#;
    let rows = parse_fiscal_xml(xml, "envelope.xml", &config()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, DocumentKind::Manifest);
    assert_eq!(rows[0].freight_document, "789");
}

#[test]
fn unreadable_fragment_is_unrecognized() {
    let xml = r#"<envelope><![CDATA[<infNFe><ide></infNFe>]]></envelope>"#;
    assert!(matches!(
        try_parse_fiscal_xml(xml, "ruim.xml", &config()),
        Err(FiscalError::UnrecognizedFormat(_))
    ));
}

#[test]
fn cancelled_manifest_result_file() {
    let xml = "<retCancCTe><infCanc><cStat>101</cStat><chCTe>35230799888777000166570010000007891876543210</chCTe></infCanc></retCancCTe>";
    let rows = parse_fiscal_xml(xml, "canc_cte.xml", &config()).unwrap();
    assert_eq!(rows[0].kind, DocumentKind::Manifest);
    assert_eq!(rows[0].situation, Situation::Cancelled);
    assert_eq!(rows[0].status_changed_at, None);
}

// ---------------------------------------------------------------------------
// Classifier corners
// ---------------------------------------------------------------------------

#[test]
fn self_to_self_invoice_without_flag_is_outbound() {
    let xml = invoice_with_product("BOBINA").replace("11222333000181", "05255986000164");
    let rows = parse_fiscal_xml(&xml, "transferencia.xml", &config()).unwrap();
    assert_eq!(rows[0].extension.operation, Some(Operation::Outbound));

    let signals = DirectionSignals::new("05255986000164", "05255986000164", None, &config());
    let decision = resolve_direction(INVOICE_RULES, &signals);
    assert!(decision.inferred);
}

#[test]
fn inferred_direction_is_logged_with_the_file_name() {
    let xml = invoice_with_product("BOBINA").replace("11222333000181", "05255986000164");
    let (rows, logs) =
        with_captured_warnings(|| parse_fiscal_xml(&xml, "transferencia.xml", &config()));
    assert_eq!(rows.unwrap()[0].extension.operation, Some(Operation::Outbound));
    assert!(logs.contains("WARN"), "{logs}");
    assert!(logs.contains("Operation direction inferred"), "{logs}");
    assert!(logs.contains("transferencia.xml"), "{logs}");
    assert!(logs.contains("self-transfer"), "{logs}");
}

#[test]
fn matched_direction_logs_nothing() {
    let (rows, logs) = with_captured_warnings(|| {
        parse_fiscal_xml(&invoice_with_product("BOBINA"), "venda.xml", &config())
    });
    assert_eq!(rows.unwrap()[0].extension.operation, Some(Operation::Outbound));
    assert!(logs.is_empty(), "{logs}");
}

#[test]
fn manifest_key_inside_invoice_is_kept_and_logged() {
    let cte_key = "35230799888777000166570010000007891876543210";
    let xml = invoice_with_product("BOBINA").replace(KEY, cte_key);
    let (rows, logs) = with_captured_warnings(|| parse_fiscal_xml(&xml, "troca.xml", &config()));
    let rows = rows.unwrap();
    assert_eq!(rows[0].kind, DocumentKind::Invoice);
    assert_eq!(rows[0].access_key, cte_key);
    assert!(logs.contains("Access key model does not match"), "{logs}");
    assert!(logs.contains("troca.xml"), "{logs}");
}

#[test]
fn no_configured_company_falls_back_to_inference() {
    let rows = parse_fiscal_xml(
        &invoice_with_product("BOBINA"),
        "sem_empresa.xml",
        &EngineConfig::default(),
    )
    .unwrap();
    assert_eq!(rows[0].extension.operation, Some(Operation::Outbound));
}

#[test]
fn situation_mapping() {
    assert_eq!(Situation::from_status_code(""), Situation::Unknown);
    assert_eq!(Situation::from_status_code("100"), Situation::Active);
    assert_eq!(Situation::from_status_code("101"), Situation::Cancelled);
    assert_eq!(Situation::from_status_code("301"), Situation::Denied);
    assert_eq!(Situation::from_status_code("302"), Situation::Denied);
    assert_eq!(Situation::from_status_code("204"), Situation::Rejected);
    assert_eq!(Situation::from_status_code("539"), Situation::Rejected);
}

#[test]
fn tolerance_and_truncation() {
    assert!(amounts_close(dec!(100), dec!(100.05)));
    assert!(!amounts_close(dec!(1000), dec!(950)));
    assert!(amounts_close(dec!(0.05), dec!(0)));
    assert_eq!(truncate_to_four_decimals(dec!(1.23456789)), dec!(1.2345));
}

#[test]
fn access_key_number_decoding() {
    assert_eq!(
        document_number_from_key(KEY),
        KEY[25..34].trim_start_matches('0')
    );
    assert_eq!(document_number_from_key("123"), "");
}
