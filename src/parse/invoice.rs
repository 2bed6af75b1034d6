use tracing::debug;

use super::dom::{Element, find_first, number_of, text_of};
use super::header::{
    emission_date, formatted_tax_id, log_direction, log_key_model, non_empty, party_tax_id,
    self_or_first,
};
use super::products::extract_products;
use super::references::{extract_protocol, invoice_reference};
use super::taxes::{
    Contribution, aggregate_contribution, aggregate_difal, aggregate_icms, aggregate_ipi,
    reconcile,
};
use crate::core::{
    DirectionSignals, DocumentKind, EngineConfig, INVOICE_RULES, NormalizedRecord,
    RecordBuilder, RecordExtension, invoice_declared_direction, normalize_access_key,
    resolve_direction, truncate_to_four_decimals,
};

/// Rows of one NF-e: one per product line, or a single header-only row when
/// the invoice lists no product.
///
/// `scope` is the `NFe` element, or any element containing `infNFe`.
pub fn parse_invoice(
    scope: Element<'_>,
    file_name: &str,
    config: &EngineConfig,
) -> Vec<NormalizedRecord> {
    let root = Some(scope);
    let inf_nfe = self_or_first(scope, "infNFe");
    let ide = find_first(root, "ide");
    let emit = find_first(root, "emit");
    let dest = find_first(root, "dest");
    let totals = find_first(root, "total").and_then(|t| find_first(Some(t), "ICMSTot"));
    let transporter = find_first(root, "transp").and_then(|t| find_first(Some(t), "transporta"));

    let protocol = extract_protocol(scope, "protNFe", "chNFe");
    let mut access_key = inf_nfe
        .and_then(|e| e.attribute("Id"))
        .map(normalize_access_key)
        .unwrap_or_default();
    if access_key.is_empty() {
        access_key = normalize_access_key(&protocol.access_key);
    }
    log_key_model(file_name, DocumentKind::Invoice, &access_key);

    let issuer_id = party_tax_id(emit);
    let recipient_id = party_tax_id(dest);
    let signals = DirectionSignals::new(
        &issuer_id,
        &recipient_id,
        invoice_declared_direction(&text_of(ide, "tpNF")),
        config,
    );
    let decision = resolve_direction(INVOICE_RULES, &signals);
    log_direction(file_name, DocumentKind::Invoice, &decision);

    let reference = invoice_reference(ide);
    let rates = &config.default_rates;
    let difal = aggregate_difal(root);
    let extension = RecordExtension {
        operation: Some(decision.operation),
        series: non_empty(text_of(ide, "serie")),
        nature_of_operation: non_empty(text_of(ide, "natOp")),
        issuer_tax_id: formatted_tax_id(&issuer_id),
        counterparty_tax_id: formatted_tax_id(&recipient_id),
        total_value: totals.map(|t| number_of(Some(t), "vNF")),
        icms_base: totals.map(|t| number_of(Some(t), "vBC")),
        pis: Some(reconcile(
            aggregate_contribution(root, Contribution::Pis),
            Some(rates.pis),
        )),
        cofins: Some(reconcile(
            aggregate_contribution(root, Contribution::Cofins),
            Some(rates.cofins),
        )),
        ipi: Some(reconcile(aggregate_ipi(root), Some(rates.ipi))),
        icms: Some(reconcile(aggregate_icms(root), None)),
        difal_value: (!difal.value.is_zero()).then_some(difal.value),
        difal_rate: (!difal.weighted_rate.is_zero())
            .then(|| truncate_to_four_decimals(difal.weighted_rate)),
        referenced_invoice: non_empty(reference.invoice_number.clone()),
        referenced_manifest: non_empty(reference.manifest_number.clone()),
        referenced_key: non_empty(reference.key.clone()),
        ..Default::default()
    };

    let header = RecordBuilder::new(DocumentKind::Invoice)
        .access_key(access_key)
        .date(emission_date(ide))
        .issuer_name(text_of(emit, "xNome"))
        .freight_document(reference.manifest_number)
        .carrier(text_of(transporter, "xNome"))
        .freight_value(number_of(totals, "vFrete"))
        .customer(text_of(dest, "xNome"))
        .state(text_of(find_first(dest, "enderDest"), "UF"))
        .invoice_number(text_of(ide, "nNF"))
        .situation(protocol.situation)
        .protocol(protocol.info)
        .status_changed_at(protocol.status_changed_at)
        .extension(extension);

    let products = extract_products(root);
    debug!(
        file = %file_name,
        products = products.len(),
        operation = decision.operation.label(),
        "Parsed NF-e"
    );
    if products.is_empty() {
        return vec![header.build()];
    }
    products
        .iter()
        .map(|line| header.build_for_product(line))
        .collect()
}
