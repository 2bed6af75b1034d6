use tracing::debug;

use super::dom::{Element, find_first, number_of, text_of};
use super::header::{
    emission_date, formatted_tax_id, log_direction, log_key_model, non_empty, party_tax_id,
    self_or_first,
};
use super::products::extract_material;
use super::references::{extract_protocol, manifest_reference};
use crate::core::{
    DirectionSignals, DocumentKind, EngineConfig, MANIFEST_RULES, NormalizedRecord,
    RecordBuilder, RecordExtension, manifest_declared_direction, normalize_access_key,
    resolve_direction,
};

/// The single row of a CT-e.
///
/// The issuer is the carrier. The customer is the recipient, or the shipper
/// when the manifest names no recipient.
pub fn parse_manifest(
    scope: Element<'_>,
    file_name: &str,
    config: &EngineConfig,
) -> Vec<NormalizedRecord> {
    let root = Some(scope);
    let inf_cte = self_or_first(scope, "infCte");
    let ide = find_first(root, "ide");
    let emit = find_first(root, "emit");
    let dest = find_first(root, "dest");
    let shipper = find_first(root, "rem");
    let service = find_first(root, "vPrest");

    let protocol = extract_protocol(scope, "protCTe", "chCTe");
    let mut access_key = inf_cte
        .and_then(|e| e.attribute("Id"))
        .map(normalize_access_key)
        .unwrap_or_default();
    if access_key.is_empty() {
        access_key = normalize_access_key(&protocol.access_key);
    }
    log_key_model(file_name, DocumentKind::Manifest, &access_key);

    let carrier_id = party_tax_id(emit);
    let shipper_id = party_tax_id(shipper);
    let signals = DirectionSignals::new(
        &carrier_id,
        &shipper_id,
        manifest_declared_direction(&text_of(ide, "tpCTe")),
        config,
    );
    let decision = resolve_direction(MANIFEST_RULES, &signals);
    log_direction(file_name, DocumentKind::Manifest, &decision);

    let carrier = text_of(emit, "xNome");
    let mut customer = text_of(dest, "xNome");
    if customer.is_empty() {
        customer = text_of(shipper, "xNome");
    }
    let address = find_first(dest, "enderDest").or_else(|| find_first(shipper, "enderReme"));
    let material = extract_material(root);
    let freight_value = number_of(service, "vTPrest");
    let reference = manifest_reference(root);

    let extension = RecordExtension {
        operation: Some(decision.operation),
        series: non_empty(text_of(ide, "serie")),
        nature_of_operation: non_empty(text_of(ide, "natOp")),
        issuer_tax_id: formatted_tax_id(&carrier_id),
        counterparty_tax_id: formatted_tax_id(&shipper_id),
        total_value: service.map(|_| freight_value),
        referenced_invoice: non_empty(reference.invoice_number),
        referenced_key: non_empty(reference.key),
        material: non_empty(material.clone()),
        cfop: non_empty(text_of(ide, "CFOP")),
        ..Default::default()
    };

    debug!(
        file = %file_name,
        operation = decision.operation.label(),
        "Parsed CT-e"
    );

    let record = RecordBuilder::new(DocumentKind::Manifest)
        .access_key(access_key)
        .date(emission_date(ide))
        .issuer_name(carrier.clone())
        .freight_document(text_of(ide, "nCT"))
        .carrier(carrier)
        .freight_value(freight_value)
        .customer(customer)
        .state(text_of(address, "UF"))
        .product(material)
        .situation(protocol.situation)
        .protocol(protocol.info)
        .status_changed_at(protocol.status_changed_at)
        .extension(extension)
        .build();
    vec![record]
}
