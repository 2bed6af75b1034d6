//! Header fields shared by both document parsers.

use tracing::warn;

use super::dom::{Element, find_first, text_of};
use crate::core::{
    DirectionDecision, DocumentKind, format_date, format_tax_id, key_matches_kind, model_from_key,
};

/// `scope` itself when it is named `tag`, else its first `tag` descendant.
pub fn self_or_first<'a>(scope: Element<'a>, tag: &str) -> Option<Element<'a>> {
    if scope.tag_name().name().eq_ignore_ascii_case(tag) {
        Some(scope)
    } else {
        find_first(Some(scope), tag)
    }
}

/// CNPJ of a party, or its CPF for individuals.
pub fn party_tax_id(party: Option<Element<'_>>) -> String {
    let cnpj = text_of(party, "CNPJ");
    if cnpj.is_empty() {
        text_of(party, "CPF")
    } else {
        cnpj
    }
}

/// `dhEmi` (layout 3.10+) or `dEmi` (older layouts), as dd/mm/yyyy.
pub fn emission_date(ide: Option<Element<'_>>) -> String {
    let raw = text_of(ide, "dhEmi");
    if raw.is_empty() {
        format_date(&text_of(ide, "dEmi"))
    } else {
        format_date(&raw)
    }
}

pub fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

pub fn formatted_tax_id(raw: &str) -> Option<String> {
    (!raw.is_empty()).then(|| format_tax_id(raw))
}

/// Warn when the access key encodes another document model than the parser
/// handling it, e.g. a CT-e key inside an `infNFe`. The key is kept as is.
pub fn log_key_model(file_name: &str, kind: DocumentKind, access_key: &str) {
    if !key_matches_kind(access_key, kind) {
        warn!(
            file = %file_name,
            kind = kind.label(),
            model = model_from_key(access_key).unwrap_or_default(),
            "Access key model does not match the document"
        );
    }
}

pub fn log_direction(file_name: &str, kind: DocumentKind, decision: &DirectionDecision) {
    if decision.inferred {
        warn!(
            file = %file_name,
            kind = kind.label(),
            rule = decision.rule,
            operation = decision.operation.label(),
            "Operation direction inferred without an own-company match"
        );
    }
}
