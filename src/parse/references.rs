//! Referenced documents and the SEFAZ authorization protocol.

use super::dom::{Element, find_all, find_first, text_of};
use super::header::non_empty;
use crate::core::{ProtocolInfo, Situation, document_number_from_key, format_date};

/// A document referenced by the one being parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentReference {
    /// Full access key as declared.
    pub key: String,
    /// Number decoded from a referenced NF-e key.
    pub invoice_number: String,
    /// Number decoded from a referenced CT-e key.
    pub manifest_number: String,
}

impl DocumentReference {
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

/// First resolvable `NFref` under an invoice's `ide`.
///
/// A `refNFe` entry wins over a `refCTe` in the same `NFref`; later entries
/// are ignored once one resolves.
pub fn invoice_reference(ide: Option<Element<'_>>) -> DocumentReference {
    for nf_ref in find_all(ide, "NFref") {
        let invoice_key = text_of(Some(nf_ref), "refNFe");
        if !invoice_key.is_empty() {
            return DocumentReference {
                invoice_number: document_number_from_key(&invoice_key),
                key: invoice_key,
                ..Default::default()
            };
        }
        let manifest_key = text_of(Some(nf_ref), "refCTe");
        if !manifest_key.is_empty() {
            return DocumentReference {
                manifest_number: document_number_from_key(&manifest_key),
                key: manifest_key,
                ..Default::default()
            };
        }
    }
    DocumentReference::default()
}

/// Invoice carried by a manifest (`infDoc/infNFe/chave`).
pub fn manifest_reference(scope: Option<Element<'_>>) -> DocumentReference {
    let carried = find_first(scope, "infDoc").and_then(|d| find_first(Some(d), "infNFe"));
    let key = text_of(carried, "chave");
    if key.is_empty() {
        return DocumentReference::default();
    }
    DocumentReference {
        invoice_number: document_number_from_key(&key),
        key,
        ..Default::default()
    }
}

/// Status information read from `protNFe` / `protCTe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolOutcome {
    pub situation: Situation,
    /// `None` when the protocol carries no status, reason or number.
    pub info: Option<ProtocolInfo>,
    /// Receipt date, only for documents that are not active.
    pub status_changed_at: Option<String>,
    /// `chNFe` / `chCTe`, empty when absent.
    pub access_key: String,
}

/// Read the authorization protocol named `protocol_tag`.
///
/// The protocol sits next to the document inside the `*Proc` wrapper, so the
/// search widens to the whole tree when `scope` has none. `key_tag` names the
/// access-key element inside the protocol.
pub fn extract_protocol(scope: Element<'_>, protocol_tag: &str, key_tag: &str) -> ProtocolOutcome {
    let protocol = find_first(Some(scope), protocol_tag)
        .or_else(|| find_first(Some(scope.document().root()), protocol_tag));
    let inf_prot = protocol.map(|p| find_first(Some(p), "infProt").unwrap_or(p));

    let status_code = text_of(inf_prot, "cStat");
    let reason = text_of(inf_prot, "xMotivo");
    let protocol_number = text_of(inf_prot, "nProt");
    let received_at = text_of(inf_prot, "dhRecbto");
    let access_key = text_of(inf_prot, key_tag);

    let situation = Situation::from_status_code(&status_code);
    let info = if status_code.is_empty() && reason.is_empty() && protocol_number.is_empty() {
        None
    } else {
        Some(ProtocolInfo {
            status_code: non_empty(status_code),
            reason: non_empty(reason),
            protocol_number: non_empty(protocol_number),
        })
    };
    let status_changed_at = (situation != Situation::Active && !received_at.is_empty())
        .then(|| format_date(&received_at));

    ProtocolOutcome {
        situation,
        info,
        status_changed_at,
        access_key,
    }
}
