//! Entry points: clean, parse, classify the root, route to a parser.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, error, info, warn};

use super::clean::clean_xml_content;
use super::dom::{Element, find_all, find_first, parse_xml, text_of};
use super::header::non_empty;
use super::invoice::parse_invoice;
use super::manifest::parse_manifest;
use crate::core::{
    BatchOutcome, DocumentKind, EngineConfig, FileFailure, FiscalError, NormalizedRecord,
    ProtocolInfo, RecordBuilder, RecordExtension, Situation, format_date, normalize_access_key,
};

/// Event envelopes: correction letters, recipient manifestations, cancellation events.
const EVENT_ROOTS: [&str; 4] = ["procEventoNFe", "procEventoCTe", "eventoNFe", "eventoCTe"];

static INVOICE_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<infNFe\b[^>]*>.*?</infNFe>").expect("valid invoice fragment regex")
});
static MANIFEST_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<infCte\b[^>]*>.*?</infCte>").expect("valid manifest fragment regex")
});

/// What the document root turned out to be.
#[derive(Debug)]
enum Route<'a> {
    Event(&'static str),
    Cancellation(Element<'a>, DocumentKind),
    Invoice(Element<'a>),
    Manifest(Element<'a>),
    Unrecognized,
}

/// Whether `element` sits inside a CT-e. A CT-e lists the invoices it
/// carries as `infDoc/infNFe`, which must not be mistaken for an NF-e.
fn inside_manifest(element: Element<'_>) -> bool {
    element.ancestors().skip(1).any(|a| {
        let name = a.tag_name().name();
        name.eq_ignore_ascii_case("CTe")
            || name.eq_ignore_ascii_case("infCte")
            || name.eq_ignore_ascii_case("infDoc")
    })
}

/// First `tag` element that is not part of a manifest.
fn first_outside_manifest<'a>(document: Element<'a>, tag: &str) -> Option<Element<'a>> {
    find_all(Some(document), tag)
        .into_iter()
        .find(|e| !inside_manifest(*e))
}

fn route(document: Element<'_>) -> Route<'_> {
    let scope = Some(document);
    if let Some(tag) = EVENT_ROOTS
        .into_iter()
        .find(|tag| find_first(scope, tag).is_some())
    {
        return Route::Event(tag);
    }

    if let Some(root) = find_first(scope, "retCancNFe") {
        return Route::Cancellation(root, DocumentKind::Invoice);
    }
    if let Some(root) = find_first(scope, "retCancCTe") {
        return Route::Cancellation(root, DocumentKind::Manifest);
    }

    if let Some(nfe) = first_outside_manifest(document, "NFe") {
        return Route::Invoice(nfe);
    }
    if let Some(inf) = first_outside_manifest(document, "infNFe") {
        return Route::Invoice(inf.parent_element().unwrap_or(inf));
    }

    if let Some(cte) = find_first(scope, "CTe") {
        return Route::Manifest(cte);
    }
    if let Some(inf) = find_first(scope, "infCte") {
        return Route::Manifest(inf.parent_element().unwrap_or(inf));
    }

    Route::Unrecognized
}

/// Minimal record for a cancellation result file (`retCancNFe` / `retCancCTe`).
fn cancellation_record(root: Element<'_>, kind: DocumentKind) -> NormalizedRecord {
    let inf = find_first(Some(root), "infCanc").unwrap_or(root);
    let scope = Some(inf);
    let mut key = text_of(scope, "chNFe");
    if key.is_empty() {
        key = text_of(scope, "chCTe");
    }

    let status_code = non_empty(text_of(scope, "cStat"));
    let reason = non_empty(text_of(scope, "xMotivo"));
    let protocol_number = non_empty(text_of(scope, "nProt"));
    let protocol = (status_code.is_some() || reason.is_some() || protocol_number.is_some()).then(
        || ProtocolInfo {
            status_code,
            reason,
            protocol_number,
        },
    );
    let received_at = non_empty(text_of(scope, "dhRecbto")).map(|d| format_date(&d));

    RecordBuilder::new(kind)
        .access_key(normalize_access_key(&key))
        .situation(Situation::Cancelled)
        .protocol(protocol)
        .status_changed_at(received_at)
        .extension(RecordExtension {
            cancellation_file: true,
            ..Default::default()
        })
        .build()
}

/// Retry on a bare `infNFe` / `infCte` fragment cut out of the text.
///
/// Catches documents whose payload is embedded as text, e.g. inside CDATA.
fn salvage(
    cleaned: &str,
    file_name: &str,
    config: &EngineConfig,
) -> Result<Vec<NormalizedRecord>, FiscalError> {
    let candidates = [
        (&*INVOICE_FRAGMENT, DocumentKind::Invoice),
        (&*MANIFEST_FRAGMENT, DocumentKind::Manifest),
    ];
    let Some((fragment, kind)) = candidates
        .iter()
        .find_map(|(pattern, kind)| pattern.find(cleaned).map(|m| (m.as_str(), *kind)))
    else {
        return Err(FiscalError::UnrecognizedFormat(file_name.to_string()));
    };

    warn!(file = %file_name, kind = kind.label(), "Recovering document from a raw fragment");
    let wrapped = format!("<root>{fragment}</root>");
    let doc = parse_xml(&wrapped).map_err(|e| {
        FiscalError::UnrecognizedFormat(format!("{file_name}: fragment unreadable ({e})"))
    })?;
    let root = doc.root_element();
    Ok(match kind {
        DocumentKind::Invoice => parse_invoice(root, file_name, config),
        DocumentKind::Manifest => parse_manifest(root, file_name, config),
    })
}

/// Extract the rows of one fiscal document, with the reason on failure.
///
/// Invoices yield one row per product line (at least one), manifests and
/// cancellation files exactly one.
pub fn try_parse_fiscal_xml(
    xml: &str,
    file_name: &str,
    config: &EngineConfig,
) -> Result<Vec<NormalizedRecord>, FiscalError> {
    let cleaned = clean_xml_content(xml);
    let doc = parse_xml(&cleaned)?;

    match route(doc.root()) {
        Route::Event(tag) => Err(FiscalError::EventDocument(format!("{file_name} ({tag})"))),
        Route::Cancellation(root, kind) => {
            debug!(file = %file_name, kind = kind.label(), "Cancellation result file");
            Ok(vec![cancellation_record(root, kind)])
        }
        Route::Invoice(scope) => Ok(parse_invoice(scope, file_name, config)),
        Route::Manifest(scope) => Ok(parse_manifest(scope, file_name, config)),
        Route::Unrecognized => salvage(&cleaned, file_name, config),
    }
}

/// Extract the rows of one fiscal document.
///
/// Never fails loudly: malformed, unrecognized and event documents are logged
/// with `file_name` and yield `None`.
///
/// ```
/// use notafiscal::core::EngineConfig;
/// use notafiscal::parse::parse_fiscal_xml;
///
/// let xml = r#"<procEventoNFe><evento/></procEventoNFe>"#;
/// assert!(parse_fiscal_xml(xml, "evento.xml", &EngineConfig::default()).is_none());
/// ```
pub fn parse_fiscal_xml(
    xml: &str,
    file_name: &str,
    config: &EngineConfig,
) -> Option<Vec<NormalizedRecord>> {
    match try_parse_fiscal_xml(xml, file_name, config) {
        Ok(records) if !records.is_empty() => Some(records),
        Ok(_) => None,
        Err(FiscalError::EventDocument(_)) => {
            info!(file = %file_name, "Skipping event document");
            None
        }
        Err(e) => {
            error!(file = %file_name, error = %e, "Could not extract fiscal document");
            None
        }
    }
}

/// Parse several files one after another, collecting failures instead of
/// stopping at the first one.
pub fn parse_batch<I, N, C>(files: I, config: &EngineConfig) -> BatchOutcome
where
    I: IntoIterator<Item = (N, C)>,
    N: AsRef<str>,
    C: AsRef<str>,
{
    let mut outcome = BatchOutcome::default();
    for (name, content) in files {
        let name = name.as_ref();
        match try_parse_fiscal_xml(content.as_ref(), name, config) {
            Ok(records) => {
                outcome.processed += 1;
                outcome.records.extend(records);
            }
            Err(e) => {
                warn!(file = %name, error = %e, "File skipped");
                outcome.failures.push(FileFailure::new(name, e.to_string()));
            }
        }
    }
    info!(
        processed = outcome.processed,
        failed = outcome.failures.len(),
        records = outcome.records.len(),
        "Batch finished"
    );
    outcome
}
