//! NF-e / CT-e access key (chave de acesso) handling.
//!
//! Layout of the 44 digits:
//!
//! | Positions | Content |
//! |-----------|---------|
//! | 0..2 | cUF (issuer state code) |
//! | 2..6 | AAMM (year/month of issue) |
//! | 6..20 | issuer CNPJ |
//! | 20..22 | model (55 = NF-e, 57 = CT-e) |
//! | 22..25 | series |
//! | 25..34 | document number |
//! | 34..35 | emission type |
//! | 35..43 | numeric code |
//! | 43..44 | check digit |

use super::types::DocumentKind;

/// Length of every access key.
pub const ACCESS_KEY_LENGTH: usize = 44;

const DOC_NUMBER_START: usize = 25;
const DOC_NUMBER_END: usize = 34;

/// Normalize a raw key: strip a leading `NFe` / `CTe` marker and whitespace.
/// Returns an empty string unless the result is exactly 44 characters.
pub fn normalize_access_key(raw: &str) -> String {
    let raw = raw.trim();
    let stripped = raw
        .strip_prefix("NFe")
        .or_else(|| raw.strip_prefix("CTe"))
        .unwrap_or(raw)
        .trim();
    if stripped.chars().count() == ACCESS_KEY_LENGTH {
        stripped.to_string()
    } else {
        String::new()
    }
}

/// Document number (positions 25..34) without leading zeros.
///
/// Keys that are not exactly 44 characters decode to an empty string.
///
/// ```
/// use notafiscal::core::document_number_from_key;
///
/// let key = "35230512345678000164550010000001234567890123";
/// assert_eq!(document_number_from_key(key), "123");
/// ```
pub fn document_number_from_key(key: &str) -> String {
    if key.len() != ACCESS_KEY_LENGTH || !key.is_ascii() {
        return String::new();
    }
    key[DOC_NUMBER_START..DOC_NUMBER_END]
        .trim_start_matches('0')
        .to_string()
}

/// Document model code (positions 20..22), e.g. "55" or "57".
pub fn model_from_key(key: &str) -> Option<&str> {
    if key.len() != ACCESS_KEY_LENGTH || !key.is_ascii() {
        return None;
    }
    Some(&key[20..22])
}

/// Whether the model encoded in `key` belongs to `kind`. Keys that do not
/// decode carry no model and are not contradicted.
///
/// ```
/// use notafiscal::core::{DocumentKind, key_matches_kind};
///
/// let key = "35230512345678000164550010000001234567890123";
/// assert!(key_matches_kind(key, DocumentKind::Invoice));
/// assert!(!key_matches_kind(key, DocumentKind::Manifest));
/// ```
pub fn key_matches_kind(key: &str, kind: DocumentKind) -> bool {
    model_from_key(key).is_none_or(|model| kind.key_models().iter().any(|m| *m == model))
}
