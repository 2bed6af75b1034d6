//! XML parsing and the case-insensitive query helpers over `roxmltree`.
//!
//! Input reaching here has been cleaned: namespace declarations and
//! prefixes are gone, so element names are plain local names.
//!
//! Lookups are two-tier: exact name match first, then a case-insensitive
//! match. Issuer software varies casing; the second tier absorbs that.

use roxmltree::{Document, Edge, Node};
use rust_decimal::Decimal;

use crate::core::FiscalError;
use crate::core::numeric::parse_decimal;

/// Deepest element nesting accepted. Fiscal documents stay well under 20.
pub const MAX_DEPTH: usize = 256;

/// A node of a parsed document. Queries scoped to the document node
/// (`doc.root()`) also see the root element.
pub type Element<'a> = Node<'a, 'a>;

/// Parse well-formed XML. Mismatched or unclosed tags, several root
/// elements, undefined entities, text outside the root and nesting past
/// [`MAX_DEPTH`] are errors.
pub fn parse_xml(xml: &str) -> Result<Document<'_>, FiscalError> {
    let doc = Document::parse(xml).map_err(|e| FiscalError::Xml(e.to_string()))?;
    check_depth(&doc)?;
    Ok(doc)
}

fn check_depth(doc: &Document<'_>) -> Result<(), FiscalError> {
    let mut depth = 0usize;
    for edge in doc.root().traverse() {
        match edge {
            Edge::Open(node) if node.is_element() => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(FiscalError::Xml(format!(
                        "elements nested deeper than {MAX_DEPTH} levels"
                    )));
                }
            }
            Edge::Close(node) if node.is_element() => depth -= 1,
            _ => {}
        }
    }
    Ok(())
}

/// Concatenated text of every text node under `node`, in document order.
pub fn text_content(node: Element<'_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Descendant elements named `tag`, in document order. Falls back to a
/// case-insensitive match when no exact match exists.
pub fn find_all<'a>(scope: Option<Element<'a>>, tag: &str) -> Vec<Element<'a>> {
    let Some(scope) = scope else {
        return Vec::new();
    };
    let elements = || scope.descendants().skip(1).filter(|n| n.is_element());
    let exact: Vec<_> = elements().filter(|n| n.tag_name().name() == tag).collect();
    if !exact.is_empty() {
        return exact;
    }
    elements()
        .filter(|n| n.tag_name().name().eq_ignore_ascii_case(tag))
        .collect()
}

/// First match of [`find_all`].
pub fn find_first<'a>(scope: Option<Element<'a>>, tag: &str) -> Option<Element<'a>> {
    let scope = scope?;
    let elements = || scope.descendants().skip(1).filter(|n| n.is_element());
    elements()
        .find(|n| n.tag_name().name() == tag)
        .or_else(|| elements().find(|n| n.tag_name().name().eq_ignore_ascii_case(tag)))
}

/// Trimmed text of the first `tag`, or `""`.
pub fn text_of(scope: Option<Element<'_>>, tag: &str) -> String {
    find_first(scope, tag)
        .map(|e| text_content(e).trim().to_string())
        .unwrap_or_default()
}

/// Number in the first `tag`; zero when absent or unparseable.
pub fn number_of(scope: Option<Element<'_>>, tag: &str) -> Decimal {
    find_first(scope, tag)
        .map(|e| parse_decimal(&text_content(e)))
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"<nfeProc versao="4.00">
  <NFe>
    <infNFe Id="NFe123" versao="4.00">
      <ide><nNF>42</nNF><natOp>VENDA &amp; REMESSA</natOp></ide>
      <det nItem="1"><prod><xProd> Aço  </xProd><qCom>10.5000</qCom></prod></det>
      <det nItem="2"><prod><xProd>Ferro</xProd><qCom>abc</qCom></prod></det>
    </infNFe>
  </NFe>
</nfeProc>"#;

    #[test]
    fn document_scope_includes_root() {
        let doc = parse_xml(SAMPLE).unwrap();
        assert!(find_first(Some(doc.root()), "nfeProc").is_some());
        let root = doc.root_element();
        assert_eq!(root.attribute("versao"), Some("4.00"));
        assert!(find_first(Some(root), "nfeProc").is_none());
    }

    #[test]
    fn descendants_in_document_order() {
        let doc = parse_xml(SAMPLE).unwrap();
        let products: Vec<String> = find_all(Some(doc.root()), "xProd")
            .into_iter()
            .map(text_content)
            .collect();
        assert_eq!(products, vec![" Aço  ".to_string(), "Ferro".to_string()]);
    }

    #[test]
    fn text_and_number_helpers() {
        let doc = parse_xml(SAMPLE).unwrap();
        let scope = Some(doc.root());
        assert_eq!(text_of(scope, "natOp"), "VENDA & REMESSA");
        assert_eq!(text_of(scope, "xProd"), "Aço");
        assert_eq!(text_of(scope, "missing"), "");
        assert_eq!(text_of(None, "nNF"), "");
        assert_eq!(number_of(scope, "qCom"), dec!(10.5));
        assert_eq!(number_of(scope, "nNF"), dec!(42));
        assert_eq!(number_of(scope, "missing"), Decimal::ZERO);

        let dets = find_all(scope, "det");
        assert_eq!(number_of(Some(dets[1]), "qCom"), Decimal::ZERO);
    }

    #[test]
    fn case_insensitive_fallback() {
        let doc = parse_xml(r#"<NFe><infNFe Id="NFe1"><IDE><nNF>7</nNF></IDE></infNFe></NFe>"#)
            .unwrap();
        let scope = Some(doc.root());
        assert_eq!(text_of(scope, "ide"), "7");
        assert_eq!(find_all(scope, "NFE").len(), 1);
        assert_eq!(find_first(scope, "INFNFE").and_then(|e| e.attribute("Id")), Some("NFe1"));
    }

    #[test]
    fn exact_match_wins_over_case_insensitive_match() {
        let doc = parse_xml("<r><X>1</X><x>2</x></r>").unwrap();
        let hits = find_all(Some(doc.root()), "x");
        assert_eq!(hits.len(), 1);
        assert_eq!(text_content(hits[0]), "2");
        assert_eq!(text_of(Some(doc.root()), "x"), "2");
    }

    #[test]
    fn text_spans_nested_elements() {
        let doc = parse_xml("<a>x<b>y<c>z</c></b></a>").unwrap();
        assert_eq!(text_content(doc.root_element()), "xyz");
    }

    #[test]
    fn cdata_is_text() {
        let doc = parse_xml("<a><b><![CDATA[x < y]]></b></a>").unwrap();
        assert_eq!(text_of(Some(doc.root()), "b"), "x < y");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_xml("<a><b></a>").is_err());
        assert!(parse_xml("<a><b>").is_err());
        assert!(parse_xml("<a/><b/>").is_err());
        assert!(parse_xml("").is_err());
        assert!(parse_xml("junk<a/>").is_err());
        assert!(parse_xml("<a>R & D</a>").is_err());
        assert!(parse_xml("<a>&nbsp;</a>").is_err());
    }

    #[test]
    fn nesting_limit() {
        let nested = |depth: usize| format!("{}1{}", "<a>".repeat(depth), "</a>".repeat(depth));
        assert!(parse_xml(&nested(MAX_DEPTH)).is_ok());
        let err = parse_xml(&nested(MAX_DEPTH + 1)).unwrap_err();
        assert!(matches!(err, FiscalError::Xml(_)));
    }
}
