use super::dom::{Element, find_all, find_first, number_of, text_of};
use crate::core::ProductLine;

/// Product lines of an invoice, in document order.
///
/// Every `det` with a `prod` child yields one line unless its description is
/// empty. Identical lines are kept: an invoice may list the same product twice.
pub fn extract_products(scope: Option<Element<'_>>) -> Vec<ProductLine> {
    find_all(scope, "det")
        .into_iter()
        .filter_map(|det| {
            let prod = find_first(Some(det), "prod")?;
            let description = text_of(Some(prod), "xProd");
            if description.is_empty() {
                return None;
            }
            let ipi_taxed = find_first(Some(det), "imposto")
                .and_then(|imposto| find_first(Some(imposto), "IPI"))
                .and_then(|ipi| find_first(Some(ipi), "IPITrib"));
            let cfop = text_of(Some(prod), "CFOP");
            Some(ProductLine {
                description,
                quantity: number_of(Some(prod), "qCom"),
                unit_price: number_of(Some(prod), "vUnCom"),
                ipi_rate: number_of(ipi_taxed, "pIPI"),
                cfop: (!cfop.is_empty()).then_some(cfop),
            })
        })
        .collect()
}

/// Name of the transported material on a manifest.
///
/// The first non-empty `xProd` across `det` items; without any, the
/// predominant product declared in `infCarga/proPred`.
pub fn extract_material(scope: Option<Element<'_>>) -> String {
    let from_items = find_all(scope, "det").into_iter().find_map(|det| {
        let name = match find_first(Some(det), "prod") {
            Some(prod) => text_of(Some(prod), "xProd"),
            None => text_of(Some(det), "xProd"),
        };
        (!name.is_empty()).then_some(name)
    });
    match from_items {
        Some(name) => name,
        None => text_of(find_first(scope, "infCarga"), "proPred"),
    }
}
