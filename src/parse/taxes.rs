//! Document-level tax aggregation across `det/imposto` blocks.
//!
//! Values are summed from every line; bases and rates only from the regimes
//! that carry a percentage. The rate is weighted by base, and lines with a
//! non-positive base or rate never enter the weighting.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::dom::{Element, find_all, find_first, number_of};
use crate::core::{TaxSummary, TaxTotals, amounts_close, truncate_to_four_decimals};

/// The two federal contributions sharing the same XML layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contribution {
    Pis,
    Cofins,
}

impl Contribution {
    fn group(self) -> &'static str {
        match self {
            Self::Pis => "PIS",
            Self::Cofins => "COFINS",
        }
    }

    fn value_tag(self) -> &'static str {
        match self {
            Self::Pis => "vPIS",
            Self::Cofins => "vCOFINS",
        }
    }

    fn rate_tag(self) -> &'static str {
        match self {
            Self::Pis => "pPIS",
            Self::Cofins => "pCOFINS",
        }
    }

    /// Normal-rate regime element.
    fn rate_regime(self) -> &'static str {
        match self {
            Self::Pis => "PISAliq",
            Self::Cofins => "COFINSAliq",
        }
    }

    /// Other-operations regime element.
    fn other_regime(self) -> &'static str {
        match self {
            Self::Pis => "PISOutr",
            Self::Cofins => "COFINSOutr",
        }
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    base: Decimal,
    value: Decimal,
    weighted: Decimal,
}

impl Accumulator {
    // Saturating: declared amounts come from untrusted text.
    fn add_value(&mut self, value: Decimal) {
        self.value = self.value.saturating_add(value);
    }

    fn add_base(&mut self, base: Decimal, rate: Decimal) {
        self.base = self.base.saturating_add(base);
        if base > Decimal::ZERO && rate > Decimal::ZERO {
            self.weighted = self.weighted.saturating_add(rate.saturating_mul(base));
        }
    }

    fn add_positive_base(&mut self, base: Decimal, rate: Decimal) {
        if base > Decimal::ZERO {
            self.add_base(base, rate);
        }
    }

    fn finish(self) -> TaxTotals {
        let weighted_rate = if self.base > Decimal::ZERO {
            self.weighted.checked_div(self.base).unwrap_or(Decimal::ZERO)
        } else {
            Decimal::ZERO
        };
        TaxTotals {
            base: self.base,
            value: self.value,
            weighted_rate,
        }
    }
}

/// `imposto` blocks of every line item under `scope`.
fn line_tax_blocks<'a>(scope: Option<Element<'a>>) -> impl Iterator<Item = Element<'a>> {
    find_all(scope, "det")
        .into_iter()
        .filter_map(|det| find_first(Some(det), "imposto"))
}

/// PIS or COFINS totals.
///
/// The base comes from the normal-rate regime, or from the other-operations
/// regime when that one declares a positive base. Exempt, substituted and
/// per-quantity regimes contribute value only.
pub fn aggregate_contribution(scope: Option<Element<'_>>, tax: Contribution) -> TaxTotals {
    let mut acc = Accumulator::default();
    for imposto in line_tax_blocks(scope) {
        let Some(node) = find_first(Some(imposto), tax.group()) else {
            continue;
        };
        acc.add_value(number_of(Some(node), tax.value_tag()));

        if let Some(regime) = find_first(Some(node), tax.rate_regime()) {
            acc.add_base(
                number_of(Some(regime), "vBC"),
                number_of(Some(regime), tax.rate_tag()),
            );
        } else if let Some(regime) = find_first(Some(node), tax.other_regime()) {
            acc.add_positive_base(
                number_of(Some(regime), "vBC"),
                number_of(Some(regime), tax.rate_tag()),
            );
        }
    }
    acc.finish()
}

/// IPI totals: value from taxed and non-taxed lines, base and rate from
/// taxed lines only.
pub fn aggregate_ipi(scope: Option<Element<'_>>) -> TaxTotals {
    let mut acc = Accumulator::default();
    for imposto in line_tax_blocks(scope) {
        let Some(ipi) = find_first(Some(imposto), "IPI") else {
            continue;
        };
        if let Some(taxed) = find_first(Some(ipi), "IPITrib") {
            acc.add_value(number_of(Some(taxed), "vIPI"));
            acc.add_positive_base(
                number_of(Some(taxed), "vBC"),
                number_of(Some(taxed), "pIPI"),
            );
        }
        if let Some(untaxed) = find_first(Some(ipi), "IPINT") {
            acc.add_value(number_of(Some(untaxed), "vIPI"));
        }
    }
    acc.finish()
}

/// ICMS totals from the regime element (`ICMS00`, `ICMS20`, `ICMSSN101`...)
/// under each line's `ICMS` group.
pub fn aggregate_icms(scope: Option<Element<'_>>) -> TaxTotals {
    let mut acc = Accumulator::default();
    for imposto in line_tax_blocks(scope) {
        let Some(regime) = find_first(Some(imposto), "ICMS").and_then(|g| g.first_element_child())
        else {
            continue;
        };
        acc.add_value(number_of(Some(regime), "vICMS"));
        acc.add_positive_base(
            number_of(Some(regime), "vBC"),
            number_of(Some(regime), "pICMS"),
        );
    }
    acc.finish()
}

/// Interstate rate differential owed to the destination state.
pub fn aggregate_difal(scope: Option<Element<'_>>) -> TaxTotals {
    let mut acc = Accumulator::default();
    for imposto in line_tax_blocks(scope) {
        let Some(dest) = find_first(Some(imposto), "ICMSUFDest") else {
            continue;
        };
        acc.add_value(number_of(Some(dest), "vICMSUFDest"));
        acc.add_positive_base(
            number_of(Some(dest), "vBCUFDest"),
            number_of(Some(dest), "pICMSUFDest"),
        );
    }
    acc.finish()
}

/// Compare the declared value against `base × rate / 100`.
///
/// The declared weighted rate is used when there is one; otherwise
/// `default_rate`, and with neither the expected value is zero.
pub fn reconcile(totals: TaxTotals, default_rate: Option<Decimal>) -> TaxSummary {
    let effective_rate = if totals.weighted_rate.is_zero() {
        default_rate.unwrap_or(Decimal::ZERO)
    } else {
        totals.weighted_rate
    };
    let expected = totals.base.saturating_mul(effective_rate) / dec!(100);
    TaxSummary {
        base: totals.base,
        value: totals.value,
        declared_rate: truncate_to_four_decimals(totals.weighted_rate),
        expected,
        verified: amounts_close(totals.value, expected),
    }
}
