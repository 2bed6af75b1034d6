use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::numeric::digits_only;

/// Fallback rates used when reconciling a tax whose lines declare none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultRates {
    /// PIS, non-cumulative regime (1,65%).
    pub pis: Decimal,
    /// COFINS, non-cumulative regime (7,6%).
    pub cofins: Decimal,
    /// IPI business default (3,25%).
    pub ipi: Decimal,
}

impl Default for DefaultRates {
    fn default() -> Self {
        Self {
            pis: dec!(1.65),
            cofins: dec!(7.6),
            ipi: dec!(3.25),
        }
    }
}

/// Engine configuration threaded into every parse call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// CNPJ/CPF of the own company and its branches. Stored digits-only.
    pub own_company_ids: Vec<String>,
    #[serde(default)]
    pub default_rates: DefaultRates,
}

impl EngineConfig {
    /// Add an own-company CNPJ/CPF; punctuation is ignored.
    pub fn with_own_company(mut self, tax_id: &str) -> Self {
        let digits = digits_only(tax_id);
        if !digits.is_empty() && !self.own_company_ids.contains(&digits) {
            self.own_company_ids.push(digits);
        }
        self
    }

    pub fn with_default_rates(mut self, rates: DefaultRates) -> Self {
        self.default_rates = rates;
        self
    }

    /// Whether a CNPJ/CPF (any punctuation) belongs to the own company.
    pub fn is_own_company(&self, tax_id: &str) -> bool {
        let digits = digits_only(tax_id);
        if digits.is_empty() {
            return false;
        }
        self.own_company_ids
            .iter()
            .any(|own| digits_only(own) == digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_company_match_ignores_punctuation() {
        let config = EngineConfig::default().with_own_company("05.255.986/0001-64");
        assert!(config.is_own_company("05255986000164"));
        assert!(config.is_own_company("05.255.986/0001-64"));
        assert!(!config.is_own_company("11222333000181"));
        assert!(!config.is_own_company(""));
    }

    #[test]
    fn duplicate_ids_are_kept_once() {
        let config = EngineConfig::default()
            .with_own_company("05255986000164")
            .with_own_company("05.255.986/0001-64");
        assert_eq!(config.own_company_ids.len(), 1);
    }

    #[test]
    fn default_rates() {
        let rates = DefaultRates::default();
        assert_eq!(rates.pis, dec!(1.65));
        assert_eq!(rates.cofins, dec!(7.6));
        assert_eq!(rates.ipi, dec!(3.25));
    }
}
