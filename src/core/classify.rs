//! Operation-direction detection (Entrada / Saída).
//!
//! Each document kind has an ordered list of rules. A rule either decides or
//! passes; the first decisive rule wins and the list always ends in a default,
//! so every document gets a direction. Rules that had to guess are flagged so
//! the caller can log them.

use super::config::EngineConfig;
use super::numeric::digits_only;
use super::types::Operation;

/// Inputs to the direction rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectionSignals {
    /// Issuer CNPJ/CPF, digits only.
    pub issuer_id: String,
    /// Recipient (NF-e) or shipper (CT-e) CNPJ/CPF, digits only.
    pub counterparty_id: String,
    pub own_is_issuer: bool,
    pub own_is_counterparty: bool,
    /// Direction declared by the document itself (tpNF / tpCTe), if usable.
    pub declared: Option<Operation>,
}

impl DirectionSignals {
    pub fn new(
        issuer_id: &str,
        counterparty_id: &str,
        declared: Option<Operation>,
        config: &EngineConfig,
    ) -> Self {
        let issuer_id = digits_only(issuer_id);
        let counterparty_id = digits_only(counterparty_id);
        Self {
            own_is_issuer: config.is_own_company(&issuer_id),
            own_is_counterparty: config.is_own_company(&counterparty_id),
            issuer_id,
            counterparty_id,
            declared,
        }
    }

    fn parties_differ(&self) -> bool {
        !self.issuer_id.is_empty()
            && !self.counterparty_id.is_empty()
            && self.issuer_id != self.counterparty_id
    }
}

/// Outcome of direction detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionDecision {
    pub operation: Operation,
    /// Name of the rule that decided.
    pub rule: &'static str,
    /// `true` when the decision is a fallback rather than a tax-id match.
    pub inferred: bool,
}

/// A rule's verdict: the direction and whether it was guessed.
pub type Verdict = (Operation, bool);

type RuleFn = fn(&DirectionSignals) -> Option<Verdict>;

/// One named rule of a direction chain.
#[derive(Clone, Copy)]
pub struct DirectionRule {
    pub name: &'static str,
    pub apply: RuleFn,
}

impl std::fmt::Debug for DirectionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectionRule")
            .field("name", &self.name)
            .finish()
    }
}

/// NF-e chain. The tax-id match is authoritative, the declared `tpNF` is
/// secondary, party inference is last.
pub const INVOICE_RULES: &[DirectionRule] = &[
    DirectionRule {
        name: "own-issuer",
        apply: |s| {
            if s.own_is_issuer && !s.own_is_counterparty {
                Some((Operation::Outbound, false))
            } else {
                None
            }
        },
    },
    DirectionRule {
        name: "own-recipient",
        apply: |s| {
            if s.own_is_counterparty && !s.own_is_issuer {
                Some((Operation::Inbound, false))
            } else {
                None
            }
        },
    },
    DirectionRule {
        name: "self-transfer",
        apply: |s| {
            if !(s.own_is_issuer && s.own_is_counterparty) {
                return None;
            }
            Some(match s.declared {
                Some(op) => (op, false),
                None => (Operation::Outbound, true),
            })
        },
    },
    DirectionRule {
        name: "declared-flag",
        apply: |s| s.declared.map(|op| (op, true)),
    },
    DirectionRule {
        name: "distinct-parties",
        apply: |s| s.parties_differ().then_some((Operation::Outbound, true)),
    },
];

/// CT-e chain, keyed on carrier (issuer) vs. shipper (remetente).
pub const MANIFEST_RULES: &[DirectionRule] = &[
    DirectionRule {
        name: "own-carrier",
        apply: |s| {
            if s.own_is_issuer && !s.own_is_counterparty {
                Some((Operation::Outbound, false))
            } else {
                None
            }
        },
    },
    DirectionRule {
        name: "own-shipper",
        apply: |s| s.own_is_counterparty.then_some((Operation::Inbound, false)),
    },
    DirectionRule {
        name: "declared-normal",
        apply: |s| match s.declared {
            Some(Operation::Outbound) => Some((Operation::Outbound, true)),
            _ => None,
        },
    },
    DirectionRule {
        name: "distinct-parties",
        apply: |s| s.parties_differ().then_some((Operation::Outbound, true)),
    },
];

/// Run a rule chain; falls back to an inferred `Inbound` when nothing decides.
pub fn resolve_direction(rules: &[DirectionRule], signals: &DirectionSignals) -> DirectionDecision {
    rules
        .iter()
        .find_map(|rule| {
            (rule.apply)(signals).map(|(operation, inferred)| DirectionDecision {
                operation,
                rule: rule.name,
                inferred,
            })
        })
        .unwrap_or(DirectionDecision {
            operation: Operation::Inbound,
            rule: "default",
            inferred: true,
        })
}

/// `tpNF`: 0 = entrada, 1 = saída.
pub fn invoice_declared_direction(tp_nf: &str) -> Option<Operation> {
    match tp_nf.trim() {
        "0" => Some(Operation::Inbound),
        "1" => Some(Operation::Outbound),
        _ => None,
    }
}

/// `tpCTe`: only 0 (normal) says anything about direction.
pub fn manifest_declared_direction(tp_cte: &str) -> Option<Operation> {
    match tp_cte.trim() {
        "0" => Some(Operation::Outbound),
        _ => None,
    }
}
