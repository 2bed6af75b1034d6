use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fiscal document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    /// NF-e: goods invoice, one row per product line.
    Invoice,
    /// CT-e: freight manifest, one row per document.
    Manifest,
}

impl DocumentKind {
    /// Label used in reports ("NF-e" / "CT-e").
    pub fn label(&self) -> &'static str {
        match self {
            Self::Invoice => "NF-e",
            Self::Manifest => "CT-e",
        }
    }

    /// Access-key model codes of this kind: NF-e/NFC-e or CT-e/CT-e OS.
    pub fn key_models(&self) -> &'static [&'static str] {
        match self {
            Self::Invoice => &["55", "65"],
            Self::Manifest => &["57", "67"],
        }
    }
}

/// Document situation according to the SEFAZ authorization protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Situation {
    /// cStat 100, authorized.
    Active,
    /// cStat 101, cancellation approved.
    Cancelled,
    /// cStat 3xx, use denied.
    Denied,
    /// Any other status code.
    Rejected,
    /// No protocol present.
    Unknown,
}

impl Situation {
    /// cStat for an authorized document.
    pub const AUTHORIZED_CODE: &'static str = "100";
    /// cStat for a cancelled document.
    pub const CANCELLED_CODE: &'static str = "101";
    /// Prefix shared by the denial codes (301, 302, ...).
    pub const DENIED_PREFIX: &'static str = "3";

    /// Classify a protocol status code.
    pub fn from_status_code(code: &str) -> Self {
        let code = code.trim();
        if code.is_empty() {
            Self::Unknown
        } else if code == Self::AUTHORIZED_CODE {
            Self::Active
        } else if code == Self::CANCELLED_CODE {
            Self::Cancelled
        } else if code.starts_with(Self::DENIED_PREFIX) {
            Self::Denied
        } else {
            Self::Rejected
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Ativa",
            Self::Cancelled => "Cancelada",
            Self::Denied => "Negada",
            Self::Rejected => "Rejeitada",
            Self::Unknown => "Desconhecida",
        }
    }
}

/// Direction of the operation from the point of view of the own company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Entrada: the own company bought or received.
    Inbound,
    /// Saída: the own company sold or shipped.
    Outbound,
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Inbound => "Entrada",
            Self::Outbound => "Saída",
        }
    }
}

/// Authorization protocol metadata (`infProt`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolInfo {
    /// cStat.
    pub status_code: Option<String>,
    /// xMotivo.
    pub reason: Option<String>,
    /// nProt.
    pub protocol_number: Option<String>,
}

/// Document-level aggregate of one tax across all line items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxTotals {
    /// Sum of the calculation bases of the regimes that declare one.
    pub base: Decimal,
    /// Sum of the tax actually declared, across every regime.
    pub value: Decimal,
    /// Base-weighted average of the declared rates, in percent.
    pub weighted_rate: Decimal,
}

/// Reconciled tax summary stored on a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSummary {
    /// Sum of calculation bases.
    pub base: Decimal,
    /// Sum of declared values.
    pub value: Decimal,
    /// Weighted declared rate, truncated to four decimals.
    pub declared_rate: Decimal,
    /// `base × effective rate / 100`.
    pub expected: Decimal,
    /// Whether `value` is within tolerance of `expected`.
    pub verified: bool,
}

/// Optional fields that only some documents carry.
///
/// Every member defaults independently so a producer only fills what its
/// document kind has.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordExtension {
    pub operation: Option<Operation>,
    /// ide/serie.
    pub series: Option<String>,
    /// ide/natOp (free text).
    pub nature_of_operation: Option<String>,
    /// Issuer CNPJ/CPF, formatted.
    pub issuer_tax_id: Option<String>,
    /// Recipient (NF-e) or shipper (CT-e) CNPJ/CPF, formatted.
    pub counterparty_tax_id: Option<String>,
    /// vNF (NF-e) or vTPrest (CT-e).
    pub total_value: Option<Decimal>,
    /// ICMSTot/vBC.
    pub icms_base: Option<Decimal>,
    pub pis: Option<TaxSummary>,
    pub cofins: Option<TaxSummary>,
    pub ipi: Option<TaxSummary>,
    pub icms: Option<TaxSummary>,
    /// Interstate rate differential (ICMSUFDest).
    pub difal_value: Option<Decimal>,
    pub difal_rate: Option<Decimal>,
    /// Number decoded from a referenced NF-e key.
    pub referenced_invoice: Option<String>,
    /// Number decoded from a referenced CT-e key.
    pub referenced_manifest: Option<String>,
    /// Full referenced access key.
    pub referenced_key: Option<String>,
    /// Material scan result (CT-e).
    pub material: Option<String>,
    /// Product CFOP, consumed by the permission layer.
    pub cfop: Option<String>,
    /// Set by the caller when the row enters its working set.
    pub inserted_at: Option<NaiveDate>,
    /// Record produced from a cancellation result file.
    pub cancellation_file: bool,
}

/// One output row.
///
/// Invoices produce one row per product line, manifests one row per document.
/// The manual-fill fields are always emitted as zero/empty and are left for
/// downstream entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Random row id. Rows of one document share the access key, not the id.
    pub id: Uuid,
    pub kind: DocumentKind,
    /// 44 characters, or empty when the document has no usable key.
    pub access_key: String,

    /// Emission date as dd/mm/yyyy.
    pub date: String,
    /// Issuer name (EMPRESA (XML)). On manifests this is the carrier.
    pub issuer_name: String,
    /// CT-e number (manifests) or referenced CT-e number (invoices).
    pub freight_document: String,
    pub carrier: String,
    pub freight_value: Decimal,
    /// Recipient name.
    pub customer: String,
    /// Recipient state (UF).
    pub state: String,
    /// NF-e number (DANFE).
    pub invoice_number: String,

    pub product: String,
    /// Quantity (PESO).
    pub quantity: Decimal,
    /// Unit price with the IPI uplift ($ KG - (VENDA)).
    pub sale_unit_price: Decimal,
    /// Unit price as declared, without the uplift ($ KG VENDA - S/IPI).
    pub sale_unit_price_ex_ipi: Decimal,
    /// IPI rate applied to the uplift.
    pub ipi_rate: Decimal,

    // Manual-fill placeholders.
    pub company: String,
    pub seller: String,
    pub representative: String,
    pub segment: String,
    pub head_office: String,
    pub material_type: String,
    pub supplier: String,
    pub lot: String,
    pub purchase_unit_price: Decimal,
    pub purchase_unit_price_ex_ipi: Decimal,
    pub purchase_total: Decimal,
    pub sale_total: Decimal,
    pub freight_cost_per_kg: Decimal,
    pub name: String,
    pub representative_commission: Decimal,
    pub seller_commission: Decimal,
    pub head_office_commission: Decimal,
    pub cost_of_goods: Decimal,
    pub result: Decimal,
    pub margin: Decimal,
    pub category: String,
    pub region: String,
    pub sale: Decimal,
    pub profit: Decimal,

    pub situation: Situation,
    pub protocol: Option<ProtocolInfo>,
    /// dd/mm/yyyy of the protocol receipt, only when not active.
    pub status_changed_at: Option<String>,

    pub extension: RecordExtension,
}

impl NormalizedRecord {
    /// Empty record of the given kind with a fresh id.
    pub fn empty(kind: DocumentKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            access_key: String::new(),
            date: String::new(),
            issuer_name: String::new(),
            freight_document: String::new(),
            carrier: String::new(),
            freight_value: Decimal::ZERO,
            customer: String::new(),
            state: String::new(),
            invoice_number: String::new(),
            product: String::new(),
            quantity: Decimal::ZERO,
            sale_unit_price: Decimal::ZERO,
            sale_unit_price_ex_ipi: Decimal::ZERO,
            ipi_rate: Decimal::ZERO,
            company: String::new(),
            seller: String::new(),
            representative: String::new(),
            segment: String::new(),
            head_office: String::new(),
            material_type: String::new(),
            supplier: String::new(),
            lot: String::new(),
            purchase_unit_price: Decimal::ZERO,
            purchase_unit_price_ex_ipi: Decimal::ZERO,
            purchase_total: Decimal::ZERO,
            sale_total: Decimal::ZERO,
            freight_cost_per_kg: Decimal::ZERO,
            name: String::new(),
            representative_commission: Decimal::ZERO,
            seller_commission: Decimal::ZERO,
            head_office_commission: Decimal::ZERO,
            cost_of_goods: Decimal::ZERO,
            result: Decimal::ZERO,
            margin: Decimal::ZERO,
            category: String::new(),
            region: String::new(),
            sale: Decimal::ZERO,
            profit: Decimal::ZERO,
            situation: Situation::Unknown,
            protocol: None,
            status_changed_at: None,
            extension: RecordExtension::default(),
        }
    }

    /// Sale value of this row: quantity × uplifted unit price.
    pub fn sale_value(&self) -> Decimal {
        self.quantity.saturating_mul(self.sale_unit_price)
    }
}

/// One product line extracted from an NF-e `det` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLine {
    /// xProd.
    pub description: String,
    /// qCom.
    pub quantity: Decimal,
    /// vUnCom.
    pub unit_price: Decimal,
    /// IPITrib/pIPI, zero when the line is not IPI-taxed.
    pub ipi_rate: Decimal,
    /// CFOP, when declared.
    pub cfop: Option<String>,
}
