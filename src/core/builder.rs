use rust_decimal::Decimal;
use uuid::Uuid;

use super::numeric::uplift;
use super::types::*;

/// Builder for the rows of one document.
///
/// The header is set once; each call to [`build_for_product`](Self::build_for_product)
/// or [`build`](Self::build) stamps out a fresh record with its own id, so
/// all rows of a document share every header field.
///
/// ```
/// use notafiscal::core::*;
/// use rust_decimal_macros::dec;
///
/// let header = RecordBuilder::new(DocumentKind::Invoice)
///     .access_key("35230512345678000164550010000001234567890123")
///     .customer("Cliente Ltda")
///     .state("SP");
///
/// let line = ProductLine {
///     description: "Chapa de aço".into(),
///     quantity: dec!(10),
///     unit_price: dec!(100),
///     ipi_rate: dec!(5),
///     cfop: None,
/// };
/// let row = header.build_for_product(&line);
/// assert_eq!(row.sale_unit_price, dec!(105));
/// assert_eq!(row.sale_unit_price_ex_ipi, dec!(100));
/// ```
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    header: NormalizedRecord,
}

impl RecordBuilder {
    pub fn new(kind: DocumentKind) -> Self {
        Self {
            header: NormalizedRecord::empty(kind),
        }
    }

    pub fn access_key(mut self, key: impl Into<String>) -> Self {
        self.header.access_key = key.into();
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.header.date = date.into();
        self
    }

    pub fn issuer_name(mut self, name: impl Into<String>) -> Self {
        self.header.issuer_name = name.into();
        self
    }

    pub fn freight_document(mut self, number: impl Into<String>) -> Self {
        self.header.freight_document = number.into();
        self
    }

    pub fn carrier(mut self, name: impl Into<String>) -> Self {
        self.header.carrier = name.into();
        self
    }

    pub fn freight_value(mut self, value: Decimal) -> Self {
        self.header.freight_value = value;
        self
    }

    pub fn customer(mut self, name: impl Into<String>) -> Self {
        self.header.customer = name.into();
        self
    }

    pub fn state(mut self, uf: impl Into<String>) -> Self {
        self.header.state = uf.into();
        self
    }

    pub fn invoice_number(mut self, number: impl Into<String>) -> Self {
        self.header.invoice_number = number.into();
        self
    }

    /// Product name for documents that are not exploded per line.
    pub fn product(mut self, name: impl Into<String>) -> Self {
        self.header.product = name.into();
        self
    }

    pub fn situation(mut self, situation: Situation) -> Self {
        self.header.situation = situation;
        self
    }

    pub fn protocol(mut self, protocol: Option<ProtocolInfo>) -> Self {
        self.header.protocol = protocol;
        self
    }

    pub fn status_changed_at(mut self, date: Option<String>) -> Self {
        self.header.status_changed_at = date;
        self
    }

    pub fn extension(mut self, extension: RecordExtension) -> Self {
        self.header.extension = extension;
        self
    }

    /// Mutable access to the extension group for incremental filling.
    pub fn extension_mut(&mut self) -> &mut RecordExtension {
        &mut self.header.extension
    }

    /// Header-only row (no product fields).
    pub fn build(&self) -> NormalizedRecord {
        NormalizedRecord {
            id: Uuid::new_v4(),
            ..self.header.clone()
        }
    }

    /// Row for one product line.
    ///
    /// The sale unit price carries the IPI uplift; the declared price is kept
    /// separately in `sale_unit_price_ex_ipi`.
    pub fn build_for_product(&self, line: &ProductLine) -> NormalizedRecord {
        let mut record = self.build();
        record.product = line.description.clone();
        record.quantity = line.quantity;
        record.sale_unit_price = uplift(line.unit_price, line.ipi_rate);
        record.sale_unit_price_ex_ipi = line.unit_price;
        record.ipi_rate = line.ipi_rate;
        if line.cfop.is_some() {
            record.extension.cfop = line.cfop.clone();
        }
        record
    }
}
