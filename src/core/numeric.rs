//! Numeric coercion, tolerance comparison and display formatting.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;

/// Relative tolerance accepted when reconciling tax amounts (1%).
pub const AMOUNT_TOLERANCE_PERCENT: Decimal = dec!(0.01);

/// Absolute tolerance floor (R$ 0,10).
pub const AMOUNT_TOLERANCE_MIN: Decimal = dec!(0.10);

/// `true` when `actual` is within 1% of `expected`, or within ten cents,
/// whichever band is wider.
///
/// ```
/// use notafiscal::core::amounts_close;
/// use rust_decimal_macros::dec;
///
/// assert!(amounts_close(dec!(100), dec!(100.05)));
/// assert!(!amounts_close(dec!(1000), dec!(950)));
/// ```
pub fn amounts_close(actual: Decimal, expected: Decimal) -> bool {
    let diff = actual.saturating_sub(expected).abs();
    let tolerance = AMOUNT_TOLERANCE_MIN.max(expected.abs() * AMOUNT_TOLERANCE_PERCENT);
    diff <= tolerance
}

/// Truncate (never round) to four decimal places.
pub fn truncate_to_four_decimals(value: Decimal) -> Decimal {
    value.trunc_with_scale(4)
}

/// Lenient decimal parse: plain or scientific notation, anything else is zero.
pub fn parse_decimal(text: &str) -> Decimal {
    let text = text.trim();
    if text.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .unwrap_or(Decimal::ZERO)
}

/// Unit price with the IPI rate (in percent) added on top.
pub fn uplift(unit_price: Decimal, ipi_rate: Decimal) -> Decimal {
    unit_price.saturating_mul(Decimal::ONE.saturating_add(ipi_rate / dec!(100)))
}

/// Reformat an ISO date or date-time (`2024-03-05T10:00:00-03:00`) as
/// `05/03/2024`. Input that does not start with a valid date is returned
/// unchanged.
pub fn format_date(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return String::new();
    }
    let date_part = value.split('T').next().unwrap_or(value).trim();
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => date.format("%d/%m/%Y").to_string(),
        Err(_) => value.to_string(),
    }
}

/// Keep only ASCII digits.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Mask a CPF (11 digits) or CNPJ (14 digits). Other input is returned as is.
pub fn format_tax_id(value: &str) -> String {
    let d = digits_only(value);
    match d.len() {
        11 => format!("{}.{}.{}-{}", &d[..3], &d[3..6], &d[6..9], &d[9..]),
        14 => format!(
            "{}.{}.{}/{}-{}",
            &d[..2],
            &d[2..5],
            &d[5..8],
            &d[8..12],
            &d[12..]
        ),
        _ => value.to_string(),
    }
}

/// Brazilian-locale number with a fixed number of decimals: `1.234,56`.
pub fn format_decimal_br(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp(decimals);
    let plain = format!("{:.*}", decimals as usize, rounded.abs());
    let (int_part, frac_part) = match plain.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (plain.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(f) => format!("{sign}{grouped},{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// `R$ 1.234,56`.
pub fn format_currency(value: Decimal) -> String {
    let body = format_decimal_br(value.abs(), 2);
    if value.is_sign_negative() && !value.round_dp(2).is_zero() {
        format!("-R$ {body}")
    } else {
        format!("R$ {body}")
    }
}

/// `12.50%`.
pub fn format_percent(value: Decimal) -> String {
    format!("{:.2}%", value.round_dp(2))
}
