//! STX amounts and Naira conversion
//!
//! All arithmetic is done on integers. STX amounts travel as micro-STX
//! (1 STX = 1_000_000 micro-STX) and Naira amounts as kobo (1/100 Naira),
//! so nothing here ever touches floating point.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of micro-STX in one STX
pub const MICRO_STX_PER_STX: u64 = 1_000_000;

/// Decimal places of an STX amount
pub const STX_DECIMALS: usize = 6;

const KOBO_PER_NAIRA: u128 = 100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,

    #[error("Invalid amount: {0}")]
    Invalid(String),

    #[error("Too many decimal places (max {max})")]
    TooManyDecimals { max: usize },

    #[error("Amount is too large")]
    Overflow,
}

/// Exchange rate reported by the contract, in Naira per STX.
///
/// The contract reports an unsigned integer whose fixed-point scale is not
/// self-describing, so the divisor is carried explicitly: the Naira value of
/// one STX is `value / scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub value: u128,
    pub scale: u32,
}

impl ExchangeRate {
    pub fn new(value: u128, scale: u32) -> Self {
        Self {
            value,
            scale: scale.max(1),
        }
    }

    /// Naira value of `micro_stx`, in kobo, rounded half-up.
    pub fn micro_stx_to_kobo(&self, micro_stx: u128) -> u128 {
        let numerator = micro_stx
            .saturating_mul(self.value)
            .saturating_mul(KOBO_PER_NAIRA);
        let denominator = u128::from(MICRO_STX_PER_STX) * u128::from(self.scale.max(1));
        numerator.saturating_add(denominator / 2) / denominator
    }

    /// Formatted Naira value of `micro_stx`, two decimals
    pub fn convert(&self, micro_stx: u128) -> String {
        format_kobo(self.micro_stx_to_kobo(micro_stx))
    }

    /// Formatted Naira value of one STX
    pub fn per_stx(&self) -> String {
        self.convert(u128::from(MICRO_STX_PER_STX))
    }
}

/// Parse a user-entered STX amount ("1", "0.5", "12.000001") into micro-STX.
///
/// Signs, exponents and more than six decimal places are rejected.
pub fn parse_stx_amount(input: &str) -> Result<u64, AmountError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(AmountError::Invalid(s.to_string()));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::Invalid(s.to_string()));
    }
    if frac.len() > STX_DECIMALS {
        return Err(AmountError::TooManyDecimals { max: STX_DECIMALS });
    }

    let whole_val: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| AmountError::Overflow)?
    };
    let frac_padded = format!("{:0<width$}", frac, width = STX_DECIMALS);
    let frac_val: u64 = frac_padded
        .parse()
        .map_err(|_| AmountError::Invalid(s.to_string()))?;

    whole_val
        .checked_mul(MICRO_STX_PER_STX)
        .and_then(|v| v.checked_add(frac_val))
        .ok_or(AmountError::Overflow)
}

/// Format micro-STX as a decimal STX string with six places
pub fn format_stx(micro_stx: u128) -> String {
    let unit = u128::from(MICRO_STX_PER_STX);
    format!(
        "{}.{:0width$}",
        micro_stx / unit,
        micro_stx % unit,
        width = STX_DECIMALS
    )
}

/// Format kobo as a decimal Naira string with two places
pub fn format_kobo(kobo: u128) -> String {
    format!("{}.{:02}", kobo / KOBO_PER_NAIRA, kobo % KOBO_PER_NAIRA)
}

/// Naira estimate for the send form.
///
/// Falls back to `0.00` while the amount is blank or unparsable, or while no
/// rate has been fetched yet.
pub fn estimate_naira(amount_input: &str, rate: Option<&ExchangeRate>) -> String {
    match (parse_stx_amount(amount_input), rate) {
        (Ok(micro), Some(rate)) => rate.convert(u128::from(micro)),
        _ => format_kobo(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_and_fractional() {
        assert_eq!(parse_stx_amount("1").unwrap(), 1_000_000);
        assert_eq!(parse_stx_amount("0.5").unwrap(), 500_000);
        assert_eq!(parse_stx_amount(".25").unwrap(), 250_000);
        assert_eq!(parse_stx_amount("12.000001").unwrap(), 12_000_001);
        assert_eq!(parse_stx_amount("  3. ").unwrap(), 3_000_000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_stx_amount(""), Err(AmountError::Empty));
        assert_eq!(parse_stx_amount("   "), Err(AmountError::Empty));
        assert!(matches!(parse_stx_amount("-1"), Err(AmountError::Invalid(_))));
        assert!(matches!(parse_stx_amount("1e6"), Err(AmountError::Invalid(_))));
        assert!(matches!(parse_stx_amount("."), Err(AmountError::Invalid(_))));
        assert!(matches!(parse_stx_amount("1.2.3"), Err(AmountError::Invalid(_))));
        assert_eq!(
            parse_stx_amount("0.0000001"),
            Err(AmountError::TooManyDecimals { max: 6 })
        );
        assert_eq!(
            parse_stx_amount("99999999999999999999"),
            Err(AmountError::Overflow)
        );
    }

    #[test]
    fn test_format_stx() {
        assert_eq!(format_stx(0), "0.000000");
        assert_eq!(format_stx(1_500_000), "1.500000");
        assert_eq!(format_stx(42), "0.000042");
    }

    #[test]
    fn test_naira_conversion() {
        // 1 STX = 1500 Naira
        let rate = ExchangeRate::new(1500, 1);
        assert_eq!(rate.convert(2_000_000), "3000.00");
        assert_eq!(rate.convert(1), "0.00");
        // 0.000333 STX * 1500 = 0.4995 -> rounds up
        assert_eq!(rate.convert(333), "0.50");
        assert_eq!(rate.per_stx(), "1500.00");
    }

    #[test]
    fn test_scaled_rate() {
        // 1 STX = 1234.56 Naira with two implied decimals
        let rate = ExchangeRate::new(123_456, 100);
        assert_eq!(rate.per_stx(), "1234.56");
        assert_eq!(rate.convert(500_000), "617.28");
    }

    #[test]
    fn test_zero_scale_is_treated_as_one() {
        let rate = ExchangeRate::new(10, 0);
        assert_eq!(rate.scale, 1);
        assert_eq!(rate.per_stx(), "10.00");
    }

    #[test]
    fn test_estimate_naira() {
        let rate = ExchangeRate::new(1500, 1);
        assert_eq!(estimate_naira("2", Some(&rate)), "3000.00");
        assert_eq!(estimate_naira("", Some(&rate)), "0.00");
        assert_eq!(estimate_naira("abc", Some(&rate)), "0.00");
        assert_eq!(estimate_naira("2", None), "0.00");
    }
}
