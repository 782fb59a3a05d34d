//! Platform fee configuration
//!
//! Tenants historically stored their platform fee as a single overloaded
//! number: values `>= 1` meant a fixed currency amount per transaction and
//! values in `(0, 1)` meant a fractional rate of the gross amount. That
//! number is translated exactly once, at ingestion, into [`PlatformFee`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A tenant's platform fee, either fixed per transaction or a rate of gross
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlatformFee {
    /// Fixed currency amount charged per transaction
    Fixed { amount: Decimal },
    /// Fraction of the gross amount (0.029 = 2.9%)
    Percentage { rate: Decimal },
}

impl PlatformFee {
    pub fn fixed(amount: Decimal) -> Self {
        Self::Fixed { amount }
    }

    pub fn percentage(rate: Decimal) -> Self {
        Self::Percentage { rate }
    }

    /// Translate a legacy overloaded numeric fee.
    ///
    /// `>= 1` is a fixed amount, `(0, 1)` a rate. Zero or negative values
    /// mean "no fee configured" and yield `None`.
    pub fn from_legacy(value: Decimal) -> Option<Self> {
        if value >= Decimal::ONE {
            Some(Self::Fixed { amount: value })
        } else if value > Decimal::ZERO {
            Some(Self::Percentage { rate: value })
        } else {
            None
        }
    }

    /// Storage tag for this variant
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "fixed",
            Self::Percentage { .. } => "percentage",
        }
    }

    /// The configured number, amount or rate depending on the variant
    pub fn value(&self) -> Decimal {
        match self {
            Self::Fixed { amount } => *amount,
            Self::Percentage { rate } => *rate,
        }
    }

    /// Rebuild from a storage tag and value
    pub fn from_parts(kind: &str, value: Decimal) -> Option<Self> {
        match kind {
            "fixed" => Some(Self::Fixed { amount: value }),
            "percentage" => Some(Self::Percentage { rate: value }),
            _ => None,
        }
    }

    /// Whether this fee should be applied at all
    pub fn is_positive(&self) -> bool {
        self.value() > Decimal::ZERO
    }

    /// Fee charged on a transaction of `gross` (not floored)
    pub fn fee_for(&self, gross: Decimal) -> Decimal {
        match self {
            Self::Fixed { amount } => *amount,
            Self::Percentage { rate } => gross * *rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_legacy_one_is_fixed() {
        assert_eq!(PlatformFee::from_legacy(dec!(1)), Some(PlatformFee::fixed(dec!(1))));
    }

    #[test]
    fn test_legacy_just_below_one_is_rate() {
        assert_eq!(
            PlatformFee::from_legacy(dec!(0.999)),
            Some(PlatformFee::percentage(dec!(0.999)))
        );
    }

    #[test]
    fn test_legacy_zero_and_negative_are_unset() {
        assert_eq!(PlatformFee::from_legacy(Decimal::ZERO), None);
        assert_eq!(PlatformFee::from_legacy(dec!(-5)), None);
    }

    #[test]
    fn test_fee_for() {
        assert_eq!(PlatformFee::fixed(dec!(50)).fee_for(dec!(500)), dec!(50));
        assert_eq!(PlatformFee::percentage(dec!(0.1)).fee_for(dec!(2000)), dec!(200));
    }

    #[test]
    fn test_parts_roundtrip() {
        let fee = PlatformFee::percentage(dec!(0.05));
        assert_eq!(PlatformFee::from_parts(fee.kind(), fee.value()), Some(fee));
        assert_eq!(PlatformFee::from_parts("tiered", dec!(1)), None);
    }

    #[test]
    fn test_serde_tagged() {
        let json = serde_json::to_value(PlatformFee::fixed(dec!(16))).unwrap();
        assert_eq!(json["kind"], "fixed");
    }
}
