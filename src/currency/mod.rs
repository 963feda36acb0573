//! Decimal-safe monetary values and the fixed pt-BR display convention.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const CURRENCY_SYMBOL: &str = "R$";
const GROUPING_SEPARATOR: char = '.';
const DECIMAL_SEPARATOR: char = ',';

/// A monetary amount held as an exact count of cents.
///
/// All arithmetic is integer arithmetic, so installment sums and balance
/// comparisons are exact; there is no float epsilon anywhere in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Builds an amount from whole currency units and cents (0..=99).
    pub fn from_major_minor(major: i64, minor: u8) -> Self {
        let minor = i64::from(minor.min(99));
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn abs(self) -> Money {
        Money(self.0.abs())
    }

    /// Splits the amount into `count` installment values.
    ///
    /// Returns `(first, base)` where `base` is the half-up rounded per
    /// installment value and `first` absorbs the rounding remainder, so that
    /// `first + base * (count - 1)` equals the amount exactly.
    pub fn split(self, count: u32) -> (Money, Money) {
        if count <= 1 {
            return (self, self);
        }
        let count = i128::from(count);
        let cents = i128::from(self.0);
        // round-half-up of cents / count, computed in integers
        let base = (cents * 2 + count) / (count * 2);
        let first = cents - base * (count - 1);
        (Money(first as i64), Money(base as i64))
    }

    /// Exact decimal value in currency units. Two-decimal amounts within the
    /// document range round-trip through this representation losslessly.
    pub fn to_units(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Converts a decimal number of currency units, rounding half away from
    /// zero to the nearest cent. Used when normalizing store documents.
    pub fn from_units(units: f64) -> Self {
        if !units.is_finite() {
            return Money::ZERO;
        }
        Money((units * 100.0).round() as i64)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_currency_display(*self))
    }
}

// Store documents carry monetary fields as plain decimal numbers, the shape
// the original records already have, so Money serializes as units rather
// than cents.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_units())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MoneyVisitor;

        impl<'de> Visitor<'de> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a monetary amount in currency units")
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<Money, E> {
                Ok(Money::from_units(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Money, E> {
                Ok(Money(value.saturating_mul(100)))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Money, E> {
                self.visit_i64(value.min(i64::MAX as u64) as i64)
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}

/// Renders an amount in the fixed display convention: currency symbol,
/// `.` thousands grouping, `,` decimal separator, exactly two fraction
/// digits (`R$ 1.234,56`).
pub fn format_currency_display(value: Money) -> String {
    let cents = value.cents().abs();
    let int_part = group_digits(&(cents / 100).to_string(), GROUPING_SEPARATOR);
    let body = format!(
        "{}{}{:02}",
        int_part,
        DECIMAL_SEPARATOR,
        cents % 100
    );
    if value.cents() < 0 {
        format!("-{} {}", CURRENCY_SYMBOL, body)
    } else {
        format!("{} {}", CURRENCY_SYMBOL, body)
    }
}

/// Parses user input in the same convention. The currency symbol and
/// whitespace are stripped, `.` is treated as grouping and `,` as the
/// decimal separator. Unparseable input yields zero; this never fails.
pub fn parse_currency_input(text: &str) -> Money {
    let cleaned: String = text
        .replace(CURRENCY_SYMBOL, "")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != GROUPING_SEPARATOR)
        .collect();
    if cleaned.is_empty() {
        return Money::ZERO;
    }

    let negative = cleaned.starts_with('-');
    let unsigned = cleaned.trim_start_matches('-');
    let (int_text, frac_text) = match unsigned.split_once(DECIMAL_SEPARATOR) {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (unsigned, ""),
    };
    if frac_text.contains(DECIMAL_SEPARATOR) {
        return Money::ZERO;
    }

    let int_value = if int_text.is_empty() {
        0
    } else {
        match int_text.parse::<i64>() {
            Ok(value) if value >= 0 => value,
            _ => return Money::ZERO,
        }
    };

    let mut frac_digits: Vec<u32> = Vec::new();
    for ch in frac_text.chars() {
        match ch.to_digit(10) {
            Some(d) => frac_digits.push(d),
            None => return Money::ZERO,
        }
    }
    // keep two fraction digits, rounding half up on the third
    let mut frac_value = match frac_digits.len() {
        0 => 0,
        1 => i64::from(frac_digits[0]) * 10,
        _ => i64::from(frac_digits[0]) * 10 + i64::from(frac_digits[1]),
    };
    if frac_digits.len() > 2 && frac_digits[2] >= 5 {
        frac_value += 1;
    }

    let cents = match int_value
        .checked_mul(100)
        .and_then(|units| units.checked_add(frac_value))
    {
        Some(cents) => cents,
        None => return Money::ZERO,
    };
    Money::from_cents(if negative { -cents } else { cents })
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::new();
    let mut count = 0;
    for ch in digits.chars().rev() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, separator);
        }
        grouped.insert(0, ch);
        count += 1;
    }
    grouped
}
