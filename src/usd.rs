use serde_with::DeserializeFromStr;

use anyhow::bail;

use std::{
    fmt::{Debug, Display},
    iter::Sum,
    ops::{Add, AddAssign, Mul},
    str::FromStr,
};

/// Represents an amount of money in USD currency.
///
/// The amount is stored internally as an integer number of cents, so sums over
/// many records are exact and reproducible. The [`Display`] implementation
/// formats it as dollars to 2 decimal places, without a currency symbol (the
/// symbol is applied by the spreadsheet number format instead).
#[derive(Clone, Copy, Default, DeserializeFromStr, Eq, PartialEq, Ord, PartialOrd)]
pub struct Usd(i64);

impl Usd {
    /// Creates an amount from an integer number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents.
    #[must_use]
    pub fn cents(self) -> i64 {
        self.0
    }

    /// Returns the amount as floating-point dollars, for spreadsheet cells
    /// and statistics.
    #[must_use]
    pub fn as_dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Debug for Usd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Usd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dollars = self.0 as f64 / 100.0;
        write!(f, "{dollars:.2}")
    }
}

impl FromStr for Usd {
    type Err = anyhow::Error;

    /// Parses amounts like `2.50`, `$1,234.5`, or `-10`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('$').replace(',', "");
        let (sign, s) = match s.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, s.as_str()),
        };
        let (dollars, frac) = match s.split_once('.') {
            Some((d, f)) => (d, f),
            None => (s, ""),
        };
        if frac.len() > 2 {
            bail!("too many decimal places in amount: {frac:?}");
        }
        let dollars: i64 = if dollars.is_empty() { 0 } else { dollars.parse()? };
        let cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>()? * 10,
            _ => frac.parse()?,
        };
        Ok(Self(sign * (dollars * 100 + cents)))
    }
}

impl Add for Usd {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Usd {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Mul<i32> for Usd {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self::Output {
        Self(self.0 * i64::from(rhs))
    }
}

impl Sum for Usd {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_fn_parses_plain_and_decorated_amounts() {
        assert_eq!(Usd::from_str("2.50").unwrap(), Usd::from_cents(250));
        assert_eq!(Usd::from_str("2.5").unwrap(), Usd::from_cents(250));
        assert_eq!(Usd::from_str("10").unwrap(), Usd::from_cents(1000));
        assert_eq!(Usd::from_str("$1,234.56").unwrap(), Usd::from_cents(123_456));
        assert_eq!(Usd::from_str("-3.25").unwrap(), Usd::from_cents(-325));
        assert_eq!(Usd::from_str(".99").unwrap(), Usd::from_cents(99));
    }

    #[test]
    fn from_str_fn_returns_error_for_garbage() {
        assert!(Usd::from_str("bogus").is_err());
        assert!(Usd::from_str("1.234").is_err());
    }

    #[test]
    fn display_formats_as_dollars_to_two_places() {
        assert_eq!(Usd::from_cents(250).to_string(), "2.50");
        assert_eq!(Usd::from_cents(30000).to_string(), "300.00");
    }

    #[test]
    fn revenue_arithmetic_is_exact_in_cents() {
        let price = Usd::from_str("2.50").unwrap();
        assert_eq!(price * 10, Usd::from_cents(2500));
        let total: Usd = [price * 2, price * 4].into_iter().sum();
        assert_eq!(total, Usd::from_cents(1500));
    }
}
