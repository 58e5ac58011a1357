//! Currency formatting and salary arithmetic.

use serde::{Deserialize, Serialize};

/// Digit-grouping convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Locale {
    /// Indian grouping: last three digits, then pairs (`4,92,000`).
    #[default]
    EnIn,
    /// Western grouping: thousands (`492,000`).
    EnUs,
}

/// How monetary amounts are printed on documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyFormat {
    /// Printed before the number. Builtin PDF fonts have no rupee glyph,
    /// so the default is the ASCII abbreviation.
    pub prefix: String,
    pub locale: Locale,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            prefix: "Rs. ".to_string(),
            locale: Locale::EnIn,
        }
    }
}

/// Format a whole-rupee amount with grouping and exactly two decimals.
pub fn format_currency(amount: i64, format: &CurrencyFormat) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let digits = amount.unsigned_abs().to_string();
    format!(
        "{sign}{}{}.00",
        format.prefix,
        group_digits(&digits, format.locale)
    )
}

fn group_digits(digits: &str, locale: Locale) -> String {
    let len = digits.len();
    if len <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(len - 3);
    let step = match locale {
        Locale::EnIn => 2,
        Locale::EnUs => 3,
    };

    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(step);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    let mut out = groups.join(",");
    out.push(',');
    out.push_str(tail);
    out
}

/// Monthly salary components of an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SalaryComponents {
    pub basic: i64,
    pub hra: i64,
    pub ta: i64,
    pub other: i64,
}

impl SalaryComponents {
    /// Monthly gross.
    pub fn gross(&self) -> i64 {
        self.basic + self.hra + self.ta + self.other
    }

    /// Annual total (gross × 12).
    pub fn annual(&self) -> i64 {
        self.gross() * 12
    }

    /// `(label, monthly)` pairs in table order.
    pub fn rows(&self) -> [(&'static str, i64); 4] {
        [
            ("Basic Salary", self.basic),
            ("House Rent Allowance (HRA)", self.hra),
            ("Travel Allowance (TA)", self.ta),
            ("Other Allowances", self.other),
        ]
    }
}
