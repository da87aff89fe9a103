//! Property keys
//!
//! Keys are either canonical array indices or strings. Numeric strings that
//! spell a canonical index (`"0"`, `"17"`, but not `"017"` or `"1.0"`) are
//! folded into [`PropertyKey::Index`] so `record["1"]` and `record[1]` name the
//! same slot.

use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Largest valid array index (2^32 - 2)
pub(crate) const MAX_INDEX: u32 = u32::MAX - 1;

/// A property key
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKey {
    /// Integer index (for arrays)
    Index(u32),
    /// String property key
    String(Arc<str>),
}

impl PropertyKey {
    /// Create a string property key, folding canonical indices
    pub fn string(s: &str) -> Self {
        match parse_index(s) {
            Some(i) => Self::Index(i),
            None => Self::String(Arc::from(s)),
        }
    }

    /// Create an index property key
    pub fn index(i: u32) -> Self {
        Self::Index(i)
    }

    /// Create a key from a number, rendering non-indices in their shortest
    /// round-trip decimal form
    pub fn from_number(n: f64) -> Self {
        if n.fract() == 0.0 && n >= 0.0 && n <= MAX_INDEX as f64 {
            return Self::Index(n as u32);
        }
        Self::String(Arc::from(number_to_string(n).as_str()))
    }

    /// Index value, if this is an index key
    pub fn as_index(&self) -> Option<u32> {
        match self {
            Self::Index(i) => Some(*i),
            Self::String(_) => None,
        }
    }

    /// String value, if this is a string key
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Index(_) => None,
        }
    }

    /// Whether this is an index key
    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }

    /// Numeric reading of the key, if it has one
    ///
    /// Index keys are always numeric; string keys are parsed as decimals.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Index(i) => Some(*i as f64),
            Self::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
            }
        }
    }

    /// Key rendered as a string value
    pub fn to_value(&self) -> Value {
        Value::string(&self.to_string())
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => f.write_str(itoa::Buffer::new().format(*i)),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        Self::string(&s)
    }
}

impl From<u32> for PropertyKey {
    fn from(i: u32) -> Self {
        Self::Index(i)
    }
}

impl From<usize> for PropertyKey {
    fn from(i: usize) -> Self {
        Self::from_number(i as f64)
    }
}

impl From<i32> for PropertyKey {
    fn from(i: i32) -> Self {
        Self::from_number(i as f64)
    }
}

impl From<f64> for PropertyKey {
    fn from(n: f64) -> Self {
        Self::from_number(n)
    }
}

impl From<&PropertyKey> for PropertyKey {
    fn from(key: &PropertyKey) -> Self {
        key.clone()
    }
}

/// Parse a canonical array index: no sign, no leading zeros, below 2^32 - 1
fn parse_index(s: &str) -> Option<u32> {
    let bytes = s.as_bytes();
    if bytes.is_empty() || bytes.len() > 10 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    let n: u64 = s.parse().ok()?;
    if n <= MAX_INDEX as u64 { Some(n as u32) } else { None }
}

/// Number-to-string conversion for keys and display (JS `Number::toString`)
pub(crate) fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    // Integers below 2^53 are exact and already their shortest spelling.
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return itoa::Buffer::new().format(n as i64).to_string();
    }

    let (digits, exponent) = shortest_digits(n.abs());
    let k = digits.len() as i32;
    let mut out = String::with_capacity(digits.len() + 8);
    if n < 0.0 {
        out.push('-');
    }
    if k <= exponent && exponent <= 21 {
        out.push_str(&digits);
        out.extend(std::iter::repeat_n('0', (exponent - k) as usize));
    } else if 0 < exponent && exponent <= 21 {
        let (int, frac) = digits.split_at(exponent as usize);
        out.push_str(int);
        out.push('.');
        out.push_str(frac);
    } else if -6 < exponent && exponent <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat_n('0', (-exponent) as usize));
        out.push_str(&digits);
    } else {
        let (first, rest) = digits.split_at(1);
        out.push_str(first);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        let e = exponent - 1;
        out.push('e');
        out.push(if e < 0 { '-' } else { '+' });
        out.push_str(itoa::Buffer::new().format(e.unsigned_abs()));
    }
    out
}

/// Shortest round-trip significant digits of a finite positive `n`, and the
/// exponent `e` such that `n = 0.d1d2... * 10^e`
fn shortest_digits(n: f64) -> (String, i32) {
    let mut buffer = ryu::Buffer::new();
    let formatted = buffer.format_finite(n);
    let (mantissa, exp) = match formatted.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse::<i32>().unwrap_or(0)),
        None => (formatted, 0),
    };
    let point = mantissa.find('.').unwrap_or(mantissa.len()) as i32;
    let all: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let trimmed = all.trim_start_matches('0');
    let leading = (all.len() - trimmed.len()) as i32;
    let digits = trimmed.trim_end_matches('0').to_string();
    (digits, point - leading + exp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_strings_fold_to_index() {
        assert_eq!(PropertyKey::from("1"), PropertyKey::Index(1));
        assert_eq!(PropertyKey::from("0"), PropertyKey::Index(0));
        assert_eq!(PropertyKey::from("4294967294"), PropertyKey::Index(4294967294));
        assert!(!PropertyKey::from("01").is_index());
        assert!(!PropertyKey::from("1.0").is_index());
        assert!(!PropertyKey::from("-1").is_index());
        assert!(!PropertyKey::from("4294967295").is_index());
    }

    #[test]
    fn test_from_number() {
        assert_eq!(PropertyKey::from_number(3.0), PropertyKey::Index(3));
        assert_eq!(PropertyKey::from_number(-0.0), PropertyKey::Index(0));
        assert_eq!(PropertyKey::from_number(1.5).as_str(), Some("1.5"));
        assert_eq!(PropertyKey::from_number(-3.0).as_str(), Some("-3"));
        assert_eq!(PropertyKey::from_number(f64::INFINITY).as_str(), Some("Infinity"));
    }

    #[test]
    fn test_display_and_number() {
        assert_eq!(PropertyKey::Index(42).to_string(), "42");
        assert_eq!(PropertyKey::from("name").to_string(), "name");
        assert_eq!(PropertyKey::from("2.5").as_number(), Some(2.5));
        assert_eq!(PropertyKey::from("name").as_number(), None);
        assert_eq!(PropertyKey::Index(7).as_number(), Some(7.0));
    }

    #[test]
    fn test_large_and_small_number_keys() {
        let key = PropertyKey::from_number(1e20);
        assert_eq!(key.as_str(), Some("100000000000000000000"));
        assert_eq!(PropertyKey::from("100000000000000000000"), key);

        assert_eq!(PropertyKey::from_number(1e21).as_str(), Some("1e+21"));
        assert_eq!(PropertyKey::from_number(1e-6).as_str(), Some("0.000001"));
        assert_eq!(PropertyKey::from_number(1e-7).as_str(), Some("1e-7"));
        assert_eq!(PropertyKey::from_number(-1.5e-9).as_str(), Some("-1.5e-9"));
        assert_eq!(PropertyKey::from_number(1.25e25).as_str(), Some("1.25e+25"));
        assert_eq!(PropertyKey::from_number(4294967295.0).as_str(), Some("4294967295"));
        assert_eq!(PropertyKey::from_number(123.456).as_str(), Some("123.456"));
    }
}
