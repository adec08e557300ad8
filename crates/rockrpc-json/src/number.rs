use std::fmt;

use serde_json::Number;

/// A JSON number kept as its validated decimal lexeme
///
/// The lexeme is locale independent and converted on demand, so integers
/// wider than `f64` precision survive a read/write cycle untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JsonNumber(String);

impl JsonNumber {
    /// Validate `text` as a finite decimal number
    ///
    /// Leading `+`, redundant leading zeros and a bare leading or trailing `.`
    /// are tolerated on input and normalised away, so the kept lexeme is
    /// always valid JSON.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty()
            || !text
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        {
            return None;
        }
        let text = normalize(text)?;
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(Self(text)),
            _ => None,
        }
    }

    /// `None` for NaN and infinities
    pub fn from_f64(value: f64) -> Option<Self> {
        value.is_finite().then(|| Self(value.to_string()))
    }

    pub fn from_f32(value: f32) -> Option<Self> {
        value.is_finite().then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_f64(&self) -> f64 {
        self.0.parse().unwrap_or_default()
    }

    pub fn to_f32(&self) -> Option<f32> {
        let value: f32 = self.0.parse().ok()?;
        value.is_finite().then_some(value)
    }

    /// True when the value has no fractional part
    pub fn is_integer(&self) -> bool {
        self.to_i128().is_some()
    }

    fn to_i128(&self) -> Option<i128> {
        if let Ok(value) = self.0.parse::<i128>() {
            return Some(value);
        }
        let value = self.to_f64();
        // 2^63 bounds keep the cast exact for every representable integral float
        (value.fract() == 0.0 && value.abs() < 9.223_372_036_854_775_808e18).then(|| value as i128)
    }

    /// Range-checked conversion to any integer type
    pub fn to_integer<T: TryFrom<i128>>(&self) -> Option<T> {
        T::try_from(self.to_i128()?).ok()
    }

    pub fn to_i64(&self) -> Option<i64> {
        self.to_integer()
    }

    pub fn to_u64(&self) -> Option<u64> {
        self.to_integer()
    }

    pub fn to_serde(&self) -> Number {
        if let Ok(value) = self.0.parse::<i64>() {
            return Number::from(value);
        }
        if let Ok(value) = self.0.parse::<u64>() {
            return Number::from(value);
        }
        Number::from_f64(self.to_f64()).unwrap_or_else(|| Number::from(0))
    }

    pub fn from_serde(number: &Number) -> Self {
        Self(number.to_string())
    }
}

fn normalize(text: &str) -> Option<String> {
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.strip_prefix('+').unwrap_or(text)),
    };
    let (mantissa, exponent) = body.split_at(body.find(['e', 'E']).unwrap_or(body.len()));
    let (integral, fraction) = match mantissa.split_once('.') {
        Some((integral, fraction)) => (integral, fraction),
        None => (mantissa, ""),
    };
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if !digits(integral) || !digits(fraction) || integral.len() + fraction.len() == 0 {
        return None;
    }
    let integral = match integral.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    let point = if fraction.is_empty() { "" } else { "." };
    Some(format!("{sign}{integral}{point}{fraction}{exponent}"))
}

impl fmt::Display for JsonNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for JsonNumber {
                fn from(value: $ty) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_decimal_forms() {
        assert!(JsonNumber::parse("123").is_some());
        assert!(JsonNumber::parse("-1.5e3").is_some());
        assert_eq!(JsonNumber::parse("+7").unwrap().as_str(), "7");
        assert_eq!(JsonNumber::parse(".5").unwrap().as_str(), "0.5");
        assert_eq!(JsonNumber::parse("-.5E2").unwrap().as_str(), "-0.5E2");
        assert_eq!(JsonNumber::parse("3.").unwrap().as_str(), "3");
        assert_eq!(JsonNumber::parse("0007").unwrap().as_str(), "7");
        assert_eq!(JsonNumber::parse("-01").unwrap().as_str(), "-1");
        assert_eq!(JsonNumber::parse("00.5").unwrap().as_str(), "0.5");
        assert_eq!(JsonNumber::parse("000").unwrap().as_str(), "0");
        assert_eq!(JsonNumber::parse("0.0").unwrap().as_str(), "0.0");
        assert_eq!(JsonNumber::parse("010e02").unwrap().as_str(), "10e02");
    }

    #[test]
    fn test_parse_rejects_non_numbers() {
        assert!(JsonNumber::parse("").is_none());
        assert!(JsonNumber::parse("abc").is_none());
        assert!(JsonNumber::parse("inf").is_none());
        assert!(JsonNumber::parse("NaN").is_none());
        assert!(JsonNumber::parse("1-2").is_none());
        assert!(JsonNumber::parse("0x10").is_none());
        assert!(JsonNumber::parse(".").is_none());
        assert!(JsonNumber::parse("-").is_none());
        assert!(JsonNumber::parse("+-5").is_none());
        assert!(JsonNumber::parse("1.2.3").is_none());
        assert!(JsonNumber::parse("1e").is_none());
    }

    #[test]
    fn test_integer_conversions_are_range_checked() {
        let number = JsonNumber::parse("300").unwrap();
        assert_eq!(number.to_integer::<i32>(), Some(300));
        assert_eq!(number.to_integer::<u8>(), None);
        assert_eq!(JsonNumber::parse("-1").unwrap().to_u64(), None);
        assert_eq!(JsonNumber::parse("2.0").unwrap().to_i64(), Some(2));
        assert_eq!(JsonNumber::parse("2.5").unwrap().to_i64(), None);
        assert_eq!(JsonNumber::parse("1e3").unwrap().to_i64(), Some(1000));
    }

    #[test]
    fn test_float_formatting_is_invariant() {
        assert_eq!(JsonNumber::from_f64(1.5).unwrap().as_str(), "1.5");
        assert_eq!(JsonNumber::from_f64(123456789.0).unwrap().as_str(), "123456789");
        assert!(JsonNumber::from_f64(f64::NAN).is_none());
        assert!(JsonNumber::from_f64(f64::INFINITY).is_none());
    }

    #[test]
    fn test_serde_number_conversion() {
        assert_eq!(JsonNumber::from(5).to_serde(), Number::from(5));
        assert_eq!(
            JsonNumber::parse("1.25").unwrap().to_serde(),
            Number::from_f64(1.25).unwrap()
        );
        let big = JsonNumber::from(u64::MAX);
        assert_eq!(big.to_serde(), Number::from(u64::MAX));
    }
}
