//! Price Parser
//!
//! Turns Argentine formatted amounts into numbers.
//!
//! # Format
//! ```text
//! "$1.234,56"  →  1234.56     ("." groups thousands, "," marks decimals)
//! "12,5%"      →  12.5
//! ```
//!
//! Anything that does not start with a number after cleanup yields `NaN`.

/// Parse a scraped price string
///
/// # Cleanup steps
/// 1. Drop the `$` marker
/// 2. Drop every thousands separator (`.`)
/// 3. Turn the decimal comma into a period
/// 4. Drop the `%` marker
/// 5. Trim whitespace
///
/// The numeric prefix of the result is parsed; trailing text is ignored.
///
/// # Example
/// ```rust
/// assert_eq!(parse_price(Some("$1.234,56")), 1234.56);
/// assert!(parse_price(None).is_nan());
/// ```
pub fn parse_price(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return f64::NAN;
    };

    let cleaned = raw
        .replacen('$', "", 1)
        .replace('.', "")
        .replacen(',', ".", 1)
        .replacen('%', "", 1);

    parse_leading_float(cleaned.trim())
}

/// Parse the longest prefix of `text` that forms a decimal float
fn parse_leading_float(text: &str) -> f64 {
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    if text[end..].starts_with("Infinity") {
        let negative = bytes.first() == Some(&b'-');
        return if negative { f64::NEG_INFINITY } else { f64::INFINITY };
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if frac_digits > 0 || int_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return f64::NAN;
    }

    // Exponent only counts when it carries digits
    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end.min(bytes.len())..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    text[..end].parse().unwrap_or(f64::NAN)
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
