//! # Fixed-Point Decimals
//!
//! Decimal text <-> scaled integer conversion.
//!
//! Assessment values and risk weights arrive as decimal text ("0.40", "1.2").
//! They are converted to scaled integers (millionths, thousandths) so the
//! CORE never touches floating-point arithmetic.

/// Parse non-negative decimal text into an integer scaled by `10^digits`.
///
/// - Accepts `"1"`, `"0.4"`, `".4"`, `"1."` and surrounding whitespace
/// - Digits beyond `digits` are rounded half-up
/// - Rejects signs, exponents, empty input and anything non-numeric
///
/// Returns `None` on malformed input or overflow.
#[must_use]
pub fn parse_scaled(text: &str, digits: u32) -> Option<u64> {
    let text = text.trim();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, f),
        None => (text, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let scale = 10u64.checked_pow(digits)?;

    let mut value: u64 = 0;
    for b in int_part.bytes() {
        value = value.checked_mul(10)?.checked_add(u64::from(b - b'0'))?;
    }
    value = value.checked_mul(scale)?;

    let mut place = scale;
    let mut round_up = false;
    for (i, b) in frac_part.bytes().enumerate() {
        let digit = u64::from(b - b'0');
        if (i as u32) < digits {
            place /= 10;
            value = value.checked_add(digit.checked_mul(place)?)?;
        } else {
            // Only the first dropped digit decides half-up rounding.
            round_up = digit >= 5;
            break;
        }
    }

    if round_up {
        value = value.checked_add(1)?;
    }
    Some(value)
}

/// Format a scaled integer back into decimal text.
///
/// Trailing zeros are trimmed but at least one fractional digit is kept:
/// `format_scaled(400_000, 6) == "0.4"`, `format_scaled(1_000, 3) == "1.0"`.
#[must_use]
pub fn format_scaled(value: u64, digits: u32) -> String {
    let scale = 10u64.pow(digits);
    let int_part = value / scale;
    let frac_part = value % scale;

    let frac = format!("{:0width$}", frac_part, width = digits as usize);
    let trimmed = frac.trim_end_matches('0');

    if trimmed.is_empty() {
        format!("{}.0", int_part)
    } else {
        format!("{}.{}", int_part, trimmed)
    }
}

// =============================================================================
// TESTS
// =============================================================================
