//! Permissive numeric input coercion.
//!
//! Quantities, thresholds and prices arrive as free text from input forms.
//! They are never rejected: anything that does not start with a decimal
//! literal becomes `0`, and negative amounts clamp to `0`.

/// Coerce raw numeric input into a non-negative amount.
///
/// Rule:
/// - leading whitespace is ignored;
/// - the longest leading decimal literal is used (`"12.5kg"` → `12.5`);
/// - no literal, or a non-finite value, yields `0`;
/// - negative values clamp to `0`.
pub fn coerce_amount(raw: &str) -> f64 {
    let trimmed = raw.trim_start();
    let literal = leading_decimal_literal(trimmed);
    if literal.is_empty() {
        return 0.0;
    }

    match literal.parse::<f64>() {
        Ok(value) => clamp_non_negative(value),
        Err(_) => 0.0,
    }
}

/// Clamp an amount to `>= 0`, mapping NaN and infinities to `0`.
pub fn clamp_non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// `max(0, quantity + delta)`, saturating at `f64::MAX` on overflow.
///
/// Returns `None` when `delta` is not finite; such a delta has no
/// meaningful result and must not be written.
pub fn adjusted_amount(quantity: f64, delta: f64) -> Option<f64> {
    if !delta.is_finite() {
        return None;
    }
    let sum = quantity + delta;
    if sum == f64::INFINITY {
        return Some(f64::MAX);
    }
    Some(clamp_non_negative(sum))
}

/// Longest prefix of `s` shaped like `[+-]digits[.digits][(e|E)[+-]digits]`.
///
/// Returns an empty slice when the prefix holds no digit at all.
fn leading_decimal_literal(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        let frac_digits = frac_end - frac_start;
        if digits + frac_digits > 0 {
            digits += frac_digits;
            end = frac_end;
        }
    }

    if digits == 0 {
        return "";
    }

    // Exponent only counts when at least one digit follows it.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    &s[..end]
}
