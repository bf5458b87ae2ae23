//! Amount parsing and display formatting
//!
//! Upstream exports deliver numeric columns as loosely typed text: blank cells,
//! `"12.50"`, `"  7"`, occasionally `"3 units"`. Parsing follows the lenient
//! prefix rule (longest leading float literal wins, trailing text ignored) and
//! anything unparseable counts as zero. NaN never leaves this module.

/// Parse the longest leading float literal of `text`.
///
/// Leading whitespace is skipped. Returns `None` when no numeric prefix exists.
/// Accepts an optional sign, digits with an optional fractional part, an
/// optional exponent, and `Infinity`.
pub fn parse_float(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }

    if s[end..].starts_with("Infinity") {
        let negative = s.starts_with('-');
        return Some(if negative { f64::NEG_INFINITY } else { f64::INFINITY });
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
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
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

    s[..end].parse::<f64>().ok()
}

/// Coerce loosely typed text to a number for summation.
///
/// Unparseable input, NaN and infinities all become `0.0`, so sums of
/// coerced values stay finite.
pub fn to_number(text: &str) -> f64 {
    match parse_float(text) {
        Some(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Format an amount with two decimals and comma thousands separators.
///
/// Zero, NaN and non-finite values render as `"0.00"`.
pub fn format_amount(amount: f64) -> String {
    if amount == 0.0 || !amount.is_finite() {
        return "0.00".to_string();
    }

    // Round the exact binary value; only true half-cent ties go away from zero
    let abs = amount.abs();
    let fixed = match half_cent_tie(abs) {
        Some(cents) => format!("{:.2}", cents / 100.0),
        None => format!("{:.2}", abs),
    };
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let is_zero = !fixed.bytes().any(|b| matches!(b, b'1'..=b'9'));
    let sign = if amount < 0.0 && !is_zero { "-" } else { "" };
    format!("{}{}.{}", sign, group_thousands(whole), frac)
}

/// Cents rounded up when `abs` lies exactly halfway between two cents.
///
/// `abs * 200` is an odd integer exactly when `abs` is such a tie; the fused
/// multiply-add recovers the product's rounding error to prove exactness.
fn half_cent_tie(abs: f64) -> Option<f64> {
    let doubled = abs * 200.0;
    let exact = abs.mul_add(200.0, -doubled) == 0.0;
    if exact && doubled.fract() == 0.0 && doubled % 2.0 == 1.0 {
        Some((doubled + 1.0) / 2.0)
    } else {
        None
    }
}

/// Format loosely typed text (see [`parse_float`]); blank or garbage yields `"0.00"`.
pub fn format_amount_text(text: &str) -> String {
    format_amount(parse_float(text).unwrap_or(0.0))
}

/// Insert a comma every three digits from the right.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Normalize -0.0 to 0.0 for cleaner display
pub fn normalize_zero(val: f64) -> f64 {
    if val == 0.0 { 0.0 } else { val }
}
