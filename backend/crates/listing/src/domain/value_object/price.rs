//! Price Value Object
//!
//! Analysis returns prices as display strings ("45", "1,200.50", "$80").
//! Persisted listings store integer minor units.

/// Parse a display price into minor units (cents)
///
/// Currency symbols, letters and whitespace only separate tokens; exactly
/// one numeric token must remain ("about 45" is 45, "45 to 60" is `None`).
/// A comma is a decimal mark when it is the only separator and is followed
/// by one or two digits ("12,50" is twelve fifty); otherwise commas group
/// thousands and every group after the first must have three digits.
/// Ranges, negative values, more than two decimals, or an empty string
/// yield `None`.
pub fn parse_price_cents(display: &str) -> Option<i64> {
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    for c in display.chars() {
        match c {
            '0'..='9' | '.' | ',' => current.push(c),
            '-' => return None,
            // words, spacing and currency symbols
            c if c.is_alphabetic() || c.is_whitespace() || !c.is_ascii() || c == '$' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => return None,
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    let [token] = tokens.as_slice() else {
        return None;
    };

    let (whole, fraction) = split_decimal(token)?;
    let whole = strip_grouping(whole)?;
    if fraction.contains([',', '.']) || fraction.len() > 2 || (whole.is_empty() && fraction.is_empty()) {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let fraction: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction.parse().ok()?,
    };

    whole.checked_mul(100)?.checked_add(fraction)
}

// Whole and fractional part, honouring a decimal comma
fn split_decimal(token: &str) -> Option<(&str, &str)> {
    if let Some((whole, fraction)) = token.split_once('.') {
        return Some((whole, fraction));
    }
    match token.split_once(',') {
        Some((whole, fraction))
            if !fraction.contains(',') && (1..=2).contains(&fraction.len()) =>
        {
            Some((whole, fraction))
        }
        _ => Some((token, "")),
    }
}

// "1,200,000" -> "1200000"; malformed grouping is rejected
fn strip_grouping(whole: &str) -> Option<String> {
    let mut groups = whole.split(',');
    let first = groups.next().unwrap_or_default();
    let mut digits = first.to_string();
    for group in groups {
        if first.is_empty() || first.len() > 3 || group.len() != 3 {
            return None;
        }
        digits.push_str(group);
    }
    Some(digits)
}

/// Render minor units for display ("$45", "$45.50")
pub fn format_price(cents: i64, currency: &str) -> String {
    let whole = cents / 100;
    let fraction = (cents % 100).abs();
    if fraction == 0 {
        format!("{currency}{whole}")
    } else {
        format!("{currency}{whole}.{fraction:02}")
    }
}
