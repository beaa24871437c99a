//! Sign-prefixed number text whose lexical order follows numeric order.
//!
//! A value is written as a sign character followed by exactly `digits`
//! decimal major digits. Non-negative values are zero-padded (`+0042`);
//! negative values are written as their offset from `10^digits` (`-9958` for
//! -42), so that larger negatives sort lower. Floats keep their fraction
//! after the major digits: with three digits `12.34` is `+012.34` and
//! `-12.34` is `-987.66`.
//!
//! Ordering holds among values of the same sign whose magnitude is below
//! `10^digits`. Because `+` sorts before `-`, every non-negative value sorts
//! ahead of every negative one. Values outside the range still round-trip;
//! they are simply rendered wider.

/// Largest supported digit count. `10^20` covers the full `u64` range.
pub const MAX_SORTABLE_DIGITS: u32 = 20;

/// Render `value` with the given number of major digits.
pub fn format_sortable(value: i128, digits: u32) -> String {
    let width = digits as usize;
    if value >= 0 {
        format!("+{value:0width$}")
    } else {
        let offset = 10i128.pow(digits) + value;
        format!("-{offset:0width$}")
    }
}

/// Parse text produced by [`format_sortable`] with the same digit count.
pub fn parse_sortable(text: &str, digits: u32) -> Option<i128> {
    let mut chars = text.chars();
    let sign = chars.next()?;
    let rest = chars.as_str();
    if rest.is_empty() {
        return None;
    }
    match sign {
        '+' if rest.bytes().all(|b| b.is_ascii_digit()) => rest.parse().ok(),
        '-' => {
            let offset: i128 = rest.parse().ok()?;
            offset.checked_sub(10i128.pow(digits))
        }
        _ => None,
    }
}

/// Render a finite float with the given number of major digits.
///
/// The negative offset is computed on the shortest decimal text of the
/// value, so `-12.34` becomes exactly `-987.66`. Returns `None` for NaN and
/// infinities.
pub fn format_sortable_float(value: f64, digits: u32) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let magnitude = value.abs().to_string();
    let (int, frac) = split_decimal(&magnitude)?;
    let width = digits as usize;

    if value >= 0.0 {
        return Some(join("+", int, frac, width));
    }
    let (wrapped, int, frac) = complement(int, frac, digits);
    let sign = if wrapped { "--" } else { "-" };
    Some(join(sign, &int, &frac, width))
}

/// Parse text produced by [`format_sortable_float`] with the same digit
/// count.
pub fn parse_sortable_float(text: &str, digits: u32) -> Option<f64> {
    if let Some(rest) = text.strip_prefix('+') {
        let (int, frac) = split_decimal(rest)?;
        return decimal_text("", int, frac).parse().ok();
    }
    let rest = text.strip_prefix('-')?;
    let (int, frac) = match rest.strip_prefix('-') {
        Some(wrapped) => {
            let (int, frac) = split_decimal(wrapped)?;
            exceed(int, frac, digits)
        }
        None => {
            let (int, frac) = split_decimal(rest)?;
            match complement(int, frac, digits) {
                (false, int, frac) => (int, frac),
                (true, ..) => return None,
            }
        }
    };
    decimal_text("-", &int, &frac).parse().ok()
}

/// Split plain decimal text into integer and fraction digits.
fn split_decimal(text: &str) -> Option<(&str, &str)> {
    let (int, frac) = text.split_once('.').unwrap_or((text, ""));
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if int.is_empty() || !digits(int) || !digits(frac) || (text.contains('.') && frac.is_empty()) {
        return None;
    }
    Some((int, frac))
}

fn join(sign: &str, int: &str, frac: &str, width: usize) -> String {
    let mut out = format!("{sign}{int:0>width$}");
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn decimal_text(sign: &str, int: &str, frac: &str) -> String {
    let int = if int.is_empty() { "0" } else { int };
    if frac.is_empty() {
        format!("{sign}{int}")
    } else {
        format!("{sign}{int}.{frac}")
    }
}

/// `10^digits - x`. When `x` is larger the result is `x - 10^digits`,
/// flagged `true`.
fn complement(int: &str, frac: &str, digits: u32) -> (bool, String, String) {
    let (x, power) = aligned(int, frac, digits);
    let (wrapped, diff) = if x <= power {
        (false, subtract(&power, &x))
    } else {
        (true, subtract(&x, &power))
    };
    let (int, frac) = render(&diff, frac.len());
    (wrapped, int, frac)
}

/// `10^digits + x`.
fn exceed(int: &str, frac: &str, digits: u32) -> (String, String) {
    let (x, power) = aligned(int, frac, digits);
    render(&add(&x, &power), frac.len())
}

/// `x` and `10^digits` as equal-length digit vectors at the scale of `frac`.
fn aligned(int: &str, frac: &str, digits: u32) -> (Vec<u8>, Vec<u8>) {
    let power = digits as usize;
    let width = int.len().max(power + 1);

    let mut x = vec![0u8; width - int.len()];
    x.extend(int.bytes().chain(frac.bytes()).map(|b| b - b'0'));

    let mut p = vec![0u8; width + frac.len()];
    p[width - power - 1] = 1;
    (x, p)
}

/// `a - b` for equal-length digit vectors with `a >= b`.
fn subtract(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; a.len()];
    let mut borrow = 0u8;
    for i in (0..a.len()).rev() {
        let (mut d, sub) = (a[i], b[i] + borrow);
        borrow = u8::from(d < sub);
        if borrow == 1 {
            d += 10;
        }
        out[i] = d - sub;
    }
    out
}

/// `a + b` for equal-length digit vectors, one digit wider.
fn add(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; a.len() + 1];
    let mut carry = 0u8;
    for i in (0..a.len()).rev() {
        let sum = a[i] + b[i] + carry;
        out[i + 1] = sum % 10;
        carry = sum / 10;
    }
    out[0] = carry;
    out
}

/// Integer digits without leading zeros and fraction digits without
/// trailing zeros.
fn render(digits: &[u8], scale: usize) -> (String, String) {
    let (int, frac) = digits.split_at(digits.len() - scale);
    let text = |ds: &[u8]| ds.iter().map(|d| char::from(b'0' + d)).collect::<String>();
    let int = text(int).trim_start_matches('0').to_string();
    let frac = text(frac).trim_end_matches('0').to_string();
    (int, frac)
}
