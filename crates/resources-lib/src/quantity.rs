//! Resource quantity formatting and parsing
//!
//! CPU values are carried as millicores and memory values as bytes. The
//! `*_for_yaml` formatters produce the short form written into values files,
//! the display formatters are used for tables and know the `<none>` sentinel.

use thiserror::Error;

/// Sentinel shown for unset values
pub const NONE: &str = "<none>";

const KI: i64 = 1024;
const MI: i64 = KI * 1024;
const GI: i64 = MI * 1024;

/// Errors produced while parsing a quantity string
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,

    #[error("invalid quantity: {0}")]
    Invalid(String),

    #[error("negative quantity: {0}")]
    Negative(String),

    #[error("quantity out of range: {0}")]
    Overflow(String),
}

/// Format millicores for a values file (`500m`, `1.5`)
pub fn format_cpu_for_yaml(milli_cores: i64) -> String {
    if milli_cores >= 1000 {
        format!("{:.1}", milli_cores as f64 / 1000.0)
    } else {
        format!("{}m", milli_cores)
    }
}

/// Format bytes for a values file (`1.0Gi`, `512Mi`, raw bytes)
///
/// Never emits a `Ki` suffix.
pub fn format_memory_for_yaml(bytes: i64) -> String {
    if bytes >= GI {
        format!("{:.1}Gi", bytes as f64 / GI as f64)
    } else if bytes >= MI {
        format!("{:.0}Mi", bytes as f64 / MI as f64)
    } else {
        bytes.to_string()
    }
}

/// Format millicores for display
pub fn format_cpu(milli_cores: i64) -> String {
    if milli_cores == 0 {
        return NONE.to_string();
    }
    format_cpu_for_yaml(milli_cores)
}

/// Format bytes for display, including a `Ki` tier
pub fn format_memory(bytes: i64) -> String {
    match bytes {
        0 => NONE.to_string(),
        b if b >= GI => format!("{:.1}Gi", b as f64 / GI as f64),
        b if b >= MI => format!("{:.0}Mi", b as f64 / MI as f64),
        b if b >= KI => format!("{:.0}Ki", b as f64 / KI as f64),
        b => b.to_string(),
    }
}

/// Format a CPU/memory pair as `cpu/mem`, or `<none>` if both are unset
pub fn format_resource_values(cpu: i64, memory: i64) -> String {
    let cpu = format_cpu(cpu);
    let memory = format_memory(memory);

    if cpu == NONE && memory == NONE {
        return NONE.to_string();
    }
    format!("{}/{}", cpu, memory)
}

/// Parse a Kubernetes CPU quantity into millicores, rounding up
pub fn parse_cpu_millis(input: &str) -> Result<i64, QuantityError> {
    parse_scaled(input, 3)
}

/// Parse a Kubernetes memory quantity into bytes, rounding up
pub fn parse_memory_bytes(input: &str) -> Result<i64, QuantityError> {
    parse_scaled(input, 0)
}

/// Parsed `<digits>[.<digits>]<suffix>` form
struct Parsed {
    mantissa: i128,
    fraction_digits: i32,
    decimal_exponent: i32,
    binary_multiplier: i128,
}

fn parse_scaled(input: &str, unit_exponent: i32) -> Result<i64, QuantityError> {
    let parsed = parse_quantity(input)?;
    let overflow = || QuantityError::Overflow(input.to_string());

    let base = parsed
        .mantissa
        .checked_mul(parsed.binary_multiplier)
        .ok_or_else(overflow)?;
    let exponent = parsed.decimal_exponent + unit_exponent - parsed.fraction_digits;

    let value = if exponent >= 0 {
        let scale = 10i128.checked_pow(exponent as u32).ok_or_else(overflow)?;
        base.checked_mul(scale).ok_or_else(overflow)?
    } else {
        match 10i128.checked_pow((-exponent) as u32) {
            Some(divisor) => base.checked_add(divisor - 1).ok_or_else(overflow)? / divisor,
            // Anything this small rounds up to one unit
            None if base > 0 => 1,
            None => 0,
        }
    };

    i64::try_from(value).map_err(|_| overflow())
}

fn parse_quantity(input: &str) -> Result<Parsed, QuantityError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(QuantityError::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(QuantityError::Negative(input.to_string()));
    }
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let number_end = unsigned
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(unsigned.len());
    let (number, suffix) = unsigned.split_at(number_end);

    let invalid = || QuantityError::Invalid(input.to_string());

    let (whole, fraction) = match number.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (number, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if fraction.contains('.') {
        return Err(invalid());
    }

    let mut mantissa: i128 = 0;
    for digit in whole.chars().chain(fraction.chars()) {
        let d = digit.to_digit(10).ok_or_else(invalid)? as i128;
        mantissa = mantissa
            .checked_mul(10)
            .and_then(|m| m.checked_add(d))
            .ok_or_else(|| QuantityError::Overflow(input.to_string()))?;
    }

    let (decimal_exponent, binary_multiplier) = parse_suffix(suffix).ok_or_else(invalid)?;

    Ok(Parsed {
        mantissa,
        fraction_digits: fraction.len() as i32,
        decimal_exponent,
        binary_multiplier,
    })
}

/// Returns `(power of ten, binary multiplier)` for a quantity suffix
fn parse_suffix(suffix: &str) -> Option<(i32, i128)> {
    let binary = |power: u32| Some((0, 1024i128.pow(power)));

    match suffix {
        "" => Some((0, 1)),
        "n" => Some((-9, 1)),
        "u" => Some((-6, 1)),
        "m" => Some((-3, 1)),
        "k" => Some((3, 1)),
        "M" => Some((6, 1)),
        "G" => Some((9, 1)),
        "T" => Some((12, 1)),
        "P" => Some((15, 1)),
        "E" => Some((18, 1)),
        "Ki" => binary(1),
        "Mi" => binary(2),
        "Gi" => binary(3),
        "Ti" => binary(4),
        "Pi" => binary(5),
        "Ei" => binary(6),
        _ => {
            let exponent = suffix
                .strip_prefix('e')
                .or_else(|| suffix.strip_prefix('E'))?;
            let exponent: i32 = exponent.parse().ok()?;
            (-30..=30).contains(&exponent).then_some((exponent, 1))
        }
    }
}
