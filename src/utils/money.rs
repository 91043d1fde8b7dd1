use std::num::ParseFloatError;

/// Convert a decimal amount in major units (`"12.50"`) to minor units (`1250.0`).
///
/// The multiplication happens in binary floating point, so amounts like `"19.99"` come out as
/// `1998.9999999999998`. Callers that need an integer round the result themselves.
pub fn amount_to_cents(amount: &str) -> Result<f64, ParseFloatError> {
    Ok(amount.trim().parse::<f64>()? * 100.0)
}

/// Render minor units as a decimal amount with a currency suffix, e.g. `12.50 USD`.
pub fn format_cents(cents: i64, currency: &str) -> String {
    let formatted = format!("{:.2}", cents as f64 / 100.0);
    if currency.is_empty() {
        formatted
    } else {
        format!("{} {}", formatted, currency)
    }
}
