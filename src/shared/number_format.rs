use serde_json::Value;

/// Render a number like JavaScript's `String(n)`: shortest round-trip
/// digits, integral values without a fraction, and exponent form
/// (`1e-7`, `1e+21`) below 1e-6 or from 1e21 up.
pub fn format_number(value: f64) -> String {
    let magnitude = value.abs();
    if value == 0.0 {
        // -0.0 prints as "0"
        return "0".to_string();
    }
    if !value.is_finite() {
        return format!("{}", value);
    }
    if !(1e-6..1e21).contains(&magnitude) {
        let text = format!("{:e}", value);
        return match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => text,
        };
    }
    if value.fract() == 0.0 && magnitude < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Render a JSON array of numbers without spaces, e.g. `[6,148,72]`
pub fn format_number_array(values: &[f64]) -> String {
    let inner = values
        .iter()
        .map(|v| format_number(*v))
        .collect::<Vec<_>>()
        .join(",");
    format!("[{}]", inner)
}

/// Render a scalar prediction value for a CSV cell
pub fn format_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format_number(f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
