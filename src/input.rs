use serde_json::Value;

/// Parse a user-supplied value as a finite number.
///
/// Accepts JSON numbers and numeric strings (surrounding whitespace allowed).
/// Blank strings, `null`, booleans, containers and anything non-finite yield
/// `None`; callers decide what "absent" means at their boundary.
pub fn parse_number(raw: &Value) -> Option<f64> {
    let n = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                return None;
            }
            t.parse::<f64>().ok()?
        }
        _ => return None,
    };
    if n.is_finite() {
        Some(n)
    } else {
        None
    }
}

pub fn parse_number_or(raw: Option<&Value>, default: f64) -> f64 {
    raw.and_then(parse_number).unwrap_or(default)
}

/// Text fields: strings pass through, numbers are rendered, everything else is absent.
pub fn parse_text(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Id fields: like text, but blank ids are treated as missing.
pub fn parse_id(raw: Option<&Value>) -> Option<String> {
    let s = parse_text(raw?)?;
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

pub fn clamp_unit(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}
