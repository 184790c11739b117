use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority, then
/// fall back to the first field of the result object.
pub fn print_minimal(value: &Value) {
    // Unwrap the computation envelope
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // Single projections nest their headline figures under "summary"
    let scope = result
        .as_object()
        .and_then(|m| m.get("summary"))
        .unwrap_or(result);

    if let Value::Object(map) = scope {
        // A crossover search may legitimately answer "no age"
        if let Some(val) = map.get("crossover_age") {
            if val.is_null() {
                println!("no crossover");
            } else {
                println!("{}", format_minimal(val));
            }
            return;
        }

        let priority_keys = [
            "net_balance",
            "fund_net_monthly",
            "tax_savings",
            "lifetime_tax_savings",
            "gross_balance",
        ];
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        // Fall back to the first field
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(scope));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
