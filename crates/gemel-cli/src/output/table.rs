use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            // The computation envelope holds the primary data under "result"
            if let Some(result) = map.get("result") {
                print_result(result, map);
            } else {
                print_value(value);
            }
        }
        _ => print_value(value),
    }
}

fn print_result(result: &Value, envelope: &serde_json::Map<String, Value>) {
    print_value(result);

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Scalar fields become a Field/Value table; nested objects and arrays of
/// objects are printed as their own sections underneath.
fn print_value(value: &Value) {
    match value {
        Value::Object(map) => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            let mut scalar_count = 0;
            let mut sections: Vec<(&String, &Value)> = Vec::new();

            for (key, val) in map {
                match val {
                    Value::Array(arr) if arr.first().map_or(false, |v| v.is_object()) => {
                        sections.push((key, val));
                    }
                    Value::Object(_) => {
                        sections.push((key, val));
                    }
                    _ => {
                        builder.push_record([key.as_str(), &format_value(val)]);
                        scalar_count += 1;
                    }
                }
            }

            if scalar_count > 0 {
                println!("{}", Table::from(builder));
            }
            for (key, val) in sections {
                println!("\n{}:", key);
                match val {
                    Value::Array(arr) => print_rows(arr),
                    other => print_value(other),
                }
            }
        }
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", value),
    }
}

fn print_rows(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    // Column headers come from the keys of the first object
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        map.get(h.as_str())
                            .map(format_value)
                            .unwrap_or_default()
                    })
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
