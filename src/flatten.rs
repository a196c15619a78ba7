use serde_json::Value;
use std::collections::BTreeMap;

/// Flattens a nested vendor record into scalar columns under a prefix.
///
/// Object keys append `.<key>` to the path and array elements `.<index>`;
/// each scalar lands at its accumulated path, and every dot then folds to an
/// underscore, so `{"a": {"b": 2}}` under prefix `zi` becomes `zi_a_b = 2`.
/// Empty objects and arrays produce no column at all. When two paths fold to
/// the same key the one walked last wins.
pub fn flatten_record(prefix: &str, record: &Value) -> BTreeMap<String, Value> {
    let mut flat = BTreeMap::new();
    walk(format!("{}.", prefix), record, &mut flat);
    flat
}

fn walk(path: String, value: &Value, flat: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(fields) => {
            for (key, child) in fields {
                walk(format!("{}{}.", path, key), child, flat);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                walk(format!("{}{}.", path, index), child, flat);
            }
        }
        scalar => {
            // the path always carries the separator just appended
            let key = path[..path.len() - 1].replace('.', "_");
            flat.insert(key, scalar.clone());
        }
    }
}
