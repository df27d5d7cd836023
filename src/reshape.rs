//! Row Reshaper: flat aliased rows to nested result objects.
//!
//! Joined to-one columns come back as `<relation>__<column>`; everything
//! before the first delimiter names the nested object.

use crate::value::{ResultObject, Row, Value};

/// Separates a relation name from a joined column in a column alias.
pub const NESTING_DELIMITER: &str = "__";

/// Column alias for `column` of the to-one relation `relation`.
pub fn nested_alias(relation: &str, column: &str) -> String {
    format!("{relation}{NESTING_DELIMITER}{column}")
}

/// Nest `group__field` keys under `group`; other keys are copied as-is.
pub fn unflatten(row: Row) -> ResultObject {
    let mut out = ResultObject::with_capacity(row.len());

    for (key, value) in row {
        let Some((group, field)) = key.split_once(NESTING_DELIMITER) else {
            out.insert(key, value.into());
            continue;
        };

        let slot = out
            .entry(group.to_string())
            .or_insert_with(|| Value::Object(ResultObject::new()));
        // A plain column named like the group loses to the nested object.
        if !matches!(slot, Value::Object(_)) {
            *slot = Value::Object(ResultObject::new());
        }
        if let Value::Object(nested) = slot {
            nested.insert(field.to_string(), value.into());
        }
    }

    out
}

/// [`unflatten`] every row.
pub fn unflatten_list(rows: Vec<Row>) -> Vec<ResultObject> {
    rows.into_iter().map(unflatten).collect()
}
