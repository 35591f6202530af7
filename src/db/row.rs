//! Result rows with a shared column header.
//!
//! Every row in a result set points at the same column-name vector through an
//! `Rc`, so fetching a thousand rows stores the header once. Lookup by name is
//! a linear scan over the header; result sets are narrow enough that this
//! beats hashing in practice.

use std::rc::Rc;

use serde::ser::SerializeMap;

use super::value::Value;

/// One fetched row: column names shared across the result set, values owned.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Rc<Vec<String>>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Rc<Vec<String>>, values: Vec<Value>) -> Self {
        Row { columns, values }
    }

    /// Column names, in select order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Value by column name; `None` when the column is not in the header.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.columns.iter().position(|c| c == name)?;
        self.values.get(index)
    }

    /// Value by position in select order.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl serde::Serialize for Row {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.columns.iter().zip(&self.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Row {
        let header = Rc::new(vec!["id".to_string(), "name".to_string()]);
        Row::new(header, vec![Value::Int(7), Value::Str("Trillian".into())])
    }

    #[test]
    fn test_get_by_name_and_index() {
        let row = sample();
        assert_eq!(row.get("id"), Some(&Value::Int(7)));
        assert_eq!(row.get("name"), Some(&Value::Str("Trillian".into())));
        assert_eq!(row.get_index(0), Some(&Value::Int(7)));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.get_index(9), None);
    }

    #[test]
    fn test_header_is_shared_between_rows() {
        let header = Rc::new(vec!["id".to_string()]);
        let _a = Row::new(Rc::clone(&header), vec![Value::Int(1)]);
        let _b = Row::new(Rc::clone(&header), vec![Value::Int(2)]);
        assert_eq!(Rc::strong_count(&header), 3);
    }

    #[test]
    fn test_serializes_as_object() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(json, r#"{"id":7,"name":"Trillian"}"#);
    }
}
