// models/src/queries.rs

//! Query and mutation vocabulary understood by every document store engine.
//!
//! Evaluation lives here rather than in the engines so that the in-memory and
//! sled stores order and filter identically.

use std::cmp::Ordering;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{CareError, CareResult};

/// A stored document: its id plus its JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Document { id: id.into(), data }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Decodes the body into `T`, injecting the document id as `id` when the
    /// body does not carry one.
    pub fn decode<T: DeserializeOwned>(&self) -> CareResult<T> {
        let mut data = self.data.clone();
        if let Value::Object(map) = &mut data {
            map.entry("id").or_insert_with(|| Value::String(self.id.clone()));
        }
        serde_json::from_value(data).map_err(CareError::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOp {
    /// Field equals the value.
    Eq,
    /// Field is an array containing the value.
    ArrayContains,
    /// Field is greater than or equal to the value.
    Gte,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn matches(&self, data: &Value) -> bool {
        let Some(actual) = data.get(&self.field) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => actual == &self.value,
            FilterOp::ArrayContains => actual
                .as_array()
                .map_or(false, |items| items.iter().any(|item| item == &self.value)),
            FilterOp::Gte => {
                type_rank(actual) == type_rank(&self.value)
                    && compare_values(actual, &self.value) != Ordering::Less
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A conjunction of filters with optional ordering and limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter { field: field.to_string(), op: FilterOp::Eq, value: value.into() });
        self
    }

    pub fn where_array_contains(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op: FilterOp::ArrayContains,
            value: value.into(),
        });
        self
    }

    pub fn where_gte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter { field: field.to_string(), op: FilterOp::Gte, value: value.into() });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy { field: field.to_string(), direction });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, data: &Value) -> bool {
        self.filters.iter().all(|filter| filter.matches(data))
    }

    /// Filters, orders and truncates `documents`. Ties on the order field,
    /// and unordered queries, fall back to document id so the result is
    /// deterministic.
    pub fn apply(&self, documents: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut matched: Vec<Document> =
            documents.into_iter().filter(|doc| self.matches(&doc.data)).collect();

        matched.sort_by(|a, b| {
            let primary = match &self.order_by {
                Some(order) => {
                    let left = a.data.get(&order.field).unwrap_or(&Value::Null);
                    let right = b.data.get(&order.field).unwrap_or(&Value::Null);
                    match order.direction {
                        Direction::Asc => compare_values(left, right),
                        Direction::Desc => compare_values(right, left),
                    }
                }
                None => Ordering::Equal,
            };
            primary.then_with(|| a.id.cmp(&b.id))
        });

        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}

/// A single-field mutation applied by `DocumentStore::update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldUpdate {
    /// Overwrites the field.
    Set(String, Value),
    /// Appends each value not already present in the array field, creating
    /// the array when the field is missing.
    ArrayUnion(String, Vec<Value>),
}

impl FieldUpdate {
    pub fn set(field: &str, value: impl Into<Value>) -> Self {
        FieldUpdate::Set(field.to_string(), value.into())
    }

    pub fn array_union(field: &str, values: Vec<Value>) -> Self {
        FieldUpdate::ArrayUnion(field.to_string(), values)
    }
}

/// Applies `updates` in order to a document body.
pub fn apply_updates(data: &mut Value, updates: &[FieldUpdate]) -> CareResult<()> {
    let map: &mut Map<String, Value> = data
        .as_object_mut()
        .ok_or_else(|| CareError::Storage("document body is not an object".to_string()))?;

    for update in updates {
        match update {
            FieldUpdate::Set(field, value) => {
                map.insert(field.clone(), value.clone());
            }
            FieldUpdate::ArrayUnion(field, values) => {
                let entry = map.entry(field.clone()).or_insert_with(|| Value::Array(Vec::new()));
                if !entry.is_array() {
                    *entry = Value::Array(Vec::new());
                }
                if let Value::Array(items) = entry {
                    for value in values {
                        if !items.contains(value) {
                            items.push(value.clone());
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: by type first, then by value.
pub fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                let ord = compare_values(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            a.len().cmp(&b.len())
        }
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs() -> Vec<Document> {
        vec![
            Document::new("b", json!({"patientId": "p1", "date": "2024-06-02T09:00"})),
            Document::new("a", json!({"patientId": "p1", "date": "2024-06-01T10:00"})),
            Document::new("c", json!({"patientId": "p2", "date": "2024-06-03T10:00"})),
            Document::new("d", json!({"patientId": "p1", "date": "2024-06-02T09:00"})),
        ]
    }

    #[test]
    fn filters_and_orders_descending() {
        let query = Query::new().where_eq("patientId", "p1").order_by("date", Direction::Desc);
        let ids: Vec<_> = query.apply(docs()).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["b", "d", "a"]);
    }

    #[test]
    fn gte_compares_strings_lexicographically() {
        let query = Query::new().where_gte("date", "2024-06-02T00:00").order_by("date", Direction::Asc);
        let ids: Vec<_> = query.apply(docs()).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["b", "d", "c"]);
    }

    #[test]
    fn array_contains_matches_members_only() {
        let filter = Filter {
            field: "assignedDoctors".into(),
            op: FilterOp::ArrayContains,
            value: json!("d1"),
        };
        assert!(filter.matches(&json!({"assignedDoctors": ["d0", "d1"]})));
        assert!(!filter.matches(&json!({"assignedDoctors": []})));
        assert!(!filter.matches(&json!({"name": "no array"})));
    }

    #[test]
    fn limit_truncates_after_ordering() {
        let query = Query::new().order_by("date", Direction::Asc).limit(1);
        let result = query.apply(docs());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "a");
    }

    #[test]
    fn array_union_skips_existing_values() {
        let mut data = json!({"assignedDoctors": ["d1"]});
        apply_updates(
            &mut data,
            &[FieldUpdate::array_union("assignedDoctors", vec![json!("d1"), json!("d2")])],
        )
        .unwrap();
        assert_eq!(data["assignedDoctors"], json!(["d1", "d2"]));
    }

    #[test]
    fn array_union_creates_missing_field() {
        let mut data = json!({"name": "Pat"});
        apply_updates(&mut data, &[FieldUpdate::array_union("doctorNames", vec![json!("house")])])
            .unwrap();
        assert_eq!(data["doctorNames"], json!(["house"]));
    }

    #[test]
    fn decode_injects_document_id() {
        #[derive(Deserialize)]
        struct Named {
            id: String,
            name: String,
        }
        let doc = Document::new("xyz", json!({"name": "Pat"}));
        let named: Named = doc.decode().unwrap();
        assert_eq!(named.id, "xyz");
        assert_eq!(named.name, "Pat");
    }
}
