use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of fields a record can hold. The serialized form is the
/// field id used in csv headers and in the stored column preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Age,
    Role,
    Department,
    Location,
}

pub struct ColumnDescriptor {
    pub field: Field,
    pub label: &'static str,
}

/// Column catalog in display order of the column dialog.
pub const COLUMNS: [ColumnDescriptor; 6] = [
    ColumnDescriptor { field: Field::Name, label: "Name" },
    ColumnDescriptor { field: Field::Email, label: "Email" },
    ColumnDescriptor { field: Field::Age, label: "Age" },
    ColumnDescriptor { field: Field::Role, label: "Role" },
    ColumnDescriptor { field: Field::Department, label: "Department" },
    ColumnDescriptor { field: Field::Location, label: "Location" },
];

pub const DEFAULT_VISIBLE: [Field; 4] = [Field::Name, Field::Email, Field::Age, Field::Role];

impl Field {
    pub fn id(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Age => "age",
            Field::Role => "role",
            Field::Department => "department",
            Field::Location => "location",
        }
    }

    pub fn label(self) -> &'static str {
        COLUMNS
            .iter()
            .find(|c| c.field == self)
            .map(|c| c.label)
            .unwrap_or_else(|| self.id())
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Field::Age)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Field {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        COLUMNS
            .iter()
            .map(|c| c.field)
            .find(|f| f.id() == s)
            .ok_or(())
    }
}

/// A field value. Numbers keep the text they were read from, the number
/// is only used for ordering.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64, String),
}

impl Value {
    pub fn number(n: f64) -> Self {
        // Whole numbers print without a trailing ".0"
        let text = if n.fract() == 0.0 && n.abs() < 1e15 {
            format!("{}", n as i64)
        } else {
            format!("{n}")
        };
        Value::Number(n, text)
    }

    /// Builds the value for `field` from raw text. Numeric fields keep text
    /// that does not parse as a finite number as text.
    pub fn parse(field: Field, raw: &str) -> Self {
        if field.is_numeric()
            && let Ok(n) = raw.trim().parse::<f64>()
            && n.is_finite()
        {
            return Value::Number(n, raw.to_string());
        }
        Value::Text(raw.to_string())
    }

    /// Numbers sort before text, numbers numerically, text lexically.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Number(a, _), Value::Number(b, _)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Number(..), Value::Text(_)) => Ordering::Less,
            (Value::Text(_), Value::Number(..)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) | Value::Number(_, s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub id: usize,
    values: BTreeMap<Field, Value>,
    /// Csv columns that are not part of the catalog, in header order.
    pub extra: Vec<(String, String)>,
}

impl Record {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with(mut self, field: Field, value: Value) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: Field, value: Value) {
        self.values.insert(field, value);
    }

    pub fn get(&self, field: Field) -> Option<&Value> {
        self.values.get(&field)
    }

    /// String form used for searching, rendering and export. Absent is empty.
    pub fn display(&self, field: Field) -> String {
        self.get(field).map(|v| v.to_string()).unwrap_or_default()
    }
}

pub fn seed_records() -> Vec<Record> {
    vec![
        Record::new(1)
            .with(Field::Name, Value::Text("Vinay".into()))
            .with(Field::Email, Value::Text("vinay9887@mail.com".into()))
            .with(Field::Age, Value::number(24.0))
            .with(Field::Role, Value::Text("Admin".into()))
            .with(Field::Department, Value::Text("IT".into()))
            .with(Field::Location, Value::Text("Delhi".into())),
        Record::new(2)
            .with(Field::Name, Value::Text("Shivam".into()))
            .with(Field::Email, Value::Text("shivamt0099@mail.com".into()))
            .with(Field::Age, Value::number(21.0))
            .with(Field::Role, Value::Text("User".into()))
            .with(Field::Department, Value::Text("HR".into()))
            .with(Field::Location, Value::Text("Bihar".into())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn field_ids_round_trip_through_from_str() {
        for column in COLUMNS.iter() {
            assert_eq!(column.field.id().parse::<Field>(), Ok(column.field));
        }
        assert!("id".parse::<Field>().is_err());
        assert!("Name".parse::<Field>().is_err());
    }

    #[test]
    fn labels_come_from_catalog() {
        assert_eq!(Field::Department.label(), "Department");
        assert_eq!(Field::Age.label(), "Age");
    }

    #[test]
    fn age_parses_as_number_and_keeps_bad_text() {
        assert_eq!(Value::parse(Field::Age, "24"), Value::number(24.0));
        assert_eq!(
            Value::parse(Field::Age, " 7 "),
            Value::Number(7.0, " 7 ".into())
        );
        assert_eq!(
            Value::parse(Field::Age, "unknown"),
            Value::Text("unknown".into())
        );
        assert_eq!(Value::parse(Field::Name, "42"), Value::Text("42".into()));
    }

    #[test]
    fn numbers_display_without_fraction_when_whole() {
        assert_eq!(Value::number(24.0).to_string(), "24");
        assert_eq!(Value::number(2.5).to_string(), "2.5");
    }

    #[test]
    fn parsed_numbers_keep_their_source_text() {
        for raw in ["007", "1e3", "24.0", "-0"] {
            let value = Value::parse(Field::Age, raw);
            assert!(matches!(value, Value::Number(..)), "{raw}");
            assert_eq!(value.to_string(), raw);
        }
        assert_eq!(
            Value::parse(Field::Age, "007").compare(&Value::number(8.0)),
            Ordering::Less
        );
    }

    #[test]
    fn non_finite_numbers_stay_text() {
        for raw in ["Infinity", "inf", "NaN", "-inf"] {
            assert_eq!(Value::parse(Field::Age, raw), Value::Text(raw.into()), "{raw}");
        }
    }

    #[test]
    fn mixed_values_order_numbers_first() {
        let n = Value::number(100.0);
        let t = Value::Text("5".into());
        assert_eq!(n.compare(&t), Ordering::Less);
        assert_eq!(t.compare(&n), Ordering::Greater);
        assert_eq!(Value::number(9.0).compare(&Value::number(10.0)), Ordering::Less);
        assert_eq!(
            Value::Text("b".into()).compare(&Value::Text("a".into())),
            Ordering::Greater
        );
    }

    #[test]
    fn absent_fields_display_empty() {
        let record = Record::new(1).with(Field::Name, Value::Text("A".into()));
        assert_eq!(record.display(Field::Location), "");
        assert_eq!(record.display(Field::Name), "A");
    }
}
