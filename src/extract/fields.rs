//! Field maps and their recursive evaluation
//!
//! A field map binds output field names to XPath expressions. The raw
//! configuration shape (string vs nested object) is resolved once at load
//! time into [`FieldSpec`]; evaluation walks the compiled map against a
//! document without ever mutating it.

use crate::dom::{self, Document, Xpath, XpathItem};
use crate::extract::ExtractError;
use crate::ConfigError;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One structured output unit: field name to string, list of strings, or
/// list of nested records
pub type Record = Map<String, Value>;

/// A compiled field map, ordered by field name
pub type FieldMap = BTreeMap<String, FieldSpec>;

/// A compiled field definition
pub enum FieldSpec {
    /// A plain XPath: one match yields a scalar string, any other match
    /// count yields a list of strings
    Scalar(Xpath),

    /// A nested record list, evaluated once per context match (or once
    /// against the enclosing scope when no context is given)
    Nested {
        context: Option<Xpath>,
        fields: FieldMap,
    },
}

/// Compiles a raw field map from the configuration
///
/// Accepted shapes per field: an XPath string, or an object carrying a
/// `fields` map and an optional `context` XPath. Anything else is a fatal
/// configuration error.
pub fn compile_field_map(raw: &Map<String, Value>) -> Result<FieldMap, ConfigError> {
    let mut compiled = FieldMap::new();

    for (name, value) in raw {
        let spec = match value {
            Value::String(expr) => FieldSpec::Scalar(Xpath::compile(expr)?),

            Value::Object(object) => {
                let fields = object
                    .get("fields")
                    .ok_or_else(|| {
                        ConfigError::FieldMap(format!(
                            "field '{}' is an object without a 'fields' map",
                            name
                        ))
                    })?
                    .as_object()
                    .ok_or_else(|| {
                        ConfigError::FieldMap(format!(
                            "'fields' of '{}' must be an object",
                            name
                        ))
                    })?;

                let context = match object.get("context") {
                    None => None,
                    Some(Value::String(expr)) => Some(Xpath::compile(expr)?),
                    Some(_) => {
                        return Err(ConfigError::FieldMap(format!(
                            "'context' of '{}' must be an XPath string",
                            name
                        )))
                    }
                };

                FieldSpec::Nested {
                    context,
                    fields: compile_field_map(fields)?,
                }
            }

            other => {
                return Err(ConfigError::FieldMap(format!(
                    "field '{}' must be an XPath string or an object with 'fields', got {}",
                    name,
                    json_type_name(other)
                )))
            }
        };
        compiled.insert(name.clone(), spec);
    }

    Ok(compiled)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Evaluates a field map against `scope` (or the document root)
///
/// Produces one record; nested specs recurse, collecting one sub-record
/// per context match in document order.
pub fn evaluate<'t>(
    document: &'t Document,
    fields: &FieldMap,
    scope: Option<&XpathItem<'t>>,
) -> Result<Record, ExtractError> {
    let mut record = Record::new();

    for (name, spec) in fields {
        match spec {
            FieldSpec::Scalar(xpath) => {
                let items = select_in_scope(xpath, document, scope)?;
                let value = if items.len() == 1 {
                    Value::String(dom::item_text(document, &items[0]))
                } else {
                    Value::Array(
                        items
                            .iter()
                            .map(|item| Value::String(dom::item_text(document, item)))
                            .collect(),
                    )
                };
                record.insert(name.clone(), value);
            }

            FieldSpec::Nested { context, fields } => {
                let mut rows = Vec::new();
                match context {
                    Some(context) => {
                        for node in select_in_scope(context, document, scope)? {
                            rows.push(Value::Object(evaluate(document, fields, Some(&node))?));
                        }
                    }
                    None => rows.push(Value::Object(evaluate(document, fields, scope)?)),
                }
                record.insert(name.clone(), Value::Array(rows));
            }
        }
    }

    Ok(record)
}

fn select_in_scope<'t>(
    xpath: &Xpath,
    document: &'t Document,
    scope: Option<&XpathItem<'t>>,
) -> Result<Vec<XpathItem<'t>>, ExtractError> {
    let items = match scope {
        Some(node) => xpath.select_from(document, node)?,
        None => xpath.select(document)?,
    };
    Ok(items)
}
