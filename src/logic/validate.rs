use crate::logic::query_string::{QueryMap, QueryValue};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::OnceLock;

/// One failed check, addressed by field path.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub path: String,
    pub message: String,
}

/// Terminal validation failure. Requests carrying one never reach the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub issues: Vec<Issue>,
    /// The offending input, echoed back for diagnostics.
    pub input: Option<Value>,
}

impl Rejection {
    pub fn new(issues: Vec<Issue>, input: Option<Value>) -> Self {
        Self { issues, input }
    }

    /// Renders `Path: field, Error: message; ...`, optionally suffixed with
    /// the literal JSON of the offending input.
    pub fn details(&self) -> String {
        let formatted = self
            .issues
            .iter()
            .map(|issue| format!("Path: {}, Error: {}", issue.path, issue.message))
            .collect::<Vec<_>>()
            .join("; ");

        match &self.input {
            Some(value) => format!("{} (Current value: {})", formatted, value),
            None => formatted,
        }
    }
}

fn key_value_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^=]+=[^=]+$").unwrap())
}

fn include_list_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([a-zA-Z0-9]+(\.[a-zA-Z0-9]+)*(,[a-zA-Z0-9]+(\.[a-zA-Z0-9]+)*)*)?$").unwrap()
    })
}

/// Format accepted for a single query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamFormat {
    /// Any scalar string.
    Any,
    /// A single `key=value` pair.
    KeyValue,
    /// Comma-separated dot-paths of relation names.
    IncludeList,
}

impl ParamFormat {
    fn check(&self, value: &str) -> Option<&'static str> {
        match self {
            ParamFormat::Any => None,
            ParamFormat::KeyValue => {
                (!key_value_pattern().is_match(value)).then_some("Must be in key=value format")
            }
            ParamFormat::IncludeList => (!include_list_pattern().is_match(value))
                .then_some("Must be a comma-separated list of tables and sub-tables"),
        }
    }
}

/// Declared shape of a resource's list-query parameters.
#[derive(Debug, Clone, Copy)]
pub struct QuerySchema {
    pub filter: ParamFormat,
    pub sort: ParamFormat,
    pub include: ParamFormat,
}

/// Strict schema used by the category resource.
pub const STRICT_QUERY: QuerySchema = QuerySchema {
    filter: ParamFormat::KeyValue,
    sort: ParamFormat::KeyValue,
    include: ParamFormat::IncludeList,
};

/// Lenient schema used by the taxonomy and variety resources.
pub const LENIENT_QUERY: QuerySchema = QuerySchema {
    filter: ParamFormat::Any,
    sort: ParamFormat::Any,
    include: ParamFormat::Any,
};

fn query_map_to_json(params: &QueryMap) -> Value {
    let map = params
        .iter()
        .map(|(key, value)| {
            let json = match value {
                QueryValue::Scalar(s) => Value::String(s.clone()),
                QueryValue::Nested(inner) => query_map_to_json(inner),
            };
            (key.clone(), json)
        })
        .collect::<serde_json::Map<_, _>>();
    Value::Object(map)
}

/// Validates the parsed query parameters of a list/read request. Unknown
/// parameters are ignored; declared ones must be scalar and match their
/// format.
pub fn validate_query_params(schema: &QuerySchema, params: &QueryMap) -> Result<(), Rejection> {
    let mut issues = Vec::new();

    for (name, format) in [
        ("filter", schema.filter),
        ("sort", schema.sort),
        ("include", schema.include),
    ] {
        let Some(value) = params.get(name) else {
            continue;
        };
        match value {
            QueryValue::Nested(_) => issues.push(Issue {
                path: name.to_string(),
                message: "Expected string, received object".to_string(),
            }),
            QueryValue::Scalar(value) => {
                if let Some(message) = format.check(value) {
                    issues.push(Issue {
                        path: name.to_string(),
                        message: message.to_string(),
                    });
                }
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Rejection::new(issues, Some(query_map_to_json(params))))
    }
}

/// Validates a path identifier: coerces the raw string to an integer and
/// rejects non-numeric, non-integer and non-positive values.
pub fn validate_id(raw: &str) -> Result<i64, Rejection> {
    let reject = |message: &str| {
        Rejection::new(
            vec![Issue {
                path: "id".to_string(),
                message: message.to_string(),
            }],
            Some(Value::String(raw.to_string())),
        )
    };

    match raw.trim().parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        Ok(_) => Err(reject("Number must be greater than or equal to 1")),
        Err(_) => {
            if raw.trim().parse::<f64>().map(f64::is_finite).unwrap_or(false) {
                Err(reject("Expected integer, received float"))
            } else {
                Err(reject("Expected number, received nan"))
            }
        }
    }
}

/// Kind of value a body field must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Non-empty string.
    Text,
    /// String, possibly empty (optional descriptions).
    FreeText,
    /// Array of strings.
    TextList,
    /// Positive integer.
    Id,
    /// Array of positive integers.
    IdList,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Message reported when the field is missing or empty.
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct BodySchema {
    pub fields: &'static [FieldRule],
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check_field(rule: &FieldRule, value: &Value, issues: &mut Vec<Issue>) {
    let issue = |message: String| Issue {
        path: rule.name.to_string(),
        message,
    };

    match rule.kind {
        FieldKind::Text => match value {
            Value::String(s) if !s.is_empty() => {}
            Value::String(_) => issues.push(issue(rule.message.to_string())),
            other => issues.push(issue(format!(
                "Expected string, received {}",
                json_type_name(other)
            ))),
        },
        FieldKind::FreeText => {
            if !matches!(value, Value::String(_)) {
                issues.push(issue(format!(
                    "Expected string, received {}",
                    json_type_name(value)
                )));
            }
        }
        FieldKind::TextList => match value {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if !matches!(item, Value::String(_)) {
                        issues.push(Issue {
                            path: format!("{}.{}", rule.name, index),
                            message: format!("Expected string, received {}", json_type_name(item)),
                        });
                    }
                }
            }
            other => issues.push(issue(format!(
                "Expected array, received {}",
                json_type_name(other)
            ))),
        },
        FieldKind::Id => check_id_value(rule.name, value, issues),
        FieldKind::IdList => match value {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    check_id_value(&format!("{}.{}", rule.name, index), item, issues);
                }
            }
            other => issues.push(issue(format!(
                "Expected array, received {}",
                json_type_name(other)
            ))),
        },
    }
}

fn check_id_value(path: &str, value: &Value, issues: &mut Vec<Issue>) {
    let issue = |message: String| Issue {
        path: path.to_string(),
        message,
    };
    match value.as_i64() {
        Some(id) if id >= 1 => {}
        Some(_) => issues.push(issue(
            "Number must be greater than or equal to 1".to_string(),
        )),
        None if matches!(value, Value::Number(_)) => {
            issues.push(issue("Expected integer, received float".to_string()))
        }
        None => issues.push(issue(format!(
            "Expected number, received {}",
            json_type_name(value)
        ))),
    }
}

/// Validates a request body against its declared schema and, on success,
/// substitutes the typed payload for the raw input. Unknown keys are ignored.
pub fn validate_body<T: DeserializeOwned>(
    schema: &BodySchema,
    body: &Value,
) -> Result<T, Rejection> {
    let Some(object) = body.as_object() else {
        return Err(Rejection::new(
            vec![Issue {
                path: String::new(),
                message: format!("Expected object, received {}", json_type_name(body)),
            }],
            Some(body.clone()),
        ));
    };

    let mut issues = Vec::new();
    for rule in schema.fields {
        match object.get(rule.name) {
            None | Some(Value::Null) => {
                if rule.required {
                    issues.push(Issue {
                        path: rule.name.to_string(),
                        message: rule.message.to_string(),
                    });
                }
            }
            Some(value) => check_field(rule, value, &mut issues),
        }
    }

    if !issues.is_empty() {
        return Err(Rejection::new(issues, Some(body.clone())));
    }

    serde_json::from_value(body.clone()).map_err(|err| {
        Rejection::new(
            vec![Issue {
                path: String::new(),
                message: err.to_string(),
            }],
            Some(body.clone()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::query_string::parse_query;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn valid_ids_pass_coerced() {
        assert_eq!(validate_id("42"), Ok(42));
        assert_eq!(validate_id("1"), Ok(1));
    }

    #[test]
    fn bad_ids_are_rejected() {
        for (raw, expected) in [
            ("abc", "Expected number, received nan"),
            ("1.5", "Expected integer, received float"),
            ("0", "Number must be greater than or equal to 1"),
            ("-3", "Number must be greater than or equal to 1"),
        ] {
            let rejection = validate_id(raw).unwrap_err();
            assert_eq!(rejection.issues[0].message, expected, "input {raw:?}");
        }
    }

    #[test]
    fn rejection_details_lists_paths_and_echoes_input() {
        let rejection = validate_id("abc").unwrap_err();
        assert_eq!(
            rejection.details(),
            "Path: id, Error: Expected number, received nan (Current value: \"abc\")"
        );
    }

    #[test]
    fn strict_query_schema_requires_key_value_pairs() {
        let params = parse_query("filter=name", false);
        let rejection = validate_query_params(&STRICT_QUERY, &params).unwrap_err();
        assert_eq!(rejection.issues[0].path, "filter");
        assert_eq!(rejection.issues[0].message, "Must be in key=value format");

        let params = parse_query("filter=name=Herb&sort=name=asc&include=varieties", false);
        assert!(validate_query_params(&STRICT_QUERY, &params).is_ok());
    }

    #[test]
    fn strict_query_schema_checks_include_shape() {
        let params = parse_query("include=a..b", false);
        let rejection = validate_query_params(&STRICT_QUERY, &params).unwrap_err();
        assert_eq!(rejection.issues[0].path, "include");
    }

    #[test]
    fn lenient_query_schema_accepts_any_scalar() {
        let params = parse_query("filter=anything&sort=whatever", false);
        assert!(validate_query_params(&LENIENT_QUERY, &params).is_ok());
    }

    #[test]
    fn nested_parameters_are_rejected_as_objects() {
        let params = parse_query("filter[name]=Herb", false);
        let rejection = validate_query_params(&LENIENT_QUERY, &params).unwrap_err();
        assert_eq!(
            rejection.issues[0].message,
            "Expected string, received object"
        );
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        name: String,
    }

    const PAYLOAD_SCHEMA: BodySchema = BodySchema {
        fields: &[FieldRule {
            name: "name",
            kind: FieldKind::Text,
            required: true,
            message: "Name is required",
        }],
    };

    #[test]
    fn body_validation_substitutes_typed_payload() {
        let payload: Payload = validate_body(&PAYLOAD_SCHEMA, &json!({"name": "Herb"})).unwrap();
        assert_eq!(
            payload,
            Payload {
                name: "Herb".to_string()
            }
        );
    }

    #[test]
    fn missing_and_empty_required_fields_are_reported() {
        let rejection = validate_body::<Payload>(&PAYLOAD_SCHEMA, &json!({})).unwrap_err();
        assert_eq!(rejection.issues[0].message, "Name is required");

        let rejection =
            validate_body::<Payload>(&PAYLOAD_SCHEMA, &json!({"name": ""})).unwrap_err();
        assert_eq!(rejection.issues[0].message, "Name is required");
    }

    #[test]
    fn wrong_types_are_reported_with_the_received_type() {
        let rejection = validate_body::<Payload>(&PAYLOAD_SCHEMA, &json!({"name": 7})).unwrap_err();
        assert_eq!(
            rejection.issues[0].message,
            "Expected string, received number"
        );

        let rejection = validate_body::<Payload>(&PAYLOAD_SCHEMA, &json!([1, 2])).unwrap_err();
        assert_eq!(
            rejection.issues[0].message,
            "Expected object, received array"
        );
    }

    #[test]
    fn id_list_fields_check_every_element() {
        #[derive(Debug, Deserialize)]
        struct Links {
            #[serde(rename = "categoryIds")]
            #[allow(dead_code)]
            category_ids: Option<Vec<i64>>,
        }

        const SCHEMA: BodySchema = BodySchema {
            fields: &[FieldRule {
                name: "categoryIds",
                kind: FieldKind::IdList,
                required: false,
                message: "Category ids are required",
            }],
        };

        assert!(validate_body::<Links>(&SCHEMA, &json!({})).is_ok());
        assert!(validate_body::<Links>(&SCHEMA, &json!({"categoryIds": [1, 2]})).is_ok());

        let rejection =
            validate_body::<Links>(&SCHEMA, &json!({"categoryIds": [1, 0]})).unwrap_err();
        assert_eq!(rejection.issues[0].path, "categoryIds.1");
    }
}
