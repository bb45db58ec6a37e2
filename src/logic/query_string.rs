use indexmap::IndexMap;
use std::borrow::Cow;

/// Parsed query string: decoded keys to decoded values, preserving the order
/// keys first appeared on the wire. Multi-key sort precedence depends on that
/// order, so a plain HashMap is not enough here.
pub type QueryMap = IndexMap<String, QueryValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Scalar(String),
    Nested(QueryMap),
}

impl QueryValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            QueryValue::Scalar(s) => Some(s),
            QueryValue::Nested(_) => None,
        }
    }
}

/// Look up a top-level scalar parameter, ignoring nested values.
pub fn scalar_param<'a>(params: &'a QueryMap, key: &str) -> Option<&'a str> {
    params.get(key).and_then(QueryValue::as_scalar)
}

fn decode(raw: &str) -> String {
    // Undecodable input (invalid UTF-8 escapes) is kept verbatim rather than
    // failing the whole request.
    match urlencoding::decode(raw) {
        Ok(Cow::Borrowed(s)) => s.to_string(),
        Ok(Cow::Owned(s)) => s,
        Err(_) => raw.to_string(),
    }
}

/// Converts a raw query string into a `QueryMap`.
///
/// Pairs are split on `&`, each pair on the first `=`; a key without `=`
/// yields an empty-string value. Bracket-nested keys such as `a[b][c]=v`
/// produce nested maps. When the same prefix is first bound to a scalar and
/// later used as a nesting level, the scalar is silently overwritten
/// (last-write-wins, lenient on purpose).
pub fn parse_query(query: &str, ignore_query_prefix: bool) -> QueryMap {
    let mut params = QueryMap::new();

    if query.is_empty() {
        return params;
    }

    let query = if ignore_query_prefix {
        query.strip_prefix('?').unwrap_or(query)
    } else {
        query
    };

    for pair in query.split('&') {
        let (key, value) = match pair.split_once('=') {
            Some((k, v)) => (k, v),
            None => (pair, ""),
        };
        let key = decode(key);
        let value = decode(value);

        if key.contains('[') {
            let segments: Vec<&str> = key
                .split(|c| c == '[' || c == ']')
                .filter(|s: &&str| !s.is_empty())
                .collect();
            insert_nested(&mut params, &segments, value);
        } else {
            params.insert(key, QueryValue::Scalar(value));
        }
    }

    params
}

fn insert_nested(params: &mut QueryMap, segments: &[&str], value: String) {
    let mut current = params;
    for (index, segment) in segments.iter().enumerate() {
        if index == segments.len() - 1 {
            current.insert(segment.to_string(), QueryValue::Scalar(value));
            return;
        }
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| QueryValue::Nested(QueryMap::new()));
        if !matches!(entry, QueryValue::Nested(_)) {
            *entry = QueryValue::Nested(QueryMap::new());
        }
        current = match entry {
            QueryValue::Nested(map) => map,
            QueryValue::Scalar(_) => unreachable!(),
        };
    }
}
