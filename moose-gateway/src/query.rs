//! Query-string parsing into a repeated-key map:
//! `?a=1&a=2&b=3` becomes `{"a": ["1", "2"], "b": ["3"]}`, order of
//! appearance preserved.

use std::collections::BTreeMap;

pub type QueryParams = BTreeMap<String, Vec<String>>;

pub fn parse_query(raw: Option<&str>) -> QueryParams {
    let mut params: QueryParams = BTreeMap::new();
    let Some(raw) = raw else { return params };
    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        params.entry(key.into_owned()).or_default().push(value.into_owned());
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_keys_become_arrays_in_order() {
        let params = parse_query(Some("a=1&a=2&b=3"));
        assert_eq!(params.get("a"), Some(&vec!["1".to_string(), "2".to_string()]));
        assert_eq!(params.get("b"), Some(&vec!["3".to_string()]));
    }

    #[test]
    fn absent_query_string_is_empty() {
        assert!(parse_query(None).is_empty());
    }

    #[test]
    fn single_key_becomes_single_element_array() {
        let params = parse_query(Some("version=2"));
        assert_eq!(params.get("version"), Some(&vec!["2".to_string()]));
    }
}
