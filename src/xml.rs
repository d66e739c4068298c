//! Just enough XML handling for the fixed response shapes the repository
//! returns. Namespace prefixes vary between Fedora versions, so elements are
//! matched on their local name only.

use regex::Regex;

fn element_pattern(element: &str) -> Regex {
    // Element names come from call sites inside this crate, never from
    // remote input, so the pattern always compiles.
    let pattern = format!(
        r"<(?:[\w.-]+:)?{element}(?:\s[^>]*)?>([^<]*)</(?:[\w.-]+:)?{element}\s*>"
    );
    Regex::new(&pattern).unwrap()
}

/// Text content of every `<element>` in the document, in document order.
pub fn element_values(document: &str, element: &str) -> Vec<String> {
    element_pattern(element)
        .captures_iter(document)
        .map(|capture| capture[1].trim().to_string())
        .collect()
}

/// Number of `<element>` occurrences, counting container elements that carry
/// attributes or nested children (which `element_values` cannot see).
pub fn element_count(document: &str, element: &str) -> usize {
    let pattern = format!(r"<(?:[\w.-]+:)?{element}[\s>/]");
    Regex::new(&pattern).unwrap().find_iter(document).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULT_PAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<result xmlns="http://www.fedora.info/definitions/1/0/types/">
  <listSession><token>abc123</token><cursor>0</cursor></listSession>
  <resultList>
    <objectFields><pid>test:4</pid></objectFields>
    <objectFields><pid>test:5</pid></objectFields>
  </resultList>
</result>"#;

    #[test]
    fn extracts_every_pid_in_order() {
        assert_eq!(element_values(RESULT_PAGE, "pid"), vec!["test:4", "test:5"]);
    }

    #[test]
    fn extracts_the_session_token() {
        assert_eq!(element_values(RESULT_PAGE, "token"), vec!["abc123"]);
    }

    #[test]
    fn matches_namespace_prefixed_elements() {
        let prefixed = "<types:pid>test:9</types:pid>";
        assert_eq!(element_values(prefixed, "pid"), vec!["test:9"]);
    }

    #[test]
    fn ignores_attributes_on_the_element() {
        let with_attr = r#"<dsCreateDate attr="x">2019-01-01T00:00:00.000Z</dsCreateDate>"#;
        assert_eq!(
            element_values(with_attr, "dsCreateDate"),
            vec!["2019-01-01T00:00:00.000Z"]
        );
    }

    #[test]
    fn counts_container_elements() {
        let history = r#"<datastreamHistory>
            <datastreamProfile pid="test:1"><dsCreateDate>a</dsCreateDate></datastreamProfile>
            <datastreamProfile pid="test:1"><dsCreateDate>b</dsCreateDate></datastreamProfile>
        </datastreamHistory>"#;
        assert_eq!(element_count(history, "datastreamProfile"), 2);
    }

    #[test]
    fn no_matches_yield_an_empty_list() {
        assert!(element_values("<result/>", "pid").is_empty());
        assert_eq!(element_count("<result/>", "pid"), 0);
    }
}
