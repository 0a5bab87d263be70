//! Extraction of structured data from model responses.
//!
//! Model responses often wrap JSON in markdown fences or surround it with
//! prose. Extraction tries the fenced block first, then falls back to the
//! first balanced object or array in the text.

/// Extract a JSON payload from a response that may contain extra text.
///
/// Returns `None` when no candidate JSON is present; the caller attributes
/// the failure to its provider.
///
/// # Examples
///
/// ```
/// use vasari_synthesis::extract_json;
///
/// let response = "Here you go:\n```json\n{\"summary\": \"ok\"}\n```";
/// assert_eq!(extract_json(response).unwrap(), "{\"summary\": \"ok\"}");
/// ```
pub fn extract_json(response: &str) -> Option<String> {
    if let Some(block) = fenced_block(response) {
        return Some(block);
    }

    // Prefer whichever balanced structure opens first.
    let object = balanced(response, '{', '}');
    let array = balanced(response, '[', ']');
    match (object, array) {
        (Some(o), Some(a)) => {
            let o_pos = response.find('{').unwrap_or(usize::MAX);
            let a_pos = response.find('[').unwrap_or(usize::MAX);
            Some(if a_pos < o_pos { a } else { o })
        }
        (Some(o), None) => Some(o),
        (None, Some(a)) => Some(a),
        (None, None) => None,
    }
}

fn fenced_block(response: &str) -> Option<String> {
    let start = response.find("```json").map(|i| i + "```json".len())?;
    let rest = &response[start..];
    let end = rest.find("```")?;
    let inner = rest[..end].trim();
    (!inner.is_empty()).then(|| inner.to_string())
}

fn balanced(text: &str, open: char, close: char) -> Option<String> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + offset + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_fenced_block() {
        let response = "Sure!\n```json\n{\"a\": 1}\n```\nAnything else?";
        assert_eq!(extract_json(response).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn extracts_bare_object_with_nested_braces() {
        let response = "The result is {\"outer\": {\"inner\": [1, 2]}} as requested.";
        assert_eq!(
            extract_json(response).unwrap(),
            "{\"outer\": {\"inner\": [1, 2]}}"
        );
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_the_scanner() {
        let response = r#"{"text": "a } inside a string"}"#;
        assert_eq!(extract_json(response).unwrap(), response);
    }

    #[test]
    fn array_that_opens_first_wins() {
        let response = "[{\"a\": 1}] trailing {\"b\": 2}";
        assert_eq!(extract_json(response).unwrap(), "[{\"a\": 1}]");
    }

    #[test]
    fn no_json_yields_none() {
        assert!(extract_json("plain prose, nothing structured").is_none());
    }
}
