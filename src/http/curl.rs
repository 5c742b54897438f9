//! curl command rendering for documentation
//!
//! Produces the multi-line command shown in transcripts:
//!
//! ```text
//! curl -s -X POST "http://localhost:6006/products:create" \
//!     -H "Content-Type: application/json" \
//!     -d '
//!       {
//!         "title": "Widget"
//!       }
//!     ' | jq .
//! ```

use serde_json::Value;

use crate::suite::TestCase;

/// Indentation applied to every line of a JSON body
const BODY_INDENT: &str = "      ";

/// Render the curl command for a resolved test case
pub fn render(base_url: &str, prefix: &str, test: &TestCase) -> String {
    let url = format!("{}{}{}", base_url, prefix, test.endpoint);
    let mut lines = vec![format!("curl -s -X {} \"{}\"", test.method, url)];

    if let Some(headers) = &test.headers {
        for (key, value) in headers {
            lines.push(format!("    -H \"{key}: {value}\""));
        }
    }

    match &test.body {
        Some(body @ (Value::Object(_) | Value::Array(_))) => {
            let pretty = serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
            let indented = pretty
                .lines()
                .map(|line| format!("{BODY_INDENT}{line}"))
                .collect::<Vec<_>>()
                .join("\n");
            lines.push(format!("    -d '\n{indented}\n    '"));
        }
        Some(Value::String(text)) => lines.push(format!("    -d '{text}'")),
        Some(other) => lines.push(format!("    -d '{other}'")),
        None => {}
    }

    let last = lines.len() - 1;
    for line in &mut lines[..last] {
        line.push_str(" \\");
    }

    lines.join("\n") + " | jq ."
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::Method;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_render_simple_get() {
        let test = TestCase::new(Method::Get, "/health");
        assert_eq!(
            render("http://localhost:6006", "", &test),
            "curl -s -X GET \"http://localhost:6006/health\" | jq ."
        );
    }

    #[test]
    fn test_render_headers_and_json_body() {
        let test = TestCase::new(Method::Post, "/products:create")
            .with_header("Authorization", "Bearer $ACCESS_TOKEN")
            .with_header("Content-Type", "application/json")
            .with_body(json!({"title": "Widget", "tags": ["a"]}));

        let expected = [
            "curl -s -X POST \"http://localhost:6006/api/products:create\" \\",
            "    -H \"Authorization: Bearer $ACCESS_TOKEN\" \\",
            "    -H \"Content-Type: application/json\" \\",
            "    -d '",
            "      {",
            "        \"title\": \"Widget\",",
            "        \"tags\": [",
            "          \"a\"",
            "        ]",
            "      }",
            "    ' | jq .",
        ]
        .join("\n");

        assert_eq!(render("http://localhost:6006", "/api", &test), expected);
    }

    #[test]
    fn test_render_scalar_body() {
        let test = TestCase::new(Method::Put, "/raw").with_body(json!("plain text"));
        assert_eq!(
            render("http://h", "", &test),
            "curl -s -X PUT \"http://h/raw\" \\\n    -d 'plain text' | jq ."
        );
    }
}
