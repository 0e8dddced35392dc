//! Logging utilities
//!
//! Shared formatting helpers for outbound call and error logging

use crate::utils::error::ProblemDetail;
use reqwest::header::HeaderMap;

/// Placeholder rendered for an empty header map
pub const NO_HEADERS: &str = "<No Headers>";

/// Longest body preview written to the log
pub const MAX_BODY_LOG_LEN: usize = 2000;

/// Render headers as `name: v1,v2, other: v3`
///
/// Repeated header names are folded into one entry.
pub fn format_headers(headers: &HeaderMap) -> String {
    if headers.is_empty() {
        return NO_HEADERS.to_string();
    }

    headers
        .keys()
        .map(|name| {
            let values: Vec<&str> = headers
                .get_all(name)
                .iter()
                .map(|v| v.to_str().unwrap_or("<binary>"))
                .collect();
            format!("{}: {}", name, values.join(","))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Truncate a body for logging with a note about original length
pub fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_BODY_LOG_LEN {
        return body.to_string();
    }

    let mut cut = MAX_BODY_LOG_LEN;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... ({} chars truncated)", &body[..cut], body.len() - cut)
}

/// Render a problem for the error log
pub fn problem_log_message(problem: &ProblemDetail) -> String {
    let mut message = String::from("ProblemDetail: ");

    if !problem.title.trim().is_empty() {
        message.push_str(&format!("Title={}, ", problem.title));
    }
    if !problem.detail.trim().is_empty() {
        message.push_str(&format!("Detail={}, ", problem.detail));
    }
    message.push_str(&format!("Status={}, ", problem.status));
    if let Some(instance) = &problem.instance {
        message.push_str(&format!("Instance={}", instance));
    }

    message.trim().trim_end_matches(',').to_string()
}

/// Render a status code and message pair for the error log
pub fn status_error_message(status_code: Option<u16>, message: &str) -> String {
    let mut out = String::from("Error Occurred: ");

    if let Some(code) = status_code {
        out.push_str(&format!("HTTP Status Code={}, ", code));
    }
    if !message.trim().is_empty() {
        out.push_str(&format!("Message={}", message));
    }

    out.trim().trim_end_matches(',').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn problem(title: &str, detail: &str, instance: Option<&str>) -> ProblemDetail {
        ProblemDetail {
            problem_type: "about:blank".to_string(),
            title: title.to_string(),
            status: 404,
            detail: detail.to_string(),
            instance: instance.map(str::to_string),
        }
    }

    #[test]
    fn test_format_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(format_headers(&headers), NO_HEADERS);

        headers.insert("accept", HeaderValue::from_static("application/json"));
        headers.append("x-tag", HeaderValue::from_static("a"));
        headers.append("x-tag", HeaderValue::from_static("b"));

        let rendered = format_headers(&headers);
        assert!(rendered.contains("accept: application/json"));
        assert!(rendered.contains("x-tag: a,b"));
    }

    #[test]
    fn test_problem_log_message() {
        let message = problem_log_message(&problem("Resource Not Found", "Cannot find a Post with id 9", None));
        assert_eq!(
            message,
            "ProblemDetail: Title=Resource Not Found, Detail=Cannot find a Post with id 9, Status=404"
        );

        let message = problem_log_message(&problem("", "", Some("/posts/9")));
        assert_eq!(message, "ProblemDetail: Status=404, Instance=/posts/9");
    }

    #[test]
    fn test_status_error_message() {
        assert_eq!(
            status_error_message(Some(502), "Bad gateway"),
            "Error Occurred: HTTP Status Code=502, Message=Bad gateway"
        );
        assert_eq!(status_error_message(None, ""), "Error Occurred:");
    }

    #[test]
    fn test_truncate_body() {
        let short = "[]";
        assert_eq!(truncate_body(short), "[]");

        let long = "x".repeat(MAX_BODY_LOG_LEN + 10);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("(10 chars truncated)"));
    }
}
