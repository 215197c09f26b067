//! MIME type constants and content-type shorthands.

/// `text/plain; charset=utf-8`
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
/// `text/html; charset=utf-8`
pub const TEXT_HTML: &str = "text/html; charset=utf-8";
/// `application/json; charset=utf-8`
pub const APPLICATION_JSON: &str = "application/json; charset=utf-8";
/// `application/xml; charset=utf-8`
pub const APPLICATION_XML: &str = "application/xml; charset=utf-8";
/// `application/javascript; charset=utf-8`
pub const APPLICATION_JAVASCRIPT: &str = "application/javascript; charset=utf-8";
/// `application/octet-stream`
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";
/// `application/x-www-form-urlencoded`
pub const APPLICATION_FORM: &str = "application/x-www-form-urlencoded";

/// Expands a content-type shorthand.
///
/// `"text"`, `"html"`, `"json"`, `"xml"` and `"js"` map to their full MIME
/// types. Anything else is returned unchanged.
///
/// ```
/// use baton_core::mime;
///
/// assert_eq!(mime::expand("json"), mime::APPLICATION_JSON);
/// assert_eq!(mime::expand("image/png"), "image/png");
/// ```
#[must_use]
pub fn expand(kind: &str) -> &str {
    match kind {
        "text" => TEXT_PLAIN,
        "html" => TEXT_HTML,
        "json" => APPLICATION_JSON,
        "xml" => APPLICATION_XML,
        "js" => APPLICATION_JAVASCRIPT,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorthands() {
        assert_eq!(expand("text"), TEXT_PLAIN);
        assert_eq!(expand("html"), TEXT_HTML);
        assert_eq!(expand("xml"), APPLICATION_XML);
        assert_eq!(expand("js"), APPLICATION_JAVASCRIPT);
    }

    #[test]
    fn test_unknown_passes_through() {
        assert_eq!(expand("text/csv"), "text/csv");
        assert_eq!(expand(""), "");
    }
}
