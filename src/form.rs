use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use scraper::Html;
use url::form_urlencoded;

use crate::error::{Result, TranslatorError};

/// Undo the transport encoding of a POST body.
pub fn decode_body(body: &str, is_base64_encoded: bool) -> Result<String> {
    if !is_base64_encoded {
        return Ok(body.to_string());
    }
    let bytes = BASE64
        .decode(body.trim())
        .map_err(|e| TranslatorError::BadRequest(format!("body is not valid base64: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| TranslatorError::BadRequest(format!("body is not valid UTF-8: {}", e)))
}

/// URL-decoded value of `field` in an `application/x-www-form-urlencoded` body.
///
/// An empty body yields an empty value; a non-empty body without the field
/// is rejected.
pub fn extract_field(body: &str, field: &str) -> Result<String> {
    if body.trim().is_empty() {
        return Ok(String::new());
    }
    form_urlencoded::parse(body.as_bytes())
        .find(|(key, _)| key == field)
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| TranslatorError::BadRequest(format!("form field '{}' is missing", field)))
}

/// Resolve HTML entities (`&amp;` becomes `&`). Markup stays literal text.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let fragment = Html::parse_fragment(&text.replace('<', "&lt;"));
    fragment.root_element().text().collect()
}

/// Fold `\r\n` and lone `\r` into `\n` and drop NUL, as the HTML parser
/// behind [`decode_entities`] would, so line structure never depends on
/// whether the text holds an entity.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").replace('\0', "")
}

/// The submitted text of a POST body.
pub fn input_text(body: &str, is_base64_encoded: bool, field: &str) -> Result<String> {
    let decoded = decode_body(body, is_base64_encoded)?;
    let value = extract_field(&decoded, field)?;
    Ok(decode_entities(&normalize_newlines(&value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_and_percent_escapes_are_decoded() {
        let value = extract_field("input_text=%E7%8F%BE%E5%9C%A8+%E5%A5%BD", "input_text").unwrap();
        assert_eq!(value, "現在 好");
    }

    #[test]
    fn equals_sign_inside_value_is_kept() {
        let value = extract_field("input_text=a%3Db", "input_text").unwrap();
        assert_eq!(value, "a=b");
    }

    #[test]
    fn field_is_found_among_others() {
        let value = extract_field("submit=Convert&input_text=abc", "input_text").unwrap();
        assert_eq!(value, "abc");
    }

    #[test]
    fn empty_body_is_empty_text() {
        assert_eq!(extract_field("", "input_text").unwrap(), "");
        assert_eq!(extract_field("input_text=", "input_text").unwrap(), "");
    }

    #[test]
    fn missing_field_is_a_bad_request() {
        let err = extract_field("other=1", "input_text").unwrap_err();
        assert!(matches!(err, TranslatorError::BadRequest(_)));
    }

    #[test]
    fn base64_body_matches_raw_body() {
        let raw = "input_text=%E7%8F%BE%E5%9C%A8%E5%A5%BD";
        let encoded = BASE64.encode(raw);
        assert_eq!(decode_body(&encoded, true).unwrap(), raw);
        assert_eq!(
            input_text(&encoded, true, "input_text").unwrap(),
            input_text(raw, false, "input_text").unwrap()
        );
    }

    #[test]
    fn invalid_base64_is_a_bad_request() {
        let err = decode_body("not base64!", true).unwrap_err();
        assert!(matches!(err, TranslatorError::BadRequest(_)));
    }

    #[test]
    fn entities_are_resolved() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;現在&gt;"), "<現在>");
        assert_eq!(decode_entities("現在好"), "現在好");
    }

    #[test]
    fn tags_are_not_swallowed() {
        assert_eq!(decode_entities("a<b> &amp; c"), "a<b> & c");
        assert_eq!(decode_entities("<i>現在</i>"), "<i>現在</i>");
    }

    #[test]
    fn multiline_input_survives() {
        let text = input_text("input_text=%E7%8F%BE%E5%9C%A8%0D%0A%0D%0A%E5%A5%BD", false, "input_text").unwrap();
        assert_eq!(text, "現在\n\n好");
    }

    #[test]
    fn lone_carriage_return_splits_lines_with_or_without_entities() {
        assert_eq!(input_text("input_text=a%0Db", false, "input_text").unwrap(), "a\nb");
        assert_eq!(
            input_text("input_text=a%0Db%26amp%3B", false, "input_text").unwrap(),
            "a\nb&"
        );
    }

    #[test]
    fn nul_is_dropped_with_or_without_entities() {
        assert_eq!(input_text("input_text=a%00b", false, "input_text").unwrap(), "ab");
        assert_eq!(input_text("input_text=a%00%26amp%3B", false, "input_text").unwrap(), "a&");
    }
}
