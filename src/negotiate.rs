//! `Accept` header negotiation over a fixed set of representations.
//!
//! Only two representations exist, listed in server preference order:
//!
//! | Variant | Media type |
//! |---|---|
//! | [`MediaType::TextPlain`] | `text/plain` |
//! | [`MediaType::Json`] | `application/json` |
//!
//! Each candidate takes its quality from the most specific media range that
//! matches it (`type/subtype` beats `type/*` beats `*/*`). A quality of zero
//! rules the candidate out. Among the remaining candidates the highest
//! quality wins, then the one matched by the more specific range, then the
//! one listed first above.

use std::fmt;

use thiserror::Error;

/// A representation the server can produce.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MediaType {
    TextPlain,
    Json,
}

impl MediaType {
    /// All supported types, in server preference order.
    pub const SUPPORTED: [MediaType; 2] = [MediaType::TextPlain, MediaType::Json];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TextPlain => "text/plain",
            Self::Json      => "application/json",
        }
    }

    fn parts(self) -> (&'static str, &'static str) {
        match self {
            Self::TextPlain => ("text", "plain"),
            Self::Json      => ("application", "json"),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why no representation could be selected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("no acceptable type found")]
    NoAcceptableType,

    #[error("invalid media range: {0:?}")]
    InvalidMediaRange(String),

    #[error("invalid weight: {0:?}")]
    InvalidWeight(String),
}

/// Picks the best supported representation for an `Accept` header value.
///
/// A missing or blank header accepts anything, which selects
/// [`MediaType::TextPlain`].
pub fn negotiate(accept: Option<&str>) -> Result<MediaType, NegotiationError> {
    let ranges = match accept {
        Some(header) => parse_accept(header)?,
        None => Vec::new(),
    };
    if ranges.is_empty() {
        return Ok(MediaType::SUPPORTED[0]);
    }

    // (quality, specificity, candidate); earlier candidates win exact ties.
    let mut best: Option<(u16, u8, MediaType)> = None;
    for candidate in MediaType::SUPPORTED {
        let Some(range) = most_specific_match(&ranges, candidate) else {
            continue;
        };
        if range.quality == 0 {
            continue;
        }
        let score = (range.quality, range.specificity());
        if best.is_none_or(|(q, s, _)| score > (q, s)) {
            best = Some((score.0, score.1, candidate));
        }
    }

    best.map(|(_, _, media_type)| media_type)
        .ok_or(NegotiationError::NoAcceptableType)
}

// ── Media ranges ──────────────────────────────────────────────────────────────

#[derive(Debug)]
struct MediaRange<'a> {
    kind: &'a str,
    subtype: &'a str,
    /// Weight in thousandths, `0..=1000`.
    quality: u16,
}

impl MediaRange<'_> {
    fn specificity(&self) -> u8 {
        match (self.kind, self.subtype) {
            ("*", _) => 0,
            (_, "*") => 1,
            _        => 2,
        }
    }

    fn matches(&self, media_type: MediaType) -> bool {
        let (kind, subtype) = media_type.parts();
        (self.kind == "*" || self.kind.eq_ignore_ascii_case(kind))
            && (self.subtype == "*" || self.subtype.eq_ignore_ascii_case(subtype))
    }
}

/// The first of the most specific ranges matching `media_type`.
fn most_specific_match<'r, 'a>(
    ranges: &'r [MediaRange<'a>],
    media_type: MediaType,
) -> Option<&'r MediaRange<'a>> {
    let mut found: Option<&MediaRange<'a>> = None;
    for range in ranges.iter().filter(|r| r.matches(media_type)) {
        if found.is_none_or(|f| range.specificity() > f.specificity()) {
            found = Some(range);
        }
    }
    found
}

/// Splits a header value into media ranges. Empty list elements are skipped.
fn parse_accept(header: &str) -> Result<Vec<MediaRange<'_>>, NegotiationError> {
    split_unquoted(header, ',')
        .into_iter()
        .map(str::trim)
        .filter(|element| !element.is_empty())
        .map(parse_range)
        .collect()
}

fn parse_range(element: &str) -> Result<MediaRange<'_>, NegotiationError> {
    let invalid = || NegotiationError::InvalidMediaRange(element.to_owned());

    let mut params = split_unquoted(element, ';').into_iter();
    let essence = params.next().unwrap_or_default().trim();
    let (kind, subtype) = essence.split_once('/').ok_or_else(invalid)?;
    if !is_token(kind) || !is_token(subtype) || (kind == "*" && subtype != "*") {
        return Err(invalid());
    }

    let mut quality = 1000;
    for param in params {
        let param = param.trim();
        if param.is_empty() {
            continue;
        }
        let (name, value) = param.split_once('=').ok_or_else(invalid)?;
        let value = value.trim();
        if name.trim().eq_ignore_ascii_case("q") {
            quality = parse_quality(value)?;
        } else if value.starts_with('"') && !is_quoted_string(value) {
            return Err(invalid());
        }
    }

    Ok(MediaRange { kind, subtype, quality })
}

/// Splits `s` at every `sep` that is not inside a quoted string.
/// A backslash inside quotes escapes the next character.
fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            c if c == sep && !quoted => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// RFC 9110 `quoted-string`: opens and closes with an unescaped `"`.
fn is_quoted_string(s: &str) -> bool {
    let Some(inner) = s.strip_prefix('"') else {
        return false;
    };
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if chars.next().is_none() {
                    return false;
                }
            }
            '"' => return chars.as_str().is_empty(),
            _ => {}
        }
    }
    false
}

/// Parses an RFC 9110 `qvalue` (`0`, `0.5`, `1.000`, …) into thousandths.
fn parse_quality(value: &str) -> Result<u16, NegotiationError> {
    let invalid = || NegotiationError::InvalidWeight(value.to_owned());

    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    if fraction.len() > 3 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let mut thousandths: u16 = 0;
    for (i, digit) in fraction.bytes().enumerate() {
        thousandths += u16::from(digit - b'0') * [100, 10, 1][i];
    }

    match whole {
        "0" => Ok(thousandths),
        "1" if thousandths == 0 => Ok(1000),
        _ => Err(invalid()),
    }
}

/// RFC 9110 `token`: one or more `tchar`.
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pick(accept: &str) -> Result<MediaType, NegotiationError> {
        negotiate(Some(accept))
    }

    #[test]
    fn missing_or_blank_header_selects_plain_text() {
        assert_eq!(negotiate(None), Ok(MediaType::TextPlain));
        assert_eq!(pick(""), Ok(MediaType::TextPlain));
        assert_eq!(pick("  ,  ,"), Ok(MediaType::TextPlain));
    }

    #[test]
    fn exact_types() {
        assert_eq!(pick("application/json"), Ok(MediaType::Json));
        assert_eq!(pick("text/plain"), Ok(MediaType::TextPlain));
        assert_eq!(pick("Application/JSON"), Ok(MediaType::Json));
    }

    #[test]
    fn wildcards_fall_back_to_server_preference() {
        assert_eq!(pick("*/*"), Ok(MediaType::TextPlain));
        assert_eq!(pick("application/*"), Ok(MediaType::Json));
        assert_eq!(pick("text/*"), Ok(MediaType::TextPlain));
    }

    #[test]
    fn higher_quality_wins() {
        assert_eq!(pick("text/plain;q=0.5, application/json"), Ok(MediaType::Json));
        assert_eq!(pick("text/*;q=0.5, application/json;q=0.6"), Ok(MediaType::Json));
        assert_eq!(pick("*/*;q=0.1, application/json"), Ok(MediaType::Json));
        assert_eq!(pick("application/json;q=0.9, text/plain;q=0.91"), Ok(MediaType::TextPlain));
    }

    #[test]
    fn equal_quality_prefers_exact_match_then_first_candidate() {
        assert_eq!(pick("text/*, application/json"), Ok(MediaType::Json));
        assert_eq!(pick("application/json, text/plain"), Ok(MediaType::TextPlain));
    }

    #[test]
    fn most_specific_range_decides_quality() {
        assert_eq!(pick("text/plain;q=0, */*"), Ok(MediaType::Json));
        assert_eq!(pick("*/*;q=0, application/json;q=0.2"), Ok(MediaType::Json));
    }

    #[test]
    fn non_weight_parameters_are_ignored() {
        assert_eq!(pick("text/plain; charset=utf-8"), Ok(MediaType::TextPlain));
        assert_eq!(pick("application/json; version=2; q=0.8"), Ok(MediaType::Json));
    }

    #[test]
    fn separators_inside_quoted_parameters_do_not_split() {
        assert_eq!(pick(r#"application/json; profile="a,b""#), Ok(MediaType::Json));
        assert_eq!(pick(r#"application/json; profile="a;b", text/plain;q=0.1"#), Ok(MediaType::Json));
        assert_eq!(pick(r#"application/json; profile="a\"b,c", text/plain;q=0.1"#), Ok(MediaType::Json));
        assert_eq!(pick(r#"text/plain; x="q=0", application/json;q=0.5"#), Ok(MediaType::TextPlain));
    }

    #[test]
    fn unterminated_quoted_parameter_is_an_error() {
        assert!(matches!(pick(r#"application/json; profile="a,b"#), Err(NegotiationError::InvalidMediaRange(_))));
        assert!(matches!(pick(r#"application/json; profile="a\""#), Err(NegotiationError::InvalidMediaRange(_))));
    }

    #[test]
    fn split_unquoted_respects_quotes_and_escapes() {
        assert_eq!(split_unquoted("a,b", ','), ["a", "b"]);
        assert_eq!(split_unquoted(r#"a="x,y",b"#, ','), [r#"a="x,y""#, "b"]);
        assert_eq!(split_unquoted(r#"a="x\",y",b"#, ','), [r#"a="x\",y""#, "b"]);
        assert_eq!(split_unquoted("", ','), [""]);
    }

    #[test]
    fn quoted_strings() {
        assert!(is_quoted_string(r#""""#));
        assert!(is_quoted_string(r#""a,b""#));
        assert!(is_quoted_string(r#""a\"b""#));
        assert!(!is_quoted_string(r#""abc"#));
        assert!(!is_quoted_string(r#""a"b"#));
        assert!(!is_quoted_string(r#""a\""#));
    }

    #[test]
    fn unsupported_types_are_rejected() {
        let err = pick("application/xml").unwrap_err();
        assert_eq!(err, NegotiationError::NoAcceptableType);
        assert_eq!(err.to_string(), "no acceptable type found");

        assert_eq!(pick("text/plain;q=0"), Err(NegotiationError::NoAcceptableType));
        assert_eq!(pick("image/*, text/html"), Err(NegotiationError::NoAcceptableType));
    }

    #[test]
    fn malformed_ranges_are_errors() {
        assert!(matches!(pick("textplain"), Err(NegotiationError::InvalidMediaRange(_))));
        assert!(matches!(pick("*/json"), Err(NegotiationError::InvalidMediaRange(_))));
        assert!(matches!(pick("text/"), Err(NegotiationError::InvalidMediaRange(_))));
        assert!(matches!(pick("text/plain;charset"), Err(NegotiationError::InvalidMediaRange(_))));
    }

    #[test]
    fn malformed_weights_are_errors() {
        for bad in ["text/plain;q=2", "text/plain;q=abc", "text/plain;q=0.1234", "text/plain;q=1.5", "text/plain;q="] {
            assert!(
                matches!(pick(bad), Err(NegotiationError::InvalidWeight(_))),
                "{bad} should be rejected",
            );
        }
    }

    #[test]
    fn quality_values() {
        assert_eq!(parse_quality("1"), Ok(1000));
        assert_eq!(parse_quality("1.000"), Ok(1000));
        assert_eq!(parse_quality("0"), Ok(0));
        assert_eq!(parse_quality("0.5"), Ok(500));
        assert_eq!(parse_quality("0.05"), Ok(50));
        assert_eq!(parse_quality("0.123"), Ok(123));
    }
}
