use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Outcome of sanitizing one raw CSS payload.
///
/// Rejection is an expected, frequent result rather than an error: the
/// collector reacts to it by omitting the block's CSS, never by failing
/// the render. A rejected payload must never reach page output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanitizationResult {
    Clean(String),
    Rejected(&'static str),
}

impl SanitizationResult {
    pub fn is_clean(&self) -> bool {
        matches!(self, SanitizationResult::Clean(_))
    }

    /// The cleaned CSS, or `None` when the payload was rejected.
    pub fn into_clean(self) -> Option<String> {
        match self {
            SanitizationResult::Clean(css) => Some(css),
            SanitizationResult::Rejected(_) => None,
        }
    }
}

/// Ordered blocklist of injection vectors. The first matching pattern
/// rejects the whole payload; there is no partial removal. All checks
/// are case-insensitive and run after null bytes are stripped.
///
/// This is deliberately not a CSS grammar check. The final entry is a
/// heuristic: backslash escapes can smuggle any of the earlier tokens
/// past a textual filter, so any escaped hex digit rejects outright.
const BLOCKLIST: &[(&str, &str)] = &[
    ("expression() call", r"(?i)expression\s*\("),
    ("javascript: url", r"(?i)javascript\s*:"),
    ("vbscript: url", r"(?i)vbscript\s*:"),
    ("behavior: declaration", r"(?i)behavior\s*:"),
    ("-moz-binding declaration", r"(?i)-moz-binding"),
    ("@import rule", r"(?i)@import"),
    ("@charset rule", r"(?i)@charset"),
    ("data: uri inside url()", r#"(?i)url\s*\(\s*["']?\s*data:"#),
    ("javascript: uri inside url()", r#"(?i)url\s*\(\s*["']?\s*javascript:"#),
    ("backslash-escaped hex sequence", r"(?i)\\[0-9a-f]"),
];

fn blocklist() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        BLOCKLIST
            .iter()
            .map(|(reason, pattern)| {
                (
                    *reason,
                    Regex::new(pattern).expect("blocklist regex must compile"),
                )
            })
            .collect()
    })
}

/// Tag-shaped substrings (`<...>`); markup injection riding inside a
/// CSS value is stripped on the clean path.
fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag regex must compile"))
}

/// Validate and clean one raw CSS payload.
pub fn sanitize(raw: &str) -> SanitizationResult {
    let text: Cow<'_, str> = if raw.contains('\0') {
        Cow::Owned(raw.replace('\0', ""))
    } else {
        Cow::Borrowed(raw)
    };

    if text.trim().is_empty() {
        return SanitizationResult::Clean(String::new());
    }

    for (reason, pattern) in blocklist() {
        if pattern.is_match(&text) {
            return SanitizationResult::Rejected(reason);
        }
    }

    SanitizationResult::Clean(tag_re().replace_all(&text, "").into_owned())
}
