use std::str::FromStr;

use crate::ApiError;

/// Collects per-field problems so a request reports all of them at once.
#[derive(Debug, Default)]
pub(crate) struct FieldErrors(Vec<String>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, problem: &str) {
        self.0.push(format!("{field} {problem}"));
    }

    pub fn check(&mut self, field: &str, ok: bool, problem: &str) {
        if !ok {
            self.add(field, problem);
        }
    }

    /// Parse a raw value. Records a problem and returns `None` when it does
    /// not parse.
    pub fn parse<T: FromStr>(&mut self, field: &str, raw: &str, problem: &str) -> Option<T> {
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.add(field, problem);
                None
            }
        }
    }

    /// Like `parse`, but a missing or blank value is simply `None`.
    pub fn parse_opt<T: FromStr>(&mut self, field: &str, raw: Option<&str>, problem: &str) -> Option<T> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
        self.parse(field, raw, problem)
    }

    pub fn into_error(self) -> ApiError {
        ApiError::Validation(self.0.join("; "))
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self.into_error())
        }
    }
}

/// Length in characters, inclusive on both ends.
pub(crate) fn char_len_between(value: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&value.chars().count())
}

/// `local@domain.tld` with no whitespace and a dotted domain.
pub(crate) fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || value.chars().any(char::is_whitespace) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}

/// Absolute http(s) URL with a host.
pub(crate) fn is_url(value: &str) -> bool {
    match url::Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}
