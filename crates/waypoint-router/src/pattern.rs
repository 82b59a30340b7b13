//! Route pattern parsing.
//!
//! Pattern syntax:
//!
//! | Segment | Example | Matches |
//! |---|---|---|
//! | static | `users` | exactly `users` |
//! | parameter | `{id}` | one non-empty segment, captured as `id` |
//! | wildcard | `*path` | the remaining path (one or more segments), captured as `path` |
//!
//! Patterns start with `/`. A trailing slash is ignored, so `/users/` and
//! `/users` are the same pattern. A wildcard may only be the last segment.
//! Empty segments (`//`) are rejected in patterns.
//!
//! Request paths are more lenient: empty segments are skipped before
//! matching, so `/users//7/` is looked up as `/users/7`.

use waypoint_core::Error;

/// One parsed segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal path segment (e.g. `users`).
    Static(String),
    /// Named single-segment parameter (e.g. `{id}`).
    Param(String),
    /// Named catch-all of the remaining path (e.g. `*path`).
    Wildcard(String),
}

impl Segment {
    /// Renders the segment back in pattern syntax.
    #[must_use]
    pub fn as_pattern(&self) -> String {
        match self {
            Self::Static(text) => text.clone(),
            Self::Param(name) => format!("{{{name}}}"),
            Self::Wildcard(name) => format!("*{name}"),
        }
    }
}

/// A validated route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    /// Parses and validates a pattern.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the pattern is malformed.
    pub fn parse(pattern: &str) -> Result<Self, Error> {
        let malformed = |reason: &str| Error::config(format!("malformed route pattern `{pattern}`: {reason}"));

        let rest = pattern
            .strip_prefix('/')
            .ok_or_else(|| malformed("must start with `/`"))?;
        if rest.starts_with('/') {
            return Err(malformed("empty path segment"));
        }
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        if rest.is_empty() {
            return Ok(Self {
                segments: Vec::new(),
            });
        }

        let raw: Vec<&str> = rest.split('/').collect();
        let mut segments = Vec::with_capacity(raw.len());
        let mut names: Vec<&str> = Vec::new();

        for (index, part) in raw.iter().enumerate() {
            let is_last = index + 1 == raw.len();
            if part.is_empty() {
                return Err(malformed("empty path segment"));
            }

            let segment = if let Some(inner) = part.strip_prefix('{') {
                let name = inner
                    .strip_suffix('}')
                    .ok_or_else(|| malformed("unclosed `{` in parameter"))?;
                validate_name(name).map_err(malformed)?;
                names.push(name);
                Segment::Param(name.to_string())
            } else if let Some(name) = part.strip_prefix('*') {
                if !is_last {
                    return Err(malformed("wildcard must be the last segment"));
                }
                validate_name(name).map_err(malformed)?;
                names.push(name);
                Segment::Wildcard(name.to_string())
            } else {
                if part.contains(['{', '}']) {
                    return Err(malformed("braces must wrap a whole segment"));
                }
                Segment::Static((*part).to_string())
            };
            segments.push(segment);
        }

        let mut sorted = names.clone();
        sorted.sort_unstable();
        if sorted.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(malformed("duplicate parameter name"));
        }

        Ok(Self { segments })
    }

    /// Returns the parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns `true` if the pattern ends in a wildcard.
    #[must_use]
    pub fn is_prefix(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Wildcard(_)))
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment.as_pattern())?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("empty parameter name");
    }
    if name.contains(['{', '}', '*']) {
        return Err("invalid character in parameter name");
    }
    Ok(())
}
