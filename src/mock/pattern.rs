//! Path pattern grammar for mock route keys.
//!
//! A pattern is split on `/` and every non-empty piece becomes one segment:
//!
//! - `users`: literal, compared ASCII case-insensitively
//! - `:id` or `{id}`: exactly one segment
//! - `:id?`: zero or one segment
//! - `:rest*`: zero or more segments
//! - `:rest+`: one or more segments
//! - `*` or `{*rest}`: zero or more segments. A bare `*` is captured under its
//!   position among the unnamed wildcards (`"0"`, `"1"`, ...)
//!
//! Leading, trailing and repeated slashes carry no meaning, so `/api/user/`
//! and `/api//user` both match `/api/user`. Captured values are
//! percent-decoded; multi-segment captures are joined with `/`.

use std::{collections::HashMap, fmt};

use percent_encoding::percent_decode_str;

/// Parameters captured while matching a path, keyed by segment name.
pub type PathParams = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Optional(String),
    ZeroOrMore(String),
    OneOrMore(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternError {
    segment: String,
    reason: &'static str,
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in segment `{}`", self.reason, self.segment)
    }
}

impl std::error::Error for PatternError {}

/// A parsed route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let mut unnamed = 0usize;
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|raw| parse_segment(raw, &mut unnamed))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { source: pattern.to_string(), segments })
    }

    /// The pattern text as written in the configuration.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Matches a request path, returning the captured parameters on success.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut search = Search::new(&self.segments, &parts);

        if !search.run(0, 0) {
            return None;
        }
        let params = search
            .captured
            .iter()
            .map(|&(name, start, end)| (name.to_string(), decode(&parts[start..end].join("/"))))
            .collect();
        Some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_segment(raw: &str, unnamed: &mut usize) -> Result<Segment, PatternError> {
    let invalid = |reason: &'static str| PatternError { segment: raw.to_string(), reason };

    if raw == "*" {
        let name = unnamed.to_string();
        *unnamed += 1;
        return Ok(Segment::ZeroOrMore(name));
    }

    let named = |name: &str| param_name(name).ok_or_else(|| invalid("invalid parameter name"));

    if let Some(inner) = raw.strip_prefix('{') {
        let inner = inner.strip_suffix('}').ok_or_else(|| invalid("unterminated `{`"))?;
        return match inner.strip_prefix('*') {
            Some(name) => Ok(Segment::ZeroOrMore(named(name)?)),
            None => Ok(Segment::Param(named(inner)?)),
        };
    }

    if let Some(rest) = raw.strip_prefix(':') {
        let segment = if let Some(name) = rest.strip_suffix('?') {
            Segment::Optional(named(name)?)
        } else if let Some(name) = rest.strip_suffix('*') {
            Segment::ZeroOrMore(named(name)?)
        } else if let Some(name) = rest.strip_suffix('+') {
            Segment::OneOrMore(named(name)?)
        } else {
            Segment::Param(named(rest)?)
        };
        return Ok(segment);
    }

    Ok(Segment::Literal(raw.to_string()))
}

fn param_name(name: &str) -> Option<String> {
    let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then(|| name.to_string())
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Backtracking matcher. Variable-width segments are tried longest first.
/// Whether the tail of the pattern matches the tail of the path depends only
/// on the two positions, so failed positions are remembered and never
/// retried. Captures are part index ranges, decoded once the match is found.
struct Search<'p, 'a> {
    segments: &'p [Segment],
    parts: &'a [&'a str],
    failed: Vec<bool>,
    captured: Vec<(&'p str, usize, usize)>,
}

impl<'p, 'a> Search<'p, 'a> {
    fn new(segments: &'p [Segment], parts: &'a [&'a str]) -> Self {
        Self {
            segments,
            parts,
            failed: vec![false; (segments.len() + 1) * (parts.len() + 1)],
            captured: Vec::new(),
        }
    }

    fn run(&mut self, seg: usize, part: usize) -> bool {
        let slot = seg * (self.parts.len() + 1) + part;
        if self.failed[slot] {
            return false;
        }
        let matched = self.step(seg, part);
        if !matched {
            self.failed[slot] = true;
        }
        matched
    }

    fn step(&mut self, seg: usize, part: usize) -> bool {
        let segments = self.segments;
        let Some(segment) = segments.get(seg) else {
            return part == self.parts.len();
        };
        let remaining = self.parts.len() - part;

        match segment {
            Segment::Literal(expected) => {
                remaining > 0 && self.parts[part].eq_ignore_ascii_case(expected) && self.run(seg + 1, part + 1)
            }
            Segment::Param(name) => remaining > 0 && self.capture(name, seg, part, 1),
            Segment::Optional(name) => {
                (remaining > 0 && self.capture(name, seg, part, 1)) || self.run(seg + 1, part)
            }
            Segment::ZeroOrMore(name) => {
                (1..=remaining).rev().any(|take| self.capture(name, seg, part, take)) || self.run(seg + 1, part)
            }
            Segment::OneOrMore(name) => (1..=remaining).rev().any(|take| self.capture(name, seg, part, take)),
        }
    }

    fn capture(&mut self, name: &'p str, seg: usize, part: usize, take: usize) -> bool {
        self.captured.push((name, part, part + take));
        if self.run(seg + 1, part + take) {
            return true;
        }
        self.captured.pop();
        false
    }
}
