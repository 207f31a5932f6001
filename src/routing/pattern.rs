//! Path template compilation and matching.
//!
//! # Responsibilities
//! - Split a template like `/api/v1/items/:id` into literal and parameter segments
//! - Match a concrete request path segment-by-segment
//! - Capture parameter values by name
//!
//! # Design Decisions
//! - Segment count must match exactly (no prefix or trailing-slash leniency)
//! - Literals are decoded once at compile time and compared with the decoded
//!   candidate, so `/my%20docs` and `/my docs` name the same literal
//! - Parameters capture the raw segment text; decoding is left to the handler
//! - Only `:[A-Za-z0-9_]+` is a parameter; anything else is a literal
//! - No regex, no backtracking: one linear scan per candidate

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

/// Parameter name → captured value.
pub type PathParams = BTreeMap<String, String>;

/// Errors raised while compiling a path template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// Templates are absolute.
    #[error("Path template must start with '/': {0}")]
    MissingLeadingSlash(String),

    /// A parameter name appears twice in one template.
    #[error("Duplicate parameter ':{name}' in path template {template}")]
    DuplicateParameter { template: String, name: String },
}

/// One `/`-delimited piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix(':') {
            Some(name) if is_param_name(name) => Segment::Param(name.to_string()),
            _ => Segment::Literal(raw.to_string()),
        }
    }
}

fn is_param_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    segments: Vec<Segment>,
    /// Decoded bytes of each literal segment, `None` for parameters.
    decoded: Vec<Option<Vec<u8>>>,
}

impl PathPattern {
    /// Compile a template into a reusable matcher.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let rest = template
            .strip_prefix('/')
            .ok_or_else(|| PatternError::MissingLeadingSlash(template.to_string()))?;

        let segments: Vec<Segment> = rest.split('/').map(Segment::parse).collect();

        let mut seen = HashSet::new();
        for segment in &segments {
            if let Segment::Param(name) = segment {
                if !seen.insert(name.as_str()) {
                    return Err(PatternError::DuplicateParameter {
                        template: template.to_string(),
                        name: name.clone(),
                    });
                }
            }
        }

        let decoded = segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(lit) => Some(percent_decode(lit)),
                Segment::Param(_) => None,
            })
            .collect();

        Ok(Self {
            template: template.to_string(),
            segments,
            decoded,
        })
    }

    /// Original template text.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameter names in template order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Template rendered with `{name}` placeholders.
    pub fn openapi_path(&self) -> String {
        let mut out = String::with_capacity(self.template.len() + 2);
        for segment in &self.segments {
            out.push('/');
            match segment {
                Segment::Literal(lit) => out.push_str(lit),
                Segment::Param(name) => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            }
        }
        out
    }

    /// Whether the raw request segment `raw` satisfies segment `i`.
    fn accepts(&self, i: usize, raw: &str) -> bool {
        match &self.decoded[i] {
            Some(lit) if raw.contains('%') => *lit == percent_decode(raw),
            Some(lit) => lit.as_slice() == raw.as_bytes(),
            None => !raw.is_empty(),
        }
    }

    /// Test `path` against the template, returning captured parameters on success.
    pub fn match_path(&self, path: &str) -> Option<PathParams> {
        let rest = path.strip_prefix('/')?;

        let candidates: Vec<&str> = rest.split('/').collect();
        if candidates.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (i, (segment, raw)) in self.segments.iter().zip(candidates).enumerate() {
            if !self.accepts(i, raw) {
                return None;
            }
            if let Segment::Param(name) = segment {
                params.insert(name.clone(), raw.to_string());
            }
        }
        Some(params)
    }

    /// Cheaper form of [`match_path`](Self::match_path) that skips capturing.
    pub fn is_match(&self, path: &str) -> bool {
        let Some(rest) = path.strip_prefix('/') else {
            return false;
        };
        let mut count = 0;
        for (i, raw) in rest.split('/').enumerate() {
            if i >= self.segments.len() || !self.accepts(i, raw) {
                return false;
            }
            count += 1;
        }
        count == self.segments.len()
    }
}

/// Decode `%XX` escapes in one path segment. `+` is left as-is and
/// malformed escapes are kept literally.
fn percent_decode(segment: &str) -> Vec<u8> {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push(((hi << 4) | lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}
