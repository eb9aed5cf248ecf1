//! Path templates with `{name}` placeholders.
//!
//! # Responsibilities
//! - Parse templates such as `/v1/path_param/{random_int}`
//! - Match inbound request paths and capture placeholder values
//! - Render templates by substituting captured values
//!
//! # Design Decisions
//! - Placeholders never span a `/`; each segment holds at most one
//! - A placeholder may carry a literal prefix/suffix within its segment (`{id}.json`)
//! - Captured values are percent-decoded, rendered values are percent-encoded
//! - No regex; matching is a single pass over segments

use std::collections::HashMap;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use thiserror::Error;

/// Characters escaped when a value is substituted into a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Errors raised while parsing or rendering a path template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("malformed path template '{template}': {reason}")]
    Malformed { template: String, reason: &'static str },

    #[error("path template '{template}' has no value for placeholder '{name}'")]
    MissingParam { template: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Param(String),
}

/// A parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Vec<Piece>>,
}

impl PathTemplate {
    /// Parse a template string.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let malformed = |reason| TemplateError::Malformed {
            template: template.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        for raw_segment in template.split('/') {
            let mut pieces = Vec::new();
            let mut rest = raw_segment;
            while !rest.is_empty() {
                match rest.find(|c: char| c == '{' || c == '}') {
                    None => {
                        pieces.push(Piece::Literal(rest.to_string()));
                        rest = "";
                    }
                    Some(idx) if rest.as_bytes()[idx] == b'}' => {
                        return Err(malformed("unmatched '}'"));
                    }
                    Some(open) => {
                        if open > 0 {
                            pieces.push(Piece::Literal(rest[..open].to_string()));
                        }
                        let after = &rest[open + 1..];
                        let close = after.find('}').ok_or_else(|| malformed("unclosed '{'"))?;
                        let name = &after[..close];
                        if name.is_empty() {
                            return Err(malformed("empty placeholder name"));
                        }
                        if name.contains('{') {
                            return Err(malformed("nested '{'"));
                        }
                        pieces.push(Piece::Param(name.to_string()));
                        rest = &after[close + 1..];
                    }
                }
            }

            let params = pieces.iter().filter(|p| matches!(p, Piece::Param(_))).count();
            if params > 1 {
                return Err(malformed("more than one placeholder in a segment"));
            }
            segments.push(pieces);
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    /// The template as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().flatten().filter_map(|piece| match piece {
            Piece::Param(name) => Some(name.as_str()),
            Piece::Literal(_) => None,
        })
    }

    /// Match a request path, returning the captured placeholder values.
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut captured = HashMap::new();
        for (pieces, part) in self.segments.iter().zip(parts) {
            match pieces.iter().position(|p| matches!(p, Piece::Param(_))) {
                None => {
                    let literal: String = pieces
                        .iter()
                        .map(|p| match p {
                            Piece::Literal(s) => s.as_str(),
                            Piece::Param(_) => "",
                        })
                        .collect();
                    if literal != part {
                        return None;
                    }
                }
                Some(idx) => {
                    let prefix = literal_at(pieces, idx.checked_sub(1));
                    let suffix = literal_at(pieces, Some(idx + 1));
                    if part.len() <= prefix.len() + suffix.len()
                        || !part.starts_with(prefix)
                        || !part.ends_with(suffix)
                    {
                        return None;
                    }
                    let value = &part[prefix.len()..part.len() - suffix.len()];
                    let decoded = percent_decode_str(value).decode_utf8().ok()?;
                    if let Piece::Param(name) = &pieces[idx] {
                        captured.insert(name.clone(), decoded.into_owned());
                    }
                }
            }
        }
        Some(captured)
    }

    /// Substitute every placeholder with its value from `params`.
    pub fn render(&self, params: &HashMap<String, String>) -> Result<String, TemplateError> {
        let mut rendered = Vec::with_capacity(self.segments.len());
        for pieces in &self.segments {
            let mut segment = String::new();
            for piece in pieces {
                match piece {
                    Piece::Literal(s) => segment.push_str(s),
                    Piece::Param(name) => {
                        let value = params.get(name).ok_or_else(|| TemplateError::MissingParam {
                            template: self.raw.clone(),
                            name: name.clone(),
                        })?;
                        segment.extend(utf8_percent_encode(value, SEGMENT));
                    }
                }
            }
            rendered.push(segment);
        }
        Ok(rendered.join("/"))
    }
}

fn literal_at(pieces: &[Piece], idx: Option<usize>) -> &str {
    match idx.and_then(|i| pieces.get(i)) {
        Some(Piece::Literal(s)) => s,
        _ => "",
    }
}
