//! Path templates of HTTP-bound operations.
//!
//! A template such as `/buckets/{Bucket}/objects/{Key+}?x-id=GetObject`
//! splits into path segments (literal or label) and literal query pairs.
//! Greedy labels (`{Key+}`) may expand to values containing `/`.

use crate::binding::BindingError;

/// A label segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSegment {
    /// Label name, matching an input member name.
    pub name: String,
    /// Greedy labels keep `/` unescaped.
    pub greedy: bool,
}

/// One `/`-separated segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text.
    Literal(String),
    /// Substituted from an input member.
    Label(LabelSegment),
}

/// A parsed path template.
///
/// # Example
///
/// ```
/// use hermes_core::PathTemplate;
///
/// let template = PathTemplate::parse("/b/{Bucket}/{Key+}?x-id=Get").unwrap();
/// assert_eq!(template.labels().count(), 2);
/// assert_eq!(template.literal_query(), &[("x-id".to_string(), "Get".to_string())]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
    literal_query: Vec<(String, String)>,
}

impl PathTemplate {
    /// Parses a template.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::InvalidTemplate`] if the template does not start
    /// with `/`, has an empty or unterminated label, repeats a label, or has
    /// more than one greedy label.
    pub fn parse(template: &str) -> Result<Self, BindingError> {
        let invalid = |reason: &str| BindingError::InvalidTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        if !template.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let (path, query) = match template.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (template, None),
        };

        let mut segments = Vec::new();
        for raw in path.split('/').skip(1) {
            if raw.starts_with('{') || raw.ends_with('}') {
                let inner = raw
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                    .ok_or_else(|| invalid("unterminated label"))?;
                let (name, greedy) = match inner.strip_suffix('+') {
                    Some(name) => (name, true),
                    None => (inner, false),
                };
                if name.is_empty() {
                    return Err(invalid("empty label"));
                }
                let duplicate = segments
                    .iter()
                    .any(|s| matches!(s, Segment::Label(l) if l.name == name));
                if duplicate {
                    return Err(invalid("duplicate label"));
                }
                segments.push(Segment::Label(LabelSegment {
                    name: name.to_string(),
                    greedy,
                }));
            } else {
                segments.push(Segment::Literal(raw.to_string()));
            }
        }

        let greedy_positions: Vec<_> = segments
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s, Segment::Label(l) if l.greedy))
            .map(|(i, _)| i)
            .collect();
        if greedy_positions.len() > 1 {
            return Err(invalid("more than one greedy label"));
        }

        let literal_query = query
            .into_iter()
            .flat_map(|q| q.split('&'))
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((k, v)) => (k.to_string(), v.to_string()),
                None => (pair.to_string(), String::new()),
            })
            .collect();

        Ok(Self {
            raw: template.to_string(),
            segments,
            literal_query,
        })
    }

    /// Returns the original template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the label segments in order.
    pub fn labels(&self) -> impl Iterator<Item = &LabelSegment> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Label(label) => Some(label),
            Segment::Literal(_) => None,
        })
    }

    /// Returns literal query pairs from the template.
    #[must_use]
    pub fn literal_query(&self) -> &[(String, String)] {
        &self.literal_query
    }

    /// Expands the template, asking `resolve` for each label's encoded value.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `resolve`.
    pub fn expand<E, F>(&self, mut resolve: F) -> Result<String, E>
    where
        F: FnMut(&LabelSegment) -> Result<String, E>,
    {
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Label(label) => path.push_str(&resolve(label)?),
            }
        }
        if path.is_empty() {
            path.push('/');
        }
        Ok(path)
    }
}
