//! Query predicates and options

use serde::{Deserialize, Serialize};
use std::fmt;

/// A filter on document fields, serialized in the repository query syntax
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    At { path: String, value: String },
    Not { path: String, value: String },
    Any { path: String, values: Vec<String> },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::At {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn not(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Not {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn any<I, S>(path: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::Any {
            path: path.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::At { path, value } => write!(f, "[at({},{})]", path, quote(value)),
            Predicate::Not { path, value } => write!(f, "[not({},{})]", path, quote(value)),
            Predicate::Any { path, values } => {
                let values: Vec<String> = values.iter().map(|v| quote(v)).collect();
                write!(f, "[any({},[{}])]", path, values.join(","))
            }
        }
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Render a predicate list as the `q` query parameter
pub fn query_param(predicates: &[Predicate]) -> String {
    let inner: String = predicates.iter().map(|p| p.to_string()).collect();
    format!("[{}]", inner)
}

/// Sort key for a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ordering {
    pub field: String,
    #[serde(default)]
    pub descending: bool,
}

impl Ordering {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "{} desc", self.field)
        } else {
            f.write_str(&self.field)
        }
    }
}

/// Paging, ordering and projection options for a query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub page_size: Option<usize>,
    pub page: Option<usize>,
    pub orderings: Vec<Ordering>,
    /// Fields to project, e.g. `posts.title`
    pub fetch: Vec<String>,
    /// Only return documents positioned after this document id
    pub after: Option<String>,
    /// Content release to read from; master when unset
    #[serde(rename = "ref")]
    pub reference: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub fn order_by(mut self, ordering: Ordering) -> Self {
        self.orderings.push(ordering);
        self
    }

    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn after(mut self, id: impl Into<String>) -> Self {
        self.after = Some(id.into());
        self
    }

    pub fn reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }

    /// `orderings` parameter value, `None` when unordered
    pub fn orderings_param(&self) -> Option<String> {
        if self.orderings.is_empty() {
            return None;
        }
        let keys: Vec<String> = self.orderings.iter().map(|o| o.to_string()).collect();
        Some(format!("[{}]", keys.join(",")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_syntax() {
        assert_eq!(
            Predicate::at("document.type", "posts").to_string(),
            r#"[at(document.type,"posts")]"#
        );
        assert_eq!(
            Predicate::any("document.tags", ["a", "b"]).to_string(),
            r#"[any(document.tags,["a","b"])]"#
        );
        assert_eq!(
            Predicate::at("my.posts.uid", r#"say "hi""#).to_string(),
            r#"[at(my.posts.uid,"say \"hi\"")]"#
        );
    }

    #[test]
    fn test_query_param_wraps_all_predicates() {
        let q = query_param(&[
            Predicate::at("document.type", "posts"),
            Predicate::not("document.id", "X1"),
        ]);
        assert_eq!(q, r#"[[at(document.type,"posts")][not(document.id,"X1")]]"#);
    }

    #[test]
    fn test_orderings_param() {
        let options = QueryOptions::new()
            .order_by(Ordering::asc("document.first_publication_date"))
            .order_by(Ordering::desc("my.posts.title"));
        assert_eq!(
            options.orderings_param().as_deref(),
            Some("[document.first_publication_date,my.posts.title desc]")
        );
        assert_eq!(QueryOptions::new().orderings_param(), None);
    }
}
