//! Credential substitution in URLs, and masking for logs.

use regex::{Captures, Regex};

/// Rewrites the value of one query parameter wherever it appears.
#[derive(Debug, Clone)]
pub struct QueryRewriter {
    pattern: Regex,
}

/// Outcome of a query rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRewrite {
    /// URL with every occurrence of the parameter rewritten.
    pub url: String,
    /// Value of the first occurrence before rewriting.
    pub original: String,
}

impl QueryRewriter {
    /// The parameter must be introduced by `?` or `&`; its value runs to the
    /// next `&`, `#` or end of string and must be non-empty.
    pub fn new(param: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(r"([?&]){}=([^&#]+)", regex::escape(param)))?;
        Ok(Self { pattern })
    }

    /// Returns `None` when the URL carries no value for the parameter.
    pub fn rewrite(&self, url: &str, value: &str) -> Option<QueryRewrite> {
        let first = self.pattern.captures(url)?;
        let original = first[2].to_string();
        let url = self
            .pattern
            .replace_all(url, |caps: &Captures| {
                let whole = &caps[0];
                let name_end = whole.len() - caps[2].len();
                format!("{}{}", &whole[..name_end], value)
            })
            .into_owned();
        Some(QueryRewrite { url, original })
    }
}

/// First `chars` characters of a secret followed by `***`.
pub fn mask(secret: &str, chars: usize) -> String {
    let prefix: String = secret.chars().take(chars).collect();
    format!("{prefix}***")
}
