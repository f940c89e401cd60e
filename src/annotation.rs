//! Annotations stored in sequence headers by the toolchain.
//!
//! A header looks like `READ1|PRIMER=IGHG|CONSCOUNT=3,5`: the first token is the sequence ID,
//! the remaining tokens are `FIELD=value` pairs, and a field may hold a `,` separated list.

use regex::Regex;

use std::fmt;

use crate::errors::*;

pub const FIELD_DELIM: char = '|';
pub const VALUE_DELIM: char = '=';

/// Ordered field/value pairs parsed from one header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Annotation {
    fields: Vec<(String, String)>,
}

impl Annotation {
    /// Parse a header into its annotations. Field names are upper-cased.
    pub fn parse(header: &str) -> Result<Self> {
        let invalid = |reason| Error::InvalidHeader {
            header: header.to_owned(),
            reason,
        };

        let header = header.trim();
        let mut tokens = header.split(FIELD_DELIM);
        let id = tokens.next().unwrap_or_default();

        if id.is_empty() {
            return Err(invalid("missing sequence ID"));
        }

        let mut res = Self {
            fields: vec![("ID".to_owned(), id.to_owned())],
        };

        for token in tokens {
            if token.is_empty() {
                continue;
            }

            let mut kv = token.split(VALUE_DELIM);
            let (Some(k), Some(v), None) = (kv.next(), kv.next(), kv.next()) else {
                return Err(invalid("expected exactly one '=' in each field"));
            };

            if k.is_empty() {
                return Err(invalid("empty field name"));
            }

            res.fields.push((k.to_ascii_uppercase(), v.to_owned()));
        }

        Ok(res)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Only the requested fields, in the order they appear in the header.
    pub fn select(&self, fields: &[String]) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .filter(|(k, _)| fields.iter().any(|f| f == k))
                .cloned()
                .collect(),
        }
    }

    /// Rebuild the header string.
    pub fn flatten(&self) -> String {
        let mut res = String::new();

        for (i, (k, v)) in self.fields.iter().enumerate() {
            if i == 0 && k == "ID" {
                res.push_str(v);
                continue;
            }
            res.push(FIELD_DELIM);
            res.push_str(k);
            res.push(VALUE_DELIM);
            res.push_str(v);
        }

        res
    }

    /// Repair a free-text header into a parseable one.
    ///
    /// Delimiter runs touching whitespace become a space, inner delimiter runs become `_` and
    /// whitespace runs collapse to one space. Returns `None` if the header is still invalid.
    pub fn convert(header: &str) -> Option<String> {
        if Self::parse(header).is_ok() {
            return Some(header.to_owned());
        }

        let d = regex::escape(&FIELD_DELIM.to_string());
        let end_re = Regex::new(&format!(r"(\s+{d}+\s+)|(\s+{d}+)|({d}+\s+)")).ok()?;
        let inner_re = Regex::new(&format!("{d}+")).ok()?;
        let space_re = Regex::new(r"\s+").ok()?;

        let converted = end_re.replace_all(header, " ");
        let converted = inner_re.replace_all(&converted, "_");
        let converted = space_re.replace_all(&converted, " ").into_owned();

        Self::parse(&converted).ok().map(|_| converted)
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.flatten())
    }
}
