// src/action/template.rs

//! `%(name)s` placeholder expansion for shell commands.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::errors::{DagError, Result};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%(?:\((?P<key>[A-Za-z_][A-Za-z0-9_]*)\)s|%)")
        .expect("placeholder pattern is valid")
});

/// Replace every `%(key)s` in `template` with `values[key]`; `%%` yields `%`.
///
/// A placeholder without a value is an error rather than being left in place.
pub fn expand(template: &str, values: &BTreeMap<String, String>) -> Result<String> {
    let mut missing: Option<String> = None;

    let expanded = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        match caps.name("key") {
            None => "%".to_string(),
            Some(key) => match values.get(key.as_str()) {
                Some(value) => value.clone(),
                None => {
                    missing.get_or_insert_with(|| key.as_str().to_string());
                    String::new()
                }
            },
        }
    });

    match missing {
        Some(key) => Err(DagError::InvalidAction(format!(
            "command `{template}` references unknown placeholder '{key}'"
        ))),
        None => Ok(expanded.into_owned()),
    }
}
