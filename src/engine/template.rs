//! `{placeholder}` substitution for task descriptions and command templates.
//!
//! - `{name}` substitutes the value of `name` (surrounding whitespace ignored)
//! - `{{` and `}}` render literal braces
//! - A lone `}` is copied through
//!
//! Undefined names are an error rather than an empty substitution, so a
//! misspelled input key is caught before anything runs.

use std::collections::BTreeMap;
use thiserror::Error;

/// Named values available to a template.
pub type Variables = BTreeMap<String, String>;

/// Template rendering failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("undefined variable '{name}' at position {position} (available: {available})")]
    UndefinedVariable {
        name: String,
        position: usize,
        available: String,
    },

    #[error("unmatched '{{' at position {position}")]
    UnmatchedBrace { position: usize },

    #[error("empty variable name '{{}}' at position {position}")]
    EmptyVariableName { position: usize },
}

/// Render `template`, substituting every placeholder from `variables`.
pub fn render_template(template: &str, variables: &Variables) -> Result<String, TemplateError> {
    let mut rendered = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                rendered.push('{');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, c)) => name.push(c),
                        None => return Err(TemplateError::UnmatchedBrace { position: pos }),
                    }
                }

                let name = name.trim();
                if name.is_empty() {
                    return Err(TemplateError::EmptyVariableName { position: pos });
                }

                match variables.get(name) {
                    Some(value) => rendered.push_str(value),
                    None => {
                        return Err(TemplateError::UndefinedVariable {
                            name: name.to_string(),
                            position: pos,
                            available: available(variables),
                        });
                    }
                }
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                }
                rendered.push('}');
            }
            _ => rendered.push(ch),
        }
    }

    Ok(rendered)
}

/// Build a variables map from key-value pairs.
pub fn vars<I, K, V>(pairs: I) -> Variables
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

fn available(variables: &Variables) -> String {
    if variables.is_empty() {
        "none".to_string()
    } else {
        variables.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
    }
}
