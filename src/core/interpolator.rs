// src/core/interpolator.rs

use crate::models::BoundArgs;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use thiserror::Error;

lazy_static! {
    /// `{{name}}`, with optional whitespace inside the braces.
    static ref PLACEHOLDER_RE: Regex = Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterpolationError {
    #[error("Template references '{{{{{name}}}}}' but no argument with that name was bound: {template}")]
    UnboundPlaceholder { name: String, template: String },
}

/// Replaces every `{{name}}` in `template` with the bound value of `name`.
///
/// Substitution is single-pass: a value containing `{{...}}` is inserted literally.
///
/// # Arguments
/// * `template` - A command line with placeholders.
/// * `args` - The arguments bound for the command.
///
/// # Returns
/// The rendered line, or the first placeholder that has no bound value.
pub fn render(template: &str, args: &BoundArgs) -> Result<String, InterpolationError> {
    if let Some(name) = first_unbound(template, args) {
        return Err(InterpolationError::UnboundPlaceholder {
            name,
            template: template.to_string(),
        });
    }

    let rendered = PLACEHOLDER_RE.replace_all(template, |caps: &Captures| {
        // Every name was checked above.
        caps.get(1)
            .and_then(|name| args.get(name.as_str()))
            .map(|value| value.to_string())
            .unwrap_or_default()
    });
    Ok(rendered.into_owned())
}

/// Renders all templates, failing before anything is returned if any one is incomplete.
pub fn render_all(templates: &[String], args: &BoundArgs) -> Result<Vec<String>, InterpolationError> {
    templates.iter().map(|t| render(t, args)).collect()
}

/// Lists the placeholder names used in a template, in order of appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    PLACEHOLDER_RE
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

fn first_unbound(template: &str, args: &BoundArgs) -> Option<String> {
    placeholders(template)
        .into_iter()
        .find(|name| args.get(name).is_none())
        .map(str::to_string)
}
