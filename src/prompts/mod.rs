//! Prompt templates
//!
//! System prompts are embedded from .pmt files; templated prompts (the
//! recovery seeds) are rendered through Handlebars.

pub mod embedded;

use eyre::{Context, Result};
use handlebars::Handlebars;
use serde::Serialize;

/// Render a prompt template with the given context
pub fn render<T: Serialize>(template: &str, context: &T) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
        .render_template(template, context)
        .context("Failed to render prompt template")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_render_substitutes_output() {
        let mut ctx = HashMap::new();
        ctx.insert("output", "undefined: Divide");

        let rendered = render(embedded::RECOVERY_BUILD, &ctx).unwrap();
        assert!(rendered.contains("undefined: Divide"));
        assert!(rendered.contains("Fix ONLY the reported errors"));
    }

    #[test]
    fn test_render_does_not_escape_html() {
        let mut ctx = HashMap::new();
        ctx.insert("output", "expected <T> but found &str");

        let rendered = render(embedded::RECOVERY_GENERIC, &ctx).unwrap();
        assert!(rendered.contains("expected <T> but found &str"));
    }
}
