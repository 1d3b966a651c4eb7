//! Renderer binding a compiled template to the built-in helpers
//!
//! [`Renderer::render`] resolves identifiers against the data object first
//! and the helper set second. Caller-supplied helpers are merged over the
//! built-in `to_text` and `view`, so a same-named extra helper wins.

use crate::error::RenderError;
use crate::helpers::HelperSet;
use crate::options::RenderOptions;
use crate::template::compiler::CompiledTemplate;
use crate::value::Value;

/// A compiled template ready to render with the built-in helpers
#[derive(Debug, Clone)]
pub struct Renderer {
    template: CompiledTemplate,
    options: RenderOptions,
    helpers: HelperSet,
}

impl Renderer {
    /// Create a renderer with default options
    pub fn new(template: CompiledTemplate) -> Self {
        Self {
            template,
            options: RenderOptions::default(),
            helpers: HelperSet::builtin(),
        }
    }

    /// Set render options
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// The wrapped template
    pub fn template(&self) -> &CompiledTemplate {
        &self.template
    }

    /// The render options
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render `data`, with `extra_helpers` merged over the built-in helpers
    pub fn render(&self, data: &Value, extra_helpers: &HelperSet) -> Result<String, RenderError> {
        if extra_helpers.is_empty() {
            return self.template.render_with(data, &self.helpers, &self.options);
        }
        let helpers = self.helpers.merged(extra_helpers);
        self.template.render_with(data, &helpers, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Compiler;

    fn renderer(source: &str) -> Renderer {
        Renderer::new(Compiler::new(source, '<').unwrap().compile().unwrap())
    }

    #[test]
    fn test_builtin_helpers_available() {
        let out = renderer("<%= to_text(note) %>")
            .render(&Value::hash(vec![("note", Value::string("a\nb"))]), &HelperSet::new())
            .unwrap();
        assert_eq!(out, "a<br />b");
    }

    #[test]
    fn test_extra_helpers_override_builtins() {
        let extra = HelperSet::new().with_fn("to_text", |_, _| Ok(Value::string("custom")));
        let out = renderer("<%= to_text(1) %>").render(&Value::Nil, &extra).unwrap();
        assert_eq!(out, "custom");
    }

    #[test]
    fn test_null_text_option() {
        let out = renderer("[<%= missing_value %>]")
            .with_options(RenderOptions::new().with_null_text("?"))
            .render(&Value::hash(vec![("missing_value", Value::Nil)]), &HelperSet::new())
            .unwrap();
        assert_eq!(out, "[?]");
    }
}
