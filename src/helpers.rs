//! Helper scope for template rendering
//!
//! A [`HelperSet`] maps names to plain values or native functions. Templates
//! reach helpers as bare identifiers (after locals and data) or explicitly
//! through `helpers.name(...)`.
//!
//! Two helpers are built in:
//!
//! - `to_text(value, null_text?)` - display text for HTML output
//! - `view(template_or_options, data?, helpers?)` - render another template
//!
//! # Example
//!
//! ```rust
//! use ejs::{HelperSet, Renderer, Compiler, Value};
//!
//! let mut helpers = HelperSet::new();
//! helpers.insert_fn("shout", |_ctx, args| {
//!     let text = args.first().map(|v| v.to_string()).unwrap_or_default();
//!     Ok(Value::string(text.to_uppercase()))
//! });
//!
//! let template = Compiler::new("<%= shout(name) %>!", '<').unwrap().compile().unwrap();
//! let data = Value::hash(vec![("name", Value::string("hey"))]);
//! assert_eq!(Renderer::new(template).render(&data, &helpers).unwrap(), "HEY!");
//! ```

use crate::cache;
use crate::error::RenderError;
use crate::options::RenderOptions;
use crate::value::Value;
use hashbrown::HashMap;
use std::fmt;
use std::sync::Arc;

/// Native helper function
pub type HelperFn =
    Arc<dyn Fn(&HelperContext<'_>, &[Value]) -> Result<Value, RenderError> + Send + Sync>;

/// A helper: a plain value or a callable
#[derive(Clone)]
pub enum Helper {
    /// Value visible as a bare identifier
    Value(Value),
    /// Function callable from templates
    Function(HelperFn),
}

impl fmt::Debug for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Helper::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Helper::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// What a helper function sees of the render that called it
#[derive(Debug, Clone, Copy)]
pub struct HelperContext<'a> {
    /// Data object of the calling render
    pub data: &'a Value,
    /// Helper set of the calling render
    pub helpers: &'a HelperSet,
    /// Options of the calling render
    pub options: &'a RenderOptions,
    /// Nesting depth of the calling render (0 for top level)
    pub depth: usize,
}

/// Named helpers available to a render
#[derive(Debug, Clone, Default)]
pub struct HelperSet {
    entries: HashMap<String, Helper, ahash::RandomState>,
}

impl HelperSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding the built-in `to_text` and `view` helpers
    pub fn builtin() -> Self {
        Self::new().with_fn("to_text", to_text).with_fn("view", view)
    }

    /// Register a function helper
    pub fn insert_fn<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&HelperContext<'_>, &[Value]) -> Result<Value, RenderError> + Send + Sync + 'static,
    {
        self.entries
            .insert(name.into(), Helper::Function(Arc::new(function)));
    }

    /// Register a value helper
    pub fn insert_value(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(name.into(), Helper::Value(value.into()));
    }

    /// Builder form of [`insert_fn`](Self::insert_fn)
    pub fn with_fn<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&HelperContext<'_>, &[Value]) -> Result<Value, RenderError> + Send + Sync + 'static,
    {
        self.insert_fn(name, function);
        self
    }

    /// Builder form of [`insert_value`](Self::insert_value)
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert_value(name, value);
        self
    }

    /// Look up a helper
    pub fn get(&self, name: &str) -> Option<&Helper> {
        self.entries.get(name)
    }

    /// Whether a helper with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Copy every entry of `other` into this set, replacing same-named ones
    pub fn merge(&mut self, other: &HelperSet) {
        for (name, helper) in &other.entries {
            self.entries.insert(name.clone(), helper.clone());
        }
    }

    /// This set with `other` merged over it
    pub fn merged(&self, other: &HelperSet) -> HelperSet {
        let mut merged = self.clone();
        merged.merge(other);
        merged
    }

    /// Number of helpers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Text for HTML output: null becomes the placeholder, newlines become
/// `<br />` and doubled single quotes collapse
pub fn to_text(ctx: &HelperContext<'_>, args: &[Value]) -> Result<Value, RenderError> {
    let value = args.first().unwrap_or(&Value::Nil);
    let text = match value {
        Value::Nil => match args.get(1) {
            Some(Value::String(placeholder)) => placeholder.clone(),
            Some(Value::Nil) | None => ctx.options.null_text.clone(),
            Some(other) => other.to_string(),
        },
        other => other.to_string().replace('\n', "<br />").replace("''", "'"),
    };
    Ok(Value::String(text))
}

/// Render another template, inheriting data and helpers unless overridden
///
/// Templates are compiled through the thread-local [`cache`], which keeps
/// one entry per distinct template text and never evicts. When template text
/// is built at render time (`view('Hi ' + name)`), call
/// [`cache::clear_cache`] between batches to release it.
pub fn view(ctx: &HelperContext<'_>, args: &[Value]) -> Result<Value, RenderError> {
    let mut open = '<';
    let mut data = args.get(1).filter(|v| !v.is_nil());
    let mut extra = args.get(2).filter(|v| !v.is_nil());

    let text = match args.first() {
        Some(Value::String(text)) => text.as_str(),
        Some(Value::Hash(options)) => {
            let text = options
                .get("text")
                .and_then(Value::as_str)
                .ok_or_else(|| RenderError::invalid_argument("view", "options need a 'text' string"))?;
            if let Some(value) = options.get("open").filter(|v| !v.is_nil()) {
                open = value
                    .as_str()
                    .and_then(|s| s.chars().next())
                    .ok_or_else(|| RenderError::invalid_argument("view", "'open' must be a string"))?;
            }
            data = data.or_else(|| options.get("data").filter(|v| !v.is_nil()));
            extra = extra.or_else(|| options.get("helpers").filter(|v| !v.is_nil()));
            text
        }
        Some(other) => {
            return Err(RenderError::invalid_argument(
                "view",
                format!("expected template text or options, got {}", other.type_name()),
            ))
        }
        None => return Err(RenderError::invalid_argument("view", "missing template")),
    };

    let template = cache::get_or_compile(text, open).map_err(|e| RenderError::Template(Box::new(e)))?;
    let data = data.unwrap_or(ctx.data);

    let rendered = match extra {
        Some(Value::Hash(values)) => {
            let mut helpers = ctx.helpers.clone();
            for (name, value) in values {
                helpers.insert_value(name.clone(), value.clone());
            }
            template.render_nested(data, &helpers, ctx.options, ctx.depth + 1)
        }
        Some(other) => {
            return Err(RenderError::invalid_argument(
                "view",
                format!("helpers must be an object, got {}", other.type_name()),
            ))
        }
        None => template.render_nested(data, ctx.helpers, ctx.options, ctx.depth + 1),
    };

    rendered.map(Value::String).map_err(|e| match e {
        // Limits are reported as-is so the outermost caller sees the cause
        RenderError::DepthExceeded(_) | RenderError::Template(_) => e,
        other => RenderError::Template(Box::new(other.into())),
    })
}
