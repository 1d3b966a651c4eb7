//! Thread-local cache of compiled templates
//!
//! Templates compiled through [`get_or_compile`] are memoized per
//! `(open character, source)` so repeated `view` calls and the convenience
//! [`render`](crate::render) function compile each template only once per
//! thread. Compiled templates are cheap to clone.
//!
//! Entries are never evicted; [`clear_cache`] drops them all.

use crate::error::Error;
use crate::template::{CompiledTemplate, Compiler};
use hashbrown::{Equivalent, HashMap};
use std::cell::RefCell;

type Key = (char, String);

/// Borrowed form of [`Key`] so lookups don't allocate
#[derive(Hash)]
struct KeyRef<'a>(char, &'a str);

impl Equivalent<Key> for KeyRef<'_> {
    fn equivalent(&self, key: &Key) -> bool {
        self.0 == key.0 && self.1 == key.1
    }
}

thread_local! {
    /// Thread-local cache of compiled templates
    static TEMPLATE_CACHE: RefCell<HashMap<Key, CompiledTemplate, ahash::RandomState>> =
        RefCell::new(HashMap::default());
}

/// Get a compiled template, compiling and caching it on first use
///
/// Failed compiles are not cached.
///
/// # Arguments
/// * `source` - Template text
/// * `open` - Open character selecting the delimiter pair (`<` or `[`)
pub fn get_or_compile(source: &str, open: char) -> Result<CompiledTemplate, Error> {
    let cached = TEMPLATE_CACHE.with(|cache| cache.borrow().get(&KeyRef(open, source)).cloned());
    if let Some(template) = cached {
        log_debug!("template cache hit ({} bytes)", source.len());
        return Ok(template);
    }

    log_debug!("template cache miss ({} bytes)", source.len());
    let template = Compiler::new(source, open)?.compile()?;
    TEMPLATE_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .insert((open, source.to_string()), template.clone())
    });
    Ok(template)
}

/// Clear the template cache
pub fn clear_cache() {
    TEMPLATE_CACHE.with(|cache| cache.borrow_mut().clear());
}

/// Number of cached templates on this thread
pub fn cache_size() -> usize {
    TEMPLATE_CACHE.with(|cache| cache.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_compilation() {
        clear_cache();

        let t1 = get_or_compile("a<%= 1 %>", '<').unwrap();
        assert_eq!(cache_size(), 1);

        let t2 = get_or_compile("a<%= 1 %>", '<').unwrap();
        assert_eq!(cache_size(), 1);
        assert_eq!(t1.program_text(), t2.program_text());

        // Same text, other delimiter pair
        get_or_compile("a<%= 1 %>", '[').unwrap();
        assert_eq!(cache_size(), 2);
    }

    #[test]
    fn test_failed_compile_is_not_cached() {
        clear_cache();

        assert!(get_or_compile("<%= 1 + %>", '<').is_err());
        assert!(get_or_compile("x", '{').is_err());
        assert_eq!(cache_size(), 0);
    }
}
