//! One-time registry initialization

use super::Registry;
use std::fmt;
use std::sync::OnceLock;

/// A registry built on first access
///
/// The initializer runs at most once. Threads that arrive while it runs block
/// until it finishes and then see the same registry.
///
/// # Examples
///
/// ```
/// use rivet_log::{LazyRegistry, Registry, RegistryConfig};
///
/// let dir = tempfile::tempdir().unwrap();
/// let lazy = LazyRegistry::new(|| {
///     Registry::new(RegistryConfig::default().with_base_dir(dir.path()).with_console(false))
/// });
///
/// assert!(lazy.get_if_initialized().is_none());
/// let first: *const Registry = lazy.get();
/// let second: *const Registry = lazy.get();
/// assert_eq!(first, second);
/// ```
pub struct LazyRegistry<F = fn() -> Registry> {
    cell: OnceLock<Registry>,
    init: F,
}

impl<F> LazyRegistry<F> {
    pub const fn new(init: F) -> Self {
        Self {
            cell: OnceLock::new(),
            init,
        }
    }

    pub fn get_if_initialized(&self) -> Option<&Registry> {
        self.cell.get()
    }
}

impl<F> LazyRegistry<F>
where
    F: Fn() -> Registry,
{
    pub fn get(&self) -> &Registry {
        self.cell.get_or_init(|| (self.init)())
    }
}

impl<F> fmt::Debug for LazyRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRegistry")
            .field("initialized", &self.cell.get().is_some())
            .finish()
    }
}
