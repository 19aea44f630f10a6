//! Checker configuration.

use quill_registry::TypeSizes;

/// Settings for one checking session.
///
/// # Example
///
/// ```
/// use quill_checker::CheckerConfig;
///
/// let config = CheckerConfig::default()
///     .with_word_size(4)
///     .with_require_main(true);
/// assert_eq!(config.type_sizes().word_size, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerConfig {
    /// Size of `int`, `uint`, `rawptr` and pointers in bytes
    pub word_size: i64,
    /// Upper bound for any alignment
    pub max_align: i64,
    /// Whether constant indices are bounds checked outside `#no_bounds_check`
    pub bounds_check: bool,
    /// Value of the `QUILL_OS` constant
    pub target_os: String,
    /// Value of the `QUILL_ARCH` constant
    pub target_arch: String,
    /// The initial package must declare `main :: proc()`
    pub require_main: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            word_size: 8,
            max_align: 16,
            bounds_check: true,
            target_os: "linux".to_string(),
            target_arch: "amd64".to_string(),
            require_main: false,
        }
    }
}

impl CheckerConfig {
    pub fn with_word_size(mut self, word_size: i64) -> Self {
        self.word_size = word_size;
        self
    }

    pub fn with_max_align(mut self, max_align: i64) -> Self {
        self.max_align = max_align;
        self
    }

    pub fn with_bounds_check(mut self, bounds_check: bool) -> Self {
        self.bounds_check = bounds_check;
        self
    }

    pub fn with_target(mut self, os: impl Into<String>, arch: impl Into<String>) -> Self {
        self.target_os = os.into();
        self.target_arch = arch.into();
        self
    }

    pub fn with_require_main(mut self, require_main: bool) -> Self {
        self.require_main = require_main;
        self
    }

    /// Layout sizes derived from this configuration.
    pub fn type_sizes(&self) -> TypeSizes {
        TypeSizes {
            word_size: self.word_size,
            max_align: self.max_align,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_64_bit_target() {
        let config = CheckerConfig::default();
        assert_eq!(config.type_sizes(), TypeSizes::default());
        assert!(config.bounds_check);
        assert!(!config.require_main);
    }

    #[test]
    fn builder_methods_override() {
        let config = CheckerConfig::default()
            .with_max_align(8)
            .with_bounds_check(false)
            .with_target("windows", "x86");
        assert_eq!(config.max_align, 8);
        assert!(!config.bounds_check);
        assert_eq!(config.target_os, "windows");
        assert_eq!(config.target_arch, "x86");
    }
}
