//! Conversion engine configuration.
//!
//! [`ConversionConfig`] controls which rule families the classifier consults, how narrowing
//! numeric conversions behave on overflow, and whether negative outcomes are cached.
//!
//! # Configuration Presets
//!
//! - [`ConversionConfig::default()`] - Checked narrowing, every rule family enabled
//! - [`ConversionConfig::strict()`] - Checked narrowing, no host converters
//! - [`ConversionConfig::unchecked()`] - Narrowing keeps the low bits
//! - [`ConversionConfig::standard_only()`] - Only the standard conversions
//!
//! # Example
//!
//! ```rust
//! use dotconv::{config::ConversionConfig, converter::OverflowMode, ConversionEngine};
//!
//! let config = ConversionConfig::standard_only().with_overflow(OverflowMode::Unchecked);
//! let engine = ConversionEngine::with_config(config);
//! assert!(!engine.config().user_defined);
//! ```

use crate::converter::OverflowMode;

/// Configuration of a [`crate::ConversionEngine`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionConfig {
    /// Overflow behavior of converters returned by `converter()` and `convert()`
    pub overflow: OverflowMode,
    /// Consult user-defined conversion operators
    pub user_defined: bool,
    /// Consult host-registered converters and providers
    pub host_converters: bool,
    /// Cache pairs without a conversion, and ambiguous pairs
    ///
    /// Providers whose answers depend on external state need this disabled.
    pub cache_negative: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        ConversionConfig {
            overflow: OverflowMode::Checked,
            user_defined: true,
            host_converters: true,
            cache_negative: true,
        }
    }
}

impl ConversionConfig {
    /// Checked narrowing without host converters
    #[must_use]
    pub fn strict() -> Self {
        ConversionConfig {
            host_converters: false,
            ..Default::default()
        }
    }

    /// Narrowing conversions keep the low bits instead of failing
    #[must_use]
    pub fn unchecked() -> Self {
        ConversionConfig {
            overflow: OverflowMode::Unchecked,
            ..Default::default()
        }
    }

    /// Only identity, numeric, enumeration, nullable, boxing and reference conversions
    #[must_use]
    pub fn standard_only() -> Self {
        ConversionConfig {
            user_defined: false,
            host_converters: false,
            ..Default::default()
        }
    }

    /// Set the default overflow mode
    #[must_use]
    pub fn with_overflow(mut self, overflow: OverflowMode) -> Self {
        self.overflow = overflow;
        self
    }

    /// Enable or disable user-defined operators
    #[must_use]
    pub fn with_user_defined(mut self, enabled: bool) -> Self {
        self.user_defined = enabled;
        self
    }

    /// Enable or disable host converters
    #[must_use]
    pub fn with_host_converters(mut self, enabled: bool) -> Self {
        self.host_converters = enabled;
        self
    }

    /// Enable or disable caching of negative outcomes
    #[must_use]
    pub fn with_cache_negative(mut self, enabled: bool) -> Self {
        self.cache_negative = enabled;
        self
    }
}
