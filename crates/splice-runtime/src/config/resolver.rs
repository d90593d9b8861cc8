//! Configuration resolver trait for layered overrides.
//!
//! ```text
//! ConfigLoader.load()  →  SpliceConfig (base)
//!                              │
//!                              ▼
//!                     ConfigResolver.apply()
//!                              │
//!                              ▼
//!                     SpliceConfig (final)
//! ```

use super::SpliceConfig;

/// Trait for applying configuration overrides.
///
/// Separates config loading (file/env) from per-invocation overrides such as
/// CLI flags.
pub trait ConfigResolver {
    /// Applies overrides to the given configuration.
    ///
    /// Only values the caller actually set should be applied, preserving
    /// existing values for unspecified options.
    fn apply(&self, config: &mut SpliceConfig);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_resolver() {
        struct HiresResolver {
            hires: Option<bool>,
        }

        impl ConfigResolver for HiresResolver {
            fn apply(&self, config: &mut SpliceConfig) {
                if let Some(h) = self.hires {
                    config.sourcemap.hires = h;
                }
            }
        }

        let mut config = SpliceConfig::default();
        assert!(!config.sourcemap.hires);

        HiresResolver { hires: Some(true) }.apply(&mut config);
        assert!(config.sourcemap.hires);

        HiresResolver { hires: None }.apply(&mut config);
        assert!(config.sourcemap.hires);
    }
}
