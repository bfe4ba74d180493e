//! `${VAR}` expansion for configuration strings.

use std::borrow::Cow;

use crate::ConfigError;

/// Expand environment variable references in a string.
///
/// Supports:
/// - `${VAR}` - expands to the value of VAR, errors if unset
/// - `${VAR:-default}` - expands to VAR if set, otherwise uses default
///
/// Bare `$VAR` is left alone.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| std::env::var(var).map(Some))
        .map(Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_expand_with_default_uses_value() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("SSG_TEST_OUT_DIR", "public");
        }
        let result = expand_env("${SSG_TEST_OUT_DIR:-dist}", "site.output_dir").unwrap();
        assert_eq!(result, "public");
        unsafe {
            std::env::remove_var("SSG_TEST_OUT_DIR");
        }
    }

    #[test]
    fn test_expand_with_default_uses_default() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("SSG_TEST_UNSET_DIR");
        }
        let result = expand_env("${SSG_TEST_UNSET_DIR:-dist}", "site.output_dir").unwrap();
        assert_eq!(result, "dist");
    }

    #[test]
    fn test_expand_embedded_var() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("SSG_TEST_THEME", "dark");
        }
        let result = expand_env("themes/${SSG_TEST_THEME}/layouts", "layouts.dir").unwrap();
        assert_eq!(result, "themes/dark/layouts");
        unsafe {
            std::env::remove_var("SSG_TEST_THEME");
        }
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("SSG_TEST_MISSING");
        }
        let err = expand_env("${SSG_TEST_MISSING}", "partials.dir").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("SSG_TEST_MISSING"));
        assert!(err.to_string().contains("partials.dir"));
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        assert_eq!(expand_env("$HOME/site", "site.source_dir").unwrap(), "$HOME/site");
    }
}
