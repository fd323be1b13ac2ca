// ── Kill switches ──
//
// `CHECKPOINT_DISABLE` and `CHECKPOINT_TIMEOUT` are read once per check,
// never cached, so an operator can flip them on a running process. Tests
// inject fixed values instead of mutating the process environment.

use std::time::Duration;

/// Disables all checking when set to any non-empty value.
pub const DISABLE_VAR: &str = "CHECKPOINT_DISABLE";

/// Integer milliseconds replacing the configured request timeout.
pub const TIMEOUT_VAR: &str = "CHECKPOINT_TIMEOUT";

/// Kill-switch values in effect for a single check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    pub disabled: bool,
    pub timeout: Option<Duration>,
}

impl Overrides {
    /// Read the kill switches from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the kill switches through an arbitrary variable lookup.
    ///
    /// A timeout that does not parse as a positive integer is ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let disabled = lookup(DISABLE_VAR).is_some_and(|v| !v.is_empty());
        let timeout = lookup(TIMEOUT_VAR)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);
        Self { disabled, timeout }
    }

    /// Kill switches that force every check off.
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            timeout: None,
        }
    }
}

/// Where a [`Checker`](crate::Checker) gets its kill switches from.
#[derive(Debug, Clone, Default)]
pub enum OverrideSource {
    /// Read the process environment at call time.
    #[default]
    Environment,
    /// Use these values for every call.
    Fixed(Overrides),
}

impl OverrideSource {
    pub fn resolve(&self) -> Overrides {
        match self {
            Self::Environment => Overrides::from_env(),
            Self::Fixed(overrides) => *overrides,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn unset_means_enabled_with_no_timeout() {
        assert_eq!(Overrides::from_lookup(lookup(&[])), Overrides::default());
    }

    #[test]
    fn any_non_empty_value_disables() {
        for value in ["1", "true", "0", "no"] {
            let o = Overrides::from_lookup(lookup(&[(DISABLE_VAR, value)]));
            assert!(o.disabled, "value {value:?} should disable");
        }
        let o = Overrides::from_lookup(lookup(&[(DISABLE_VAR, "")]));
        assert!(!o.disabled);
    }

    #[test]
    fn timeout_parses_milliseconds() {
        let o = Overrides::from_lookup(lookup(&[(TIMEOUT_VAR, "50")]));
        assert_eq!(o.timeout, Some(Duration::from_millis(50)));
    }

    #[test]
    fn unparsable_or_zero_timeout_is_ignored() {
        for value in ["", "abc", "-5", "0", "1.5"] {
            let o = Overrides::from_lookup(lookup(&[(TIMEOUT_VAR, value)]));
            assert_eq!(o.timeout, None, "value {value:?} should be ignored");
        }
    }

    #[test]
    fn fixed_source_ignores_environment() {
        let source = OverrideSource::Fixed(Overrides::disabled());
        assert!(source.resolve().disabled);
    }
}
