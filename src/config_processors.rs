use justconfig::error::ConfigError;
use justconfig::item::{MapAction, StringItem};

/// Strips one pair of matching quotes around configuration strings.
pub trait Unquote
where
    Self: Sized,
{
    fn unquote(self) -> Result<StringItem, ConfigError>;
}

impl Unquote for Result<StringItem, ConfigError> {
    /// Trims the value and removes a surrounding pair of `"` or `'`. Unquoted values are
    /// kept as they are, so paths and algorithm names may be written either way.
    fn unquote(self) -> Result<StringItem, ConfigError> {
        self?.map(|v| match strip_quotes(v) {
            Some(inner) => MapAction::Replace(vec![inner.to_owned()]),
            None => MapAction::Keep,
        })
    }
}

fn strip_quotes(value: &str) -> Option<&str> {
    let value = value.trim();
    ['"', '\''].iter().find_map(|quote| {
        value
            .strip_prefix(*quote)
            .and_then(|rest| rest.strip_suffix(*quote))
    })
}

#[cfg(test)]
mod config_processors_test {
    use super::*;

    #[test]
    fn should_strip_matching_quotes_only() {
        assert_eq!(Some("abc"), strip_quotes(" \"abc\" "));
        assert_eq!(Some("u.data"), strip_quotes("'u.data'"));
        assert_eq!(None, strip_quotes("\"abc'"));
        assert_eq!(None, strip_quotes("plain"));
    }
}
