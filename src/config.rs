//! Configuration-string parsing (§6). The string itself is opaque to the
//! surrounding transport's filter registry (out of scope, §1); only the key
//! table below is this crate's concern.

use crate::error::ConfigError;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    pub k: usize,
    pub m: usize,
    /// `None` disables the send-side flush deadline (`timeout=0`).
    pub timeout: Option<Duration>,
}

impl FilterConfig {
    /// Parses a flat `key=value` option string (keys separated by `,` or
    /// `;`, key/value separated by `=` or `:`), recognizing the keys in
    /// §6's table. `k`/`cols` is mandatory; `m`/`rows`/`parity` defaults to
    /// 1; `timeout` defaults to disabled.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let mut k: Option<usize> = None;
        let mut m: Option<usize> = None;
        let mut timeout_ms: Option<u64> = None;

        for entry in s.split([',', ';']) {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (key, value) = entry
                .split_once(['=', ':'])
                .ok_or_else(|| ConfigError::UnknownKey(entry.to_string()))?;
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "cols" | "k" => {
                    k = Some(parse_usize(&key, value)?);
                }
                "rows" | "parity" | "m" => {
                    m = Some(parse_usize(&key, value)?);
                }
                "timeout" => {
                    timeout_ms = Some(parse_u64("timeout", value)?);
                }
                _ => return Err(ConfigError::UnknownKey(key)),
            }
        }

        let k = k.ok_or(ConfigError::MissingKey("cols"))?;
        let m = m.unwrap_or(1);

        if k == 0 || k > 255 || m == 0 || m > 255 {
            return Err(ConfigError::OutOfRange { k, m });
        }
        let sum = k + m;
        if sum > 255 {
            return Err(ConfigError::SumTooLarge { sum });
        }

        let timeout = match timeout_ms {
            None | Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
        };

        Ok(FilterConfig { k, m, timeout })
    }

    pub fn n(&self) -> usize {
        self.k + self.m
    }
}

fn parse_usize(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    value
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidValue { key, value: value.to_string() })
}

fn parse_u64(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidValue { key, value: value.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let cfg = FilterConfig::parse("k=4").unwrap();
        assert_eq!(cfg.k, 4);
        assert_eq!(cfg.m, 1);
        assert_eq!(cfg.timeout, None);
    }

    #[test]
    fn accepts_alias_keys_and_colon_separator() {
        let cfg = FilterConfig::parse("cols:4,rows:2,timeout:0").unwrap();
        assert_eq!(cfg.k, 4);
        assert_eq!(cfg.m, 2);
        assert_eq!(cfg.timeout, None);
    }

    #[test]
    fn nonzero_timeout_is_kept() {
        let cfg = FilterConfig::parse("k=4,m=2,timeout=50").unwrap();
        assert_eq!(cfg.timeout, Some(Duration::from_millis(50)));
    }

    #[test]
    fn rejects_oversized_sum() {
        let err = FilterConfig::parse("k=200,m=100").unwrap_err();
        assert_eq!(err, ConfigError::SumTooLarge { sum: 300 });
    }

    #[test]
    fn rejects_missing_k() {
        let err = FilterConfig::parse("m=2").unwrap_err();
        assert_eq!(err, ConfigError::MissingKey("cols"));
    }

    #[test]
    fn rejects_unknown_key() {
        assert!(matches!(FilterConfig::parse("k=4,bogus=1"), Err(ConfigError::UnknownKey(_))));
    }
}
