// Copyright 2024 RustFS Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::env;
use tracing::warn;

/// Parses a boolean flag the way every `RUSTFS_*` switch is parsed.
/// Unrecognised values yield `None`.
fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn get_env_usize(key: &str, default: usize) -> usize {
    let Ok(v) = env::var(key) else {
        return default;
    };
    v.trim().parse().unwrap_or_else(|_| {
        warn!("invalid value for {}: {:?}, using default {}", key, v, default);
        default
    })
}

pub fn get_env_opt_bool(key: &str) -> Option<bool> {
    let v = env::var(key).ok()?;
    let parsed = parse_bool(&v);
    if parsed.is_none() {
        warn!("invalid boolean for {}: {:?}, ignoring", key, v);
    }
    parsed
}

pub fn get_env_bool(key: &str, default: bool) -> bool {
    get_env_opt_bool(key).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_values() {
        for v in ["1", "true", "TRUE", "yes", "on", " true "] {
            assert_eq!(parse_bool(v), Some(true), "{v}");
        }
        for v in ["0", "false", "No", "off"] {
            assert_eq!(parse_bool(v), Some(false), "{v}");
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let key = "RUSTFS_UTILS_TEST_SURELY_UNSET_KEY";
        assert!(get_env_bool(key, true));
        assert!(!get_env_bool(key, false));
        assert_eq!(get_env_usize(key, 42), 42);
        assert_eq!(get_env_opt_bool(key), None);
    }
}
