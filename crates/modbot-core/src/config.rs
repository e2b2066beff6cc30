use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, filter::BannedWordSet, permissions::PermissionPolicy, Result};

/// Typed configuration for the bot, read from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    pub banned_words: BannedWordSet,

    // Permission cache
    pub permission_ttl_granted: Duration,
    pub permission_ttl_denied: Duration,
    pub permission_cache_capacity: Option<usize>,
    /// `None` disables the periodic sweep; expiry is still checked on read.
    pub cache_sweep_interval: Option<Duration>,

    // Remote calls
    pub remote_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"))?;
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the process env in `load`).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = lookup("BOT_TOKEN")
            .and_then(non_empty)
            .or_else(|| lookup("TELEGRAM_BOT_TOKEN").and_then(non_empty))
            .ok_or_else(|| {
                Error::Config("BOT_TOKEN environment variable is required".to_string())
            })?;

        let words = parse_csv_lower(lookup("BANNED_WORDS"));
        for w in words.iter().filter(|w| w.split_whitespace().count() > 1) {
            tracing::warn!(word = %w, "banned word contains whitespace and can never match");
        }
        let banned_words = BannedWordSet::new(words);
        if banned_words.is_empty() {
            tracing::warn!("BANNED_WORDS is empty; no message will ever be deleted");
        }

        let defaults = PermissionPolicy::default();
        let permission_ttl_granted = parse_u64(&lookup, "PERMISSION_TTL_GRANTED_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.granted_ttl);
        let mut permission_ttl_denied = parse_u64(&lookup, "PERMISSION_TTL_DENIED_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.denied_ttl);
        // A missing right must never be trusted longer than a confirmed one.
        if permission_ttl_denied > permission_ttl_granted {
            tracing::warn!(
                denied_secs = permission_ttl_denied.as_secs(),
                granted_secs = permission_ttl_granted.as_secs(),
                "PERMISSION_TTL_DENIED_SECS exceeds PERMISSION_TTL_GRANTED_SECS; clamping"
            );
            permission_ttl_denied = permission_ttl_granted;
        }
        let permission_cache_capacity =
            parse_u64(&lookup, "PERMISSION_CACHE_CAPACITY").and_then(|n| match n {
                0 => None,
                n => match usize::try_from(n) {
                    Ok(cap) => Some(cap),
                    Err(_) => {
                        tracing::warn!(value = n, "PERMISSION_CACHE_CAPACITY too large; unbounded");
                        None
                    }
                },
            });
        let cache_sweep_interval = match parse_u64(&lookup, "CACHE_SWEEP_INTERVAL_SECS") {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(Duration::from_secs(3600)),
        };

        let remote_timeout = parse_u64(&lookup, "REMOTE_TIMEOUT_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.remote_timeout);

        Ok(Self {
            telegram_bot_token,
            banned_words,
            permission_ttl_granted,
            permission_ttl_denied,
            permission_cache_capacity,
            cache_sweep_interval,
            remote_timeout,
        })
    }

    pub fn permission_policy(&self) -> PermissionPolicy {
        PermissionPolicy {
            granted_ttl: self.permission_ttl_granted,
            denied_ttl: self.permission_ttl_denied,
            remote_timeout: self.remote_timeout,
        }
    }
}

/// Read `KEY=value` lines into the env without overriding existing vars.
/// A missing file is fine; any other read error is reported.
fn load_dotenv_if_present(path: &Path) -> Result<()> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::Io(e)),
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }

    Ok(())
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring non-numeric setting");
            None
        }
    }
}

fn parse_csv_lower(v: Option<String>) -> Vec<String> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
