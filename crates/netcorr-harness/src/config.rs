//! Configuration loading and resolution.
//!
//! Every setting resolves flag > environment > default, so CI can steer the
//! harness without editing invocations.

/// Resolve the log level directive.
pub fn resolve_log_level(explicit: Option<&str>) -> String {
    if let Some(level) = explicit {
        return level.to_string();
    }
    std::env::var("NETCORR_LOG").unwrap_or_else(|_| "info".to_string())
}

/// Resolve the passphrase protecting stored credentials.
pub fn resolve_secret_key(explicit: Option<&str>) -> Option<String> {
    if let Some(key) = explicit {
        return Some(key.to_string());
    }
    std::env::var("NETCORR_SECRET_KEY").ok()
}

/// Resolve the recorded-traffic file to replay.
pub fn resolve_replay_path(explicit: Option<&str>) -> String {
    if let Some(path) = explicit {
        return path.to_string();
    }
    std::env::var("NETCORR_REPLAY_FILE").unwrap_or_else(|_| "netcorr-replay.json".to_string())
}
