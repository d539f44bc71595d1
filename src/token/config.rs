//! Token lifetime configuration.

use std::time::Duration;

const DEFAULT_LOGIN_TTL: Duration = Duration::from_secs(15 * 60);
const DEFAULT_LOGIN_GRACE: Duration = Duration::from_secs(3 * 60);
const DEFAULT_TWOFACTOR_TTL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_U2F_TTL: Duration = Duration::from_secs(10 * 60);
const DEFAULT_DASHBOARD_TTL: Duration = Duration::from_secs(3 * 60 * 60);

/// Lifetimes for every token kind. The defaults are the production values;
/// tests shrink them to exercise expiry.
#[derive(Clone, Debug)]
pub struct TokenConfig {
    login_ttl: Duration,
    login_grace: Duration,
    twofactor_ttl: Duration,
    u2f_ttl: Duration,
    dashboard_ttl: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            login_ttl: DEFAULT_LOGIN_TTL,
            login_grace: DEFAULT_LOGIN_GRACE,
            twofactor_ttl: DEFAULT_TWOFACTOR_TTL,
            u2f_ttl: DEFAULT_U2F_TTL,
            dashboard_ttl: DEFAULT_DASHBOARD_TTL,
        }
    }
}

impl TokenConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_login_ttl(mut self, ttl: Duration) -> Self {
        self.login_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_login_grace(mut self, grace: Duration) -> Self {
        self.login_grace = grace;
        self
    }

    #[must_use]
    pub fn with_twofactor_ttl(mut self, ttl: Duration) -> Self {
        self.twofactor_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_u2f_ttl(mut self, ttl: Duration) -> Self {
        self.u2f_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_dashboard_ttl(mut self, ttl: Duration) -> Self {
        self.dashboard_ttl = ttl;
        self
    }

    /// Full lifetime of a login session: nominal TTL plus the grace window.
    #[must_use]
    pub fn login_lifetime(&self) -> Duration {
        self.login_ttl + self.login_grace
    }

    #[must_use]
    pub fn login_grace(&self) -> Duration {
        self.login_grace
    }

    #[must_use]
    pub fn twofactor_ttl(&self) -> Duration {
        self.twofactor_ttl
    }

    #[must_use]
    pub fn u2f_ttl(&self) -> Duration {
        self.u2f_ttl
    }

    #[must_use]
    pub fn dashboard_ttl(&self) -> Duration {
        self.dashboard_ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_lifetimes() {
        let config = TokenConfig::new();
        assert_eq!(config.login_lifetime(), Duration::from_secs(18 * 60));
        assert_eq!(config.twofactor_ttl(), Duration::from_secs(5 * 60));
        assert_eq!(config.u2f_ttl(), Duration::from_secs(10 * 60));
        assert_eq!(config.dashboard_ttl(), Duration::from_secs(3 * 60 * 60));
    }

    #[test]
    fn overrides_apply() {
        let config = TokenConfig::new()
            .with_login_ttl(Duration::from_millis(20))
            .with_login_grace(Duration::from_millis(5));
        assert_eq!(config.login_lifetime(), Duration::from_millis(25));
    }
}
