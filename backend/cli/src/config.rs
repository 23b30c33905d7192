use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use devhelper_config::DevHelperConfig;
use devhelper_gateway::ReconnectPolicy;

/// Everything `serve` needs, resolved from the config file plus CLI flags.
#[derive(Debug, Clone)]
pub struct ServeSettings {
    pub token: String,
    pub addr: SocketAddr,
    pub policy: ReconnectPolicy,
}

impl ServeSettings {
    /// Flags win over the file; the file has already had env overrides and
    /// defaults applied.
    pub fn resolve(config: &DevHelperConfig, port: Option<u16>, bind: Option<IpAddr>) -> Result<Self> {
        let token = config
            .bot_token()
            .map(str::to_string)
            .context("No Discord bot token configured")?;

        let http = config.http();
        let bind = match bind {
            Some(ip) => ip,
            None => http
                .bind
                .as_deref()
                .unwrap_or(devhelper_config::defaults::DEFAULT_HTTP_BIND)
                .parse()
                .context("Invalid http.bind address")?,
        };
        let port = port
            .or(http.port)
            .unwrap_or(devhelper_config::defaults::DEFAULT_HTTP_PORT);

        Ok(Self {
            token,
            addr: SocketAddr::new(bind, port),
            policy: reconnect_policy(config),
        })
    }
}

pub fn reconnect_policy(config: &DevHelperConfig) -> ReconnectPolicy {
    let s = config.supervisor();
    let base = ReconnectPolicy::default();
    ReconnectPolicy {
        max_attempts: s.max_reconnect_attempts.unwrap_or(base.max_attempts),
        base_delay_ms: s.reconnect_base_ms.unwrap_or(base.base_delay_ms),
        max_delay_ms: s.reconnect_cap_ms.unwrap_or(base.max_delay_ms),
        error_delay_ms: s.error_recovery_delay_ms.unwrap_or(base.error_delay_ms),
        probe_interval_secs: s.probe_interval_secs.unwrap_or(base.probe_interval_secs),
    }
}
