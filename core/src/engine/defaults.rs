use crate::config::{site, SiteConfig};

const ENGINE_DEFAULTS_YAML: &str = include_str!("../../assets/engine_defaults.yml");

/// The engine's own default site configuration, the lowest merge layer.
pub fn engine_default_config() -> SiteConfig {
    match site::parse(ENGINE_DEFAULTS_YAML) {
        Ok(conf) => conf,
        Err(e) => {
            tracing::warn!(error = %e, "bundled engine defaults are unreadable");
            SiteConfig::new()
        }
    }
}
