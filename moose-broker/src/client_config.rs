//! Translates a [`moose_core::config::BrokerConfig`] into an
//! `rdkafka::ClientConfig`: broker list, SASL property set, and
//! security-protocol defaulting.

use moose_core::config::ConfigRegistry;
use rdkafka::ClientConfig;

/// Base client config shared by producers and consumers: broker list,
/// SASL credentials (if any), and security protocol.
///
/// Defaults `security.protocol` to `sasl_ssl` when SASL credentials are
/// present and no protocol was set explicitly, `plaintext` otherwise.
pub fn base_client_config(registry: &ConfigRegistry) -> ClientConfig {
    let broker = &registry.broker;
    let mut config = ClientConfig::new();
    config.set("bootstrap.servers", &broker.broker);

    let has_sasl = broker.sasl_username.is_some() && broker.sasl_password.is_some();
    let protocol = broker.security_protocol.clone().unwrap_or_else(|| {
        if has_sasl {
            "sasl_ssl".to_string()
        } else {
            "plaintext".to_string()
        }
    });
    config.set("security.protocol", &protocol);

    if let Some(username) = &broker.sasl_username {
        config.set("sasl.username", username);
    }
    if let Some(password) = &broker.sasl_password {
        config.set("sasl.password", password);
    }
    if let Some(mechanism) = &broker.sasl_mechanism {
        config.set("sasl.mechanism", mechanism);
    } else if has_sasl {
        config.set("sasl.mechanism", "PLAIN");
    }

    config
}

/// `client.id`, namespaced by hostname so multiple workers on the same
/// broker list are distinguishable in broker-side logs and metrics.
pub fn client_id(registry: &ConfigRegistry, role: &str) -> String {
    format!("{}-{role}-{}", registry.hostname, role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use moose_core::config::{AuthConfig, BrokerConfig, ClickhouseConfig, ConfigRegistry};

    fn registry_with(broker: BrokerConfig) -> ConfigRegistry {
        ConfigRegistry::from_parts(ClickhouseConfig::default(), broker, AuthConfig::default())
    }

    #[test]
    fn defaults_to_plaintext_without_sasl() {
        let registry = registry_with(BrokerConfig {
            broker: "localhost:19092".into(),
            ..BrokerConfig::default()
        });
        let config = base_client_config(&registry);
        assert_eq!(config.get("security.protocol"), Some("plaintext"));
    }

    #[test]
    fn defaults_to_sasl_ssl_when_credentials_present() {
        let registry = registry_with(BrokerConfig {
            broker: "broker:9092".into(),
            sasl_username: Some("svc".into()),
            sasl_password: Some("secret".into()),
            ..BrokerConfig::default()
        });
        let config = base_client_config(&registry);
        assert_eq!(config.get("security.protocol"), Some("sasl_ssl"));
        assert_eq!(config.get("sasl.mechanism"), Some("PLAIN"));
    }

    #[test]
    fn explicit_security_protocol_wins() {
        let registry = registry_with(BrokerConfig {
            broker: "broker:9092".into(),
            security_protocol: Some("ssl".into()),
            ..BrokerConfig::default()
        });
        let config = base_client_config(&registry);
        assert_eq!(config.get("security.protocol"), Some("ssl"));
    }
}
