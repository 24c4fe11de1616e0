use shared::{NetcodeError, MAX_SNAPSHOT_ENTITIES};
use std::time::Duration;

/// Server settings, filled from the command line by the binary
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Physics ticks per second; inbound commands are applied once per tick
    pub physics_rate: u32,
    /// Snapshot broadcasts per second, independent of the physics rate
    pub network_rate: u32,
    /// At most `MAX_SNAPSHOT_ENTITIES`, so every snapshot fits one datagram
    pub max_clients: usize,
    /// Silence after which a peer is disconnected
    pub client_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            physics_rate: 60,
            network_rate: 20,
            max_clients: 16,
            client_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    pub fn physics_period(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.physics_rate.max(1)))
    }

    pub fn network_period(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.network_rate.max(1)))
    }

    pub fn validate(&self) -> shared::Result<()> {
        if self.physics_rate == 0 || self.network_rate == 0 {
            return Err(NetcodeError::InvalidConfig(
                "tick rates must be greater than zero".to_string(),
            ));
        }

        if self.max_clients == 0 || self.max_clients > MAX_SNAPSHOT_ENTITIES {
            return Err(NetcodeError::InvalidConfig(format!(
                "max clients must be between 1 and {}",
                MAX_SNAPSHOT_ENTITIES
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rates_are_decoupled() {
        let config = ServerConfig::default();
        assert_eq!(config.physics_rate, 60);
        assert_eq!(config.network_rate, 20);
        assert!(config.network_period() > config.physics_period());
    }

    #[test]
    fn test_periods() {
        let config = ServerConfig {
            physics_rate: 50,
            network_rate: 10,
            ..ServerConfig::default()
        };
        assert_eq!(config.physics_period(), Duration::from_millis(20));
        assert_eq!(config.network_period(), Duration::from_millis(100));
    }

    #[test]
    fn test_zero_rate_is_clamped() {
        let config = ServerConfig {
            network_rate: 0,
            ..ServerConfig::default()
        };
        assert_eq!(config.network_period(), Duration::from_secs(1));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_max_clients_bounded_by_snapshot_capacity() {
        let at_limit = ServerConfig {
            max_clients: MAX_SNAPSHOT_ENTITIES,
            ..ServerConfig::default()
        };
        assert!(at_limit.validate().is_ok());

        let over_limit = ServerConfig {
            max_clients: MAX_SNAPSHOT_ENTITIES + 1,
            ..ServerConfig::default()
        };
        assert!(matches!(
            over_limit.validate(),
            Err(NetcodeError::InvalidConfig(_))
        ));

        let none = ServerConfig {
            max_clients: 0,
            ..ServerConfig::default()
        };
        assert!(none.validate().is_err());
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        let config = ServerConfig {
            physics_rate: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
