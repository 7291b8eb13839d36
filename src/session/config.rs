//! Session configuration

use std::time::Duration;

use crate::contract::ContractConfig;
use crate::sequencer::DEFAULT_SETTLE_DELAY;
use crate::transport::pulse::DEFAULT_PULSE_WIDTH;

/// Control session options
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a pulse holds its boolean join high
    pub pulse_width: Duration,

    /// Wait after a microphone command before the next one for that microphone
    pub settle_delay: Duration,

    /// Control channel must come up within this time after `begin_connect`
    pub connection_timeout: Duration,

    /// Signal naming for the generated contract
    pub contract: ContractConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pulse_width: DEFAULT_PULSE_WIDTH,
            settle_delay: DEFAULT_SETTLE_DELAY,
            connection_timeout: Duration::from_secs(8),
            contract: ContractConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Set the pulse width
    pub fn pulse_width(mut self, width: Duration) -> Self {
        self.pulse_width = width;
        self
    }

    /// Set the settle delay
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Set connection timeout
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the contract naming
    pub fn contract(mut self, contract: ContractConfig) -> Self {
        self.contract = contract;
        self
    }
}
