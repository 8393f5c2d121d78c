use std::net::{Ipv4Addr, SocketAddr};

pub const DEFAULT_RELAY_PORT: u16 = 8000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub bind: SocketAddr,
}

impl RelayConfig {
    pub fn new(bind: SocketAddr) -> Self {
        Self { bind }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_RELAY_PORT)),
        }
    }
}
