//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//! - `STOREFRONT_HOST` - Bind address (default: 0.0.0.0)
//! - `STOREFRONT_PORT` - Listen port (default: 8083)
//! - `STOREFRONT_DATA_DIR` - Directory holding the storage slots (default: .storefront)
//! - `STOREFRONT_CART_SLOT` - Slot name the cart is persisted under (default: luxe_cart_v1);
//!   letters, digits, `_`, `-` and `.` only
//! - `RUST_LOG` - Log filter, read by the subscriber in `main`

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

use crate::storage::is_valid_slot_name;
use crate::store::DEFAULT_CART_SLOT;

const DEFAULT_PORT: u16 = 8083;
const DEFAULT_DATA_DIR: &str = ".storefront";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    pub host: IpAddr,
    pub port: u16,
    pub data_dir: PathBuf,
    pub cart_slot: String,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            cart_slot: DEFAULT_CART_SLOT.to_string(),
        }
    }
}

impl StorefrontConfig {
    pub fn from_env() -> Result<Self, ConfigError> { Self::from_lookup(|k| std::env::var(k).ok()) }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let host = match get("STOREFRONT_HOST") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidEnvVar("STOREFRONT_HOST".into(), v))?,
            None => defaults.host,
        };
        let port = match get("STOREFRONT_PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidEnvVar("STOREFRONT_PORT".into(), v))?,
            None => defaults.port,
        };
        let data_dir = get("STOREFRONT_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir);
        let cart_slot = match get("STOREFRONT_CART_SLOT") {
            Some(v) if !is_valid_slot_name(&v) => return Err(ConfigError::InvalidEnvVar("STOREFRONT_CART_SLOT".into(), v)),
            Some(v) => v,
            None => defaults.cart_slot,
        };
        Ok(Self { host, port, data_dir, cart_slot })
    }

    pub fn socket_addr(&self) -> SocketAddr { SocketAddr::new(self.host, self.port) }
}
