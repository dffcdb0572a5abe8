//! IP allow-list rules: exact addresses and CIDR ranges.

use std::net::IpAddr;
use std::str::FromStr;

use crate::errors::{Result, SecurityError};

/// A single allow-list rule, parsed from `"a.b.c.d"` or `"a.b.c.d/n"`
/// form (IPv6 equivalents included).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpRule {
    Exact(IpAddr),
    Cidr { network: IpAddr, prefix: u8 },
}

impl FromStr for IpRule {
    type Err = SecurityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            None => {
                let addr: IpAddr = s.trim().parse().map_err(|_| {
                    SecurityError::Validation(format!("invalid IP address '{s}'"))
                })?;
                Ok(IpRule::Exact(addr))
            }
            Some((addr, prefix)) => {
                let network: IpAddr = addr.trim().parse().map_err(|_| {
                    SecurityError::Validation(format!("invalid network address in '{s}'"))
                })?;
                let prefix: u8 = prefix.trim().parse().map_err(|_| {
                    SecurityError::Validation(format!("invalid prefix length in '{s}'"))
                })?;

                let max = if network.is_ipv4() { 32 } else { 128 };
                if prefix > max {
                    return Err(SecurityError::Validation(format!(
                        "prefix /{prefix} too long in '{s}'"
                    )));
                }

                Ok(IpRule::Cidr { network, prefix })
            }
        }
    }
}

impl IpRule {
    /// Whether `ip` is covered by this rule.  Rules never match across
    /// address families.
    pub fn matches(&self, ip: IpAddr) -> bool {
        match *self {
            IpRule::Exact(rule) => rule == ip,
            IpRule::Cidr { network, prefix } => match (network, ip) {
                (IpAddr::V4(net), IpAddr::V4(addr)) => {
                    let mask = if prefix == 0 {
                        0
                    } else {
                        u32::MAX << (32 - u32::from(prefix))
                    };
                    u32::from(net) & mask == u32::from(addr) & mask
                }
                (IpAddr::V6(net), IpAddr::V6(addr)) => {
                    let mask = if prefix == 0 {
                        0
                    } else {
                        u128::MAX << (128 - u32::from(prefix))
                    };
                    u128::from(net) & mask == u128::from(addr) & mask
                }
                _ => false,
            },
        }
    }
}
