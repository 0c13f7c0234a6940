use anyhow::Result;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Validate an IPv4 address (e.g., "192.168.1.1").
/// Returns true if the string is a valid dotted-decimal IPv4 address.
pub fn is_valid_ipv4(ip: &str) -> bool {
    let parts: Vec<&str> = ip.split('.').collect();
    if parts.len() != 4 {
        return false;
    }
    parts.iter().all(|p| p.parse::<u8>().is_ok())
}

/// Validate a hostname.
/// Allows alphanumeric, hyphens, dots, and underscores. No path separators or shell metacharacters.
pub fn is_valid_hostname(hostname: &str) -> bool {
    if hostname.is_empty() || hostname.len() > 253 {
        return false;
    }
    hostname.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_')
}

/// An IPv4 prefix such as 10.1.109.0/24
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Subnet {
    network: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Subnet {
    pub fn new(addr: Ipv4Addr, prefix_len: u8) -> Result<Self> {
        if prefix_len > 32 {
            return Err(anyhow::anyhow!("Invalid prefix length: /{}", prefix_len));
        }
        let network = Ipv4Addr::from(u32::from(addr) & mask(prefix_len));
        Ok(Self { network, prefix_len })
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    fn size(&self) -> u64 {
        1u64 << (32 - self.prefix_len as u32)
    }

    /// Host address at `offset` from the network address.
    ///
    /// The network and broadcast addresses are refused for prefixes shorter
    /// than /31.
    pub fn host(&self, offset: u32) -> Result<Ipv4Addr> {
        let size = self.size();
        if offset as u64 >= size {
            return Err(anyhow::anyhow!("Offset {} is outside {}", offset, self));
        }
        if self.prefix_len < 31 && (offset == 0 || offset as u64 == size - 1) {
            return Err(anyhow::anyhow!(
                "Offset {} maps to the network or broadcast address of {}",
                offset,
                self
            ));
        }
        Ok(Ipv4Addr::from(u32::from(self.network) + offset))
    }
}

impl fmt::Display for Ipv4Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

impl FromStr for Ipv4Subnet {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (addr, len) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| anyhow::anyhow!("Subnet must be in CIDR form: {}", s))?;
        if !is_valid_ipv4(addr) {
            return Err(anyhow::anyhow!("Invalid subnet address: {}", addr));
        }
        let addr: Ipv4Addr = addr.parse()?;
        let len: u8 = len
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid prefix length: {}", len))?;
        Self::new(addr, len)
    }
}

fn mask(prefix_len: u8) -> u32 {
    if prefix_len == 0 {
        0
    } else {
        u32::MAX << (32 - prefix_len as u32)
    }
}
