use std::fmt;
use std::fmt::Display;
use std::net::Ipv4Addr;

const REVERSE_SUFFIX: &str = "in-addr.arpa";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReverseZoneError {
    InvalidAddress(String),
    InvalidNetmask(String),
}

impl Display for ReverseZoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReverseZoneError::InvalidAddress(address) => {
                write!(f, "Address portion '{}' is not a valid IPv4 address", address)
            }
            ReverseZoneError::InvalidNetmask(cidr) => {
                write!(f, "Couldn't find netmask portion of CIDR in '{}'", cidr)
            }
        }
    }
}

impl std::error::Error for ReverseZoneError {}

/// Reverse-DNS zone name for an IPv4 CIDR block.
///
/// The netmask decides how many leading octets of the reversed address
/// survive, one per full 8 bits:
///
/// 192.168.100.0/24 -> 100.168.192.in-addr.arpa
/// 192.168.100.0/16 -> 168.192.in-addr.arpa
/// 192.168.100.0/8  -> 192.in-addr.arpa
pub fn reverse_dns_zone(cidr: &str) -> Result<String, ReverseZoneError> {
    let (address_part, netmask_part) = match cidr.split_once('/') {
        Some((address, netmask)) => (address, Some(netmask)),
        None => (cidr, None),
    };

    let address = address_part
        .parse::<Ipv4Addr>()
        .map_err(|_| ReverseZoneError::InvalidAddress(address_part.to_string()))?;

    // "" and "0" are both rejected; masks are expected to be one of 8/16/24
    // but anything positive is accepted.
    let netmask = netmask_part
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|&n| n > 0)
        .ok_or_else(|| ReverseZoneError::InvalidNetmask(cidr.to_string()))?;

    // Integer division truncates non-octet-aligned masks toward fewer labels,
    // so a /20 keeps the same two octets a /16 would.
    let retained = ((netmask / 8) as usize).min(4);

    let octets = address.octets();
    let reversed_labels: Vec<String> = octets[..retained]
        .iter()
        .rev()
        .map(|o| o.to_string())
        .collect();

    if reversed_labels.is_empty() {
        Ok(REVERSE_SUFFIX.to_string())
    } else {
        Ok(format!("{}.{}", reversed_labels.join("."), REVERSE_SUFFIX))
    }
}
