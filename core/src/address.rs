//! Detection of addresses the remote service could not reach over the public
//! network.
//!
//! Two policies answer the same question. [`StdAddressPolicy`] relies on the
//! standard library's address predicates; [`CidrTableAddressPolicy`] matches
//! against a fixed CIDR table built once on first use and never mutated.
//! [`DefaultAddressPolicy`] picks one at build time through the `cidr-table`
//! feature.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

pub trait AddressPolicy {
    /// True for loopback, link-local, private and unique-local addresses.
    fn is_internal(&self, ip: IpAddr) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StdAddressPolicy;

impl AddressPolicy for StdAddressPolicy {
    fn is_internal(&self, ip: IpAddr) -> bool {
        match ip.to_canonical() {
            IpAddr::V4(v4) => {
                v4.is_loopback() || v4.is_private() || v4.is_link_local() || is_v4_link_local_multicast(v4)
            }
            IpAddr::V6(v6) => {
                v6.is_loopback()
                    || v6.is_unicast_link_local()
                    || v6.is_unique_local()
                    || is_v6_link_local_multicast(v6)
            }
        }
    }
}

fn is_v4_link_local_multicast(ip: Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();
    a == 224 && b == 0 && c == 0
}

fn is_v6_link_local_multicast(ip: Ipv6Addr) -> bool {
    ip.segments()[0] & 0xff0f == 0xff02
}

/// Network/prefix pairs; read-only after initialisation.
static INTERNAL_BLOCKS: LazyLock<Vec<(IpAddr, u8)>> = LazyLock::new(|| {
    [
        ("127.0.0.0", 8),
        ("10.0.0.0", 8),
        ("172.16.0.0", 12),
        ("192.168.0.0", 16),
        ("169.254.0.0", 16),
        ("224.0.0.0", 24),
        ("::1", 128),
        ("fe80::", 10),
        ("fc00::", 7),
        ("ff02::", 16),
    ]
    .into_iter()
    .filter_map(|(net, prefix)| net.parse().ok().map(|ip| (ip, prefix)))
    .collect()
});

#[derive(Debug, Clone, Copy, Default)]
pub struct CidrTableAddressPolicy;

impl AddressPolicy for CidrTableAddressPolicy {
    fn is_internal(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        INTERNAL_BLOCKS
            .iter()
            .any(|&(net, prefix)| block_contains(net, prefix, ip))
    }
}

fn block_contains(net: IpAddr, prefix: u8, ip: IpAddr) -> bool {
    match (net, ip) {
        (IpAddr::V4(net), IpAddr::V4(ip)) => {
            let mask = u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0);
            u32::from(net) & mask == u32::from(ip) & mask
        }
        (IpAddr::V6(net), IpAddr::V6(ip)) => {
            let mask = u128::MAX.checked_shl(128 - u32::from(prefix)).unwrap_or(0);
            u128::from(net) & mask == u128::from(ip) & mask
        }
        _ => false,
    }
}

#[cfg(not(feature = "cidr-table"))]
pub type DefaultAddressPolicy = StdAddressPolicy;

#[cfg(feature = "cidr-table")]
pub type DefaultAddressPolicy = CidrTableAddressPolicy;
