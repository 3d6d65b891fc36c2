//! Helpers for IP ranges written in CIDR notation.

use crate::error::{self, Error};
use ipnet::IpNet;
use snafu::ResultExt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Parses `input` as a CIDR block. Host bits are cleared, so `10.0.0.5/24` yields the network
/// `10.0.0.0/24`.
pub fn parse_cidr(input: &str) -> Result<IpNet, Error> {
    let net: IpNet = input.parse().context(error::InvalidCidrSnafu { input })?;
    Ok(net.trunc())
}

pub fn parse_ip(input: &str) -> Result<IpAddr, Error> {
    input.parse().context(error::InvalidIpSnafu { input })
}

/// Whether the two ranges share at least one address. Ranges of different address families never
/// overlap.
pub fn cidr_overlap(a: &IpNet, b: &IpNet) -> bool {
    a.contains(&b.network()) || b.contains(&a.network())
}

/// The address following `ip`, wrapping around at the end of the address space.
pub fn increment_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V4(v4) => IpAddr::V4(Ipv4Addr::from(u32::from(v4).wrapping_add(1))),
        IpAddr::V6(v6) => IpAddr::V6(Ipv6Addr::from(u128::from(v6).wrapping_add(1))),
    }
}
