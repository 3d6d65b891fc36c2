use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("invalid CIDR address: {}: {}", input, source))]
    InvalidCidr {
        input: String,
        source: ipnet::AddrParseError,
    },

    #[snafu(display("invalid IP address: {}: {}", input, source))]
    InvalidIp {
        input: String,
        source: std::net::AddrParseError,
    },
}
