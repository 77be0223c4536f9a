//! DroidScript server address.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// Port the DroidScript server listens on by default.
pub const DEFAULT_PORT: u16 = 8088;

/// Why an address was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("Invalid IP")]
    InvalidIp,

    #[error("Missing Port")]
    MissingPort,
}

/// `ip:port` of the device to upload to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteEndpoint {
    addr: SocketAddr,
}

impl RemoteEndpoint {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::new(host, port),
        }
    }

    /// Strict form: an IP address with an explicit port.
    pub fn parse(s: &str) -> Result<Self, EndpointError> {
        let s = s.trim();
        if let Ok(addr) = s.parse::<SocketAddr>() {
            return Ok(Self { addr });
        }
        if host_is_valid(s) {
            Err(EndpointError::MissingPort)
        } else {
            Err(EndpointError::InvalidIp)
        }
    }

    /// Lenient form used for user input: a bare IP gets `default_port`.
    pub fn parse_or_default_port(s: &str, default_port: u16) -> Result<Self, EndpointError> {
        match Self::parse(s) {
            Ok(endpoint) => Ok(endpoint),
            Err(e) => match s.trim().parse::<IpAddr>() {
                Ok(host) => Ok(Self::new(host, default_port)),
                Err(_) => Err(e),
            },
        }
    }

    /// Value pre-filled in the endpoint prompt: the stored address, with
    /// the port appended when it has none.
    pub fn prompt_value(stored: &str, port: u16) -> String {
        match stored.trim().parse::<IpAddr>() {
            Ok(host) => Self::new(host, port).to_string(),
            Err(_) => stored.to_string(),
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Whether the part before the port is a usable IP.
fn host_is_valid(s: &str) -> bool {
    if s.parse::<IpAddr>().is_ok() {
        return true;
    }
    match s.rsplit_once(':') {
        Some((host, _)) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok(),
        None => false,
    }
}

impl fmt::Display for RemoteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.addr)
    }
}

impl FromStr for RemoteEndpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
