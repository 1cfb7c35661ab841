/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;

use crate::error::{FtpFailure, FtpFailureKind};

pub const FTP_DEFAULT_PORT: u16 = 21;

/// The control endpoint of a server, IPv4 only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FtpEndpoint {
    host: Ipv4Addr,
    port: u16,
}

impl FtpEndpoint {
    pub const fn new(host: Ipv4Addr, port: u16) -> Self {
        FtpEndpoint { host, port }
    }

    #[inline]
    pub fn host(&self) -> Ipv4Addr {
        self.host
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.host, self.port))
    }
}

impl fmt::Display for FtpEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for FtpEndpoint {
    type Err = FtpFailure;

    /// Parse `a.b.c.d` or `a.b.c.d:port`, the port defaults to 21.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once(':') {
            Some((host, port)) => validate_endpoint(host, port),
            None => {
                let host = parse_ipv4(s).ok_or_else(|| invalid_address(s))?;
                Ok(FtpEndpoint::new(host, FTP_DEFAULT_PORT))
            }
        }
    }
}

fn invalid_address(s: &str) -> FtpFailure {
    FtpFailure::new(FtpFailureKind::InvalidAddress, format!("invalid address {s}"))
}

fn parse_ipv4(host: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut segments = host.trim().split('.');
    for octet in octets.iter_mut() {
        let seg = segments.next()?;
        if seg.is_empty() || !seg.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *octet = u8::from_str(seg).ok()?;
    }
    if segments.next().is_some() {
        return None;
    }
    Some(Ipv4Addr::from(octets))
}

fn parse_port(port: &str) -> Option<u16> {
    let port = port.trim();
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    u16::from_str(port).ok()
}

/// Check a host and port pair as typed by the user.
pub fn validate_endpoint(host: &str, port: &str) -> Result<FtpEndpoint, FtpFailure> {
    let Some(ip) = parse_ipv4(host) else {
        return Err(invalid_address(host));
    };
    let Some(port) = parse_port(port) else {
        return Err(FtpFailure::new(
            FtpFailureKind::InvalidAddress,
            format!("invalid port {port}"),
        ));
    };
    Ok(FtpEndpoint::new(ip, port))
}

#[derive(Clone, PartialEq, Eq)]
pub struct FtpCredentials {
    username: String,
    password: String,
}

impl FtpCredentials {
    /// Anonymous login, the password is left empty.
    pub fn anonymous() -> Self {
        FtpCredentials {
            username: "anonymous".to_string(),
            password: String::new(),
        }
    }

    #[inline]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[inline]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for FtpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn check_field(name: &'static str, value: &str) -> Result<String, FtpFailure> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FtpFailure::new(FtpFailureKind::MissingField, name));
    }
    if value.contains(['\r', '\n']) {
        return Err(FtpFailure::new(
            FtpFailureKind::InvalidArgument,
            format!("line break in {name}"),
        ));
    }
    Ok(value.to_string())
}

pub fn validate_credentials(username: &str, password: &str) -> Result<FtpCredentials, FtpFailure> {
    let username = check_field("username", username)?;
    let password = check_field("password", password)?;
    Ok(FtpCredentials { username, password })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_endpoints() {
        let ep = validate_endpoint("127.0.0.1", "2121").unwrap();
        assert_eq!(ep.host(), Ipv4Addr::LOCALHOST);
        assert_eq!(ep.port(), 2121);

        let ep = validate_endpoint(" 0.0.0.0 ", "0").unwrap();
        assert_eq!(ep.port(), 0);

        let ep = validate_endpoint("255.255.255.255", "65535").unwrap();
        assert_eq!(ep.host(), Ipv4Addr::BROADCAST);
        assert_eq!(ep.port(), 65535);
    }

    #[test]
    fn invalid_endpoints() {
        for (host, port) in [
            ("127.0.0", "21"),
            ("127.0.0.1.1", "21"),
            ("256.0.0.1", "21"),
            ("1.2.3.-4", "21"),
            ("a.b.c.d", "21"),
            ("1..2.3", "21"),
            ("", "21"),
            ("1.2.3.4", "-1"),
            ("1.2.3.4", "65536"),
            ("1.2.3.4", "ftp"),
            ("1.2.3.4", ""),
            ("1.2.3.4", "+21"),
        ] {
            let e = validate_endpoint(host, port).unwrap_err();
            assert_eq!(e.kind(), FtpFailureKind::InvalidAddress, "{host}:{port}");
        }
    }

    #[test]
    fn parse_endpoint_str() {
        let ep = FtpEndpoint::from_str("10.0.0.1").unwrap();
        assert_eq!(ep.port(), FTP_DEFAULT_PORT);
        assert_eq!(ep.to_string(), "10.0.0.1:21");

        let ep = FtpEndpoint::from_str("10.0.0.1:2121").unwrap();
        assert_eq!(ep.socket_addr(), "10.0.0.1:2121".parse().unwrap());

        assert!(FtpEndpoint::from_str("example.net:21").is_err());
    }

    #[test]
    fn credentials() {
        let c = validate_credentials(" alice ", "secret").unwrap();
        assert_eq!(c.username(), "alice");
        assert_eq!(c.password(), "secret");
        assert!(!format!("{c:?}").contains("secret"));

        let e = validate_credentials("  ", "secret").unwrap_err();
        assert_eq!(e.kind(), FtpFailureKind::MissingField);
        assert_eq!(e.detail(), "username");

        let e = validate_credentials("alice", "").unwrap_err();
        assert_eq!(e.kind(), FtpFailureKind::MissingField);
        assert_eq!(e.detail(), "password");

        let e = validate_credentials("alice\r\nDELE x", "secret").unwrap_err();
        assert_eq!(e.kind(), FtpFailureKind::InvalidArgument);

        let anon = FtpCredentials::anonymous();
        assert_eq!(anon.username(), "anonymous");
        assert!(anon.password().is_empty());
    }
}
