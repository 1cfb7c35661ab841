/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpSocket, TcpStream};

use crate::FtpEndpoint;

/// A bound data socket waiting for the server to connect in active mode.
#[async_trait]
pub trait FtpDataListener: Send {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    fn local_addr(&self) -> io::Result<SocketAddr>;
    async fn accept(&mut self) -> io::Result<Self::Stream>;
}

#[async_trait]
pub trait FtpConnectionProvider: Send {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;
    type Listener: FtpDataListener<Stream = Self::Stream>;

    async fn new_control_connection(&mut self, endpoint: &FtpEndpoint)
    -> io::Result<Self::Stream>;
    async fn new_data_connection(&mut self, server_addr: SocketAddr) -> io::Result<Self::Stream>;
    async fn new_data_listener(&mut self) -> io::Result<Self::Listener>;
}

#[derive(Debug, Default)]
pub struct TcpConnectionProvider {
    bind_ip: Option<IpAddr>,
    control_local_addr: Option<SocketAddr>,
}

impl TcpConnectionProvider {
    pub fn set_bind_ip(&mut self, ip: IpAddr) {
        self.bind_ip = Some(ip);
    }

    fn new_socket(&self, peer: &SocketAddr) -> io::Result<TcpSocket> {
        let socket = match peer {
            SocketAddr::V4(_) => TcpSocket::new_v4()?,
            SocketAddr::V6(_) => TcpSocket::new_v6()?,
        };
        if let Some(ip) = self.bind_ip {
            socket.bind(SocketAddr::new(ip, 0))?;
        }
        Ok(socket)
    }

    fn listen_ip(&self) -> IpAddr {
        self.bind_ip
            .or_else(|| self.control_local_addr.map(|a| a.ip()))
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }
}

pub struct TcpDataListener {
    inner: TcpListener,
}

#[async_trait]
impl FtpDataListener for TcpDataListener {
    type Stream = TcpStream;

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    async fn accept(&mut self) -> io::Result<TcpStream> {
        let (stream, _peer) = self.inner.accept().await?;
        Ok(stream)
    }
}

#[async_trait]
impl FtpConnectionProvider for TcpConnectionProvider {
    type Stream = TcpStream;
    type Listener = TcpDataListener;

    async fn new_control_connection(&mut self, endpoint: &FtpEndpoint) -> io::Result<TcpStream> {
        let peer = endpoint.socket_addr();
        let socket = self.new_socket(&peer)?;
        let stream = socket.connect(peer).await?;
        self.control_local_addr = Some(stream.local_addr()?);
        Ok(stream)
    }

    async fn new_data_connection(&mut self, server_addr: SocketAddr) -> io::Result<TcpStream> {
        let socket = self.new_socket(&server_addr)?;
        socket.connect(server_addr).await
    }

    async fn new_data_listener(&mut self) -> io::Result<TcpDataListener> {
        let inner = TcpListener::bind(SocketAddr::new(self.listen_ip(), 0)).await?;
        Ok(TcpDataListener { inner })
    }
}
