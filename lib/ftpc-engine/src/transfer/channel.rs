/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use log::{debug, info};
use tokio::io::{AsyncRead, AsyncWrite};

use super::FtpDataMode;
use crate::control::FtpControlChannel;
use crate::error::{FtpCommandError, FtpTransferSetupError};
use crate::{FtpClientConfig, FtpConnectionProvider, FtpDataListener};

/// The data connection of one transfer command.
pub(crate) enum FtpDataChannel<P: FtpConnectionProvider> {
    Connected(P::Stream),
    Listening(P::Listener),
}

impl<P: FtpConnectionProvider> FtpDataChannel<P> {
    pub(crate) fn mode(&self) -> FtpDataMode {
        match self {
            FtpDataChannel::Connected(_) => FtpDataMode::Passive,
            FtpDataChannel::Listening(_) => FtpDataMode::Active,
        }
    }

    /// Get the connected stream, accepting the server connection in active mode.
    ///
    /// Must be called after the transfer command has been accepted by the server.
    pub(crate) async fn establish(
        self,
        accept_timeout: Duration,
    ) -> Result<P::Stream, FtpTransferSetupError> {
        match self {
            FtpDataChannel::Connected(stream) => Ok(stream),
            FtpDataChannel::Listening(mut listener) => {
                match tokio::time::timeout(accept_timeout, listener.accept()).await {
                    Ok(Ok(stream)) => Ok(stream),
                    Ok(Err(e)) => Err(FtpTransferSetupError::DataAcceptFailed(e)),
                    Err(_) => Err(FtpTransferSetupError::DataAcceptTimedOut),
                }
            }
        }
    }
}

fn is_rejection(e: &FtpCommandError) -> bool {
    !matches!(
        e,
        FtpCommandError::SendFailed(_)
            | FtpCommandError::RecvFailed(_)
            | FtpCommandError::ServiceNotAvailable
            | FtpCommandError::NotLoggedIn
    )
}

/// Picks passive or active mode for each transfer.
#[derive(Default)]
pub(crate) struct FtpDataNegotiator {
    passive_rejected: bool,
}

impl FtpDataNegotiator {
    pub(crate) async fn open<P, T>(
        &mut self,
        control: &mut FtpControlChannel<T>,
        provider: &mut P,
        config: &FtpClientConfig,
        server_host: Ipv4Addr,
    ) -> Result<FtpDataChannel<P>, FtpTransferSetupError>
    where
        P: FtpConnectionProvider,
        T: AsyncRead + AsyncWrite + Unpin,
    {
        if !self.passive_rejected && !config.active_only {
            match self
                .open_passive(control, provider, config, server_host)
                .await
            {
                Ok(channel) => return Ok(channel),
                Err(FtpTransferSetupError::PassiveRejected(e)) if config.active_fallback => {
                    info!("passive mode rejected ({e}), fall back to active mode");
                    self.passive_rejected = true;
                }
                Err(e) => return Err(e),
            }
        }

        self.open_active(control, provider).await
    }

    async fn open_passive<P, T>(
        &mut self,
        control: &mut FtpControlChannel<T>,
        provider: &mut P,
        config: &FtpClientConfig,
        server_host: Ipv4Addr,
    ) -> Result<FtpDataChannel<P>, FtpTransferSetupError>
    where
        P: FtpConnectionProvider,
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let mut addr = control.request_pasv_port().await.map_err(|e| {
            if is_rejection(&e) {
                FtpTransferSetupError::PassiveRejected(e)
            } else {
                e.into()
            }
        })?;
        if config.passive_use_control_host || addr.ip().is_unspecified() {
            addr = SocketAddr::new(IpAddr::V4(server_host), addr.port());
        }
        debug!("connecting to passive data address {addr}");

        match tokio::time::timeout(
            config.transfer.data_connect_timeout,
            provider.new_data_connection(addr),
        )
        .await
        {
            Ok(Ok(stream)) => Ok(FtpDataChannel::Connected(stream)),
            Ok(Err(e)) => Err(FtpTransferSetupError::DataConnectFailed(addr, e)),
            Err(_) => Err(FtpTransferSetupError::DataConnectTimedOut(addr)),
        }
    }

    async fn open_active<P, T>(
        &mut self,
        control: &mut FtpControlChannel<T>,
        provider: &mut P,
    ) -> Result<FtpDataChannel<P>, FtpTransferSetupError>
    where
        P: FtpConnectionProvider,
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let listener = provider
            .new_data_listener()
            .await
            .map_err(FtpTransferSetupError::DataListenFailed)?;
        let local_addr = listener
            .local_addr()
            .map_err(FtpTransferSetupError::DataListenFailed)?;
        let addr = match local_addr {
            SocketAddr::V4(a) if !a.ip().is_unspecified() => a,
            _ => return Err(FtpTransferSetupError::UnsupportedLocalAddress(local_addr)),
        };
        debug!("listening on active data address {addr}");

        control.request_port(addr).await.map_err(|e| {
            if is_rejection(&e) {
                FtpTransferSetupError::ActiveRejected(e)
            } else {
                e.into()
            }
        })?;
        Ok(FtpDataChannel::Listening(listener))
    }
}
