/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info};
use tokio_util::sync::CancellationToken;

use crate::control::FtpControlChannel;
use crate::dispatch::FtpDispatcher;
use crate::error::{FtpCommandError, FtpConnectError, FtpFailureEffect, FtpRawResponseError};
use crate::{
    FtpClientConfig, FtpCommand, FtpConnectionProvider, FtpCredentials, FtpEndpoint, FtpFailure,
    FtpFailureKind, FtpOutput, TcpConnectionProvider,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpSessionState {
    Disconnected,
    Connecting,
    Authenticating,
    Ready,
    Busy,
    Degraded,
    Closing,
    Closed,
}

impl FtpSessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FtpSessionState::Disconnected => "disconnected",
            FtpSessionState::Connecting => "connecting",
            FtpSessionState::Authenticating => "authenticating",
            FtpSessionState::Ready => "ready",
            FtpSessionState::Busy => "busy",
            FtpSessionState::Degraded => "degraded",
            FtpSessionState::Closing => "closing",
            FtpSessionState::Closed => "closed",
        }
    }
}

impl fmt::Display for FtpSessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cloneable handle to abort the pending I/O of a session.
#[derive(Clone)]
pub struct FtpSessionCanceller {
    token: CancellationToken,
}

impl FtpSessionCanceller {
    /// Abort the command in flight, or the next one if the session is idle.
    ///
    /// The control connection is closed and the session becomes degraded.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

struct FtpSessionStatus {
    state: FtpSessionState,
    cwd: String,
}

struct FtpSessionSlot<P: FtpConnectionProvider> {
    provider: Option<P>,
    dispatcher: Option<FtpDispatcher<P>>,
}

/// Degrades a busy session whose command future is dropped before it ends.
///
/// Its control connection is dropped as well.
struct FtpSessionBusyGuard<'a, P: FtpConnectionProvider> {
    session: &'a FtpSession<P>,
    armed: bool,
}

impl<'a, P: FtpConnectionProvider> FtpSessionBusyGuard<'a, P> {
    fn new(session: &'a FtpSession<P>) -> Self {
        FtpSessionBusyGuard {
            session,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<P: FtpConnectionProvider> Drop for FtpSessionBusyGuard<'_, P> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(mut slot) = self.session.slot.try_lock() {
            slot.dispatcher = None;
        }
        let mut status = self.session.lock_status();
        if status.state == FtpSessionState::Busy {
            debug!(
                "command on {} abandoned by caller, session degraded",
                self.session.endpoint
            );
            status.state = FtpSessionState::Degraded;
        }
    }
}

async fn open_control<P: FtpConnectionProvider>(
    provider: &mut P,
    endpoint: &FtpEndpoint,
    config: &FtpClientConfig,
) -> Result<FtpControlChannel<P::Stream>, FtpConnectError> {
    let stream = match tokio::time::timeout(
        config.connect_timeout,
        provider.new_control_connection(endpoint),
    )
    .await
    {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(FtpConnectError::ConnectIoError(e)),
        Err(_) => return Err(FtpConnectError::ConnectTimedOut),
    };

    let mut control = FtpControlChannel::new(stream, config.control.clone());
    match control.timed_wait_greetings(config.greeting_timeout).await {
        Ok(()) => Ok(control),
        Err(FtpCommandError::ServiceNotAvailable) => Err(FtpConnectError::ServiceNotAvailable),
        Err(FtpCommandError::RecvFailed(FtpRawResponseError::ReadResponseTimedOut(_))) => {
            Err(FtpConnectError::GreetingTimedOut)
        }
        Err(e) => Err(FtpConnectError::GreetingFailed(e)),
    }
}

/// One logged in connection to an FTP server.
///
/// All methods take `&self`. A command issued while another one is in flight
/// fails with [`FtpFailureKind::Busy`] and leaves the first one untouched.
pub struct FtpSession<P: FtpConnectionProvider = TcpConnectionProvider> {
    endpoint: FtpEndpoint,
    config: Arc<FtpClientConfig>,
    status: Mutex<FtpSessionStatus>,
    slot: tokio::sync::Mutex<FtpSessionSlot<P>>,
    cancel: CancellationToken,
}

impl FtpSession<TcpConnectionProvider> {
    /// Connect over plain TCP.
    pub async fn connect_tcp(
        endpoint: FtpEndpoint,
        config: Arc<FtpClientConfig>,
    ) -> Result<Self, FtpFailure> {
        FtpSession::connect(endpoint, TcpConnectionProvider::default(), config).await
    }
}

impl<P: FtpConnectionProvider> FtpSession<P> {
    /// Create a session in the disconnected state.
    pub fn new(endpoint: FtpEndpoint, provider: P, config: Arc<FtpClientConfig>) -> Self {
        FtpSession {
            endpoint,
            config,
            status: Mutex::new(FtpSessionStatus {
                state: FtpSessionState::Disconnected,
                cwd: "/".to_string(),
            }),
            slot: tokio::sync::Mutex::new(FtpSessionSlot {
                provider: Some(provider),
                dispatcher: None,
            }),
            cancel: CancellationToken::new(),
        }
    }

    /// Create a session, connect it and wait for the server greeting.
    pub async fn connect(
        endpoint: FtpEndpoint,
        provider: P,
        config: Arc<FtpClientConfig>,
    ) -> Result<Self, FtpFailure> {
        let session = FtpSession::new(endpoint, provider, config);
        session.open().await?;
        Ok(session)
    }

    fn lock_status(&self) -> std::sync::MutexGuard<'_, FtpSessionStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: FtpSessionState) {
        self.lock_status().state = state;
    }

    /// Move from `from` to `to`, or fail with Busy naming the current state.
    fn transit(&self, from: FtpSessionState, to: FtpSessionState) -> Result<(), FtpFailure> {
        let mut status = self.lock_status();
        if status.state != from {
            return Err(FtpFailure::new(
                FtpFailureKind::Busy,
                format!("session is {}", status.state),
            ));
        }
        status.state = to;
        Ok(())
    }

    pub fn state(&self) -> FtpSessionState {
        self.lock_status().state
    }

    pub fn current_directory(&self) -> String {
        self.lock_status().cwd.clone()
    }

    #[inline]
    pub fn endpoint(&self) -> &FtpEndpoint {
        &self.endpoint
    }

    pub fn canceller(&self) -> FtpSessionCanceller {
        FtpSessionCanceller {
            token: self.cancel.clone(),
        }
    }

    /// Open the control connection of a disconnected session.
    pub async fn open(&self) -> Result<(), FtpFailure> {
        self.transit(FtpSessionState::Disconnected, FtpSessionState::Connecting)?;

        let mut slot = self.slot.lock().await;
        let Some(mut provider) = slot.provider.take() else {
            self.set_state(FtpSessionState::Closed);
            return Err(FtpFailure::new(
                FtpFailureKind::ConnectionLost,
                "no connection provider",
            ));
        };

        let r = tokio::select! {
            biased;

            _ = self.cancel.cancelled() => Err(FtpFailure::cancelled()),
            r = open_control(&mut provider, &self.endpoint, &self.config) => {
                r.map_err(FtpFailure::from)
            }
        };
        match r {
            Ok(control) => {
                info!("connected to ftp server {}", self.endpoint);
                slot.dispatcher = Some(FtpDispatcher::new(
                    control,
                    provider,
                    self.config.clone(),
                    self.endpoint.host(),
                ));
                self.set_state(FtpSessionState::Authenticating);
                Ok(())
            }
            Err(e) => {
                debug!("failed to connect to {}: {e}", self.endpoint);
                self.set_state(FtpSessionState::Closed);
                Err(e)
            }
        }
    }

    /// Log in. A rejected login can be retried with other credentials.
    pub async fn authenticate(&self, credentials: &FtpCredentials) -> Result<(), FtpFailure> {
        self.transit(FtpSessionState::Authenticating, FtpSessionState::Busy)?;
        let guard = FtpSessionBusyGuard::new(self);

        let mut slot = self.slot.lock().await;
        let Some(dispatcher) = slot.dispatcher.as_mut() else {
            guard.disarm();
            self.set_state(FtpSessionState::Closed);
            return Err(FtpFailure::new(
                FtpFailureKind::ConnectionLost,
                "no control connection",
            ));
        };

        let r = tokio::select! {
            biased;

            _ = self.cancel.cancelled() => Err(FtpFailure::cancelled()),
            r = dispatcher.login(credentials) => r,
        };
        let cwd = dispatcher.current_directory().to_string();
        let next = match &r {
            Ok(_) => {
                info!("logged in to {} as {}", self.endpoint, credentials.username());
                FtpSessionState::Ready
            }
            Err(e) if e.kind() == FtpFailureKind::AuthRejected => FtpSessionState::Authenticating,
            Err(e) => self.state_after_failure(e),
        };
        if !matches!(
            next,
            FtpSessionState::Ready | FtpSessionState::Authenticating
        ) {
            slot.dispatcher = None;
        }

        guard.disarm();
        let mut status = self.lock_status();
        status.cwd = cwd;
        status.state = next;
        r
    }

    fn state_after_failure(&self, e: &FtpFailure) -> FtpSessionState {
        match e.effect() {
            FtpFailureEffect::Recoverable => FtpSessionState::Ready,
            FtpFailureEffect::Degraded => FtpSessionState::Degraded,
            FtpFailureEffect::Fatal => FtpSessionState::Closed,
        }
    }

    /// Run one command.
    ///
    /// The session must be ready. Timeouts, cancellation and reply framing
    /// errors leave it degraded, connection loss and QUIT leave it closed.
    /// Dropping the returned future before it completes also degrades it.
    pub async fn execute(&self, command: FtpCommand) -> Result<FtpOutput, FtpFailure> {
        self.transit(FtpSessionState::Ready, FtpSessionState::Busy)?;
        let guard = FtpSessionBusyGuard::new(self);

        let mut slot = self.slot.lock().await;
        let Some(dispatcher) = slot.dispatcher.as_mut() else {
            guard.disarm();
            self.set_state(FtpSessionState::Closed);
            return Err(FtpFailure::new(
                FtpFailureKind::ConnectionLost,
                "no control connection",
            ));
        };

        let name = command.name();
        let is_quit = matches!(command, FtpCommand::Quit);
        let r = tokio::select! {
            biased;

            _ = self.cancel.cancelled() => Err(FtpFailure::cancelled()),
            r = dispatcher.dispatch(command) => r,
        };
        let cwd = dispatcher.current_directory().to_string();
        let next = match &r {
            _ if is_quit => FtpSessionState::Closed,
            Ok(_) => FtpSessionState::Ready,
            Err(e) => {
                debug!("{name} failed on {}: {e}", self.endpoint);
                self.state_after_failure(e)
            }
        };
        if next != FtpSessionState::Ready {
            // drop the control connection
            slot.dispatcher = None;
        }

        guard.disarm();
        let mut status = self.lock_status();
        status.cwd = cwd;
        status.state = next;
        r
    }

    /// Close the session, sending QUIT if the control connection is usable.
    ///
    /// A command in flight is cancelled first. The session is closed afterwards
    /// whatever the result is.
    pub async fn disconnect(&self) -> Result<(), FtpFailure> {
        let prev = {
            let mut status = self.lock_status();
            if status.state == FtpSessionState::Closed {
                return Ok(());
            }
            let prev = status.state;
            status.state = FtpSessionState::Closing;
            prev
        };
        if prev == FtpSessionState::Busy {
            self.cancel.cancel();
        }

        let dispatcher = self.slot.lock().await.dispatcher.take();
        let r = match dispatcher {
            // the control stream is only in sync when no command was left half done
            Some(mut dispatcher)
                if matches!(
                    prev,
                    FtpSessionState::Ready | FtpSessionState::Authenticating
                ) =>
            {
                dispatcher.dispatch(FtpCommand::Quit).await.map(|_| ())
            }
            _ => Ok(()),
        };
        if let Err(e) = &r {
            debug!("quit from {} failed: {e}", self.endpoint);
        }
        self.set_state(FtpSessionState::Closed);
        r
    }
}
