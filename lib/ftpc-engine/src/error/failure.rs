/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::io;

use thiserror::Error;

use super::{
    FtpCommandError, FtpConnectError, FtpDataIoError, FtpLineDataReadError, FtpRawResponseError,
    FtpSessionOpenError, FtpTransferServerError, FtpTransferSetupError,
};
use crate::control::{FtpReply, FtpVerb};

/// Caller facing failure category.
///
/// `ConnectionLost` always means the control connection is gone. A data
/// connection dropped mid transfer is `Transient`, the session stays usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FtpFailureKind {
    InvalidAddress,
    MissingField,
    InvalidArgument,
    ConnectionRefused,
    Unreachable,
    Timeout,
    Cancelled,
    ConnectionLost,
    AuthRejected,
    NotFound,
    PermissionDenied,
    RenameIncomplete,
    PassiveModeRejected,
    ActiveModeRejected,
    Transient,
    ProtocolError,
    Busy,
}

impl FtpFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FtpFailureKind::InvalidAddress => "InvalidAddress",
            FtpFailureKind::MissingField => "MissingField",
            FtpFailureKind::InvalidArgument => "InvalidArgument",
            FtpFailureKind::ConnectionRefused => "ConnectionRefused",
            FtpFailureKind::Unreachable => "Unreachable",
            FtpFailureKind::Timeout => "Timeout",
            FtpFailureKind::Cancelled => "Cancelled",
            FtpFailureKind::ConnectionLost => "ConnectionLost",
            FtpFailureKind::AuthRejected => "AuthRejected",
            FtpFailureKind::NotFound => "NotFound",
            FtpFailureKind::PermissionDenied => "PermissionDenied",
            FtpFailureKind::RenameIncomplete => "RenameIncomplete",
            FtpFailureKind::PassiveModeRejected => "PassiveModeRejected",
            FtpFailureKind::ActiveModeRejected => "ActiveModeRejected",
            FtpFailureKind::Transient => "Transient",
            FtpFailureKind::ProtocolError => "ProtocolError",
            FtpFailureKind::Busy => "Busy",
        }
    }

    /// A transport level failure, the command itself was never judged by the server.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FtpFailureKind::ConnectionRefused
                | FtpFailureKind::Unreachable
                | FtpFailureKind::Timeout
                | FtpFailureKind::Cancelled
                | FtpFailureKind::ConnectionLost
        )
    }
}

impl fmt::Display for FtpFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a failure means for the session that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum FtpFailureEffect {
    Recoverable,
    Degraded,
    Fatal,
}

#[derive(Debug, Error)]
#[error("{kind}: {detail}")]
pub struct FtpFailure {
    kind: FtpFailureKind,
    detail: String,
    transferred: Option<u64>,
    effect: FtpFailureEffect,
}

impl FtpFailure {
    pub fn new<S: Into<String>>(kind: FtpFailureKind, detail: S) -> Self {
        FtpFailure {
            kind,
            detail: detail.into(),
            transferred: None,
            effect: FtpFailureEffect::Recoverable,
        }
    }

    pub(crate) fn with_effect(mut self, effect: FtpFailureEffect) -> Self {
        self.effect = effect;
        self
    }

    pub(crate) fn with_transferred(mut self, transferred: u64) -> Self {
        self.transferred = Some(transferred);
        self
    }

    pub(crate) fn cancelled() -> Self {
        FtpFailure::new(FtpFailureKind::Cancelled, "cancelled by caller")
            .with_effect(FtpFailureEffect::Degraded)
    }

    pub(crate) fn set_kind(&mut self, kind: FtpFailureKind) {
        self.kind = kind;
    }

    /// Raise the session effect, never lower it.
    pub(crate) fn escalate(&mut self, effect: FtpFailureEffect) {
        self.effect = self.effect.max(effect);
    }

    #[inline]
    pub fn kind(&self) -> FtpFailureKind {
        self.kind
    }

    #[inline]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Bytes moved on the data channel before a GET or PUT failed.
    #[inline]
    pub fn transferred(&self) -> Option<u64> {
        self.transferred
    }

    #[inline]
    pub(crate) fn effect(&self) -> FtpFailureEffect {
        self.effect
    }
}

const NOT_FOUND_HINTS: &[&str] = &["not found", "no such", "not exist", "unknown file"];
const DENIED_HINTS: &[&str] = &[
    "denied",
    "permission",
    "not allowed",
    "exists",
    "forbidden",
    "refused",
    "read-only",
];

/// Map a 5xx rejection of a file action to NotFound or PermissionDenied.
pub(crate) fn classify_rejection(verb: FtpVerb, reply: &FtpReply) -> FtpFailureKind {
    match reply.code() {
        532 | 552 | 553 => return FtpFailureKind::PermissionDenied,
        _ => {}
    }
    let text = reply.message().to_ascii_lowercase();
    if NOT_FOUND_HINTS.iter().any(|h| text.contains(h)) {
        FtpFailureKind::NotFound
    } else if DENIED_HINTS.iter().any(|h| text.contains(h)) {
        FtpFailureKind::PermissionDenied
    } else if verb.creates_entry() {
        FtpFailureKind::PermissionDenied
    } else {
        FtpFailureKind::NotFound
    }
}

fn io_failure_kind(e: &io::Error) -> FtpFailureKind {
    match e.kind() {
        io::ErrorKind::ConnectionRefused => FtpFailureKind::ConnectionRefused,
        io::ErrorKind::TimedOut => FtpFailureKind::Timeout,
        _ => FtpFailureKind::Unreachable,
    }
}

impl From<FtpRawResponseError> for FtpFailure {
    fn from(e: FtpRawResponseError) -> Self {
        let (kind, effect) = match &e {
            FtpRawResponseError::ReadFailed(_) | FtpRawResponseError::ConnectionClosed => {
                (FtpFailureKind::ConnectionLost, FtpFailureEffect::Fatal)
            }
            FtpRawResponseError::ReadResponseTimedOut(_) => {
                (FtpFailureKind::Timeout, FtpFailureEffect::Degraded)
            }
            _ => (FtpFailureKind::ProtocolError, FtpFailureEffect::Degraded),
        };
        FtpFailure::new(kind, e.to_string()).with_effect(effect)
    }
}

impl From<FtpCommandError> for FtpFailure {
    fn from(e: FtpCommandError) -> Self {
        let detail = e.to_string();
        let (kind, effect) = match e {
            FtpCommandError::RecvFailed(e) => return e.into(),
            FtpCommandError::SendFailed(_) => {
                (FtpFailureKind::ConnectionLost, FtpFailureEffect::Fatal)
            }
            FtpCommandError::ServiceNotAvailable => {
                (FtpFailureKind::Transient, FtpFailureEffect::Fatal)
            }
            FtpCommandError::NotLoggedIn => {
                (FtpFailureKind::AuthRejected, FtpFailureEffect::Recoverable)
            }
            FtpCommandError::InvalidParameter(_) => {
                (FtpFailureKind::InvalidArgument, FtpFailureEffect::Recoverable)
            }
            FtpCommandError::ActionNotTaken(verb, reply) => (
                classify_rejection(verb, &reply),
                FtpFailureEffect::Recoverable,
            ),
            FtpCommandError::TransientFailure(_, _) => {
                (FtpFailureKind::Transient, FtpFailureEffect::Recoverable)
            }
            FtpCommandError::RejectedCommandSyntax(_)
            | FtpCommandError::CommandNotImplemented(_)
            | FtpCommandError::ParameterNotImplemented(_)
            | FtpCommandError::UnexpectedReply(_, _)
            | FtpCommandError::InvalidReplySyntax(_, _)
            | FtpCommandError::BadCommandSequence(_) => {
                (FtpFailureKind::ProtocolError, FtpFailureEffect::Recoverable)
            }
        };
        FtpFailure::new(kind, detail).with_effect(effect)
    }
}

impl From<FtpConnectError> for FtpFailure {
    fn from(e: FtpConnectError) -> Self {
        let kind = match &e {
            FtpConnectError::ConnectIoError(io) => io_failure_kind(io),
            FtpConnectError::ConnectTimedOut | FtpConnectError::GreetingTimedOut => {
                FtpFailureKind::Timeout
            }
            FtpConnectError::GreetingFailed(c) if c.is_transport_error() => {
                FtpFailureKind::ConnectionLost
            }
            FtpConnectError::GreetingFailed(_) => FtpFailureKind::ProtocolError,
            FtpConnectError::ServiceNotAvailable => FtpFailureKind::ConnectionRefused,
        };
        FtpFailure::new(kind, e.to_string()).with_effect(FtpFailureEffect::Fatal)
    }
}

impl From<FtpSessionOpenError> for FtpFailure {
    fn from(e: FtpSessionOpenError) -> Self {
        match e {
            FtpSessionOpenError::RawCommandError(e) => e.into(),
            FtpSessionOpenError::ServiceNotAvailable => {
                FtpFailure::new(FtpFailureKind::Transient, e.to_string())
                    .with_effect(FtpFailureEffect::Fatal)
            }
            FtpSessionOpenError::NotLoggedIn | FtpSessionOpenError::AccountIsNeeded => {
                FtpFailure::new(FtpFailureKind::AuthRejected, e.to_string())
            }
        }
    }
}

impl From<FtpTransferSetupError> for FtpFailure {
    fn from(e: FtpTransferSetupError) -> Self {
        let detail = e.to_string();
        let (kind, effect) = match e {
            FtpTransferSetupError::ControlError(c) => return c.into(),
            FtpTransferSetupError::ServiceNotAvailable => {
                (FtpFailureKind::Transient, FtpFailureEffect::Fatal)
            }
            FtpTransferSetupError::PassiveRejected(_) => {
                (FtpFailureKind::PassiveModeRejected, FtpFailureEffect::Recoverable)
            }
            FtpTransferSetupError::ActiveRejected(_)
            | FtpTransferSetupError::DataListenFailed(_)
            | FtpTransferSetupError::UnsupportedLocalAddress(_)
            | FtpTransferSetupError::DataAcceptFailed(_) => {
                (FtpFailureKind::ActiveModeRejected, FtpFailureEffect::Recoverable)
            }
            FtpTransferSetupError::DataConnectFailed(_, io) => {
                (io_failure_kind(&io), FtpFailureEffect::Recoverable)
            }
            FtpTransferSetupError::DataConnectTimedOut(_)
            | FtpTransferSetupError::DataAcceptTimedOut => {
                (FtpFailureKind::Timeout, FtpFailureEffect::Degraded)
            }
        };
        FtpFailure::new(kind, detail).with_effect(effect)
    }
}

impl From<FtpTransferServerError> for FtpFailure {
    fn from(e: FtpTransferServerError) -> Self {
        let detail = e.to_string();
        let (kind, effect) = match e {
            FtpTransferServerError::RecvFailed(r) => return r.into(),
            FtpTransferServerError::TimeoutToWaitEndReply => {
                (FtpFailureKind::Timeout, FtpFailureEffect::Degraded)
            }
            FtpTransferServerError::ServiceNotAvailable => {
                (FtpFailureKind::Transient, FtpFailureEffect::Fatal)
            }
            FtpTransferServerError::RestartNeeded
            | FtpTransferServerError::DataTransferNotEstablished
            | FtpTransferServerError::DataTransferLost
            | FtpTransferServerError::ServerFailed => {
                (FtpFailureKind::Transient, FtpFailureEffect::Recoverable)
            }
            FtpTransferServerError::ExceededStorageAllocation => {
                (FtpFailureKind::PermissionDenied, FtpFailureEffect::Recoverable)
            }
            FtpTransferServerError::ActionNotTaken(reply) => (
                classify_rejection(FtpVerb::RETR, &reply),
                FtpFailureEffect::Recoverable,
            ),
            FtpTransferServerError::PageTypeUnknown
            | FtpTransferServerError::UnexpectedEndReply(_, _) => {
                (FtpFailureKind::ProtocolError, FtpFailureEffect::Recoverable)
            }
        };
        FtpFailure::new(kind, detail).with_effect(effect)
    }
}

impl From<FtpLineDataReadError> for FtpFailure {
    fn from(e: FtpLineDataReadError) -> Self {
        let kind = match e {
            FtpLineDataReadError::ReadFailed(_) => FtpFailureKind::Transient,
            FtpLineDataReadError::LineTooLong(_) | FtpLineDataReadError::TooManyLines => {
                FtpFailureKind::ProtocolError
            }
        };
        FtpFailure::new(kind, e.to_string())
    }
}

impl From<FtpDataIoError> for FtpFailure {
    fn from(e: FtpDataIoError) -> Self {
        let (kind, effect) = match e {
            FtpDataIoError::ReadFailed(_) | FtpDataIoError::WriteFailed(_) => {
                (FtpFailureKind::Transient, FtpFailureEffect::Recoverable)
            }
            FtpDataIoError::IdleTimedOut | FtpDataIoError::AllTimedOut => {
                (FtpFailureKind::Timeout, FtpFailureEffect::Degraded)
            }
        };
        FtpFailure::new(kind, e.to_string()).with_effect(effect)
    }
}
