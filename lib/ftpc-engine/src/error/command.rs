/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use super::FtpRawResponseError;
use crate::control::{FtpReply, FtpVerb};

#[derive(Debug, Error)]
pub enum FtpCommandError {
    #[error("not logged in")]
    NotLoggedIn,
    #[error("invalid parameter for command {0}")]
    InvalidParameter(FtpVerb),
    #[error("unable to send command: {0:?}")]
    SendFailed(io::Error),
    #[error("unable to recv reply: {0}")]
    RecvFailed(#[from] FtpRawResponseError),
    #[error("service not available")]
    ServiceNotAvailable,
    #[error("{0} syntax rejected by server")]
    RejectedCommandSyntax(FtpVerb),
    #[error("command {0} is not implemented by server")]
    CommandNotImplemented(FtpVerb),
    #[error("parameter is not implemented for command {0}")]
    ParameterNotImplemented(FtpVerb),
    #[error("unexpected reply ({0} -> {1})")]
    UnexpectedReply(FtpVerb, FtpReply),
    #[error("invalid reply syntax to command {0}: {1}")]
    InvalidReplySyntax(FtpVerb, FtpReply),
    #[error("bad sequence of command {0}")]
    BadCommandSequence(FtpVerb),
    #[error("action {0} not taken: {1}")]
    ActionNotTaken(FtpVerb, FtpReply),
    #[error("transient failure of command {0}: {1}")]
    TransientFailure(FtpVerb, FtpReply),
}

impl FtpCommandError {
    /// The control connection is unusable after this error.
    pub(crate) fn is_transport_error(&self) -> bool {
        match self {
            FtpCommandError::SendFailed(_) => true,
            FtpCommandError::RecvFailed(e) => !e.is_framing_error(),
            _ => false,
        }
    }
}
