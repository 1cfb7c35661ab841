/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use super::{FtpCommandError, FtpRawResponseError};
use crate::control::{FtpReply, FtpVerb};

#[derive(Debug, Error)]
pub enum FtpTransferSetupError {
    #[error("service not available")]
    ServiceNotAvailable,
    #[error("passive mode rejected: {0}")]
    PassiveRejected(FtpCommandError),
    #[error("active mode rejected: {0}")]
    ActiveRejected(FtpCommandError),
    #[error("control channel error: {0}")]
    ControlError(FtpCommandError),
    #[error("data connect to {0} failed: {1:?}")]
    DataConnectFailed(SocketAddr, io::Error),
    #[error("timed out to connect data address {0}")]
    DataConnectTimedOut(SocketAddr),
    #[error("unable to listen for data connection: {0:?}")]
    DataListenFailed(io::Error),
    #[error("unable to accept data connection: {0:?}")]
    DataAcceptFailed(io::Error),
    #[error("timed out to accept data connection")]
    DataAcceptTimedOut,
    #[error("unsupported local address {0} for active mode")]
    UnsupportedLocalAddress(SocketAddr),
}

impl From<FtpCommandError> for FtpTransferSetupError {
    fn from(e: FtpCommandError) -> Self {
        match e {
            FtpCommandError::ServiceNotAvailable => FtpTransferSetupError::ServiceNotAvailable,
            _ => FtpTransferSetupError::ControlError(e),
        }
    }
}

#[derive(Debug, Error)]
pub enum FtpTransferServerError {
    #[error("recv failed: {0}")]
    RecvFailed(#[from] FtpRawResponseError),
    #[error("timeout to wait end reply")]
    TimeoutToWaitEndReply,
    #[error("service not available")]
    ServiceNotAvailable,
    #[error("restart needed")]
    RestartNeeded,
    #[error("data transfer not established")]
    DataTransferNotEstablished,
    #[error("data transfer lost")]
    DataTransferLost,
    #[error("server failed")]
    ServerFailed,
    #[error("page type unknown")]
    PageTypeUnknown,
    #[error("exceeded storage allocation")]
    ExceededStorageAllocation,
    #[error("action not taken: {0}")]
    ActionNotTaken(FtpReply),
    #[error("unexpected end reply ({0} -> {1})")]
    UnexpectedEndReply(FtpVerb, FtpReply),
}

#[derive(Debug, Error)]
pub enum FtpLineDataReadError {
    #[error("read failed: {0:?}")]
    ReadFailed(#[from] io::Error),
    #[error("line {0} too long")]
    LineTooLong(usize),
    #[error("too many lines")]
    TooManyLines,
}

#[derive(Debug, Error)]
pub enum FtpDataIoError {
    #[error("read failed: {0:?}")]
    ReadFailed(io::Error),
    #[error("write failed: {0:?}")]
    WriteFailed(io::Error),
    #[error("data connection idle timed out")]
    IdleTimedOut,
    #[error("timeout to transfer all data")]
    AllTimedOut,
}
