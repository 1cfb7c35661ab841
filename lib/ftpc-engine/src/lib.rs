/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod config;
pub use config::{FtpClientConfig, FtpControlConfig, FtpTransferConfig};

mod debug;
pub use debug::{FTP_DEBUG_LOG_LEVEL, FTP_DEBUG_LOG_TARGET};

mod error;
pub use error::{
    FtpCommandError, FtpConnectError, FtpDataIoError, FtpFailure, FtpFailureKind,
    FtpLineDataReadError, FtpListParseError, FtpRawResponseError, FtpSessionOpenError,
    FtpTransferServerError, FtpTransferSetupError,
};

mod io;

mod validate;
pub use validate::{
    FTP_DEFAULT_PORT, FtpCredentials, FtpEndpoint, validate_credentials, validate_endpoint,
};

mod connection;
pub use connection::{
    FtpConnectionProvider, FtpDataListener, TcpConnectionProvider, TcpDataListener,
};

mod control;
pub use control::{FtpReply, FtpReplyClass};

mod facts;
pub use facts::{FtpFileEntryType, FtpListEntry};

mod transfer;
pub use transfer::{FtpDataMode, FtpTransferDirection};

mod command;
pub use command::{FtpCommand, FtpOutput, FtpOutputKind};

mod dispatch;

mod session;
pub use session::{FtpSession, FtpSessionCanceller, FtpSessionState};
