/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use super::FtpControlChannel;
use crate::error::FtpCommandError;

/// The verb part of a command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FtpVerb(&'static str);

impl fmt::Display for FtpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! ftp_verbs {
    (
        $(
            $(#[$docs:meta])*
            ($konst:ident, $phrase:expr);
        )+
    ) => {
        impl FtpVerb {
        $(
            $(#[$docs])*
            pub const $konst: FtpVerb = FtpVerb($phrase);
        )+
        }
    };
}

ftp_verbs! {
    /// a fake command for greeting
    (GREETING, "-");
    (USER, "USER");
    (PASS, "PASS");
    (QUIT, "QUIT");
    (CWD, "CWD");
    (PWD, "PWD");
    (MKD, "MKD");
    (RMD, "RMD");
    (DELE, "DELE");
    (RNFR, "RNFR");
    (RNTO, "RNTO");
    (TYPE_A, "TYPE A");
    (TYPE_I, "TYPE I");
    (PASV, "PASV");
    (PORT, "PORT");
    (LIST, "LIST");
    (RETR, "RETR");
    (STOR, "STOR");
}

impl FtpVerb {
    pub(crate) fn as_str(&self) -> &'static str {
        self.0
    }

    /// The command creates a new entry on the server side.
    pub(crate) fn creates_entry(&self) -> bool {
        matches!(self.0, "MKD" | "STOR" | "RNTO")
    }
}

impl<T> FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub(super) async fn send_all(&mut self, buf: &[u8]) -> Result<(), FtpCommandError> {
        #[cfg(feature = "log-raw-io")]
        crate::debug::log_cmd(String::from_utf8_lossy(buf).trim_end());

        self.stream
            .write_all(buf)
            .await
            .map_err(FtpCommandError::SendFailed)?;
        self.stream
            .flush()
            .await
            .map_err(FtpCommandError::SendFailed)?;
        Ok(())
    }

    pub(super) async fn send_cmd(&mut self, cmd: FtpVerb) -> Result<(), FtpCommandError> {
        let len = cmd.as_str().len() + 2;
        let mut buf: Vec<u8> = Vec::with_capacity(len);
        buf.extend_from_slice(cmd.as_str().as_bytes());
        buf.extend_from_slice(b"\r\n");

        self.send_all(buf.as_ref()).await
    }

    pub(super) async fn send_cmd1(
        &mut self,
        cmd: FtpVerb,
        param1: &str,
    ) -> Result<(), FtpCommandError> {
        // a line break would smuggle in another command
        if memchr::memchr2(b'\r', b'\n', param1.as_bytes()).is_some() {
            return Err(FtpCommandError::InvalidParameter(cmd));
        }

        let len = cmd.as_str().len() + 1 + param1.len() + 2;
        let mut buf: Vec<u8> = Vec::with_capacity(len);
        buf.extend_from_slice(cmd.as_str().as_bytes());
        buf.push(b' ');
        buf.extend_from_slice(param1.as_bytes());
        buf.extend_from_slice(b"\r\n");

        self.send_all(buf.as_ref()).await
    }
}
