/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::{SocketAddr, SocketAddrV4};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufStream};

use crate::FtpControlConfig;
use crate::error::{FtpAuthStatus, FtpCommandError, FtpRawResponseError, FtpTransferServerError};
use crate::transfer::FtpTransferType;

mod response;
pub use response::{FtpReply, FtpReplyClass};

mod command;
pub(crate) use command::FtpVerb;

pub(crate) struct FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite,
{
    config: FtpControlConfig,
    stream: BufStream<T>,
}

/// Fallback handling of reply codes not listed by the caller.
fn other_reply(cmd: FtpVerb, reply: FtpReply) -> FtpCommandError {
    match reply.code() {
        421 => FtpCommandError::ServiceNotAvailable,
        530 => FtpCommandError::NotLoggedIn,
        400..500 => FtpCommandError::TransientFailure(cmd, reply),
        _ => FtpCommandError::UnexpectedReply(cmd, reply),
    }
}

impl<T> FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(stream: T, config: FtpControlConfig) -> Self {
        FtpControlChannel {
            config,
            stream: BufStream::new(stream),
        }
    }

    /// Send one command line and wait for the final reply.
    pub(crate) async fn send_command(
        &mut self,
        cmd: FtpVerb,
        param: Option<&str>,
        stage: &'static str,
    ) -> Result<FtpReply, FtpCommandError> {
        match param {
            Some(p) => self.send_cmd1(cmd, p).await?,
            None => self.send_cmd(cmd).await?,
        }
        let reply = self.timed_read_final_response(stage).await?;
        Ok(reply)
    }

    pub(crate) async fn wait_greetings(&mut self) -> Result<(), FtpCommandError> {
        loop {
            let reply = self.read_raw_response().await?;
            return match reply.code() {
                120 => continue,
                220 => Ok(()),
                421 => Err(FtpCommandError::ServiceNotAvailable),
                _ => Err(FtpCommandError::UnexpectedReply(FtpVerb::GREETING, reply)),
            };
        }
    }

    pub(crate) async fn send_username(
        &mut self,
        name: &str,
    ) -> Result<FtpAuthStatus, FtpCommandError> {
        let cmd = FtpVerb::USER;
        let reply = self.send_command(cmd, Some(name), "send username").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            530 | 430 => Ok(FtpAuthStatus::NotLoggedIn),
            230 => Ok(FtpAuthStatus::LoggedIn),
            331 => Ok(FtpAuthStatus::NeedPassword),
            332 => Ok(FtpAuthStatus::NeedAccount),
            421 => Err(FtpCommandError::ServiceNotAvailable),
            _ => Err(FtpCommandError::UnexpectedReply(cmd, reply)),
        }
    }

    pub(crate) async fn send_password(
        &mut self,
        pass: &str,
    ) -> Result<FtpAuthStatus, FtpCommandError> {
        let cmd = FtpVerb::PASS;
        let reply = self.send_command(cmd, Some(pass), "send password").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            503 => Err(FtpCommandError::BadCommandSequence(cmd)),
            530 | 430 => Ok(FtpAuthStatus::NotLoggedIn),
            202 | 230 => Ok(FtpAuthStatus::LoggedIn),
            332 => Ok(FtpAuthStatus::NeedAccount),
            421 => Err(FtpCommandError::ServiceNotAvailable),
            _ => Err(FtpCommandError::UnexpectedReply(cmd, reply)),
        }
    }

    async fn send_quit(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpVerb::QUIT;
        let reply = self.send_command(cmd, None, "send quit").await?;
        match reply.code() {
            500 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            221 => Ok(()),
            _ => Err(FtpCommandError::UnexpectedReply(cmd, reply)),
        }
    }

    /// Send QUIT and shut down the connection whatever the reply is.
    pub(crate) async fn close(&mut self) -> Result<(), FtpCommandError> {
        let r = self.send_quit().await;
        let _ = self.stream.shutdown().await;
        r
    }

    pub(crate) async fn change_dir(&mut self, path: &str) -> Result<(), FtpCommandError> {
        let cmd = FtpVerb::CWD;
        let reply = self.send_command(cmd, Some(path), "change dir").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            200 | 250 => Ok(()),
            550 => Err(FtpCommandError::ActionNotTaken(cmd, reply)),
            _ => Err(other_reply(cmd, reply)),
        }
    }

    pub(crate) async fn print_working_dir(&mut self) -> Result<String, FtpCommandError> {
        let cmd = FtpVerb::PWD;
        let reply = self.send_command(cmd, None, "print working dir").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            257 => match reply.parse_257_path() {
                Some(path) => Ok(path),
                None => Err(FtpCommandError::InvalidReplySyntax(cmd, reply)),
            },
            550 => Err(FtpCommandError::ActionNotTaken(cmd, reply)),
            _ => Err(other_reply(cmd, reply)),
        }
    }

    pub(crate) async fn make_dir(&mut self, path: &str) -> Result<(), FtpCommandError> {
        let cmd = FtpVerb::MKD;
        let reply = self.send_command(cmd, Some(path), "make dir").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            250 | 257 => Ok(()),
            550 | 553 => Err(FtpCommandError::ActionNotTaken(cmd, reply)),
            _ => Err(other_reply(cmd, reply)),
        }
    }

    pub(crate) async fn remove_dir(&mut self, path: &str) -> Result<(), FtpCommandError> {
        let cmd = FtpVerb::RMD;
        let reply = self.send_command(cmd, Some(path), "remove dir").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            200 | 250 => Ok(()),
            550 => Err(FtpCommandError::ActionNotTaken(cmd, reply)),
            _ => Err(other_reply(cmd, reply)),
        }
    }

    pub(crate) async fn delete_file(&mut self, path: &str) -> Result<(), FtpCommandError> {
        let cmd = FtpVerb::DELE;
        let reply = self.send_command(cmd, Some(path), "delete file").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            200 | 250 => Ok(()),
            550 => Err(FtpCommandError::ActionNotTaken(cmd, reply)),
            _ => Err(other_reply(cmd, reply)),
        }
    }

    pub(crate) async fn rename_from(&mut self, path: &str) -> Result<(), FtpCommandError> {
        let cmd = FtpVerb::RNFR;
        let reply = self.send_command(cmd, Some(path), "rename from").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            350 => Ok(()),
            550 => Err(FtpCommandError::ActionNotTaken(cmd, reply)),
            _ => Err(other_reply(cmd, reply)),
        }
    }

    pub(crate) async fn rename_to(&mut self, path: &str) -> Result<(), FtpCommandError> {
        let cmd = FtpVerb::RNTO;
        let reply = self.send_command(cmd, Some(path), "rename to").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            503 => Err(FtpCommandError::BadCommandSequence(cmd)),
            250 => Ok(()),
            532 | 550 | 553 => Err(FtpCommandError::ActionNotTaken(cmd, reply)),
            _ => Err(other_reply(cmd, reply)),
        }
    }

    pub(crate) async fn request_pasv_port(&mut self) -> Result<SocketAddr, FtpCommandError> {
        let cmd = FtpVerb::PASV;
        let reply = self.send_command(cmd, None, "request pasv port").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            227 => match reply.parse_pasv_227_reply() {
                Some(addr) => Ok(addr),
                None => Err(FtpCommandError::InvalidReplySyntax(cmd, reply)),
            },
            _ => Err(other_reply(cmd, reply)),
        }
    }

    pub(crate) async fn request_port(&mut self, addr: SocketAddrV4) -> Result<(), FtpCommandError> {
        let cmd = FtpVerb::PORT;
        let [h1, h2, h3, h4] = addr.ip().octets();
        let [p1, p2] = addr.port().to_be_bytes();
        let param = format!("{h1},{h2},{h3},{h4},{p1},{p2}");
        let reply = self.send_command(cmd, Some(&param), "request port").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            504 => Err(FtpCommandError::ParameterNotImplemented(cmd)),
            200 => Ok(()),
            _ => Err(other_reply(cmd, reply)),
        }
    }

    pub(crate) async fn request_transfer_type(
        &mut self,
        t: FtpTransferType,
    ) -> Result<(), FtpCommandError> {
        let cmd = match t {
            FtpTransferType::Ascii => FtpVerb::TYPE_A,
            FtpTransferType::Image => FtpVerb::TYPE_I,
        };
        let reply = self.send_command(cmd, None, "request transfer type").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            504 => Err(FtpCommandError::ParameterNotImplemented(cmd)),
            200 => Ok(()),
            _ => Err(other_reply(cmd, reply)),
        }
    }

    async fn start_transfer(
        &mut self,
        cmd: FtpVerb,
        path: Option<&str>,
        stage: &'static str,
    ) -> Result<(), FtpCommandError> {
        match path {
            Some(p) => self.send_cmd1(cmd, p).await?,
            None => self.send_cmd(cmd).await?,
        }

        let reply = self.timed_read_raw_response(stage).await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            125 | 150 => Ok(()),
            532 | 550 | 552 | 553 => Err(FtpCommandError::ActionNotTaken(cmd, reply)),
            _ => Err(other_reply(cmd, reply)),
        }
    }

    pub(crate) async fn start_list(&mut self, path: Option<&str>) -> Result<(), FtpCommandError> {
        self.start_transfer(FtpVerb::LIST, path, "start list").await
    }

    pub(crate) async fn start_retrieve(&mut self, path: &str) -> Result<(), FtpCommandError> {
        self.start_transfer(FtpVerb::RETR, Some(path), "start retrieve")
            .await
    }

    pub(crate) async fn start_store(&mut self, path: &str) -> Result<(), FtpCommandError> {
        self.start_transfer(FtpVerb::STOR, Some(path), "start store")
            .await
    }

    /// Wait the end reply of a started transfer, no timeout applied here.
    pub(crate) async fn wait_transfer_end(
        &mut self,
        cmd: FtpVerb,
    ) -> Result<(), FtpTransferServerError> {
        let reply = self.read_raw_response().await?;
        match reply.code() {
            110 => Err(FtpTransferServerError::RestartNeeded),
            226 | 250 => Ok(()),
            421 => Err(FtpTransferServerError::ServiceNotAvailable),
            425 => Err(FtpTransferServerError::DataTransferNotEstablished),
            426 => Err(FtpTransferServerError::DataTransferLost),
            451 => Err(FtpTransferServerError::ServerFailed),
            551 => Err(FtpTransferServerError::PageTypeUnknown),
            552 => Err(FtpTransferServerError::ExceededStorageAllocation),
            450 | 550 | 553 => Err(FtpTransferServerError::ActionNotTaken(reply)),
            _ => Err(FtpTransferServerError::UnexpectedEndReply(cmd, reply)),
        }
    }

    pub(crate) async fn timed_wait_transfer_end(
        &mut self,
        cmd: FtpVerb,
        timeout: std::time::Duration,
    ) -> Result<(), FtpTransferServerError> {
        match tokio::time::timeout(timeout, self.wait_transfer_end(cmd)).await {
            Ok(r) => r,
            Err(_) => Err(FtpTransferServerError::TimeoutToWaitEndReply),
        }
    }

    pub(crate) async fn timed_wait_greetings(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<(), FtpCommandError> {
        match tokio::time::timeout(timeout, self.wait_greetings()).await {
            Ok(r) => r,
            Err(_) => Err(FtpCommandError::RecvFailed(
                FtpRawResponseError::ReadResponseTimedOut("wait greetings"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio_test::io::{Builder, Mock};

    fn channel(stream: Mock) -> FtpControlChannel<Mock> {
        FtpControlChannel::new(stream, FtpControlConfig::default())
    }

    #[tokio::test]
    async fn greetings_after_delay() {
        let stream = Builder::new()
            .read(b"120 ready in 1 minute\r\n")
            .read(b"220-Welcome\r\n220 ftp ready\r\n")
            .build();
        let mut ch = channel(stream);
        ch.wait_greetings().await.unwrap();
    }

    #[tokio::test]
    async fn greetings_unavailable() {
        let stream = Builder::new().read(b"421 too many users\r\n").build();
        let mut ch = channel(stream);
        let e = ch.wait_greetings().await.unwrap_err();
        assert!(matches!(e, FtpCommandError::ServiceNotAvailable));
    }

    #[tokio::test]
    async fn login() {
        let stream = Builder::new()
            .write(b"USER alice\r\n")
            .read(b"331 need password\r\n")
            .write(b"PASS secret\r\n")
            .read(b"230 logged in\r\n")
            .build();
        let mut ch = channel(stream);
        assert!(matches!(
            ch.send_username("alice").await.unwrap(),
            FtpAuthStatus::NeedPassword
        ));
        assert!(matches!(
            ch.send_password("secret").await.unwrap(),
            FtpAuthStatus::LoggedIn
        ));
    }

    #[tokio::test]
    async fn login_rejected() {
        let stream = Builder::new()
            .write(b"USER bob\r\n")
            .read(b"331 need password\r\n")
            .write(b"PASS wrong\r\n")
            .read(b"430 invalid username or password\r\n")
            .build();
        let mut ch = channel(stream);
        ch.send_username("bob").await.unwrap();
        assert!(matches!(
            ch.send_password("wrong").await.unwrap(),
            FtpAuthStatus::NotLoggedIn
        ));
    }

    #[tokio::test]
    async fn send_command_folds_preliminary() {
        let stream = Builder::new()
            .write(b"LIST\r\n")
            .read(b"150-Here comes\r\n150 the listing\r\n226 Done\r\n")
            .build();
        let mut ch = channel(stream);
        let reply = ch.send_command(FtpVerb::LIST, None, "list").await.unwrap();
        assert_eq!(reply.code(), 226);
        assert!(reply.is_multiline());
    }

    #[tokio::test]
    async fn reject_line_break() {
        let stream = Builder::new().build();
        let mut ch = channel(stream);
        let e = ch.delete_file("a\r\nRMD /").await.unwrap_err();
        assert!(matches!(e, FtpCommandError::InvalidParameter(FtpVerb::DELE)));
    }

    #[tokio::test]
    async fn pwd() {
        let stream = Builder::new()
            .write(b"PWD\r\n")
            .read(b"257 \"/home/alice\" is the current directory\r\n")
            .build();
        let mut ch = channel(stream);
        assert_eq!(ch.print_working_dir().await.unwrap(), "/home/alice");
    }

    #[tokio::test]
    async fn port() {
        let stream = Builder::new()
            .write(b"PORT 127,0,0,1,19,137\r\n")
            .read(b"200 PORT command successful\r\n")
            .build();
        let mut ch = channel(stream);
        ch.request_port(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 5001))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn pasv_rejected() {
        let stream = Builder::new()
            .write(b"PASV\r\n")
            .read(b"502 not implemented\r\n")
            .build();
        let mut ch = channel(stream);
        let e = ch.request_pasv_port().await.unwrap_err();
        assert!(matches!(e, FtpCommandError::CommandNotImplemented(FtpVerb::PASV)));
    }

    #[tokio::test]
    async fn unexpected_code() {
        let stream = Builder::new()
            .write(b"CWD /pub\r\n")
            .read(b"299 what\r\n")
            .build();
        let mut ch = channel(stream);
        let e = ch.change_dir("/pub").await.unwrap_err();
        let FtpCommandError::UnexpectedReply(cmd, reply) = e else {
            panic!("unexpected error {e}");
        };
        assert_eq!(cmd, FtpVerb::CWD);
        assert_eq!(reply.code(), 299);
    }

    #[tokio::test]
    async fn transient_reply() {
        let stream = Builder::new()
            .write(b"DELE a.txt\r\n")
            .read(b"450 file busy\r\n")
            .build();
        let mut ch = channel(stream);
        let e = ch.delete_file("a.txt").await.unwrap_err();
        assert!(matches!(e, FtpCommandError::TransientFailure(_, _)));
    }

    #[tokio::test]
    async fn transfer_end() {
        let stream = Builder::new()
            .write(b"RETR a.bin\r\n")
            .read(b"150 opening data connection\r\n")
            .read(b"226 transfer complete\r\n")
            .build();
        let mut ch = channel(stream);
        ch.start_retrieve("a.bin").await.unwrap();
        ch.wait_transfer_end(FtpVerb::RETR).await.unwrap();
    }

    #[tokio::test]
    async fn transfer_lost() {
        let stream = Builder::new()
            .write(b"STOR a.bin\r\n")
            .read(b"150 ok\r\n")
            .read(b"426 connection closed; transfer aborted\r\n")
            .build();
        let mut ch = channel(stream);
        ch.start_store("a.bin").await.unwrap();
        let e = ch.wait_transfer_end(FtpVerb::STOR).await.unwrap_err();
        assert!(matches!(e, FtpTransferServerError::DataTransferLost));
    }

    #[tokio::test]
    async fn close_without_ack() {
        let stream = Builder::new().write(b"QUIT\r\n").build();
        let mut ch = channel(stream);
        let e = ch.close().await.unwrap_err();
        assert!(matches!(
            e,
            FtpCommandError::RecvFailed(FtpRawResponseError::ConnectionClosed)
        ));
    }
}
