/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::Ipv4Addr;
use std::sync::Arc;

use log::debug;

use crate::control::{FtpControlChannel, FtpVerb};
use crate::error::{
    FtpAuthStatus, FtpCommandError, FtpDataIoError, FtpFailure, FtpFailureKind,
    FtpSessionOpenError,
};
use crate::facts::FtpListCollector;
use crate::transfer::{
    FtpDataChannel, FtpDataNegotiator, FtpDataTransfer, FtpLineDataTransfer,
    FtpTransferDirection, FtpTransferType,
};
use crate::{FtpClientConfig, FtpCommand, FtpConnectionProvider, FtpCredentials, FtpOutput};

/// Resolve `path` against `cwd`, removing `.` and `..` components.
pub(crate) fn resolve_path(cwd: &str, path: &str) -> Result<String, FtpFailure> {
    if path.trim().is_empty() {
        return Err(FtpFailure::new(FtpFailureKind::MissingField, "path"));
    }

    let mut parts: Vec<&str> = Vec::new();
    let base = if path.starts_with('/') { "" } else { cwd };
    for part in base.split('/').chain(path.split('/')) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            p => parts.push(p),
        }
    }

    let mut resolved = String::with_capacity(path.len() + cwd.len() + 1);
    for p in &parts {
        resolved.push('/');
        resolved.push_str(p);
    }
    if resolved.is_empty() {
        resolved.push('/');
    }
    Ok(resolved)
}

/// Translates commands into control and data channel exchanges.
pub(crate) struct FtpDispatcher<P: FtpConnectionProvider> {
    control: FtpControlChannel<P::Stream>,
    provider: P,
    negotiator: FtpDataNegotiator,
    config: Arc<FtpClientConfig>,
    server_host: Ipv4Addr,
    transfer_type: Option<FtpTransferType>,
    cwd: String,
}

impl<P: FtpConnectionProvider> FtpDispatcher<P> {
    pub(crate) fn new(
        control: FtpControlChannel<P::Stream>,
        provider: P,
        config: Arc<FtpClientConfig>,
        server_host: Ipv4Addr,
    ) -> Self {
        FtpDispatcher {
            control,
            provider,
            negotiator: FtpDataNegotiator::default(),
            config,
            server_host,
            transfer_type: None,
            cwd: "/".to_string(),
        }
    }

    #[inline]
    pub(crate) fn current_directory(&self) -> &str {
        &self.cwd
    }

    pub(crate) async fn login(&mut self, credentials: &FtpCredentials) -> Result<(), FtpFailure> {
        let status = self
            .control
            .send_username(credentials.username())
            .await
            .map_err(FtpSessionOpenError::from)?;
        let status = match status {
            FtpAuthStatus::NeedPassword => self
                .control
                .send_password(credentials.password())
                .await
                .map_err(FtpSessionOpenError::from)?,
            s => s,
        };
        match status {
            FtpAuthStatus::LoggedIn => {}
            FtpAuthStatus::NeedAccount => return Err(FtpSessionOpenError::AccountIsNeeded.into()),
            FtpAuthStatus::NotLoggedIn | FtpAuthStatus::NeedPassword => {
                return Err(FtpSessionOpenError::NotLoggedIn.into());
            }
        }

        match self.control.print_working_dir().await {
            Ok(path) => self.cwd = path,
            Err(e @ (FtpCommandError::SendFailed(_) | FtpCommandError::RecvFailed(_))) => {
                return Err(e.into());
            }
            Err(e) => debug!("no initial working directory, use '/': {e}"),
        }
        Ok(())
    }

    pub(crate) async fn dispatch(&mut self, command: FtpCommand) -> Result<FtpOutput, FtpFailure> {
        match command {
            FtpCommand::ChangeDirectory(path) => {
                let path = resolve_path(&self.cwd, &path)?;
                self.control.change_dir(&path).await?;
                self.cwd = path;
                Ok(FtpOutput::Ack)
            }
            FtpCommand::PrintWorkingDirectory => {
                let path = self.control.print_working_dir().await?;
                Ok(FtpOutput::Text(path))
            }
            FtpCommand::Mkdir(path) => {
                let path = resolve_path(&self.cwd, &path)?;
                self.control.make_dir(&path).await?;
                Ok(FtpOutput::Ack)
            }
            FtpCommand::Rmdir(path) => {
                let path = resolve_path(&self.cwd, &path)?;
                self.control.remove_dir(&path).await?;
                Ok(FtpOutput::Ack)
            }
            FtpCommand::Delete(path) => {
                let path = resolve_path(&self.cwd, &path)?;
                self.control.delete_file(&path).await?;
                Ok(FtpOutput::Ack)
            }
            FtpCommand::Move(from, to) => {
                let from = resolve_path(&self.cwd, &from)?;
                let to = resolve_path(&self.cwd, &to)?;
                self.rename(&from, &to).await?;
                Ok(FtpOutput::Ack)
            }
            FtpCommand::List(path) => {
                let path = path.map(|p| resolve_path(&self.cwd, &p)).transpose()?;
                let entries = self.list(path.as_deref()).await?;
                Ok(FtpOutput::Listing(entries))
            }
            FtpCommand::Get(path) => {
                let path = resolve_path(&self.cwd, &path)?;
                let data = self.retrieve(&path).await?;
                Ok(FtpOutput::Bytes(data))
            }
            FtpCommand::Put(path, data) => {
                let path = resolve_path(&self.cwd, &path)?;
                self.store(&path, &data).await?;
                Ok(FtpOutput::Ack)
            }
            FtpCommand::Quit => {
                self.control.close().await?;
                Ok(FtpOutput::Ack)
            }
        }
    }

    async fn rename(&mut self, from: &str, to: &str) -> Result<(), FtpFailure> {
        self.control.rename_from(from).await?;
        self.control.rename_to(to).await.map_err(|e| {
            let mut f = FtpFailure::from(e);
            if !f.kind().is_transport() {
                f.set_kind(FtpFailureKind::RenameIncomplete);
            }
            f
        })
    }

    async fn ensure_transfer_type(&mut self, t: FtpTransferType) -> Result<(), FtpFailure> {
        if self.transfer_type != Some(t) {
            self.control.request_transfer_type(t).await?;
            self.transfer_type = Some(t);
        }
        Ok(())
    }

    async fn open_data_channel(&mut self) -> Result<FtpDataChannel<P>, FtpFailure> {
        let channel = self
            .negotiator
            .open(
                &mut self.control,
                &mut self.provider,
                &self.config,
                self.server_host,
            )
            .await?;
        Ok(channel)
    }

    /// Wait the end reply of a transfer whose data phase failed.
    async fn finish_failed_transfer(
        &mut self,
        verb: FtpVerb,
        mut failure: FtpFailure,
    ) -> FtpFailure {
        if let Err(e) = self
            .control
            .timed_wait_transfer_end(verb, self.config.transfer.end_wait_timeout)
            .await
        {
            let end = FtpFailure::from(e);
            debug!("end reply of failed {verb} transfer: {end}");
            failure.escalate(end.effect());
        }
        failure
    }

    async fn list(&mut self, path: Option<&str>) -> Result<Vec<crate::FtpListEntry>, FtpFailure> {
        let verb = FtpVerb::LIST;
        self.ensure_transfer_type(FtpTransferType::Ascii).await?;
        let channel = self.open_data_channel().await?;
        let mode = channel.mode();
        self.control.start_list(path).await?;

        let stream = match channel.establish(self.config.transfer.accept_timeout).await {
            Ok(stream) => stream,
            Err(e) => return Err(self.finish_failed_transfer(verb, e.into()).await),
        };
        crate::log_msg!("{mode} data channel established for {verb}");

        let transfer = FtpLineDataTransfer::new(stream, &self.config.transfer);
        let mut collector = FtpListCollector::default();
        let r = match tokio::time::timeout(
            self.config.transfer.list_all_timeout,
            transfer.read_to_end(&mut collector),
        )
        .await
        {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(FtpFailure::from(e)),
            Err(_) => Err(FtpFailure::from(FtpDataIoError::AllTimedOut)),
        };
        if let Err(f) = r {
            return Err(self.finish_failed_transfer(verb, f).await);
        }

        self.control
            .timed_wait_transfer_end(verb, self.config.transfer.end_wait_timeout)
            .await?;
        Ok(collector.into_entries())
    }

    async fn retrieve(&mut self, path: &str) -> Result<Vec<u8>, FtpFailure> {
        let verb = FtpVerb::RETR;
        self.ensure_transfer_type(FtpTransferType::Image).await?;
        let channel = self.open_data_channel().await?;
        let mode = channel.mode();
        self.control.start_retrieve(path).await?;

        let stream = match channel.establish(self.config.transfer.accept_timeout).await {
            Ok(stream) => stream,
            Err(e) => return Err(self.finish_failed_transfer(verb, e.into()).await),
        };
        crate::log_msg!("{mode} data channel established for {verb} {path}");

        let mut transfer =
            FtpDataTransfer::new(FtpTransferDirection::Download, stream, &self.config.transfer);
        let mut data = Vec::new();
        let r = transfer.receive_all(&mut data).await;
        let transferred = transfer.byte_count();
        let direction = transfer.direction();
        drop(transfer);
        if let Err(e) = r {
            let f = FtpFailure::from(e).with_transferred(transferred);
            return Err(self.finish_failed_transfer(verb, f).await);
        }

        self.control
            .timed_wait_transfer_end(verb, self.config.transfer.end_wait_timeout)
            .await
            .map_err(|e| FtpFailure::from(e).with_transferred(transferred))?;
        crate::log_msg!("{direction} of {path} finished, {transferred} bytes");
        Ok(data)
    }

    async fn store(&mut self, path: &str, data: &[u8]) -> Result<(), FtpFailure> {
        let verb = FtpVerb::STOR;
        self.ensure_transfer_type(FtpTransferType::Image).await?;
        let channel = self.open_data_channel().await?;
        let mode = channel.mode();
        self.control.start_store(path).await?;

        let stream = match channel.establish(self.config.transfer.accept_timeout).await {
            Ok(stream) => stream,
            Err(e) => return Err(self.finish_failed_transfer(verb, e.into()).await),
        };
        crate::log_msg!("{mode} data channel established for {verb} {path}");

        let mut transfer =
            FtpDataTransfer::new(FtpTransferDirection::Upload, stream, &self.config.transfer);
        let r = transfer.send_all(data).await;
        let transferred = transfer.byte_count();
        let direction = transfer.direction();
        drop(transfer);
        if let Err(e) = r {
            let f = FtpFailure::from(e).with_transferred(transferred);
            return Err(self.finish_failed_transfer(verb, f).await);
        }

        self.control
            .timed_wait_transfer_end(verb, self.config.transfer.end_wait_timeout)
            .await
            .map_err(|e| FtpFailure::from(e).with_transferred(transferred))?;
        crate::log_msg!("{direction} of {path} finished, {transferred} bytes");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve() {
        assert_eq!(resolve_path("/", "pub").unwrap(), "/pub");
        assert_eq!(resolve_path("/pub", "incoming/").unwrap(), "/pub/incoming");
        assert_eq!(resolve_path("/pub", "/etc").unwrap(), "/etc");
        assert_eq!(resolve_path("/pub/incoming", "..").unwrap(), "/pub");
        assert_eq!(resolve_path("/pub", "../../..").unwrap(), "/");
        assert_eq!(resolve_path("/pub", "./a//b/./c").unwrap(), "/pub/a/b/c");
        assert_eq!(resolve_path("/", " my file.txt ").unwrap(), "/ my file.txt ");
        assert_eq!(resolve_path("/pub", "a ").unwrap(), "/pub/a ");

        let e = resolve_path("/", "  ").unwrap_err();
        assert_eq!(e.kind(), FtpFailureKind::MissingField);
    }
}
