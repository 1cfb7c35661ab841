/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::FtpTransferDirection;
use crate::config::FtpTransferConfig;
use crate::error::FtpDataIoError;

const DATA_CHUNK_SIZE: usize = 16 * 1024;

/// Raw bytes moved over the data connection of a RETR or STOR.
pub(crate) struct FtpDataTransfer<S> {
    direction: FtpTransferDirection,
    stream: S,
    byte_count: u64,
    idle_timeout: Duration,
}

impl<S> FtpDataTransfer<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(
        direction: FtpTransferDirection,
        stream: S,
        config: &FtpTransferConfig,
    ) -> Self {
        FtpDataTransfer {
            direction,
            stream,
            byte_count: 0,
            idle_timeout: config.idle_timeout,
        }
    }

    #[inline]
    pub(crate) fn direction(&self) -> FtpTransferDirection {
        self.direction
    }

    #[inline]
    pub(crate) fn byte_count(&self) -> u64 {
        self.byte_count
    }

    /// Read until the server closes the data connection.
    pub(crate) async fn receive_all(&mut self, buf: &mut Vec<u8>) -> Result<(), FtpDataIoError> {
        let mut chunk = vec![0u8; DATA_CHUNK_SIZE];
        loop {
            let read = self.stream.read(&mut chunk);
            let nr = match tokio::time::timeout(self.idle_timeout, read).await {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(FtpDataIoError::ReadFailed(e)),
                Err(_) => return Err(FtpDataIoError::IdleTimedOut),
            };
            if nr == 0 {
                return Ok(());
            }
            buf.extend_from_slice(&chunk[..nr]);
            self.byte_count += nr as u64;
        }
    }

    /// Write all data then close our side so the server sees EOF.
    pub(crate) async fn send_all(&mut self, data: &[u8]) -> Result<(), FtpDataIoError> {
        for chunk in data.chunks(DATA_CHUNK_SIZE) {
            match tokio::time::timeout(self.idle_timeout, self.stream.write_all(chunk)).await {
                Ok(Ok(_)) => self.byte_count += chunk.len() as u64,
                Ok(Err(e)) => return Err(FtpDataIoError::WriteFailed(e)),
                Err(_) => return Err(FtpDataIoError::IdleTimedOut),
            }
        }
        match tokio::time::timeout(self.idle_timeout, self.stream.shutdown()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(FtpDataIoError::WriteFailed(e)),
            Err(_) => Err(FtpDataIoError::IdleTimedOut),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn receive() {
        let stream = tokio_test::io::Builder::new()
            .read(b"\x00\x01\x02")
            .read(b"\xff\r\n")
            .build();
        let mut transfer = FtpDataTransfer::new(
            FtpTransferDirection::Download,
            stream,
            &FtpTransferConfig::default(),
        );
        let mut buf = Vec::new();
        transfer.receive_all(&mut buf).await.unwrap();
        assert_eq!(buf.as_slice(), b"\x00\x01\x02\xff\r\n");
        assert_eq!(transfer.byte_count(), 6);
    }

    #[tokio::test]
    async fn send() {
        let stream = tokio_test::io::Builder::new().write(b"abc\r\n\x00").build();
        let mut transfer = FtpDataTransfer::new(
            FtpTransferDirection::Upload,
            stream,
            &FtpTransferConfig::default(),
        );
        transfer.send_all(b"abc\r\n\x00").await.unwrap();
        assert_eq!(transfer.byte_count(), 6);
        assert_eq!(transfer.direction(), FtpTransferDirection::Upload);
    }

    #[tokio::test]
    async fn read_error_keeps_count() {
        let stream = tokio_test::io::Builder::new()
            .read(b"1234")
            .read_error(std::io::Error::from(std::io::ErrorKind::ConnectionReset))
            .build();
        let mut transfer = FtpDataTransfer::new(
            FtpTransferDirection::Download,
            stream,
            &FtpTransferConfig::default(),
        );
        let mut buf = Vec::new();
        let e = transfer.receive_all(&mut buf).await.unwrap_err();
        assert!(matches!(e, FtpDataIoError::ReadFailed(_)));
        assert_eq!(transfer.byte_count(), 4);
    }
}
