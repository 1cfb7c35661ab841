/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use tokio::io::{AsyncRead, AsyncWrite, BufStream};

use crate::config::FtpTransferConfig;
use crate::error::FtpLineDataReadError;
use crate::io::LimitedBufReadExt;

pub(crate) trait FtpLineDataReceiver {
    fn recv_line(&mut self, line: &str);
}

pub(crate) struct FtpLineDataTransfer<T: AsyncRead + AsyncWrite> {
    io: BufStream<T>,
    max_lines: usize,
    max_line_len: usize,
    line_buf: Vec<u8>,
}

impl<T> FtpLineDataTransfer<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(io: T, config: &FtpTransferConfig) -> Self {
        FtpLineDataTransfer {
            io: BufStream::new(io),
            max_lines: config.list_max_entries,
            max_line_len: config.list_max_line_len,
            line_buf: Vec::with_capacity(config.list_max_line_len),
        }
    }

    fn send_buf_to_receiver<R>(&mut self, receiver: &mut R)
    where
        R: FtpLineDataReceiver,
    {
        let s = String::from_utf8_lossy(&self.line_buf);
        receiver.recv_line(s.trim_end_matches(['\r', '\n']));
        self.line_buf.clear();
    }

    pub(crate) async fn read_to_end<R>(
        mut self,
        receiver: &mut R,
    ) -> Result<(), FtpLineDataReadError>
    where
        R: FtpLineDataReceiver,
    {
        let mut lines = 0usize;
        loop {
            let (found, nr) = self
                .io
                .limited_read_until(b'\n', self.max_line_len, &mut self.line_buf)
                .await?;
            if nr == 0 {
                return Ok(());
            }
            if lines >= self.max_lines {
                return Err(FtpLineDataReadError::TooManyLines);
            }
            lines += 1;

            if !found {
                if nr >= self.max_line_len {
                    return Err(FtpLineDataReadError::LineTooLong(lines));
                }
                // last line without line ending
                self.send_buf_to_receiver(receiver);
                return Ok(());
            }

            self.send_buf_to_receiver(receiver);
        }
    }
}
