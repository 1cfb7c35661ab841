/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::borrow::Cow;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use tokio::io::{AsyncRead, AsyncWrite};

use super::FtpControlChannel;
use crate::error::FtpRawResponseError;
use crate::io::LimitedBufReadExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpReplyClass {
    /// 1xx, another reply will follow
    Preliminary,
    /// 2xx
    Completion,
    /// 3xx, more input is needed
    Intermediate,
    /// 4xx, may be retried
    TransientNegative,
    /// 5xx
    PermanentNegative,
}

/// A complete server reply, multi-line replies already reassembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FtpReply {
    SingleLine(u16, String),
    MultiLine(u16, Vec<String>),
}

fn parse_code(line: &[u8]) -> Result<u16, FtpRawResponseError> {
    let digits = &line[..3];
    if !digits.iter().all(|c| c.is_ascii_digit()) || !(b'1'..=b'5').contains(&digits[0]) {
        return Err(FtpRawResponseError::InvalidReplyCode(
            String::from_utf8_lossy(digits).to_string(),
        ));
    }
    Ok(digits
        .iter()
        .fold(0u16, |acc, c| acc * 10 + (c - b'0') as u16))
}

fn line_text(line: &[u8]) -> Result<String, FtpRawResponseError> {
    let msg = std::str::from_utf8(line).map_err(|_| FtpRawResponseError::LineIsNotUtf8)?;
    Ok(msg.trim_end().to_string())
}

impl FtpReply {
    pub(super) fn parse_single_line(line: &[u8]) -> Result<Self, FtpRawResponseError> {
        let code = parse_code(line)?;
        let msg = line_text(line.get(4..).unwrap_or_default())?;
        Ok(FtpReply::SingleLine(code, msg))
    }

    pub(super) fn get_multi_line_parser(
        line: &[u8],
        max_lines: usize,
    ) -> Result<FtpMultiLineReplyParser, FtpRawResponseError> {
        let code = parse_code(line)?;
        let end_prefix = [line[0], line[1], line[2], b' '];
        let mut lines = Vec::<String>::with_capacity(max_lines.min(16));
        lines.push(line_text(&line[4..])?);
        Ok(FtpMultiLineReplyParser {
            code,
            end_prefix,
            lines,
        })
    }

    pub fn code(&self) -> u16 {
        match self {
            FtpReply::SingleLine(code, _) => *code,
            FtpReply::MultiLine(code, _) => *code,
        }
    }

    pub fn class(&self) -> FtpReplyClass {
        match self.code() / 100 {
            1 => FtpReplyClass::Preliminary,
            2 => FtpReplyClass::Completion,
            3 => FtpReplyClass::Intermediate,
            4 => FtpReplyClass::TransientNegative,
            _ => FtpReplyClass::PermanentNegative,
        }
    }

    pub fn is_multiline(&self) -> bool {
        matches!(self, FtpReply::MultiLine(_, _))
    }

    pub fn lines(&self) -> &[String] {
        match self {
            FtpReply::SingleLine(_, line) => std::slice::from_ref(line),
            FtpReply::MultiLine(_, lines) => lines,
        }
    }

    /// The reply text, lines of a multi-line reply joined by '\n'.
    pub fn message(&self) -> Cow<'_, str> {
        match self {
            FtpReply::SingleLine(_, line) => Cow::Borrowed(line),
            FtpReply::MultiLine(_, lines) => Cow::Owned(lines.join("\n")),
        }
    }

    pub(super) fn line_trimmed(&self) -> Option<&str> {
        match self {
            FtpReply::SingleLine(_, line) => Some(line.as_str().trim()),
            FtpReply::MultiLine(_, _) => None,
        }
    }

    /// Append the lines of a following reply, the later code wins.
    pub(super) fn fold(self, next: FtpReply) -> FtpReply {
        let code = next.code();
        let mut lines = match self {
            FtpReply::SingleLine(_, line) => vec![line],
            FtpReply::MultiLine(_, lines) => lines,
        };
        match next {
            FtpReply::SingleLine(_, line) => lines.push(line),
            FtpReply::MultiLine(_, more) => lines.extend(more),
        }
        FtpReply::MultiLine(code, lines)
    }

    pub(super) fn parse_pasv_227_reply(&self) -> Option<SocketAddr> {
        let line = self.line_trimmed()?;

        let p_start = memchr::memchr(b'(', line.as_bytes())?;
        let p_end = memchr::memchr(b')', &line.as_bytes()[p_start..])? + p_start;

        let a: Vec<&str> = line[p_start + 1..p_end].split(',').map(str::trim).collect();
        if a.len() != 6 {
            return None;
        }

        let h1 = u8::from_str(a[0]).ok()?;
        let h2 = u8::from_str(a[1]).ok()?;
        let h3 = u8::from_str(a[2]).ok()?;
        let h4 = u8::from_str(a[3]).ok()?;
        let p1 = u8::from_str(a[4]).ok()?;
        let p2 = u8::from_str(a[5]).ok()?;

        let ip = IpAddr::V4(Ipv4Addr::new(h1, h2, h3, h4));
        let port = ((p1 as u16) << 8) + (p2 as u16);
        Some(SocketAddr::new(ip, port))
    }

    /// Extract the path from `257 "<path>" ...`, doubled quotes are unescaped.
    pub(super) fn parse_257_path(&self) -> Option<String> {
        let line = self.lines().first()?;
        let start = memchr::memchr(b'"', line.as_bytes())?;

        let mut path = String::new();
        let mut chars = line[start + 1..].chars().peekable();
        while let Some(c) = chars.next() {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    path.push('"');
                } else {
                    return Some(path);
                }
            } else {
                path.push(c);
            }
        }
        None
    }
}

impl fmt::Display for FtpReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FtpReply::SingleLine(code, line) => write!(f, "{code} {line}"),
            FtpReply::MultiLine(code, lines) => write!(f, "{code} {}", lines.join(" | ")),
        }
    }
}

pub(super) struct FtpMultiLineReplyParser {
    code: u16,
    end_prefix: [u8; 4],
    lines: Vec<String>,
}

impl FtpMultiLineReplyParser {
    pub(super) fn feed_line(&mut self, line: &[u8]) -> Result<bool, FtpRawResponseError> {
        if line.starts_with(&self.end_prefix) {
            self.lines.push(line_text(&line[4..])?);
            Ok(true)
        } else {
            // do not trim whitespace at beginning
            self.lines.push(line_text(line)?);
            Ok(false)
        }
    }

    pub(super) fn finish(self) -> FtpReply {
        FtpReply::MultiLine(self.code, self.lines)
    }
}

impl<T> FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    async fn read_line(
        &mut self,
        buf: &mut Vec<u8>,
        min_len: usize,
    ) -> Result<(), FtpRawResponseError> {
        buf.clear();

        let (found, len) = self
            .stream
            .limited_read_until(b'\n', self.config.max_line_len, buf)
            .await
            .map_err(FtpRawResponseError::ReadFailed)?;
        if len == 0 {
            return Err(FtpRawResponseError::ConnectionClosed);
        }

        #[cfg(feature = "log-raw-io")]
        crate::debug::log_rsp(String::from_utf8_lossy(buf).trim_end());

        if !found {
            if len < self.config.max_line_len {
                // eof in the middle of a line
                return Err(FtpRawResponseError::ConnectionClosed);
            }
            return Err(FtpRawResponseError::LineTooLong);
        }
        if len < min_len {
            return Err(FtpRawResponseError::InvalidLineFormat);
        }
        Ok(())
    }

    pub(super) async fn read_raw_response(&mut self) -> Result<FtpReply, FtpRawResponseError> {
        let mut buf = Vec::<u8>::with_capacity(self.config.max_line_len.min(4096));
        // at least <code>\n
        self.read_line(&mut buf, 4).await?;

        match buf[3] {
            b' ' | b'\r' | b'\n' => FtpReply::parse_single_line(&buf),
            b'-' => {
                let mut ml_parser =
                    FtpReply::get_multi_line_parser(&buf, self.config.max_multi_lines)?;
                for _i in 0..self.config.max_multi_lines {
                    self.read_line(&mut buf, 1).await?;
                    let end = ml_parser.feed_line(&buf)?;
                    if end {
                        return Ok(ml_parser.finish());
                    }
                }
                Err(FtpRawResponseError::TooManyLines)
            }
            _ => Err(FtpRawResponseError::InvalidLineFormat),
        }
    }

    pub(super) async fn timed_read_raw_response(
        &mut self,
        stage: &'static str,
    ) -> Result<FtpReply, FtpRawResponseError> {
        match tokio::time::timeout(self.config.command_timeout, self.read_raw_response()).await {
            Ok(r) => r,
            Err(_) => Err(FtpRawResponseError::ReadResponseTimedOut(stage)),
        }
    }

    /// Read until a non preliminary reply, folding 1xx replies into it.
    pub(super) async fn timed_read_final_response(
        &mut self,
        stage: &'static str,
    ) -> Result<FtpReply, FtpRawResponseError> {
        let mut reply = self.timed_read_raw_response(stage).await?;
        while reply.class() == FtpReplyClass::Preliminary {
            let next = self.timed_read_raw_response(stage).await?;
            reply = reply.fold(next);
        }
        Ok(reply)
    }
}
