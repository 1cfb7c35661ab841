/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use crate::FtpListEntry;

/// A high level operation executed on a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FtpCommand {
    ChangeDirectory(String),
    Delete(String),
    Get(String),
    List(Option<String>),
    Mkdir(String),
    Put(String, Vec<u8>),
    PrintWorkingDirectory,
    Quit,
    Rmdir(String),
    Move(String, String),
}

/// The kind of output each command produces on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpOutputKind {
    Text,
    Bytes,
    Listing,
    Ack,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FtpOutput {
    Text(String),
    Bytes(Vec<u8>),
    Listing(Vec<FtpListEntry>),
    Ack,
}

impl FtpCommand {
    /// The user facing name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            FtpCommand::ChangeDirectory(_) => "CD",
            FtpCommand::Delete(_) => "DELETE",
            FtpCommand::Get(_) => "GET",
            FtpCommand::List(_) => "LS",
            FtpCommand::Mkdir(_) => "MKDIR",
            FtpCommand::Put(_, _) => "PUT",
            FtpCommand::PrintWorkingDirectory => "PWD",
            FtpCommand::Quit => "QUIT",
            FtpCommand::Rmdir(_) => "RMDIR",
            FtpCommand::Move(_, _) => "MV",
        }
    }

    pub fn output_kind(&self) -> FtpOutputKind {
        match self {
            FtpCommand::Get(_) => FtpOutputKind::Bytes,
            FtpCommand::List(_) => FtpOutputKind::Listing,
            FtpCommand::PrintWorkingDirectory => FtpOutputKind::Text,
            FtpCommand::ChangeDirectory(_)
            | FtpCommand::Delete(_)
            | FtpCommand::Mkdir(_)
            | FtpCommand::Put(_, _)
            | FtpCommand::Quit
            | FtpCommand::Rmdir(_)
            | FtpCommand::Move(_, _) => FtpOutputKind::Ack,
        }
    }
}

impl fmt::Display for FtpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FtpCommand::ChangeDirectory(p)
            | FtpCommand::Delete(p)
            | FtpCommand::Get(p)
            | FtpCommand::Mkdir(p)
            | FtpCommand::Rmdir(p) => write!(f, "{} {p}", self.name()),
            FtpCommand::List(Some(p)) => write!(f, "{} {p}", self.name()),
            FtpCommand::Put(p, data) => write!(f, "{} {p} ({} bytes)", self.name(), data.len()),
            FtpCommand::Move(from, to) => write!(f, "{} {from} {to}", self.name()),
            FtpCommand::List(None) | FtpCommand::PrintWorkingDirectory | FtpCommand::Quit => {
                f.write_str(self.name())
            }
        }
    }
}

impl FtpOutput {
    pub fn kind(&self) -> FtpOutputKind {
        match self {
            FtpOutput::Text(_) => FtpOutputKind::Text,
            FtpOutput::Bytes(_) => FtpOutputKind::Bytes,
            FtpOutput::Listing(_) => FtpOutputKind::Listing,
            FtpOutput::Ack => FtpOutputKind::Ack,
        }
    }
}
