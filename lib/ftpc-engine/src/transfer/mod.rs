/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;

mod channel;
pub(crate) use channel::{FtpDataChannel, FtpDataNegotiator};

mod data;
pub(crate) use data::FtpDataTransfer;

mod line;
pub(crate) use line::{FtpLineDataReceiver, FtpLineDataTransfer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FtpTransferType {
    Ascii,
    Image,
}

/// How the data connection of a transfer was set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpDataMode {
    /// the client connects to the address announced by PASV
    Passive,
    /// the server connects back to the address announced by PORT
    Active,
}

impl fmt::Display for FtpDataMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FtpDataMode::Passive => f.write_str("passive"),
            FtpDataMode::Active => f.write_str("active"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpTransferDirection {
    Upload,
    Download,
}

impl fmt::Display for FtpTransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FtpTransferDirection::Upload => f.write_str("upload"),
            FtpTransferDirection::Download => f.write_str("download"),
        }
    }
}
