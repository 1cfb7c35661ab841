/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FtpListParseError {
    #[error("not enough fields")]
    NotEnoughFields,
    #[error("no modify time field")]
    NoTimeField,
    #[error("invalid size")]
    InvalidSize,
    #[error("invalid modify time: {0}")]
    InvalidModifyTime(#[from] chrono::ParseError),
    #[error("empty file name")]
    EmptyName,
}
