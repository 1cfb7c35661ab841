/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FtpFileEntryType {
    Unknown,
    File,
    Directory,
    Symlink,
    CurrentDir,
    ParentDir,
    OsType(String),
}

impl fmt::Display for FtpFileEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FtpFileEntryType {
    /// Map the first char of a `ls -l` mode string.
    pub(super) fn from_unix_mode(c: char) -> Self {
        match c {
            '-' => FtpFileEntryType::File,
            'd' => FtpFileEntryType::Directory,
            'l' => FtpFileEntryType::Symlink,
            _ => FtpFileEntryType::OsType(c.to_string()),
        }
    }

    pub(super) fn with_name(self, name: &str) -> Self {
        match (self, name) {
            (FtpFileEntryType::Directory, ".") => FtpFileEntryType::CurrentDir,
            (FtpFileEntryType::Directory, "..") => FtpFileEntryType::ParentDir,
            (t, _) => t,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FtpFileEntryType::Unknown => "unknown",
            FtpFileEntryType::File => "file",
            FtpFileEntryType::Directory => "dir",
            FtpFileEntryType::Symlink => "link",
            FtpFileEntryType::CurrentDir => "cdir",
            FtpFileEntryType::ParentDir => "pdir",
            FtpFileEntryType::OsType(s) => s,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(
            self,
            FtpFileEntryType::Directory
                | FtpFileEntryType::CurrentDir
                | FtpFileEntryType::ParentDir
        )
    }

    pub fn maybe_file(&self) -> bool {
        match self {
            FtpFileEntryType::Unknown => true,
            FtpFileEntryType::File => true,
            FtpFileEntryType::Directory => false,
            FtpFileEntryType::Symlink => true,
            FtpFileEntryType::CurrentDir => false,
            FtpFileEntryType::ParentDir => false,
            FtpFileEntryType::OsType(_) => true,
        }
    }
}
