/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

#[cfg(feature = "yaml")]
mod yaml;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpControlConfig {
    pub(crate) max_line_len: usize,
    pub(crate) max_multi_lines: usize,
    pub(crate) command_timeout: Duration,
}

impl Default for FtpControlConfig {
    fn default() -> Self {
        FtpControlConfig {
            max_line_len: 2048,
            max_multi_lines: 128,
            command_timeout: Duration::from_secs(10),
        }
    }
}

impl FtpControlConfig {
    pub fn set_max_line_len(&mut self, len: usize) {
        self.max_line_len = len.max(8);
    }

    pub fn set_max_multi_lines(&mut self, lines: usize) {
        self.max_multi_lines = lines;
    }

    pub fn set_command_timeout(&mut self, timeout: Duration) {
        self.command_timeout = timeout;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpTransferConfig {
    pub(crate) list_max_line_len: usize,
    pub(crate) list_max_entries: usize,
    pub(crate) list_all_timeout: Duration,
    pub(crate) end_wait_timeout: Duration,
    pub(crate) data_connect_timeout: Duration,
    pub(crate) accept_timeout: Duration,
    pub(crate) idle_timeout: Duration,
}

impl Default for FtpTransferConfig {
    fn default() -> Self {
        FtpTransferConfig {
            list_max_line_len: 2048,
            list_max_entries: 1024,
            list_all_timeout: Duration::from_secs(120),
            end_wait_timeout: Duration::from_secs(10),
            data_connect_timeout: Duration::from_secs(10),
            accept_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

impl FtpTransferConfig {
    pub fn set_list_max_line_len(&mut self, len: usize) {
        self.list_max_line_len = len.max(1);
    }

    pub fn set_list_max_entries(&mut self, entries: usize) {
        self.list_max_entries = entries;
    }

    pub fn set_list_all_timeout(&mut self, timeout: Duration) {
        self.list_all_timeout = timeout;
    }

    pub fn set_end_wait_timeout(&mut self, timeout: Duration) {
        self.end_wait_timeout = timeout;
    }

    pub fn set_data_connect_timeout(&mut self, timeout: Duration) {
        self.data_connect_timeout = timeout;
    }

    pub fn set_accept_timeout(&mut self, timeout: Duration) {
        self.accept_timeout = timeout;
    }

    pub fn set_idle_timeout(&mut self, timeout: Duration) {
        self.idle_timeout = timeout;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpClientConfig {
    pub(crate) control: FtpControlConfig,
    pub(crate) transfer: FtpTransferConfig,
    pub(crate) connect_timeout: Duration,
    pub(crate) greeting_timeout: Duration,
    pub(crate) active_fallback: bool,
    pub(crate) active_only: bool,
    pub(crate) passive_use_control_host: bool,
}

impl Default for FtpClientConfig {
    fn default() -> Self {
        FtpClientConfig {
            control: FtpControlConfig::default(),
            transfer: FtpTransferConfig::default(),
            connect_timeout: Duration::from_secs(10),
            greeting_timeout: Duration::from_secs(10),
            active_fallback: true,
            active_only: false,
            passive_use_control_host: false,
        }
    }
}

impl FtpClientConfig {
    #[inline]
    pub fn control_mut(&mut self) -> &mut FtpControlConfig {
        &mut self.control
    }

    #[inline]
    pub fn transfer_mut(&mut self) -> &mut FtpTransferConfig {
        &mut self.transfer
    }

    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
    }

    pub fn set_greeting_timeout(&mut self, timeout: Duration) {
        self.greeting_timeout = timeout;
    }

    /// Try active mode when the server rejects PASV.
    pub fn set_active_fallback(&mut self, enable: bool) {
        self.active_fallback = enable;
    }

    /// Never send PASV.
    pub fn set_active_only(&mut self, enable: bool) {
        self.active_only = enable;
    }

    /// Ignore the host part of PASV replies, for servers behind NAT.
    pub fn set_passive_use_control_host(&mut self, enable: bool) {
        self.passive_use_control_host = enable;
    }
}
