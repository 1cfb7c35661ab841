/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use log::Level;

pub const FTP_DEBUG_LOG_LEVEL: Level = Level::Debug;
pub const FTP_DEBUG_LOG_TARGET: &str = "ftpc";

#[macro_export]
macro_rules! log_msg {
    ($($arg:tt)+) => (
        log::log!(target: $crate::FTP_DEBUG_LOG_TARGET, $crate::FTP_DEBUG_LOG_LEVEL, $($arg)+)
    )
}

#[cfg(feature = "log-raw-io")]
fn mask_secret(cmd: &str) -> &str {
    match cmd.get(..5) {
        Some(verb) if verb.eq_ignore_ascii_case("PASS ") => "PASS ****",
        _ => cmd,
    }
}

#[cfg(feature = "log-raw-io")]
#[inline]
pub(crate) fn log_cmd(cmd: &str) {
    log::log!(
        target: FTP_DEBUG_LOG_TARGET,
        FTP_DEBUG_LOG_LEVEL,
        "> {}",
        mask_secret(cmd)
    );
}

#[cfg(feature = "log-raw-io")]
#[inline]
pub(crate) fn log_rsp(rsp: &str) {
    log::log!(
        target: FTP_DEBUG_LOG_TARGET,
        FTP_DEBUG_LOG_LEVEL,
        "< {}",
        rsp
    );
}

#[cfg(all(test, feature = "log-raw-io"))]
mod tests {
    use super::*;

    #[test]
    fn mask_password() {
        assert_eq!(mask_secret("PASS hunter2"), "PASS ****");
        assert_eq!(mask_secret("pass hunter2"), "PASS ****");
        assert_eq!(mask_secret("USER alice"), "USER alice");
        assert_eq!(mask_secret("PWD"), "PWD");
    }
}
