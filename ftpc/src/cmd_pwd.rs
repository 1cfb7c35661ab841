/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use clap::{ArgMatches, Command};

use ftpc_engine::{FtpCommand, FtpOutput, FtpSession};

pub(super) const COMMAND: &str = "pwd";

pub(super) fn command() -> Command {
    Command::new(COMMAND).about("Print working directory")
}

pub(super) async fn run(session: &FtpSession, _args: &ArgMatches) -> anyhow::Result<()> {
    if let FtpOutput::Text(path) = session.execute(FtpCommand::PrintWorkingDirectory).await? {
        println!("{path}");
    }
    Ok(())
}
