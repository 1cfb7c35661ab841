/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use anyhow::anyhow;
use clap::{Arg, ArgMatches, Command};

use ftpc_engine::{FtpCommand, FtpSession};

pub(super) const COMMAND: &str = "mkdir";

const COMMAND_ARG_PATH: &str = "path";

pub(super) fn command() -> Command {
    Command::new(COMMAND).about("Make directory").arg(
        Arg::new(COMMAND_ARG_PATH)
            .value_name("DIR PATH")
            .required(true)
            .num_args(1),
    )
}

pub(super) async fn run(session: &FtpSession, args: &ArgMatches) -> anyhow::Result<()> {
    let path = args
        .get_one::<String>(COMMAND_ARG_PATH)
        .ok_or_else(|| anyhow!("no path set"))?;
    session.execute(FtpCommand::Mkdir(path.to_string())).await?;
    Ok(())
}
