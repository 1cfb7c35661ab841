/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use anyhow::anyhow;
use clap::{Arg, ArgMatches, Command};

use ftpc_engine::{FtpCommand, FtpSession};

pub(super) const COMMAND: &str = "mv";

const COMMAND_ARG_FROM: &str = "from";
const COMMAND_ARG_TO: &str = "to";

pub(super) fn command() -> Command {
    Command::new(COMMAND)
        .about("Rename file or directory")
        .arg(
            Arg::new(COMMAND_ARG_FROM)
                .value_name("FROM PATH")
                .required(true)
                .num_args(1),
        )
        .arg(
            Arg::new(COMMAND_ARG_TO)
                .value_name("TO PATH")
                .required(true)
                .num_args(1),
        )
}

pub(super) async fn run(session: &FtpSession, args: &ArgMatches) -> anyhow::Result<()> {
    let from = args
        .get_one::<String>(COMMAND_ARG_FROM)
        .ok_or_else(|| anyhow!("no source path set"))?;
    let to = args
        .get_one::<String>(COMMAND_ARG_TO)
        .ok_or_else(|| anyhow!("no target path set"))?;
    session
        .execute(FtpCommand::Move(from.to_string(), to.to_string()))
        .await?;
    Ok(())
}
