/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Arg, ArgMatches, Command, value_parser};
use tokio::io::AsyncWriteExt;

use ftpc_engine::{FtpCommand, FtpOutput, FtpSession};

pub(super) const COMMAND: &str = "get";

const COMMAND_ARG_PATH: &str = "path";
const COMMAND_ARG_OUTPUT: &str = "output";

pub(super) fn command() -> Command {
    Command::new(COMMAND)
        .about("Download file")
        .arg(
            Arg::new(COMMAND_ARG_PATH)
                .value_name("FILE PATH")
                .required(true)
                .num_args(1),
        )
        .arg(
            Arg::new(COMMAND_ARG_OUTPUT)
                .help("local file to write, '-' for stdout")
                .value_name("LOCAL FILE")
                .value_parser(value_parser!(PathBuf))
                .num_args(1),
        )
}

pub(super) async fn download(
    session: &FtpSession,
    path: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<usize> {
    let FtpOutput::Bytes(data) = session.execute(FtpCommand::Get(path.to_string())).await? else {
        return Err(anyhow!("unexpected output for get"));
    };

    let output = output.unwrap_or_else(|| {
        PathBuf::from(path.rsplit('/').next().filter(|s| !s.is_empty()).unwrap_or(path))
    });
    if output.as_os_str() == "-" {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(&data).await?;
        stdout.flush().await?;
    } else {
        tokio::fs::write(&output, &data)
            .await
            .map_err(|e| anyhow!("failed to write {}: {e}", output.display()))?;
    }
    Ok(data.len())
}

pub(super) async fn run(session: &FtpSession, args: &ArgMatches) -> anyhow::Result<()> {
    let path = args
        .get_one::<String>(COMMAND_ARG_PATH)
        .ok_or_else(|| anyhow!("no path set"))?;
    let output = args.get_one::<PathBuf>(COMMAND_ARG_OUTPUT).cloned();
    let len = download(session, path, output).await?;
    log::info!("downloaded {len} bytes from {path}");
    Ok(())
}
