/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use clap::{Arg, ArgMatches, Command, value_parser};

use ftpc_engine::{FtpCommand, FtpSession};

pub(super) const COMMAND: &str = "put";

const COMMAND_ARG_FILE: &str = "file";
const COMMAND_ARG_PATH: &str = "path";

pub(super) fn command() -> Command {
    Command::new(COMMAND)
        .about("Upload file")
        .arg(
            Arg::new(COMMAND_ARG_FILE)
                .value_name("LOCAL FILE")
                .value_parser(value_parser!(PathBuf))
                .required(true)
                .num_args(1),
        )
        .arg(
            Arg::new(COMMAND_ARG_PATH)
                .help("remote path, default to the local file name")
                .value_name("FILE PATH")
                .num_args(1),
        )
}

pub(super) async fn upload(
    session: &FtpSession,
    file: &Path,
    path: Option<&str>,
) -> anyhow::Result<usize> {
    let data = tokio::fs::read(file)
        .await
        .map_err(|e| anyhow!("failed to read {}: {e}", file.display()))?;
    let path = match path {
        Some(p) => p.to_string(),
        None => file
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("no valid file name in {}", file.display()))?
            .to_string(),
    };
    let len = data.len();
    session.execute(FtpCommand::Put(path, data)).await?;
    Ok(len)
}

pub(super) async fn run(session: &FtpSession, args: &ArgMatches) -> anyhow::Result<()> {
    let file = args
        .get_one::<PathBuf>(COMMAND_ARG_FILE)
        .ok_or_else(|| anyhow!("no local file set"))?;
    let path = args.get_one::<String>(COMMAND_ARG_PATH).map(|s| s.as_str());
    let len = upload(session, file, path).await?;
    log::info!("uploaded {len} bytes from {}", file.display());
    Ok(())
}
