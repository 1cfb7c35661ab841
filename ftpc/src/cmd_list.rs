/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use clap::{Arg, ArgMatches, Command};

use ftpc_engine::{FtpCommand, FtpFileEntryType, FtpListEntry, FtpOutput, FtpSession};

pub(super) const COMMAND: &str = "ls";

const COMMAND_ARG_PATH: &str = "path";

pub(super) fn command() -> Command {
    Command::new(COMMAND).about("List directory").arg(
        Arg::new(COMMAND_ARG_PATH)
            .value_name("DIR PATH")
            .num_args(1),
    )
}

pub(super) fn format_entry(entry: &FtpListEntry) -> String {
    let kind = match entry.entry_type() {
        t if t.is_dir() => 'd',
        FtpFileEntryType::Symlink => 'l',
        FtpFileEntryType::File => '-',
        _ => '?',
    };
    let size = entry.size().map(|s| s.to_string()).unwrap_or_default();
    let mtime = entry
        .mtime()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    match entry.link_target() {
        Some(target) => format!("{kind} {size:>12} {mtime:>16} {} -> {target}", entry.name()),
        None => format!("{kind} {size:>12} {mtime:>16} {}", entry.name()),
    }
}

pub(super) async fn run(session: &FtpSession, args: &ArgMatches) -> anyhow::Result<()> {
    let path = args.get_one::<String>(COMMAND_ARG_PATH).cloned();
    if let FtpOutput::Listing(entries) = session.execute(FtpCommand::List(path)).await? {
        for entry in &entries {
            println!("{}", format_entry(entry));
        }
    }
    Ok(())
}
