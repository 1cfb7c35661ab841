/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgMatches, Command};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use ftpc_engine::{FtpCommand, FtpOutput, FtpSession, FtpSessionState};

pub(super) const COMMAND: &str = "shell";

const HELP: &str = "?                     show this help
cd <dir>              change directory
ls [dir]              list directory
get <path> [local]    download file, '-' for stdout
put <local> [path]    upload file
mkdir <dir>           make directory
rmdir <dir>           remove directory
delete <path>         delete file
mv <from> <to>        rename
pwd                   print working directory
quit                  close the session";

pub(super) fn command() -> Command {
    Command::new(COMMAND).about("Read commands from stdin")
}

#[derive(Debug, PartialEq)]
enum ShellAction {
    Help,
    Run(FtpCommand),
    Get(String, Option<PathBuf>),
    Put(PathBuf, Option<String>),
}

/// Split a line into words, double quotes group words with spaces.
fn split_words(line: &str) -> anyhow::Result<Vec<String>> {
    let mut words = Vec::new();
    let mut cur = String::new();
    let mut in_word = false;
    let mut in_quote = false;
    for c in line.chars() {
        match c {
            '"' => {
                in_quote = !in_quote;
                in_word = true;
            }
            c if c.is_whitespace() && !in_quote => {
                if in_word {
                    words.push(std::mem::take(&mut cur));
                    in_word = false;
                }
            }
            c => {
                cur.push(c);
                in_word = true;
            }
        }
    }
    if in_quote {
        return Err(anyhow!("unterminated quote"));
    }
    if in_word {
        words.push(cur);
    }
    Ok(words)
}

fn parse_line(line: &str) -> anyhow::Result<Option<ShellAction>> {
    let words = split_words(line)?;
    let Some((verb, args)) = words.split_first() else {
        return Ok(None);
    };
    let arg = |i: usize| {
        args.get(i)
            .cloned()
            .ok_or_else(|| anyhow!("missing argument for {verb}, try '?'"))
    };

    let action = match verb.to_ascii_lowercase().as_str() {
        "?" | "help" => ShellAction::Help,
        "cd" => ShellAction::Run(FtpCommand::ChangeDirectory(arg(0)?)),
        "ls" | "dir" => ShellAction::Run(FtpCommand::List(args.first().cloned())),
        "get" => ShellAction::Get(arg(0)?, args.get(1).map(PathBuf::from)),
        "put" => ShellAction::Put(PathBuf::from(arg(0)?), args.get(1).cloned()),
        "mkdir" => ShellAction::Run(FtpCommand::Mkdir(arg(0)?)),
        "rmdir" => ShellAction::Run(FtpCommand::Rmdir(arg(0)?)),
        "delete" | "rm" => ShellAction::Run(FtpCommand::Delete(arg(0)?)),
        "mv" => ShellAction::Run(FtpCommand::Move(arg(0)?, arg(1)?)),
        "pwd" => ShellAction::Run(FtpCommand::PrintWorkingDirectory),
        "quit" | "exit" | "bye" => ShellAction::Run(FtpCommand::Quit),
        _ => return Err(anyhow!("unknown command {verb}, try '?'")),
    };
    Ok(Some(action))
}

async fn run_action(session: &FtpSession, action: ShellAction) -> anyhow::Result<()> {
    match action {
        ShellAction::Help => println!("{HELP}"),
        ShellAction::Get(path, output) => {
            let len = super::cmd_get::download(session, &path, output).await?;
            println!("{len} bytes received");
        }
        ShellAction::Put(file, path) => {
            let len = super::cmd_put::upload(session, &file, path.as_deref()).await?;
            println!("{len} bytes sent");
        }
        ShellAction::Run(cmd) => match session.execute(cmd).await? {
            FtpOutput::Text(s) => println!("{s}"),
            FtpOutput::Listing(entries) => {
                for entry in &entries {
                    println!("{}", super::cmd_list::format_entry(entry));
                }
            }
            FtpOutput::Bytes(data) => println!("{} bytes received", data.len()),
            FtpOutput::Ack => {}
        },
    }
    Ok(())
}

pub(super) async fn run(session: &FtpSession, _args: &ArgMatches) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let prompt = format!("ftp:{}> ", session.current_directory());
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse_line(&line) {
            Ok(Some(action)) => {
                if let Err(e) = run_action(session, action).await {
                    eprintln!("error: {e}");
                }
            }
            Ok(None) => {}
            Err(e) => eprintln!("{e}"),
        }

        match session.state() {
            FtpSessionState::Closed => break,
            FtpSessionState::Degraded => {
                return Err(anyhow!("the session is no longer usable"));
            }
            _ => {}
        }
    }
    Ok(())
}
