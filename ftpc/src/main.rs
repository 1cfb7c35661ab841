/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use clap_complete::Shell;
use yaml_rust::YamlLoader;

use ftpc_engine::{
    FtpClientConfig, FtpCredentials, FtpEndpoint, FtpSession, TcpConnectionProvider,
    validate_credentials,
};

mod logger;

mod cmd_del;
mod cmd_get;
mod cmd_list;
mod cmd_mkd;
mod cmd_mv;
mod cmd_put;
mod cmd_pwd;
mod cmd_rmd;
mod cmd_shell;

const GLOBAL_ARG_COMPLETION: &str = "completion";
const GLOBAL_ARG_SERVER: &str = "server";
const GLOBAL_ARG_USERNAME: &str = "username";
const GLOBAL_ARG_PASSWORD: &str = "password";
const GLOBAL_ARG_SOURCE_IP: &str = "source-ip";
const GLOBAL_ARG_CONFIG: &str = "config";
const GLOBAL_ARG_ACTIVE_ONLY: &str = "active-only";
const GLOBAL_ARG_VERBOSE: &str = "verbose";

fn build_cli_args() -> Command {
    Command::new("ftpc")
        .arg(
            Arg::new(GLOBAL_ARG_COMPLETION)
                .num_args(1)
                .value_name("SHELL")
                .long("completion")
                .value_parser(value_parser!(Shell))
                .exclusive(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_SERVER)
                .help("FTP server address, in IPv4[:PORT] form")
                .num_args(1)
                .value_name("SERVER ADDRESS")
                .required_unless_present(GLOBAL_ARG_COMPLETION),
        )
        .arg(
            Arg::new(GLOBAL_ARG_USERNAME)
                .help("FTP username, anonymous login if not set")
                .num_args(1)
                .value_name("USERNAME")
                .short('u')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_PASSWORD)
                .help("FTP password")
                .num_args(1)
                .value_name("PASSWORD")
                .short('p')
                .requires(GLOBAL_ARG_USERNAME)
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_SOURCE_IP)
                .help("source ip address")
                .num_args(1)
                .value_name("IP ADDRESS")
                .value_parser(value_parser!(IpAddr))
                .long("source")
                .short('s')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_CONFIG)
                .help("client config file in yaml format")
                .num_args(1)
                .value_name("CONFIG FILE")
                .value_parser(value_parser!(PathBuf))
                .long("config")
                .short('c')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_ACTIVE_ONLY)
                .help("use active mode for all data transfers")
                .num_args(0)
                .action(ArgAction::SetTrue)
                .long("active-only")
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_VERBOSE)
                .help("show verbose message")
                .num_args(0)
                .action(ArgAction::Count)
                .short('v')
                .global(true),
        )
        .subcommand(cmd_list::command())
        .subcommand(cmd_get::command())
        .subcommand(cmd_put::command())
        .subcommand(cmd_mkd::command())
        .subcommand(cmd_rmd::command())
        .subcommand(cmd_del::command())
        .subcommand(cmd_mv::command())
        .subcommand(cmd_pwd::command())
        .subcommand(cmd_shell::command())
}

fn load_config(path: &Path) -> anyhow::Result<FtpClientConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read in file {}: {e}", path.display()))?;
    let docs = YamlLoader::load_from_str(&contents)
        .map_err(|e| anyhow!("invalid yaml file {}: {e}", path.display()))?;
    match docs.first() {
        Some(doc) => FtpClientConfig::parse_yaml(doc)
            .context(format!("invalid ftp client config in file {}", path.display())),
        None => Ok(FtpClientConfig::default()),
    }
}

fn credentials(args: &ArgMatches) -> anyhow::Result<FtpCredentials> {
    match args.get_one::<String>(GLOBAL_ARG_USERNAME) {
        Some(username) => {
            let password = args
                .get_one::<String>(GLOBAL_ARG_PASSWORD)
                .map(|s| s.as_str())
                .unwrap_or_default();
            validate_credentials(username, password).context("invalid credentials")
        }
        None => Ok(FtpCredentials::anonymous()),
    }
}

async fn run_subcommand(
    session: &FtpSession,
    subcommand: &str,
    args: &ArgMatches,
) -> anyhow::Result<()> {
    match subcommand {
        cmd_list::COMMAND => cmd_list::run(session, args).await,
        cmd_get::COMMAND => cmd_get::run(session, args).await,
        cmd_put::COMMAND => cmd_put::run(session, args).await,
        cmd_mkd::COMMAND => cmd_mkd::run(session, args).await,
        cmd_rmd::COMMAND => cmd_rmd::run(session, args).await,
        cmd_del::COMMAND => cmd_del::run(session, args).await,
        cmd_mv::COMMAND => cmd_mv::run(session, args).await,
        cmd_pwd::COMMAND => cmd_pwd::run(session, args).await,
        cmd_shell::COMMAND => cmd_shell::run(session, args).await,
        cmd => Err(anyhow!("invalid subcommand {cmd}")),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = build_cli_args().get_matches();

    if let Some(target) = args.get_one::<Shell>(GLOBAL_ARG_COMPLETION) {
        let mut app = build_cli_args();
        let bin_name = app.get_name().to_string();
        clap_complete::generate(*target, &mut app, bin_name, &mut io::stdout());
        return Ok(());
    }

    let verbose_level = args
        .get_one::<u8>(GLOBAL_ARG_VERBOSE)
        .copied()
        .unwrap_or_default();
    logger::SyncLogger::new(verbose_level)
        .into_global_logger()
        .map_err(|e| anyhow!("failed to set logger: {e}"))?;

    let server = args
        .get_one::<String>(GLOBAL_ARG_SERVER)
        .ok_or_else(|| anyhow!("no server address set"))?;
    let endpoint = FtpEndpoint::from_str(server).context("invalid server address")?;
    let credentials = credentials(&args)?;

    let mut config = match args.get_one::<PathBuf>(GLOBAL_ARG_CONFIG) {
        Some(path) => load_config(path)?,
        None => FtpClientConfig::default(),
    };
    if args.get_flag(GLOBAL_ARG_ACTIVE_ONLY) {
        config.set_active_only(true);
    }

    let mut conn_provider = TcpConnectionProvider::default();
    if let Some(ip) = args.get_one::<IpAddr>(GLOBAL_ARG_SOURCE_IP) {
        conn_provider.set_bind_ip(*ip);
    }

    let Some((subcommand, sub_args)) = args.subcommand() else {
        return Err(anyhow!("no subcommand found"));
    };

    let session = FtpSession::connect(endpoint, conn_provider, Arc::new(config)).await?;
    session.authenticate(&credentials).await?;

    let ret = run_subcommand(&session, subcommand, sub_args).await;

    session.disconnect().await?;

    ret
}
