/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};

use ftpc_engine::FtpEndpoint;

pub const README: &[u8] = b"hello, world\n";

#[derive(Clone, Default)]
pub struct TestServerOptions {
    pub reject_pasv: bool,
    pub cwd_delay: Option<Duration>,
    /// Close the control connection when this verb is received.
    pub close_on: Option<&'static str>,
    /// Accept connections but never send the 220 greeting.
    pub no_greeting: bool,
}

#[derive(Default)]
struct TestFs {
    dirs: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
}

impl TestFs {
    fn new() -> Self {
        let mut fs = TestFs::default();
        for d in ["/", "/pub", "/pub/incoming", "/slow"] {
            fs.dirs.insert(d.to_string());
        }
        fs.files
            .insert("/pub/readme.txt".to_string(), README.to_vec());
        fs
    }

    fn exists(&self, path: &str) -> bool {
        self.dirs.contains(path) || self.files.contains_key(path)
    }

    fn list(&self, dir: &str) -> Vec<String> {
        let mut lines = vec![format!("total {}", self.dirs.len() + self.files.len())];
        for d in self.dirs.iter().filter(|d| d.as_str() != "/" && parent(d) == dir) {
            lines.push(format!(
                "drwxr-xr-x    2 ftp      ftp          4096 Jun 01 12:00 {}",
                base_name(d)
            ));
        }
        for (f, data) in self.files.iter().filter(|(f, _)| parent(f) == dir) {
            lines.push(format!(
                "-rw-r--r--    1 ftp      ftp      {:>8} Jun 01 12:00 {}",
                data.len(),
                base_name(f)
            ));
        }
        lines
    }
}

fn parent(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) | None => "/",
        Some((p, _)) => p,
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, n)| n).unwrap_or(path)
}

fn server_path(cwd: &str, arg: &str) -> String {
    let joined = if arg.starts_with('/') {
        arg.to_string()
    } else if cwd == "/" {
        format!("/{arg}")
    } else {
        format!("{cwd}/{arg}")
    };
    let trimmed = joined.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// A scripted FTP server on the loopback interface.
pub struct TestServer {
    addr: SocketAddr,
    fs: Arc<Mutex<TestFs>>,
}

impl TestServer {
    pub async fn start(options: TestServerOptions) -> TestServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let fs = Arc::new(Mutex::new(TestFs::new()));

        let server_fs = fs.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let fs = server_fs.clone();
                let options = options.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, fs, options).await;
                });
            }
        });

        TestServer { addr, fs }
    }

    pub fn endpoint(&self) -> FtpEndpoint {
        FtpEndpoint::new(Ipv4Addr::LOCALHOST, self.addr.port())
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.fs.lock().unwrap().files.get(path).cloned()
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.fs.lock().unwrap().dirs.contains(path)
    }
}

async fn reply(w: &mut OwnedWriteHalf, msg: &str) -> io::Result<()> {
    w.write_all(msg.as_bytes()).await?;
    w.write_all(b"\r\n").await
}

enum DataSource {
    None,
    Passive(TcpListener),
    Active(SocketAddr),
}

impl DataSource {
    async fn connect(&mut self) -> io::Result<TcpStream> {
        match std::mem::replace(self, DataSource::None) {
            DataSource::Passive(listener) => listener.accept().await.map(|(s, _)| s),
            DataSource::Active(addr) => TcpStream::connect(addr).await,
            DataSource::None => Err(io::Error::other("no data connection")),
        }
    }
}

fn parse_port_arg(arg: &str) -> Option<SocketAddr> {
    let v: Vec<u8> = arg
        .split(',')
        .map(|s| s.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    if v.len() != 6 {
        return None;
    }
    let ip = Ipv4Addr::new(v[0], v[1], v[2], v[3]);
    let port = ((v[4] as u16) << 8) | v[5] as u16;
    Some(SocketAddr::V4(SocketAddrV4::new(ip, port)))
}

async fn serve(
    stream: TcpStream,
    fs: Arc<Mutex<TestFs>>,
    options: TestServerOptions,
) -> io::Result<()> {
    if options.no_greeting {
        tokio::time::sleep(Duration::from_secs(30)).await;
        return Ok(());
    }

    let (r, mut w) = stream.into_split();
    let mut r = BufReader::new(r);
    w.write_all(b"220-Welcome to the test server\r\n220 ready\r\n")
        .await?;

    let mut user: Option<String> = None;
    let mut logged_in = false;
    let mut cwd = "/".to_string();
    let mut data = DataSource::None;
    let mut rename_from: Option<String> = None;

    let mut line = String::new();
    loop {
        line.clear();
        if r.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        let cmd = line.trim_end_matches(['\r', '\n']);
        let (verb, arg) = cmd.split_once(' ').unwrap_or((cmd, ""));
        let verb = verb.to_ascii_uppercase();
        if options.close_on == Some(verb.as_str()) {
            return Ok(());
        }

        match verb.as_str() {
            "USER" => {
                user = Some(arg.to_string());
                logged_in = false;
                reply(&mut w, "331 Please specify the password.").await?;
                continue;
            }
            "PASS" => {
                logged_in = match user.as_deref() {
                    Some("anonymous") => true,
                    Some("alice") => arg == "secret",
                    _ => false,
                };
                if logged_in {
                    reply(&mut w, "230 Login successful.").await?;
                } else {
                    reply(&mut w, "530 Login incorrect.").await?;
                }
                continue;
            }
            "QUIT" => {
                reply(&mut w, "221 Goodbye.").await?;
                return Ok(());
            }
            _ if !logged_in => {
                reply(&mut w, "530 Please login with USER and PASS.").await?;
                continue;
            }
            _ => {}
        }

        match verb.as_str() {
            "PWD" => {
                reply(&mut w, &format!("257 \"{cwd}\" is the current directory")).await?;
            }
            "CWD" => {
                if let Some(delay) = options.cwd_delay {
                    tokio::time::sleep(delay).await;
                }
                let path = server_path(&cwd, arg);
                if fs.lock().unwrap().dirs.contains(&path) {
                    cwd = path;
                    reply(&mut w, "250 Directory successfully changed.").await?;
                } else {
                    reply(&mut w, "550 Failed to change directory.").await?;
                }
            }
            "TYPE" => reply(&mut w, "200 Switching mode.").await?,
            "PASV" => {
                if options.reject_pasv {
                    reply(&mut w, "502 PASV not implemented.").await?;
                    continue;
                }
                let listener = TcpListener::bind("127.0.0.1:0").await?;
                let port = listener.local_addr()?.port();
                data = DataSource::Passive(listener);
                let msg = format!(
                    "227 Entering Passive Mode (127,0,0,1,{},{}).",
                    port >> 8,
                    port & 0xFF
                );
                reply(&mut w, &msg).await?;
            }
            "PORT" => match parse_port_arg(arg) {
                Some(addr) => {
                    data = DataSource::Active(addr);
                    reply(&mut w, "200 PORT command successful.").await?;
                }
                None => reply(&mut w, "501 Illegal PORT command.").await?,
            },
            "LIST" => {
                let path = if arg.is_empty() {
                    cwd.clone()
                } else {
                    server_path(&cwd, arg)
                };
                let lines = {
                    let fs = fs.lock().unwrap();
                    if fs.dirs.contains(&path) {
                        Some(fs.list(&path))
                    } else {
                        None
                    }
                };
                let Some(lines) = lines else {
                    reply(&mut w, "550 No such file or directory.").await?;
                    continue;
                };
                let Ok(mut conn) = data.connect().await else {
                    reply(&mut w, "425 Use PORT or PASV first.").await?;
                    continue;
                };
                reply(&mut w, "150 Here comes the directory listing.").await?;
                for l in lines {
                    conn.write_all(l.as_bytes()).await?;
                    conn.write_all(b"\r\n").await?;
                }
                conn.shutdown().await?;
                drop(conn);
                reply(&mut w, "226 Directory send OK.").await?;
            }
            "RETR" => {
                let path = server_path(&cwd, arg);
                let content = fs.lock().unwrap().files.get(&path).cloned();
                let Some(content) = content else {
                    reply(&mut w, "550 No such file or directory.").await?;
                    continue;
                };
                let Ok(mut conn) = data.connect().await else {
                    reply(&mut w, "425 Use PORT or PASV first.").await?;
                    continue;
                };
                reply(&mut w, "150 Opening BINARY mode data connection.").await?;
                conn.write_all(&content).await?;
                conn.shutdown().await?;
                drop(conn);
                reply(&mut w, "226 Transfer complete.").await?;
            }
            "STOR" => {
                let path = server_path(&cwd, arg);
                if !fs.lock().unwrap().dirs.contains(parent(&path)) {
                    reply(&mut w, "553 Could not create file.").await?;
                    continue;
                }
                let Ok(mut conn) = data.connect().await else {
                    reply(&mut w, "425 Use PORT or PASV first.").await?;
                    continue;
                };
                reply(&mut w, "150 Ok to send data.").await?;
                let mut content = Vec::new();
                conn.read_to_end(&mut content).await?;
                fs.lock().unwrap().files.insert(path, content);
                reply(&mut w, "226 Transfer complete.").await?;
            }
            "MKD" => {
                let path = server_path(&cwd, arg);
                let msg = {
                    let mut fs = fs.lock().unwrap();
                    if fs.exists(&path) {
                        "550 Directory already exists.".to_string()
                    } else if !fs.dirs.contains(parent(&path)) {
                        "550 No such file or directory.".to_string()
                    } else {
                        fs.dirs.insert(path.clone());
                        format!("257 \"{path}\" created")
                    }
                };
                reply(&mut w, &msg).await?;
            }
            "RMD" => {
                let path = server_path(&cwd, arg);
                let removed = fs.lock().unwrap().dirs.remove(&path);
                if removed {
                    reply(&mut w, "250 Remove directory operation successful.").await?;
                } else {
                    reply(&mut w, "550 No such file or directory.").await?;
                }
            }
            "DELE" => {
                let path = server_path(&cwd, arg);
                let removed = fs.lock().unwrap().files.remove(&path).is_some();
                if removed {
                    reply(&mut w, "250 Delete operation successful.").await?;
                } else {
                    reply(&mut w, "550 No such file or directory.").await?;
                }
            }
            "RNFR" => {
                let path = server_path(&cwd, arg);
                if fs.lock().unwrap().exists(&path) {
                    rename_from = Some(path);
                    reply(&mut w, "350 Ready for RNTO.").await?;
                } else {
                    reply(&mut w, "550 No such file or directory.").await?;
                }
            }
            "RNTO" => {
                let Some(from) = rename_from.take() else {
                    reply(&mut w, "503 RNFR required first.").await?;
                    continue;
                };
                let to = server_path(&cwd, arg);
                if to.contains("forbidden") {
                    reply(&mut w, "553 Rename not allowed.").await?;
                    continue;
                }
                {
                    let mut fs = fs.lock().unwrap();
                    if let Some(content) = fs.files.remove(&from) {
                        fs.files.insert(to, content);
                    } else if fs.dirs.remove(&from) {
                        fs.dirs.insert(to);
                    }
                }
                reply(&mut w, "250 Rename successful.").await?;
            }
            _ => reply(&mut w, "502 Command not implemented.").await?,
        }
    }
}
