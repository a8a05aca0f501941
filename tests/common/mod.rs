#![allow(dead_code)]

use pocketftpd::config::{DataPortMode, StorageKind};
use pocketftpd::{status_channel, Config, FtpServer, StatusReceiver};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TestServer {
    pub server: FtpServer,
    pub addr: SocketAddr,
    pub status: StatusReceiver,
    pub root: TempDir,
}

pub fn test_config(root: &TempDir, storage: StorageKind, mode: DataPortMode) -> Config {
    let mut config = Config::default();
    config.server.listen_address = IpAddr::V4(Ipv4Addr::LOCALHOST);
    config.server.listen_port = 0;
    config.server.data_port_mode = mode;
    config.server.root_dir = root.path().join("share");
    config.server.storage = storage;
    config.server.transfer_buffer_size = 1024;
    config
}

pub async fn start_server(storage: StorageKind, mode: DataPortMode) -> TestServer {
    let root = TempDir::new().expect("Failed to create temp directory");
    let (status, rx) = status_channel();
    let server = FtpServer::new(test_config(&root, storage, mode), status);
    let addr = server.start().await.expect("server should start");
    TestServer {
        server,
        addr,
        status: rx,
        root,
    }
}

/// Waits until a status message containing `needle` shows up.
pub async fn expect_status(status: &mut StatusReceiver, needle: &str) -> String {
    tokio::time::timeout(REPLY_TIMEOUT, async {
        loop {
            let message = status.recv().await.expect("status channel closed");
            if message.contains(needle) {
                return message;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("no status message containing {:?}", needle))
}

pub fn parse_pasv(reply: &str) -> SocketAddr {
    let start = reply.find('(').expect("227 reply without address");
    let end = reply.find(')').expect("227 reply without address");
    let numbers: Vec<u16> = reply[start + 1..end]
        .split(',')
        .map(|n| n.trim().parse().unwrap())
        .collect();
    assert_eq!(numbers.len(), 6, "bad 227 reply: {}", reply);
    let ip = Ipv4Addr::new(
        numbers[0] as u8,
        numbers[1] as u8,
        numbers[2] as u8,
        numbers[3] as u8,
    );
    SocketAddr::new(IpAddr::V4(ip), numbers[4] * 256 + numbers[5])
}

/// Minimal passive-mode FTP client for driving the server in tests.
pub struct FtpClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl FtpClient {
    /// Connects and consumes the greeting.
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, write_half) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        };
        let greeting = client.read_reply().await;
        assert!(greeting.starts_with("220 "), "unexpected greeting: {}", greeting);
        client
    }

    pub async fn login(addr: SocketAddr) -> Self {
        let mut client = Self::connect(addr).await;
        assert!(client.cmd("USER anonymous").await.starts_with("331"));
        assert!(client.cmd("PASS guest").await.starts_with("230"));
        client
    }

    async fn read_line(&mut self) -> String {
        let mut line = String::new();
        let n = tokio::time::timeout(REPLY_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for a reply")
            .unwrap();
        assert!(n > 0, "control connection closed");
        line
    }

    /// Drains the control connection until the server closes it.
    pub async fn wait_closed(&mut self) -> bool {
        let drained = tokio::time::timeout(REPLY_TIMEOUT, async {
            let mut line = String::new();
            loop {
                line.clear();
                match self.reader.read_line(&mut line).await {
                    Ok(0) | Err(_) => return,
                    Ok(_) => continue,
                }
            }
        })
        .await;
        drained.is_ok()
    }

    /// Reads one reply, following `xyz-` continuation lines up to `xyz `.
    pub async fn read_reply(&mut self) -> String {
        let mut reply = self.read_line().await;
        if reply.len() >= 4 && reply.as_bytes()[3] == b'-' {
            let terminator = format!("{} ", &reply[..3]);
            loop {
                let line = self.read_line().await;
                reply.push_str(&line);
                if line.starts_with(&terminator) {
                    break;
                }
            }
        }
        reply
    }

    pub async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
            .unwrap();
    }

    pub async fn cmd(&mut self, line: &str) -> String {
        self.send(line).await;
        self.read_reply().await
    }

    pub async fn pasv(&mut self) -> SocketAddr {
        let reply = self.cmd("PASV").await;
        assert!(reply.starts_with("227 "), "PASV failed: {}", reply);
        parse_pasv(&reply)
    }

    async fn data_connection(&mut self) -> TcpStream {
        let data_addr = self.pasv().await;
        TcpStream::connect(data_addr).await.unwrap()
    }

    pub async fn retr(&mut self, name: &str) -> Vec<u8> {
        let mut data = self.data_connection().await;
        let reply = self.cmd(&format!("RETR {}", name)).await;
        assert!(reply.starts_with("150 "), "RETR refused: {}", reply);

        let mut content = Vec::new();
        data.read_to_end(&mut content).await.unwrap();
        let reply = self.read_reply().await;
        assert!(reply.starts_with("226 "), "RETR failed: {}", reply);
        content
    }

    pub async fn stor(&mut self, name: &str, content: &[u8]) {
        let mut data = self.data_connection().await;
        let reply = self.cmd(&format!("STOR {}", name)).await;
        assert!(reply.starts_with("150 "), "STOR refused: {}", reply);

        data.write_all(content).await.unwrap();
        data.shutdown().await.unwrap();
        drop(data);
        let reply = self.read_reply().await;
        assert!(reply.starts_with("226 "), "STOR failed: {}", reply);
    }

    /// Runs LIST and returns the non-empty listing lines.
    pub async fn list(&mut self) -> Vec<String> {
        let mut data = self.data_connection().await;
        let reply = self.cmd("LIST").await;
        assert!(reply.starts_with("150 "), "LIST refused: {}", reply);

        let mut listing = String::new();
        data.read_to_string(&mut listing).await.unwrap();
        let reply = self.read_reply().await;
        assert!(reply.starts_with("226 "), "LIST failed: {}", reply);
        listing
            .split("\r\n")
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub async fn list_names(&mut self) -> Vec<String> {
        self.list()
            .await
            .iter()
            .filter_map(|line| line.split_whitespace().last().map(str::to_string))
            .collect()
    }
}
