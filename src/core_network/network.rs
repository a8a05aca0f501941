use crate::constants::{GREETING, MAX_COMMAND_LENGTH};
use crate::core_ftpcommand::ftpcommand::{parse_command_line, FtpCommand};
use crate::core_ftpcommand::handlers::CommandHandlers;
use crate::core_log::StatusSink;
use crate::core_network::DataChannelManager;
use crate::core_vfs::StorageFactory;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use anyhow::Result;
use log::{debug, error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Pause after a failed accept so a persistent error (EMFILE) does not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Everything a control connection needs from the running server.
pub struct ServerContext {
    pub config: Arc<Config>,
    pub storage: StorageFactory,
    pub data_channels: DataChannelManager,
    pub handlers: CommandHandlers,
    pub status: StatusSink,
    pub shutdown: CancellationToken,
}

/// Accepts control connections until `shutdown` fires, one task per client.
pub async fn accept_loop(listener: TcpListener, ctx: Arc<ServerContext>) {
    loop {
        tokio::select! {
            _ = ctx.shutdown.cancelled() => {
                info!("Accept loop stopped");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((socket, addr)) => {
                    ctx.status.emit(format!("Client connected: {}", addr));
                    let ctx = Arc::clone(&ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(socket, addr, Arc::clone(&ctx)).await {
                            ctx.status.emit(format!("Connection error with {}: {}", addr, e));
                        }
                        ctx.status.emit(format!("Client disconnected: {}", addr));
                    });
                }
                Err(e) => handle_accept_error(&ctx.status, &e).await,
            }
        }
    }
}

async fn handle_accept_error(status: &StatusSink, e: &std::io::Error) {
    error!("Failed to accept connection: {}", e);
    status.emit(format!("Failed to accept connection: {}", e));
    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
}

pub async fn handle_connection(
    socket: TcpStream,
    peer_addr: SocketAddr,
    ctx: Arc<ServerContext>,
) -> Result<()> {
    let local_addr = socket.local_addr()?;
    let (read_half, write_half) = socket.into_split();
    let writer: ControlWriter = Arc::new(Mutex::new(write_half));

    let session = Arc::new(Mutex::new(Session::new(
        ctx.storage.open(),
        ctx.data_channels.session_handle(),
        peer_addr,
        local_addr,
        ctx.status.clone(),
    )));

    let result = command_loop(read_half, &writer, &session, &ctx).await;

    session.lock().await.data_channel.close().await;
    debug!("Session for {} cleaned up", peer_addr);
    result
}

async fn command_loop(
    read_half: tokio::net::tcp::OwnedReadHalf,
    writer: &ControlWriter,
    session: &Arc<Mutex<Session>>,
    ctx: &Arc<ServerContext>,
) -> Result<()> {
    send_response(writer, GREETING).await?;

    let mut reader = BufReader::new(read_half);
    let mut buffer = Vec::new();

    loop {
        let read = tokio::select! {
            _ = ctx.shutdown.cancelled() => {
                debug!("Server stopping, closing control connection");
                break;
            }
            read = read_command_line(&mut reader, &mut buffer) => read?,
        };
        match read {
            CommandLine::Closed => {
                debug!("Client closed the control connection");
                break;
            }
            CommandLine::TooLong => {
                send_response(writer, b"500 Command line too long.\r\n").await?;
                continue;
            }
            CommandLine::Complete => {}
        }

        let line = String::from_utf8_lossy(&buffer);
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }

        let (cmd, arg) = parse_command_line(line);
        ctx.status.emit(format!("Command: {} {}", cmd, arg).trim_end().to_string());

        let Some(command) = FtpCommand::from_str(&cmd) else {
            send_response(writer, format!("500 Unknown command: {}\r\n", cmd).as_bytes()).await?;
            continue;
        };

        let Some(handler) = ctx.handlers.get(&command) else {
            send_response(writer, b"502 Command not implemented.\r\n").await?;
            continue;
        };

        handler(
            Arc::clone(writer),
            Arc::clone(&ctx.config),
            Arc::clone(session),
            arg,
        )
        .await?;

        if command == FtpCommand::QUIT {
            break;
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum CommandLine {
    Complete,
    TooLong,
    Closed,
}

/// Reads one control line into `buffer`, buffering at most
/// `MAX_COMMAND_LENGTH` bytes plus the line terminator.
///
/// The rest of an oversized line is skipped so the next command starts clean.
async fn read_command_line<R>(reader: &mut R, buffer: &mut Vec<u8>) -> std::io::Result<CommandLine>
where
    R: AsyncBufRead + Unpin,
{
    buffer.clear();
    let limit = (MAX_COMMAND_LENGTH + 2) as u64;
    let n = (&mut *reader).take(limit).read_until(b'\n', buffer).await?;
    if n == 0 {
        return Ok(CommandLine::Closed);
    }
    if n as u64 == limit && buffer.last() != Some(&b'\n') {
        skip_line(reader).await?;
        return Ok(CommandLine::TooLong);
    }

    let content = buffer
        .iter()
        .rposition(|&b| b != b'\r' && b != b'\n')
        .map_or(0, |last| last + 1);
    if content > MAX_COMMAND_LENGTH {
        Ok(CommandLine::TooLong)
    } else {
        Ok(CommandLine::Complete)
    }
}

async fn skip_line<R>(reader: &mut R) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let chunk = reader.fill_buf().await?;
        if chunk.is_empty() {
            return Ok(());
        }
        match chunk.iter().position(|&b| b == b'\n') {
            Some(end) => {
                reader.consume(end + 1);
                return Ok(());
            }
            None => {
                let len = chunk.len();
                reader.consume(len);
            }
        }
    }
}
