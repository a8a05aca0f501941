use crate::core_vfs::VfsError;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::warn;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Replies with the 550 matching a storage failure and reports it.
pub async fn reply_vfs_error(
    writer: &ControlWriter,
    session: &Session,
    command: &str,
    error: &VfsError,
) -> Result<(), std::io::Error> {
    warn!("{} failed: {}", command, error);
    session.status.emit(format!("{} failed: {}", command, error));
    send_response(writer, error.to_ftp_response().as_bytes()).await
}

/// Gets the data connection of a transfer command.
///
/// Replies 425 and returns `None` when no listener can be set up or no
/// client connects to it; otherwise sends the 150 preliminary reply first.
pub async fn open_data_connection(
    writer: &ControlWriter,
    session: &mut Session,
    opening: &str,
) -> Result<Option<TcpStream>, std::io::Error> {
    if let Err(e) = session.data_channel.prepare().await {
        session.status.emit(format!("Data channel unavailable: {}", e));
        send_response(writer, e.to_ftp_response().as_bytes()).await?;
        return Ok(None);
    }

    send_response(writer, format!("150 {}\r\n", opening).as_bytes()).await?;

    match session.data_channel.accept().await {
        Ok(stream) => Ok(Some(stream)),
        Err(e) => {
            session.status.emit(format!("Data connection failed: {}", e));
            send_response(writer, e.to_ftp_response().as_bytes()).await?;
            Ok(None)
        }
    }
}

/// Reports the outcome of a transfer on the control connection.
pub async fn finish_transfer(
    writer: &ControlWriter,
    session: &Session,
    outcome: Result<u64, std::io::Error>,
    success: &str,
) -> Result<(), std::io::Error> {
    match outcome {
        Ok(_) => send_response(writer, format!("226 {}\r\n", success).as_bytes()).await,
        Err(e) => {
            warn!("Transfer aborted: {}", e);
            session.status.emit(format!("Transfer aborted: {}", e));
            send_response(writer, b"426 Connection closed; transfer aborted.\r\n").await
        }
    }
}

/// Copies `reader` into `writer` in chunks of `chunk_size` bytes, then shuts
/// the writer down so buffered bytes reach their destination.
pub async fn copy_chunked<R, W>(
    reader: &mut R,
    writer: &mut W,
    chunk_size: usize,
) -> Result<u64, std::io::Error>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buffer = vec![0; chunk_size.max(1)];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        writer.write_all(&buffer[..n]).await?;
        total += n as u64;
    }
    writer.shutdown().await?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_copy_chunked_handles_partial_chunks() {
        let payload: Vec<u8> = (0..1000u32).map(|i| (i % 256) as u8).collect();
        let mut reader = Cursor::new(payload.clone());
        let mut output: Vec<u8> = Vec::new();

        let copied = copy_chunked(&mut reader, &mut output, 64).await.unwrap();
        assert_eq!(copied, 1000);
        assert_eq!(output, payload);
    }

    #[tokio::test]
    async fn test_copy_chunked_empty_input() {
        let mut reader = Cursor::new(Vec::<u8>::new());
        let mut output: Vec<u8> = Vec::new();
        assert_eq!(copy_chunked(&mut reader, &mut output, 8).await.unwrap(), 0);
        assert!(output.is_empty());
    }
}
