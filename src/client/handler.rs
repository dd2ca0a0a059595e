use log::{error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

use crate::client::{Client, ClientRegistry};
use crate::config::ServeContext;
use crate::protocol::responses::{self, format_response};
use crate::protocol::{CommandData, CommandResult, CommandStatus, handle_command, parse_command};

/// Handles a client session using Tokio async runtime.
///
/// - Uses BufReader to read request lines from the client.
/// - Dispatches commands using `handle_command` on the blocking pool, since
///   tree builds and deletes walk the filesystem synchronously.
/// - Removes the client from `clients` when the session ends.
pub async fn handle_client(
    stream: TcpStream,
    client_addr: SocketAddr,
    clients: Arc<Mutex<ClientRegistry>>,
    ctx: Arc<ServeContext>,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut client = Client::default();

    loop {
        match read_request(&mut reader, ctx.max_command_length).await {
            Ok(Request::Closed) => {
                // Client closed the connection
                info!("Connection closed by client {}", client_addr);
                break;
            }
            Ok(Request::TooLong) => {
                warn!("Discarded oversized command from {}", client_addr);
                let reply = format_response(responses::SYNTAX_ERROR, "Command too long");
                if write_half.write_all(reply.as_bytes()).await.is_err() {
                    break;
                }
            }
            Ok(Request::NotUtf8) => {
                let reply = format_response(responses::ARGUMENT_ERROR, "Command is not valid UTF-8");
                if write_half.write_all(reply.as_bytes()).await.is_err() {
                    break;
                }
            }
            Ok(Request::Line(line)) => {
                let command = parse_command(&line);
                info!("Received from {}: {:?}", client_addr, &command);

                let task_ctx = Arc::clone(&ctx);
                let outcome = tokio::task::spawn_blocking(move || {
                    let result = handle_command(&mut client, &command, &task_ctx);
                    (client, result)
                })
                .await;

                let result = match outcome {
                    Ok((returned, result)) => {
                        client = returned;
                        result
                    }
                    Err(e) => {
                        error!("Command task for {} failed: {}", client_addr, e);
                        let reply = format_response(responses::LOCAL_ERROR, "Internal server error");
                        let _ = write_half.write_all(reply.as_bytes()).await;
                        break;
                    }
                };

                match send_result(&mut write_half, result).await {
                    Ok(true) => {
                        info!("Client {} requested to quit", client_addr);
                        break;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Failed to reply to {}: {}", client_addr, e);
                        break;
                    }
                }
            }
            Err(e) => {
                error!("Failed to read from {}: {}", client_addr, e);
                break;
            }
        }
    }

    let mut clients_guard = clients.lock().await;
    clients_guard.remove(&client_addr);
    info!(
        "Client {} disconnected ({} remaining)",
        client_addr,
        clients_guard.len()
    );
}

/// One request line read from a client.
#[derive(Debug, PartialEq)]
enum Request {
    Line(String),
    TooLong,
    NotUtf8,
    Closed,
}

/// Reads one line of at most `max_len` bytes, newline included.
///
/// Never buffers more than `max_len + 1` bytes of a line: the rest of an
/// oversized line is read and dropped in small chunks.
async fn read_request<R>(reader: &mut R, max_len: usize) -> io::Result<Request>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = (&mut *reader)
        .take(max_len as u64 + 1)
        .read_until(b'\n', &mut buf)
        .await?;

    if n == 0 {
        return Ok(Request::Closed);
    }

    if buf.len() > max_len {
        if buf.last() != Some(&b'\n') {
            discard_rest_of_line(reader).await?;
        }
        return Ok(Request::TooLong);
    }

    Ok(String::from_utf8(buf).map_or(Request::NotUtf8, Request::Line))
}

async fn discard_rest_of_line<R>(reader: &mut R) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut scratch = Vec::new();
    loop {
        scratch.clear();
        let n = (&mut *reader).take(4096).read_until(b'\n', &mut scratch).await?;
        if n == 0 || scratch.last() == Some(&b'\n') {
            return Ok(());
        }
    }
}

/// Writes a command result to the client. Returns `true` when the
/// connection should be closed.
async fn send_result(writer: &mut OwnedWriteHalf, result: CommandResult) -> io::Result<bool> {
    if let Some(msg) = &result.message {
        writer.write_all(msg.as_bytes()).await?;
    }

    if let Some(CommandData::File { path, trailer }) = result.data {
        match tokio::fs::File::open(&path).await {
            Ok(mut file) => {
                let sent = tokio::io::copy(&mut file, writer).await?;
                info!("Sent {} bytes from {}", sent, path.display());
                writer.write_all(trailer.as_bytes()).await?;
            }
            Err(e) => {
                error!("Failed to open {}: {}", path.display(), e);
                let reply = format_response(
                    responses::LOCAL_ERROR,
                    &format!("Failed to read {}: {}", path.display(), e),
                );
                writer.write_all(reply.as_bytes()).await?;
            }
        }
    }

    writer.flush().await?;
    Ok(result.status == CommandStatus::CloseConnection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_request_lines() {
        let mut reader: &[u8] = b"TREE\r\nLIST docs\n";
        assert_eq!(
            read_request(&mut reader, 64).await.unwrap(),
            Request::Line("TREE\r\n".into())
        );
        assert_eq!(
            read_request(&mut reader, 64).await.unwrap(),
            Request::Line("LIST docs\n".into())
        );
        assert_eq!(read_request(&mut reader, 64).await.unwrap(), Request::Closed);
    }

    #[tokio::test]
    async fn test_oversized_line_is_dropped_and_stream_resyncs() {
        let mut input = vec![b'x'; 10_000];
        input.extend_from_slice(b"\r\nNOOP\r\n");
        let mut reader: &[u8] = &input;

        assert_eq!(read_request(&mut reader, 16).await.unwrap(), Request::TooLong);
        assert_eq!(
            read_request(&mut reader, 16).await.unwrap(),
            Request::Line("NOOP\r\n".into())
        );
    }

    #[tokio::test]
    async fn test_unterminated_oversized_input() {
        let input = vec![b'y'; 5_000];
        let mut reader: &[u8] = &input;

        assert_eq!(read_request(&mut reader, 16).await.unwrap(), Request::TooLong);
        assert_eq!(read_request(&mut reader, 16).await.unwrap(), Request::Closed);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line() {
        let mut reader: &[u8] = b"LIST \xff\n";
        assert_eq!(read_request(&mut reader, 64).await.unwrap(), Request::NotUtf8);
    }
}
