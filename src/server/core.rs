use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::client::{ClientRegistry, handle_client};
use crate::config::{ServeContext, ServerConfig};
use crate::error::ServerError;
use crate::protocol::responses::{self, format_response};

pub struct Server {
    client_registry: Arc<Mutex<ClientRegistry>>,
    listener: TcpListener,
    ctx: Arc<ServeContext>,
    max_clients: usize,
}

impl Server {
    /// Resolves the served root and binds the listener.
    ///
    /// Fails if the root is not an existing directory or the socket cannot
    /// be bound.
    pub async fn new(config: &ServerConfig) -> Result<Self, ServerError> {
        let ctx = config.serve_context()?;
        let socket = config.control_socket();

        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(ServerError::IoError(e));
            }
        };

        info!("Serving directory: {}", ctx.root.display());
        if !ctx.filter.ignored_dir_names.is_empty() {
            let mut ignored: Vec<&str> = ctx
                .filter
                .ignored_dir_names
                .iter()
                .map(String::as_str)
                .collect();
            ignored.sort_unstable();
            info!("Ignoring directories: {}", ignored.join(", "));
        }
        if ctx.filter.show_hidden {
            info!("Hidden entries are shown");
        }

        Ok(Self {
            client_registry: Arc::new(Mutex::new(ClientRegistry::new())),
            listener,
            ctx: Arc::new(ctx),
            max_clients: config.max_clients,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn start(&self) {
        info!(
            "Starting RAX tree server on {} (max {} clients)",
            self.local_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| "unknown address".to_string()),
            self.max_clients
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let client_registry = Arc::clone(&self.client_registry);
                    let ctx = Arc::clone(&self.ctx);
                    let max_clients = self.max_clients;

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_new_client(stream, addr, client_registry, ctx, max_clients).await
                        {
                            warn!("Failed to handle client {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

/// Handles a new client: checks the client limit, greets, registers, and
/// hands off to the session handler.
async fn handle_new_client(
    mut stream: TcpStream,
    client_addr: SocketAddr,
    client_registry: Arc<Mutex<ClientRegistry>>,
    ctx: Arc<ServeContext>,
    max_clients: usize,
) -> Result<(), std::io::Error> {
    {
        let mut clients = client_registry.lock().await;
        if !clients.try_insert(client_addr, max_clients) {
            warn!("Rejecting {}: client limit {} reached", client_addr, max_clients);
            let reply = format_response(
                responses::SERVICE_UNAVAILABLE,
                "Too many connections. Try again later.",
            );
            stream.write_all(reply.as_bytes()).await?;
            return Ok(());
        }

        info!(
            "Accepted client: {} ({}/{} clients)",
            client_addr,
            clients.len(),
            max_clients
        );
    }

    let greeting = format_response(responses::READY, "RAX tree server ready");
    if let Err(e) = send_greeting(&mut stream, &greeting).await {
        client_registry.lock().await.remove(&client_addr);
        return Err(e);
    }

    handle_client(stream, client_addr, client_registry, ctx).await;
    Ok(())
}

async fn send_greeting(stream: &mut TcpStream, greeting: &str) -> Result<(), std::io::Error> {
    stream.write_all(greeting.as_bytes()).await?;
    stream.flush().await
}
