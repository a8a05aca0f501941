use crate::core_ftpcommand::handlers::initialize_command_handlers;
use crate::core_log::StatusSink;
use crate::core_network::network::{accept_loop, ServerContext};
use crate::core_network::{DataChannelManager, ServerError};
use crate::config::DataPortMode;
use crate::core_vfs::StorageFactory;
use crate::Config;
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct RunningServer {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    data_channels: DataChannelManager,
    accept_task: JoinHandle<()>,
}

/// Control surface of the FTP engine.
///
/// `start` and `stop` may be called in any order and any number of times;
/// a redundant call is a no-op.
pub struct FtpServer {
    config: Arc<Config>,
    status: StatusSink,
    running: Mutex<Option<RunningServer>>,
}

impl FtpServer {
    pub fn new(config: Config, status: StatusSink) -> Self {
        Self {
            config: Arc::new(config),
            status,
            running: Mutex::new(None),
        }
    }

    /// Binds the control port and starts accepting clients.
    ///
    /// Returns the address actually bound, which differs from the configured
    /// one when port 0 was requested.
    pub async fn start(&self) -> Result<SocketAddr, ServerError> {
        let mut running = self.running.lock().await;
        if let Some(server) = running.as_ref() {
            if !server.accept_task.is_finished() {
                return Ok(server.local_addr);
            }
        }
        if let Some(stale) = running.take() {
            stale.shutdown.cancel();
        }

        let storage = match StorageFactory::probe(&self.config.server, &self.status).await {
            Ok(storage) => storage,
            Err(e) => {
                self.status.emit(format!("Storage unavailable: {}", e));
                return Err(e.into());
            }
        };

        let addr = SocketAddr::new(
            self.config.server.listen_address,
            self.config.server.listen_port,
        );
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(source) => {
                error!("Failed to bind {}: {}", addr, source);
                self.status.emit(format!("Failed to bind {}: {}", addr, source));
                return Err(ServerError::Bind { addr, source });
            }
        };
        let local_addr = listener.local_addr()?;

        let data_port = match self.config.server.data_port_mode {
            DataPortMode::Fixed => local_addr
                .port()
                .checked_add(1)
                .ok_or(ServerError::InvalidDataPort(local_addr.port()))?,
            DataPortMode::Ephemeral => 0,
        };

        let shutdown = CancellationToken::new();
        let data_channels = DataChannelManager::new(
            self.config.server.data_port_mode,
            self.config.server.listen_address,
            data_port,
            shutdown.clone(),
        );

        self.status.emit(format!(
            "Server listening on {} with {}",
            local_addr,
            storage.describe()
        ));

        let ctx = Arc::new(ServerContext {
            config: Arc::clone(&self.config),
            storage,
            data_channels: data_channels.session_handle(),
            handlers: initialize_command_handlers(),
            status: self.status.clone(),
            shutdown: shutdown.clone(),
        });
        let accept_task = tokio::spawn(accept_loop(listener, ctx));

        *running = Some(RunningServer {
            local_addr,
            shutdown,
            data_channels,
            accept_task,
        });
        Ok(local_addr)
    }

    /// Stops accepting clients and closes every session and data channel.
    ///
    /// The control port is free again once this returns.
    pub async fn stop(&self) {
        let Some(mut server) = self.running.lock().await.take() else {
            return;
        };
        server.shutdown.cancel();
        server.data_channels.close_any().await;
        if let Err(e) = server.accept_task.await {
            error!("Accept loop ended abnormally: {}", e);
        }
        info!("Server on {} stopped", server.local_addr);
        self.status.emit("Server stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .map_or(false, |server| !server.accept_task.is_finished())
    }

    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|server| server.local_addr)
    }
}
