use crate::config::DataPortMode;
use crate::core_network::error::DataChannelError;
use log::{debug, trace};
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;

static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

/// A passive-mode listener waiting for at most one data connection.
struct DataChannel {
    id: u64,
    port: u16,
    listener: Arc<TcpListener>,
    closed: CancellationToken,
    released: Arc<Notify>,
}

impl DataChannel {
    fn close(&self) {
        self.closed.cancel();
        trace!("Data channel {} on port {} closed", self.id, self.port);
    }

    fn lease(&self) -> ListenerLease {
        ListenerLease {
            listener: Some(Arc::clone(&self.listener)),
            released: Arc::clone(&self.released),
        }
    }

    /// Waits until every pending accept has let go of the listener, so the
    /// socket is really closed once this returns.
    async fn release(self) {
        let DataChannel {
            mut listener,
            released,
            port,
            ..
        } = self;
        loop {
            match Arc::try_unwrap(listener) {
                Ok(last) => {
                    drop(last);
                    trace!("Port {} released", port);
                    return;
                }
                Err(shared) => {
                    listener = shared;
                    released.notified().await;
                }
            }
        }
    }
}

/// The listener as seen by one accept. Dropping it signals the channel's
/// `released` notifier after the reference is gone.
struct ListenerLease {
    listener: Option<Arc<TcpListener>>,
    released: Arc<Notify>,
}

impl Drop for ListenerLease {
    fn drop(&mut self) {
        self.listener.take();
        self.released.notify_one();
    }
}

type ChannelSlot = Arc<Mutex<Option<DataChannel>>>;

/// Owns the passive data listener of one session.
///
/// In [`DataPortMode::Fixed`] every session handle points at the same slot,
/// bound on a single well-known port: a PASV from any client tears down the
/// listener another client may still be waiting on. In
/// [`DataPortMode::Ephemeral`] each session gets a private slot bound on an
/// OS-assigned port.
pub struct DataChannelManager {
    mode: DataPortMode,
    bind_ip: IpAddr,
    port: u16,
    slot: ChannelSlot,
    shutdown: CancellationToken,
    /// Channel this handle opened or last used, if any.
    owned: Option<u64>,
}

impl DataChannelManager {
    pub fn new(mode: DataPortMode, bind_ip: IpAddr, port: u16, shutdown: CancellationToken) -> Self {
        let port = match mode {
            DataPortMode::Fixed => port,
            DataPortMode::Ephemeral => 0,
        };
        Self {
            mode,
            bind_ip,
            port,
            slot: Arc::new(Mutex::new(None)),
            shutdown,
            owned: None,
        }
    }

    /// Hands out the manager a new session works with.
    pub fn session_handle(&self) -> Self {
        let slot = match self.mode {
            DataPortMode::Fixed => Arc::clone(&self.slot),
            DataPortMode::Ephemeral => Arc::new(Mutex::new(None)),
        };
        Self {
            mode: self.mode,
            bind_ip: self.bind_ip,
            port: self.port,
            slot,
            shutdown: self.shutdown.clone(),
            owned: None,
        }
    }

    /// Tears down whatever listener currently occupies the slot and binds a new one.
    ///
    /// Returns the port clients must connect to.
    pub async fn open(&mut self) -> Result<u16, DataChannelError> {
        let shared = Arc::clone(&self.slot);
        let mut slot = shared.lock().await;
        self.bind_into(&mut slot).await
    }

    /// Makes sure a listener exists before a transfer starts, reusing the
    /// one in the slot when there is one.
    pub async fn prepare(&mut self) -> Result<u16, DataChannelError> {
        let shared = Arc::clone(&self.slot);
        let mut slot = shared.lock().await;
        if let Some(channel) = slot.as_ref() {
            self.owned = Some(channel.id);
            return Ok(channel.port);
        }
        self.bind_into(&mut slot).await
    }

    /// Waits for exactly one client on the listener this handle prepared.
    ///
    /// Fails with [`DataChannelError::Closed`] when the listener is torn
    /// down, or replaced, before a client shows up.
    pub async fn accept(&mut self) -> Result<TcpStream, DataChannelError> {
        let (lease, closed) = {
            let slot = self.slot.lock().await;
            match slot.as_ref() {
                Some(channel) if self.owned.map_or(true, |id| id == channel.id) => {
                    self.owned = Some(channel.id);
                    (channel.lease(), channel.closed.clone())
                }
                _ => return Err(DataChannelError::Closed),
            }
        };
        let Some(listener) = lease.listener.as_deref() else {
            return Err(DataChannelError::Closed);
        };

        tokio::select! {
            _ = closed.cancelled() => Err(DataChannelError::Closed),
            accepted = listener.accept() => {
                let (stream, peer) = accepted.map_err(DataChannelError::Accept)?;
                debug!("Accepted data connection from {}", peer);
                Ok(stream)
            }
        }
    }

    /// Closes the listener this handle owns. Calling it again is a no-op.
    pub async fn close(&mut self) {
        let Some(id) = self.owned.take() else {
            return;
        };
        let mut slot = self.slot.lock().await;
        if slot.as_ref().map_or(false, |channel| channel.id == id) {
            if let Some(channel) = slot.take() {
                channel.close();
            }
        }
    }

    /// Closes the listener in the slot regardless of who opened it.
    pub async fn close_any(&mut self) {
        self.owned = None;
        if let Some(channel) = self.slot.lock().await.take() {
            channel.close();
        }
    }

    #[cfg(test)]
    async fn port(&self) -> Option<u16> {
        self.slot.lock().await.as_ref().map(|channel| channel.port)
    }

    async fn bind_into(&mut self, slot: &mut Option<DataChannel>) -> Result<u16, DataChannelError> {
        if let Some(previous) = slot.take() {
            debug!("Replacing data channel on port {}", previous.port);
            previous.close();
            // A pending accept still holds the old socket open; binding the
            // same port before it lets go fails with EADDRINUSE.
            previous.release().await;
        }
        self.owned = None;

        let listener = TcpListener::bind((self.bind_ip, self.port))
            .await
            .map_err(|source| DataChannelError::Bind {
                port: self.port,
                source,
            })?;
        let port = listener.local_addr()?.port();
        let id = NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed);

        *slot = Some(DataChannel {
            id,
            port,
            listener: Arc::new(listener),
            closed: self.shutdown.child_token(),
            released: Arc::new(Notify::new()),
        });
        self.owned = Some(id);
        debug!("Data channel {} listening on port {}", id, port);
        Ok(port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn ephemeral() -> DataChannelManager {
        DataChannelManager::new(
            DataPortMode::Ephemeral,
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            0,
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_accepts_one_connection() {
        let mut manager = ephemeral().session_handle();
        let port = manager.open().await.unwrap();
        assert_eq!(manager.port().await, Some(port));

        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await.unwrap();
            stream.write_all(b"hello").await.unwrap();
        });

        let mut stream = manager.accept().await.unwrap();
        let mut received = Vec::new();
        stream.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"hello");
        client.await.unwrap();

        manager.close().await;
        assert_eq!(manager.port().await, None);
        manager.close().await;
    }

    #[tokio::test]
    async fn test_prepare_reuses_open_channel() {
        let mut manager = ephemeral().session_handle();
        let port = manager.open().await.unwrap();
        assert_eq!(manager.prepare().await.unwrap(), port);

        manager.close().await;
        let fresh = manager.prepare().await.unwrap();
        assert_eq!(manager.port().await, Some(fresh));
    }

    #[tokio::test]
    async fn test_second_open_closes_first_listener() {
        let mut manager = ephemeral().session_handle();
        let first = manager.open().await.unwrap();
        let second = manager.open().await.unwrap();
        assert_eq!(manager.port().await, Some(second));
        assert!(
            TcpStream::connect((Ipv4Addr::LOCALHOST, first)).await.is_err()
                || first == second
        );
    }

    #[tokio::test]
    async fn test_pending_accept_fails_when_superseded() {
        let prototype = DataChannelManager::new(
            DataPortMode::Fixed,
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            0,
            CancellationToken::new(),
        );
        let mut first = prototype.session_handle();
        let mut second = prototype.session_handle();

        first.prepare().await.unwrap();
        let waiting = tokio::spawn(async move { first.accept().await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        second.open().await.unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), waiting)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(DataChannelError::Closed)));
    }

    #[tokio::test]
    async fn test_rebind_waits_for_pending_accept() {
        let port = std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let prototype = DataChannelManager::new(
            DataPortMode::Fixed,
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
            CancellationToken::new(),
        );
        let mut first = prototype.session_handle();
        let mut second = prototype.session_handle();

        assert_eq!(first.prepare().await.unwrap(), port);
        let waiting = tokio::spawn(async move { first.accept().await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(second.open().await.unwrap(), port);
        let result = tokio::time::timeout(Duration::from_secs(5), waiting)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(DataChannelError::Closed)));

        let client = tokio::spawn(async move {
            TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await.unwrap()
        });
        assert!(second.accept().await.is_ok());
        client.await.unwrap();
    }

    #[tokio::test]
    async fn test_close_leaves_foreign_channel_alone() {
        let prototype = DataChannelManager::new(
            DataPortMode::Fixed,
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            0,
            CancellationToken::new(),
        );
        let mut first = prototype.session_handle();
        let mut second = prototype.session_handle();

        first.open().await.unwrap();
        let port = second.open().await.unwrap();
        assert!(matches!(first.accept().await, Err(DataChannelError::Closed)));
        first.close().await;
        assert_eq!(second.port().await, Some(port));
    }

    #[tokio::test]
    async fn test_shutdown_cancels_accept() {
        let shutdown = CancellationToken::new();
        let prototype = DataChannelManager::new(
            DataPortMode::Ephemeral,
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            0,
            shutdown.clone(),
        );
        let mut manager = prototype.session_handle();
        manager.open().await.unwrap();

        shutdown.cancel();
        let result = tokio::time::timeout(Duration::from_secs(5), manager.accept())
            .await
            .unwrap();
        assert!(matches!(result, Err(DataChannelError::Closed)));
    }

    #[tokio::test]
    async fn test_accept_without_listener() {
        let mut manager = ephemeral().session_handle();
        assert!(matches!(manager.accept().await, Err(DataChannelError::Closed)));
    }
}
