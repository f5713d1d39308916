//! UDP transport - command socket and optional telemetry listener
//!
//! The command socket is bound eagerly to an ephemeral port and only ever
//! sends. The telemetry socket is bound to `0.0.0.0:<listen_port>` when the
//! port is nonzero; its listener task decodes each datagram and forwards the
//! messages to the session over a channel. A failed telemetry bind disables
//! listening for the lifetime of this transport, sending keeps working.
//!
//! Sockets are never rebound: reconfiguration closes the transport and
//! builds a new one. `close` returns only once the listener task has exited
//! and dropped its socket, so the same port can be bound again right away.
//! `destroy` is the synchronous variant used from `Drop`; it signals the
//! listener but does not wait for it.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::error::TransportError;
use crate::osc::{self, InboundMessage, OscArg, MTU};

/// Running telemetry listener task
struct Listener {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// UDP endpoints for one session
pub struct Transport {
    target: SocketAddr,
    command: Option<Arc<UdpSocket>>,
    listener: Option<Listener>,
    listen_addr: Option<SocketAddr>,
}

impl Transport {
    /// Bind the command socket and, if `listen_port` is nonzero, the telemetry socket
    ///
    /// Only a failure to create the command socket is returned; a telemetry
    /// bind failure is logged and leaves the transport send-only.
    pub async fn start(
        target: SocketAddr,
        listen_port: u16,
        inbound: mpsc::Sender<InboundMessage>,
    ) -> Result<Self, TransportError> {
        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let command = UdpSocket::bind(local).await?;
        debug!(local = ?command.local_addr().ok(), %target, "Command socket ready");

        let mut transport = Self {
            target,
            command: Some(Arc::new(command)),
            listener: None,
            listen_addr: None,
        };

        if listen_port == 0 {
            info!("listen_port is 0; not listening for OSC telemetry");
            return Ok(transport);
        }

        match bind_telemetry(listen_port).await {
            Ok(socket) => {
                let (stop, stop_rx) = oneshot::channel();
                transport.listen_addr = socket.local_addr().ok();
                transport.listener = Some(Listener {
                    stop,
                    task: tokio::spawn(listen(socket, inbound, stop_rx)),
                });
                info!("✅ Listening for OSC telemetry on port {}", listen_port);
            }
            Err(e) => {
                error!("{}", e);
            }
        }

        Ok(transport)
    }

    /// Device command endpoint
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Local address of the telemetry socket, if listening
    pub fn listen_addr(&self) -> Option<SocketAddr> {
        self.listen_addr
    }

    pub fn is_listening(&self) -> bool {
        self.listener
            .as_ref()
            .map(|listener| !listener.task.is_finished())
            .unwrap_or(false)
    }

    /// Encode and send one datagram to the device
    ///
    /// Never blocks and never fails: encode and send errors are logged and
    /// the message is dropped.
    pub fn send(&self, path: &str, args: &[OscArg]) {
        let Some(socket) = self.command.clone() else {
            warn!("Transport destroyed, dropping OSC message to {}", path);
            return;
        };

        let buf = match osc::encode(path, args) {
            Ok(buf) => buf,
            Err(e) => {
                error!("{}", e);
                return;
            }
        };

        let target = self.target;
        let path = osc::normalize_path(path);
        trace!(%path, %target, len = buf.len(), "Sending OSC");

        tokio::spawn(async move {
            if let Err(source) = socket.send_to(&buf, target).await {
                let err = TransportError::Send {
                    target: target.to_string(),
                    source,
                };
                error!("{} ({})", err, path);
            }
        });
    }

    /// Close both sockets and wait until the telemetry port is released
    ///
    /// Safe to call more than once.
    pub async fn close(&mut self) {
        if let Some(listener) = self.listener.take() {
            let _ = listener.stop.send(());
            if let Err(e) = listener.task.await {
                if !e.is_cancelled() {
                    warn!("Telemetry listener ended abnormally: {}", e);
                }
            }
            debug!("Telemetry listener stopped");
        }
        self.close_command();
    }

    /// Close both sockets without waiting for the listener to exit
    ///
    /// Safe to call more than once. The telemetry port may stay bound for a
    /// moment after this returns; use `close` before rebinding it.
    pub fn destroy(&mut self) {
        if let Some(listener) = self.listener.take() {
            let _ = listener.stop.send(());
            listener.task.abort();
            debug!("Telemetry listener signalled to stop");
        }
        self.close_command();
    }

    fn close_command(&mut self) {
        self.listen_addr = None;
        if self.command.take().is_some() {
            debug!("Command socket closed");
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.command.is_none()
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Bind the telemetry socket on all interfaces
pub async fn bind_telemetry(port: u16) -> Result<UdpSocket, TransportError> {
    UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))
        .await
        .map_err(|e| TransportError::from_bind(port, e))
}

async fn listen(
    socket: UdpSocket,
    inbound: mpsc::Sender<InboundMessage>,
    mut stop: oneshot::Receiver<()>,
) {
    let mut buf = vec![0u8; MTU];

    loop {
        let received = tokio::select! {
            received = socket.recv_from(&mut buf) => received,
            _ = &mut stop => {
                debug!("Telemetry listener stopping");
                return;
            }
        };
        let (len, peer) = match received {
            Ok(received) => received,
            Err(e) => {
                warn!("OSC receive error: {}", e);
                continue;
            }
        };

        let messages = match osc::decode(&buf[..len]) {
            Ok(messages) => messages,
            Err(e) => {
                debug!(%peer, "{}", e);
                continue;
            }
        };

        for message in messages {
            trace!(%peer, "📥 {}", message);
            if inbound.send(message).await.is_err() {
                debug!("Inbound channel closed, stopping telemetry listener");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::{OscMessage, OscPacket, OscType};
    use std::time::Duration;

    fn free_port() -> u16 {
        std::net::UdpSocket::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    fn loopback(port: u16) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, port))
    }

    #[tokio::test]
    async fn test_send_mute_by_index_reaches_device() {
        let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let (tx, _rx) = mpsc::channel(8);
        let transport = Transport::start(device.local_addr().unwrap(), 0, tx)
            .await
            .unwrap();
        assert!(!transport.is_listening());

        transport.send("zoomRooms/roomIndex/muteMic", &[OscArg::Int(3)]);

        let mut buf = [0u8; MTU];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), device.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let (_, packet) = rosc::decoder::decode_udp(&buf[..len]).unwrap();
        match packet {
            OscPacket::Message(msg) => {
                assert_eq!(msg.addr, "/zoomRooms/roomIndex/muteMic");
                assert_eq!(msg.args, vec![OscType::Int(3)]);
            }
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_telemetry_forwarded_and_garbage_dropped() {
        let port = free_port();
        let (tx, mut rx) = mpsc::channel(8);
        let transport = Transport::start(loopback(9), port, tx).await.unwrap();
        assert!(transport.is_listening());
        assert_eq!(transport.listen_addr().map(|a| a.port()), Some(port));

        let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        device.send_to(b"not osc", loopback(port)).await.unwrap();

        let packet = OscPacket::Message(OscMessage {
            addr: "/roomosc/addedRoomsCount".to_string(),
            args: vec![OscType::Int(2)],
        });
        let buf = rosc::encoder::encode(&packet).unwrap();
        device.send_to(&buf, loopback(port)).await.unwrap();

        let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(msg.address, "/roomosc/addedRoomsCount");
        assert_eq!(msg.args, vec![OscType::Int(2)]);
    }

    #[tokio::test]
    async fn test_port_in_use_disables_listening_only() {
        let holder = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await.unwrap();
        let port = holder.local_addr().unwrap().port();

        let err = bind_telemetry(port).await.unwrap_err();
        assert!(matches!(err, TransportError::PortInUse { port: p } if p == port));
        assert!(err.to_string().contains("already in use"));

        let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let (tx, _rx) = mpsc::channel(8);
        let transport = Transport::start(device.local_addr().unwrap(), port, tx)
            .await
            .unwrap();
        assert!(!transport.is_listening());

        transport.send("/zoomRooms/allRooms/startCamera", &[]);
        let mut buf = [0u8; MTU];
        let received = tokio::time::timeout(Duration::from_secs(2), device.recv_from(&mut buf)).await;
        assert!(received.is_ok());
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let port = free_port();
        let (tx, _rx) = mpsc::channel(8);
        let mut transport = Transport::start(loopback(9), port, tx).await.unwrap();

        transport.destroy();
        transport.destroy();
        assert!(transport.is_destroyed());
        assert!(!transport.is_listening());
        assert_eq!(transport.listen_addr(), None);

        // Sending after destroy is a logged no-op
        transport.send("/zoomRooms/allRooms/muteMic", &[]);
    }

    #[tokio::test]
    async fn test_close_releases_listen_port() {
        let port = free_port();

        for _ in 0..5 {
            let (tx, _rx) = mpsc::channel(8);
            let mut transport = Transport::start(loopback(9), port, tx).await.unwrap();
            assert!(transport.is_listening());

            transport.close().await;
            transport.close().await;
            assert!(transport.is_destroyed());

            let rebound = bind_telemetry(port).await;
            assert!(rebound.is_ok(), "port {} still bound after close", port);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_close_then_restart_keeps_listening() {
        let port = free_port();
        let (tx, mut rx) = mpsc::channel(8);
        let mut transport = Transport::start(loopback(9), port, tx.clone()).await.unwrap();

        for _ in 0..10 {
            transport.close().await;
            transport = Transport::start(loopback(9), port, tx.clone()).await.unwrap();
            assert!(transport.is_listening());
        }

        let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let packet = OscPacket::Message(OscMessage {
            addr: "/roomosc/pairedRoomsCount".to_string(),
            args: vec![OscType::Int(1)],
        });
        device
            .send_to(&rosc::encoder::encode(&packet).unwrap(), loopback(port))
            .await
            .unwrap();
        let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(msg.address, "/roomosc/pairedRoomsCount");
    }
}
