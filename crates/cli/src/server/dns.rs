use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use steer_dns_infrastructure::dns::transport::tcp::{
    read_with_length_prefix, send_with_length_prefix,
};
use steer_dns_infrastructure::dns::{DnsServerHandler, Ingress};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

const MAX_UDP_MESSAGE_SIZE: usize = 4096;
const TCP_RESPONSE_QUEUE: usize = 64;

/// Runs the UDP and TCP listeners until `shutdown` fires, then waits for
/// every in-flight query to finish.
pub async fn start_dns_server(
    bind_addr: String,
    handler: DnsServerHandler,
    tcp_idle_timeout: Duration,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let socket_addr: SocketAddr = bind_addr.parse()?;
    let domain = if socket_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let udp_socket = Arc::new(create_udp_socket(domain, socket_addr)?);
    let tcp_listener = create_tcp_listener(domain, socket_addr)?;

    serve(udp_socket, tcp_listener, Arc::new(handler), tcp_idle_timeout, shutdown).await;
    Ok(())
}

async fn serve(
    udp_socket: Arc<UdpSocket>,
    tcp_listener: TcpListener,
    handler: Arc<DnsServerHandler>,
    tcp_idle_timeout: Duration,
    shutdown: CancellationToken,
) {
    let tracker = TaskTracker::new();
    let mut join_set: JoinSet<()> = JoinSet::new();

    if let Ok(addr) = udp_socket.local_addr() {
        info!(bind_address = %addr, "DNS server listening on UDP and TCP");
    }

    join_set.spawn(run_udp_listener(
        udp_socket,
        handler.clone(),
        tracker.clone(),
        shutdown.clone(),
    ));
    join_set.spawn(run_tcp_listener(
        tcp_listener,
        handler,
        tcp_idle_timeout,
        tracker.clone(),
        shutdown,
    ));

    while join_set.join_next().await.is_some() {}

    tracker.close();
    if !tracker.is_empty() {
        info!(in_flight = tracker.len(), "Waiting for in-flight queries");
    }
    tracker.wait().await;
}

async fn run_udp_listener(
    socket: Arc<UdpSocket>,
    handler: Arc<DnsServerHandler>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
) {
    let mut recv_buf = vec![0u8; MAX_UDP_MESSAGE_SIZE];

    loop {
        let (len, peer) = tokio::select! {
            _ = shutdown.cancelled() => break,
            result = socket.recv_from(&mut recv_buf) => match result {
                Ok(received) => received,
                Err(e) => {
                    warn!(error = %e, "UDP recv error");
                    continue;
                }
            },
        };

        let query = recv_buf[..len].to_vec();
        let handler = handler.clone();
        let socket = socket.clone();
        tracker.spawn(async move {
            if let Some(response) = handler.handle_raw(&query, Ingress::Udp).await {
                if let Err(e) = socket.send_to(&response, peer).await {
                    debug!(client = %peer, error = %e, "Failed to send UDP response");
                }
            }
        });
    }

    debug!("UDP listener stopped");
}

async fn run_tcp_listener(
    listener: TcpListener,
    handler: Arc<DnsServerHandler>,
    idle_timeout: Duration,
    tracker: TaskTracker,
    shutdown: CancellationToken,
) {
    loop {
        let (stream, peer) = tokio::select! {
            _ = shutdown.cancelled() => break,
            result = listener.accept() => match result {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "TCP accept error");
                    continue;
                }
            },
        };

        if let Err(e) = stream.set_nodelay(true) {
            debug!(client = %peer, error = %e, "Failed to set TCP_NODELAY");
        }

        tracker.spawn(handle_tcp_connection(
            stream,
            peer,
            handler.clone(),
            idle_timeout,
            tracker.clone(),
            shutdown.clone(),
        ));
    }

    debug!("TCP listener stopped");
}

/// Reads framed queries until the client goes quiet or disconnects.
///
/// Each query is resolved in its own task, so replies go out in completion
/// order through a single writer.
async fn handle_tcp_connection(
    stream: TcpStream,
    peer: SocketAddr,
    handler: Arc<DnsServerHandler>,
    idle_timeout: Duration,
    tracker: TaskTracker,
    shutdown: CancellationToken,
) {
    let (mut reader, writer) = stream.into_split();
    let (tx, rx) = mpsc::channel::<Vec<u8>>(TCP_RESPONSE_QUEUE);
    let writer_task = tracker.spawn(write_responses(writer, rx, peer));

    loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = tokio::time::timeout(idle_timeout, read_with_length_prefix(&mut reader)) => frame,
        };

        let query = match frame {
            Ok(Ok(Some(query))) => query,
            Ok(Ok(None)) => break,
            Ok(Err(e)) => {
                debug!(client = %peer, error = %e, "TCP read error");
                break;
            }
            Err(_) => {
                debug!(client = %peer, "Closing idle TCP connection");
                break;
            }
        };

        let handler = handler.clone();
        let tx = tx.clone();
        tracker.spawn(async move {
            if let Some(response) = handler.handle_raw(&query, Ingress::Tcp).await {
                let _ = tx.send(response).await;
            }
        });
    }

    drop(tx);
    if let Err(e) = writer_task.await {
        error!(client = %peer, error = %e, "TCP writer task failed");
    }
}

async fn write_responses(
    mut writer: OwnedWriteHalf,
    mut responses: mpsc::Receiver<Vec<u8>>,
    peer: SocketAddr,
) {
    while let Some(response) = responses.recv().await {
        if let Err(e) = send_with_length_prefix(&mut writer, &response).await {
            debug!(client = %peer, error = %e, "Failed to write TCP response");
            break;
        }
    }
    let _ = writer.shutdown().await;
}

fn create_udp_socket(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<UdpSocket> {
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.set_recv_buffer_size(512 * 1024)?;
    socket.set_send_buffer_size(512 * 1024)?;
    socket.bind(&socket_addr.into())?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    Ok(UdpSocket::from_std(std_socket)?)
}

fn create_tcp_listener(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;
    let std_listener: std::net::TcpListener = socket.into();
    Ok(TcpListener::from_std(std_listener)?)
}
