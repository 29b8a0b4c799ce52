use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::{RData, Record};
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinHandle;

#[derive(Clone)]
pub enum FakeBehavior {
    /// Answers every question with these addresses.
    Answer(Vec<IpAddr>),
    /// Sets TC over UDP; answers normally over TCP.
    TruncateUdp(Vec<IpAddr>),
    /// Replies with a different message id.
    WrongId,
    /// Never replies.
    Silent,
}

/// Loopback upstream listening on the same port for UDP and TCP.
pub struct FakeUpstream {
    addr: SocketAddr,
    udp_queries: Arc<AtomicUsize>,
    tcp_queries: Arc<AtomicUsize>,
    tasks: Vec<JoinHandle<()>>,
}

impl FakeUpstream {
    pub async fn start(behavior: FakeBehavior) -> Self {
        let (udp, tcp) = bind_pair().await;
        let addr = udp.local_addr().unwrap();
        let udp_queries = Arc::new(AtomicUsize::new(0));
        let tcp_queries = Arc::new(AtomicUsize::new(0));

        let udp_task = {
            let behavior = behavior.clone();
            let counter = udp_queries.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                while let Ok((len, peer)) = udp.recv_from(&mut buf).await {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if let Some(reply) = respond(&buf[..len], &behavior, false) {
                        let _ = udp.send_to(&reply, peer).await;
                    }
                }
            })
        };

        let tcp_task = {
            let counter = tcp_queries.clone();
            tokio::spawn(async move {
                while let Ok((mut stream, _)) = tcp.accept().await {
                    let behavior = behavior.clone();
                    let counter = counter.clone();
                    tokio::spawn(async move {
                        let mut len_buf = [0u8; 2];
                        if stream.read_exact(&mut len_buf).await.is_err() {
                            return;
                        }
                        let mut query = vec![0u8; u16::from_be_bytes(len_buf) as usize];
                        if stream.read_exact(&mut query).await.is_err() {
                            return;
                        }
                        counter.fetch_add(1, Ordering::SeqCst);
                        if let Some(reply) = respond(&query, &behavior, true) {
                            let _ = stream.write_all(&(reply.len() as u16).to_be_bytes()).await;
                            let _ = stream.write_all(&reply).await;
                        }
                    });
                }
            })
        };

        Self {
            addr,
            udp_queries,
            tcp_queries,
            tasks: vec![udp_task, tcp_task],
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn udp_queries(&self) -> usize {
        self.udp_queries.load(Ordering::SeqCst)
    }

    pub fn tcp_queries(&self) -> usize {
        self.tcp_queries.load(Ordering::SeqCst)
    }
}

impl Drop for FakeUpstream {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn bind_pair() -> (UdpSocket, TcpListener) {
    for _ in 0..20 {
        let udp = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = udp.local_addr().unwrap();
        if let Ok(tcp) = TcpListener::bind(addr).await {
            return (udp, tcp);
        }
    }
    panic!("could not bind matching UDP/TCP loopback ports");
}

fn respond(query_bytes: &[u8], behavior: &FakeBehavior, over_tcp: bool) -> Option<Vec<u8>> {
    let query = Message::from_vec(query_bytes).ok()?;

    let mut response = Message::new();
    response
        .set_id(query.id())
        .set_message_type(MessageType::Response)
        .set_op_code(query.op_code())
        .set_recursion_desired(query.recursion_desired())
        .set_recursion_available(true)
        .set_response_code(ResponseCode::NoError);
    response.add_queries(query.queries().iter().cloned());

    let addresses = match behavior {
        FakeBehavior::Silent => return None,
        FakeBehavior::WrongId => {
            response.set_id(query.id().wrapping_add(1));
            Vec::new()
        }
        FakeBehavior::TruncateUdp(_) if !over_tcp => {
            response.set_truncated(true);
            Vec::new()
        }
        FakeBehavior::TruncateUdp(addresses) | FakeBehavior::Answer(addresses) => addresses.clone(),
    };

    let owner = query.queries().first()?.name().clone();
    let answers: Vec<Record> = addresses
        .iter()
        .map(|ip| {
            let rdata = match ip {
                IpAddr::V4(v4) => RData::A(A(*v4)),
                IpAddr::V6(v6) => RData::AAAA(AAAA(*v6)),
            };
            Record::from_rdata(owner.clone(), 60, rdata)
        })
        .collect();
    response.insert_answers(answers);

    response.to_vec().ok()
}
