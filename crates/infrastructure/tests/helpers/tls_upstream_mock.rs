use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_rustls::server::TlsStream;
use tokio_rustls::TlsAcceptor;

/// What the double does with a session once the handshake completes.
#[derive(Clone)]
pub enum UpstreamBehavior {
    /// Send back exactly the bytes received.
    Echo,
    /// Send a fixed reply regardless of the query.
    Reply(Vec<u8>),
    /// Read the query, then never send anything.
    Hang,
    /// Close the session immediately, before reading.
    CloseAfterHandshake,
}

/// DNS-over-TLS upstream test double with a self-signed certificate for
/// "localhost". Counts TCP connections and open sessions so tests can
/// assert the one-session-per-exchange and no-leak properties.
pub struct MockTlsUpstream {
    addr: SocketAddr,
    cert_der: CertificateDer<'static>,
    connections: Arc<AtomicUsize>,
    open_sessions: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<Vec<u8>>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockTlsUpstream {
    pub async fn start(behavior: UpstreamBehavior) -> (Self, SocketAddr) {
        let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
            .expect("self-signed certificate generation");
        let cert_der = certified.cert.der().clone();
        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(
            certified.key_pair.serialize_der(),
        ));

        let server_config = rustls::ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(vec![cert_der.clone()], key)
            .expect("server TLS config");
        let acceptor = TlsAcceptor::from(Arc::new(server_config));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock upstream");
        let addr = listener.local_addr().unwrap();

        let connections = Arc::new(AtomicUsize::new(0));
        let open_sessions = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        {
            let connections = connections.clone();
            let open_sessions = open_sessions.clone();
            let received = received.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = &mut shutdown_rx => break,
                        accepted = listener.accept() => {
                            let Ok((tcp, _peer)) = accepted else { break };
                            connections.fetch_add(1, Ordering::SeqCst);

                            let acceptor = acceptor.clone();
                            let behavior = behavior.clone();
                            let open_sessions = open_sessions.clone();
                            let received = received.clone();
                            tokio::spawn(async move {
                                // Handshake failures (untrusted cert, name
                                // mismatch) end here; no session is opened.
                                if let Ok(tls) = acceptor.accept(tcp).await {
                                    open_sessions.fetch_add(1, Ordering::SeqCst);
                                    serve_session(tls, behavior, received).await;
                                    open_sessions.fetch_sub(1, Ordering::SeqCst);
                                }
                            });
                        }
                    }
                }
            });
        }

        (
            Self {
                addr,
                cert_der,
                connections,
                open_sessions,
                received,
                shutdown_tx: Some(shutdown_tx),
            },
            addr,
        )
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Root store trusting exactly this double's certificate.
    pub fn root_store(&self) -> rustls::RootCertStore {
        let mut roots = rustls::RootCertStore::empty();
        roots
            .add(self.cert_der.clone())
            .expect("self-signed cert is a valid trust anchor");
        roots
    }

    /// TCP connections accepted, including ones whose handshake failed.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Sessions that completed a handshake and are not yet closed.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    /// Payloads read off completed sessions.
    pub fn received(&self) -> Vec<Vec<u8>> {
        self.received.lock().unwrap().clone()
    }

    /// Wait until the double observes every session closed. Closure is
    /// asynchronous from the client's point of view, so assertions on
    /// `open_sessions` go through here.
    pub async fn wait_idle(&self) {
        for _ in 0..100 {
            if self.open_sessions() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "mock upstream still has {} open session(s)",
            self.open_sessions()
        );
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockTlsUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn serve_session(
    mut stream: TlsStream<TcpStream>,
    behavior: UpstreamBehavior,
    received: Arc<Mutex<Vec<Vec<u8>>>>,
) {
    match behavior {
        UpstreamBehavior::Echo => {
            let mut buf = vec![0u8; 4096];
            if let Ok(n) = stream.read(&mut buf).await {
                if n > 0 {
                    received.lock().unwrap().push(buf[..n].to_vec());
                    let _ = stream.write_all(&buf[..n]).await;
                    let _ = stream.flush().await;
                }
            }
            drain(&mut stream).await;
        }
        UpstreamBehavior::Reply(reply) => {
            let mut buf = vec![0u8; 4096];
            if let Ok(n) = stream.read(&mut buf).await {
                if n > 0 {
                    received.lock().unwrap().push(buf[..n].to_vec());
                    let _ = stream.write_all(&reply).await;
                    let _ = stream.flush().await;
                }
            }
            drain(&mut stream).await;
        }
        UpstreamBehavior::Hang => {
            let mut buf = vec![0u8; 4096];
            if let Ok(n) = stream.read(&mut buf).await {
                if n > 0 {
                    received.lock().unwrap().push(buf[..n].to_vec());
                }
            }
            // Never reply; wait for the client to give up and close.
            drain(&mut stream).await;
        }
        UpstreamBehavior::CloseAfterHandshake => {
            let _ = stream.shutdown().await;
        }
    }
}

/// Read until the peer closes so session accounting reflects the client's
/// close, not ours.
async fn drain(stream: &mut TlsStream<TcpStream>) {
    let mut buf = [0u8; 1024];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
    }
}

/// An address nothing is listening on; connections to it are refused.
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
