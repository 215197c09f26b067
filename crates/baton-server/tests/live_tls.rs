//! HTTPS round trips against `App::start_tls` with a throwaway certificate.

use baton_server::{App, ServerError};
use http::StatusCode;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

struct Fixture {
    cert: NamedTempFile,
    key: NamedTempFile,
    roots: RootCertStore,
}

fn self_signed() -> Fixture {
    let generated = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();

    let mut cert = NamedTempFile::new().unwrap();
    cert.write_all(generated.cert.pem().as_bytes()).unwrap();
    let mut key = NamedTempFile::new().unwrap();
    key.write_all(generated.key_pair.serialize_pem().as_bytes()).unwrap();

    let mut roots = RootCertStore::empty();
    roots.add(generated.cert.der().clone()).unwrap();

    Fixture { cert, key, roots }
}

fn connector(roots: RootCertStore) -> TlsConnector {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_root_certificates(roots)
        .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    TlsConnector::from(Arc::new(config))
}

/// Performs one HTTPS request and returns the raw response text plus the
/// negotiated ALPN protocol.
async fn exchange_tls(addr: SocketAddr, roots: RootCertStore, raw: &str) -> (String, Option<Vec<u8>>) {
    let tcp = TcpStream::connect(addr).await.unwrap();
    let server_name = ServerName::try_from("localhost").unwrap();
    let mut stream = connector(roots).connect(server_name, tcp).await.unwrap();
    let alpn = stream.get_ref().1.alpn_protocol().map(<[u8]>::to_vec);

    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    // Some peers close without close_notify; the bytes read so far are what matter.
    let _ = stream.read_to_end(&mut buf).await;
    (String::from_utf8(buf).unwrap(), alpn)
}

#[tokio::test]
async fn test_start_tls_serves_https() {
    let fixture = self_signed();
    let server = App::new()
        .use_sync_fn("secure", |ctx| {
            let body = format!("secure {}", ctx.req().uri().path());
            ctx.text(StatusCode::OK, body);
            Ok(())
        })
        .start_tls(None, fixture.cert.path(), fixture.key.path())
        .await
        .unwrap();

    let (response, alpn) = exchange_tls(
        server.local_addr(),
        fixture.roots.clone(),
        "GET /vault HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert_eq!(alpn.as_deref(), Some(&b"http/1.1"[..]));
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.ends_with("secure /vault"));

    server.close();
    server.wait().await.unwrap();
}

#[tokio::test]
async fn test_plaintext_client_does_not_stop_tls_listener() {
    let fixture = self_signed();
    let server = App::new()
        .use_sync_fn("ok", |ctx| {
            ctx.text(StatusCode::OK, "ok");
            Ok(())
        })
        .start_tls(None, fixture.cert.path(), fixture.key.path())
        .await
        .unwrap();

    let mut plain = TcpStream::connect(server.local_addr()).await.unwrap();
    plain
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let mut sink = Vec::new();
    let _ = plain.read_to_end(&mut sink).await;

    let (response, _) = exchange_tls(
        server.local_addr(),
        fixture.roots.clone(),
        "GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.ends_with("ok"));

    server.close();
    server.wait().await.unwrap();
}

#[tokio::test]
async fn test_start_tls_with_missing_key_fails_before_binding() {
    let fixture = self_signed();
    let result = App::new()
        .use_sync_fn("noop", |_| Ok(()))
        .start_tls(None, fixture.cert.path(), "/nonexistent/key.pem")
        .await;

    assert!(matches!(result, Err(ServerError::Tls(ref msg)) if msg.contains("key")));
}
