//! Exercises `ConsulClient` against an in-process fake agent.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use upsync_catalog::{CatalogApi, CatalogError, ConsulClient};
use upsync_core::Cursor;

const HEALTH_BODY: &str = r#"[
  {
    "Node": {"Node": "n1", "Address": "10.0.0.1"},
    "Service": {"ID": "web-1", "Service": "web", "Port": 8080, "Tags": ["gray=canary"]},
    "Checks": [{"ServiceID": "web-1", "Status": "passing"}]
  }
]"#;

#[derive(Clone, Copy)]
enum Mode {
    Healthy,
    NoIndex,
    Broken,
    Garbage,
    Holding(Duration),
}

type Seen = Arc<Mutex<Vec<String>>>;

async fn spawn_agent(mode: Mode) -> (SocketAddr, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: Seen = Arc::default();
    let log = seen.clone();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let log = log.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let log = log.clone();
                    async move {
                        let target = req
                            .uri()
                            .path_and_query()
                            .map(|pq| pq.to_string())
                            .unwrap_or_default();
                        log.lock().unwrap().push(target);
                        if let Mode::Holding(hold) = mode {
                            tokio::time::sleep(hold).await;
                        }
                        Ok::<_, hyper::Error>(respond(mode, req.uri().path()))
                    }
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    (addr, seen)
}

fn respond(mode: Mode, path: &str) -> Response<Full<Bytes>> {
    let body = match path {
        "/v1/catalog/services" => r#"{"consul": [], "web": ["gray=canary"], "db": null}"#,
        "/v1/health/service/web" => HEALTH_BODY,
        _ => "[]",
    };

    let builder = Response::builder();
    let response = match mode {
        Mode::Healthy | Mode::Holding(_) => builder.header("X-Consul-Index", "6").body(body),
        Mode::NoIndex => builder.body(body),
        Mode::Broken => builder
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .header("X-Consul-Index", "6")
            .body("rpc error"),
        Mode::Garbage => builder.header("X-Consul-Index", "6").body("{not json"),
    };

    response.unwrap().map(|body| Full::new(Bytes::from(body)))
}

fn client(addr: SocketAddr) -> ConsulClient {
    client_with_timeout(addr, Duration::from_secs(2))
}

fn client_with_timeout(addr: SocketAddr, timeout: Duration) -> ConsulClient {
    let base = format!("http://{addr}").parse().unwrap();
    ConsulClient::new(reqwest::Client::new(), base, timeout)
}

#[tokio::test]
async fn first_listing_has_no_index_params() {
    let (addr, seen) = spawn_agent(Mode::Healthy).await;

    let (cursor, services) = client(addr)
        .services(None, Duration::from_secs(3))
        .await
        .unwrap();

    assert_eq!(cursor, Cursor::new("6"));
    assert_eq!(services["web"], vec!["gray=canary".to_string()]);
    assert!(services["db"].is_empty());
    assert_eq!(*seen.lock().unwrap(), vec!["/v1/catalog/services"]);
}

#[tokio::test]
async fn long_poll_sends_index_and_wait() {
    let (addr, seen) = spawn_agent(Mode::Healthy).await;

    client(addr)
        .services(Some(&Cursor::new("5")), Duration::from_secs(3))
        .await
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["/v1/catalog/services?index=5&wait=3s"]
    );
}

#[tokio::test]
async fn idle_poll_answered_within_jitter_succeeds() {
    // Held past wait + timeout but inside the wait / 16 jitter allowance.
    let (addr, _) = spawn_agent(Mode::Holding(Duration::from_millis(4200))).await;

    let (cursor, _) = client_with_timeout(addr, Duration::from_millis(100))
        .services(Some(&Cursor::new("5")), Duration::from_secs(4))
        .await
        .unwrap();

    assert_eq!(cursor, Cursor::new("6"));
}

#[tokio::test]
async fn health_returns_entries() {
    let (addr, _) = spawn_agent(Mode::Healthy).await;

    let (_, entries) = client(addr).health("web").await.unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].service.id, "web-1");
    assert_eq!(entries[0].checks[0].status, "passing");
}

#[tokio::test]
async fn missing_index_is_a_protocol_error() {
    let (addr, _) = spawn_agent(Mode::NoIndex).await;

    let err = client(addr).services(None, Duration::from_secs(1)).await;
    assert!(matches!(err, Err(CatalogError::Protocol(_))));
}

#[tokio::test]
async fn server_error_is_a_protocol_error() {
    let (addr, _) = spawn_agent(Mode::Broken).await;

    let err = client(addr).health("web").await;
    assert!(matches!(err, Err(CatalogError::Protocol(_))));
}

#[tokio::test]
async fn malformed_body_is_a_protocol_error() {
    let (addr, _) = spawn_agent(Mode::Garbage).await;

    let err = client(addr).health("web").await;
    assert!(matches!(err, Err(CatalogError::Protocol(_))));
}

#[tokio::test]
async fn refused_connection_is_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(addr).services(None, Duration::from_secs(1)).await;
    assert!(matches!(err, Err(CatalogError::Unavailable(_))));
}
