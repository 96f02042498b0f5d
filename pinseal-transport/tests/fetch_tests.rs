mod support;

use pinseal_crypto::{ContentEncryption, CryptoError, KeyFormat};
use pinseal_transport::pipeline::load_public_key_file;
use pinseal_transport::{PinsealConfig, TokenFetcher, TransportError, fetch_and_open, seal_json};
use pretty_assertions::assert_eq;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use support::{PINS_JSON, fixture_path};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn setup(server: &MockServer) -> PinsealConfig {
    PinsealConfig {
        private_key_path: Some(fixture_path("rsa2048_private.pem")),
        remote_url: Some(format!("{}/ssl-pinning", server.uri())),
        allow_insecure_http: true,
        request_timeout_secs: 5,
        ..PinsealConfig::default()
    }
}

fn sealed_for(key: &str) -> String {
    let public = load_public_key_file(&fixture_path(key), KeyFormat::Pem).unwrap();
    seal_json(PINS_JSON.as_bytes(), &public, ContentEncryption::A256Gcm).unwrap()
}

async fn serve(server: &MockServer, body: String) {
    Mock::given(method("GET"))
        .and(path("/ssl-pinning"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

// --- Fetcher ---

#[tokio::test]
async fn fetch_trims_surrounding_whitespace() {
    let server = MockServer::start().await;
    let token = sealed_for("rsa2048_public.pem");
    serve(&server, format!("{token}\n")).await;

    let config = setup(&server);
    let fetcher = TokenFetcher::new(&config).unwrap();
    let body = fetcher.fetch(config.remote_url.as_deref().unwrap()).await.unwrap();
    assert_eq!(body, token.as_bytes());
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ssl-pinning"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = setup(&server);
    let result = TokenFetcher::new(&config)
        .unwrap()
        .fetch(config.remote_url.as_deref().unwrap())
        .await;
    assert!(matches!(result, Err(TransportError::Status(404))));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let server = MockServer::start().await;
    serve(&server, "A".repeat(4096)).await;

    let config = PinsealConfig {
        max_token_bytes: 1024,
        ..setup(&server)
    };
    let result = TokenFetcher::new(&config)
        .unwrap()
        .fetch(config.remote_url.as_deref().unwrap())
        .await;
    assert!(matches!(
        result,
        Err(TransportError::TooLarge { limit: 1024, .. })
    ));
}

#[tokio::test]
async fn plain_http_is_refused_without_opt_in() {
    let server = MockServer::start().await;
    serve(&server, sealed_for("rsa2048_public.pem")).await;

    let config = PinsealConfig {
        allow_insecure_http: false,
        ..setup(&server)
    };
    let result = TokenFetcher::new(&config)
        .unwrap()
        .fetch(config.remote_url.as_deref().unwrap())
        .await;
    assert!(matches!(result, Err(TransportError::InsecureUrl(_))));
}

#[tokio::test]
async fn redirects_are_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ssl-pinning"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/v2/ssl-pinning", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/ssl-pinning"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sealed_for("rsa2048_public.pem")))
        .mount(&server)
        .await;

    let document = fetch_and_open(&setup(&server)).await.unwrap();
    assert_eq!(document, serde_json::from_str::<serde_json::Value>(PINS_JSON).unwrap());
}

#[tokio::test]
async fn endless_redirect_chain_is_cut_off() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ssl-pinning"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/ssl-pinning", server.uri())),
        )
        .mount(&server)
        .await;

    let result = fetch_and_open(&setup(&server)).await;
    assert!(matches!(result, Err(TransportError::Http(_))), "got {result:?}");
}

/// Serves one response with no `Content-Length`, delimited by connection close.
fn serve_unsized_once(body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        let _ = stream.write_all(b"HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n");
        let _ = stream.write_all(&body);
    });
    format!("http://{addr}/ssl-pinning")
}

#[tokio::test]
async fn unsized_body_is_capped_while_streaming() {
    let url = serve_unsized_once(vec![b'A'; 4096]);
    let config = PinsealConfig {
        max_token_bytes: 1024,
        allow_insecure_http: true,
        request_timeout_secs: 5,
        ..PinsealConfig::default()
    };

    let result = TokenFetcher::new(&config).unwrap().fetch(&url).await;
    assert!(
        matches!(result, Err(TransportError::TooLarge { limit: 1024, .. })),
        "got {result:?}"
    );
}

#[tokio::test]
async fn unsized_body_within_limit_is_read_to_close() {
    let token = sealed_for("rsa2048_public.pem");
    let url = serve_unsized_once(format!("{token}\n").into_bytes());
    let config = PinsealConfig {
        allow_insecure_http: true,
        request_timeout_secs: 5,
        ..PinsealConfig::default()
    };

    let body = TokenFetcher::new(&config).unwrap().fetch(&url).await.unwrap();
    assert_eq!(body, token.as_bytes());
}

// --- Fetch and open ---

#[tokio::test]
async fn fetch_and_open_roundtrip() {
    let server = MockServer::start().await;
    serve(&server, sealed_for("rsa2048_public.pem")).await;

    let document = fetch_and_open(&setup(&server)).await.unwrap();
    assert_eq!(document["pins"][1], "BB==");
}

#[tokio::test]
async fn token_for_another_recipient_fails_opaquely() {
    let server = MockServer::start().await;
    serve(&server, sealed_for("rsa2048_other_public.pem")).await;

    let err = fetch_and_open(&setup(&server)).await.unwrap_err();
    assert_eq!(err.to_string(), "decryption failed");
}

#[tokio::test]
async fn garbage_body_is_malformed() {
    let server = MockServer::start().await;
    serve(&server, "<html>not a token</html>".to_string()).await;

    let result = fetch_and_open(&setup(&server)).await;
    assert!(matches!(
        result,
        Err(TransportError::Crypto(CryptoError::MalformedEnvelope(_)))
    ));
}

#[tokio::test]
async fn unreachable_server_is_http_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = PinsealConfig {
        private_key_path: Some(fixture_path("rsa2048_private.pem")),
        remote_url: Some(format!("http://127.0.0.1:{port}/ssl-pinning")),
        allow_insecure_http: true,
        request_timeout_secs: 5,
        ..PinsealConfig::default()
    };
    let result = fetch_and_open(&config).await;
    assert!(matches!(result, Err(TransportError::Http(_))), "got {result:?}");
}
