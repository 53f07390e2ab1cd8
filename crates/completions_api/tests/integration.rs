use std::sync::{Arc, Mutex};

use completions_api::{
    CompletionRequest, CompletionsApiClient, CompletionsApiConfig, CompletionsApiError,
    WireMessage,
};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

struct ScriptedServer {
    base_url: String,
    captured_body: Arc<Mutex<Option<String>>>,
    handle: JoinHandle<()>,
}

impl ScriptedServer {
    async fn new(status: u16, body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("local TCP listener should bind");
        let addr = listener
            .local_addr()
            .expect("resolved local listener address");
        let captured_body = Arc::new(Mutex::new(None));

        let handle = tokio::spawn({
            let captured_body = Arc::clone(&captured_body);
            async move {
                if let Ok((socket, _)) = listener.accept().await {
                    serve_one(socket, status, body, captured_body).await;
                }
            }
        });

        Self {
            base_url: format!("http://{addr}/v1"),
            captured_body,
            handle,
        }
    }

    fn captured_json(&self) -> Value {
        let body = self
            .captured_body
            .lock()
            .expect("captured body lock")
            .clone()
            .expect("server should have captured a request body");
        serde_json::from_str(&body).expect("request body should be JSON")
    }
}

impl Drop for ScriptedServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_one(
    mut socket: TcpStream,
    status: u16,
    body: &'static str,
    captured_body: Arc<Mutex<Option<String>>>,
) {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    let (header_end, content_length) = loop {
        let read = socket.read(&mut chunk).await.expect("read request");
        if read == 0 {
            return;
        }
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(position) = find_header_end(&buffer) {
            let headers = String::from_utf8_lossy(&buffer[..position]).to_ascii_lowercase();
            let length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            break (position + 4, length);
        }
    };

    while buffer.len() < header_end + content_length {
        let read = socket.read(&mut chunk).await.expect("read request body");
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
    }
    let request_body = String::from_utf8_lossy(&buffer[header_end..]).into_owned();
    *captured_body.lock().expect("captured body lock") = Some(request_body);

    let response = format!(
        "HTTP/1.1 {status} Scripted\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    socket
        .write_all(response.as_bytes())
        .await
        .expect("write response");
    let _ = socket.shutdown().await;
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

fn hello_request() -> CompletionRequest {
    CompletionRequest::new("gpt-test", vec![WireMessage::new("user", "hello")])
}

#[tokio::test]
async fn complete_posts_conversation_and_parses_choices() {
    let server = ScriptedServer::new(
        200,
        r#"{"choices":[{"message":{"role":"assistant","content":"hi there"}}]}"#,
    )
    .await;
    let client =
        CompletionsApiClient::new(CompletionsApiConfig::new(&server.base_url)).expect("client");

    let response = client
        .complete(&hello_request())
        .await
        .expect("completion should succeed");

    assert_eq!(response.choices.len(), 1);
    assert_eq!(
        response.choices[0].message.content.as_deref(),
        Some("hi there")
    );
    let sent = server.captured_json();
    assert_eq!(sent["model"], "gpt-test");
    assert_eq!(sent["messages"][0]["content"], "hello");
}

#[tokio::test]
async fn non_success_status_surfaces_upstream_message() {
    let server = ScriptedServer::new(
        401,
        r#"{"error":{"message":"bad key","type":"auth_error"}}"#,
    )
    .await;
    let client =
        CompletionsApiClient::new(CompletionsApiConfig::new(&server.base_url)).expect("client");

    let error = client
        .complete(&hello_request())
        .await
        .expect_err("401 must fail");

    match error {
        CompletionsApiError::Status(status, message) => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(message, "bad key (auth_error)");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_success_body_is_malformed() {
    let server = ScriptedServer::new(200, "<html>gateway</html>").await;
    let client =
        CompletionsApiClient::new(CompletionsApiConfig::new(&server.base_url)).expect("client");

    let error = client
        .complete(&hello_request())
        .await
        .expect_err("non-json body must fail");

    assert!(matches!(error, CompletionsApiError::MalformedResponse(_)));
}
