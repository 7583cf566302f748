use std::time::Duration;

use harag_core::error::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    timeout: Option<Duration>,
}

impl OllamaClient {
    /// Create a client for Ollama. This is strictly limited to `127.0.0.1`.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim_end_matches('/').to_string();

        let invalid = || {
            AppError::new(
                "AI_REMOTE_NOT_ALLOWED",
                "Ollama base URL must be localhost (127.0.0.1)",
            )
            .with_details(format!("base_url={base_url}"))
        };

        if base_url != "http://127.0.0.1" {
            let port = base_url
                .strip_prefix("http://127.0.0.1:")
                .ok_or_else(invalid)?;
            // Only a numeric, non-zero port may follow; rejects `127.0.0.1.evil.com` style hosts.
            match port.parse::<u16>() {
                Ok(p) if p != 0 && port.chars().all(|c| c.is_ascii_digit()) => {}
                _ => return Err(invalid()),
            }
        }

        Ok(Self {
            base_url,
            timeout: None,
        })
    }

    /// Per-request timeout. Unset means requests wait as long as the server takes.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn health_check(&self) -> Result<(), AppError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = ureq::get(&url)
            .timeout(Duration::from_millis(800))
            .call();

        match resp {
            Ok(r) if r.status() == 200 => Ok(()),
            Ok(r) => Err(
                AppError::new("AI_OLLAMA_UNHEALTHY", "Ollama health check failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(ureq::Error::Status(status, _)) => Err(
                AppError::new("AI_OLLAMA_UNHEALTHY", "Ollama health check failed")
                    .with_details(format!("status={status}")),
            ),
            Err(e) => Err(AppError::new(
                "AI_OLLAMA_UNREACHABLE",
                "Failed to reach Ollama on 127.0.0.1",
            )
            .with_details(e.to_string())
            .with_retryable(true)),
        }
    }

    /// POST a JSON body to `path` and decode the JSON reply. Failures carry `code`.
    pub(crate) fn post_json<Req, Resp>(&self, path: &str, body: &Req, code: &str) -> Result<Resp, AppError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let value = serde_json::to_value(body).map_err(|e| {
            AppError::new(code, "Failed to encode Ollama request").with_details(e.to_string())
        })?;

        let mut req = ureq::post(&url);
        if let Some(t) = self.timeout {
            req = req.timeout(t);
        }

        match req.send_json(value) {
            Ok(r) if r.status() == 200 => r.into_json::<Resp>().map_err(|e| {
                AppError::new(code, "Failed to decode Ollama response")
                    .with_details(format!("url={url}; err={e}"))
            }),
            Ok(r) => Err(AppError::new(code, "Ollama request failed")
                .with_details(format!("url={url}; status={}", r.status()))),
            Err(ureq::Error::Status(status, _)) => Err(AppError::new(code, "Ollama request failed")
                .with_details(format!("url={url}; status={status}"))),
            Err(e) => Err(AppError::new(code, "Failed to call Ollama endpoint")
                .with_details(format!("url={url}; err={e}"))
                .with_retryable(true)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::OllamaClient;

    fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    /// Answers a single request with `status_line` and an empty body.
    fn serve_once(status_line: &'static str) -> (u16, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1024];
            let mut request = Vec::new();
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            assert!(request.starts_with(b"GET /api/tags"));
            let reply = format!("HTTP/1.1 {status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
            stream.write_all(reply.as_bytes()).unwrap();
        });
        (port, handle)
    }

    #[test]
    fn health_check_accepts_ok_reply() {
        let (port, server) = serve_once("200 OK");
        let client = OllamaClient::new(&format!("http://127.0.0.1:{port}")).unwrap();
        assert!(client.health_check().is_ok());
        server.join().unwrap();
    }

    #[test]
    fn health_check_reports_error_status() {
        let (port, server) = serve_once("500 Internal Server Error");
        let client = OllamaClient::new(&format!("http://127.0.0.1:{port}")).unwrap();
        let err = client.health_check().unwrap_err();
        assert_eq!(err.code, "AI_OLLAMA_UNHEALTHY");
        server.join().unwrap();
    }

    #[test]
    fn health_check_reports_unreachable_server() {
        let client = OllamaClient::new(&format!("http://127.0.0.1:{}", closed_port())).unwrap();
        let err = client.health_check().unwrap_err();
        assert_eq!(err.code, "AI_OLLAMA_UNREACHABLE");
        assert!(err.retryable);
    }

    #[test]
    fn enforces_localhost_only_base_url() {
        assert!(OllamaClient::new("http://127.0.0.1:11434").is_ok());
        assert!(OllamaClient::new("http://127.0.0.1").is_ok());
        assert!(OllamaClient::new("http://127.0.0.1:11434/").is_ok());

        assert!(OllamaClient::new("http://localhost:11434").is_err());
        assert!(OllamaClient::new("http://0.0.0.0:11434").is_err());
        assert!(OllamaClient::new("https://example.com").is_err());
        assert!(OllamaClient::new("http://127.0.0.1.evil.com:11434").is_err());
        assert!(OllamaClient::new("http://127.0.0.1@evil.com:11434").is_err());
        assert!(OllamaClient::new("http://127.0.0.1:").is_err());
        assert!(OllamaClient::new("http://127.0.0.1:0").is_err());
        assert!(OllamaClient::new("http://127.0.0.1:+80").is_err());
        assert!(OllamaClient::new("http://127.0.0.1:11434/api").is_err());
    }

    #[test]
    fn trims_trailing_slash() {
        let c = OllamaClient::new("http://127.0.0.1:11434/").unwrap();
        assert_eq!(c.base_url(), "http://127.0.0.1:11434");
    }
}
