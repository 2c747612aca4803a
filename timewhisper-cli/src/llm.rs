//! Chat-completions client for Groq / OpenAI-compatible endpoints.
//!
//! Sends the schedule prompt as a single user turn and returns the whole
//! completion. With `stream = true` the answer arrives as server-sent events;
//! deltas go to an optional sink and the assembled text is returned.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use timewhisper_core::{CompletionClient, CompletionError};

use crate::config::{normalize_model, LlmSection};

/// First retry waits this long; each later retry doubles it up to `MAX_BACKOFF`.
const INITIAL_BACKOFF_MS: u64 = 1000;
const MAX_BACKOFF: Duration = Duration::from_secs(30);
/// Upper bound on `max_retries` from config.
const MAX_RETRIES: u32 = 5;

pub type DeltaSink = Box<dyn Fn(&str) + Send + Sync>;

pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    url: String,
    provider: String,
    model: String,
    api_key: Option<String>,
    temperature: Option<f32>,
    timeout: Duration,
    max_retries: u32,
    initial_backoff: Duration,
    stream: bool,
    on_delta: Option<DeltaSink>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MsgOut,
}

#[derive(Deserialize)]
struct MsgOut {
    content: Option<String>,
}

/// A failed attempt. `partial` is set once streamed text has reached the sink,
/// after which the request is not repeated.
struct AttemptError {
    error: CompletionError,
    partial: bool,
}

impl From<CompletionError> for AttemptError {
    fn from(error: CompletionError) -> Self {
        Self {
            error,
            partial: false,
        }
    }
}

/// One line of an SSE body.
#[derive(Debug, PartialEq)]
enum SseLine {
    Skip,
    Delta(String),
    Done,
}

impl OpenAiCompatibleClient {
    pub fn from_config(cfg: &LlmSection, api_key: Option<String>) -> Result<Self, CompletionError> {
        let timeout = Duration::from_secs(cfg.timeout_secs.max(1));
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        Ok(Self {
            http,
            url: format!("{}/v1/chat/completions", cfg.base_url.trim_end_matches('/')),
            provider: cfg.provider.clone(),
            model: normalize_model(&cfg.model),
            api_key,
            temperature: cfg.temperature,
            timeout,
            max_retries: cfg.max_retries.min(MAX_RETRIES),
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
            stream: cfg.stream,
            on_delta: None,
        })
    }

    /// Receive streamed text as it arrives (only used when streaming is on).
    pub fn with_delta_sink(mut self, sink: DeltaSink) -> Self {
        self.on_delta = Some(sink);
        self
    }

    fn build_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            stream: self.stream,
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> CompletionError {
        if e.is_timeout() {
            CompletionError::Timeout(self.timeout)
        } else {
            CompletionError::Network(e.to_string())
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(MAX_BACKOFF)
    }

    async fn send_once(&self, key: &str, prompt: &str) -> Result<String, AttemptError> {
        let resp = self
            .http
            .post(&self.url)
            .header(AUTHORIZATION, format!("Bearer {key}"))
            .header(CONTENT_TYPE, "application/json")
            .json(&self.build_body(prompt))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            let txt = resp.text().await.unwrap_or_default();
            return Err(CompletionError::Auth(format!("{status} {txt}")).into());
        }
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message: txt,
            }
            .into());
        }

        let text = if self.stream {
            self.read_stream(resp).await?
        } else {
            let body = resp.text().await.map_err(|e| self.map_send_error(e))?;
            extract_content(&body)?
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(CompletionError::InvalidResponse("empty completion".to_string()).into());
        }
        Ok(text.to_string())
    }

    /// Lines are split on raw bytes so a character cut between two network
    /// chunks is decoded whole.
    async fn read_stream(&self, resp: reqwest::Response) -> Result<String, AttemptError> {
        let mut stream = resp.bytes_stream();
        let mut buf: Vec<u8> = Vec::new();
        let mut out = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AttemptError {
                error: self.map_send_error(e),
                partial: !out.is_empty(),
            })?;
            buf.extend_from_slice(&chunk);

            while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buf.drain(..=pos).collect();
                match parse_sse_line(decode_line(&line)?)? {
                    SseLine::Skip => {}
                    SseLine::Delta(t) => self.push_delta(&mut out, &t),
                    SseLine::Done => return Ok(out),
                }
            }
        }

        // Some servers close without [DONE]; a trailing partial line may still hold data.
        if let SseLine::Delta(t) = parse_sse_line(decode_line(&buf)?)? {
            self.push_delta(&mut out, &t);
        }
        Ok(out)
    }

    fn push_delta(&self, out: &mut String, t: &str) {
        if let Some(sink) = &self.on_delta {
            sink(t);
        }
        out.push_str(t);
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatibleClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        if prompt.trim().is_empty() {
            return Err(CompletionError::EmptyPrompt);
        }
        let key = self.api_key.as_deref().ok_or_else(|| {
            let var = crate::auth::env_var_for(&self.provider).unwrap_or("an API key");
            CompletionError::Auth(format!(
                "no {} key configured; set {var} or run: timewhisper auth paste-key",
                self.provider
            ))
        })?;

        debug!(model = %self.model, stream = self.stream, prompt_len = prompt.len(), "complete: called");

        let mut attempt = 0;
        loop {
            match self.send_once(key, prompt).await {
                Ok(text) => {
                    debug!(attempt, len = text.len(), "complete: success");
                    return Ok(text);
                }
                Err(AttemptError { error: e, partial: false })
                    if e.is_retryable() && attempt < self.max_retries =>
                {
                    let backoff = self.backoff(attempt);
                    attempt += 1;
                    warn!(
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "complete: retrying after transient error"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(failed) => return Err(failed.error),
            }
        }
    }
}

fn decode_line(bytes: &[u8]) -> Result<&str, CompletionError> {
    std::str::from_utf8(bytes)
        .map_err(|e| CompletionError::InvalidResponse(format!("stream was not UTF-8: {e}")))
}

/// `choices[0].message.content` of a non-streamed response.
fn extract_content(body: &str) -> Result<String, CompletionError> {
    let out: ChatResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::InvalidResponse(format!("parse completion response: {e}")))?;
    out.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| CompletionError::InvalidResponse("response had no content".to_string()))
}

fn parse_sse_line(line: &str) -> Result<SseLine, CompletionError> {
    let line = line.trim();
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(SseLine::Skip);
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(SseLine::Done);
    }
    if data.is_empty() {
        return Ok(SseLine::Skip);
    }

    let v: Value = serde_json::from_str(data)
        .map_err(|e| CompletionError::InvalidResponse(format!("parse SSE json: {e}")))?;
    // choices[0].delta.content
    match v
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c0| c0.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(|c| c.as_str())
    {
        Some(content) if !content.is_empty() => Ok(SseLine::Delta(content.to_string())),
        _ => Ok(SseLine::Skip),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(stream: bool, temperature: Option<f32>) -> OpenAiCompatibleClient {
        let cfg = LlmSection {
            model: "groq/llama3-8b-8192".to_string(),
            base_url: "https://api.groq.com/openai/".to_string(),
            stream,
            temperature,
            ..LlmSection::default()
        };
        OpenAiCompatibleClient::from_config(&cfg, Some("gsk_test".to_string())).unwrap()
    }

    #[test]
    fn test_request_body_defaults() {
        let c = client(false, None);
        let v = serde_json::to_value(c.build_body("Plan my day")).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "model": "llama3-8b-8192",
                "messages": [{"role": "user", "content": "Plan my day"}],
            })
        );
        assert_eq!(c.url, "https://api.groq.com/openai/v1/chat/completions");
    }

    #[test]
    fn test_request_body_stream_and_temperature() {
        let c = client(true, Some(0.5));
        let v = serde_json::to_value(c.build_body("x")).unwrap();
        assert_eq!(v["stream"], serde_json::json!(true));
        assert_eq!(v["temperature"], serde_json::json!(0.5));
    }

    #[test]
    fn test_extract_content() {
        let body = r#"{"id":"c1","choices":[{"index":0,"message":{"role":"assistant","content":"7:00 AM – Wake"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "7:00 AM – Wake");

        let empty = r#"{"choices":[]}"#;
        assert!(matches!(extract_content(empty), Err(CompletionError::InvalidResponse(_))));
        assert!(matches!(extract_content("<html>"), Err(CompletionError::InvalidResponse(_))));
    }

    #[test]
    fn test_parse_sse_lines() {
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#).unwrap(),
            SseLine::Delta("Hi".to_string())
        );
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap(),
            SseLine::Skip
        );
        assert_eq!(parse_sse_line("data: [DONE]\n").unwrap(), SseLine::Done);
        assert_eq!(parse_sse_line(": keep-alive").unwrap(), SseLine::Skip);
        assert_eq!(parse_sse_line("").unwrap(), SseLine::Skip);
        assert!(parse_sse_line("data: {broken").is_err());
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_before_network() {
        let c = client(false, None);
        assert!(matches!(c.complete("  ").await, Err(CompletionError::EmptyPrompt)));
    }

    #[tokio::test]
    async fn test_missing_key_is_auth_error() {
        let cfg = LlmSection::default();
        let c = OpenAiCompatibleClient::from_config(&cfg, None).unwrap();
        match c.complete("Plan my day").await {
            Err(CompletionError::Auth(msg)) => assert!(msg.contains("GROQ_API_KEY")),
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    mod stub {
        //! A bare HTTP/1.1 server on localhost that answers each connection with
        //! the next scripted reply; the last reply repeats.

        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::time::Duration;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};

        #[derive(Clone)]
        pub struct Reply {
            pieces: Vec<Vec<u8>>,
            pause: Duration,
        }

        pub fn json(status: &str, body: &str) -> Reply {
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            Reply {
                pieces: vec![[head.as_bytes(), body.as_bytes()].concat()],
                pause: Duration::ZERO,
            }
        }

        pub fn completion(content: &str) -> Reply {
            let body = serde_json::json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
            });
            json("200 OK", &body.to_string())
        }

        /// Chunked event stream; each part is one chunk, written `pause` apart.
        pub fn sse(parts: &[&[u8]], pause: Duration) -> Reply {
            let mut pieces = Vec::new();
            for (i, part) in parts.iter().enumerate() {
                let mut piece = if i == 0 {
                    b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n".to_vec()
                } else {
                    Vec::new()
                };
                piece.extend_from_slice(format!("{:x}\r\n", part.len()).as_bytes());
                piece.extend_from_slice(part);
                piece.extend_from_slice(b"\r\n");
                pieces.push(piece);
            }
            if let Some(last) = pieces.last_mut() {
                last.extend_from_slice(b"0\r\n\r\n");
            }
            Reply { pieces, pause }
        }

        async fn read_request(sock: &mut TcpStream) {
            let mut buf = Vec::new();
            let mut tmp = [0u8; 4096];
            loop {
                let n = match sock.read(&mut tmp).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => n,
                };
                buf.extend_from_slice(&tmp[..n]);
                if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                    let len = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + len {
                        return;
                    }
                }
            }
        }

        /// Returns the base URL and a count of requests served.
        pub async fn serve(replies: Vec<Reply>) -> (String, Arc<AtomicUsize>) {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let hits = Arc::new(AtomicUsize::new(0));
            let counter = hits.clone();
            tokio::spawn(async move {
                while let Ok((mut sock, _)) = listener.accept().await {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    let reply = replies[n.min(replies.len() - 1)].clone();
                    tokio::spawn(async move {
                        read_request(&mut sock).await;
                        for (i, piece) in reply.pieces.iter().enumerate() {
                            if i > 0 {
                                tokio::time::sleep(reply.pause).await;
                            }
                            if sock.write_all(piece).await.is_err() {
                                return;
                            }
                            sock.flush().await.ok();
                        }
                    });
                }
            });
            (format!("http://{addr}"), hits)
        }
    }

    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};

    fn stub_client(base_url: &str, stream: bool, max_retries: u32) -> OpenAiCompatibleClient {
        let cfg = LlmSection {
            base_url: base_url.to_string(),
            stream,
            max_retries,
            ..LlmSection::default()
        };
        let mut c = OpenAiCompatibleClient::from_config(&cfg, Some("gsk_test".to_string())).unwrap();
        c.http = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        c.initial_backoff = Duration::from_millis(5);
        c
    }

    fn delta(content: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"delta": {"content": content}}]})
        )
    }

    #[tokio::test]
    async fn test_stream_keeps_character_split_across_chunks() {
        let event = format!("{}data: [DONE]\n\n", delta("7:00 AM – Gym"));
        let bytes = event.as_bytes();
        // Cut right after the first byte of the en dash.
        let cut = event.find('–').unwrap() + 1;
        let (url, _) = stub::serve(vec![stub::sse(
            &[&bytes[..cut], &bytes[cut..]],
            Duration::from_millis(20),
        )])
        .await;

        let seen = Arc::new(Mutex::new(String::new()));
        let sink_seen = seen.clone();
        let c = stub_client(&url, true, 0).with_delta_sink(Box::new(move |t: &str| {
            sink_seen.lock().unwrap().push_str(t);
        }));

        assert_eq!(c.complete("Plan my day").await.unwrap(), "7:00 AM – Gym");
        assert_eq!(*seen.lock().unwrap(), "7:00 AM – Gym");
    }

    #[tokio::test]
    async fn test_stream_assembles_deltas_without_done() {
        let first = delta("9:00 AM – Write");
        let second = delta(" essay ✍️");
        // The last event has no terminating newline.
        let tail = second.trim_end();
        let (url, _) = stub::serve(vec![stub::sse(
            &[first.as_bytes(), &b": keep-alive\n\n"[..], tail.as_bytes()],
            Duration::from_millis(10),
        )])
        .await;

        let c = stub_client(&url, true, 0);
        assert_eq!(c.complete("Plan my day").await.unwrap(), "9:00 AM – Write essay ✍️");
    }

    #[tokio::test]
    async fn test_transient_statuses_are_retried() {
        let (url, hits) = stub::serve(vec![
            stub::json("408 Request Timeout", "{}"),
            stub::json("429 Too Many Requests", r#"{"error":"slow down"}"#),
            stub::json("503 Service Unavailable", "{}"),
            stub::completion("8:00 AM – Deep work"),
        ])
        .await;

        let c = stub_client(&url, false, 3);
        assert_eq!(c.complete("Plan my day").await.unwrap(), "8:00 AM – Deep work");
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_retries_stop_at_max() {
        let (url, hits) = stub::serve(vec![stub::json("500 Internal Server Error", "boom")]).await;

        let c = stub_client(&url, false, 2);
        match c.complete("Plan my day").await {
            Err(CompletionError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("expected api error, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_auth_status_is_not_retried() {
        let (url, hits) = stub::serve(vec![stub::json("401 Unauthorized", "bad key")]).await;
        let c = stub_client(&url, false, 2);
        match c.complete("Plan my day").await {
            Err(CompletionError::Auth(msg)) => assert!(msg.contains("bad key")),
            other => panic!("expected auth error, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let (url, hits) = stub::serve(vec![stub::json("403 Forbidden", "")]).await;
        let c = stub_client(&url, false, 2);
        assert!(matches!(c.complete("Plan my day").await, Err(CompletionError::Auth(_))));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_completion_is_invalid() {
        let (url, hits) = stub::serve(vec![stub::completion("  \n ")]).await;
        let c = stub_client(&url, false, 2);
        assert!(matches!(
            c.complete("Plan my day").await,
            Err(CompletionError::InvalidResponse(_))
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stream_stall_is_timeout_and_not_retried() {
        let first = delta("7:00 AM");
        let (url, hits) = stub::serve(vec![stub::sse(
            &[first.as_bytes(), &b"data: [DONE]\n\n"[..]],
            Duration::from_secs(3),
        )])
        .await;

        let mut c = stub_client(&url, true, 2);
        c.http = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_millis(300))
            .build()
            .unwrap();
        assert!(matches!(c.complete("Plan my day").await, Err(CompletionError::Timeout(_))));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_doubles_and_is_capped() {
        let cfg = LlmSection {
            max_retries: 1000,
            ..LlmSection::default()
        };
        let c = OpenAiCompatibleClient::from_config(&cfg, None).unwrap();
        assert_eq!(c.max_retries, MAX_RETRIES);
        assert_eq!(c.backoff(0), Duration::from_secs(1));
        assert_eq!(c.backoff(1), Duration::from_secs(2));
        assert_eq!(c.backoff(40), MAX_BACKOFF);
    }
}
