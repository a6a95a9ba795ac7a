//! End-to-end relay behaviour against a mock completion endpoint.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use palabra_bot::llm::LlmProvider;
use palabra_bot::llm::providers::openai_compatible::OpenAiCompatibleProvider;
use palabra_bot::relay::{GENERIC_ERROR, INVALID_WORD, PLEASE_START, Reply, ReplyFormat, WordRelay};
use palabra_bot::session::{Phase, UserKey};

const USER: UserKey = UserKey(1001);

fn relay_for(server: &MockServer, timeout: Duration) -> WordRelay {
    let provider = OpenAiCompatibleProvider::new(
        format!("{}/chat/completions", server.uri()),
        "deepseek-chat".into(),
        None,
        timeout,
        Some("sk-test".into()),
    )
    .unwrap();
    WordRelay::new(LlmProvider::OpenAiCompatible(provider))
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    }))
}

/// Formatted log output of everything emitted on the test thread.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn lines_at(&self, level: &str) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .filter(|line| line.trim_start().starts_with(level))
            .map(str::to_string)
            .collect()
    }
}

async fn sent_prompts(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|req| {
            let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
            assert_eq!(body["model"], "deepseek-chat");
            assert_eq!(body["stream"], false);
            assert_eq!(body["messages"][0]["role"], "user");
            body["messages"][0]["content"].as_str().unwrap().to_string()
        })
        .collect()
}

#[tokio::test]
async fn text_before_start_makes_no_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(completion("x")).expect(0).mount(&server).await;

    let relay = relay_for(&server, Duration::from_secs(5));
    let replies = relay.handle_text(USER, "hello").await;

    assert_eq!(replies, vec![Reply::plain(PLEASE_START)]);
    assert_eq!(relay.sessions().get(USER), None);
}

#[tokio::test]
async fn invalid_input_makes_no_call_and_keeps_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(completion("x")).expect(0).mount(&server).await;

    let relay = relay_for(&server, Duration::from_secs(5));
    relay.start(USER);

    for input in ["test123", "hola!", "x_y", "   "] {
        let replies = relay.handle_text(USER, input).await;
        assert_eq!(replies, vec![Reply::plain(INVALID_WORD)], "input {input:?}");
        assert_eq!(relay.sessions().get(USER), Some(Phase::AwaitingWord));
    }
}

#[tokio::test]
async fn valid_word_makes_exactly_one_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(completion("🔤 **Palabra en inglés**: hello"))
        .expect(1)
        .mount(&server)
        .await;

    let relay = relay_for(&server, Duration::from_secs(5));
    relay.start(USER);
    let replies = relay.handle_text(USER, "Hello").await;

    assert_eq!(replies, vec![Reply::markdown("🔤 **Palabra en inglés**: hello")]);
    assert_eq!(relay.sessions().get(USER), Some(Phase::AwaitingWord));

    let prompts = sent_prompts(&server).await;
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("'hello'"));
    assert!(!prompts[0].contains("Hello"));
}

#[tokio::test]
async fn timeout_gives_generic_error_and_reopens_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("too late").set_delay(Duration::from_secs(2)))
        .expect(1)
        .mount(&server)
        .await;

    let relay = relay_for(&server, Duration::from_millis(200));
    relay.start(USER);
    let replies = relay.handle_text(USER, "slow").await;

    assert_eq!(replies, vec![Reply::plain(GENERIC_ERROR)]);
    assert_eq!(relay.sessions().get(USER), Some(Phase::AwaitingWord));
}

#[tokio::test]
async fn http_error_gives_generic_error_and_reopens_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&server)
        .await;

    let relay = relay_for(&server, Duration::from_secs(5));
    relay.start(USER);
    let replies = relay.handle_text(USER, "busy").await;

    assert_eq!(replies, vec![Reply::plain(GENERIC_ERROR)]);
    assert_eq!(relay.sessions().get(USER), Some(Phase::AwaitingWord));
}

#[tokio::test]
async fn upstream_failure_is_logged_at_error_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .without_time()
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let relay = relay_for(&server, Duration::from_secs(5));
    relay.start(USER);
    let replies = relay.handle_text(USER, "hello").await;
    assert_eq!(replies, vec![Reply::plain(GENERIC_ERROR)]);

    let errors = logs.lines_at("ERROR");
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].contains("word=hello"));
    assert!(errors[0].contains("503"));
    assert!(
        logs.lines_at("DEBUG")
            .iter()
            .any(|line| line.contains("completion request returned HTTP error"))
    );
}

#[tokio::test]
async fn success_and_failure_leave_the_same_phase() {
    let ok_server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(completion("ok")).mount(&ok_server).await;
    let bad_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&bad_server)
        .await;

    let ok_relay = relay_for(&ok_server, Duration::from_secs(5));
    let bad_relay = relay_for(&bad_server, Duration::from_secs(5));
    ok_relay.start(USER);
    bad_relay.start(USER);

    ok_relay.handle_text(USER, "tree").await;
    bad_relay.handle_text(USER, "tree").await;

    assert_eq!(ok_relay.sessions().get(USER), bad_relay.sessions().get(USER));
    assert_eq!(ok_relay.sessions().get(USER), Some(Phase::AwaitingWord));
}

#[tokio::test]
async fn long_reply_is_split_into_ordered_chunks() {
    let content: String = (0..9000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(completion(&content)).expect(1).mount(&server).await;

    let relay = relay_for(&server, Duration::from_secs(5));
    relay.start(USER);
    let replies = relay.handle_text(USER, "alphabet").await;

    assert_eq!(replies.len(), 3);
    assert!(replies.iter().all(|r| r.format == ReplyFormat::Markdown));
    assert!(replies.iter().all(|r| r.text.chars().count() <= 4096));
    let joined: String = replies.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(joined, content);
}

#[tokio::test]
async fn session_accepts_several_words_in_a_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(completion("ok")).expect(2).mount(&server).await;

    let relay = relay_for(&server, Duration::from_secs(5));
    relay.start(USER);
    relay.handle_text(USER, "cat").await;
    relay.handle_text(USER, "dog").await;

    let prompts = sent_prompts(&server).await;
    assert!(prompts[0].contains("'cat'"));
    assert!(prompts[1].contains("'dog'"));
}
