//! Shared test infrastructure
//!
//! - [`MockBackend`]: a one-connection WebSocket server the test drives by hand
//! - [`ChannelView`]: a chat view that reports every change on a channel
//! - catalog and model-description fixtures for wiremock

// Each test binary uses a different subset
#![allow(dead_code)]

use std::io::Cursor;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use virtu_avatar::core::catalog::ModelEntry;
use virtu_avatar::core::expression::{ExpressionControl, ExpressionPanel};
use virtu_avatar::core::selectors::{Selector, SelectorKind};
use virtu_avatar::core::session::{ChatView, SessionStatus};
use virtu_avatar::core::transcript::ChatEntry;

pub const WAIT: Duration = Duration::from_secs(5);

// =============================================================================
// Mock WebSocket backend
// =============================================================================

/// Accepts a single client and relays frames between it and the test.
pub struct MockBackend {
    pub url: String,
    to_client: mpsc::UnboundedSender<Message>,
    from_client: mpsc::UnboundedReceiver<Message>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/virtupy/ws", listener.local_addr().unwrap());

        let (to_client, mut outbound) = mpsc::unbounded_channel::<Message>();
        let (inbound, from_client) = mpsc::unbounded_channel::<Message>();

        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let Ok(ws_stream) = accept_async(stream).await else {
                return;
            };
            let (mut write, mut read) = ws_stream.split();

            loop {
                tokio::select! {
                    Some(msg) = outbound.recv() => {
                        let closing = matches!(msg, Message::Close(_));
                        if write.send(msg).await.is_err() || closing {
                            break;
                        }
                    }
                    msg = read.next() => match msg {
                        Some(Ok(msg)) => {
                            let _ = inbound.send(msg);
                        }
                        Some(Err(_)) | None => break,
                    },
                }
            }
        });

        Self {
            url,
            to_client,
            from_client,
        }
    }

    pub fn send(&self, msg: Message) {
        self.to_client.send(msg).unwrap();
    }

    pub fn send_json(&self, value: Value) {
        self.send(Message::Text(value.to_string().into()));
    }

    pub fn send_audio(&self, data: Vec<u8>) {
        self.send(Message::Binary(data.into()));
    }

    /// Close the socket from the server side.
    pub fn close(&self) {
        self.send(Message::Close(None));
    }

    /// Next frame from the client.
    pub async fn next_message(&mut self) -> Message {
        timeout(WAIT, self.from_client.recv())
            .await
            .expect("timed out waiting for client frame")
            .expect("backend task ended")
    }

    /// Next text frame from the client, skipping control frames.
    pub async fn next_text(&mut self) -> String {
        loop {
            if let Message::Text(text) = self.next_message().await {
                return text.to_string();
            }
        }
    }

    pub async fn next_json(&mut self) -> Value {
        serde_json::from_str(&self.next_text().await).expect("client sent non-JSON text")
    }
}

// =============================================================================
// Recording view
// =============================================================================

/// What a [`ChannelView`] saw.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    EntryAdded(usize, String),
    EntryExtended(usize, String),
    StreamClosed(usize),
    Typing(bool),
    Panel(Vec<String>),
    ActiveExpression(Option<String>),
    Selector(SelectorKind, Option<String>, bool),
    ModelReady(String),
    Disconnected(Option<String>),
    Status(SessionStatus),
}

pub struct ChannelView(mpsc::UnboundedSender<ViewEvent>);

impl ChannelView {
    pub fn new() -> (Box<Self>, ViewEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Box::new(Self(tx)), ViewEvents::new(rx))
    }

    fn emit(&self, event: ViewEvent) {
        let _ = self.0.send(event);
    }
}

impl ChatView for ChannelView {
    fn entry_added(&mut self, index: usize, entry: &ChatEntry) {
        self.emit(ViewEvent::EntryAdded(index, entry.text.clone()));
    }

    fn entry_extended(&mut self, index: usize, fragment: &str) {
        self.emit(ViewEvent::EntryExtended(index, fragment.to_string()));
    }

    fn stream_closed(&mut self, index: usize) {
        self.emit(ViewEvent::StreamClosed(index));
    }

    fn typing_changed(&mut self, typing: bool) {
        self.emit(ViewEvent::Typing(typing));
    }

    fn panel_changed(&mut self, panel: &ExpressionPanel) {
        let labels = panel.controls().iter().map(|c| c.label.clone()).collect();
        self.emit(ViewEvent::Panel(labels));
    }

    fn active_expression_changed(&mut self, control: Option<&ExpressionControl>) {
        self.emit(ViewEvent::ActiveExpression(control.map(|c| c.label.clone())));
    }

    fn selector_changed(&mut self, kind: SelectorKind, selector: &Selector) {
        self.emit(ViewEvent::Selector(
            kind,
            selector.value().map(str::to_string),
            selector.is_disabled(),
        ));
    }

    fn model_ready(&mut self, key: &str, _entry: &ModelEntry) {
        self.emit(ViewEvent::ModelReady(key.to_string()));
    }

    fn disconnected(&mut self, reason: Option<&str>) {
        self.emit(ViewEvent::Disconnected(reason.map(str::to_string)));
    }

    fn status(&mut self, status: &SessionStatus) {
        self.emit(ViewEvent::Status(status.clone()));
    }
}

pub struct ViewEvents {
    rx: mpsc::UnboundedReceiver<ViewEvent>,
    seen: Vec<ViewEvent>,
}

impl ViewEvents {
    fn new(rx: mpsc::UnboundedReceiver<ViewEvent>) -> Self {
        Self {
            rx,
            seen: Vec::new(),
        }
    }

    async fn next(&mut self) -> ViewEvent {
        let event = self.rx.recv().await.expect("view dropped");
        self.seen.push(event.clone());
        event
    }

    /// Skip events until one matches.
    pub async fn wait_for(&mut self, mut predicate: impl FnMut(&ViewEvent) -> bool) -> ViewEvent {
        timeout(WAIT, async {
            loop {
                let event = self.next().await;
                if predicate(&event) {
                    return event;
                }
            }
        })
        .await
        .expect("timed out waiting for view event")
    }

    /// Like [`Self::wait_for`], but also matches events already skipped.
    pub async fn seen_or_wait(
        &mut self,
        mut predicate: impl FnMut(&ViewEvent) -> bool,
    ) -> ViewEvent {
        if let Some(event) = self.seen.iter().find(|e| predicate(*e)) {
            return event.clone();
        }
        self.wait_for(predicate).await
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Cubism 4 description with two embedded expressions.
pub const HARU_DESCRIPTION: &str = r#"{
    "Version": 3,
    "FileReferences": {
        "Moc": "haru.moc3",
        "Expressions": [
            {"Name": "F01", "File": "expressions/F01.exp3.json"},
            {"Name": "F04", "File": "expressions/F04.exp3.json"}
        ]
    }
}"#;

pub fn models_json() -> Value {
    json!({
        "haru": {
            "name": "Haru",
            "url": "/models/haru/haru.model3.json",
            "expressions": {"happy": "F04", "neutral": "F01"}
        },
        "hiyori": {
            "name": "Hiyori",
            "url": "/models/hiyori/hiyori.model3.json"
        }
    })
}

pub fn voices_json() -> Value {
    json!({
        "available": {
            "en": ["Jenny", "Guy"],
            "ru": ["Svetlana"]
        },
        "current": {"language": "en", "speaker": "Jenny"}
    })
}

pub fn llms_json() -> Value {
    json!({"available": ["llama3", "mistral"], "current": "llama3"})
}

/// Catalog endpoints and model descriptions on one wiremock server.
pub async fn catalog_server() -> MockServer {
    let server = MockServer::start().await;

    let routes = [
        ("/virtupy/api/models", models_json()),
        ("/virtupy/api/voices", voices_json()),
        ("/virtupy/api/llm", llms_json()),
    ];
    for (route, body) in routes {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
    }

    for model in ["haru", "hiyori"] {
        Mock::given(method("GET"))
            .and(path(format!("/models/{model}/{model}.model3.json")))
            .respond_with(ResponseTemplate::new(200).set_body_string(HARU_DESCRIPTION))
            .mount(&server)
            .await;
    }

    server
}

/// Mono 16-bit silent WAV lasting `millis`.
pub fn silent_wav(millis: u32) -> Vec<u8> {
    let sample_rate = 8000;
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..(sample_rate * millis / 1000) {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}
