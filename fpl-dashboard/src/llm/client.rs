// Streaming narrative client for the Anthropic Messages API.
//
// A request is posted with `stream: true` and the server-sent events are
// decoded into typed `StreamEvent`s. `StreamState` folds them into the text,
// token usage, stop reason and web sources of one answer, and the client
// forwards each text fragment and the final result as `LlmEvent`s.

use futures_util::StreamExt;
use reqwest_eventsource::{Event, EventSource, RequestBuilderExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::Config;
use crate::llm::results::GroundingSource;
use crate::protocol::LlmEvent;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const WEB_SEARCH_TOOL: &str = "web_search_20250305";
const WEB_SEARCH_MAX_USES: u32 = 5;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One narrative request.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    pub system: String,
    pub user_content: String,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Attach the server-side web search tool.
    pub web_search: bool,
}

// ---------------------------------------------------------------------------
// Stream events
// ---------------------------------------------------------------------------

/// The stream events the client acts on. Pings, block stops and anything
/// newer fall into `Other`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    MessageStart {
        message: StartedMessage,
    },
    ContentBlockStart {
        content_block: ContentBlock,
    },
    ContentBlockDelta {
        delta: Delta,
    },
    MessageDelta {
        #[serde(default)]
        delta: MessageDeltaBody,
        #[serde(default)]
        usage: Usage,
    },
    MessageStop,
    Error {
        error: ApiError,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct StartedMessage {
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    WebSearchToolResult {
        content: SearchContent,
    },
    #[serde(other)]
    Other,
}

/// Search results, or an error object when the search itself failed.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchContent {
    Results(Vec<SourceRef>),
    Failed(Value),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Delta {
    TextDelta { text: String },
    CitationsDelta { citation: SourceRef },
    #[serde(other)]
    Other,
}

/// A web page, as it appears in search results and citations.
#[derive(Debug, Deserialize)]
struct SourceRef {
    url: Option<String>,
    title: Option<String>,
}

impl SourceRef {
    fn into_source(self) -> Option<GroundingSource> {
        let uri = self.url.filter(|u| !u.is_empty())?;
        Some(GroundingSource {
            uri,
            title: self.title.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct MessageDeltaBody {
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

// ---------------------------------------------------------------------------
// Stream state
// ---------------------------------------------------------------------------

/// What the read loop should do after an event.
#[derive(Debug, PartialEq)]
enum Step {
    Continue,
    Token(String),
    Done,
    Failed(String),
}

/// Everything gathered from one response so far.
#[derive(Debug, Default)]
struct StreamState {
    text: String,
    sources: Vec<GroundingSource>,
    stop_reason: Option<String>,
    input_tokens: u32,
    output_tokens: u32,
}

impl StreamState {
    fn apply(&mut self, event: StreamEvent) -> Step {
        match event {
            StreamEvent::MessageStart { message } => {
                self.input_tokens = message.usage.input_tokens.unwrap_or(0);
                debug!(input_tokens = self.input_tokens, "message started");
                Step::Continue
            }
            StreamEvent::ContentBlockStart {
                content_block: ContentBlock::WebSearchToolResult { content },
            } => {
                match content {
                    SearchContent::Results(refs) => {
                        for r in refs {
                            self.add_source(r);
                        }
                    }
                    SearchContent::Failed(error) => warn!(%error, "web search failed"),
                }
                Step::Continue
            }
            StreamEvent::ContentBlockDelta { delta } => match delta {
                Delta::TextDelta { text } => {
                    self.text.push_str(&text);
                    Step::Token(text)
                }
                Delta::CitationsDelta { citation } => {
                    self.add_source(citation);
                    Step::Continue
                }
                Delta::Other => Step::Continue,
            },
            StreamEvent::MessageDelta { delta, usage } => {
                if let Some(n) = usage.output_tokens {
                    self.output_tokens = n;
                }
                if delta.stop_reason.is_some() {
                    self.stop_reason = delta.stop_reason;
                }
                Step::Continue
            }
            StreamEvent::MessageStop => Step::Done,
            StreamEvent::Error { error } => Step::Failed(error.message),
            StreamEvent::ContentBlockStart { .. } | StreamEvent::Other => Step::Continue,
        }
    }

    fn add_source(&mut self, source: SourceRef) {
        if let Some(source) = source.into_source() {
            if !self.sources.iter().any(|s| s.uri == source.uri) {
                self.sources.push(source);
            }
        }
    }

    fn finish(self, generation: u64) -> LlmEvent {
        LlmEvent::Complete {
            full_text: self.text,
            citations: self.sources,
            stop_reason: self.stop_reason,
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            generation,
        }
    }
}

// ---------------------------------------------------------------------------
// ClaudeClient
// ---------------------------------------------------------------------------

pub struct ClaudeClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl ClaudeClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            url: MESSAGES_URL.to_string(),
        }
    }

    /// Point the client at a different Messages endpoint.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub(crate) fn request_body(&self, request: &LlmRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "system": request.system,
            "messages": [{ "role": "user", "content": request.user_content }],
            "stream": true,
        });
        if request.web_search {
            body["tools"] = json!([{
                "type": WEB_SEARCH_TOOL,
                "name": "web_search",
                "max_uses": WEB_SEARCH_MAX_USES,
            }]);
        }
        body
    }

    /// Stream one answer over `tx`, tagging every event with `generation`.
    ///
    /// Failures are reported as `LlmEvent::Error` rather than returned. The
    /// call ends early if the receiver goes away.
    pub async fn stream_message(
        &self,
        request: &LlmRequest,
        tx: mpsc::Sender<LlmEvent>,
        generation: u64,
    ) -> anyhow::Result<()> {
        if self.api_key.is_empty() {
            send_error(&tx, "Anthropic API key is empty", generation).await;
            return Ok(());
        }

        let source = self
            .http
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.request_body(request))
            .eventsource();
        let mut es = match source {
            Ok(es) => es,
            Err(e) => {
                send_error(&tx, &format!("Could not open the response stream: {e}"), generation).await;
                return Ok(());
            }
        };

        let outcome = read_stream(&mut es, &tx, generation).await;
        es.close();
        if let Some(event) = outcome {
            let _ = tx.send(event).await;
        }
        Ok(())
    }
}

/// Drive `es` to its end. Returns the final event to send, or `None` when
/// the receiver has gone away.
async fn read_stream(
    es: &mut EventSource,
    tx: &mpsc::Sender<LlmEvent>,
    generation: u64,
) -> Option<LlmEvent> {
    let mut state = StreamState::default();

    while let Some(event) = es.next().await {
        let message = match event {
            Ok(Event::Open) => {
                debug!("response stream open");
                continue;
            }
            Ok(Event::Message(message)) => message,
            Err(reqwest_eventsource::Error::StreamEnded) => break,
            Err(err) => {
                warn!(?err, "response stream failed");
                return Some(LlmEvent::Error {
                    message: describe_stream_error(&err),
                    generation,
                });
            }
        };

        let event = match serde_json::from_str::<StreamEvent>(&message.data) {
            Ok(event) => event,
            Err(e) => {
                debug!(event = %message.event, "skipping undecodable stream payload: {}", e);
                continue;
            }
        };

        match state.apply(event) {
            Step::Continue => {}
            Step::Token(text) => {
                if tx.send(LlmEvent::Token { text, generation }).await.is_err() {
                    return None;
                }
            }
            Step::Done => {
                debug!(
                    output_tokens = state.output_tokens,
                    sources = state.sources.len(),
                    "message complete"
                );
                return Some(state.finish(generation));
            }
            Step::Failed(message) => {
                warn!(%message, "API error in stream");
                return Some(LlmEvent::Error { message, generation });
            }
        }
    }

    // The connection closed without `message_stop`.
    if state.text.is_empty() {
        Some(LlmEvent::Error {
            message: "The response stream closed before any text arrived".to_string(),
            generation,
        })
    } else {
        Some(state.finish(generation))
    }
}

async fn send_error(tx: &mpsc::Sender<LlmEvent>, message: &str, generation: u64) {
    let _ = tx
        .send(LlmEvent::Error {
            message: message.to_string(),
            generation,
        })
        .await;
}

fn describe_stream_error(err: &reqwest_eventsource::Error) -> String {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, _) => {
            format!("The AI service answered with status {status}")
        }
        reqwest_eventsource::Error::Transport(e) => format!("Could not reach the AI service: {e}"),
        other => format!("Response stream error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// LlmClient
// ---------------------------------------------------------------------------

/// The narrative client, or nothing when no API key is configured.
pub enum LlmClient {
    Active(ClaudeClient),
    Disabled,
}

impl LlmClient {
    pub fn from_config(config: &Config) -> Self {
        config
            .credentials
            .anthropic_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .map(|key| LlmClient::Active(ClaudeClient::new(key.to_string(), config.llm.model.clone())))
            .unwrap_or(LlmClient::Disabled)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, LlmClient::Active(_))
    }

    /// A disabled client answers every request with a single error event.
    pub async fn stream_message(
        &self,
        request: &LlmRequest,
        tx: mpsc::Sender<LlmEvent>,
        generation: u64,
    ) -> anyhow::Result<()> {
        match self {
            LlmClient::Active(client) => client.stream_message(request, tx, generation).await,
            LlmClient::Disabled => {
                send_error(&tx, "LLM not configured", generation).await;
                Ok(())
            }
        }
    }
}
