use async_trait::async_trait;
use paperchef_agent::{ChatModel, ToolDefinition};
use paperchef_extract::DocumentExtractor;
use paperchef_models::{AppError, ChatMessage, DocumentSummary, Role, ToolCall};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Returns the same summary for every document.
pub struct StaticExtractor {
    summary: DocumentSummary,
    calls: AtomicUsize,
}

impl StaticExtractor {
    pub fn new(title: &str, author: &str, summary: &str) -> Self {
        Self {
            summary: DocumentSummary {
                title: title.to_string(),
                author: author.to_string(),
                summary: summary.to_string(),
                filename: None,
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentExtractor for StaticExtractor {
    async fn extract(&self, _pdf: &[u8]) -> Result<DocumentSummary, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.summary.clone())
    }
}

/// Fails every extraction like an unreachable model API.
pub struct FailingExtractor {
    pub reason: String,
}

#[async_trait]
impl DocumentExtractor for FailingExtractor {
    async fn extract(&self, _pdf: &[u8]) -> Result<DocumentSummary, AppError> {
        Err(AppError::Upstream {
            reason: self.reason.clone(),
        })
    }
}

/// Chat model that plays back a fixed script and records every request.
#[derive(Default)]
pub struct ScriptedChatModel {
    replies: Mutex<VecDeque<ChatMessage>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChatModel {
    pub fn new(replies: Vec<ChatMessage>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// An assistant message asking for one tool call.
    pub fn tool_call(id: &str, name: &str, arguments: &str) -> ChatMessage {
        ChatMessage {
            role: Role::Assistant,
            content: None,
            tool_calls: vec![ToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments: arguments.to_string(),
            }],
            tool_call_id: None,
        }
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _tools: &[ToolDefinition],
    ) -> Result<ChatMessage, AppError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages.to_vec());
        }
        let next = self.replies.lock().ok().and_then(|mut r| r.pop_front());
        next.ok_or_else(|| AppError::Upstream {
            reason: "chat script exhausted".to_string(),
        })
    }
}
