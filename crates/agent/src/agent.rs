use crate::{ChatModel, OpenAiChatClient, ToolRegistry};
use paperchef_models::{AgentConfig, AppError, ChatMessage, Role};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{error, info, instrument, warn};

pub const AGENT_NAME: &str = "CookingChef";

pub const AGENT_INSTRUCTIONS: &str = "You are an expert cooking assistant AI chef. Help users find recipes, \
extract ingredients, and provide cooking advice. You have access to:
1. A recipe search tool to find recipes by ingredients
2. An ingredient extraction tool to parse recipes
3. A nutrition information tool

Always be friendly, provide detailed cooking tips, and ask clarifying questions when needed.";

pub const EMPTY_REPLY: &str = "I'm thinking about that. Could you ask again?";

/// Result of one user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub reply: String,
    pub tools_used: Vec<String>,
    pub failed: bool,
}

/// Conversational agent with a single running thread.
///
/// The thread lock is held for a whole turn, so concurrent callers are
/// answered one after another and never interleave tool rounds.
pub struct CookingAgent {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    thread: Mutex<Vec<ChatMessage>>,
    max_tool_rounds: u32,
}

impl CookingAgent {
    pub fn from_config(config: &AgentConfig) -> Result<Self, AppError> {
        let client = OpenAiChatClient::new(config)?;
        info!(agent = AGENT_NAME, model = %config.model, "Cooking agent initialized");
        Ok(Self::with_model(Arc::new(client), config.max_tool_rounds))
    }

    pub fn with_model(model: Arc<dyn ChatModel>, max_tool_rounds: u32) -> Self {
        Self {
            model,
            tools: ToolRegistry::cooking(),
            thread: Mutex::new(vec![ChatMessage::system(AGENT_INSTRUCTIONS)]),
            max_tool_rounds,
        }
    }

    pub fn name(&self) -> &'static str {
        AGENT_NAME
    }

    pub async fn chat(&self, user_message: &str) -> String {
        self.chat_turn(user_message).await.reply
    }

    /// Failed turns are rolled back so the thread stays a valid sequence
    /// for the next request.
    #[instrument(skip(self, user_message), fields(chars = user_message.len()))]
    pub async fn chat_turn(&self, user_message: &str) -> ChatTurn {
        let mut thread = self.thread.lock().await;
        let checkpoint = thread.len();
        thread.push(ChatMessage::user(user_message));

        let mut tools_used = Vec::new();
        match self.run(&mut thread, &mut tools_used).await {
            Ok(text) if text.is_empty() => ChatTurn {
                reply: EMPTY_REPLY.to_string(),
                tools_used,
                failed: false,
            },
            Ok(text) => ChatTurn {
                reply: text,
                tools_used,
                failed: false,
            },
            Err(e) => {
                error!(error = %e, "Cooking agent turn failed");
                thread.truncate(checkpoint);
                ChatTurn {
                    reply: format!("Error processing request: {e}"),
                    tools_used,
                    failed: true,
                }
            }
        }
    }

    async fn run(
        &self,
        thread: &mut Vec<ChatMessage>,
        tools_used: &mut Vec<String>,
    ) -> Result<String, AppError> {
        for _ in 0..=self.max_tool_rounds {
            let reply = self
                .model
                .complete(thread, self.tools.definitions())
                .await?;
            let calls = reply.tool_calls.clone();
            let text = reply.text_content().to_string();
            thread.push(reply);

            if calls.is_empty() {
                return Ok(text);
            }
            for call in &calls {
                let output = self.tools.dispatch(call);
                tools_used.push(call.name.clone());
                thread.push(ChatMessage::tool_result(&call.id, output));
            }
        }

        warn!(rounds = self.max_tool_rounds, "Tool round limit reached");
        Err(AppError::Upstream {
            reason: format!(
                "model kept calling tools after {} rounds",
                self.max_tool_rounds
            ),
        })
    }

    /// Conversation so far, without the system instructions.
    pub async fn history(&self) -> Vec<ChatMessage> {
        self.thread
            .lock()
            .await
            .iter()
            .filter(|m| m.role != Role::System)
            .cloned()
            .collect()
    }

    pub async fn reset(&self) {
        let mut thread = self.thread.lock().await;
        thread.truncate(1);
    }
}

/// Agent built on first use from config and then shared.
pub struct LazyAgent {
    config: AgentConfig,
    cell: OnceCell<Arc<CookingAgent>>,
}

impl LazyAgent {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    pub fn ready(agent: Arc<CookingAgent>) -> Self {
        Self {
            config: AgentConfig {
                token: None,
                ..paperchef_models::Config::default().agent
            },
            cell: OnceCell::new_with(Some(agent)),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.cell.initialized() || self.config.token().is_some()
    }

    pub async fn get(&self) -> Result<Arc<CookingAgent>, AppError> {
        self.cell
            .get_or_try_init(|| async {
                CookingAgent::from_config(&self.config)
                    .map(Arc::new)
                    .map_err(|e| AppError::AgentUnavailable {
                        reason: e.to_string(),
                    })
            })
            .await
            .cloned()
    }
}
