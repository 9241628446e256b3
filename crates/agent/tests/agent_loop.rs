use async_trait::async_trait;
use paperchef_agent::{
    ChatModel, CookingAgent, LazyAgent, ToolDefinition, AGENT_INSTRUCTIONS, EMPTY_REPLY,
};
use paperchef_models::{AppError, ChatMessage, Config, Role, ToolCall};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Replays canned replies and records what it was sent.
#[derive(Default)]
struct ScriptedModel {
    replies: Mutex<VecDeque<Result<ChatMessage, AppError>>>,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    fn new(replies: Vec<Result<ChatMessage, AppError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatMessage, AppError> {
        assert_eq!(tools.len(), 3);
        self.seen.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ChatMessage::assistant("out of script")))
    }
}

fn tool_request(id: &str, name: &str, arguments: &str) -> ChatMessage {
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

#[tokio::test]
async fn plain_answer_is_returned() {
    let model = ScriptedModel::new(vec![Ok(ChatMessage::assistant("Try a frittata!"))]);
    let agent = CookingAgent::with_model(model.clone(), 5);

    assert_eq!(agent.chat("I have eggs").await, "Try a frittata!");

    let seen = model.seen.lock().unwrap();
    assert_eq!(seen[0][0].role, Role::System);
    assert_eq!(seen[0][0].text_content(), AGENT_INSTRUCTIONS);
    assert_eq!(seen[0][1], ChatMessage::user("I have eggs"));
}

#[tokio::test]
async fn tool_calls_are_executed_and_fed_back() {
    let model = ScriptedModel::new(vec![
        Ok(tool_request(
            "call_1",
            "search_recipes",
            r#"{"ingredients": ["rice", "eggs"], "cuisine": "asian"}"#,
        )),
        Ok(ChatMessage::assistant("Fried Rice is your best bet.")),
    ]);
    let agent = CookingAgent::with_model(model.clone(), 5);

    let turn = agent.chat_turn("rice and eggs, asian please").await;
    assert_eq!(turn.reply, "Fried Rice is your best bet.");
    assert_eq!(turn.tools_used, vec!["search_recipes".to_string()]);
    assert!(!turn.failed);

    let seen = model.seen.lock().unwrap();
    let second_round = &seen[1];
    let tool_message = second_round.last().unwrap();
    assert_eq!(tool_message.role, Role::Tool);
    assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(
        tool_message.text_content(),
        "Found 1 recipes:\n- Fried Rice (matches 2 ingredients: rice, soy sauce, eggs, vegetables)\n"
    );
}

#[tokio::test]
async fn empty_answer_gets_placeholder() {
    let model = ScriptedModel::new(vec![Ok(ChatMessage::assistant(""))]);
    let agent = CookingAgent::with_model(model, 5);
    assert_eq!(agent.chat("hello?").await, EMPTY_REPLY);
}

#[tokio::test]
async fn whitespace_answer_is_passed_through() {
    let model = ScriptedModel::new(vec![Ok(ChatMessage::assistant("  "))]);
    let agent = CookingAgent::with_model(model, 5);
    assert_eq!(agent.chat("hello?").await, "  ");
}

#[tokio::test]
async fn failures_become_apologies_and_are_rolled_back() {
    let model = ScriptedModel::new(vec![
        Ok(ChatMessage::assistant("Hi! What's in your fridge?")),
        Err(AppError::Upstream {
            reason: "chat model returned 500".to_string(),
        }),
    ]);
    let agent = CookingAgent::with_model(model, 5);

    agent.chat("hi").await;
    let reply = agent.chat("tomatoes").await;
    assert_eq!(
        reply,
        "Error processing request: Upstream error: chat model returned 500"
    );

    let history = agent.history().await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0], ChatMessage::user("hi"));
    assert_eq!(history[1].text_content(), "Hi! What's in your fridge?");
}

#[tokio::test]
async fn endless_tool_calls_hit_the_round_limit() {
    let replies = (0..10)
        .map(|i| {
            Ok(tool_request(
                &format!("call_{i}"),
                "get_nutrition_info",
                r#"{"dish_name": "stir fry"}"#,
            ))
        })
        .collect();
    let model = ScriptedModel::new(replies);
    let agent = CookingAgent::with_model(model.clone(), 2);

    let turn = agent.chat_turn("calories?").await;
    assert!(turn.failed);
    assert!(turn.reply.contains("after 2 rounds"));
    assert_eq!(turn.tools_used.len(), 3);
    assert_eq!(model.seen.lock().unwrap().len(), 3);
    assert!(agent.history().await.is_empty());
}

#[tokio::test]
async fn history_excludes_system_prompt_and_reset_clears_it() {
    let model = ScriptedModel::new(vec![Ok(ChatMessage::assistant("Sure."))]);
    let agent = CookingAgent::with_model(model, 5);
    agent.chat("Give me a soup").await;

    let history = agent.history().await;
    assert!(history.iter().all(|m| m.role != Role::System));
    assert_eq!(history.len(), 2);

    agent.reset().await;
    assert!(agent.history().await.is_empty());
}

#[tokio::test]
async fn lazy_agent_without_token_is_unavailable() {
    let mut config = Config::default().agent;
    config.token = None;
    let lazy = LazyAgent::new(config);
    assert!(!lazy.is_configured());
    let err = lazy.get().await.err().unwrap();
    assert_eq!(err.http_status(), 503);
    assert!(err.to_string().contains("GITHUB_TOKEN"));
}

#[tokio::test]
async fn lazy_agent_builds_once() {
    let mut config = Config::default().agent;
    config.token = Some("ghp_test".to_string());
    let lazy = LazyAgent::new(config);
    let first = lazy.get().await.unwrap();
    let second = lazy.get().await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}
