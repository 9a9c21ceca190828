//! The agent reasoning loop implementation.

use std::sync::Arc;

use ferrocode_core::error::Error;
use ferrocode_core::provider::{Provider, ProviderRequest};
use ferrocode_core::turn::Turn;
use ferrocode_tools::Dispatcher;
use tracing::{debug, info, warn};

use crate::context::ContextStore;

/// How a single `run` ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The model answered with plain text.
    Final(String),

    /// The iteration cap was hit before the model produced a final
    /// answer. Explicitly marked so nothing partial is passed off as one.
    Truncated { iterations: u32 },
}

/// The core agent loop that alternates model calls and tool execution.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Default max tokens per response
    max_tokens: Option<u32>,

    /// Validating tool dispatcher
    dispatcher: Arc<Dispatcher>,

    /// Maximum model/tool iterations per run
    max_iterations: u32,

    /// Token budget for the context view sent to the model
    token_budget: usize,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            dispatcher,
            max_iterations: 20,
            token_budget: 50_000,
        }
    }

    /// Set the maximum number of model/tool iterations per run.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the token budget for the context view.
    pub fn with_token_budget(mut self, budget: usize) -> Self {
        self.token_budget = budget;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum tokens per model response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Process one user input against the conversation context.
    ///
    /// Appends the user turn, then alternates model requests and tool
    /// execution until the model answers without tool calls or the
    /// iteration cap is reached. Transport and context errors abort this
    /// run only; the loop and the store stay usable for the next input.
    pub async fn run(
        &self,
        context: &mut ContextStore,
        user_input: &str,
    ) -> Result<RunOutcome, Error> {
        context.append(Turn::user(user_input))?;

        info!(
            turns = context.len(),
            max_iterations = self.max_iterations,
            "processing user input"
        );

        let tool_definitions = self.dispatcher.definitions();

        for iteration in 1..=self.max_iterations {
            debug!(iteration, "agent loop iteration");

            let view = context.trimmed_view(self.token_budget)?;
            let request = ProviderRequest {
                model: self.model.clone(),
                turns: view,
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
            };

            let response = self.provider.complete(request).await?;

            // The assistant turn enters the transcript verbatim before any
            // of its tool calls run.
            let assistant = response.turn;
            let calls = assistant.tool_calls.clone();
            let text = assistant.content.clone();
            context.append(assistant)?;

            if calls.is_empty() {
                return Ok(RunOutcome::Final(text));
            }

            debug!(tool_count = calls.len(), "executing tool calls");
            for call in &calls {
                let result = self.dispatcher.dispatch(call).await;
                if !result.success {
                    warn!(tool = %call.name, output = %result.output, "tool call failed");
                }
                context.append(Turn::from_tool_result(&result))?;
            }
        }

        warn!(
            iterations = self.max_iterations,
            "iteration cap reached without a final answer"
        );
        Ok(RunOutcome::Truncated {
            iterations: self.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use ferrocode_core::error::ProviderError;
    use ferrocode_core::provider::ProviderResponse;
    use ferrocode_core::tool::ToolCall;
    use ferrocode_core::turn::Role;
    use ferrocode_security::audit::AuditLog;
    use ferrocode_security::sandbox::Sandbox;

    /// A provider that plays back a fixed script of assistant turns.
    struct ScriptedProvider {
        turns: Mutex<VecDeque<Turn>>,
    }

    impl ScriptedProvider {
        fn new(turns: Vec<Turn>) -> Self {
            Self {
                turns: Mutex::new(turns.into()),
            }
        }
    }

    #[async_trait::async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            let turn = self
                .turns
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Turn::assistant("out of script"));
            Ok(ProviderResponse {
                turn,
                usage: None,
                model: "mock-model".into(),
            })
        }
    }

    /// A provider whose every request fails at the transport layer.
    struct FailingProvider;

    #[async_trait::async_trait]
    impl Provider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::Network("connection refused".into()))
        }
    }

    fn fixture() -> (tempfile::TempDir, Arc<Dispatcher>) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("workspace");
        std::fs::create_dir(&root).unwrap();
        let registry = ferrocode_tools::default_registry(&root).unwrap();
        let sandbox = Sandbox::new(&root).unwrap();
        let audit = AuditLog::open(dir.path().join("audit.jsonl")).unwrap();
        (dir, Arc::new(Dispatcher::new(registry, sandbox, audit)))
    }

    fn todo_list_call(id: &str) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: "todo".into(),
            arguments: serde_json::json!({"action": "list"}),
        }
    }

    #[tokio::test]
    async fn text_only_response_is_final() {
        let (_dir, dispatcher) = fixture();
        let provider = Arc::new(ScriptedProvider::new(vec![Turn::assistant(
            "Hello! How can I help?",
        )]));
        let agent = AgentLoop::new(provider, "mock-model", dispatcher);

        let mut context = ContextStore::new();
        context.append(Turn::system("You are helpful.")).unwrap();

        let outcome = agent.run(&mut context, "Hi").await.unwrap();

        assert_eq!(outcome, RunOutcome::Final("Hello! How can I help?".into()));
        // System + user + assistant.
        assert_eq!(context.len(), 3);
    }

    #[tokio::test]
    async fn tool_round_trip_then_final() {
        let (_dir, dispatcher) = fixture();
        let provider = Arc::new(ScriptedProvider::new(vec![
            Turn::assistant_with_calls("Checking the list.", vec![todo_list_call("c1")]),
            Turn::assistant("Nothing on the list."),
        ]));
        let agent = AgentLoop::new(provider, "mock-model", dispatcher);

        let mut context = ContextStore::new();
        context.append(Turn::system("sys")).unwrap();

        let outcome = agent.run(&mut context, "What's on my list?").await.unwrap();

        assert_eq!(outcome, RunOutcome::Final("Nothing on the list.".into()));
        // System, user, assistant-with-calls, tool result, final assistant.
        assert_eq!(context.len(), 5);
        let turns = context.turns();
        assert_eq!(turns[2].role, Role::Assistant);
        assert!(turns[2].has_tool_calls());
        assert_eq!(turns[3].role, Role::Tool);
        assert_eq!(turns[3].call_id.as_deref(), Some("c1"));
        assert_eq!(turns[3].content, "No todos found");
        assert!(!turns[3].is_error);
    }

    #[tokio::test]
    async fn iteration_cap_yields_truncated() {
        let (_dir, dispatcher) = fixture();
        let provider = Arc::new(ScriptedProvider::new(vec![
            Turn::assistant_with_calls("Round one.", vec![todo_list_call("c1")]),
            Turn::assistant_with_calls("Round two.", vec![todo_list_call("c2")]),
        ]));
        let agent = AgentLoop::new(provider, "mock-model", dispatcher).with_max_iterations(2);

        let mut context = ContextStore::new();
        context.append(Turn::system("sys")).unwrap();

        let outcome = agent.run(&mut context, "keep going").await.unwrap();

        assert_eq!(outcome, RunOutcome::Truncated { iterations: 2 });
        // System, user, then two assistant/tool pairs.
        assert_eq!(context.len(), 6);
    }

    #[tokio::test]
    async fn transport_error_aborts_run_but_not_the_store() {
        let (_dir, dispatcher) = fixture();
        let agent = AgentLoop::new(Arc::new(FailingProvider), "mock-model", dispatcher.clone());

        let mut context = ContextStore::new();
        context.append(Turn::system("sys")).unwrap();

        let err = agent.run(&mut context, "hello?").await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::Network(_))));
        // The user turn stays recorded; the run simply produced no answer.
        assert_eq!(context.len(), 2);

        // The same store carries on with a working provider.
        let retry = AgentLoop::new(
            Arc::new(ScriptedProvider::new(vec![Turn::assistant("Back online.")])),
            "mock-model",
            dispatcher,
        );
        let outcome = retry.run(&mut context, "hello again?").await.unwrap();
        assert_eq!(outcome, RunOutcome::Final("Back online.".into()));
        assert_eq!(context.len(), 4);
    }

    #[tokio::test]
    async fn failed_tool_call_is_recorded_and_recovered() {
        let (_dir, dispatcher) = fixture();
        let bad_call = ToolCall {
            id: "c7".into(),
            name: "frobnicate".into(),
            arguments: serde_json::json!({}),
        };
        let provider = Arc::new(ScriptedProvider::new(vec![
            Turn::assistant_with_calls("Trying something.", vec![bad_call]),
            Turn::assistant("Recovered."),
        ]));
        let agent = AgentLoop::new(provider, "mock-model", dispatcher);

        let mut context = ContextStore::new();
        context.append(Turn::system("sys")).unwrap();

        let outcome = agent.run(&mut context, "do the thing").await.unwrap();

        assert_eq!(outcome, RunOutcome::Final("Recovered.".into()));
        let tool_turn = &context.turns()[3];
        assert_eq!(tool_turn.role, Role::Tool);
        assert!(tool_turn.is_error);
        assert!(tool_turn.content.contains("Unknown tool: frobnicate"));
    }
}
