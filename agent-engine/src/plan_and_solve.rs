//! The Plan-and-Solve engine: plan, then execute each step, then synthesize.

use std::sync::Arc;
use std::time::Instant;

use agent_provider::provider::Provider;
use agent_provider::types::{ProviderRequest, ToolChoice, ToolSchema};
use agent_tool::{execute_tool, ToolRegistry};
use agent_types::{Message, Output, ReasoningStep, TokenUsage};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::common::{deadline, race};
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::input::Input;
use crate::stream::{replay_trace, StreamChunk};
use futures::stream::BoxStream;

/// One step of a parsed plan. `id` is free-form (vendors emit either
/// integers or short string ids) so it's kept as raw JSON rather than
/// forced into a single Rust type.
#[derive(Debug, Clone, Deserialize)]
struct PlanStep {
    #[serde(default)]
    id: Value,
    description: String,
    #[serde(default)]
    requires_tool: bool,
    #[serde(default)]
    tool_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Plan {
    #[serde(default)]
    analysis: String,
    steps: Vec<PlanStep>,
    #[serde(default)]
    expected_outcome: String,
}

/// Extracts the outermost `{..}` substring and parses it as a [`Plan`];
/// on any failure (no braces, invalid JSON, missing `steps`) falls back
/// to a single-step plan whose description is the original query.
fn parse_plan(text: &str, query: &str) -> (Plan, bool) {
    let extracted = text
        .find('{')
        .zip(text.rfind('}'))
        .filter(|(start, end)| start <= end)
        .map(|(start, end)| &text[start..=end]);

    if let Some(candidate) = extracted {
        if let Ok(plan) = serde_json::from_str::<Plan>(candidate) {
            if !plan.steps.is_empty() {
                return (plan, false);
            }
        }
    }

    (
        Plan {
            analysis: String::new(),
            steps: vec![PlanStep {
                id: Value::from(1),
                description: query.to_string(),
                requires_tool: false,
                tool_name: None,
            }],
            expected_outcome: String::new(),
        },
        true,
    )
}

fn step_label(step: &PlanStep) -> String {
    step.tool_name.clone().unwrap_or_else(|| format!("step_{}", step.id))
}

fn numbered_results(results: &[String]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {}", i + 1, r))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Plans a JSON step list, executes each step (routing through a tool
/// when the step names one), then synthesizes a final answer from the
/// accumulated step results.
pub struct PlanAndSolveEngine {
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
    config: EngineConfig,
}

impl PlanAndSolveEngine {
    pub fn new(provider: Arc<dyn Provider>, tools: ToolRegistry, config: EngineConfig) -> Self {
        Self { provider, tools, config }
    }

    fn request(&self, messages: Vec<Message>, tools: Option<Vec<ToolSchema>>, tool_choice: Option<ToolChoice>) -> ProviderRequest {
        ProviderRequest {
            model: self.config.model.clone(),
            messages,
            tools,
            tool_choice,
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
            ..Default::default()
        }
    }

    fn system_message(&self) -> Option<Message> {
        if self.config.system_prompt.is_empty() {
            None
        } else {
            Some(Message::system(self.config.system_prompt.clone()))
        }
    }

    /// Runs to completion, then replays the recorded trace as a stream —
    /// plan/execute/synthesize are three sequential provider calls with
    /// no useful mid-phase increment to surface early.
    pub async fn run_stream(&self, input: Input, cancel: CancellationToken) -> BoxStream<'static, StreamChunk> {
        replay_trace(self.run(input, cancel).await)
    }
}

#[async_trait]
impl Engine for PlanAndSolveEngine {
    #[instrument(skip_all, fields(engine = "plan_and_solve"))]
    async fn run(&self, input: Input, cancel: CancellationToken) -> Output {
        let start = Instant::now();
        let run_deadline = deadline(self.config.timeout);
        let mut trace: Vec<ReasoningStep> = Vec::new();
        let mut usage = TokenUsage::default();

        // -- (a) Plan --
        let plan_prompt = format!(
            "Produce a JSON object {{analysis, steps:[{{id, description, requires_tool, tool_name}}], expected_outcome}} \
             to answer: {}",
            input.query
        );
        let mut plan_messages: Vec<Message> = self.system_message().into_iter().collect();
        plan_messages.push(Message::user(plan_prompt));

        let plan_response = match race(&cancel, run_deadline, self.provider.generate(self.request(plan_messages, None, None))).await {
            Ok(response) => response,
            Err(err) => return Output::failure(err.to_string(), trace, usage, start.elapsed()),
        };
        usage = usage + plan_response.usage;

        let (plan, used_fallback) = parse_plan(&plan_response.content, &input.query);
        let plan_summary = if used_fallback {
            format!("Direct execution: {}", input.query)
        } else {
            plan.analysis.clone()
        };
        trace.push(ReasoningStep::plan(plan_summary));

        // -- (b) Execute --
        let mut step_results: Vec<String> = Vec::new();
        let cap = (self.config.max_iterations as usize).min(plan.steps.len().max(1));
        for (iteration, step) in plan.steps.iter().take(cap).enumerate() {
            debug!(iteration, "engine step");
            let label = step_label(step);

            let prompt = format!(
                "Original query: {}\n\nPrior results:\n{}\n\nCurrent step: {}",
                input.query,
                numbered_results(&step_results),
                step.description
            );
            let mut messages: Vec<Message> = self.system_message().into_iter().collect();
            messages.push(Message::user(prompt));

            trace.push(ReasoningStep::action(label.clone(), serde_json::json!({"description": step.description})));

            let use_tool = step.requires_tool && step.tool_name.as_deref().is_some_and(|name| self.tools.has(name));
            let (result_text, is_error) = if use_tool {
                let tool_name = step.tool_name.clone().unwrap();
                let tool_schema = self
                    .tools
                    .get(&tool_name)
                    .map(|tool| ToolSchema {
                        name: tool.name().to_string(),
                        description: tool.description().to_string(),
                        parameters: serde_json::to_value(tool.parameters()).unwrap_or(serde_json::json!({"type": "object"})),
                    })
                    .into_iter()
                    .collect::<Vec<_>>();

                let request = self.request(messages, Some(tool_schema), Some(ToolChoice::Name(tool_name.clone())));
                match race(&cancel, run_deadline, self.provider.generate(request)).await {
                    Ok(response) => {
                        usage = usage + response.usage;
                        if response.tool_calls.is_empty() {
                            (response.content, false)
                        } else {
                            let mut texts = Vec::new();
                            let mut any_error = false;
                            for call in &response.tool_calls {
                                let outcome = execute_tool(&self.tools, &call.name, call.arguments.clone(), &cancel).await;
                                any_error |= !outcome.success;
                                texts.push(outcome.observation_text());
                            }
                            (texts.join("\n"), any_error)
                        }
                    }
                    Err(err) => return Output::failure(err.to_string(), trace, usage, start.elapsed()),
                }
            } else {
                match race(&cancel, run_deadline, self.provider.generate(self.request(messages, None, None))).await {
                    Ok(response) => {
                        usage = usage + response.usage;
                        (response.content, false)
                    }
                    Err(err) => return Output::failure(err.to_string(), trace, usage, start.elapsed()),
                }
            };

            trace.push(ReasoningStep::observation(label, result_text.clone(), is_error));
            step_results.push(result_text);
        }

        // -- (c) Synthesize --
        let synth_prompt = format!(
            "Original query: {}\nExpected outcome: {}\n\nStep results:\n{}\n\nProduce a comprehensive final answer.",
            input.query,
            plan.expected_outcome,
            numbered_results(&step_results)
        );
        let mut synth_messages: Vec<Message> = self.system_message().into_iter().collect();
        synth_messages.push(Message::user(synth_prompt));

        let response = match race(&cancel, run_deadline, self.provider.generate(self.request(synth_messages, None, None))).await {
            Ok(response) => {
                usage = usage + response.usage;
                response.content
            }
            Err(_) => step_results.join("\n"),
        };

        Output::success(response, trace, usage, start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{simple_text_response, tool_call_response, AddTool, MockProvider};
    use agent_types::AgentConfig;

    fn engine_with(responses: Vec<agent_types::Result<agent_provider::types::ProviderResponse>>, max_iterations: u32) -> PlanAndSolveEngine {
        let provider: Arc<dyn Provider> = Arc::new(MockProvider::new(responses));
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(AddTool)).unwrap();
        let config = EngineConfig::from(AgentConfig::new("a").with_max_iterations(max_iterations).validate().unwrap());
        PlanAndSolveEngine::new(provider, tools, config)
    }

    #[test]
    fn parse_plan_extracts_outermost_braces() {
        let text = r#"here is the plan: {"analysis":"a","steps":[{"id":1,"description":"do x","requires_tool":false}],"expected_outcome":"y"} thanks"#;
        let (plan, fallback) = parse_plan(text, "original query");
        assert!(!fallback);
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].description, "do x");
    }

    #[test]
    fn parse_plan_falls_back_on_malformed_json() {
        let (plan, fallback) = parse_plan("no JSON here", "original query");
        assert!(fallback);
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].description, "original query");
    }

    #[tokio::test]
    async fn malformed_plan_json_falls_back_to_single_step_execution() {
        let engine = engine_with(
            vec![
                Ok(simple_text_response("no JSON here")),
                Ok(simple_text_response("did the one step")),
                Ok(simple_text_response("final synthesized answer")),
            ],
            5,
        );
        let output = engine.run(Input::new("what is 2+2"), CancellationToken::new()).await;
        assert!(output.is_success());
        assert_eq!(output.response, "final synthesized answer");
        let plan_step = output.trace.iter().find(|s| matches!(s, ReasoningStep::Plan { .. })).unwrap();
        match plan_step {
            ReasoningStep::Plan { text, .. } => assert!(text.contains("Direct execution")),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn well_formed_plan_executes_tool_step() {
        let plan_json = serde_json::json!({
            "analysis": "need to add two numbers",
            "steps": [{"id": 1, "description": "add 2 and 3", "requires_tool": true, "tool_name": "add"}],
            "expected_outcome": "the sum"
        })
        .to_string();

        let engine = engine_with(
            vec![
                Ok(simple_text_response(&plan_json)),
                Ok(tool_call_response("c1", "add", serde_json::json!({"a": 2, "b": 3}))),
                Ok(simple_text_response("The sum is 5.")),
            ],
            5,
        );
        let output = engine.run(Input::new("2+3"), CancellationToken::new()).await;
        assert!(output.is_success());
        assert_eq!(output.response, "The sum is 5.");
        let observations: Vec<_> = output
            .trace
            .iter()
            .filter_map(|s| match s {
                ReasoningStep::Observation { result, .. } => Some(result.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(observations, vec!["5".to_string()]);
    }

    #[tokio::test]
    async fn synthesis_failure_falls_back_to_joined_step_results() {
        let engine = engine_with(
            vec![
                Ok(simple_text_response("no JSON here")),
                Ok(simple_text_response("step result text")),
                Err(agent_types::AgentError::ProviderUnavailable("down".into())),
            ],
            5,
        );
        let output = engine.run(Input::new("query"), CancellationToken::new()).await;
        assert!(output.is_success());
        assert_eq!(output.response, "1. step result text");
    }
}
