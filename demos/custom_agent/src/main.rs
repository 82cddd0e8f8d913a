//! Wires a hand-written tool into an [`agents::Agent`] and runs it through
//! the ReAct engine end to end: register a tool, ask a question that needs
//! it, print the trace and the final answer.
//!
//! Requires one provider environment variable to be set (see
//! `agents::detect_providers`); without one this exits with an explanation
//! instead of a panic.

use std::pin::Pin;
use std::sync::Arc;

use agent_tool::{ParameterSchema, PropertySchema, ToolDyn, ToolError, ToolRegistry};
use agents::{Agent, EngineKind};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Adds two numbers. The canonical "does the model actually call a tool"
/// smoke test — deliberately the same shape as the worked example in the
/// project's own design notes.
struct AddTool {
    schema: ParameterSchema,
}

impl AddTool {
    fn new() -> Self {
        let schema = ParameterSchema::new()
            .with_property("a", PropertySchema::new("number").with_description("first addend"))
            .with_property("b", PropertySchema::new("number").with_description("second addend"))
            .with_required("a")
            .with_required("b");
        Self { schema }
    }
}

impl ToolDyn for AddTool {
    fn name(&self) -> &str {
        "add"
    }

    fn description(&self) -> &str {
        "Adds two numbers and returns their sum."
    }

    fn parameters(&self) -> &ParameterSchema {
        &self.schema
    }

    fn validate(&self, args: &Value) -> agent_tool::error::Result<()> {
        for key in ["a", "b"] {
            if !args.get(key).is_some_and(Value::is_number) {
                return Err(ToolError::InvalidArguments(format!("`{key}` must be a number")));
            }
        }
        Ok(())
    }

    fn execute(&self, args: Value) -> Pin<Box<dyn std::future::Future<Output = agent_tool::error::Result<String>> + Send + '_>> {
        Box::pin(async move {
            let a = args["a"].as_f64().unwrap_or(0.0);
            let b = args["b"].as_f64().unwrap_or(0.0);
            Ok((a + b).to_string())
        })
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let provider = match agents::detect_providers() {
        Ok(provider) => provider,
        Err(err) => {
            eprintln!("could not start demo agent: {err}");
            eprintln!("set OPENAI_API_KEY, DEEPSEEK_API_KEY, QWEN_API_KEY, OLLAMA_BASE_URL or VLLM_BASE_URL and retry");
            std::process::exit(1);
        }
    };

    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(AddTool::new())).expect("add is the only tool registered here");

    let config = agent_types::AgentConfig::new("demo-agent").with_system_prompt("Use the `add` tool for arithmetic.");
    let agent = match Agent::new(config, provider, tools, EngineKind::React) {
        Ok(agent) => agent,
        Err(err) => {
            eprintln!("invalid agent config: {err}");
            std::process::exit(1);
        }
    };

    let output = agent.run("What is 2 + 3?", CancellationToken::new()).await;

    for step in &output.trace {
        println!("{step:?}");
    }

    if output.is_success() {
        println!("\nfinal answer: {}", output.response);
    } else {
        println!("\nrun failed: {}", output.error.unwrap_or_default());
    }
}
