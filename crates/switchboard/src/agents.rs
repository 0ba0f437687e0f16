//! Named agent definitions and the generic runner that executes them
use anyhow::Result;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::models::message::Message;
use crate::models::research::{ReportData, SearchPlan};
use crate::models::tool::{ToolChoice, ToolRequest};
use crate::prompt_template::load_prompt_file;
use crate::providers::base::{CompletionRequest, Provider, ResponseFormat};
use crate::research::ResearchConfig;
use crate::tools::ToolRegistry;

pub const SEARCH_PLANNER: &str = "SearchPlannerAgent";
pub const WEB_SEARCH: &str = "WebSearchAgent";
pub const WRITER: &str = "WriterAgent";
pub const EMAIL: &str = "EmailAgent";

pub const DEFAULT_MAX_TURNS: usize = 10;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Agent {agent} did not finish within {max_turns} turns")]
    MaxTurnsExceeded { agent: String, max_turns: usize },

    #[error("Agent {agent} returned output that does not match its schema: {source}")]
    MalformedOutput {
        agent: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Static configuration of one agent
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub name: String,
    pub instructions: String,
    pub model: String,
    /// Structured output the final answer must follow
    pub output: Option<ResponseFormat>,
    /// Registry tools the agent may call
    pub tools: Vec<String>,
    /// Tool choice for the first turn; later turns use `auto`
    pub tool_choice: ToolChoice,
    pub max_turns: usize,
}

impl AgentSpec {
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model: model.into(),
            output: None,
            tools: Vec::new(),
            tool_choice: ToolChoice::Auto,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    pub fn with_output(mut self, output: ResponseFormat) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_tools<S: Into<String>>(mut self, tools: impl IntoIterator<Item = S>) -> Self {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = tool_choice;
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }
}

/// Agents by name, built once at startup
#[derive(Debug, Clone, Default)]
pub struct AgentTable {
    agents: HashMap<String, AgentSpec>,
}

impl AgentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, spec: AgentSpec) {
        self.agents.insert(spec.name.clone(), spec);
    }

    pub fn with(mut self, spec: AgentSpec) -> Self {
        self.insert(spec);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AgentSpec> {
        self.agents.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.agents.keys().map(String::as_str).collect();
        names.sort();
        names
    }

    /// The four agents behind the research pipeline. They run on `config.model`,
    /// or on `default_model` when the config leaves it unset.
    pub fn research(config: &ResearchConfig, default_model: &str) -> Result<Self> {
        let model = config.model_or(default_model);
        let planner = load_prompt_file("planner.md", &json!({"searches": config.searches}))?;
        let searcher = load_prompt_file("web_search.md", &json!({}))?;
        let writer = load_prompt_file("writer.md", &json!({}))?;
        let email = load_prompt_file("email.md", &json!({}))?;

        Ok(Self::new()
            .with(
                AgentSpec::new(SEARCH_PLANNER, planner, model)
                    .with_output(ResponseFormat::new("SearchPlan", SearchPlan::schema())),
            )
            .with(
                AgentSpec::new(WEB_SEARCH, searcher, model)
                    .with_tools(["web_search"])
                    .with_tool_choice(ToolChoice::Required),
            )
            .with(
                AgentSpec::new(WRITER, writer, model)
                    .with_output(ResponseFormat::new("ReportData", ReportData::schema())),
            )
            .with(AgentSpec::new(EMAIL, email, model).with_tools(["send_email"])))
    }
}

/// Final answer of an agent run
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutput {
    pub agent: String,
    pub text: String,
    /// The decoded answer when the agent has a structured output
    pub value: Option<Value>,
    pub turns: usize,
}

impl AgentOutput {
    /// Decode the structured answer into `T`
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        let value = self.value.clone().unwrap_or_else(|| Value::String(self.text.clone()));
        serde_json::from_value(value).map_err(|source| {
            RunnerError::MalformedOutput {
                agent: self.agent.clone(),
                source,
            }
            .into()
        })
    }
}

/// Runs any agent from the table against one provider and tool registry
#[derive(Clone)]
pub struct AgentRunner {
    provider: Arc<dyn Provider>,
    registry: ToolRegistry,
    table: Arc<AgentTable>,
}

impl AgentRunner {
    pub fn new(provider: Arc<dyn Provider>, registry: ToolRegistry, table: AgentTable) -> Self {
        Self {
            provider,
            registry,
            table: Arc::new(table),
        }
    }

    pub fn table(&self) -> &AgentTable {
        &self.table
    }

    /// Run `agent` on `input` until it answers without calling tools
    pub async fn run(&self, agent: &str, input: &str) -> Result<AgentOutput> {
        let spec = self
            .table
            .get(agent)
            .ok_or_else(|| RunnerError::UnknownAgent(agent.to_string()))?;
        self.run_spec(spec, input).await
    }

    /// Like [`run`](Self::run) for a spec that is not in the table, such as a table
    /// agent given a one-off output schema
    pub async fn run_spec(&self, spec: &AgentSpec, input: &str) -> Result<AgentOutput> {
        let tools = self.registry.subset(&spec.tools);
        let mut messages = vec![Message::user().with_text(input)];

        for turn in 0..spec.max_turns {
            let tool_choice = if turn == 0 {
                spec.tool_choice
            } else {
                ToolChoice::Auto
            };
            let request = CompletionRequest::new(&spec.model, &spec.instructions, &messages)
                .with_tools(&tools, tool_choice)
                .with_response_format(spec.output.as_ref());
            let completion = self.provider.complete(request).await?;

            if completion.message.has_tool_requests() {
                let requests: Vec<ToolRequest> = completion
                    .message
                    .tool_requests()
                    .into_iter()
                    .cloned()
                    .collect();
                messages.push(completion.message);
                let responses = self.registry.dispatch(&requests).await;
                messages.extend(responses.into_iter().map(Message::tool));
                continue;
            }

            let text = completion.message.text().unwrap_or_default();
            let value = match spec.output {
                Some(_) => Some(serde_json::from_str(&text).map_err(|source| {
                    RunnerError::MalformedOutput {
                        agent: spec.name.clone(),
                        source,
                    }
                })?),
                None => None,
            };
            tracing::debug!(agent = %spec.name, turns = turn + 1, "agent finished");
            return Ok(AgentOutput {
                agent: spec.name.clone(),
                text,
                value,
                turns: turn + 1,
            });
        }

        Err(RunnerError::MaxTurnsExceeded {
            agent: spec.name.clone(),
            max_turns: spec.max_turns,
        }
        .into())
    }
}
