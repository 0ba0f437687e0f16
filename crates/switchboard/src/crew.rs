//! Crews: role-playing agents working through a fixed list of tasks in order
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::agents::{AgentRunner, AgentSpec, AgentTable, RunnerError};
use crate::errors::ConfigError;
use crate::prompt_template::{load_prompt, load_prompt_file};
use crate::providers::base::{Provider, ResponseFormat};
use crate::tools::ToolRegistry;

const BUNDLED: &[(&str, &str)] = &[
    ("fincore", include_str!("crews/fincore.yaml")),
    ("optionstrader", include_str!("crews/optionstrader.yaml")),
    ("profitpilot", include_str!("crews/profitpilot.yaml")),
    ("thinkbot", include_str!("crews/thinkbot.yaml")),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewAgent {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewTask {
    pub name: String,
    pub description: String,
    pub expected_output: String,
    pub agent: String,
    #[serde(default)]
    pub output_file: Option<PathBuf>,
    /// Structured output the task's answer must follow
    #[serde(default)]
    pub output: Option<ResponseFormat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub agents: BTreeMap<String, CrewAgent>,
    pub tasks: Vec<CrewTask>,
}

impl CrewSpec {
    pub fn from_yaml(source: &str) -> Result<Self> {
        let spec: CrewSpec = serde_yaml::from_str(source)?;
        for task in &spec.tasks {
            if !spec.agents.contains_key(&task.agent) {
                return Err(ConfigError::Unknown {
                    kind: "agent",
                    name: task.agent.clone(),
                }
                .into());
            }
        }
        Ok(spec)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read crew file {}", path.display()))?;
        Self::from_yaml(&source)
    }

    /// One of the crews shipped with the library
    pub fn bundled(name: &str) -> Result<Self> {
        let (_, source) = BUNDLED
            .iter()
            .find(|(bundled, _)| *bundled == name)
            .ok_or_else(|| ConfigError::Unknown {
                kind: "crew",
                name: name.to_string(),
            })?;
        Self::from_yaml(source)
    }

    pub fn bundled_names() -> Vec<&'static str> {
        BUNDLED.iter().map(|(name, _)| *name).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub name: String,
    pub agent: String,
    pub raw: String,
    /// The decoded answer of a task with structured output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewOutput {
    pub crew: String,
    pub tasks: Vec<TaskOutput>,
    /// Output of the last task
    pub raw: String,
}

/// Kicks off crews against a shared provider and tool registry
#[derive(Clone)]
pub struct CrewRunner {
    provider: Arc<dyn Provider>,
    registry: ToolRegistry,
    model: String,
    output_dir: PathBuf,
}

impl CrewRunner {
    pub fn new(provider: Arc<dyn Provider>, registry: ToolRegistry, model: impl Into<String>) -> Self {
        Self {
            provider,
            registry,
            model: model.into(),
            output_dir: PathBuf::from("."),
        }
    }

    /// Relative `output_file` paths are resolved against this directory
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    fn agent_table(&self, spec: &CrewSpec, inputs: &HashMap<String, String>) -> Result<AgentTable> {
        let mut table = AgentTable::new();
        for (id, agent) in &spec.agents {
            let instructions = load_prompt_file(
                "crew_agent.md",
                &json!({
                    "role": load_prompt(&agent.role, inputs)?.trim(),
                    "goal": load_prompt(&agent.goal, inputs)?.trim(),
                    "backstory": load_prompt(&agent.backstory, inputs)?.trim(),
                }),
            )?;
            let model = agent.model.clone().unwrap_or_else(|| self.model.clone());
            table.insert(AgentSpec::new(id, instructions, model).with_tools(agent.tools.clone()));
        }
        Ok(table)
    }

    /// Run every task in order. Each task sees the outputs of the tasks before it.
    pub async fn kickoff(&self, spec: &CrewSpec, inputs: &HashMap<String, String>) -> Result<CrewOutput> {
        tracing::info!(crew = %spec.name, "crew kickoff");
        let runner = AgentRunner::new(
            self.provider.clone(),
            self.registry.clone(),
            self.agent_table(spec, inputs)?,
        );

        let mut outputs: Vec<TaskOutput> = Vec::new();
        for task in &spec.tasks {
            let context: Vec<&str> = outputs.iter().map(|o| o.raw.as_str()).collect();
            let prompt = load_prompt_file(
                "crew_task.md",
                &json!({
                    "description": load_prompt(&task.description, inputs)?.trim(),
                    "expected_output": load_prompt(&task.expected_output, inputs)?.trim(),
                    "context": context,
                }),
            )
            .with_context(|| format!("Failed to render task {}", task.name))?;

            tracing::info!(task = %task.name, agent = %task.agent, "running task");
            let output = match &task.output {
                Some(format) => {
                    let spec = runner
                        .table()
                        .get(&task.agent)
                        .cloned()
                        .ok_or_else(|| RunnerError::UnknownAgent(task.agent.clone()))?
                        .with_output(format.clone());
                    runner.run_spec(&spec, &prompt).await?
                }
                None => runner.run(&task.agent, &prompt).await?,
            };

            if let Some(file) = &task.output_file {
                let content = match &output.value {
                    Some(value) => serde_json::to_string_pretty(value)?,
                    None => output.text.clone(),
                };
                self.write_output(file, &content)?;
            }
            outputs.push(TaskOutput {
                name: task.name.clone(),
                agent: task.agent.clone(),
                raw: output.text,
                json: output.value,
            });
        }

        let raw = outputs.last().map(|o| o.raw.clone()).unwrap_or_default();
        Ok(CrewOutput {
            crew: spec.name.clone(),
            tasks: outputs,
            raw,
        })
    }

    fn write_output(&self, file: &Path, content: &str) -> Result<()> {
        let path = self.output_dir.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)
            .with_context(|| format!("Failed to write task output {}", path.display()))?;
        tracing::debug!(path = %path.display(), "task output written");
        Ok(())
    }
}
