//! Plan, search, write and email: the research pipeline as a lazy progress stream
use anyhow::Result;
use futures::future::join_all;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::agents::{AgentRunner, EMAIL, SEARCH_PLANNER, WEB_SEARCH, WRITER};
use crate::models::research::{ReportData, SearchPlan, SearchTask};

pub const DEFAULT_TRACE_URL: &str = "https://platform.openai.com/traces/trace?trace_id=";

/// Status lines a successful run yields before the report
pub const STATUS_LINES: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Model used by every research agent, the provider's model when unset
    #[serde(default)]
    pub model: Option<String>,
    /// How many searches the planner is asked for
    #[serde(default = "default_searches")]
    pub searches: usize,
    /// Prefix of the link shown for each run's trace
    #[serde(default = "default_trace_url")]
    pub trace_url: String,
}

impl ResearchConfig {
    pub fn model_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.model.as_deref().unwrap_or(fallback)
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            model: None,
            searches: default_searches(),
            trace_url: default_trace_url(),
        }
    }
}

fn default_searches() -> usize {
    3
}

fn default_trace_url() -> String {
    DEFAULT_TRACE_URL.to_string()
}

/// A fresh trace identifier: `trace_` followed by 32 hex digits
pub fn new_trace_id() -> String {
    format!("trace_{}", Uuid::new_v4().simple())
}

pub struct ResearchManager {
    runner: AgentRunner,
    trace_url: String,
}

impl ResearchManager {
    pub fn new(runner: AgentRunner, trace_url: impl Into<String>) -> Self {
        Self {
            runner,
            trace_url: trace_url.into(),
        }
    }

    /// Run the whole pipeline for `query`, yielding a status line after each stage and
    /// the markdown report last. Nothing runs until the stream is polled. The first
    /// failing stage ends the stream with its error.
    pub fn run(&self, query: &str) -> BoxStream<'_, Result<String>> {
        let query = query.to_string();
        Box::pin(async_stream::try_stream! {
            let trace_id = new_trace_id();
            let span = tracing::info_span!("research", trace_id = %trace_id);

            yield format!("View trace: {}{}", self.trace_url, trace_id);
            yield "Starting full research pipeline...".to_string();

            let plan = self.plan(&query).instrument(span.clone()).await?;
            yield "Search planner Completed, starting to search...".to_string();

            let results = self.search_all(&plan).instrument(span.clone()).await?;
            yield "Searches completed, writing report...".to_string();

            let report = self.write(&query, &results).instrument(span.clone()).await?;
            yield "Report Writing is done, sending email...".to_string();

            self.email(&report).instrument(span.clone()).await?;
            yield "🎉 Research workflow completed! Check your inbox.".to_string();

            yield report.markdown_report;
        })
    }

    async fn plan(&self, query: &str) -> Result<SearchPlan> {
        tracing::info!("Planning for searches...");
        let plan: SearchPlan = self.runner.run(SEARCH_PLANNER, query).await?.parse()?;
        tracing::info!(searches = plan.searches.len(), "search plan ready");
        Ok(plan)
    }

    async fn search(&self, task: &SearchTask) -> Result<String> {
        Ok(self.runner.run(WEB_SEARCH, &task.prompt()).await?.text)
    }

    /// Issue every search at once and wait for all of them. Any failure fails the stage,
    /// but only after every search has finished.
    async fn search_all(&self, plan: &SearchPlan) -> Result<Vec<String>> {
        let outcomes = join_all(plan.searches.iter().map(|task| self.search(task))).await;
        let results = outcomes.into_iter().collect::<Result<Vec<_>>>()?;
        tracing::info!(completed = results.len(), "searches finished");
        Ok(results)
    }

    async fn write(&self, query: &str, results: &[String]) -> Result<ReportData> {
        let input = format!(
            "Original query: {}\nSummarized search results: {:?}",
            query, results
        );
        let report: ReportData = self.runner.run(WRITER, &input).await?.parse()?;
        tracing::info!("report written");
        Ok(report)
    }

    async fn email(&self, report: &ReportData) -> Result<()> {
        self.runner.run(EMAIL, &report.markdown_report).await?;
        tracing::info!("report emailed");
        Ok(())
    }
}
