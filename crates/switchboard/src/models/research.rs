//! Structured outputs exchanged between the research pipeline stages
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One search the planner wants performed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchTask {
    /// Why this particular search matters
    pub reason: String,
    /// The actual web search string
    pub query: String,
}

impl SearchTask {
    /// The input handed to the search agent
    pub fn prompt(&self) -> String {
        format!(
            "Search term: {}\nReason for searching: {}",
            self.query, self.reason
        )
    }
}

/// Ordered list of searches produced by the planning stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPlan {
    pub searches: Vec<SearchTask>,
}

impl SearchPlan {
    pub fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "searches": {
                    "type": "array",
                    "description": "A list of web searches to perform to best answer the query",
                    "items": {
                        "type": "object",
                        "properties": {
                            "reason": {
                                "type": "string",
                                "description": "Your reasoning for why this search is important to the query"
                            },
                            "query": {
                                "type": "string",
                                "description": "The search term to use for the web search"
                            }
                        },
                        "required": ["reason", "query"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["searches"],
            "additionalProperties": false
        })
    }
}

/// The final artifact of a research run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    /// A short 2-3 sentence summary of the findings
    pub short_summary: String,
    /// The final report, in markdown
    pub markdown_report: String,
    /// Suggested topics to research further
    pub follow_up_questions: Vec<String>,
}

impl ReportData {
    pub fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "short_summary": {
                    "type": "string",
                    "description": "A short 2-3 sentence summary of the findings."
                },
                "markdown_report": {
                    "type": "string",
                    "description": "The final report"
                },
                "follow_up_questions": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Suggested topics to research further"
                }
            },
            "required": ["short_summary", "markdown_report", "follow_up_questions"],
            "additionalProperties": false
        })
    }
}
