use anyhow::Result;
use cliclack::input;
use console::style;
use futures::{Stream, StreamExt};
use switchboard::configuration::Services;
use switchboard::research::STATUS_LINES;

use crate::render::print_markdown;

pub async fn run(services: &Services, query: Option<String>) -> Result<()> {
    let query = match query {
        Some(query) => query,
        None => input("Enter your financial research query:")
            .placeholder("")
            .interact()?,
    };

    let manager = services.research_manager()?;
    let report = follow(manager.run(&query), |status| {
        println!("{} {}", style("•").cyan(), status)
    })
    .await?;

    if let Some(report) = report {
        println!("\n");
        print_markdown(&report)?;
    }
    Ok(())
}

/// Hand each status line to `on_status` as soon as it arrives and return the report.
/// Lines before a failure are still shown.
async fn follow<S>(mut progress: S, mut on_status: impl FnMut(&str)) -> Result<Option<String>>
where
    S: Stream<Item = Result<String>> + Unpin,
{
    let mut seen = 0;
    while let Some(item) = progress.next().await {
        let item = item?;
        if seen == STATUS_LINES {
            return Ok(Some(item));
        }
        on_status(&item);
        seen += 1;
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use futures::stream;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_status_shown_before_next_stage() {
        let shown = Arc::new(Mutex::new(Vec::new()));
        let seen = shown.clone();
        let progress = stream::iter(vec![Ok::<_, anyhow::Error>("first".to_string())]).chain(
            stream::once(async move {
                // the first line must already be out while the next stage runs
                assert_eq!(seen.lock().unwrap().as_slice(), ["first"]);
                Ok("second".to_string())
            }),
        );

        let report = follow(Box::pin(progress), |status| {
            shown.lock().unwrap().push(status.to_string())
        })
        .await
        .unwrap();

        assert_eq!(report, None);
        assert_eq!(shown.lock().unwrap().as_slice(), ["first", "second"]);
    }

    #[tokio::test]
    async fn test_lines_before_failure_are_shown() {
        let progress = stream::iter(vec![
            Ok("View trace: x".to_string()),
            Ok("Starting full research pipeline...".to_string()),
            Err(anyhow!("planner failed")),
        ]);
        let mut shown = Vec::new();

        let err = follow(progress, |status| shown.push(status.to_string()))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "planner failed");
        assert_eq!(shown, ["View trace: x", "Starting full research pipeline..."]);
    }

    #[tokio::test]
    async fn test_report_is_not_a_status() {
        let mut items: Vec<Result<String>> =
            (0..STATUS_LINES).map(|i| Ok(format!("status {}", i))).collect();
        items.push(Ok("# Report".to_string()));
        let mut shown = Vec::new();

        let report = follow(stream::iter(items), |status| shown.push(status.to_string()))
            .await
            .unwrap();

        assert_eq!(report.as_deref(), Some("# Report"));
        assert_eq!(shown.len(), STATUS_LINES);
    }
}
