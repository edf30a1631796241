use async_trait::async_trait;
use metrics::counter;

use crate::error::TableError;
use crate::view::TableSnapshot;

/// Where refreshed views go. The presentation layer implements this; the
/// core never knows how rows end up on screen.
#[async_trait]
pub trait RenderSink {
    async fn render(&self, snapshot: &TableSnapshot) -> Result<(), TableError>;
}

/// Renders the table to the log. Doubles as the demo presentation layer and
/// as a stand-in sink in tests.
pub struct PrintSink {}

#[async_trait]
impl RenderSink for PrintSink {
    async fn render(&self, snapshot: &TableSnapshot) -> Result<(), TableError> {
        counter!("table_renders_total").increment(1);

        let headings: Vec<String> = snapshot
            .headings
            .iter()
            .map(|heading| {
                if heading.filtered {
                    format!("*{}", heading.title)
                } else {
                    heading.title.clone()
                }
            })
            .collect();
        tracing::info!(rows = snapshot.rows.len(), "{}", headings.join(" | "));

        for row in &snapshot.rows {
            tracing::info!(duplicate = row.duplicate, "{}", row.cells.join(" | "));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{Heading, TableRow};

    #[tokio::test]
    async fn print_sink_accepts_any_snapshot() {
        let snapshot = TableSnapshot {
            headings: vec![Heading {
                title: String::from("Quantity"),
                filtered: true,
            }],
            rows: vec![TableRow {
                cells: vec![String::from("10")],
                duplicate: false,
            }],
        };
        assert!(PrintSink {}.render(&snapshot).await.is_ok());
    }
}
