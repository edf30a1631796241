//! Consume transaction messages and maintain the live table view.
use std::sync::Arc;

use envconfig::Envconfig;
use tokio_util::sync::CancellationToken;
use tracing::info;

mod config;
mod consumer;
mod error;
mod metrics;
mod source;

use config::Config;
use consumer::ConsumerLoop;
use error::ConsumerError;
use message_table::dedup::DuplicateDetector;
use message_table::sink::{PrintSink, RenderSink};
use message_table::store::RowStore;
use message_table::view::MessageTable;
use source::StdinSource;

#[tokio::main]
async fn main() -> Result<(), ConsumerError> {
    tracing_subscriber::fmt::init();

    let config = Config::init_from_env().expect("Invalid configuration:");

    let store = RowStore::new(&config.table_name, &config.database_url).await?;
    let table = Arc::new(MessageTable::new(
        store,
        DuplicateDetector::new(config.dedup_strategy),
    ));

    if config.export_prometheus {
        let bind = config.bind();
        tokio::task::spawn(async move {
            let router = metrics::setup_metrics_router();
            metrics::serve(router, &bind)
                .await
                .expect("failed to start serving metrics");
        });
    }

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl+c");
        info!("shutdown signal received");
        signal_cancel.cancel();
    });

    // Render whatever the store already holds before consuming new messages.
    let sink: Arc<dyn RenderSink + Send + Sync> = Arc::new(PrintSink {});
    let snapshot = table.refresh().await?;
    if let Err(error) = sink.render(&snapshot).await {
        tracing::error!(error = %error, "failed to render stored rows");
    }

    let source = StdinSource::new(config.message_version.clone());
    let consumer = ConsumerLoop::new(source, table, sink);
    consumer.run(cancel).await;

    info!("consumer shut down");
    Ok(())
}
