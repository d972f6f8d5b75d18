//! Long-running background task that polls the node for contract logs and
//! writes decoded events to the database.

use std::sync::Arc;
use std::time::Duration;

use chain_rpc::{eth, HttpProvider, LogFilter, Provider};
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db;
use crate::events;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub provider: HttpProvider,
}

/// Run the indexer loop until `shutdown` is cancelled.
pub async fn run(state: Arc<IndexerState>, shutdown: CancellationToken) {
    info!(
        contract = %state.config.contract_address,
        rpc = state.provider.url(),
        "Indexer starting"
    );

    // Never go below the configured start block.
    let mut next_block = resume_block(&state.pool, state.config.start_block).await;

    info!("Resuming from block {next_block}");

    loop {
        match poll_once(&state.pool, &state.provider, &state.config, next_block).await {
            Ok(next) => next_block = next,
            Err(e) => error!("Indexer poll error: {e}"),
        }

        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Indexer stopped at block {next_block}");
                return;
            }
            _ = tokio::time::sleep(Duration::from_secs(state.config.poll_interval_secs)) => {}
        }
    }
}

/// Saved cursor, or `start_block` when it is lower or cannot be read.
async fn resume_block(pool: &SqlitePool, start_block: u64) -> u64 {
    let saved = match db::get_next_block(pool).await {
        Ok(next) => next.max(0) as u64,
        Err(e) => {
            warn!("Could not read indexer cursor, starting from block {start_block}: {e}");
            0
        }
    };
    saved.max(start_block)
}

/// Last block of the window starting at `from`, capped at the chain head.
fn window_end(from: u64, head: u64, range: u64) -> u64 {
    from.saturating_add(range.max(1) - 1).min(head)
}

/// Scan one block window.
///
/// Returns the next block to scan.
async fn poll_once(
    pool: &SqlitePool,
    provider: &dyn Provider,
    config: &Config,
    from_block: u64,
) -> crate::errors::Result<u64> {
    let head = eth::block_number(provider).await?;
    if from_block > head {
        return Ok(from_block);
    }

    let filter = LogFilter {
        address: config.contract_address,
        from_block,
        to_block: window_end(from_block, head, config.log_block_range),
    };
    let raw_logs = eth::get_logs(provider, &filter).await?;

    if !raw_logs.is_empty() {
        let decoded = events::decode_logs(&raw_logs);
        let inserted = db::insert_events(pool, &decoded).await?;
        info!(
            "Blocks {}..={}: {} logs → {} new records stored",
            filter.from_block,
            filter.to_block,
            raw_logs.len(),
            inserted
        );
    }

    // Persist cursor so restarts are deterministic.
    let next = filter.to_block + 1;
    db::save_cursor(pool, next as i64).await?;
    Ok(next)
}
