//! Database layer: migrations, event queries and the indexer cursor.

use sqlx::{sqlite::SqliteConnectOptions, sqlite::SqlitePoolOptions, SqlitePool};
use std::str::FromStr;
use tracing::info;

use crate::errors::Result;
use crate::events::{ChainEvent, EventRecord};

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    // Make sure the file is created if it doesn't exist yet.
    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied successfully");
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Cursor helpers
// ─────────────────────────────────────────────────────────

/// First block the indexer has not scanned yet; `0` on a fresh database.
pub async fn get_next_block(pool: &SqlitePool) -> Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT next_block FROM indexer_cursor WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(v,)| v).unwrap_or(0))
}

pub async fn save_cursor(pool: &SqlitePool, next_block: i64) -> Result<()> {
    sqlx::query("UPDATE indexer_cursor SET next_block = ?1 WHERE id = 1")
        .bind(next_block)
        .execute(pool)
        .await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Event writes
// ─────────────────────────────────────────────────────────

/// Persist a batch of decoded events. A log is identified by
/// `(tx_hash, log_index)`; re-inserting it is silently ignored, which makes
/// rescanning a block window harmless.
pub async fn insert_events(pool: &SqlitePool, events: &[ChainEvent]) -> Result<usize> {
    let mut count = 0usize;
    for ev in events {
        let rows_affected = sqlx::query(
            r#"
            INSERT OR IGNORE INTO events
                (event_type, product_id, actor, subject, detail, status,
                 block_number, log_index, timestamp, contract_address, tx_hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&ev.event_type)
        .bind(&ev.product_id)
        .bind(&ev.actor)
        .bind(&ev.subject)
        .bind(&ev.detail)
        .bind(ev.status)
        .bind(ev.block_number)
        .bind(ev.log_index)
        .bind(ev.timestamp)
        .bind(&ev.contract_address)
        .bind(&ev.tx_hash)
        .execute(pool)
        .await?
        .rows_affected();

        count += rows_affected as usize;
    }
    Ok(count)
}

// ─────────────────────────────────────────────────────────
// Event reads
// ─────────────────────────────────────────────────────────

/// Fetch all events for a given product, oldest first.
pub async fn get_events_for_product(
    pool: &SqlitePool,
    product_id: &str,
) -> Result<Vec<EventRecord>> {
    let rows = sqlx::query_as::<_, EventRecord>(
        r#"
        SELECT id, event_type, product_id, actor, subject, detail, status,
               block_number, log_index, timestamp, contract_address, tx_hash, created_at
        FROM   events
        WHERE  product_id = ?1
        ORDER  BY block_number ASC, log_index ASC
        "#,
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fetch all events, oldest first.
pub async fn get_all_events(pool: &SqlitePool) -> Result<Vec<EventRecord>> {
    let rows = sqlx::query_as::<_, EventRecord>(
        r#"
        SELECT id, event_type, product_id, actor, subject, detail, status,
               block_number, log_index, timestamp, contract_address, tx_hash, created_at
        FROM   events
        ORDER  BY block_number ASC, log_index ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// In-memory databases are per-connection, so the pool holds exactly one.
    pub(crate) async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        migrate(&pool).await.unwrap();
        pool
    }

    fn event(product_id: &str, block: i64, log_index: i64) -> ChainEvent {
        ChainEvent {
            event_type: "status_updated".into(),
            product_id: Some(product_id.into()),
            actor: Some("0x00000000000000000000000000000000000000aa".into()),
            subject: None,
            detail: Some("Warehouse 7".into()),
            status: Some(1),
            block_number: block,
            log_index,
            timestamp: 1_704_067_200,
            contract_address: "0x00000000000000000000000000000000000000c0".into(),
            tx_hash: format!("0x{block:064x}"),
        }
    }

    #[tokio::test]
    async fn duplicate_logs_are_ignored() {
        let pool = memory_pool().await;
        let batch = vec![event("1", 10, 0), event("1", 10, 1)];

        assert_eq!(insert_events(&pool, &batch).await.unwrap(), 2);
        assert_eq!(insert_events(&pool, &batch).await.unwrap(), 0);
        assert_eq!(get_all_events(&pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn product_events_are_filtered_and_ordered() {
        let pool = memory_pool().await;
        let batch = vec![event("2", 12, 0), event("1", 11, 0), event("1", 10, 4)];
        insert_events(&pool, &batch).await.unwrap();

        let rows = get_events_for_product(&pool, "1").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].block_number, 10);
        assert_eq!(rows[1].block_number, 11);
    }

    #[tokio::test]
    async fn cursor_round_trips() {
        let pool = memory_pool().await;
        assert_eq!(get_next_block(&pool).await.unwrap(), 0);
        save_cursor(&pool, 1234).await.unwrap();
        assert_eq!(get_next_block(&pool).await.unwrap(), 1234);
    }
}
