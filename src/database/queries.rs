use crate::database::models::CapRecord;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

// Name queries
pub async fn register_names(pool: &SqlitePool, names: &[String]) -> Result<()> {
    let mut tx = pool.begin().await?;

    for name in names {
        sqlx::query("INSERT INTO names (rsn) VALUES (?) ON CONFLICT (rsn) DO NOTHING")
            .bind(name)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
pub async fn get_names(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows = sqlx::query("SELECT rsn FROM names ORDER BY id ASC")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|row| row.get("rsn")).collect())
}

// Cap queries
pub async fn upsert_cap(pool: &SqlitePool, rsn: &str, cap_time: DateTime<Utc>) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO caps (rsn, last_cap_time, announced_at) VALUES (?, ?, ?)
         ON CONFLICT (rsn) DO UPDATE
         SET last_cap_time = excluded.last_cap_time, announced_at = excluded.announced_at",
    )
    .bind(rsn)
    .bind(cap_time)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn get_cap(pool: &SqlitePool, rsn: &str) -> Result<Option<CapRecord>> {
    let row_opt = sqlx::query(
        "SELECT id, rsn, last_cap_time, announced_at FROM caps WHERE rsn = ?",
    )
    .bind(rsn)
    .fetch_optional(pool)
    .await?;

    Ok(row_opt.map(cap_from_row))
}

pub async fn get_caps(pool: &SqlitePool) -> Result<Vec<CapRecord>> {
    let rows = sqlx::query("SELECT id, rsn, last_cap_time, announced_at FROM caps ORDER BY id ASC")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(cap_from_row).collect())
}

pub async fn get_cap_names(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows = sqlx::query("SELECT rsn FROM caps ORDER BY id ASC")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|row| row.get("rsn")).collect())
}

fn cap_from_row(row: SqliteRow) -> CapRecord {
    CapRecord {
        id: row.get("id"),
        rsn: row.get("rsn"),
        last_cap_time: row.get("last_cap_time"),
        announced_at: row.get("announced_at"),
    }
}
