use super::{
    models::{Championship, CompetitionLevel},
    DbPool,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NewChampionship {
    pub name: String,
    pub level: CompetitionLevel,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChampionshipUpdate {
    pub name: Option<String>,
    pub level: Option<CompetitionLevel>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Newest first.
pub async fn list(pool: &DbPool) -> Result<Vec<Championship>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM championships ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn get(pool: &DbPool, id: &str) -> Result<Championship, sqlx::Error> {
    sqlx::query_as("SELECT * FROM championships WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn insert(pool: &DbPool, new: NewChampionship) -> Result<Championship, sqlx::Error> {
    let now = Utc::now().to_rfc3339();
    let championship = Championship {
        id: Uuid::new_v4().to_string(),
        name: new.name,
        level: new.level,
        description: non_blank(new.description),
        location: non_blank(new.location),
        start_date: non_blank(new.start_date),
        end_date: non_blank(new.end_date),
        created_at: now.clone(),
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO championships (id, name, level, description, location, start_date, end_date, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&championship.id)
    .bind(&championship.name)
    .bind(championship.level)
    .bind(&championship.description)
    .bind(&championship.location)
    .bind(&championship.start_date)
    .bind(&championship.end_date)
    .bind(&championship.created_at)
    .bind(&championship.updated_at)
    .execute(pool)
    .await?;

    Ok(championship)
}

pub async fn update(
    pool: &DbPool,
    id: &str,
    changes: ChampionshipUpdate,
) -> Result<Championship, sqlx::Error> {
    let mut c = get(pool, id).await?;

    if let Some(name) = changes.name {
        c.name = name;
    }
    if let Some(level) = changes.level {
        c.level = level;
    }
    if let Some(description) = changes.description {
        c.description = non_blank(Some(description));
    }
    if let Some(location) = changes.location {
        c.location = non_blank(Some(location));
    }
    if let Some(start_date) = changes.start_date {
        c.start_date = non_blank(Some(start_date));
    }
    if let Some(end_date) = changes.end_date {
        c.end_date = non_blank(Some(end_date));
    }
    c.updated_at = Utc::now().to_rfc3339();

    sqlx::query(
        "UPDATE championships SET name = ?, level = ?, description = ?, location = ?, start_date = ?, end_date = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&c.name)
    .bind(c.level)
    .bind(&c.description)
    .bind(&c.location)
    .bind(&c.start_date)
    .bind(&c.end_date)
    .bind(&c.updated_at)
    .bind(&c.id)
    .execute(pool)
    .await?;

    Ok(c)
}

pub async fn delete(pool: &DbPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM championships WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Championships without a start date, or starting today or later. Keeps the
/// incoming order and returns at most `limit` entries.
pub fn upcoming(championships: &[Championship], today: NaiveDate, limit: usize) -> Vec<Championship> {
    championships
        .iter()
        .filter(|c| match c.start_date.as_deref() {
            None => true,
            Some(start) => parse_date(start).map_or(true, |d| d >= today),
        })
        .take(limit)
        .cloned()
        .collect()
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let date_part = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn championship(name: &str, start: Option<&str>) -> Championship {
        Championship {
            id: name.to_string(),
            name: name.to_string(),
            level: CompetitionLevel::County,
            description: None,
            location: None,
            start_date: start.map(str::to_string),
            end_date: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_upcoming_filters_past_dates() {
        let today = NaiveDate::from_ymd_opt(2026, 5, 10).unwrap();
        let list = vec![
            championship("past", Some("2026-05-09")),
            championship("today", Some("2026-05-10")),
            championship("undated", None),
            championship("future", Some("2026-06-01T08:00:00Z")),
        ];

        let names: Vec<String> = upcoming(&list, today, 10).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["today", "undated", "future"]);
    }

    #[test]
    fn test_upcoming_respects_limit() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let list: Vec<Championship> = (0..5)
            .map(|i| championship(&format!("c{}", i), None))
            .collect();
        assert_eq!(upcoming(&list, today, 3).len(), 3);
    }
}
