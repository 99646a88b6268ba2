use super::{models::School, DbPool};
use chrono::Utc;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct NewSchool {
    pub name: String,
    pub zone: String,
    pub subcounty: String,
    pub county: String,
    pub region: String,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchoolUpdate {
    pub name: Option<String>,
    pub zone: Option<String>,
    pub subcounty: Option<String>,
    pub county: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

pub async fn list(pool: &DbPool) -> Result<Vec<School>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM schools ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn get(pool: &DbPool, id: &str) -> Result<School, sqlx::Error> {
    sqlx::query_as("SELECT * FROM schools WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn insert(pool: &DbPool, new: NewSchool) -> Result<School, sqlx::Error> {
    let school = School::new(
        new.name,
        new.zone,
        new.subcounty,
        new.county,
        new.region,
        new.country,
    );

    sqlx::query(
        "INSERT INTO schools (id, name, zone, subcounty, county, region, country, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&school.id)
    .bind(&school.name)
    .bind(&school.zone)
    .bind(&school.subcounty)
    .bind(&school.county)
    .bind(&school.region)
    .bind(&school.country)
    .bind(&school.created_at)
    .bind(&school.updated_at)
    .execute(pool)
    .await?;

    Ok(school)
}

pub async fn update(pool: &DbPool, id: &str, changes: SchoolUpdate) -> Result<School, sqlx::Error> {
    let mut school = get(pool, id).await?;

    if let Some(name) = changes.name {
        school.name = name;
    }
    if let Some(zone) = changes.zone {
        school.zone = zone;
    }
    if let Some(subcounty) = changes.subcounty {
        school.subcounty = subcounty;
    }
    if let Some(county) = changes.county {
        school.county = county;
    }
    if let Some(region) = changes.region {
        school.region = region;
    }
    if let Some(country) = changes.country {
        school.country = country;
    }
    school.updated_at = Utc::now().to_rfc3339();

    sqlx::query(
        "UPDATE schools SET name = ?, zone = ?, subcounty = ?, county = ?, region = ?, country = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&school.name)
    .bind(&school.zone)
    .bind(&school.subcounty)
    .bind(&school.county)
    .bind(&school.region)
    .bind(&school.country)
    .bind(&school.updated_at)
    .bind(&school.id)
    .execute(pool)
    .await?;

    Ok(school)
}

/// Returns false when no school had that id.
pub async fn delete(pool: &DbPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM schools WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
