use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_COUNTRY: &str = "Kenya";
pub const DEFAULT_MAX_QUALIFIERS: i64 = 5;
pub const DEFAULT_ROUND_NAME: &str = "Pool A";
pub const DEFAULT_SENDER_ROLE: &str = "Sports Officer";

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

// ==================== Enumerations ====================

/// One of the five hierarchical competition stages, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum CompetitionLevel {
    Zone,
    Subcounty,
    County,
    Region,
    National,
}

impl CompetitionLevel {
    pub const ALL: [CompetitionLevel; 5] = [
        CompetitionLevel::Zone,
        CompetitionLevel::Subcounty,
        CompetitionLevel::County,
        CompetitionLevel::Region,
        CompetitionLevel::National,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CompetitionLevel::Zone => "Zone",
            CompetitionLevel::Subcounty => "Sub-County",
            CompetitionLevel::County => "County",
            CompetitionLevel::Region => "Region",
            CompetitionLevel::National => "National",
        }
    }

    /// The stage qualifiers advance to, if any.
    pub fn next(&self) -> Option<CompetitionLevel> {
        match self {
            CompetitionLevel::Zone => Some(CompetitionLevel::Subcounty),
            CompetitionLevel::Subcounty => Some(CompetitionLevel::County),
            CompetitionLevel::County => Some(CompetitionLevel::Region),
            CompetitionLevel::Region => Some(CompetitionLevel::National),
            CompetitionLevel::National => None,
        }
    }

    pub fn proceeding_to_label(&self) -> &'static str {
        self.next().map(|l| l.label()).unwrap_or("Champions")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum GameCategory {
    BallGames,
    Athletics,
    Music,
    Other,
}

impl GameCategory {
    pub const ALL: [GameCategory; 4] = [
        GameCategory::BallGames,
        GameCategory::Athletics,
        GameCategory::Music,
        GameCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            GameCategory::BallGames => "Ball Games",
            GameCategory::Athletics => "Athletics",
            GameCategory::Music => "Music",
            GameCategory::Other => "Other Games",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Boys,
    Girls,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum SchoolLevel {
    #[default]
    Primary,
    JuniorSecondary,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum HeatType {
    #[default]
    Heat,
    Final,
}

// ==================== Entities ====================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Admin {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: Option<String>,
    pub created_at: String,
}

impl Admin {
    pub fn new(username: String, password_hash: String, email: Option<String>) -> Self {
        Self {
            id: new_id(),
            username,
            password_hash,
            email,
            created_at: now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct School {
    pub id: String,
    pub name: String,
    pub zone: String,
    pub subcounty: String,
    pub county: String,
    pub region: String,
    pub country: String,
    pub created_at: String,
    pub updated_at: String,
}

impl School {
    pub fn new(
        name: String,
        zone: String,
        subcounty: String,
        county: String,
        region: String,
        country: Option<String>,
    ) -> Self {
        let created_at = now();
        Self {
            id: new_id(),
            name,
            zone,
            subcounty,
            county,
            region,
            country: country
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            updated_at: created_at.clone(),
            created_at,
        }
    }

    /// Case-insensitive substring match against the name and every location field.
    pub fn matches_location(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            &self.name,
            &self.zone,
            &self.subcounty,
            &self.county,
            &self.region,
            &self.country,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Game {
    pub id: String,
    pub name: String,
    pub category: GameCategory,
    pub level: CompetitionLevel,
    pub gender: Gender,
    pub school_level: SchoolLevel,
    pub description: Option<String>,
    pub is_timed: bool,
    pub max_qualifiers: i64,
    pub race_type: Option<String>,
    pub championship_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Participant {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub school_id: String,
    pub game_id: String,
    pub gender: Gender,
    pub time_taken: Option<f64>,
    pub position: Option<i64>,
    pub score: Option<f64>,
    pub is_qualified: bool,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Participant {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Participant row with its school and game attached, as list views render it.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantDetail {
    #[serde(flatten)]
    pub participant: Participant,
    pub school: Option<School>,
    pub game: Option<Game>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Heat {
    pub id: String,
    pub game_id: String,
    pub heat_number: i64,
    pub heat_type: HeatType,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HeatParticipant {
    pub id: String,
    pub heat_id: String,
    pub participant_id: String,
    pub time_taken: Option<f64>,
    pub position: Option<i64>,
    pub is_qualified_for_final: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatParticipantDetail {
    #[serde(flatten)]
    pub entry: HeatParticipant,
    pub participant: Option<ParticipantDetail>,
    pub heat: Option<Heat>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchPool {
    pub id: String,
    pub game_id: String,
    pub round_name: String,
    pub team_a_school_id: Option<String>,
    pub team_b_school_id: Option<String>,
    pub team_a_score: Option<i64>,
    pub team_b_score: Option<i64>,
    pub winner_school_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchPoolDetail {
    #[serde(flatten)]
    pub pool: MatchPool,
    pub team_a_school: Option<School>,
    pub team_b_school: Option<School>,
    pub winner_school: Option<School>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Championship {
    pub id: String,
    pub name: String,
    pub level: CompetitionLevel,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Circular {
    pub id: String,
    pub title: String,
    pub content: String,
    pub sender_name: String,
    pub sender_role: String,
    pub target_level: CompetitionLevel,
    pub is_published: bool,
    pub created_at: String,
    pub updated_at: String,
}
