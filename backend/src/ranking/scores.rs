//! Overall score table: grand totals per school across every game that
//! passes the active filters.

use super::ResultFilter;
use crate::db::models::{Game, Gender, Participant, School, SchoolLevel};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

const UNKNOWN_SCHOOL: &str = "Unknown";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TeamScore {
    pub school_id: String,
    pub school_name: String,
    pub zone: String,
    pub subcounty: String,
    pub county: String,
    pub region: String,
    pub total_score: f64,
    pub games_played: usize,
    pub boys_score: f64,
    pub girls_score: f64,
    pub primary_score: f64,
    pub junior_secondary_score: f64,
}

impl TeamScore {
    fn new(school_id: &str, school: Option<&School>) -> Self {
        let field = |f: fn(&School) -> &String| school.map(|s| f(s).clone()).unwrap_or_default();
        Self {
            school_id: school_id.to_string(),
            school_name: school
                .map(|s| s.name.clone())
                .unwrap_or_else(|| UNKNOWN_SCHOOL.to_string()),
            zone: field(|s| &s.zone),
            subcounty: field(|s| &s.subcounty),
            county: field(|s| &s.county),
            region: field(|s| &s.region),
            total_score: 0.0,
            games_played: 0,
            boys_score: 0.0,
            girls_score: 0.0,
            primary_score: 0.0,
            junior_secondary_score: 0.0,
        }
    }

    fn add(&mut self, game: &Game, score: f64) {
        self.total_score += score;
        match game.gender {
            Gender::Boys => self.boys_score += score,
            Gender::Girls => self.girls_score += score,
        }
        match game.school_level {
            SchoolLevel::Primary => self.primary_score += score,
            SchoolLevel::JuniorSecondary => self.junior_secondary_score += score,
        }
    }
}

/// Per-school score table ordered by descending grand total. Schools with
/// equal totals stay in the order their first participant was seen.
///
/// Participants whose game is unknown are ignored. One predicate decides
/// which participants count, so `games_played` always describes the same
/// rows that make up the totals.
pub fn aggregate_scores(
    games: &[Game],
    participants: &[Participant],
    schools: &[School],
    filter: &ResultFilter,
) -> Vec<TeamScore> {
    let games: HashMap<&str, &Game> = games.iter().map(|g| (g.id.as_str(), g)).collect();
    let schools: HashMap<&str, &School> = schools.iter().map(|s| (s.id.as_str(), s)).collect();
    let location = filter.location();

    let mut table: Vec<TeamScore> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut games_by_school: HashMap<&str, HashSet<&str>> = HashMap::new();

    for p in participants {
        let Some(game) = games.get(p.game_id.as_str()) else {
            continue;
        };
        if !filter.admits_game(game) {
            continue;
        }
        let school = schools.get(p.school_id.as_str()).copied();
        if let Some(needle) = location {
            if !school.is_some_and(|s| s.matches_location(needle)) {
                continue;
            }
        }

        let slot = *index.entry(p.school_id.as_str()).or_insert_with(|| {
            table.push(TeamScore::new(&p.school_id, school));
            table.len() - 1
        });
        table[slot].add(game, p.score.unwrap_or(0.0));

        games_by_school
            .entry(p.school_id.as_str())
            .or_default()
            .insert(p.game_id.as_str());
    }

    for entry in &mut table {
        entry.games_played = games_by_school
            .get(entry.school_id.as_str())
            .map_or(0, HashSet::len);
    }

    table.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{CompetitionLevel, GameCategory};

    fn school(id: &str, county: &str) -> School {
        School {
            id: id.to_string(),
            name: format!("{} School", id),
            zone: "Central".to_string(),
            subcounty: "East".to_string(),
            county: county.to_string(),
            region: "Nyanza".to_string(),
            country: "Kenya".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn game(id: &str, gender: Gender, school_level: SchoolLevel, level: CompetitionLevel) -> Game {
        Game {
            id: id.to_string(),
            name: id.to_string(),
            category: GameCategory::Athletics,
            level,
            gender,
            school_level,
            description: None,
            is_timed: false,
            max_qualifiers: 5,
            race_type: None,
            championship_id: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn entry(id: &str, school_id: &str, game_id: &str, score: Option<f64>) -> Participant {
        Participant {
            id: id.to_string(),
            first_name: id.to_string(),
            last_name: "Test".to_string(),
            school_id: school_id.to_string(),
            game_id: game_id.to_string(),
            gender: Gender::Boys,
            time_taken: None,
            position: None,
            score,
            is_qualified: false,
            notes: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_two_scores_same_school() {
        let games = vec![
            game("g1", Gender::Boys, SchoolLevel::Primary, CompetitionLevel::Zone),
            game("g2", Gender::Girls, SchoolLevel::Primary, CompetitionLevel::Zone),
        ];
        let schools = vec![school("s1", "Kisumu")];
        let participants = vec![
            entry("p1", "s1", "g1", Some(10.0)),
            entry("p2", "s1", "g2", Some(5.0)),
        ];

        let table = aggregate_scores(&games, &participants, &schools, &ResultFilter::default());
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].total_score, 15.0);
        assert_eq!(table[0].games_played, 2);
        assert_eq!(table[0].boys_score, 10.0);
        assert_eq!(table[0].girls_score, 5.0);
        assert_eq!(table[0].primary_score, 15.0);
    }

    #[test]
    fn test_same_game_counts_once() {
        let games = vec![game("g1", Gender::Boys, SchoolLevel::Primary, CompetitionLevel::Zone)];
        let schools = vec![school("s1", "Kisumu")];
        let participants = vec![
            entry("p1", "s1", "g1", Some(3.0)),
            entry("p2", "s1", "g1", None),
        ];

        let table = aggregate_scores(&games, &participants, &schools, &ResultFilter::default());
        assert_eq!(table[0].total_score, 3.0);
        assert_eq!(table[0].games_played, 1);
    }

    #[test]
    fn test_grand_total_equals_sum_of_scores() {
        let games = vec![
            game("g1", Gender::Boys, SchoolLevel::Primary, CompetitionLevel::Zone),
            game("g2", Gender::Girls, SchoolLevel::JuniorSecondary, CompetitionLevel::County),
        ];
        let schools = vec![school("s1", "Kisumu"), school("s2", "Siaya")];
        let participants = vec![
            entry("p1", "s1", "g1", Some(4.0)),
            entry("p2", "s2", "g1", Some(7.5)),
            entry("p3", "s1", "g2", None),
            entry("p4", "s2", "g2", Some(2.0)),
            entry("p5", "s1", "g2", Some(1.0)),
        ];

        let table = aggregate_scores(&games, &participants, &schools, &ResultFilter::default());
        for row in &table {
            let expected: f64 = participants
                .iter()
                .filter(|p| p.school_id == row.school_id)
                .map(|p| p.score.unwrap_or(0.0))
                .sum();
            assert_eq!(row.total_score, expected);
        }
        assert_eq!(table[0].school_id, "s2");
    }

    #[test]
    fn test_filters_apply_to_totals_and_game_counts() {
        let games = vec![
            game("boys", Gender::Boys, SchoolLevel::Primary, CompetitionLevel::Zone),
            game("girls", Gender::Girls, SchoolLevel::Primary, CompetitionLevel::Zone),
        ];
        let schools = vec![school("s1", "Kisumu")];
        let participants = vec![
            entry("p1", "s1", "boys", Some(6.0)),
            entry("p2", "s1", "girls", Some(9.0)),
        ];
        let filter = ResultFilter {
            gender: Some(Gender::Girls),
            ..Default::default()
        };

        let table = aggregate_scores(&games, &participants, &schools, &filter);
        assert_eq!(table[0].total_score, 9.0);
        assert_eq!(table[0].games_played, 1);
        assert_eq!(table[0].boys_score, 0.0);
    }

    #[test]
    fn test_location_filter() {
        let games = vec![game("g1", Gender::Boys, SchoolLevel::Primary, CompetitionLevel::Zone)];
        let schools = vec![school("s1", "Kisumu"), school("s2", "Siaya")];
        let participants = vec![
            entry("p1", "s1", "g1", Some(1.0)),
            entry("p2", "s2", "g1", Some(2.0)),
            entry("p3", "missing", "g1", Some(3.0)),
        ];
        let filter = ResultFilter {
            location: Some("siaya".to_string()),
            ..Default::default()
        };

        let table = aggregate_scores(&games, &participants, &schools, &filter);
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].school_id, "s2");
        assert_eq!(table[0].games_played, 1);
    }

    #[test]
    fn test_unknown_game_and_school() {
        let games = vec![game("g1", Gender::Boys, SchoolLevel::Primary, CompetitionLevel::Zone)];
        let participants = vec![
            entry("p1", "ghost", "g1", Some(2.0)),
            entry("p2", "ghost", "deleted-game", Some(50.0)),
        ];

        let table = aggregate_scores(&games, &participants, &[], &ResultFilter::default());
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].school_name, "Unknown");
        assert_eq!(table[0].zone, "");
        assert_eq!(table[0].total_score, 2.0);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let games = vec![game("g1", Gender::Boys, SchoolLevel::Primary, CompetitionLevel::Zone)];
        let schools = vec![school("a", "Kisumu"), school("b", "Kisumu")];
        let participants = vec![
            entry("p1", "b", "g1", Some(4.0)),
            entry("p2", "a", "g1", Some(4.0)),
        ];

        let table = aggregate_scores(&games, &participants, &schools, &ResultFilter::default());
        let order: Vec<&str> = table.iter().map(|t| t.school_id.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
    }
}
