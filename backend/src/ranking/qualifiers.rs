use super::ResultFilter;
use crate::db::models::{Game, Participant, School};
use serde::Serialize;
use std::collections::HashMap;

/// Position used for qualifiers that were never placed.
const UNPLACED: i64 = 999;

#[derive(Debug, Clone, Serialize)]
pub struct QualifiedEntry {
    pub id: String,
    pub name: String,
    pub school_name: String,
    pub position: Option<i64>,
    pub score: Option<f64>,
}

/// Qualifiers of a single game and the stage they advance to.
#[derive(Debug, Clone, Serialize)]
pub struct QualifiedGroup {
    pub game: Game,
    pub level_label: &'static str,
    pub proceeding_to: &'static str,
    pub participants: Vec<QualifiedEntry>,
}

/// Group qualified participants by game, in the order each game is first
/// seen, sorting every group by position with unplaced entries last.
pub fn qualified_by_game(
    games: &[Game],
    participants: &[Participant],
    schools: &[School],
    filter: &ResultFilter,
) -> Vec<QualifiedGroup> {
    let games: HashMap<&str, &Game> = games.iter().map(|g| (g.id.as_str(), g)).collect();
    let schools: HashMap<&str, &School> = schools.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut groups: Vec<QualifiedGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for p in participants.iter().filter(|p| p.is_qualified) {
        let Some(game) = games.get(p.game_id.as_str()) else {
            continue;
        };
        if !filter.admits_game(game) {
            continue;
        }

        let slot = *index.entry(game.id.as_str()).or_insert_with(|| {
            groups.push(QualifiedGroup {
                game: (*game).clone(),
                level_label: game.level.label(),
                proceeding_to: game.level.proceeding_to_label(),
                participants: Vec::new(),
            });
            groups.len() - 1
        });

        groups[slot].participants.push(QualifiedEntry {
            id: p.id.clone(),
            name: p.full_name(),
            school_name: schools
                .get(p.school_id.as_str())
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            position: p.position,
            score: p.score,
        });
    }

    for group in &mut groups {
        group
            .participants
            .sort_by_key(|e| e.position.unwrap_or(UNPLACED));
    }
    groups
}

/// Ids of the best placed participants, at most `max` of them. Unplaced
/// participants are never suggested.
pub fn select_top_finishers(participants: &[Participant], max: i64) -> Vec<String> {
    let mut placed: Vec<(&str, i64)> = participants
        .iter()
        .filter_map(|p| p.position.map(|pos| (p.id.as_str(), pos)))
        .collect();
    placed.sort_by_key(|(_, pos)| *pos);

    placed
        .into_iter()
        .take(max.max(0) as usize)
        .map(|(id, _)| id.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{CompetitionLevel, GameCategory, Gender, SchoolLevel};

    fn game(id: &str, level: CompetitionLevel) -> Game {
        Game {
            id: id.to_string(),
            name: format!("Game {}", id),
            category: GameCategory::BallGames,
            level,
            gender: Gender::Girls,
            school_level: SchoolLevel::Primary,
            description: None,
            is_timed: false,
            max_qualifiers: 2,
            race_type: None,
            championship_id: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn player(id: &str, game_id: &str, position: Option<i64>, qualified: bool) -> Participant {
        Participant {
            id: id.to_string(),
            first_name: "Akinyi".to_string(),
            last_name: id.to_string(),
            school_id: "s1".to_string(),
            game_id: game_id.to_string(),
            gender: Gender::Girls,
            time_taken: None,
            position,
            score: None,
            is_qualified: qualified,
            notes: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn school() -> School {
        School::new(
            "Kisumu Girls".into(),
            "Central".into(),
            "Kisumu East".into(),
            "Kisumu".into(),
            "Nyanza".into(),
            None,
        )
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let games = vec![
            game("netball", CompetitionLevel::Zone),
            game("volleyball", CompetitionLevel::National),
        ];
        let participants = vec![
            player("a", "volleyball", Some(2), true),
            player("b", "netball", None, true),
            player("c", "netball", Some(1), true),
            player("d", "netball", Some(3), false),
        ];

        let groups = qualified_by_game(&games, &participants, &[], &ResultFilter::default());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].game.id, "volleyball");
        assert_eq!(groups[0].proceeding_to, "Champions");

        let netball = &groups[1];
        assert_eq!(netball.level_label, "Zone");
        assert_eq!(netball.proceeding_to, "Sub-County");
        let ids: Vec<&str> = netball.participants.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[test]
    fn test_level_filter_and_school_names() {
        let mut s = school();
        s.id = "s1".to_string();
        let games = vec![
            game("netball", CompetitionLevel::Zone),
            game("volleyball", CompetitionLevel::County),
        ];
        let participants = vec![
            player("a", "volleyball", Some(1), true),
            player("b", "netball", Some(1), true),
        ];
        let filter = ResultFilter {
            level: Some(CompetitionLevel::County),
            ..Default::default()
        };

        let groups = qualified_by_game(&games, &participants, &[s], &filter);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].participants[0].school_name, "Kisumu Girls");
        assert_eq!(groups[0].participants[0].name, "Akinyi a");
    }

    #[test]
    fn test_select_top_finishers() {
        let participants = vec![
            player("third", "g", Some(3), false),
            player("none", "g", None, false),
            player("first", "g", Some(1), false),
            player("second", "g", Some(2), false),
        ];

        assert_eq!(select_top_finishers(&participants, 2), vec!["first", "second"]);
        assert_eq!(select_top_finishers(&participants, 10).len(), 3);
        assert!(select_top_finishers(&participants, 0).is_empty());
        assert!(select_top_finishers(&participants, -1).is_empty());
    }
}
