use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Index of a player in a report's player list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub usize);

/// A player as reported, enriched during collation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub event: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub section: Option<String>,
    pub club: Option<String>,
    pub pin: Option<u32>,
    pub affiliation: Option<String>,
    pub reported_codes: BTreeSet<String>,
}

/// What distinguishes two players with the same name in one event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Affiliation {
    Club(String),
    Section { section: String, pin: Option<u32> },
    Unaffiliated,
}

/// Identity key of a player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub name: String,
    pub event: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub affiliation: Affiliation,
}

impl Player {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn identity(&self) -> PlayerIdentity {
        let affiliation = match (&self.club, &self.section) {
            (Some(club), _) => Affiliation::Club(club.clone()),
            (None, Some(section)) => Affiliation::Section {
                section: section.clone(),
                pin: self.pin,
            },
            (None, None) => Affiliation::Unaffiliated,
        };
        PlayerIdentity {
            name: self.name.clone(),
            event: self.event.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            affiliation,
        }
    }
}

impl PlayerIdentity {
    pub fn describe(&self) -> String {
        match &self.affiliation {
            Affiliation::Club(club) => format!("{} ({})", self.name, club),
            Affiliation::Section { section, pin: Some(pin) } => {
                format!("{} ({} #{})", self.name, section, pin)
            }
            Affiliation::Section { section, pin: None } => format!("{} ({})", self.name, section),
            Affiliation::Unaffiliated => self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_prefers_club_over_section() {
        let mut player = Player::new("Smith");
        player.section = Some("Open".to_string());
        player.pin = Some(4);
        assert_eq!(
            player.identity().affiliation,
            Affiliation::Section {
                section: "Open".to_string(),
                pin: Some(4)
            }
        );

        player.club = Some("Toytown".to_string());
        assert_eq!(
            player.identity().affiliation,
            Affiliation::Club("Toytown".to_string())
        );
    }
}
