//! Scoring of lines carrying a default, void or unfinished marker.
//!
//! A number next to a `default` marker is the score of the side it touches:
//! `1 default` and `default 0` both mean the home side won by default. A lone
//! leading 0 or 1 before a name scores the home side and the name is the
//! opponent. Anything that cannot be read one way only scores `BadScore`.

use super::found::ResultLine;
use crate::domain::{Points, Score};
use crate::lexical::scanners::{
    default_marker, is_board, is_number, join_marker_phrases, words, DefaultMarker,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Home,
    Away,
}

fn is_numeric(word: &str) -> bool {
    is_number(word) || is_board(word)
}

fn default_score(side: Option<(Side, Points)>) -> Score {
    match side {
        None => Score::Default,
        Some((Side::Home, p)) if p == Points::ONE => Score::HomeWinDefault,
        Some((Side::Home, p)) if p == Points::ZERO => Score::AwayWinDefault,
        Some((Side::Away, p)) if p == Points::ONE => Score::AwayWinDefault,
        Some((Side::Away, p)) if p == Points::ZERO => Score::HomeWinDefault,
        Some(_) => Score::BadScore,
    }
}

fn join(found: &[&str], indices: impl Iterator<Item = usize>, used: &[usize]) -> Option<String> {
    let picked: Vec<&str> = indices.filter(|i| !used.contains(i)).map(|i| found[i]).collect();
    (!picked.is_empty()).then(|| picked.join(" "))
}

/// Interpret a line containing a default-family marker. `None` when the
/// line has no marker.
pub fn interpret(text: &str) -> Option<ResultLine> {
    let text = join_marker_phrases(text);
    let found: Vec<&str> = words(&text).into_iter().map(|w| w.text).collect();
    let markers: Vec<(usize, DefaultMarker)> = found
        .iter()
        .enumerate()
        .filter_map(|(i, w)| default_marker(w).map(|m| (i, m)))
        .collect();
    let (position, marker) = *markers.first()?;

    let mut line = ResultLine::default();
    if markers.len() > 1 {
        line.score = Some(Score::BadScore);
        line.nameone = found.join(" ");
        return Some(line);
    }

    let numbers: Vec<usize> = (0..found.len()).filter(|i| is_numeric(found[*i])).collect();
    let mut used = vec![position];
    let mut side: Option<(Side, Points)> = None;
    let mut bad = false;
    let mut name_is_opponent = false;

    if marker == DefaultMarker::Default {
        if position > 0 && numbers.contains(&(position - 1)) {
            side = Points::parse(found[position - 1]).map(|p| (Side::Home, p));
            bad |= side.is_none();
            used.push(position - 1);
        }
        if numbers.contains(&(position + 1)) {
            if side.is_some() || bad {
                bad = true;
            } else {
                side = Points::parse(found[position + 1]).map(|p| (Side::Away, p));
                bad |= side.is_none();
            }
            used.push(position + 1);
        }
    }

    if numbers.first() == Some(&0) && !used.contains(&0) {
        let value = Points::parse(found[0]);
        let others = numbers.iter().filter(|i| !used.contains(i)).count();
        let lone_score = marker == DefaultMarker::Default
            && side.is_none()
            && others == 1
            && value.is_some_and(|v| v == Points::ZERO || v == Points::ONE);
        if lone_score {
            side = value.map(|v| (Side::Home, v));
            name_is_opponent = true;
        } else if is_board(found[0]) {
            line.board = Some(found[0].to_string());
        } else {
            bad = true;
        }
        used.push(0);
    }

    if numbers.iter().any(|i| !used.contains(i)) {
        bad = true;
    }

    line.score = Some(if bad {
        Score::BadScore
    } else if marker == DefaultMarker::Default {
        default_score(side)
    } else {
        marker.score()
    });

    let before = join(&found, 0..position, &used);
    let after = join(&found, position + 1..found.len(), &used);
    if name_is_opponent && after.is_none() {
        line.nametwo = before;
    } else {
        line.nameone = before.unwrap_or_default();
        line.nametwo = after;
    }
    Some(line)
}
