use crate::domain::{CardCell, CellColour, CellScore};

use super::scanners::{APA_CELL, SWISS_CELL};

fn colour(c: char) -> CellColour {
    match c {
        'w' => CellColour::White,
        'b' => CellColour::Black,
        _ => CellColour::Unknown,
    }
}

fn outcome(c: char) -> Option<CellScore> {
    match c {
        '+' => Some(CellScore::Win),
        '=' => Some(CellScore::Draw),
        '-' => Some(CellScore::Loss),
        'p' => Some(CellScore::DefaultWin),
        'm' => Some(CellScore::DefaultLoss),
        'e' => Some(CellScore::DrawDefault),
        _ => None,
    }
}

fn cell(opponent: Option<u32>, colour: CellColour, score: CellScore, token: &str) -> CardCell {
    CardCell {
        opponent,
        colour,
        score,
        round: None,
        is_self: false,
        token: token.to_string(),
    }
}

/// Split a swiss pairing-card token into its fields.
pub fn swiss_cell(token: &str) -> Option<CardCell> {
    if !SWISS_CELL.is_match(token) {
        return None;
    }
    let lower = token.to_lowercase();
    if lower == "*" || lower == "--" {
        return Some(cell(None, CellColour::Unknown, CellScore::NotPlayed, token));
    }
    if let Some(rest) = lower.strip_prefix("bye") {
        let score = outcome(rest.chars().next()?)?;
        return Some(cell(None, CellColour::Unknown, score, token));
    }
    if let Some(rest) = lower.strip_prefix("def") {
        let score = match rest {
            "+" => CellScore::DefaultWin,
            _ => CellScore::DefaultLoss,
        };
        return Some(cell(None, CellColour::Unknown, score, token));
    }

    let mut chars = lower.chars();
    let first = chars.next()?;
    let (colour_char, digits, score_char) = if first == 'w' || first == 'b' {
        let last = lower.chars().last()?;
        (first, &lower[1..lower.len() - last.len_utf8()], last)
    } else {
        let second = chars.next()?;
        (second, &lower[2..], first)
    };
    let opponent = digits.parse().ok()?;
    Some(cell(
        Some(opponent),
        colour(colour_char),
        outcome(score_char)?,
        token,
    ))
}

/// Split an all-play-all cross-table token into its fields. The opponent is
/// the cell's column, filled in by the caller.
pub fn apa_cell(token: &str) -> Option<CardCell> {
    if !APA_CELL.is_match(token) {
        return None;
    }
    let lower = token.to_lowercase();
    if lower == "~" {
        let mut own = cell(None, CellColour::Unknown, CellScore::NotPlayed, token);
        own.is_self = true;
        return Some(own);
    }
    if lower == "--" {
        return Some(cell(None, CellColour::Unknown, CellScore::NotPlayed, token));
    }
    let mut chars = lower.chars();
    let first = chars.next()?;
    let second = chars.next()?;
    let (colour_char, score_char) = if first == 'w' || first == 'b' {
        (first, second)
    } else {
        (second, first)
    };
    Some(cell(None, colour(colour_char), outcome(score_char)?, token))
}

/// Number of rounds in an all-play-all of `players` players.
pub fn apa_rounds(players: u32) -> u32 {
    if players % 2 == 0 { players.saturating_sub(1) } else { players }
}

/// Nominal round in which pins `p` and `q` meet in an all-play-all of
/// `rounds` rounds.
///
/// Pins above `rounds` only occur in even-sized tables, where the last pin
/// meets every other pin in the round the rotation leaves it free.
pub fn apa_nominal_round(p: u32, q: u32, rounds: u32) -> u32 {
    let (a, b) = if p <= q { (p, q) } else { (q, p) };
    if rounds == 0 {
        return 0;
    }
    if b <= rounds {
        let r = (a + b - 1) % rounds;
        if r == 0 { rounds } else { r }
    } else if 2 * a > b {
        2 * a - b
    } else {
        2 * a - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("w12+", Some(12), CellColour::White, CellScore::Win)]
    #[case("b3-", Some(3), CellColour::Black, CellScore::Loss)]
    #[case("=w4", Some(4), CellColour::White, CellScore::Draw)]
    #[case("b7p", Some(7), CellColour::Black, CellScore::DefaultWin)]
    #[case("bye=", None, CellColour::Unknown, CellScore::Draw)]
    #[case("def-", None, CellColour::Unknown, CellScore::DefaultLoss)]
    #[case("*", None, CellColour::Unknown, CellScore::NotPlayed)]
    fn test_swiss_cells(
        #[case] token: &str,
        #[case] opponent: Option<u32>,
        #[case] colour: CellColour,
        #[case] score: CellScore,
    ) {
        let cell = swiss_cell(token).unwrap();
        assert_eq!(cell.opponent, opponent);
        assert_eq!(cell.colour, colour);
        assert_eq!(cell.score, score);
    }

    #[test]
    fn test_apa_cells() {
        assert!(apa_cell("~").unwrap().is_self);
        let cell = apa_cell("+b").unwrap();
        assert_eq!(cell.colour, CellColour::Black);
        assert_eq!(cell.score, CellScore::Win);
        assert_eq!(apa_cell("--").unwrap().score, CellScore::NotPlayed);
        assert!(apa_cell("w12+").is_none());
    }

    #[test]
    fn test_apa_round_formula_is_symmetric_and_complete() {
        for players in [5u32, 6] {
            let rounds = apa_rounds(players);
            assert_eq!(rounds, 5);
            for p in 1..=players {
                let mut seen = Vec::new();
                for q in 1..=players {
                    if p == q {
                        continue;
                    }
                    let round = apa_nominal_round(p, q, rounds);
                    assert_eq!(round, apa_nominal_round(q, p, rounds));
                    assert!((1..=rounds).contains(&round));
                    seen.push(round);
                }
                seen.sort();
                seen.dedup();
                assert_eq!(seen.len(), (players - 1) as usize, "pin {}", p);
            }
        }
    }

    #[test]
    fn test_apa_rounds_for_pin_three_of_six() {
        let rounds = apa_rounds(6);
        let nominal: Vec<u32> = [1, 2, 4, 5, 6]
            .iter()
            .map(|q| apa_nominal_round(*q, 3, rounds))
            .collect();
        assert_eq!(nominal, vec![3, 4, 1, 2, 5]);
    }
}
