use crate::domain::{Card, CardCell, Problem, Tagger};
use crate::lexical::scanners::{
    words, Matcher, Word, APA_CELL, APA_DEFINITIVE, SWISS_CELL, SWISS_DEFINITIVE,
};
use crate::lexical::{apa_cell, swiss_cell};

/// Problems reported for a malformed card of one shape.
struct CardProblems {
    split: Problem,
    no_pin: Problem,
    extra_pin: Problem,
    name_split: Problem,
}

const SWISS: CardProblems = CardProblems {
    split: Problem::SplitSwissData,
    no_pin: Problem::NoPinSwiss,
    extra_pin: Problem::ExtraPinSwissData,
    name_split: Problem::NameSplitByPinSwiss,
};

const APA: CardProblems = CardProblems {
    split: Problem::SplitApaData,
    no_pin: Problem::NoPinApa,
    extra_pin: Problem::ExtraPinApaData,
    name_split: Problem::NameSplitByPinApa,
};

/// A swiss pairing card, or `None` when the line has no swiss cells.
pub fn swiss_card(text: &str, tagger: &Tagger) -> Option<Result<Card, Problem>> {
    let found = words(text);
    if !found.iter().any(|w| SWISS_DEFINITIVE.is_match(w.text)) {
        return None;
    }
    if found
        .iter()
        .any(|w| APA_DEFINITIVE.is_match(w.text) && !SWISS_CELL.is_match(w.text))
    {
        return Some(Err(Problem::ApaInSwissData));
    }
    Some(card(&found, SWISS_CELL, &SWISS).and_then(|(pin, name, tokens)| {
        let cells = tokens
            .iter()
            .enumerate()
            .map(|(index, token)| {
                let mut cell = swiss_cell(token).ok_or(Problem::SplitSwissData)?;
                cell.round = Some(index as u32 + 1);
                Ok(cell)
            })
            .collect::<Result<Vec<CardCell>, Problem>>()?;
        Ok(Card {
            pin,
            name,
            cells,
            tagger: tagger.clone(),
        })
    }))
}

/// An all-play-all cross-table row, or `None` when the line has no
/// all-play-all cells.
pub fn apa_card(text: &str, tagger: &Tagger) -> Option<Result<Card, Problem>> {
    let found = words(text);
    if !found.iter().any(|w| APA_DEFINITIVE.is_match(w.text)) {
        return None;
    }
    Some(card(&found, APA_CELL, &APA).and_then(|(pin, name, tokens)| {
        if tokens.iter().filter(|t| **t == "~").count() != 1 {
            return Err(Problem::ApaSelfCell);
        }
        let cells = tokens
            .iter()
            .enumerate()
            .map(|(index, token)| {
                let mut cell = apa_cell(token).ok_or(Problem::SplitApaData)?;
                if !cell.is_self {
                    cell.opponent = Some(index as u32 + 1);
                }
                Ok(cell)
            })
            .collect::<Result<Vec<CardCell>, Problem>>()?;
        Ok(Card {
            pin,
            name,
            cells,
            tagger: tagger.clone(),
        })
    }))
}

type CardParts<'a> = (u32, Option<String>, Vec<&'a str>);

/// Pin, optional name and cell tokens of a card line.
fn card<'a>(
    found: &[Word<'a>],
    cell: Matcher,
    problems: &CardProblems,
) -> Result<CardParts<'a>, Problem> {
    let first_cell = found
        .iter()
        .position(|w| cell.is_match(w.text))
        .unwrap_or(found.len());
    let (head, tail) = found.split_at(first_cell);
    if tail.iter().any(|w| !cell.is_match(w.text)) {
        return Err(problems.split);
    }
    if head.is_empty() {
        return Err(problems.no_pin);
    }

    let pins: Vec<usize> = head
        .iter()
        .enumerate()
        .filter(|(_, w)| w.text.chars().all(|c| c.is_ascii_digit()))
        .map(|(index, _)| index)
        .collect();
    let pin_index = match pins.as_slice() {
        [] => return Err(problems.no_pin),
        [index] => *index,
        _ => return Err(problems.extra_pin),
    };
    if pin_index != 0 && pin_index != head.len() - 1 {
        return Err(problems.name_split);
    }
    let pin = head[pin_index]
        .text
        .parse()
        .map_err(|_| problems.extra_pin)?;

    let name: Vec<&str> = head
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != pin_index)
        .map(|(_, w)| w.text)
        .collect();
    let name = (!name.is_empty()).then(|| name.join(" "));
    Ok((pin, name, tail.iter().map(|w| w.text).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CellColour, CellScore};
    use rstest::rstest;

    #[test]
    fn test_swiss_card_with_name() {
        let card = swiss_card("1 Alice (12345A) b2+ w3-", &Tagger::default())
            .unwrap()
            .unwrap();
        assert_eq!(card.pin, 1);
        assert_eq!(card.name.as_deref(), Some("Alice (12345A)"));
        assert_eq!(card.cells.len(), 2);
        assert_eq!(card.cells[1].opponent, Some(3));
        assert_eq!(card.cells[1].round, Some(2));
        assert_eq!(card.cells[1].score, CellScore::Loss);
    }

    #[rstest]
    #[case("b2+ w3-", Problem::NoPinSwiss)]
    #[case("Alice b2+ w3-", Problem::NoPinSwiss)]
    #[case("1 12 b2+ w3-", Problem::ExtraPinSwissData)]
    #[case("Alice 1 Smith b2+ w3-", Problem::NameSplitByPinSwiss)]
    #[case("1 Alice b2+ Smith w3-", Problem::SplitSwissData)]
    #[case("1 b2+ ~ w3-", Problem::ApaInSwissData)]
    fn test_swiss_card_problems(#[case] line: &str, #[case] problem: Problem) {
        assert_eq!(swiss_card(line, &Tagger::default()), Some(Err(problem)));
    }

    #[test]
    fn test_result_lines_are_not_cards() {
        assert!(swiss_card("1 Smith 1-0 Jones", &Tagger::default()).is_none());
        assert!(apa_card("1 Smith 1-0 Jones", &Tagger::default()).is_none());
    }

    #[test]
    fn test_apa_row() {
        let card = apa_card("3 w+ b= ~ w- b+ w=", &Tagger::default())
            .unwrap()
            .unwrap();
        assert_eq!(card.pin, 3);
        assert_eq!(card.cells.len(), 6);
        assert!(card.cells[2].is_self);
        assert_eq!(card.cells[3].opponent, Some(4));
        assert_eq!(card.cells[3].colour, CellColour::White);
        assert_eq!(card.cells[3].score, CellScore::Loss);
    }

    #[test]
    fn test_apa_row_needs_one_self_cell() {
        assert_eq!(
            apa_card("3 w+ b= w- b+ w=", &Tagger::default()),
            Some(Err(Problem::ApaSelfCell))
        );
    }
}
