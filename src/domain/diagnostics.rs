use serde::{Deserialize, Serialize};
use std::fmt;

use super::tagger::Tagger;

/// Broad category of a data problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Lexical,
    AmbiguousScore,
    Schedule,
    DuplicateReport,
    UnmatchedFixture,
    UnmatchedUnfinished,
    Authorization,
    Engine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

/// Specific problem found in the reported data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Problem {
    // Lexical uncertainty
    SplitSwissData,
    ApaInSwissData,
    NoPinSwiss,
    ExtraPinSwissData,
    NameSplitByPinSwiss,
    SplitApaData,
    NoPinApa,
    ExtraPinApaData,
    NameSplitByPinApa,
    ApaSelfCell,
    MoreThanTwoDates,
    DuplicatePin,
    PinOutOfRange,
    CrosstableInconsistent,
    UnrecognisedLine,
    // Ambiguous score
    BadScore,
    // Schedule inconsistency
    UnknownSectionType,
    DuplicateTeam,
    UnknownTeam,
    WeekdayMismatch,
    RoundOutOfRange,
    DuplicateRound,
    DateOutsideEvent,
    BadDate,
    MissingEventName,
    MissingEventDates,
    // Duplicate-report inconsistency
    MatchScore,
    OnlyReport,
    GameCount,
    HomePlayer,
    AwayPlayer,
    HomePlayerWhite,
    Result,
    Board,
    GradingOnly,
    Round,
    Source,
    Section,
    Competition,
    HomeTeam,
    AwayTeam,
    GameConflict,
    // Unmatched fixture
    NotOnFixtureList,
    // Unmatched unfinished
    UnmatchedPlayedOn,
    AmbiguousPlayedOn,
    // Authorization failure
    Authorization,
    // Engine failure
    EngineFailure,
}

impl Problem {
    pub fn category(&self) -> Category {
        use Problem::*;
        match self {
            SplitSwissData | ApaInSwissData | NoPinSwiss | ExtraPinSwissData
            | NameSplitByPinSwiss | SplitApaData | NoPinApa | ExtraPinApaData
            | NameSplitByPinApa | ApaSelfCell | MoreThanTwoDates | DuplicatePin
            | PinOutOfRange | CrosstableInconsistent | UnrecognisedLine => Category::Lexical,
            BadScore => Category::AmbiguousScore,
            UnknownSectionType | DuplicateTeam | UnknownTeam | WeekdayMismatch
            | RoundOutOfRange | DuplicateRound | DateOutsideEvent | BadDate
            | MissingEventName | MissingEventDates => Category::Schedule,
            MatchScore | OnlyReport | GameCount | HomePlayer | AwayPlayer | HomePlayerWhite
            | Result | Board | GradingOnly | Round | Source | Section | Competition
            | HomeTeam | AwayTeam | GameConflict => Category::DuplicateReport,
            NotOnFixtureList => Category::UnmatchedFixture,
            UnmatchedPlayedOn | AmbiguousPlayedOn => Category::UnmatchedUnfinished,
            Authorization => Category::Authorization,
            EngineFailure => Category::Engine,
        }
    }

    /// Upper-case tag used in reports.
    pub fn tag(&self) -> &'static str {
        use Problem::*;
        match self {
            SplitSwissData => "SPLIT_SWISS_DATA",
            ApaInSwissData => "APA_IN_SWISS_DATA",
            NoPinSwiss => "NO_PIN_SWISS",
            ExtraPinSwissData => "EXTRA_PIN_SWISS_DATA",
            NameSplitByPinSwiss => "NAME_SPLIT_BY_PIN_SWISS",
            SplitApaData => "SPLIT_APA_DATA",
            NoPinApa => "NO_PIN_APA",
            ExtraPinApaData => "EXTRA_PIN_APA_DATA",
            NameSplitByPinApa => "NAME_SPLIT_BY_PIN_APA",
            ApaSelfCell => "APA_SELF_CELL",
            MoreThanTwoDates => "MORE_THAN_TWO_DATES",
            DuplicatePin => "DUPLICATE_PIN",
            PinOutOfRange => "PIN_OUT_OF_RANGE",
            CrosstableInconsistent => "CROSSTABLE_INCONSISTENT",
            UnrecognisedLine => "UNRECOGNISED_LINE",
            BadScore => "BAD_SCORE",
            UnknownSectionType => "UNKNOWN_SECTION_TYPE",
            DuplicateTeam => "DUPLICATE_TEAM",
            UnknownTeam => "UNKNOWN_TEAM",
            WeekdayMismatch => "WEEKDAY_MISMATCH",
            RoundOutOfRange => "ROUND_OUT_OF_RANGE",
            DuplicateRound => "DUPLICATE_ROUND",
            DateOutsideEvent => "DATE_OUTSIDE_EVENT",
            BadDate => "BAD_DATE",
            MissingEventName => "MISSING_EVENT_NAME",
            MissingEventDates => "MISSING_EVENT_DATES",
            MatchScore => "MATCH_SCORE",
            OnlyReport => "ONLY_REPORT",
            GameCount => "GAME_COUNT",
            HomePlayer => "HOME_PLAYER",
            AwayPlayer => "AWAY_PLAYER",
            HomePlayerWhite => "HOME_PLAYER_WHITE",
            Result => "RESULT",
            Board => "BOARD",
            GradingOnly => "GRADING_ONLY",
            Round => "ROUND",
            Source => "SOURCE",
            Section => "SECTION",
            Competition => "COMPETITION",
            HomeTeam => "HOME_TEAM",
            AwayTeam => "AWAY_TEAM",
            GameConflict => "GAME_CONFLICT",
            NotOnFixtureList => "NOT_ON_FIXTURE_LIST",
            UnmatchedPlayedOn => "UNMATCHED_PLAYED_ON",
            AmbiguousPlayedOn => "AMBIGUOUS_PLAYED_ON",
            Authorization => "AUTHORIZATION",
            EngineFailure => "ENGINE_FAILURE",
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A problem paired with the origin of the text that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub problem: Problem,
    pub severity: Severity,
    pub tagger: Tagger,
    pub message: String,
}

impl Diagnostic {
    pub fn error(problem: Problem, tagger: &Tagger, message: impl Into<String>) -> Self {
        Self {
            problem,
            severity: Severity::Error,
            tagger: tagger.clone(),
            message: message.into(),
        }
    }

    pub fn warning(problem: Problem, tagger: &Tagger, message: impl Into<String>) -> Self {
        Self {
            problem,
            severity: Severity::Warning,
            tagger: tagger.clone(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(
            f,
            "{} {} at {}: {}",
            level,
            self.problem,
            self.tagger.describe(),
            self.message
        )
    }
}

/// True when any diagnostic in the list blocks a database update.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.is_error())
}
