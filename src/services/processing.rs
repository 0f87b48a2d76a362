use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use log::{info, warn};
use std::collections::BTreeMap;

use crate::classifier::{Classifier, CompetitionNames};
use crate::collation::{Collation, Collator};
use crate::config::settings::AppConfig;
use crate::config::EventConfig;
use crate::context::{DocumentSource, EventContext};
use crate::database::{self, EncodingPolicy, SqliteStore, UpdateSummary};
use crate::domain::{has_errors, Diagnostic};
use crate::names::{Disambiguator, TruncateLongNames, TruncationPolicy};
use crate::report::{parse_report, Report};
use crate::rules::RuleEngine;
use crate::schedule::{parse_schedule, Schedule};

use super::ingestion::SourceDocument;

/// Canonical texts extracted from a set of documents.
#[derive(Debug, Clone, Default)]
pub struct ExtractedEvent {
    pub schedule_text: String,
    pub results_text: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// A schedule and report parsed and collated against each other.
pub struct Validation {
    pub schedule: Schedule,
    pub report: Report,
    pub collation: Collation,
    /// Text of each source, for quoting problem lines.
    pub texts: BTreeMap<String, String>,
}

impl Validation {
    pub fn has_errors(&self) -> bool {
        has_errors(&self.schedule.diagnostics) || has_errors(&self.report.diagnostics)
    }

    /// Any diagnostic at all, warnings included. Such a validation is not
    /// stored.
    pub fn has_problems(&self) -> bool {
        !self.schedule.diagnostics.is_empty() || !self.report.diagnostics.is_empty()
    }
}

pub struct ProcessingService {
    config: AppConfig,
    event: EventConfig,
    engine: RuleEngine,
    policy: Box<dyn TruncationPolicy>,
}

impl ProcessingService {
    pub fn new(config: AppConfig, event: EventConfig) -> Result<Self> {
        let engine = RuleEngine::compile(&event).context("Failed to compile format rules")?;
        Ok(Self {
            config,
            event,
            engine,
            policy: Box::new(TruncateLongNames),
        })
    }

    /// Decide what happens to joined names too long to split.
    pub fn with_policy(mut self, policy: Box<dyn TruncationPolicy>) -> Self {
        self.policy = policy;
        self
    }

    fn classifier(&self) -> Classifier {
        let known = self
            .event
            .competitions
            .iter()
            .map(String::as_str)
            .chain(self.event.competition_aliases.iter().map(|(_, name)| name));
        Classifier::new(CompetitionNames::new(known))
    }

    /// Run documents through the format rules, the classifier and the event
    /// context, and emit the canonical schedule and results texts.
    pub fn extract(&self, documents: &[SourceDocument]) -> ExtractedEvent {
        let mut classifier = self.classifier();
        let mut context = EventContext::new();
        let mut diagnostics = Vec::new();
        let mut classified = 0;

        for document in documents {
            let text = document.lines(&self.event.csv);
            let extraction = self.engine.extract(&document.source, &text);
            for competition in &extraction.competitions {
                classifier.add_competition(&self.event.section_aliases.resolve(competition));
            }
            diagnostics.extend(extraction.diagnostics);

            context = context.begin_document(DocumentSource {
                source: document.source.clone(),
                received: document.received,
            });
            for line in extraction.lines {
                let found = classifier.classify(&line.text, &line.tagger, context.event_identified());
                context = context.reduce(found).0;
                classified += 1;
            }
        }
        info!("  → Classified {} lines from {} documents", classified, documents.len());
        diagnostics.extend(context.diagnostics().iter().cloned());

        let disambiguator = Disambiguator::new(&self.config.parser)
            .with_known(self.event.team_aliases.iter().map(|(_, team)| team));
        let extracted = ExtractedEvent {
            schedule_text: context.schedule_text(&disambiguator, self.policy.as_ref()),
            results_text: context.results_text(&disambiguator, self.policy.as_ref()),
            diagnostics,
        };
        info!("  → Emitted schedule and results for {} competitions", context.competitions().len());
        if has_errors(&extracted.diagnostics) {
            warn!("Extraction found {} problems", extracted.diagnostics.len());
        }
        extracted
    }

    /// Parse both canonical texts and collate them as of `now`.
    pub fn validate(
        &self,
        schedule_source: &str,
        schedule_text: &str,
        results_source: &str,
        results_text: &str,
        now: NaiveDateTime,
    ) -> Validation {
        let schedule = parse_schedule(schedule_source, schedule_text);
        info!(
            "  → Parsed schedule: {} sections, {} fixtures",
            schedule.sections.len(),
            schedule.fixtures().len()
        );
        let mut report = parse_report(results_source, results_text);
        info!(
            "  → Parsed results: {} matches, {} games",
            report.match_count(),
            report.game_count()
        );

        let collation = Collator::new(&schedule, &self.config.collation)
            .with_aliases(&self.event.team_aliases, &self.event.competition_aliases)
            .with_authorization_delay(self.event.authorization_delay)
            .collate(&mut report, now);
        if has_errors(&schedule.diagnostics) || has_errors(&report.diagnostics) {
            warn!(
                "Validation found {} problems",
                schedule.diagnostics.len() + report.diagnostics.len()
            );
        }

        let texts = BTreeMap::from([
            (schedule_source.to_string(), schedule_text.to_string()),
            (results_source.to_string(), results_text.to_string()),
        ]);
        Validation {
            schedule,
            report,
            collation,
            texts,
        }
    }

    pub fn validate_now(
        &self,
        schedule_source: &str,
        schedule_text: &str,
        results_source: &str,
        results_text: &str,
    ) -> Validation {
        let now = Utc::now().naive_utc();
        self.validate(schedule_source, schedule_text, results_source, results_text, now)
    }

    /// Store a validated event, in `database_path` or the configured
    /// database.
    pub fn update(&self, validation: &Validation, database_path: Option<&str>) -> Result<UpdateSummary> {
        let path = database_path
            .map(str::to_string)
            .unwrap_or_else(|| self.config.database_path());
        info!("  → Updating {}", path);
        let mut store = SqliteStore::open(&path, EncodingPolicy::Utf8)?;
        database::update_event(
            &mut store,
            &validation.schedule,
            &validation.report,
            &validation.collation,
        )
    }
}
