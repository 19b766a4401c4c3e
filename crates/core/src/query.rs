use crate::models::{QueryOptions, Record};
use crate::retrieval::RetrievalIndex;
use crate::SearchError;
use regex::Regex;
use std::collections::HashSet;
use std::fmt::Write as _;
use tracing::{debug, info, warn};

pub const NO_DATA_MESSAGE: &str = "No data available. Please process files first.";
pub const NO_RELEVANT_MESSAGE: &str = "No relevant information found for your query.";
const FOUND_PREFIX: &str = "Based on the data, here's what I found:";

/// Identifier pulled out of a question, with the optional `<id> - <name>` qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierQuery {
    pub id: String,
    pub name: Option<String>,
}

impl IdentifierQuery {
    fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{} - {}", self.id, name),
            None => self.id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldResolution<'a> {
    NotRequested,
    /// Column of the matched record the question asks about.
    Resolved(&'a str),
    /// A known phrase was asked for but none of its columns exist.
    Unresolved(&'a str),
}

pub struct QueryEngine {
    options: QueryOptions,
    identifier: Regex,
}

impl QueryEngine {
    pub fn new(options: QueryOptions) -> Result<Self, SearchError> {
        let identifier = Regex::new(options.identifier_regex)?;
        Ok(Self {
            options,
            identifier,
        })
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn answer(&self, records: &[Record], retrieval: &RetrievalIndex, question: &str) -> String {
        if records.is_empty() {
            return NO_DATA_MESSAGE.to_string();
        }

        match self.extract_identifier(question) {
            Some(identifier) => self.answer_identifier(records, question, &identifier),
            None => self.answer_open(records, retrieval, question),
        }
    }

    /// Any 4-6 digit token counts as an identifier, including years.
    pub fn extract_identifier(&self, question: &str) -> Option<IdentifierQuery> {
        let captures = self.identifier.captures(question)?;
        let id = captures
            .get(1)
            .or_else(|| captures.get(0))?
            .as_str()
            .to_string();

        let name = match Regex::new(&format!(r"{}\s*-\s*([^?]+)", regex::escape(&id))) {
            Ok(pattern) => pattern
                .captures(question)
                .and_then(|found| found.get(1))
                .map(|found| found.as_str().trim().to_string())
                .filter(|name| !name.is_empty()),
            Err(error) => {
                warn!(error = %error, "name qualifier pattern failed to compile");
                None
            }
        };

        Some(IdentifierQuery { id, name })
    }

    /// First record, in store order, holding the identifier in any value and
    /// the name (case-insensitive) in any value when one was given.
    pub fn find_record<'r>(
        &self,
        records: &'r [Record],
        identifier: &IdentifierQuery,
    ) -> Option<&'r Record> {
        let name = identifier.name.as_ref().map(|name| name.to_lowercase());

        let found = records.iter().find(|record| {
            let id_found = record
                .fields
                .values()
                .any(|value| value.contains(&identifier.id));
            let name_found = match &name {
                Some(name) => record
                    .fields
                    .values()
                    .any(|value| value.to_lowercase().contains(name.as_str())),
                None => true,
            };
            id_found && name_found
        });

        match found {
            Some(record) => info!(
                id = %identifier.id,
                filename = %record.provenance.filename,
                "found matching record"
            ),
            None => info!(id = %identifier.id, "no record found"),
        }
        found
    }

    pub fn resolve_field<'s>(&'s self, question: &str, record: &Record) -> FieldResolution<'s> {
        let lowered = question.to_lowercase();
        let mut unresolved = None;

        for alias in &self.options.field_aliases {
            if !lowered.contains(&alias.phrase) {
                continue;
            }

            if let Some(column) = alias
                .columns
                .iter()
                .find(|column| record.fields.contains_key(column.as_str()))
            {
                return FieldResolution::Resolved(column);
            }
            unresolved.get_or_insert(alias.phrase.as_str());
        }

        unresolved
            .map(FieldResolution::Unresolved)
            .unwrap_or(FieldResolution::NotRequested)
    }

    fn answer_identifier(
        &self,
        records: &[Record],
        question: &str,
        identifier: &IdentifierQuery,
    ) -> String {
        let Some(record) = self.find_record(records, identifier) else {
            let mut answer = format!("No record found for ID {}", identifier.id);
            if let Some(name) = &identifier.name {
                let _ = write!(answer, " with name {name}");
            }
            answer.push_str(" in the loaded data.");
            return answer;
        };

        let resolution = self.resolve_field(question, record);
        if let FieldResolution::Resolved(column) = resolution {
            if let Some(value) = record.get(column).filter(|value| !value.trim().is_empty()) {
                return format!(
                    "The {column} of {} is {value}.\n\n(Source: {})",
                    identifier.label(),
                    record.provenance.filename
                );
            }
        }

        let mut answer = format!("Found record for {}:\n\n", identifier.label());
        for (key, value) in record.non_empty_fields() {
            let _ = writeln!(answer, "• {key}: {value}");
        }
        let _ = write!(answer, "\n(Source: {})", record.provenance.filename);

        match resolution {
            FieldResolution::Resolved(field) | FieldResolution::Unresolved(field) => {
                let _ = write!(
                    answer,
                    "\n\nNote: The requested field '{field}' was not found in this record."
                );
            }
            FieldResolution::NotRequested => {}
        }

        answer
    }

    fn answer_open(&self, records: &[Record], retrieval: &RetrievalIndex, question: &str) -> String {
        match retrieval.search(question, self.options.top_k) {
            Ok(hits) if hits.is_empty() => NO_RELEVANT_MESSAGE.to_string(),
            Ok(hits) => {
                let context = hits
                    .iter()
                    .map(|hit| hit.document.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n");
                format!("{FOUND_PREFIX}\n\n{context}")
            }
            Err(error) => {
                match &error {
                    SearchError::NotReady(_) => debug!(error = %error, "using keyword search"),
                    _ => warn!(error = %error, "similarity search failed, using keyword search"),
                }

                match keyword_search(records, question).first() {
                    Some((_, record)) => format!("{FOUND_PREFIX}\n\n{}", record.render()),
                    None => NO_RELEVANT_MESSAGE.to_string(),
                }
            }
        }
    }
}

/// Scores each record by how many distinct question words appear inside its
/// values. Only positive scores are kept, best first, ties in store order.
pub fn keyword_search<'r>(records: &'r [Record], question: &str) -> Vec<(usize, &'r Record)> {
    let lowered = question.to_lowercase();
    let mut seen = HashSet::new();
    let words: Vec<&str> = lowered
        .split_whitespace()
        .filter(|word| seen.insert(*word))
        .collect();

    let mut scored: Vec<(usize, &Record)> = records
        .iter()
        .filter_map(|record| {
            let values: Vec<String> = record
                .non_empty_fields()
                .map(|(_, value)| value.to_lowercase())
                .collect();
            let score = words
                .iter()
                .filter(|word| values.iter().any(|value| value.contains(*word)))
                .count();
            (score > 0).then_some((score, record))
        })
        .collect();

    scored.sort_by(|left, right| right.0.cmp(&left.0));
    scored
}
