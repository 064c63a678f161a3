//! Field mapper - resolves every template placeholder against one record
//!
//! Resolution order per placeholder, first success wins: direct table, fuzzy
//! name match, composite family. Anything else is left unmapped.
//!
//! When the table names a source field and that field is null, only a
//! full-strength name match may stand in for it.

use crate::composite::CompositeFamily;
use crate::similarity::{NormalizedName, Similarity, TokenOverlap, FUZZY_THRESHOLD};
use crate::table::{DirectEntry, DirectMappingTable};
use doc_model::{
    ExtractedRecord, FieldResolution, MappingResult, MappingSource, PlaceholderName, UnmappedReason,
};
use tracing::{debug, info, warn};

/// Score a fuzzy match needs when the placeholder's table field is null
const FULL_MATCH: f64 = 1.0;

pub struct FieldMapper {
    table: DirectMappingTable,
    similarity: Box<dyn Similarity>,
    threshold: f64,
    key_order: Vec<String>,
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new(DirectMappingTable::insurance_default())
    }
}

/// A record key prepared for fuzzy comparison
struct Candidate<'r> {
    key: &'r str,
    value: &'r str,
    name: NormalizedName,
    rank: (usize, usize),
}

impl FieldMapper {
    pub fn new(table: DirectMappingTable) -> Self {
        Self {
            table,
            similarity: Box::new(TokenOverlap),
            threshold: FUZZY_THRESHOLD,
            key_order: Vec::new(),
        }
    }

    /// Swap the fuzzy scorer and its acceptance threshold
    pub fn with_similarity<S: Similarity + 'static>(mut self, similarity: S, threshold: f64) -> Self {
        self.similarity = Box::new(similarity);
        self.threshold = threshold;
        self
    }

    /// Declared key order used to break fuzzy ties (usually the schema's)
    pub fn with_key_order<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.key_order = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn table(&self) -> &DirectMappingTable {
        &self.table
    }

    /// Resolve every placeholder; the result has exactly these keys.
    pub fn map<'p, I>(&self, record: &ExtractedRecord, placeholders: I) -> MappingResult
    where
        I: IntoIterator<Item = &'p PlaceholderName>,
    {
        let candidates = self.candidates(record);
        let mut result = MappingResult::new();
        for placeholder in placeholders {
            if result.contains(placeholder) {
                continue;
            }
            let resolution = self.resolve_with(record, &candidates, placeholder);
            match resolution.value.as_str() {
                Some(value) => debug!(
                    placeholder = %placeholder,
                    rule = resolution.source.rule(),
                    value,
                    "Mapped placeholder"
                ),
                None => warn!(placeholder = %placeholder, "No mapping found"),
            }
            result.insert(placeholder.clone(), resolution);
        }
        info!(
            total = result.len(),
            mapped = result.mapped_count(),
            "Field mapping complete"
        );
        result
    }

    /// Resolve a single placeholder
    pub fn resolve(&self, record: &ExtractedRecord, placeholder: &PlaceholderName) -> FieldResolution {
        let candidates = self.candidates(record);
        self.resolve_with(record, &candidates, placeholder)
    }

    fn resolve_with(
        &self,
        record: &ExtractedRecord,
        candidates: &[Candidate<'_>],
        placeholder: &PlaceholderName,
    ) -> FieldResolution {
        let floor = match self.table.lookup(placeholder) {
            Some(DirectEntry::NotSourced) => {
                return FieldResolution::unmapped(UnmappedReason::NotSourced);
            }
            Some(DirectEntry::Field(key)) => {
                if let Some(value) = record.get(key) {
                    return FieldResolution::resolved(
                        value,
                        MappingSource::Direct { key: key.to_string() },
                    );
                }
                FULL_MATCH
            }
            None => self.threshold,
        };

        let name = NormalizedName::new(placeholder.as_str());

        if let Some((candidate, score)) = self.best_fuzzy(&name, candidates, floor) {
            return FieldResolution::resolved(
                candidate.value,
                MappingSource::Fuzzy { key: candidate.key.to_string(), score },
            );
        }

        if let Some(family) = CompositeFamily::classify(&name) {
            if let Some(assembled) = family.assemble(record) {
                return FieldResolution::resolved(
                    assembled.value,
                    MappingSource::Composite {
                        family: family.name().to_string(),
                        keys: assembled.keys,
                    },
                );
            }
        }

        FieldResolution::unmapped(UnmappedReason::NoMatch)
    }

    /// Populated record keys, ranked by declared order then record order
    fn candidates<'r>(&self, record: &'r ExtractedRecord) -> Vec<Candidate<'r>> {
        record
            .populated()
            .enumerate()
            .map(|(index, (key, value))| Candidate {
                key,
                value,
                name: NormalizedName::new(key),
                rank: (
                    self.key_order.iter().position(|k| k == key).unwrap_or(usize::MAX),
                    index,
                ),
            })
            .collect()
    }

    /// Highest score at or above `floor`; ties go to the earliest rank
    fn best_fuzzy<'c, 'r>(
        &self,
        placeholder: &NormalizedName,
        candidates: &'c [Candidate<'r>],
        floor: f64,
    ) -> Option<(&'c Candidate<'r>, f64)> {
        let mut best: Option<(&Candidate<'r>, f64)> = None;
        for candidate in candidates {
            let score = self.similarity.score(placeholder, &candidate.name);
            if score < floor {
                continue;
            }
            let better = match best {
                None => true,
                Some((current, current_score)) => {
                    score > current_score || (score == current_score && candidate.rank < current.rank)
                }
            };
            if better {
                best = Some((candidate, score));
            }
        }
        best
    }
}
