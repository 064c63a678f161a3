//! Run reconciliation
//!
//! Word splits text into runs wherever formatting, spell-check state or
//! editing history changes, so `[INSURED_NAME]` can arrive as `[INS`,
//! `URED_` and `NAME]`. Planning works on the paragraph's concatenated text:
//! the replacement goes into the segment holding the opening bracket (which
//! keeps that run's formatting) and the rest of the placeholder is cut from
//! the following segments. Text outside placeholders is never touched.

use doc_model::{scan_placeholders, PlaceholderName};
use std::ops::Range;

/// Text of one segment and whether it may be rewritten
#[derive(Debug, Clone, Copy)]
pub struct SegmentText<'a> {
    pub text: &'a str,
    pub editable: bool,
}

/// New text for one segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentEdit {
    pub segment: usize,
    pub text: String,
}

/// Edits for one paragraph plus what they accomplish
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub edits: Vec<SegmentEdit>,
    /// One entry per replaced occurrence
    pub replaced: Vec<PlaceholderName>,
    /// Occurrences left in place because no value was supplied
    pub left: Vec<PlaceholderName>,
}

/// Why a paragraph could not be planned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileError {
    pub placeholder: PlaceholderName,
    pub reason: String,
}

struct Replacement<'v> {
    range: Range<usize>,
    value: &'v str,
}

/// Plan the edits for one paragraph. Either every replacement in the
/// paragraph can be made or none is: a placeholder overlapping a segment
/// that cannot hold text fails the whole paragraph.
pub fn plan<'v, F>(segments: &[SegmentText<'_>], value_for: F) -> Result<ReconcilePlan, ReconcileError>
where
    F: Fn(&PlaceholderName) -> Option<&'v str>,
{
    let mut bounds = Vec::with_capacity(segments.len());
    let mut full = String::new();
    for segment in segments {
        let start = full.len();
        full.push_str(segment.text);
        bounds.push(start..full.len());
    }

    let mut plan = ReconcilePlan::default();
    let mut replacements = Vec::new();
    for found in scan_placeholders(&full) {
        let Some(value) = value_for(&found.name) else {
            plan.left.push(found.name);
            continue;
        };
        let blocked = bounds.iter().zip(segments).any(|(bound, segment)| {
            overlap(bound, &found.range) > 0 && !segment.editable
        });
        if blocked {
            return Err(ReconcileError {
                reason: format!("{} spans content that is not plain text", found.name),
                placeholder: found.name,
            });
        }
        replacements.push(Replacement {
            range: found.range,
            value,
        });
        plan.replaced.push(found.name);
    }

    for (index, bound) in bounds.iter().enumerate() {
        let mut text = String::new();
        let mut cursor = bound.start;
        let mut touched = false;
        for replacement in &replacements {
            if overlap(bound, &replacement.range) == 0 {
                continue;
            }
            touched = true;
            text.push_str(&full[cursor..replacement.range.start.max(bound.start)]);
            if replacement.range.start >= bound.start {
                text.push_str(replacement.value);
            }
            cursor = replacement.range.end.min(bound.end);
        }
        if touched {
            text.push_str(&full[cursor..bound.end]);
            plan.edits.push(SegmentEdit { segment: index, text });
        }
    }

    Ok(plan)
}

fn overlap(a: &Range<usize>, b: &Range<usize>) -> usize {
    a.end.min(b.end).saturating_sub(a.start.max(b.start))
}
