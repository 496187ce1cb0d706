//! Label attribution over the four directory listings.
//!
//! Every identifier found in either image listing becomes a candidate row.
//! A row is labelled positive when a mask with the same identifier exists in
//! either source, then the source-selection policy drops rows and repeated
//! identifiers collapse to a single row.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// Which imagery sources contribute rows to the attribution table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SourceSelection {
    /// Only identifiers with a source-A image
    SourceAOnly,
    /// Only identifiers with a source-B image
    SourceBOnly,
    /// Every identifier from either source
    #[default]
    All,
}

impl SourceSelection {
    /// Map the two `use_*` flags to a policy.
    ///
    /// Selecting neither source keeps everything, exactly like selecting both.
    pub fn from_flags(use_source_a: bool, use_source_b: bool) -> Self {
        match (use_source_a, use_source_b) {
            (true, false) => SourceSelection::SourceAOnly,
            (false, true) => SourceSelection::SourceBOnly,
            (true, true) | (false, false) => SourceSelection::All,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SourceSelection::SourceAOnly => "source A only",
            SourceSelection::SourceBOnly => "source B only",
            SourceSelection::All => "all sources",
        }
    }

    /// Whether a row survives this policy.
    pub fn keeps(&self, row: &AttributionRow) -> bool {
        match self {
            SourceSelection::SourceAOnly => row.is_source_a,
            SourceSelection::SourceBOnly => row.is_source_b,
            SourceSelection::All => true,
        }
    }
}

/// The identifiers found in the four input directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceListings {
    pub source_a_images: Vec<String>,
    pub source_a_masks: Vec<String>,
    pub source_b_images: Vec<String>,
    pub source_b_masks: Vec<String>,
}

/// One identifier with its mask-presence label and source membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributionRow {
    pub identifier: String,
    /// `1` when a mask exists in either source, else `0`
    pub label: u8,
    pub is_source_a: bool,
    pub is_source_b: bool,
}

fn to_set(ids: &[String]) -> HashSet<&str> {
    ids.iter().map(String::as_str).collect()
}

/// Build the attribution table for `listings` under `selection`.
///
/// Rows keep the order of first appearance: source-A images first, then
/// source-B images.
pub fn attribute_labels(listings: &SourceListings, selection: SourceSelection) -> Vec<AttributionRow> {
    let masks: HashSet<&str> = listings
        .source_a_masks
        .iter()
        .chain(listings.source_b_masks.iter())
        .map(String::as_str)
        .collect();
    let source_a = to_set(&listings.source_a_images);
    let source_b = to_set(&listings.source_b_images);

    let candidates = listings
        .source_a_images
        .iter()
        .chain(listings.source_b_images.iter());

    let mut seen: HashSet<&str> = HashSet::new();
    let mut rows = Vec::new();
    let mut dropped_by_policy = 0usize;
    let mut duplicates = 0usize;

    for identifier in candidates {
        let id = identifier.as_str();
        let row = AttributionRow {
            identifier: identifier.clone(),
            label: u8::from(masks.contains(id)),
            is_source_a: source_a.contains(id),
            is_source_b: source_b.contains(id),
        };

        if !selection.keeps(&row) {
            dropped_by_policy += 1;
            continue;
        }
        if !seen.insert(id) {
            duplicates += 1;
            continue;
        }

        debug!(
            "Attributed {} label={} source_a={} source_b={}",
            row.identifier, row.label, row.is_source_a, row.is_source_b
        );
        rows.push(row);
    }

    info!(
        "Attribution ({}): {} rows kept, {} dropped by policy, {} duplicates collapsed",
        selection.as_str(),
        rows.len(),
        dropped_by_policy,
        duplicates
    );

    rows
}
