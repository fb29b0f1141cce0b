//! Score normalization and blending across the two retrieval legs.
//!
//! Pure functions, kept separate from store I/O so the numeric behavior is
//! testable without a database.

use std::cmp::Ordering;
use std::collections::HashMap;

use docsage_store::SearchHit;

use crate::types::{MemoryContext, RetrievalCandidate};

/// Min and max over a leg's raw scores.
fn minmax(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    let mut any = false;
    for v in values {
        any = true;
        lo = lo.min(v);
        hi = hi.max(v);
    }
    any.then_some((lo, hi))
}

/// Min-max scale one raw score into [0,1] over its leg's observed range.
///
/// A leg with a single candidate or zero score range maps to a constant 1.0.
fn normalize(value: f64, lo: f64, hi: f64) -> f64 {
    if hi - lo < f64::EPSILON {
        return 1.0;
    }
    (value - lo) / (hi - lo)
}

/// Union the two candidate sets by chunk identity `(doc_id, chunk_local_id)`,
/// normalize each leg independently, and blend:
///
/// `blended = alpha * vector_norm + (1 - alpha) * fts_norm`
///
/// A chunk present in only one leg receives 0.0 for the missing leg's
/// normalized score. `boost` starts at zero.
pub fn fuse(
    vector_hits: Vec<SearchHit>,
    fts_hits: Vec<SearchHit>,
    alpha: f64,
) -> Vec<RetrievalCandidate> {
    let vector_range = minmax(vector_hits.iter().map(|h| h.score));
    let fts_range = minmax(fts_hits.iter().map(|h| h.score));

    let mut by_identity: HashMap<(String, i64), RetrievalCandidate> = HashMap::new();

    for hit in vector_hits {
        let key = (hit.chunk.doc_id.clone(), hit.chunk.chunk_local_id);
        by_identity.insert(
            key,
            RetrievalCandidate {
                chunk: hit.chunk,
                vector_score: Some(hit.score),
                fts_score: None,
                vector_norm: 0.0,
                fts_norm: 0.0,
                blended_score: 0.0,
                boost: 0.0,
            },
        );
    }

    for hit in fts_hits {
        let key = (hit.chunk.doc_id.clone(), hit.chunk.chunk_local_id);
        match by_identity.get_mut(&key) {
            Some(existing) => existing.fts_score = Some(hit.score),
            None => {
                by_identity.insert(
                    key,
                    RetrievalCandidate {
                        chunk: hit.chunk,
                        vector_score: None,
                        fts_score: Some(hit.score),
                        vector_norm: 0.0,
                        fts_norm: 0.0,
                        blended_score: 0.0,
                        boost: 0.0,
                    },
                );
            }
        }
    }

    let mut candidates: Vec<RetrievalCandidate> = by_identity.into_values().collect();
    for c in &mut candidates {
        c.vector_norm = match (c.vector_score, vector_range) {
            (Some(v), Some((lo, hi))) => normalize(v, lo, hi),
            _ => 0.0,
        };
        c.fts_norm = match (c.fts_score, fts_range) {
            (Some(v), Some((lo, hi))) => normalize(v, lo, hi),
            _ => 0.0,
        };
        c.blended_score = alpha * c.vector_norm + (1.0 - alpha) * c.fts_norm;
    }
    candidates
}

/// Apply additive memory boosts.
///
/// Scores are deliberately not re-clamped to [0,1] afterwards: the boosts
/// are sized to nudge ordering, and clamping would erase the nudge exactly
/// where the top candidates sit.
pub fn apply_boosts(
    candidates: &mut [RetrievalCandidate],
    memory: &MemoryContext,
    doc_boost: f64,
    product_boost: f64,
) {
    let recent: std::collections::HashSet<&str> =
        memory.recent_doc_ids.iter().map(|s| s.as_str()).collect();

    for c in candidates {
        if recent.contains(c.chunk.doc_id.as_str()) {
            c.boost += doc_boost;
        }
        if let (Some(p), Some(active)) = (c.chunk.product.as_deref(), memory.active_product.as_deref())
        {
            if p == active {
                c.boost += product_boost;
            }
        }
    }
}

/// Drop candidates below the relevance floor, order deterministically, and
/// truncate to `k_final`.
///
/// Order: final score descending; ties by higher raw vector score, then
/// `doc_id` ascending, then `chunk_local_id` ascending.
pub fn filter_and_rank(
    mut candidates: Vec<RetrievalCandidate>,
    min_relevance: f64,
    k_final: usize,
) -> Vec<RetrievalCandidate> {
    candidates.retain(|c| c.final_score() >= min_relevance);

    candidates.sort_by(|a, b| {
        b.final_score()
            .partial_cmp(&a.final_score())
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                let av = a.vector_score.unwrap_or(f64::NEG_INFINITY);
                let bv = b.vector_score.unwrap_or(f64::NEG_INFINITY);
                bv.partial_cmp(&av).unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.chunk.doc_id.cmp(&b.chunk.doc_id))
            .then_with(|| a.chunk.chunk_local_id.cmp(&b.chunk.chunk_local_id))
    });

    candidates.truncate(k_final);
    candidates
}
