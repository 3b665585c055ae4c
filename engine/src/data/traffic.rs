use std::collections::HashMap;

use crate::{
    data::records::QueryRecord,
    match_debug, match_log,
    services::{ServiceError, TextNormalizer},
};

const PROGRESS_EVERY: usize = 1000;

/// Collapse the traffic feed by the normalized text of each query.
///
/// Visits and revenue of every query sharing a normalized form are summed
/// into one record carrying that form as its text and the other columns of
/// the first row seen with it. Records come out in the order their normalized
/// form was first seen.
pub fn aggregate_by_normalized<N>(
    records: Vec<QueryRecord>,
    normalizer: &N,
    field_type: &str,
) -> Result<Vec<QueryRecord>, ServiceError>
where
    N: TextNormalizer + ?Sized,
{
    let total = records.len();
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut aggregated: Vec<QueryRecord> = Vec::new();

    for (processed, record) in records.into_iter().enumerate() {
        let normalized = normalizer.normalize(&record.text, field_type)?.final_text();
        match position.get(&normalized) {
            Some(&slot) => {
                let target = &mut aggregated[slot];
                target.visits += record.visits;
                target.revenue += record.revenue;
            }
            None => {
                position.insert(normalized.clone(), aggregated.len());
                aggregated.push(QueryRecord {
                    text: normalized,
                    ..record
                });
            }
        }

        if (processed + 1) % PROGRESS_EVERY == 0 {
            match_debug!("Traffic", field_type, "queries processed: {}", processed + 1);
        }
    }

    match_log!(
        "Traffic",
        field_type,
        "aggregated {} queries into {} normalized queries",
        total,
        aggregated.len()
    );
    Ok(aggregated)
}
