use shinglematch_client::{
    http::Client,
    query::{QueryBuilder, QueryExpr},
    AnalysisStage, StageOutput,
};

use crate::{
    data::entry::FilterSet,
    lexer::lattice::LatticeToken,
    match_debug,
    services::{Normalization, RowCondition, RowExistenceOracle, ServiceError, TextNormalizer},
};

/// Normalizer backed by the search engine's field analysis endpoint.
pub struct SolrNormalizer<'a> {
    client: &'a Client,
}

impl<'a> SolrNormalizer<'a> {
    pub fn new(client: &'a Client) -> Self {
        SolrNormalizer { client }
    }
}

impl TextNormalizer for SolrNormalizer<'_> {
    fn normalize(&self, text: &str, field_type: &str) -> Result<Normalization, ServiceError> {
        let stages = self.client.analyze_field(field_type, text)?;
        Ok(normalization_from_stages(text, &stages))
    }
}

/// A stage counts as applied when its texts differ from the previous
/// stage's; stages that emit nothing are passed over. Final tokens come from
/// the last stage.
fn normalization_from_stages(text: &str, stages: &[AnalysisStage]) -> Normalization {
    let mut filters_applied = FilterSet::new();
    let mut previous = vec![text.to_string()];
    for stage in stages {
        let texts = stage.output.texts();
        if texts.is_empty() {
            continue;
        }
        if texts != previous {
            filters_applied.insert(stage.name.as_str());
        }
        previous = texts;
    }

    let tokens = match stages.last().map(|stage| &stage.output) {
        Some(StageOutput::Tokens(tokens)) => tokens
            .iter()
            .map(|t| LatticeToken::new(t.text.as_str(), t.position, t.position_length))
            .collect(),
        Some(StageOutput::Text(text)) if !text.is_empty() => vec![LatticeToken::new(text.as_str(), 1, 1)],
        _ => Vec::new(),
    };

    Normalization {
        tokens,
        filters_applied,
    }
}

/// Oracle that counts matching documents in the catalog core.
pub struct SolrOracle<'a> {
    client: &'a Client,
    field_suffix: String,
}

impl<'a> SolrOracle<'a> {
    pub fn new<S: Into<String>>(client: &'a Client, field_suffix: S) -> Self {
        SolrOracle {
            client,
            field_suffix: field_suffix.into(),
        }
    }

    /// `(type_t:"a" OR type_t:"b") AND (...)`, one parenthesized group per
    /// condition group. `None` when there is nothing to ask.
    pub fn query_for(&self, condition: &RowCondition) -> Option<QueryExpr> {
        condition
            .groups()
            .iter()
            .map(|group| {
                QueryExpr::any_of(group.iter().map(|clause| {
                    QueryExpr::phrase(
                        format!("{}{}", clause.entity_type, self.field_suffix),
                        clause.value.as_str(),
                    )
                }))
            })
            .collect::<Option<Vec<QueryExpr>>>()?
            .into_iter()
            .fold(QueryBuilder::new(), QueryBuilder::and_expr)
            .build()
    }
}

impl RowExistenceOracle for SolrOracle<'_> {
    fn exists(&self, condition: &RowCondition) -> Result<bool, ServiceError> {
        let expr = match self.query_for(condition) {
            Some(expr) => expr,
            None => return Ok(false),
        };
        let found = self.client.count_expr(&expr)?;
        match_debug!("SolrOracle", self.client.core(), "{} -> {} rows", expr, found);
        Ok(found > 0)
    }
}
