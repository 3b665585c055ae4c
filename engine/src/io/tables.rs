//! Report tables. Every writer emits its header row even when there is no data.

use std::io::{Read, Write};

use crate::{
    data::{
        entry::{EntityType, FilterSet},
        records::{ProblematicQueryRecord, QueryRecord, RolledUpQueryRecord},
        MatcherError, LIST_SEPARATOR,
    },
    io::{clean_headers, column, csv_reader, csv_writer},
    lexer::matcher::{MatchClassification, ShingleMatch},
    match_warn,
    synonyms::SynonymExpansion,
    util::currency::{format_revenue, parse_revenue, parse_visits},
};

pub const MATCHED_HEADERS: [&str; 10] = [
    "Matched Shingle",
    "Entities",
    "Shingle Type",
    "Entity Type",
    "Search Query",
    "Visits",
    "Revenue",
    "Overlap",
    "Entity Overlaps",
    "Entity Type Overlaps",
];
pub const UNMATCHED_HEADERS: [&str; 4] = ["Unmatched Shingle", "Search Query", "Visits", "Revenue"];
pub const PROBLEMATIC_HEADERS: [&str; 6] = [
    "Problematic Search Query",
    "Legitimate",
    "Catalog Field",
    "Normalization Filters",
    "Visits",
    "Revenue",
];
pub static ROLLED_UP_COLUMN: &str = "Rolled Up Queries";
pub const SYNONYM_HEADERS: [&str; 5] = [
    "Left Term",
    "Match Type",
    "Entity",
    "Original Line",
    "Rewritten Line",
];

/// Separator inside the matched table's entity columns.
const ENTITY_SEPARATOR: &str = "|";

/// Matched and unmatched shingle tables, filled one query at a time.
pub struct AuditTables<W: Write> {
    matched: csv::Writer<W>,
    unmatched: csv::Writer<W>,
    matched_rows: usize,
    unmatched_rows: usize,
}

impl<W: Write> AuditTables<W> {
    pub fn new(matched: W, unmatched: W) -> Result<Self, MatcherError> {
        let mut matched = csv_writer(matched);
        let mut unmatched = csv_writer(unmatched);
        matched.write_record(MATCHED_HEADERS)?;
        unmatched.write_record(UNMATCHED_HEADERS)?;
        Ok(AuditTables {
            matched,
            unmatched,
            matched_rows: 0,
            unmatched_rows: 0,
        })
    }

    pub fn write_query(
        &mut self,
        query: &QueryRecord,
        outcomes: &[ShingleMatch],
    ) -> Result<(), MatcherError> {
        let visits = query.visits.to_string();
        let revenue = format_revenue(query.revenue);
        for outcome in outcomes {
            match outcome {
                ShingleMatch::Matched(classification) => {
                    self.matched
                        .write_record(matched_row(classification, query, &visits, &revenue))?;
                    self.matched_rows += 1;
                }
                ShingleMatch::Unmatched(shingle) => {
                    self.unmatched
                        .write_record([
                            shingle.as_str(),
                            query.text.as_str(),
                            visits.as_str(),
                            revenue.as_str(),
                        ])?;
                    self.unmatched_rows += 1;
                }
            }
        }
        Ok(())
    }

    /// Flush both tables and return `(matched rows, unmatched rows)`.
    pub fn finish(mut self) -> Result<(usize, usize), MatcherError> {
        self.matched.flush()?;
        self.unmatched.flush()?;
        Ok((self.matched_rows, self.unmatched_rows))
    }
}

fn matched_row(
    classification: &MatchClassification,
    query: &QueryRecord,
    visits: &str,
    revenue: &str,
) -> Vec<String> {
    let entities: Vec<&str> = classification.entity_values().collect();
    let types: Vec<&str> = classification.entity_types().map(EntityType::as_str).collect();
    vec![
        classification.shingle.clone(),
        entities.join(ENTITY_SEPARATOR),
        classification.match_kind.to_string(),
        types.join(ENTITY_SEPARATOR),
        query.text.clone(),
        visits.to_string(),
        revenue.to_string(),
        if classification.overlap { "yes" } else { "no" }.to_string(),
        classification.distinct_entities.to_string(),
        classification.distinct_types.to_string(),
    ]
}

fn problematic_row(record: &ProblematicQueryRecord) -> Vec<String> {
    vec![
        record.query.clone(),
        record.legitimacy_flag().to_string(),
        record.entity_types_cell(),
        record.normalization_filters.to_string(),
        record.visits.to_string(),
        format_revenue(record.revenue),
    ]
}

pub fn write_problematic<W: Write>(
    out: W,
    records: &[ProblematicQueryRecord],
) -> Result<(), MatcherError> {
    let mut writer = csv_writer(out);
    writer.write_record(PROBLEMATIC_HEADERS)?;
    for record in records {
        writer.write_record(problematic_row(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a problematic queries table back, skipping rows that do not parse.
pub fn read_problematic<R: Read>(input: R) -> Result<Vec<ProblematicQueryRecord>, MatcherError> {
    let mut reader = csv_reader(input);
    let headers = clean_headers(reader.headers()?);
    let at: Vec<usize> = PROBLEMATIC_HEADERS
        .iter()
        .map(|name| column(&headers, name))
        .collect::<Result<_, _>>()?;

    let mut records = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                match_warn!("Tables", "problematic", "skipping row {}: {}", line + 2, err);
                continue;
            }
        };
        let cell = |i: usize| record.get(at[i]).unwrap_or_default();
        let parsed = parse_visits(cell(4)).and_then(|v| parse_revenue(cell(5)).map(|r| (v, r)));
        let (visits, revenue) = match parsed {
            Ok(values) => values,
            Err(err) => {
                match_warn!("Tables", "problematic", "skipping row {}: {}", line + 2, err);
                continue;
            }
        };
        records.push(ProblematicQueryRecord {
            query: cell(0).to_string(),
            legitimate_after_normalization: cell(1).trim().eq_ignore_ascii_case("y"),
            entity_types: cell(2)
                .split(LIST_SEPARATOR)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(EntityType::from)
                .collect(),
            normalization_filters: FilterSet::parse(cell(3)),
            visits,
            revenue,
        });
    }
    Ok(records)
}

pub fn write_rolled_up<W: Write>(
    out: W,
    groups: &[RolledUpQueryRecord],
) -> Result<(), MatcherError> {
    let mut writer = csv_writer(out);
    let mut headers: Vec<&str> = PROBLEMATIC_HEADERS.to_vec();
    headers.push(ROLLED_UP_COLUMN);
    writer.write_record(&headers)?;
    for group in groups {
        let mut row = problematic_row(&group.to_record());
        row.push(group.merged_queries.join(LIST_SEPARATOR));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_synonym_expansions<W: Write>(
    out: W,
    expansions: &[SynonymExpansion],
) -> Result<(), MatcherError> {
    let mut writer = csv_writer(out);
    writer.write_record(SYNONYM_HEADERS)?;
    for expansion in expansions {
        writer.write_record([
            expansion.left_term.as_str(),
            expansion.match_kind.map(|kind| kind.as_str()).unwrap_or_default(),
            expansion
                .entity_type
                .as_ref()
                .map(EntityType::as_str)
                .unwrap_or_default(),
            expansion.original_line.as_str(),
            expansion.rewritten_line.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::entry::MatchKind;
    use crate::data::index::ShingleIndex;
    use crate::lexer::matcher::QueryMatcher;
    use rust_decimal::Decimal;

    fn problematic() -> ProblematicQueryRecord {
        ProblematicQueryRecord {
            query: "blue short".to_string(),
            legitimate_after_normalization: true,
            entity_types: ["color", "category"].into_iter().map(EntityType::from).collect(),
            normalization_filters: FilterSet::parse("PorterStemFilter"),
            visits: 1200,
            revenue: Decimal::new(123456, 2),
        }
    }

    #[test]
    fn test_audit_tables() {
        let color = EntityType::from("color");
        let category = EntityType::from("category");
        let index = ShingleIndex::from_cells(vec![
            (&color, "light blue"),
            (&color, "blue"),
            (&category, "shorts"),
        ]);
        let query = QueryRecord::new("blue shorts", 3, Decimal::new(1000, 2));
        let outcomes = QueryMatcher::new(&index).match_query(&query.text);

        let (mut matched, mut unmatched) = (Vec::new(), Vec::new());
        let mut tables = AuditTables::new(&mut matched, &mut unmatched).unwrap();
        tables.write_query(&query, &outcomes).unwrap();
        assert_eq!(tables.finish().unwrap(), (2, 1));

        let matched = String::from_utf8(matched).unwrap();
        let lines: Vec<&str> = matched.lines().collect();
        assert_eq!(lines[0], MATCHED_HEADERS.join(","));
        assert_eq!(
            lines[1],
            "blue,light blue|blue,full,color,blue shorts,3,$10.00,yes,2,1"
        );
        assert_eq!(lines[2], "shorts,shorts,full,category,blue shorts,3,$10.00,no,1,1");

        let unmatched = String::from_utf8(unmatched).unwrap();
        assert_eq!(
            unmatched,
            "Unmatched Shingle,Search Query,Visits,Revenue\nblue shorts,blue shorts,3,$10.00\n"
        );
    }

    #[test]
    fn test_headers_written_without_rows() {
        let mut out = Vec::new();
        write_problematic(&mut out, &[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Problematic Search Query,Legitimate,Catalog Field,Normalization Filters,Visits,Revenue\n"
        );
    }

    #[test]
    fn test_problematic_table_reads_back() {
        let mut out = Vec::new();
        write_problematic(&mut out, &[problematic()]).unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.ends_with("blue short,Y,category/color,PorterStemFilter,1200,\"$1,234.56\"\n"));
        assert_eq!(read_problematic(out.as_slice()).unwrap(), vec![problematic()]);
    }

    #[test]
    fn test_rolled_up_table() {
        let group = RolledUpQueryRecord {
            representative: problematic(),
            aggregated_visits: 1203,
            aggregated_revenue: Decimal::new(124456, 2),
            merged_filters: FilterSet::parse("PorterStemFilter/SynonymGraphFilter"),
            merged_queries: vec!["blue shorts".to_string(), "Blue Short".to_string()],
        };
        let mut out = Vec::new();
        write_rolled_up(&mut out, &[group]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].ends_with(",Revenue,Rolled Up Queries"));
        assert_eq!(
            lines[1],
            "blue short,Y,category/color,PorterStemFilter/SynonymGraphFilter,1203,\"$1,244.56\",blue shorts/Blue Short"
        );
    }

    #[test]
    fn test_synonym_table_blank_when_unmatched() {
        let expansions = vec![
            SynonymExpansion {
                left_term: "joggers".to_string(),
                match_kind: Some(MatchKind::Full),
                entity_type: Some(EntityType::from("category")),
                original_line: "joggers => sweatpants".to_string(),
                rewritten_line: "joggers => joggers, sweatpants".to_string(),
            },
            SynonymExpansion {
                left_term: "tights".to_string(),
                match_kind: None,
                entity_type: None,
                original_line: "tights => leggings".to_string(),
                rewritten_line: "tights => tights, leggings".to_string(),
            },
        ];
        let mut out = Vec::new();
        write_synonym_expansions(&mut out, &expansions).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[1],
            "joggers,full,category,joggers => sweatpants,\"joggers => joggers, sweatpants\""
        );
        assert_eq!(lines[2], "tights,,,tights => leggings,\"tights => tights, leggings\"");
    }
}
