use std::io::{Read, Write};

use crate::{
    data::{records::QueryRecord, MatcherError},
    io::{clean_headers, column, csv_reader, csv_writer},
    match_log, match_warn,
    util::currency::{format_revenue, parse_revenue, parse_visits},
};

pub static QUERY_COLUMN: &str = "Search Query";
pub static VISITS_COLUMN: &str = "Visits";
pub static REVENUE_COLUMN: &str = "Revenue";

/// A traffic table with its header row, so columns beyond query, visits and
/// revenue can be written back in their original order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficTable {
    pub headers: Vec<String>,
    pub records: Vec<QueryRecord>,
}

/// Read the query traffic table, locating its columns by header name.
pub fn read_queries<R: Read>(input: R) -> Result<Vec<QueryRecord>, MatcherError> {
    Ok(read_traffic(input)?.records)
}

/// Like [`read_queries`], keeping the header row and every other column.
pub fn read_traffic<R: Read>(input: R) -> Result<TrafficTable, MatcherError> {
    let mut reader = csv_reader(input);
    let headers = clean_headers(reader.headers()?);
    let query_at = column(&headers, QUERY_COLUMN)?;
    let visits_at = column(&headers, VISITS_COLUMN)?;
    let revenue_at = column(&headers, REVENUE_COLUMN)?;
    let core = [query_at, visits_at, revenue_at];

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (line, record) in reader.records().enumerate() {
        let row = line + 2;
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                match_warn!("Queries", "read", "skipping row {}: {}", row, err);
                skipped += 1;
                continue;
            }
        };
        let (text, visits, revenue) = match (
            record.get(query_at),
            record.get(visits_at),
            record.get(revenue_at),
        ) {
            (Some(text), Some(visits), Some(revenue)) => (text, visits, revenue),
            _ => {
                match_warn!("Queries", "read", "skipping row {}: missing fields", row);
                skipped += 1;
                continue;
            }
        };

        let parsed = parse_visits(visits).and_then(|v| parse_revenue(revenue).map(|r| (v, r)));
        match parsed {
            Ok((visits, revenue)) => {
                let columns = headers
                    .iter()
                    .zip(record.iter())
                    .enumerate()
                    .filter(|(at, _)| !core.contains(at))
                    .map(|(_, (header, value))| (header.clone(), value.to_string()))
                    .collect();
                records.push(QueryRecord::new(text.trim(), visits, revenue).with_columns(columns))
            }
            Err(err) => {
                match_warn!("Queries", "read", "skipping row {}: {}", row, err);
                skipped += 1;
            }
        }
    }

    match_log!(
        "Queries",
        "read",
        "{} queries read, {} rows skipped",
        records.len(),
        skipped
    );
    Ok(TrafficTable { headers, records })
}

/// Write a traffic table that [`read_queries`] can read back.
pub fn write_queries<W: Write>(out: W, records: &[QueryRecord]) -> Result<(), MatcherError> {
    let headers = [QUERY_COLUMN, VISITS_COLUMN, REVENUE_COLUMN].map(str::to_string);
    write_traffic(out, &headers, records)
}

/// Write `records` under `headers`. Query, visits and revenue come from the
/// record fields; any other header takes the record's matching column, or an
/// empty cell.
pub fn write_traffic<W: Write>(
    out: W,
    headers: &[String],
    records: &[QueryRecord],
) -> Result<(), MatcherError> {
    let mut writer = csv_writer(out);
    writer.write_record(headers)?;
    for record in records {
        let row: Vec<String> = headers
            .iter()
            .map(|header| match header.as_str() {
                h if h == QUERY_COLUMN => record.text.clone(),
                h if h == VISITS_COLUMN => record.visits.to_string(),
                h if h == REVENUE_COLUMN => format_revenue(record.revenue),
                h => record.column(h).unwrap_or_default().to_string(),
            })
            .collect();
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}
