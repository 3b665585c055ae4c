use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use shinglematch::{
    data::{
        DEFAULT_CORE, DEFAULT_FIELD_SUFFIX, DEFAULT_FOLD_FIELD_TYPE, DEFAULT_SOLR_URL,
        DEFAULT_STEM_FIELD_TYPE, DEFAULT_SYNONYM_FIELD_TYPE, ENV_VAR_API_KEY, ENV_VAR_CORE,
        ENV_VAR_FIELD_SUFFIX, ENV_VAR_FOLD_FIELD_TYPE, ENV_VAR_LOG, ENV_VAR_SOLR_URL,
        ENV_VAR_STEM_FIELD_TYPE, ENV_VAR_SYNONYM_FIELD_TYPE,
    },
    io::{self, catalog::Catalog, queries, tables},
    match_error, match_log, pipeline,
    pipeline::FieldTypes,
    services::{catalog::CatalogRowOracle, solr::SolrNormalizer, solr::SolrOracle},
    synonyms::process_synonyms,
    MatcherError, ProblematicQueryRecord, RepresentativePolicy, RowExistenceOracle, ServiceError,
};
use shinglematch_client::http::Client;
use tracing_subscriber::EnvFilter;

static DEFAULT_LOG_DIRECTIVE: &str = "shinglematch=info";

#[derive(Parser)]
#[command(
    name = "shinglematch",
    about = "Find search queries whose catalog facets never co-occur on a catalog item",
    version
)]
struct Cli {
    /// Search engine base URL
    #[arg(long, global = true, env = ENV_VAR_SOLR_URL, default_value = DEFAULT_SOLR_URL)]
    solr_url: String,

    /// Core holding the catalog rows
    #[arg(long, global = true, env = ENV_VAR_CORE, default_value = DEFAULT_CORE)]
    core: String,

    /// Value sent in the X-API-Key header
    #[arg(long, global = true, env = ENV_VAR_API_KEY)]
    api_key: Option<String>,

    /// Field type used to stem index keys and canonical rollup forms
    #[arg(long, global = true, env = ENV_VAR_STEM_FIELD_TYPE, default_value = DEFAULT_STEM_FIELD_TYPE)]
    stem_field_type: String,

    /// Field type whose analysis emits the synonym lattice
    #[arg(long, global = true, env = ENV_VAR_SYNONYM_FIELD_TYPE, default_value = DEFAULT_SYNONYM_FIELD_TYPE)]
    synonym_field_type: String,

    /// Field type used to fold query text before aggregation
    #[arg(long, global = true, env = ENV_VAR_FOLD_FIELD_TYPE, default_value = DEFAULT_FOLD_FIELD_TYPE)]
    fold_field_type: String,

    /// Suffix appended to an entity type to form its catalog field name
    #[arg(long, global = true, env = ENV_VAR_FIELD_SUFFIX, default_value = DEFAULT_FIELD_SUFFIX)]
    field_suffix: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collapse the raw traffic table by folded query text
    Aggregate {
        /// Raw query traffic table
        #[arg(short, long)]
        input: PathBuf,

        /// Aggregated traffic table
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Build the shingle index and report matched, unmatched and problematic queries
    Detect(DetectArgs),

    /// Roll up a problematic queries table by normalized form
    Rollup {
        /// Problematic queries table
        #[arg(short, long)]
        input: PathBuf,

        /// Rolled-up queries table
        #[arg(short, long, default_value = "RolledUpQueries.csv")]
        output: PathBuf,

        #[arg(long, default_value = "group-max")]
        representative: RepresentativePolicy,
    },

    /// Rewrite synonym rules so every left term also maps to itself
    Synonyms {
        /// Entity table
        #[arg(short, long)]
        catalog: PathBuf,

        /// Synonym rules file
        #[arg(short, long)]
        rules: PathBuf,

        /// Rewritten rules file
        #[arg(long, default_value = "RewrittenSynonyms.txt")]
        rewritten: PathBuf,

        /// Synonym expansions table
        #[arg(long, default_value = "SynonymExpansions.csv")]
        expansions: PathBuf,
    },

    /// Detect, then roll up the problematic queries
    Run {
        #[command(flatten)]
        detect: DetectArgs,

        /// Rolled-up queries table
        #[arg(long, default_value = "RolledUpQueries.csv")]
        rolled_up: PathBuf,

        #[arg(long, default_value = "group-max")]
        representative: RepresentativePolicy,
    },
}

#[derive(Args)]
struct DetectArgs {
    /// Entity table: one column of distinct values per entity type
    #[arg(short, long)]
    catalog: PathBuf,

    /// Query traffic table
    #[arg(short, long)]
    queries: PathBuf,

    #[arg(long, default_value = "MatchedTable.csv")]
    matched: PathBuf,

    #[arg(long, default_value = "UnmatchedTable.csv")]
    unmatched: PathBuf,

    #[arg(long, default_value = "ProblematicSearches.csv")]
    problematic: PathBuf,

    /// Also write the expanded index, one key per line
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Where row co-occurrence is checked
    #[arg(long, value_enum, default_value_t = OracleKind::Solr)]
    oracle: OracleKind,

    /// Item-level catalog, one row per catalog item; read by `--oracle catalog`
    #[arg(long, required_if_eq("oracle", "catalog"))]
    catalog_rows: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OracleKind {
    /// Count matching documents in the search engine
    Solr,
    /// Scan the item-level catalog given by --catalog-rows
    Catalog,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        match_error!("Main", "run", "{}", err);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(ENV_VAR_LOG)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), MatcherError> {
    let mut client =
        Client::new(cli.solr_url.clone(), cli.core.clone()).map_err(ServiceError::from)?;
    if let Some(api_key) = cli.api_key.clone() {
        client = client.with_api_key(api_key);
    }
    let normalizer = SolrNormalizer::new(&client);
    let field_types = FieldTypes {
        stem: cli.stem_field_type.clone(),
        synonym: cli.synonym_field_type.clone(),
        fold: cli.fold_field_type.clone(),
    };

    match cli.command {
        Commands::Aggregate { input, output } => {
            let table = queries::read_traffic(File::open(&input)?)?;
            let aggregated = pipeline::aggregate(table.records, &normalizer, &field_types)?;
            queries::write_traffic(io::create(&output)?, &table.headers, &aggregated)?;
            match_log!("Main", "aggregate", "wrote {}", output.display());
        }
        Commands::Detect(args) => {
            detect(&args, &client, &normalizer, &field_types, &cli.field_suffix)?;
        }
        Commands::Rollup {
            input,
            output,
            representative,
        } => {
            let records = tables::read_problematic(File::open(&input)?)?;
            rollup(records, &normalizer, &field_types, representative, &output)?;
        }
        Commands::Synonyms {
            catalog,
            rules,
            rewritten,
            expansions,
        } => {
            let catalog = Catalog::from_path(&catalog)?;
            let index = pipeline::build_index(&catalog, &normalizer, &field_types)?;
            let rows = process_synonyms(
                BufReader::new(File::open(&rules)?),
                &index,
                io::create(&rewritten)?,
            )?;
            tables::write_synonym_expansions(io::create(&expansions)?, &rows)?;
            match_log!("Main", "synonyms", "wrote {}", expansions.display());
        }
        Commands::Run {
            detect: args,
            rolled_up,
            representative,
        } => {
            let records = detect(&args, &client, &normalizer, &field_types, &cli.field_suffix)?;
            rollup(records, &normalizer, &field_types, representative, &rolled_up)?;
        }
    }
    Ok(())
}

fn detect(
    args: &DetectArgs,
    client: &Client,
    normalizer: &SolrNormalizer<'_>,
    field_types: &FieldTypes,
    field_suffix: &str,
) -> Result<Vec<ProblematicQueryRecord>, MatcherError> {
    let catalog = Catalog::from_path(&args.catalog)?;
    let index = pipeline::build_index(&catalog, normalizer, field_types)?;
    if let Some(dump) = &args.dump {
        index.write_dump(io::create(dump)?)?;
        match_log!("Main", "detect", "index written to {}", dump.display());
    }

    let records = queries::read_queries(File::open(&args.queries)?)?;
    let audit = tables::AuditTables::new(io::create(&args.matched)?, io::create(&args.unmatched)?)?;

    let solr_oracle;
    let item_rows;
    let catalog_oracle;
    let oracle: &dyn RowExistenceOracle = match args.oracle {
        OracleKind::Solr => {
            solr_oracle = SolrOracle::new(client, field_suffix);
            &solr_oracle
        }
        OracleKind::Catalog => {
            let path = args
                .catalog_rows
                .as_ref()
                .ok_or(MatcherError::MissingArgument("--catalog-rows"))?;
            item_rows = Catalog::from_path(path)?;
            catalog_oracle = CatalogRowOracle::new(&item_rows);
            &catalog_oracle
        }
    };

    let report = pipeline::detect(&index, oracle, &records, audit)?;
    tables::write_problematic(io::create(&args.problematic)?, &report.problematic)?;
    match_log!(
        "Main",
        "detect",
        "{} matched rows, {} unmatched rows, {} problematic queries written to {}",
        report.matched_rows,
        report.unmatched_rows,
        report.problematic.len(),
        args.problematic.display()
    );
    Ok(report.problematic)
}

fn rollup(
    records: Vec<ProblematicQueryRecord>,
    normalizer: &SolrNormalizer<'_>,
    field_types: &FieldTypes,
    policy: RepresentativePolicy,
    output: &Path,
) -> Result<(), MatcherError> {
    let groups = pipeline::rollup(records, normalizer, field_types, policy)?;
    tables::write_rolled_up(io::create(output)?, &groups)?;
    match_log!(
        "Main",
        "rollup",
        "{} groups written to {}",
        groups.len(),
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_oracle_requires_item_rows() {
        let base = ["shinglematch", "detect", "-c", "entities.csv", "-q", "queries.csv"];
        assert!(Cli::try_parse_from(base).is_ok());
        assert!(Cli::try_parse_from(base.iter().chain(&["--oracle", "catalog"])).is_err());

        let cli = Cli::try_parse_from(
            base.iter()
                .chain(&["--oracle", "catalog", "--catalog-rows", "items.csv"]),
        )
        .unwrap();
        match cli.command {
            Commands::Detect(args) => {
                assert!(args.oracle == OracleKind::Catalog);
                assert_eq!(args.catalog_rows, Some(PathBuf::from("items.csv")));
            }
            _ => panic!("expected detect"),
        }
    }
}
