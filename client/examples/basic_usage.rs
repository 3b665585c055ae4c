use std::process::exit;

use shinglematch_client::http::Client;
use shinglematch_client::query::{QueryBuilder, QueryExpr};
use shinglematch_client::Result;

fn main() -> Result<()> {
    // Expect the base URL, the core name and a field type to analyze with
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <base_url> <core> <field_type>", args[0]);
        exit(1);
    }

    let client = Client::new(args[1].clone(), args[2].clone())?;

    let status = client.ping()?;
    println!("Core {} status: {}", client.core(), status.status);

    // Show how each analysis stage rewrites a query
    for stage in client.analyze_field(&args[3], "Light Blue Shorts")? {
        println!("{:<32} {:?}", stage.name, stage.output.texts());
    }

    // Count catalog rows carrying both facet values
    let color = QueryExpr::any_of(vec![
        QueryExpr::phrase("color_t", "blue"),
        QueryExpr::phrase("color_t", "light blue"),
    ]);
    let query = QueryBuilder::new()
        .and_expr(color.unwrap_or_else(|| QueryExpr::phrase("color_t", "blue")))
        .and_expr(QueryExpr::phrase("category_t", "shorts"))
        .build();

    if let Some(query) = query {
        let rows = client.count_expr(&query)?;
        println!("{} -> {} rows", query, rows);
    }

    Ok(())
}
