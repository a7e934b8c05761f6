// src/bin/query.rs
//
// Run one filter over a saved snapshot:
//   query <snapshot.json> year <expr>
//   query <snapshot.json> range <date>[,<date>]
//   query <snapshot.json> search <terms> [likeness]

use anyhow::{bail, Context, Result};
use isoscraper::{query, store::RecordStore};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [snapshot, mode, rest @ ..] = args.as_slice() else {
        bail!("usage: query <snapshot.json> <year|range|search> <arg> [likeness]");
    };

    let store = RecordStore::load(snapshot)?;

    match (mode.as_str(), rest) {
        ("year", [expr]) => {
            let out = query::by_year(&store, expr)?;
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        ("range", [dates]) => {
            let out = query::by_date_range(&store, dates)?;
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        ("search", [terms, likeness @ ..]) => {
            let likeness = match likeness {
                [] => 100,
                [l] => l.parse().context("likeness must be 1-100")?,
                _ => bail!("too many arguments"),
            };
            let hits = query::search(&store, terms, likeness);
            for hit in hits {
                println!(
                    "{} [{}] {}",
                    hit.alpha2,
                    hit.score,
                    serde_json::to_string(&hit.record)?
                );
            }
        }
        _ => bail!("usage: query <snapshot.json> <year|range|search> <arg> [likeness]"),
    }

    Ok(())
}
