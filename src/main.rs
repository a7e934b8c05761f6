use anyhow::Result;
use isoscraper::{extract, fetch, overrides::OverrideTable, records::Alpha2, store::RecordStore};
use reqwest::Client;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) pick countries + overrides ───────────────────────────────
    let args: Vec<String> = std::env::args().skip(1).collect();
    let countries: Vec<Alpha2> = if args.is_empty() {
        fetch::COUNTRY_CODES
            .iter()
            .map(|c| c.parse().expect("static code list is valid"))
            .collect()
    } else {
        args.iter().map(|c| c.parse()).collect::<Result<_, _>>()?
    };
    info!("{} countries to extract", countries.len());

    let overrides = match std::env::var("ISOSCRAPER_OVERRIDES") {
        Ok(path) => OverrideTable::load(path)?,
        Err(_) => OverrideTable::builtin().clone(),
    };

    let out_path = PathBuf::from("out/records.json");
    std::fs::create_dir_all("out")?;

    // ─── 3) spawn fetch tasks, bounded concurrency ───────────────────
    let client = Client::new();
    let (tx, mut rx) = mpsc::channel::<fetch::CountryPages>(100);
    let sem = Arc::new(Semaphore::new(3));
    let mut handles = Vec::with_capacity(countries.len());

    for alpha2 in countries {
        let client = client.clone();
        let tx = tx.clone();
        let sem = sem.clone();
        handles.push(tokio::spawn(async move {
            let _permit = sem.acquire().await.expect("semaphore open");
            match fetch::fetch_country(&client, alpha2.clone()).await {
                Ok(pages) => {
                    info!(country = %alpha2, "fetched");
                    let _ = tx.send(pages).await;
                }
                Err(err) => {
                    error!(country = %alpha2, error = %err, "fetch failed");
                }
            }
        }));
    }
    // drop the original sender so `rx.recv()` ends once all fetches complete
    drop(tx);

    let mut pages = Vec::new();
    while let Some(p) = rx.recv().await {
        pages.push(p);
    }
    for h in handles {
        let _ = h.await;
    }
    info!("{} countries fetched", pages.len());

    // ─── 4) extract on the blocking pool (rayon inside) ──────────────
    let extracted = tokio::task::spawn_blocking(move || extract::extract_all(&pages)).await?;

    // ─── 5) build store, apply overrides, persist ────────────────────
    let mut store = RecordStore::new();
    for (alpha2, records) in extracted {
        store.insert_country(alpha2, records);
    }
    store.apply_overrides(&overrides);
    store.save(&out_path)?;

    info!("all done");
    Ok(())
}
