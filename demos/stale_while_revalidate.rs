//! Example showing cached reads for a single document and for a batch.
//!
//! The first run renders nothing from cache and stores the fetched documents;
//! the second run renders the cached copies immediately and reports which
//! documents changed upstream.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use swr_json_cache::{CacheLookup, CachedFetch, HashMapStore, JsonCache, JsonCacheConfig};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Article {
    id: u32,
    title: String,
    views: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Author {
    name: String,
    articles: u32,
}

/// Simulated network call.
async fn fetch_article(id: u32, views: u64) -> Result<Article, std::io::Error> {
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(Article {
        id,
        title: format!("Article {}", id),
        views,
    })
}

async fn fetch_author(name: &str) -> Result<Author, std::io::Error> {
    tokio::time::sleep(Duration::from_millis(30)).await;
    Ok(Author {
        name: name.to_string(),
        articles: 3,
    })
}

fn render(label: &str, lookup: &CacheLookup) {
    match lookup.document() {
        Some(document) => {
            let document = serde_json::Value::Object(document.clone());
            println!("[{}] cached: {}", label, document);
        }
        None => println!("[{}] nothing cached ({:?})", label, lookup),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store = Arc::new(HashMapStore::default());
    let cache = JsonCache::with_config(store, JsonCacheConfig::new().with_cache_id("articles-v1"));

    for (round, views) in [(1, 10), (2, 10), (3, 42)] {
        println!("--- round {} ---", round);

        // Single document
        let outcome = cache
            .fetch("article:1", fetch_article(1, views))
            .cached(|lookup| async move { render("article:1", &lookup) })
            .await?;

        match outcome.document() {
            Some(document) => {
                println!("[article:1] fresh copy stored: {:?}", document.get("views"));
            }
            None => println!("[article:1] unchanged"),
        }

        // Batch: all cached copies are rendered together, sources may differ
        let labels = ["article:2", "author:ada"];
        let batch = CachedFetch::all(vec![
            cache.fetch(labels[0], fetch_article(2, views)).boxed(),
            cache.fetch(labels[1], fetch_author("ada")).boxed(),
        ])?;

        let outcomes = batch
            .cached(|lookups| async move {
                for (label, lookup) in labels.iter().zip(&lookups) {
                    render(label, lookup);
                }
            })
            .await;

        for (label, outcome) in labels.iter().zip(outcomes) {
            if outcome?.is_changed() {
                println!("[{}] updated", label);
            } else {
                println!("[{}] unchanged", label);
            }
        }
    }

    Ok(())
}
