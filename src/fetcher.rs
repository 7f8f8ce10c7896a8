use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::cutoff::CutoffWindow;
use crate::db::{Article, Database};
use crate::provider::{FeedEntry, FeedProvider, GOOGLE_NEWS};
use crate::timestamp;

/// What a fetch run did for one entity.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityOutcome {
    /// The feed was read. `articles` passed the cutoff; `inserted` of them
    /// had links the store had not seen before.
    Fetched {
        entity: String,
        articles: Vec<Article>,
        inserted: usize,
    },
    /// The feed could not be read and the entity contributed nothing.
    Skipped { entity: String, reason: String },
}

impl EntityOutcome {
    pub fn entity(&self) -> &str {
        match self {
            EntityOutcome::Fetched { entity, .. } | EntityOutcome::Skipped { entity, .. } => entity,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, EntityOutcome::Skipped { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchReport {
    pub outcomes: Vec<EntityOutcome>,
}

impl FetchReport {
    /// Every article that passed the cutoff this run, duplicates included.
    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.outcomes.iter().flat_map(|outcome| match outcome {
            EntityOutcome::Fetched { articles, .. } => articles.as_slice(),
            EntityOutcome::Skipped { .. } => &[][..],
        })
    }

    pub fn into_articles(self) -> Vec<Article> {
        self.outcomes
            .into_iter()
            .flat_map(|outcome| match outcome {
                EntityOutcome::Fetched { articles, .. } => articles,
                EntityOutcome::Skipped { .. } => Vec::new(),
            })
            .collect()
    }

    /// Articles that were new to the store.
    pub fn inserted(&self) -> usize {
        self.outcomes
            .iter()
            .map(|outcome| match outcome {
                EntityOutcome::Fetched { inserted, .. } => *inserted,
                EntityOutcome::Skipped { .. } => 0,
            })
            .sum()
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_skipped())
            .map(|outcome| outcome.entity())
            .collect()
    }
}

pub struct Fetcher {
    db: Arc<Database>,
    provider: Arc<dyn FeedProvider>,
    window: CutoffWindow,
}

impl Fetcher {
    pub fn new(db: Arc<Database>, provider: Arc<dyn FeedProvider>, window: CutoffWindow) -> Self {
        Self {
            db,
            provider,
            window,
        }
    }

    pub fn window(&self) -> &CutoffWindow {
        &self.window
    }

    /// Fetch and store news for each entity, evaluated against the current
    /// instant. Returns the articles considered this run.
    pub async fn fetch(
        &self,
        entity_names: &[String],
        per_entity_cap: usize,
    ) -> anyhow::Result<Vec<Article>> {
        let report = self.fetch_at(entity_names, per_entity_cap, Utc::now()).await?;
        Ok(report.into_articles())
    }

    /// Entities are processed one after another. Provider failures skip the
    /// entity; store failures abort the run.
    pub async fn fetch_at(
        &self,
        entity_names: &[String],
        per_entity_cap: usize,
        now: DateTime<Utc>,
    ) -> anyhow::Result<FetchReport> {
        let window_start = self.window.start(now);
        info!(
            "Fetching news for {} entities (window starts {})",
            entity_names.len(),
            window_start
        );

        let mut report = FetchReport::default();
        for entity in entity_names {
            let outcome = self
                .fetch_entity(entity, per_entity_cap, now, window_start)
                .await?;
            report.outcomes.push(outcome);
        }

        info!(
            "Fetch complete: {} articles considered, {} new, {} entities skipped",
            report.articles().count(),
            report.inserted(),
            report.skipped().len()
        );
        Ok(report)
    }

    async fn fetch_entity(
        &self,
        entity: &str,
        per_entity_cap: usize,
        now: DateTime<Utc>,
        window_start: DateTime<Utc>,
    ) -> anyhow::Result<EntityOutcome> {
        let entries = match self.provider.search(entity).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Skipping '{}': {}", entity, e);
                return Ok(EntityOutcome::Skipped {
                    entity: entity.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let mut articles = Vec::new();
        let mut inserted = 0;
        for entry in entries.into_iter().take(per_entity_cap) {
            let published_at = timestamp::normalize(&entry, now);
            if !CutoffWindow::admits(published_at, window_start) {
                debug!(
                    "Dropping entry for '{}' published {} (before cutoff)",
                    entity, published_at
                );
                continue;
            }

            let article = Self::build_article(entity, entry, published_at);
            if self.db.save(&article).await? {
                inserted += 1;
            }
            articles.push(article);
        }

        info!(
            "Considered {} articles for '{}' ({} new)",
            articles.len(),
            entity,
            inserted
        );
        Ok(EntityOutcome::Fetched {
            entity: entity.to_string(),
            articles,
            inserted,
        })
    }

    pub fn build_article(entity: &str, entry: FeedEntry, published_at: DateTime<Utc>) -> Article {
        Article {
            entity_name: entity.to_string(),
            title: entry.title.as_deref().unwrap_or("").trim().to_string(),
            link: entry.link.as_deref().unwrap_or("").trim().to_string(),
            published_at,
            source: GOOGLE_NEWS.to_string(),
        }
    }
}
