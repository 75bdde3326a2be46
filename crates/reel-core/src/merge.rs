//! Merge policy: decide and apply what an incoming record changes.
//!
//! [`reconcile`] is pure and returns a [`Plan`]; [`apply`] executes it
//! against a store. [`reconcile_record`] runs match → plan → apply for one
//! record.
//!
//! Only the release date is ever updated after creation. Titles are stable
//! identity (the lookup already matched on them), and an absent incoming
//! date never clears a stored one.

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::matcher::{find_match, same_movie};
use crate::models::{MovieWithSources, NewMovie, SourceRecord, SourceRef};
use crate::store::Store;

/// One step of a reconciliation plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Insert a new movie, then its source.
    Create {
        title: String,
        release_date: Option<NaiveDate>,
        source: SourceRef,
    },
    UpdateReleaseDate {
        movie_id: i64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    /// Get-or-create a source keyed on (site, url, movie id).
    AttachSource { movie_id: i64, source: SourceRef },
    NoOp { movie_id: i64 },
}

/// Ordered, non-empty list of actions for one incoming record.
pub type Plan = Vec<Action>;

/// Compute the actions needed to fold `incoming` into `stored`.
pub fn reconcile(stored: Option<&MovieWithSources>, incoming: &SourceRecord) -> Plan {
    let stored = match stored {
        Some(s) => s,
        None => {
            return vec![Action::Create {
                title: incoming.title.clone(),
                release_date: incoming.release_date,
                source: incoming.source.clone(),
            }]
        }
    };

    let movie_id = stored.movie.id;
    let mut plan = Plan::new();

    if !same_movie(&stored.movie, incoming)
        && incoming.release_date.is_some()
        && stored.movie.release_date != incoming.release_date
    {
        plan.push(Action::UpdateReleaseDate {
            movie_id,
            from: stored.movie.release_date,
            to: incoming.release_date,
        });
    }

    if !stored.has_url(&incoming.source.url) {
        plan.push(Action::AttachSource {
            movie_id,
            source: incoming.source.clone(),
        });
    }

    if plan.is_empty() {
        plan.push(Action::NoOp { movie_id });
    }
    plan
}

/// What applying a plan changed in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub movie_id: i64,
    pub movie_created: bool,
    pub release_date_updated: bool,
    pub source_created: bool,
}

impl ReconcileOutcome {
    pub fn is_noop(&self) -> bool {
        !self.movie_created && !self.release_date_updated && !self.source_created
    }
}

/// Execute `plan` against `store`.
pub async fn apply(store: &dyn Store, plan: &[Action]) -> Result<ReconcileOutcome> {
    let mut outcome = ReconcileOutcome::default();

    for action in plan {
        match action {
            Action::Create {
                title,
                release_date,
                source,
            } => {
                let movie = store
                    .insert_movie(&NewMovie {
                        title: title.clone(),
                        release_date: *release_date,
                    })
                    .await?;
                let (_, created) = store.get_or_create_source(&source.for_movie(movie.id)).await?;
                debug!(movie_id = movie.id, title = %movie.title, "created movie");
                outcome.movie_id = movie.id;
                outcome.movie_created = true;
                outcome.source_created = created;
            }
            Action::UpdateReleaseDate { movie_id, from, to } => {
                store.update_release_date(*movie_id, *to).await?;
                debug!(movie_id, ?from, ?to, "updated release date");
                outcome.movie_id = *movie_id;
                outcome.release_date_updated = true;
            }
            Action::AttachSource { movie_id, source } => {
                let (row, created) = store.get_or_create_source(&source.for_movie(*movie_id)).await?;
                if created {
                    debug!(movie_id, site = %row.site, url = %row.url, "attached source");
                }
                outcome.movie_id = *movie_id;
                outcome.source_created |= created;
            }
            Action::NoOp { movie_id } => {
                outcome.movie_id = *movie_id;
            }
        }
    }

    Ok(outcome)
}

/// Match, plan, and apply a single incoming record.
pub async fn reconcile_record(store: &dyn Store, record: &SourceRecord) -> Result<ReconcileOutcome> {
    let stored = find_match(store, &record.title).await?;
    let plan = reconcile(stored.as_ref(), record);
    apply(store, &plan).await
}
