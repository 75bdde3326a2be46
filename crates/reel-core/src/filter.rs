//! Review save-filter.
//!
//! A candidate is save-worthy when it has a resolved source and at least one
//! score or count. Pages that failed to render a score board produce empty
//! candidates, which are dropped; partial data is kept. A candidate with data
//! but no source is an error, not a skip.

use anyhow::Result;

use crate::error::ReconcileError;
use crate::models::{NewReview, Review, ReviewCandidate};
use crate::store::Store;

pub fn should_save(candidate: &ReviewCandidate) -> bool {
    candidate.source_id.is_some() && has_ratings(candidate)
}

/// True when at least one score or count is present.
pub fn has_ratings(candidate: &ReviewCandidate) -> bool {
    candidate.audience_score.is_some()
        || candidate.audience_count.is_some()
        || candidate.critic_score.is_some()
        || candidate.critic_count.is_some()
}

/// Result of [`save_review`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Skipped,
    Created(Review),
    /// An identical review was already stored.
    Existing(Review),
}

/// Persist `candidate` if it is save-worthy, idempotently.
///
/// Empty candidates are skipped. Candidates carrying ratings without a
/// source fail with [`ReconcileError::MissingSourceId`].
pub async fn save_review(store: &dyn Store, candidate: &ReviewCandidate) -> Result<SaveOutcome> {
    if !has_ratings(candidate) {
        return Ok(SaveOutcome::Skipped);
    }
    let review = NewReview::try_from(candidate)?;
    let (row, created) = store.get_or_create_review(&review).await?;
    Ok(if created {
        SaveOutcome::Created(row)
    } else {
        SaveOutcome::Existing(row)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewMovie, NewSource, Site};
    use crate::store::memory::InMemoryStore;

    #[test]
    fn missing_source_id_is_never_saved() {
        let c = ReviewCandidate {
            source_id: None,
            audience_score: Some(90),
            audience_count: Some("1,000".into()),
            critic_score: Some(88),
            critic_count: Some("120".into()),
            ..Default::default()
        };
        assert!(!should_save(&c));
    }

    #[test]
    fn all_fields_empty_is_not_saved() {
        let c = ReviewCandidate {
            source_id: Some(7),
            ..Default::default()
        };
        assert!(!should_save(&c));
    }

    #[test]
    fn any_single_field_is_enough() {
        let base = ReviewCandidate {
            source_id: Some(7),
            ..Default::default()
        };
        let variants = [
            ReviewCandidate {
                audience_score: Some(1),
                ..base.clone()
            },
            ReviewCandidate {
                audience_count: Some("5".into()),
                ..base.clone()
            },
            ReviewCandidate {
                critic_score: Some(0),
                ..base.clone()
            },
            ReviewCandidate {
                critic_count: Some(String::new()),
                ..base.clone()
            },
        ];
        for c in &variants {
            assert!(should_save(c), "{:?}", c);
        }
    }

    #[tokio::test]
    async fn save_review_is_idempotent() {
        let store = InMemoryStore::new();
        let movie = store
            .insert_movie(&NewMovie {
                title: "Dune".into(),
                release_date: None,
            })
            .await
            .unwrap();
        let (source, _) = store
            .get_or_create_source(&NewSource {
                movie_id: movie.id,
                site: Site::RottenTomatoes,
                url: "http://x/dune".into(),
            })
            .await
            .unwrap();

        let empty = ReviewCandidate {
            source_id: Some(source.id),
            ..Default::default()
        };
        assert_eq!(
            save_review(&store, &empty).await.unwrap(),
            SaveOutcome::Skipped
        );

        let scored = ReviewCandidate {
            critic_score: Some(88),
            ..empty
        };
        assert!(matches!(
            save_review(&store, &scored).await.unwrap(),
            SaveOutcome::Created(_)
        ));
        assert!(matches!(
            save_review(&store, &scored).await.unwrap(),
            SaveOutcome::Existing(_)
        ));
        assert_eq!(store.counts().await.unwrap().reviews, 1);
    }

    #[tokio::test]
    async fn ratings_without_source_are_an_error() {
        let store = InMemoryStore::new();
        let orphan = ReviewCandidate {
            movie_id: Some(3),
            critic_score: Some(88),
            ..Default::default()
        };
        let err = save_review(&store, &orphan).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReconcileError>(),
            Some(ReconcileError::MissingSourceId { movie_id: Some(3) })
        ));
        assert_eq!(store.counts().await.unwrap().reviews, 0);

        let empty = ReviewCandidate::default();
        assert_eq!(
            save_review(&store, &empty).await.unwrap(),
            SaveOutcome::Skipped
        );
    }
}
