//! Keeps `Bootcamp.average_rating` in line with the bootcamp's reviews.
//!
//! Review create, update and delete call [`recompute`] after their own write
//! succeeds. The read-aggregate-write is not serialized per bootcamp: two
//! concurrent review writes can both read the old set, and the later
//! `set_average_rating` wins. Any later review write repairs the value.

use tracing::{debug, error};
use uuid::Uuid;

use crate::bootcamps::repo::BootcampStore;
use crate::reviews::repo::ReviewStore;

/// Unrounded arithmetic mean; `0.0` for no ratings.
pub fn average_rating(ratings: &[i32]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: f64 = ratings.iter().copied().map(f64::from).sum();
    sum / ratings.len() as f64
}

/// Full recomputation from the current review set.
///
/// Failures are logged and swallowed so the triggering review write still
/// succeeds. Returns the persisted average, or `None` if nothing was written.
pub async fn recompute(
    reviews: &dyn ReviewStore,
    bootcamps: &dyn BootcampStore,
    bootcamp_id: Uuid,
) -> Option<f64> {
    let ratings = match reviews.ratings_for_bootcamp(bootcamp_id).await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, %bootcamp_id, "load ratings failed; average left stale");
            return None;
        }
    };

    let average = average_rating(&ratings);
    match bootcamps.set_average_rating(bootcamp_id, average).await {
        Ok(()) => {
            debug!(%bootcamp_id, average, count = ratings.len(), "average rating updated");
            Some(average)
        }
        Err(e) => {
            error!(error = %e, %bootcamp_id, "persist average rating failed");
            None
        }
    }
}
