//! Recency exclusion: a learner who positively engaged with a resource
//! inside the lookback window should not see it again until the window
//! elapses.

use std::collections::HashSet;

use crate::{MentorService, ServiceResult};

/// Consume diversified picks in order, skipping excluded resources, until
/// `top_n` survivors are collected or the picks run out. Skipping (rather
/// than truncating) preserves the ranking intent: the next-best novel pick
/// moves up to fill the slot.
pub(crate) fn filter_picks(
	picks: &[usize],
	resource_id_of: impl Fn(usize) -> i64,
	excluded: &HashSet<i64>,
	top_n: usize,
) -> Vec<usize> {
	let mut kept = Vec::with_capacity(top_n.min(picks.len()));

	for &pick in picks {
		if kept.len() >= top_n {
			break;
		}
		if excluded.contains(&resource_id_of(pick)) {
			continue;
		}

		kept.push(pick);
	}

	kept
}

impl MentorService {
	/// The single-resource recency contract, backed by the same lookback
	/// query the recommendation path batches.
	pub async fn is_excluded(&self, student_id: i64, resource_id: i64) -> ServiceResult<bool> {
		let excluded = self
			.store
			.has_recent_engagement(
				student_id,
				resource_id,
				self.cfg.recency.window_days as i32,
				&self.cfg.recency.positive_actions,
			)
			.await?;

		Ok(excluded)
	}

	pub(crate) async fn excluded_set(
		&self,
		student_id: i64,
		resource_ids: &[i64],
	) -> ServiceResult<HashSet<i64>> {
		let excluded = self
			.store
			.recently_engaged(
				student_id,
				resource_ids,
				self.cfg.recency.window_days as i32,
				&self.cfg.recency.positive_actions,
			)
			.await?;

		Ok(excluded.into_iter().collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn skips_excluded_picks_without_truncating() {
		let picks = vec![0, 1, 2, 3];
		let ids = [100_i64, 200, 300, 400];
		let excluded: HashSet<i64> = [200].into_iter().collect();
		let kept = filter_picks(&picks, |pick| ids[pick], &excluded, 2);

		// Pick 1 is excluded; pick 2 moves up instead of the list shrinking.
		assert_eq!(kept, vec![0, 2]);
	}

	#[test]
	fn stops_once_top_n_is_reached() {
		let picks = vec![0, 1, 2];
		let kept = filter_picks(&picks, |pick| pick as i64, &HashSet::new(), 2);

		assert_eq!(kept, vec![0, 1]);
	}

	#[test]
	fn exhausts_picks_when_everything_is_excluded() {
		let picks = vec![0, 1];
		let excluded: HashSet<i64> = [0, 1].into_iter().collect();
		let kept = filter_picks(&picks, |pick| pick as i64, &excluded, 5);

		assert!(kept.is_empty());
	}
}
