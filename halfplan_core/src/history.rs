//! Paged activity history, newest first.

use crate::store::ActivityStore;
use crate::types::Activity;
use crate::Result;
use serde::Serialize;

pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// One page of activities plus the total across all pages
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ActivityPage {
    pub activities: Vec<Activity>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Activities sorted by start time (newest first), ties broken by id
pub fn newest_first<A: ActivityStore>(store: &A) -> Result<Vec<Activity>> {
    let mut activities = store.list()?;
    activities.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    Ok(activities)
}

/// Load one page of activity history
pub fn page<A: ActivityStore>(store: &A, limit: usize, offset: usize) -> Result<ActivityPage> {
    let all = newest_first(store)?;
    let total = all.len();
    let activities = all.into_iter().skip(offset).take(limit).collect();

    Ok(ActivityPage {
        activities,
        total,
        limit,
        offset,
    })
}

/// Up to `count` activities that started before `activity`, newest first
pub fn earlier_activities<A: ActivityStore>(
    store: &A,
    activity: &Activity,
    count: usize,
) -> Result<Vec<Activity>> {
    Ok(newest_first(store)?
        .into_iter()
        .filter(|a| a.id != activity.id && a.date < activity.date)
        .take(count)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewActivity;
    use chrono::{DateTime, Duration};

    fn store_with(n: i64) -> Vec<Activity> {
        let base = DateTime::parse_from_rfc3339("2026-03-01T07:30:00+01:00").unwrap();
        let mut store = Vec::new();
        for i in 0..n {
            store
                .create(NewActivity {
                    external_id: format!("ext-{}", i),
                    kind: "Run".into(),
                    name: format!("Run {}", i),
                    distance: 5000.0,
                    duration: 1800,
                    avg_heart_rate: None,
                    max_heart_rate: None,
                    avg_pace: Some(6.0),
                    calories: None,
                    // inserted out of date order
                    date: base + Duration::days((i * 3) % n),
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn test_page_newest_first() {
        let store = store_with(5);
        let page = page(&store, DEFAULT_PAGE_LIMIT, 0).unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.activities.len(), 5);
        assert!(page
            .activities
            .windows(2)
            .all(|w| w[0].date >= w[1].date));
    }

    #[test]
    fn test_page_limit_and_offset() {
        let store = store_with(7);
        let all = newest_first(&store).unwrap();

        let second = page(&store, 3, 3).unwrap();
        assert_eq!(second.total, 7);
        assert_eq!(second.activities, all[3..6].to_vec());

        let past_end = page(&store, 3, 10).unwrap();
        assert!(past_end.activities.is_empty());
        assert_eq!(past_end.total, 7);
    }

    #[test]
    fn test_earlier_activities() {
        let store = store_with(4);
        let all = newest_first(&store).unwrap();
        let latest = &all[0];

        let earlier = earlier_activities(&store, latest, 5).unwrap();
        assert_eq!(earlier.len(), 3);
        assert!(earlier.iter().all(|a| a.date < latest.date));

        let oldest = &all[3];
        assert!(earlier_activities(&store, oldest, 5).unwrap().is_empty());
    }
}
