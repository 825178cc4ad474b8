//! Concurrent per-item metadata fetches
//!
//! Providers first fetch a flat list, then run one independent request per
//! item to recover release times and stability. [`fan_out`] runs those
//! requests as a bounded stream and joins once; [`apply_version_meta`] and
//! [`sort_by_release_time`] fold the results back into the list.

use std::future::Future;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream;

use crate::models::Version;

/// Metadata recovered for one version; `None` fields leave the version untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionMeta {
    pub release_time: Option<DateTime<Utc>>,
    pub stable: Option<bool>,
}

/// Run `fetch` for every item with at most `width` in flight.
///
/// Results come back in input order: each task carries its index and is
/// written to its own slot at the single join point, so the output length
/// always equals the input length.
pub async fn fan_out<T, R, F, Fut>(items: Vec<T>, width: usize, fetch: F) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    let len = items.len();
    let fetch = &fetch;

    let completed: Vec<(usize, R)> = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| async move { (index, fetch(item).await) })
        .buffer_unordered(width.max(1))
        .collect()
        .await;

    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(len).collect();
    for (index, result) in completed {
        slots[index] = Some(result);
    }
    slots.into_iter().flatten().collect()
}

/// Merge per-version results; a `None` entry keeps the version as it was
pub fn apply_version_meta(versions: &mut [Version], metas: Vec<Option<VersionMeta>>) {
    for (version, meta) in versions.iter_mut().zip(metas) {
        let Some(meta) = meta else {
            continue;
        };
        if let Some(time) = meta.release_time {
            version.release_time = Some(time);
        }
        if let Some(stable) = meta.stable {
            version.stable = stable;
        }
    }
}

/// Order versions newest first by release time.
///
/// Only versions with a release time move: they are sorted among themselves
/// and placed back into the positions timed versions occupied, so untimed
/// versions keep their position. Ties keep their relative order.
pub fn sort_by_release_time(versions: &mut [Version]) {
    let positions: Vec<usize> = versions
        .iter()
        .enumerate()
        .filter(|(_, v)| v.release_time.is_some())
        .map(|(i, _)| i)
        .collect();

    let mut timed: Vec<Version> = positions.iter().map(|&i| versions[i].clone()).collect();
    timed.sort_by(|a, b| b.release_time.cmp(&a.release_time));

    for (position, version) in positions.into_iter().zip(timed) {
        versions[position] = version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VersionType;
    use chrono::TimeZone;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, 12, 0, 0).unwrap()
    }

    fn version(id: &str, day: Option<u32>) -> Version {
        let mut version = Version::new(id, VersionType::Release);
        version.release_time = day.map(at);
        version
    }

    fn ids(versions: &[Version]) -> Vec<&str> {
        versions.iter().map(|v| v.id.as_str()).collect()
    }

    #[tokio::test]
    async fn fan_out_preserves_input_order() {
        // Later items finish first
        let results = fan_out(vec![30u64, 20, 10, 0], 4, |delay| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            delay
        })
        .await;

        assert_eq!(results, vec![30, 20, 10, 0]);
    }

    #[tokio::test]
    async fn fan_out_respects_width() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = fan_out((0..12).collect(), 3, |i: u32| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                i
            }
        })
        .await;

        assert_eq!(results.len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn fan_out_of_nothing_is_empty() {
        let results: Vec<u32> = fan_out(Vec::<u32>::new(), 16, |i| async move { i }).await;
        assert!(results.is_empty());
    }

    #[test]
    fn apply_version_meta_skips_failed_entries() {
        let mut versions = vec![
            Version::new("1.21.4", VersionType::Release),
            Version::new("1.21.5-pre1", VersionType::Snapshot),
        ];

        apply_version_meta(
            &mut versions,
            vec![
                None,
                Some(VersionMeta {
                    release_time: Some(at(3)),
                    stable: Some(true),
                }),
            ],
        );

        assert_eq!(versions[0].release_time, None);
        assert!(versions[0].stable);
        assert_eq!(versions[1].release_time, Some(at(3)));
        assert!(versions[1].stable);
    }

    #[test]
    fn sort_by_release_time_orders_timed_versions_newest_first() {
        let mut versions = vec![
            version("a", Some(1)),
            version("b", Some(5)),
            version("c", Some(3)),
        ];

        sort_by_release_time(&mut versions);

        assert_eq!(ids(&versions), vec!["b", "c", "a"]);
    }

    #[test]
    fn sort_by_release_time_keeps_untimed_positions() {
        let mut versions = vec![
            version("a", Some(1)),
            version("untimed-1", None),
            version("b", Some(5)),
            version("untimed-2", None),
            version("c", Some(3)),
        ];

        sort_by_release_time(&mut versions);

        assert_eq!(
            ids(&versions),
            vec!["b", "untimed-1", "c", "untimed-2", "a"]
        );
    }

    #[test]
    fn sort_by_release_time_is_stable_for_ties() {
        let mut versions = vec![version("first", Some(2)), version("second", Some(2))];

        sort_by_release_time(&mut versions);

        assert_eq!(ids(&versions), vec!["first", "second"]);
    }
}
