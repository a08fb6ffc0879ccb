use crate::domain::{CanonicalMovie, ReleaseDate};
use chrono::{NaiveDateTime, NaiveTime};

/// Orders movies for display.
///
/// Movies released strictly before `now` come first, then those releasing
/// later; both groups latest-first. Movies with an unknown release date are
/// kept out of the comparison and appended last. Every step is a stable
/// sort, so equal dates keep their input order.
pub fn sort_by_release(movies: Vec<CanonicalMovie>, now: NaiveDateTime) -> Vec<CanonicalMovie> {
    let mut past = Vec::new();
    let mut future = Vec::new();
    let mut unknown = Vec::new();

    for movie in movies {
        match movie.release_date {
            ReleaseDate::Known(date) if date.and_time(NaiveTime::MIN) < now => past.push(movie),
            ReleaseDate::Known(_) => future.push(movie),
            ReleaseDate::Unknown => unknown.push(movie),
        }
    }

    past.sort_by(|a, b| b.release_date.known().cmp(&a.release_date.known()));
    future.sort_by(|a, b| b.release_date.known().cmp(&a.release_date.known()));

    past.into_iter().chain(future).chain(unknown).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn movie(feed_id: u64, date: Option<(i32, u32, u32)>) -> CanonicalMovie {
        let release = date
            .and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
            .into();
        CanonicalMovie::new(
            feed_id,
            format!("Movie {}", feed_id),
            format!("movie-{}", feed_id),
            None,
            String::new(),
            release,
        )
    }

    fn now(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn ids(movies: &[CanonicalMovie]) -> Vec<u64> {
        movies.iter().map(|m| m.feed_id).collect()
    }

    #[test]
    fn test_past_then_future() {
        let sorted = sort_by_release(
            vec![movie(2, Some((2099, 1, 1))), movie(1, Some((2020, 1, 1)))],
            now(2025, 1, 1),
        );
        assert_eq!(ids(&sorted), vec![1, 2]);
    }

    #[test]
    fn test_each_partition_descending() {
        let sorted = sort_by_release(
            vec![
                movie(1, Some((2024, 3, 1))),
                movie(2, Some((2026, 1, 1))),
                movie(3, Some((2024, 12, 1))),
                movie(4, Some((2027, 6, 1))),
            ],
            now(2025, 1, 1),
        );
        assert_eq!(ids(&sorted), vec![3, 1, 4, 2]);
    }

    #[test]
    fn test_release_today_counts_as_past() {
        let sorted = sort_by_release(
            vec![movie(1, Some((2025, 1, 2))), movie(2, Some((2025, 1, 1)))],
            now(2025, 1, 1),
        );
        assert_eq!(ids(&sorted), vec![2, 1]);
    }

    #[test]
    fn test_ties_keep_input_order_and_sort_is_idempotent() {
        let input = vec![
            movie(5, Some((2024, 5, 5))),
            movie(3, Some((2024, 5, 5))),
            movie(9, Some((2024, 5, 5))),
            movie(1, Some((2030, 1, 1))),
        ];
        let once = sort_by_release(input, now(2025, 1, 1));
        assert_eq!(ids(&once), vec![5, 3, 9, 1]);

        let twice = sort_by_release(once.clone(), now(2025, 1, 1));
        assert_eq!(ids(&twice), ids(&once));
    }

    #[test]
    fn test_unknown_dates_pinned_last_in_input_order() {
        let sorted = sort_by_release(
            vec![
                movie(1, None),
                movie(2, Some((2099, 1, 1))),
                movie(3, None),
                movie(4, Some((2000, 1, 1))),
            ],
            now(2025, 1, 1),
        );
        assert_eq!(ids(&sorted), vec![4, 2, 1, 3]);
    }
}
