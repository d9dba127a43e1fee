//! Aggregate rating statistics

use std::collections::BTreeMap;

use shared::models::{Review, ReviewStats};

/// Fold received reviews into the profile-card aggregate.
///
/// The average is rounded to one decimal place. No reviews means an
/// average of 0, not NaN.
pub fn compute_review_stats(reviews: &[Review]) -> ReviewStats {
    if reviews.is_empty() {
        return ReviewStats::empty();
    }

    let total_reviews = reviews.len() as u64;
    let sum: u64 = reviews.iter().map(|r| u64::from(r.rating_overall)).sum();
    let average_rating = (sum as f64 / total_reviews as f64 * 10.0).round() / 10.0;

    let mut rating_breakdown: BTreeMap<u8, u64> = BTreeMap::new();
    for review in reviews {
        *rating_breakdown.entry(review.rating_overall).or_insert(0) += 1;
    }

    ReviewStats {
        average_rating,
        total_reviews,
        rating_breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_review(rating: u8) -> Review {
        Review {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: "order-1".to_string(),
            from_user_id: "trader-1".to_string(),
            to_user_id: "farmer-1".to_string(),
            rating_overall: rating,
            rating_quality: None,
            rating_timeliness: None,
            rating_packaging: None,
            review_text: None,
            images: vec![],
            is_anonymous: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_no_reviews_yields_zeroes() {
        let stats = compute_review_stats(&[]);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.total_reviews, 0);
        assert!(stats.rating_breakdown.is_empty());
    }

    #[test]
    fn test_average_rounds_to_one_decimal() {
        let reviews = vec![create_review(5), create_review(4), create_review(4)];
        let stats = compute_review_stats(&reviews);
        // 13 / 3 = 4.333...
        assert_eq!(stats.average_rating, 4.3);
        assert_eq!(stats.total_reviews, 3);
    }

    #[test]
    fn test_breakdown_counts_each_star_level() {
        let reviews = vec![
            create_review(5),
            create_review(5),
            create_review(3),
            create_review(1),
        ];
        let stats = compute_review_stats(&reviews);
        assert_eq!(stats.rating_breakdown.get(&5), Some(&2));
        assert_eq!(stats.rating_breakdown.get(&3), Some(&1));
        assert_eq!(stats.rating_breakdown.get(&1), Some(&1));
        assert_eq!(stats.rating_breakdown.get(&4), None);
        assert_eq!(stats.average_rating, 3.5);
    }
}
