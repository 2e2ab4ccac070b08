// Listing detail payload and its rating summary

use serde::{Deserialize, Serialize};

use crate::media::{first_image_url, ImageSource};

/// Flat review entry embedded in a listing detail response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostReviewEntry {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub rating: i64,
}

/// Listing as returned by `GET /posts/{postId}`
///
/// Only the fields the review thread needs; everything else is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub images: Vec<ImageSource>,
    #[serde(default)]
    pub reviews: Vec<PostReviewEntry>,
}

impl PostDetail {
    /// Cover picture URL, if any image resolves
    pub fn cover_image_url(&self, asset_base_url: &str) -> Option<String> {
        first_image_url(&self.images, asset_base_url)
    }

    pub fn rating_summary(&self) -> RatingSummary {
        RatingSummary::from_ratings(self.reviews.iter().map(|r| r.rating))
    }
}

/// Some endpoints wrap the post in `{ "data": ... }`, some do not
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PostPayload {
    Wrapped { data: PostDetail },
    Bare(PostDetail),
}

impl PostPayload {
    pub fn into_detail(self) -> PostDetail {
        match self {
            PostPayload::Wrapped { data } => data,
            PostPayload::Bare(detail) => detail,
        }
    }
}

/// Average rating and review count of a listing
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    pub count: usize,
    /// Mean rating rounded to one decimal, `None` without reviews
    pub average: Option<f64>,
}

impl RatingSummary {
    /// Compute the summary from a set of ratings
    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        // Ratings come back unchecked from the server; sum in f64
        let (sum, count) = ratings
            .into_iter()
            .fold((0f64, 0usize), |(sum, count), r| (sum + r as f64, count + 1));

        let average = if count == 0 {
            None
        } else {
            let avg = sum / count as f64;
            Some((avg * 10.0).round() / 10.0)
        };

        Self { count, average }
    }
}
