use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::error::ReviewError;
use crate::listings::{PostDetail, PostPayload};
use crate::reviews::{DataEnvelope, ParentType, ReplyInput, ReviewForest, ReviewInput};

/// Backend collaborator of the review thread store
///
/// One method per REST endpoint. `token` is the bearer token to send; the
/// store decides whether an action may proceed without one.
#[async_trait::async_trait]
pub trait ReviewApi: Send + Sync + 'static {
    /// GET /posts/{postId}/review-tree
    async fn fetch_tree(&self, post_id: i64) -> Result<ReviewForest, ReviewError>;

    /// GET /posts/{postId}
    async fn fetch_post(&self, post_id: i64) -> Result<PostDetail, ReviewError>;

    /// POST /posts/{postId}/reviews
    async fn create_review(
        &self,
        token: &str,
        post_id: i64,
        input: &ReviewInput,
    ) -> Result<(), ReviewError>;

    /// PUT /reviews/{reviewId}
    async fn update_review(
        &self,
        token: &str,
        review_id: i64,
        input: &ReviewInput,
    ) -> Result<(), ReviewError>;

    /// DELETE /reviews/{reviewId}
    async fn delete_review(&self, token: &str, review_id: i64) -> Result<(), ReviewError>;

    /// POST /reviews/{reviewId}/replies or POST /replies/{replyId}/child
    async fn create_reply(
        &self,
        token: &str,
        parent_type: ParentType,
        parent_id: i64,
        input: &ReplyInput,
    ) -> Result<(), ReviewError>;
}

/// Path of the reply-creation endpoint for a parent
pub fn reply_path(parent_type: ParentType, parent_id: i64) -> String {
    match parent_type {
        ParentType::Review => format!("/reviews/{}/replies", parent_id),
        ParentType::Reply => format!("/replies/{}/child", parent_id),
    }
}

/// `ReviewApi` over HTTP/JSON
#[derive(Clone)]
pub struct HttpReviewApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpReviewApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, mapping non-2xx responses to `ReviewError`
    async fn send(builder: RequestBuilder) -> Result<reqwest::Response, ReviewError> {
        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ReviewError::from_response(status.as_u16(), &body));
        }
        Ok(resp)
    }

    /// Decode a successful response body
    async fn parse<R: DeserializeOwned>(resp: reqwest::Response) -> Result<R, ReviewError> {
        resp.json::<R>()
            .await
            .map_err(|e| ReviewError::Transport(format!("response body: {}", e)))
    }
}

#[async_trait::async_trait]
impl ReviewApi for HttpReviewApi {
    async fn fetch_tree(&self, post_id: i64) -> Result<ReviewForest, ReviewError> {
        let url = self.url(&format!("/posts/{}/review-tree", post_id));
        tracing::debug!("GET {}", url);

        let resp = Self::send(self.http.get(&url)).await?;
        let envelope: DataEnvelope<ReviewForest> = Self::parse(resp).await?;
        Ok(envelope.data)
    }

    async fn fetch_post(&self, post_id: i64) -> Result<PostDetail, ReviewError> {
        let url = self.url(&format!("/posts/{}", post_id));
        tracing::debug!("GET {}", url);

        let resp = Self::send(self.http.get(&url)).await?;
        let payload: PostPayload = Self::parse(resp).await?;
        Ok(payload.into_detail())
    }

    async fn create_review(
        &self,
        token: &str,
        post_id: i64,
        input: &ReviewInput,
    ) -> Result<(), ReviewError> {
        let url = self.url(&format!("/posts/{}/reviews", post_id));
        tracing::debug!("POST {}", url);

        Self::send(self.http.post(&url).bearer_auth(token).json(input)).await?;
        Ok(())
    }

    async fn update_review(
        &self,
        token: &str,
        review_id: i64,
        input: &ReviewInput,
    ) -> Result<(), ReviewError> {
        let url = self.url(&format!("/reviews/{}", review_id));
        tracing::debug!("PUT {}", url);

        Self::send(self.http.put(&url).bearer_auth(token).json(input)).await?;
        Ok(())
    }

    async fn delete_review(&self, token: &str, review_id: i64) -> Result<(), ReviewError> {
        let url = self.url(&format!("/reviews/{}", review_id));
        tracing::debug!("DELETE {}", url);

        Self::send(self.http.delete(&url).bearer_auth(token)).await?;
        Ok(())
    }

    async fn create_reply(
        &self,
        token: &str,
        parent_type: ParentType,
        parent_id: i64,
        input: &ReplyInput,
    ) -> Result<(), ReviewError> {
        let url = self.url(&reply_path(parent_type, parent_id));
        tracing::debug!("POST {}", url);

        Self::send(self.http.post(&url).bearer_auth(token).json(input)).await?;
        Ok(())
    }
}
