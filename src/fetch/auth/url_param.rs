use crate::fetch::client::HttpClient;
use async_trait::async_trait;

/// An [`HttpClient`] wrapper that appends the key as a URL query parameter.
///
/// TomTom expects `key=<api key>`; [`QueryKey::tomtom`] builds that form.
pub struct QueryKey<C> {
    inner: C,
    param_name: String,
    key: String,
}

impl<C> QueryKey<C> {
    pub fn new(inner: C, param_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            inner,
            param_name: param_name.into(),
            key: key.into(),
        }
    }

    pub fn tomtom(inner: C, key: impl Into<String>) -> Self {
        Self::new(inner, "key", key)
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for QueryKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.url_mut()
            .query_pairs_mut()
            .append_pair(&self.param_name, &self.key);
        self.inner.execute(req).await
    }
}
