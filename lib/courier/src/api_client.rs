//! Client bound to a base URL.

use url::Url;

use crate::{Error, Fetch, Handler, HttpClient, Method, Result, default_handlers, options};

/// An [`HttpClient`] paired with the base URL of one API.
///
/// Fetches started from an `ApiClient` resolve their target against the base
/// URL, so call sites only name paths. Several `ApiClient`s can share one
/// [`HyperClient`](crate::HyperClient) and its connection pool.
///
/// # Example
///
/// ```no_run
/// # async fn run() -> courier::Result<()> {
/// use courier::{ApiClient, HyperClient, Method};
///
/// let http = HyperClient::builder().with_logging().build();
/// let shop = ApiClient::new(http.clone(), "https://shop.example.com/api/")?;
///
/// let names: Vec<String> = shop
///     .fetch(Method::Get, "products")
///     .query_param("limit", "10")
///     .send()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient<C> {
    client: C,
    base_url: Url,
}

impl<C> ApiClient<C> {
    /// Create an API client from a base URL string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the URL cannot be parsed.
    pub fn new(client: C, base_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            client,
            base_url: Url::parse(base_url.as_ref()).map_err(Error::InvalidUrl)?,
        })
    }

    /// Create an API client from a parsed URL.
    #[must_use]
    pub fn with_url(client: C, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// The base URL targets are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The inner HTTP client.
    #[must_use]
    pub fn inner(&self) -> &C {
        &self.client
    }

    /// Consume the wrapper and return the inner HTTP client.
    #[must_use]
    pub fn into_inner(self) -> C {
        self.client
    }
}

impl<C> ApiClient<C>
where
    C: HttpClient + Clone,
{
    /// Start a fetch against this API with [`default_handlers`].
    ///
    /// Relative targets resolve against the base URL following RFC 3986, so a
    /// base path only applies to targets without a leading `/` when the base
    /// ends with `/`. The target is resolved before any other option runs:
    /// `{name}` placeholders of the base path can be filled with
    /// [`Fetch::path_value`] and a later [`Fetch::base_url`] has no effect.
    pub fn fetch<T, M>(&self, method: M, target: impl Into<String>) -> Fetch<T, C>
    where
        T: serde::de::DeserializeOwned + Default + 'static,
        M: TryInto<Method>,
        M::Error: Into<Error>,
    {
        self.fetch_with(method, target, default_handlers())
    }

    /// Start a fetch against this API with a custom handler.
    pub fn fetch_with<T, M>(
        &self,
        method: M,
        target: impl Into<String>,
        handler: impl Handler<T> + 'static,
    ) -> Fetch<T, C>
    where
        M: TryInto<Method>,
        M::Error: Into<Error>,
    {
        Fetch::new(self.client.clone(), method, target, handler)
            .option(options::with_base_url(self.base_url.clone()))
    }
}
