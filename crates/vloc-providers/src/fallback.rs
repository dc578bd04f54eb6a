//! Ordered provider fallback ladder.
//!
//! Walks an ordered list of strategies, moving to the next one only when
//! the current attempt fails with a quota-class error. Any other error
//! (bad input, unparseable response) propagates immediately; falling back
//! cannot fix those.

use std::future::Future;
use tracing::{info, warn};

use crate::error::{ProviderError, ProviderResult};

/// Ordered list of provider strategies.
pub struct FallbackLadder<P> {
    providers: Vec<P>,
}

impl<P> FallbackLadder<P> {
    pub fn new(providers: Vec<P>) -> Self {
        Self { providers }
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Run `attempt` against providers in order, advancing only on
    /// quota-class errors.
    pub async fn attempt<T, F, Fut>(&self, mut attempt: F) -> ProviderResult<T>
    where
        F: FnMut(&P) -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        let mut last_quota: Option<ProviderError> = None;

        for (i, provider) in self.providers.iter().enumerate() {
            match attempt(provider).await {
                Ok(value) => {
                    if i > 0 {
                        info!(rung = i, "Fallback provider succeeded");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_quota() => {
                    warn!(rung = i, provider = e.provider(), "Quota exceeded, trying next provider");
                    last_quota = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_quota.unwrap_or_else(|| ProviderError::Rejected {
            provider: "fallback-ladder".to_string(),
            message: "no providers configured".to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fake {
        name: &'static str,
        fail_with: Option<fn(&str) -> ProviderError>,
    }

    #[tokio::test]
    async fn test_walks_on_quota_only() {
        let ladder = FallbackLadder::new(vec![
            Fake {
                name: "primary",
                fail_with: Some(|n| ProviderError::quota(n, "limit")),
            },
            Fake {
                name: "secondary",
                fail_with: None,
            },
        ]);

        let calls = AtomicUsize::new(0);
        let result = ladder
            .attempt(|p| {
                calls.fetch_add(1, Ordering::SeqCst);
                let out = match p.fail_with {
                    Some(f) => Err(f(p.name)),
                    None => Ok(p.name.to_string()),
                };
                async move { out }
            })
            .await
            .unwrap();

        assert_eq!(result, "secondary");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_quota_propagates_immediately() {
        let ladder = FallbackLadder::new(vec![
            Fake {
                name: "primary",
                fail_with: Some(|n| ProviderError::rejected(n, "bad audio")),
            },
            Fake {
                name: "secondary",
                fail_with: None,
            },
        ]);

        let err = ladder
            .attempt(|p| {
                let out: ProviderResult<String> = match p.fail_with {
                    Some(f) => Err(f(p.name)),
                    None => Ok(p.name.to_string()),
                };
                async move { out }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_all_quota_returns_last() {
        let ladder = FallbackLadder::new(vec![
            Fake {
                name: "a",
                fail_with: Some(|n| ProviderError::quota(n, "limit")),
            },
            Fake {
                name: "b",
                fail_with: Some(|n| ProviderError::quota(n, "limit")),
            },
        ]);

        let err = ladder
            .attempt(|p| {
                let out: ProviderResult<String> = match p.fail_with {
                    Some(f) => Err(f(p.name)),
                    None => Ok(p.name.to_string()),
                };
                async move { out }
            })
            .await
            .unwrap_err();

        assert!(err.is_quota());
        assert_eq!(err.provider(), "b");
    }
}
