//! Single-value result streams.
//!
//! A [`ResultStream`] wraps the future of one operation. Nothing runs until
//! it is polled, awaited or subscribed. It yields exactly one item: the
//! response, or the error that replaced it. Awaiting or delivering a stream
//! whose item was already taken fails with [`LinkError::Consumed`].

use crate::error::LinkError;
use futures::future::BoxFuture;
use futures::stream::Stream;
use qlbridge_runtime::Response;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Receives the outcome of a [`ResultStream`].
pub trait Observer {
    fn next(&mut self, value: Response);

    fn error(&mut self, error: LinkError);

    fn complete(&mut self) {}
}

/// The result of one operation.
pub struct ResultStream {
    future: Option<BoxFuture<'static, Result<Response, LinkError>>>,
}

impl ResultStream {
    /// Creates a stream that resolves `future` when first polled.
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<Response, LinkError>> + Send + 'static,
    {
        Self {
            future: Some(Box::pin(future)),
        }
    }

    /// Creates a stream that yields `result`.
    #[must_use]
    pub fn ready(result: Result<Response, LinkError>) -> Self {
        Self::from_future(futures::future::ready(result))
    }

    /// Returns true once the single item has been taken.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.future.is_none()
    }

    /// Drives the stream and reports to `observer`: `next` then `complete`
    /// on success, `error` alone on failure.
    pub async fn deliver<O: Observer + ?Sized>(self, observer: &mut O) {
        match self.await {
            Ok(response) => {
                observer.next(response);
                observer.complete();
            }
            Err(err) => observer.error(err),
        }
    }

    /// Runs the stream on the tokio runtime and hands the observer back once
    /// it has been notified.
    pub fn subscribe<O>(self, mut observer: O) -> tokio::task::JoinHandle<O>
    where
        O: Observer + Send + 'static,
    {
        tokio::spawn(async move {
            self.deliver(&mut observer).await;
            observer
        })
    }
}

impl fmt::Debug for ResultStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultStream")
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

impl IntoFuture for ResultStream {
    type Output = Result<Response, LinkError>;
    type IntoFuture = BoxFuture<'static, Result<Response, LinkError>>;

    fn into_future(self) -> Self::IntoFuture {
        match self.future {
            Some(future) => future,
            None => Box::pin(futures::future::ready(Err(LinkError::Consumed))),
        }
    }
}

impl Stream for ResultStream {
    type Item = Result<Response, LinkError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(future) = this.future.as_mut() else {
            return Poll::Ready(None);
        };
        match future.as_mut().poll(cx) {
            Poll::Ready(item) => {
                this.future = None;
                Poll::Ready(Some(item))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::from(self.future.is_some());
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl Observer for Recorder {
        fn next(&mut self, value: Response) {
            self.events.push(format!("next {}", value.to_json()));
        }

        fn error(&mut self, error: LinkError) {
            self.events.push(format!("error {error}"));
        }

        fn complete(&mut self) {
            self.events.push("complete".to_string());
        }
    }

    #[tokio::test]
    async fn test_success_is_next_then_complete() {
        let stream = ResultStream::ready(Ok(Response::data(json!({"a": 1}))));
        let recorder = stream.subscribe(Recorder::default()).await.unwrap();
        assert_eq!(recorder.events, ["next {\"data\":{\"a\":1}}", "complete"]);
    }

    #[tokio::test]
    async fn test_failure_is_error_only() {
        let stream = ResultStream::ready(Err(crate::error::ContextError::new("boom").into()));
        let mut recorder = Recorder::default();
        stream.deliver(&mut recorder).await;
        assert_eq!(recorder.events, ["error boom"]);
    }

    #[tokio::test]
    async fn test_stream_is_cold_and_single_valued() {
        let started = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&started);
        let mut stream = ResultStream::from_future(async move {
            flag.store(true, Ordering::SeqCst);
            Ok(Response::data(json!(null)))
        });
        assert!(!started.load(Ordering::SeqCst));
        assert_eq!(stream.size_hint(), (1, Some(1)));

        assert!(stream.next().await.unwrap().is_ok());
        assert!(started.load(Ordering::SeqCst));
        assert!(stream.next().await.is_none());
        assert!(stream.is_terminated());
    }

    #[tokio::test]
    async fn test_drained_stream_fails_instead_of_hanging() {
        let mut stream = ResultStream::ready(Ok(Response::data(json!({"a": 1}))));
        assert!(stream.next().await.unwrap().is_ok());

        let result = tokio::time::timeout(std::time::Duration::from_millis(200), stream)
            .await
            .expect("drained stream must resolve");
        assert!(matches!(result, Err(LinkError::Consumed)));
    }

    #[tokio::test]
    async fn test_drained_stream_delivers_error_only() {
        let mut stream = ResultStream::ready(Ok(Response::data(json!({"a": 1}))));
        assert!(stream.next().await.is_some());

        let recorder = stream.subscribe(Recorder::default()).await.unwrap();
        assert_eq!(recorder.events, ["error result already consumed"]);
    }

    #[tokio::test]
    async fn test_await_directly() {
        let response = ResultStream::ready(Ok(Response::data(json!({"b": 2}))))
            .await
            .unwrap();
        assert_eq!(response.data, Some(json!({"b": 2})));
    }
}
