//! Endpoint middleware.
//!
//! Each middleware is a [`Layer`] plus the [`Service`] it produces, generic
//! over the request payload so the same chain decorates every operation.

use super::Request;
use crate::error::EndpointError;
use crate::metrics::{ENDPOINT_REQUEST_DURATION_SECONDS, ENDPOINT_REQUESTS_TOTAL};
use futures::future::BoxFuture;
use std::task::{Context, Poll};
use std::time::Instant;
use todokit_core::correlation;
use todokit_core::error::Classify;
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Ensures every request has a correlation identifier and runs the rest of
/// the chain inside it.
///
/// The identifier is taken from [`Request::correlation_id`] or generated. It
/// is recorded on a `request` span and set as the task-local
/// [`correlation::current`] value.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationLayer;

impl<S> Layer<S> for CorrelationLayer {
    type Service = Correlation<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Correlation { inner }
    }
}

/// Service produced by [`CorrelationLayer`].
#[derive(Debug, Clone)]
pub struct Correlation<S> {
    inner: S,
}

impl<S, T> Service<Request<T>> for Correlation<S>
where
    S: Service<Request<T>, Error = EndpointError>,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = EndpointError;
    type Future = BoxFuture<'static, Result<S::Response, EndpointError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<T>) -> Self::Future {
        let correlation_id = request
            .correlation_id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();

        let span = tracing::info_span!("request", correlation_id = %correlation_id);
        // Inner spans are created in `call`, so they must see this one.
        let future = {
            let _entered = span.enter();
            self.inner.call(request)
        };

        Box::pin(correlation::scope(correlation_id, future).instrument(span))
    }
}

/// Wraps each call in an `endpoint` span named after the operation.
#[derive(Debug, Clone, Copy)]
pub struct TracingLayer {
    operation: &'static str,
}

impl TracingLayer {
    /// Spans for `operation`.
    #[must_use]
    pub const fn new(operation: &'static str) -> Self {
        Self { operation }
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = Tracing<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Tracing {
            inner,
            operation: self.operation,
        }
    }
}

/// Service produced by [`TracingLayer`].
#[derive(Debug, Clone)]
pub struct Tracing<S> {
    inner: S,
    operation: &'static str,
}

impl<S, T> Service<Request<T>> for Tracing<S>
where
    S: Service<Request<T>, Error = EndpointError>,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = EndpointError;
    type Future = BoxFuture<'static, Result<S::Response, EndpointError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<T>) -> Self::Future {
        let span = tracing::info_span!(
            "endpoint",
            otel.name = self.operation,
            operation = self.operation
        );
        let future = {
            let _entered = span.enter();
            self.inner.call(request)
        };

        Box::pin(future.instrument(span))
    }
}

/// Logs the outcome and duration of each call.
///
/// Successes log at `info`, business errors at `warn`, internal errors at
/// `error`.
#[derive(Debug, Clone, Copy)]
pub struct LoggingLayer {
    operation: &'static str,
}

impl LoggingLayer {
    /// Log calls of `operation`.
    #[must_use]
    pub const fn new(operation: &'static str) -> Self {
        Self { operation }
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            operation: self.operation,
        }
    }
}

/// Service produced by [`LoggingLayer`].
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    operation: &'static str,
}

impl<S, T> Service<Request<T>> for Logging<S>
where
    S: Service<Request<T>, Error = EndpointError>,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = EndpointError;
    type Future = BoxFuture<'static, Result<S::Response, EndpointError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<T>) -> Self::Future {
        let operation = self.operation;
        let started = Instant::now();
        let future = self.inner.call(request);

        Box::pin(async move {
            let result = future.await;
            let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

            match &result {
                Ok(_) => tracing::info!(
                    operation,
                    duration_ms,
                    outcome = "success",
                    "Endpoint call succeeded"
                ),
                Err(EndpointError::Business { kind, message, details }) => tracing::warn!(
                    operation,
                    duration_ms,
                    outcome = "business_error",
                    kind = kind.as_str(),
                    error = %message,
                    details = ?details,
                    "Endpoint call rejected"
                ),
                Err(err @ EndpointError::Internal(_)) => tracing::error!(
                    operation,
                    duration_ms,
                    outcome = "internal_error",
                    error = %err,
                    "Endpoint call failed"
                ),
            }

            result
        })
    }
}

/// Records a call counter and a latency histogram per operation.
#[derive(Debug, Clone, Copy)]
pub struct InstrumentationLayer {
    operation: &'static str,
}

impl InstrumentationLayer {
    /// Instrument calls of `operation`.
    #[must_use]
    pub const fn new(operation: &'static str) -> Self {
        Self { operation }
    }
}

impl<S> Layer<S> for InstrumentationLayer {
    type Service = Instrumentation<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Instrumentation {
            inner,
            operation: self.operation,
        }
    }
}

/// Service produced by [`InstrumentationLayer`].
#[derive(Debug, Clone)]
pub struct Instrumentation<S> {
    inner: S,
    operation: &'static str,
}

impl<S, T> Service<Request<T>> for Instrumentation<S>
where
    S: Service<Request<T>, Error = EndpointError>,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = EndpointError;
    type Future = BoxFuture<'static, Result<S::Response, EndpointError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<T>) -> Self::Future {
        let operation = self.operation;
        let started = Instant::now();
        let future = self.inner.call(request);

        Box::pin(async move {
            let result = future.await;
            let outcome = match &result {
                Ok(_) => "success",
                Err(err) => err.outcome(),
            };

            metrics::counter!(ENDPOINT_REQUESTS_TOTAL, "operation" => operation, "outcome" => outcome)
                .increment(1);
            metrics::histogram!(ENDPOINT_REQUEST_DURATION_SECONDS, "operation" => operation)
                .record(started.elapsed().as_secs_f64());

            result
        })
    }
}

/// Turns domain errors into [`EndpointError`]s.
///
/// Errors that classify as business errors become
/// [`EndpointError::Business`]; everything else is
/// [`EndpointError::Internal`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientErrorLayer;

impl<S> Layer<S> for ClientErrorLayer {
    type Service = ClientError<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ClientError { inner }
    }
}

/// Service produced by [`ClientErrorLayer`].
#[derive(Debug, Clone)]
pub struct ClientError<S> {
    inner: S,
}

impl<S, T> Service<Request<T>> for ClientError<S>
where
    S: Service<Request<T>>,
    S::Error: Classify + std::error::Error + Send + Sync + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = EndpointError;
    type Future = BoxFuture<'static, Result<S::Response, EndpointError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(EndpointError::classify)
    }

    fn call(&mut self, request: Request<T>) -> Self::Future {
        let future = self.inner.call(request);
        Box::pin(async move { future.await.map_err(EndpointError::classify) })
    }
}
