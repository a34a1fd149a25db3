//! A transport layer that logs every JSON-RPC request passing through it
//! together with its latency. The label identifies the component issuing the
//! requests in the log output.
use {
    alloy::{
        rpc::json_rpc::{RequestPacket, ResponsePacket},
        transports::TransportError,
    },
    std::{
        fmt::Debug,
        pin::Pin,
        task::{Context, Poll},
        time::Instant,
    },
    tower::{Layer, Service},
};

#[derive(Debug, Clone)]
pub struct InstrumentationLayer {
    label: String,
}

impl InstrumentationLayer {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl<S> Layer<S> for InstrumentationLayer {
    type Service = InstrumentedTransport<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InstrumentedTransport {
            inner,
            label: self.label.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InstrumentedTransport<S> {
    inner: S,
    label: String,
}

impl<S> Service<RequestPacket> for InstrumentedTransport<S>
where
    S: Service<RequestPacket, Response = ResponsePacket, Error = TransportError>,
    S::Future: Send + 'static,
    S::Response: Send + 'static + Debug,
    S::Error: Send + 'static + Debug,
{
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;
    type Response = S::Response;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: RequestPacket) -> Self::Future {
        let methods: Vec<String> = req
            .requests()
            .iter()
            .map(|r| r.method().to_string())
            .collect();
        let label = self.label.clone();
        tracing::trace!(label, ?methods, "executing request");

        let fut = self.inner.call(req);
        Box::pin(async move {
            let start = Instant::now();
            let res = fut.await;
            match &res {
                Ok(_) => tracing::debug!(label, ?methods, elapsed = ?start.elapsed(), "request completed"),
                Err(err) => {
                    tracing::debug!(label, ?methods, ?err, elapsed = ?start.elapsed(), "request failed")
                }
            }
            res
        })
    }
}
