//! Request/response mediator
//!
//! A request type declares its response type by implementing [`Request`].
//! Exactly one [`RequestHandler`] is registered per request type; a list of
//! [`PipelineBehavior`]s wraps every dispatch, the first registered behavior
//! being the outermost.
//!
//! ```rust,ignore
//! let mediator = Mediator::builder()
//!     .add_behavior(ValidationBehavior)
//!     .add_behavior(PerformanceLoggingBehavior::default())
//!     .register_handler(ArticlesQueryHandler)
//!     .build();
//!
//! let article = mediator.send(ArticlesQuery).await?;
//! ```

pub mod behaviors;

use crate::core::error::ApiError;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use validator::ValidationErrors;

pub use behaviors::{PerformanceLoggingBehavior, ValidationBehavior};

/// Type-erased handler response travelling through the behaviors
pub type BoxResponse = Box<dyn Any + Send>;

/// Future produced by each pipeline stage
pub type PipelineFuture<'a> = BoxFuture<'a, Result<BoxResponse, ApiError>>;

/// A message dispatched through the mediator
pub trait Request: Send + Sync + 'static {
    type Response: Send + 'static;

    /// Short name used in logs (type name without its module path)
    fn name() -> &'static str {
        short_type_name::<Self>()
    }

    /// Validate the request before it reaches its handler
    fn validate_request(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

/// Handles one request type
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    async fn handle(&self, request: &R) -> Result<R::Response, ApiError>;
}

/// What a behavior can see of the request it wraps
pub trait RequestInfo: Send + Sync {
    fn request_name(&self) -> &'static str;

    fn run_validation(&self) -> Result<(), ValidationErrors>;
}

impl<R: Request> RequestInfo for R {
    fn request_name(&self) -> &'static str {
        R::name()
    }

    fn run_validation(&self) -> Result<(), ValidationErrors> {
        self.validate_request()
    }
}

/// Cross-cutting step wrapped around every handler
#[async_trait]
pub trait PipelineBehavior: Send + Sync {
    async fn handle(
        &self,
        request: &dyn RequestInfo,
        next: Next<'_>,
    ) -> Result<BoxResponse, ApiError>;
}

/// Innermost stage: the registered handler
trait Endpoint: Send + Sync {
    fn call(&self) -> PipelineFuture<'_>;
}

struct HandlerEndpoint<'r, R: Request> {
    handler: &'r dyn RequestHandler<R>,
    request: &'r R,
}

impl<R: Request> Endpoint for HandlerEndpoint<'_, R> {
    fn call(&self) -> PipelineFuture<'_> {
        Box::pin(async move {
            let response = self.handler.handle(self.request).await?;
            Ok(Box::new(response) as BoxResponse)
        })
    }
}

/// The remainder of the pipeline after the current behavior
pub struct Next<'a> {
    request: &'a dyn RequestInfo,
    behaviors: &'a [Arc<dyn PipelineBehavior>],
    endpoint: &'a dyn Endpoint,
}

impl<'a> Next<'a> {
    /// Run the remaining behaviors and then the handler
    pub fn run(self) -> PipelineFuture<'a> {
        match self.behaviors.split_first() {
            Some((behavior, rest)) => {
                let next = Next {
                    request: self.request,
                    behaviors: rest,
                    endpoint: self.endpoint,
                };
                behavior.handle(self.request, next)
            }
            None => self.endpoint.call(),
        }
    }
}

/// Dispatches requests to their handlers through the behavior pipeline
pub struct Mediator {
    handlers: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    behaviors: Vec<Arc<dyn PipelineBehavior>>,
}

impl Mediator {
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::new()
    }

    /// Send a request and wait for its response
    pub async fn send<R: Request>(&self, request: R) -> Result<R::Response, ApiError> {
        let handler = self.handler::<R>().ok_or_else(|| {
            ApiError::internal(format!("No handler registered for {}", R::name()))
        })?;

        let endpoint = HandlerEndpoint {
            handler: handler.as_ref(),
            request: &request,
        };
        let next = Next {
            request: &request,
            behaviors: &self.behaviors,
            endpoint: &endpoint,
        };

        let response = next.run().await?;
        response
            .downcast::<R::Response>()
            .map(|boxed| *boxed)
            .map_err(|_| {
                ApiError::internal(format!("Pipeline returned a foreign response for {}", R::name()))
            })
    }

    /// Whether a handler is registered for `R`
    pub fn handles<R: Request>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<R>())
    }

    fn handler<R: Request>(&self) -> Option<Arc<dyn RequestHandler<R>>> {
        self.handlers
            .get(&TypeId::of::<R>())
            .and_then(|entry| entry.downcast_ref::<Arc<dyn RequestHandler<R>>>())
            .cloned()
    }
}

/// Builder for [`Mediator`]
pub struct MediatorBuilder {
    handlers: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    behaviors: Vec<Arc<dyn PipelineBehavior>>,
}

impl MediatorBuilder {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            behaviors: Vec::new(),
        }
    }

    /// Register the handler for `R`, replacing any previous one
    pub fn register_handler<R, H>(mut self, handler: H) -> Self
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        let handler: Arc<dyn RequestHandler<R>> = Arc::new(handler);
        if self
            .handlers
            .insert(TypeId::of::<R>(), Arc::new(handler))
            .is_some()
        {
            tracing::warn!("Handler for {} registered twice, keeping the last", R::name());
        }
        self
    }

    /// Append a behavior; earlier behaviors wrap later ones
    pub fn add_behavior(mut self, behavior: impl PipelineBehavior + 'static) -> Self {
        self.behaviors.push(Arc::new(behavior));
        self
    }

    /// Append an already shared behavior
    pub fn add_shared_behavior(mut self, behavior: Arc<dyn PipelineBehavior>) -> Self {
        self.behaviors.push(behavior);
        self
    }

    pub fn build(self) -> Mediator {
        Mediator {
            handlers: self.handlers,
            behaviors: self.behaviors,
        }
    }
}

impl Default for MediatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    // Generic arguments may contain `::`, so only look before the first `<`.
    let end = full.find('<').unwrap_or(full.len());
    match full[..end].rfind("::") {
        Some(idx) => &full[idx + 2..end],
        None => &full[..end],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Ping(u32);

    impl Request for Ping {
        type Response = u32;
    }

    struct PingHandler;

    #[async_trait]
    impl RequestHandler<Ping> for PingHandler {
        async fn handle(&self, request: &Ping) -> Result<u32, ApiError> {
            Ok(request.0 + 1)
        }
    }

    struct Unhandled;

    impl Request for Unhandled {
        type Response = ();
    }

    /// Records entry/exit order into a shared log
    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl PipelineBehavior for Recorder {
        async fn handle(
            &self,
            request: &dyn RequestInfo,
            next: Next<'_>,
        ) -> Result<BoxResponse, ApiError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:enter:{}", self.label, request.request_name()));
            let response = next.run().await;
            self.log.lock().unwrap().push(format!("{}:exit", self.label));
            response
        }
    }

    struct ShortCircuit;

    #[async_trait]
    impl PipelineBehavior for ShortCircuit {
        async fn handle(
            &self,
            _request: &dyn RequestInfo,
            _next: Next<'_>,
        ) -> Result<BoxResponse, ApiError> {
            Err(ApiError::new("stopped"))
        }
    }

    #[tokio::test]
    async fn test_send_reaches_handler() {
        let mediator = Mediator::builder().register_handler(PingHandler).build();
        assert_eq!(mediator.send(Ping(41)).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_missing_handler_is_internal_error() {
        let mediator = Mediator::builder().build();
        let err = mediator.send(Unhandled).await.unwrap_err();

        assert!(err.is_server_error());
        assert!(err.message().contains("Unhandled"));
    }

    #[tokio::test]
    async fn test_behaviors_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mediator = Mediator::builder()
            .add_behavior(Recorder {
                label: "outer",
                log: log.clone(),
            })
            .add_behavior(Recorder {
                label: "inner",
                log: log.clone(),
            })
            .register_handler(PingHandler)
            .build();

        mediator.send(Ping(0)).await.unwrap();

        let log = log.lock().unwrap();
        assert_eq!(
            *log,
            vec![
                "outer:enter:Ping",
                "inner:enter:Ping",
                "inner:exit",
                "outer:exit"
            ]
        );
    }

    #[tokio::test]
    async fn test_behavior_can_short_circuit() {
        let mediator = Mediator::builder()
            .add_behavior(ShortCircuit)
            .register_handler(PingHandler)
            .build();

        let err = mediator.send(Ping(1)).await.unwrap_err();
        assert_eq!(err.message(), "stopped");
    }

    #[test]
    fn test_handles() {
        let mediator = Mediator::builder().register_handler(PingHandler).build();
        assert!(mediator.handles::<Ping>());
        assert!(!mediator.handles::<Unhandled>());
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<Ping>(), "Ping");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
        assert_eq!(short_type_name::<u32>(), "u32");
    }
}
