use crate::shared::application::use_case::RequestHandler;
use crate::shared::core::transaction::Transaction;
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediatorError {
    #[error("no handler registered for {request} -> {response}")]
    HandlerNotRegistered {
        request: &'static str,
        response: &'static str,
    },

    #[error("a handler for {request} -> {response} is already registered")]
    DuplicateRegistration {
        request: &'static str,
        response: &'static str,
    },
}

type Registry = HashMap<TypeId, Box<dyn Any + Send + Sync>>;

fn key<R: Transaction>() -> TypeId {
    TypeId::of::<(R, R::Response)>()
}

#[derive(Default)]
pub struct MediatorBuilder {
    handlers: Registry,
}

impl MediatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<R, H>(mut self, handler: Arc<H>) -> Result<Self, MediatorError>
    where
        R: Transaction,
        H: RequestHandler<R> + 'static,
    {
        if self.handlers.contains_key(&key::<R>()) {
            return Err(MediatorError::DuplicateRegistration {
                request: type_name::<R>(),
                response: type_name::<R::Response>(),
            });
        }
        let handler: Arc<dyn RequestHandler<R>> = handler;
        self.handlers.insert(key::<R>(), Box::new(handler));
        tracing::debug!(request = type_name::<R>(), "handler registered");
        Ok(self)
    }

    pub fn build(self) -> Mediator {
        Mediator {
            handlers: self.handlers,
        }
    }
}

pub struct Mediator {
    handlers: Registry,
}

impl Mediator {
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::new()
    }

    pub fn is_registered<R: Transaction>(&self) -> bool {
        self.handler::<R>().is_some()
    }

    pub async fn send<R: Transaction>(
        &self,
        request: R,
        cancel: &CancellationToken,
    ) -> Result<R::Response, MediatorError> {
        let handler = self
            .handler::<R>()
            .ok_or(MediatorError::HandlerNotRegistered {
                request: type_name::<R>(),
                response: type_name::<R::Response>(),
            })?;
        Ok(handler.handle(request, cancel).await)
    }

    fn handler<R: Transaction>(&self) -> Option<Arc<dyn RequestHandler<R>>> {
        self.handlers
            .get(&key::<R>())
            .and_then(|entry| entry.downcast_ref::<Arc<dyn RequestHandler<R>>>())
            .cloned()
    }
}

#[cfg(test)]
mod mediator_tests {
    use super::*;
    use crate::shared::application::use_case::use_case_test_support::{
        Double, DoubleHandler, double,
    };
    use crate::shared::core::correlation_id::CorrelationId;
    use crate::shared::core::envelope::BaseReturn;
    use crate::shared::core::transaction::TransactionCode;

    struct Unwired {
        correlation_id: CorrelationId,
    }

    impl Transaction for Unwired {
        type Response = BaseReturn<()>;
        const CODE: TransactionCode = TransactionCode::ListSampleTasks;

        fn correlation_id(&self) -> &CorrelationId {
            &self.correlation_id
        }
    }

    fn mediator() -> Mediator {
        Mediator::builder()
            .register::<Double, _>(Arc::new(DoubleHandler::default()))
            .unwrap()
            .build()
    }

    #[tokio::test]
    async fn it_should_dispatch_to_the_registered_handler() {
        let response = mediator()
            .send(double(4), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.data(), Some(&8));
    }

    #[tokio::test]
    async fn it_should_fail_when_no_handler_is_registered() {
        let result = mediator()
            .send(
                Unwired {
                    correlation_id: CorrelationId::generate(),
                },
                &CancellationToken::new(),
            )
            .await;
        assert!(matches!(
            result,
            Err(MediatorError::HandlerNotRegistered { .. })
        ));
    }

    #[test]
    fn it_should_reject_a_second_handler_for_the_same_pair() {
        let result = Mediator::builder()
            .register::<Double, _>(Arc::new(DoubleHandler::default()))
            .unwrap()
            .register::<Double, _>(Arc::new(DoubleHandler::default()));
        assert!(matches!(
            result,
            Err(MediatorError::DuplicateRegistration { .. })
        ));
    }

    #[test]
    fn it_should_know_what_is_registered() {
        let mediator = mediator();
        assert!(mediator.is_registered::<Double>());
        assert!(!mediator.is_registered::<Unwired>());
    }
}
