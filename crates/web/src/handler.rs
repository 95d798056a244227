//! Request handlers and the adapters that build them from async functions.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use wharf_http::protocol::{Request, Response};

use crate::error::Error;
use crate::schema::{Model, validate_and_build};

/// Anything that turns a [`Request`] into a [`Response`].
///
/// Route handlers, composed middleware chains and the application itself all
/// implement this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn invoke(&self, req: Request) -> Result<Response, Error>;
}

#[async_trait]
impl<T: RequestHandler + ?Sized> RequestHandler for Arc<T> {
    async fn invoke(&self, req: Request) -> Result<Response, Error> {
        self.as_ref().invoke(req).await
    }
}

/// A handler backed by an async function of the request.
#[derive(Debug)]
pub struct FnHandler<F> {
    f: F,
}

pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, Error>> + Send,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> RequestHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, Error>> + Send,
{
    async fn invoke(&self, req: Request) -> Result<Response, Error> {
        (self.f)(req).await
    }
}

/// A handler that receives the request body bound to a validated model.
///
/// A missing body counts as an empty object, so required fields are reported
/// as missing instead of the whole body being rejected.
pub struct ModelHandler<M, F> {
    f: F,
    _phantom: PhantomData<fn() -> M>,
}

impl<M, F> std::fmt::Debug for ModelHandler<M, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandler").field("model", &std::any::type_name::<M>()).finish_non_exhaustive()
    }
}

pub fn with_model<M, F, Fut>(f: F) -> ModelHandler<M, F>
where
    M: Model,
    F: Fn(Request, M) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, Error>> + Send,
{
    ModelHandler { f, _phantom: PhantomData }
}

#[async_trait]
impl<M, F, Fut> RequestHandler for ModelHandler<M, F>
where
    M: Model + Send,
    F: Fn(Request, M) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, Error>> + Send,
{
    async fn invoke(&self, req: Request) -> Result<Response, Error> {
        let model = match req.body() {
            Some(data) => validate_and_build::<M>(data)?,
            None => validate_and_build::<M>(&Value::Object(Map::new()))?,
        };
        (self.f)(req, model).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, FieldType, NotNull, Schema};
    use http::StatusCode;
    use once_cell::sync::Lazy;
    use serde::Deserialize;
    use serde_json::json;
    use wharf_http::protocol::Method;

    #[derive(Debug, Deserialize)]
    struct Login {
        username: String,
    }

    static LOGIN_SCHEMA: Lazy<Arc<Schema>> =
        Lazy::new(|| Schema::builder("Login").field(Field::new("username", FieldType::String).validator(NotNull)).build());

    impl Model for Login {
        fn schema() -> Arc<Schema> {
            Arc::clone(&LOGIN_SCHEMA)
        }
    }

    async fn greet(_req: Request, login: Login) -> Result<Response, Error> {
        Ok(Response::text(StatusCode::OK, format!("hello {}", login.username)))
    }

    #[tokio::test]
    async fn test_handler_fn() {
        let handler = handler_fn(|req: Request| async move { Ok(Response::text(StatusCode::OK, req.path().to_string())) });

        let response = handler.invoke(Request::new(Method::Get, "/ping")).await.unwrap();
        assert_eq!(response.body().unwrap().data().as_ref(), b"/ping");
    }

    #[tokio::test]
    async fn test_with_model_binds_body() {
        let handler = with_model(greet);
        let request = Request::new(Method::Post, "/login").with_body(json!({"username": "tom"}));

        let response = handler.invoke(request).await.unwrap();
        assert_eq!(response.body().unwrap().data().as_ref(), b"hello tom");
    }

    #[tokio::test]
    async fn test_with_model_missing_body_reports_fields() {
        let handler = with_model(greet);

        let result = handler.invoke(Request::new(Method::Post, "/login")).await;
        let Err(Error::Validation(e)) = result else {
            panic!("expected validation error");
        };
        assert_eq!(e.errors().len(), 1);
        assert_eq!(e.errors()[0].field(), "username");
    }

    #[tokio::test]
    async fn test_with_model_rejects_non_object() {
        let handler = with_model(greet);
        let request = Request::new(Method::Post, "/login").with_body(json!([1, 2]));

        let result = handler.invoke(request).await;
        assert!(matches!(result, Err(Error::Http(e)) if e.status() == StatusCode::BAD_REQUEST));
    }
}
