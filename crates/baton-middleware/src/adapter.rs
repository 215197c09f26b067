//! Adapter for plain request handlers.

use crate::context::Context;
use crate::middleware::{BoxFuture, Middleware};
use crate::response::ResponseWriter;
use crate::types::Request;
use baton_core::MiddlewareResult;

/// A handler that works on the raw request and response writer.
///
/// Closures with the matching signature implement it.
pub trait Handler: Send + Sync + 'static {
    /// Handles the request.
    fn serve(&self, request: &Request, response: &mut ResponseWriter);
}

impl<F> Handler for F
where
    F: Fn(&Request, &mut ResponseWriter) + Send + Sync + 'static,
{
    fn serve(&self, request: &Request, response: &mut ResponseWriter) {
        self(request, response);
    }
}

/// Middleware that delegates to a [`Handler`] and never fails.
#[derive(Debug, Clone)]
pub struct HandlerMiddleware<H> {
    handler: H,
}

impl<H> HandlerMiddleware<H> {
    /// Returns the wrapped handler.
    pub fn into_inner(self) -> H {
        self.handler
    }
}

/// Wraps a [`Handler`] as middleware.
pub fn wrap_handler<H: Handler>(handler: H) -> HandlerMiddleware<H> {
    HandlerMiddleware { handler }
}

impl<H: Handler> Middleware for HandlerMiddleware<H> {
    fn name(&self) -> &'static str {
        "handler"
    }

    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, MiddlewareResult> {
        let (request, response) = ctx.parts_mut();
        self.handler.serve(request, response);
        Box::pin(std::future::ready(Ok(())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::AppSettings;
    use http::StatusCode;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_delegates_to_handler() {
        let echo = wrap_handler(|req: &Request, res: &mut ResponseWriter| {
            res.set_status(StatusCode::ACCEPTED);
            res.write(req.uri().path());
        });
        let request = http::Request::builder()
            .uri("/echo/me")
            .body(bytes::Bytes::new())
            .unwrap();
        let mut ctx = Context::with_request(Arc::new(AppSettings::default()), request);

        echo.call(&mut ctx).await.unwrap();

        assert_eq!(echo.name(), "handler");
        assert_eq!(ctx.res().status(), Some(StatusCode::ACCEPTED));
        assert_eq!(ctx.res().body(), b"/echo/me");
        assert!(!ctx.is_ended());
    }
}
