//! Integration tests for the pooled context and the middleware chain.
//!
//! These drive a pooled context through a chain the same way the server does:
//!
//! 1. Acquire a context bound to a request
//! 2. Run the chain
//! 3. Run or discard after-hooks
//! 4. Commit and release

use baton_core::{Failure, HttpError};
use baton_middleware::{
    from_fn, from_sync_fn, response_channel, wrap_handler, AppSettings, BoxedMiddleware, Chain,
    ContextPool, Request, ResponseWriter,
};
use bytes::Bytes;
use http::StatusCode;
use http_body_util::BodyExt;
use std::sync::{Arc, Mutex};

fn make_request(path: &str) -> Request {
    http::Request::builder()
        .uri(path)
        .body(Bytes::new())
        .unwrap()
}

fn pool() -> ContextPool {
    ContextPool::new(Arc::new(AppSettings::default()))
}

#[tokio::test]
async fn test_successful_cycle_commits_once() {
    let pool = pool();
    let chain = Chain::new(vec![
        Arc::new(from_sync_fn("hooked", |ctx| {
            ctx.after(|ctx| {
                ctx.res_mut().headers_mut().insert(
                    "x-after",
                    http::HeaderValue::from_static("1"),
                );
            });
            Ok(())
        })) as BoxedMiddleware,
        Arc::new(from_fn("respond", |ctx| {
            Box::pin(async move {
                let path = ctx.req().uri().path().to_owned();
                ctx.text(StatusCode::OK, path);
                Ok(())
            })
        })),
    ]);

    let (sink, receiver) = response_channel();
    {
        let mut ctx = pool.acquire(make_request("/hello"), sink);
        chain.run(&mut ctx).await.unwrap();
        ctx.run_after_hooks();
        assert!(ctx.commit());
        assert!(!ctx.commit());
    }

    let response = receiver.await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-after"], "1");
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"/hello");
    assert_eq!(pool.idle(), 1);
}

#[tokio::test]
async fn test_error_cycle_discards_hooks() {
    let pool = pool();
    let ran = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&ran);

    let chain = Chain::new(vec![
        Arc::new(from_sync_fn("queue", move |ctx| {
            let flag = Arc::clone(&flag);
            ctx.after(move |_| *flag.lock().unwrap() = true);
            Ok(())
        })) as BoxedMiddleware,
        Arc::new(from_sync_fn("fail", |_| {
            Err(Failure::from(HttpError::new(400, "bad request")))
        })),
    ]);

    let (sink, _receiver) = response_channel();
    let mut ctx = pool.acquire(make_request("/"), sink);
    let result = chain.run(&mut ctx).await;

    assert!(result.is_err());
    ctx.discard_after_hooks();
    ctx.run_after_hooks();
    assert!(!*ran.lock().unwrap());
}

#[tokio::test]
async fn test_wrapped_handler_in_chain() {
    let pool = pool();
    let chain = Chain::new(vec![Arc::new(wrap_handler(
        |req: &Request, res: &mut ResponseWriter| {
            res.write(format!("method={}", req.method()));
        },
    )) as BoxedMiddleware]);

    let (sink, receiver) = response_channel();
    {
        let mut ctx = pool.acquire(make_request("/"), sink);
        chain.run(&mut ctx).await.unwrap();
        ctx.commit();
    }

    let response = receiver.await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"method=GET");
}

#[tokio::test]
async fn test_settings_visible_through_context() {
    let settings = AppSettings::default().with_value("region", serde_json::json!("eu-west"));
    let pool = ContextPool::new(Arc::new(settings));
    let chain = Chain::new(vec![Arc::new(from_sync_fn("region", |ctx| {
        let region = ctx
            .app()
            .get("region")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_owned();
        ctx.text(StatusCode::OK, region);
        Ok(())
    })) as BoxedMiddleware]);

    let (sink, _receiver) = response_channel();
    let mut ctx = pool.acquire(make_request("/"), sink);
    chain.run(&mut ctx).await.unwrap();

    assert_eq!(ctx.res().body(), b"eu-west");
}
