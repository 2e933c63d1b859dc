//! Minimal service wired with all three problem surfaces.
//!
//! Run with `cargo run --example demo_server`, then try:
//!   curl -i localhost:3000/credit
//!   curl -i -H 'Accept: application/xml' localhost:3000/panic
//!   curl -i localhost:3000/signup

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Response,
    routing::get,
};

use problemkit_axum::{
    ApiResult, Dispatcher, Problem, ProblemError, catch_fault_middleware, problem_middleware,
};

async fn out_of_credit(State(d): State<Arc<Dispatcher>>) -> Response {
    let problem = Problem::new(
        StatusCode::FORBIDDEN,
        "You do not have enough credit.",
        "Your current balance is 30, but that costs 50.",
    )
    .with_type("https://example.com/probs/out-of-credit")
    .with_instance("/credit");
    d.response(None, &problem)
}

async fn signup(State(d): State<Arc<Dispatcher>>) -> ApiResult<()> {
    let mut errors = BTreeMap::new();
    errors.insert("email".to_owned(), vec!["Email is required".to_owned()]);
    Err(ProblemError::new(
        d.translator().validation_to_problem(&errors, None),
    ))
}

async fn unstable() -> Response {
    panic!("demo panic");
}

#[tokio::main]
async fn main() {
    let dispatcher = Arc::new(Dispatcher::default());
    let app = Router::new()
        .route("/credit", get(out_of_credit))
        .route("/signup", get(signup))
        .route("/panic", get(unstable))
        .layer(from_fn_with_state(dispatcher.clone(), problem_middleware))
        .layer(from_fn_with_state(
            dispatcher.clone(),
            catch_fault_middleware,
        ))
        .with_state(dispatcher);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000")
        .await
        .expect("failed to bind 127.0.0.1:3000");
    axum::serve(listener, app).await.expect("server error");
}
