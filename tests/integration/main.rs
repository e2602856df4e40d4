//! Integration tests for logroll.
//!
//! `rollup_test` drives a producer and a worker against the in-memory store
//! and queue and always runs. `localstack_test` talks to real S3 and SQS
//! endpoints through LocalStack and is marked `#[ignore]`.
//!
//! ## Running LocalStack Tests
//!
//! 1. Start LocalStack:
//!    ```bash
//!    docker run -d -p 4566:4566 localstack/localstack
//!    ```
//!
//! 2. Run the ignored tests:
//!    ```bash
//!    LOCALSTACK_ENDPOINT=http://localhost:4566 cargo test -p integration-tests -- --ignored
//!    ```

mod common;
mod localstack_test;
mod rollup_test;
