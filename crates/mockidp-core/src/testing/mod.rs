//! Testing utilities for suites that run against the mock server.
//!
//! # Example
//!
//! ```ignore
//! use mockidp_core::testing::ScenarioClient;
//!
//! #[tokio::test]
//! async fn test_refresh_session() {
//!     let client = ScenarioClient::new("http://127.0.0.1:3000").describe("refresh session");
//!     let resp = client.post("/api/v1/sessions/me/lifecycle/refresh").send().await.unwrap();
//!     assert_eq!(resp.status(), 200);
//! }
//! ```

pub mod scenario;

pub use scenario::ScenarioClient;
