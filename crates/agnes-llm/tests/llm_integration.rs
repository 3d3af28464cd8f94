//! Integration tests that require a real LLM API
//!
//! These tests are marked with #[ignore] and require GEMINI_API_KEY.
//!
//! Run with: cargo test -p agnes-llm --test llm_integration -- --ignored

use agnes_llm::{GeminiProvider, LlmProvider, LlmRequest, ResilientProvider};

#[tokio::test]
#[ignore = "Requires GEMINI_API_KEY"]
async fn test_gemini_real_request() {
    let api_key = std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY must be set for this test");

    let provider = ResilientProvider::wrap(GeminiProvider::flash(&api_key));

    let request = LlmRequest::with_role(
        "You are a homeowner. Answer in one short sentence.",
        "A roofer says hail damaged your roof. React.",
    )
    .temperature(0.8)
    .max_tokens(60);

    let response = provider.complete(request).await;
    assert!(response.is_ok(), "Request should succeed: {:?}", response);

    let response = response.unwrap();
    assert!(!response.content.trim().is_empty(), "Response should have content");
    assert!(response.latency_ms > 0, "Should have latency recorded");

    println!("Gemini response: {}", response.content);
    println!("Tokens: {:?}", response.tokens_used);
}

#[tokio::test]
#[ignore = "Requires network access"]
async fn test_gemini_bad_key_is_request_failure() {
    let provider = GeminiProvider::flash("not-a-real-key");
    let result = provider.ask("hello").await;
    assert!(result.is_err());
}
