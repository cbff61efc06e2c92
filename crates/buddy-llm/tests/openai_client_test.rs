use buddy_llm::{ChatClient, ChatRequest, Message, OpenAIClient, OpenAIConfig};

fn client_for(server: &mockito::ServerGuard) -> OpenAIClient {
    let config = OpenAIConfig::new("test-key").with_base_url(server.url());
    OpenAIClient::from_config(&config).unwrap()
}

#[tokio::test]
async fn test_chat_parses_first_choice() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "created": 0,
                "model": "gpt-3.5-turbo",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "Howdy!"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
            }"#,
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client
        .chat(ChatRequest::new("gpt-3.5-turbo", vec![Message::human("hi")]))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.content.as_deref(), Some("Howdy!"));
    assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    assert_eq!(response.usage.unwrap().total_tokens, 15);
}

#[tokio::test]
async fn test_quota_error_mentions_usage_limit() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_body(r#"{"error":{"message":"You exceeded your current quota","code":"insufficient_quota"}}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .chat(ChatRequest::new("gpt-4", vec![Message::human("hi")]))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("usage limit"));
}

#[tokio::test]
async fn test_other_errors_keep_status() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .chat(ChatRequest::new("gpt-4", vec![Message::human("hi")]))
        .await
        .unwrap_err();

    let text = err.to_string();
    assert!(text.contains("500"));
    assert!(!text.contains("usage limit"));
}
