use std::sync::Arc;
use std::time::Duration;

use crow_assistants::{MessageRole, OpenAiAssistantsClient, OpenAiAssistantsConfig};
use crow_gateway::{build_gateway_router, AssistantIds, GatewayState};
use crow_groupme::{GroupMeConfig, GroupMeNotifier};
use crow_relay::{AssistantRelay, RelayConfig, SeededRoll, SqliteThreadStore, ThreadStore};
use httpmock::prelude::*;
use serde_json::{json, Value};
use tempfile::tempdir;
use tokio::net::TcpListener;

const THREAD_ID: &str = "thread_abc";

fn text_message(id: &str, role: &str, created_at: i64, text: &str) -> Value {
    json!({
        "id": id,
        "object": "thread.message",
        "thread_id": THREAD_ID,
        "role": role,
        "created_at": created_at,
        "content": [{"type": "text", "text": {"value": text, "annotations": []}}],
    })
}

fn run_body(status: &str) -> Value {
    json!({
        "id": "run_1",
        "object": "thread.run",
        "thread_id": THREAD_ID,
        "assistant_id": "asst_chat",
        "status": status,
        "created_at": 2,
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn group_message_is_answered_and_posted_back() {
    let openai = MockServer::start_async().await;
    let groupme = MockServer::start_async().await;
    let workspace = tempdir().expect("tempdir");
    let store_path = workspace.path().join("crowfather.sqlite");

    let create_thread = openai.mock(|when, then| {
        when.method(POST).path("/v1/threads");
        then.status(200)
            .json_body(json!({"id": THREAD_ID, "object": "thread", "created_at": 1}));
    });
    let create_message = openai.mock(|when, then| {
        when.method(POST)
            .path(format!("/v1/threads/{THREAD_ID}/messages"))
            .json_body(json!({"role": "user", "content": "what time is it?"}));
        then.status(200)
            .json_body(text_message("msg_user", "user", 1, "what time is it?"));
    });
    let create_run = openai.mock(|when, then| {
        when.method(POST)
            .path(format!("/v1/threads/{THREAD_ID}/runs"))
            .json_body(json!({"assistant_id": "asst_chat"}));
        then.status(200).json_body(run_body("queued"));
    });
    let mut in_progress = openai.mock(|when, then| {
        when.method(GET)
            .path(format!("/v1/threads/{THREAD_ID}/runs/run_1"));
        then.status(200).json_body(run_body("in_progress"));
    });
    let list_messages = openai.mock(|when, then| {
        when.method(GET)
            .path(format!("/v1/threads/{THREAD_ID}/messages"))
            .query_param("before", "msg_user")
            .query_param("order", "desc")
            .query_param("limit", "20");
        then.status(200).json_body(json!({
            "object": "list",
            "data": [text_message("msg_reply", "assistant", 3, "It's 3 PM.\n\n")],
            "first_id": "msg_reply",
            "last_id": "msg_reply",
            "has_more": false,
        }));
    });
    let post_reply = groupme.mock(|when, then| {
        when.method(POST)
            .path("/v3/bots/post")
            .header("authorization", "groupme-token")
            .json_body(json!({"bot_id": "bot-123", "text": "@Bob It's 3 PM."}));
        then.status(202);
    });

    let client = OpenAiAssistantsClient::new(OpenAiAssistantsConfig {
        api_base: format!("{}/v1", openai.base_url()),
        api_key: "sk-test".to_string(),
        organization: None,
        request_timeout_ms: 5_000,
    })
    .expect("assistants client");
    let store = Arc::new(SqliteThreadStore::new(&store_path).expect("sqlite store"));
    let relay = AssistantRelay::new(
        Arc::new(client),
        store.clone(),
        Arc::new(SeededRoll::new(7)),
        RelayConfig {
            response_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(300),
            spontaneous_range: 0,
            ..RelayConfig::default()
        },
    )
    .expect("relay");
    let notifier = GroupMeNotifier::new(GroupMeConfig {
        api_base: groupme.base_url(),
        bot_id: "bot-123".to_string(),
        bot_token: "groupme-token".to_string(),
        timeout_ms: 5_000,
    })
    .expect("notifier");
    let state = Arc::new(GatewayState::new(
        Arc::new(relay),
        Arc::new(notifier),
        "gateway-secret",
        AssistantIds {
            chat: "asst_chat".to_string(),
            test: "asst_test".to_string(),
            meltdown: "asst_meltdown".to_string(),
        },
    ));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, build_gateway_router(state)).await;
    });

    let request = tokio::spawn(async move {
        reqwest::Client::new()
            .post(format!("http://{addr}/message"))
            .json(&json!({
                "attachments": [],
                "avatar_url": "",
                "created_at": 1302623328,
                "group_id": "group-42",
                "id": "1234567890",
                "name": "Bob",
                "sender_id": "12345",
                "sender_type": "user",
                "source_guid": "GUID",
                "system": false,
                "text": "hey crowfather, what time is it?",
                "user_id": "7",
            }))
            .send()
            .await
            .expect("send callback")
    });

    // Flip the run to completed once the first in-progress status was observed.
    while in_progress.calls_async().await == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    in_progress.delete_async().await;
    let completed = openai.mock(|when, then| {
        when.method(GET)
            .path(format!("/v1/threads/{THREAD_ID}/runs/run_1"));
        then.status(200).json_body(run_body("completed"));
    });

    let response = request.await.expect("join request");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body, json!({"response": "It's 3 PM."}));

    create_thread.assert_calls(1);
    create_message.assert_calls(1);
    create_run.assert_calls(1);
    completed.assert_calls(1);
    list_messages.assert_calls(1);
    post_reply.assert_calls(1);

    assert_eq!(
        store.load_thread("group-42").await.expect("load"),
        Some(THREAD_ID.to_string())
    );
    let transcript = store.messages_for_thread(THREAD_ID).expect("transcript");
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].role, MessageRole::User);
    assert_eq!(transcript[0].content, "what time is it?");
    assert_eq!(transcript[1].role, MessageRole::Assistant);
    assert_eq!(transcript[1].content, "It's 3 PM.");

    server.abort();
}
