use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sumika::adapters::{ChatState, SlidingWindowLimiter};
use sumika::agents::{AgentTurn, ChatAgent, ConversationRegistry, RunKey};
use sumika::chat::{AgentSet, ChatPipeline, PinStore};
use sumika::domain::{Pin, APP_NAME};
use tower::util::ServiceExt;

/// Scripted agent honoring the invocation contract: marks the registry,
/// enqueues its pins, replies with fixed text.
struct Scripted {
    name: &'static str,
    reply: &'static str,
    pins_to_drop: Vec<Pin>,
    pins: Arc<PinStore>,
    registry: Arc<ConversationRegistry>,
}

#[async_trait]
impl ChatAgent for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    async fn invoke(&self, _message: &str, user_id: &str, session_id: &str) -> AgentTurn {
        let key = RunKey::new(APP_NAME, user_id, session_id);
        if !self.registry.exists(&key).await {
            self.registry.mark(key).await;
        }
        for pin in &self.pins_to_drop {
            self.pins.enqueue(user_id, pin.clone()).await;
        }
        AgentTurn::new(vec![self.reply.to_string()])
    }
}

fn test_state(limiter: SlidingWindowLimiter) -> ChatState {
    let pins = Arc::new(PinStore::new());
    let registry = Arc::new(ConversationRegistry::new());

    let scripted = |name: &'static str, reply: &'static str, pins_to_drop: Vec<Pin>| -> Arc<dyn ChatAgent> {
        Arc::new(Scripted {
            name,
            reply,
            pins_to_drop,
            pins: pins.clone(),
            registry: registry.clone(),
        })
    };

    let agents = AgentSet {
        locate: scripted(
            "locate",
            "新宿駅を表示しました",
            vec![Pin::new(35.69, 139.70, "新宿駅")],
        ),
        suggest: scripted("suggest", "候補は中野駅です", vec![]),
        pin_suggestions: scripted(
            "pin_suggestions",
            "候補駅を表示しました",
            vec![Pin::new(35.70, 139.66, "中野駅")],
        ),
        reports: vec![
            scripted("report1", "中野駅の報告", vec![]),
            scripted("report2", "出力無", vec![]),
        ],
        followup: scripted("followup", "他に知りたいことはありますか？", vec![]),
        general: scripted("general", "追加の調査結果です", vec![]),
    };

    ChatState {
        pipeline: Arc::new(ChatPipeline::new(agents, pins, registry)),
        limiter: Arc::new(limiter),
    }
}

fn default_state() -> ChatState {
    test_state(SlidingWindowLimiter::new(10, Duration::from_secs(60)))
}

fn chat_request(message: &str, session_id: &str) -> Request<Body> {
    Request::builder()
        .uri("/api/v1/chat")
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({ "message": message, "session_id": session_id }).to_string(),
        ))
        .unwrap()
}

async fn body_json(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Decodes the `data:` payloads of a finished SSE body.
async fn read_events(body: Body) -> Vec<Value> {
    let bytes = body.collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    text.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|payload| serde_json::from_str(payload).unwrap())
        .collect()
}

fn messages(events: &[Value]) -> Vec<&str> {
    events
        .iter()
        .filter(|e| e["type"] == "agent_response")
        .map(|e| e["message"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn first_turn_streams_pins_and_replies_in_order() {
    let app = sumika::create_app(default_state());

    let response = app
        .oneshot(chat_request("新宿駅に通勤しています", "sess-flow"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));
    assert_eq!(response.headers()["x-accel-buffering"], "no");

    let events = read_events(response.into_body()).await;

    // First event is the workplace pin, emitted before the locate reply.
    assert_eq!(events[0]["type"], "pin");
    assert_eq!(events[0]["name"], "新宿駅");
    assert_eq!(events[1]["type"], "agent_response");
    assert_eq!(events[1]["agent"], "real_estate_response");
    assert_eq!(events[1]["agent_name"], "不動産エージェント");
    assert_eq!(events[1]["round"], 0);

    // The second report slot replied with the no-report marker, so only one
    // report message appears.
    assert_eq!(
        messages(&events),
        vec![
            "新宿駅を表示しました",
            "候補は中野駅です",
            "候補駅を表示しました",
            "中野駅の報告",
            "他に知りたいことはありますか？",
        ]
    );
}

#[tokio::test]
async fn second_request_in_session_takes_continuation_branch() {
    let app = sumika::create_app(default_state());

    let response = app
        .clone()
        .oneshot(chat_request("新宿駅に通勤しています", "sess-cont"))
        .await
        .unwrap();
    read_events(response.into_body()).await;

    let response = app
        .oneshot(chat_request("家賃の相場は？", "sess-cont"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let events = read_events(response.into_body()).await;
    assert_eq!(messages(&events), vec!["追加の調査結果です"]);
}

#[tokio::test]
async fn blank_message_is_rejected_before_streaming() {
    let app = sumika::create_app(default_state());

    let response = app
        .oneshot(chat_request("   ", "sess-invalid"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response.into_body()).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn session_id_with_separators_is_rejected() {
    let app = sumika::create_app(default_state());

    let response = app
        .oneshot(chat_request("新宿駅に通勤しています", "sess/../etc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn over_limit_request_gets_429() {
    let app = sumika::create_app(test_state(SlidingWindowLimiter::new(
        1,
        Duration::from_secs(60),
    )));

    let response = app
        .clone()
        .oneshot(chat_request("新宿駅に通勤しています", "sess-rl"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    read_events(response.into_body()).await;

    let response = app
        .oneshot(chat_request("もう一度", "sess-rl"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let body = body_json(response.into_body()).await;
    assert_eq!(body["error"], "Rate limit exceeded");
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let app = sumika::create_app(default_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response.into_body()).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].as_str().is_some());
}
