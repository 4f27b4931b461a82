//! Control-channel protocol benchmarks
//!
//! Run with: cargo bench
//! Or for specific benchmarks: cargo bench -- <filter>

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use serde_json::json;
use std::time::Duration;
use waav_voice_client::core::realtime::{
    ClientEvent, ConversationItem, ServerEvent, SessionConfig, SessionSettings,
};
use waav_voice_client::core::tools::{SEARCH_HOSPITAL, SearchHospitalTool, ToolHandler, ToolOutcome};

/// Benchmark decoding of inbound frames
fn bench_server_event_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("server_event_decoding");
    group.measurement_time(Duration::from_secs(5));

    let text_delta = r#"{"type":"response.text.delta","event_id":"evt_1","response_id":"resp_1","item_id":"item_1","output_index":0,"content_index":0,"delta":"Hello"}"#.to_string();

    let function_call = json!({
        "type": "response.function_call_arguments.done",
        "event_id": "evt_2",
        "response_id": "resp_1",
        "item_id": "item_2",
        "output_index": 0,
        "call_id": "call_1",
        "name": SEARCH_HOSPITAL,
        "arguments": "{\"query\":\"cardiology\"}"
    })
    .to_string();

    // Response with a long audio transcript
    let response_done = json!({
        "type": "response.done",
        "response": {
            "id": "resp_1",
            "status": "completed",
            "output": [{
                "type": "message",
                "role": "assistant",
                "content": [
                    {"type": "text", "text": "Visiting hours are 9 to 5. ".repeat(20)},
                    {"type": "audio", "transcript": "Visiting hours are nine to five. ".repeat(20)}
                ]
            }]
        }
    })
    .to_string();

    // Event type the client does not interpret
    let unknown = r#"{"type":"rate_limits.updated","rate_limits":[{"name":"requests","limit":100,"remaining":99}]}"#.to_string();

    for (name, frame) in [
        ("text_delta", &text_delta),
        ("function_call", &function_call),
        ("response_done", &response_done),
        ("unknown", &unknown),
    ] {
        group.throughput(Throughput::Bytes(frame.len() as u64));
        group.bench_with_input(BenchmarkId::new(name, frame.len()), frame, |b, frame| {
            b.iter(|| {
                let _ = ServerEvent::decode(black_box(frame));
            });
        });
    }

    group.finish();
}

/// Benchmark encoding of outbound frames
fn bench_client_event_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("client_event_encoding");

    let tool = SearchHospitalTool::new(
        reqwest::Client::new(),
        url::Url::parse("http://localhost:8813/api/search").unwrap(),
    );
    let initial = ClientEvent::SessionUpdate {
        session: SessionConfig::initial(&SessionSettings::default(), vec![tool.definition()]),
    };
    group.bench_function("initial_session_update", |b| {
        b.iter(|| black_box(&initial).to_frame())
    });

    let user_text = ClientEvent::ConversationItemCreate {
        item: ConversationItem::user_text("What are the visiting hours for cardiology?"),
    };
    group.bench_function("user_text", |b| b.iter(|| black_box(&user_text).to_frame()));

    let outcome = ToolOutcome::success().with(
        "results",
        json!((0..10)
            .map(|i| json!({"title": format!("Result {}", i), "score": 0.9}))
            .collect::<Vec<_>>()),
    );
    group.bench_function("function_call_output", |b| {
        b.iter(|| {
            let output = black_box(&outcome).to_output().unwrap();
            ClientEvent::ConversationItemCreate {
                item: ConversationItem::function_call_output("call_1", output),
            }
            .to_frame()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_server_event_decoding,
    bench_client_event_encoding
);
criterion_main!(benches);
