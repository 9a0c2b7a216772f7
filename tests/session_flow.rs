//! End-to-end submission flow: upload, live channel ingestion through the
//! SSE wire decoder, completion, and dataset/image pairing.

mod helpers;

use choromap_client::assets::{index_assets, pair_by_manifest, FileAsset};
use choromap_client::channel::{decode_frame, ChannelMessage, SseFrameDecoder};
use choromap_client::client::Backend;
use choromap_client::error::FailureKind;
use choromap_client::geo::build_datasets;
use choromap_client::models::progress::{StepStatus, PIPELINE_STAGES};
use choromap_client::models::record::manifest_file_names;
use choromap_client::models::session::{follow_channel, Session, SessionPhase};

use helpers::{FakeBackend, STATE_NAMES};

fn submitted_files() -> Vec<FileAsset> {
    vec![
        FileAsset::new("population.png", b"png-a".to_vec()),
        FileAsset::new("income.png", b"png-b".to_vec()),
    ]
}

/// Build the final SSE frame: 51 result rows (50 states + DC), a manifest
/// row, the fully completed progress track, and a success status.
fn final_frame() -> String {
    let mut rows: Vec<serde_json::Value> = STATE_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| {
            serde_json::json!({
                "State_Name": name,
                "Population (millions)": (i + 1) as f64 * 0.5,
                "Median Income (thousands)": 40.0 + i as f64,
            })
        })
        .collect();
    rows.push(serde_json::json!({
        "State_Name": "File_Name",
        "Population (millions)": "population.png",
        "Median Income (thousands)": "income.png",
    }));

    let progress: Vec<serde_json::Value> = PIPELINE_STAGES
        .iter()
        .enumerate()
        .map(|(i, label)| serde_json::json!({"step": i + 1, "label": label, "status": "completed"}))
        .collect();

    serde_json::json!({"Results": rows, "progress": progress, "status": "success"}).to_string()
}

/// Decode a raw SSE byte stream into channel messages, feeding the decoder
/// in small chunks the way a transport would.
fn decode_wire(wire: &[u8]) -> Vec<ChannelMessage> {
    let mut decoder = SseFrameDecoder::new();
    let mut messages = Vec::new();
    for chunk in wire.chunks(7) {
        for frame in decoder.push(chunk) {
            messages.extend(decode_frame(&frame));
        }
    }
    messages
}

#[tokio::test]
async fn submit_two_images_to_completion_with_out_of_order_progress() {
    let backend = FakeBackend::new("abc123");

    let mut session = Session::default();
    session.begin_submission(submitted_files()).unwrap();
    let session_id = backend.submit(session.assets()).await.unwrap();
    assert_eq!(session_id, "abc123");
    session.confirm_submission(&session_id);

    // Step 3 completes before step 2 in the pushed snapshot ordering; the
    // track must still come out ordered by step.
    let mut wire = Vec::new();
    wire.extend_from_slice(
        format!(
            "data: {}\n\n",
            serde_json::json!({"progress": [
                {"step": 3, "label": PIPELINE_STAGES[2], "status": "completed"},
                {"step": 1, "label": PIPELINE_STAGES[0], "status": "completed"},
                {"step": 2, "label": PIPELINE_STAGES[1], "status": "processing"},
                {"step": 4, "label": PIPELINE_STAGES[3], "status": "pending"},
                {"step": 5, "label": PIPELINE_STAGES[4], "status": "pending"},
                {"step": 6, "label": PIPELINE_STAGES[5], "status": "pending"},
            ]})
        )
        .as_bytes(),
    );
    wire.extend_from_slice(b": heartbeat\n\n");
    wire.extend_from_slice(format!("data: {}\n\n", final_frame()).as_bytes());

    let messages = decode_wire(&wire);
    follow_channel(&mut session, &session_id, futures::stream::iter(messages)).await;

    assert_eq!(session.phase(), SessionPhase::Completed);
    assert!(session
        .progress()
        .steps()
        .iter()
        .all(|s| s.status == StepStatus::Completed));

    let records = session.result_table().unwrap();
    assert_eq!(records.len(), 52); // 51 data rows + manifest

    let datasets = build_datasets(records).unwrap();
    assert_eq!(datasets.len(), 2);
    for dataset in &datasets {
        assert_eq!(dataset.locations.len(), 51);
        assert_eq!(dataset.values.len(), 51);
        assert_eq!(dataset.labels.len(), 51);
        assert!(dataset.is_renderable());
    }
    assert!(datasets[0].locations.contains(&"TX".to_string()));
    assert!(datasets[0].locations.contains(&"DC".to_string()));

    // Each map pairs with its originating picture by manifest order.
    let manifest = manifest_file_names(records);
    assert_eq!(manifest, vec!["population.png", "income.png"]);
    let index = index_assets(session.assets());
    let paired = pair_by_manifest(&manifest, &index);
    assert_eq!(paired[0].unwrap().bytes, b"png-a");
    assert_eq!(paired[1].unwrap().bytes, b"png-b");
}

#[test]
fn out_of_order_snapshot_intermediate_state_is_ordered() {
    let messages = decode_wire(
        format!(
            "data: {}\n\n",
            serde_json::json!({"progress": [
                {"step": 3, "label": PIPELINE_STAGES[2], "status": "completed"},
                {"step": 2, "label": PIPELINE_STAGES[1], "status": "processing"},
            ]})
        )
        .as_bytes(),
    );

    let mut session = Session::default();
    session.begin_submission(submitted_files()).unwrap();
    session.confirm_submission("abc123");
    for message in messages {
        session.apply("abc123", message);
    }

    let steps: Vec<u32> = session.progress().steps().iter().map(|s| s.step).collect();
    assert_eq!(steps, vec![2, 3]);
}

#[tokio::test]
async fn pipeline_failure_frame_ends_the_session_with_summary() {
    let wire = format!(
        "data: {}\n\n",
        serde_json::json!({
            "status": "fail",
            "Summary": "The legend could not be classified.",
            "Results": [{"State_Name": "Texas", "V": 1.0}],
        })
    );

    let mut session = Session::default();
    session.begin_submission(submitted_files()).unwrap();
    session.confirm_submission("abc123");
    follow_channel(
        &mut session,
        "abc123",
        futures::stream::iter(decode_wire(wire.as_bytes())),
    )
    .await;

    assert_eq!(session.phase(), SessionPhase::Failed(FailureKind::Pipeline));
    assert!(session.result_table().is_none());
    assert_eq!(session.summary(), Some("The legend could not be classified."));
}

#[tokio::test]
async fn all_missing_column_is_unrenderable_without_blocking_siblings() {
    let frame = serde_json::json!({
        "Results": [
            {"State_Name": "Texas", "Good": 3.0, "Bad": "N/A"},
            {"State_Name": "Ohio", "Good": 7.0, "Bad": "N/A"},
            {"State_Name": "File_Name", "Good": "good.png", "Bad": "bad.png"},
        ],
        "status": "success",
    })
    .to_string();

    let mut session = Session::default();
    session.begin_submission(submitted_files()).unwrap();
    session.confirm_submission("abc123");
    follow_channel(
        &mut session,
        "abc123",
        futures::stream::iter(decode_frame(&frame)),
    )
    .await;

    let datasets = build_datasets(session.result_table().unwrap()).unwrap();
    assert_eq!(datasets.len(), 2);
    assert!(datasets[0].is_renderable());
    assert_eq!(
        datasets[0].value_range,
        Some(choromap_client::geo::ValueRange { min: 3.0, max: 7.0 })
    );
    assert!(!datasets[1].is_renderable());
    assert!(datasets[1].values.iter().all(|v| v.is_nan()));
}

#[tokio::test]
async fn submit_rejection_fails_without_opening_a_channel() {
    let backend = FakeBackend {
        fail_submit: true,
        ..FakeBackend::new("abc123")
    };

    let mut session = Session::default();
    session.begin_submission(submitted_files()).unwrap();
    assert!(backend.submit(session.assets()).await.is_err());
    session.fail_submission();

    assert_eq!(session.phase(), SessionPhase::Failed(FailureKind::Upload));
    assert_eq!(backend.fetch_log.borrow().as_slice(), ["submit(2)"]);
}
