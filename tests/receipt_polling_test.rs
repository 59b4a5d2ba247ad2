use grocery_saver::config::{ApiKey, ChatConfig, OcrConfig, SaverConfig};
use grocery_saver::core::transcriber::OcrTranscriber;
use grocery_saver::{DefaultEngine, SaverError, Transcriber};
use httpmock::prelude::*;

const ANALYZE_PATH: &str = "/vision/v3.2/read/analyze";
const RESULT_PATH: &str = "/vision/v3.2/read/analyzeResults/op-42";
const CHAT_PATH: &str = "/openai/deployments/grocery-gpt/chat/completions";

fn ocr_config(server: &MockServer, poll_attempts: u32) -> OcrConfig {
    OcrConfig {
        endpoint: server.base_url(),
        api_key: ApiKey::new("ocr-key"),
        poll_attempts,
        poll_interval_millis: 1,
        ..OcrConfig::default()
    }
}

fn mock_submit(server: &MockServer) -> httpmock::Mock<'_> {
    let location = server.url(RESULT_PATH);
    server.mock(|when, then| {
        when.method(POST)
            .path(ANALYZE_PATH)
            .header("ocp-apim-subscription-key", "ocr-key")
            .header("content-type", "application/octet-stream")
            .body("receipt-bytes");
        then.status(202).header("Operation-Location", location);
    })
}

fn mock_poll(server: &MockServer, body: serde_json::Value) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET)
            .path(RESULT_PATH)
            .header("ocp-apim-subscription-key", "ocr-key");
        then.status(200).json_body(body);
    })
}

fn succeeded_body() -> serde_json::Value {
    serde_json::json!({
        "status": "succeeded",
        "createdDateTime": "2024-05-01T10:00:00Z",
        "analyzeResult": {
            "version": "3.2.0",
            "readResults": [
                {"page": 1, "lines": [
                    {"text": "FRESH MART #12"},
                    {"text": "  "},
                    {"text": "MILK 1L   3.00"}
                ]},
                {"page": 2, "lines": [
                    {"text": "CHIPS     4.00 "},
                    {"text": "TOTAL     7.00"}
                ]}
            ]
        }
    })
}

#[tokio::test]
async fn test_transcribe_succeeds_on_first_poll() {
    let server = MockServer::start();
    let submit = mock_submit(&server);
    let poll = mock_poll(&server, succeeded_body());

    let transcriber = OcrTranscriber::new(ocr_config(&server, 60)).unwrap();
    let transcript = transcriber.transcribe(b"receipt-bytes").await.unwrap();

    submit.assert();
    poll.assert_hits(1);
    assert_eq!(transcript.attempts, 1);
    assert_eq!(
        transcript.text(),
        "FRESH MART #12\nMILK 1L   3.00\nCHIPS     4.00\nTOTAL     7.00"
    );
}

#[tokio::test]
async fn test_job_handle_from_response_body() {
    let server = MockServer::start();
    let location = server.url(RESULT_PATH);
    let submit = server.mock(|when, then| {
        when.method(POST).path(ANALYZE_PATH);
        then.status(200)
            .json_body(serde_json::json!({"operationLocation": location}));
    });
    let poll = mock_poll(&server, succeeded_body());

    let transcriber = OcrTranscriber::new(ocr_config(&server, 60)).unwrap();
    let transcript = transcriber.transcribe(b"receipt-bytes").await.unwrap();

    submit.assert();
    poll.assert_hits(1);
    assert_eq!(transcript.lines.len(), 4);
}

#[tokio::test]
async fn test_missing_job_handle_is_protocol_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(ANALYZE_PATH);
        then.status(202).json_body(serde_json::json!({}));
    });
    let poll = mock_poll(&server, succeeded_body());

    let transcriber = OcrTranscriber::new(ocr_config(&server, 60)).unwrap();
    let err = transcriber.transcribe(b"receipt-bytes").await.unwrap_err();

    match err {
        SaverError::Protocol { message } => assert_eq!(message, "no job handle returned"),
        other => panic!("expected Protocol, got {:?}", other),
    }
    poll.assert_hits(0);
}

#[tokio::test]
async fn test_submit_rejected() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(ANALYZE_PATH);
        then.status(400).json_body(serde_json::json!({
            "error": {"code": "InvalidImageFormat", "message": "Input data is not a valid image."}
        }));
    });

    let transcriber = OcrTranscriber::new(ocr_config(&server, 60)).unwrap();
    let err = transcriber.transcribe(b"receipt-bytes").await.unwrap_err();

    match err {
        SaverError::RemoteService { status, body, .. } => {
            assert_eq!(status, 400);
            assert!(body.contains("InvalidImageFormat"));
        }
        other => panic!("expected RemoteService, got {:?}", other),
    }
}

#[tokio::test]
async fn test_never_finishing_job_times_out_after_exact_attempts() {
    let server = MockServer::start();
    mock_submit(&server);
    let poll = mock_poll(&server, serde_json::json!({"status": "running"}));

    let transcriber = OcrTranscriber::new(ocr_config(&server, 5)).unwrap();
    let err = transcriber.transcribe(b"receipt-bytes").await.unwrap_err();

    assert!(matches!(err, SaverError::Timeout { attempts: 5 }));
    poll.assert_hits(5);
}

#[tokio::test]
async fn test_failed_job_stops_polling() {
    let server = MockServer::start();
    mock_submit(&server);
    let poll = mock_poll(&server, serde_json::json!({"status": "failed"}));

    let transcriber = OcrTranscriber::new(ocr_config(&server, 60)).unwrap();
    let err = transcriber.transcribe(b"receipt-bytes").await.unwrap_err();

    assert!(matches!(err, SaverError::JobFailed { attempts: 1 }));
    assert_eq!(err.user_friendly_message(), "OCR failed to process the receipt.");
    poll.assert_hits(1);
}

#[tokio::test]
async fn test_poll_with_garbage_body_is_malformed() {
    let server = MockServer::start();
    mock_submit(&server);
    server.mock(|when, then| {
        when.method(GET).path(RESULT_PATH);
        then.status(200).body("not json at all");
    });

    let transcriber = OcrTranscriber::new(ocr_config(&server, 60)).unwrap();
    let err = transcriber.transcribe(b"receipt-bytes").await.unwrap_err();

    assert!(matches!(err, SaverError::MalformedResponse { .. }));
    assert_eq!(err.raw_content(), Some("not json at all"));
}

#[tokio::test]
async fn test_empty_file_is_rejected_before_submission() {
    let server = MockServer::start();
    let submit = mock_submit(&server);

    let transcriber = OcrTranscriber::new(ocr_config(&server, 60)).unwrap();
    let err = transcriber.transcribe(b"").await.unwrap_err();

    assert!(matches!(err, SaverError::ValidationError { .. }));
    submit.assert_hits(0);
}

#[tokio::test]
async fn test_receipt_flow_end_to_end() {
    let server = MockServer::start();
    mock_submit(&server);
    mock_poll(&server, succeeded_body());

    let table = "Item - Quantity - Price\nMilk - 1 - 3\nChips - 1 - 4";
    let normalize_mock = server.mock(|when, then| {
        when.method(POST)
            .path(CHAT_PATH)
            .body_contains("formats receipt text")
            .body_contains("MILK 1L");
        then.status(200).json_body(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": table}}]
        }));
    });

    let classification = serde_json::json!({
        "essentials": [{"item": "Milk", "quantity": 1, "price": 3}],
        "non_essentials": [{"item": "Chips", "quantity": 1, "price": 4}],
        "suggestions": []
    })
    .to_string();
    let classify_mock = server.mock(|when, then| {
        when.method(POST)
            .path(CHAT_PATH)
            .body_contains("outputs JSON only")
            .body_contains("Milk - 1 - 3");
        then.status(200).json_body(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": classification}}]
        }));
    });

    let config = SaverConfig {
        chat: ChatConfig {
            endpoint: server.base_url(),
            deployment: "grocery-gpt".to_string(),
            api_key: ApiKey::new("chat-key"),
            ..ChatConfig::default()
        },
        ocr: ocr_config(&server, 60),
    };

    let engine = DefaultEngine::from_config(&config).unwrap();
    let receipt = engine.analyze_receipt(b"receipt-bytes").await.unwrap();

    normalize_mock.assert();
    classify_mock.assert();
    assert_eq!(receipt.normalized.as_deref(), Some(table));
    let analysis = receipt.analysis.unwrap();
    assert_eq!(analysis.summary.total, 7.0);
    assert_eq!(analysis.summary.non_essentials_total, 4.0);
}

#[tokio::test]
async fn test_blank_receipt_skips_chat_calls() {
    let server = MockServer::start();
    mock_submit(&server);
    mock_poll(
        &server,
        serde_json::json!({"status": "succeeded", "analyzeResult": {"readResults": [{"lines": []}]}}),
    );
    let chat_mock = server.mock(|when, then| {
        when.method(POST).path(CHAT_PATH);
        then.status(200).json_body(serde_json::json!({"choices": []}));
    });

    let config = SaverConfig {
        chat: ChatConfig {
            endpoint: server.base_url(),
            deployment: "grocery-gpt".to_string(),
            api_key: ApiKey::new("chat-key"),
            ..ChatConfig::default()
        },
        ocr: ocr_config(&server, 60),
    };

    let engine = DefaultEngine::from_config(&config).unwrap();
    let receipt = engine.analyze_receipt(b"receipt-bytes").await.unwrap();

    assert!(receipt.transcript.is_empty());
    assert!(receipt.analysis.is_none());
    chat_mock.assert_hits(0);
}
