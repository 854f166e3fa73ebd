use base64::Engine as _;
use image::{ImageFormat, Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{json, Value};
use sketch2real::{
    ai::{MockDescriptionClient, MockImageSynthesisClient},
    app::{App, AppServices},
    models::{Config, Style},
    sketch::SKETCH_SIZE,
    web,
};
use std::io::Cursor;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_DESCRIPTION: &str = "A sailboat on calm water beneath two birds";

fn canvas_data_url(canvas: &RgbaImage) -> String {
    let mut bytes = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

fn blank_canvas() -> RgbaImage {
    RgbaImage::from_pixel(SKETCH_SIZE, SKETCH_SIZE, Rgba([255, 255, 255, 255]))
}

fn drawn_canvas() -> RgbaImage {
    let mut canvas = blank_canvas();
    for i in 100..400 {
        canvas.put_pixel(i, i, Rgba([0, 0, 0, 255]));
    }
    canvas
}

fn fake_webp() -> Vec<u8> {
    vec![
        0x52, 0x49, 0x46, 0x46, 0x1A, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50, 0x56, 0x50, 0x38,
        0x4C,
    ]
}

async fn start_server(app: App) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, web::router(Arc::new(app)))
            .await
            .ok();
    });
    format!("http://{}", addr)
}

fn mock_app(describer: MockDescriptionClient, synthesizer: MockImageSynthesisClient) -> App {
    App::with_services(AppServices {
        describer: Box::new(describer),
        synthesizer: Box::new(synthesizer),
    })
}

async fn post_generate(base: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{}/api/generate", base))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_index_page_has_canvas_and_controls() {
    let base = start_server(mock_app(
        MockDescriptionClient::new(),
        MockImageSynthesisClient::new(),
    ))
    .await;

    let response = reqwest::get(format!("{}/", base)).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let html = response.text().await.unwrap();

    assert!(html.contains("<canvas id=\"canvas\" width=\"512\" height=\"512\""));
    assert!(html.contains("Generate Image"));
    assert!(html.contains("/api/generate"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let base = start_server(mock_app(
        MockDescriptionClient::new(),
        MockImageSynthesisClient::new(),
    ))
    .await;

    let body = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_styles_endpoint_lists_all_ten() {
    let base = start_server(mock_app(
        MockDescriptionClient::new(),
        MockImageSynthesisClient::new(),
    ))
    .await;

    let styles: Vec<String> = reqwest::get(format!("{}/api/styles", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(styles.len(), 10);
    assert_eq!(
        styles,
        Style::labels()
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_blank_canvas_warns_without_calling_providers() {
    let describer = MockDescriptionClient::new();
    let synthesizer = MockImageSynthesisClient::new();
    let base = start_server(mock_app(describer.clone(), synthesizer.clone())).await;

    let (status, reply) = post_generate(
        &base,
        json!({ "sketch": canvas_data_url(&blank_canvas()), "style": "Anime" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(
        reply,
        json!({
            "status": "nothing_drawn",
            "message": "Please draw something on the canvas first!"
        })
    );
    assert_eq!(describer.get_call_count(), 0);
    assert_eq!(synthesizer.get_call_count(), 0);
}

#[tokio::test]
async fn test_drawn_canvas_generates_image() {
    let describer = MockDescriptionClient::new().with_description(TEST_DESCRIPTION.to_string());
    let synthesizer = MockImageSynthesisClient::new().with_image_response(fake_webp());
    let base = start_server(mock_app(describer.clone(), synthesizer.clone())).await;

    let (status, reply) = post_generate(
        &base,
        json!({ "sketch": canvas_data_url(&drawn_canvas()), "style": "Impressionist" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(reply["status"], "generated");
    assert_eq!(reply["message"], "Image generated successfully!");
    assert_eq!(reply["description"], TEST_DESCRIPTION);
    assert_eq!(
        reply["prompt"],
        format!("{}, Style: Impressionist", TEST_DESCRIPTION)
    );

    let image = reply["image"].as_str().unwrap();
    let payload = image.strip_prefix("data:image/webp;base64,").unwrap();
    assert_eq!(
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .unwrap(),
        fake_webp()
    );
    assert_eq!(describer.get_call_count(), 1);
    assert_eq!(synthesizer.get_call_count(), 1);
}

#[tokio::test]
async fn test_missing_style_uses_default() {
    let synthesizer = MockImageSynthesisClient::new();
    let base = start_server(mock_app(
        MockDescriptionClient::new().with_description(TEST_DESCRIPTION.to_string()),
        synthesizer.clone(),
    ))
    .await;

    let (status, _) =
        post_generate(&base, json!({ "sketch": canvas_data_url(&drawn_canvas()) })).await;

    assert_eq!(status, 200);
    assert_eq!(
        synthesizer.received_prompts(),
        vec![format!("{}, Style: Photorealistic", TEST_DESCRIPTION)]
    );
}

#[tokio::test]
async fn test_unknown_style_is_rejected() {
    let describer = MockDescriptionClient::new();
    let base = start_server(mock_app(describer.clone(), MockImageSynthesisClient::new())).await;

    let (status, reply) = post_generate(
        &base,
        json!({ "sketch": canvas_data_url(&drawn_canvas()), "style": "Cubism" }),
    )
    .await;

    assert_eq!(status, 400);
    assert!(reply["error"].as_str().unwrap().contains("Cubism"));
    assert_eq!(describer.get_call_count(), 0);
}

#[tokio::test]
async fn test_missing_sketch_field_is_rejected_as_json() {
    let describer = MockDescriptionClient::new();
    let base = start_server(mock_app(describer.clone(), MockImageSynthesisClient::new())).await;

    let (status, reply) = post_generate(&base, json!({ "style": "Anime" })).await;

    assert_eq!(status, 400);
    let message = reply["error"].as_str().unwrap();
    assert!(message.contains("Invalid request"));
    assert!(message.contains("sketch"));
    assert_eq!(describer.get_call_count(), 0);
}

#[tokio::test]
async fn test_non_json_body_is_rejected_as_json() {
    let base = start_server(mock_app(
        MockDescriptionClient::new(),
        MockImageSynthesisClient::new(),
    ))
    .await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/generate", base))
        .header("Content-Type", "application/json")
        .body("not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let reply: Value = response.json().await.unwrap();
    assert!(reply["error"].as_str().unwrap().starts_with("Invalid request"));
}

#[tokio::test]
async fn test_wrong_canvas_size_is_rejected() {
    let describer = MockDescriptionClient::new();
    let base = start_server(mock_app(describer.clone(), MockImageSynthesisClient::new())).await;

    let small = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 255]));
    let (status, reply) = post_generate(
        &base,
        json!({ "sketch": canvas_data_url(&small), "style": "Anime" }),
    )
    .await;

    assert_eq!(status, 400);
    assert!(reply["error"].as_str().unwrap().contains("Invalid sketch"));
    assert_eq!(describer.get_call_count(), 0);
}

#[tokio::test]
async fn test_description_failure_is_a_gateway_error() {
    let synthesizer = MockImageSynthesisClient::new();
    let base = start_server(mock_app(
        MockDescriptionClient::new().with_failure("Error in API call: quota".to_string()),
        synthesizer.clone(),
    ))
    .await;

    let (status, reply) = post_generate(
        &base,
        json!({ "sketch": canvas_data_url(&drawn_canvas()), "style": "Anime" }),
    )
    .await;

    assert_eq!(status, 502);
    assert!(reply["error"].as_str().unwrap().contains("quota"));
    assert_eq!(synthesizer.get_call_count(), 0);
}

#[tokio::test]
async fn test_synthesis_failure_reverts_to_placeholder() {
    let base = start_server(mock_app(
        MockDescriptionClient::new().with_description(TEST_DESCRIPTION.to_string()),
        MockImageSynthesisClient::new().with_failure("insufficient credits".to_string()),
    ))
    .await;

    let (status, reply) = post_generate(
        &base,
        json!({ "sketch": canvas_data_url(&drawn_canvas()), "style": "Comic book" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(reply["status"], "synthesis_failed");
    assert!(reply["message"]
        .as_str()
        .unwrap()
        .starts_with("Error generating image:"));
    assert!(reply["message"]
        .as_str()
        .unwrap()
        .contains("insufficient credits"));
    assert_eq!(
        reply["prompt"],
        format!("{}, Style: Comic book", TEST_DESCRIPTION)
    );
    assert!(reply.get("image").is_none());
}

/// Full stack against mocked provider endpoints, wired through `Config`.
#[tokio::test]
async fn test_end_to_end_with_mocked_providers() {
    let openai = MockServer::start().await;
    let stability = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": { "role": "assistant", "content": format!("  {}  ", TEST_DESCRIPTION) },
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&openai)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2beta/stable-image/control/sketch"))
        .and(header("Authorization", "Bearer st-test"))
        .and(header("Accept", "image/*"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(fake_webp()))
        .expect(1)
        .mount(&stability)
        .await;

    let config = Config {
        openai_api_key: SecretString::from("sk-test".to_string()),
        stability_api_key: SecretString::from("st-test".to_string()),
        openai_model: "gpt-4o".to_string(),
        openai_base_url: openai.uri(),
        stability_base_url: stability.uri(),
    };
    let base = start_server(App::from_config(&config)).await;

    let (status, reply) = post_generate(
        &base,
        json!({ "sketch": canvas_data_url(&drawn_canvas()), "style": "Watercolor" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(reply["status"], "generated");
    assert_eq!(reply["description"], TEST_DESCRIPTION);

    let requests = stability.received_requests().await.unwrap();
    let form = String::from_utf8_lossy(&requests[0].body);
    assert!(form.contains(&format!("{}, Style: Watercolor", TEST_DESCRIPTION)));
    assert!(form.contains("0.7"));
}

#[tokio::test]
async fn test_end_to_end_stability_error_is_shown() {
    let openai = MockServer::start().await;
    let stability = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": { "role": "assistant", "content": TEST_DESCRIPTION },
                "finish_reason": "stop"
            }]
        })))
        .mount(&openai)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2beta/stable-image/control/sketch"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "name": "payment_required",
            "errors": ["lacking sufficient credits"]
        })))
        .mount(&stability)
        .await;

    let config = Config {
        openai_api_key: SecretString::from("sk-test".to_string()),
        stability_api_key: SecretString::from("st-test".to_string()),
        openai_model: "gpt-4o".to_string(),
        openai_base_url: openai.uri(),
        stability_base_url: stability.uri(),
    };
    let base = start_server(App::from_config(&config)).await;

    let (status, reply) = post_generate(
        &base,
        json!({ "sketch": canvas_data_url(&drawn_canvas()), "style": "Anime" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(reply["status"], "synthesis_failed");
    let message = reply["message"].as_str().unwrap();
    assert!(message.contains("402"));
    assert!(message.contains("payment_required"));
}
