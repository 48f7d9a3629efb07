use fxconv::core::{ConversionClient, ConversionError, ConversionState, spawn_session};
use fxconv::providers::FrankfurterProvider;
use rust_decimal::Decimal;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const CURRENCIES: &str = r#"{"GBP": "British Pound", "USD": "US Dollar"}"#;

    pub async fn create_mock_server(latest: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/currencies"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CURRENCIES))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(latest)
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn write_config(base_url: &str) -> tempfile::NamedTempFile {
        let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        let config_content = format!(
            r#"
providers:
  frankfurter:
    base_url: {base_url}
debounce_ms: 20
request_timeout_secs: 5
"#
        );
        std::fs::write(config_file.path(), config_content).expect("Failed to write config file");
        config_file
    }
}

const DEBOUNCE: Duration = Duration::from_millis(50);

async fn wait_for_outcome(state: &mut watch::Receiver<ConversionState>) -> ConversionState {
    let outcome = tokio::time::timeout(
        Duration::from_secs(10),
        state.wait_for(|s| {
            matches!(
                s,
                ConversionState::Succeeded(_) | ConversionState::Failed { .. }
            )
        }),
    )
    .await
    .expect("Timed out waiting for conversion")
    .expect("Coordinator stopped");
    (*outcome).clone()
}

fn query_amounts(requests: &[wiremock::Request]) -> Vec<String> {
    requests
        .iter()
        .filter(|r| r.url.path() == "/latest")
        .filter_map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "amount")
                .map(|(_, v)| v.into_owned())
        })
        .collect()
}

#[test_log::test(tokio::test)]
async fn test_round_trip_through_coordinator() {
    let mock_server = test_utils::create_mock_server(
        wiremock::ResponseTemplate::new(200)
            .set_body_string(r#"{"amount": 10.0, "base": "GBP", "date": "2024-03-15", "rates": {"USD": 12.5}}"#),
    )
    .await;
    let client = Arc::new(FrankfurterProvider::new(&mock_server.uri(), None).unwrap());
    let (mut input, mut state, _handle) = spawn_session(client, DEBOUNCE);

    input.set_amount("10");
    input.set_source("GBP");
    input.set_target("USD");

    match wait_for_outcome(&mut state).await {
        ConversionState::Succeeded(result) => {
            info!(?result, "Conversion succeeded");
            assert_eq!(result.amount, Decimal::from(10));
            assert_eq!(result.source, "GBP");
            assert_eq!(result.target, "USD");
            assert_eq!(result.converted, Decimal::new(125, 1));
        }
        other => panic!("Expected Succeeded, got {other:?}"),
    }

    let requests = mock_server.received_requests().await.unwrap();
    let latest: Vec<_> = requests.iter().filter(|r| r.url.path() == "/latest").collect();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].url.query(), Some("amount=10&from=GBP&to=USD"));
}

#[test_log::test(tokio::test)]
async fn test_burst_sends_only_last_amount() {
    let mock_server = test_utils::create_mock_server(
        wiremock::ResponseTemplate::new(200).set_body_string(r#"{"rates": {"USD": 153.75}}"#),
    )
    .await;
    let client = Arc::new(FrankfurterProvider::new(&mock_server.uri(), None).unwrap());
    let (mut input, mut state, _handle) = spawn_session(client, Duration::from_millis(200));

    input.set_source("GBP");
    input.set_target("USD");
    input.set_amount("1");
    input.set_amount("12");
    input.set_amount("123");

    let outcome = wait_for_outcome(&mut state).await;
    assert!(matches!(outcome, ConversionState::Succeeded(_)));

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(query_amounts(&requests), vec!["123".to_string()]);
}

#[test_log::test(tokio::test)]
async fn test_server_error_then_recovery() {
    let mock_server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/latest"))
        .and(wiremock::matchers::query_param("amount", "10"))
        .respond_with(wiremock::ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/latest"))
        .and(wiremock::matchers::query_param("amount", "20"))
        .respond_with(
            wiremock::ResponseTemplate::new(200).set_body_string(r#"{"rates": {"USD": 25}}"#),
        )
        .mount(&mock_server)
        .await;

    let client = Arc::new(FrankfurterProvider::new(&mock_server.uri(), None).unwrap());
    let (mut input, mut state, _handle) = spawn_session(client, DEBOUNCE);

    input.set_amount("10");
    input.set_source("GBP");
    input.set_target("USD");
    match wait_for_outcome(&mut state).await {
        ConversionState::Failed { error, .. } => {
            assert!(matches!(error, ConversionError::Network(_)));
        }
        other => panic!("Expected Failed, got {other:?}"),
    }

    input.set_amount("20");
    state
        .wait_for(|s| s.is_pending())
        .await
        .expect("Coordinator stopped");
    match wait_for_outcome(&mut state).await {
        ConversionState::Succeeded(result) => assert_eq!(result.converted, Decimal::from(25)),
        other => panic!("Expected Succeeded, got {other:?}"),
    }
}

#[test_log::test(tokio::test)]
async fn test_missing_rate_is_distinct_from_transport_failure() {
    let mock_server = test_utils::create_mock_server(
        wiremock::ResponseTemplate::new(200).set_body_string(r#"{"rates": {}}"#),
    )
    .await;
    let client: Arc<dyn ConversionClient> =
        Arc::new(FrankfurterProvider::new(&mock_server.uri(), None).unwrap());
    let (mut input, mut state, _handle) = spawn_session(client, DEBOUNCE);

    input.set_amount("10");
    input.set_source("GBP");
    input.set_target("USD");

    match wait_for_outcome(&mut state).await {
        ConversionState::Failed { request, error } => {
            assert_eq!(error, ConversionError::MissingRateForTarget("USD".to_string()));
            assert_eq!(request.amount, Decimal::from(10));
        }
        other => panic!("Expected Failed, got {other:?}"),
    }
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock() {
    let mock_server = test_utils::create_mock_server(
        wiremock::ResponseTemplate::new(200).set_body_string(r#"{"rates": {"USD": 12.5}}"#),
    )
    .await;
    let config_file = test_utils::write_config(&mock_server.uri());
    let config_path = config_file.path().to_str().unwrap();

    let result = fxconv::run_command(fxconv::AppCommand::Currencies, Some(config_path)).await;
    assert!(result.is_ok(), "Currencies failed with: {:?}", result.err());

    let result = fxconv::run_command(
        fxconv::AppCommand::Convert {
            amount: "10".to_string(),
            from: "GBP".to_string(),
            to: "USD".to_string(),
        },
        Some(config_path),
    )
    .await;
    assert!(result.is_ok(), "Convert failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_reports_failures() {
    let mock_server = wiremock::MockServer::start().await;
    let config_file = test_utils::write_config(&mock_server.uri());
    let config_path = config_file.path().to_str().unwrap();

    // Nothing mounted: every endpoint answers 404.
    let result = fxconv::run_command(fxconv::AppCommand::Currencies, Some(config_path)).await;
    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("404"));

    let result = fxconv::run_command(
        fxconv::AppCommand::Convert {
            amount: "10".to_string(),
            from: "GBP".to_string(),
            to: "USD".to_string(),
        },
        Some(config_path),
    )
    .await;
    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn test_missing_config_file_is_an_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let missing = dir.path().join("absent.yaml");
    assert!(!missing.exists());

    let result = fxconv::run_command(
        fxconv::AppCommand::Currencies,
        Some(missing.to_str().unwrap()),
    )
    .await;
    assert!(result.unwrap_err().to_string().contains("Failed to read config file"));

    // Directory stays untouched.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test_log::test(tokio::test)]
#[ignore = "hits the public Frankfurter API"]
async fn test_real_frankfurter_api() {
    let client = Arc::new(
        FrankfurterProvider::new(
            fxconv::providers::frankfurter::DEFAULT_BASE_URL,
            Some(Duration::from_secs(10)),
        )
        .unwrap(),
    );
    let (mut input, mut state, _handle) = spawn_session(client, DEBOUNCE);
    input.set_amount("10");
    input.set_source("GBP");
    input.set_target("USD");

    match wait_for_outcome(&mut state).await {
        ConversionState::Succeeded(result) => {
            info!(?result, "Real API response");
            assert!(result.converted > Decimal::ZERO);
        }
        other => panic!("Currency conversion API request failed: {other:?}"),
    }
}
