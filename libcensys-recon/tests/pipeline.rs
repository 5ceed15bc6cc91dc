use futures::StreamExt;
use libcensys_recon::{
    lookup, lookup_many, Credentials, FetchError, FetchResult, Lookup, Outcome, Recon, ReconConfig,
    DEFAULT_API_BASE_URL, DEFAULT_DOH_URL,
};
use std::{
    io,
    sync::{Arc, Mutex},
    time::Duration,
};
use tracing_subscriber::fmt::MakeWriter;
use wiremock::{
    matchers::{method, path, path_regex, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn recon_for(server: &MockServer, max_concurrent: usize) -> Recon {
    let config = ReconConfig {
        api_base_url: format!("{}/api/v2/hosts", server.uri()),
        doh_url: format!("{}/resolve", server.uri()),
        timeout: Duration::from_secs(5),
        max_concurrent,
        max_rate_per_second: None,
    };
    Recon::with_config(Credentials::new("id", "secret"), config).unwrap()
}

fn host_body(ip: &str) -> serde_json::Value {
    serde_json::json!({
        "code": 200,
        "status": "OK",
        "result": {
            "ip": ip,
            "services": [
                {"port": 443, "service_name": "HTTP"},
                {"port": 53, "service_name": "DNS"}
            ]
        }
    })
}

async fn run(recon: &Recon, inputs: &[&str]) -> Vec<FetchResult> {
    let inputs: Vec<String> = inputs.iter().map(|s| s.to_string()).collect();
    recon.recon_stream(inputs).collect().await
}

#[tokio::test]
async fn ip_target_skips_resolution() {
    let server = MockServer::start().await;
    Mock::given(path("/resolve"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/hosts/8.8.8.8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(host_body("8.8.8.8")))
        .expect(1)
        .mount(&server)
        .await;

    let results = run(&recon_for(&server, 5), &["8.8.8.8"]).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].input, "8.8.8.8");
    assert_eq!(results[0].ip.as_deref(), Some("8.8.8.8"));
    match &results[0].outcome {
        Outcome::Found { data } => assert_eq!(data.stats().open_ports, 2),
        other => panic!("expected host data, got {:?}", other),
    }
}

#[tokio::test]
async fn out_of_range_ip_never_touches_the_network() {
    let server = MockServer::start().await;

    let results = run(&recon_for(&server, 5), &["999.1.1.1"]).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].outcome.error(), Some(&FetchError::InvalidIp));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unresolvable_domain_settles_without_fetching() {
    let server = MockServer::start().await;
    Mock::given(path("/resolve"))
        .and(query_param("name", "nothing.invalid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"Status": 3})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path_regex(r"^/api/v2/hosts/.*$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let results = run(&recon_for(&server, 5), &["nothing.invalid"]).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].input, "nothing.invalid");
    assert_eq!(results[0].ip, None);
    assert_eq!(results[0].outcome.error(), Some(&FetchError::ResolutionFailed));
}

#[tokio::test]
async fn url_input_resolves_and_fans_out_per_a_record() {
    let server = MockServer::start().await;
    Mock::given(path("/resolve"))
        .and(query_param("name", "example.com"))
        .and(query_param("type", "A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Answer": [
                {"name": "example.com.", "type": 1, "data": "93.184.216.34"},
                {"name": "example.com.", "type": 1, "data": "93.184.216.35"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    for ip in ["93.184.216.34", "93.184.216.35"] {
        Mock::given(path(format!("/api/v2/hosts/{}", ip)))
            .respond_with(ResponseTemplate::new(200).set_body_json(host_body(ip)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut results = run(&recon_for(&server, 5), &["  https://example.com/login?next=/ "]).await;
    results.sort_by(|a, b| a.ip.cmp(&b.ip));

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.input == "example.com" && r.outcome.is_found()));
    assert_eq!(results[0].ip.as_deref(), Some("93.184.216.34"));
    assert_eq!(results[1].ip.as_deref(), Some("93.184.216.35"));
}

#[tokio::test]
async fn in_flight_fetches_never_exceed_the_gate() {
    let server = MockServer::start().await;
    Mock::given(path_regex(r"^/api/v2/hosts/10\.0\.0\.\d+$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(host_body("10.0.0.1"))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(12)
        .mount(&server)
        .await;

    let recon = recon_for(&server, 3);
    let inputs: Vec<String> = (1..=12).map(|n| format!("10.0.0.{}", n)).collect();
    let targets: Vec<&str> = inputs.iter().map(String::as_str).collect();

    let results = run(&recon, &targets).await;

    assert_eq!(results.len(), 12);
    assert!(results.iter().all(|r| r.outcome.is_found()));
    assert!(recon.gate().peak() <= 3, "peak was {}", recon.gate().peak());
    assert!(recon.gate().peak() >= 1);
    assert_eq!(recon.gate().in_flight(), 0);
}

#[tokio::test]
async fn one_failure_does_not_stop_the_rest() {
    let server = MockServer::start().await;
    let cases = [("1.1.1.1", 200), ("2.2.2.2", 404), ("3.3.3.3", 429), ("4.4.4.4", 401), ("5.5.5.5", 502)];
    for (ip, status) in cases {
        let template = if status == 200 {
            ResponseTemplate::new(200).set_body_json(host_body(ip))
        } else {
            ResponseTemplate::new(status)
        };
        Mock::given(path(format!("/api/v2/hosts/{}", ip)))
            .respond_with(template)
            .mount(&server)
            .await;
    }

    let mut results = run(
        &recon_for(&server, 2),
        &["1.1.1.1", "2.2.2.2", "3.3.3.3", "4.4.4.4", "5.5.5.5", "300.0.0.1"],
    )
    .await;
    results.sort_by(|a, b| a.input.cmp(&b.input));

    assert_eq!(results.len(), 6);
    assert!(results[0].outcome.is_found());
    assert_eq!(results[1].outcome.error(), Some(&FetchError::NotFound));
    assert_eq!(results[2].outcome.error(), Some(&FetchError::RateLimited));
    assert_eq!(results[3].outcome.error(), Some(&FetchError::InvalidIp));
    assert_eq!(results[4].outcome.error(), Some(&FetchError::Unauthorized));
    assert_eq!(results[5].outcome.error(), Some(&FetchError::Status(502)));
}

#[tokio::test]
async fn results_stream_in_completion_order() {
    let server = MockServer::start().await;
    Mock::given(path("/api/v2/hosts/7.7.7.7"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(host_body("7.7.7.7"))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;
    Mock::given(path("/api/v2/hosts/9.9.9.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(host_body("9.9.9.9")))
        .mount(&server)
        .await;

    let results = run(&recon_for(&server, 5), &["7.7.7.7", "9.9.9.9"]).await;

    assert_eq!(results[0].input, "9.9.9.9");
    assert_eq!(results[1].input, "7.7.7.7");
}

#[tokio::test]
async fn plan_keeps_input_order_and_duplicates() {
    let server = MockServer::start().await;
    Mock::given(path("/resolve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Answer": [
                {"type": 1, "data": "6.6.6.6"},
                {"type": 1, "data": "6.6.6.6"}
            ]
        })))
        .mount(&server)
        .await;

    let plan = recon_for(&server, 5)
        .plan(["8.8.8.8", "dup.example", "8.8.8.8", "256.0.0.0"])
        .await;

    assert_eq!(plan.len(), 5);
    assert!(matches!(&plan[0], Lookup::Fetch { ip, .. } if ip == "8.8.8.8"));
    assert!(matches!(&plan[1], Lookup::Fetch { input, ip } if input == "dup.example" && ip == "6.6.6.6"));
    assert!(matches!(&plan[2], Lookup::Fetch { ip, .. } if ip == "6.6.6.6"));
    assert!(matches!(&plan[3], Lookup::Fetch { ip, .. } if ip == "8.8.8.8"));
    assert!(matches!(&plan[4], Lookup::Settled(r) if r.outcome.error() == Some(&FetchError::InvalidIp)));
}

#[test]
fn results_serialize_for_ndjson() {
    let failed = FetchResult::failed("x.example", None, FetchError::ResolutionFailed);
    let json = serde_json::to_value(&failed).unwrap();

    assert_eq!(json["input"], "x.example");
    assert_eq!(json["ip"], serde_json::Value::Null);
    assert_eq!(json["status"], "failed");
    assert_eq!(json["error"], "Domain resolution failed");
}

#[tokio::test]
async fn one_shot_helpers_settle_malformed_ips_offline() {
    let single = lookup(Credentials::new("id", "secret"), "999.1.1.1").await.unwrap();
    assert_eq!(single.len(), 1);
    assert!(single[0].outcome.is_failed());
    assert_eq!(single[0].outcome.error(), Some(&FetchError::InvalidIp));

    let many = lookup_many(
        Credentials::new("id", "secret"),
        vec!["256.0.0.1".to_string(), " 1.2.3.999 ".to_string()],
    )
    .await
    .unwrap();
    assert_eq!(many.len(), 2);
    assert!(many.iter().all(|r| r.outcome.is_failed() && !r.outcome.is_found()));
}

#[test]
fn default_recon_targets_public_endpoints() {
    let recon = Recon::new(Credentials::new("id", "secret")).unwrap();

    assert_eq!(recon.config().api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(recon.config().doh_url, DEFAULT_DOH_URL);
    assert_eq!(recon.config().max_concurrent, 5);
    assert_eq!(recon.gate().capacity(), 5);
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn resolution_failure_cause_is_logged_at_error_level() {
    let server = MockServer::start().await;
    Mock::given(path("/resolve"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let logs = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::ERROR)
        .with_ansi(false)
        .with_writer(logs.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let results = run(&recon_for(&server, 5), &["broken.example"]).await;

    assert_eq!(results[0].outcome.error(), Some(&FetchError::ResolutionFailed));
    let text = logs.text();
    assert!(text.contains("error resolving domain"), "logs were: {}", text);
    assert!(text.contains("broken.example"));
    assert!(text.contains("502"));
}
