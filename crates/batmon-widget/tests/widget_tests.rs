//! Integration tests for the battery widget polling loop

use batmon_widget::{
    BatteryWidget, MemorySurface, StatusClient, TargetIds, UNAVAILABLE, UNAVAILABLE_CLASS,
    WidgetConfig,
};
use mockito::{Mock, Server, ServerGuard};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const SAMPLE_BODY: &str = r#"{"available":true,"percent":42.3,"voltage":12.1,"status":"discharging","rate_per_hour":"-1.2","eta_hours":5.5}"#;

/// Test environment: mock monitor plus a widget pointed at it
struct WidgetTestEnv {
    server: ServerGuard,
    widget: BatteryWidget<MemorySurface>,
}

impl WidgetTestEnv {
    async fn new(interval: Duration) -> Self {
        let server = Server::new_async().await;
        let targets = TargetIds::default();
        let surface = MemorySurface::with_targets(targets.ids());
        let client = StatusClient::new(
            format!("{}/api/battery", server.url()),
            Duration::from_secs(5),
        )
        .expect("Failed to create status client");
        let widget = BatteryWidget::with_client(client, interval, targets, surface);

        Self { server, widget }
    }

    async fn mock_status(&mut self, status: usize, body: &str) -> Mock {
        self.server
            .mock("GET", "/api/battery")
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Poll the surface until `pred` holds, up to ~5 seconds
    async fn wait_for(&self, pred: impl Fn(&MemorySurface) -> bool) -> bool {
        for _ in 0..250 {
            if self.widget.with_surface(|s| pred(s)) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }
}

#[tokio::test]
async fn test_start_renders_sample_payload() {
    let mut env = WidgetTestEnv::new(Duration::from_secs(30)).await;
    let mock = env.mock_status(200, SAMPLE_BODY).await;

    env.widget.start();
    assert!(env.widget.is_running());
    assert!(
        env.wait_for(|s| s.text("battery-text") == Some("42%"))
            .await
    );

    env.widget.with_surface(|s| {
        assert!(s.is_visible("battery-nav-item"));
        assert_eq!(s.text("battery-percent-value"), Some("42.3%"));
        assert_eq!(s.text("battery-voltage-value"), Some("12.10V"));
        assert_eq!(s.text("battery-status-value"), Some("Discharging"));
        assert_eq!(s.text("battery-rate-value"), Some("-1.20%/h"));
        assert_eq!(s.text("battery-eta-value"), Some("5h 30m"));
        assert_eq!(
            s.class("battery-led"),
            Some("led-battery led-battery-medium led-gray")
        );
    });

    let state = env.widget.state().expect("state should be retained");
    assert_eq!(state.status, "discharging");

    env.widget.stop();
    assert!(!env.widget.is_running());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_renders_unavailable() {
    let mut env = WidgetTestEnv::new(Duration::from_secs(30)).await;
    env.widget
        .push_state(&serde_json::from_str(SAMPLE_BODY).unwrap());
    assert!(env.widget.state().is_some());

    let mock = env.mock_status(500, "").await;
    env.widget.start();

    assert!(
        env.wait_for(|s| s.class("battery-led") == Some(UNAVAILABLE_CLASS))
            .await
    );

    env.widget.with_surface(|s| {
        assert!(s.is_visible("battery-nav-item"));
        assert_eq!(s.text("battery-text"), Some(UNAVAILABLE));
        assert_eq!(s.text("battery-percent-value"), Some(UNAVAILABLE));
        assert_eq!(s.text("battery-voltage-value"), Some(UNAVAILABLE));
        assert_eq!(s.text("battery-status-value"), Some("Unknown"));
        assert_eq!(s.text("battery-rate-value"), Some(UNAVAILABLE));
        assert_eq!(s.text("battery-eta-value"), Some(UNAVAILABLE));
    });
    assert!(env.widget.state().is_none());
    assert!(env.widget.is_running(), "failures must not stop polling");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_malformed_body_renders_unavailable() {
    let mut env = WidgetTestEnv::new(Duration::from_secs(30)).await;
    let mock = env.mock_status(200, "not json at all").await;

    env.widget.refresh().await;

    env.widget.with_surface(|s| {
        assert_eq!(s.text("battery-text"), Some(UNAVAILABLE));
        assert_eq!(s.class("battery-led"), Some(UNAVAILABLE_CLASS));
    });
    assert!(env.widget.state().is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_enveloped_payload() {
    let mut env = WidgetTestEnv::new(Duration::from_secs(30)).await;
    let body = format!(r#"{{"ok":true,"result":{SAMPLE_BODY}}}"#);
    let mock = env.mock_status(200, &body).await;

    env.widget.refresh().await;

    env.widget.with_surface(|s| {
        assert_eq!(s.text("battery-text"), Some("42%"));
        assert_eq!(s.text("battery-eta-value"), Some("5h 30m"));
    });
    mock.assert_async().await;
}

#[tokio::test]
async fn test_restart_fetches_immediately_each_time() {
    let mut env = WidgetTestEnv::new(Duration::from_secs(30)).await;
    let mock = env
        .server
        .mock("GET", "/api/battery")
        .with_status(200)
        .with_body(SAMPLE_BODY)
        .expect(2)
        .create_async()
        .await;

    env.widget.start();
    assert!(
        env.wait_for(|s| s.text("battery-text") == Some("42%"))
            .await
    );
    env.widget.start();

    let mut matched = false;
    for _ in 0..250 {
        if mock.matched_async().await {
            matched = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(matched, "each start should poll once right away");

    // The first poller was cancelled, so no further requests arrive
    tokio::time::sleep(Duration::from_millis(100)).await;
    env.widget.stop();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_polls_repeat_on_interval() {
    let mut env = WidgetTestEnv::new(Duration::from_millis(50)).await;
    let mock = env
        .server
        .mock("GET", "/api/battery")
        .with_status(200)
        .with_body(SAMPLE_BODY)
        .expect_at_least(3)
        .create_async()
        .await;

    env.widget.start();
    tokio::time::sleep(Duration::from_millis(400)).await;
    env.widget.stop();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_widget_from_config() {
    let server = Server::new_async().await;
    let config = WidgetConfig {
        endpoint: format!("{}/api/battery", server.url()),
        poll_interval_secs: 1,
        ..Default::default()
    };

    let widget = BatteryWidget::new(&config, MemorySurface::new()).unwrap();
    assert_eq!(widget.interval(), Duration::from_secs(1));
    assert!(!widget.is_running());
}

/// Status server that holds back its first response
struct ScriptedServer {
    addr: SocketAddr,
    requests: Arc<AtomicUsize>,
    max_inflight: Arc<AtomicUsize>,
}

impl ScriptedServer {
    async fn spawn(first_delay: Duration, first: &'static str, rest: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().unwrap();

        let requests = Arc::new(AtomicUsize::new(0));
        let inflight = Arc::new(AtomicUsize::new(0));
        let max_inflight = Arc::new(AtomicUsize::new(0));

        let (req, cur, max) = (
            Arc::clone(&requests),
            Arc::clone(&inflight),
            Arc::clone(&max_inflight),
        );
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let (req, cur, max) = (Arc::clone(&req), Arc::clone(&cur), Arc::clone(&max));

                tokio::spawn(async move {
                    let mut head = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => head.extend_from_slice(&chunk[..n]),
                        }
                    }

                    let index = req.fetch_add(1, Ordering::SeqCst);
                    let now = cur.fetch_add(1, Ordering::SeqCst) + 1;
                    max.fetch_max(now, Ordering::SeqCst);

                    let body = if index == 0 {
                        tokio::time::sleep(first_delay).await;
                        first
                    } else {
                        rest
                    };
                    cur.fetch_sub(1, Ordering::SeqCst);

                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self {
            addr,
            requests,
            max_inflight,
        }
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn test_refresh_waits_for_inflight_poll() {
    let server = ScriptedServer::spawn(
        Duration::from_millis(600),
        r#"{"percent":10}"#,
        r#"{"percent":90}"#,
    )
    .await;

    let targets = TargetIds::default();
    let surface = MemorySurface::with_targets(targets.ids());
    let client = StatusClient::new(
        format!("http://{}/api/battery", server.addr),
        Duration::from_secs(5),
    )
    .expect("Failed to create status client");
    let mut widget = BatteryWidget::with_client(client, Duration::from_secs(30), targets, surface);

    widget.start();
    for _ in 0..250 {
        if server.requests() >= 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(server.requests(), 1, "poller should be waiting on its response");

    widget.refresh().await;
    widget.with_surface(|s| assert_eq!(s.text("battery-text"), Some("90%")));

    // Nothing older may land after the refresh
    tokio::time::sleep(Duration::from_millis(700)).await;
    widget.with_surface(|s| assert_eq!(s.text("battery-text"), Some("90%")));
    assert_eq!(widget.state().map(|st| st.percent), Some(90.0));

    assert_eq!(server.requests(), 2);
    assert_eq!(server.max_inflight.load(Ordering::SeqCst), 1);
    widget.stop();
}
