//! Load testing for the webhook router.

use std::time::{Duration, Instant};

use serde_json::Value;
use webhook_router::config::{EndpointConfig, RouterConfig};
use webhook_router::load_balancer::Strategy;

mod common;

async fn run_load(strategy: Strategy) -> (Vec<Duration>, Value) {
    let mut config = RouterConfig::default();
    for name in ["alice", "bob", "carol"] {
        let addr = common::start_mock_backend("ok").await;
        config
            .endpoints
            .push(EndpointConfig::new(name, "events", format!("http://{addr}/slack/events")));
    }
    config.balancer.strategy = strategy;
    let router = common::start_router(config).await;

    let concurrency = 20;
    let requests_per_task = 25;
    let client = common::client();

    let mut tasks = Vec::new();
    for _ in 0..concurrency {
        let client = client.clone();
        let url = router.url("/slack/events");
        tasks.push(tokio::spawn(async move {
            let mut latencies = Vec::new();
            for _ in 0..requests_per_task {
                let req_start = Instant::now();
                if let Ok(res) = client.post(&url).body("{}").send().await {
                    if res.status().is_success() {
                        latencies.push(req_start.elapsed());
                    }
                }
            }
            latencies
        }));
    }

    let mut all_latencies = Vec::new();
    for task in tasks {
        all_latencies.extend(task.await.unwrap());
    }

    let report: Value = client
        .get(router.url("/load-balancer"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    (all_latencies, report)
}

fn total_count(report: &Value) -> u64 {
    report["request_counts"]
        .as_object()
        .unwrap()
        .values()
        .map(|v| v.as_u64().unwrap())
        .sum()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_counts_are_not_lost() {
    let start = Instant::now();
    let (mut latencies, report) = run_load(Strategy::RoundRobin).await;
    let duration = start.elapsed();

    assert_eq!(latencies.len(), 500, "every request should succeed");
    assert_eq!(total_count(&report), 500, "each success is counted exactly once");

    // Round robin spreads the load evenly.
    for count in report["request_counts"].as_object().unwrap().values() {
        let count = count.as_u64().unwrap();
        assert!((166..=167).contains(&count), "uneven rotation: {report}");
    }

    latencies.sort();
    let p50 = latencies[latencies.len() / 2];
    let p99 = latencies[(latencies.len() as f64 * 0.99) as usize];

    println!("\n--- Load Test Results ---");
    println!("Total Duration: {:?}", duration);
    println!("Requests/sec:   {:.2}", 500.0 / duration.as_secs_f64());
    println!("P50 Latency:    {:?}", p50);
    println!("P99 Latency:    {:?}", p99);
    println!("-------------------------\n");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_least_connections_under_concurrency() {
    let (latencies, report) = run_load(Strategy::LeastConnections).await;
    assert_eq!(latencies.len(), 500);
    assert_eq!(total_count(&report), 500);
}
