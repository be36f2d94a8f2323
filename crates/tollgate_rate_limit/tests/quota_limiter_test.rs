//! Tests for quota limiter admission behaviour.

use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tollgate_core::{Clock, ManualClock, Plan};
use tollgate_rate_limit::{
    CoordinationMode, OperationClass, QuotaLimiter, QuotaPolicy, RateLimitConfig,
};

fn limiter() -> (QuotaLimiter, ManualClock) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 5, 4, 10, 0, 0).unwrap());
    let limiter = QuotaLimiter::local(&RateLimitConfig::default(), Arc::new(clock.clone()));
    (limiter, clock)
}

#[tokio::test]
async fn test_first_n_requests_count_down_then_deny() {
    let (limiter, _clock) = limiter();
    let policy = QuotaPolicy::new("ratelimit:test", 5, 60);

    let mut remaining = Vec::new();
    for _ in 0..5 {
        let result = limiter.acquire("user-1", &policy).await;
        assert!(result.success);
        assert_eq!(result.limit, 5);
        remaining.push(result.remaining);
    }
    assert_eq!(remaining, vec![4, 3, 2, 1, 0]);

    let denied = limiter.acquire("user-1", &policy).await;
    assert!(!denied.success);
    assert_eq!(denied.remaining, 0);
    assert_eq!(denied.limit, 5);
}

#[tokio::test]
async fn test_window_restarts_after_reset() {
    let (limiter, clock) = limiter();
    let policy = QuotaPolicy::new("ratelimit:test", 2, 60);

    let first = limiter.acquire("user-1", &policy).await;
    limiter.acquire("user-1", &policy).await;
    assert!(!limiter.acquire("user-1", &policy).await.success);

    clock.advance(Duration::seconds(61));
    let fresh = limiter.acquire("user-1", &policy).await;
    assert!(fresh.success);
    assert_eq!(fresh.remaining, 1);
    assert!(fresh.reset > first.reset);
}

#[tokio::test]
async fn test_denied_result_points_at_window_end() {
    let (limiter, clock) = limiter();
    let policy = QuotaPolicy::new("ratelimit:test", 1, 60);
    let start = clock.now();

    limiter.acquire("user-1", &policy).await;
    clock.advance(Duration::seconds(45));
    let denied = limiter.acquire("user-1", &policy).await;

    assert_eq!(denied.reset, start + Duration::seconds(60));
    assert_eq!(denied.retry_after_secs(clock.now()), 15);
}

#[tokio::test]
async fn test_subjects_are_isolated() {
    let (limiter, _clock) = limiter();
    let policy = QuotaPolicy::new("ratelimit:test", 1, 60);

    assert!(limiter.acquire("user-1", &policy).await.success);
    assert!(!limiter.acquire("user-1", &policy).await.success);
    assert!(limiter.acquire("user-2", &policy).await.success);
    assert!(limiter.acquire("198.51.100.7", &policy).await.success);
}

#[tokio::test]
async fn test_operation_classes_are_isolated() {
    let (limiter, _clock) = limiter();
    let config = RateLimitConfig::default();
    let image = config
        .policies
        .policy_for(OperationClass::ImageGeneration, Plan::Free);
    let read = config
        .policies
        .policy_for(OperationClass::GenericRead, Plan::Free);

    for _ in 0..image.max_requests {
        assert!(limiter.acquire("user-1", &image).await.success);
    }
    assert!(!limiter.acquire("user-1", &image).await.success);

    let polled = limiter.acquire("user-1", &read).await;
    assert!(polled.success);
    assert_eq!(polled.remaining, read.max_requests - 1);
}

#[tokio::test]
async fn test_plan_upgrade_raises_limit() {
    let (limiter, _clock) = limiter();
    let presets = RateLimitConfig::default().policies;
    let pro = presets.policy_for(OperationClass::AiGeneration, Plan::Pro);

    let result = limiter.acquire("user-1", &pro).await;
    assert_eq!(result.limit, 30);
    assert_eq!(result.remaining, 29);
}

#[tokio::test]
async fn test_limiters_do_not_share_state() {
    let (first, _) = limiter();
    let (second, _) = limiter();
    let policy = QuotaPolicy::new("ratelimit:test", 1, 60);

    assert!(first.acquire("user-1", &policy).await.success);
    assert!(second.acquire("user-1", &policy).await.success);
    assert_eq!(first.tracked_windows(), 1);
    assert_eq!(second.tracked_windows(), 1);
}

#[tokio::test]
async fn test_sweep_bounds_memory_under_churn() {
    let (limiter, clock) = limiter();
    let policy = QuotaPolicy::new("ratelimit:test", 10, 30);

    for round in 0..5 {
        for n in 0..100 {
            limiter
                .acquire(&format!("visitor-{}-{}", round, n), &policy)
                .await;
        }
        clock.advance(Duration::seconds(61));
    }

    // Each round's first lookup swept the previous round's expired windows.
    assert_eq!(limiter.tracked_windows(), 100);
    assert_eq!(limiter.sweep(), 100);
    assert_eq!(limiter.tracked_windows(), 0);
}

#[tokio::test]
async fn test_unconfigured_backend_selects_local_mode() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let limiter = QuotaLimiter::connect(&RateLimitConfig::default(), None, clock).await;
    assert_eq!(limiter.mode(), CoordinationMode::Local);
}

#[tokio::test]
async fn test_unreachable_backend_selects_local_mode_and_still_counts() {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 5, 4, 10, 0, 0).unwrap()));
    let config = RateLimitConfig {
        probe_attempts: 1,
        ..RateLimitConfig::default()
    };
    let limiter = QuotaLimiter::connect(&config, Some("not a redis url"), clock).await;
    assert_eq!(limiter.mode(), CoordinationMode::Local);

    let policy = QuotaPolicy::new("startup", 1, 60);
    assert!(limiter.acquire("user-1", &policy).await.success);
    assert!(!limiter.acquire("user-1", &policy).await.success);
}

/// Serve RESP: `PING` answers `+PONG`, every other command fails.
async fn spawn_failing_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(answer_commands(stream));
        }
    });
    format!("redis://{}", addr)
}

async fn answer_commands(stream: TcpStream) -> std::io::Result<()> {
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        let argc: usize = line.trim_end().trim_start_matches('*').parse().unwrap_or(0);
        let mut command = None;
        for _ in 0..argc {
            line.clear();
            reader.read_line(&mut line).await?;
            let len: usize = line.trim_end().trim_start_matches('$').parse().unwrap_or(0);
            let mut arg = vec![0u8; len + 2];
            reader.read_exact(&mut arg).await?;
            command.get_or_insert_with(|| String::from_utf8_lossy(&arg[..len]).to_uppercase());
        }
        let reply = match command.as_deref() {
            Some("PING") => "+PONG\r\n",
            _ => "-ERR unsupported command\r\n",
        };
        write.write_all(reply.as_bytes()).await?;
    }
}

#[tokio::test]
async fn test_failing_backend_call_answers_from_local_windows() {
    let url = spawn_failing_backend().await;
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 5, 4, 10, 0, 0).unwrap()));
    let config = RateLimitConfig {
        probe_attempts: 1,
        ..RateLimitConfig::default()
    };
    let limiter = QuotaLimiter::connect(&config, Some(&url), clock).await;
    assert_eq!(limiter.mode(), CoordinationMode::Distributed);

    let policy = QuotaPolicy::new("fallback", 2, 60);
    let mut results = Vec::new();
    for _ in 0..3 {
        let result = limiter.acquire("user-1", &policy).await;
        results.push((result.success, result.remaining));
    }

    assert_eq!(results, vec![(true, 1), (true, 0), (false, 0)]);
    assert_eq!(limiter.mode(), CoordinationMode::Distributed);
    assert_eq!(limiter.tracked_windows(), 1);
}
