use clap::Parser;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tollgate::{
    Cli, Clock, Commands, CounterBackend, OperationClass, Plan, QuotaLimiter, SystemClock,
    TollgateConfig, init_telemetry, shutdown_telemetry,
};
use tollgate_rate_limit::distributed_url_from_env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if cli.otel {
        init_telemetry("tollgate")?;
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let config = match &cli.config {
        Some(path) => TollgateConfig::from_file(path)?,
        None => TollgateConfig::load()?,
    };

    match cli.command {
        Commands::Policies { plan } => print_policies(&config, plan),
        Commands::Probe { url } => {
            let url = url.or_else(distributed_url_from_env);
            let backend =
                CounterBackend::probe(url.as_deref(), config.rate_limit.probe_attempts).await;
            println!("coordination mode: {}", backend.mode());
        }
        Commands::Simulate {
            subject,
            class,
            plan,
            requests,
            distributed,
        } => simulate(&config, &subject, class, plan, requests, distributed).await,
    }

    if cli.otel {
        shutdown_telemetry();
    }
    Ok(())
}

fn print_policies(config: &TollgateConfig, only: Option<Plan>) {
    let plans: Vec<Plan> = match only {
        Some(plan) => vec![plan],
        None => Plan::iter().collect(),
    };
    print!("{:<18} {:<18} {:>8}", "class", "prefix", "window");
    for plan in &plans {
        print!(" {:>8}", plan.to_string());
    }
    println!();

    for class in OperationClass::iter() {
        let preset = config.rate_limit.policies.class(class);
        print!(
            "{:<18} {:<18} {:>7}s",
            class.to_string(),
            preset.prefix,
            preset.window_seconds
        );
        for plan in &plans {
            print!(" {:>8}", preset.max_requests(*plan));
        }
        println!();
    }
}

async fn simulate(
    config: &TollgateConfig,
    subject: &str,
    class: OperationClass,
    plan: Plan,
    requests: u32,
    distributed: bool,
) {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let limiter = if distributed {
        QuotaLimiter::connect(
            &config.rate_limit,
            distributed_url_from_env().as_deref(),
            clock.clone(),
        )
        .await
    } else {
        QuotaLimiter::local(&config.rate_limit, clock.clone())
    };
    let policy = config.rate_limit.policies.policy_for(class, plan);

    println!(
        "{} requests by '{}' as {} ({} per {}s, {} mode)",
        requests,
        subject,
        plan,
        policy.max_requests,
        policy.window_seconds,
        limiter.mode()
    );

    for i in 1..=requests {
        let result = limiter.acquire(subject, &policy).await;
        let verdict = if result.success { "admit" } else { "deny" };
        let headers = result
            .headers(clock.now())
            .iter()
            .map(|(name, value)| format!("{}={}", name, value.to_str().unwrap_or("?")))
            .collect::<Vec<_>>()
            .join(" ");
        println!("#{:<3} {:<5} {}", i, verdict, headers);
    }
}
