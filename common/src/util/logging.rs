use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::{info, LevelFilter};
use std::future::Future;
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

static MULTI: OnceLock<MultiProgress> = OnceLock::new();

pub fn initialize_logging(log_level: LevelFilter) {
    let logger = env_logger::builder()
        .filter_level(log_level)
        .parse_default_env() // Allow overriding log level through RUST_LOG env var
        .build();

    let multi = MultiProgress::new();

    let wrapper = LogWrapper::new(multi.clone(), logger);
    wrapper.try_init().unwrap();

    let _ = MULTI.set(multi);
}

fn spinner(task_desc: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner()
        .with_message(format!("{}...", task_desc))
        .with_style(ProgressStyle::with_template("{spinner:.white} [{elapsed:.green}] {msg}").unwrap());
    pb.enable_steady_tick(Duration::from_millis(100));

    // Register with the log bridge so that log lines don't tear the spinner
    if let Some(multi) = MULTI.get() {
        multi.add(pb.clone());
    }

    pb
}

fn finish(pb: ProgressBar, target: &str, task_desc: &str, start_time: SystemTime) {
    pb.finish_and_clear();
    if let Some(multi) = MULTI.get() {
        multi.remove(&pb);
    }
    let elapsed = indicatif::HumanDuration(start_time.elapsed().unwrap_or(Duration::ZERO));
    info!(target: target, "{} finished (took {})", task_desc, elapsed);
}

pub async fn run_with_spinner_async<F, Out>(
    target: &str, task_desc: &str, future: F,
) -> Out where
    F: Future<Output = Out>,
{
    let start_time = SystemTime::now();
    let pb = spinner(task_desc);

    let out = future.await;

    finish(pb, target, task_desc, start_time);

    out
}
