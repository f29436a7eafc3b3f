#![allow(dead_code)]

use bootstrap_runner::config::RunnerConfig;
use bootstrap_runner::errors::Result;
use bootstrap_runner::run_with_writer;
use bootstrap_runner_test_utils::buffer::SharedBuffer;
use bootstrap_runner_test_utils::{init_tracing, with_timeout};

/// Run one supervised script against an in-memory sink.
pub async fn run_captured(config: RunnerConfig) -> (Result<i32>, SharedBuffer) {
    init_tracing();
    let buffer = SharedBuffer::new();
    let result = with_timeout(run_with_writer(config, buffer.clone())).await;
    (result, buffer)
}
