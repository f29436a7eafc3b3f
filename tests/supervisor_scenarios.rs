mod common;

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use bootstrap_runner::errors::RunnerError;
use bootstrap_runner::run_with_writer;
use bootstrap_runner::record::{
    DEFAULT_MARKER, Decoded, VERBOSE_MARKER, end_of_stream_payload,
};
use bootstrap_runner::types::StreamTag;
use bootstrap_runner_test_utils::buffer::{SharedBuffer, payloads, sequences};
use bootstrap_runner_test_utils::builders::{RunnerConfigBuilder, Workspace};
use bootstrap_runner_test_utils::with_timeout;

use common::run_captured;

fn banner(message: &str) -> Vec<String> {
    vec![
        VERBOSE_MARKER.to_string(),
        message.to_string(),
        DEFAULT_MARKER.to_string(),
    ]
}

fn exit_code_of_sentinel(records: &[Decoded]) -> i32 {
    let sentinels: Vec<i32> = records
        .iter()
        .filter_map(|d| match d {
            Decoded::EndOfStream { exit_code, .. } => Some(*exit_code),
            Decoded::Line(_) => None,
        })
        .collect();
    assert_eq!(sentinels.len(), 1, "exactly one sentinel expected");
    assert!(
        matches!(records.last(), Some(Decoded::EndOfStream { .. })),
        "sentinel must be the final record"
    );
    sentinels[0]
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn hello_world_is_wrapped_in_banners_and_sentinel() {
    let ws = Workspace::new();
    let cipher = ws.with_random_key(32);
    ws.write_script("job.sh", "echo hello");

    let config = RunnerConfigBuilder::new(ws.path(), "job.sh").build();
    let (result, out) = run_captured(config).await;

    assert_eq!(result.unwrap(), 0);

    let records = out.decode(Some(&cipher)).unwrap();
    let mut expected = banner("Kubernetes Script Pod started");
    expected.push("hello".to_string());
    expected.extend(banner("Kubernetes Script Pod completed"));
    expected.push(end_of_stream_payload(0));

    assert_eq!(payloads(&records), expected);
    assert_eq!(sequences(&records), (1..=8).collect::<Vec<u64>>());
    assert!(records.iter().all(|d| d.record().encrypted));
    assert_eq!(records[3].record().stream, StreamTag::Stdout);
    assert_eq!(records[7].record().stream, StreamTag::Debug);
    assert_eq!(exit_code_of_sentinel(&records), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn silent_failure_still_emits_banners_and_exit_code() {
    let ws = Workspace::new();
    let cipher = ws.with_random_key(16);
    ws.write_script("job.sh", "exit 2");

    let config = RunnerConfigBuilder::new(ws.path(), "job.sh").build();
    let (result, out) = run_captured(config).await;

    assert_eq!(result.unwrap(), 2);

    let records = out.decode(Some(&cipher)).unwrap();
    let mut expected = banner("Kubernetes Script Pod started");
    expected.extend(banner("Kubernetes Script Pod completed"));
    expected.push(end_of_stream_payload(2));
    assert_eq!(payloads(&records), expected);
    assert_eq!(exit_code_of_sentinel(&records), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_key_aborts_before_spawning() {
    let ws = Workspace::new();
    ws.write_keyfile("this is not base64 !!!");
    ws.write_script("job.sh", "touch spawned");

    let config = RunnerConfigBuilder::new(ws.path(), "job.sh").build();
    let (result, out) = run_captured(config).await;

    let err = result.unwrap_err();
    assert!(matches!(err, RunnerError::KeyEncoding { .. }), "{err:?}");
    assert!(err.is_pre_spawn());
    assert!(out.is_empty(), "no record may be written");
    assert!(!ws.path().join("spawned").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn wrong_key_length_aborts_before_spawning() {
    let ws = Workspace::new();
    ws.write_keyfile("AAAAAAAAAAAAAAAAAAAAAAAAAAA="); // 20 bytes
    ws.write_script("job.sh", "echo nope");

    let config = RunnerConfigBuilder::new(ws.path(), "job.sh").build();
    let (result, out) = run_captured(config).await;

    assert!(matches!(result, Err(RunnerError::InvalidKeyLength(20))));
    assert!(out.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_key_file_aborts_before_spawning() {
    let ws = Workspace::new();
    ws.write_script("job.sh", "echo nope");

    let config = RunnerConfigBuilder::new(ws.path(), "job.sh").build();
    let (result, out) = run_captured(config).await;

    assert!(matches!(result, Err(RunnerError::KeyFileRead { .. })));
    assert!(out.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn interleaved_streams_are_gap_free_and_ordered_per_stream() {
    let ws = Workspace::new();
    ws.write_script(
        "job.sh",
        r#"for i in $(seq 1 200); do echo "out $i"; echo "err $i" >&2; done"#,
    );

    let config = RunnerConfigBuilder::new(ws.path(), "job.sh")
        .plain(false)
        .build();
    let (result, out) = run_captured(config).await;
    assert_eq!(result.unwrap(), 0);

    let records = out.decode(None).unwrap();
    let total = 3 + 400 + 3 + 1;
    assert_eq!(sequences(&records), (1..=total).collect::<Vec<u64>>());

    for (stream, prefix) in [(StreamTag::Stdout, "out"), (StreamTag::Stderr, "err")] {
        let lines: Vec<String> = records
            .iter()
            .map(|d| d.record())
            .filter(|r| r.stream == stream)
            .map(|r| String::from_utf8_lossy(&r.payload).into_owned())
            .filter(|p| p.starts_with(prefix))
            .collect();
        let expected: Vec<String> = (1..=200).map(|i| format!("{prefix} {i}")).collect();
        assert_eq!(lines, expected);
    }

    assert_eq!(exit_code_of_sentinel(&records), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn non_utf8_and_empty_lines_survive_encryption() {
    let ws = Workspace::new();
    let cipher = ws.with_random_key(24);
    ws.write_script("job.sh", r"printf 'a\xffb\n\nlast'");

    let config = RunnerConfigBuilder::new(ws.path(), "job.sh").build();
    let (result, out) = run_captured(config).await;
    assert_eq!(result.unwrap(), 0);

    let records = out.decode(Some(&cipher)).unwrap();
    let child: Vec<&[u8]> = records[3..6]
        .iter()
        .map(|d| d.record().payload.as_slice())
        .collect();
    assert_eq!(child, vec![&b"a\xffb"[..], &b""[..], &b"last"[..]]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn script_arguments_are_forwarded_verbatim() {
    let ws = Workspace::new();
    ws.write_script("job.sh", r#"echo "$1|$2|$#""#);

    let config = RunnerConfigBuilder::new(ws.path(), "job.sh")
        .arg("first arg")
        .arg("--plain")
        .plain(true)
        .build();
    let (result, out) = run_captured(config).await;
    assert_eq!(result.unwrap(), 0);

    let records = out.decode(None).unwrap();
    let line = records[3].record();
    assert_eq!(line.payload, b"first arg|--plain|2");
    assert!(line.timestamp.is_some());
    assert!(records.iter().all(|d| d.record().timestamp.is_some()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn script_runs_inside_the_working_directory() {
    let ws = Workspace::new();
    ws.write_script("job.sh", "pwd -P");

    let config = RunnerConfigBuilder::new(ws.path(), "job.sh")
        .plain(false)
        .build();
    let (result, out) = run_captured(config).await;
    assert_eq!(result.unwrap(), 0);

    let records = out.decode(None).unwrap();
    let expected = ws.path().canonicalize().unwrap();
    assert_eq!(
        records[3].record().payload,
        expected.to_string_lossy().as_bytes()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn custom_job_name_appears_in_banners() {
    let ws = Workspace::new();
    ws.write_script("job.sh", "true");

    let config = RunnerConfigBuilder::new(ws.path(), "job.sh")
        .plain(false)
        .job_name("Nightly deploy")
        .build();
    let (result, out) = run_captured(config).await;
    assert_eq!(result.unwrap(), 0);

    let p = payloads(&out.decode(None).unwrap());
    assert_eq!(p[1], "Nightly deploy started");
    assert_eq!(p[4], "Nightly deploy completed");
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn killed_child_reports_shell_style_exit_code() {
    let ws = Workspace::new();
    ws.write_script("job.sh", "echo before; kill -9 $$");

    let config = RunnerConfigBuilder::new(ws.path(), "job.sh")
        .plain(false)
        .build();
    let (result, out) = run_captured(config).await;
    assert_eq!(result.unwrap(), 137);

    let records = out.decode(None).unwrap();
    assert_eq!(exit_code_of_sentinel(&records), 137);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unspawnable_shell_is_fatal_after_start_banner() {
    let ws = Workspace::new();
    ws.write_script("job.sh", "echo unreachable");

    let config = RunnerConfigBuilder::new(ws.path(), "job.sh")
        .plain(false)
        .shell("/definitely/not/a/shell")
        .build();
    let (result, out) = run_captured(config).await;

    assert!(matches!(result, Err(RunnerError::Spawn { .. })));
    let records = out.decode(None).unwrap();
    assert_eq!(payloads(&records), banner("Kubernetes Script Pod started"));
    assert!(
        !records
            .iter()
            .any(|d| matches!(d, Decoded::EndOfStream { .. }))
    );
}

/// Stands in for a slow STDOUT consumer: every write stalls the caller.
#[derive(Clone)]
struct SlowWriter(SharedBuffer);

impl Write for SlowWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        thread::sleep(Duration::from_millis(2));
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

#[tokio::test(flavor = "current_thread")]
async fn slow_sink_on_single_worker_runtime_still_drains_both_streams() {
    let ws = Workspace::new();
    ws.write_script(
        "job.sh",
        r#"for i in $(seq 1 50); do echo "out $i"; echo "err $i" >&2; done; exit 4"#,
    );

    let config = RunnerConfigBuilder::new(ws.path(), "job.sh")
        .plain(false)
        .build();
    let buffer = SharedBuffer::new();
    let result = with_timeout(run_with_writer(config, SlowWriter(buffer.clone()))).await;
    assert_eq!(result.unwrap(), 4);

    let records = buffer.decode(None).unwrap();
    assert_eq!(sequences(&records), (1..=3 + 100 + 3 + 1).collect::<Vec<u64>>());
    for stream in [StreamTag::Stdout, StreamTag::Stderr] {
        let child_lines = records[3..103]
            .iter()
            .filter(|d| d.record().stream == stream)
            .count();
        assert_eq!(child_lines, 50);
    }
    assert_eq!(exit_code_of_sentinel(&records), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_working_directory_aborts_with_no_records() {
    let ws = Workspace::new();
    let missing = ws.path().join("gone");

    let config = RunnerConfigBuilder::new(&missing, "job.sh")
        .plain(true)
        .build();
    let (result, out) = run_captured(config).await;

    let err = result.unwrap_err();
    assert!(matches!(err, RunnerError::WorkingDirectory { .. }), "{err:?}");
    assert!(err.is_pre_spawn());
    assert!(out.is_empty());
}
