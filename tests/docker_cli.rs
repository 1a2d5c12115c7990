// tests/docker_cli.rs

use std::path::PathBuf;

use tws::cli::LogLevel;
use tws::config::{DockerConnection, TlsIdentity};
use tws::errors::RuntimeError;
use tws::exec::{DockerCli, LogStream};
use tws::fleet::WorkerSpec;
use tws::logging::resolve_level;
use tws_test_utils::builders::LaunchTemplateBuilder;

#[test]
fn local_daemon_needs_no_connection_flags() {
    let docker = DockerCli::new(DockerConnection::default());
    assert!(docker.global_args().is_empty());
    assert_eq!(docker.program(), "docker");
}

#[test]
fn tls_without_ca_skips_verification() {
    let docker = DockerCli::new(DockerConnection {
        host: Some("tcp://10.0.0.5:2376".to_string()),
        tls: Some(TlsIdentity {
            cert: PathBuf::from("/certs/cert.pem"),
            key: PathBuf::from("/certs/key.pem"),
            ca: None,
        }),
    });

    assert_eq!(
        docker.global_args(),
        vec![
            "--host", "tcp://10.0.0.5:2376", "--tls", "--tlscert", "/certs/cert.pem", "--tlskey",
            "/certs/key.pem",
        ]
    );
}

#[test]
fn tls_with_ca_verifies_the_daemon() {
    let docker = DockerCli::new(DockerConnection {
        host: None,
        tls: Some(TlsIdentity {
            cert: PathBuf::from("cert.pem"),
            key: PathBuf::from("key.pem"),
            ca: Some(PathBuf::from("ca.pem")),
        }),
    })
    .with_program("/usr/local/bin/docker");

    assert_eq!(docker.program(), "/usr/local/bin/docker");
    assert_eq!(
        docker.global_args(),
        vec!["--tlsverify", "--tlscacert", "ca.pem", "--tlscert", "cert.pem", "--tlskey", "key.pem"]
    );
}

#[test]
fn create_args_name_the_container_and_pass_the_ab_command() {
    let template = LaunchTemplateBuilder::new("http://example.com").build();
    let spec = WorkerSpec::new(2, "jess/ab", "tws", &template);

    let args = DockerCli::create_args(&spec);

    assert_eq!(&args[..4], &["create", "--name", "tws_2", "jess/ab"]);
    assert_eq!(&args[4..], template.command().as_slice());
}

#[cfg(unix)]
#[test]
fn missing_containers_are_classified_as_not_found() {
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;
    use tws::exec::docker::classify_failure;

    let status = ExitStatus::from_raw(1 << 8);

    let gone = classify_failure("rm", status, "Error response from daemon: No such container: abc\n");
    assert!(gone.is_not_found());

    let other = classify_failure("start", status, "permission denied\n");
    match other {
        RuntimeError::CommandFailed { op, stderr, .. } => {
            assert_eq!(op, "start");
            assert_eq!(stderr, "permission denied");
        }
        e => panic!("Expected CommandFailed, got: {e:?}"),
    }
}

#[tokio::test]
async fn log_stream_concatenates_chunks_in_order() {
    let (tx, stream) = LogStream::channel(4);
    tokio::spawn(async move {
        for chunk in ["This is ApacheBench\n", "Complete requests: 10\n"] {
            tx.send(Ok(chunk.as_bytes().to_vec())).await.unwrap();
        }
    });

    let body = stream.read_to_end().await.unwrap();
    assert_eq!(body, b"This is ApacheBench\nComplete requests: 10\n");
}

#[tokio::test]
async fn log_stream_error_aborts_the_read() {
    let (tx, stream) = LogStream::channel(4);
    tx.send(Ok(b"partial".to_vec())).await.unwrap();
    tx.send(Err(RuntimeError::NotFound("abc".into()))).await.unwrap();
    drop(tx);

    assert!(stream.read_to_end().await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn unattached_log_stream_is_reported_as_closed() {
    let (tx, stream) = LogStream::channel(1);
    tx.send(Err(RuntimeError::StreamClosed("4f1c2b9".into()))).await.unwrap();
    drop(tx);

    let err = stream.read_to_end().await.unwrap_err();
    assert!(matches!(err, RuntimeError::StreamClosed(ref id) if id == "4f1c2b9"));
    assert!(!err.is_not_found());
    assert_eq!(err.to_string(), "log stream for container 4f1c2b9 is not available");
}

#[test]
fn log_level_priority() {
    assert_eq!(resolve_level(Some(LogLevel::Warn), true, Some("trace")), tracing::Level::WARN);
    assert_eq!(resolve_level(None, true, Some("error")), tracing::Level::DEBUG);
    assert_eq!(resolve_level(None, false, Some("Trace")), tracing::Level::TRACE);
    assert_eq!(resolve_level(None, false, Some("bogus")), tracing::Level::INFO);
    assert_eq!(resolve_level(None, false, None), tracing::Level::INFO);
}
