//! Cassette replay harness
//!
//! Each recorded test copies its cassette to a scratch directory, shrinks the
//! long-running-operation polling in the copy, mounts every interaction on a
//! local mock server in recorded order and runs the CLI command against it.
//! Every interaction must be consumed exactly once, with the recorded query
//! and request body.

use acrctl::acr::Services;
use acrctl::azure::auth::AzureCredentials;
use acrctl::azure::client::AzureClient;
use acrctl::azure::lro::PollSettings;
use acrctl::cli::{self, Cli, Command};
use acrctl::config::Config;
use acrctl::fixture::{self, Cassette, Interaction};
use clap::Parser;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";

/// Headers the mock server computes itself
const SKIPPED_HEADERS: &[&str] = &["content-length", "transfer-encoding", "content-encoding"];

pub fn recording_path(test_name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("recordings")
        .join(format!("{}.yaml", test_name))
}

/// Shrunk copy of a recording
pub fn load_shrunk(test_name: &str) -> Cassette {
    let dir = tempfile::tempdir().expect("scratch dir");
    let copy = dir.path().join(format!("{}.yaml", test_name));
    std::fs::copy(recording_path(test_name), &copy).expect("recording should exist");

    fixture::shrink_file(&copy, true)
        .expect("recording should shrink")
        .expect("copy should exist");
    fixture::load(&copy).expect("shrunk recording should load")
}

fn response_for(interaction: &Interaction) -> ResponseTemplate {
    let code = interaction.response.code().unwrap_or(200);
    let mut template = ResponseTemplate::new(code);

    if let Some(body) = interaction.response.body_text() {
        if !body.is_empty() {
            template = template.set_body_string(body);
        }
    }

    for (name, value) in interaction.response.header_pairs() {
        if SKIPPED_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(&name)) {
            continue;
        }
        template = template.insert_header(name.as_str(), value.as_str());
    }

    template
}

/// Recorded request body, when one was recorded
fn recorded_json_body(interaction: &Interaction) -> Option<Value> {
    let text = interaction.request.body_text()?;
    if text.is_empty() {
        return None;
    }
    Some(serde_json::from_str(&text).expect("recorded request body should be JSON"))
}

/// Mount every interaction, in order, to be matched exactly once
///
/// Method, path, every recorded query parameter and a recorded JSON body
/// must all match.
pub async fn mount_cassette(server: &MockServer, cassette: &Cassette) {
    for interaction in &cassette.interactions {
        let uri = interaction.request.uri.as_deref().expect("recorded uri");
        let url = url::Url::parse(uri).expect("recorded uri should parse");
        let verb = interaction.request.method.clone().expect("recorded method");

        let mut mock = Mock::given(method(verb.as_str())).and(path(url.path()));
        for (key, value) in url.query_pairs() {
            mock = mock.and(query_param(key.as_ref(), value.as_ref()));
        }
        if let Some(body) = recorded_json_body(interaction) {
            mock = mock.and(body_json(body));
        }

        mock.respond_with(response_for(interaction))
            .up_to_n_times(1)
            .expect(1)
            .mount(server)
            .await;
    }
}

/// Client pointed at the mock server, polling without delay
pub fn replay_client(server: &MockServer) -> AzureClient {
    AzureClient::with_credentials(
        SUBSCRIPTION,
        &server.uri(),
        AzureCredentials::from_static_token("replay-token"),
    )
    .expect("client should build")
    .with_poll_settings(PollSettings {
        interval: Duration::from_millis(1),
        timeout: Duration::from_secs(5),
    })
}

/// Replay `test_name.yaml` and run `acrctl <args>` against it
pub async fn run_recorded(test_name: &str, args: &[&str]) -> Value {
    let cassette = load_shrunk(test_name);
    let server = MockServer::start().await;
    mount_cassette(&server, &cassette).await;

    let client = replay_client(&server);

    let argv = ["acrctl", "--subscription", SUBSCRIPTION]
        .into_iter()
        .chain(args.iter().copied());
    let parsed = Cli::try_parse_from(argv).expect("arguments should parse");

    let Command::Acr(command) = parsed.command else {
        panic!("recorded tests only cover acr commands");
    };

    let output = cli::run_acr(command, Services::from_client(&client), &Config::default())
        .await
        .expect("command should succeed against the recording");

    server.verify().await;
    output.json()
}
