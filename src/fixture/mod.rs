//! Recorded HTTP fixtures
//!
//! Cassettes are YAML documents holding an ordered list of recorded
//! request/response interactions. Recordings of long-running operations
//! contain the initial `PUT` answered with `202` followed by every `GET`
//! poll; [`shrink_long_running_operations`] collapses those polls so that
//! playback sees the final response straight away.

mod cassette;

pub use cassette::{Cassette, Interaction, RecordedRequest, RecordedResponse, ResponseStatus};

use anyhow::{Context, Result};
use std::path::Path;

/// Request header marking lease operations on storage blobs
pub const LEASE_ACTION_HEADER: &str = "x-ms-lease-action";

/// A `PUT`/`202` whose polling never reached a terminal response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedOperation {
    /// Position of the `PUT` in the interaction list
    pub index: usize,
    pub uri: Option<String>,
}

/// What a shrink pass did to one cassette
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShrinkReport {
    /// Operations whose polling was collapsed
    pub collapsed: usize,
    /// Interactions removed in total
    pub removed: usize,
    /// Operations left untouched because no terminal `GET` follows them
    pub unresolved: Vec<UnresolvedOperation>,
}

impl ShrinkReport {
    pub fn is_changed(&self) -> bool {
        self.collapsed > 0
    }
}

/// True for a `PUT` answered with `202` that is not a lease break
fn starts_long_running_operation(interaction: &Interaction) -> bool {
    interaction.request.is_method("PUT")
        && interaction.response.code() == Some(202)
        && !interaction
            .request
            .first_header(LEASE_ACTION_HEADER)
            .map(|action| action.eq_ignore_ascii_case("break"))
            .unwrap_or(false)
}

fn is_poll(interaction: &Interaction) -> bool {
    interaction.request.is_method("GET") && interaction.response.code() == Some(202)
}

fn is_terminal_poll(interaction: &Interaction) -> bool {
    interaction.request.is_method("GET") && interaction.response.code() != Some(202)
}

/// Collapse polling of every long-running operation in the cassette
///
/// For each `PUT`/`202` (lease breaks excluded) the following `GET`/`202`
/// polls are dropped and the first non-`202` `GET` is folded into the `PUT`
/// as its response. Interactions with other methods in between are kept in
/// place. An operation with no terminal `GET` is left as recorded and listed
/// in [`ShrinkReport::unresolved`].
pub fn shrink_long_running_operations(cassette: &mut Cassette) -> ShrinkReport {
    let mut report = ShrinkReport::default();
    let mut index = 0;

    while index < cassette.interactions.len() {
        if !starts_long_running_operation(&cassette.interactions[index]) {
            index += 1;
            continue;
        }

        let terminal = cassette.interactions[index + 1..]
            .iter()
            .position(is_terminal_poll)
            .map(|offset| index + 1 + offset);

        let Some(terminal) = terminal else {
            let uri = cassette.interactions[index].request.uri.clone();
            tracing::warn!(
                "No terminal response recorded for PUT {} at interaction {}",
                uri.as_deref().unwrap_or("-"),
                index
            );
            report.unresolved.push(UnresolvedOperation { index, uri });
            index += 1;
            continue;
        };

        let tail = cassette.interactions.split_off(index + 1);
        let mut final_response = None;
        for (offset, item) in tail.into_iter().enumerate() {
            let position = index + 1 + offset;
            if position == terminal {
                final_response = Some(item.response);
                report.removed += 1;
            } else if position < terminal && is_poll(&item) {
                report.removed += 1;
            } else {
                cassette.interactions.push(item);
            }
        }

        if let Some(response) = final_response {
            cassette.interactions[index].response = response;
        }
        report.collapsed += 1;
        index += 1;
    }

    report
}

/// Read a cassette from disk
pub fn load(path: &Path) -> Result<Cassette> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixture {}", path.display()))?;
    Cassette::from_yaml(&content).with_context(|| format!("Failed to parse fixture {}", path.display()))
}

/// Write a cassette to disk, replacing the previous content
pub fn save(path: &Path, cassette: &Cassette) -> Result<()> {
    let content = cassette.to_yaml()?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write fixture {}", path.display()))
}

/// Load, shrink and (if anything collapsed) rewrite one cassette file
///
/// Returns `Ok(None)` when the file does not exist. With `strict`, an
/// operation without a terminal response is an error and the file is not
/// written.
pub fn shrink_file(path: &Path, strict: bool) -> Result<Option<ShrinkReport>> {
    if !path.is_file() {
        tracing::debug!("Fixture {} not found, skipping", path.display());
        return Ok(None);
    }

    let mut cassette = load(path)?;
    let report = shrink_long_running_operations(&mut cassette);

    if strict {
        if let Some(first) = report.unresolved.first() {
            anyhow::bail!(
                "{}: {} long-running operation(s) have no terminal response (first at interaction {})",
                path.display(),
                report.unresolved.len(),
                first.index
            );
        }
    }

    if report.is_changed() {
        save(path, &cassette)?;
        tracing::info!(
            "Shrunk {}: {} operation(s) collapsed, {} interaction(s) removed",
            path.display(),
            report.collapsed,
            report.removed
        );
    }

    Ok(Some(report))
}
