//! CLI command implementations
//!
//! Commands are read-only: they decode memberships, classify them and
//! read the membership log, but never install or persist anything.

use std::path::Path;

use serde_json::{json, Value};

use crate::config::EngineConfig;
use crate::membership::{SegmentForm, SegmentMembership, VolumeType};
use crate::store::{read_records, SnapshotRecord};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command. A failed
/// command still answers with one JSON error object on stdout before the
/// error is handed back to main.rs.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    if let Err(e) = run_command(cli.command) {
        write_error(e.code_str(), e.message())?;
        return Err(e);
    }
    Ok(())
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let data = match cmd {
        Command::Decode { content } => decode(&content)?,
        Command::Form {
            content,
            volume_type,
        } => form(&content, &volume_type)?,
        Command::CheckWrite {
            content,
            write_quorum,
            good_secondaries,
            good_joining,
            good_arbiters,
        } => check_write(
            &content,
            write_quorum,
            good_secondaries,
            good_joining,
            good_arbiters,
        )?,
        Command::History { config, segment } => history(&config, segment)?,
    };
    write_response(data)
}

/// JSON view of a membership.
pub fn membership_json(membership: &SegmentMembership) -> Value {
    json!({
        "version": {
            "epoch": membership.version().epoch(),
            "generation": membership.version().generation(),
        },
        "primary": membership.primary(),
        "temp_primary": membership.temp_primary(),
        "secondaries": membership.secondaries(),
        "arbiters": membership.arbiters(),
        "inactive_secondaries": membership.inactive_secondaries(),
        "joining_secondaries": membership.joining_secondaries(),
        "primary_candidate": membership.primary_candidate(),
        "secondary_candidate": membership.secondary_candidate(),
        "quorum_updated": membership.is_quorum_updated(),
        "content": membership.serialize_to_content(),
    })
}

/// Decode a content string
pub fn decode(content: &str) -> CliResult<Value> {
    let membership = SegmentMembership::deserialize_from_content(content)?;
    Ok(membership_json(&membership))
}

/// Classify a membership and report the static flags of its form
pub fn form(content: &str, volume_type: &str) -> CliResult<Value> {
    let membership = SegmentMembership::deserialize_from_content(content)?;
    let volume_type: VolumeType = volume_type.parse()?;
    let form = SegmentForm::get_segment_form(&membership, volume_type)?;

    let alive_secondaries = membership.secondaries().len() as u32;
    let alive_joining = membership.joining_secondaries().len() as u32;

    Ok(json!({
        "form": form.name(),
        "volume_type": volume_type.name(),
        "write_quorum": volume_type.write_quorum_size(),
        "can_generate_new_primary": form.can_generate_new_primary(),
        "only_primary": form.only_primary(),
        "safe_to_become_primary_with_a_secondary_missing":
            form.safe_to_become_primary_with_a_secondary_missing(),
        "writable_with_all_alive":
            form.writable(1, alive_secondaries, alive_joining, volume_type),
    }))
}

/// Evaluate the generic write quorum against a membership
pub fn check_write(
    content: &str,
    write_quorum: u32,
    good_secondaries: u32,
    good_joining: u32,
    good_arbiters: u32,
) -> CliResult<Value> {
    let membership = SegmentMembership::deserialize_from_content(content)?;
    let reached = membership.check_write_result_of_secondaries_and_arbiters(
        write_quorum,
        good_secondaries,
        good_joining,
        good_arbiters,
    );

    Ok(json!({
        "write_quorum": write_quorum,
        "good": {
            "secondaries": good_secondaries,
            "joining": good_joining,
            "arbiters": good_arbiters,
        },
        "quorum_reached": reached,
    }))
}

/// Latest persisted membership of `segment` in the configured log
pub fn history(config_path: &Path, segment: u64) -> CliResult<Value> {
    let config = EngineConfig::load(config_path)?;
    let store_path = config
        .store_path()
        .ok_or_else(|| CliError::config_error("store_path is not configured"))?;
    if !store_path.exists() {
        return Err(CliError::config_error(format!(
            "membership log {} does not exist",
            store_path.display()
        )));
    }

    let records: Vec<SnapshotRecord> = read_records(store_path)?
        .into_iter()
        .filter(|r| r.segment == segment)
        .collect();

    let latest = match records.last() {
        Some(record) => {
            let mut view = membership_json(&record.membership()?);
            view["persisted_at"] = json!(record.persisted_at.to_rfc3339());
            view
        }
        None => Value::Null,
    };

    Ok(json!({
        "segment": segment,
        "snapshots": records.len(),
        "latest": latest,
    }))
}
