//! Read-only command line front end for an eventdesk store.
//!
//! # Responsibility
//! - Load `.env`, build [`CoreConfig`] and open the configured store.
//! - Render list/detail reads as the same JSON envelopes the routing layer
//!   returns.
//!
//! Usage: `eventdesk_cli <events|participants|tags> [id]` or
//! `eventdesk_cli version`.

use eventdesk_core::api::{invalid_id, parse_id, respond, ApiReply, Success};
use eventdesk_core::{
    core_version, init_logging, open_db, open_db_in_memory, CoreConfig, EntityKind, EventService,
    ParticipantService, SqliteEventRepository, SqliteParticipantRepository, SqliteTagRepository,
    TagService,
};
use log::info;
use serde::Serialize;
use std::process::ExitCode;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    match run(std::env::args().skip(1).collect()) {
        Ok(code) => code,
        Err(message) => {
            eprintln!("eventdesk_cli: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<ExitCode, String> {
    let command = args.first().map(String::as_str).unwrap_or("events");
    if command == "version" {
        println!("eventdesk_core version={}", core_version());
        return Ok(ExitCode::SUCCESS);
    }

    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(config.log_level, log_dir).map_err(|err| err.to_string())?;
    }

    let conn = match config.db_path.as_deref() {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    }
    .map_err(|err| err.to_string())?;
    info!(
        "event=cli_command module=cli status=start command={command} strategy={}",
        config.aggregate_strategy.as_str()
    );

    let id = args.get(1).map(String::as_str);
    match command {
        "events" => {
            let service = EventService::new(
                SqliteEventRepository::try_new(&conn).map_err(|err| err.to_string())?,
            )
            .with_aggregate_strategy(config.aggregate_strategy);
            match id {
                None => emit(respond(service.list_events(), Success::Data, "loading events")),
                Some(raw) => match parse_id(raw) {
                    Some(id) => emit(respond(service.get_event(id), Success::Data, "loading event")),
                    None => emit(invalid_id::<()>(EntityKind::Event)),
                },
            }
        }
        "participants" => {
            let service = ParticipantService::new(
                SqliteParticipantRepository::try_new(&conn).map_err(|err| err.to_string())?,
            )
            .with_aggregate_strategy(config.aggregate_strategy);
            match id {
                None => emit(respond(
                    service.list_participants(),
                    Success::Data,
                    "loading participants",
                )),
                Some(raw) => match parse_id(raw) {
                    Some(id) => emit(respond(
                        service.get_participant(id),
                        Success::Data,
                        "loading participant",
                    )),
                    None => emit(invalid_id::<()>(EntityKind::Participant)),
                },
            }
        }
        "tags" => {
            let service = TagService::new(
                SqliteTagRepository::try_new(&conn).map_err(|err| err.to_string())?,
            )
            .with_aggregate_strategy(config.aggregate_strategy);
            match id {
                None => emit(respond(service.list_tags(), Success::Data, "loading tags")),
                Some(raw) => match parse_id(raw) {
                    Some(id) => emit(respond(service.get_tag(id), Success::Data, "loading tag")),
                    None => emit(invalid_id::<()>(EntityKind::Tag)),
                },
            }
        }
        other => Err(format!(
            "unknown command `{other}`; expected events|participants|tags|version"
        )),
    }
}

/// Prints the envelope as pretty JSON; non-2xx replies exit with failure.
fn emit<T: Serialize>(reply: ApiReply<T>) -> Result<ExitCode, String> {
    let body = serde_json::to_string_pretty(&reply.body).map_err(|err| err.to_string())?;
    println!("{body}");
    if (200..300).contains(&reply.status) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
