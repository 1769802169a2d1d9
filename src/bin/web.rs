//! Single binary web server: JSON API over the championship service.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST (e.g. 0.0.0.0), PORT (e.g. 8080), CHAMPIONSHIP_SEED (u64, makes draws reproducible).

use std::sync::Mutex;

use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use championship_manager::{
    Advancement, BracketError, ChampionshipDraft, ChampionshipId, ChampionshipService, MatchDraft,
    MatchId, MemoryStore, Pairing, ServiceError, StoreError, TeamId, VenueId,
};
use chrono::{DateTime, Utc};
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

struct AppData {
    service: ChampionshipService<MemoryStore>,
    /// Randomness for group draws and random pairings.
    rng: Mutex<StdRng>,
}

type AppState = Data<AppData>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct NameBody {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreBody {
    home_score: u32,
    away_score: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleBody {
    #[serde(default)]
    match_time: Option<DateTime<Utc>>,
    #[serde(default)]
    venue_id: Option<VenueId>,
}

#[derive(Deserialize)]
struct KnockoutBody {
    #[serde(default)]
    pairing: Pairing,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChampionBody {
    team_id: TeamId,
}

/// Path segment: entity id (e.g. /api/championships/{id})
#[derive(Deserialize)]
struct IdPath {
    id: Uuid,
}

/// Path segments: championship id and match id.
#[derive(Deserialize)]
struct MatchPath {
    id: ChampionshipId,
    match_id: MatchId,
}

fn error_response(e: &ServiceError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        ServiceError::Validation(_) | ServiceError::Bracket(BracketError::Invalid(_)) => {
            HttpResponse::BadRequest().json(body)
        }
        ServiceError::ChampionshipNotFound(_)
        | ServiceError::MatchNotFound(_)
        | ServiceError::TeamNotFound(_)
        | ServiceError::VenueNotFound(_)
        | ServiceError::Store(StoreError::NotFound { .. }) => HttpResponse::NotFound().json(body),
        ServiceError::Bracket(_)
        | ServiceError::Store(StoreError::GuardFailed(_))
        | ServiceError::Store(StoreError::AlreadyExists { .. }) => HttpResponse::Conflict().json(body),
        ServiceError::Store(_) | ServiceError::Export(_) => {
            error!("Request failed: {}", e);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

fn respond<T: Serialize>(result: Result<T, ServiceError>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => error_response(&e),
    }
}

fn with_rng<T>(state: &AppState, f: impl FnOnce(&mut StdRng) -> Result<T, ServiceError>) -> Result<T, ServiceError> {
    match state.rng.lock() {
        Ok(mut rng) => f(&mut *rng),
        Err(_) => Err(StoreError::Poisoned.into()),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "championship-manager",
    })
}

#[get("/api/teams")]
async fn api_list_teams(state: AppState) -> HttpResponse {
    respond(state.service.teams())
}

#[post("/api/teams")]
async fn api_create_team(state: AppState, body: Json<NameBody>) -> HttpResponse {
    respond(state.service.create_team(&body.name))
}

/// Rename a team. Stored championship and match snapshots keep the old name.
#[put("/api/teams/{id}")]
async fn api_rename_team(state: AppState, path: Path<IdPath>, body: Json<NameBody>) -> HttpResponse {
    respond(state.service.rename_team(path.id, &body.name))
}

#[delete("/api/teams/{id}")]
async fn api_delete_team(state: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(state.service.delete_team(path.id))
}

#[get("/api/venues")]
async fn api_list_venues(state: AppState) -> HttpResponse {
    respond(state.service.venues())
}

#[post("/api/venues")]
async fn api_create_venue(state: AppState, body: Json<NameBody>) -> HttpResponse {
    respond(state.service.create_venue(&body.name))
}

#[put("/api/venues/{id}")]
async fn api_rename_venue(state: AppState, path: Path<IdPath>, body: Json<NameBody>) -> HttpResponse {
    respond(state.service.rename_venue(path.id, &body.name))
}

#[delete("/api/venues/{id}")]
async fn api_delete_venue(state: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(state.service.delete_venue(path.id))
}

#[get("/api/championships")]
async fn api_list_championships(state: AppState) -> HttpResponse {
    respond(state.service.championships())
}

/// Create a championship (groups are drawn at random unless given).
#[post("/api/championships")]
async fn api_create_championship(state: AppState, body: Json<ChampionshipDraft>) -> HttpResponse {
    respond(with_rng(&state, |rng| state.service.create_championship(&body, rng)))
}

#[get("/api/championships/{id}")]
async fn api_get_championship(state: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(state.service.championship(path.id))
}

/// Edit a championship (only before the knockout phase).
#[put("/api/championships/{id}")]
async fn api_edit_championship(
    state: AppState,
    path: Path<IdPath>,
    body: Json<ChampionshipDraft>,
) -> HttpResponse {
    respond(with_rng(&state, |rng| state.service.edit_championship(path.id, &body, rng)))
}

/// Delete a championship and all of its matches.
#[delete("/api/championships/{id}")]
async fn api_delete_championship(state: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(state.service.delete_championship(path.id))
}

#[get("/api/championships/{id}/matches")]
async fn api_list_matches(state: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(state.service.matches(path.id))
}

#[post("/api/championships/{id}/matches")]
async fn api_create_match(state: AppState, path: Path<IdPath>, body: Json<MatchDraft>) -> HttpResponse {
    respond(state.service.create_match(path.id, &body))
}

/// Regenerate all league/group fixtures. Deletes every existing match.
#[post("/api/championships/{id}/fixtures")]
async fn api_generate_fixtures(state: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(state.service.generate_fixtures(path.id))
}

#[put("/api/championships/{id}/matches/{match_id}/score")]
async fn api_record_score(state: AppState, path: Path<MatchPath>, body: Json<ScoreBody>) -> HttpResponse {
    respond(
        state
            .service
            .record_score(path.id, path.match_id, body.home_score, body.away_score),
    )
}

#[delete("/api/championships/{id}/matches/{match_id}/score")]
async fn api_clear_score(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    respond(state.service.clear_score(path.id, path.match_id))
}

#[put("/api/championships/{id}/matches/{match_id}/schedule")]
async fn api_reschedule_match(
    state: AppState,
    path: Path<MatchPath>,
    body: Json<ScheduleBody>,
) -> HttpResponse {
    respond(
        state
            .service
            .reschedule_match(path.id, path.match_id, body.match_time, body.venue_id),
    )
}

#[get("/api/championships/{id}/standings")]
async fn api_standings(state: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(state.service.standings(path.id))
}

#[get("/api/championships/{id}/standings.csv")]
async fn api_standings_csv(state: AppState, path: Path<IdPath>) -> HttpResponse {
    match state.service.standings_csv(path.id) {
        Ok(csv) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .body(csv),
        Err(e) => error_response(&e),
    }
}

#[get("/api/championships/{id}/group-stage")]
async fn api_group_stage_progress(state: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(state.service.group_stage_progress(path.id))
}

#[get("/api/championships/{id}/knockout")]
async fn api_bracket(state: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(state.service.bracket(path.id))
}

/// Generate the first knockout round once the group stage is finished.
#[post("/api/championships/{id}/knockout")]
async fn api_generate_knockout(
    state: AppState,
    path: Path<IdPath>,
    body: Option<Json<KnockoutBody>>,
) -> HttpResponse {
    let pairing = body.map(|b| b.pairing).unwrap_or_default();
    respond(with_rng(&state, |rng| {
        state.service.generate_knockout(path.id, pairing, rng)
    }))
}

/// Advance the current knockout round (final → champion).
#[post("/api/championships/{id}/knockout/advance")]
async fn api_advance_knockout(state: AppState, path: Path<IdPath>) -> HttpResponse {
    match state.service.advance_knockout(path.id) {
        Ok(Advancement::NextRound { stage, .. }) => match state.service.bracket(path.id) {
            Ok(rounds) => {
                let matches = rounds.into_iter().find(|r| r.stage == stage).map(|r| r.matches);
                HttpResponse::Ok().json(serde_json::json!({ "round": stage.name(), "matches": matches }))
            }
            Err(e) => error_response(&e),
        },
        Ok(Advancement::Champion { champion, .. }) => {
            HttpResponse::Ok().json(serde_json::json!({ "champion": champion }))
        }
        Err(e) => error_response(&e),
    }
}

/// Declare the league champion once every match is finished.
#[post("/api/championships/{id}/champion")]
async fn api_declare_champion(state: AppState, path: Path<IdPath>, body: Json<ChampionBody>) -> HttpResponse {
    respond(state.service.declare_champion(path.id, body.team_id))
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let rng = match std::env::var("CHAMPIONSHIP_SEED").ok().and_then(|s| s.parse::<u64>().ok()) {
        Some(seed) => {
            info!("Using fixed random seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };
    let bind = (host.as_str(), port);
    info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(AppData {
        service: ChampionshipService::new(MemoryStore::new()),
        rng: Mutex::new(rng),
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_list_teams)
            .service(api_create_team)
            .service(api_rename_team)
            .service(api_delete_team)
            .service(api_list_venues)
            .service(api_create_venue)
            .service(api_rename_venue)
            .service(api_delete_venue)
            .service(api_list_championships)
            .service(api_create_championship)
            .service(api_get_championship)
            .service(api_edit_championship)
            .service(api_delete_championship)
            .service(api_list_matches)
            .service(api_create_match)
            .service(api_generate_fixtures)
            .service(api_record_score)
            .service(api_clear_score)
            .service(api_reschedule_match)
            .service(api_standings_csv)
            .service(api_standings)
            .service(api_group_stage_progress)
            .service(api_bracket)
            .service(api_generate_knockout)
            .service(api_advance_knockout)
            .service(api_declare_champion)
    })
    .bind(bind)?
    .run()
    .await
}
