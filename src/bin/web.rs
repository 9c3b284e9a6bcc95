//! Single binary web server: JSON API for creating and running tournaments.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST, PORT, TOURNAMENT_DIR (where tournaments are saved).

use actix_web::{
    delete, get, post,
    web::{self, Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use pinewood_tournament::{
    tournament_types, LimitedRound, PersistenceError, RankStat, StoreError, Tournament,
    TournamentError, TournamentOptions, TournamentStore, DEFAULT_SAVE_DIR,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Live tournaments, one lock per tournament name.
type AppState = Data<TournamentStore>;

/// Heats shown as "up next" when the client does not ask for a number.
const DEFAULT_MATCHUPS: usize = 2;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Serialize)]
struct TypesResponse {
    types: Vec<&'static str>,
    rank_stats: Vec<&'static str>,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    #[serde(rename = "type", default = "default_type")]
    tour_type: String,
    name: String,
    /// Player names as a list...
    #[serde(default)]
    players: Vec<String>,
    /// ...or as newline separated text (one player per line).
    #[serde(default)]
    players_text: Option<String>,
    /// Type-specific options as submitted by the form (unknown keys are ignored).
    #[serde(default)]
    options: HashMap<String, serde_json::Value>,
}

fn default_type() -> String {
    LimitedRound::TYPE_TAG.to_string()
}

#[derive(Deserialize)]
struct TimeEntry {
    player: String,
    time: f64,
    #[serde(default)]
    round: Option<u32>,
}

#[derive(Deserialize)]
struct SetTimesBody {
    times: Vec<TimeEntry>,
}

#[derive(Deserialize)]
struct UndoBody {
    #[serde(default = "default_undo")]
    n: usize,
}

fn default_undo() -> usize {
    1
}

#[derive(Deserialize)]
struct MatchupsQuery {
    n: Option<usize>,
}

#[derive(Deserialize)]
struct RatingsQuery {
    format: Option<String>,
}

/// Path segment: tournament name (e.g. /api/tournaments/{name})
#[derive(Deserialize)]
struct TournamentPath {
    name: String,
}

/// Tournament plus the derived progress fields the UI needs.
#[derive(Serialize)]
struct TournamentView<'a> {
    #[serde(flatten)]
    tournament: &'a Tournament,
    heat: usize,
    total_heats: usize,
    next_matchups: Vec<Vec<String>>,
}

fn view(tournament: &Tournament) -> serde_json::Value {
    let view = TournamentView {
        tournament,
        heat: tournament.heat(),
        total_heats: tournament.total_heats(),
        next_matchups: tournament.get_next_matchups(DEFAULT_MATCHUPS),
    };
    serde_json::to_value(view).unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }))
}

fn error_response(e: StoreError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        StoreError::Persistence(PersistenceError::NotFound { .. }) => {
            HttpResponse::NotFound().json(body)
        }
        StoreError::Persistence(PersistenceError::InvalidName(_))
        | StoreError::Tournament(_) => HttpResponse::BadRequest().json(body),
        StoreError::Stale(_) => HttpResponse::Conflict().json(body),
        _ => {
            log::error!("{}", e);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

/// Run store work that touches the disk off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, HttpResponse>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    match web::block(f).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(error_response(e)),
        Err(e) => {
            log::error!("blocking task failed: {}", e);
            Err(HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "internal error" })))
        }
    }
}

fn form_value(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "pinewood-tournament",
    })
}

/// Registered tournament types and the statistics a ranking can use.
#[get("/api/tournament-types")]
async fn api_tournament_types() -> impl Responder {
    HttpResponse::Ok().json(TypesResponse {
        types: tournament_types().types(),
        rank_stats: RankStat::ALL.iter().map(|s| s.as_str()).collect(),
    })
}

/// Names of live and saved tournaments.
#[get("/api/tournaments")]
async fn api_list_tournaments(state: AppState) -> HttpResponse {
    match blocking(move || state.names()).await {
        Ok(names) => HttpResponse::Ok().json(names),
        Err(resp) => resp,
    }
}

/// Create (or replace) a tournament and save it.
#[post("/api/tournaments")]
async fn api_create_tournament(state: AppState, body: Json<CreateTournamentBody>) -> HttpResponse {
    let body = body.into_inner();
    let fields: HashMap<String, String> = body
        .options
        .iter()
        .map(|(k, v)| (k.clone(), form_value(v)))
        .collect();
    let options = match TournamentOptions::from_form(&fields) {
        Ok(o) => o,
        Err(e) => return error_response(e.into()),
    };
    let mut players = body.players;
    if let Some(text) = body.players_text {
        players.extend(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_owned),
        );
    }
    let result = blocking(move || {
        let handle = state.create(&body.tour_type, &body.name, players, options)?;
        let guard = handle.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(view(&guard))
    })
    .await;
    match result {
        Ok(v) => HttpResponse::Ok().json(v),
        Err(resp) => resp,
    }
}

/// Get a tournament by name (loaded from disk if not live; 404 if unknown).
#[get("/api/tournaments/{name}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let name = path.into_inner().name;
    match blocking(move || state.read(&name, view)).await {
        Ok(v) => HttpResponse::Ok().json(v),
        Err(resp) => resp,
    }
}

/// Delete a tournament (no error if it does not exist).
#[delete("/api/tournaments/{name}")]
async fn api_delete_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let name = path.into_inner().name;
    match blocking(move || state.remove(&name)).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(resp) => resp,
    }
}

/// Next heats that still need times.
#[get("/api/tournaments/{name}/matchups")]
async fn api_matchups(
    state: AppState,
    path: Path<TournamentPath>,
    query: Query<MatchupsQuery>,
) -> HttpResponse {
    let name = path.into_inner().name;
    let n = query.n.unwrap_or(DEFAULT_MATCHUPS);
    match blocking(move || state.read(&name, |t| t.get_next_matchups(n))).await {
        Ok(m) => HttpResponse::Ok().json(m),
        Err(resp) => resp,
    }
}

/// Enter times. Either every entry is applied and saved, or none is.
#[post("/api/tournaments/{name}/times")]
async fn api_set_times(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<SetTimesBody>,
) -> HttpResponse {
    let name = path.into_inner().name;
    let entries = body.into_inner().times;
    if entries.iter().any(|e| e.time < 0.0) {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "All times must be numbers of 0 or greater" }));
    }
    let result = blocking(move || {
        state.update(&name, |t| {
            for e in &entries {
                t.set_time(&e.player, e.time, e.round)?;
            }
            Ok::<_, TournamentError>(view(t))
        })
    })
    .await;
    match result {
        Ok(v) => HttpResponse::Ok().json(v),
        Err(resp) => resp,
    }
}

/// Clear the most recently completed heats.
#[post("/api/tournaments/{name}/undo")]
async fn api_undo(
    state: AppState,
    path: Path<TournamentPath>,
    body: Option<Json<UndoBody>>,
) -> HttpResponse {
    let name = path.into_inner().name;
    let n = body.map(|b| b.n).unwrap_or_else(default_undo);
    let result = blocking(move || {
        state.update(&name, |t| {
            t.undo(n);
            Ok(view(t))
        })
    })
    .await;
    match result {
        Ok(v) => HttpResponse::Ok().json(v),
        Err(resp) => resp,
    }
}

/// Current ratings as JSON, or CSV with `?format=csv`.
#[get("/api/tournaments/{name}/ratings")]
async fn api_ratings(
    state: AppState,
    path: Path<TournamentPath>,
    query: Query<RatingsQuery>,
) -> HttpResponse {
    let name = path.into_inner().name;
    let ratings = match blocking(move || state.read(&name, Tournament::get_ratings)).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    if query.format.as_deref() != Some("csv") {
        return HttpResponse::Ok().json(ratings);
    }
    let mut buf = Vec::new();
    match ratings.write_csv(&mut buf) {
        Ok(()) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .body(buf),
        Err(e) => {
            log::error!("Failed to write ratings CSV: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() }))
        }
    }
}

/// Process configuration read from the environment.
struct Config {
    host: String,
    port: u16,
    tournament_dir: String,
}

impl Config {
    fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| default_host()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(default_port),
            tournament_dir: std::env::var("TOURNAMENT_DIR")
                .unwrap_or_else(|_| DEFAULT_SAVE_DIR.to_string()),
        }
    }
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

    let config = Config::from_env();
    log::info!(
        "Starting server at http://{}:{} (tournaments in {})",
        config.host,
        config.port,
        config.tournament_dir
    );

    let state = Data::new(TournamentStore::new(&config.tournament_dir));
    match state.names() {
        Ok(names) => log::info!("{} saved tournament(s) available", names.len()),
        Err(e) => log::warn!("Could not list saved tournaments: {}", e),
    }

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_tournament_types)
            .service(api_list_tournaments)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_delete_tournament)
            .service(api_matchups)
            .service(api_set_times)
            .service(api_undo)
            .service(api_ratings)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
