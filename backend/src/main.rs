#[macro_use]
extern crate rocket;

mod api;
mod config;
mod models;
mod services;
mod utils;

use elasticsearch::Elasticsearch;
use log::{error, info};
use models::StatusResponse;
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::State;
use services::{elasticsearch_service, session_service};

pub struct AppState {
    pub es_client: Elasticsearch,
    pub http: reqwest::Client,
}

#[get("/")]
fn index() -> RawHtml<&'static str> {
    RawHtml(
        "<html><body><h1>Starchat Backend</h1>\
         <p>Channel ingestion, analysis tools and chat persistence live under <code>/api</code>.</p>\
         </body></html>",
    )
}

#[get("/status")]
async fn status(state: &State<AppState>) -> Json<StatusResponse> {
    let users_count =
        session_service::count_index(&state.es_client, session_service::USERS_INDEX).await;
    let sessions_count =
        session_service::count_index(&state.es_client, session_service::SESSIONS_INDEX).await;
    Json(StatusResponse {
        users_count,
        sessions_count,
    })
}

#[launch]
async fn rocket() -> _ {
    config::load_environment();
    config::init_logger();

    let es_client = match config::create_elasticsearch_client() {
        Ok(client) => client,
        Err(e) => {
            panic!("Failed to create Elasticsearch client: {e:?}");
        }
    };
    if let Err(e) = elasticsearch_service::create_chat_indexes(&es_client).await {
        // Index creation is retried implicitly on first write; boot anyway.
        error!("Failed to create chat indexes: {e:?}");
    }

    let cors = match config::create_cors() {
        Ok(cors) => cors,
        Err(e) => {
            panic!("Failed to create CORS fairing: {e:?}");
        }
    };
    let state = AppState {
        es_client,
        http: reqwest::Client::new(),
    };
    info!("Starting backend");

    rocket::build()
        .manage(state)
        .attach(cors)
        .mount("/", routes![index])
        .mount(
            "/api",
            routes![status, api::get_video_transcript, api::generate_image],
        )
        .mount("/api/youtube", routes![api::download_channel])
        .mount("/api/tools", routes![api::list_tools, api::invoke_tool])
        .mount("/api/users", routes![api::register_user, api::login_user])
        .mount(
            "/api/sessions",
            routes![
                api::list_sessions,
                api::create_session,
                api::delete_session,
                api::set_session_title
            ],
        )
        .mount(
            "/api/messages",
            routes![api::append_message, api::list_messages],
        )
}
