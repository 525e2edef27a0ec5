use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};

use gremium::config::AppConfig;
use gremium::db;
use gremium::docs::render::{DocumentRenderer, DocxTagRenderer};
use gremium::graph::calendar::{CalendarStore, GraphCalendarClient};
use gremium::graph::client::GraphClient;
use gremium::graph::drive::{DirectoryStore, GraphDirectoryClient};
use gremium::graph::profiles::{GraphProfileClient, ProfileStore};
use gremium::handlers;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env().unwrap_or_else(|err| {
        log::error!("{err}");
        std::process::exit(1);
    });

    // One pool for the whole process; every other client is stateless.
    let pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to create DB pool");
    db::run_migrations(&pool).await.expect("Failed to run migrations");

    let graph = GraphClient::new(&config.graph);
    let directory: Arc<dyn DirectoryStore> =
        Arc::new(GraphDirectoryClient::new(graph.clone(), &config.drives.site));
    let calendar: Arc<dyn CalendarStore> = Arc::new(GraphCalendarClient::new(
        graph.clone(),
        &config.calendar.event_mailbox,
    ));
    let profiles: Arc<dyn ProfileStore> = Arc::new(GraphProfileClient::new(graph));
    let renderer: Arc<dyn DocumentRenderer> = Arc::new(DocxTagRenderer);

    let directory_data = web::Data::from(directory);
    let calendar_data = web::Data::from(calendar);
    let profiles_data = web::Data::from(profiles);
    let renderer_data = web::Data::from(renderer);
    let config_data = web::Data::new(config.clone());

    log::info!("Starting server at http://{}", config.bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(pool.clone()))
            .app_data(config_data.clone())
            .app_data(directory_data.clone())
            .app_data(calendar_data.clone())
            .app_data(profiles_data.clone())
            .app_data(renderer_data.clone())
            .service(
                web::scope("/api")
                    // Board meetings
                    .route("/boardmeetings", web::get().to(handlers::meeting_handlers::list))
                    .route("/boardmeetings", web::post().to(handlers::meeting_handlers::create))
                    .route(
                        "/boardmeetings/update",
                        web::post().to(handlers::meeting_handlers::update),
                    )
                    .route(
                        "/boardmeetings/delete",
                        web::post().to(handlers::meeting_handlers::delete),
                    )
                    // Agenda items
                    .route("/agendaitems", web::get().to(handlers::agenda_handlers::list))
                    .route("/agenda/save", web::post().to(handlers::agenda_handlers::save))
                    .route(
                        "/agendaitems/event",
                        web::post().to(handlers::agenda_handlers::set_event_id),
                    )
                    .route(
                        "/agendaitems/delete",
                        web::post().to(handlers::agenda_handlers::delete),
                    )
                    // Folder structure
                    .route("/filestructure", web::post().to(handlers::file_handlers::ensure))
                    .route("/folderlink", web::get().to(handlers::file_handlers::folder_link))
                    // Documents
                    .route(
                        "/documents/agenda",
                        web::post().to(handlers::document_handlers::agenda_pdf),
                    )
                    .route(
                        "/documents/protocol",
                        web::post().to(handlers::document_handlers::protocol_docx),
                    )
                    // Invites
                    .route(
                        "/invites/status",
                        web::get().to(handlers::invite_handlers::status_overview),
                    )
                    .route(
                        "/invites/meeting",
                        web::post().to(handlers::invite_handlers::meeting_invite),
                    )
                    .route(
                        "/invites/agendaitem",
                        web::post().to(handlers::invite_handlers::item_invite),
                    )
                    .route(
                        "/invites/automation",
                        web::post().to(handlers::invite_handlers::run_automation),
                    )
                    .route(
                        "/calendaritem",
                        web::get().to(handlers::invite_handlers::calendar_item),
                    )
                    // User mappings and defaults
                    .route(
                        "/usermappings",
                        web::get().to(handlers::user_mapping_handlers::list),
                    )
                    .route(
                        "/usermappings",
                        web::post().to(handlers::user_mapping_handlers::replace),
                    )
                    .route("/rooms", web::get().to(handlers::settings_handlers::rooms))
                    .route(
                        "/participantgroups",
                        web::get().to(handlers::settings_handlers::participant_groups),
                    ),
            )
    })
    .bind(&config.bind_address)?
    .run()
    .await
}
