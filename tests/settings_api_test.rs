use actix_web::http::StatusCode;
use actix_web::{test, web, App};

use gremium::config::{
    AppConfig, CalendarConfig, DefaultsConfig, DriveConfig, GraphConfig,
};
use gremium::handlers::settings_handlers;

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://localhost/test".into(),
        bind_address: "127.0.0.1:0".into(),
        graph: GraphConfig {
            base_url: "https://graph.example/v1.0".into(),
            access_token: "token".into(),
        },
        drives: DriveConfig {
            site: "site".into(),
            meetings_drive_id: "meetings".into(),
            meetings_root_folder_id: "root".into(),
            unassigned_pool_folder_id: "pool".into(),
            assets_drive_id: "assets".into(),
            agenda_template_file_id_de: String::new(),
            agenda_template_file_id_en: String::new(),
            protocol_template_file_id_de: String::new(),
            protocol_template_file_id_en: String::new(),
        },
        calendar: CalendarConfig {
            event_mailbox: "events@example.com".into(),
            online_meeting_hosts: "host@example.com".into(),
        },
        defaults: DefaultsConfig {
            rooms: vec!["R-401".into(), "R-402".into()],
            participant_groups: vec!["Board".into()],
        },
    }
}

#[actix_rt::test]
async fn rooms_endpoint_enforces_the_token_precondition() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_config()))
            .route("/api/rooms", web::get().to(settings_handlers::rooms)),
    )
    .await;

    let response = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/rooms").to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/rooms")
            .insert_header(("Authorization", "Bearer t"))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rooms: Vec<String> = test::read_body_json(response).await;
    assert_eq!(rooms, vec!["R-401", "R-402"]);
}
