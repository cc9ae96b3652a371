//! Handlers for the info page, the torrent file download and the favicon.
use std::sync::Arc;

use axum::extract::{RawQuery, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use hyper::StatusCode;

use crate::container::HttpContainer;
use crate::servers::http::v1::query::Query;
use crate::servers::http::v1::requests::scrape::Scrape;

const ALAS: &str = "your file may exist elsewhere in the universe\nbut alas, not here\n";

/// The human-readable info page served at `/`.
pub async fn info_page(State(container): State<Arc<HttpContainer>>) -> Response {
    let scrape_data = container.scrape_handler.scrape_all().await;

    let mut page = String::new();
    page.push_str("Anomos tracker\n\n");
    page.push_str(&format!("tracked files: {}\n", scrape_data.files.len()));
    page.push_str(&format!("known peers:   {}\n\n", container.network.peer_count()));

    for (info_hash, metadata) in &scrape_data.files {
        let name = if container.core_config.show_names {
            container
                .in_memory_whitelist
                .get(info_hash)
                .await
                .map(|entry| format!("  {}", entry.name))
                .unwrap_or_default()
        } else {
            String::new()
        };
        page.push_str(&format!(
            "{info_hash}  complete: {}  downloading: {}  downloaded: {}{name}\n",
            metadata.complete, metadata.incomplete, metadata.downloaded,
        ));
    }

    if scrape_data.files.is_empty() {
        page.push_str("not tracking any files yet...\n");
    }

    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], page).into_response()
}

/// The torrent file download at `/file?info_hash=…`, gated on
/// `allow_get`.
pub async fn torrent_file(State(container): State<Arc<HttpContainer>>, RawQuery(raw_query): RawQuery) -> Response {
    if !container.core_config.allow_get {
        return (
            StatusCode::BAD_REQUEST,
            "get function is not available with this tracker.",
        )
            .into_response();
    }

    let query = Query::parse(raw_query.as_deref().unwrap_or(""));
    let Ok(scrape_request) = Scrape::from_query(&query) else {
        return (StatusCode::BAD_REQUEST, "invalid info_hash").into_response();
    };
    let Some(info_hash) = scrape_request.info_hashes.first() else {
        return (StatusCode::BAD_REQUEST, "missing info_hash").into_response();
    };

    let Some(entry) = container.in_memory_whitelist.get(info_hash).await else {
        return (StatusCode::NOT_FOUND, ALAS).into_response();
    };
    let Some(path) = entry.path else {
        return (StatusCode::NOT_FOUND, ALAS).into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "application/x-bittorrent".to_owned()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={}", entry.name),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("unable to read torrent file {}: {e}", path.display());
            (StatusCode::NOT_FOUND, ALAS).into_response()
        }
    }
}

/// The `/favicon.ico` endpoint, serving the configured icon.
pub async fn favicon(State(container): State<Arc<HttpContainer>>) -> Response {
    match &container.favicon {
        Some(bytes) => ([(header::CONTENT_TYPE, "image/x-icon")], bytes.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, ALAS).into_response(),
    }
}

#[cfg(test)]
mod tests {

    mod the_misc_handlers {
        use std::sync::Arc;

        use anomos_tracker_test_helpers::configuration;
        use axum::extract::{RawQuery, State};

        use crate::bootstrap::app::initialize_app_container;
        use crate::container::HttpContainer;
        use crate::servers::http::v1::handlers::misc::torrent_file;

        fn http_container() -> Arc<HttpContainer> {
            let config = configuration::ephemeral();
            let app_container = initialize_app_container(&config);
            Arc::new(HttpContainer::from_app_container(&app_container))
        }

        #[tokio::test]
        async fn the_file_endpoint_should_be_refused_when_allow_get_is_off() {
            let container = http_container();

            let response = torrent_file(
                State(container),
                RawQuery(Some("info_hash=AAAAAAAAAAAAAAAAAAAA".to_owned())),
            )
            .await;

            assert_eq!(response.status(), hyper::StatusCode::BAD_REQUEST);
        }
    }
}
