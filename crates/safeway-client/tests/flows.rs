//! Route search and navigation flows against mocked geocoding and API
//! servers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use safeway_client::{
    clear_history_list, location_label, remove_contact, remove_history_entry, search_routes,
    start_navigation, ApiClient, AuthPayload, ClientError, EmergencyContact, HistoryEntry,
    NavigationRequest, Session,
};
use safeway_core::{Coordinate, RouteVariant};
use safeway_geocode::GeocodeClient;
use safeway_route::{
    default_path, GeoError, LocationProvider, NavError, TrackerState, WatchSubscription,
};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn envelope(data: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "data": data,
        "meta": { "request_id": "req-1", "timestamp": "2026-03-01T00:00:00Z" }
    })
}

fn session() -> Session {
    Session::Anonymous.login(AuthPayload {
        uid: Uuid::new_v4(),
        token: "tok".to_owned(),
        name: "Alice".to_owned(),
    })
}

fn keyword_hit(name: &str, lat: f64, lng: f64) -> serde_json::Value {
    serde_json::json!({
        "documents": [{
            "place_name": name,
            "address_name": "",
            "road_address_name": "",
            "x": lng.to_string(),
            "y": lat.to_string()
        }]
    })
}

async fn mount_scoring(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/route/safety"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(serde_json::json!({
            "safetyScore": 78, "cctvCount": 5, "lightCount": 10, "reportCount": 1
        }))))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_scores_geocoded_path_and_ranks_safety_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/local/search/keyword.json"))
        .and(query_param("query", "Seoul Station"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(keyword_hit("Seoul Station", 37.5547, 126.9707)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/local/search/keyword.json"))
        .and(query_param("query", "City Hall"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(keyword_hit("City Hall", 37.5663, 126.9779)),
        )
        .mount(&server)
        .await;
    mount_scoring(&server).await;

    let geocoder = GeocodeClient::with_base_url("key", 5, &server.uri()).expect("geocoder");
    let api = ApiClient::new(&server.uri(), 5).expect("api");

    let options = search_routes(&geocoder, &api, &session(), "Seoul Station", "City Hall")
        .await
        .expect("search");

    assert!(!options.used_default_path);
    assert_eq!(options.start_label, "Seoul Station");
    assert_eq!(options.end_label, "City Hall");
    assert!(options.path.len() > 2);

    let [safety, shortest, balanced] = &options.variants;
    assert_eq!(safety.variant, RouteVariant::Safety);
    assert!(safety.recommended && !safety.synthetic);
    assert_eq!((shortest.cctv_count, shortest.light_count, shortest.score), (3, 5, 72));
    assert_eq!(balanced.score, 85);
    assert_eq!(options.recommended().variant, RouteVariant::Safety);
}

#[tokio::test]
async fn unknown_place_falls_back_to_default_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/local/search/keyword.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"documents": []})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/local/search/address.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"documents": []})))
        .mount(&server)
        .await;
    mount_scoring(&server).await;

    let geocoder = GeocodeClient::with_base_url("key", 5, &server.uri()).expect("geocoder");
    let api = ApiClient::new(&server.uri(), 5).expect("api");

    let options = search_routes(&geocoder, &api, &session(), "Atlantis", "El Dorado")
        .await
        .expect("fallback search");

    assert!(options.used_default_path);
    assert_eq!(options.path, default_path());
    assert_eq!(options.start_label, "Atlantis");
    assert_eq!(options.variants[0].score, 78);
}

#[tokio::test]
async fn blank_query_is_validation_error() {
    let server = MockServer::start().await;
    let geocoder = GeocodeClient::with_base_url("key", 5, &server.uri()).expect("geocoder");
    let api = ApiClient::new(&server.uri(), 5).expect("api");

    let err = search_routes(&geocoder, &api, &session(), "  ", "City Hall")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)), "got {err:?}");
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

struct ScriptedProvider {
    rx: Mutex<Option<mpsc::Receiver<Result<Coordinate, GeoError>>>>,
    unsubscribed: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    async fn with_fixes(fixes: &[Coordinate]) -> (Self, Arc<AtomicUsize>) {
        let (tx, rx) = mpsc::channel(fixes.len().max(1));
        for fix in fixes {
            tx.send(Ok(*fix)).await.expect("send fix");
        }
        let unsubscribed = Arc::new(AtomicUsize::new(0));
        (
            Self {
                rx: Mutex::new(Some(rx)),
                unsubscribed: Arc::clone(&unsubscribed),
            },
            unsubscribed,
        )
    }
}

impl LocationProvider for ScriptedProvider {
    fn watch(&self) -> Result<WatchSubscription, GeoError> {
        let rx = self
            .rx
            .lock()
            .expect("lock")
            .take()
            .ok_or(GeoError::PositionUnavailable)?;
        let counter = Arc::clone(&self.unsubscribed);
        Ok(WatchSubscription::new(rx, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

fn chosen_route() -> (Vec<Coordinate>, safeway_route::RouteMetrics) {
    let path = default_path();
    let assessment = safeway_route::SafetyAssessment {
        safety_score: 78,
        cctv_count: 5,
        light_count: 10,
        report_count: 0,
    };
    let [safety, _, _] = safeway_route::compare_variants(&path, &assessment);
    (path, safety)
}

#[tokio::test]
async fn navigation_records_history_and_arrives() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/history"))
        .respond_with(ResponseTemplate::new(201).set_body_json(envelope(serde_json::json!({
            "id": Uuid::new_v4(),
            "start_label": "Seoul Station",
            "end_label": "City Hall",
            "score": 78,
            "distance": "28m",
            "time": "1min",
            "created_at": "2026-03-01T00:00:00Z"
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), 5).expect("api");
    let (path, metrics) = chosen_route();
    let destination = *path.last().expect("destination");
    let (provider, unsubscribed) = ScriptedProvider::with_fixes(&[path[1], destination]).await;
    let (_cancel_tx, cancel_rx) = oneshot::channel();

    let mut updates = 0;
    let outcome = start_navigation(
        &api,
        &session(),
        NavigationRequest {
            start_label: "Seoul Station",
            end_label: "City Hall",
            path,
            metrics: &metrics,
        },
        &provider,
        cancel_rx,
        |_| updates += 1,
    )
    .await
    .expect("navigation");

    assert_eq!(outcome.final_state, TrackerState::Arrived);
    assert!(outcome.history_saved);
    assert!(updates >= 1);
    assert_eq!(unsubscribed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_history_write_does_not_stop_navigation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/history"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), 5).expect("api");
    let (path, metrics) = chosen_route();
    let destination = *path.last().expect("destination");
    let (provider, _) = ScriptedProvider::with_fixes(&[destination]).await;
    let (_cancel_tx, cancel_rx) = oneshot::channel();

    let outcome = start_navigation(
        &api,
        &session(),
        NavigationRequest {
            start_label: "a",
            end_label: "b",
            path,
            metrics: &metrics,
        },
        &provider,
        cancel_rx,
        |_| {},
    )
    .await
    .expect("navigation");

    assert_eq!(outcome.final_state, TrackerState::Arrived);
    assert!(!outcome.history_saved);
}

#[tokio::test]
async fn untrackable_path_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), 5).expect("api");
    let (_, metrics) = chosen_route();
    let (provider, _) = ScriptedProvider::with_fixes(&[]).await;
    let (_cancel_tx, cancel_rx) = oneshot::channel();

    let err = start_navigation(
        &api,
        &session(),
        NavigationRequest {
            start_label: "a",
            end_label: "b",
            path: vec![Coordinate::new(37.5, 127.0)],
            metrics: &metrics,
        },
        &provider,
        cancel_rx,
        |_| {},
    )
    .await
    .unwrap_err();

    assert_eq!(err, NavError::PathTooShort(1));
}

// ---------------------------------------------------------------------------
// SOS location label
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sos_label_prefers_road_address() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/local/geo/coord2address.json"))
        .and(query_param("x", "126.978"))
        .and(query_param("y", "37.5665"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "documents": [{
                "road_address": { "address_name": "110 Sejong-daero, Jung-gu" },
                "address": { "address_name": "31 Taepyeongno 1-ga" }
            }]
        })))
        .mount(&server)
        .await;

    let geocoder = GeocodeClient::with_base_url("key", 5, &server.uri()).expect("geocoder");
    let label = location_label(&geocoder, Some(Coordinate::new(37.5665, 126.978))).await;

    assert_eq!(label, "110 Sejong-daero, Jung-gu");
}

#[tokio::test]
async fn sos_label_falls_back_to_coordinate_on_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let geocoder = GeocodeClient::with_base_url("key", 5, &server.uri()).expect("geocoder");

    let label = location_label(&geocoder, Some(Coordinate::new(37.5, 127.0))).await;
    assert_eq!(label, "37.500000,127.000000");
    assert_eq!(location_label(&geocoder, None).await, "location unavailable");
}

// ---------------------------------------------------------------------------
// Optimistic deletes
// ---------------------------------------------------------------------------

fn contact_json(id: Uuid, name: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id, "name": name, "phone": "010-0000-0000", "relation": null,
        "created_at": "2026-03-01T00:00:00Z"
    })
}

fn history_json(id: Uuid) -> serde_json::Value {
    serde_json::json!({
        "id": id, "start_label": "Home", "end_label": "Work", "score": 70,
        "distance": "1.2km", "time": "15min", "created_at": "2026-03-01T00:00:00Z"
    })
}

fn server_error() -> ResponseTemplate {
    ResponseTemplate::new(500).set_body_json(serde_json::json!({
        "error": { "code": "internal_error", "message": "database query failed" },
        "meta": { "request_id": "req-1", "timestamp": "2026-03-01T00:00:00Z" }
    }))
}

fn contacts(ids: &[Uuid]) -> Vec<EmergencyContact> {
    ids.iter()
        .map(|id| serde_json::from_value(contact_json(*id, "Mom")).expect("contact"))
        .collect()
}

fn history(ids: &[Uuid]) -> Vec<HistoryEntry> {
    ids.iter()
        .map(|id| serde_json::from_value(history_json(*id)).expect("history entry"))
        .collect()
}

#[tokio::test]
async fn removed_contact_stays_gone_when_server_agrees() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/contacts/delete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            serde_json::json!({ "deleted": true }),
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/contacts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(serde_json::json!([]))))
        .expect(0)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), 5).expect("api");
    let (keep, gone) = (Uuid::new_v4(), Uuid::new_v4());
    let mut list = contacts(&[keep, gone]);

    remove_contact(&api, &session(), &mut list, gone).await.expect("delete");
    assert_eq!(list.iter().map(|c| c.id).collect::<Vec<_>>(), vec![keep]);
}

#[tokio::test]
async fn failed_contact_delete_refetches_the_list() {
    let server = MockServer::start().await;
    let (keep, gone) = (Uuid::new_v4(), Uuid::new_v4());
    Mock::given(method("POST"))
        .and(path("/api/contacts/delete"))
        .respond_with(server_error())
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/contacts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(serde_json::json!([
            contact_json(keep, "Mom"),
            contact_json(gone, "Dad")
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), 5).expect("api");
    let mut list = contacts(&[keep, gone]);

    let err = remove_contact(&api, &session(), &mut list, gone)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 500, .. }), "got {err:?}");
    assert_eq!(list.len(), 2);
    assert_eq!(list[1].name, "Dad");
}

#[tokio::test]
async fn failed_history_delete_with_failed_refetch_restores_the_list() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(server_error())
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/history"))
        .respond_with(server_error())
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), 5).expect("api");
    let ids = [Uuid::new_v4(), Uuid::new_v4()];
    let mut list = history(&ids);

    let err = remove_history_entry(&api, &session(), &mut list, ids[0])
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 500, .. }), "got {err:?}");
    assert_eq!(list, history(&ids));
}

#[tokio::test]
async fn failed_history_clear_refetches_the_list() {
    let server = MockServer::start().await;
    let survivor = Uuid::new_v4();
    Mock::given(method("DELETE"))
        .and(path("/api/history"))
        .respond_with(server_error())
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/history"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(serde_json::json!([history_json(survivor)]))),
        )
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), 5).expect("api");
    let mut list = history(&[survivor, Uuid::new_v4()]);

    clear_history_list(&api, &session(), &mut list)
        .await
        .unwrap_err();
    assert_eq!(list, history(&[survivor]));
}
