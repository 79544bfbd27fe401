use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, Response, StatusCode, header},
};
use serde_json::{Value, json};
use slowcinema::{AppState, Store};
use tower::ServiceExt;

async fn app_with_rps(rps: u32) -> Router {
    let store = Store::in_memory().await.unwrap();
    let (state, _worker) = AppState::new(store, "https://example.org", rps);
    slowcinema::app(state)
}

async fn app() -> Router {
    app_with_rps(100).await
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        },
        None => Body::empty(),
    };
    app.clone().oneshot(req.body(body).unwrap()).await.unwrap()
}

async fn body_text(resp: Response<Body>) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(resp: Response<Body>) -> Value {
    serde_json::from_str(&body_text(resp).await).unwrap()
}

fn header_str<'a>(resp: &'a Response<Body>, name: &str) -> &'a str {
    resp.headers().get(name).and_then(|v| v.to_str().ok()).unwrap_or_default()
}

async fn add_movie(app: &Router, movie: Value) -> Value {
    let resp = send(app, Method::POST, "/api/movies", Some(movie)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

async fn removed_by(app: &Router, uri: &str) -> u64 {
    let resp = send(app, Method::POST, uri, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await["removed"].as_u64().unwrap()
}

#[tokio::test]
async fn review_lifecycle() {
    let app = app().await;

    let x = body_json(send(&app, Method::POST, "/api/reviews", Some(json!({"title": "X"}))).await)
        .await;
    let y = body_json(send(&app, Method::POST, "/api/reviews", Some(json!({"title": "Y"}))).await)
        .await;
    assert_eq!(x["id"], 1);
    assert_eq!(y["id"], 2);

    let warm = send(&app, Method::GET, "/api/reviews/1", None).await;
    assert_eq!(header_str(&warm, "x-cache"), "MISS");
    let warm = send(&app, Method::GET, "/api/reviews/1", None).await;
    assert_eq!(header_str(&warm, "x-cache"), "HIT");
    send(&app, Method::GET, "/api/reviews", None).await;

    let resp = send(&app, Method::DELETE, "/api/reviews/1", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"success": true}));

    let resp = send(&app, Method::GET, "/api/reviews/1", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"], "Review not found");

    let list = send(&app, Method::GET, "/api/reviews", None).await;
    assert_eq!(header_str(&list, "x-cache"), "MISS");
    let titles: Vec<Value> =
        body_json(list).await.as_array().unwrap().iter().map(|r| r["title"].clone()).collect();
    assert_eq!(titles, vec![json!("Y")]);

    let uid = y["uid"].as_str().unwrap();
    let resp = send(&app, Method::GET, &format!("/api/reviews/{uid}"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["title"], "Y");

    let resp = send(&app, Method::GET, "/api/reviews/not-an-id", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn review_writes_invalidate_cached_reads() {
    let app = app().await;
    send(&app, Method::GET, "/api/reviews", None).await;
    send(&app, Method::POST, "/api/reviews", Some(json!({"title": "Ordet"}))).await;

    let list = send(&app, Method::GET, "/api/reviews", None).await;
    assert_eq!(header_str(&list, "x-cache"), "MISS");
    assert_eq!(body_json(list).await[0]["title"], "Ordet");

    let first = send(&app, Method::GET, "/api/reviews/1", None).await;
    assert_eq!(header_str(&first, "x-cache"), "MISS");
    assert_eq!(
        header_str(&first, "cache-control"),
        "public, s-maxage=30, stale-while-revalidate=10"
    );
    let second = send(&app, Method::GET, "/api/reviews/1", None).await;
    assert_eq!(header_str(&second, "x-cache"), "HIT");
    send(&app, Method::GET, "/api/reviews", None).await;

    let resp =
        send(&app, Method::PUT, "/api/reviews/1", Some(json!({"title": "Gertrud"}))).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let third = send(&app, Method::GET, "/api/reviews/1", None).await;
    assert_eq!(header_str(&third, "x-cache"), "MISS");
    assert_eq!(body_json(third).await["title"], "Gertrud");

    let list = send(&app, Method::GET, "/api/reviews", None).await;
    assert_eq!(header_str(&list, "x-cache"), "MISS");
    assert_eq!(body_json(list).await[0]["title"], "Gertrud");
}

#[tokio::test]
async fn movie_listing_validates_parameters() {
    let app = app().await;
    for uri in [
        "/api/movies?limit=0",
        "/api/movies?limit=101",
        "/api/movies?limit=ten",
        "/api/movies?skip=-1",
    ] {
        let resp = send(&app, Method::GET, uri, None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert!(body_json(resp).await["error"].as_str().unwrap().starts_with("Invalid"));
    }
}

#[tokio::test]
async fn movie_ingest_and_listing() {
    let app = app().await;
    add_movie(&app, json!({"title": "Stalker", "year": 1979, "language": "Russisch"})).await;
    add_movie(&app, json!({"title": "Ordet", "year": 1955})).await;

    let resp = send(&app, Method::POST, "/api/movies", Some(json!({"title": "STALKER!"}))).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = send(&app, Method::POST, "/api/movies", Some(json!({"title": "  "}))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(&app, Method::GET, "/api/movies?limit=1&sort=title&order=asc", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        header_str(&resp, "cache-control"),
        "public, s-maxage=3600, stale-while-revalidate=86400"
    );
    let page = body_json(resp).await;
    assert_eq!(page["movies"].as_array().unwrap().len(), 1);
    assert_eq!(page["movies"][0]["title"], "Ordet");
    assert_eq!(page["pagination"], json!({"total": 2, "limit": 1, "skip": 0, "hasMore": true}));
}

#[tokio::test]
async fn detail_page_resolves_slug() {
    let app = app().await;
    add_movie(
        &app,
        json!({
            "title": "Stalker",
            "year": 1979,
            "director": "Andrei Tarkovsky",
            "description": "Into the *Zone*.",
            "rating": 8.1,
            "votecount": 12
        }),
    )
    .await;

    let resp = send(&app, Method::GET, "/reviews/stalker", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(header_str(&resp, "content-type").starts_with("text/html"));
    let html = body_text(resp).await;
    assert!(html.contains("Stalker (1979)"));
    assert!(html.contains("<em>Zone</em>"));
    assert!(html.contains("application/ld+json"));

    let resp = send(&app, Method::GET, "/reviews/solaris", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_text(resp).await.contains("Review not found"));
}

#[tokio::test]
async fn detail_page_is_shared_across_slug_casing() {
    let app = app().await;
    add_movie(&app, json!({"title": "Stalker", "year": 1979})).await;

    let first = send(&app, Method::GET, "/reviews/Stalker", None).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(header_str(&first, "x-cache"), "MISS");
    let second = send(&app, Method::GET, "/reviews/stalker", None).await;
    assert_eq!(header_str(&second, "x-cache"), "HIT");

    assert_eq!(removed_by(&app, "/api/revalidate?movieSlug=stalker").await, 1);
    let resp = send(&app, Method::GET, "/reviews/Stalker", None).await;
    assert_eq!(header_str(&resp, "x-cache"), "MISS");

    assert_eq!(removed_by(&app, "/api/revalidate?movieSlug=Stalker").await, 1);
    let resp = send(&app, Method::GET, "/reviews/STALKER", None).await;
    assert_eq!(header_str(&resp, "x-cache"), "MISS");
}

#[tokio::test]
async fn legacy_url_detail_pages_follow_item_revalidation() {
    let app = app().await;
    add_movie(
        &app,
        json!({
            "title": "The Turin Horse",
            "year": 2011,
            "url": "https://example.org/film/a-torinoi-lo"
        }),
    )
    .await;

    let resp = send(&app, Method::GET, "/reviews/a-torinoi-lo", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("The Turin Horse"));
    let resp = send(&app, Method::GET, "/reviews/a-torinoi-lo", None).await;
    assert_eq!(header_str(&resp, "x-cache"), "HIT");

    assert_eq!(removed_by(&app, "/api/revalidate?movieSlug=the-turin-horse").await, 1);
    let resp = send(&app, Method::GET, "/reviews/a-torinoi-lo", None).await;
    assert_eq!(header_str(&resp, "x-cache"), "MISS");

    // Either slug drops the page cached under the other.
    send(&app, Method::GET, "/reviews/the-turin-horse", None).await;
    assert_eq!(removed_by(&app, "/api/revalidate?movieSlug=a-torinoi-lo").await, 2);
    let resp = send(&app, Method::GET, "/reviews/the-turin-horse", None).await;
    assert_eq!(header_str(&resp, "x-cache"), "MISS");
}

#[tokio::test]
async fn new_movies_show_up_in_warm_listings() {
    let app = app().await;
    let empty = body_json(send(&app, Method::GET, "/api/movies", None).await).await;
    assert_eq!(empty["pagination"]["total"], 0);
    send(&app, Method::GET, "/feed.xml", None).await;

    add_movie(&app, json!({"title": "Ordet", "year": 1955})).await;

    let resp = send(&app, Method::GET, "/api/movies", None).await;
    assert_eq!(header_str(&resp, "x-cache"), "MISS");
    assert_eq!(body_json(resp).await["pagination"]["total"], 1);
    let resp = send(&app, Method::GET, "/feed.xml", None).await;
    assert_eq!(header_str(&resp, "x-cache"), "MISS");
    assert_eq!(body_text(resp).await.matches("<item>").count(), 1);
}

#[tokio::test]
async fn unrelated_query_strings_share_a_cache_entry() {
    let app = app().await;
    add_movie(&app, json!({"title": "Ordet"})).await;

    let first = send(&app, Method::GET, "/feed.xml", None).await;
    assert_eq!(header_str(&first, "x-cache"), "MISS");
    for i in 0..50 {
        let resp = send(&app, Method::GET, &format!("/feed.xml?cb={i}"), None).await;
        assert_eq!(header_str(&resp, "x-cache"), "HIT", "cb={i}");
    }

    let first = send(&app, Method::GET, "/api/movies?limit=10&cb=1", None).await;
    assert_eq!(header_str(&first, "x-cache"), "MISS");
    let second = send(&app, Method::GET, "/api/movies?cb=2&order=DESC&limit=10", None).await;
    assert_eq!(header_str(&second, "x-cache"), "HIT");

    send(&app, Method::GET, "/reviews?sort=title&page=1", None).await;
    let resp = send(&app, Method::GET, "/reviews?page=1&sort=title&utm_source=x", None).await;
    assert_eq!(header_str(&resp, "x-cache"), "HIT");
}

#[tokio::test]
async fn homepage_and_index_render() {
    let app = app().await;
    for i in 0..6 {
        add_movie(&app, json!({"title": format!("Film {i}")})).await;
    }

    let resp = send(&app, Method::GET, "/", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("Latest reviews"));
    assert!(html.contains("Featured this week"));

    let resp = send(&app, Method::GET, "/reviews?sort=title", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains(r#"href="/reviews/film-0""#));
}

#[tokio::test]
async fn feed_and_sitemap() {
    let app = app().await;
    add_movie(&app, json!({"title": "The Turin Horse", "year": 2011})).await;

    let resp = send(&app, Method::GET, "/feed.xml", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_str(&resp, "content-type"), "application/xml");
    assert_eq!(
        header_str(&resp, "cache-control"),
        "public, max-age=3600, s-maxage=3600, stale-while-revalidate=86400"
    );
    let xml = body_text(resp).await;
    assert_eq!(xml.matches("<item>").count(), 1);
    assert!(xml.contains("<link>https://example.org/reviews/the-turin-horse</link>"));

    let resp = send(&app, Method::GET, "/sitemap.xml", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let xml = body_text(resp).await;
    assert!(xml.contains("<loc>https://example.org/reviews/the-turin-horse</loc>"));
    assert!(xml.contains("<loc>https://example.org/feed.xml</loc>"));
}

#[tokio::test]
async fn revalidate_requires_a_target() {
    let app = app().await;
    let resp = send(&app, Method::POST, "/api/revalidate", None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    send(&app, Method::GET, "/feed.xml", None).await;
    let resp = send(&app, Method::POST, "/api/revalidate?movieSlug=stalker", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["revalidated"], true);
    assert_eq!(body["tag"], "movie-stalker");
    assert_eq!(body["removed"], 1);

    let audit = body_json(send(&app, Method::GET, "/api/revalidate", None).await).await;
    assert_eq!(audit[0]["target"], "tag:movie-stalker");
    assert_eq!(audit[0]["status"], "applied");
}

#[tokio::test]
async fn revalidate_is_rate_limited() {
    let app = app_with_rps(1).await;
    let first = send(&app, Method::POST, "/api/revalidate?tag=movies", None).await;
    assert_eq!(first.status(), StatusCode::OK);
    let second = send(&app, Method::POST, "/api/revalidate?tag=movies", None).await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn language_migration_rewrites_labels() {
    let app = app().await;
    add_movie(&app, json!({"title": "Zwartboek", "language": "Nederlands, Engels"})).await;
    add_movie(&app, json!({"title": "Ida", "language": "pl"})).await;

    let resp = send(&app, Method::POST, "/api/admin/migrate-languages", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["updated"], 1);

    let page = body_json(send(&app, Method::GET, "/api/movies?sort=title&order=desc", None).await)
        .await;
    assert_eq!(page["movies"][0]["language"], "nl, en");
}
