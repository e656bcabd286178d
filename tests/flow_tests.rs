// tests/flow_tests.rs
//
// End-to-end flows against a real Postgres. Skipped when DATABASE_URL is unset.

use gamesphere::{config::Config, routes, state::AppState};
use serde_json::{Value, json};
use sqlx::{PgPool, postgres::PgPoolOptions};

struct TestApp {
    address: String,
    pool: PgPool,
    client: reqwest::Client,
}

struct TestUser {
    id: i64,
    token: String,
}

async fn spawn_app() -> Option<TestApp> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url,
        jwt_secret: "flow_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        port: 0,
        cors_origins: vec![],
        admin_username: None,
        admin_email: None,
        admin_password: None,
    };

    let app = routes::create_router(AppState::new(pool.clone(), config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Some(TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
        client: reqwest::Client::new(),
    })
}

fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..10])
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn register(&self, prefix: &str) -> TestUser {
        let name = unique(prefix);
        let body: Value = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "username": name,
                "email": format!("{}@example.com", name),
                "password": "password123"
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        TestUser {
            id: body["user"]["id"].as_i64().expect("user id"),
            token: body["token"].as_str().expect("token").to_string(),
        }
    }

    async fn admin(&self) -> TestUser {
        let name = unique("admin");
        let email = format!("{}@example.com", name);
        self.client
            .post(self.url("/api/auth/register"))
            .json(&json!({ "username": name, "email": email, "password": "password123" }))
            .send()
            .await
            .unwrap();

        sqlx::query("UPDATE users SET role = 'admin' WHERE email = $1")
            .bind(&email)
            .execute(&self.pool)
            .await
            .unwrap();

        // Role is baked into the token, so log in again after promotion.
        let body: Value = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": "password123" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        TestUser {
            id: body["user"]["id"].as_i64().unwrap(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    async fn create_game(&self, admin: &TestUser) -> Value {
        let response = self
            .client
            .post(self.url("/api/admin/games"))
            .bearer_auth(&admin.token)
            .json(&json!({
                "name": unique("Game"),
                "description": "A game made for tests",
                "category": "RPG",
                "platforms": ["PC", "Nintendo Switch"],
                "release_date": "2023-08-03"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }

    async fn pending_reports(&self, admin: &TestUser) -> i64 {
        let stats: Value = self
            .client
            .get(self.url("/api/admin/stats"))
            .bearer_auth(&admin.token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(stats["games_count"].as_i64().unwrap() >= 1);
        stats["reports_pending"].as_i64().expect("pending count")
    }

    async fn review(&self, user: &TestUser, game_id: i64, rating: i64) -> Value {
        let response = self
            .client
            .post(self.url(&format!("/api/games/{}/reviews", game_id)))
            .bearer_auth(&user.token)
            .json(&json!({ "rating": rating, "content": "<b>Solid</b> <script>x()</script>" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        response.json().await.unwrap()
    }
}

#[tokio::test]
async fn reviews_keep_the_game_rating_current() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;
    let game = app.create_game(&admin).await;
    let game_id = game["id"].as_i64().unwrap();
    assert_eq!(game["rating"]["count"], 0);

    let a = app.register("ra").await;
    let b = app.register("rb").await;

    let first = app.review(&a, game_id, 4).await;
    assert_eq!(first["game_rating"]["average"].as_f64(), Some(4.0));
    assert_eq!(first["game_rating"]["count"], 1);
    assert!(!first["content"].as_str().unwrap().contains("script"));

    let second = app.review(&b, game_id, 2).await;
    assert_eq!(second["game_rating"]["average"].as_f64(), Some(3.0));
    assert_eq!(second["game_rating"]["count"], 2);

    // Resubmitting replaces the earlier review instead of adding one.
    let replaced = app.review(&a, game_id, 5).await;
    assert_eq!(replaced["id"], first["id"]);
    assert_eq!(replaced["game_rating"]["average"].as_f64(), Some(3.5));
    assert_eq!(replaced["game_rating"]["count"], 2);

    let reviews: Value = app
        .client
        .get(app.url(&format!("/api/games/{}/reviews", game_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reviews.as_array().unwrap().len(), 2);

    let slug = game["slug"].as_str().unwrap();
    let fetched: Value = app
        .client
        .get(app.url(&format!("/api/games/{}", slug)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["rating"]["average"].as_f64(), Some(3.5));

    let recomputed: Value = app
        .client
        .post(app.url(&format!("/api/admin/games/{}/rating/recompute", game_id)))
        .bearer_auth(&admin.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(recomputed["rating"], fetched["rating"]);
}

#[tokio::test]
async fn review_of_missing_game_is_404() {
    let Some(app) = spawn_app().await else { return };
    let user = app.register("rm").await;

    let response = app
        .client
        .post(app.url("/api/games/987654321/reviews"))
        .bearer_auth(&user.token)
        .json(&json!({ "rating": 5, "content": "Ghost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn bookmark_toggles_on_and_off() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;
    let game_id = app.create_game(&admin).await["id"].as_i64().unwrap();
    let user = app.register("bm").await;
    let path = app.url(&format!("/api/users/bookmarks/{}", game_id));

    let on: Value = app
        .client
        .post(&path)
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(on["bookmarked"], true);
    assert_eq!(on["bookmarks"][0]["id"], game_id);

    let off: Value = app
        .client
        .post(&path)
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(off["bookmarked"], false);
    assert!(off["bookmarks"].as_array().unwrap().is_empty());

    let missing = app
        .client
        .post(app.url("/api/users/bookmarks/987654321"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn broadcast_reaches_only_opted_in_users() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;
    let a = app.register("na").await;
    let b = app.register("nb").await;
    let opted_out = app.register("nc").await;

    let prefs = app
        .client
        .patch(app.url("/api/users/preferences"))
        .bearer_auth(&opted_out.token)
        .json(&json!({ "notify_new_releases": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(prefs.status().as_u16(), 200);

    let title = unique("Launch");
    let created: Value = app
        .client
        .post(app.url("/api/notifications/broadcast"))
        .bearer_auth(&admin.token)
        .json(&json!({ "title": title, "message": "Out now", "type": "new_release" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(created["created"].as_u64().unwrap() >= 2);

    let inbox = |user: &TestUser| {
        let request = app
            .client
            .get(app.url("/api/users/notifications"))
            .bearer_auth(&user.token);
        async move { request.send().await.unwrap().json::<Value>().await.unwrap() }
    };
    let matching = |list: &Value| -> Vec<Value> {
        list.as_array()
            .unwrap()
            .iter()
            .filter(|n| n["title"] == title.as_str())
            .cloned()
            .collect()
    };

    let a_inbox = matching(&inbox(&a).await);
    assert_eq!(a_inbox.len(), 1);
    assert_eq!(a_inbox[0]["read"], false);
    assert_eq!(matching(&inbox(&b).await).len(), 1);
    assert!(matching(&inbox(&opted_out).await).is_empty());

    // Someone else's notification looks like it does not exist.
    let notification_id = a_inbox[0]["id"].as_i64().unwrap();
    let foreign = app
        .client
        .patch(app.url(&format!("/api/users/notifications/{}/read", notification_id)))
        .bearer_auth(&b.token)
        .send()
        .await
        .unwrap();
    assert_eq!(foreign.status().as_u16(), 404);

    let marked: Value = app
        .client
        .patch(app.url(&format!("/api/users/notifications/{}/read", notification_id)))
        .bearer_auth(&a.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(marked["read"], true);

    let all: Value = app
        .client
        .patch(app.url("/api/users/notifications/read-all"))
        .bearer_auth(&b.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all["updated"], 1);
}

#[tokio::test]
async fn report_lifecycle() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;
    let game_id = app.create_game(&admin).await["id"].as_i64().unwrap();
    let author = app.register("pa").await;
    let reporter = app.register("pr").await;

    let post: Value = app
        .client
        .post(app.url(&format!("/api/games/{}/community", game_id)))
        .bearer_auth(&author.token)
        .json(&json!({ "title": "  LFG  ", "content": "Anyone up for co-op?" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(post["title"], "LFG");
    assert_eq!(post["user_id"], author.id);

    let pending_before = app.pending_reports(&admin).await;

    // Rejected submissions write nothing.
    for (body, expected) in [
        (json!({ "type": "review", "ref_id": 987654321, "reason": "spam" }), 404u16),
        (json!({ "type": "communityPost", "ref_id": post["id"], "reason": "boring" }), 400),
        (json!({ "type": "game", "ref_id": post["id"], "reason": "spam" }), 400),
    ] {
        let rejected = app
            .client
            .post(app.url("/api/reports"))
            .bearer_auth(&reporter.token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(rejected.status().as_u16(), expected, "{body}");
    }
    assert_eq!(app.pending_reports(&admin).await, pending_before);

    let submitted = app
        .client
        .post(app.url("/api/reports"))
        .bearer_auth(&reporter.token)
        .json(&json!({
            "type": "communityPost",
            "refId": post["id"],
            "reason": "off_topic",
            "comment": "  not about the game  "
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(submitted.status().as_u16(), 201);
    let report_id = submitted.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    assert_eq!(app.pending_reports(&admin).await, pending_before + 1);

    let pending: Value = app
        .client
        .get(app.url("/api/admin/reports?status=pending"))
        .bearer_auth(&admin.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed = pending
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["id"] == report_id)
        .expect("report listed as pending");
    assert_eq!(listed["reporter"]["id"], reporter.id);
    assert_eq!(listed["type"], "communityPost");
    assert_eq!(listed["comment"], "not about the game");

    let resolved: Value = app
        .client
        .patch(app.url(&format!("/api/admin/reports/{}", report_id)))
        .bearer_auth(&admin.token)
        .json(&json!({ "status": "resolved" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resolved["status"], "resolved");
    assert_eq!(app.pending_reports(&admin).await, pending_before);

    let listed_under = |status: &'static str| {
        let request = app
            .client
            .get(app.url(&format!("/api/admin/reports?status={}", status)))
            .bearer_auth(&admin.token);
        async move {
            let list = request.send().await.unwrap().json::<Value>().await.unwrap();
            list.as_array().unwrap().iter().any(|r| r["id"] == report_id)
        }
    };
    assert!(listed_under("resolved").await);
    assert!(!listed_under("pending").await);

    // Setting the same status again changes nothing.
    let again = app
        .client
        .patch(app.url(&format!("/api/admin/reports/{}", report_id)))
        .bearer_auth(&admin.token)
        .json(&json!({ "status": "resolved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 200);
    assert!(listed_under("resolved").await);

    let unknown = app
        .client
        .patch(app.url("/api/admin/reports/987654321"))
        .bearer_auth(&admin.token)
        .json(&json!({ "status": "dismissed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status().as_u16(), 404);
}

#[tokio::test]
async fn duplicate_registration_conflicts_and_bad_login_is_401() {
    let Some(app) = spawn_app().await else { return };
    let name = unique("dup");
    let body = json!({
        "username": name,
        "email": format!("{}@example.com", name),
        "password": "password123"
    });

    let first = app.client.post(app.url("/api/auth/register")).json(&body).send().await.unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = app.client.post(app.url("/api/auth/register")).json(&body).send().await.unwrap();
    assert_eq!(second.status().as_u16(), 409);

    let login = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": format!("{}@example.com", name), "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status().as_u16(), 401);
}

#[tokio::test]
async fn password_change_requires_the_current_password() {
    let Some(app) = spawn_app().await else { return };
    let name = unique("pw");
    let email = format!("{}@example.com", name);
    let token = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({ "username": name, "email": email, "password": "password123" }))
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap()["token"]
        .as_str()
        .unwrap()
        .to_string();

    let wrong = app
        .client
        .put(app.url("/api/users/password"))
        .bearer_auth(&token)
        .json(&json!({ "current_password": "nope-nope", "new_password": "newpass456" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status().as_u16(), 401);

    let ok = app
        .client
        .put(app.url("/api/users/password"))
        .bearer_auth(&token)
        .json(&json!({ "current_password": "password123", "new_password": "newpass456" }))
        .send()
        .await
        .unwrap();
    assert!(ok.status().is_success());

    let login = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": email, "password": "newpass456" }))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status().as_u16(), 200);
}
