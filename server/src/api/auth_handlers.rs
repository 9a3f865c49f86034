use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{NaiveDate, Utc};
use regex::Regex;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use std::sync::LazyLock;

use crate::auth::{Auth, AuthError};
use crate::entity::user;

use super::{
    AppState, ApiErr,
    dto::{
        DeleteAccountRequest, LoginRequest, LoginResponse, RegisterRequest, UpdateEmailRequest,
        UpdatePasswordRequest, UpdateUsernameRequest, UserResponse,
    },
    jwt::{AuthClaims, Claims, encode_jwt},
};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

// ---------- validation ----------

fn validate_email(email: &str) -> Result<(), ApiErr> {
    if !EMAIL_RE.is_match(email) {
        return Err(ApiErr::bad_request("Invalid email address"));
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<(), ApiErr> {
    if username.chars().count() < 3 {
        return Err(ApiErr::bad_request(
            "Username must be at least 3 characters",
        ));
    }
    Ok(())
}

/// Stronger rule used when changing an existing password: more than 6
/// characters with at least one lowercase letter, one uppercase letter and
/// one digit.
fn validate_password_strength(password: &str) -> Result<(), ApiErr> {
    let long_enough = password.chars().count() > 6;
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(long_enough && has_lower && has_upper && has_digit) {
        return Err(ApiErr::bad_request(
            "Password does not meet the required criteria",
        ));
    }
    Ok(())
}

fn is_unique_violation(e: &sea_orm::DbErr) -> bool {
    let msg = e.to_string();
    msg.contains("UNIQUE") || msg.contains("unique")
}

pub(super) async fn current_user(
    state: &AppState,
    claims: &Claims,
) -> Result<user::Model, ApiErr> {
    user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::not_found("User not found"))
}

// ---------- POST /auth/register ----------

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiErr> {
    validate_email(&body.email)?;
    validate_username(&body.username)?;
    let birthdate = NaiveDate::parse_from_str(&body.birthdate, "%Y-%m-%d")
        .map_err(|_| ApiErr::bad_request("Invalid birthdate (expected YYYY-MM-DD)"))?;
    if body.password.chars().count() < 6 {
        return Err(ApiErr::bad_request(
            "Password must be at least 6 characters",
        ));
    }
    if body.password != body.confirm_password {
        return Err(ApiErr::bad_request("Passwords do not match"));
    }

    let created = state
        .auth
        .create_user(&body.email, &body.username, birthdate, &body.password)
        .await
        .map_err(|e| match e {
            AuthError::Db(ref db) if is_unique_violation(db) => {
                ApiErr::bad_request("Email or username already exists")
            }
            other => ApiErr::internal(other),
        })?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(created))))
}

// ---------- POST /auth/login ----------

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiErr> {
    let user = state
        .auth
        .authenticate(&body.username, &body.password)
        .await
        .map_err(|e| match e {
            AuthError::NotFound | AuthError::InvalidPassword => {
                ApiErr::new(StatusCode::UNAUTHORIZED, "Invalid credentials")
            }
            other => ApiErr::internal(other),
        })?;

    let exp = (Utc::now().timestamp() as u64) + state.jwt_expiry_hours * 3600;
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        exp,
    };

    let token = encode_jwt(&claims, &state.jwt_secret).map_err(ApiErr::internal)?;

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(user),
    }))
}

// ---------- GET /auth/me ----------

pub async fn me(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiErr> {
    let user = current_user(&state, &claims).await?;
    Ok(Json(UserResponse::from(user)))
}

// ---------- PUT /auth/email ----------

pub async fn update_email(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Json(body): Json<UpdateEmailRequest>,
) -> Result<Json<UserResponse>, ApiErr> {
    validate_email(&body.email)?;
    let user = current_user(&state, &claims).await?;

    let mut active: user::ActiveModel = user.into();
    active.email = Set(body.email);
    let updated = active.update(&state.db).await.map_err(|e| {
        if is_unique_violation(&e) {
            ApiErr::bad_request("Email already in use")
        } else {
            ApiErr::internal(e)
        }
    })?;

    Ok(Json(UserResponse::from(updated)))
}

// ---------- PUT /auth/username ----------

pub async fn update_username(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Json(body): Json<UpdateUsernameRequest>,
) -> Result<Json<UserResponse>, ApiErr> {
    validate_username(&body.new_username)?;
    let user = current_user(&state, &claims).await?;

    let mut active: user::ActiveModel = user.into();
    active.username = Set(body.new_username);
    let updated = active.update(&state.db).await.map_err(|e| {
        if is_unique_violation(&e) {
            ApiErr::bad_request("Username already exists")
        } else {
            ApiErr::internal(e)
        }
    })?;

    Ok(Json(UserResponse::from(updated)))
}

// ---------- PUT /auth/password ----------

pub async fn update_password(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Json(body): Json<UpdatePasswordRequest>,
) -> Result<Json<UserResponse>, ApiErr> {
    if body.new_password != body.confirm_password {
        return Err(ApiErr::bad_request("Passwords do not match"));
    }
    validate_password_strength(&body.new_password)?;

    let user = current_user(&state, &claims).await?;
    Auth::verify_password(&body.current_password, &user.password_hash).map_err(|e| match e {
        AuthError::InvalidPassword => ApiErr::bad_request("Current password is incorrect"),
        other => ApiErr::internal(other),
    })?;

    let new_hash = Auth::hash_password(&body.new_password).map_err(ApiErr::internal)?;
    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(new_hash);
    let updated = active.update(&state.db).await.map_err(ApiErr::internal)?;

    Ok(Json(UserResponse::from(updated)))
}

// ---------- DELETE /auth/account ----------

pub async fn delete_account(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    Json(body): Json<DeleteAccountRequest>,
) -> Result<StatusCode, ApiErr> {
    let user = current_user(&state, &claims).await?;
    Auth::verify_password(&body.password, &user.password_hash).map_err(|e| match e {
        AuthError::InvalidPassword => ApiErr::bad_request("Password is incorrect"),
        other => ApiErr::internal(other),
    })?;

    // Owned obras/clientes/productos/registros go with the account (FK cascade).
    let active: user::ActiveModel = user.into();
    active.delete(&state.db).await.map_err(ApiErr::internal)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Method, Request, StatusCode},
        routing::{get, post, put},
    };
    use migration::MigratorTrait as _;
    use sea_orm::{Database, DatabaseConnection};
    use std::sync::Arc;
    use tower::ServiceExt;

    const JWT_SECRET: &str = "test-jwt-secret-key-32-chars-pad";

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    fn make_state(db: DatabaseConnection) -> AppState {
        AppState {
            auth: Arc::new(Auth::new(db.clone())),
            db,
            jwt_secret: JWT_SECRET.to_string(),
            jwt_expiry_hours: 1,
        }
    }

    fn make_router(state: AppState) -> Router {
        Router::new()
            .route("/auth/register", post(register))
            .route("/auth/login", post(login))
            .route("/auth/me", get(me))
            .route("/auth/password", put(update_password))
            .with_state(state)
    }

    fn json_request(method: Method, uri: &str, value: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(&value).unwrap()))
            .unwrap()
    }

    fn register_body(email: &str, username: &str, password: &str) -> serde_json::Value {
        serde_json::json!({
            "email": email,
            "username": username,
            "birthdate": "1990-04-12",
            "password": password,
            "confirm_password": password,
        })
    }

    async fn body_json(res: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ===== register validation =====

    #[tokio::test]
    async fn register_rejects_malformed_email() {
        let router = make_router(make_state(setup_db().await));
        let res = router
            .oneshot(json_request(
                Method::POST,
                "/auth/register",
                register_body("not-an-email", "alice", "Secret123"),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_rejects_short_username() {
        let router = make_router(make_state(setup_db().await));
        let res = router
            .oneshot(json_request(
                Method::POST,
                "/auth/register",
                register_body("alice@example.com", "al", "Secret123"),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_rejects_invalid_birthdate() {
        let router = make_router(make_state(setup_db().await));
        let mut body = register_body("alice@example.com", "alice", "Secret123");
        body["birthdate"] = serde_json::json!("12/04/1990");
        let res = router
            .oneshot(json_request(Method::POST, "/auth/register", body))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let router = make_router(make_state(setup_db().await));
        let res = router
            .oneshot(json_request(
                Method::POST,
                "/auth/register",
                register_body("alice@example.com", "alice", "abc"),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_rejects_mismatched_confirmation() {
        let router = make_router(make_state(setup_db().await));
        let mut body = register_body("alice@example.com", "alice", "Secret123");
        body["confirm_password"] = serde_json::json!("Different123");
        let res = router
            .oneshot(json_request(Method::POST, "/auth/register", body))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_creates_user() {
        let router = make_router(make_state(setup_db().await));
        let res = router
            .oneshot(json_request(
                Method::POST,
                "/auth/register",
                register_body("alice@example.com", "alice", "Secret123"),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = body_json(res).await;
        assert_eq!(body["username"], "alice");
        assert!(body.get("password_hash").is_none(), "hash must not leak");
    }

    #[tokio::test]
    async fn register_duplicate_username_rejected() {
        let state = make_state(setup_db().await);
        let router = make_router(state);

        let res = router
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/auth/register",
                register_body("alice@example.com", "alice", "Secret123"),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = router
            .oneshot(json_request(
                Method::POST,
                "/auth/register",
                register_body("other@example.com", "alice", "Secret123"),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    // ===== login =====

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let router = make_router(make_state(setup_db().await));
        router
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/auth/register",
                register_body("alice@example.com", "alice", "Secret123"),
            ))
            .await
            .unwrap();

        let res = router
            .oneshot(json_request(
                Method::POST,
                "/auth/login",
                serde_json::json!({"username": "alice", "password": "Wrong123"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_rejects_unknown_user() {
        let router = make_router(make_state(setup_db().await));
        let res = router
            .oneshot(json_request(
                Method::POST,
                "/auth/login",
                serde_json::json!({"username": "nobody", "password": "Secret123"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_returns_token_and_profile() {
        let router = make_router(make_state(setup_db().await));
        router
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/auth/register",
                register_body("alice@example.com", "alice", "Secret123"),
            ))
            .await
            .unwrap();

        let res = router
            .oneshot(json_request(
                Method::POST,
                "/auth/login",
                serde_json::json!({"username": "alice", "password": "Secret123"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert!(!body["token"].as_str().unwrap().is_empty());
        assert_eq!(body["user"]["email"], "alice@example.com");
    }

    // ===== me =====

    #[tokio::test]
    async fn me_requires_token() {
        let router = make_router(make_state(setup_db().await));
        let res = router
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/auth/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_returns_profile_with_token() {
        let router = make_router(make_state(setup_db().await));
        router
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/auth/register",
                register_body("alice@example.com", "alice", "Secret123"),
            ))
            .await
            .unwrap();
        let login = router
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/auth/login",
                serde_json::json!({"username": "alice", "password": "Secret123"}),
            ))
            .await
            .unwrap();
        let token = body_json(login).await["token"].as_str().unwrap().to_string();

        let res = router
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/auth/me")
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["username"], "alice");
    }

    // ===== password change =====

    async fn registered_token(router: &Router) -> String {
        router
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/auth/register",
                register_body("alice@example.com", "alice", "Secret123"),
            ))
            .await
            .unwrap();
        let login = router
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/auth/login",
                serde_json::json!({"username": "alice", "password": "Secret123"}),
            ))
            .await
            .unwrap();
        body_json(login).await["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn password_change_rejects_wrong_current() {
        let router = make_router(make_state(setup_db().await));
        let token = registered_token(&router).await;

        let mut req = json_request(
            Method::PUT,
            "/auth/password",
            serde_json::json!({
                "current_password": "Wrong123",
                "new_password": "Another123",
                "confirm_password": "Another123",
            }),
        );
        req.headers_mut().insert(
            "Authorization",
            format!("Bearer {token}").parse().unwrap(),
        );
        let res = router.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn password_change_rejects_weak_password() {
        let router = make_router(make_state(setup_db().await));
        let token = registered_token(&router).await;

        let mut req = json_request(
            Method::PUT,
            "/auth/password",
            serde_json::json!({
                "current_password": "Secret123",
                "new_password": "alllowercase",
                "confirm_password": "alllowercase",
            }),
        );
        req.headers_mut().insert(
            "Authorization",
            format!("Bearer {token}").parse().unwrap(),
        );
        let res = router.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn password_change_takes_effect() {
        let router = make_router(make_state(setup_db().await));
        let token = registered_token(&router).await;

        let mut req = json_request(
            Method::PUT,
            "/auth/password",
            serde_json::json!({
                "current_password": "Secret123",
                "new_password": "Another123",
                "confirm_password": "Another123",
            }),
        );
        req.headers_mut().insert(
            "Authorization",
            format!("Bearer {token}").parse().unwrap(),
        );
        let res = router.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let old = router
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/auth/login",
                serde_json::json!({"username": "alice", "password": "Secret123"}),
            ))
            .await
            .unwrap();
        assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

        let new = router
            .oneshot(json_request(
                Method::POST,
                "/auth/login",
                serde_json::json!({"username": "alice", "password": "Another123"}),
            ))
            .await
            .unwrap();
        assert_eq!(new.status(), StatusCode::OK);
    }
}
