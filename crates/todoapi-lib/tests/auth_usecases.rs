mod common;

use common::TEST_PASSWORD;
use todoapi_lib::{
    Error, IsAuthenticatedUseCases, JwtTokenService, LogoutUseCases, TokenService,
    UserRepository,
};

#[test]
fn local_strategy_accepts_correct_password_and_records_login() {
    let db = common::memory_db();
    let users = common::user_repository(&db);
    common::seed_user(&users, "alice");
    let login = common::login_usecases(users.clone());

    let profile = login
        .validate_user_for_local_strategy("alice", TEST_PASSWORD)
        .unwrap()
        .expect("credentials accepted");
    assert_eq!(profile.username, "alice");

    let stored = users.get_user_by_username("alice").unwrap().unwrap();
    assert!(stored.last_login.is_some());
}

#[test]
fn local_strategy_rejects_wrong_password_and_unknown_user() {
    let db = common::memory_db();
    let users = common::user_repository(&db);
    common::seed_user(&users, "alice");
    let login = common::login_usecases(users);

    assert!(login
        .validate_user_for_local_strategy("alice", "wrong")
        .unwrap()
        .is_none());
    assert!(login
        .validate_user_for_local_strategy("bob", TEST_PASSWORD)
        .unwrap()
        .is_none());
    assert!(matches!(
        login.login("alice", "wrong"),
        Err(Error::InvalidCredentials)
    ));
}

#[test]
fn access_token_carries_username_and_configured_lifetime() {
    let db = common::memory_db();
    let users = common::user_repository(&db);
    common::seed_user(&users, "alice");
    let login = common::login_usecases(users);

    let issued = login.get_jwt_token("alice").unwrap();
    assert_eq!(issued.expires_in, common::jwt_config().expiration_secs);

    let claims = JwtTokenService
        .check_token(&issued.token, &common::jwt_config().secret)
        .unwrap();
    assert_eq!(claims.username, "alice");
    assert_eq!(claims.exp - claims.iat, 60);

    assert_eq!(
        login.authenticate_access_token(&issued.token).unwrap().username,
        "alice"
    );
}

#[test]
fn access_token_for_deleted_subject_is_rejected() {
    let db = common::memory_db();
    let users = common::user_repository(&db);
    let login = common::login_usecases(users);

    let token = JwtTokenService
        .create_token("ghost", &common::jwt_config().secret, 60)
        .unwrap();
    assert!(matches!(
        login.authenticate_access_token(&token),
        Err(Error::UserNotFound { .. })
    ));
}

#[test]
fn refresh_token_is_stored_hashed_and_matches() {
    let db = common::memory_db();
    let users = common::user_repository(&db);
    common::seed_user(&users, "alice");
    let login = common::login_usecases(users.clone());

    let refresh = login.get_jwt_refresh_token("alice").unwrap();
    let stored = users.get_user_by_username("alice").unwrap().unwrap();
    let hash = stored.hash_refresh_token.expect("refresh hash stored");
    assert_ne!(hash, refresh.token);

    assert!(login
        .get_user_if_refresh_token_matches(&refresh.token, "alice")
        .unwrap()
        .is_some());
    assert!(login
        .get_user_if_refresh_token_matches("some-other-token", "alice")
        .unwrap()
        .is_none());
    assert_eq!(
        login.authenticate_refresh_token(&refresh.token).unwrap().username,
        "alice"
    );
}

#[test]
fn access_token_is_not_a_refresh_token() {
    let db = common::memory_db();
    let users = common::user_repository(&db);
    common::seed_user(&users, "alice");
    let login = common::login_usecases(users);

    let access = login.get_jwt_token("alice").unwrap();
    assert!(matches!(
        login.authenticate_refresh_token(&access.token),
        Err(Error::InvalidToken { .. })
    ));
}

#[test]
fn logout_invalidates_refresh_token() {
    let db = common::memory_db();
    let users = common::user_repository(&db);
    common::seed_user(&users, "alice");
    let login = common::login_usecases(users.clone());
    let logout = LogoutUseCases::new(users.clone());

    let refresh = login.get_jwt_refresh_token("alice").unwrap();
    logout.execute("alice").unwrap();

    assert!(users
        .get_user_by_username("alice")
        .unwrap()
        .unwrap()
        .hash_refresh_token
        .is_none());
    assert!(matches!(
        login.authenticate_refresh_token(&refresh.token),
        Err(Error::RefreshTokenMismatch)
    ));
}

#[test]
fn is_authenticated_returns_profile_or_not_found() {
    let db = common::memory_db();
    let users = common::user_repository(&db);
    common::seed_user(&users, "alice");
    let usecase = IsAuthenticatedUseCases::new(users);

    assert_eq!(usecase.execute("alice").unwrap().username, "alice");
    assert!(matches!(
        usecase.execute("bob"),
        Err(Error::UserNotFound { .. })
    ));
}
