//! Full login-session lifecycle: issue, rotate, replay-detect, expire.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::time::Duration;

use custos::{CountCheck, ExtendError, TokenConfig, TokenManager, U2fFlow};
use serde_json::json;
use uuid::Uuid;

#[test]
fn ten_thousand_tokens_are_distinct() {
    let mut manager = TokenManager::new(TokenConfig::new());
    let account_id = Uuid::new_v4();
    let mut seen = HashSet::new();
    for _ in 0..10_000 {
        let token = manager.gen_login_token(Uuid::new_v4(), account_id);
        assert_eq!(token.len(), 256);
        assert!(seen.insert(token));
    }
}

#[test]
fn count_is_monotonic_and_exact() {
    let mut manager = TokenManager::new(TokenConfig::new());
    let instance_id = Uuid::new_v4();
    let token = manager.gen_login_token(instance_id, Uuid::new_v4());

    assert!(manager.verify_api_token(&token, CountCheck::Exact(0), instance_id));
    // The count advanced; presenting 0 again fails and drops the session.
    assert!(!manager.verify_api_token(&token, CountCheck::Exact(0), instance_id));
    assert!(!manager.verify_api_token(&token, CountCheck::Any, instance_id));
}

#[test]
fn rotation_chain_replays_kill_the_account() {
    let mut manager = TokenManager::new(TokenConfig::new());
    let instance_id = Uuid::new_v4();
    let account_id = Uuid::new_v4();

    let t0 = manager.gen_login_token(instance_id, account_id);
    let t1 = manager
        .extend_login_token(&t0, 0, instance_id, account_id)
        .unwrap();
    assert_ne!(t0, t1);

    // An attacker replays the captured t0 after the client rotated away.
    let replay = manager.extend_login_token(&t0, 0, instance_id, account_id);
    assert_eq!(replay, Err(ExtendError::ReplayedToken));
    assert_eq!(
        replay.unwrap_err().to_string(),
        "attempt to extend expired token"
    );

    // The previously-valid t1 is collateral: the whole account is out.
    assert!(!manager.verify_api_token(&t1, CountCheck::Any, instance_id));
}

#[test]
fn multi_device_sessions_coexist_until_a_replay() {
    let mut manager = TokenManager::new(TokenConfig::new());
    let account_id = Uuid::new_v4();
    let laptop = Uuid::new_v4();
    let phone = Uuid::new_v4();

    let laptop_token = manager.gen_login_token(laptop, account_id);
    let phone_token = manager.gen_login_token(phone, account_id);

    assert!(manager.verify_api_token(&laptop_token, CountCheck::Any, laptop));
    assert!(manager.verify_api_token(&phone_token, CountCheck::Any, phone));
}

#[test]
fn challenge_tokens_are_single_use() {
    let mut manager = TokenManager::new(TokenConfig::new());
    let instance_id = Uuid::new_v4();
    let account_id = Uuid::new_v4();

    let twofactor = manager.gen_twofactor_token(instance_id, account_id);
    assert!(manager.verify_twofactor_token(&twofactor, instance_id));
    assert!(!manager.verify_twofactor_token(&twofactor, instance_id));

    let request = json!({"appId": "https://example.com", "challenge": "YmFzZTY0"});
    let u2f = manager.gen_u2f_token(instance_id, account_id, U2fFlow::Verify, request.clone());
    let verification = manager.verify_u2f_token(&u2f, instance_id).unwrap();
    assert_eq!(verification.flow, U2fFlow::Verify);
    assert_eq!(verification.request, request);
    assert!(manager.verify_u2f_token(&u2f, instance_id).is_none());
}

#[test]
fn dashboard_bootstrap_encrypts_to_its_own_channel() {
    let mut manager = TokenManager::new(TokenConfig::new());
    let comm = manager.gen_dashboard_comm_token().unwrap();

    // The browser encrypts to the channel's public key; the server decrypts
    // with the private half it kept under the token.
    let payload = json!({"password": "correct horse battery staple"});
    let envelope = custos::crypto::encrypt_with_public_key(&payload, &comm.public_key).unwrap();

    let session = manager.verify_dashboard_comm_token(&comm.token).unwrap();
    let decrypted: serde_json::Value =
        custos::crypto::decrypt_with_private_key(&envelope, &session.private_key).unwrap();
    assert_eq!(decrypted, payload);
}

#[test]
fn sessions_expire_on_schedule() {
    let ttl = Duration::from_millis(60);
    let mut manager = TokenManager::new(
        TokenConfig::new()
            .with_login_ttl(ttl)
            .with_login_grace(Duration::ZERO),
    );
    let instance_id = Uuid::new_v4();
    let token = manager.gen_login_token(instance_id, Uuid::new_v4());

    // Well inside the lifetime.
    assert!(manager.verify_api_token(&token, CountCheck::Any, instance_id));
    std::thread::sleep(ttl + Duration::from_millis(20));
    // Past it.
    assert!(!manager.verify_api_token(&token, CountCheck::Any, instance_id));
}
