#![allow(clippy::unwrap_used)]
// Integration tests for the XML-RPC repositories and the services on top
// of them, against a mock `/RPC2/` endpoint.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use url::Url;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use asadm_api::{AsClient, Transport};
use asadm_core::{
    AuthMethod, CoreError, EntityKind, Group, GroupRepository, GroupService, RestoreOutcome,
    RpcRepository, UserRepository, ValidationError,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Arc<RpcRepository>) {
    let server = MockServer::start().await;
    let endpoint = Url::parse(&format!("{}/RPC2/", server.uri())).unwrap();
    let password: SecretString = "secret".to_string().into();
    let transport = Transport::with_client(reqwest::Client::new(), endpoint, "openvpn".into(), password);
    let repo = Arc::new(RpcRepository::new(Arc::new(AsClient::new(transport))));
    (server, repo)
}

fn ok_body(value_xml: &str) -> String {
    format!(
        "<?xml version='1.0'?><methodResponse><params><param><value>{value_xml}</value>\
         </param></params></methodResponse>"
    )
}

fn member(name: &str, value: &str) -> String {
    format!("<member><name>{name}</name><value><string>{value}</string></value></member>")
}

fn profile(name: &str, props: &[(&str, &str)]) -> String {
    let inner: String = props.iter().map(|(k, v)| member(k, v)).collect();
    format!("<member><name>{name}</name><value><struct>{inner}</struct></value></member>")
}

/// Profile store with one user, one group and one bookkeeping entry.
fn store_body() -> String {
    let alice = profile(
        "alice",
        &[
            ("type", "user_connect"),
            ("email", "alice@example.com"),
            ("conn_group", "eng"),
            ("access_to.1", "+NAT:10.2.0.0/16"),
            ("access_to.0", "+NAT:10.1.0.0/16"),
            ("pvt_hw_addr", "aa:bb:cc:dd:ee:ff"),
            ("conn_ip", "10.8.0.20"),
            ("prop_google_auth", "true"),
        ],
    );
    let eng = profile(
        "eng",
        &[
            ("type", "group"),
            ("group_declare", "true"),
            ("group_subnets.0", "10.8.0.0/25"),
            ("prop_superuser", "false"),
        ],
    );
    let bookkeeping = profile("__DEFAULT__", &[("prop_autologin", "false")]);
    ok_body(&format!("<struct>{alice}{eng}{bookkeeping}</struct>"))
}

async fn mount_store(server: &MockServer) {
    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>UserPropMultiGet</methodName>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(store_body()))
        .mount(server)
        .await;
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_faulted_lookup_is_not_found() {
    let (server, repo) = setup().await;
    let fault = "<?xml version='1.0'?><methodResponse><fault><value><struct>\
        <member><name>faultCode</name><value><int>1</int></value></member>\
        <member><name>faultString</name><value><string>User not found: ghost</string></value></member>\
        </struct></value></fault></methodResponse>";
    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>UserPropMultiGet</methodName>"))
        .and(body_string_contains("<string>ghost</string>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(fault))
        .expect(1)
        .mount(&server)
        .await;

    let err = UserRepository::get(repo.as_ref(), "ghost").await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::NotFound {
            kind: EntityKind::User,
            ..
        }
    ));
}

#[tokio::test]
async fn test_list_separates_users_and_groups() {
    let (server, repo) = setup().await;
    mount_store(&server).await;

    let users = UserRepository::list(repo.as_ref()).await.unwrap();
    assert_eq!(users.len(), 1);
    let alice = &users[0];
    assert_eq!(alice.username, "alice");
    assert_eq!(alice.access_control, vec!["10.1.0.0/16", "10.2.0.0/16"]);
    assert_eq!(alice.mac_addresses[0].as_str(), "aa:bb:cc:dd:ee:ff");
    assert!(alice.mfa);

    let groups = GroupRepository::list(repo.as_ref()).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].group_name, "eng");
    assert_eq!(groups[0].group_subnet, vec!["10.8.0.0/25"]);
}

#[tokio::test]
async fn test_kind_mismatch_is_not_found() {
    let (server, repo) = setup().await;
    mount_store(&server).await;

    let err = UserRepository::get(repo.as_ref(), "eng").await.unwrap_err();
    assert!(err.is_not_found());
    let err = GroupRepository::get(repo.as_ref(), "alice").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!UserRepository::exists(repo.as_ref(), "nobody").await.unwrap());
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_overlapping_group_issues_no_put() {
    let (server, repo) = setup().await;
    mount_store(&server).await;

    let config = "<struct>\
        <member><name>vpn.daemon.0.client.network</name><value><string>172.27.224.0</string></value></member>\
        <member><name>vpn.daemon.0.client.netmask_bits</name><value><string>20</string></value></member>\
        <member><name>vpn.server.group_pool.0</name><value><string>172.27.240.0/20</string></value></member>\
        </struct>";
    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>ConfigDefaults</methodName>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ok_body(config)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>UserPropPut</methodName>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ok_body("<nil/>")))
        .expect(0)
        .mount(&server)
        .await;

    let svc = GroupService::new(repo.clone(), repo);
    let mut group = Group::new("newcomer", AuthMethod::Local);
    group.group_subnet = vec!["10.8.0.0/24".into()];
    let err = svc.create(group).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::SubnetOverlap { .. })
    ));
}

#[tokio::test]
async fn test_update_deletes_stale_then_rewrites() {
    let (server, repo) = setup().await;

    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>UserPropDel</methodName>"))
        .and(body_string_contains("<string>pvt_hw_addr</string>"))
        .and(body_string_contains("<string>access_to.1</string>"))
        .and(body_string_contains("<string>conn_ip</string>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ok_body("<nil/>")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>UserPropPut</methodName>"))
        .and(body_string_contains("+NAT:10.9.0.0/16"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ok_body("<nil/>")))
        .expect(1)
        .mount(&server)
        .await;
    mount_store(&server).await;

    let existing = UserRepository::get(repo.as_ref(), "alice").await.unwrap();
    let mut updated = existing.clone();
    updated.access_control = vec!["10.9.0.0/16".into()];
    UserRepository::update(repo.as_ref(), &existing, &updated)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failed_delete_phase_writes_previous_state_back() {
    let (server, repo) = setup().await;
    mount_store(&server).await;

    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>UserPropDel</methodName>"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;
    // The restore carries the original access entry, not the new one.
    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>UserPropPut</methodName>"))
        .and(body_string_contains("+NAT:10.1.0.0/16"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ok_body("<nil/>")))
        .expect(1)
        .mount(&server)
        .await;

    let existing = UserRepository::get(repo.as_ref(), "alice").await.unwrap();
    let mut updated = existing.clone();
    updated.access_control = vec!["10.9.0.0/16".into()];
    let err = UserRepository::update(repo.as_ref(), &existing, &updated)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CoreError::PartialUpdate {
            restore: RestoreOutcome::Restored,
            ..
        }
    ));
}

#[tokio::test]
async fn test_failed_rewrite_phase_writes_previous_state_back() {
    let (server, repo) = setup().await;
    mount_store(&server).await;

    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>UserPropDel</methodName>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ok_body("<nil/>")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>UserPropPut</methodName>"))
        .and(body_string_contains("+NAT:10.9.0.0/16"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>UserPropPut</methodName>"))
        .and(body_string_contains("+NAT:10.1.0.0/16"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ok_body("<nil/>")))
        .expect(1)
        .mount(&server)
        .await;

    let existing = UserRepository::get(repo.as_ref(), "alice").await.unwrap();
    let mut updated = existing.clone();
    updated.access_control = vec!["10.9.0.0/16".into()];
    let err = UserRepository::update(repo.as_ref(), &existing, &updated)
        .await
        .unwrap_err();

    let CoreError::PartialUpdate { cause, restore, .. } = err else {
        panic!("expected PartialUpdate");
    };
    assert_eq!(restore, RestoreOutcome::Restored);
    assert!(matches!(*cause, CoreError::Remote { .. }));
}

#[tokio::test]
async fn test_stale_delete_covers_gapped_slots() {
    let (server, repo) = setup().await;
    let bob = profile(
        "bob",
        &[
            ("type", "user_connect"),
            ("pvt_hw_addr", "aa:bb:cc:dd:ee:ff"),
            ("pvt_hw_addr3", "11:22:33:44:55:66"),
            ("access_to.0", "+NAT:10.1.0.0/16"),
            ("access_to.5", "+NAT:10.5.0.0/16"),
        ],
    );
    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>UserPropMultiGet</methodName>"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(ok_body(&format!("<struct>{bob}</struct>"))),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>UserPropDel</methodName>"))
        .and(body_string_contains("<string>pvt_hw_addr3</string>"))
        .and(body_string_contains("<string>access_to.5</string>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ok_body("<nil/>")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>UserPropPut</methodName>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ok_body("<nil/>")))
        .expect(1)
        .mount(&server)
        .await;

    let existing = UserRepository::get(repo.as_ref(), "bob").await.unwrap();
    let mut updated = existing.clone();
    updated.access_control.clear();
    UserRepository::update(repo.as_ref(), &existing, &updated)
        .await
        .unwrap();
}
