#![allow(clippy::unwrap_used)]
// Bulk creation against a mock appliance whose profile store reflects
// earlier writes, run with several items in flight at once.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use url::Url;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use asadm_api::{AsClient, Transport};
use asadm_core::{
    AuthMethod, BulkRunner, BulkStatus, BulkTracker, Group, GroupService, NewUser, NoDirectory,
    RpcRepository, UserService,
};

// ── Stateful appliance ──────────────────────────────────────────────

type Props = Vec<(String, String)>;

/// Profile store answering `UserPropMultiGet` with everything written so far.
#[derive(Default)]
struct ProfileStore {
    profiles: Mutex<Vec<(String, Props)>>,
}

impl ProfileStore {
    fn with_group(name: &str, subnet: &str) -> Arc<Self> {
        let store = Self::default();
        store.put(
            name,
            vec![
                ("type".into(), "group".into()),
                ("group_declare".into(), "true".into()),
                ("group_subnets.0".into(), subnet.into()),
            ],
        );
        Arc::new(store)
    }

    fn put(&self, name: &str, props: Props) {
        let mut profiles = self.profiles.lock().unwrap();
        let idx = match profiles.iter().position(|(n, _)| n == name) {
            Some(idx) => idx,
            None => {
                profiles.push((name.to_owned(), Vec::new()));
                profiles.len() - 1
            }
        };
        let stored = &mut profiles[idx].1;
        for (key, value) in props {
            match stored.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => stored.push((key, value)),
            }
        }
    }

    fn values_of(&self, kind: &str, key: &str) -> Vec<String> {
        self.profiles
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, props)| props.iter().any(|(k, v)| k == "type" && v == kind))
            .filter_map(|(_, props)| props.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()))
            .collect()
    }

    fn names_of(&self, kind: &str) -> Vec<String> {
        self.profiles
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, props)| props.iter().any(|(k, v)| k == "type" && v == kind))
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn render(&self) -> String {
        let profiles = self.profiles.lock().unwrap();
        let inner: String = profiles
            .iter()
            .map(|(name, props)| {
                let members: String = props.iter().map(|(k, v)| member(k, v)).collect();
                format!("<member><name>{name}</name><value><struct>{members}</struct></value></member>")
            })
            .collect();
        format!("<struct>{inner}</struct>")
    }
}

struct Appliance(Arc<ProfileStore>);

impl Respond for Appliance {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body = String::from_utf8_lossy(&request.body);
        match between(&body, "<methodName>", "</methodName>").unwrap_or_default() {
            "UserPropMultiGet" => ok(&self.0.render()),
            "UserPropPut" => {
                let name = between(&body, "<params><param><value><string>", "</string>")
                    .unwrap_or_default();
                self.0.put(name, members_of(&body));
                ok("<nil/>")
            }
            "ConfigDefaults" => ok(&format!(
                "<struct>{}{}{}</struct>",
                member("vpn.daemon.0.client.network", "172.27.224.0"),
                member("vpn.daemon.0.client.netmask_bits", "20"),
                member("vpn.server.group_pool.0", "172.27.240.0/20"),
            )),
            _ => ok("<nil/>"),
        }
    }
}

fn ok(value_xml: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!(
        "<?xml version='1.0'?><methodResponse><params><param><value>{value_xml}</value>\
         </param></params></methodResponse>"
    ))
}

fn member(name: &str, value: &str) -> String {
    format!("<member><name>{name}</name><value><string>{value}</string></value></member>")
}

fn between<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = text.find(open)? + open.len();
    let end = text[start..].find(close)? + start;
    Some(&text[start..end])
}

fn members_of(body: &str) -> Props {
    body.split("<member><name>")
        .skip(1)
        .filter_map(|chunk| {
            let (name, rest) = chunk.split_once("</name>")?;
            let value = between(rest, "<string>", "</string>")?;
            Some((name.to_owned(), value.to_owned()))
        })
        .collect()
}

async fn runner(store: Arc<ProfileStore>) -> (MockServer, BulkRunner) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(Appliance(store))
        .mount(&server)
        .await;

    let endpoint = Url::parse(&format!("{}/RPC2/", server.uri())).unwrap();
    let password: SecretString = "secret".to_string().into();
    let transport = Transport::with_client(reqwest::Client::new(), endpoint, "openvpn".into(), password);
    let repo = Arc::new(RpcRepository::new(Arc::new(AsClient::new(transport))));

    let users = Arc::new(UserService::new(repo.clone(), repo.clone(), Arc::new(NoDirectory)));
    let groups = Arc::new(GroupService::new(repo.clone(), repo));
    let runner = BulkRunner::new(users, groups, Arc::new(BulkTracker::new())).with_concurrency(5);
    (server, runner)
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_concurrent_creates_get_distinct_addresses() {
    let store = ProfileStore::with_group("staff", "10.20.0.0/24");
    let (_server, runner) = runner(store.clone()).await;

    let inputs: Vec<NewUser> = ["ann", "ben", "cat"]
        .iter()
        .map(|name| NewUser {
            username: (*name).into(),
            email: format!("{name}@example.com"),
            group_name: "staff".into(),
            ..NewUser::default()
        })
        .collect();
    let op = runner.create_users(inputs).await;

    assert_eq!(op.status, BulkStatus::Completed);
    assert_eq!(op.succeeded, 3);
    let mut ips = store.values_of("user_connect", "conn_ip");
    ips.sort();
    assert_eq!(ips, vec!["10.20.0.1", "10.20.0.2", "10.20.0.3"]);
    assert_eq!(ips.iter().collect::<HashSet<_>>().len(), 3);
}

#[tokio::test]
async fn test_concurrent_overlapping_groups_admit_only_one() {
    let store = Arc::new(ProfileStore::default());
    let (_server, runner) = runner(store.clone()).await;

    let mut wide = Group::new("wide", AuthMethod::Local);
    wide.group_subnet = vec!["10.40.0.0/24".into()];
    let mut narrow = Group::new("narrow", AuthMethod::Local);
    narrow.group_subnet = vec!["10.40.0.0/25".into()];
    let op = runner.create_groups(vec![wide, narrow]).await;

    assert_eq!(op.succeeded, 1);
    assert_eq!(op.failed, 1);
    assert_eq!(store.names_of("group").len(), 1);
    let rejected = op.results.iter().find(|r| !r.success).unwrap();
    assert!(rejected.error.as_deref().unwrap().contains("10.40.0.0"));
}
