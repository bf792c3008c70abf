// ── Client-side listing ──
//
// The appliance returns every profile at once, so filtering, sorting and
// pagination happen here. Totals are counted before the page is cut.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;
use strum::Display;
use tracing::warn;

use crate::model::{AuthMethod, Group, GroupFilter, Page, Role, SortField, SortOrder, User, UserFilter};
use crate::validate::parse_expiration;

/// Widest window an expiration report accepts, in days.
pub const MAX_REPORT_DAYS: i64 = 365;

/// Filter, sort and paginate users. `today` anchors the relative date criteria.
pub fn query_users(users: Vec<User>, filter: &UserFilter, today: NaiveDate) -> Page<User> {
    let mut matched: Vec<User> = users
        .into_iter()
        .filter(|u| matches_user(u, filter, today))
        .collect();
    sort_users(&mut matched, filter.sort_by, filter.sort_order);
    paginate(matched, filter.page(), filter.limit())
}

/// Filter and paginate groups. Order is preserved as fetched.
pub fn query_groups(groups: Vec<Group>, filter: &GroupFilter) -> Page<Group> {
    let needle = filter.group_name.as_deref().map(str::to_lowercase);
    let matched: Vec<Group> = groups
        .into_iter()
        .filter(|g| {
            needle
                .as_deref()
                .is_none_or(|n| g.group_name.to_lowercase().contains(n))
                && filter.auth_method.is_none_or(|a| g.auth_method == a)
                && filter.role.is_none_or(|r| g.role == r)
                && filter.is_enabled.is_none_or(|e| g.is_enabled() == e)
        })
        .collect();
    paginate(matched, filter.page(), filter.limit())
}

fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> Page<T> {
    let total = items.len();
    let offset = page.saturating_sub(1).saturating_mul(limit);
    let items = items.into_iter().skip(offset).take(limit).collect();
    Page {
        items,
        total,
        page,
        limit,
    }
}

// ── Matching ────────────────────────────────────────────────────────

fn text_matches(value: &str, wanted: &str, exact: bool, case_sensitive: bool) -> bool {
    match (exact, case_sensitive) {
        (true, true) => value == wanted,
        (true, false) => value.to_lowercase() == wanted.to_lowercase(),
        (false, true) => value.contains(wanted),
        (false, false) => value.to_lowercase().contains(&wanted.to_lowercase()),
    }
}

fn matches_user(user: &User, f: &UserFilter, today: NaiveDate) -> bool {
    let exact = f.exact_match;
    let cs = f.case_sensitive;

    if let Some(ref wanted) = f.username {
        if !wanted.is_empty() && !text_matches(&user.username, wanted, exact, cs) {
            return false;
        }
    }
    if let Some(ref wanted) = f.email {
        if !wanted.is_empty() && !text_matches(&user.email, wanted, exact, cs) {
            return false;
        }
    }
    if f.auth_method.is_some_and(|a| user.auth_method != a)
        || f.role.is_some_and(|r| user.role != r)
    {
        return false;
    }
    if let Some(ref group) = f.group_name {
        if !group.is_empty() && user.group_name != *group {
            return false;
        }
    }

    if f.is_enabled.is_some_and(|e| user.is_enabled() != e)
        || f.deny_access.is_some_and(|d| user.deny_access != d)
        || f.mfa_enabled.is_some_and(|m| user.mfa != m)
    {
        return false;
    }

    if f.has_date_filter() && !matches_expiration(user, f, today) {
        return false;
    }

    if f.has_access_control.is_some_and(|h| user.has_access_control() != h) {
        return false;
    }

    if let Some(ref wanted) = f.mac_address {
        if !wanted.is_empty() {
            let wanted_lower = wanted.to_lowercase();
            let found = user.mac_addresses.iter().any(|mac| {
                if exact {
                    mac.as_str().eq_ignore_ascii_case(wanted)
                } else {
                    mac.as_str().contains(&wanted_lower)
                }
            });
            if !found {
                return false;
            }
        }
    }

    if let Some(ref wanted) = f.ip_address {
        if !wanted.is_empty() {
            let hit = if exact {
                user.ip_address == *wanted
            } else {
                user.ip_address.to_lowercase().contains(&wanted.to_lowercase())
            };
            if !hit {
                return false;
            }
        }
    }

    if let Some(ref text) = f.search_text {
        if !text.is_empty() {
            let fields = [&user.username, &user.email, &user.group_name];
            if !fields.iter().any(|v| text_matches(v, text, false, cs)) {
                return false;
            }
        }
    }

    true
}

/// Users without a parseable date never match an active date criterion.
fn matches_expiration(user: &User, f: &UserFilter, today: NaiveDate) -> bool {
    let Some(expires) = parse_expiration(&user.user_expiration) else {
        return false;
    };

    if f.user_expiration_after.is_some_and(|after| expires < after) {
        return false;
    }
    if f.user_expiration_before.is_some_and(|before| expires > before) {
        return false;
    }
    if let Some(days) = f.expiring_in_days {
        let remaining = (expires - today).num_days();
        if remaining < 0 || remaining > days {
            return false;
        }
    }
    if f.include_expired == Some(false) && expires < today {
        return false;
    }
    true
}

// ── Sorting ─────────────────────────────────────────────────────────

/// Stable sort. Unparseable expiration dates go last in either direction.
pub fn sort_users(users: &mut [User], field: SortField, order: SortOrder) {
    let directed = |ord: Ordering| match order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    };

    match field {
        SortField::Username => {
            users.sort_by(|a, b| directed(a.username.to_lowercase().cmp(&b.username.to_lowercase())));
        }
        SortField::Email => {
            users.sort_by(|a, b| directed(a.email.to_lowercase().cmp(&b.email.to_lowercase())));
        }
        SortField::AuthMethod => {
            users.sort_by(|a, b| directed(a.auth_method.to_string().cmp(&b.auth_method.to_string())));
        }
        SortField::Role => {
            users.sort_by(|a, b| directed(a.role.to_string().cmp(&b.role.to_string())));
        }
        SortField::GroupName => users.sort_by(|a, b| directed(a.group_name.cmp(&b.group_name))),
        SortField::UserExpiration => users.sort_by(|a, b| {
            match (
                parse_expiration(&a.user_expiration),
                parse_expiration(&b.user_expiration),
            ) {
                (Some(x), Some(y)) => directed(x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }),
    }
}

// ── Expiration report ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExpirationStatus {
    Expired,
    /// Three days or fewer left.
    Critical,
    /// Seven days or fewer left.
    Warning,
    Expiring,
}

impl ExpirationStatus {
    fn for_days(days_until: i64) -> Self {
        match days_until {
            d if d < 0 => Self::Expired,
            0..=3 => Self::Critical,
            4..=7 => Self::Warning,
            _ => Self::Expiring,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpirationEntry {
    pub username: String,
    pub email: String,
    pub user_expiration: String,
    pub auth_method: AuthMethod,
    pub role: Role,
    pub group_name: String,
    pub access_control: Vec<String>,
    /// Negative once expired.
    pub days_until_expiry: i64,
    pub status: ExpirationStatus,
}

/// Users expiring within `days` of `today`, plus those expired no longer
/// than `days` ago, soonest first.
///
/// Users whose expiration cannot be parsed are reported with `warn!` and
/// left out. Callers check `days` against [`MAX_REPORT_DAYS`].
pub fn expiration_report(users: &[User], days: i64, today: NaiveDate) -> Vec<ExpirationEntry> {
    let mut entries: Vec<ExpirationEntry> = users
        .iter()
        .filter(|u| !u.user_expiration.trim().is_empty())
        .filter_map(|u| {
            let Some(expires) = parse_expiration(&u.user_expiration) else {
                warn!(
                    username = %u.username,
                    expiration = %u.user_expiration,
                    "unparseable expiration date, left out of report"
                );
                return None;
            };
            let days_until = (expires - today).num_days();
            if days_until > days || days_until < -days {
                return None;
            }
            Some(ExpirationEntry {
                username: u.username.clone(),
                email: u.email.clone(),
                user_expiration: u.user_expiration.clone(),
                auth_method: u.auth_method,
                role: u.role,
                group_name: u.group_name.clone(),
                access_control: u.access_control.clone(),
                days_until_expiry: days_until,
                status: ExpirationStatus::for_days(days_until),
            })
        })
        .collect();
    entries.sort_by_key(|e| e.days_until_expiry);
    entries
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{AuthMethod, MacAddress, Role};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn user(name: &str) -> User {
        User::new(name, format!("{name}@example.com"), AuthMethod::Local)
    }

    fn names(page: &Page<User>) -> Vec<&str> {
        page.items.iter().map(|u| u.username.as_str()).collect()
    }

    #[test]
    fn second_page_of_twenty_five() {
        let users: Vec<User> = (1..=25).rev().map(|i| user(&format!("user{i:02}"))).collect();
        let filter = UserFilter {
            page: Some(2),
            limit: Some(10),
            ..UserFilter::default()
        };
        let page = query_users(users, &filter, today());
        assert_eq!(page.total, 25);
        let expected: Vec<String> = (11..=20).map(|i| format!("user{i:02}")).collect();
        assert_eq!(names(&page), expected);
    }

    #[test]
    fn page_past_the_end_is_empty_but_counts() {
        let users = vec![user("a"), user("b")];
        let filter = UserFilter {
            page: Some(5),
            ..UserFilter::default()
        };
        let page = query_users(users, &filter, today());
        assert!(page.items.is_empty());
        assert_eq!(page.total, 2);
    }

    #[test]
    fn username_default_sort_ignores_case() {
        let users = vec![user("bob"), user("Alice"), user("carol")];
        let page = query_users(users, &UserFilter::default(), today());
        assert_eq!(names(&page), vec!["Alice", "bob", "carol"]);

        let filter = UserFilter {
            sort_order: SortOrder::Desc,
            ..UserFilter::default()
        };
        let page = query_users(vec![user("bob"), user("Alice")], &filter, today());
        assert_eq!(names(&page), vec!["bob", "Alice"]);
    }

    #[test]
    fn text_matching_modes() {
        let users = vec![user("alice"), user("Alicia"), user("bob")];

        let substring = UserFilter {
            username: Some("ali".into()),
            ..UserFilter::default()
        };
        assert_eq!(query_users(users.clone(), &substring, today()).total, 2);

        let case_sensitive = UserFilter {
            username: Some("Ali".into()),
            case_sensitive: true,
            ..UserFilter::default()
        };
        assert_eq!(names(&query_users(users.clone(), &case_sensitive, today())), vec!["Alicia"]);

        let exact = UserFilter {
            username: Some("ALICE".into()),
            exact_match: true,
            ..UserFilter::default()
        };
        assert_eq!(names(&query_users(users, &exact, today())), vec!["alice"]);
    }

    #[test]
    fn flag_and_enum_filters() {
        let mut admin = user("root");
        admin.role = Role::Admin;
        let mut off = user("off");
        off.deny_access = true;
        off.mfa = false;
        let users = vec![admin, off, user("plain")];

        let f = UserFilter {
            role: Some(Role::Admin),
            ..UserFilter::default()
        };
        assert_eq!(names(&query_users(users.clone(), &f, today())), vec!["root"]);

        let f = UserFilter {
            is_enabled: Some(false),
            ..UserFilter::default()
        };
        assert_eq!(names(&query_users(users.clone(), &f, today())), vec!["off"]);

        let f = UserFilter {
            mfa_enabled: Some(true),
            ..UserFilter::default()
        };
        assert_eq!(query_users(users, &f, today()).total, 2);
    }

    #[test]
    fn expiring_in_days_excludes_undated_and_expired() {
        let mut soon = user("soon");
        soon.user_expiration = "05/03/2026".into();
        let mut later = user("later");
        later.user_expiration = "2026-06-01".into();
        let mut past = user("past");
        past.user_expiration = "01/01/2026".into();
        let mut junk = user("junk");
        junk.user_expiration = "whenever".into();
        let users = vec![soon, later, past, junk, user("none")];

        let f = UserFilter {
            expiring_in_days: Some(7),
            ..UserFilter::default()
        };
        assert_eq!(names(&query_users(users.clone(), &f, today())), vec!["soon"]);

        let f = UserFilter {
            include_expired: Some(false),
            ..UserFilter::default()
        };
        assert_eq!(names(&query_users(users.clone(), &f, today())), vec!["later", "soon"]);

        let f = UserFilter {
            include_expired: Some(true),
            ..UserFilter::default()
        };
        assert_eq!(query_users(users, &f, today()).total, 5);
    }

    #[test]
    fn invalid_dates_sort_last_in_both_directions() {
        let mut a = user("a");
        a.user_expiration = "01/05/2026".into();
        let mut b = user("b");
        b.user_expiration = "bogus".into();
        let mut c = user("c");
        c.user_expiration = "2026-04-01".into();

        let mut list = vec![a.clone(), b.clone(), c.clone()];
        sort_users(&mut list, SortField::UserExpiration, SortOrder::Asc);
        assert_eq!(list.iter().map(|u| u.username.as_str()).collect::<Vec<_>>(), vec!["c", "a", "b"]);

        let mut list = vec![b, a, c];
        sort_users(&mut list, SortField::UserExpiration, SortOrder::Desc);
        assert_eq!(list.iter().map(|u| u.username.as_str()).collect::<Vec<_>>(), vec!["a", "c", "b"]);
    }

    #[test]
    fn mac_and_search_filters() {
        let mut a = user("alice");
        a.mac_addresses = vec![MacAddress::parse("aa:bb:cc:dd:ee:ff").unwrap()];
        a.group_name = "engineering".into();
        let users = vec![a, user("bob")];

        let f = UserFilter {
            mac_address: Some("DD:EE".into()),
            ..UserFilter::default()
        };
        assert_eq!(names(&query_users(users.clone(), &f, today())), vec!["alice"]);

        let f = UserFilter {
            search_text: Some("ENGINEER".into()),
            ..UserFilter::default()
        };
        assert_eq!(names(&query_users(users, &f, today())), vec!["alice"]);
    }

    #[test]
    fn report_classifies_and_orders() {
        let mut a = user("week");
        a.user_expiration = "07/03/2026".into();
        let mut b = user("gone");
        b.user_expiration = "25/02/2026".into();
        let mut c = user("tomorrow");
        c.user_expiration = "2026-03-02".into();
        let mut d = user("month");
        d.user_expiration = "2026-03-20".into();
        let mut e = user("ancient");
        e.user_expiration = "2020-01-01".into();
        let mut f = user("garbled");
        f.user_expiration = "next tuesday".into();
        let users = vec![a, b, c, d, e, f, user("forever")];

        let report = expiration_report(&users, 30, today());
        let rows: Vec<(&str, i64, ExpirationStatus)> = report
            .iter()
            .map(|e| (e.username.as_str(), e.days_until_expiry, e.status))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("gone", -4, ExpirationStatus::Expired),
                ("tomorrow", 1, ExpirationStatus::Critical),
                ("week", 6, ExpirationStatus::Warning),
                ("month", 19, ExpirationStatus::Expiring),
            ]
        );

        let narrow = expiration_report(&users, 3, today());
        assert_eq!(narrow.len(), 1);
        assert_eq!(narrow[0].username, "tomorrow");
    }

    #[test]
    fn group_filters() {
        let mut ops = Group::new("Ops", AuthMethod::Ldap);
        ops.deny_access = true;
        let groups = vec![ops, Group::new("devops", AuthMethod::Local), Group::new("sales", AuthMethod::Local)];

        let f = GroupFilter {
            group_name: Some("OPS".into()),
            ..GroupFilter::default()
        };
        assert_eq!(query_groups(groups.clone(), &f).total, 2);

        let f = GroupFilter {
            is_enabled: Some(true),
            auth_method: Some(AuthMethod::Local),
            limit: Some(1),
            ..GroupFilter::default()
        };
        let page = query_groups(groups, &f);
        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].group_name, "devops");
    }
}
