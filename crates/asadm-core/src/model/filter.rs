// ── List filters ──
//
// The appliance cannot filter, sort or paginate. These describe what the
// repository applies client-side after fetching everything.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::user::{AuthMethod, Role};

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 20;

/// Field a user listing is sorted by.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum SortField {
    #[default]
    Username,
    Email,
    AuthMethod,
    Role,
    GroupName,
    UserExpiration,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Criteria for listing users. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserFilter {
    pub username: Option<String>,
    pub email: Option<String>,
    pub auth_method: Option<AuthMethod>,
    pub role: Option<Role>,
    pub group_name: Option<String>,

    pub is_enabled: Option<bool>,
    pub deny_access: Option<bool>,
    pub mfa_enabled: Option<bool>,

    pub user_expiration_after: Option<NaiveDate>,
    pub user_expiration_before: Option<NaiveDate>,
    pub include_expired: Option<bool>,
    pub expiring_in_days: Option<i64>,

    pub has_access_control: Option<bool>,
    pub mac_address: Option<String>,
    pub ip_address: Option<String>,
    pub search_text: Option<String>,

    pub sort_by: SortField,
    pub sort_order: SortOrder,
    /// 1-based. `None` means the first page.
    pub page: Option<usize>,
    pub limit: Option<usize>,

    /// Text fields must match exactly rather than by substring.
    pub exact_match: bool,
    pub case_sensitive: bool,
}

impl UserFilter {
    pub fn page(&self) -> usize {
        self.page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> usize {
        self.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> usize {
        (self.page() - 1) * self.limit()
    }

    /// Whether any expiration criterion is active.
    ///
    /// `include_expired = Some(true)` alone does not restrict anything.
    pub fn has_date_filter(&self) -> bool {
        self.user_expiration_after.is_some()
            || self.user_expiration_before.is_some()
            || self.expiring_in_days.is_some()
            || self.include_expired == Some(false)
    }
}

/// Criteria for listing groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupFilter {
    pub group_name: Option<String>,
    pub auth_method: Option<AuthMethod>,
    pub role: Option<Role>,
    pub is_enabled: Option<bool>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl GroupFilter {
    pub fn page(&self) -> usize {
        self.page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> usize {
        self.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> usize {
        (self.page() - 1) * self.limit()
    }
}

/// One page of a filtered listing plus the pre-pagination total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}
