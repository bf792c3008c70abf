// ── Network allocator ──
//
// Pure checks over parsed configuration and group data: CIDR overlap,
// range containment, group-subnet validation against the appliance's own
// networks and sibling groups, and per-user address assignment.

use std::collections::HashSet;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use ipnetwork::Ipv4Network;
use tracing::warn;

use crate::error::{CoreError, ValidationError};
use crate::model::{Group, NetworkConfig, User};

// ── Primitives ──────────────────────────────────────────────────────

/// Parse `a.b.c.d/n`. A prefix length is required.
pub fn parse_cidr(raw: &str) -> Result<Ipv4Network, ValidationError> {
    let trimmed = raw.trim();
    if !trimmed.contains('/') {
        return Err(ValidationError::InvalidCidr(raw.to_owned()));
    }
    Ipv4Network::from_str(trimmed).map_err(|_| ValidationError::InvalidCidr(raw.to_owned()))
}

/// Two blocks overlap iff either contains the other's network address.
pub fn overlaps(a: &Ipv4Network, b: &Ipv4Network) -> bool {
    a.contains(b.network()) || b.contains(a.network())
}

/// Inclusive IPv4 range written as `"start-end"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpRange {
    pub start: Ipv4Addr,
    pub end: Ipv4Addr,
}

impl IpRange {
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        (u32::from(self.start)..=u32::from(self.end)).contains(&u32::from(ip))
    }

    /// Whether some subnet holds both endpoints.
    pub fn within_any(&self, subnets: &[Ipv4Network]) -> bool {
        subnets
            .iter()
            .any(|s| s.contains(self.start) && s.contains(self.end))
    }
}

impl FromStr for IpRange {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidRange {
            value: raw.to_owned(),
            reason: reason.to_owned(),
        };

        let (start, end) = raw
            .trim()
            .split_once('-')
            .ok_or_else(|| invalid("expected START-END"))?;
        let start: Ipv4Addr = start
            .trim()
            .parse()
            .map_err(|_| invalid("start is not an IPv4 address"))?;
        let end: Ipv4Addr = end
            .trim()
            .parse()
            .map_err(|_| invalid("end is not an IPv4 address"))?;
        if u32::from(start) > u32::from(end) {
            return Err(invalid("start is after end"));
        }
        Ok(Self { start, end })
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

// ── Group validation ────────────────────────────────────────────────

/// Validate a group's declared subnets and ranges before any write.
///
/// `self_name` is excluded from the sibling scan on update. Sibling
/// subnets that fail to parse are logged and skipped.
pub fn validate_group_addressing(
    subnets: &[String],
    ranges: &[String],
    network: &NetworkConfig,
    siblings: &[Group],
    self_name: Option<&str>,
) -> Result<(), CoreError> {
    if subnets.is_empty() {
        if ranges.is_empty() {
            return Ok(());
        }
        return Err(ValidationError::RangeWithoutSubnet.into());
    }

    let client_cidr = network.client_cidr().unwrap_or_default();
    let client_net = parse_cidr(&client_cidr).map_err(|_| CoreError::Config {
        message: format!("appliance client network '{client_cidr}' is not a valid CIDR"),
    })?;
    let pool_net = parse_cidr(&network.group_pool).map_err(|_| CoreError::Config {
        message: format!(
            "appliance group pool '{}' is not a valid CIDR",
            network.group_pool
        ),
    })?;

    let parsed = subnets
        .iter()
        .map(|s| parse_cidr(s))
        .collect::<Result<Vec<_>, _>>()?;

    for (raw, net) in subnets.iter().zip(&parsed) {
        if overlaps(net, &client_net) {
            return Err(ValidationError::SubnetOverlap {
                subnet: raw.clone(),
                conflict: client_cidr.clone(),
                owner: "the client network".into(),
            }
            .into());
        }
        if overlaps(net, &pool_net) {
            return Err(ValidationError::SubnetOverlap {
                subnet: raw.clone(),
                conflict: network.group_pool.clone(),
                owner: "the group pool".into(),
            }
            .into());
        }
    }

    for range in ranges {
        let parsed_range: IpRange = range.parse()?;
        if !parsed_range.within_any(&parsed) {
            return Err(ValidationError::RangeOutsideSubnets {
                range: range.clone(),
            }
            .into());
        }
    }

    check_sibling_overlap(subnets, &parsed, siblings, self_name)?;
    Ok(())
}

fn check_sibling_overlap(
    subnets: &[String],
    parsed: &[Ipv4Network],
    siblings: &[Group],
    self_name: Option<&str>,
) -> Result<(), ValidationError> {
    for sibling in siblings {
        if Some(sibling.group_name.as_str()) == self_name {
            continue;
        }
        for existing in sibling.group_subnet.iter().filter(|s| !s.is_empty()) {
            let Ok(existing_net) = parse_cidr(existing) else {
                warn!(
                    group = %sibling.group_name,
                    subnet = %existing,
                    "ignoring malformed subnet on existing group"
                );
                continue;
            };
            if let Some((raw, _)) = subnets
                .iter()
                .zip(parsed)
                .find(|(_, net)| overlaps(net, &existing_net))
            {
                return Err(ValidationError::SubnetOverlap {
                    subnet: raw.clone(),
                    conflict: existing.clone(),
                    owner: format!("group {}", sibling.group_name),
                });
            }
        }
    }
    Ok(())
}

// ── User address assignment ─────────────────────────────────────────

fn usable_subnets(group: &Group) -> Vec<Ipv4Network> {
    group
        .group_subnet
        .iter()
        .filter_map(|s| parse_cidr(s).ok())
        .collect()
}

fn usable_ranges(group: &Group) -> Vec<IpRange> {
    group
        .group_range
        .iter()
        .filter_map(|r| r.parse().ok())
        .collect()
}

/// Addresses currently held by any user.
pub fn used_addresses(users: &[User]) -> HashSet<Ipv4Addr> {
    users
        .iter()
        .filter_map(|u| u.ip_address.trim().parse().ok())
        .collect()
}

/// First free host address across the group's subnets, in declaration order.
///
/// Network and broadcast addresses are never handed out, nor are addresses
/// inside the group's reserved ranges.
pub fn next_dynamic_ip(group: &Group, used: &HashSet<Ipv4Addr>) -> Result<Ipv4Addr, ValidationError> {
    let subnets = usable_subnets(group);
    if subnets.is_empty() {
        return Err(ValidationError::GroupWithoutSubnet {
            group: group.group_name.clone(),
        });
    }
    let ranges = usable_ranges(group);

    for subnet in &subnets {
        let base = u64::from(u32::from(subnet.network()));
        let total = 1_u64 << (32 - u32::from(subnet.prefix()));
        for offset in 1..total.saturating_sub(1) {
            let Ok(raw) = u32::try_from(base + offset) else {
                break;
            };
            let candidate = Ipv4Addr::from(raw);
            if used.contains(&candidate) || ranges.iter().any(|r| r.contains(candidate)) {
                continue;
            }
            return Ok(candidate);
        }
    }

    Err(ValidationError::NoFreeAddress {
        group: group.group_name.clone(),
    })
}

/// Check a caller-supplied address for `current_username`.
///
/// The address must sit inside one of the group's subnets, outside its
/// reserved ranges, and must not be held by another user.
pub fn validate_static_ip(
    raw: &str,
    group: &Group,
    users: &[User],
    current_username: &str,
) -> Result<Ipv4Addr, ValidationError> {
    let ip: Ipv4Addr = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidIp(raw.to_owned()))?;

    if !usable_subnets(group).iter().any(|s| s.contains(ip)) {
        return Err(ValidationError::IpOutsideGroup {
            ip: ip.to_string(),
            group: group.group_name.clone(),
        });
    }

    if let Some(range) = usable_ranges(group).iter().find(|r| r.contains(ip)) {
        return Err(ValidationError::IpInReservedRange {
            ip: ip.to_string(),
            range: range.to_string(),
        });
    }

    if let Some(owner) = users.iter().find(|u| {
        u.username != current_username && u.ip_address.trim().parse::<Ipv4Addr>().ok() == Some(ip)
    }) {
        return Err(ValidationError::IpInUse {
            ip: ip.to_string(),
            owner: owner.username.clone(),
        });
    }

    Ok(ip)
}
