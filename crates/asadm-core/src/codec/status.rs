// ── VPN status codec ──
//
// Client rows are positional: 12 string fields per connected client.
// Shorter rows are skipped.

use std::net::IpAddr;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::trace;

use asadm_api::DaemonStatus;

use crate::model::ConnectedUser;

const ROW_FIELDS: usize = 12;
const CONNECTED_SINCE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Flatten every daemon's client list into connected users.
pub fn decode_connected_users(daemons: &[DaemonStatus], now: DateTime<Utc>) -> Vec<ConnectedUser> {
    daemons
        .iter()
        .flat_map(|d| d.clients.iter())
        .filter_map(|row| decode_row(row, now))
        .collect()
}

fn decode_row(row: &[String], now: DateTime<Utc>) -> Option<ConnectedUser> {
    if row.len() < ROW_FIELDS {
        trace!(fields = row.len(), "skipping short client row");
        return None;
    }
    let [
        common_name,
        real,
        virtual_address,
        virtual_ipv6,
        bytes_in,
        bytes_out,
        since_text,
        since_unix,
        username,
        client_id,
        peer_id,
        cipher,
    ] = row.get(..ROW_FIELDS)?
    else {
        return None;
    };

    let connected_since_unix = since_unix.trim().parse::<i64>().unwrap_or_default();
    let connected_since = NaiveDateTime::parse_from_str(since_text, CONNECTED_SINCE_FORMAT)
        .map(|naive| naive.and_utc())
        .ok()
        .or_else(|| {
            (connected_since_unix > 0)
                .then(|| DateTime::from_timestamp(connected_since_unix, 0))
                .flatten()
        })
        .unwrap_or(now);

    let real_address = host_part(real).to_owned();
    let country = country_of(&real_address).to_owned();

    Some(ConnectedUser {
        common_name: common_name.clone(),
        real_address,
        virtual_address: virtual_address.clone(),
        virtual_ipv6_address: virtual_ipv6.clone(),
        bytes_received: bytes_in.trim().parse().unwrap_or_default(),
        bytes_sent: bytes_out.trim().parse().unwrap_or_default(),
        connected_since,
        connected_since_unix,
        username: username.clone(),
        client_id: client_id.clone(),
        peer_id: peer_id.clone(),
        data_channel_cipher: cipher.clone(),
        country,
        connection_duration: format_duration(now - connected_since),
    })
}

/// Text before the last `:`, or the whole string.
pub fn host_part(address: &str) -> &str {
    address.rfind(':').map_or(address, |i| &address[..i])
}

/// `"Local"` for private, loopback and link-local addresses.
///
/// No geolocation lookup is performed; public addresses are `"Unknown"`.
pub fn country_of(host: &str) -> &'static str {
    let local = match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        Ok(IpAddr::V6(v6)) => v6.is_loopback(),
        Err(_) => false,
    };
    if local { "Local" } else { "Unknown" }
}

/// `1h2m3s`, `2m3s` or `3s`. Negative spans render as `0s`.
pub fn format_duration(span: chrono::TimeDelta) -> String {
    let total = span.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}
