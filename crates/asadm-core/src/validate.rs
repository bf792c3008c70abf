// ── Input normalization ──
//
// Shapes caller input into what the appliance stores: MAC lists,
// access-control entries, passwords and expiration dates.

use chrono::NaiveDate;
use ipnetwork::IpNetwork;

use crate::error::ValidationError;
use crate::model::MacAddress;

/// Most MAC addresses a user can bind.
pub const MAX_MAC_ADDRESSES: usize = 5;

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;

/// Formats tried, in order, when reading an expiration date.
pub const EXPIRATION_FORMATS: [&str; 4] = ["%d/%m/%Y", "%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Format the appliance expects on write.
pub const EXPIRATION_WRITE_FORMAT: &str = "%d/%m/%Y";

/// Normalize every address. Fails on the first malformed one.
pub fn normalize_macs<S: AsRef<str>>(raw: &[S]) -> Result<Vec<MacAddress>, ValidationError> {
    if raw.len() > MAX_MAC_ADDRESSES {
        return Err(ValidationError::Field {
            field: "macAddresses",
            message: format!("at most {MAX_MAC_ADDRESSES} addresses are allowed"),
        });
    }
    raw.iter().map(|m| MacAddress::parse(m.as_ref())).collect()
}

/// Append `/32` to bare addresses and reject trailing slashes.
pub fn fix_access_control<S: AsRef<str>>(entries: &[S]) -> Result<Vec<String>, ValidationError> {
    entries
        .iter()
        .map(|entry| {
            let entry = entry.as_ref().trim();
            if entry.is_empty() || entry.ends_with('/') {
                return Err(ValidationError::InvalidAccessEntry(entry.to_owned()));
            }
            let fixed = if entry.contains('/') {
                entry.to_owned()
            } else {
                format!("{entry}/32")
            };
            fixed
                .parse::<IpNetwork>()
                .map_err(|_| ValidationError::InvalidAccessEntry(entry.to_owned()))?;
            Ok(fixed)
        })
        .collect()
}

/// Length policy for local passwords.
pub fn check_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        return Err(ValidationError::PasswordPolicy(format!(
            "password must be at least {PASSWORD_MIN_LEN} characters long"
        )));
    }
    if len > PASSWORD_MAX_LEN {
        return Err(ValidationError::PasswordPolicy(format!(
            "password must not exceed {PASSWORD_MAX_LEN} characters"
        )));
    }
    Ok(())
}

/// Parse an expiration date, trying each known format. First match wins.
pub fn parse_expiration(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    EXPIRATION_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Check a caller-supplied expiration and render it as the appliance expects.
///
/// Empty input stays empty (no expiration).
pub fn normalize_expiration(raw: &str) -> Result<String, ValidationError> {
    if raw.trim().is_empty() {
        return Ok(String::new());
    }
    parse_expiration(raw)
        .map(|d| d.format(EXPIRATION_WRITE_FORMAT).to_string())
        .ok_or_else(|| ValidationError::InvalidDate(raw.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn access_entries_get_host_prefix() {
        let fixed = fix_access_control(&["10.0.0.5", "10.1.0.0/16", " 192.168.1.1 "]).unwrap();
        assert_eq!(fixed, vec!["10.0.0.5/32", "10.1.0.0/16", "192.168.1.1/32"]);
    }

    #[test]
    fn access_entries_reject_trailing_slash_and_garbage() {
        assert!(matches!(
            fix_access_control(&["10.0.0.0/"]),
            Err(ValidationError::InvalidAccessEntry(_))
        ));
        assert!(fix_access_control(&["not-an-ip"]).is_err());
        assert!(fix_access_control(&[""]).is_err());
    }

    #[test]
    fn mac_list_limits() {
        let six: Vec<String> = (0..6).map(|i| format!("00:00:00:00:00:0{i}")).collect();
        assert!(normalize_macs(&six).is_err());
        assert!(normalize_macs(&["zz"]).is_err());
        let macs = normalize_macs(&["AA-BB-CC-DD-EE-FF"]).unwrap();
        assert_eq!(macs[0].as_str(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn password_bounds() {
        assert!(check_password("short").is_err());
        assert!(check_password("exactly8").is_ok());
        assert!(check_password(&"x".repeat(128)).is_ok());
        assert!(check_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn date_formats_in_priority_order() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(parse_expiration("31/12/2030"), Some(d(2030, 12, 31)));
        assert_eq!(parse_expiration("2030-12-31"), Some(d(2030, 12, 31)));
        assert_eq!(parse_expiration("12/31/2030"), Some(d(2030, 12, 31)));
        assert_eq!(parse_expiration("2030/12/31"), Some(d(2030, 12, 31)));
        // Ambiguous: day-first wins.
        assert_eq!(parse_expiration("01/02/2030"), Some(d(2030, 2, 1)));
        assert_eq!(parse_expiration("someday"), None);
        assert_eq!(parse_expiration(""), None);
    }

    #[test]
    fn expiration_is_rewritten_day_first() {
        assert_eq!(normalize_expiration("2030-12-31").unwrap(), "31/12/2030");
        assert_eq!(normalize_expiration("").unwrap(), "");
        assert!(normalize_expiration("tomorrow").is_err());
    }
}
