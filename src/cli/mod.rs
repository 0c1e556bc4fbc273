// Command-line helpers
//
// Argument parsing for delivery targets and plain-text rendering of
// discovery results.

mod output;

pub use output::{format_cpm, format_coverage, render_outcomes, render_tools};

use anyhow::{bail, Result};

use crate::mcp::{DeliveryTarget, PlatformAccount};

/// Parse `PLATFORM[:ACCOUNT]`
pub fn parse_platform(value: &str) -> Result<PlatformAccount> {
    let (platform, account) = match value.split_once(':') {
        Some((platform, account)) => (platform.trim(), Some(account.trim())),
        None => (value.trim(), None),
    };

    if platform.is_empty() {
        bail!("Platform name must not be empty in '{}'", value);
    }

    let entry = PlatformAccount::new(platform);
    Ok(match account.filter(|a| !a.is_empty()) {
        Some(account) => entry.with_account(account),
        None => entry,
    })
}

/// Build a delivery target from CLI flags; None when no flag was given
pub fn delivery_target(platforms: &[String], countries: &[String]) -> Result<Option<DeliveryTarget>> {
    if platforms.is_empty() && countries.is_empty() {
        return Ok(None);
    }

    let mut target = if platforms.is_empty() || platforms.iter().any(|p| p == "all") {
        DeliveryTarget::all()
    } else {
        let parsed = platforms
            .iter()
            .map(|p| parse_platform(p))
            .collect::<Result<Vec<_>>>()?;
        DeliveryTarget::platforms(parsed)
    };

    if !countries.is_empty() {
        target = target.with_countries(countries.iter().map(|c| c.to_ascii_uppercase()));
    }

    Ok(Some(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::Platforms;

    #[test]
    fn test_parse_platform_with_account() {
        let parsed = parse_platform("the-trade-desk:acct-42").unwrap();
        assert_eq!(parsed.platform, "the-trade-desk");
        assert_eq!(parsed.account.as_deref(), Some("acct-42"));
    }

    #[test]
    fn test_parse_platform_without_account() {
        let parsed = parse_platform("index-exchange").unwrap();
        assert_eq!(parsed.account, None);

        let parsed = parse_platform("index-exchange:").unwrap();
        assert_eq!(parsed.account, None);
    }

    #[test]
    fn test_parse_platform_rejects_empty_name() {
        assert!(parse_platform(":acct").is_err());
    }

    #[test]
    fn test_delivery_target_none_without_flags() {
        assert!(delivery_target(&[], &[]).unwrap().is_none());
    }

    #[test]
    fn test_delivery_target_countries_only() {
        let target = delivery_target(&[], &["us".to_string()]).unwrap().unwrap();
        assert_eq!(target.platforms, Platforms::All);
        assert_eq!(target.countries, Some(vec!["US".to_string()]));
    }

    #[test]
    fn test_delivery_target_selected_platforms() {
        let target = delivery_target(&["ttd:1".to_string(), "ix".to_string()], &[])
            .unwrap()
            .unwrap();
        match target.platforms {
            Platforms::Selected(list) => assert_eq!(list.len(), 2),
            Platforms::All => panic!("expected selected platforms"),
        }
        assert_eq!(target.countries, None);
    }
}
