use crate::error::ValidateError;
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use typed_builder::TypedBuilder;
use url::{Host, Url};

/// Maximum accepted length of a submitted target URL.
pub const MAX_TARGET_LENGTH: usize = 2048;

type Result<T> = std::result::Result<T, ValidateError>;

/// Normalizes a submitted target URL.
///
/// The input is trimmed; a `/`-prefixed input is accepted verbatim as a
/// site-relative path; otherwise a missing `scheme://` prefix defaults to
/// `https://`, and the result must parse as an absolute http(s) URL with
/// a host.
pub fn normalize_target(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidateError::InvalidTarget(
            "target url is empty".to_string(),
        ));
    }
    if trimmed.len() > MAX_TARGET_LENGTH {
        return Err(ValidateError::InvalidTarget(format!(
            "target url exceeds {MAX_TARGET_LENGTH} characters"
        )));
    }
    if trimmed.starts_with('/') {
        return Ok(trimmed.to_string());
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&candidate)
        .map_err(|err| ValidateError::InvalidTarget(err.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ValidateError::InvalidTarget(format!(
                "scheme must be http or https, got {other:?}"
            )))
        }
    }
    if url.host_str().is_none() {
        return Err(ValidateError::InvalidTarget(
            "target url must include a host".to_string(),
        ));
    }
    Ok(url.to_string())
}

/// SSRF and domain policy applied to normalized targets.
///
/// With `block_private_networks` set, a target whose host is (or resolves
/// to) a loopback, link-local, or private-range address is refused, so the
/// shortener cannot be used to point at internal infrastructure. Hostname
/// resolution happens here, on the caller's task, never under a store or
/// allocator lock.
#[derive(Debug, Clone, TypedBuilder)]
pub struct TargetPolicy {
    /// Hostnames that may never be targeted. Matched exactly, lowercase.
    #[builder(default)]
    blocked_domains: HashSet<String>,
    /// Refuse targets addressing non-public networks.
    #[builder(default = false)]
    block_private_networks: bool,
}

impl Default for TargetPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl TargetPolicy {
    /// Checks a normalized target against the policy.
    ///
    /// Site-relative targets have no host and always pass.
    pub async fn check(&self, target: &str) -> Result<()> {
        if target.starts_with('/') {
            return Ok(());
        }
        let url = Url::parse(target)
            .map_err(|err| ValidateError::InvalidTarget(err.to_string()))?;
        let Some(host) = url.host() else {
            return Ok(());
        };

        let name = host.to_string().to_lowercase();
        if self.blocked_domains.contains(name.trim_end_matches('.')) {
            return Err(ValidateError::ForbiddenTarget(format!(
                "domain is blocked: {name}"
            )));
        }
        if !self.block_private_networks {
            return Ok(());
        }

        match host {
            Host::Ipv4(addr) => self.require_public(IpAddr::V4(addr), &name),
            Host::Ipv6(addr) => self.require_public(IpAddr::V6(addr), &name),
            Host::Domain(domain) => {
                let domain = domain.trim_end_matches('.').to_lowercase();
                if domain == "localhost" {
                    return Err(ValidateError::ForbiddenTarget(
                        "localhost is not a valid target".to_string(),
                    ));
                }
                let port = url.port_or_known_default().unwrap_or(443);
                let resolved = tokio::net::lookup_host((domain.as_str(), port))
                    .await
                    .map_err(|err| {
                        ValidateError::InvalidTarget(format!(
                            "could not resolve host {domain}: {err}"
                        ))
                    })?;
                for addr in resolved {
                    self.require_public(addr.ip(), &domain)?;
                }
                Ok(())
            }
        }
    }

    fn require_public(&self, addr: IpAddr, host: &str) -> Result<()> {
        if is_public_address(addr) {
            Ok(())
        } else {
            Err(ValidateError::ForbiddenTarget(format!(
                "host {host} addresses a non-public network ({addr})"
            )))
        }
    }
}

fn is_public_address(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => is_public_v6(v6),
    }
}

fn is_public_v4(addr: Ipv4Addr) -> bool {
    !(addr.is_loopback()
        || addr.is_private()
        || addr.is_link_local()
        || addr.is_unspecified()
        || addr.is_broadcast())
}

fn is_public_v6(addr: Ipv6Addr) -> bool {
    if let Some(mapped) = addr.to_ipv4_mapped() {
        return is_public_v4(mapped);
    }
    let segments = addr.segments();
    let unique_local = (segments[0] & 0xfe00) == 0xfc00;
    let link_local = (segments[0] & 0xffc0) == 0xfe80;
    !(addr.is_loopback() || addr.is_unspecified() || unique_local || link_local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_defaults_to_https() {
        assert_eq!(
            normalize_target("example.com/page").unwrap(),
            "https://example.com/page"
        );
    }

    #[test]
    fn explicit_scheme_is_preserved() {
        assert_eq!(
            normalize_target("http://example.com/page").unwrap(),
            "http://example.com/page"
        );
    }

    #[test]
    fn input_is_trimmed() {
        assert_eq!(
            normalize_target("  example.com/page \n").unwrap(),
            "https://example.com/page"
        );
    }

    #[test]
    fn site_relative_paths_pass_through_verbatim() {
        assert_eq!(normalize_target("/docs/intro").unwrap(), "/docs/intro");
    }

    #[test]
    fn empty_target_is_rejected() {
        assert!(matches!(
            normalize_target("   "),
            Err(ValidateError::InvalidTarget(_))
        ));
    }

    #[test]
    fn overlong_target_is_rejected() {
        let raw = format!("example.com/{}", "a".repeat(MAX_TARGET_LENGTH));
        assert!(matches!(
            normalize_target(&raw),
            Err(ValidateError::InvalidTarget(_))
        ));
    }

    #[test]
    fn non_http_schemes_are_rejected() {
        for raw in ["ftp://example.com", "file:///etc/passwd"] {
            assert!(
                matches!(normalize_target(raw), Err(ValidateError::InvalidTarget(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn script_pseudo_urls_are_rejected() {
        // No "://", so https:// is prepended and the remainder fails to
        // parse as an authority.
        assert!(matches!(
            normalize_target("javascript:alert(1)"),
            Err(ValidateError::InvalidTarget(_))
        ));
    }

    #[tokio::test]
    async fn disabled_policy_lets_private_addresses_through() {
        let policy = TargetPolicy::default();
        policy.check("http://127.0.0.1/admin").await.unwrap();
        policy.check("http://192.168.1.10/").await.unwrap();
    }

    #[tokio::test]
    async fn private_ranges_are_refused_when_enabled() {
        let policy = TargetPolicy::builder()
            .block_private_networks(true)
            .build();
        for target in [
            "http://127.0.0.1/admin",
            "http://10.0.0.8/",
            "http://172.16.3.4/",
            "http://192.168.1.10/",
            "http://169.254.169.254/latest/meta-data",
            "http://[::1]/",
            "http://[fc00::1]/",
            "http://[fe80::1]/",
            "http://[::ffff:10.0.0.1]/",
        ] {
            assert!(
                matches!(
                    policy.check(target).await,
                    Err(ValidateError::ForbiddenTarget(_))
                ),
                "{target:?} should be refused"
            );
        }
    }

    #[tokio::test]
    async fn public_literal_addresses_pass() {
        let policy = TargetPolicy::builder()
            .block_private_networks(true)
            .build();
        policy.check("http://93.184.216.34/").await.unwrap();
        policy.check("http://[2606:2800:220:1::1]/").await.unwrap();
    }

    #[tokio::test]
    async fn localhost_is_refused_without_resolution() {
        let policy = TargetPolicy::builder()
            .block_private_networks(true)
            .build();
        assert!(matches!(
            policy.check("http://localhost:8080/").await,
            Err(ValidateError::ForbiddenTarget(_))
        ));
    }

    #[tokio::test]
    async fn blocklisted_domains_are_refused() {
        let policy = TargetPolicy::builder()
            .blocked_domains(HashSet::from(["evil.example".to_string()]))
            .build();
        assert!(matches!(
            policy.check("https://evil.example/payload").await,
            Err(ValidateError::ForbiddenTarget(_))
        ));
        policy.check("https://example.com/").await.unwrap();
    }

    #[tokio::test]
    async fn relative_targets_skip_the_policy() {
        let policy = TargetPolicy::builder()
            .block_private_networks(true)
            .build();
        policy.check("/internal/docs").await.unwrap();
    }
}
