//! Network conditions that affect external image downloads.

use url::Url;

const NM_DESTINATION: &str = "org.freedesktop.NetworkManager";
const NM_PATH: &str = "/org/freedesktop/NetworkManager";
const NM_INTERFACE: &str = "org.freedesktop.NetworkManager";

/// Reports whether the current connection is metered.
pub trait NetworkStatus: Send + Sync {
    fn is_metered(&self) -> bool;
}

/// Asks NetworkManager over the system bus.
///
/// Any failure (no system bus, NetworkManager not running) counts as
/// unmetered.
#[derive(Debug, Default)]
pub struct NetworkManagerStatus;

impl NetworkStatus for NetworkManagerStatus {
    fn is_metered(&self) -> bool {
        match query_metered() {
            Ok(metered) => metered,
            Err(e) => {
                log::debug!("network: metered state unavailable: {e}");
                false
            }
        }
    }
}

/// Callers may or may not be inside a tokio runtime, so the query gets its
/// own thread and current-thread runtime.
fn query_metered() -> Result<bool, String> {
    let worker = std::thread::spawn(|| -> Result<bool, String> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| e.to_string())?;
        rt.block_on(async {
            let conn = zbus::Connection::system().await?;
            let proxy = zbus::Proxy::new(&conn, NM_DESTINATION, NM_PATH, NM_INTERFACE).await?;
            let state: u32 = proxy.get_property("Metered").await?;
            Ok::<_, zbus::Error>(is_metered_state(state))
        })
        .map_err(|e| e.to_string())
    });
    worker
        .join()
        .map_err(|_| "metered query thread panicked".to_string())?
}

/// `NMMetered`: 1 = yes, 3 = guessed yes.
fn is_metered_state(state: u32) -> bool {
    matches!(state, 1 | 3)
}

/// A connection state that never changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedNetworkStatus(pub bool);

impl NetworkStatus for FixedNetworkStatus {
    fn is_metered(&self) -> bool {
        self.0
    }
}

/// Proxy to use for `url`, from the process environment.
pub fn proxy_for_url(url: &str) -> Option<String> {
    proxy_for_url_from(url, |name| std::env::var(name).ok())
}

/// Proxy to use for `url`, reading `https_proxy`, `http_proxy`,
/// `all_proxy` and `no_proxy` (lowercase first, then uppercase) via `env`.
pub fn proxy_for_url_from(url: &str, env: impl Fn(&str) -> Option<String>) -> Option<String> {
    let lookup = |name: &str| {
        env(name)
            .or_else(|| env(&name.to_ascii_uppercase()))
            .filter(|v| !v.trim().is_empty())
    };

    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    if let Some(no_proxy) = lookup("no_proxy") {
        if bypasses_proxy(&no_proxy, host) {
            return None;
        }
    }

    let scheme_var = match parsed.scheme() {
        "https" => "https_proxy",
        "http" => "http_proxy",
        _ => return None,
    };
    lookup(scheme_var).or_else(|| lookup("all_proxy"))
}

fn bypasses_proxy(no_proxy: &str, host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    no_proxy
        .split(',')
        .map(|entry| entry.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|entry| !entry.is_empty())
        .any(|entry| entry == "*" || host == entry || host.ends_with(&format!(".{entry}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn metered_states() {
        assert!(!is_metered_state(0));
        assert!(is_metered_state(1));
        assert!(!is_metered_state(2));
        assert!(is_metered_state(3));
        assert!(!is_metered_state(4));
    }

    #[test]
    fn no_proxy_configured() {
        assert_eq!(proxy_for_url_from("https://art.gametdb.com/x", env(&[])), None);
    }

    #[test]
    fn scheme_specific_proxy() {
        let vars = env(&[
            ("https_proxy", "http://secure:3128"),
            ("http_proxy", "http://plain:3128"),
        ]);
        assert_eq!(
            proxy_for_url_from("https://art.gametdb.com/x", &vars).as_deref(),
            Some("http://secure:3128")
        );
        assert_eq!(
            proxy_for_url_from("http://art.gametdb.com/x", &vars).as_deref(),
            Some("http://plain:3128")
        );
    }

    #[test]
    fn uppercase_and_all_proxy_fallback() {
        let vars = env(&[("ALL_PROXY", "socks5://fallback:1080")]);
        assert_eq!(
            proxy_for_url_from("https://art.gametdb.com/x", &vars).as_deref(),
            Some("socks5://fallback:1080")
        );
    }

    #[test]
    fn no_proxy_matches_domain_suffix() {
        let vars = env(&[
            ("https_proxy", "http://secure:3128"),
            ("no_proxy", "localhost, .gametdb.com"),
        ]);
        assert_eq!(proxy_for_url_from("https://art.gametdb.com/x", &vars), None);
        assert_eq!(proxy_for_url_from("https://gametdb.com/x", &vars), None);
        assert!(proxy_for_url_from("https://notgametdb.com/x", &vars).is_some());
    }

    #[test]
    fn no_proxy_wildcard() {
        let vars = env(&[("https_proxy", "http://secure:3128"), ("NO_PROXY", "*")]);
        assert_eq!(proxy_for_url_from("https://art.gametdb.com/x", &vars), None);
    }

    #[test]
    fn invalid_url_has_no_proxy() {
        let vars = env(&[("all_proxy", "http://p:1")]);
        assert_eq!(proxy_for_url_from("not a url", &vars), None);
    }
}
