use axum_extra::extract::cookie::{Cookie, CookieJar};
use rand::Rng;

pub const VOTER_ID_COOKIE: &str = "voter_id";

/// Reuse the caller's voter id cookie, minting a fresh one if absent.
pub fn ensure_voter_id(jar: CookieJar) -> (CookieJar, String) {
    if let Some(cookie) = jar.get(VOTER_ID_COOKIE) {
        let voter_id = cookie.value().to_string();
        return (jar, voter_id);
    }

    let voter_id = new_voter_id();
    let jar = jar.add(Cookie::new(VOTER_ID_COOKIE, voter_id.clone()));

    (jar, voter_id)
}

pub fn new_voter_id() -> String {
    format!("{:016x}", rand::thread_rng().gen::<u64>())
}

#[cfg(test)]
mod tests {
    use super::new_voter_id;

    #[test]
    fn test_voter_id_is_hex() {
        let id = new_voter_id();

        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_voter_ids_differ() {
        assert_ne!(new_voter_id(), new_voter_id());
    }
}
