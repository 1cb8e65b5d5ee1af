// Cookie transport for the token pair
//
// Tokens travel both in the JSON body and as HttpOnly cookies so that
// cookie-less clients (static storage-hosted frontends) and browser clients
// are both served.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

fn auth_cookie(name: &'static str, value: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::seconds(max_age_secs));
    cookie.set_secure(secure);
    // Cross-site frontends over TLS need SameSite=None; plain deployments
    // stay on Lax.
    cookie.set_same_site(if secure { SameSite::None } else { SameSite::Lax });
    cookie
}

/// Attach both tokens as cookies, each capped at its own TTL.
pub fn set_auth_cookies(
    jar: CookieJar,
    access_token: &str,
    refresh_token: &str,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
    secure: bool,
) -> CookieJar {
    jar.add(auth_cookie(
        ACCESS_TOKEN_COOKIE,
        access_token.to_string(),
        access_ttl_secs,
        secure,
    ))
    .add(auth_cookie(
        REFRESH_TOKEN_COOKIE,
        refresh_token.to_string(),
        refresh_ttl_secs,
        secure,
    ))
}

/// Expire both auth cookies on the client.
pub fn clear_auth_cookies(jar: CookieJar) -> CookieJar {
    let mut access = Cookie::from(ACCESS_TOKEN_COOKIE);
    access.set_path("/");
    let mut refresh = Cookie::from(REFRESH_TOKEN_COOKIE);
    refresh.set_path("/");
    jar.remove(access).remove(refresh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookies_are_http_only_with_ttls() {
        let jar = set_auth_cookies(CookieJar::new(), "acc", "ref", 900, 604_800, false);

        let access = jar.get(ACCESS_TOKEN_COOKIE).unwrap();
        assert!(access.http_only().unwrap_or(false));
        assert_eq!(access.max_age(), Some(time::Duration::seconds(900)));
        assert_eq!(access.same_site(), Some(SameSite::Lax));
        assert_eq!(access.value(), "acc");

        let refresh = jar.get(REFRESH_TOKEN_COOKIE).unwrap();
        assert_eq!(refresh.max_age(), Some(time::Duration::seconds(604_800)));
    }

    #[test]
    fn test_secure_mode_switches_same_site() {
        let jar = set_auth_cookies(CookieJar::new(), "acc", "ref", 900, 604_800, true);

        let access = jar.get(ACCESS_TOKEN_COOKIE).unwrap();
        assert!(access.secure().unwrap_or(false));
        assert_eq!(access.same_site(), Some(SameSite::None));
    }
}
