//! `Set-Cookie` values for the session and the one-shot flash notice.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::state::AppSettings;

pub const SESSION_COOKIE: &str = "stockroom_session";
pub const FLASH_COOKIE: &str = "stockroom_flash";

/// Seconds a flash notice survives if the next page never renders it.
const FLASH_MAX_AGE: u64 = 60;

fn build(name: &str, value: &str, max_age: u64, settings: &AppSettings) -> String {
    let mut cookie =
        format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if settings.secure_cookies {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn session(token: &str, settings: &AppSettings) -> String {
    build(SESSION_COOKIE, token, settings.session_lifetime_secs, settings)
}

pub fn clear_session(settings: &AppSettings) -> String {
    build(SESSION_COOKIE, "", 0, settings)
}

/// Flash payloads are `level:message`, base64url-encoded so that any
/// text survives the cookie grammar.
pub fn flash(level: &str, message: &str, settings: &AppSettings) -> String {
    let payload = URL_SAFE_NO_PAD.encode(format!("{level}:{message}"));
    build(FLASH_COOKIE, &payload, FLASH_MAX_AGE, settings)
}

pub fn clear_flash(settings: &AppSettings) -> String {
    build(FLASH_COOKIE, "", 0, settings)
}

/// Decode a flash cookie value into `(level, message)`.
pub fn decode_flash(value: &str) -> Option<(String, String)> {
    let bytes = URL_SAFE_NO_PAD.decode(value).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    let (level, message) = text.split_once(':')?;
    Some((level.to_string(), message.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_attributes() {
        let settings = AppSettings::default();
        let cookie = session("tok", &settings);
        assert!(cookie.starts_with("stockroom_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(!cookie.contains("Secure"));

        let secure = AppSettings {
            secure_cookies: true,
            ..AppSettings::default()
        };
        assert!(clear_session(&secure).ends_with("Max-Age=0; Secure"));
    }

    #[test]
    fn flash_survives_arbitrary_text() {
        let settings = AppSettings::default();
        let cookie = flash("danger", "Role \"operator\"; not allowed: sorry", &settings);
        let value = cookie
            .strip_prefix("stockroom_flash=")
            .and_then(|rest| rest.split(';').next())
            .unwrap();
        let (level, message) = decode_flash(value).unwrap();
        assert_eq!(level, "danger");
        assert_eq!(message, "Role \"operator\"; not allowed: sorry");
    }

    #[test]
    fn garbage_flash_is_ignored() {
        assert_eq!(decode_flash("%%%"), None);
        assert_eq!(decode_flash(""), None);
    }
}
