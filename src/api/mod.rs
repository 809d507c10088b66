//! Marketplace operations on [`crate::Client`]. Every call goes through the
//! gateway, so an expired session is refreshed transparently; only login,
//! refresh and identity lookups surface their own `401`.

mod auth;
mod properties;
pub mod types;


pub mod paths {
    use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

    pub const LOGIN: &str = "/auth/login";
    pub const LOGOUT: &str = "/auth/logout";
    pub const REGISTER: &str = "/auth/register";
    pub const VERIFY_ACCOUNT: &str = "/auth/verify-account";
    pub const RESEND_VERIFICATION_CODE: &str = "/auth/resend-verification-code";
    pub const FORGOT_PASSWORD: &str = "/auth/forgot-password";
    pub const REFRESH: &str = "/auth/refresh";
    pub const CURRENT_USER: &str = "/auth/get-user";
    pub const PROPERTIES: &str = "/properties";
    pub const RESET_PASSWORD: &str = "/auth/reset-password";

    /// Every fixed endpoint the client calls. Cookie persistence reads the
    /// jar at these (and their parent paths) to find path-scoped cookies.
    pub const ALL: &[&str] = &[
        LOGIN,
        LOGOUT,
        REGISTER,
        VERIFY_ACCOUNT,
        RESEND_VERIFICATION_CODE,
        FORGOT_PASSWORD,
        REFRESH,
        CURRENT_USER,
        PROPERTIES,
        RESET_PASSWORD,
    ];

    /// Characters escaped inside a single path segment.
    const SEGMENT: &AsciiSet = &CONTROLS
        .add(b' ')
        .add(b'"')
        .add(b'#')
        .add(b'%')
        .add(b'/')
        .add(b'<')
        .add(b'>')
        .add(b'?')
        .add(b'`')
        .add(b'{')
        .add(b'}');

    /// Escapes `value` for use as one path segment.
    #[must_use]
    pub fn encode_segment(value: &str) -> String {
        utf8_percent_encode(value, SEGMENT).to_string()
    }

    /// Reverses [`encode_segment`]; invalid UTF-8 is replaced.
    #[must_use]
    pub fn decode_segment(value: &str) -> String {
        percent_decode_str(value).decode_utf8_lossy().into_owned()
    }

    /// `/auth/reset-password/{token}` with the token percent-encoded.
    #[must_use]
    pub fn reset_password(token: &str) -> String {
        format!("{RESET_PASSWORD}/{}", encode_segment(token.trim()))
    }

}
