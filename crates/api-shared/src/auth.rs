/// Extracts the token from an `Authorization` header value.
///
/// Accepts only the `Bearer <token>` scheme; any other scheme, a bare
/// token, or a blank token yields `None` and is treated by callers as a
/// missing credential.
pub fn parse_bearer(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
