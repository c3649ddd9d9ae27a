use uuid::Uuid;

/// `Content-Disposition` value for downloading `filename`.
///
/// Carries a plain ASCII `filename` for old clients and an RFC 5987
/// `filename*` with the full UTF-8 name.
pub fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control() && *c != '"' && *c != '\\')
        .collect();
    let ascii = match ascii.trim() {
        "" => "download",
        trimmed => trimmed,
    };

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(filename)
    )
}

/// Object-store key for a new upload by `uid`.
pub fn object_key(uid: &str, filename: &str) -> String {
    let safe_name = filename.replace(['/', '\\'], "_");
    format!("users/{}/{}_{}", uid, Uuid::new_v4().simple(), safe_name)
}
