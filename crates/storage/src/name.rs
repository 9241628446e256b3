use paperchef_models::AppError;

/// Reduces a client-supplied file name to a single safe blob name: the last
/// path component, trimmed.
pub fn sanitize_blob_name(raw: &str) -> Result<String, AppError> {
    let last = raw
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();

    if last.is_empty() || last == "." || last == ".." {
        return Err(AppError::invalid(format!("invalid file name: {raw:?}")));
    }
    if last.chars().any(char::is_control) {
        return Err(AppError::invalid("file name contains control characters"));
    }
    Ok(last.to_string())
}
