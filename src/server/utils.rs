use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use time::OffsetDateTime;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Format a unix-seconds timestamp as `02 Jan 2006` for display. Timestamps
/// outside the representable range fall back to a dash.
pub fn human_date(unix_seconds: i64) -> String {
    match OffsetDateTime::from_unix_timestamp(unix_seconds) {
        Ok(dt) => format!(
            "{:02} {} {}",
            dt.day(),
            MONTH_ABBREVIATIONS[u8::from(dt.month()) as usize - 1],
            dt.year()
        ),
        Err(_) => "-".to_string(),
    }
}

/// Parse the `page` query parameter. An absent or empty value means page 1;
/// anything else that is not a positive integer is rejected.
pub fn parse_page(raw: Option<&str>) -> Result<u32, String> {
    let Some(raw) = raw else {
        return Ok(1);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(1);
    }

    match trimmed.parse::<u32>() {
        Ok(page) if page >= 1 => Ok(page),
        _ => Err(format!("invalid page parameter: {raw}")),
    }
}

/// Canonical application server error response body.
pub fn server_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Unable to process your request. Please try again later.",
    )
        .into_response()
}

/// Shared response for snippets that are missing, expired, or not visible to
/// the requester.
pub fn not_found_response() -> Response {
    (StatusCode::NOT_FOUND, "Snippet not found.").into_response()
}

/// Response for a CSRF token that does not match the session's value.
pub fn invalid_csrf_response() -> Response {
    (StatusCode::FORBIDDEN, "Invalid CSRF token").into_response()
}

#[cfg(test)]
mod tests {
    use super::{human_date, parse_page};

    #[test]
    fn human_date_formats_day_month_year() {
        // 2024-03-05 00:00:00 UTC
        assert_eq!(human_date(1_709_596_800), "05 Mar 2024");
        // 1970-01-01 00:00:00 UTC
        assert_eq!(human_date(0), "01 Jan 1970");
    }

    #[test]
    fn parse_page_defaults_and_rejects_garbage() {
        assert_eq!(parse_page(None), Ok(1));
        assert_eq!(parse_page(Some("")), Ok(1));
        assert_eq!(parse_page(Some("  ")), Ok(1));
        assert_eq!(parse_page(Some("3")), Ok(3));
        assert!(parse_page(Some("0")).is_err());
        assert!(parse_page(Some("-1")).is_err());
        assert!(parse_page(Some("ff")).is_err());
    }
}
