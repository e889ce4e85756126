use time::{format_description::well_known::Rfc3339, OffsetDateTime};

pub(crate) fn now_rfc3339() -> String {
    format_offset(OffsetDateTime::now_utc())
}

pub(crate) fn format_offset(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_else(|_| value.to_string())
}

/// Renders a server timestamp as `YYYY-MM-DD HH:MM` UTC, or echoes it back
/// when it is not RFC 3339.
pub(crate) fn display_timestamp(raw: &str) -> String {
    let format = time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]");
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .and_then(|value| value.to_offset(time::UtcOffset::UTC).format(&format).ok())
        .unwrap_or_else(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn format_offset_outputs_utc_z() {
        assert_eq!(format_offset(datetime!(2025-01-02 10:20:30 UTC)), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn display_timestamp_normalizes_offsets() {
        assert_eq!(display_timestamp("2025-03-01T09:15:00+07:00"), "2025-03-01 02:15");
    }

    #[test]
    fn display_timestamp_passes_through_unparseable() {
        assert_eq!(display_timestamp("2025-03-01T09:15:00.123456"), "2025-03-01T09:15:00.123456");
    }
}
