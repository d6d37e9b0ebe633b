// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! W3C `tracestate` codec.
//!
//! The header is a comma-separated list of opaque `key=value` vendor
//! entries; this agent owns the `{trusted_account_key}@nr` entry and passes
//! every other vendor through untouched, preserving the incoming order.

use std::collections::HashSet;

use nr_trace::distributed_tracing::{DistributedTracingParentType, IngestErrorType};

pub const TRACESTATE_KEY: &str = "tracestate";

const NR_VENDOR_SUFFIX: &str = "@nr";
const TRACESTATE_VERSION: i32 = 0;
// the whole tracestate is invalidated past this many deduplicated entries
const MAX_TRACESTATE_ENTRIES: usize = 32;
const MAX_ENTRY_VALUE_LENGTH: usize = 256;
const NR_ENTRY_FIELD_COUNT: usize = 9;
const MAX_PRIORITY_DECIMAL_PLACES: usize = 6;

/// The decoded trusted entry fields.
#[derive(Clone, Debug, PartialEq)]
pub struct TracestateNrFields {
    pub version: i32,
    pub parent_type: DistributedTracingParentType,
    pub account_id: String,
    pub app_id: String,
    pub span_id: Option<String>,
    pub transaction_id: Option<String>,
    pub sampled: Option<bool>,
    pub priority: Option<f32>,
    pub timestamp: i64,
}

/// Result of parsing the inbound `tracestate` header list.
///
/// A validation failure yields a shell carrying only the error; the vendor
/// passthrough list survives wherever it could still be assembled.
#[derive(Clone, Debug, PartialEq)]
pub struct W3CTracestate {
    fields: Option<TracestateNrFields>,
    vendor_state_entries: Vec<String>,
    error: IngestErrorType,
}

impl W3CTracestate {
    pub fn fields(&self) -> Option<&TracestateNrFields> {
        self.fields.as_ref()
    }

    pub fn vendor_state_entries(&self) -> &[String] {
        &self.vendor_state_entries
    }

    pub fn error(&self) -> IngestErrorType {
        self.error
    }

    fn shell(error: IngestErrorType, vendor_state_entries: Vec<String>) -> W3CTracestate {
        W3CTracestate {
            fields: None,
            vendor_state_entries,
            error,
        }
    }

    /// Parses the logical `tracestate` list from the raw header lines.
    ///
    /// Lines combine in reverse arrival order, so on duplicate keys the last
    /// line wins while the first occurrence wins within a single line;
    /// combining stops at the first line that yields no parsable entry.
    pub fn from_headers(header_values: &[&str], trusted_account_key: &str) -> W3CTracestate {
        // entries per line, scanned in reverse arrival order
        let mut lines: Vec<Vec<(String, String)>> = Vec::new();
        for value in header_values.iter().rev() {
            match parse_entry_list(value) {
                Some(entries) => lines.push(entries),
                None => break,
            }
        }

        // dedup by key, first occurrence in the reversed scan wins; remember
        // where each winner sat so the passthrough keeps the incoming order
        let mut seen: HashSet<&str> = HashSet::new();
        let mut winners: Vec<(&str, &str, usize, usize)> = Vec::new();
        for (reverse_index, entries) in lines.iter().enumerate() {
            let line_index = lines.len() - 1 - reverse_index;
            for (position, (key, value)) in entries.iter().enumerate() {
                if seen.insert(key.as_str()) {
                    winners.push((key.as_str(), value.as_str(), line_index, position));
                }
            }
        }

        if winners.len() > MAX_TRACESTATE_ENTRIES {
            return W3CTracestate::shell(IngestErrorType::TraceStateParseException, Vec::new());
        }

        winners.sort_by_key(|(_, _, line, position)| (*line, *position));

        let trusted_entry_key = format!("{trusted_account_key}{NR_VENDOR_SUFFIX}");
        let mut nr_entry_value = None;
        let mut vendor_state_entries = Vec::new();
        for (key, value, _, _) in winners {
            if key == trusted_entry_key {
                nr_entry_value = Some(value);
            } else if is_valid_entry_value(value) {
                vendor_state_entries.push(format!("{key}={value}"));
            }
        }

        let Some(nr_entry_value) = nr_entry_value else {
            return W3CTracestate::shell(IngestErrorType::TraceStateNoNrEntry, vendor_state_entries);
        };

        if !is_valid_entry_value(nr_entry_value) {
            return W3CTracestate::shell(
                IngestErrorType::TraceStateInvalidNrEntry,
                vendor_state_entries,
            );
        }

        match parse_nr_fields(nr_entry_value) {
            Some(fields) => W3CTracestate {
                fields: Some(fields),
                vendor_state_entries,
                error: IngestErrorType::None,
            },
            None => W3CTracestate::shell(
                IngestErrorType::TraceStateInvalidNrEntry,
                vendor_state_entries,
            ),
        }
    }
}

/// Splits one header line into `key=value` entries. Entries without an `=`
/// or with an empty key are dropped; a line yielding no entry at all fails.
fn parse_entry_list(line: &str) -> Option<Vec<(String, String)>> {
    let trimmed = line.trim().trim_matches(',');

    let mut entries = Vec::new();
    for part in trimmed.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        if key.is_empty() {
            continue;
        }

        entries.push((key.to_string(), value.to_string()));
    }

    if entries.is_empty() {
        None
    } else {
        Some(entries)
    }
}

/// Opaque value grammar: at most 256 chars of printable ASCII excluding
/// `,` and `=`, not ending in a space.
fn is_valid_entry_value(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_ENTRY_VALUE_LENGTH
        && !value.ends_with(' ')
        && value
            .bytes()
            .all(|b| (0x20..=0x7e).contains(&b) && b != b',' && b != b'=')
}

fn parse_nr_fields(value: &str) -> Option<TracestateNrFields> {
    let fields: Vec<&str> = value.split('-').collect();

    let version: i32 = fields[0].parse().ok()?;
    if version == TRACESTATE_VERSION && fields.len() != NR_ENTRY_FIELD_COUNT {
        return None;
    }
    // forward compatible: newer versions may append fields, never drop them
    if fields.len() < NR_ENTRY_FIELD_COUNT {
        return None;
    }

    let parent_type = DistributedTracingParentType::from_i32(fields[1].parse().ok()?)?;

    let account_id = fields[2];
    let app_id = fields[3];
    if account_id.is_empty() || app_id.is_empty() {
        return None;
    }

    let sampled = match fields[6] {
        "1" => Some(true),
        "0" => Some(false),
        _ => None,
    };

    let timestamp: i64 = fields[8].parse().ok()?;

    Some(TracestateNrFields {
        version,
        parent_type,
        account_id: account_id.to_string(),
        app_id: app_id.to_string(),
        span_id: non_empty(fields[4]),
        transaction_id: non_empty(fields[5]),
        sampled,
        priority: parse_priority(fields[7]),
        timestamp,
    })
}

fn non_empty(field: &str) -> Option<String> {
    if field.is_empty() {
        None
    } else {
        Some(field.to_string())
    }
}

/// A priority with more than 6 decimal places is unparsable and becomes
/// absent rather than failing the whole entry.
fn parse_priority(field: &str) -> Option<f32> {
    if field.is_empty() {
        return None;
    }

    if let Some((_, decimals)) = field.split_once('.') {
        if decimals.len() > MAX_PRIORITY_DECIMAL_PLACES {
            return None;
        }
    }

    field.parse::<f32>().ok()
}

/// Formats a priority with up to 6 decimal digits and an invariant decimal
/// point, trailing zeros trimmed.
pub fn format_priority(priority: f32) -> String {
    let mut formatted = format!("{priority:.6}");
    if formatted.contains('.') {
        while formatted.ends_with('0') {
            formatted.pop();
        }
        if formatted.ends_with('.') {
            formatted.pop();
        }
    }
    formatted
}

/// Renders the outbound trusted entry, `{trusted_account_key}@nr={fields}`.
#[allow(clippy::too_many_arguments)]
pub fn build_nr_entry(
    trusted_account_key: &str,
    account_id: &str,
    app_id: &str,
    span_id: &str,
    transaction_id: &str,
    sampled: bool,
    priority: f32,
    timestamp_millis: i64,
) -> String {
    let parent_type = DistributedTracingParentType::App.as_i32();
    let sampled = if sampled { "1" } else { "0" };
    let priority = format_priority(priority);

    format!(
        "{trusted_account_key}{NR_VENDOR_SUFFIX}={TRACESTATE_VERSION}-{parent_type}-{account_id}-{app_id}-{span_id}-{transaction_id}-{sampled}-{priority}-{timestamp_millis}"
    )
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! test_tracestate_parse {
        ($($name:ident: $value:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let (header, trusted_account_key, expected_vendors, expected_sampled,
                         expected_priority, expected_error) = $value;

                    let tracestate =
                        W3CTracestate::from_headers(&[header], trusted_account_key);

                    assert_eq!(tracestate.error(), expected_error);
                    let expected_vendors: Option<&str> = expected_vendors;
                    assert_eq!(
                        tracestate.vendor_state_entries().join(","),
                        expected_vendors.unwrap_or_default()
                    );

                    let sampled = tracestate.fields().and_then(|f| f.sampled);
                    let priority = tracestate.fields().and_then(|f| f.priority);
                    assert_eq!(sampled, expected_sampled);
                    assert_eq!(priority, expected_priority);
                }
            )*
        }
    }

    test_tracestate_parse! {
        // valid tracestate, only a New Relic entry
        only_nr_entry: (
            "33@nr=0-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025",
            "33", None, Some(true), Some(1.23456), IngestErrorType::None,
        ),
        // valid tracestate entry with different parent types
        parent_type_app: (
            "33@nr=0-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025,aa=1111,bb=222",
            "33", Some("aa=1111,bb=222"), Some(true), Some(1.23456), IngestErrorType::None,
        ),
        parent_type_browser: (
            "33@nr=0-1-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025,aa=1111,bb=222",
            "33", Some("aa=1111,bb=222"), Some(true), Some(1.23456), IngestErrorType::None,
        ),
        parent_type_mobile: (
            "33@nr=0-2-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025,aa=1111,bb=222",
            "33", Some("aa=1111,bb=222"), Some(true), Some(1.23456), IngestErrorType::None,
        ),
        // valid tracestate with blank optional fields
        blank_optional_fields: (
            "33@nr=0-0-33-5043-----1518469636025,aa=1111,bb=222",
            "33", Some("aa=1111,bb=222"), None, None, IngestErrorType::None,
        ),
        // parentType must be 0, 1 or 2
        parent_type_out_of_range: (
            "33@nr=0-3-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025,aa=1111,bb=222",
            "33", Some("aa=1111,bb=222"), None, None, IngestErrorType::TraceStateInvalidNrEntry,
        ),
        // missing required fields
        missing_version: (
            "33@nr=-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025,aa=1111,bb=222",
            "33", Some("aa=1111,bb=222"), None, None, IngestErrorType::TraceStateInvalidNrEntry,
        ),
        missing_parent_type: (
            "33@nr=0--33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025,aa=1111,bb=222",
            "33", Some("aa=1111,bb=222"), None, None, IngestErrorType::TraceStateInvalidNrEntry,
        ),
        missing_account_id: (
            "33@nr=0-0--5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025,aa=1111,bb=222",
            "33", Some("aa=1111,bb=222"), None, None, IngestErrorType::TraceStateInvalidNrEntry,
        ),
        missing_app_id: (
            "33@nr=0-0-33--27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025,aa=1111,bb=222",
            "33", Some("aa=1111,bb=222"), None, None, IngestErrorType::TraceStateInvalidNrEntry,
        ),
        missing_timestamp: (
            "33@nr=0-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-,aa=1111,bb=222",
            "33", Some("aa=1111,bb=222"), None, None, IngestErrorType::TraceStateInvalidNrEntry,
        ),
        // a sampled value other than 0 or 1 is treated as absent
        sampled_out_of_range: (
            "33@nr=0-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-2-1.23456-1518469636025",
            "33", None, None, Some(1.23456), IngestErrorType::None,
        ),
        // trailing priority zeros are insignificant
        priority_trailing_zeros: (
            "33@nr=0-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.2000-1518469636025,aa=1111,bb=222",
            "33", Some("aa=1111,bb=222"), Some(true), Some(1.2), IngestErrorType::None,
        ),
        // more than 6 decimal places makes the priority absent, not invalid
        priority_too_many_decimals: (
            "33@nr=0-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.12345678-1518469636025,aa=1111,bb=222",
            "33", Some("aa=1111,bb=222"), Some(true), None, IngestErrorType::None,
        ),
        priority_no_integer_part: (
            "33@nr=0-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-.123-1518469636025,aa=1111,bb=222",
            "33", Some("aa=1111,bb=222"), Some(true), Some(0.123), IngestErrorType::None,
        ),
        priority_integer_only: (
            "33@nr=0-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-123-1518469636025,aa=1111,bb=222",
            "33", Some("aa=1111,bb=222"), Some(true), Some(123.0), IngestErrorType::None,
        ),
        // scientific notation splits into a 10th field, invalid for version 0
        priority_scientific_notation: (
            "33@nr=0-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1e-2-1518469636025,aa=1111,bb=222",
            "33", Some("aa=1111,bb=222"), None, None, IngestErrorType::TraceStateInvalidNrEntry,
        ),
        // value with non ASCII characters
        non_ascii_nr_value: (
            "33@nr=¢µÈÈÂÂÂÂÂ,aa=1111,bb=222",
            "33", Some("aa=1111,bb=222"), None, None, IngestErrorType::TraceStateInvalidNrEntry,
        ),
        // a comma splits the value into a separate malformed entry
        nr_value_with_comma: (
            "33@nr=abc,abc,aa=1111,bb=222",
            "33", Some("aa=1111,bb=222"), None, None, IngestErrorType::TraceStateInvalidNrEntry,
        ),
        // `=` is not allowed inside an opaque value
        nr_value_with_equals: (
            "33@nr=abc=abc,aa=1111,bb=222",
            "33", Some("aa=1111,bb=222"), None, None, IngestErrorType::TraceStateInvalidNrEntry,
        ),
        // the trusted entry must match the configured key exactly
        no_trusted_entry: (
            "44@nr=0-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025,aa=1111,bb=222",
            "33",
            Some("44@nr=0-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025,aa=1111,bb=222"),
            None, None, IngestErrorType::TraceStateNoNrEntry,
        ),
        no_nr_entry_at_all: (
            "aa=1111,bb=222",
            "33", Some("aa=1111,bb=222"), None, None, IngestErrorType::TraceStateNoNrEntry,
        ),
        // nothing parsable at all
        nothing_parsable: (
            "aaa,bbb,ccc",
            "33", None, None, None, IngestErrorType::TraceStateNoNrEntry,
        ),
    }

    #[test]
    fn test_valid_tracestate_full_field_decode() {
        for header in [
            "33@nr=0-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025,dd=YzRiMTIxODk1NmVmZTE4ZQ,44@nr=0-0-55-5043-1238890283aasdfs-4569065a5b131bbg-1-1.23456-1518469636020",
            " 33@nr=0-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025,dd=YzRiMTIxODk1NmVmZTE4ZQ,44@nr=0-0-55-5043-1238890283aasdfs-4569065a5b131bbg-1-1.23456-1518469636020",
            "33@nr=0-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025, dd=YzRiMTIxODk1NmVmZTE4ZQ, 44@nr=0-0-55-5043-1238890283aasdfs-4569065a5b131bbg-1-1.23456-1518469636020",
            "33@nr=0-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025, dd=YzRiMTIxODk1NmVmZTE4ZQ, aaaaaaaaaaaaaaa, 44@nr=0-0-55-5043-1238890283aasdfs-4569065a5b131bbg-1-1.23456-1518469636020",
        ] {
            let tracestate = W3CTracestate::from_headers(&[header], "33");

            assert_eq!(tracestate.error(), IngestErrorType::None);
            let fields = tracestate.fields().unwrap();
            assert_eq!(fields.version, 0);
            assert_eq!(fields.parent_type, DistributedTracingParentType::App);
            assert_eq!(fields.account_id, "33");
            assert_eq!(fields.app_id, "5043");
            assert_eq!(fields.span_id.as_deref(), Some("27ddd2d8890283b4"));
            assert_eq!(fields.transaction_id.as_deref(), Some("5569065a5b1313bd"));
            assert_eq!(fields.sampled, Some(true));
            assert_eq!(fields.priority, Some(1.23456));
            assert_eq!(fields.timestamp, 1518469636025);

            assert_eq!(tracestate.vendor_state_entries().len(), 2);
            assert!(tracestate
                .vendor_state_entries()
                .contains(&"dd=YzRiMTIxODk1NmVmZTE4ZQ".to_string()));
            assert!(tracestate.vendor_state_entries().contains(
                &"44@nr=0-0-55-5043-1238890283aasdfs-4569065a5b131bbg-1-1.23456-1518469636020"
                    .to_string()
            ));
        }
    }

    #[test]
    fn test_duplicate_nr_keys_in_same_header_accepts_first() {
        let header = "33@nr=0-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025, othervendorkey1=othervendorvalue1, 33@nr=0-0-55-5043-1238890283aasdfs-4569065a5b131bbg-1-1.23456-1518469636020";

        let tracestate = W3CTracestate::from_headers(&[header], "33");

        let fields = tracestate.fields().unwrap();
        assert_eq!(fields.account_id, "33");
        assert_eq!(fields.span_id.as_deref(), Some("27ddd2d8890283b4"));
        assert_eq!(fields.timestamp, 1518469636025);

        assert_eq!(
            tracestate.vendor_state_entries(),
            &["othervendorkey1=othervendorvalue1".to_string()]
        );
    }

    #[test]
    fn test_duplicate_nr_keys_in_different_headers_accepts_last() {
        let headers = [
            "33@nr=0-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025",
            "33@nr=0-0-55-5043-1238890283aasdfs-4569065a5b131bbg-1-1.23456-1518469636020",
        ];

        let tracestate = W3CTracestate::from_headers(&headers, "33");

        let fields = tracestate.fields().unwrap();
        assert_eq!(fields.account_id, "55");
        assert_eq!(fields.span_id.as_deref(), Some("1238890283aasdfs"));
        assert_eq!(fields.transaction_id.as_deref(), Some("4569065a5b131bbg"));
        assert_eq!(fields.timestamp, 1518469636020);

        assert!(tracestate.vendor_state_entries().is_empty());
    }

    #[test]
    fn test_combining_stops_at_first_unparsable_line() {
        let headers = [
            "33@nr=0-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025",
            "garbage with no entries",
            "aa=1111",
        ];

        // the reversed scan consumes "aa=1111", stops at the garbage line and
        // never reaches the New Relic entry
        let tracestate = W3CTracestate::from_headers(&headers, "33");

        assert_eq!(tracestate.error(), IngestErrorType::TraceStateNoNrEntry);
        assert_eq!(tracestate.vendor_state_entries(), &["aa=1111".to_string()]);
    }

    #[test]
    fn test_entry_cap_invalidates_the_whole_tracestate() {
        let mut entries: Vec<String> = (0..32).map(|i| format!("vendor{i}=value{i}")).collect();
        entries.push(
            "33@nr=0-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025"
                .to_string(),
        );
        let header = entries.join(",");

        let tracestate = W3CTracestate::from_headers(&[header.as_str()], "33");

        assert_eq!(tracestate.error(), IngestErrorType::TraceStateParseException);
        assert!(tracestate.vendor_state_entries().is_empty());
        assert!(tracestate.fields().is_none());
    }

    #[test]
    fn test_exactly_32_entries_is_accepted() {
        let mut entries: Vec<String> = (0..31).map(|i| format!("vendor{i}=value{i}")).collect();
        entries.push(
            "33@nr=0-0-33-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025"
                .to_string(),
        );
        let header = entries.join(",");

        let tracestate = W3CTracestate::from_headers(&[header.as_str()], "33");

        assert_eq!(tracestate.error(), IngestErrorType::None);
        assert_eq!(tracestate.vendor_state_entries().len(), 31);
    }

    #[test]
    fn test_entry_value_grammar() {
        assert!(is_valid_entry_value("YzRiMTIxODk1NmVmZTE4ZQ"));
        assert!(is_valid_entry_value("0-0-33-5043----1518469636025"));
        assert!(is_valid_entry_value("a b"));

        assert!(!is_valid_entry_value(""));
        assert!(!is_valid_entry_value("ends in space "));
        assert!(!is_valid_entry_value("has=equals"));
        assert!(!is_valid_entry_value("has,comma"));
        assert!(!is_valid_entry_value("non-printable\u{7f}"));
        assert!(!is_valid_entry_value("¢µÈÈÂÂÂÂÂ"));
        assert!(!is_valid_entry_value(&"x".repeat(257)));
        assert!(is_valid_entry_value(&"x".repeat(256)));
    }

    #[test]
    fn test_format_priority() {
        assert_eq!(format_priority(1.1), "1.1");
        assert_eq!(format_priority(2.0), "2");
        assert_eq!(format_priority(0.65), "0.65");
        assert_eq!(format_priority(1.23456), "1.23456");
        assert_eq!(format_priority(0.0), "0");
        assert_eq!(format_priority(-0.5), "-0.5");
    }

    #[test]
    fn test_build_nr_entry() {
        let entry = build_nr_entry(
            "33",
            "55",
            "5043",
            "27ddd2d8890283b4",
            "5569065a5b1313bd",
            true,
            1.23456,
            1518469636025,
        );

        assert_eq!(
            entry,
            "33@nr=0-0-55-5043-27ddd2d8890283b4-5569065a5b1313bd-1-1.23456-1518469636025"
        );
    }

    #[test]
    fn test_build_nr_entry_round_trips_through_the_parser() {
        let entry = build_nr_entry("33", "55", "5043", "", "", false, 0.5, 1518469636025);
        let (_, value) = entry.split_once('=').unwrap();

        let fields = parse_nr_fields(value).unwrap();
        assert_eq!(fields.account_id, "55");
        assert_eq!(fields.app_id, "5043");
        assert_eq!(fields.span_id, None);
        assert_eq!(fields.transaction_id, None);
        assert_eq!(fields.sampled, Some(false));
        assert_eq!(fields.priority, Some(0.5));
        assert_eq!(fields.timestamp, 1518469636025);
    }
}
