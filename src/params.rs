//! Caller-supplied field maps and the pure validation step for token requests.

// crates.io
use time::{UtcOffset, format_description::BorrowedFormatItem, macros::format_description};
// self
use crate::_prelude::*;

const EXPIRES_AT_FORMAT: &[BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]+00:00");

/// Raw string fields handed in by the request-routing layer.
///
/// Ordered map, so unknown-field listings and serialized forms are deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fields(BTreeMap<String, String>);
impl Fields {
	/// Creates an empty field map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts or replaces a field, returning the previous value.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
		self.0.insert(key.into(), value.into())
	}

	/// Returns the field value, if present.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	/// Rejects fields outside `schema` with one aggregated error listing every offender.
	///
	/// The map iterates in key order, so the listing comes out sorted.
	pub fn ensure_known(&self, schema: &[&str]) -> Result<(), ValidationError> {
		let unknown = self
			.0
			.keys()
			.filter(|key| !schema.contains(&key.as_str()))
			.cloned()
			.collect::<Vec<_>>();

		if unknown.is_empty() { Ok(()) } else { Err(ValidationError::UnknownFields(unknown)) }
	}
}
impl<K, V> FromIterator<(K, V)> for Fields
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

/// Failures raised while validating caller-supplied fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ValidationError {
	/// The request carried fields outside the operation's schema; the listing is sorted.
	#[error("Unknown fields: {0:?}.")]
	UnknownFields(Vec<String>),
	/// The `ttl` field is not a base-10 integer.
	#[error("Invalid ttl value {value:?}.")]
	InvalidTtl {
		/// Offending field value, verbatim.
		value: String,
	},
	/// The `ttl` field pushes the expiry outside the representable date range.
	#[error("The ttl value {value:?} puts the expiry out of range.")]
	TtlOutOfRange {
		/// Offending field value, verbatim.
		value: String,
	},
}

/// Validated token-request parameters plus the derived expiry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenParams {
	/// Requested token scope, passed through verbatim.
	pub scope: String,
	/// Service identifiers split from the comma-separated `service_id` field.
	///
	/// The split is verbatim: order kept, duplicates kept, no trimming. An absent or empty
	/// field therefore yields one empty identifier, which goes on the wire as-is; whether that
	/// means anything is the token endpoint's decision.
	pub service_ids: Vec<String>,
	/// Token lifetime in minutes (field `ttl`, default 300).
	pub ttl_minutes: i64,
	/// Absolute expiry instant (validation time plus the lifetime), UTC.
	pub expires_at: OffsetDateTime,
	/// Expiry rendered in the token endpoint's `expires_at` wire format.
	pub expires_at_form: String,
}
impl TokenParams {
	/// Fields the generate operation accepts.
	pub const SCHEMA: &'static [&'static str] = &["scope", "service_id", "ttl"];
	/// Lifetime applied when the `ttl` field is absent or empty, in minutes.
	pub const DEFAULT_TTL_MINUTES: i64 = 300;

	/// Validates `fields` against the current clock.
	pub fn validate(fields: &Fields) -> Result<Self, ValidationError> {
		Self::validate_at(fields, OffsetDateTime::now_utc())
	}

	/// Validates `fields`, deriving the expiry from the provided instant.
	///
	/// Pure: no clock, storage, or network access; `now` is the only ambient input and is
	/// normalized to UTC before the expiry is rendered.
	pub fn validate_at(fields: &Fields, now: OffsetDateTime) -> Result<Self, ValidationError> {
		fields.ensure_known(Self::SCHEMA)?;

		let scope = fields.get("scope").unwrap_or_default().to_owned();
		let service_ids =
			fields.get("service_id").unwrap_or_default().split(',').map(str::to_owned).collect();
		let ttl_raw = fields.get("ttl").unwrap_or_default();
		let ttl_minutes = if ttl_raw.is_empty() {
			Self::DEFAULT_TTL_MINUTES
		} else {
			ttl_raw
				.parse()
				.map_err(|_| ValidationError::InvalidTtl { value: ttl_raw.to_owned() })?
		};
		let expires_at = now
			.to_offset(UtcOffset::UTC)
			.checked_add(Duration::seconds(ttl_minutes.saturating_mul(60)))
			.ok_or_else(|| ValidationError::TtlOutOfRange { value: ttl_raw.to_owned() })?;
		let expires_at_form = expires_at
			.format(&EXPIRES_AT_FORMAT)
			.map_err(|_| ValidationError::TtlOutOfRange { value: ttl_raw.to_owned() })?;

		Ok(Self { scope, service_ids, ttl_minutes, expires_at, expires_at_form })
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	fn fields(pairs: &[(&str, &str)]) -> Fields {
		pairs.iter().copied().collect()
	}

	#[test]
	fn applies_the_default_ttl() {
		let now = datetime!(2025-01-01 00:00:00 UTC);
		let params = TokenParams::validate_at(&fields(&[("scope", "purge_select")]), now)
			.expect("Fields without a ttl should validate.");

		assert_eq!(params.ttl_minutes, 300);
		assert_eq!(params.expires_at, datetime!(2025-01-01 05:00:00 UTC));
		assert_eq!(params.expires_at_form, "2025-01-01T05:00:00+00:00");
		assert_eq!(params.scope, "purge_select");
	}

	#[test]
	fn empty_ttl_counts_as_absent() {
		let now = datetime!(2025-01-01 00:00:00 UTC);
		let params = TokenParams::validate_at(&fields(&[("ttl", "")]), now)
			.expect("An empty ttl should fall back to the default.");

		assert_eq!(params.ttl_minutes, 300);
	}

	#[test]
	fn rejects_non_numeric_ttl_naming_the_value() {
		let err =
			TokenParams::validate_at(&fields(&[("ttl", "abc")]), datetime!(2025-01-01 00:00:00 UTC))
				.expect_err("A non-numeric ttl should fail validation.");

		assert_eq!(err, ValidationError::InvalidTtl { value: "abc".into() });
		assert!(err.to_string().contains("abc"));
	}

	#[test]
	fn splits_service_ids_verbatim() {
		let now = datetime!(2025-01-01 00:00:00 UTC);
		let params = TokenParams::validate_at(&fields(&[("service_id", "a,b,c")]), now)
			.expect("A comma-separated service_id should validate.");

		assert_eq!(params.service_ids, ["a", "b", "c"]);

		let ragged = TokenParams::validate_at(&fields(&[("service_id", ",svc1,")]), now)
			.expect("Empty segments should be preserved.");

		assert_eq!(ragged.service_ids, ["", "svc1", ""]);
	}

	#[test]
	fn absent_service_id_yields_one_empty_segment() {
		let params = TokenParams::validate_at(&fields(&[]), datetime!(2025-01-01 00:00:00 UTC))
			.expect("An empty field map should validate.");

		assert_eq!(params.service_ids, [""]);
	}

	#[test]
	fn lists_unknown_fields_sorted() {
		let err = TokenParams::validate_at(
			&fields(&[("zeta", "1"), ("alpha", "2"), ("scope", "global"), ("mid", "3")]),
			datetime!(2025-01-01 00:00:00 UTC),
		)
		.expect_err("Unknown fields should fail validation.");

		assert_eq!(
			err,
			ValidationError::UnknownFields(vec!["alpha".into(), "mid".into(), "zeta".into()])
		);
		assert!(err.to_string().contains("alpha"));
	}

	#[test]
	fn huge_ttl_is_out_of_range_not_a_panic() {
		let err = TokenParams::validate_at(
			&fields(&[("ttl", "9223372036854775807")]),
			datetime!(2025-01-01 00:00:00 UTC),
		)
		.expect_err("An absurd ttl should fail validation.");

		assert!(matches!(err, ValidationError::TtlOutOfRange { .. }));
	}

	#[test]
	fn negative_ttl_parses_and_expires_in_the_past() {
		let now = datetime!(2025-01-01 06:00:00 UTC);
		let params = TokenParams::validate_at(&fields(&[("ttl", "-60")]), now)
			.expect("A negative ttl parses; the endpoint decides whether to honor it.");

		assert_eq!(params.expires_at, datetime!(2025-01-01 05:00:00 UTC));
		assert_eq!(params.expires_at_form, "2025-01-01T05:00:00+00:00");
	}

	#[test]
	fn non_utc_clocks_render_as_utc() {
		let now = datetime!(2025-01-01 09:00:00 +9);
		let params = TokenParams::validate_at(&fields(&[("ttl", "60")]), now)
			.expect("A zoned clock should validate.");

		assert_eq!(params.expires_at_form, "2025-01-01T01:00:00+00:00");
	}
}
