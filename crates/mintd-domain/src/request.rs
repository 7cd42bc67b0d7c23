//! Creation-request normalization.
//!
//! Issuer-node creation accepts two wire shapes. The canonical shape carries
//! an explicit key-spec list and a required-signature threshold:
//!
//! ```json
//! {"label": "B", "keys": [{"generate": true}, {"external_key": "x"}], "sigs_required": 2}
//! ```
//!
//! The deprecated shape is a flat xpub list plus a generate flag, and never
//! supported multi-sig policies:
//!
//! ```json
//! {"label": "A", "xpubs": ["x1", "x2"], "generate_key": true}
//! ```
//!
//! [`normalize`] classifies a raw payload once and produces a single
//! [`CreateNodeRequest`]; everything downstream only ever sees the canonical
//! form. The upgrade is one-way: a canonical request with `sigs_required > 1`
//! or generate-before-external ordering has no deprecated equivalent.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{DomainError, DomainResult};

/// A unit of key material for an issuer node's signature policy: either an
/// externally supplied public key, or a request to generate one on behalf of
/// the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySpec {
    External { key: String },
    Generate,
}

/// Canonical issuer-node creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateNodeRequest {
    pub label: String,
    pub keys: Vec<KeySpec>,
    pub sigs_required: u32,
}

impl CreateNodeRequest {
    /// Checks the signature-policy invariant: `1 <= sigs_required <= keys.len()`.
    fn validate(&self) -> DomainResult<()> {
        if self.sigs_required < 1 {
            return Err(DomainError::invalid("sigs_required must be at least 1"));
        }
        if self.sigs_required as usize > self.keys.len() {
            return Err(DomainError::invalid(format!(
                "sigs_required ({}) cannot exceed the number of keys ({})",
                self.sigs_required,
                self.keys.len()
            )));
        }
        Ok(())
    }
}

/// One element of the canonical `keys` list as it appears on the wire.
#[derive(Debug, Deserialize)]
struct KeySpecBody {
    #[serde(default)]
    external_key: Option<String>,
    #[serde(default)]
    generate: Option<bool>,
}

impl KeySpecBody {
    fn into_spec(self) -> DomainResult<KeySpec> {
        match (self.external_key, self.generate.unwrap_or(false)) {
            (Some(_), true) => Err(DomainError::invalid(
                "key spec cannot both supply external_key and request generation",
            )),
            (Some(key), false) => Ok(KeySpec::External { key }),
            (None, true) => Ok(KeySpec::Generate),
            (None, false) => Err(DomainError::invalid(
                "key spec must supply external_key or set generate",
            )),
        }
    }
}

/// Canonical wire shape.
#[derive(Debug, Deserialize)]
struct CanonicalBody {
    #[serde(default)]
    label: String,
    #[serde(default)]
    keys: Vec<KeySpecBody>,
    #[serde(default)]
    sigs_required: u32,
}

/// Deprecated wire shape. `sigs_required` was never expressible here.
#[derive(Debug, Deserialize)]
struct DeprecatedBody {
    #[serde(default)]
    label: String,
    #[serde(default)]
    xpubs: Vec<String>,
    #[serde(default)]
    generate_key: bool,
}

/// Normalizes a raw creation payload into the canonical request.
///
/// Classification keys off the *presence* of `generate_key` or `xpubs` in
/// the payload, regardless of their values — `generate_key: false` still
/// selects deprecated parsing. Existing clients depend on this predicate;
/// do not tighten it. Classification itself never fails: payloads without
/// either marker take the canonical path, which does its own validation.
pub fn normalize(raw: Value) -> DomainResult<CreateNodeRequest> {
    let is_deprecated = raw
        .as_object()
        .is_some_and(|m| m.contains_key("generate_key") || m.contains_key("xpubs"));

    let req = if is_deprecated {
        let body: DeprecatedBody = serde_json::from_value(raw)
            .map_err(|err| DomainError::invalid(format!("invalid node creation request: {err}")))?;

        let mut keys: Vec<KeySpec> = body
            .xpubs
            .into_iter()
            .map(|key| KeySpec::External { key })
            .collect();
        if body.generate_key {
            keys.push(KeySpec::Generate);
        }

        CreateNodeRequest {
            label: body.label,
            keys,
            sigs_required: 1,
        }
    } else {
        let body: CanonicalBody = serde_json::from_value(raw)
            .map_err(|err| DomainError::invalid(format!("invalid node creation request: {err}")))?;

        let keys = body
            .keys
            .into_iter()
            .map(KeySpecBody::into_spec)
            .collect::<DomainResult<Vec<_>>>()?;

        CreateNodeRequest {
            label: body.label,
            keys,
            sigs_required: body.sigs_required,
        }
    };

    req.validate()?;
    Ok(req)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_invalid(result: DomainResult<CreateNodeRequest>, needle: &str) {
        match result {
            Err(DomainError::InvalidRequest { message }) => {
                assert!(
                    message.contains(needle),
                    "expected message containing {needle:?}, got {message:?}"
                );
            }
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }

    #[test]
    fn deprecated_shape_translates_external_keys_then_generate() {
        let req = normalize(json!({
            "label": "A",
            "xpubs": ["x1", "x2"],
            "generate_key": true,
        }))
        .unwrap();

        assert_eq!(req.label, "A");
        assert_eq!(
            req.keys,
            vec![
                KeySpec::External { key: "x1".into() },
                KeySpec::External { key: "x2".into() },
                KeySpec::Generate,
            ]
        );
        assert_eq!(req.sigs_required, 1);
    }

    #[test]
    fn deprecated_shape_without_generate_flag_omits_generate_spec() {
        let req = normalize(json!({
            "label": "A",
            "xpubs": ["x1"],
            "generate_key": false,
        }))
        .unwrap();

        assert_eq!(req.keys, vec![KeySpec::External { key: "x1".into() }]);
        assert_eq!(req.sigs_required, 1);
    }

    #[test]
    fn presence_of_xpubs_alone_selects_deprecated_parsing() {
        // A payload carrying both shapes is parsed as deprecated: the
        // canonical-only fields are ignored and the threshold stays 1.
        let req = normalize(json!({
            "label": "A",
            "xpubs": ["x1", "x2"],
            "keys": [{"generate": true}],
            "sigs_required": 3,
        }))
        .unwrap();

        assert_eq!(req.keys.len(), 2);
        assert_eq!(req.sigs_required, 1);
    }

    #[test]
    fn generate_key_false_still_selects_deprecated_parsing() {
        // Presence, not value, drives classification. With no xpubs the
        // translated request has zero keys and fails the threshold check,
        // proving the deprecated path ran.
        assert_invalid(
            normalize(json!({"label": "A", "generate_key": false})),
            "sigs_required",
        );
    }

    #[test]
    fn canonical_shape_passes_through_unchanged() {
        let req = normalize(json!({
            "label": "B",
            "keys": [{"generate": true}, {"generate": true}],
            "sigs_required": 2,
        }))
        .unwrap();

        assert_eq!(req.label, "B");
        assert_eq!(req.keys, vec![KeySpec::Generate, KeySpec::Generate]);
        assert_eq!(req.sigs_required, 2);
    }

    #[test]
    fn canonical_shape_preserves_mixed_key_ordering() {
        let req = normalize(json!({
            "label": "B",
            "keys": [{"generate": true}, {"external_key": "x1"}],
            "sigs_required": 1,
        }))
        .unwrap();

        assert_eq!(
            req.keys,
            vec![KeySpec::Generate, KeySpec::External { key: "x1".into() }]
        );
    }

    #[test]
    fn threshold_exceeding_key_count_is_rejected() {
        assert_invalid(
            normalize(json!({
                "label": "C",
                "keys": [{"generate": true}],
                "sigs_required": 2,
            })),
            "cannot exceed",
        );
    }

    #[test]
    fn zero_threshold_is_rejected() {
        assert_invalid(
            normalize(json!({
                "label": "C",
                "keys": [{"generate": true}],
                "sigs_required": 0,
            })),
            "at least 1",
        );
    }

    #[test]
    fn key_spec_with_both_sources_is_rejected() {
        assert_invalid(
            normalize(json!({
                "label": "C",
                "keys": [{"external_key": "x1", "generate": true}],
                "sigs_required": 1,
            })),
            "cannot both",
        );
    }

    #[test]
    fn key_spec_with_neither_source_is_rejected() {
        assert_invalid(
            normalize(json!({
                "label": "C",
                "keys": [{}],
                "sigs_required": 1,
            })),
            "must supply",
        );
    }

    #[test]
    fn malformed_deprecated_body_is_invalid_request() {
        assert_invalid(
            normalize(json!({"label": "A", "xpubs": "not-a-list"})),
            "invalid node creation request",
        );
    }

    #[test]
    fn non_object_payload_takes_canonical_path_and_fails_parsing() {
        assert_invalid(
            normalize(json!("just a string")),
            "invalid node creation request",
        );
    }

    #[test]
    fn missing_label_defaults_to_empty() {
        let req = normalize(json!({
            "keys": [{"external_key": "x1"}],
            "sigs_required": 1,
        }))
        .unwrap();
        assert_eq!(req.label, "");
    }
}
