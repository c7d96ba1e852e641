//! Variant-group expansion.
//!
//! A product is created with groups of size and color ids; each group
//! expands into the cross product of its sizes and colors, one SKU draft
//! per pair. Expansion is a pure function so the combinatorics can be
//! checked without touching storage.

use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// One input group: every size crossed with every color, all sharing the
/// group's quantity and optional type tag.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VariantGroup {
    pub size_id: Vec<Uuid>,
    pub color_id: Vec<Uuid>,
    pub quantity: i32,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// A concrete SKU to be persisted alongside its product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkuDraft {
    pub size_id: Uuid,
    pub color_id: Uuid,
    pub quantity: i32,
    pub kind: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VariantError {
    #[error("invalid format for variants")]
    Malformed,
    #[error("variant group {0} has no sizes")]
    EmptySizes(usize),
    #[error("variant group {0} has no colors")]
    EmptyColors(usize),
    #[error("variant group {0} has a negative quantity")]
    NegativeQuantity(usize),
    #[error("duplicate size/color pair in variants")]
    DuplicatePair { size_id: Uuid, color_id: Uuid },
}

/// Decodes the JSON-encoded `variants` payload into groups.
pub fn parse_groups(raw: &str) -> Result<Vec<VariantGroup>, VariantError> {
    serde_json::from_str(raw).map_err(|_| VariantError::Malformed)
}

/// Expands groups into SKU drafts, one per (size, color) pair.
///
/// The same pair appearing twice anywhere in the input, within a group or
/// across groups, rejects the whole expansion.
pub fn expand(groups: &[VariantGroup]) -> Result<Vec<SkuDraft>, VariantError> {
    let mut seen = HashSet::new();
    let mut drafts = Vec::new();
    for (idx, group) in groups.iter().enumerate() {
        if group.size_id.is_empty() {
            return Err(VariantError::EmptySizes(idx));
        }
        if group.color_id.is_empty() {
            return Err(VariantError::EmptyColors(idx));
        }
        if group.quantity < 0 {
            return Err(VariantError::NegativeQuantity(idx));
        }
        for &size_id in &group.size_id {
            for &color_id in &group.color_id {
                if !seen.insert((size_id, color_id)) {
                    return Err(VariantError::DuplicatePair { size_id, color_id });
                }
                drafts.push(SkuDraft {
                    size_id,
                    color_id,
                    quantity: group.quantity,
                    kind: group.kind.clone(),
                });
            }
        }
    }
    Ok(drafts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn group(sizes: Vec<Uuid>, colors: Vec<Uuid>, quantity: i32) -> VariantGroup {
        VariantGroup {
            size_id: sizes,
            color_id: colors,
            quantity,
            kind: None,
        }
    }

    #[test]
    fn expands_cross_product() {
        let drafts = expand(&[group(ids(2), ids(3), 7)]).unwrap();
        assert_eq!(drafts.len(), 6);
        assert!(drafts.iter().all(|d| d.quantity == 7));
    }

    #[test]
    fn expands_multiple_groups_in_order() {
        let g1 = group(ids(1), ids(2), 5);
        let g2 = group(ids(2), ids(2), 3);
        let drafts = expand(&[g1.clone(), g2]).unwrap();
        assert_eq!(drafts.len(), 2 + 4);
        assert_eq!(drafts[0].size_id, g1.size_id[0]);
        assert_eq!(drafts[0].quantity, 5);
        assert_eq!(drafts[2].quantity, 3);
    }

    #[test]
    fn rejects_duplicate_pair_across_groups() {
        let size = Uuid::new_v4();
        let color = Uuid::new_v4();
        let g1 = group(vec![size], vec![color], 1);
        let g2 = group(vec![size], vec![color, Uuid::new_v4()], 2);
        let err = expand(&[g1, g2]).unwrap_err();
        assert_eq!(err, VariantError::DuplicatePair { size_id: size, color_id: color });
    }

    #[test]
    fn rejects_duplicate_pair_within_a_group() {
        let size = Uuid::new_v4();
        let color = Uuid::new_v4();
        let g = group(vec![size, size], vec![color], 1);
        assert!(matches!(expand(&[g]), Err(VariantError::DuplicatePair { .. })));
    }

    #[test]
    fn rejects_empty_sets_and_negative_quantity() {
        assert_eq!(expand(&[group(vec![], ids(1), 1)]), Err(VariantError::EmptySizes(0)));
        assert_eq!(expand(&[group(ids(1), vec![], 1)]), Err(VariantError::EmptyColors(0)));
        assert_eq!(
            expand(&[group(ids(1), ids(1), 0), group(ids(1), ids(1), -1)]),
            Err(VariantError::NegativeQuantity(1))
        );
    }

    #[test]
    fn empty_input_expands_to_nothing() {
        assert_eq!(expand(&[]).unwrap(), vec![]);
    }

    #[test]
    fn parses_json_payload() {
        let size = Uuid::new_v4();
        let color = Uuid::new_v4();
        let raw = format!(
            r#"[{{"size_id":["{size}"],"color_id":["{color}"],"quantity":4,"type":"tee"}}]"#
        );
        let groups = parse_groups(&raw).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].kind.as_deref(), Some("tee"));
        assert_eq!(expand(&groups).unwrap().len(), 1);
    }

    #[test]
    fn rejects_non_array_payload() {
        assert_eq!(parse_groups("{}"), Err(VariantError::Malformed));
        assert_eq!(parse_groups("not json"), Err(VariantError::Malformed));
    }
}
