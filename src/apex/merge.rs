//
//  merge.rs
//  ApexVariants
//
//  Created by hak (tharun)
//

use std::collections::HashMap;

use super::info::ApexInfo;

/// `(original variation, merged variation)`.
pub type VariationAlias = (String, String);

/// Sort requirements by variation name. Stable, so equal names keep their
/// recording order.
pub fn sort_by_variation_name(infos: &mut [ApexInfo]) {
    infos.sort_by(|a, b| a.apex_variation_name.cmp(&b.apex_variation_name));
}

/// Collapse requirements that would build identically into one variation.
///
/// Returns the reduced list and one alias per input requirement, from its
/// original variation name to the merged one.
pub fn merge_apex_variations(apex_variations: &[ApexInfo]) -> (Vec<ApexInfo>, Vec<VariationAlias>) {
    let mut sorted = apex_variations.to_vec();
    sort_by_variation_name(&mut sorted);

    let mut merged: Vec<ApexInfo> = Vec::with_capacity(sorted.len());
    let mut aliases: Vec<VariationAlias> = Vec::with_capacity(sorted.len());
    let mut seen: HashMap<String, usize> = HashMap::new();

    for apex_info in sorted {
        let apex_name = apex_info.apex_variation_name.clone();
        let merged_name = apex_info.merged_name();

        if let Some(&index) = seen.get(&merged_name) {
            let target = &mut merged[index];
            for name in &apex_info.in_apexes {
                if !target.in_apexes.contains(name) {
                    target.in_apexes.push(name.clone());
                }
            }
            target.updatable |= apex_info.updatable;
        } else {
            seen.insert(merged_name.clone(), merged.len());
            let mut representative = apex_info;
            representative.apex_variation_name = merged_name.clone();
            merged.push(representative);
        }

        aliases.push((apex_name, merged_name));
    }

    (merged, aliases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_level::ApiLevel;
    use crate::apex::SdkRef;

    fn info(bundle: &str, min_sdk: i32) -> ApexInfo {
        ApexInfo::for_bundle(bundle, ApiLevel::finalized(min_sdk))
    }

    #[test]
    fn test_identical_requirements_merge() {
        let input = vec![info("c.bundle", 29), info("a.bundle", 29), info("b.bundle", 29)];

        let (merged, aliases) = merge_apex_variations(&input);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].apex_variation_name, "apex29");
        assert_eq!(merged[0].in_apexes, vec!["a.bundle", "b.bundle", "c.bundle"]);
        assert_eq!(
            aliases,
            vec![
                ("a.bundle".to_string(), "apex29".to_string()),
                ("b.bundle".to_string(), "apex29".to_string()),
                ("c.bundle".to_string(), "apex29".to_string()),
            ]
        );
    }

    #[test]
    fn test_different_keys_stay_apart() {
        let input = vec![
            info("a.bundle", 29),
            info("b.bundle", 30),
            info("c.bundle", 29).with_required_sdk(SdkRef::new("sdk", "1")),
            info("d.bundle", 30),
        ];

        let (merged, aliases) = merge_apex_variations(&input);

        let names: Vec<&str> = merged.iter().map(|m| m.apex_variation_name.as_str()).collect();
        assert_eq!(names, vec!["apex29", "apex30", "apex29_sdk_1"]);
        assert_eq!(merged[1].in_apexes, vec!["b.bundle", "d.bundle"]);
        assert_eq!(aliases.len(), input.len());
    }

    #[test]
    fn test_updatable_is_ored() {
        let input = vec![info("a.bundle", 29), info("b.bundle", 29).with_updatable(true)];
        let (merged, _) = merge_apex_variations(&input);
        assert!(merged[0].updatable);
    }

    #[test]
    fn test_bundle_names_are_partitioned() {
        let input = vec![
            info("a", 28),
            info("b", 29),
            info("c", 28),
            info("d", 30),
            info("e", 29),
        ];
        let (merged, _) = merge_apex_variations(&input);

        assert!(merged.len() <= input.len());
        let mut all: Vec<&str> = merged
            .iter()
            .flat_map(|m| m.in_apexes.iter().map(String::as_str))
            .collect();
        all.sort();
        assert_eq!(all, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let input = vec![info("a", 28), info("b", 29), info("c", 28)];
        let (merged, _) = merge_apex_variations(&input);
        let (again, aliases) = merge_apex_variations(&merged);

        assert_eq!(again, merged);
        assert!(aliases.iter().all(|(from, to)| from == to));
    }

    #[test]
    fn test_merge_is_deterministic() {
        let forward = vec![info("a", 28), info("b", 29), info("c", 28)];
        let mut backward = forward.clone();
        backward.reverse();

        assert_eq!(merge_apex_variations(&forward), merge_apex_variations(&backward));
    }

    #[test]
    fn test_empty_input() {
        let (merged, aliases) = merge_apex_variations(&[]);
        assert!(merged.is_empty());
        assert!(aliases.is_empty());
    }
}
