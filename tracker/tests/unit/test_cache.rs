//! Hierarchy cache unit tests

use railtrack::cache::{CacheKey, HierarchyCache};
use railtrack::models::{DeploymentKey, DeploymentStatus};

use crate::support::{deployment, environment, project, service};

#[test]
fn test_cache_put_and_get() {
    let cache = HierarchyCache::new();
    cache.put_projects(vec![project("p1"), project("p2")]);
    cache.put_environments("p1", vec![environment("e1", "p1")]);
    cache.put_services("p1", vec![service("s1", "p1")]);

    let projects = cache.get_projects().unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].id, "p1");
    assert_eq!(cache.get_environments("p1").unwrap()[0].id, "e1");
    assert_eq!(cache.get_services("p1").unwrap()[0].id, "s1");
    assert!(cache.get_environments("p2").is_none());
}

#[test]
fn test_cache_empty_list_is_present() {
    let cache = HierarchyCache::new();
    cache.put_environments("p1", Vec::new());

    assert_eq!(cache.get_environments("p1"), Some(Vec::new()));
    assert!(cache.contains(&CacheKey::Environments("p1".to_string())));
}

#[test]
fn test_cache_clear_all_empties_every_level() {
    let cache = HierarchyCache::new();
    let key = DeploymentKey::new("s1", "e1");
    cache.put_projects(vec![project("p1")]);
    cache.put_environments("p1", vec![environment("e1", "p1")]);
    cache.put_services("p1", vec![service("s1", "p1")]);
    cache.put_deployments(key.clone(), vec![deployment("d1", DeploymentStatus::Success, &key)]);
    assert_eq!(cache.len(), 4);

    cache.clear_all();

    assert!(cache.is_empty());
    assert!(cache.get_projects().is_none());
    assert!(cache.get_environments("p1").is_none());
    assert!(cache.get_services("p1").is_none());
    assert!(cache.get_deployments(&key).is_none());
    assert!(cache.deployment_keys().is_empty());
}

#[test]
fn test_cache_stale_deployment_write_is_dropped() {
    let cache = HierarchyCache::new();
    let key = DeploymentKey::new("s1", "e1");
    let epoch = cache.epoch();

    cache.clear_all();
    let written = cache.put_deployments_at(
        epoch,
        key.clone(),
        vec![deployment("d1", DeploymentStatus::Building, &key)],
    );

    assert!(!written);
    assert!(cache.get_deployments(&key).is_none());

    assert!(cache.put_deployments_at(cache.epoch(), key.clone(), Vec::new()));
    assert_eq!(cache.get_deployments(&key), Some(Vec::new()));
}

#[test]
fn test_cache_deployment_keys_are_sorted() {
    let cache = HierarchyCache::new();
    cache.put_deployments(DeploymentKey::new("s2", "e1"), Vec::new());
    cache.put_deployments(DeploymentKey::new("s1", "e2"), Vec::new());
    cache.put_deployments(DeploymentKey::new("s1", "e1"), Vec::new());

    assert_eq!(
        cache.deployment_keys(),
        vec![
            DeploymentKey::new("s1", "e1"),
            DeploymentKey::new("s1", "e2"),
            DeploymentKey::new("s2", "e1"),
        ]
    );
}

mod properties {
    use proptest::prelude::*;

    use super::*;
    use railtrack::models::Environment;

    fn arb_environments() -> impl Strategy<Value = Vec<Environment>> {
        prop::collection::vec(("[a-z0-9]{1,8}", "[A-Za-z ]{0,16}"), 0..12).prop_map(|items| {
            items
                .into_iter()
                .map(|(id, name)| Environment {
                    id,
                    name,
                    project_id: "p1".to_string(),
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn last_put_wins_and_order_is_kept(writes in prop::collection::vec(arb_environments(), 1..6)) {
            let cache = HierarchyCache::new();
            for environments in &writes {
                cache.put_environments("p1", environments.clone());
                let got = cache.get_environments("p1");
                prop_assert_eq!(got.as_ref(), Some(environments));
            }
            prop_assert_eq!(cache.get_environments("p1"), writes.last().cloned());
            prop_assert!(cache.get_environments("p2").is_none());
        }

        #[test]
        fn clear_all_forgets_everything(
            project_ids in prop::collection::vec("[a-z]{1,6}", 1..8),
            environments in arb_environments(),
        ) {
            let cache = HierarchyCache::new();
            for project_id in &project_ids {
                cache.put_environments(project_id, environments.clone());
                cache.put_services(project_id, Vec::new());
                cache.put_deployments(DeploymentKey::new(project_id.as_str(), "e1"), Vec::new());
            }
            let epoch = cache.epoch();

            cache.clear_all();

            prop_assert!(cache.is_empty());
            for project_id in &project_ids {
                prop_assert!(cache.get_environments(project_id).is_none());
                prop_assert!(cache.get_services(project_id).is_none());
            }
            prop_assert!(!cache.put_environments_at(epoch, "p1", environments));
            prop_assert!(cache.is_empty());
        }
    }
}
