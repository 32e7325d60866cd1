//! End-to-end selector flows against in-memory and fault-injecting
//! repositories.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use scope_client::{InMemoryRepository, RepositoryError, TaxonomyRepository};
use scope_core::{HierarchyNode, Level, NodeId, TaxonomyKind};
use scope_selector::{
    load, CollectingSink, LoadError, SelectionError, SelectorConfig, TargetSelector,
};

fn id(s: &str) -> NodeId {
    NodeId::new(s).unwrap()
}

fn node(s: &str, name: &str) -> HierarchyNode {
    HierarchyNode::new(id(s), name)
}

/// ORIGINAL rooted at `region`: R1 (with locality L1) and R2.
fn region_repo() -> InMemoryRepository {
    let mut r1 = node("R1", "Region One");
    r1.attach_children(vec![node("L1", "Locality One")]);
    InMemoryRepository::new().with_rooted_tree(
        TaxonomyKind::Original,
        Level::Region,
        vec![r1, node("R2", "Region Two")],
    )
}

fn region_config() -> SelectorConfig {
    SelectorConfig::default().with_root_level(TaxonomyKind::Original, Level::Region)
}

/// ORIGINAL rooted at the national level with two nations.
fn national_repo() -> InMemoryRepository {
    let mut n1 = node("N1", "Nation One");
    n1.attach_children(vec![node("R1", "Region One")]);
    InMemoryRepository::new()
        .with_tree(TaxonomyKind::Original, vec![n1, node("N2", "Nation Two")])
        .with_tree(
            TaxonomyKind::Expatriate,
            vec![node("E1", "Gulf"), node("E2", "Europe")],
        )
        .without_tree_endpoint()
}

// ── Region-only confirmation ─────────────────────────────────────────

#[tokio::test]
async fn region_confirmed_at_region_level() {
    let mut selector = TargetSelector::new(region_repo(), CollectingSink::new(), region_config());
    assert!(selector.open().await);
    assert_eq!(selector.options(Level::Region).len(), 2);

    selector.pick_and_load(Level::Region, &id("R1")).await.unwrap();
    selector.change_level_target(Level::Region).unwrap();
    let descriptor = selector.confirm().unwrap();

    assert_eq!(
        serde_json::to_value(&descriptor).unwrap(),
        serde_json::json!({
            "kind": "ORIGINAL",
            "level": "region",
            "regionId": "R1",
            "regionName": "Region One"
        })
    );
    assert_eq!(selector.sink().emitted(), &[descriptor]);
}

// ── Narrowing, then re-rooting ───────────────────────────────────────

#[tokio::test]
async fn locality_then_new_region_clears_locality() {
    let mut selector = TargetSelector::new(region_repo(), CollectingSink::new(), region_config());
    selector.open().await;
    selector.pick_and_load(Level::Region, &id("R1")).await.unwrap();
    assert_eq!(selector.options(Level::Locality).len(), 1);

    selector.pick(Level::Locality, &id("L1")).unwrap();
    selector.change_level_target(Level::Locality).unwrap();
    let descriptor = selector.confirm().unwrap();
    assert_eq!(
        serde_json::to_value(&descriptor).unwrap(),
        serde_json::json!({
            "kind": "ORIGINAL",
            "level": "locality",
            "regionId": "R1",
            "regionName": "Region One",
            "localityId": "L1",
            "localityName": "Locality One"
        })
    );

    selector.pick(Level::Region, &id("R2")).unwrap();
    assert!(selector.state().slot(Level::Locality).is_none());
    assert_eq!(selector.state().slot(Level::Region).unwrap().id, id("R2"));
    // The marker still points at locality, which is now unset.
    assert!(matches!(
        selector.confirm(),
        Err(SelectionError::PrematureConfirm {
            level: Some(Level::Locality),
            ..
        })
    ));
    assert_eq!(selector.sink().emitted().len(), 1);
}

// ── GLOBAL ignores earlier picks ─────────────────────────────────────

#[tokio::test]
async fn global_confirms_with_no_fields() {
    let mut selector = TargetSelector::new(region_repo(), CollectingSink::new(), region_config());
    selector.open().await;
    selector.pick_and_load(Level::Region, &id("R1")).await.unwrap();

    assert!(!selector.select_taxonomy_and_load(TaxonomyKind::Global).await);
    let descriptor = selector.confirm().unwrap();
    assert_eq!(
        serde_json::to_value(&descriptor).unwrap(),
        serde_json::json!({ "kind": "GLOBAL" })
    );
    assert_eq!(selector.label().text, "Everyone");
}

// ── Repository outage ────────────────────────────────────────────────

#[tokio::test]
async fn expatriate_outage_blocks_confirm_but_not_global() {
    let repo = national_repo().with_outage(TaxonomyKind::Expatriate);
    let mut selector = TargetSelector::new(repo, CollectingSink::new(), SelectorConfig::default());

    assert!(selector.select_taxonomy_and_load(TaxonomyKind::Expatriate).await);
    assert!(selector.roots().is_empty());
    let failure = selector.failure().unwrap();
    assert!(matches!(failure.error, LoadError::Repository(RepositoryError::Unavailable { .. })));

    assert_eq!(
        selector.confirm(),
        Err(SelectionError::PrematureConfirm {
            taxonomy: TaxonomyKind::Expatriate,
            level: None
        })
    );

    selector.select_taxonomy(TaxonomyKind::Global);
    assert!(selector.failure().is_none());
    assert!(selector.confirm().is_ok());
    assert_eq!(selector.sink().emitted().len(), 1);
}

// ── Expatriate happy path ────────────────────────────────────────────

#[tokio::test]
async fn expatriate_region_confirms_flat_descriptor() {
    let mut selector =
        TargetSelector::new(national_repo(), CollectingSink::new(), SelectorConfig::default());
    selector
        .select_taxonomy_and_load(TaxonomyKind::Expatriate)
        .await;
    // Single-level taxonomy: no children to fetch.
    let request = selector.pick(Level::ExpatriateRegion, &id("E2")).unwrap();
    assert!(request.is_none());
    assert_eq!(
        serde_json::to_value(selector.confirm().unwrap()).unwrap(),
        serde_json::json!({
            "kind": "EXPATRIATE",
            "expatriateRegionId": "E2",
            "expatriateRegionName": "Europe"
        })
    );
}

// ── Stale results ────────────────────────────────────────────────────

#[tokio::test]
async fn in_flight_children_discarded_after_taxonomy_switch() {
    let repo = Arc::new(national_repo());
    let config = SelectorConfig::default();
    let mut selector = TargetSelector::new(repo.clone(), CollectingSink::new(), config.clone());
    selector.open().await;

    let request = selector.pick(Level::NationalLevel, &id("N1")).unwrap().unwrap();
    let handle = {
        let repo = repo.clone();
        let request = request.clone();
        let config = config.clone();
        tokio::spawn(async move { load(&repo, &request, &config).await })
    };

    selector.select_taxonomy(TaxonomyKind::Expatriate);
    let outcome = handle.await.unwrap();
    assert!(outcome.is_success());
    assert!(!selector.apply(outcome));
    assert!(!selector
        .cache()
        .children_loaded(TaxonomyKind::Original, Level::NationalLevel, &id("N1")));
}

#[tokio::test]
async fn children_of_abandoned_parent_are_discarded() {
    let mut selector =
        TargetSelector::new(national_repo(), CollectingSink::new(), SelectorConfig::default());
    selector.open().await;

    let stale = selector.pick(Level::NationalLevel, &id("N1")).unwrap().unwrap();
    let fresh = selector.pick(Level::NationalLevel, &id("N2")).unwrap().unwrap();

    let outcome = selector.fetch(&stale).await;
    assert!(!selector.apply(outcome));
    assert!(selector.run(Some(fresh)).await);
    assert!(selector.options(Level::Region).is_empty());
    assert!(selector
        .cache()
        .children_loaded(TaxonomyKind::Original, Level::NationalLevel, &id("N2")));
}

// ── Timeouts, retry, and the failure banner ──────────────────────────

/// Delays every call, then answers from an in-memory repository.
struct SlowRepository {
    delay: Duration,
    inner: InMemoryRepository,
}

impl TaxonomyRepository for SlowRepository {
    async fn list_roots(
        &self,
        taxonomy: TaxonomyKind,
        level: Level,
    ) -> Result<Vec<HierarchyNode>, RepositoryError> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_roots(taxonomy, level).await
    }

    async fn list_children(
        &self,
        taxonomy: TaxonomyKind,
        parent_id: &NodeId,
        child_level: Level,
    ) -> Result<Vec<HierarchyNode>, RepositoryError> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_children(taxonomy, parent_id, child_level).await
    }
}

#[tokio::test]
async fn timeout_is_absorbed_as_empty_level() {
    let repo = SlowRepository {
        delay: Duration::from_secs(5),
        inner: national_repo(),
    };
    let config = SelectorConfig::default().with_fetch_timeout(Duration::from_millis(50));
    let mut selector = TargetSelector::new(repo, CollectingSink::new(), config);

    assert!(selector.open().await);
    assert!(selector.roots().is_empty());
    assert!(matches!(
        selector.failure().map(|f| &f.error),
        Some(LoadError::TimedOut(_))
    ));
    assert!(selector.failure().unwrap().to_string().contains("timed out"));
}

/// Fails the first call, then answers from an in-memory repository.
struct FlakyRepository {
    failed_once: AtomicBool,
    inner: InMemoryRepository,
}

impl FlakyRepository {
    fn check(&self) -> Result<(), RepositoryError> {
        if self.failed_once.swap(true, Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RepositoryError::Unavailable {
                reason: "connection reset".into(),
            })
        }
    }
}

impl TaxonomyRepository for FlakyRepository {
    async fn list_roots(
        &self,
        taxonomy: TaxonomyKind,
        level: Level,
    ) -> Result<Vec<HierarchyNode>, RepositoryError> {
        self.check()?;
        self.inner.list_roots(taxonomy, level).await
    }

    async fn list_children(
        &self,
        taxonomy: TaxonomyKind,
        parent_id: &NodeId,
        child_level: Level,
    ) -> Result<Vec<HierarchyNode>, RepositoryError> {
        self.check()?;
        self.inner.list_children(taxonomy, parent_id, child_level).await
    }
}

#[tokio::test]
async fn retry_after_failure_loads_and_clears_banner() {
    let repo = FlakyRepository {
        failed_once: AtomicBool::new(false),
        inner: national_repo(),
    };
    let mut selector = TargetSelector::new(repo, CollectingSink::new(), SelectorConfig::default());

    assert!(selector.open().await);
    assert!(selector.failure().is_some());
    assert!(selector.roots().is_empty());
    // Failed roots are not cached, so a new roots request is still due.
    assert!(selector.roots_request().is_some());

    assert!(selector.retry_and_load().await);
    assert!(selector.failure().is_none());
    assert_eq!(selector.roots().len(), 2);
    assert!(selector.retry().is_none());
}

#[tokio::test]
async fn retry_for_abandoned_parent_drops_banner() {
    let repo = FlakyRepository {
        failed_once: AtomicBool::new(true),
        inner: national_repo(),
    };
    let mut selector = TargetSelector::new(repo, CollectingSink::new(), SelectorConfig::default());
    selector.open().await;

    // Re-arm the failure for the children fetch.
    selector.repository().failed_once.store(false, Ordering::SeqCst);
    selector
        .pick_and_load(Level::NationalLevel, &id("N1"))
        .await
        .unwrap();
    assert!(selector.failure().is_some());

    selector.pick(Level::NationalLevel, &id("N2")).unwrap();
    assert!(selector.retry().is_none());
    assert!(selector.failure().is_none());
}

// ── Tree endpoint ────────────────────────────────────────────────────

#[tokio::test]
async fn tree_payload_needs_no_child_fetches() {
    let mut nation = node("N1", "Nation");
    let mut region = node("R1", "Region One");
    region.attach_children(vec![node("L1", "Locality One")]);
    nation.attach_children(vec![region]);
    let repo = Arc::new(InMemoryRepository::new().with_tree(TaxonomyKind::Sector, vec![nation]));
    let mut selector = TargetSelector::new(repo.clone(), CollectingSink::new(), SelectorConfig::default());

    assert!(selector.select_taxonomy_and_load(TaxonomyKind::Sector).await);
    assert_eq!(selector.pick(Level::NationalLevel, &id("N1")).unwrap(), None);
    assert_eq!(selector.pick(Level::Region, &id("R1")).unwrap(), None);
    assert_eq!(repo.request_count(), 1);

    let descriptor = selector.confirm().unwrap();
    assert_eq!(descriptor.kind(), TaxonomyKind::Sector);
    assert_eq!(descriptor.level(), Some(Level::Region));
    assert!(descriptor.includes(Level::NationalLevel, &id("N1")));
}
