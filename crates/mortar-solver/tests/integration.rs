//! Integration tests for the solver.
//!
//! These exercise the full graph walk against an in-memory provider:
//! conflict resolution, exclusions, scope propagation, overrides, aliases
//! and version markers.

use mortar_core::{ArtifactKey, DependencyDescriptor, ManagedDependency, Pom, Scope};
use mortar_solver::{MemoryProvider, RemoteMetadata, Resolution, SolveError, Solver};

fn dep(spec: &str, scope: Scope) -> DependencyDescriptor {
    DependencyDescriptor::declared(spec.parse().unwrap(), scope)
}

fn pom(spec: &str) -> Pom {
    Pom::new(spec.parse().unwrap())
}

fn key(spec: &str) -> ArtifactKey {
    spec.parse().unwrap()
}

fn versions(resolution: &Resolution) -> Vec<String> {
    resolution
        .iter()
        .map(|d| d.coordinate.to_string())
        .collect()
}

#[tokio::test]
async fn test_no_duplicate_coordinates() {
    let mut provider = MemoryProvider::new();

    // a and b both depend on shared.
    let mut a = pom("com.x:a:1.0");
    a.add_dependency(dep("com.x:shared:1.0", Scope::Compile));
    provider.add_project(a);

    let mut b = pom("com.x:b:1.0");
    b.add_dependency(dep("com.x:shared:1.0", Scope::Compile));
    provider.add_project(b);

    provider.add_project(pom("com.x:shared:1.0"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(dep("com.x:a:1.0", Scope::Compile));
    root.add_dependency(dep("com.x:b:1.0", Scope::Compile));

    let solver = Solver::new(&provider);
    let resolution = solver.solve(&root, Scope::Compile).await.unwrap();

    assert_eq!(resolution.len(), 3);
    let mut keys: Vec<String> = resolution.iter().map(|d| d.key().to_string()).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 3, "no two entries may share a key");
}

#[tokio::test]
async fn test_nearest_declaration_wins() {
    let mut provider = MemoryProvider::new();

    // root -> a -> b -> lib@2.0, while root declares lib@1.0 directly.
    let mut a = pom("com.x:a:1.0");
    a.add_dependency(dep("com.x:b:1.0", Scope::Compile));
    provider.add_project(a);

    let mut b = pom("com.x:b:1.0");
    b.add_dependency(dep("com.x:lib:2.0", Scope::Compile));
    provider.add_project(b);

    provider.add_project(pom("com.x:lib:1.0"));
    provider.add_project(pom("com.x:lib:2.0"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(dep("com.x:a:1.0", Scope::Compile));
    root.add_dependency(dep("com.x:lib:1.0", Scope::Compile));

    let solver = Solver::new(&provider);
    let resolution = solver.solve(&root, Scope::Compile).await.unwrap();

    let lib = resolution.get(&key("com.x:lib")).unwrap();
    assert_eq!(lib.coordinate.version, "1.0", "ring 1 beats ring 3");
    assert_eq!(lib.ring, 1);
}

#[tokio::test]
async fn test_equal_ring_tie_keeps_first_discovered() {
    let mut provider = MemoryProvider::new();

    let mut a = pom("com.x:a:1.0");
    a.add_dependency(dep("com.x:lib:1.0", Scope::Compile));
    provider.add_project(a);

    let mut b = pom("com.x:b:1.0");
    b.add_dependency(dep("com.x:lib:2.0", Scope::Compile));
    provider.add_project(b);

    provider.add_project(pom("com.x:lib:1.0"));
    provider.add_project(pom("com.x:lib:2.0"));

    // a is declared before b, so lib@1.0 is discovered first at ring 2.
    let mut root = pom("org.example:app:1.0");
    root.add_dependency(dep("com.x:a:1.0", Scope::Compile));
    root.add_dependency(dep("com.x:b:1.0", Scope::Compile));

    let solver = Solver::new(&provider);
    let resolution = solver.solve(&root, Scope::Compile).await.unwrap();

    let lib = resolution.get(&key("com.x:lib")).unwrap();
    assert_eq!(lib.coordinate.version, "1.0");
    assert_eq!(lib.ring, 2);
}

#[tokio::test]
async fn test_determinism_across_repeated_solves() {
    let mut provider = MemoryProvider::new();

    let mut a = pom("com.x:a:1.0");
    a.add_dependency(dep("com.x:lib:1.0", Scope::Compile));
    a.add_dependency(dep("com.y:util:1.0", Scope::Compile));
    provider.add_project(a);

    let mut b = pom("com.x:b:1.0");
    b.add_dependency(dep("com.y:util:2.0", Scope::Compile));
    provider.add_project(b);

    provider.add_project(pom("com.x:lib:1.0"));
    provider.add_project(pom("com.y:util:1.0"));
    provider.add_project(pom("com.y:util:2.0"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(dep("com.x:a:1.0", Scope::Compile));
    root.add_dependency(dep("com.x:b:1.0", Scope::Compile));

    let solver = Solver::new(&provider);
    let first = solver.solve(&root, Scope::Compile).await.unwrap();

    for _ in 0..5 {
        let again = solver.solve(&root, Scope::Compile).await.unwrap();
        assert_eq!(versions(&first), versions(&again));
    }
}

#[tokio::test]
async fn test_exclusion_prunes_only_its_branch() {
    let mut provider = MemoryProvider::new();

    // b pulls com.x:lib but the root's declaration of b excludes it;
    // sibling c pulls com.x:lib with no exclusion.
    let mut b = pom("com.x:b:1.0");
    b.add_dependency(dep("com.x:lib:1.0", Scope::Compile));
    provider.add_project(b);

    let mut c = pom("com.x:c:1.0");
    c.add_dependency(dep("com.x:lib:1.0", Scope::Compile));
    provider.add_project(c);

    provider.add_project(pom("com.x:lib:1.0"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(
        dep("com.x:b:1.0", Scope::Compile).with_exclusion("com.x:lib".parse().unwrap()),
    );
    root.add_dependency(dep("com.x:c:1.0", Scope::Compile));

    let solver = Solver::new(&provider);
    let resolution = solver.solve(&root, Scope::Compile).await.unwrap();

    assert!(
        resolution.contains(&key("com.x:lib")),
        "exclusion under b must not remove lib pulled via c"
    );
}

#[tokio::test]
async fn test_exclusion_removes_when_every_path_excludes() {
    let mut provider = MemoryProvider::new();

    let mut b = pom("com.x:b:1.0");
    b.add_dependency(dep("com.x:lib:1.0", Scope::Compile));
    provider.add_project(b);
    provider.add_project(pom("com.x:lib:1.0"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(
        dep("com.x:b:1.0", Scope::Compile).with_exclusion("com.x:lib".parse().unwrap()),
    );

    let solver = Solver::new(&provider);
    let resolution = solver.solve(&root, Scope::Compile).await.unwrap();

    assert!(!resolution.contains(&key("com.x:lib")));
    assert!(resolution.failures.is_empty());
}

#[tokio::test]
async fn test_exclusions_accumulate_down_the_branch() {
    let mut provider = MemoryProvider::new();

    // root excludes com.x:deep on a; a -> b -> deep.
    let mut a = pom("com.x:a:1.0");
    a.add_dependency(dep("com.x:b:1.0", Scope::Compile));
    provider.add_project(a);

    let mut b = pom("com.x:b:1.0");
    b.add_dependency(dep("com.x:deep:1.0", Scope::Compile));
    provider.add_project(b);

    provider.add_project(pom("com.x:deep:1.0"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(
        dep("com.x:a:1.0", Scope::Compile).with_exclusion("com.x:deep".parse().unwrap()),
    );

    let solver = Solver::new(&provider);
    let resolution = solver.solve(&root, Scope::Compile).await.unwrap();

    assert!(!resolution.contains(&key("com.x:deep")));
}

#[tokio::test]
async fn test_scope_propagation_runtime_child_of_compile_parent() {
    let mut provider = MemoryProvider::new();

    let mut a = pom("com.x:a:1.0");
    a.add_dependency(dep("com.x:driver:1.0", Scope::Runtime));
    provider.add_project(a);
    provider.add_project(pom("com.x:driver:1.0"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(dep("com.x:a:1.0", Scope::Compile));

    let solver = Solver::new(&provider);

    let runtime = solver.solve(&root, Scope::Runtime).await.unwrap();
    let driver = runtime.get(&key("com.x:driver")).unwrap();
    assert_eq!(driver.scope, Scope::Runtime);

    let test = solver.solve(&root, Scope::Test).await.unwrap();
    assert!(test.contains(&key("com.x:driver")));
}

#[tokio::test]
async fn test_test_scoped_children_never_leak_into_compile() {
    let mut provider = MemoryProvider::new();

    let mut harness = pom("com.x:harness:1.0");
    harness.add_dependency(dep("com.x:mockery:1.0", Scope::Compile));
    provider.add_project(harness);
    provider.add_project(pom("com.x:mockery:1.0"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(dep("com.x:harness:1.0", Scope::Test));

    let solver = Solver::new(&provider);

    let compile = solver.solve(&root, Scope::Compile).await.unwrap();
    assert!(compile.is_empty(), "test declarations must not reach compile");

    let test = solver.solve(&root, Scope::Test).await.unwrap();
    assert!(test.contains(&key("com.x:harness")));
    let mockery = test.get(&key("com.x:mockery")).unwrap();
    assert_eq!(mockery.scope, Scope::Test, "children of a test dependency solve as test");
}

#[tokio::test]
async fn test_provided_dependencies_do_not_expand() {
    let mut provider = MemoryProvider::new();

    let mut container = pom("com.x:container:1.0");
    container.add_dependency(dep("com.x:internals:1.0", Scope::Compile));
    provider.add_project(container);
    provider.add_project(pom("com.x:internals:1.0"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(dep("com.x:container:1.0", Scope::Provided));

    let solver = Solver::new(&provider);
    let compile = solver.solve(&root, Scope::Compile).await.unwrap();

    assert!(compile.contains(&key("com.x:container")));
    assert!(
        !compile.contains(&key("com.x:internals")),
        "provided dependencies are never expanded transitively"
    );
}

#[tokio::test]
async fn test_runtime_parent_pulls_only_runtime_children() {
    let mut provider = MemoryProvider::new();

    let mut engine = pom("com.x:engine:1.0");
    engine.add_dependency(dep("com.x:api:1.0", Scope::Compile));
    engine.add_dependency(dep("com.x:impl:1.0", Scope::Runtime));
    provider.add_project(engine);
    provider.add_project(pom("com.x:api:1.0"));
    provider.add_project(pom("com.x:impl:1.0"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(dep("com.x:engine:1.0", Scope::Runtime));

    let solver = Solver::new(&provider);
    let runtime = solver.solve(&root, Scope::Runtime).await.unwrap();

    assert!(runtime.contains(&key("com.x:engine")));
    assert!(runtime.contains(&key("com.x:impl")));
    assert!(!runtime.contains(&key("com.x:api")));
}

#[tokio::test]
async fn test_optional_dependencies_not_pulled_transitively() {
    let mut provider = MemoryProvider::new();

    let mut a = pom("com.x:a:1.0");
    a.add_dependency(dep("com.x:extras:1.0", Scope::Compile).with_optional(true));
    provider.add_project(a);
    provider.add_project(pom("com.x:extras:1.0"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(dep("com.x:a:1.0", Scope::Compile));

    let solver = Solver::new(&provider);
    let resolution = solver.solve(&root, Scope::Compile).await.unwrap();

    assert!(!resolution.contains(&key("com.x:extras")));
}

#[tokio::test]
async fn test_optional_kept_when_declared_by_root() {
    let mut provider = MemoryProvider::new();
    provider.add_project(pom("com.x:extras:1.0"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(dep("com.x:extras:1.0", Scope::Compile).with_optional(true));

    let solver = Solver::new(&provider);
    let resolution = solver.solve(&root, Scope::Compile).await.unwrap();

    assert!(
        resolution.contains(&key("com.x:extras")),
        "a project's own optional declarations are used"
    );
}

#[tokio::test]
async fn test_dependency_management_overrides_transitive_version() {
    let mut provider = MemoryProvider::new();

    let mut a = pom("com.x:a:1.0");
    a.add_dependency(dep("com.x:lib:1.0", Scope::Compile));
    provider.add_project(a);

    provider.add_project(pom("com.x:lib:1.0"));
    provider.add_project(pom("com.x:lib:5.0"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(dep("com.x:a:1.0", Scope::Compile));
    root.manage(key("com.x:lib"), ManagedDependency::version("5.0"));

    let solver = Solver::new(&provider);
    let resolution = solver.solve(&root, Scope::Compile).await.unwrap();

    let lib = resolution.get(&key("com.x:lib")).unwrap();
    assert_eq!(lib.coordinate.version, "5.0");
}

#[tokio::test]
async fn test_root_management_wins_over_deeper_declarations() {
    let mut provider = MemoryProvider::new();

    // a manages lib to 9.9 in its own model; the root manages it to 5.0.
    let mut a = pom("com.x:a:1.0");
    a.add_dependency(dep("com.x:lib:1.0", Scope::Compile));
    a.manage(key("com.x:lib"), ManagedDependency::version("9.9"));
    provider.add_project(a);

    provider.add_project(pom("com.x:lib:5.0"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(dep("com.x:a:1.0", Scope::Compile));
    root.manage(key("com.x:lib"), ManagedDependency::version("5.0"));

    let solver = Solver::new(&provider);
    let resolution = solver.solve(&root, Scope::Compile).await.unwrap();

    let lib = resolution.get(&key("com.x:lib")).unwrap();
    assert_eq!(lib.coordinate.version, "5.0", "the root's managed version wins");
}

#[tokio::test]
async fn test_management_does_not_resurrect_excluded_coordinates() {
    let mut provider = MemoryProvider::new();

    let mut b = pom("com.x:b:1.0");
    b.add_dependency(dep("com.x:lib:1.0", Scope::Compile));
    provider.add_project(b);
    provider.add_project(pom("com.x:lib:5.0"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(
        dep("com.x:b:1.0", Scope::Compile).with_exclusion("com.x:lib".parse().unwrap()),
    );
    root.manage(key("com.x:lib"), ManagedDependency::version("5.0"));

    let solver = Solver::new(&provider);
    let resolution = solver.solve(&root, Scope::Compile).await.unwrap();

    // Management applies only to descriptors that survive exclusion.
    assert!(!resolution.contains(&key("com.x:lib")));
}

#[tokio::test]
async fn test_alias_rewrites_deprecated_coordinate() {
    let mut provider = MemoryProvider::new();

    let mut a = pom("com.x:a:1.0");
    a.add_dependency(dep("com.old:legacy:1.0", Scope::Compile));
    provider.add_project(a);
    provider.add_project(pom("com.new:modern:3.0"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(dep("com.x:a:1.0", Scope::Compile));
    root.alias(key("com.old:legacy"), "com.new:modern:3.0".parse().unwrap());

    let solver = Solver::new(&provider);
    let resolution = solver.solve(&root, Scope::Compile).await.unwrap();

    assert!(!resolution.contains(&key("com.old:legacy")));
    let modern = resolution.get(&key("com.new:modern")).unwrap();
    assert_eq!(modern.coordinate.version, "3.0");
}

#[tokio::test]
async fn test_release_marker_resolved_before_conflict_resolution() {
    let mut provider = MemoryProvider::new();

    provider.add_metadata(
        key("com.x:lib"),
        RemoteMetadata {
            latest: Some("3.0-SNAPSHOT".to_string()),
            release: Some("2.0".to_string()),
            versions: vec!["1.0".into(), "2.0".into(), "3.0-SNAPSHOT".into()],
        },
    );

    let mut a = pom("com.x:a:1.0");
    a.add_dependency(dep("com.x:lib:1.0", Scope::Compile));
    provider.add_project(a);

    provider.add_project(pom("com.x:lib:1.0"));
    provider.add_project(pom("com.x:lib:2.0"));

    // The root declares lib@RELEASE; nearest-wins must compare the
    // concrete version, not the marker token.
    let mut root = pom("org.example:app:1.0");
    root.add_dependency(dep("com.x:lib:RELEASE", Scope::Compile));
    root.add_dependency(dep("com.x:a:1.0", Scope::Compile));

    let solver = Solver::new(&provider);
    let resolution = solver.solve(&root, Scope::Compile).await.unwrap();

    let lib = resolution.get(&key("com.x:lib")).unwrap();
    assert_eq!(lib.coordinate.version, "2.0");
    assert_eq!(lib.ring, 1);
}

#[tokio::test]
async fn test_latest_marker_includes_snapshots() {
    let mut provider = MemoryProvider::new();

    provider.add_metadata(
        key("com.x:lib"),
        RemoteMetadata {
            latest: Some("3.0-SNAPSHOT".to_string()),
            release: Some("2.0".to_string()),
            versions: vec!["2.0".into(), "3.0-SNAPSHOT".into()],
        },
    );
    provider.add_project(pom("com.x:lib:3.0-SNAPSHOT"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(dep("com.x:lib:LATEST", Scope::Compile));

    let solver = Solver::new(&provider);
    let resolution = solver.solve(&root, Scope::Compile).await.unwrap();

    let lib = resolution.get(&key("com.x:lib")).unwrap();
    assert_eq!(lib.coordinate.version, "3.0-SNAPSHOT");
}

#[tokio::test]
async fn test_unresolvable_marker_prunes_in_best_effort() {
    let mut provider = MemoryProvider::new();
    provider.add_project(pom("com.x:a:1.0"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(dep("com.x:a:1.0", Scope::Compile));
    // No metadata registered for com.x:lib.
    root.add_dependency(dep("com.x:lib:RELEASE", Scope::Compile));

    let solver = Solver::new(&provider);
    let resolution = solver.solve(&root, Scope::Compile).await.unwrap();

    assert!(resolution.contains(&key("com.x:a")));
    assert!(!resolution.contains(&key("com.x:lib")));
    assert_eq!(resolution.failures.len(), 1);
    assert!(matches!(resolution.failures[0], SolveError::Metadata { .. }));
}

#[tokio::test]
async fn test_linked_projects_join_the_solve() {
    let mut provider = MemoryProvider::new();

    let mut module = pom("org.example:module:1.0");
    module.add_dependency(dep("com.x:extra:1.0", Scope::Compile));
    provider.add_project(module);
    provider.add_project(pom("com.x:extra:1.0"));
    provider.add_project(pom("com.x:core:1.0"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(dep("com.x:core:1.0", Scope::Compile));
    root.link("org.example:module:1.0".parse().unwrap());

    let solver = Solver::new(&provider);
    let resolution = solver.solve(&root, Scope::Compile).await.unwrap();

    assert!(resolution.contains(&key("com.x:core")));
    assert!(resolution.contains(&key("com.x:extra")));

    let extra = resolution.get(&key("com.x:extra")).unwrap();
    assert_eq!(extra.ring, 1, "linked module declarations join at ring 1");
}

#[tokio::test]
async fn test_smallest_ring_is_kept_across_paths() {
    let mut provider = MemoryProvider::new();

    // shared is reachable at ring 2 via a, and at ring 3 via b -> c.
    let mut a = pom("com.x:a:1.0");
    a.add_dependency(dep("com.x:shared:1.0", Scope::Compile));
    provider.add_project(a);

    let mut b = pom("com.x:b:1.0");
    b.add_dependency(dep("com.x:c:1.0", Scope::Compile));
    provider.add_project(b);

    let mut c = pom("com.x:c:1.0");
    c.add_dependency(dep("com.x:shared:1.0", Scope::Compile));
    provider.add_project(c);

    provider.add_project(pom("com.x:shared:1.0"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(dep("com.x:b:1.0", Scope::Compile));
    root.add_dependency(dep("com.x:a:1.0", Scope::Compile));

    let solver = Solver::new(&provider);
    let resolution = solver.solve(&root, Scope::Compile).await.unwrap();

    let shared = resolution.get(&key("com.x:shared")).unwrap();
    assert_eq!(shared.ring, 2);
}

#[tokio::test]
async fn test_site_scope_is_isolated() {
    let mut provider = MemoryProvider::new();
    provider.add_project(pom("com.x:theme:1.0"));
    provider.add_project(pom("com.x:core:1.0"));

    let mut root = pom("org.example:app:1.0");
    root.add_dependency(dep("com.x:core:1.0", Scope::Compile));
    root.add_dependency(dep("com.x:theme:1.0", Scope::Site));

    let solver = Solver::new(&provider);

    let site = solver.solve(&root, Scope::Site).await.unwrap();
    assert_eq!(site.len(), 1);
    assert!(site.contains(&key("com.x:theme")));

    let compile = solver.solve(&root, Scope::Compile).await.unwrap();
    assert!(!compile.contains(&key("com.x:theme")));
}
