//! Clone, lookup, listing, projects and ownership.

mod common;

use common::{alice, bob, next_version, save, save_draft, service, service_with};
use mdc_core::{CatalogConfig, ModelError, ModelQuery, SaveRequest};
use mdc_model::{NameField, Permission};
use mdc_store::DerivedCache;
use mdc_test_utils::{col, cube_using, sales_model, Harness};
use pretty_assertions::assert_eq;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

#[tokio::test]
async fn clone_starts_a_new_lineage() {
    let harness = Harness::new();
    let service = service(&harness);
    let source = save(&service, sales_model("sales")).await.unwrap();

    let cloned = service
        .clone_model("sales", "sales_copy", "analytics", &bob())
        .await
        .unwrap();

    assert!(cloned.created);
    assert_ne!(cloned.lineage, source.lineage);
    assert_eq!(cloned.descriptor.owner.as_deref(), Some("bob"));
    assert_eq!(cloned.descriptor.project.as_deref(), Some("analytics"));
    assert_eq!(cloned.descriptor.lookups, source.descriptor.lookups);
    assert_eq!(harness.store.names(), vec!["sales", "sales_copy"]);
}

#[tokio::test]
async fn clone_argument_errors() {
    let harness = Harness::new();
    let service = service(&harness);
    save(&service, sales_model("sales")).await.unwrap();

    let err = service
        .clone_model("sales", "copy", " ", &alice())
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::EmptyName { field: NameField::Project }));

    let err = service
        .clone_model("sales", "", "retail", &alice())
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::EmptyName { field: NameField::TargetName }));

    let err = service
        .clone_model("sales", "sales copy", "retail", &alice())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ModelError::InvalidName { field: NameField::TargetName, ref name } if name == "sales copy"
    ));

    let err = service
        .clone_model("missing", "copy", "retail", &alice())
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::ModelNotFound(ref name) if name == "missing"));

    let err = service
        .clone_model("sales", "sales", "retail", &alice())
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::DuplicateModelName(_)));
}

#[tokio::test]
async fn name_availability() {
    let harness = Harness::new();
    let service = service(&harness);
    save(&service, sales_model("sales")).await.unwrap();

    assert!(!service.check_name_availability("sales").await.unwrap());
    assert!(service.check_name_availability("returns").await.unwrap());
}

#[tokio::test]
async fn get_model_by_name() {
    let harness = Harness::new();
    let service = service(&harness);
    let saved = save(&service, sales_model("sales")).await.unwrap();

    assert_eq!(service.get_model("sales").await.unwrap(), saved.descriptor);
    assert!(matches!(
        service.get_model("returns").await,
        Err(ModelError::ModelNotFound(_))
    ));
}

#[tokio::test]
async fn used_columns_by_identity() {
    let harness = Harness::new();
    let service = service(&harness);
    harness
        .cubes
        .register(cube_using("by_region", "sales", &["orders.region"]));
    harness.cubes.register(
        cube_using("by_segment", "sales", &["customer.segment"]).with_column(col("orders.region")),
    );
    harness
        .cubes
        .register(cube_using("other_model_cube", "returns", &["orders.region"]));

    let used = service.used_columns("sales").await.unwrap();

    let expected = BTreeMap::from([
        (
            "CUSTOMER.SEGMENT".to_string(),
            BTreeSet::from(["by_segment".to_string()]),
        ),
        (
            "ORDERS.REGION".to_string(),
            BTreeSet::from(["by_region".to_string(), "by_segment".to_string()]),
        ),
    ]);
    assert_eq!(used, expected);
}

#[tokio::test]
async fn listing_orders_and_pages() {
    let harness = Harness::new();
    let service = service(&harness);
    let sales = save(&service, sales_model("sales").with_project("retail"))
        .await
        .unwrap();
    save(&service, sales_model("returns").with_project("retail"))
        .await
        .unwrap();
    save(&service, sales_model("inventory").with_project("ops"))
        .await
        .unwrap();

    let names = |page: &mdc_core::Page<mdc_model::ModelDescriptor>| {
        page.items.iter().map(|m| m.name.clone()).collect::<Vec<_>>()
    };

    let all = service.list_models(&ModelQuery::new()).await.unwrap();
    assert_eq!(names(&all), vec!["inventory", "returns", "sales"]);
    assert_eq!(all.total, 3);

    let second = service
        .list_models(&ModelQuery::new().with_page(1, 2))
        .await
        .unwrap();
    assert_eq!(names(&second), vec!["sales"]);
    assert_eq!(second.total, 3);

    let past_end = service
        .list_models(&ModelQuery::new().with_page(5, 2))
        .await
        .unwrap();
    assert!(past_end.items.is_empty());

    let retail = service
        .list_models(&ModelQuery::new().with_project("retail"))
        .await
        .unwrap();
    assert_eq!(names(&retail), vec!["returns", "sales"]);

    let by_name = service
        .list_models(&ModelQuery::new().with_name("SALES"))
        .await
        .unwrap();
    assert_eq!(names(&by_name), vec!["sales"]);

    // An update moves the model to the front.
    save(&service, next_version(&sales)).await.unwrap();
    let all = service.list_models(&ModelQuery::new()).await.unwrap();
    assert_eq!(names(&all), vec!["sales", "inventory", "returns"]);
}

#[tokio::test]
async fn listing_uses_configured_page_size() {
    let harness = Harness::new();
    let service = service_with(&harness, CatalogConfig::new().with_page_size(2));
    for name in ["a", "b", "c"] {
        save(&service, sales_model(name)).await.unwrap();
    }

    let page = service.list_models(&ModelQuery::new()).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.page_size, 2);
    assert_eq!(page.total, 3);
}

#[tokio::test]
async fn project_defaults() {
    let harness = Harness::new();
    let service = service_with(
        &harness,
        CatalogConfig::new().with_default_project("analytics"),
    );

    let defaulted = save(&service, sales_model("sales")).await.unwrap();
    assert_eq!(defaulted.descriptor.project.as_deref(), Some("analytics"));

    let own = save(&service, sales_model("returns").with_project("retail"))
        .await
        .unwrap();
    assert_eq!(own.descriptor.project.as_deref(), Some("retail"));

    let requested = service
        .save_model(
            SaveRequest::new(sales_model("inventory").with_project("retail")).with_project("ops"),
            &alice(),
        )
        .await
        .unwrap();
    assert_eq!(requested.descriptor.project.as_deref(), Some("ops"));

    let err = service
        .save_model(SaveRequest::new(sales_model("stock")).with_project(""), &alice())
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::EmptyName { field: NameField::Project }));
    assert!(err.is_pre_transaction());
}

#[tokio::test]
async fn owner_gets_acl_and_project_grants_inherited() {
    let harness = Harness::new();
    harness.acl.grant_project("retail", "bob", Permission::Read);
    harness
        .acl
        .grant_project("retail", "alice", Permission::Management);
    let service = service(&harness);

    let saved = save(&service, sales_model("sales").with_project("retail"))
        .await
        .unwrap();

    assert_eq!(saved.descriptor.owner.as_deref(), Some("alice"));
    assert_eq!(
        harness.acl.entries("sales"),
        BTreeMap::from([
            ("alice".to_string(), Permission::Administration),
            ("bob".to_string(), Permission::Read),
        ])
    );
}

#[tokio::test]
async fn drafts_get_no_acl() {
    let harness = Harness::new();
    let service = service(&harness);

    let draft = save_draft(&service, sales_model("sales")).await.unwrap();

    assert_eq!(draft.descriptor.owner.as_deref(), Some("alice"));
    assert!(!harness.acl.has_entries("sales_draft"));
}

#[tokio::test]
async fn save_request_from_json() {
    let harness = Harness::new();
    let service = service(&harness);
    let request: SaveRequest = serde_json::from_str(
        r#"{
            "descriptor": {
                "name": "sales",
                "fact_table": "db.orders",
                "dimensions": [{ "table": "orders", "columns": ["region"] }],
                "metrics": ["orders.amount"]
            },
            "is_draft": true,
            "project": "retail"
        }"#,
    )
    .unwrap();

    let saved = service.save_model(request, &alice()).await.unwrap();

    assert_eq!(saved.descriptor.name, "sales_draft");
    assert_eq!(saved.descriptor.project.as_deref(), Some("retail"));
    assert_eq!(saved.descriptor.measures, vec![col("orders.amount")]);
}

#[tokio::test]
async fn cache_built_from_config() {
    let config = CatalogConfig::from_toml_str("[cache]\ncapacity = 50\nttl_secs = 30").unwrap();
    assert_eq!(config.cache.ttl(), Some(Duration::from_secs(30)));

    let mut harness = Harness::new();
    harness.cache = DerivedCache::configured(config.cache.capacity, config.cache.ttl());
    harness.catalog.drop_table("db.orders");
    let service = service_with(&harness, config);

    save(&service, sales_model("sales")).await.unwrap_err();
    assert_eq!(harness.cache.stats().wipes, 1);
}
