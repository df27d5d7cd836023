// tests/resolver/resolver_test.rs
mod support;

use graphweave::auth::Identity;
use graphweave::error::ResolveError;
use graphweave::modifiers::{Limit, QueryModifiers};
use graphweave::resolver::{EntityQuery, ResolveContext, ResolverOptions};
use graphweave::selection::document::{parse_operation, Variables};
use serde_json::json;
use support::{blog, blog_with, field, BLOG_SEED};

fn posts() -> EntityQuery {
    EntityQuery::new("Post", "posts")
}

#[tokio::test]
async fn test_to_one_resolves_in_a_single_statement() {
    let (resolver, db) = blog();
    let value = resolver
        .query(
            &posts(),
            &field(r#"{ posts(orderBy: "posts.id") { id title author { name } } }"#),
            &ResolveContext::guest(),
        )
        .await
        .unwrap();

    assert_eq!(
        value.to_json(),
        json!([
            { "id": 1, "title": "First", "author": { "name": "Ada" } },
            { "id": 2, "title": "Second", "author": { "name": "Grace" } },
            { "id": 7, "title": "Seventh", "author": { "name": "Ada" } },
        ])
    );
    assert_eq!(db.count(), 1);
    assert!(db.statements()[0].contains(r#"LEFT JOIN "users" AS "author""#));
}

#[tokio::test]
async fn test_scalar_only_singular_returns_exact_keys() {
    let (resolver, _db) = blog();
    let value = resolver
        .query(
            &posts(),
            &field("{ post(where: { id: 2 }) { title } }"),
            &ResolveContext::guest(),
        )
        .await
        .unwrap();

    let object = value.as_object().unwrap();
    assert_eq!(object.keys().collect::<Vec<_>>(), vec!["title"]);
    assert_eq!(value.to_json(), json!({ "title": "Second" }));
}

#[tokio::test]
async fn test_to_many_issues_one_statement_per_parent() {
    let (resolver, db) = blog();
    let value = resolver
        .query(
            &posts(),
            &field(r#"{ posts(orderBy: "posts.id") { title comments { body } } }"#),
            &ResolveContext::guest(),
        )
        .await
        .unwrap();

    assert_eq!(
        value.to_json(),
        json!([
            { "title": "First", "comments": [{ "body": "Nice" }, { "body": "Agreed" }] },
            { "title": "Second", "comments": [] },
            {
                "title": "Seventh",
                "comments": [{ "body": "Lucky seven" }, { "body": "Indeed" }, { "body": "Late" }]
            },
        ])
    );

    let statements = db.statements();
    assert_eq!(statements.len(), 1 + 3);
    for id in [1, 2, 7] {
        let filter = format!(r#"WHERE "comments"."postId" = {id}"#);
        assert_eq!(statements.iter().filter(|s| s.contains(&filter)).count(), 1);
    }
}

#[tokio::test]
async fn test_hidden_id_is_stripped() {
    let (resolver, _db) = blog();
    let value = resolver
        .query(
            &posts(),
            &field(r#"{ posts(limit: 1, orderBy: "posts.id") { title comments { body } } }"#),
            &ResolveContext::guest(),
        )
        .await
        .unwrap();

    let first = value.as_list().unwrap()[0].as_object().unwrap();
    assert_eq!(first.keys().collect::<Vec<_>>(), vec!["title", "comments"]);
}

#[tokio::test]
async fn test_singular_parent_attaches_comments_by_id() {
    let (resolver, db) = blog();
    let value = resolver
        .query(
            &posts(),
            &field("{ post(where: { id: 7 }) { title comments { body author { name } } } }"),
            &ResolveContext::guest(),
        )
        .await
        .unwrap();

    assert_eq!(
        value.to_json(),
        json!({
            "title": "Seventh",
            "comments": [
                { "body": "Lucky seven", "author": { "name": "Grace" } },
                { "body": "Indeed", "author": { "name": "Ada" } },
                { "body": "Late", "author": { "name": "Grace" } },
            ]
        })
    );

    let statements = db.statements();
    assert_eq!(statements.len(), 2);
    assert!(statements[1].contains(r#"WHERE "comments"."postId" = 7"#));
}

#[tokio::test]
async fn test_nested_arguments_cannot_override_parent_filter() {
    let (resolver, _db) = blog();
    let value = resolver
        .query(
            &posts(),
            &field(
                r#"{ post(where: { id: 7 }) {
                    comments(where: { postId: 1 }, limit: 2, orderBy: "id desc") { id }
                } }"#,
            ),
            &ResolveContext::guest(),
        )
        .await
        .unwrap();

    assert_eq!(value.to_json(), json!({ "comments": [{ "id": 5 }, { "id": 4 }] }));
}

#[tokio::test]
async fn test_singular_to_many_relation_is_a_plain_object() {
    let (resolver, _db) = blog();
    let value = resolver
        .query(
            &posts(),
            &field(r#"{ posts(orderBy: "posts.id") { id pinned { body } } }"#),
            &ResolveContext::guest(),
        )
        .await
        .unwrap();

    assert_eq!(
        value.to_json(),
        json!([
            { "id": 1, "pinned": null },
            { "id": 2, "pinned": null },
            { "id": 7, "pinned": { "body": "Read me" } },
        ])
    );
}

#[tokio::test]
async fn test_limit_sentinels() {
    let (resolver, _db) = blog();
    let ctx = ResolveContext::guest();

    let none = resolver
        .query(&posts(), &field("{ posts(limit: 0) { id } }"), &ctx)
        .await
        .unwrap();
    assert_eq!(none.to_json(), json!([]));

    let all = resolver
        .query(&posts(), &field("{ posts(limit: -1) { id } }"), &ctx)
        .await
        .unwrap();
    assert_eq!(all.as_list().unwrap().len(), 3);

    let missing = resolver
        .query(&posts(), &field("{ post(limit: 0) { id } }"), &ctx)
        .await
        .unwrap();
    assert!(missing.is_null());
}

#[tokio::test]
async fn test_empty_singular_skips_relations() {
    let (resolver, db) = blog();
    let value = resolver
        .query(
            &posts(),
            &field("{ post(where: { id: 99 }) { title comments { body } } }"),
            &ResolveContext::guest(),
        )
        .await
        .unwrap();

    assert!(value.is_null());
    assert_eq!(db.count(), 1);
}

#[tokio::test]
async fn test_unknown_field_is_rejected_before_querying() {
    let (resolver, db) = blog();
    let err = resolver
        .query(
            &posts(),
            &field("{ posts { title nope } }"),
            &ResolveContext::guest(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ResolveError::SchemaFieldNotFound { ref type_name, ref field }
            if type_name == "Post" && field == "nope"
    ));
    assert_eq!(db.count(), 0);
}

#[tokio::test]
async fn test_lenient_fields_surface_storage_errors() {
    let options = ResolverOptions {
        strict_fields: false,
        ..ResolverOptions::default()
    };
    let (resolver, _db) = blog_with(BLOG_SEED, options);

    let err = resolver
        .query(
            &posts(),
            &field("{ posts { title comments { nope } } }"),
            &ResolveContext::guest(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::Storage(_)));
}

#[tokio::test]
async fn test_unknown_query_field() {
    let (resolver, _db) = blog();
    let err = resolver
        .query(
            &posts(),
            &field("{ authors { id } }"),
            &ResolveContext::guest(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::UnknownQueryField(name) if name == "authors"));
}

#[tokio::test]
async fn test_forced_modifiers_from_identity() {
    let (resolver, _db) = blog();
    let entity = posts().with_forced_fn(|identity, _caller| {
        if identity.has_rule("admin") {
            QueryModifiers::new()
        } else {
            QueryModifiers::new().with_filter("authorId", 1i64)
        }
    });
    let query = field(r#"{ posts(orderBy: "posts.id") { id } }"#);

    let guest = resolver
        .query(&entity, &query, &ResolveContext::guest())
        .await
        .unwrap();
    assert_eq!(guest.to_json(), json!([{ "id": 1 }, { "id": 7 }]));

    let admin = ResolveContext::new(Identity::new("ada", ["admin"]));
    let all = resolver.query(&entity, &query, &admin).await.unwrap();
    assert_eq!(all.as_list().unwrap().len(), 3);

    // A forced `where` key holds against the caller's value for it.
    let overridden = resolver
        .query(
            &entity,
            &field(r#"{ posts(where: { authorId: 2 }, orderBy: "posts.id") { id } }"#),
            &ResolveContext::guest(),
        )
        .await
        .unwrap();
    assert_eq!(overridden.to_json(), json!([{ "id": 1 }, { "id": 7 }]));

    // Other caller keys still narrow the restricted rows.
    let narrowed = resolver
        .query(
            &entity,
            &field("{ posts(where: { id: 2 }) { id } }"),
            &ResolveContext::guest(),
        )
        .await
        .unwrap();
    assert_eq!(narrowed.to_json(), json!([]));
}

#[tokio::test]
async fn test_raw_order_by_passes_through() {
    let (resolver, _db) = blog();
    let value = resolver
        .query(
            &posts(),
            &field(r#"{ posts(orderBy: "CASE posts.id WHEN 7 THEN 0 ELSE 1 END, posts.id DESC") { id } }"#),
            &ResolveContext::guest(),
        )
        .await
        .unwrap();
    assert_eq!(value.to_json(), json!([{ "id": 7 }, { "id": 2 }, { "id": 1 }]));
}

#[tokio::test]
async fn test_column_list_order_by_when_raw_disabled() {
    let options = ResolverOptions {
        allow_raw_order_by: false,
        ..ResolverOptions::default()
    };
    let (resolver, db) = blog_with(BLOG_SEED, options);

    let err = resolver
        .query(
            &posts(),
            &field(r#"{ posts(orderBy: "CASE posts.id WHEN 7 THEN 0 ELSE 1 END") { id } }"#),
            &ResolveContext::guest(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::InvalidArgument { .. }));
    assert_eq!(db.count(), 0);

    let value = resolver
        .query(
            &posts(),
            &field(r#"{ posts(orderBy: "posts.id desc") { id } }"#),
            &ResolveContext::guest(),
        )
        .await
        .unwrap();
    assert_eq!(value.to_json(), json!([{ "id": 7 }, { "id": 2 }, { "id": 1 }]));
}

#[tokio::test]
async fn test_static_forced_limit_fills_in_defaults() {
    let (resolver, _db) = blog();
    let entity = posts().with_forced(QueryModifiers::new().with_limit(Limit::Rows(1)));
    let ctx = ResolveContext::guest();

    let limited = resolver
        .query(&entity, &field("{ posts { id } }"), &ctx)
        .await
        .unwrap();
    assert_eq!(limited.as_list().unwrap().len(), 1);

    let unbounded = resolver
        .query(&entity, &field("{ posts(limit: -1) { id } }"), &ctx)
        .await
        .unwrap();
    assert_eq!(unbounded.as_list().unwrap().len(), 3);
}

#[tokio::test]
async fn test_variables_and_fragments() {
    let (resolver, _db) = blog();
    let document = r#"
        query Posts($n: Int = 1) {
          posts(limit: $n, orderBy: "posts.id") { ...PostFields }
        }
        fragment PostFields on Post { title author { name } }
    "#;

    let roots = parse_operation(document, None, &Variables::new()).unwrap();
    let value = resolver
        .query(&posts(), &roots[0], &ResolveContext::guest())
        .await
        .unwrap();
    assert_eq!(
        value.to_json(),
        json!([{ "title": "First", "author": { "name": "Ada" } }])
    );

    let mut variables = Variables::new();
    variables.insert("n".into(), json!(2));
    let roots = parse_operation(document, None, &variables).unwrap();
    let value = resolver
        .query(&posts(), &roots[0], &ResolveContext::guest())
        .await
        .unwrap();
    assert_eq!(value.as_list().unwrap().len(), 2);
}

#[tokio::test]
async fn test_serial_execution_gives_the_same_tree() {
    let query = field(r#"{ posts(orderBy: "posts.id") { id comments { id } tags { label } } }"#);

    let (parallel, _) = blog();
    let (serial, _) = blog_with(
        BLOG_SEED,
        ResolverOptions {
            max_concurrency: 1,
            ..ResolverOptions::default()
        },
    );

    let a = parallel
        .query(&posts(), &query, &ResolveContext::guest())
        .await
        .unwrap();
    let b = serial
        .query(&posts(), &query, &ResolveContext::guest())
        .await
        .unwrap();
    assert_eq!(a, b);
}
