// tests/resolver/many_to_many_test.rs
mod support;

use graphweave::error::ResolveError;
use graphweave::resolver::{EntityQuery, ResolveContext, ResolverOptions};
use serde_json::json;
use support::{blog, blog_with, field, BLOG_SEED};

fn posts() -> EntityQuery {
    EntityQuery::new("Post", "posts")
}

fn tags() -> EntityQuery {
    EntityQuery::new("Tag", "tags")
}

#[tokio::test]
async fn test_tags_resolve_through_pivot() {
    let (resolver, db) = blog();
    let value = resolver
        .query(
            &posts(),
            &field(r#"{ posts(orderBy: "posts.id") { id tags { label } } }"#),
            &ResolveContext::guest(),
        )
        .await
        .unwrap();

    assert_eq!(
        value.to_json(),
        json!([
            { "id": 1, "tags": [{ "label": "rust" }, { "label": "sql" }] },
            { "id": 2, "tags": [] },
            { "id": 7, "tags": [{ "label": "sql" }] },
        ])
    );

    let statements = db.statements();
    assert_eq!(statements.len(), 4);
    let pivot = statements
        .iter()
        .find(|s| s.contains(r#""tags_posts"."postId" = 1"#))
        .unwrap();
    insta::assert_snapshot!(pivot, @r#"
    SELECT
      "tag"."label"
    FROM "tags_posts"
    LEFT JOIN "tags" AS "tag" ON "tags_posts"."tagId" = "tag"."id"
    WHERE "tags_posts"."postId" = 1
    "#);
}

#[tokio::test]
async fn test_first_flag_orders_pivot_name() {
    let (resolver, db) = blog();
    let value = resolver
        .query(
            &tags(),
            &field(r#"{ tags(orderBy: "tags.id") { label posts { title } } }"#),
            &ResolveContext::guest(),
        )
        .await
        .unwrap();

    assert_eq!(
        value.to_json(),
        json!([
            { "label": "rust", "posts": [{ "title": "First" }] },
            { "label": "sql", "posts": [{ "title": "First" }, { "title": "Seventh" }] },
        ])
    );

    // `Tag.posts @first` puts the tag table first: the same pivot as `Post.tags`.
    let nested = &db.statements()[1..];
    assert!(nested
        .iter()
        .all(|s| s.contains(r#"FROM "tags_posts""#)
            && s.contains(r#"LEFT JOIN "posts" AS "post" ON "tags_posts"."postId" = "post"."id""#)));
}

#[tokio::test]
async fn test_pivot_naming_is_stable_across_depths() {
    let (resolver, db) = blog();
    let value = resolver
        .query(
            &posts(),
            &field(
                "{ post(where: { id: 7 }) { tags { label posts { title tags { label } } } } }",
            ),
            &ResolveContext::guest(),
        )
        .await
        .unwrap();

    assert_eq!(
        value.to_json(),
        json!({
            "tags": [{
                "label": "sql",
                "posts": [
                    { "title": "First", "tags": [{ "label": "rust" }, { "label": "sql" }] },
                    { "title": "Seventh", "tags": [{ "label": "sql" }] },
                ]
            }]
        })
    );

    let statements = db.statements();
    // post, its tags, the tag's posts, then tags of each of those posts
    assert_eq!(statements.len(), 1 + 1 + 1 + 2);
    assert!(statements[1..].iter().all(|s| s.contains(r#"FROM "tags_posts""#)));
}

#[tokio::test]
async fn test_to_many_below_pivot_filters_by_target_id() {
    let (resolver, db) = blog();
    let value = resolver
        .query(
            &tags(),
            &field("{ tags(where: { id: 1 }) { posts { title comments { body } } } }"),
            &ResolveContext::guest(),
        )
        .await
        .unwrap();

    assert_eq!(
        value.to_json(),
        json!([{
            "posts": [{
                "title": "First",
                "comments": [{ "body": "Nice" }, { "body": "Agreed" }]
            }]
        }])
    );
    assert!(db
        .statements()
        .iter()
        .any(|s| s.contains(r#"WHERE "comments"."postId" = 1"#)));
}

#[tokio::test]
async fn test_dangling_pivot_row_without_id() {
    let seed = format!("{BLOG_SEED}\nINSERT INTO tags_posts (tagId, postId) VALUES (99, 2);");
    let (resolver, _db) = blog_with(&seed, ResolverOptions::default());
    let ctx = ResolveContext::guest();

    // Without nested relations the unmatched tag is just an empty row.
    let labels = resolver
        .query(
            &posts(),
            &field("{ post(where: { id: 2 }) { tags { label } } }"),
            &ctx,
        )
        .await
        .unwrap();
    assert_eq!(labels.to_json(), json!({ "tags": [{ "label": null }] }));

    let err = resolver
        .query(
            &posts(),
            &field("{ post(where: { id: 2 }) { tags { label posts { title } } } }"),
            &ctx,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::MissingParentId { ref type_name, ref field }
            if type_name == "Tag" && field == "posts"
    ));
}
