// tests/schema/sdl_test.rs
use graphweave::error::SchemaError;
use graphweave::schema::{RelationKind, SchemaIndex};

const BLOG_SDL: &str = r#"
    directive @toOne on FIELD_DEFINITION
    directive @toMany on FIELD_DEFINITION
    directive @toManyMany on FIELD_DEFINITION
    directive @first on FIELD_DEFINITION

    scalar DateTime

    enum Status { DRAFT PUBLISHED }

    interface Node { id: Int! }

    type User implements Node {
      id: Int!
      name: String
      posts: [Post] @toMany
    }

    type Post implements Node {
      id: Int!
      title: String
      status: Status
      createdAt: DateTime
      author: User @toOne
      comments: [Comment] @toMany
      tags: [Tag!]! @toManyMany
    }

    type Comment { id: Int! body: String post: Post @toOne }

    type Tag { id: Int! label: String posts: [Post] @toManyMany @first }

    input PostInput { title: String }

    type Query {
      posts(limit: Int, orderBy: String): [Post]
      post(id: Int!): Post
      users: [User!]!
    }
"#;

#[test]
fn test_blog_schema_relations() {
    let schema = SchemaIndex::from_sdl(BLOG_SDL).unwrap();

    assert_eq!(schema.relation_kind_of("User", "posts"), RelationKind::ToMany);
    assert_eq!(schema.relation_kind_of("Comment", "post"), RelationKind::ToOne);
    assert_eq!(
        schema.relation_kind_of("Post", "tags"),
        RelationKind::ToManyMany { first: false }
    );
    assert_eq!(
        schema.relation_kind_of("Tag", "posts"),
        RelationKind::ToManyMany { first: true }
    );
    assert_eq!(schema.relation_kind_of("Post", "status"), RelationKind::None);
}

#[test]
fn test_non_object_definitions_skipped() {
    let schema = SchemaIndex::from_sdl(BLOG_SDL).unwrap();

    assert!(schema.has_type("Node"));
    assert!(!schema.has_type("Status"));
    assert!(!schema.has_type("DateTime"));
    assert!(!schema.has_type("PostInput"));
}

#[test]
fn test_wrapped_types_unwrap_to_innermost_name() {
    let schema = SchemaIndex::from_sdl(BLOG_SDL).unwrap();

    let tags = schema.field("Post", "tags").unwrap();
    assert_eq!(tags.ty.name, "Tag");
    assert!(tags.ty.list);
    assert!(!tags.ty.nullable);

    let users = schema.query_field("users").unwrap();
    assert_eq!(users.ty.name, "User");
    assert!(users.ty.list);
}

#[test]
fn test_schema_block_renames_query_type() {
    let schema = SchemaIndex::from_sdl(
        r#"
        schema { query: Root }
        type Root { posts: [Post] }
        type Post { id: Int }
        "#,
    )
    .unwrap();

    assert_eq!(schema.query_type_name(), "Root");
    assert!(schema.query_field("posts").unwrap().ty.list);
    assert!(schema.validate().is_ok());
}

#[test]
fn test_extend_type_adds_relations() {
    let schema = SchemaIndex::from_sdl(
        r#"
        type Post { id: Int title: String }
        type User { id: Int }
        extend type Post { author: User @toOne }
        "#,
    )
    .unwrap();

    assert_eq!(schema.relation_kind_of("Post", "author"), RelationKind::ToOne);
    assert_eq!(schema.get_type("Post").unwrap().fields().count(), 3);
}

#[test]
fn test_first_without_many_many_is_ignored() {
    let schema = SchemaIndex::from_sdl("type Post { comments: [Comment] @toMany @first }").unwrap();
    assert_eq!(schema.relation_kind_of("Post", "comments"), RelationKind::ToMany);
}

#[test]
fn test_parse_error() {
    let err = SchemaIndex::from_sdl("type Post { id: Int ").unwrap_err();
    assert!(matches!(err, SchemaError::Parse(_)));
}

#[test]
fn test_conflicting_directives() {
    let err = SchemaIndex::from_sdl("type Post { tags: [Tag] @toMany @toManyMany }").unwrap_err();
    assert!(matches!(err, SchemaError::ConflictingDirectives { .. }));
}
