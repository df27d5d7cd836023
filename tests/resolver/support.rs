//! Seeded blog database and a statement-recording executor.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use graphweave::dialect::Dialect;
use graphweave::error::ExecutorResult;
use graphweave::executor::{ExecOutcome, Executor, SqliteExecutor};
use graphweave::resolver::{Resolver, ResolverOptions};
use graphweave::schema::SchemaIndex;
use graphweave::selection::document::{parse_operation, Variables};
use graphweave::selection::SelectionNode;
use graphweave::value::Row;

pub const BLOG_SDL: &str = r#"
    type User { id: Int! name: String }
    type Post {
      id: Int!
      title: String
      author: User @toOne
      comments: [Comment] @toMany
      pinned: Comment @toMany
      tags: [Tag] @toManyMany
    }
    type Comment { id: Int! body: String author: User @toOne }
    type Tag { id: Int! label: String posts: [Post] @toManyMany @first }
    type Query {
      posts: [Post]
      post: Post
      tags: [Tag]
      comments: [Comment]
    }
"#;

pub const BLOG_SEED: &str = r#"
    CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);
    CREATE TABLE posts (id INTEGER PRIMARY KEY, title TEXT, authorId INTEGER);
    CREATE TABLE comments (id INTEGER PRIMARY KEY, body TEXT, postId INTEGER, authorId INTEGER);
    CREATE TABLE pinned (id INTEGER PRIMARY KEY, body TEXT, postId INTEGER);
    CREATE TABLE tags (id INTEGER PRIMARY KEY, label TEXT);
    CREATE TABLE tags_posts (tagId INTEGER, postId INTEGER);

    INSERT INTO users (id, name) VALUES (1, 'Ada'), (2, 'Grace');
    INSERT INTO posts (id, title, authorId) VALUES
      (1, 'First', 1), (2, 'Second', 2), (7, 'Seventh', 1);
    INSERT INTO comments (id, body, postId, authorId) VALUES
      (1, 'Nice', 1, 2), (2, 'Agreed', 1, 1),
      (3, 'Lucky seven', 7, 2), (4, 'Indeed', 7, 1), (5, 'Late', 7, 2);
    INSERT INTO pinned (id, body, postId) VALUES (1, 'Read me', 7);
    INSERT INTO tags (id, label) VALUES (1, 'rust'), (2, 'sql');
    INSERT INTO tags_posts (tagId, postId) VALUES (1, 1), (2, 1), (2, 7);
"#;

/// Passes statements through to SQLite and records each one.
pub struct RecordingExecutor {
    inner: SqliteExecutor,
    statements: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn seeded(seed: &str) -> Arc<Self> {
        let inner = SqliteExecutor::open_in_memory().unwrap();
        inner.execute_batch(seed).unwrap();
        Arc::new(Self {
            inner,
            statements: Mutex::new(Vec::new()),
        })
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.statements.lock().unwrap().len()
    }
}

#[async_trait]
impl Executor for RecordingExecutor {
    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    async fn fetch_all(&self, sql: &str) -> ExecutorResult<Vec<Row>> {
        self.statements.lock().unwrap().push(sql.to_string());
        self.inner.fetch_all(sql).await
    }

    async fn execute(&self, sql: &str) -> ExecutorResult<ExecOutcome> {
        self.statements.lock().unwrap().push(sql.to_string());
        self.inner.execute(sql).await
    }
}

pub fn blog() -> (Resolver, Arc<RecordingExecutor>) {
    blog_with(BLOG_SEED, ResolverOptions::default())
}

pub fn blog_with(seed: &str, options: ResolverOptions) -> (Resolver, Arc<RecordingExecutor>) {
    let schema = Arc::new(SchemaIndex::from_sdl(BLOG_SDL).unwrap());
    let db = RecordingExecutor::seeded(seed);
    let resolver = Resolver::with_options(schema, db.clone(), options);
    (resolver, db)
}

/// First root field of `query`.
pub fn field(query: &str) -> SelectionNode {
    parse_operation(query, None, &Variables::new())
        .unwrap()
        .remove(0)
}
