//! Integration tests for the bridge link.

use qlbridge_link::{
    create_bridge_link, BridgeLink, BridgeOptions, ConfigError, Context, ContextError,
    ErrorPolicy, Link, LinkError, Observer, Operation, ResolverMap, Response, SchemaInput,
};
use qlbridge_runtime::{make_executable_schema, MockOptions, ResolverError};
use qlbridge_syntax::parse_document;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const SCHEMA: &str = r#"
  type Post {
    id: ID!
    title: String
    body: String
    author: User
  }

  type User {
    id: ID!
    username: String
    email: String
    posts: [Post]
  }

  type Query {
    posts: [Post]
    post (id: ID!): Post
    users: [User]
    user (id: ID!): User
  }

  type Mutation {
    addPost(title: String!, body: String!, userId: ID!): Post!
  }

  schema {
    query: Query
    mutation: Mutation
  }
"#;

const POSTS: &str = r#"
  query posts {
    posts {
      id
      title
      body
      author {
        id
        username
        email
      }
    }
  }
"#;

/// The posts query as a caching client sends it.
fn posts_operation() -> Operation {
    Operation::parse(POSTS).unwrap().with_typename()
}

fn one_post() -> Value {
    json!([{"id": "123", "title": "someTitle", "body": "post body", "author": null}])
}

/// Resolvers whose `Query.posts` counts its calls.
fn counted_posts(calls: &Arc<AtomicUsize>) -> ResolverMap {
    let calls = Arc::clone(calls);
    let mut resolvers = ResolverMap::new();
    resolvers.register_async("Query", "posts", move |_, _, _, _| {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, ResolverError>(one_post()) }
    });
    resolvers
}

/// Installs a test subscriber once; `RUST_LOG` picks the level.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Records observer notifications.
#[derive(Default)]
struct Recorder {
    values: Vec<Response>,
    errors: Vec<LinkError>,
    completed: usize,
}

impl Observer for Recorder {
    fn next(&mut self, value: Response) {
        self.values.push(value);
    }

    fn error(&mut self, error: LinkError) {
        self.errors.push(error);
    }

    fn complete(&mut self) {
        self.completed += 1;
    }
}

/// Test that a root resolver runs once and its records come back typed.
#[tokio::test]
async fn test_calls_resolver() {
    init_tracing();
    let calls = Arc::new(AtomicUsize::new(0));
    let link = BridgeLink::new(BridgeOptions::new(SCHEMA).resolvers(counted_posts(&calls))).unwrap();

    let response = link.request(posts_operation()).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        response.data,
        Some(json!({"posts": [{
            "id": "123",
            "title": "someTitle",
            "body": "post body",
            "author": null,
            "__typename": "Post"
        }]}))
    );
}

/// Test that a nested resolver runs per parent and sees the merged context.
#[tokio::test]
async fn test_calls_deep_resolver() {
    let seen = Arc::new(Mutex::new(Vec::<Value>::new()));
    let record = Arc::clone(&seen);
    let resolvers = ResolverMap::new()
        .with_fn("Query", "posts", |_, _, _, _| {
            Ok(json!([{"id": "123", "title": "someTitle", "body": "post body", "authorId": "987"}]))
        })
        .with_fn("Post", "author", move |post, _, ctx, _| {
            record.lock().map_err(|e| e.to_string())?.push(ctx.to_value());
            assert_eq!(post["authorId"], "987");
            Ok(json!({"id": "987", "username": "hulu", "email": "hulu@email.com"}))
        });
    let link = BridgeLink::new(
        BridgeOptions::new(SCHEMA).resolvers(resolvers).context(
            Context::new()
                .with("GraphQl", "isCool")
                .with("headers", json!({"X-hulu": "sun"})),
        ),
    )
    .unwrap();

    let response = link.request(posts_operation()).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["GraphQl"], "isCool");
    assert_eq!(seen[0]["headers"]["X-hulu"], "sun");
    assert_eq!(seen[0]["credentials"], Value::Null);
    assert_eq!(
        response.data.unwrap()["posts"][0]["author"],
        json!({"id": "987", "username": "hulu", "email": "hulu@email.com", "__typename": "User"})
    );
}

/// Test that a nested resolver runs exactly once per parent record.
#[tokio::test]
async fn test_deep_resolver_runs_once_per_parent() {
    let author_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&author_calls);
    let resolvers = ResolverMap::new()
        .with_fn("Query", "posts", |_, _, _, _| {
            Ok(json!([
                {"id": "1", "title": "first", "authorId": "a"},
                {"id": "2", "title": "second", "authorId": "b"},
                {"id": "3", "title": "third", "authorId": "c"}
            ]))
        })
        .with_fn("Post", "author", move |post, _, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"id": post["authorId"].clone()}))
        });
    let link = BridgeLink::new(BridgeOptions::new(SCHEMA).resolvers(resolvers)).unwrap();

    let response = link.request(posts_operation()).await.unwrap();

    let data = response.data.unwrap();
    let posts = data["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 3);
    assert_eq!(author_calls.load(Ordering::SeqCst), posts.len());
    let authors: Vec<_> = posts.iter().map(|p| p["author"]["id"].clone()).collect();
    assert_eq!(authors, [json!("a"), json!("b"), json!("c")]);
}

fn assert_no_nulls(value: &Value) {
    match value {
        Value::Null => panic!("unexpected null"),
        Value::Array(items) => items.iter().for_each(assert_no_nulls),
        Value::Object(fields) => fields.values().for_each(assert_no_nulls),
        _ => {}
    }
}

/// Test that mocking fills every field.
#[tokio::test]
async fn test_mocks_data() {
    let link = BridgeLink::new(BridgeOptions::new(SCHEMA).mock(true)).unwrap();
    let response = link.request(posts_operation()).await.unwrap();
    let data = response.data.unwrap();

    let posts = data["posts"].as_array().unwrap();
    assert!(!posts.is_empty());
    assert!(posts[0]["author"]["id"].is_string());
    assert_eq!(posts[0]["title"], "Hello World");
    assert_eq!(posts[0]["author"]["__typename"], "User");
    assert_no_nulls(&data);
}

/// Test that explicit resolvers win over mocks.
#[tokio::test]
async fn test_mock_preserves_resolvers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let link = BridgeLink::new(
        BridgeOptions::new(SCHEMA)
            .resolvers(counted_posts(&calls))
            .mock(true),
    )
    .unwrap();
    let response = link
        .request(Operation::parse("{ posts { id title } users { username } }").unwrap())
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        response.data,
        Some(json!({
            "posts": [{"id": "123", "title": "someTitle"}],
            "users": [{"username": "Hello World"}, {"username": "Hello World"}]
        }))
    );
}

/// Test custom mock generators.
#[tokio::test]
async fn test_custom_mocks() {
    let link = BridgeLink::new(
        BridgeOptions::new(SCHEMA).mock_with(MockOptions::new().mock("String", || json!("lorem"))),
    )
    .unwrap();
    let response = link
        .request(Operation::parse(r#"{ user(id: "1") { username email } }"#).unwrap())
        .await
        .unwrap();
    assert_eq!(
        response.data,
        Some(json!({"user": {"username": "lorem", "email": "lorem"}}))
    );
}

/// Test that contextware runs once per operation and feeds resolvers.
#[tokio::test]
async fn test_calls_contextware() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let resolvers = ResolverMap::new().with_fn("Query", "posts", |_, _, ctx, _| {
        Ok(json!([{"id": "1", "title": ctx.get("middle").cloned()}]))
    });
    let link = BridgeLink::new(
        BridgeOptions::new(SCHEMA)
            .resolvers(resolvers)
            .mock(true)
            .contextware_fn(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Some(Context::new().with("middle", "data"))
            }),
    )
    .unwrap();

    let response = link.request(posts_operation()).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let data = response.data.unwrap();
    assert_eq!(data["posts"][0]["title"], "data");
    assert!(data["posts"][0]["author"]["id"].is_string());
}

/// Test that contextware merges left to right and `None` changes nothing.
#[tokio::test]
async fn test_contextware_order() {
    let resolvers = ResolverMap::new().with_fn("Query", "posts", |_, _, ctx, _| {
        Ok(json!([{"id": "1", "title": ctx.get("who").cloned(), "body": ctx.get("kept").cloned()}]))
    });
    let link = BridgeLink::new(
        BridgeOptions::new(SCHEMA)
            .resolvers(resolvers)
            .context(Context::new().with("kept", "base"))
            .contextware_fn(|_, _| Some(Context::new().with("who", "first")))
            .contextware_fn(|_, _| None)
            .contextware_fn(|ctx, _| {
                assert_eq!(ctx.get("who"), Some(&json!("first")));
                Some(Context::new().with("who", "second"))
            }),
    )
    .unwrap();
    let response = link
        .request(Operation::parse("{ posts { title body } }").unwrap())
        .await
        .unwrap();
    assert_eq!(
        response.data,
        Some(json!({"posts": [{"title": "second", "body": "base"}]}))
    );
}

/// Test that a failing contextware fails only its operation.
#[tokio::test]
async fn test_contextware_failure() {
    let link = BridgeLink::new(
        BridgeOptions::new(SCHEMA).mock(true).try_contextware_fn(|_, op| {
            match op.context.get("headers") {
                Some(_) => Ok(None),
                None => Err(ContextError::new("missing headers")),
            }
        }),
    )
    .unwrap();

    let err = link
        .request(Operation::parse("{ users { id } }").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, LinkError::Context(_)));
    assert_eq!(err.message(), "missing headers");

    let ok = link
        .request(
            Operation::parse("{ users { id } }")
                .unwrap()
                .headers(json!({})),
        )
        .await;
    assert!(ok.is_ok());
}

/// Test that an executable schema is used as it is.
#[tokio::test]
async fn test_accepts_executable_schema() {
    let calls = Arc::new(AtomicUsize::new(0));
    let schema = make_executable_schema(SCHEMA, counted_posts(&calls)).unwrap();
    let link = BridgeLink::new(BridgeOptions::new(schema)).unwrap();
    let response = link.request(posts_operation()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(response.data.unwrap()["posts"][0]["__typename"], "Post");
}

/// Test that a parsed schema document is accepted.
#[tokio::test]
async fn test_accepts_parsed_schema() {
    let calls = Arc::new(AtomicUsize::new(0));
    let document = parse_document(SCHEMA).unwrap();
    let link = BridgeLink::new(BridgeOptions::new(document).resolvers(counted_posts(&calls))).unwrap();
    let response = link.request(posts_operation()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(response.data.unwrap()["posts"][0]["id"], "123");
}

/// Test that every schema representation gives the same results.
#[tokio::test]
async fn test_schema_inputs_are_equivalent() {
    let calls = Arc::new(AtomicUsize::new(0));
    let document = parse_document(SCHEMA).unwrap();
    let inputs: Vec<(SchemaInput, ResolverMap)> = vec![
        (SCHEMA.into(), counted_posts(&calls)),
        (document.clone().into(), counted_posts(&calls)),
        (
            serde_json::to_value(&document).unwrap().into(),
            counted_posts(&calls),
        ),
        (
            make_executable_schema(SCHEMA, counted_posts(&calls))
                .unwrap()
                .into(),
            ResolverMap::new(),
        ),
    ];

    let mut results = Vec::new();
    for (input, resolvers) in inputs {
        let link = create_bridge_link(BridgeOptions::new(input).resolvers(resolvers)).unwrap();
        results.push(link.request(posts_operation()).await.unwrap());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
}

/// Test that unrecognized schema input fails construction.
#[test]
fn test_throws_on_non_accepted_schema() {
    let resolvers = ResolverMap::new().with_fn("Query", "posts", |_, _, _, _| Ok(json!({})));
    let err = BridgeLink::new(
        BridgeOptions::new(json!({"nonValid": "schema"})).resolvers(resolvers),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::UnrecognizedSchema));
}

/// Test that an empty schema fails construction.
#[test]
fn test_throws_on_no_schema() {
    let err = create_bridge_link(
        BridgeOptions::new("")
            .resolvers(ResolverMap::new())
            .mock(false)
            .context(Context::new()),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::MissingSchema));
}

/// Test that resolver errors reach the error channel.
#[tokio::test]
async fn test_returns_error() {
    init_tracing();
    let resolvers = ResolverMap::new().with_fn("Query", "posts", |_, _, _, _| {
        Err(ResolverError::custom("bad request"))
    });
    let link = BridgeLink::new(
        BridgeOptions::new(parse_document(SCHEMA).unwrap()).resolvers(resolvers),
    )
    .unwrap();

    let mut recorder = link
        .request(posts_operation())
        .subscribe(Recorder::default())
        .await
        .unwrap();

    assert!(recorder.values.is_empty());
    assert_eq!(recorder.completed, 0);
    let err = recorder.errors.pop().unwrap();
    assert!(recorder.errors.is_empty());
    assert_eq!(err.message(), "bad request");
    let errors = err.graphql_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "bad request");
    assert_eq!(
        serde_json::to_value(&errors[0].path).unwrap(),
        json!(["posts"])
    );
    assert_eq!(err.data(), Some(&json!({"posts": null})));
}

/// Test that the `All` policy delivers errors with the data.
#[tokio::test]
async fn test_error_policy_all() {
    let resolvers = ResolverMap::new().with_fn("Query", "posts", |_, _, _, _| {
        Err(ResolverError::custom("bad request"))
    });
    let link = BridgeLink::new(
        BridgeOptions::new(SCHEMA)
            .resolvers(resolvers)
            .error_policy(ErrorPolicy::All),
    )
    .unwrap();

    let recorder = link
        .request(posts_operation())
        .subscribe(Recorder::default())
        .await
        .unwrap();
    assert!(recorder.errors.is_empty());
    assert_eq!(recorder.completed, 1);
    assert_eq!(
        recorder.values[0].to_json(),
        json!({
            "errors": [{
                "message": "bad request",
                "locations": [{"line": 2, "column": 3}],
                "path": ["posts"]
            }],
            "data": {"posts": null}
        })
    );
}

/// Test that request errors surface unchanged.
#[tokio::test]
async fn test_request_errors() {
    let link = BridgeLink::new(BridgeOptions::new(SCHEMA).mock(true)).unwrap();

    let err = link
        .request(Operation::parse("{ nope }").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, LinkError::Request(_)));
    assert_eq!(err.message(), "Cannot query field \"nope\" on type \"Query\".");

    let err = link
        .request(Operation::parse("query($id: ID!) { post(id: $id) { id } }").unwrap())
        .await
        .unwrap_err();
    assert_eq!(
        err.graphql_errors()[0].message,
        "Variable \"$id\" of required type \"ID!\" was not provided."
    );
}

/// Test that rejected requests become plain responses under `ErrorPolicy::All`.
#[tokio::test]
async fn test_request_errors_as_values_with_error_policy_all() {
    let link = BridgeLink::new(
        BridgeOptions::new(SCHEMA)
            .mock(true)
            .error_policy(ErrorPolicy::All),
    )
    .unwrap();

    let recorder = link
        .request(Operation::parse("{ nope }").unwrap())
        .subscribe(Recorder::default())
        .await
        .unwrap();
    assert!(recorder.errors.is_empty());
    assert_eq!(recorder.completed, 1);
    assert_eq!(recorder.values[0].data, None);
    assert_eq!(
        recorder.values[0].error_list()[0].message,
        "Cannot query field \"nope\" on type \"Query\"."
    );
}

/// Test variables and mutations through the link.
#[tokio::test]
async fn test_mutation_with_variables() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Mutation", "addPost", |_, args, _, _| {
        Ok(json!({
            "id": "1",
            "title": args.get("title").cloned(),
            "body": args.get("body").cloned(),
        }))
    });
    let link = BridgeLink::new(BridgeOptions::new(SCHEMA).resolvers(resolvers)).unwrap();
    let operation = Operation::parse(
        "mutation AddPost($title: String!, $body: String!) { addPost(title: $title, body: $body, userId: \"7\") { id title body } }",
    )
    .unwrap()
    .variable("title", "hello")
    .variable("body", "world");

    let response = link.request(operation).await.unwrap();
    assert_eq!(
        response.data,
        Some(json!({"addPost": {"id": "1", "title": "hello", "body": "world"}}))
    );
}

/// Test that concurrent operations keep their own contexts.
#[tokio::test]
async fn test_concurrent_contexts_do_not_leak() {
    init_tracing();
    let resolvers = ResolverMap::new().with_fn("Query", "users", |_, _, ctx, _| {
        Ok(json!([{"id": "1", "username": ctx.get("user").cloned()}]))
    });
    let link: Arc<dyn Link> = Arc::new(
        BridgeLink::new(
            BridgeOptions::new(SCHEMA)
                .resolvers(resolvers)
                .contextware_fn(|ctx, _| {
                    let user = ctx.get("headers")?.get("x-user")?.clone();
                    Some(Context::new().with("user", user))
                }),
        )
        .unwrap(),
    );

    let requests = (0..16).map(|i| {
        let link = Arc::clone(&link);
        tokio::spawn(async move {
            let operation = Operation::parse("{ users { username } }")
                .unwrap()
                .headers(json!({"x-user": format!("user-{i}")}));
            (i, link.request(operation).await.unwrap())
        })
    });
    for handle in futures::future::join_all(requests).await {
        let (i, response) = handle.unwrap();
        assert_eq!(
            response.data,
            Some(json!({"users": [{"username": format!("user-{i}")}]}))
        );
    }

    let response = link
        .request(Operation::parse("{ users { username } }").unwrap())
        .await
        .unwrap();
    assert_eq!(response.data, Some(json!({"users": [{"username": null}]})));
}
