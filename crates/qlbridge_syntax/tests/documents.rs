use qlbridge_syntax::{add_typename, parse_document, print, Definition};

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

#[test]
fn test_printing_is_stable() {
    for source in [SCHEMA, POSTS] {
        let once = print(&parse_document(source).unwrap());
        let twice = print(&parse_document(&once).unwrap());
        assert_eq!(once, twice);
    }
}

#[test]
fn test_schema_prints_in_canonical_form() {
    let printed = print(&parse_document(SCHEMA).unwrap());
    assert!(printed.starts_with("type Post {\n  id: ID!\n"));
    assert!(printed.contains("  post(id: ID!): Post\n"));
    assert!(printed.ends_with("schema {\n  query: Query\n  mutation: Mutation\n}"));
}

#[test]
fn test_typename_rewrite_reparses() {
    let document = add_typename(&parse_document(POSTS).unwrap());
    let reparsed = parse_document(&print(&document)).unwrap();

    let Definition::Operation(op) = &reparsed.definitions[0] else {
        panic!("expected operation");
    };
    // The root set is untouched.
    assert_eq!(op.selection_set.selections.len(), 1);
    assert_eq!(print(&reparsed).matches("__typename").count(), 2);
}

#[cfg(feature = "serde")]
#[test]
fn test_document_serializes_with_kind_tag() {
    let document = parse_document(POSTS).unwrap();
    let json = serde_json::to_value(&document).unwrap();
    assert_eq!(json["kind"], "Document");

    let back: qlbridge_syntax::Document = serde_json::from_value(json).unwrap();
    assert_eq!(back, document);
    assert_eq!(back.kind(), "Document");
}
