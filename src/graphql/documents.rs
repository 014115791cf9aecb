//! GraphQL documents sent by the tooling.

pub const CREATE_COGNITO_ONLY_USER: &str = r#"
mutation CreateCognitoOnlyUser($username: String!, $fullName: String) {
  createCognitoOnlyUser(username: $username, fullName: $fullName) {
    userId
    username
    fullName
  }
}
"#;

pub const RESET_USER: &str = r#"
mutation ResetUser($newUsername: String) {
  resetUser(newUsername: $newUsername) {
    userId
    username
  }
}
"#;

pub const DELETE_USER: &str = r#"
mutation DeleteUser {
  user: deleteUser {
    userId
    username
  }
}
"#;

pub const SELF: &str = r#"
query Self {
  self {
    userId
    username
    postCount
  }
}
"#;

pub const ADD_POST: &str = r#"
mutation AddPost($postId: ID!, $postType: PostType, $text: String) {
  addPost(postId: $postId, postType: $postType, text: $text) {
    postId
    postType
    postStatus
    text
    hasNewCommentActivity
  }
}
"#;

pub const POST: &str = r#"
query Post($postId: ID!) {
  post(postId: $postId) {
    postId
    postStatus
    commentCount
    hasNewCommentActivity
  }
}
"#;

pub const ADD_COMMENT: &str = r#"
mutation AddComment($commentId: ID!, $postId: ID!, $text: String!) {
  addComment(commentId: $commentId, postId: $postId, text: $text) {
    commentId
    commentedAt
    text
  }
}
"#;

pub const DELETE_COMMENT: &str = r#"
mutation DeleteComment($commentId: ID!) {
  deleteComment(commentId: $commentId) {
    commentId
  }
}
"#;

pub const REPORT_COMMENT_VIEWS: &str = r#"
mutation ReportCommentViews($commentIds: [ID!]!) {
  reportCommentViews(commentIds: $commentIds)
}
"#;
