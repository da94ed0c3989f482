use catsocial_types::models::MatchStatus;

/// Everything a persistence call can fail with. `NotFound` is the
/// "no rows" sentinel handlers map to 404.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,

    #[error("email is already registered")]
    DuplicateEmail,

    #[error("sex cannot be changed once the cat has matched")]
    SexLocked,

    #[error(transparent)]
    MatchRule(#[from] MatchRuleViolation),

    #[error("match has already been {0}")]
    MatchClosed(MatchStatus),

    #[error("user is not part of this match")]
    NotParticipant,

    #[error("only the issuer can delete this match")]
    NotIssuer,

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(String),
}

/// Why two cats cannot be matched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchRuleViolation {
    #[error("cat {0} has already matched")]
    AlreadyMatched(i64),

    #[error("cats have the same sex")]
    SameSex,

    #[error("cats belong to the same owner")]
    SameOwner,
}
