/// Raw message row as stored. Timestamps stay strings here; parsing into
/// typed values happens at the API layer where a corrupt row can be logged
/// with request context.
#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: String,
    pub identity_hash: String,
    pub content: String,
    pub status: String,
    pub created_at: String,
    pub approved_at: Option<String>,
}
