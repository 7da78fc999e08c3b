/// Liveness banner, kept for clients that check `/`.
pub async fn root() -> &'static str {
    "api running"
}
